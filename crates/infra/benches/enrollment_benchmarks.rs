use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use registra_academics::{NewCourse, NewStudent};
use registra_infra::id_gen::UuidIdGenerator;
use registra_infra::record_store::InMemoryRecordStore;
use registra_infra::service::EnrollmentService;

fn new_student(serial: usize) -> NewStudent {
    NewStudent {
        first_name: format!("First{serial}"),
        last_name: format!("Last{serial}"),
        age: 20,
    }
}

fn new_course(serial: usize, capacity: u32) -> NewCourse {
    NewCourse {
        name: format!("Course {serial}"),
        capacity,
    }
}

/// Hot path: create a student and a course, then commit one enrollment edge
/// (validation + store write + two-sided in-memory commit).
fn bench_enroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("enroll");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_pair_and_enroll", |b| {
        let store = InMemoryRecordStore::new();
        let mut service = EnrollmentService::load(store, UuidIdGenerator::new()).unwrap();
        let mut serial = 0usize;
        b.iter(|| {
            serial += 1;
            let student = service.create_student(new_student(serial)).unwrap();
            let course = service.create_course(new_course(serial, 8)).unwrap();
            service
                .enroll(student.id_typed(), course.id_typed())
                .unwrap();
            black_box(student.id_typed())
        });
    });

    group.finish();
}

/// Read side: substring search over a populated collection, computed fresh
/// per call.
fn bench_search(c: &mut Criterion) {
    let store = InMemoryRecordStore::new();
    let mut service = EnrollmentService::load(store, UuidIdGenerator::new()).unwrap();
    for serial in 0..1_000 {
        service.create_student(new_student(serial)).unwrap();
    }

    let mut group = c.benchmark_group("queries");
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("search_students_1k", |b| {
        b.iter(|| black_box(service.search_students("first5")));
    });
    group.finish();
}

criterion_group!(benches, bench_enroll, bench_search);
criterion_main!(benches);
