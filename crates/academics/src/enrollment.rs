//! Enrollment admission rules and the paired two-sided commit.
//!
//! The bidirectional invariant lives here: an enrollment edge exists in a
//! student's `enrolled_courses` exactly when it exists in the course's
//! `enrolled_students`. The only sanctioned ways to create or remove an edge
//! while both records survive are `link` and `unlink`, which always touch
//! both sides.

use registra_core::{DomainError, DomainResult};

use crate::course::Course;
use crate::student::Student;

/// Maximum number of simultaneous enrollments a student may hold.
pub const MAX_COURSES_PER_STUDENT: usize = 8;

/// Admission checks for a new enrollment edge, in contract order; the first
/// failure wins. Existence of both records is the caller's concern (it holds
/// the collections).
pub fn authorize(student: &Student, course: &Course) -> DomainResult<()> {
    if student.is_enrolled(course.id_typed()) {
        return Err(DomainError::AlreadyEnrolled);
    }
    if student.enrolled_courses().len() >= MAX_COURSES_PER_STUDENT {
        return Err(DomainError::StudentLimitReached);
    }
    if course.is_full() {
        return Err(DomainError::CourseFull);
    }
    Ok(())
}

/// Commit one enrollment edge on both sides.
///
/// Callers must have passed `authorize` for this pair first.
pub fn link(student: &mut Student, course: &mut Course) {
    course.record_enrollment(student.id_typed());
    student.record_enrollment(course.id_typed());
}

/// Remove one enrollment edge from both sides.
pub fn unlink(student: &mut Student, course: &mut Course) {
    course.drop_student(student.id_typed());
    student.drop_course(course.id_typed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{CourseId, NewCourse};
    use crate::student::{NewStudent, StudentId};
    use chrono::Utc;
    use proptest::prelude::*;
    use registra_core::RecordId;

    fn test_student(name: &str) -> Student {
        Student::create(
            StudentId::new(RecordId::new()),
            NewStudent {
                first_name: name.to_string(),
                last_name: "Tester".to_string(),
                age: 20,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn test_course(capacity: u32) -> Course {
        Course::create(
            CourseId::new(RecordId::new()),
            NewCourse {
                name: "Course".to_string(),
                capacity,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn link_updates_both_sides() {
        let mut student = test_student("Link");
        let mut course = test_course(5);

        authorize(&student, &course).unwrap();
        link(&mut student, &mut course);

        assert!(student.is_enrolled(course.id_typed()));
        assert!(course.has_student(student.id_typed()));
    }

    #[test]
    fn unlink_clears_both_sides() {
        let mut student = test_student("Unlink");
        let mut course = test_course(5);
        link(&mut student, &mut course);

        unlink(&mut student, &mut course);

        assert!(!student.is_enrolled(course.id_typed()));
        assert!(!course.has_student(student.id_typed()));
    }

    #[test]
    fn duplicate_enrollment_is_rejected_before_the_limits() {
        let mut student = test_student("Dup");
        // Full course: AlreadyEnrolled must still win over CourseFull.
        let mut course = test_course(1);
        link(&mut student, &mut course);

        let err = authorize(&student, &course).unwrap_err();
        assert_eq!(err, DomainError::AlreadyEnrolled);
    }

    #[test]
    fn ninth_course_is_rejected() {
        let mut student = test_student("Busy");
        for _ in 0..MAX_COURSES_PER_STUDENT {
            let mut course = test_course(10);
            authorize(&student, &course).unwrap();
            link(&mut student, &mut course);
        }
        assert_eq!(student.enrolled_courses().len(), MAX_COURSES_PER_STUDENT);

        let ninth = test_course(10);
        let err = authorize(&student, &ninth).unwrap_err();
        assert_eq!(err, DomainError::StudentLimitReached);
    }

    #[test]
    fn full_course_is_rejected() {
        let mut filler = test_student("Filler");
        let mut course = test_course(1);
        authorize(&filler, &course).unwrap();
        link(&mut filler, &mut course);

        let late = test_student("Late");
        let err = authorize(&late, &course).unwrap_err();
        assert_eq!(err, DomainError::CourseFull);
        assert_eq!(course.enrolled_students(), &[filler.id_typed()]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever the capacity and however many students try to
        /// enroll, the roster never exceeds capacity and every admitted edge
        /// is present on both sides.
        #[test]
        fn roster_never_exceeds_capacity(
            capacity in 1u32..16,
            applicants in 1usize..40
        ) {
            let mut course = test_course(capacity);
            let mut students: Vec<Student> =
                (0..applicants).map(|i| test_student(&format!("s{i}"))).collect();

            for student in &mut students {
                if authorize(student, &course).is_ok() {
                    link(student, &mut course);
                }
            }

            prop_assert!(course.enrolled_students().len() as u32 <= capacity);
            for student in &students {
                prop_assert_eq!(
                    student.is_enrolled(course.id_typed()),
                    course.has_student(student.id_typed())
                );
            }
        }

        /// Property: a student admitted to arbitrarily many candidate courses
        /// never holds more than the enrollment limit.
        #[test]
        fn student_never_exceeds_course_limit(candidates in 1usize..24) {
            let mut student = test_student("cap");
            let mut courses: Vec<Course> = (0..candidates).map(|_| test_course(4)).collect();

            for course in &mut courses {
                if authorize(&student, course).is_ok() {
                    link(&mut student, course);
                }
            }

            prop_assert!(student.enrolled_courses().len() <= MAX_COURSES_PER_STUDENT);
        }
    }
}
