//! Request payloads and domain → JSON mapping.

use serde::Deserialize;
use serde_json::{json, Value};

use registra_academics::{Course, NewCourse, NewStudent, Student};
use registra_infra::service::CourseRoster;

#[derive(Debug, Deserialize)]
pub struct StudentPayload {
    pub first_name: String,
    pub last_name: String,
    pub age: u8,
}

impl StudentPayload {
    pub fn into_input(self) -> NewStudent {
        NewStudent {
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CoursePayload {
    pub name: String,
    pub capacity: u32,
}

impl CoursePayload {
    pub fn into_input(self) -> NewCourse {
        NewCourse {
            name: self.name,
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnrollPayload {
    pub student_id: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

pub fn student_to_json(student: &Student) -> Value {
    json!({
        "id": student.id_typed().to_string(),
        "first_name": student.first_name(),
        "last_name": student.last_name(),
        "age": student.age(),
        "enrolled_courses": student
            .enrolled_courses()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>(),
    })
}

pub fn course_to_json(course: &Course) -> Value {
    json!({
        "id": course.id_typed().to_string(),
        "name": course.name(),
        "capacity": course.capacity(),
        "enrolled_students": course
            .enrolled_students()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>(),
        "occupancy": course.occupancy(),
    })
}

pub fn roster_to_json(roster: &CourseRoster) -> Value {
    json!({
        "course_id": roster.course_id.to_string(),
        "course_name": roster.course_name,
        "occupancy": roster.occupancy,
        "students": roster.students.iter().map(student_to_json).collect::<Vec<_>>(),
    })
}
