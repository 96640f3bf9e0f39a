pub mod common;
pub mod courses;
pub mod enrollments;
pub mod students;
pub mod system;
