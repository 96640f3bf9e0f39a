use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use registra_academics::{CourseId, StudentId};

/// Flat wire row for a student. Enrollment edges live in the link table,
/// never in this row, so a field update can never clear them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub age: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat wire row for a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: CourseId,
    pub name: String,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One enrollment edge in the link table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentRow {
    pub student_id: StudentId,
    pub course_id: CourseId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    /// A write collided with existing data (duplicate id, duplicate edge).
    #[error("conflicting write: {0}")]
    Conflict(String),

    /// The targeted record does not exist in the store.
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// The storage backend failed (IO, connection, lock).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Keyed storage for academic records plus a link table of enrollment edges.
///
/// The store makes **no multi-row atomicity promise**: each method is atomic
/// on its own, and callers sequence multi-call operations (and compensate on
/// partial failure) themselves. Implementations must be safe to share across
/// threads.
pub trait RecordStore: Send + Sync {
    fn insert_student(&self, row: &StudentRow) -> Result<(), RecordStoreError>;
    fn update_student(&self, row: &StudentRow) -> Result<(), RecordStoreError>;
    fn delete_student(&self, id: StudentId) -> Result<(), RecordStoreError>;
    fn load_students(&self) -> Result<Vec<StudentRow>, RecordStoreError>;

    fn insert_course(&self, row: &CourseRow) -> Result<(), RecordStoreError>;
    fn update_course(&self, row: &CourseRow) -> Result<(), RecordStoreError>;
    fn delete_course(&self, id: CourseId) -> Result<(), RecordStoreError>;
    fn load_courses(&self) -> Result<Vec<CourseRow>, RecordStoreError>;

    fn add_enrollment(&self, student_id: StudentId, course_id: CourseId)
        -> Result<(), RecordStoreError>;
    fn remove_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError>;
    fn remove_enrollments_for_student(&self, id: StudentId) -> Result<(), RecordStoreError>;
    fn remove_enrollments_for_course(&self, id: CourseId) -> Result<(), RecordStoreError>;
    fn load_enrollments(&self) -> Result<Vec<EnrollmentRow>, RecordStoreError>;
}

impl<S> RecordStore for std::sync::Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn insert_student(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        (**self).insert_student(row)
    }

    fn update_student(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        (**self).update_student(row)
    }

    fn delete_student(&self, id: StudentId) -> Result<(), RecordStoreError> {
        (**self).delete_student(id)
    }

    fn load_students(&self) -> Result<Vec<StudentRow>, RecordStoreError> {
        (**self).load_students()
    }

    fn insert_course(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        (**self).insert_course(row)
    }

    fn update_course(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        (**self).update_course(row)
    }

    fn delete_course(&self, id: CourseId) -> Result<(), RecordStoreError> {
        (**self).delete_course(id)
    }

    fn load_courses(&self) -> Result<Vec<CourseRow>, RecordStoreError> {
        (**self).load_courses()
    }

    fn add_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        (**self).add_enrollment(student_id, course_id)
    }

    fn remove_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        (**self).remove_enrollment(student_id, course_id)
    }

    fn remove_enrollments_for_student(&self, id: StudentId) -> Result<(), RecordStoreError> {
        (**self).remove_enrollments_for_student(id)
    }

    fn remove_enrollments_for_course(&self, id: CourseId) -> Result<(), RecordStoreError> {
        (**self).remove_enrollments_for_course(id)
    }

    fn load_enrollments(&self) -> Result<Vec<EnrollmentRow>, RecordStoreError> {
        (**self).load_enrollments()
    }
}
