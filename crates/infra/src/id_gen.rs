//! Unique-identifier collaborator.

use registra_academics::{CourseId, StudentId};
use registra_core::RecordId;

/// Source of fresh record identifiers.
///
/// Consumers must not assume any particular id format, only uniqueness
/// within the lifetime of the dataset.
pub trait IdGenerator: Send + Sync {
    fn student_id(&self) -> StudentId;
    fn course_id(&self) -> CourseId;
}

/// UUIDv7-backed generator (time-ordered ids).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl UuidIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGenerator {
    fn student_id(&self) -> StudentId {
        StudentId::new(RecordId::new())
    }

    fn course_id(&self) -> CourseId {
        CourseId::new(RecordId::new())
    }
}

impl<G> IdGenerator for std::sync::Arc<G>
where
    G: IdGenerator + ?Sized,
{
    fn student_id(&self) -> StudentId {
        (**self).student_id()
    }

    fn course_id(&self) -> CourseId {
        (**self).course_id()
    }
}
