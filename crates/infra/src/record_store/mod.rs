//! Durable storage for student/course records and enrollment edges.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use r#trait::{CourseRow, EnrollmentRow, RecordStore, RecordStoreError, StudentRow};
