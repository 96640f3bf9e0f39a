use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use registra_core::{DomainError, DomainResult, Entity, RecordId, ValueObject};

use crate::student::StudentId;

/// Course identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub RecordId);

impl CourseId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CourseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Validated input for creating or updating a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub capacity: u32,
}

impl NewCourse {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.capacity == 0 {
            return Err(DomainError::validation("capacity must be positive"));
        }
        Ok(())
    }
}

impl ValueObject for NewCourse {}

/// Entity: Course.
///
/// `enrolled_students` has set semantics (no duplicates) but preserves
/// insertion order for display stability. Its size never exceeds `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    name: String,
    capacity: u32,
    enrolled_students: Vec<StudentId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Course {
    /// Create a new course with an empty roster.
    pub fn create(id: CourseId, input: NewCourse, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id,
            name: input.name,
            capacity: input.capacity,
            enrolled_students: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a course from stored fields, with an empty roster.
    ///
    /// No validation: the record store is the source of truth on startup.
    /// The loader re-links stored enrollment edges afterwards.
    pub fn restore(
        id: CourseId,
        name: String,
        capacity: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            capacity,
            enrolled_students: Vec::new(),
            created_at,
            updated_at,
        }
    }

    /// Replace the course's editable fields. The roster is untouched.
    ///
    /// A capacity below the current enrolled count is rejected: a course is
    /// never left over-capacity.
    pub fn update(&mut self, input: NewCourse, now: DateTime<Utc>) -> DomainResult<()> {
        input.validate()?;
        if (input.capacity as usize) < self.enrolled_students.len() {
            return Err(DomainError::validation("capacity below current enrollment"));
        }
        self.name = input.name;
        self.capacity = input.capacity;
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> CourseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn enrolled_students(&self) -> &[StudentId] {
        &self.enrolled_students
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Case-insensitive substring match against the course name.
    pub fn matches_name(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn has_student(&self, student_id: StudentId) -> bool {
        self.enrolled_students.contains(&student_id)
    }

    pub fn is_full(&self) -> bool {
        self.enrolled_students.len() as u64 >= self.capacity as u64
    }

    /// "enrolled/capacity" display aid.
    pub fn occupancy(&self) -> String {
        format!("{}/{}", self.enrolled_students.len(), self.capacity)
    }

    /// One-sided mutation. Callers keep both sides of the edge in step;
    /// go through `enrollment::link` / `enrollment::unlink` unless the
    /// counterpart record is being deleted outright.
    pub fn record_enrollment(&mut self, student_id: StudentId) {
        if !self.enrolled_students.contains(&student_id) {
            self.enrolled_students.push(student_id);
        }
    }

    /// One-sided mutation; see `record_enrollment`.
    pub fn drop_student(&mut self, student_id: StudentId) {
        self.enrolled_students.retain(|id| *id != student_id);
    }
}

impl Entity for Course {
    type Id = CourseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_course_id() -> CourseId {
        CourseId::new(RecordId::new())
    }

    fn test_student_id() -> StudentId {
        StudentId::new(RecordId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn create_rejects_zero_capacity() {
        let input = NewCourse {
            name: "Algebra".to_string(),
            capacity: 0,
        };
        let err = Course::create(test_course_id(), input, test_time()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_blank_name() {
        let input = NewCourse {
            name: "  ".to_string(),
            capacity: 10,
        };
        Course::create(test_course_id(), input, test_time()).unwrap_err();
    }

    #[test]
    fn update_with_identical_values_changes_nothing_observable() {
        let input = NewCourse {
            name: "Algebra".to_string(),
            capacity: 30,
        };
        let mut course = Course::create(test_course_id(), input.clone(), test_time()).unwrap();
        let before_name = course.name().to_string();
        let before_capacity = course.capacity();
        let before_roster = course.enrolled_students().to_vec();

        course.update(input, test_time()).unwrap();

        assert_eq!(course.name(), before_name);
        assert_eq!(course.capacity(), before_capacity);
        assert_eq!(course.enrolled_students(), before_roster.as_slice());
    }

    #[test]
    fn update_rejects_capacity_below_enrollment() {
        let mut course = Course::create(
            test_course_id(),
            NewCourse {
                name: "Algebra".to_string(),
                capacity: 3,
            },
            test_time(),
        )
        .unwrap();
        course.record_enrollment(test_student_id());
        course.record_enrollment(test_student_id());

        let err = course
            .update(
                NewCourse {
                    name: "Algebra".to_string(),
                    capacity: 1,
                },
                test_time(),
            )
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("capacity below current enrollment") => {}
            other => panic!("expected capacity rejection, got {other:?}"),
        }
        assert_eq!(course.capacity(), 3);
    }

    #[test]
    fn occupancy_reads_enrolled_over_capacity() {
        let mut course = Course::create(
            test_course_id(),
            NewCourse {
                name: "Algebra".to_string(),
                capacity: 30,
            },
            test_time(),
        )
        .unwrap();
        course.record_enrollment(test_student_id());
        assert_eq!(course.occupancy(), "1/30");
    }

    #[test]
    fn is_full_tracks_capacity() {
        let mut course = Course::create(
            test_course_id(),
            NewCourse {
                name: "Seminar".to_string(),
                capacity: 1,
            },
            test_time(),
        )
        .unwrap();
        assert!(!course.is_full());
        course.record_enrollment(test_student_id());
        assert!(course.is_full());
    }
}
