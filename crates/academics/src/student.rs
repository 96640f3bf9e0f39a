use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use registra_core::{DomainError, DomainResult, Entity, RecordId, ValueObject};

use crate::course::CourseId;

/// Minimum age accepted at creation and at update.
pub const MIN_STUDENT_AGE: u8 = 18;

/// Student identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub RecordId);

impl StudentId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StudentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Validated input for creating or updating a student.
///
/// Enrollments are never part of this payload: updates must not be able to
/// silently clear them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub age: u8,
}

impl NewStudent {
    pub fn validate(&self) -> DomainResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(DomainError::validation("first name cannot be empty"));
        }
        if self.last_name.trim().is_empty() {
            return Err(DomainError::validation("last name cannot be empty"));
        }
        if self.age < MIN_STUDENT_AGE {
            return Err(DomainError::validation(format!(
                "students must be at least {MIN_STUDENT_AGE}"
            )));
        }
        Ok(())
    }
}

impl ValueObject for NewStudent {}

/// Entity: Student.
///
/// `enrolled_courses` has set semantics (no duplicates) but preserves
/// insertion order for display stability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    id: StudentId,
    first_name: String,
    last_name: String,
    age: u8,
    enrolled_courses: Vec<CourseId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Student {
    /// Create a new student with an empty enrollment set.
    pub fn create(id: StudentId, input: NewStudent, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            age: input.age,
            enrolled_courses: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a student from stored fields, with an empty enrollment set.
    ///
    /// No validation: the record store is the source of truth on startup.
    /// The loader re-links stored enrollment edges afterwards.
    pub fn restore(
        id: StudentId,
        first_name: String,
        last_name: String,
        age: u8,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            age,
            enrolled_courses: Vec::new(),
            created_at,
            updated_at,
        }
    }

    /// Replace the student's editable fields. Enrollments are untouched.
    pub fn update(&mut self, input: NewStudent, now: DateTime<Utc>) -> DomainResult<()> {
        input.validate()?;
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.age = input.age;
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> StudentId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn enrolled_courses(&self) -> &[CourseId] {
        &self.enrolled_courses
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match against the full name.
    pub fn matches_name(&self, query: &str) -> bool {
        self.full_name()
            .to_lowercase()
            .contains(&query.to_lowercase())
    }

    pub fn is_enrolled(&self, course_id: CourseId) -> bool {
        self.enrolled_courses.contains(&course_id)
    }

    /// One-sided mutation. Callers keep both sides of the edge in step;
    /// go through `enrollment::link` / `enrollment::unlink` unless the
    /// counterpart record is being deleted outright.
    pub fn record_enrollment(&mut self, course_id: CourseId) {
        if !self.enrolled_courses.contains(&course_id) {
            self.enrolled_courses.push(course_id);
        }
    }

    /// One-sided mutation; see `record_enrollment`.
    pub fn drop_course(&mut self, course_id: CourseId) {
        self.enrolled_courses.retain(|id| *id != course_id);
    }
}

impl Entity for Student {
    type Id = StudentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
