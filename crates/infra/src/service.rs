//! Enrollment application service (application-level orchestration).
//!
//! `EnrollmentService` owns the in-memory Student and Course collections and
//! is the single choke point for every read and write against them: all the
//! enrollment invariants (bidirectional consistency, the per-student course
//! limit, course capacity) are enforced here instead of being re-checked ad
//! hoc at call sites.
//!
//! ## Mutation flow
//!
//! ```text
//! Input
//!   ↓
//! 1. Validate (reject before any mutation)
//!   ↓
//! 2. Resolve records in the in-memory collections (NotFound here)
//!   ↓
//! 3. Persist to the RecordStore (durable step)
//!   ↓
//! 4. Reflect in memory (both sides of an edge together, or neither)
//! ```
//!
//! Persist-then-reflect: in-memory state changes only after every store call
//! succeeded, so an error never leaves the collections partially mutated.
//! The store makes no multi-row atomicity promise; the two-call cascade
//! paths compensate by re-inserting removed enrollment links when the second
//! call fails.
//!
//! Mutating operations take `&mut self`. Concurrent callers must serialize
//! access (one mutual-exclusion scope per mutating call); the HTTP layer
//! wraps the service in a single mutex.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use registra_academics::{
    enrollment, Course, CourseId, NewCourse, NewStudent, Student, StudentId,
};
use registra_core::DomainError;

use crate::id_gen::IdGenerator;
use crate::record_store::{CourseRow, RecordStore, RecordStoreError, StudentRow};

/// Error surface of the enrollment service.
///
/// Deterministic domain failures keep their kind; collaborator I/O failures
/// surface as `Store` and are never swallowed or retried here.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("student is already enrolled in this course")]
    AlreadyEnrolled,

    #[error("student has reached the enrollment limit")]
    StudentLimitReached,

    #[error("course has reached its capacity")]
    CourseFull,

    #[error("record store failure: {0}")]
    Store(#[from] RecordStoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::NotFound => ServiceError::NotFound,
            DomainError::AlreadyEnrolled => ServiceError::AlreadyEnrolled,
            DomainError::StudentLimitReached => ServiceError::StudentLimitReached,
            DomainError::CourseFull => ServiceError::CourseFull,
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

/// The students enrolled in one course, with the "enrolled/capacity"
/// occupancy display aid. Computed fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRoster {
    pub course_id: CourseId,
    pub course_name: String,
    pub students: Vec<Student>,
    pub occupancy: String,
}

/// Application service owning the Student and Course collections.
pub struct EnrollmentService<S, G> {
    store: S,
    ids: G,
    students: HashMap<StudentId, Student>,
    courses: HashMap<CourseId, Course>,
}

impl<S, G> EnrollmentService<S, G>
where
    S: RecordStore,
    G: IdGenerator,
{
    /// Build the service from the record store's current contents.
    ///
    /// The store is the source of truth on startup: records are rehydrated
    /// and every stored enrollment edge is re-linked on both sides. An edge
    /// referencing a missing record cannot be represented without breaking
    /// bidirectional consistency, so it is dropped with a warning.
    pub fn load(store: S, ids: G) -> Result<Self, ServiceError> {
        let mut students: HashMap<StudentId, Student> = store
            .load_students()?
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    Student::restore(
                        row.id,
                        row.first_name,
                        row.last_name,
                        row.age,
                        row.created_at,
                        row.updated_at,
                    ),
                )
            })
            .collect();
        let mut courses: HashMap<CourseId, Course> = store
            .load_courses()?
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    Course::restore(row.id, row.name, row.capacity, row.created_at, row.updated_at),
                )
            })
            .collect();

        for edge in store.load_enrollments()? {
            match (
                students.get_mut(&edge.student_id),
                courses.get_mut(&edge.course_id),
            ) {
                (Some(student), Some(course)) => enrollment::link(student, course),
                _ => {
                    tracing::warn!(
                        student_id = %edge.student_id,
                        course_id = %edge.course_id,
                        "dropping dangling enrollment edge"
                    );
                }
            }
        }

        tracing::info!(
            students = students.len(),
            courses = courses.len(),
            "enrollment service loaded"
        );

        Ok(Self {
            store,
            ids,
            students,
            courses,
        })
    }

    // ---- students ----------------------------------------------------------

    pub fn create_student(&mut self, input: NewStudent) -> Result<Student, ServiceError> {
        let id = self.ids.student_id();
        let student = Student::create(id, input, Utc::now())?;

        self.store.insert_student(&student_row(&student))?;
        self.students.insert(id, student.clone());

        tracing::info!(student_id = %id, "student created");
        Ok(student)
    }

    pub fn update_student(
        &mut self,
        id: StudentId,
        input: NewStudent,
    ) -> Result<Student, ServiceError> {
        let current = self.students.get(&id).ok_or(DomainError::NotFound)?;

        let mut updated = current.clone();
        updated.update(input, Utc::now())?;

        self.store.update_student(&student_row(&updated))?;
        self.students.insert(id, updated.clone());

        tracing::info!(student_id = %id, "student updated");
        Ok(updated)
    }

    /// Delete a student and cascade the id out of every course roster.
    ///
    /// Repeating the call after success yields `NotFound`.
    pub fn delete_student(&mut self, id: StudentId) -> Result<(), ServiceError> {
        let student = self.students.get(&id).ok_or(DomainError::NotFound)?;
        let enrolled: Vec<CourseId> = student.enrolled_courses().to_vec();

        self.store.remove_enrollments_for_student(id)?;
        if let Err(err) = self.store.delete_student(id) {
            self.compensate_student_edges(id, &enrolled);
            return Err(err.into());
        }

        self.students.remove(&id);
        for course_id in enrolled {
            if let Some(course) = self.courses.get_mut(&course_id) {
                course.drop_student(id);
            }
        }

        tracing::info!(student_id = %id, "student deleted");
        Ok(())
    }

    // ---- courses -----------------------------------------------------------

    pub fn create_course(&mut self, input: NewCourse) -> Result<Course, ServiceError> {
        let id = self.ids.course_id();
        let course = Course::create(id, input, Utc::now())?;

        self.store.insert_course(&course_row(&course))?;
        self.courses.insert(id, course.clone());

        tracing::info!(course_id = %id, "course created");
        Ok(course)
    }

    /// Update a course's name and capacity.
    ///
    /// A capacity below the current enrolled count is rejected, so a course
    /// is never observable over-capacity.
    pub fn update_course(
        &mut self,
        id: CourseId,
        input: NewCourse,
    ) -> Result<Course, ServiceError> {
        let current = self.courses.get(&id).ok_or(DomainError::NotFound)?;

        let mut updated = current.clone();
        updated.update(input, Utc::now())?;

        self.store.update_course(&course_row(&updated))?;
        self.courses.insert(id, updated.clone());

        tracing::info!(course_id = %id, "course updated");
        Ok(updated)
    }

    /// Delete a course and cascade the id out of every student's enrollments.
    pub fn delete_course(&mut self, id: CourseId) -> Result<(), ServiceError> {
        let course = self.courses.get(&id).ok_or(DomainError::NotFound)?;
        let enrolled: Vec<StudentId> = course.enrolled_students().to_vec();

        self.store.remove_enrollments_for_course(id)?;
        if let Err(err) = self.store.delete_course(id) {
            self.compensate_course_edges(id, &enrolled);
            return Err(err.into());
        }

        self.courses.remove(&id);
        for student_id in enrolled {
            if let Some(student) = self.students.get_mut(&student_id) {
                student.drop_course(id);
            }
        }

        tracing::info!(course_id = %id, "course deleted");
        Ok(())
    }

    // ---- enrollment --------------------------------------------------------

    /// Enroll a student in a course.
    ///
    /// Precondition order, first failure wins: existence of both records,
    /// not already enrolled, student below the course limit, course below
    /// capacity. On success both sides of the edge commit together; the
    /// store sees a single link insert, so there is no partial state to
    /// compensate on this path.
    pub fn enroll(
        &mut self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), ServiceError> {
        let (Some(student), Some(course)) =
            (self.students.get(&student_id), self.courses.get(&course_id))
        else {
            return Err(DomainError::NotFound.into());
        };

        enrollment::authorize(student, course)?;

        self.store.add_enrollment(student_id, course_id)?;

        // Both maps are distinct, so the two mutable borrows are disjoint.
        // Records were resolved above and `&mut self` is held throughout.
        if let (Some(student), Some(course)) = (
            self.students.get_mut(&student_id),
            self.courses.get_mut(&course_id),
        ) {
            enrollment::link(student, course);
        }

        tracing::info!(student_id = %student_id, course_id = %course_id, "student enrolled");
        Ok(())
    }

    // ---- queries (computed fresh per call, never cached) -------------------

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(&id)
    }

    /// All students, ordered by creation time for display stability.
    pub fn students(&self) -> Vec<Student> {
        let mut all: Vec<Student> = self.students.values().cloned().collect();
        all.sort_by_key(|s| (s.created_at(), s.id_typed()));
        all
    }

    /// All courses, ordered by creation time for display stability.
    pub fn courses(&self) -> Vec<Course> {
        let mut all: Vec<Course> = self.courses.values().cloned().collect();
        all.sort_by_key(|c| (c.created_at(), c.id_typed()));
        all
    }

    /// Students whose full name contains the query, case-insensitively.
    pub fn search_students(&self, query: &str) -> Vec<Student> {
        self.students()
            .into_iter()
            .filter(|s| s.matches_name(query))
            .collect()
    }

    /// Courses whose name contains the query, case-insensitively.
    pub fn search_courses(&self, query: &str) -> Vec<Course> {
        self.courses()
            .into_iter()
            .filter(|c| c.matches_name(query))
            .collect()
    }

    /// The students enrolled in a course, in roster order, with the
    /// "enrolled/capacity" display aid.
    pub fn roster(&self, course_id: CourseId) -> Result<CourseRoster, ServiceError> {
        let course = self.courses.get(&course_id).ok_or(DomainError::NotFound)?;
        let students = course
            .enrolled_students()
            .iter()
            .filter_map(|id| self.students.get(id).cloned())
            .collect();
        Ok(CourseRoster {
            course_id,
            course_name: course.name().to_string(),
            students,
            occupancy: course.occupancy(),
        })
    }

    // ---- compensation ------------------------------------------------------

    /// Best-effort re-insertion of enrollment links removed by a cascade
    /// whose record delete then failed. A failure here is logged and the
    /// original store error still surfaces to the caller.
    fn compensate_student_edges(&self, id: StudentId, enrolled: &[CourseId]) {
        for course_id in enrolled {
            if let Err(err) = self.store.add_enrollment(id, *course_id) {
                tracing::warn!(
                    student_id = %id,
                    course_id = %course_id,
                    error = %err,
                    "compensating enrollment re-insert failed"
                );
            }
        }
    }

    fn compensate_course_edges(&self, id: CourseId, enrolled: &[StudentId]) {
        for student_id in enrolled {
            if let Err(err) = self.store.add_enrollment(*student_id, id) {
                tracing::warn!(
                    student_id = %student_id,
                    course_id = %id,
                    error = %err,
                    "compensating enrollment re-insert failed"
                );
            }
        }
    }
}

fn student_row(student: &Student) -> StudentRow {
    StudentRow {
        id: student.id_typed(),
        first_name: student.first_name().to_string(),
        last_name: student.last_name().to_string(),
        age: student.age(),
        created_at: student.created_at(),
        updated_at: student.updated_at(),
    }
}

fn course_row(course: &Course) -> CourseRow {
    CourseRow {
        id: course.id_typed(),
        name: course.name().to_string(),
        capacity: course.capacity(),
        created_at: course.created_at(),
        updated_at: course.updated_at(),
    }
}
