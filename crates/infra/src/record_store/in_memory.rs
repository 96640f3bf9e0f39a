use std::collections::HashMap;
use std::sync::RwLock;

use registra_academics::{CourseId, StudentId};

use super::r#trait::{CourseRow, EnrollmentRow, RecordStore, RecordStoreError, StudentRow};

#[derive(Debug, Default)]
struct Tables {
    students: HashMap<StudentId, StudentRow>,
    courses: HashMap<CourseId, CourseRow>,
    enrollments: Vec<EnrollmentRow>,
}

/// In-memory record store.
///
/// Intended for tests/dev. Enforces the same integrity rules the relational
/// backend gets from its schema: unique record ids, unique enrollment edges,
/// and edges only between existing records.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, RecordStoreError> {
        self.inner
            .read()
            .map_err(|_| RecordStoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, RecordStoreError> {
        self.inner
            .write()
            .map_err(|_| RecordStoreError::Backend("lock poisoned".to_string()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert_student(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        if tables.students.contains_key(&row.id) {
            return Err(RecordStoreError::Conflict(format!("student {}", row.id)));
        }
        tables.students.insert(row.id, row.clone());
        Ok(())
    }

    fn update_student(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        match tables.students.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(RecordStoreError::MissingRecord(format!(
                "student {}",
                row.id
            ))),
        }
    }

    fn delete_student(&self, id: StudentId) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        if tables.students.remove(&id).is_none() {
            return Err(RecordStoreError::MissingRecord(format!("student {id}")));
        }
        Ok(())
    }

    fn load_students(&self) -> Result<Vec<StudentRow>, RecordStoreError> {
        Ok(self.read()?.students.values().cloned().collect())
    }

    fn insert_course(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        if tables.courses.contains_key(&row.id) {
            return Err(RecordStoreError::Conflict(format!("course {}", row.id)));
        }
        tables.courses.insert(row.id, row.clone());
        Ok(())
    }

    fn update_course(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        match tables.courses.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(RecordStoreError::MissingRecord(format!("course {}", row.id))),
        }
    }

    fn delete_course(&self, id: CourseId) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        if tables.courses.remove(&id).is_none() {
            return Err(RecordStoreError::MissingRecord(format!("course {id}")));
        }
        Ok(())
    }

    fn load_courses(&self) -> Result<Vec<CourseRow>, RecordStoreError> {
        Ok(self.read()?.courses.values().cloned().collect())
    }

    fn add_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        if !tables.students.contains_key(&student_id) {
            return Err(RecordStoreError::MissingRecord(format!(
                "student {student_id}"
            )));
        }
        if !tables.courses.contains_key(&course_id) {
            return Err(RecordStoreError::MissingRecord(format!("course {course_id}")));
        }
        let edge = EnrollmentRow {
            student_id,
            course_id,
        };
        if tables.enrollments.contains(&edge) {
            return Err(RecordStoreError::Conflict(format!(
                "enrollment {student_id}/{course_id}"
            )));
        }
        tables.enrollments.push(edge);
        Ok(())
    }

    fn remove_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        let before = tables.enrollments.len();
        tables
            .enrollments
            .retain(|e| !(e.student_id == student_id && e.course_id == course_id));
        if tables.enrollments.len() == before {
            return Err(RecordStoreError::MissingRecord(format!(
                "enrollment {student_id}/{course_id}"
            )));
        }
        Ok(())
    }

    fn remove_enrollments_for_student(&self, id: StudentId) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        tables.enrollments.retain(|e| e.student_id != id);
        Ok(())
    }

    fn remove_enrollments_for_course(&self, id: CourseId) -> Result<(), RecordStoreError> {
        let mut tables = self.write()?;
        tables.enrollments.retain(|e| e.course_id != id);
        Ok(())
    }

    fn load_enrollments(&self) -> Result<Vec<EnrollmentRow>, RecordStoreError> {
        Ok(self.read()?.enrollments.clone())
    }
}
