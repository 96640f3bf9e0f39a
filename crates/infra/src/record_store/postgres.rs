//! Postgres-backed record store implementation.
//!
//! Persists students, courses and the enrollment link table in PostgreSQL,
//! mirroring the `RecordStore` integrity rules at the database level: primary
//! keys on record ids, a composite primary key on the link table (one edge per
//! student/course pair) and foreign keys from edges to both endpoints.
//!
//! ## Error mapping
//!
//! | PostgreSQL error code | RecordStoreError | Scenario |
//! |-----------------------|------------------|----------|
//! | `23505` (unique violation) | `Conflict` | duplicate record id or duplicate enrollment edge |
//! | `23503` (foreign key violation) | `MissingRecord` | enrollment edge to a deleted record |
//! | other database errors | `Backend` | constraint/IO failures |
//! | non-database errors (pool, network) | `Backend` | connection failures etc. |
//!
//! ## Sync bridge
//!
//! The `RecordStore` trait is synchronous while sqlx is async. Trait methods
//! bridge through `tokio::runtime::Handle::block_on`, which requires a tokio
//! runtime context; call them from a blocking-capable thread (e.g.
//! `tokio::task::spawn_blocking`), never from an async task directly.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use registra_academics::{CourseId, StudentId};
use registra_core::RecordId;

use super::r#trait::{CourseRow, EnrollmentRow, RecordStore, RecordStoreError, StudentRow};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id         UUID PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    age        SMALLINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    id         UUID PRIMARY KEY,
    name       TEXT NOT NULL,
    capacity   INTEGER NOT NULL CHECK (capacity > 0),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS enrollments (
    student_id UUID NOT NULL REFERENCES students(id),
    course_id  UUID NOT NULL REFERENCES courses(id),
    PRIMARY KEY (student_id, course_id)
);
"#;

/// Postgres-backed record store.
///
/// Thread-safe: the sqlx pool is `Send + Sync` and handles connection
/// management internally.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bootstrap the schema.
    pub async fn connect(url: &str) -> Result<Self, RecordStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(map_sqlx_err)?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the tables when they don't exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RecordStoreError> {
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        }
        Ok(())
    }

    async fn insert_student_async(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        sqlx::query(
            "INSERT INTO students (id, first_name, last_name, age, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(student_uuid(row.id))
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(i16::from(row.age))
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn update_student_async(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        let result = sqlx::query(
            "UPDATE students SET first_name = $2, last_name = $3, age = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(student_uuid(row.id))
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(i16::from(row.age))
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RecordStoreError::MissingRecord(format!(
                "student {}",
                row.id
            )));
        }
        Ok(())
    }

    async fn delete_student_async(&self, id: StudentId) -> Result<(), RecordStoreError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(student_uuid(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RecordStoreError::MissingRecord(format!("student {id}")));
        }
        Ok(())
    }

    async fn load_students_async(&self) -> Result<Vec<StudentRow>, RecordStoreError> {
        let rows = sqlx::query(
            "SELECT id, first_name, last_name, age, created_at, updated_at FROM students",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(StudentRow {
                    id: StudentId::new(RecordId::from_uuid(
                        row.try_get::<Uuid, _>("id").map_err(map_sqlx_err)?,
                    )),
                    first_name: row.try_get("first_name").map_err(map_sqlx_err)?,
                    last_name: row.try_get("last_name").map_err(map_sqlx_err)?,
                    age: row.try_get::<i16, _>("age").map_err(map_sqlx_err)? as u8,
                    created_at: row
                        .try_get::<DateTime<Utc>, _>("created_at")
                        .map_err(map_sqlx_err)?,
                    updated_at: row
                        .try_get::<DateTime<Utc>, _>("updated_at")
                        .map_err(map_sqlx_err)?,
                })
            })
            .collect()
    }

    async fn insert_course_async(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        sqlx::query(
            "INSERT INTO courses (id, name, capacity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(course_uuid(row.id))
        .bind(&row.name)
        .bind(row.capacity as i32)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn update_course_async(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        let result = sqlx::query(
            "UPDATE courses SET name = $2, capacity = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(course_uuid(row.id))
        .bind(&row.name)
        .bind(row.capacity as i32)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RecordStoreError::MissingRecord(format!("course {}", row.id)));
        }
        Ok(())
    }

    async fn delete_course_async(&self, id: CourseId) -> Result<(), RecordStoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_uuid(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RecordStoreError::MissingRecord(format!("course {id}")));
        }
        Ok(())
    }

    async fn load_courses_async(&self) -> Result<Vec<CourseRow>, RecordStoreError> {
        let rows = sqlx::query("SELECT id, name, capacity, created_at, updated_at FROM courses")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(CourseRow {
                    id: CourseId::new(RecordId::from_uuid(
                        row.try_get::<Uuid, _>("id").map_err(map_sqlx_err)?,
                    )),
                    name: row.try_get("name").map_err(map_sqlx_err)?,
                    capacity: row.try_get::<i32, _>("capacity").map_err(map_sqlx_err)? as u32,
                    created_at: row
                        .try_get::<DateTime<Utc>, _>("created_at")
                        .map_err(map_sqlx_err)?,
                    updated_at: row
                        .try_get::<DateTime<Utc>, _>("updated_at")
                        .map_err(map_sqlx_err)?,
                })
            })
            .collect()
    }

    async fn add_enrollment_async(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        sqlx::query("INSERT INTO enrollments (student_id, course_id) VALUES ($1, $2)")
            .bind(student_uuid(student_id))
            .bind(course_uuid(course_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn remove_enrollment_async(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        let result =
            sqlx::query("DELETE FROM enrollments WHERE student_id = $1 AND course_id = $2")
                .bind(student_uuid(student_id))
                .bind(course_uuid(course_id))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RecordStoreError::MissingRecord(format!(
                "enrollment {student_id}/{course_id}"
            )));
        }
        Ok(())
    }

    async fn remove_enrollments_for_student_async(
        &self,
        id: StudentId,
    ) -> Result<(), RecordStoreError> {
        sqlx::query("DELETE FROM enrollments WHERE student_id = $1")
            .bind(student_uuid(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn remove_enrollments_for_course_async(
        &self,
        id: CourseId,
    ) -> Result<(), RecordStoreError> {
        sqlx::query("DELETE FROM enrollments WHERE course_id = $1")
            .bind(course_uuid(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn load_enrollments_async(&self) -> Result<Vec<EnrollmentRow>, RecordStoreError> {
        let rows = sqlx::query("SELECT student_id, course_id FROM enrollments")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(EnrollmentRow {
                    student_id: StudentId::new(RecordId::from_uuid(
                        row.try_get::<Uuid, _>("student_id").map_err(map_sqlx_err)?,
                    )),
                    course_id: CourseId::new(RecordId::from_uuid(
                        row.try_get::<Uuid, _>("course_id").map_err(map_sqlx_err)?,
                    )),
                })
            })
            .collect()
    }
}

fn student_uuid(id: StudentId) -> Uuid {
    *id.0.as_uuid()
}

fn course_uuid(id: CourseId) -> Uuid {
    *id.0.as_uuid()
}

fn map_sqlx_err(err: sqlx::Error) -> RecordStoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => RecordStoreError::Conflict(db.message().to_string()),
            Some("23503") => RecordStoreError::MissingRecord(db.message().to_string()),
            _ => RecordStoreError::Backend(db.message().to_string()),
        },
        _ => RecordStoreError::Backend(err.to_string()),
    }
}

fn runtime_handle() -> Result<tokio::runtime::Handle, RecordStoreError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        RecordStoreError::Backend(
            "PostgresRecordStore requires a tokio runtime context".to_string(),
        )
    })
}

impl RecordStore for PostgresRecordStore {
    fn insert_student(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.insert_student_async(row))
    }

    fn update_student(&self, row: &StudentRow) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.update_student_async(row))
    }

    fn delete_student(&self, id: StudentId) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.delete_student_async(id))
    }

    fn load_students(&self) -> Result<Vec<StudentRow>, RecordStoreError> {
        runtime_handle()?.block_on(self.load_students_async())
    }

    fn insert_course(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.insert_course_async(row))
    }

    fn update_course(&self, row: &CourseRow) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.update_course_async(row))
    }

    fn delete_course(&self, id: CourseId) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.delete_course_async(id))
    }

    fn load_courses(&self) -> Result<Vec<CourseRow>, RecordStoreError> {
        runtime_handle()?.block_on(self.load_courses_async())
    }

    fn add_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.add_enrollment_async(student_id, course_id))
    }

    fn remove_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.remove_enrollment_async(student_id, course_id))
    }

    fn remove_enrollments_for_student(&self, id: StudentId) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.remove_enrollments_for_student_async(id))
    }

    fn remove_enrollments_for_course(&self, id: CourseId) -> Result<(), RecordStoreError> {
        runtime_handle()?.block_on(self.remove_enrollments_for_course_async(id))
    }

    fn load_enrollments(&self) -> Result<Vec<EnrollmentRow>, RecordStoreError> {
        runtime_handle()?.block_on(self.load_enrollments_async())
    }
}
