use axum::http::StatusCode;

use registra_academics::{CourseId, StudentId};
use registra_core::RecordId;

use crate::app::errors;

/// Parse a path/body identifier, rejecting malformed input at the boundary.
pub fn parse_student_id(raw: &str) -> Result<StudentId, axum::response::Response> {
    raw.parse::<RecordId>()
        .map(StudentId::new)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn parse_course_id(raw: &str) -> Result<CourseId, axum::response::Response> {
    raw.parse::<RecordId>()
        .map(CourseId::new)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
