use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use registra_infra::service::ServiceError;

/// Map each error kind to an HTTP status and a human-readable message.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        ServiceError::AlreadyEnrolled => json_error(
            StatusCode::CONFLICT,
            "already_enrolled",
            "student is already enrolled in this course",
        ),
        ServiceError::StudentLimitReached => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "student_limit_reached",
            "student has reached the enrollment limit",
        ),
        ServiceError::CourseFull => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "course_full",
            "course has reached its capacity",
        ),
        ServiceError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
