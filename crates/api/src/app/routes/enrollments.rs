use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use crate::app::routes::common::{parse_course_id, parse_student_id};
use crate::app::{dto, errors, with_service, AppState};

pub fn router() -> Router {
    Router::new().route("/", post(enroll))
}

pub async fn enroll(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::EnrollPayload>,
) -> axum::response::Response {
    let student_id = match parse_student_id(&body.student_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let course_id = match parse_course_id(&body.course_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match with_service(state, move |svc| svc.enroll(student_id, course_id)).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "student_id": student_id.to_string(),
                "course_id": course_id.to_string(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
