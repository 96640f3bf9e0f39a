use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use registra_infra::service::ServiceError;

use crate::app::routes::common::parse_student_id;
use crate::app::{dto, errors, with_service, AppState};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_student).get(list_students))
        .route(
            "/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
}

pub async fn create_student(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::StudentPayload>,
) -> axum::response::Response {
    let input = body.into_input();
    match with_service(state, move |svc| svc.create_student(input)).await {
        Ok(student) => {
            (StatusCode::CREATED, Json(dto::student_to_json(&student))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// List all students, or only those whose full name matches `?q=`.
pub async fn list_students(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<dto::SearchParams>,
) -> axum::response::Response {
    let result = with_service(state, move |svc| {
        Ok(match params.q.as_deref() {
            Some(q) if !q.is_empty() => svc.search_students(q),
            _ => svc.students(),
        })
    })
    .await;
    match result {
        Ok(students) => {
            let items = students.iter().map(dto::student_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_student(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_student_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match with_service(state, move |svc| {
        svc.student(id).cloned().ok_or(ServiceError::NotFound)
    })
    .await
    {
        Ok(student) => (StatusCode::OK, Json(dto::student_to_json(&student))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_student(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StudentPayload>,
) -> axum::response::Response {
    let id = match parse_student_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let input = body.into_input();
    match with_service(state, move |svc| svc.update_student(id, input)).await {
        Ok(student) => (StatusCode::OK, Json(dto::student_to_json(&student))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_student(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_student_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match with_service(state, move |svc| svc.delete_student(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
