use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use registra_infra::service::ServiceError;

use crate::app::routes::common::parse_course_id;
use crate::app::{dto, errors, with_service, AppState};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_course).get(list_courses))
        .route(
            "/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/:id/roster", get(get_roster))
}

pub async fn create_course(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::CoursePayload>,
) -> axum::response::Response {
    let input = body.into_input();
    match with_service(state, move |svc| svc.create_course(input)).await {
        Ok(course) => (StatusCode::CREATED, Json(dto::course_to_json(&course))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// List all courses, or only those whose name matches `?q=`.
pub async fn list_courses(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<dto::SearchParams>,
) -> axum::response::Response {
    let result = with_service(state, move |svc| {
        Ok(match params.q.as_deref() {
            Some(q) if !q.is_empty() => svc.search_courses(q),
            _ => svc.courses(),
        })
    })
    .await;
    match result {
        Ok(courses) => {
            let items = courses.iter().map(dto::course_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_course_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match with_service(state, move |svc| {
        svc.course(id).cloned().ok_or(ServiceError::NotFound)
    })
    .await
    {
        Ok(course) => (StatusCode::OK, Json(dto::course_to_json(&course))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CoursePayload>,
) -> axum::response::Response {
    let id = match parse_course_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let input = body.into_input();
    match with_service(state, move |svc| svc.update_course(id, input)).await {
        Ok(course) => (StatusCode::OK, Json(dto::course_to_json(&course))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_course_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match with_service(state, move |svc| svc.delete_course(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// The students enrolled in a course, with the "enrolled/capacity" count.
pub async fn get_roster(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_course_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match with_service(state, move |svc| svc.roster(id)).await {
        Ok(roster) => (StatusCode::OK, Json(dto::roster_to_json(&roster))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
