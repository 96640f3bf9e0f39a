use std::sync::{Arc, Mutex};

use axum::{extract::Extension, routing::get, Router};

use registra_infra::id_gen::UuidIdGenerator;
use registra_infra::record_store::{
    InMemoryRecordStore, PostgresRecordStore, RecordStore, RecordStoreError,
};
use registra_infra::service::{EnrollmentService, ServiceError};

pub mod dto;
pub mod errors;
pub mod routes;

/// The service behind the API, type-erased over the store choice.
pub type Service = EnrollmentService<Arc<dyn RecordStore>, UuidIdGenerator>;

/// Shared application state.
///
/// Mutating service calls take `&mut self`, so the whole service sits behind
/// one mutex: a single mutual-exclusion scope per call keeps the enrollment
/// invariants from ever being observed mid-mutation.
pub struct AppState {
    service: Mutex<Service>,
}

impl AppState {
    pub fn new(service: Service) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }
}

/// Run one service call on a blocking-capable thread.
///
/// The store bridge (`PostgresRecordStore`) blocks on async IO internally,
/// so service calls never run directly on an async worker.
pub(crate) async fn with_service<T, F>(state: Arc<AppState>, op: F) -> Result<T, ServiceError>
where
    F: FnOnce(&mut Service) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut service = state.service.lock().map_err(|_| {
            ServiceError::Store(RecordStoreError::Backend("service lock poisoned".to_string()))
        })?;
        op(&mut service)
    })
    .await
    .map_err(|e| ServiceError::Store(RecordStoreError::Backend(e.to_string())))?
}

/// Build the application against the store selected by the environment:
/// Postgres when `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_app() -> anyhow::Result<Router> {
    let store: Arc<dyn RecordStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            tracing::info!("using postgres record store");
            Arc::new(PostgresRecordStore::connect(&url).await?)
        }
        Err(_) => {
            tracing::info!("using in-memory record store");
            Arc::new(InMemoryRecordStore::new())
        }
    };
    build_app_with_store(store).await
}

/// Build the application over an explicit store (tests use this).
pub async fn build_app_with_store(store: Arc<dyn RecordStore>) -> anyhow::Result<Router> {
    // `load` performs blocking store calls; keep it off the async workers.
    let service =
        tokio::task::spawn_blocking(move || EnrollmentService::load(store, UuidIdGenerator::new()))
            .await??;
    let state = Arc::new(AppState::new(service));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/students", routes::students::router())
        .nest("/courses", routes::courses::router())
        .nest("/enrollments", routes::enrollments::router())
        .layer(Extension(state)))
}
