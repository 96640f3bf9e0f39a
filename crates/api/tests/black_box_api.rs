//! Black-box tests against the HTTP surface, over the in-memory store.

use std::sync::Arc;

use registra_infra::record_store::{InMemoryRecordStore, RecordStore};

async fn spawn_app() -> String {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let app = registra_api::app::build_app_with_store(store)
        .await
        .expect("app builds");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server runs");
    });

    format!("http://{addr}")
}

async fn create_student(client: &reqwest::Client, base: &str, first: &str, age: u8) -> String {
    let response = client
        .post(format!("{base}/students"))
        .json(&serde_json::json!({
            "first_name": first,
            "last_name": "Tester",
            "age": age,
        }))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.expect("json body");
    body["id"].as_str().expect("id present").to_string()
}

async fn create_course(client: &reqwest::Client, base: &str, name: &str, capacity: u32) -> String {
    let response = client
        .post(format!("{base}/courses"))
        .json(&serde_json::json!({ "name": name, "capacity": capacity }))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.expect("json body");
    body["id"].as_str().expect("id present").to_string()
}

async fn enroll(
    client: &reqwest::Client,
    base: &str,
    student_id: &str,
    course_id: &str,
) -> reqwest::Response {
    client
        .post(format!("{base}/enrollments"))
        .json(&serde_json::json!({
            "student_id": student_id,
            "course_id": course_id,
        }))
        .send()
        .await
        .expect("request succeeds")
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let base = spawn_app().await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn underage_student_is_a_validation_error() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/students"))
        .json(&serde_json::json!({
            "first_name": "Kid",
            "last_name": "Genius",
            "age": 17,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let list: serde_json::Value = client
        .get(format!("{base}/students"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn full_course_rejects_the_next_enrollment() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let x = create_student(&client, &base, "Xavier", 20).await;
    let y = create_student(&client, &base, "Yvonne", 20).await;
    let a = create_course(&client, &base, "Seminar A", 1).await;

    assert_eq!(
        enroll(&client, &base, &x, &a).await.status(),
        reqwest::StatusCode::CREATED
    );
    let rejected = enroll(&client, &base, &y, &a).await;
    assert_eq!(rejected.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = rejected.json().await.unwrap();
    assert_eq!(body["error"], "course_full");

    let roster: serde_json::Value = client
        .get(format!("{base}/courses/{a}/roster"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster["occupancy"], "1/1");
    assert_eq!(roster["students"].as_array().unwrap().len(), 1);
    assert_eq!(roster["students"][0]["id"], x.as_str());
}

#[tokio::test]
async fn duplicate_enrollment_is_a_conflict() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let x = create_student(&client, &base, "Xavier", 20).await;
    let a = create_course(&client, &base, "Algebra", 30).await;

    enroll(&client, &base, &x, &a).await;
    let second = enroll(&client, &base, &x, &a).await;
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"], "already_enrolled");
}

#[tokio::test]
async fn deleting_a_student_twice_is_not_found() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let x = create_student(&client, &base, "Once", 20).await;

    let first = client
        .delete(format!("{base}/students/{x}"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::NO_CONTENT);

    let second = client
        .delete(format!("{base}/students/{x}"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_rejected_at_the_boundary() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/students/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn search_filters_by_substring() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    create_student(&client, &base, "Ada", 21).await;
    create_student(&client, &base, "Grace", 37).await;

    let list: serde_json::Value = client
        .get(format!("{base}/students?q=ada"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["first_name"], "Ada");
}
