use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlite_crud::adapters::{
    http::{router, AppState},
    Runner,
};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

fn app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let state = AppState::new(dir.path().join("api.sqlite"), Runner::default());
    (dir, router(state))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn with_users(app: &Router) {
    let (status, _) = call(
        app,
        "POST",
        "/query",
        Some(json!({"sql": "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn crud_over_table_routes() {
    let (_dir, app) = app();
    with_users(&app).await;

    let (status, body) = call(&app, "POST", "/table/users", Some(json!({"name": "Ann", "age": 30}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "changes": 1, "message": "Record created successfully"}));

    let (_, body) = call(&app, "GET", "/table/users?where=age%20%3E%2018&limit=10", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["data"][0]["name"], "Ann");

    let (_, body) = call(&app, "PUT", "/table/users/1", Some(json!({"age": 31}))).await;
    assert_eq!(body["changes"], 1);
    assert_eq!(body["message"], "Record updated successfully");

    let (_, body) = call(&app, "DELETE", "/table/users/99", None).await;
    assert_eq!(body, json!({"changes": 0, "message": "No record found with that ID"}));

    let (_, body) = call(&app, "DELETE", "/table/users/1", None).await;
    assert_eq!(body["message"], "Record deleted successfully");
}

#[tokio::test]
async fn raw_query_reads_and_writes() {
    let (_dir, app) = app();
    with_users(&app).await;

    let (_, body) = call(
        &app,
        "POST",
        "/query",
        Some(json!({"sql": "INSERT INTO users (name, age) VALUES (?, ?)", "params": ["Bo", 40]})),
    )
    .await;
    assert_eq!(body["changes"], 1);
    assert_eq!(body["lastID"], 1);
    assert_eq!(body["message"], "Query executed successfully");

    let (_, body) = call(&app, "POST", "/query", Some(json!({"sql": "  select name from users"}))).await;
    assert_eq!(body, json!({"data": [{"name": "Bo"}], "rowCount": 1}));
}

#[tokio::test]
async fn missing_sql_is_a_bad_request() {
    let (_dir, app) = app();
    let (status, body) = call(&app, "POST", "/query", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "SQL query is required"}));
}

#[tokio::test]
async fn database_errors_are_500_with_details() {
    let (_dir, app) = app();
    let (status, body) = call(&app, "GET", "/table/ghosts", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database error");
    assert!(body["details"].as_str().unwrap().contains("no such table"));
}

#[tokio::test]
async fn schema_lists_user_tables() {
    let (_dir, app) = app();
    let (_, body) = call(&app, "GET", "/schema", None).await;
    assert_eq!(body, json!({}));

    with_users(&app).await;
    let (_, body) = call(&app, "GET", "/schema", None).await;
    let cols = body["users"].as_array().unwrap();
    assert_eq!(cols.len(), 3);
    assert_eq!(cols[0]["name"], "id");
    assert_eq!(cols[0]["pk"], 1);
    assert_eq!(cols[1]["notnull"], 0);
    assert_eq!(cols[2]["type"], "INTEGER");
}

#[tokio::test]
async fn items_resource_creates_its_table() {
    let (_dir, app) = app();

    let (_, body) = call(&app, "GET", "/items", None).await;
    assert_eq!(body, json!([]));

    let (_, body) = call(&app, "POST", "/items", Some(json!({"name": "pen", "value": "blue"}))).await;
    assert_eq!(body, json!({"id": 1, "name": "pen", "value": "blue"}));

    let (_, body) = call(&app, "PUT", "/items/1", Some(json!({"name": "pen", "value": "red"}))).await;
    assert_eq!(body, json!({"id": "1", "name": "pen", "value": "red"}));

    let (_, body) = call(&app, "GET", "/items", None).await;
    assert_eq!(body[0]["value"], "red");

    let (_, body) = call(&app, "DELETE", "/items/1", None).await;
    assert_eq!(body, json!({"id": "1"}));
}
