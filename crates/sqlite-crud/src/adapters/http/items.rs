//! Fixed-schema `items` resource kept for older clients. The table is
//! created on first access.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiResult, AppState};
use crate::{
    core::{Operation, OperationResult, SqlValue},
    error::AppError,
};

const CREATE_ITEMS: &str = "CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    value TEXT NOT NULL
)";

#[derive(Debug, Deserialize)]
pub struct ItemBody {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub value: Value,
}

/// Ensures the table, then runs `op` on the same handle.
async fn with_items_table(state: &AppState, op: Operation) -> Result<OperationResult, AppError> {
    let mut results = state
        .runner
        .run_all(state.db_path(), vec![Operation::raw(CREATE_ITEMS), op])
        .await?;
    results
        .pop()
        .ok_or_else(|| AppError::Internal("missing items result".into()))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = with_items_table(&state, Operation::raw("SELECT * FROM items")).await?;
    let rows = result
        .rows()
        .map(|r| serde_json::to_value(&r.rows))
        .transpose()
        .map_err(AppError::from)?
        .unwrap_or_else(|| json!([]));
    Ok(Json(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ItemBody>,
) -> ApiResult<Json<Value>> {
    let op = Operation::raw_with_params(
        "INSERT INTO items (name, value) VALUES (?, ?)",
        vec![SqlValue::from(&body.name), SqlValue::from(&body.value)],
    );
    let result = with_items_table(&state, op).await?;
    let id = result.mutation().and_then(|m| m.inserted_id);
    Ok(Json(json!({ "id": id, "name": body.name, "value": body.value })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ItemBody>,
) -> ApiResult<Json<Value>> {
    let op = Operation::raw_with_params(
        "UPDATE items SET name = ?, value = ? WHERE id = ?",
        vec![
            SqlValue::from(&body.name),
            SqlValue::from(&body.value),
            SqlValue::Text(id.clone()),
        ],
    );
    with_items_table(&state, op).await?;
    Ok(Json(json!({ "id": id, "name": body.name, "value": body.value })))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let op = Operation::raw_with_params(
        "DELETE FROM items WHERE id = ?",
        vec![SqlValue::Text(id.clone())],
    );
    with_items_table(&state, op).await?;
    Ok(Json(json!({ "id": id })))
}
