use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ApiError, ApiResult, AppState};
use crate::{
    adapters::coerce_i64,
    core::{
        operation::{DEFAULT_LIMIT, DEFAULT_OFFSET},
        payload, Operation, Record, SelectArgs, SqlValue, UncheckedSql,
    },
};

async fn run(state: &AppState, op: Operation) -> ApiResult<Json<Value>> {
    let result = state.runner.run(state.db_path(), op.clone()).await?;
    Ok(Json(payload::shape(&op, &result)?))
}

pub async fn schema(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    run(&state, Operation::Schema).await
}

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub params: Vec<Value>,
}

pub async fn query(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> ApiResult<Json<Value>> {
    let Some(sql) = body.sql.filter(|s| !s.trim().is_empty()) else {
        return Err(ApiError::BadRequest("SQL query is required"));
    };
    let params = body.params.into_iter().map(SqlValue::from).collect();
    run(&state, Operation::raw_with_params(sql, params)).await
}

#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    #[serde(rename = "where")]
    pub filter: Option<String>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
}

pub async fn list_rows(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<TableQuery>,
) -> ApiResult<Json<Value>> {
    let limit = match q.limit {
        Some(l) => coerce_i64(&Value::String(l), "limit")?,
        None => DEFAULT_LIMIT,
    };
    let offset = match q.offset {
        Some(o) => coerce_i64(&Value::String(o), "offset")?,
        None => DEFAULT_OFFSET,
    };
    let args = SelectArgs::new(UncheckedSql::new(name))
        .limit(limit)
        .offset(offset)
        .filter(q.filter.unwrap_or_default())
        .order_by(q.order_by.unwrap_or_default());
    run(&state, Operation::Select(args)).await
}

pub async fn create_row(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(data): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let op = Operation::Insert {
        table: UncheckedSql::new(name),
        data: Record::from_json_object(data),
    };
    run(&state, op).await
}

pub async fn update_row(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    Json(data): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let op = Operation::Update {
        table: UncheckedSql::new(name),
        id: SqlValue::Text(id),
        data: Record::from_json_object(data),
    };
    run(&state, op).await
}

pub async fn delete_row(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let op = Operation::Delete {
        table: UncheckedSql::new(name),
        id: SqlValue::Text(id),
    };
    run(&state, op).await
}
