use std::path::PathBuf;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};

use crate::{
    adapters::{coerce_i64, Runner},
    core::{
        operation::{DEFAULT_LIMIT, DEFAULT_OFFSET},
        payload, Operation, Record, SelectArgs, Session, SqlValue, UncheckedSql,
    },
    error::{AppError, AppResult},
};

pub fn definitions() -> Value {
    json!([
        {
            "name": "get_schema",
            "description": "Get the full schema of the SQLite database (tables and their columns).",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "execute_query",
            "description": "Execute a custom SQL query. SELECT and PRAGMA return rows; anything else returns the change count.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "sql": { "type": "string", "description": "SQL to execute" },
                    "params": {
                        "type": "array",
                        "description": "Values for the ? placeholders",
                        "items": { "type": "string" }
                    }
                },
                "required": ["sql"]
            }
        },
        {
            "name": "get_table_data",
            "description": "Read rows from a table with optional filtering, ordering and paging. where and orderBy are inserted into the SQL as-is.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tableName": { "type": "string", "description": "Table name" },
                    "limit": { "type": "number", "description": "Maximum rows (default: 100)" },
                    "offset": { "type": "number", "description": "Rows to skip (default: 0)" },
                    "where": { "type": "string", "description": "Optional WHERE condition, raw SQL" },
                    "orderBy": { "type": "string", "description": "Optional ordering, e.g. \"name ASC\"" }
                },
                "required": ["tableName"]
            }
        },
        {
            "name": "insert_record",
            "description": "Insert a record into a table.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tableName": { "type": "string", "description": "Table name" },
                    "data": { "type": "object", "description": "Column/value pairs" }
                },
                "required": ["tableName", "data"]
            }
        },
        {
            "name": "update_record",
            "description": "Update a record by id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tableName": { "type": "string", "description": "Table name" },
                    "id": { "type": "string", "description": "Record id" },
                    "data": { "type": "object", "description": "Column/value pairs to set" }
                },
                "required": ["tableName", "id", "data"]
            }
        },
        {
            "name": "delete_record",
            "description": "Delete a record by id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tableName": { "type": "string", "description": "Table name" },
                    "id": { "type": "string", "description": "Record id" }
                },
                "required": ["tableName", "id"]
            }
        },
        {
            "name": "create_database",
            "description": "Create a SQLite database file (and missing directories), run schema statements in order, and optionally make it the active database.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "dbPath": { "type": "string", "description": "Path of the database file" },
                    "schemaStatements": {
                        "type": "array",
                        "description": "SQL statements to run after creation",
                        "items": { "type": "string" }
                    },
                    "switchActive": {
                        "type": "boolean",
                        "description": "Use this database for later calls (default: true)"
                    }
                },
                "required": ["dbPath"]
            }
        }
    ])
}

#[derive(Debug, Deserialize)]
struct ExecuteQueryArgs {
    sql: String,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableDataArgs {
    table_name: String,
    #[serde(default)]
    limit: Option<Value>,
    #[serde(default)]
    offset: Option<Value>,
    #[serde(default, rename = "where")]
    filter: Option<String>,
    #[serde(default)]
    order_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertArgs {
    table_name: String,
    data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    table_name: String,
    id: Value,
    data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    table_name: String,
    id: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDatabaseArgs {
    db_path: PathBuf,
    #[serde(default)]
    schema_statements: Vec<String>,
    #[serde(default = "default_switch_active")]
    switch_active: bool,
}

fn default_switch_active() -> bool {
    true
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> AppResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| AppError::validation(format!("invalid arguments for {tool}: {e}")))
}

fn optional_i64(v: Option<Value>, field: &str, default: i64) -> AppResult<i64> {
    match v {
        None | Some(Value::Null) => Ok(default),
        Some(v) => coerce_i64(&v, field),
    }
}

/// Dispatches a tool call and returns its JSON payload.
pub async fn call(
    name: &str,
    arguments: Value,
    session: &mut Session,
    runner: &Runner,
) -> AppResult<Value> {
    let op = match name {
        "get_schema" => Operation::Schema,
        "execute_query" => {
            let a: ExecuteQueryArgs = parse(name, arguments)?;
            let params = a.params.into_iter().map(SqlValue::from).collect();
            Operation::raw_with_params(a.sql, params)
        }
        "get_table_data" => {
            let a: TableDataArgs = parse(name, arguments)?;
            let args = SelectArgs::new(UncheckedSql::new(a.table_name))
                .limit(optional_i64(a.limit, "limit", DEFAULT_LIMIT)?)
                .offset(optional_i64(a.offset, "offset", DEFAULT_OFFSET)?)
                .filter(a.filter.unwrap_or_default())
                .order_by(a.order_by.unwrap_or_default());
            Operation::Select(args)
        }
        "insert_record" => {
            let a: InsertArgs = parse(name, arguments)?;
            Operation::Insert {
                table: UncheckedSql::new(a.table_name),
                data: Record::from_json_object(a.data),
            }
        }
        "update_record" => {
            let a: UpdateArgs = parse(name, arguments)?;
            Operation::Update {
                table: UncheckedSql::new(a.table_name),
                id: SqlValue::from(a.id),
                data: Record::from_json_object(a.data),
            }
        }
        "delete_record" => {
            let a: DeleteArgs = parse(name, arguments)?;
            Operation::Delete {
                table: UncheckedSql::new(a.table_name),
                id: SqlValue::from(a.id),
            }
        }
        "create_database" => {
            let a: CreateDatabaseArgs = parse(name, arguments)?;
            return create_database(a, session, runner).await;
        }
        other => return Err(AppError::validation(format!("Unknown tool: {other}"))),
    };

    let db = session.database();
    tracing::debug!(tool = name, op = op.name(), db = %db.path().display(), "tool call");
    let result = runner.timed(db.execute(op.clone())).await?;
    payload::shape(&op, &result)
}

async fn create_database(
    a: CreateDatabaseArgs,
    session: &mut Session,
    runner: &Runner,
) -> AppResult<Value> {
    let created = runner
        .timed(session.create_database(&a.db_path, a.schema_statements, a.switch_active))
        .await?;
    Ok(json!({
        "dbPath": created.db_path.display().to_string(),
        "statementsExecuted": created.statements_executed,
        "active": a.switch_active,
        "message": "Database created successfully",
    }))
}
