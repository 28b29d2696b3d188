use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::{
    adapters::{workflow::params::ParameterSource, Runner},
    core::{
        operation::{DEFAULT_LIMIT, DEFAULT_OFFSET},
        payload, Operation, SelectArgs, SqlValue, UncheckedSql,
    },
    error::{AppError, AppResult},
};

pub const DEFAULT_OPERATION: &str = "select";
pub const DEFAULT_QUERY: &str = "SELECT * FROM table_name";

/// The SQLite CRUD node: one operation per input item, against one
/// database file.
pub struct SqliteNode {
    db_path: PathBuf,
    runner: Runner,
}

impl SqliteNode {
    pub fn new(db_path: impl Into<PathBuf>, runner: Runner) -> Self {
        Self {
            db_path: db_path.into(),
            runner,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Processes `item_count` items in order. Each output item carries the
    /// index of the input that produced it. With `continue_on_fail`, a failing
    /// item yields `{"error": ..}` and the run goes on; otherwise the run stops
    /// at that item.
    pub async fn execute<P: ParameterSource>(
        &self,
        params: &P,
        item_count: usize,
        continue_on_fail: bool,
    ) -> AppResult<Vec<Value>> {
        let mut out = Vec::with_capacity(item_count);
        for item in 0..item_count {
            match self.execute_item(params, item).await {
                Ok(body) => out.push(output_item(body, item)),
                Err(e) if continue_on_fail => {
                    tracing::warn!(item, code = e.code(), error = %e, "item failed, continuing");
                    out.push(output_item(json!({ "error": e.to_string() }), item));
                }
                Err(e) => {
                    return Err(AppError::ItemFailed {
                        item,
                        source: Box::new(e),
                    })
                }
            }
        }
        Ok(out)
    }

    async fn execute_item<P: ParameterSource>(&self, params: &P, item: usize) -> AppResult<Value> {
        let operation = params.string("operation", item, DEFAULT_OPERATION)?;
        tracing::debug!(item, operation = %operation, db = %self.db_path.display(), "node item");

        if operation == "getSchema" {
            let result = self.runner.run(&self.db_path, Operation::Schema).await?;
            let schema = result
                .schema()
                .ok_or_else(|| AppError::Internal("schema operation returned no schema".into()))?;
            return Ok(json!({
                "schema": schema.tables_json(),
                "tableCount": schema.table_count(),
            }));
        }

        let (op, extras) = match operation.as_str() {
            "executeQuery" => (
                Operation::raw(params.string("sqlQuery", item, DEFAULT_QUERY)?),
                Vec::new(),
            ),
            "select" => {
                let table = params.string("table", item, "")?;
                let args = SelectArgs::new(UncheckedSql::new(table.clone()))
                    .limit(params.number("limit", item, DEFAULT_LIMIT)?)
                    .offset(params.number("offset", item, DEFAULT_OFFSET)?)
                    .filter(params.string("whereCondition", item, "")?)
                    .order_by(params.string("orderBy", item, "")?);
                (Operation::Select(args), vec![("table", json!(table))])
            }
            "insert" => {
                let table = params.string("table", item, "")?;
                let op = Operation::Insert {
                    table: UncheckedSql::new(table.clone()),
                    data: params.column_values("dataToInsert", item)?,
                };
                (op, vec![("table", json!(table))])
            }
            "update" => {
                let table = params.string("table", item, "")?;
                let id = params.string("recordId", item, "")?;
                let op = Operation::Update {
                    table: UncheckedSql::new(table.clone()),
                    id: SqlValue::from(id.as_str()),
                    data: params.column_values("dataToUpdate", item)?,
                };
                (op, vec![("table", json!(table)), ("id", json!(id))])
            }
            "delete" => {
                let table = params.string("table", item, "")?;
                let id = params.string("recordId", item, "")?;
                let op = Operation::Delete {
                    table: UncheckedSql::new(table.clone()),
                    id: SqlValue::from(id.as_str()),
                };
                (op, vec![("table", json!(table)), ("id", json!(id))])
            }
            other => return Err(AppError::validation(format!("Unknown operation: {other}"))),
        };

        let result = self.runner.run(&self.db_path, op.clone()).await?;
        let mut body = payload::shape(&op, &result)?;
        if let Value::Object(map) = &mut body {
            for (key, value) in extras {
                map.insert(key.to_string(), value);
            }
        }
        Ok(body)
    }
}

fn output_item(json: Value, item: usize) -> Value {
    json!({ "json": json, "pairedItem": { "item": item } })
}
