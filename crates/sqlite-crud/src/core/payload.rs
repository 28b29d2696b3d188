//! JSON bodies shared by every front end.
//!
//! | operation | body                                   |
//! |-----------|----------------------------------------|
//! | raw read  | `{data, rowCount}`                     |
//! | raw write | `{changes, lastID, message}`           |
//! | select    | `{data, total, limit, offset}`         |
//! | insert    | `{id, changes, message}`               |
//! | update    | `{changes, message}`                   |
//! | delete    | `{changes, message}`                   |
//! | schema    | `{<table>: [columns]}`                 |

use serde_json::{json, Value};

use crate::{
    core::{
        operation::Operation,
        types::{Mutation, OperationResult, RowSet},
    },
    error::{AppError, AppResult},
};

pub const QUERY_EXECUTED: &str = "Query executed successfully";
pub const RECORD_CREATED: &str = "Record created successfully";
pub const RECORD_UPDATED: &str = "Record updated successfully";
pub const RECORD_DELETED: &str = "Record deleted successfully";
pub const NO_RECORD: &str = "No record found with that ID";

pub fn shape(op: &Operation, result: &OperationResult) -> AppResult<Value> {
    let body = match (op, result) {
        (Operation::RawQuery { .. }, OperationResult::Rows(rows)) => read_body(rows)?,
        (Operation::RawQuery { .. }, OperationResult::Mutation(m)) => json!({
            "changes": m.changes,
            "lastID": m.inserted_id,
            "message": QUERY_EXECUTED,
        }),
        (Operation::Select(args), OperationResult::Rows(rows)) => json!({
            "data": serde_json::to_value(&rows.rows)?,
            "total": rows.total.unwrap_or(rows.row_count as u64),
            "limit": args.limit,
            "offset": args.offset,
        }),
        (Operation::Insert { .. }, OperationResult::Mutation(m)) => json!({
            "id": m.inserted_id,
            "changes": m.changes,
            "message": RECORD_CREATED,
        }),
        (Operation::Update { .. }, OperationResult::Mutation(m)) => changed_body(m, RECORD_UPDATED),
        (Operation::Delete { .. }, OperationResult::Mutation(m)) => changed_body(m, RECORD_DELETED),
        (Operation::Schema, OperationResult::Schema(schema)) => schema.tables_json(),
        (op, _) => {
            return Err(AppError::Internal(format!(
                "result shape does not match {} operation",
                op.name()
            )))
        }
    };
    Ok(body)
}

fn read_body(rows: &RowSet) -> AppResult<Value> {
    Ok(json!({
        "data": serde_json::to_value(&rows.rows)?,
        "rowCount": rows.row_count,
    }))
}

fn changed_body(m: &Mutation, success: &str) -> Value {
    let message = if m.changes > 0 { success } else { NO_RECORD };
    json!({ "changes": m.changes, "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        operation::{SelectArgs, UncheckedSql},
        types::Row,
        value::SqlValue,
    };

    fn users() -> UncheckedSql {
        UncheckedSql::new("users")
    }

    #[test]
    fn select_body_carries_paging_and_total() {
        let row: Row = [("id", SqlValue::Integer(2))].into_iter().collect();
        let mut rows = RowSet::new(vec![row]);
        rows.total = Some(7);
        let op = Operation::Select(SelectArgs::new(users()).limit(1).offset(1));
        let body = shape(&op, &OperationResult::Rows(rows)).unwrap();
        assert_eq!(body, json!({"data": [{"id": 2}], "total": 7, "limit": 1, "offset": 1}));
    }

    #[test]
    fn zero_changes_render_the_not_found_message() {
        let op = Operation::Delete { table: users(), id: SqlValue::Integer(9) };
        let m = Mutation { changes: 0, inserted_id: None };
        let body = shape(&op, &OperationResult::Mutation(m)).unwrap();
        assert_eq!(body, json!({"changes": 0, "message": NO_RECORD}));
    }

    #[test]
    fn raw_write_reports_last_id() {
        let m = Mutation { changes: 1, inserted_id: Some(4) };
        let body = shape(&Operation::raw("INSERT ..."), &OperationResult::Mutation(m)).unwrap();
        assert_eq!(body["lastID"], 4);
        assert_eq!(body["message"], QUERY_EXECUTED);
    }

    #[test]
    fn mismatched_result_is_an_internal_error() {
        let m = Mutation { changes: 1, inserted_id: None };
        let err = shape(&Operation::Schema, &OperationResult::Mutation(m)).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
