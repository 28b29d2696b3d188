use rusqlite::{params_from_iter, Connection};

use crate::{
    core::{
        classify::is_read_query,
        connection::Handle,
        operation::{IdentifierPolicy, Operation},
        schema,
        statement::{self, BoundStatement},
        types::{Mutation, OperationResult, Row, RowSet},
        value::SqlValue,
    },
    error::AppResult,
};

/// Runs one operation on an open handle and normalizes the engine result.
pub fn execute(
    handle: &Handle,
    op: &Operation,
    policy: IdentifierPolicy,
) -> AppResult<OperationResult> {
    op.check(policy)?;
    let conn = handle.conn()?;

    match op {
        Operation::RawQuery { sql, params } => {
            let stmt = statement::raw(sql, params);
            if is_read_query(sql) {
                fetch_rows(conn, &stmt).map(OperationResult::Rows)
            } else {
                let changes = run_write(conn, &stmt)?;
                // Reported as the engine gives it: 0 on a fresh handle with no insert.
                Ok(OperationResult::Mutation(Mutation {
                    changes,
                    inserted_id: Some(conn.last_insert_rowid()),
                }))
            }
        }
        Operation::Schema => schema::describe(conn).map(OperationResult::Schema),
        Operation::Select(args) => {
            let mut page = fetch_rows(conn, &statement::select(args))?;
            page.total = Some(fetch_total(conn, &statement::count(args))?);
            Ok(OperationResult::Rows(page))
        }
        Operation::Insert { table, data } => {
            let stmt = statement::insert(table, data)?;
            let changes = run_write(conn, &stmt)?;
            Ok(OperationResult::Mutation(Mutation {
                changes,
                inserted_id: Some(conn.last_insert_rowid()),
            }))
        }
        Operation::Update { table, id, data } => {
            let changes = run_write(conn, &statement::update(table, id, data)?)?;
            Ok(OperationResult::Mutation(Mutation {
                changes,
                inserted_id: None,
            }))
        }
        Operation::Delete { table, id } => {
            let changes = run_write(conn, &statement::delete(table, id))?;
            Ok(OperationResult::Mutation(Mutation {
                changes,
                inserted_id: None,
            }))
        }
    }
}

pub fn fetch_rows(conn: &Connection, stmt: &BoundStatement) -> AppResult<RowSet> {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "read");
    let mut prepared = conn.prepare(&stmt.sql)?;
    let col_names: Vec<String> = prepared
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut r = prepared.query(params_from_iter(stmt.params.iter()))?;
    while let Some(row) = r.next()? {
        let mut out = Row::new();
        for (i, name) in col_names.iter().enumerate() {
            out.insert(name.as_str(), SqlValue::from(row.get_ref(i)?));
        }
        rows.push(out);
    }
    Ok(RowSet::new(rows))
}

/// Executes a statement for its side effects and returns the engine's change count.
///
/// Rows the statement yields (`INSERT ... RETURNING`, a CTE select) are
/// stepped through and discarded rather than treated as an error.
pub fn run_write(conn: &Connection, stmt: &BoundStatement) -> AppResult<u64> {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "write");
    let mut prepared = conn.prepare(&stmt.sql)?;
    let mut rows = prepared.query(params_from_iter(stmt.params.iter()))?;
    while rows.next()?.is_some() {}
    Ok(conn.changes() as u64)
}

fn fetch_total(conn: &Connection, stmt: &BoundStatement) -> AppResult<u64> {
    tracing::debug!(sql = %stmt.sql, "count");
    let total: i64 = conn.query_row(&stmt.sql, params_from_iter(stmt.params.iter()), |r| {
        r.get(0)
    })?;
    Ok(u64::try_from(total).unwrap_or_default())
}
