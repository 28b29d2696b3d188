use super::{
    operation::{SelectArgs, UncheckedSql},
    types::Record,
    value::SqlValue,
};
use crate::error::{AppError, AppResult};

/// SQL text plus the values for its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Number of `?` characters in the text. Only meaningful for generated
    /// statements, whose spliced fragments are expected to carry none.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

pub fn select(args: &SelectArgs) -> BoundStatement {
    let mut sql = format!("SELECT * FROM {}", args.table);
    push_where(&mut sql, args.filter.as_ref());
    if let Some(order_by) = &args.order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by.as_str());
    }
    sql.push_str(" LIMIT ? OFFSET ?");
    BoundStatement::new(
        sql,
        vec![SqlValue::Integer(args.limit), SqlValue::Integer(args.offset)],
    )
}

/// Companion to [`select`]: same table and predicate, no ordering or paging.
pub fn count(args: &SelectArgs) -> BoundStatement {
    let mut sql = format!("SELECT COUNT(*) AS total FROM {}", args.table);
    push_where(&mut sql, args.filter.as_ref());
    BoundStatement::new(sql, Vec::new())
}

pub fn insert(table: &UncheckedSql, data: &Record) -> AppResult<BoundStatement> {
    if data.is_empty() {
        return Err(AppError::validation("no columns to insert"));
    }
    let columns = data.columns().collect::<Vec<_>>().join(", ");
    let placeholders = vec!["?"; data.len()].join(", ");
    Ok(BoundStatement::new(
        format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})"),
        data.values().cloned().collect(),
    ))
}

pub fn update(table: &UncheckedSql, id: &SqlValue, data: &Record) -> AppResult<BoundStatement> {
    if data.is_empty() {
        return Err(AppError::validation("no columns to update"));
    }
    let set_clause = data
        .columns()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut params: Vec<SqlValue> = data.values().cloned().collect();
    params.push(id.clone());
    Ok(BoundStatement::new(
        format!("UPDATE {table} SET {set_clause} WHERE id = ?"),
        params,
    ))
}

pub fn delete(table: &UncheckedSql, id: &SqlValue) -> BoundStatement {
    BoundStatement::new(format!("DELETE FROM {table} WHERE id = ?"), vec![id.clone()])
}

pub fn raw(sql: &str, params: &[SqlValue]) -> BoundStatement {
    BoundStatement::new(sql, params.to_vec())
}

fn push_where(sql: &mut String, filter: Option<&UncheckedSql>) {
    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        sql.push_str(filter.as_str());
    }
}
