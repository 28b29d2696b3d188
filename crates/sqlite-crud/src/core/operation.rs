use std::fmt;

use super::{
    schema::{is_safe_identifier, is_safe_table_ref},
    types::Record,
    value::SqlValue,
};
use crate::error::{AppError, AppResult};

pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_OFFSET: i64 = 0;

/// SQL text spliced verbatim into a statement.
///
/// Table names, WHERE predicates and ORDER BY clauses cannot be bound as
/// parameters, so they travel as `UncheckedSql` and are never escaped.
/// Whoever builds one is responsible for what it contains; arbitrary
/// predicates are an accepted input here, which makes every value of this
/// type a potential injection vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncheckedSql(String);

impl UncheckedSql {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// `None` for empty or whitespace-only text.
    pub fn non_blank(sql: impl Into<String>) -> Option<Self> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            None
        } else {
            Some(Self(sql))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UncheckedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether table and column names are checked before they are spliced into SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Accept any text; the engine reports whatever does not parse.
    #[default]
    Permissive,
    /// Only `name` or `schema.name` tables and plain column identifiers.
    /// WHERE and ORDER BY text is still passed through untouched.
    Strict,
}

impl IdentifierPolicy {
    pub fn check_table(self, table: &UncheckedSql) -> AppResult<()> {
        if self == IdentifierPolicy::Strict && !is_safe_table_ref(table.as_str()) {
            return Err(AppError::UnsafeIdentifier(format!("table {}", table)));
        }
        Ok(())
    }

    pub fn check_columns(self, data: &Record) -> AppResult<()> {
        if self == IdentifierPolicy::Strict {
            if let Some(bad) = data.columns().find(|c| !is_safe_identifier(c)) {
                return Err(AppError::UnsafeIdentifier(format!("column {bad}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectArgs {
    pub table: UncheckedSql,
    pub limit: i64,
    pub offset: i64,
    pub filter: Option<UncheckedSql>,
    pub order_by: Option<UncheckedSql>,
}

impl SelectArgs {
    pub fn new(table: UncheckedSql) -> Self {
        Self {
            table,
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            filter: None,
            order_by: None,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Raw WHERE predicate, without the keyword. Blank text means no filter.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filter = UncheckedSql::non_blank(predicate);
        self
    }

    /// Raw ORDER BY clause, without the keywords. Blank text means unordered.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = UncheckedSql::non_blank(clause);
        self
    }
}

/// What to run, independent of the front end that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    RawQuery { sql: String, params: Vec<SqlValue> },
    Schema,
    Select(SelectArgs),
    Insert { table: UncheckedSql, data: Record },
    Update { table: UncheckedSql, id: SqlValue, data: Record },
    Delete { table: UncheckedSql, id: SqlValue },
}

impl Operation {
    pub fn raw(sql: impl Into<String>) -> Self {
        Operation::RawQuery {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn raw_with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Operation::RawQuery {
            sql: sql.into(),
            params,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::RawQuery { .. } => "raw_query",
            Operation::Schema => "schema",
            Operation::Select(_) => "select",
            Operation::Insert { .. } => "insert",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
        }
    }

    pub fn table(&self) -> Option<&UncheckedSql> {
        match self {
            Operation::Select(args) => Some(&args.table),
            Operation::Insert { table, .. }
            | Operation::Update { table, .. }
            | Operation::Delete { table, .. } => Some(table),
            Operation::RawQuery { .. } | Operation::Schema => None,
        }
    }

    /// Applies the identifier policy. Raw queries are never inspected.
    pub fn check(&self, policy: IdentifierPolicy) -> AppResult<()> {
        if let Some(table) = self.table() {
            policy.check_table(table)?;
        }
        match self {
            Operation::Insert { data, .. } | Operation::Update { data, .. } => {
                policy.check_columns(data)
            }
            _ => Ok(()),
        }
    }
}
