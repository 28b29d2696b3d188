use rusqlite::{Connection, Row};

use crate::core::types::{ColumnMeta, SchemaDescription, TableSchema};
use crate::error::AppResult;

/// User tables in catalog order. Names under SQLite's reserved `sqlite_`
/// prefix are internal and never listed.
pub fn list_tables(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        r"SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'",
    )?;
    let rows = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_columns(conn: &Connection, table: &str) -> AppResult<Vec<ColumnMeta>> {
    // The table-valued form of the pragma takes the name as a bound parameter.
    let mut stmt = conn.prepare(
        r#"SELECT cid, name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1)"#,
    )?;
    let cols = stmt
        .query_map([table], |row: &Row<'_>| {
            Ok(ColumnMeta {
                cid: row.get(0)?,
                name: row.get(1)?,
                decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                notnull: row.get(3)?,
                default_value: row.get(4)?,
                pk: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols)
}

pub fn describe(conn: &Connection) -> AppResult<SchemaDescription> {
    let mut tables = Vec::new();
    for name in list_tables(conn)? {
        let columns = list_columns(conn, &name)?;
        tables.push(TableSchema { name, columns });
    }
    Ok(SchemaDescription { tables })
}

pub(crate) fn is_safe_identifier(s: &str) -> bool {
    // [A-Za-z_][A-Za-z0-9_]*
    let mut chars = s.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `table` or `schema.table`, each segment a safe identifier.
pub(crate) fn is_safe_table_ref(s: &str) -> bool {
    let mut parts = s.split('.');
    let Some(first) = parts.next() else { return false };
    if !is_safe_identifier(first) {
        return false;
    }
    match parts.next() {
        None => true,
        Some(second) => parts.next().is_none() && is_safe_identifier(second),
    }
}
