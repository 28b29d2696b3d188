use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    core::connection::{resolve_path, Database, DbOptions},
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDatabase {
    pub db_path: PathBuf,
    pub statements_executed: usize,
}

/// Creates (or opens) the database at `path` and applies `statements` in order.
///
/// Missing parent directories are created first. Statements run one at a
/// time without an enclosing transaction: when one fails, the ones before it
/// stay applied.
pub async fn create_database(
    path: &Path,
    statements: Vec<String>,
    options: DbOptions,
) -> AppResult<CreatedDatabase> {
    let abs = resolve_path(path)?;
    if let Some(parent) = abs.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AppError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let db = Database::new(&abs, options);
    let statements_executed = db
        .with_handle(move |h| {
            let conn = h.conn()?;
            for (i, sql) in statements.iter().enumerate() {
                tracing::debug!(index = i, sql = %sql, "schema statement");
                conn.execute_batch(sql).map_err(|e| {
                    AppError::Sql(format!("schema statement {} failed: {e}", i + 1))
                })?;
            }
            Ok(statements.len())
        })
        .await?;

    tracing::info!(path = %abs.display(), statements = statements_executed, "database ready");
    Ok(CreatedDatabase {
        db_path: abs,
        statements_executed,
    })
}
