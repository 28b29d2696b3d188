//! Front ends. Each one maps its wire format onto [`Operation`] and back.

pub mod http;
pub mod mcp;
pub mod workflow;

use std::{future::Future, path::Path, time::Duration};

use serde_json::Value;

use crate::{
    cli::Args,
    core::{Database, DbOptions, Operation, OperationResult},
    error::{AppError, AppResult},
};

/// Runs operations for a front end: handle options plus the optional
/// per-operation timeout, which lives here rather than in the core.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner {
    pub options: DbOptions,
    pub op_timeout: Option<Duration>,
}

impl Runner {
    pub fn from_args(args: &Args) -> Self {
        Self {
            options: args.db_options(),
            op_timeout: args.op_timeout(),
        }
    }

    pub fn database(&self, path: &Path) -> Database {
        Database::new(path, self.options)
    }

    pub async fn run(&self, path: &Path, op: Operation) -> AppResult<OperationResult> {
        let db = self.database(path);
        timed(self.op_timeout, db.execute(op)).await
    }

    pub async fn run_all(&self, path: &Path, ops: Vec<Operation>) -> AppResult<Vec<OperationResult>> {
        let db = self.database(path);
        timed(self.op_timeout, db.execute_all(ops)).await
    }

    pub async fn timed<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        timed(self.op_timeout, fut).await
    }
}

/// The blocking task behind a timed-out operation is not cancelled; it runs
/// to completion and its result is discarded.
async fn timed<T>(limit: Option<Duration>, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
    match limit {
        None => fut.await,
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| AppError::Timeout(d))?,
    }
}

/// Loose integer coercion for limit/offset style inputs: integers, floats
/// (truncated) and numeric strings are accepted.
pub(crate) fn coerce_i64(v: &Value, field: &str) -> AppResult<i64> {
    let parsed = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    parsed.ok_or_else(|| AppError::validation(format!("{field} must be a number, got {v}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_i64(&json!(10), "limit").unwrap(), 10);
        assert_eq!(coerce_i64(&json!(2.9), "limit").unwrap(), 2);
        assert_eq!(coerce_i64(&json!(" 25 "), "limit").unwrap(), 25);
        assert!(coerce_i64(&json!("ten"), "limit").is_err());
        assert!(coerce_i64(&json!(null), "offset").is_err());
    }

    #[tokio::test]
    async fn timeout_wraps_slow_operations() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        };
        let err = timed(Some(Duration::from_millis(10)), slow).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
    }
}
