//! Workflow-node front end. Reads an execution document, runs the node over
//! its items and writes the output items as JSON.

mod node;
mod params;

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub use node::{SqliteNode, DEFAULT_OPERATION, DEFAULT_QUERY};
pub use params::{Credentials, Execution, NodeParameters, ParameterSource};

use crate::{
    adapters::Runner,
    cli::Args,
    core::connection::resolve_path,
    error::{AppError, AppResult},
};

/// Runs one execution and returns the output items.
pub async fn run_execution(exec: &Execution, runner: Runner) -> AppResult<Vec<serde_json::Value>> {
    let db_path = resolve_path(&exec.credentials.database_path)?;
    let node = SqliteNode::new(db_path, runner);
    node.execute(&exec.node_parameters(), exec.items.len(), exec.continue_on_fail)
        .await
}

pub async fn run(args: &Args, input: Option<&Path>) -> AppResult<()> {
    let raw = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AppError::Io {
                path: path.to_path_buf(),
                source,
            })?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let exec: Execution = serde_json::from_str(&raw)?;
    tracing::info!(
        db = %exec.credentials.database_path.display(),
        items = exec.items.len(),
        "workflow node run"
    );

    let output = run_execution(&exec, Runner::from_args(args)).await?;

    let mut buf = serde_json::to_vec_pretty(&output)?;
    buf.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&buf).await?;
    stdout.flush().await?;
    Ok(())
}
