use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

use crate::core::{DbOptions, IdentifierPolicy};

pub const DEFAULT_DB_PATH: &str = "./database.sqlite";

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlite-crud", version)]
pub struct Args {
    /// Database file. Takes precedence over SQLITE_DB_PATH.
    #[arg(long, global = true, env = "SQLITE_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// How long a handle waits on a locked database before failing.
    #[arg(long, global = true, default_value_t = 2_000)]
    pub busy_timeout_ms: u64,

    /// Abandon a single operation after this long. No limit when unset.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Reject table and column names that are not plain identifiers.
    #[arg(long, global = true)]
    pub strict_identifiers: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// REST API over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// MCP server (JSON-RPC 2.0 over stdio)
    Mcp,
    /// Run the workflow node once over an execution document
    Node {
        /// Execution document (JSON). Reads stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Args {
    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            identifier_policy: if self.strict_identifiers {
                IdentifierPolicy::Strict
            } else {
                IdentifierPolicy::Permissive
            },
        }
    }

    pub fn op_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_flag_accepts_equals_form() {
        let args = Args::try_parse_from(["sqlite-crud", "--db=/tmp/x.sqlite", "mcp"]).unwrap();
        assert_eq!(args.db, PathBuf::from("/tmp/x.sqlite"));
        assert!(matches!(args.command, Command::Mcp));
    }

    #[test]
    fn strict_flag_selects_the_allow_list() {
        let args =
            Args::try_parse_from(["sqlite-crud", "serve", "--strict-identifiers", "--port", "8080"])
                .unwrap();
        assert_eq!(args.db_options().identifier_policy, IdentifierPolicy::Strict);
        assert!(matches!(args.command, Command::Serve { port: 8080, .. }));
        assert_eq!(args.op_timeout(), None);
    }
}
