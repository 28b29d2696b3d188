use std::{
    path::{Component, Path, PathBuf},
    time::Duration,
};

use rusqlite::{Connection, OpenFlags};

use crate::{
    core::{
        executor,
        operation::{IdentifierPolicy, Operation},
        schema,
        types::{OperationResult, SchemaDescription},
    },
    error::{AppError, AppResult},
};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Settings applied to every handle a [`Database`] opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbOptions {
    pub busy_timeout: Duration,
    pub identifier_policy: IdentifierPolicy,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            identifier_policy: IdentifierPolicy::Permissive,
        }
    }
}

/// A database file reference. Holds no connection: every call acquires a
/// fresh [`Handle`] on the blocking pool and releases it before returning.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    options: DbOptions,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>, options: DbOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> DbOptions {
        self.options
    }

    pub fn acquire(&self) -> AppResult<Handle> {
        Handle::open(&self.path, self.options.busy_timeout)
    }

    /// Runs `f` with a handle scoped to this call.
    pub async fn with_handle<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Handle) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut handle = db.acquire()?;
            let res = f(&handle);
            handle.release();
            res
        })
        .await
        .map_err(|e| AppError::Internal(format!("db task failed: {e}")))?
    }

    pub async fn execute(&self, op: Operation) -> AppResult<OperationResult> {
        let policy = self.options.identifier_policy;
        self.with_handle(move |h| executor::execute(h, &op, policy))
            .await
    }

    /// Runs several operations in order on one handle, stopping at the first error.
    pub async fn execute_all(&self, ops: Vec<Operation>) -> AppResult<Vec<OperationResult>> {
        let policy = self.options.identifier_policy;
        self.with_handle(move |h| {
            ops.iter()
                .map(|op| executor::execute(h, op, policy))
                .collect()
        })
        .await
    }

    pub async fn describe(&self) -> AppResult<SchemaDescription> {
        self.with_handle(|h| schema::describe(h.conn()?)).await
    }
}

/// An open connection. Closed by [`Handle::release`] or on drop, whichever
/// comes first.
#[derive(Debug)]
pub struct Handle {
    conn: Option<Connection>,
    path: PathBuf,
}

impl Handle {
    pub fn open(path: &Path, busy_timeout: Duration) -> AppResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| {
            AppError::DbOpenFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if let Err(e) = conn.busy_timeout(busy_timeout) {
            tracing::warn!(error = %e, path = %path.display(), "failed to set busy timeout");
        }
        tracing::trace!(path = %path.display(), "handle acquired");
        Ok(Self {
            conn: Some(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn conn(&self) -> AppResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| AppError::Internal("handle already released".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.conn.is_none()
    }

    /// Closes the connection. Safe to call more than once.
    pub fn release(&mut self) {
        let Some(conn) = self.conn.take() else { return };
        match conn.close() {
            Ok(()) => tracing::trace!(path = %self.path.display(), "handle released"),
            Err((_, e)) => {
                tracing::warn!(error = %e, path = %self.path.display(), "close failed; connection dropped")
            }
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Absolute, lexically normalized form of `path`. Does not touch the
/// filesystem, so it works for database files that do not exist yet.
pub fn resolve_path(path: &Path) -> AppResult<PathBuf> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        cwd.join(path)
    };
    Ok(normalize_lexical(&abs))
}

fn normalize_lexical(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root is a no-op.
                out.pop();
            }
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(comp.as_os_str()),
            Component::Normal(c) => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Handle::open(&dir.path().join("a.db"), DEFAULT_BUSY_TIMEOUT).unwrap();
        assert!(h.conn().is_ok());
        h.release();
        h.release();
        assert!(h.is_released());
        assert!(matches!(h.conn(), Err(AppError::Internal(_))));
    }

    #[test]
    fn missing_parent_directory_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("a.db");
        let err = Handle::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap_err();
        assert_eq!(err.kind(), "OpenError");
    }

    #[test]
    fn resolve_path_normalizes_dot_segments() {
        let p = resolve_path(Path::new("/data/./x/../db.sqlite")).unwrap();
        assert_eq!(p, PathBuf::from("/data/db.sqlite"));
        assert!(resolve_path(Path::new("rel.db")).unwrap().is_absolute());
    }

    #[tokio::test]
    async fn handle_is_released_when_the_closure_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("a.db"), DbOptions::default());
        let err = db
            .with_handle(|h| {
                h.conn()?.execute_batch("NOT SQL")?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "SqlError");
        // A released handle leaves the file free for an exclusive lock.
        let locked = db
            .with_handle(|h| {
                h.conn()?.execute_batch("BEGIN EXCLUSIVE; COMMIT;")?;
                Ok(())
            })
            .await;
        assert!(locked.is_ok());
    }
}
