use std::path::{Path, PathBuf};

use crate::{
    core::{
        connection::{resolve_path, Database, DbOptions},
        create::{create_database, CreatedDatabase},
    },
    error::AppResult,
};

/// The database a logical client session is pointed at.
///
/// Each front-end session owns one of these, so switching databases in one
/// session never changes what another session, or an operation already
/// holding a [`Database`], talks to.
#[derive(Debug, Clone)]
pub struct Session {
    active: PathBuf,
    options: DbOptions,
}

impl Session {
    pub fn new(path: impl Into<PathBuf>, options: DbOptions) -> Self {
        Self {
            active: path.into(),
            options,
        }
    }

    pub fn active_path(&self) -> &Path {
        &self.active
    }

    pub fn options(&self) -> DbOptions {
        self.options
    }

    /// A database reference bound to the path active right now.
    pub fn database(&self) -> Database {
        Database::new(&self.active, self.options)
    }

    pub fn switch_to(&mut self, path: &Path) -> AppResult<()> {
        let path = resolve_path(path)?;
        tracing::info!(from = %self.active.display(), to = %path.display(), "switching active database");
        self.active = path;
        Ok(())
    }

    /// Creates a database and, when `switch_active` is set, makes it the
    /// target of this session's later operations.
    pub async fn create_database(
        &mut self,
        path: &Path,
        statements: Vec<String>,
        switch_active: bool,
    ) -> AppResult<CreatedDatabase> {
        let created = create_database(path, statements, self.options).await?;
        if switch_active {
            self.switch_to(&created.db_path)?;
        }
        Ok(created)
    }
}
