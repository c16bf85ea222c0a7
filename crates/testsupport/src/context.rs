//! Test database contexts with temporary storage.
//!
//! Each test gets its own data directory that is removed when the context is
//! dropped.

use anyhow::Result;
use catalog::AttrSpec;
use common::Config;
use database::Database;
use std::path::Path;
use tempfile::TempDir;

/// A database opened over its own temporary directory.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let mut ctx = TestContext::new().unwrap();
/// ctx.db_mut().create_relation("ids", &ids_schema()).unwrap();
/// assert_eq!(ctx.db().relation_len("ids").unwrap(), 0);
/// ```
pub struct TestContext {
    db: Database,
    config: Config,
    // Dropped after `db` so heap files are closed before the directory goes away.
    _temp_dir: TempDir,
}

impl TestContext {
    /// Open an empty database in a fresh temporary directory.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let config = Config::builder()
            .data_dir(temp_dir.path().to_path_buf())
            .sync_writes(false)
            .build();
        let db = Database::open(&config)?;
        Ok(Self {
            db,
            config,
            _temp_dir: temp_dir,
        })
    }

    /// Open a database and create the given relations.
    pub fn with_relations(relations: &[(&str, Vec<AttrSpec>)]) -> Result<Self> {
        let mut ctx = Self::new()?;
        for (name, attrs) in relations {
            ctx.db.create_relation(name, attrs)?;
        }
        Ok(ctx)
    }

    /// Close the database and open it again from the same directory.
    pub fn reopen(&mut self) -> Result<()> {
        self.db = Database::open(&self.config)?;
        Ok(())
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Get the path to the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }
}
