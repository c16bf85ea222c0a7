use std::{
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use common::{DbError, DbResult};

use crate::{
    AppendWriter, HeapFile, HeapFileScan, InsertFileScan, RelationStore, ScanCursor,
    ScanPredicate,
};

/// Relation store backed by one heap file per relation under a data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    sync_writes: bool,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>, sync_writes: bool) -> Self {
        Self {
            data_dir: data_dir.into(),
            sync_writes,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the heap file that stores `relation`.
    pub fn heap_path(&self, relation: &str) -> PathBuf {
        self.data_dir.join(format!("{relation}.heap"))
    }

    pub fn exists(&self, relation: &str) -> bool {
        self.heap_path(relation).exists()
    }

    fn open_existing(&self, relation: &str) -> DbResult<HeapFile> {
        let path = self.heap_path(relation);
        if !path.exists() {
            return Err(DbError::Storage(format!(
                "no heap file for relation '{relation}'"
            )));
        }
        HeapFile::open(&path, self.sync_writes)
    }
}

impl RelationStore for FileStore {
    fn open_scan(
        &self,
        relation: &str,
        predicate: Option<ScanPredicate>,
    ) -> DbResult<Box<dyn ScanCursor>> {
        let file = self.open_existing(relation)?;
        Ok(Box::new(HeapFileScan::new(relation, file, predicate)?))
    }

    fn open_writer(&self, relation: &str) -> DbResult<Box<dyn AppendWriter>> {
        let file = self.open_existing(relation)?;
        Ok(Box::new(InsertFileScan::new(relation, file)))
    }

    fn create(&self, relation: &str) -> DbResult<()> {
        let path = self.heap_path(relation);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(DbError::Storage(format!(
                "heap file for relation '{relation}' already exists"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn destroy(&self, relation: &str) -> DbResult<()> {
        match fs::remove_file(self.heap_path(relation)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(DbError::Storage(format!(
                "no heap file for relation '{relation}'"
            ))),
            Err(err) => Err(err.into()),
        }
    }
}
