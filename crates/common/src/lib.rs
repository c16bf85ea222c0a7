
pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{fmt, io, path::PathBuf, time::Duration};
use thiserror::Error;
use types::TypeError;

/// Logical identifier for a page within a relation's heap file.
/// Examples:
/// - `let first = PageId(0);`
/// - `let overflow = PageId(12);`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// Opaque handle to one physical tuple: a page plus a slot in its directory.
/// Examples:
/// - `let rid = RecordId { page_id: PageId(0), slot: 3 };`
/// - `let rid = RecordId { page_id: PageId(7), slot: 0 };`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id.0, self.slot)
    }
}

/// A packed tuple: a byte buffer laid out by some relation's attribute descriptors.
/// Examples:
/// - `let t = Tuple::zeroed(12);`
/// - `let t = Tuple::from(vec![1, 0, 0, 0]);`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    data: Vec<u8>,
}

impl Tuple {
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0u8; len],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte range `[offset, offset + len)`, if it lies inside the tuple.
    pub fn field(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    pub fn field_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        self.data.get_mut(offset..offset.checked_add(len)?)
    }
}

impl From<Vec<u8>> for Tuple {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Canonical error type shared across database subsystems.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("schema lookup: {0}")]
    SchemaLookup(String),
    #[error("attribute '{attribute}' not found in relation '{relation}'")]
    AttributeNotFound { relation: String, attribute: String },
    #[error("invalid record length: expected {expected}, got {actual}")]
    InvalidRecordLength { expected: usize, actual: usize },
    #[error("bad type: {0}")]
    BadType(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("exec: {0}")]
    Executor(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<TypeError> for DbError {
    fn from(err: TypeError) -> Self {
        DbError::BadType(err.to_string())
    }
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Status-code view of an operation's outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    SchemaLookupError,
    AttributeNotFound,
    InvalidRecordLength,
    BadType,
    /// Malformed request or schema definition, rejected before any I/O.
    InvalidRequest,
    /// Storage and I/O failures passed through from below.
    StorageError,
}

impl Status {
    pub fn of<T>(result: &DbResult<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(err) => err.status(),
        }
    }
}

impl DbError {
    pub fn status(&self) -> Status {
        match self {
            DbError::SchemaLookup(_) => Status::SchemaLookupError,
            DbError::AttributeNotFound { .. } => Status::AttributeNotFound,
            DbError::InvalidRecordLength { .. } => Status::InvalidRecordLength,
            DbError::BadType(_) => Status::BadType,
            DbError::Catalog(_) | DbError::Executor(_) => Status::InvalidRequest,
            DbError::Storage(_) | DbError::Io(_) => Status::StorageError,
        }
    }

    pub fn attribute_not_found(relation: &str, attribute: &str) -> Self {
        DbError::AttributeNotFound {
            relation: relation.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

/// Runtime configuration for the database components.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_db"))
///     .catalog_file("schema.json".into())
///     .sync_writes(false)
///     .build();
/// assert_eq!(config.catalog_path(), PathBuf::from("./my_db/schema.json"));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory where heap files and catalog metadata live.
    #[builder(default = PathBuf::from("./db_data"))]
    pub data_dir: PathBuf,
    /// Catalog file name, relative to `data_dir`.
    #[builder(default = String::from("catalog.json"))]
    pub catalog_file: String,
    /// Sync heap pages to disk after every write instead of only flushing.
    #[builder(default = true)]
    pub sync_writes: bool,
}

impl Config {
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db_data"),
            catalog_file: String::from("catalog.json"),
            sync_writes: true,
        }
    }
}

/// Execution statistics collected while an operator runs.
///
/// # Examples
/// ```
/// use common::ExecutionStats;
/// use std::time::Duration;
///
/// let stats = ExecutionStats {
///     open_time: Duration::from_millis(5),
///     total_next_time: Duration::from_millis(150),
///     close_time: Duration::from_millis(2),
///     tuples_scanned: 1000,
///     tuples_produced: 500,
/// };
/// assert_eq!(stats.total_time().as_millis(), 157);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExecutionStats {
    /// Time spent in open()
    pub open_time: Duration,
    /// Cumulative time spent across all next() calls
    pub total_next_time: Duration,
    /// Time spent in close()
    pub close_time: Duration,
    /// Tuples handed back by the scan cursor
    pub tuples_scanned: u64,
    /// Tuples emitted, deleted or appended by this operator
    pub tuples_produced: u64,
}

impl ExecutionStats {
    /// Returns total execution time (open + next + close)
    pub fn total_time(&self) -> Duration {
        self.open_time + self.total_next_time + self.close_time
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        Config, DbError, DbResult, ExecutionStats, PageId, RecordId, Status, Tuple,
    };
    pub use types::{AttrType, CompOp, Value};
}
