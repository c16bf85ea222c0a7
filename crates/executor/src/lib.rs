//! Relational operator core: executes INSERT, DELETE and SELECT-with-projection
//! over heap-file relations using a Volcano-style iterator model.
//!
//! Every operator reaches the schema and the storage layer through an explicit
//! [`ExecutionContext`], so tests can substitute in-memory fakes for either.
//!
//! # Architecture
//!
//! ```text
//! insert()  → materialize tuple → AppendWriter
//! delete()  → build predicate → SeqScan → delete current
//! select()  → build predicate → SeqScan → Project → AppendWriter
//! ```
//!
//! Operators acquire scans and writers in `open()`/`execute()` and release them
//! on every exit path, successful or not.
//!
//! # Example
//!
//! ```no_run
//! use catalog::{AttrSpec, Catalog};
//! use executor::{insert, select, AttrRef, AttrValue, ExecutionContext};
//! use storage::{FileStore, RelationStore};
//! use types::CompOp;
//!
//! let mut catalog = Catalog::new();
//! catalog.create_relation("emp", &[AttrSpec::integer("id"), AttrSpec::string("name", 16)]).unwrap();
//! catalog.create_relation("names", &[AttrSpec::string("name", 16)]).unwrap();
//! let store = FileStore::new("/tmp/db", true);
//! store.create("emp").unwrap();
//! store.create("names").unwrap();
//!
//! let ctx = ExecutionContext::new(&catalog, &store);
//! insert(&ctx, "emp", &[AttrValue::integer("id", "1"), AttrValue::string("name", "ann")]).unwrap();
//! let copied = select(&ctx, "names", &[AttrRef::new("emp", "name")], None, CompOp::Eq, b"").unwrap();
//! assert_eq!(copied, 1);
//! ```

#[cfg(test)]
mod tests;

mod dml;
mod materialize;
mod predicate;
mod project;
mod scan;
mod select;

pub use dml::{DeleteExec, InsertExec};
pub use materialize::materialize;
pub use predicate::build_predicate;
pub use project::ProjectExec;
pub use scan::SeqScanExec;
pub use select::SelectExec;

use catalog::SchemaResolver;
use common::{DbResult, ExecutionStats, RecordId};
use storage::RelationStore;
use tracing::debug;
use types::{AttrType, CompOp};

/// Volcano-style iterator interface for query execution.
///
/// Operators initialize resources in `open()`, produce packed tuples via
/// `next()`, and release resources in `close()`. A tuple returned by `next()`
/// borrows the operator and is only valid until the following call.
pub trait Executor {
    /// Acquire scans and buffers.
    fn open(&mut self, ctx: &ExecutionContext) -> DbResult<()>;

    /// Fetch the next tuple, or None if exhausted.
    fn next(&mut self) -> DbResult<Option<&[u8]>>;

    /// Release everything acquired in `open()`. Safe to call more than once.
    fn close(&mut self) -> DbResult<()>;

    /// Return execution statistics.
    /// Returns None for operators that don't collect statistics.
    fn stats(&self) -> Option<&ExecutionStats> {
        None
    }
}

/// Shared execution context passed to all operators.
///
/// Holds the schema resolver and the relation store in place of any
/// process-wide handle.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub catalog: &'a dyn SchemaResolver,
    pub store: &'a dyn RelationStore,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(catalog: &'a dyn SchemaResolver, store: &'a dyn RelationStore) -> Self {
        Self { catalog, store }
    }
}

/// Named attribute value supplied to INSERT: raw text plus the caller's declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrValue {
    pub name: String,
    pub attr_type: AttrType,
    pub value: Vec<u8>,
}

impl AttrValue {
    pub fn new(name: impl Into<String>, attr_type: AttrType, value: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.into(),
            attr_type,
            value: value.as_ref().to_vec(),
        }
    }

    pub fn integer(name: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        Self::new(name, AttrType::Integer, value)
    }

    pub fn float(name: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        Self::new(name, AttrType::Float, value)
    }

    pub fn string(name: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        Self::new(name, AttrType::String, value)
    }
}

/// Reference to one attribute of one relation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttrRef {
    pub relation: String,
    pub attribute: String,
}

impl AttrRef {
    pub fn new(relation: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            attribute: attribute.into(),
        }
    }
}

/// A single-attribute filter: `relation.attribute <op> value`.
///
/// `value` is raw text coerced by the attribute's catalog type. When
/// `declared_type` is set it must agree with the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub relation: String,
    pub attribute: String,
    pub declared_type: Option<AttrType>,
    pub op: CompOp,
    pub value: Vec<u8>,
}

impl Selection {
    pub fn new(
        relation: impl Into<String>,
        attribute: impl Into<String>,
        op: CompOp,
        value: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            relation: relation.into(),
            attribute: attribute.into(),
            declared_type: None,
            op,
            value: value.as_ref().to_vec(),
        }
    }

    pub fn declared(mut self, attr_type: AttrType) -> Self {
        self.declared_type = Some(attr_type);
        self
    }
}

/// Insert one tuple into `relation`.
///
/// `values` must name every attribute of the relation exactly once. On any
/// error the relation is left unchanged.
///
/// # Errors
///
/// `SchemaLookup` for an unknown relation, `InvalidRecordLength` for a wrong
/// attribute count, `AttributeNotFound` for an unknown or uncovered attribute,
/// `BadType` when a declared type disagrees with the catalog, and storage
/// errors from the append.
pub fn insert(ctx: &ExecutionContext, relation: &str, values: &[AttrValue]) -> DbResult<RecordId> {
    debug!(relation, attrs = values.len(), "insert");
    InsertExec::new(relation, values.to_vec()).execute(ctx)
}

/// Delete every tuple of `relation` whose `attribute` satisfies `op value`.
///
/// An empty `attribute` deletes every tuple. Returns the number of tuples
/// removed. A storage failure mid-scan leaves earlier deletions in place.
pub fn delete(
    ctx: &ExecutionContext,
    relation: &str,
    attribute: &str,
    op: CompOp,
    attr_type: AttrType,
    value: &[u8],
) -> DbResult<u64> {
    debug!(relation, attribute, %op, "delete");
    let selection = (!attribute.is_empty())
        .then(|| Selection::new(relation, attribute, op, value).declared(attr_type));
    let predicate = build_predicate(ctx.catalog, selection.as_ref())?;
    let deleted = DeleteExec::new(relation, predicate).execute(ctx)?;
    debug!(relation, deleted, "delete finished");
    Ok(deleted)
}

/// Append to `result` the projection of every source tuple satisfying the selection.
///
/// The source relation is the relation of the first projection entry. With no
/// selection every source tuple is projected. Returns the number of tuples
/// written to `result`.
pub fn select(
    ctx: &ExecutionContext,
    result: &str,
    projection: &[AttrRef],
    selection: Option<&AttrRef>,
    op: CompOp,
    value: &[u8],
) -> DbResult<u64> {
    debug!(result, attrs = projection.len(), filtered = selection.is_some(), "select");
    let selection =
        selection.map(|attr| Selection::new(&attr.relation, &attr.attribute, op, value));
    let mut exec = SelectExec::plan(ctx, result, projection, selection.as_ref())?;
    let copied = exec.execute(ctx)?;
    debug!(result, copied, "select finished");
    Ok(copied)
}
