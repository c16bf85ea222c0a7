//! Test helpers and utilities for executor tests.

use crate::{ExecutionContext, Executor};
use catalog::{AttrDesc, AttrSpec, Catalog};
use common::{DbError, DbResult, PageId, RecordId};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use storage::{AppendWriter, RelationStore, ScanCursor, ScanPredicate};
use types::AttrType;

/// Catalog with `emp(id INTEGER, name STRING(12), salary FLOAT)` and `ids(id INTEGER)`.
pub fn emp_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .create_relation(
            "emp",
            &[
                AttrSpec::integer("id"),
                AttrSpec::string("name", 12),
                AttrSpec::float("salary"),
            ],
        )
        .unwrap();
    catalog
        .create_relation("ids", &[AttrSpec::integer("id")])
        .unwrap();
    catalog
}

/// Packed `emp` tuple.
pub fn emp_row(id: i32, name: &str, salary: f32) -> Vec<u8> {
    let mut row = id.to_le_bytes().to_vec();
    let mut padded = [0u8; 12];
    let n = name.len().min(12);
    padded[..n].copy_from_slice(&name.as_bytes()[..n]);
    row.extend_from_slice(&padded);
    row.extend_from_slice(&salary.to_le_bytes());
    row
}

pub fn int_bytes(v: i32) -> Vec<u8> {
    v.to_le_bytes().to_vec()
}

pub fn desc(relation: &str, name: &str, attr_type: AttrType, offset: usize, len: usize) -> AttrDesc {
    AttrDesc {
        relation: relation.into(),
        name: name.into(),
        attr_type,
        offset,
        len,
    }
}

type Records = Rc<RefCell<Vec<Option<Vec<u8>>>>>;

#[derive(Default)]
struct Counters {
    scans_opened: Cell<usize>,
    scans_closed: Cell<usize>,
    writers_opened: Cell<usize>,
    writers_closed: Cell<usize>,
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

/// In-memory relation store with fault injection and open/close accounting.
///
/// Releases are counted only on explicit `end_scan()`/`close()`, never on drop,
/// so tests can check that executors release on every path.
#[derive(Default)]
pub struct MemoryStore {
    relations: RefCell<HashMap<String, Records>>,
    counters: Rc<Counters>,
    append_failure_after: Cell<Option<usize>>,
    scan_failure_after: Cell<Option<usize>>,
    fail_writer_close: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relation(&self, name: &str, rows: Vec<Vec<u8>>) {
        let records = rows.into_iter().map(Some).collect();
        self.relations
            .borrow_mut()
            .insert(name.to_string(), Rc::new(RefCell::new(records)));
    }

    /// Live tuples of `name` in storage order.
    pub fn live_records(&self, name: &str) -> Vec<Vec<u8>> {
        self.relations
            .borrow()
            .get(name)
            .map(|records| records.borrow().iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Every writer opened from now on fails once it has appended `n` records.
    pub fn fail_appends_after(&self, n: usize) {
        self.append_failure_after.set(Some(n));
    }

    /// Every scan opened from now on fails once it has yielded `n` records.
    pub fn fail_scan_after(&self, n: usize) {
        self.scan_failure_after.set(Some(n));
    }

    /// Every writer opened from now on reports an error from `close()`.
    pub fn fail_writer_close(&self) {
        self.fail_writer_close.set(true);
    }

    pub fn scans_opened(&self) -> usize {
        self.counters.scans_opened.get()
    }

    pub fn scans_closed(&self) -> usize {
        self.counters.scans_closed.get()
    }

    pub fn writers_opened(&self) -> usize {
        self.counters.writers_opened.get()
    }

    pub fn writers_closed(&self) -> usize {
        self.counters.writers_closed.get()
    }

    fn records(&self, relation: &str) -> DbResult<Records> {
        self.relations
            .borrow()
            .get(relation)
            .cloned()
            .ok_or_else(|| DbError::Storage(format!("no storage for relation '{relation}'")))
    }
}

impl RelationStore for MemoryStore {
    fn open_scan(
        &self,
        relation: &str,
        predicate: Option<ScanPredicate>,
    ) -> DbResult<Box<dyn ScanCursor>> {
        let records = self.records(relation)?;
        bump(&self.counters.scans_opened);
        Ok(Box::new(MemoryCursor {
            records,
            predicate,
            next: 0,
            current: None,
            buf: Vec::new(),
            yielded: 0,
            fail_after: self.scan_failure_after.get(),
            counters: Rc::clone(&self.counters),
            ended: false,
        }))
    }

    fn open_writer(&self, relation: &str) -> DbResult<Box<dyn AppendWriter>> {
        let records = self.records(relation)?;
        bump(&self.counters.writers_opened);
        Ok(Box::new(MemoryWriter {
            records,
            appended: 0,
            fail_after: self.append_failure_after.get(),
            fail_close: self.fail_writer_close.get(),
            counters: Rc::clone(&self.counters),
            closed: false,
        }))
    }

    fn create(&self, relation: &str) -> DbResult<()> {
        if self.relations.borrow().contains_key(relation) {
            return Err(DbError::Storage(format!("relation '{relation}' exists")));
        }
        self.add_relation(relation, Vec::new());
        Ok(())
    }

    fn destroy(&self, relation: &str) -> DbResult<()> {
        self.relations
            .borrow_mut()
            .remove(relation)
            .map(|_| ())
            .ok_or_else(|| DbError::Storage(format!("no storage for relation '{relation}'")))
    }
}

struct MemoryCursor {
    records: Records,
    predicate: Option<ScanPredicate>,
    next: usize,
    current: Option<usize>,
    buf: Vec<u8>,
    yielded: usize,
    fail_after: Option<usize>,
    counters: Rc<Counters>,
    ended: bool,
}

impl ScanCursor for MemoryCursor {
    fn scan_next(&mut self) -> DbResult<Option<RecordId>> {
        if self.ended {
            return Err(DbError::Storage("scan already ended".into()));
        }
        if self.fail_after == Some(self.yielded) {
            return Err(DbError::Storage("injected scan failure".into()));
        }
        self.current = None;
        let records = self.records.borrow();
        while self.next < records.len() {
            let idx = self.next;
            self.next += 1;
            let Some(record) = &records[idx] else {
                continue;
            };
            if let Some(predicate) = &self.predicate {
                if !predicate.matches(record)? {
                    continue;
                }
            }
            self.current = Some(idx);
            self.buf.clear();
            self.buf.extend_from_slice(record);
            self.yielded += 1;
            return Ok(Some(RecordId {
                page_id: PageId(0),
                slot: idx as u16,
            }));
        }
        Ok(None)
    }

    fn get_record(&mut self) -> DbResult<&[u8]> {
        match self.current {
            Some(_) => Ok(&self.buf),
            None => Err(DbError::Storage("scan is not positioned on a record".into())),
        }
    }

    fn delete_record(&mut self) -> DbResult<()> {
        let Some(idx) = self.current.take() else {
            return Err(DbError::Storage("scan is not positioned on a record".into()));
        };
        self.records.borrow_mut()[idx] = None;
        Ok(())
    }

    fn end_scan(&mut self) -> DbResult<()> {
        if !self.ended {
            self.ended = true;
            bump(&self.counters.scans_closed);
        }
        Ok(())
    }
}

struct MemoryWriter {
    records: Records,
    appended: usize,
    fail_after: Option<usize>,
    fail_close: bool,
    counters: Rc<Counters>,
    closed: bool,
}

impl AppendWriter for MemoryWriter {
    fn insert_record(&mut self, record: &[u8]) -> DbResult<RecordId> {
        if self.closed {
            return Err(DbError::Storage("writer already closed".into()));
        }
        if self.fail_after == Some(self.appended) {
            return Err(DbError::Storage("injected append failure".into()));
        }
        let mut records = self.records.borrow_mut();
        records.push(Some(record.to_vec()));
        self.appended += 1;
        Ok(RecordId {
            page_id: PageId(0),
            slot: (records.len() - 1) as u16,
        })
    }

    fn close(&mut self) -> DbResult<()> {
        if !self.closed {
            self.closed = true;
            bump(&self.counters.writers_closed);
            if self.fail_close {
                return Err(DbError::Storage("injected close failure".into()));
            }
        }
        Ok(())
    }
}

/// Mock executor for testing operators in isolation.
///
/// Yields a fixed list of tuples, or a storage error on the first `next()`.
pub struct MockExecutor {
    rows: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    next_error: Option<String>,
    open_called: bool,
    close_called: bool,
}

impl MockExecutor {
    pub fn new(rows: Vec<Vec<u8>>) -> Self {
        Self {
            rows: rows.into(),
            current: Vec::new(),
            next_error: None,
            open_called: false,
            close_called: false,
        }
    }

    pub fn with_next_error(message: &str) -> Self {
        Self {
            next_error: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    #[allow(dead_code)]
    pub fn was_opened(&self) -> bool {
        self.open_called
    }

    #[allow(dead_code)]
    pub fn was_closed(&self) -> bool {
        self.close_called
    }
}

impl Executor for MockExecutor {
    fn open(&mut self, _ctx: &ExecutionContext) -> DbResult<()> {
        self.open_called = true;
        Ok(())
    }

    fn next(&mut self) -> DbResult<Option<&[u8]>> {
        if let Some(message) = self.next_error.take() {
            return Err(DbError::Storage(message));
        }
        match self.rows.pop_front() {
            Some(row) => {
                self.current = row;
                Ok(Some(&self.current))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> DbResult<()> {
        self.close_called = true;
        Ok(())
    }
}
