//! Sequential scan operator over a relation's heap storage.

use crate::{ExecutionContext, Executor};
use common::{DbError, DbResult, ExecutionStats, RecordId};
use std::time::Instant;
use storage::{ScanCursor, ScanPredicate};

/// Sequential scan operator - yields the raw bytes of every tuple matching its predicate.
///
/// The scan cursor is acquired in `open()` and released in `close()`.
pub struct SeqScanExec {
    relation: String,
    predicate: Option<ScanPredicate>,
    cursor: Option<Box<dyn ScanCursor>>,
    stats: ExecutionStats,
}

impl SeqScanExec {
    pub fn new(relation: impl Into<String>, predicate: Option<ScanPredicate>) -> Self {
        Self {
            relation: relation.into(),
            predicate,
            cursor: None,
            stats: ExecutionStats::default(),
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    fn cursor(&mut self) -> DbResult<&mut Box<dyn ScanCursor>> {
        let relation = &self.relation;
        self.cursor
            .as_mut()
            .ok_or_else(|| DbError::Executor(format!("scan over '{relation}' is not open")))
    }

    /// Move to the next matching tuple without fetching it.
    pub fn advance(&mut self) -> DbResult<Option<RecordId>> {
        let rid = self.cursor()?.scan_next()?;
        if rid.is_some() {
            self.stats.tuples_scanned += 1;
        }
        Ok(rid)
    }

    /// Delete the tuple the scan is positioned on.
    pub fn delete_current(&mut self) -> DbResult<()> {
        self.cursor()?.delete_record()?;
        self.stats.tuples_produced += 1;
        Ok(())
    }
}

impl Executor for SeqScanExec {
    fn open(&mut self, ctx: &ExecutionContext) -> DbResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();
        self.cursor = Some(ctx.store.open_scan(&self.relation, self.predicate.clone())?);
        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self) -> DbResult<Option<&[u8]>> {
        let start = Instant::now();
        if self.advance()?.is_none() {
            self.stats.total_next_time += start.elapsed();
            return Ok(None);
        }
        self.stats.tuples_produced += 1;
        self.stats.total_next_time += start.elapsed();
        Ok(Some(self.cursor()?.get_record()?))
    }

    fn close(&mut self) -> DbResult<()> {
        let start = Instant::now();
        let result = match self.cursor.take() {
            Some(mut cursor) => cursor.end_scan(),
            None => Ok(()),
        };
        self.stats.close_time = start.elapsed();
        result
    }

    fn stats(&self) -> Option<&ExecutionStats> {
        Some(&self.stats)
    }
}
