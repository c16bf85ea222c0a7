//! DML operators: Insert, Delete.

use crate::{materialize::materialize, scan::SeqScanExec, AttrValue, ExecutionContext, Executor};
use common::{DbResult, ExecutionStats, RecordId};
use std::time::Instant;
use storage::ScanPredicate;
use tracing::trace;

/// Insert operator - materializes one tuple and appends it to a relation.
///
/// The tuple is fully built before the writer is opened, so a rejected request
/// never touches storage.
pub struct InsertExec {
    relation: String,
    values: Vec<AttrValue>,
    stats: ExecutionStats,
}

impl InsertExec {
    pub fn new(relation: impl Into<String>, values: Vec<AttrValue>) -> Self {
        Self {
            relation: relation.into(),
            values,
            stats: ExecutionStats::default(),
        }
    }

    pub fn execute(&mut self, ctx: &ExecutionContext) -> DbResult<RecordId> {
        let start = Instant::now();
        let tuple = materialize(ctx.catalog, &self.relation, &self.values)?;

        let mut writer = ctx.store.open_writer(&self.relation)?;
        self.stats.open_time = start.elapsed();

        let inserted = writer.insert_record(tuple.as_bytes());
        let closed = writer.close();
        let rid = inserted?;
        closed?;

        trace!(relation = %self.relation, %rid, "tuple appended");
        self.stats.tuples_produced = 1;
        self.stats.total_next_time = start.elapsed().saturating_sub(self.stats.open_time);
        Ok(rid)
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }
}

/// Delete operator - removes every tuple its scan yields.
///
/// Deleting the current tuple and then advancing never skips or repeats a tuple,
/// so the scan runs to completion in a single pass.
pub struct DeleteExec {
    scan: SeqScanExec,
}

impl DeleteExec {
    pub fn new(relation: impl Into<String>, predicate: Option<ScanPredicate>) -> Self {
        Self {
            scan: SeqScanExec::new(relation, predicate),
        }
    }

    /// Run the delete and return the number of removed tuples.
    pub fn execute(&mut self, ctx: &ExecutionContext) -> DbResult<u64> {
        self.scan.open(ctx)?;
        let outcome = self.delete_matching();
        let closed = self.scan.close();
        let deleted = outcome?;
        closed?;
        Ok(deleted)
    }

    fn delete_matching(&mut self) -> DbResult<u64> {
        let mut deleted = 0;
        while let Some(rid) = self.scan.advance()? {
            self.scan.delete_current()?;
            trace!(relation = %self.scan.relation(), %rid, "tuple deleted");
            deleted += 1;
        }
        Ok(deleted)
    }

    pub fn stats(&self) -> Option<&ExecutionStats> {
        self.scan.stats()
    }
}
