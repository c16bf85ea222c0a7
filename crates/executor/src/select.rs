//! Selection with projection into a result relation.

use crate::{
    predicate::build_predicate, project::ProjectExec, scan::SeqScanExec, AttrRef,
    ExecutionContext, Executor, Selection,
};
use common::{DbError, DbResult, ExecutionStats};
use tracing::{trace, warn};

/// Select operator - scans a source relation and appends the projection of
/// every matching tuple to a result relation.
///
/// All schema checks happen in [`SelectExec::plan`], so a rejected request
/// never opens a writer or a scan.
pub struct SelectExec {
    source: String,
    result: String,
    project: ProjectExec,
}

impl SelectExec {
    pub fn plan(
        ctx: &ExecutionContext,
        result: &str,
        projection: &[AttrRef],
        selection: Option<&Selection>,
    ) -> DbResult<Self> {
        let descs = projection
            .iter()
            .map(|attr| ctx.catalog.get_info(&attr.relation, &attr.attribute))
            .collect::<DbResult<Vec<_>>>()?;
        let first = projection
            .first()
            .ok_or_else(|| DbError::Executor("projection list is empty".into()))?;
        let source = first.relation.as_str();

        if let Some(other) = projection.iter().find(|attr| attr.relation != source) {
            return Err(DbError::Executor(format!(
                "projection mixes relations '{source}' and '{}'",
                other.relation
            )));
        }
        let predicate = build_predicate(ctx.catalog, selection)?;
        if let Some(sel) = selection {
            if sel.relation != source {
                return Err(DbError::Executor(format!(
                    "selection on '{}' does not match projected relation '{source}'",
                    sel.relation
                )));
            }
        }
        if result == source {
            return Err(DbError::Executor(format!(
                "result relation '{result}' is also the source relation"
            )));
        }

        let output_len: usize = descs.iter().map(|desc| desc.len).sum();

        // A registered result relation must have exactly the projected width.
        match ctx.catalog.get_rel_info(result) {
            Ok(attrs) => {
                let result_len: usize = attrs.iter().map(|desc| desc.len).sum();
                if result_len != output_len {
                    return Err(DbError::InvalidRecordLength {
                        expected: result_len,
                        actual: output_len,
                    });
                }
            }
            Err(DbError::SchemaLookup(_)) => {}
            Err(err) => return Err(err),
        }

        let scan = SeqScanExec::new(source, predicate);
        Ok(Self {
            source: source.to_string(),
            result: result.to_string(),
            project: ProjectExec::new(Box::new(scan), descs),
        })
    }

    /// Run the select and return the number of tuples written to the result relation.
    pub fn execute(&mut self, ctx: &ExecutionContext) -> DbResult<u64> {
        let mut writer = ctx.store.open_writer(&self.result)?;
        if let Err(err) = self.project.open(ctx) {
            if let Err(close_err) = writer.close() {
                warn!(
                    relation = %self.result,
                    error = %close_err,
                    "writer close failed after scan open error"
                );
            }
            return Err(err);
        }

        let mut copied = 0;
        let outcome = loop {
            match self.project.next() {
                Ok(Some(tuple)) => {
                    if let Err(err) = writer.insert_record(tuple) {
                        break Err(err);
                    }
                    copied += 1;
                }
                Ok(None) => break Ok(copied),
                Err(err) => break Err(err),
            }
        };

        let scan_closed = self.project.close();
        let writer_closed = writer.close();
        let copied = outcome?;
        scan_closed?;
        writer_closed?;

        trace!(source = %self.source, result = %self.result, copied, "select copied tuples");
        Ok(copied)
    }

    pub fn output_len(&self) -> usize {
        self.project.output_len()
    }

    pub fn stats(&self) -> Option<&ExecutionStats> {
        self.project.stats()
    }
}
