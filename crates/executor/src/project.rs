//! Project operator: copies selected attribute byte ranges into a packed output tuple.

use crate::{ExecutionContext, Executor};
use catalog::AttrDesc;
use common::{DbError, DbResult, ExecutionStats};
use std::time::Instant;

/// Project operator - packs selected attributes of each input tuple, in order.
///
/// Output attributes are laid out contiguously with no padding. The output
/// buffer is allocated once in `open()` and overwritten for every tuple.
pub struct ProjectExec {
    input: Box<dyn Executor>,
    projections: Vec<AttrDesc>,
    output_len: usize,
    scratch: Vec<u8>,
    stats: ExecutionStats,
}

impl ProjectExec {
    pub fn new(input: Box<dyn Executor>, projections: Vec<AttrDesc>) -> Self {
        let output_len = projections.iter().map(|desc| desc.len).sum();
        Self {
            input,
            projections,
            output_len,
            scratch: Vec::new(),
            stats: ExecutionStats::default(),
        }
    }

    /// Length in bytes of every tuple this operator produces.
    pub fn output_len(&self) -> usize {
        self.output_len
    }
}

impl Executor for ProjectExec {
    fn open(&mut self, ctx: &ExecutionContext) -> DbResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();
        self.scratch = vec![0; self.output_len];
        self.input.open(ctx)?;
        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self) -> DbResult<Option<&[u8]>> {
        let start = Instant::now();
        let Some(source) = self.input.next()? else {
            self.stats.total_next_time += start.elapsed();
            return Ok(None);
        };
        self.stats.tuples_scanned += 1;

        let mut out_offset = 0;
        for desc in &self.projections {
            let field = source.get(desc.offset..desc.end()).ok_or_else(|| {
                DbError::Executor(format!(
                    "attribute '{}' at {}..{} lies outside a {}-byte tuple",
                    desc.name,
                    desc.offset,
                    desc.end(),
                    source.len()
                ))
            })?;
            self.scratch[out_offset..out_offset + desc.len].copy_from_slice(field);
            out_offset += desc.len;
        }

        self.stats.tuples_produced += 1;
        self.stats.total_next_time += start.elapsed();
        Ok(Some(&self.scratch))
    }

    fn close(&mut self) -> DbResult<()> {
        let start = Instant::now();
        let result = self.input.close();
        self.stats.close_time = start.elapsed();
        result
    }

    fn stats(&self) -> Option<&ExecutionStats> {
        Some(&self.stats)
    }
}
