//! Cursor and writer implementations over a `HeapFile`.

use common::{DbError, DbResult, PageId, RecordId};

use crate::{AppendWriter, HeapFile, Page, ScanCursor, ScanPredicate};

/// Forward scan over a heap file, yielding records that satisfy an optional predicate.
///
/// The page holding the current record is cached; deletes update the cached
/// page and write it straight back, so the scan sees its own deletions.
#[derive(Debug)]
pub struct HeapFileScan {
    relation: String,
    file: HeapFile,
    predicate: Option<ScanPredicate>,
    num_pages: u64,
    next_page: u64,
    page: Option<Page>,
    next_slot: u16,
    current: Option<RecordId>,
    ended: bool,
}

impl HeapFileScan {
    pub fn new(
        relation: impl Into<String>,
        file: HeapFile,
        predicate: Option<ScanPredicate>,
    ) -> DbResult<Self> {
        let num_pages = file.num_pages()?;
        Ok(Self {
            relation: relation.into(),
            file,
            predicate,
            num_pages,
            next_page: 0,
            page: None,
            next_slot: 0,
            current: None,
            ended: false,
        })
    }

    fn check_open(&self) -> DbResult<()> {
        if self.ended {
            return Err(DbError::Storage(format!(
                "scan over '{}' already ended",
                self.relation
            )));
        }
        Ok(())
    }

    fn not_positioned(&self) -> DbError {
        DbError::Storage(format!(
            "scan over '{}' is not positioned on a record",
            self.relation
        ))
    }
}

impl ScanCursor for HeapFileScan {
    fn scan_next(&mut self) -> DbResult<Option<RecordId>> {
        self.check_open()?;
        self.current = None;
        loop {
            if self.page.is_none() {
                if self.next_page >= self.num_pages {
                    return Ok(None);
                }
                self.page = Some(self.file.read_page(self.next_page)?);
                self.next_page += 1;
                self.next_slot = 0;
            }
            let Some(page) = self.page.as_ref() else {
                continue;
            };

            let num_slots = page.num_slots()?;
            while self.next_slot < num_slots {
                let slot = self.next_slot;
                self.next_slot += 1;
                let Some(record) = page.record(slot)? else {
                    continue;
                };
                let matched = match &self.predicate {
                    Some(predicate) => predicate.matches(record)?,
                    None => true,
                };
                if matched {
                    let rid = RecordId {
                        page_id: PageId(page.id),
                        slot,
                    };
                    tracing::trace!(relation = %self.relation, %rid, "scan matched record");
                    self.current = Some(rid);
                    return Ok(Some(rid));
                }
            }
            self.page = None;
        }
    }

    fn get_record(&mut self) -> DbResult<&[u8]> {
        self.check_open()?;
        let (Some(rid), Some(page)) = (self.current, self.page.as_ref()) else {
            return Err(self.not_positioned());
        };
        page.record(rid.slot)?
            .ok_or_else(|| DbError::Storage(format!("record {rid} was deleted")))
    }

    fn delete_record(&mut self) -> DbResult<()> {
        self.check_open()?;
        let Some(rid) = self.current else {
            return Err(self.not_positioned());
        };
        let Some(page) = self.page.as_mut() else {
            return Err(DbError::Storage("scan lost its current page".into()));
        };
        page.delete_slot(rid.slot)?;
        self.file.write_page(page)?;
        self.current = None;
        tracing::trace!(relation = %self.relation, %rid, "deleted record");
        Ok(())
    }

    fn end_scan(&mut self) -> DbResult<()> {
        if !self.ended {
            self.ended = true;
            self.page = None;
            self.current = None;
            tracing::trace!(relation = %self.relation, "scan ended");
        }
        Ok(())
    }
}

impl Drop for HeapFileScan {
    fn drop(&mut self) {
        let _ = self.end_scan();
    }
}

/// Appending writer over a heap file.
#[derive(Debug)]
pub struct InsertFileScan {
    relation: String,
    file: HeapFile,
    closed: bool,
}

impl InsertFileScan {
    pub fn new(relation: impl Into<String>, file: HeapFile) -> Self {
        Self {
            relation: relation.into(),
            file,
            closed: false,
        }
    }
}

impl AppendWriter for InsertFileScan {
    fn insert_record(&mut self, record: &[u8]) -> DbResult<RecordId> {
        if self.closed {
            return Err(DbError::Storage(format!(
                "writer for '{}' already closed",
                self.relation
            )));
        }
        let rid = self.file.insert(record)?;
        tracing::trace!(relation = %self.relation, %rid, len = record.len(), "appended record");
        Ok(rid)
    }

    fn close(&mut self) -> DbResult<()> {
        self.closed = true;
        Ok(())
    }
}

impl Drop for InsertFileScan {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
