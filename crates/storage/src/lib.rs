//! Heap-file storage for fixed-layout relations.
//!
//! Each relation lives in one file of slotted 4 KiB pages. Records are opaque
//! byte strings; deleting a record zeroes its slot length and never moves or
//! renumbers other slots, so a forward scan may delete the record it is
//! positioned on and keep advancing.

mod predicate;
mod scan;
mod store;

pub use predicate::ScanPredicate;
pub use scan::{HeapFileScan, InsertFileScan};
pub use store::FileStore;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::mem::size_of;
use std::path::Path;

use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_into_slice};
use common::{DbError, DbResult, PageId, RecordId};

pub const PAGE_SIZE: usize = 4096;
const HEADER_BYTES: usize = size_of::<PageHeader>();
const SLOT_BYTES: usize = size_of::<Slot>();

/// Largest record a single page can hold.
pub const MAX_RECORD_LEN: usize = PAGE_SIZE - HEADER_BYTES - SLOT_BYTES;

fn bincode_config() -> impl Config {
    config::legacy()
}

/// Iteration handle over a relation's records, optionally predicate-filtered.
pub trait ScanCursor {
    /// Advance to the next matching record. `Ok(None)` means the scan is exhausted.
    fn scan_next(&mut self) -> DbResult<Option<RecordId>>;

    /// Bytes of the record the cursor is positioned on.
    fn get_record(&mut self) -> DbResult<&[u8]>;

    /// Delete the record the cursor is positioned on; the next `scan_next`
    /// continues with the following record.
    fn delete_record(&mut self) -> DbResult<()>;

    /// Release the cursor. Calling it again is a no-op.
    fn end_scan(&mut self) -> DbResult<()>;
}

/// Appends packed tuples to a relation.
pub trait AppendWriter {
    fn insert_record(&mut self, record: &[u8]) -> DbResult<RecordId>;

    /// Release the writer. Calling it again is a no-op.
    fn close(&mut self) -> DbResult<()>;
}

/// Opens cursors and writers over named relations.
pub trait RelationStore {
    fn open_scan(
        &self,
        relation: &str,
        predicate: Option<ScanPredicate>,
    ) -> DbResult<Box<dyn ScanCursor>>;

    fn open_writer(&self, relation: &str) -> DbResult<Box<dyn AppendWriter>>;

    /// Allocate empty physical storage for a relation.
    fn create(&self, relation: &str) -> DbResult<()>;

    /// Drop a relation's physical storage.
    fn destroy(&self, relation: &str) -> DbResult<()>;
}

#[derive(Debug, Clone)]
pub struct Page {
    pub id: u64,
    pub data: Vec<u8>,
}

impl Page {
    pub fn new(id: u64) -> DbResult<Self> {
        let mut page = Self {
            id,
            data: vec![0u8; PAGE_SIZE],
        };
        page.write_header(&PageHeader::default())?;
        Ok(page)
    }

    fn header(&self) -> DbResult<PageHeader> {
        let (header, read) = decode_from_slice(&self.data[..HEADER_BYTES], bincode_config())
            .map_err(|e| DbError::Storage(format!("read page header failed: {e}")))?;
        debug_assert_eq!(read, HEADER_BYTES);
        Ok(header)
    }

    fn write_header(&mut self, header: &PageHeader) -> DbResult<()> {
        let written = encode_into_slice(header, &mut self.data[..HEADER_BYTES], bincode_config())
            .map_err(|e| DbError::Storage(format!("write page header failed: {e}")))?;
        debug_assert_eq!(written, HEADER_BYTES);
        Ok(())
    }

    fn slot_offset(slot_idx: u16) -> usize {
        HEADER_BYTES + slot_idx as usize * SLOT_BYTES
    }

    fn read_slot(&self, slot_idx: u16) -> DbResult<Slot> {
        let start = Self::slot_offset(slot_idx);
        let end = start + SLOT_BYTES;
        if end > PAGE_SIZE {
            return Err(DbError::Storage(format!("slot {slot_idx} out of bounds")));
        }
        let (slot, read) = decode_from_slice(&self.data[start..end], bincode_config())
            .map_err(|e| DbError::Storage(format!("read slot failed: {e}")))?;
        debug_assert_eq!(read, SLOT_BYTES);
        Ok(slot)
    }

    fn write_slot(&mut self, slot_idx: u16, slot: &Slot) -> DbResult<()> {
        let start = Self::slot_offset(slot_idx);
        let end = start + SLOT_BYTES;
        if end > PAGE_SIZE {
            return Err(DbError::Storage(format!("slot {slot_idx} out of bounds")));
        }
        let written = encode_into_slice(slot, &mut self.data[start..end], bincode_config())
            .map_err(|e| DbError::Storage(format!("write slot failed: {e}")))?;
        debug_assert_eq!(written, SLOT_BYTES);
        Ok(())
    }

    fn free_space(&self) -> DbResult<usize> {
        let header = self.header()?;
        let slots_start = HEADER_BYTES + header.num_slots as usize * SLOT_BYTES;
        let free_offset = usize::from(header.free_offset);
        Ok(free_offset.saturating_sub(slots_start))
    }

    fn can_fit(&self, payload_len: usize) -> DbResult<bool> {
        let needed = payload_len + SLOT_BYTES;
        Ok(self.free_space()? >= needed)
    }

    /// Number of slot directory entries, live or deleted.
    pub fn num_slots(&self) -> DbResult<u16> {
        Ok(self.header()?.num_slots)
    }

    fn append_record(&mut self, bytes: &[u8]) -> DbResult<u16> {
        if bytes.is_empty() {
            return Err(DbError::Storage("cannot store an empty record".into()));
        }
        if bytes.len() > MAX_RECORD_LEN {
            return Err(DbError::Storage("record exceeds maximum record size".into()));
        }
        let mut header = self.header()?;
        if header.num_slots == u16::MAX {
            return Err(DbError::Storage("slot index overflow".into()));
        }
        if !self.can_fit(bytes.len())? {
            return Err(DbError::Storage("page full".into()));
        }
        let slot_idx = header.num_slots;
        let len = bytes.len() as u16;
        let new_free_offset = header.free_offset - len;
        self.data[new_free_offset as usize..header.free_offset as usize].copy_from_slice(bytes);

        let slot = Slot {
            offset: new_free_offset,
            len,
        };
        self.write_slot(slot_idx, &slot)?;

        header.num_slots += 1;
        header.free_offset = new_free_offset;
        self.write_header(&header)?;
        Ok(slot_idx)
    }

    /// Record bytes stored in `slot_idx`, or `None` if the slot was deleted.
    pub fn record(&self, slot_idx: u16) -> DbResult<Option<&[u8]>> {
        if slot_idx >= self.num_slots()? {
            return Err(DbError::Storage(format!("invalid slot {slot_idx}")));
        }
        let slot = self.read_slot(slot_idx)?;
        if slot.is_empty() {
            return Ok(None);
        }
        let start = slot.offset as usize;
        let end = start + slot.len as usize;
        self.data
            .get(start..end)
            .map(Some)
            .ok_or_else(|| DbError::Storage(format!("slot {slot_idx} points past page end")))
    }

    /// Mark a slot deleted. Other slots keep their numbers.
    pub fn delete_slot(&mut self, slot_idx: u16) -> DbResult<()> {
        if slot_idx >= self.num_slots()? {
            return Err(DbError::Storage(format!("invalid slot {slot_idx}")));
        }
        let mut slot = self.read_slot(slot_idx)?;
        if slot.is_empty() {
            return Err(DbError::Storage("slot already empty".into()));
        }
        slot.len = 0;
        self.write_slot(slot_idx, &slot)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PageHeader {
    pub num_slots: u16,
    pub free_offset: u16,
}

impl Default for PageHeader {
    fn default() -> Self {
        Self {
            num_slots: 0,
            free_offset: PAGE_SIZE as u16,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Slot {
    pub offset: u16,
    pub len: u16,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One relation's heap file.
#[derive(Debug)]
pub struct HeapFile {
    file: File,
    sync_writes: bool,
}

impl HeapFile {
    pub fn open(path: &Path, sync_writes: bool) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self { file, sync_writes })
    }

    fn file_len(&self) -> DbResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn num_pages(&self) -> DbResult<u64> {
        Ok(self.file_len()? / PAGE_SIZE as u64)
    }

    fn last_page_id(&self) -> DbResult<Option<u64>> {
        let pages = self.num_pages()?;
        if pages == 0 {
            Ok(None)
        } else {
            Ok(Some(pages - 1))
        }
    }

    fn allocate_page(&self) -> DbResult<Page> {
        let id = self.num_pages()?;
        Page::new(id)
    }

    pub fn read_page(&mut self, page_id: u64) -> DbResult<Page> {
        let mut page = Page::new(page_id)?;
        if page_id >= self.num_pages()? {
            return Ok(page);
        }

        self.file
            .seek(SeekFrom::Start(page_id * PAGE_SIZE as u64))?;
        self.file.read_exact(&mut page.data)?;
        Ok(page)
    }

    pub fn write_page(&mut self, page: &Page) -> DbResult<()> {
        self.file
            .seek(SeekFrom::Start(page.id * PAGE_SIZE as u64))?;
        self.file.write_all(&page.data)?;
        self.file.flush()?;
        if self.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn ensure_page_exists(&self, page_id: u64) -> DbResult<()> {
        if page_id >= self.num_pages()? {
            return Err(DbError::Storage(format!("page {page_id} not allocated")));
        }
        Ok(())
    }

    /// Append a record to the last page, starting a new page when it is full.
    pub fn insert(&mut self, record: &[u8]) -> DbResult<RecordId> {
        let mut page = match self.last_page_id()? {
            Some(id) => self.read_page(id)?,
            None => self.allocate_page()?,
        };

        if !page.can_fit(record.len())? {
            page = self.allocate_page()?;
        }

        let slot = page.append_record(record)?;
        self.write_page(&page)?;

        Ok(RecordId {
            page_id: PageId(page.id),
            slot,
        })
    }

    pub fn get(&mut self, rid: RecordId) -> DbResult<Vec<u8>> {
        self.ensure_page_exists(rid.page_id.0)?;
        let page = self.read_page(rid.page_id.0)?;
        page.record(rid.slot)?
            .map(<[u8]>::to_vec)
            .ok_or_else(|| DbError::Storage("slot empty".into()))
    }

    pub fn delete(&mut self, rid: RecordId) -> DbResult<()> {
        self.ensure_page_exists(rid.page_id.0)?;
        let mut page = self.read_page(rid.page_id.0)?;
        page.delete_slot(rid.slot)?;
        self.write_page(&page)
    }
}
