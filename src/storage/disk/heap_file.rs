use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::vec;

use log::debug;
use parking_lot::Mutex;

use crate::buffer::{BufferPool, LockMode};
use crate::common::{DbError, PageId, Result, TableId, TransactionId};
use crate::storage::page::{HeapPage, PageRef};
use crate::tuple::{Schema, Tuple};

/// HeapFile stores one table as an unordered sequence of heap pages.
/// Page `n` occupies bytes `[n * page_size, (n + 1) * page_size)` of the
/// backing file; there is no file header.
pub struct HeapFile {
    /// Stable id derived from the canonical path
    id: TableId,
    /// Canonical path to the backing file
    path: PathBuf,
    /// Schema of every record in the file
    schema: Arc<Schema>,
    /// Bytes per page
    page_size: usize,
    /// The backing file; the mutex also serializes file growth
    file: Mutex<File>,
    /// Number of pages currently in the file
    num_pages: AtomicU32,
    /// Number of page reads performed
    num_reads: AtomicU32,
    /// Number of page writes performed
    num_writes: AtomicU32,
}

impl HeapFile {
    /// Opens the heap file at `path`, creating it if it doesn't exist.
    /// Fails with `InvalidPageSize` if a page cannot hold one record.
    pub fn open<P: AsRef<Path>>(path: P, schema: Arc<Schema>, page_size: usize) -> Result<Self> {
        if HeapPage::slot_capacity(page_size, &schema) == 0 {
            return Err(DbError::InvalidPageSize {
                page_size,
                record_size: schema.byte_size(),
            });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let path = fs::canonicalize(path.as_ref())?;
        let file_size = file.metadata()?.len();
        let num_pages = (file_size / page_size as u64) as u32;

        Ok(Self {
            id: TableId::from_path(&path),
            path,
            schema,
            page_size,
            file: Mutex::new(file),
            num_pages: AtomicU32::new(num_pages),
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        })
    }

    /// Returns the table id.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the schema of records in this file.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the canonical path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the page size in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the number of pages currently in the file.
    pub fn num_pages(&self) -> u32 {
        self.num_pages.load(Ordering::Acquire)
    }

    /// Returns the number of page reads performed.
    pub fn num_reads(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of page writes performed.
    pub fn num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }

    fn offset(&self, page_no: u32) -> u64 {
        page_no as u64 * self.page_size as u64
    }

    fn check_bounds(&self, page_id: PageId) -> Result<()> {
        if page_id.table_id != self.id {
            return Err(DbError::TableNotFound(page_id.table_id));
        }
        if page_id.page_no >= self.num_pages() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} is past the end of {}", page_id, self.path.display()),
            )
            .into());
        }
        Ok(())
    }

    /// Reads and decodes an existing page.
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        self.check_bounds(page_id)?;

        let mut data = vec![0u8; self.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(self.offset(page_id.page_no)))?;
            file.read_exact(&mut data)?;
        }
        self.num_reads.fetch_add(1, Ordering::Relaxed);

        HeapPage::from_bytes(page_id, Arc::clone(&self.schema), &data)
    }

    /// Overwrites an existing page in place.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let page_id = page.page_id();
        self.check_bounds(page_id)?;

        let data = page.to_bytes();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.offset(page_id.page_no)))?;
        file.write_all(&data)?;
        file.flush()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Appends one zeroed page to the end of the file.
    pub fn allocate_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let page_no = self.num_pages.load(Ordering::Acquire);

        file.seek(SeekFrom::Start(self.offset(page_no)))?;
        file.write_all(&HeapPage::create_empty_page_data(self.page_size))?;
        file.flush()?;
        self.num_pages.store(page_no + 1, Ordering::Release);

        let page_id = PageId::new(self.id, page_no);
        debug!("appended {} to {}", page_id, self.path.display());
        Ok(page_id)
    }

    /// Inserts a tuple into the first page with a free slot, growing the file
    /// when every page is full. Returns the modified page.
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>> {
        if **tuple.schema() != *self.schema {
            return Err(DbError::SchemaMismatch {
                expected: self.schema.to_string(),
                found: tuple.schema().to_string(),
            });
        }

        for page_no in 0..self.num_pages() {
            let page_id = PageId::new(self.id, page_no);
            if let Some(page) = self.try_insert(pool, tid, page_id, tuple)? {
                return Ok(vec![page]);
            }
        }

        // A concurrent inserter may fill a freshly appended page first
        loop {
            let page_id = self.allocate_page()?;
            if let Some(page) = self.try_insert(pool, tid, page_id, tuple)? {
                return Ok(vec![page]);
            }
        }
    }

    /// Locks the page exclusively and inserts if it has room. A full page
    /// whose lock was taken only for this probe is released again.
    fn try_insert(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        page_id: PageId,
        tuple: &mut Tuple,
    ) -> Result<Option<PageRef>> {
        let held = pool.holds_lock(tid, page_id);
        let page = pool.get_page(tid, page_id, LockMode::Exclusive)?;

        let inserted = {
            let mut guard = page.write();
            if guard.empty_slot_count() > 0 {
                guard.insert_tuple(tuple)?;
                true
            } else {
                false
            }
        };

        if inserted {
            Ok(Some(page))
        } else {
            if !held {
                pool.release_page(tid, page_id);
            }
            Ok(None)
        }
    }

    /// Deletes the tuple from the page named by its record id.
    pub fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>> {
        let record_id = tuple
            .record_id()
            .ok_or_else(|| DbError::record_not_found(None))?;
        let page_id = record_id.page_id;
        if page_id.table_id != self.id || page_id.page_no >= self.num_pages() {
            return Err(DbError::record_not_found(Some(record_id)));
        }

        let page = pool.get_page(tid, page_id, LockMode::Exclusive)?;
        page.write().delete_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Returns a lazy iterator over every tuple in the file, fetching pages
    /// through the buffer pool with shared locks.
    pub fn iter(self: &Arc<Self>, pool: Arc<BufferPool>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator {
            file: Arc::clone(self),
            pool,
            tid,
            next_page: 0,
            buffered: Vec::new().into_iter(),
        }
    }
}

impl Drop for HeapFile {
    fn drop(&mut self) {
        let _ = self.file.get_mut().sync_all();
    }
}

/// Iterator over the tuples of a heap file, page by page.
///
/// Only one page's tuples are held at a time. The page count is re-read on
/// every page boundary so pages appended mid-scan are visited.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    next_page: u32,
    buffered: vec::IntoIter<Tuple>,
}

impl HeapFileIterator {
    /// Restarts the scan from page 0.
    pub fn rewind(&mut self) {
        self.next_page = 0;
        self.buffered = Vec::new().into_iter();
    }
}

impl Iterator for HeapFileIterator {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.buffered.next() {
                return Some(Ok(tuple));
            }
            if self.next_page >= self.file.num_pages() {
                return None;
            }

            // advance only past a fetched page so a failed fetch can be retried
            let page_id = PageId::new(self.file.id(), self.next_page);
            match self.pool.get_page(self.tid, page_id, LockMode::Shared) {
                Ok(page) => {
                    let tuples: Vec<Tuple> = page.read().iter().cloned().collect();
                    self.buffered = tuples.into_iter();
                    self.next_page += 1;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
