use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::common::{DbError, PageId, RecordId, Result, SlotId, TransactionId};
use crate::tuple::{Schema, Tuple};

/// Heap page layout:
///
/// ```text
/// +------------------+
/// | Slot Bitmap      |  ceil(slot_count / 8) bytes, bit i = slot i occupied
/// +------------------+
/// | [slot 0]         |  schema.byte_size() bytes each
/// | [slot 1]         |
/// | ...              |
/// | [slot n-1]       |
/// +------------------+
/// | Zero Padding     |  up to page_size
/// +------------------+
/// ```
///
/// Bit i lives in byte i / 8 at bit position i % 8 (least significant first).
/// A free slot's bytes are all zero.
#[derive(Debug, Clone)]
pub struct HeapPage {
    page_id: PageId,
    schema: Arc<Schema>,
    page_size: usize,
    /// Occupancy bitmap
    header: Vec<u8>,
    /// Decoded slot contents; `Some` exactly where the bitmap bit is set
    slots: Vec<Option<Tuple>>,
    /// Transaction that last dirtied this page, if it is dirty
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    /// Number of records of `schema` that fit on one page:
    /// floor(page_bits / (record_bits + 1)).
    pub fn slot_capacity(page_size: usize, schema: &Schema) -> usize {
        (page_size * 8) / (schema.byte_size() * 8 + 1)
    }

    /// Size of the occupancy bitmap for the given slot count.
    pub fn header_size(slot_count: usize) -> usize {
        slot_count.div_ceil(8)
    }

    /// Returns the bytes of a page with no occupied slots.
    pub fn create_empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Creates an in-memory page with no occupied slots.
    pub fn empty(page_id: PageId, schema: Arc<Schema>, page_size: usize) -> Self {
        let slot_count = Self::slot_capacity(page_size, &schema);
        Self {
            page_id,
            schema,
            page_size,
            header: vec![0u8; Self::header_size(slot_count)],
            slots: vec![None; slot_count],
            dirtier: None,
        }
    }

    /// Decodes a page from exactly `page_size` bytes.
    pub fn from_bytes(page_id: PageId, schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        let page_size = data.len();
        let slot_count = Self::slot_capacity(page_size, &schema);
        let header_size = Self::header_size(slot_count);
        let record_size = schema.byte_size();

        if header_size + slot_count * record_size > page_size {
            return Err(DbError::CorruptPage(page_id));
        }

        let header = data[..header_size].to_vec();
        let mut slots = Vec::with_capacity(slot_count);

        for slot in 0..slot_count {
            if header[slot / 8] & (1 << (slot % 8)) == 0 {
                slots.push(None);
                continue;
            }
            let offset = header_size + slot * record_size;
            let mut bytes = &data[offset..offset + record_size];
            let mut tuple = Tuple::from_bytes(Arc::clone(&schema), &mut bytes)
                .ok_or(DbError::CorruptPage(page_id))?;
            tuple.set_record_id(Some(RecordId::new(page_id, SlotId::new(slot as u32))));
            slots.push(Some(tuple));
        }

        Ok(Self {
            page_id,
            schema,
            page_size,
            header,
            slots,
            dirtier: None,
        })
    }

    /// Encodes the page into exactly `page_size` bytes.
    pub fn to_bytes(&self) -> Bytes {
        let record_size = self.schema.byte_size();
        let mut buf = BytesMut::with_capacity(self.page_size);

        buf.put_slice(&self.header);
        for slot in &self.slots {
            match slot {
                Some(tuple) => tuple.write_to(&mut buf),
                None => buf.put_bytes(0, record_size),
            }
        }
        let padding = self.page_size - buf.len();
        buf.put_bytes(0, padding);

        buf.freeze()
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the schema of records on this page.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the total number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Counts the unoccupied slots.
    pub fn empty_slot_count(&self) -> usize {
        (0..self.slot_count())
            .filter(|&slot| !self.is_slot_used(slot))
            .count()
    }

    /// Returns whether the bitmap marks the slot as occupied.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        slot < self.slot_count() && self.header[slot / 8] & (1 << (slot % 8)) != 0
    }

    fn set_slot_used(&mut self, slot: usize, used: bool) {
        let mask = 1 << (slot % 8);
        if used {
            self.header[slot / 8] |= mask;
        } else {
            self.header[slot / 8] &= !mask;
        }
    }

    /// Returns the record stored in a slot.
    pub fn tuple(&self, slot_id: SlotId) -> Option<&Tuple> {
        self.slots.get(slot_id.as_usize()).and_then(Option::as_ref)
    }

    /// Stores the tuple in the lowest-numbered free slot and assigns its
    /// record id.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> Result<RecordId> {
        if **tuple.schema() != *self.schema {
            return Err(DbError::SchemaMismatch {
                expected: self.schema.to_string(),
                found: tuple.schema().to_string(),
            });
        }

        let slot = (0..self.slot_count())
            .find(|&slot| !self.is_slot_used(slot))
            .ok_or(DbError::PageFull(self.page_id))?;

        let record_id = RecordId::new(self.page_id, SlotId::new(slot as u32));
        tuple.set_record_id(Some(record_id));

        self.set_slot_used(slot, true);
        self.slots[slot] = Some(tuple.clone().with_schema(Arc::clone(&self.schema)));

        Ok(record_id)
    }

    /// Frees the slot named by the tuple's record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let record_id = tuple
            .record_id()
            .ok_or_else(|| DbError::record_not_found(None))?;

        let slot = record_id.slot_id.as_usize();
        if record_id.page_id != self.page_id || !self.is_slot_used(slot) {
            return Err(DbError::record_not_found(Some(record_id)));
        }

        self.set_slot_used(slot, false);
        self.slots[slot] = None;
        Ok(())
    }

    /// Yields every occupied slot's record in slot order. Each call starts a
    /// fresh scan of the bitmap.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> + '_ {
        (0..self.slot_count())
            .filter(move |&slot| self.is_slot_used(slot))
            .filter_map(move |slot| self.slots[slot].as_ref())
    }

    /// Marks the page dirty on behalf of a transaction, or clean with `None`.
    pub fn mark_dirty(&mut self, dirtier: Option<TransactionId>) {
        self.dirtier = dirtier;
    }

    /// Returns the transaction that dirtied the page, if it is dirty.
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    /// Returns whether the page has unflushed modifications.
    pub fn is_dirty(&self) -> bool {
        self.dirtier.is_some()
    }
}
