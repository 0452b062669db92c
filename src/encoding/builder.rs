//! # Offset-Table Builder
//!
//! This module provides `Builder`, which writes the offset-table wire format
//! back-to-front into a caller-supplied byte buffer. The buffer usually comes
//! from a scratch pool, so repeated encodes reuse one allocation.
//!
//! ## Back-to-Front Layout
//!
//! ```text
//! buf: [ unused .......... | root | vtable | table | children ... ]
//!                          ^head                                  ^len
//!
//! offset() = len - head   (distance of the write cursor from the end)
//! ```
//!
//! Everything is addressed by its distance from the end of the buffer, so
//! growing the buffer (doubling, contents moved to the new tail) never
//! invalidates an offset handed out earlier. Alignment is computed relative to
//! the end as well; `finish` pads the front so the final buffer start is
//! aligned to the largest scalar written.
//!
//! ## Ordering Constraint
//!
//! Strings, blobs, vectors and child tables are written out-of-line and
//! referenced by `u32` offsets pointing forward (towards higher addresses).
//! A table's references are only valid if every child was finished before the
//! table was started, so creating any out-of-line value while a table is open
//! is an error rather than a silently corrupt buffer.
//!
//! ## Table Finalization
//!
//! ```text
//! end_table():
//!   1. prepend i32 placeholder (the table's soffset)
//!   2. drop trailing absent slots
//!   3. prepend slot entries, last slot first (u16, relative to table start)
//!   4. prepend table size, then vtable size
//!   5. patch placeholder with (vtable offset - table offset)
//! ```

use eyre::{bail, ensure, Result};
use smallvec::SmallVec;

use crate::config::{
    DEFAULT_BUILDER_CAPACITY, MAX_BUFFER_SIZE, MAX_SCALAR_ALIGN, MAX_TABLE_SIZE, SIZE_SOFFSET,
    SIZE_UOFFSET, SIZE_VOFFSET, VTABLE_METADATA_FIELDS,
};
use crate::encoding::Scalar;

pub struct Builder<'b> {
    buf: &'b mut Vec<u8>,
    head: usize,
    min_align: usize,
    vtable: SmallVec<[u32; 16]>,
    object_end: u32,
    nested: bool,
}

impl<'b> Builder<'b> {
    /// Starts a fresh build in `buf`. Existing contents are overwritten and the
    /// whole allocation is used as working space.
    pub fn new(buf: &'b mut Vec<u8>) -> Self {
        let working = buf.capacity().max(DEFAULT_BUILDER_CAPACITY);
        buf.resize(working, 0);
        let head = buf.len();
        Self {
            buf,
            head,
            min_align: 1,
            vtable: SmallVec::new(),
            object_end: 0,
            nested: false,
        }
    }

    /// Distance of the write cursor from the end of the buffer.
    #[inline]
    pub fn offset(&self) -> u32 {
        (self.buf.len() - self.head) as u32
    }

    fn grow(&mut self) -> Result<()> {
        let old_len = self.buf.len();
        let new_len = (old_len * 2).max(DEFAULT_BUILDER_CAPACITY);
        ensure!(
            new_len <= MAX_BUFFER_SIZE,
            "encoded record exceeds maximum buffer size of {} bytes",
            MAX_BUFFER_SIZE
        );

        let used = old_len - self.head;
        self.buf.resize(new_len, 0);
        let new_head = new_len - used;
        self.buf.copy_within(self.head..old_len, new_head);
        self.head = new_head;
        Ok(())
    }

    fn pad(&mut self, n: usize) {
        let start = self.head - n;
        self.buf[start..self.head].fill(0);
        self.head = start;
    }

    /// Aligns so that after writing `additional` bytes the cursor sits on a
    /// `size` boundary, and reserves room for both.
    fn prep(&mut self, size: usize, additional: usize) -> Result<()> {
        debug_assert!(size <= MAX_SCALAR_ALIGN);
        if size > self.min_align {
            self.min_align = size;
        }

        let align_size = (self.offset() as usize)
            .wrapping_add(additional)
            .wrapping_neg()
            & (size - 1);

        let needed = align_size + size + additional;
        while self.head < needed {
            self.grow()?;
        }
        self.pad(align_size);
        Ok(())
    }

    #[inline]
    fn place<S: Scalar>(&mut self, value: S) {
        self.head -= S::WIDTH;
        value.write_le(&mut self.buf[self.head..]);
    }

    fn place_bytes(&mut self, bytes: &[u8]) {
        self.head -= bytes.len();
        self.buf[self.head..self.head + bytes.len()].copy_from_slice(bytes);
    }

    pub fn prepend<S: Scalar>(&mut self, value: S) -> Result<()> {
        self.prep(S::WIDTH, 0)?;
        self.place(value);
        Ok(())
    }

    /// Writes a reference to the value that ended at `target`.
    pub fn prepend_uoffset(&mut self, target: u32) -> Result<()> {
        self.prep(SIZE_UOFFSET, 0)?;
        ensure!(
            target <= self.offset(),
            "reference to offset {} points past the write cursor {}",
            target,
            self.offset()
        );
        let relative = self.offset() - target + SIZE_UOFFSET as u32;
        self.place(relative);
        Ok(())
    }

    fn assert_not_nested(&self, what: &str) -> Result<()> {
        if self.nested {
            bail!("cannot create {} while a table is being built", what);
        }
        Ok(())
    }

    fn start_vector(&mut self, elem_size: usize, count: usize, alignment: usize) -> Result<()> {
        self.assert_not_nested("a vector")?;
        let body = elem_size
            .checked_mul(count)
            .filter(|&n| n <= MAX_BUFFER_SIZE)
            .ok_or_else(|| eyre::eyre!("vector of {} elements is too large", count))?;
        self.prep(SIZE_UOFFSET, body)?;
        self.prep(alignment, body)
    }

    fn end_vector(&mut self, count: usize) -> Result<u32> {
        self.place(count as u32);
        Ok(self.offset())
    }

    /// Length-prefixed UTF-8 followed by a NUL terminator.
    pub fn create_string(&mut self, value: &str) -> Result<u32> {
        self.assert_not_nested("a string")?;
        let bytes = value.as_bytes();
        self.prep(SIZE_UOFFSET, bytes.len() + 1)?;
        self.place(0u8);
        self.place_bytes(bytes);
        self.end_vector(bytes.len())
    }

    /// Byte blob in natural order.
    pub fn create_bytes(&mut self, value: &[u8]) -> Result<u32> {
        self.start_vector(1, value.len(), 1)?;
        self.place_bytes(value);
        self.end_vector(value.len())
    }

    /// Fixed-width elements placed in logical order, so element 0 lands at
    /// the highest address of the vector body.
    pub fn create_scalar_vector<S: Scalar>(&mut self, values: &[S]) -> Result<u32> {
        self.start_vector(S::WIDTH, values.len(), S::WIDTH)?;
        for &value in values {
            self.place(value);
        }
        self.end_vector(values.len())
    }

    /// Copies an already encoded fixed-width vector body unchanged.
    pub fn create_raw_vector(&mut self, elem_size: usize, count: usize, body: &[u8]) -> Result<u32> {
        ensure!(
            body.len() == elem_size * count,
            "raw vector body is {} bytes, expected {} x {}",
            body.len(),
            count,
            elem_size
        );
        self.start_vector(elem_size, count, elem_size)?;
        self.place_bytes(body);
        self.end_vector(count)
    }

    /// Vector of references, element 0 at the highest address.
    pub fn create_offset_vector(&mut self, targets: &[u32]) -> Result<u32> {
        self.start_vector(SIZE_UOFFSET, targets.len(), SIZE_UOFFSET)?;
        for &target in targets {
            self.prepend_uoffset(target)?;
        }
        self.end_vector(targets.len())
    }

    pub fn start_table(&mut self, num_fields: usize) -> Result<()> {
        self.assert_not_nested("a table")?;
        self.vtable.clear();
        self.vtable.resize(num_fields, 0);
        self.object_end = self.offset();
        self.nested = true;
        Ok(())
    }

    fn track_slot(&mut self, slot: usize) -> Result<()> {
        let offset = self.offset();
        match self.vtable.get_mut(slot) {
            Some(entry) => {
                *entry = offset;
                Ok(())
            }
            None => bail!("slot {} outside table of {} fields", slot, self.vtable.len()),
        }
    }

    pub fn add_scalar<S: Scalar>(&mut self, slot: usize, value: S) -> Result<()> {
        ensure!(self.nested, "scalar slot written outside a table");
        self.prepend(value)?;
        self.track_slot(slot)
    }

    /// Inline copy of an already encoded scalar.
    pub fn add_raw(&mut self, slot: usize, raw: &[u8]) -> Result<()> {
        ensure!(self.nested, "scalar slot written outside a table");
        self.prep(raw.len(), 0)?;
        self.place_bytes(raw);
        self.track_slot(slot)
    }

    pub fn add_offset(&mut self, slot: usize, target: u32) -> Result<()> {
        ensure!(self.nested, "reference slot written outside a table");
        self.prepend_uoffset(target)?;
        self.track_slot(slot)
    }

    pub fn end_table(&mut self) -> Result<u32> {
        ensure!(self.nested, "end_table called without start_table");

        self.prepend(0i32)?;
        let object_offset = self.offset();

        while self.vtable.last() == Some(&0) {
            self.vtable.pop();
        }

        let table_size = (object_offset - self.object_end) as usize;
        ensure!(
            table_size <= MAX_TABLE_SIZE,
            "table body of {} bytes exceeds {} bytes",
            table_size,
            MAX_TABLE_SIZE
        );

        let entries = std::mem::take(&mut self.vtable);
        for &field_offset in entries.iter().rev() {
            let relative = if field_offset == 0 {
                0
            } else {
                (object_offset - field_offset) as u16
            };
            self.prepend(relative)?;
        }
        self.prepend(table_size as u16)?;
        let vtable_size = (entries.len() + VTABLE_METADATA_FIELDS) * SIZE_VOFFSET;
        self.prepend(vtable_size as u16)?;
        self.vtable = entries;

        let vtable_offset = self.offset();
        let table_pos = self.buf.len() - object_offset as usize;
        let soffset = (vtable_offset - object_offset) as i32;
        soffset.write_le(&mut self.buf[table_pos..table_pos + SIZE_SOFFSET]);

        self.nested = false;
        Ok(object_offset)
    }

    /// Writes the root reference. The finished bytes are then available from
    /// [`Builder::finished_data`].
    pub fn finish(&mut self, root: u32) -> Result<()> {
        self.assert_not_nested("the root reference")?;
        let align = self.min_align;
        self.prep(align, SIZE_UOFFSET)?;
        self.prepend_uoffset(root)
    }

    pub fn finished_data(&self) -> &[u8] {
        &self.buf[self.head..]
    }
}
