//! # Bounds-Checked Table Reader
//!
//! This module provides `TableView`, a borrowed view of one encoded table, and
//! the free functions used to follow references and read vectors. Nothing here
//! trusts the input: every offset is added with checked arithmetic and every
//! read is checked against the buffer length, so a truncated or hostile buffer
//! produces a [`BufferError`] and never a panic.
//!
//! ## Table Layout
//!
//! ```text
//!          vtable                          table
//! ┌──────┬──────┬──────┬─────┐      ┌─────────┬────────────────┐
//! │vt_len│tb_len│slot 0│ ... │ <─── │ soffset │ inline fields  │
//! │ u16  │ u16  │ u16  │     │      │   i32   │                │
//! └──────┴──────┴──────┴─────┘      └─────────┴────────────────┘
//!
//! vtable = table - soffset
//! slot i = u16 at vtable + 4 + 2*i, relative to table start, 0 = absent
//! ```
//!
//! A slot index at or beyond the vtable's entry count is absent. This is how
//! a reader with more fields than the writer sees the extra fields as unset,
//! and a reader with fewer fields simply never asks for the trailing slots.

use eyre::{bail, Result};

use crate::config::{SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VOFFSET, VTABLE_METADATA_FIELDS};
use crate::encoding::{BufferError, Scalar};

fn checked_end(data: &[u8], pos: usize, needed: usize) -> Result<usize> {
    match pos.checked_add(needed) {
        Some(end) if end <= data.len() => Ok(end),
        _ => bail!(BufferError::Truncated {
            offset: pos,
            needed,
            len: data.len(),
        }),
    }
}

#[inline]
pub fn read_at<S: Scalar>(data: &[u8], pos: usize) -> Result<S> {
    checked_end(data, pos, S::WIDTH)?;
    Ok(S::read_le(&data[pos..]))
}

/// Returns `len` bytes starting at `pos`.
pub fn slice_at(data: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    let end = checked_end(data, pos, len)?;
    Ok(&data[pos..end])
}

/// Follows the `u32` uoffset stored at `pos`.
pub fn follow_uoffset(data: &[u8], pos: usize) -> Result<usize> {
    let relative = read_at::<u32>(data, pos)?;
    match pos.checked_add(relative as usize) {
        Some(target) if target < data.len() => Ok(target),
        _ => bail!(BufferError::InvalidOffset {
            at: pos,
            target: pos as i64 + relative as i64,
        }),
    }
}

/// Location of a vector body: `len` elements starting at `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorSpan {
    pub base: usize,
    pub len: usize,
}

/// Reads the length prefix at `pos` and checks that `len * elem_width` body
/// bytes follow it.
pub fn vector_at(data: &[u8], pos: usize, elem_width: usize) -> Result<VectorSpan> {
    let len = read_at::<u32>(data, pos)? as usize;
    let base = pos + SIZE_UOFFSET;
    let body = len.checked_mul(elem_width).ok_or(BufferError::Truncated {
        offset: base,
        needed: usize::MAX,
        len: data.len(),
    })?;
    checked_end(data, base, body)?;
    Ok(VectorSpan { base, len })
}

pub fn string_at(data: &[u8], pos: usize) -> Result<&str> {
    let span = vector_at(data, pos, 1)?;
    let bytes = &data[span.base..span.base + span.len];
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(_) => bail!(BufferError::InvalidUtf8 { offset: span.base }),
    }
}

pub fn bytes_at(data: &[u8], pos: usize) -> Result<&[u8]> {
    let span = vector_at(data, pos, 1)?;
    Ok(&data[span.base..span.base + span.len])
}

#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    data: &'a [u8],
    pos: usize,
    vtable: usize,
    vtable_len: usize,
}

impl<'a> TableView<'a> {
    /// Opens the table starting at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Result<Self> {
        let soffset = read_at::<i32>(data, pos)?;
        let vtable = pos as i64 - soffset as i64;
        let header = (VTABLE_METADATA_FIELDS * SIZE_VOFFSET) as i64;
        if vtable < 0 || vtable + header > data.len() as i64 {
            bail!(BufferError::InvalidOffset {
                at: pos,
                target: vtable,
            });
        }

        let vtable = vtable as usize;
        let vtable_len = read_at::<u16>(data, vtable)? as usize;
        if vtable_len < header as usize {
            bail!(BufferError::Truncated {
                offset: vtable,
                needed: header as usize,
                len: vtable_len,
            });
        }
        checked_end(data, vtable, vtable_len)?;
        let table_len = read_at::<u16>(data, vtable + SIZE_VOFFSET)? as usize;
        checked_end(data, pos, table_len.max(SIZE_SOFFSET))?;

        Ok(Self {
            data,
            pos,
            vtable,
            vtable_len,
        })
    }

    /// Opens the table referenced by the uoffset stored at `ref_pos`.
    pub fn at_ref(data: &'a [u8], ref_pos: usize) -> Result<Self> {
        let pos = follow_uoffset(data, ref_pos)?;
        Self::at(data, pos)
    }

    /// Opens the root table of a finished buffer.
    pub fn root(data: &'a [u8]) -> Result<Self> {
        Self::at_ref(data, 0)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of slots the writer's vtable carries.
    pub fn slot_count(&self) -> usize {
        self.vtable_len / SIZE_VOFFSET - VTABLE_METADATA_FIELDS
    }

    /// Absolute position of slot `slot`, or `None` if the writer left it absent.
    pub fn field_pos(&self, slot: usize) -> Result<Option<usize>> {
        let entry = (VTABLE_METADATA_FIELDS + slot) * SIZE_VOFFSET;
        if entry + SIZE_VOFFSET > self.vtable_len {
            return Ok(None);
        }
        let relative = read_at::<u16>(self.data, self.vtable + entry)?;
        if relative == 0 {
            return Ok(None);
        }
        Ok(Some(self.pos + relative as usize))
    }

    pub fn read_scalar<S: Scalar>(&self, slot: usize) -> Result<Option<S>> {
        match self.field_pos(slot)? {
            Some(pos) => read_at::<S>(self.data, pos).map(Some),
            None => Ok(None),
        }
    }

    /// Raw inline bytes of a fixed-width slot.
    pub fn read_raw(&self, slot: usize, width: usize) -> Result<Option<&'a [u8]>> {
        match self.field_pos(slot)? {
            Some(pos) => slice_at(self.data, pos, width).map(Some),
            None => Ok(None),
        }
    }

    /// Follows the reference stored in slot `slot`.
    pub fn indirect(&self, slot: usize) -> Result<Option<usize>> {
        match self.field_pos(slot)? {
            Some(pos) => follow_uoffset(self.data, pos).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Builder;

    fn sample() -> Vec<u8> {
        let mut buf = Vec::new();
        let mut builder = Builder::new(&mut buf);
        let name = builder.create_string("cola").unwrap();
        builder.start_table(3).unwrap();
        builder.add_offset(0, name).unwrap();
        builder.add_scalar(2, 42i32).unwrap();
        let root = builder.end_table().unwrap();
        builder.finish(root).unwrap();
        builder.finished_data().to_vec()
    }

    #[test]
    fn reads_present_and_absent_slots() {
        let data = sample();
        let table = TableView::root(&data).unwrap();
        assert_eq!(table.slot_count(), 3);

        let name = table.indirect(0).unwrap().unwrap();
        assert_eq!(string_at(&data, name).unwrap(), "cola");
        assert_eq!(table.read_scalar::<i32>(1).unwrap(), None);
        assert_eq!(table.read_scalar::<i32>(2).unwrap(), Some(42));
        assert_eq!(table.read_scalar::<i64>(9).unwrap(), None);
    }

    #[test]
    fn truncated_buffer_reports_buffer_error() {
        let data = sample();
        for cut in 0..data.len() {
            let prefix = &data[..cut];
            let outcome = TableView::root(prefix)
                .and_then(|t| t.indirect(0))
                .and_then(|pos| match pos {
                    Some(pos) => string_at(prefix, pos).map(|_| ()),
                    None => Ok(()),
                });
            if let Err(err) = outcome {
                assert!(err.downcast_ref::<BufferError>().is_some(), "{err}");
            }
        }
    }

    #[test]
    fn reference_past_end_is_invalid_offset() {
        let data = [0xF0u8, 0, 0, 0];
        let err = TableView::root(&data).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BufferError>(),
            Some(BufferError::InvalidOffset { at: 0, .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let data = [2u8, 0, 0, 0, 0xFF, 0xFE, 0];
        let err = string_at(&data, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BufferError>(),
            Some(&BufferError::InvalidUtf8 { offset: 4 })
        );
    }
}
