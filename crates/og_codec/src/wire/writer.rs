use alloc::vec::Vec;
use std::time::{SystemTime, UNIX_EPOCH};

use og_model::value::Scalar;

use crate::error::{CodecError, Result};
use crate::wire::{Tag, varint};

/// Appends wire items to a byte buffer.
pub struct WireWriter<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> WireWriter<'a> {
    /// Writes after the current end of `out`.
    #[inline]
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out }
    }

    /// Number of bytes in the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    #[inline]
    pub fn tag(&mut self, tag: Tag) {
        self.out.push(tag as u8);
    }

    #[inline]
    pub fn varint(&mut self, value: i32) {
        varint::write(self.out, value);
    }

    /// Writes a length or count, which must fit an `i32`.
    pub fn length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| CodecError::GraphSizeOverflow {
            limit: i32::MAX as u32,
        })?;
        self.varint(len);
        Ok(())
    }

    /// Appends pre-encoded bytes.
    #[inline]
    pub fn raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    /// `String <len> <utf8>`, or `String -1` for `None`.
    pub fn string(&mut self, value: Option<&str>) -> Result<()> {
        self.tag(Tag::String);
        match value {
            None => self.varint(-1),
            Some(s) => {
                self.length(s.len())?;
                self.raw(s.as_bytes());
            }
        }
        Ok(())
    }

    /// The scalar's tag followed by its fixed-width payload.
    pub fn scalar(&mut self, value: Scalar) {
        self.tag(Tag::of_scalar(value.kind()));
        match value {
            Scalar::Bool(v) => self.out.push(v as u8),
            Scalar::I8(v) => self.raw(&v.to_le_bytes()),
            Scalar::U8(v) => self.out.push(v),
            Scalar::I16(v) => self.raw(&v.to_le_bytes()),
            Scalar::U16(v) => self.raw(&v.to_le_bytes()),
            Scalar::I32(v) => self.raw(&v.to_le_bytes()),
            Scalar::U32(v) => self.raw(&v.to_le_bytes()),
            Scalar::I64(v) => self.raw(&v.to_le_bytes()),
            Scalar::U64(v) => self.raw(&v.to_le_bytes()),
            Scalar::I128(v) => self.raw(&v.to_le_bytes()),
            Scalar::U128(v) => self.raw(&v.to_le_bytes()),
            Scalar::Isize(v) => self.raw(&(v as i64).to_le_bytes()),
            Scalar::Usize(v) => self.raw(&(v as u64).to_le_bytes()),
            Scalar::F32(v) => self.raw(&v.to_bits().to_le_bytes()),
            Scalar::F64(v) => self.raw(&v.to_bits().to_le_bytes()),
            Scalar::Char(v) => self.raw(&(v as u32).to_le_bytes()),
            Scalar::Decimal(v) => {
                for word in v.words() {
                    self.raw(&word.to_le_bytes());
                }
            }
            Scalar::Duration(v) => {
                self.raw(&v.as_secs().to_le_bytes());
                self.raw(&v.subsec_nanos().to_le_bytes());
            }
            Scalar::Timestamp(v) => {
                let (secs, nanos) = split_timestamp(v);
                self.raw(&secs.to_le_bytes());
                self.raw(&nanos.to_le_bytes());
            }
        }
    }
}

/// Whole seconds from the epoch, rounded towards negative infinity, and the
/// non-negative nanosecond remainder.
fn split_timestamp(time: SystemTime) -> (i64, u32) {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (
            i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
            after.subsec_nanos(),
        ),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            match before.subsec_nanos() {
                0 => (-secs, 0),
                nanos => (-secs - 1, 1_000_000_000 - nanos),
            }
        }
    }
}
