use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use og_model::value::{Decimal, Scalar, ScalarKind};

use crate::error::{CodecError, FormatError, Result};
use crate::wire::{Tag, varint};

/// Reads wire items from a byte slice.
///
/// Strings are borrowed from the input.
#[derive(Clone)]
pub struct WireReader<'de> {
    bytes: &'de [u8],
    pos: usize,
}

impl<'de> WireReader<'de> {
    #[inline]
    pub const fn new(bytes: &'de [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Position of the next unread byte.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// A format error at the current position.
    #[inline]
    pub fn error(&self, kind: FormatError) -> CodecError {
        CodecError::format(self.pos, kind)
    }

    pub fn take(&mut self, len: usize) -> Result<&'de [u8]> {
        if len > self.remaining() {
            return Err(self.error(FormatError::UnexpectedEof));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    // -------------------------------------------------------------------------
    // Tags

    /// The next tag, without consuming it.
    pub fn peek_tag(&self) -> Result<Tag> {
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Err(self.error(FormatError::UnexpectedEof));
        };
        Tag::from_u8(byte).ok_or_else(|| self.error(FormatError::UnknownTag(byte)))
    }

    pub fn read_tag(&mut self) -> Result<Tag> {
        let tag = self.peek_tag()?;
        self.pos += 1;
        Ok(tag)
    }

    /// Consumes `tag`, or fails describing what was `expected`.
    pub fn expect(&mut self, tag: Tag, expected: &'static str) -> Result<()> {
        let found = self.peek_tag()?;
        if found != tag {
            return Err(self.error(FormatError::UnexpectedTag { expected, found }));
        }
        self.pos += 1;
        Ok(())
    }

    /// An error for an item that cannot appear here.
    #[inline]
    pub fn unexpected(&self, expected: &'static str, found: Tag) -> CodecError {
        self.error(FormatError::UnexpectedTag { expected, found })
    }

    // -------------------------------------------------------------------------
    // Integers

    pub fn read_varint(&mut self) -> Result<i32> {
        let start = self.pos;
        let tag = self.read_tag()?;
        let Some(width) = tag.fixed_width().filter(|_| {
            matches!(tag, Tag::VarInt8 | Tag::VarInt16 | Tag::VarInt24 | Tag::VarInt32)
        }) else {
            self.pos = start;
            return Err(self.unexpected("varint", tag));
        };
        let payload = self.take(width)?;
        varint::read(tag, payload).ok_or_else(|| self.error(FormatError::UnexpectedEof))
    }

    /// A non-negative length or count.
    pub fn read_length(&mut self) -> Result<usize> {
        let len = self.read_varint()?;
        usize::try_from(len).map_err(|_| self.error(FormatError::InvalidLength(len)))
    }

    // -------------------------------------------------------------------------
    // Strings

    /// The payload after a `String` tag. `None` for the null string.
    pub fn read_string_payload(&mut self) -> Result<Option<&'de str>> {
        match self.read_varint()? {
            -1 => Ok(None),
            len if len < 0 => Err(self.error(FormatError::InvalidLength(len))),
            len => {
                let bytes = self.take(len as usize)?;
                core::str::from_utf8(bytes)
                    .map(Some)
                    .map_err(|_| self.error(FormatError::InvalidUtf8))
            }
        }
    }

    /// A full `String` item.
    pub fn read_string(&mut self) -> Result<Option<&'de str>> {
        self.expect(Tag::String, "String")?;
        self.read_string_payload()
    }

    /// Returns `true` if the next item is the null string.
    pub fn peek_null_string(&self) -> bool {
        let mut ahead = self.clone();
        ahead.read_string().is_ok_and(|s| s.is_none())
    }

    /// Returns `true` if the next item is `ArrayStart` with a null element name.
    pub fn peek_null_array(&self) -> bool {
        let mut ahead = self.clone();
        ahead.expect(Tag::ArrayStart, "ArrayStart").is_ok() && ahead.peek_null_string()
    }

    // -------------------------------------------------------------------------
    // Scalars

    /// The payload after the tag of a `kind` scalar.
    pub fn read_scalar_payload(&mut self, kind: ScalarKind) -> Result<Scalar> {
        Ok(match kind {
            ScalarKind::Bool => match self.take_array::<1>()? {
                [0] => Scalar::Bool(false),
                [1] => Scalar::Bool(true),
                [b] => return Err(self.error(FormatError::InvalidBool(b))),
            },
            ScalarKind::I8 => Scalar::I8(i8::from_le_bytes(self.take_array()?)),
            ScalarKind::U8 => Scalar::U8(u8::from_le_bytes(self.take_array()?)),
            ScalarKind::I16 => Scalar::I16(i16::from_le_bytes(self.take_array()?)),
            ScalarKind::U16 => Scalar::U16(u16::from_le_bytes(self.take_array()?)),
            ScalarKind::I32 => Scalar::I32(i32::from_le_bytes(self.take_array()?)),
            ScalarKind::U32 => Scalar::U32(u32::from_le_bytes(self.take_array()?)),
            ScalarKind::I64 => Scalar::I64(i64::from_le_bytes(self.take_array()?)),
            ScalarKind::U64 => Scalar::U64(u64::from_le_bytes(self.take_array()?)),
            ScalarKind::I128 => Scalar::I128(i128::from_le_bytes(self.take_array()?)),
            ScalarKind::U128 => Scalar::U128(u128::from_le_bytes(self.take_array()?)),
            ScalarKind::Isize => {
                let v = i64::from_le_bytes(self.take_array()?);
                Scalar::Isize(
                    isize::try_from(v).map_err(|_| self.error(FormatError::IntegerOverflow))?,
                )
            }
            ScalarKind::Usize => {
                let v = u64::from_le_bytes(self.take_array()?);
                Scalar::Usize(
                    usize::try_from(v).map_err(|_| self.error(FormatError::IntegerOverflow))?,
                )
            }
            ScalarKind::F32 => Scalar::F32(f32::from_bits(u32::from_le_bytes(self.take_array()?))),
            ScalarKind::F64 => Scalar::F64(f64::from_bits(u64::from_le_bytes(self.take_array()?))),
            ScalarKind::Char => {
                let v = u32::from_le_bytes(self.take_array()?);
                Scalar::Char(char::from_u32(v).ok_or_else(|| self.error(FormatError::InvalidChar(v)))?)
            }
            ScalarKind::Decimal => {
                let mut words = [0_u32; 4];
                for word in &mut words {
                    *word = u32::from_le_bytes(self.take_array()?);
                }
                Scalar::Decimal(
                    Decimal::from_words(words).ok_or_else(|| self.error(FormatError::InvalidDecimal))?,
                )
            }
            ScalarKind::Duration => {
                let secs = u64::from_le_bytes(self.take_array()?);
                let nanos = u32::from_le_bytes(self.take_array()?);
                if nanos >= 1_000_000_000 {
                    return Err(self.error(FormatError::InvalidTimestamp));
                }
                Scalar::Duration(Duration::new(secs, nanos))
            }
            ScalarKind::Timestamp => {
                let secs = i64::from_le_bytes(self.take_array()?);
                let nanos = u32::from_le_bytes(self.take_array()?);
                Scalar::Timestamp(
                    join_timestamp(secs, nanos).ok_or_else(|| self.error(FormatError::InvalidTimestamp))?,
                )
            }
        })
    }

    /// Skips the payload of a fixed-width tag.
    pub fn skip_fixed(&mut self, tag: Tag) -> Result<()> {
        match tag.fixed_width() {
            Some(width) => self.take(width).map(drop),
            None => Err(self.unexpected("fixed-width value", tag)),
        }
    }
}

fn join_timestamp(secs: i64, nanos: u32) -> Option<SystemTime> {
    if nanos >= 1_000_000_000 {
        return None;
    }
    let base = if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))?
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))?
    };
    base.checked_add(Duration::from_nanos(u64::from(nanos)))
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use core::time::Duration;
    use std::time::UNIX_EPOCH;

    use og_model::value::{Decimal, Scalar, ScalarKind};

    use super::WireReader;
    use crate::error::FormatError;
    use crate::wire::{Tag, WireWriter};

    fn scalar_round_trip(value: Scalar) -> Scalar {
        let mut out = Vec::new();
        WireWriter::new(&mut out).scalar(value);
        let mut r = WireReader::new(&out);
        let tag = r.read_tag().unwrap();
        let value = r.read_scalar_payload(tag.scalar_kind().unwrap()).unwrap();
        assert!(r.is_empty());
        value
    }

    #[test]
    fn scalar_payloads() {
        let samples = [
            Scalar::Bool(false),
            Scalar::I8(-3),
            Scalar::U64(u64::MAX),
            Scalar::I128(i128::MIN),
            Scalar::Isize(-42),
            Scalar::F64(-0.5),
            Scalar::Char('λ'),
            Scalar::Decimal(Decimal::new(-12345, 2).unwrap()),
            Scalar::Duration(Duration::new(7, 999_999_999)),
            Scalar::Timestamp(UNIX_EPOCH - Duration::new(10, 1)),
        ];
        for sample in samples {
            assert_eq!(scalar_round_trip(sample), sample);
        }
    }

    #[test]
    fn malformed_scalars() {
        let mut r = WireReader::new(&[2]);
        let err = r.read_scalar_payload(ScalarKind::Bool).unwrap_err();
        assert_eq!(err.format_kind(), Some(&FormatError::InvalidBool(2)));

        let bytes = 0xD800_u32.to_le_bytes();
        let mut r = WireReader::new(&bytes);
        let err = r.read_scalar_payload(ScalarKind::Char).unwrap_err();
        assert_eq!(err.format_kind(), Some(&FormatError::InvalidChar(0xD800)));

        let mut r = WireReader::new(&[1, 2]);
        let err = r.read_scalar_payload(ScalarKind::U32).unwrap_err();
        assert_eq!(err.format_kind(), Some(&FormatError::UnexpectedEof));
    }

    #[test]
    fn strings_borrow_input() {
        let mut out = Vec::new();
        let mut w = WireWriter::new(&mut out);
        w.string(Some("héllo")).unwrap();
        w.string(None).unwrap();

        let mut r = WireReader::new(&out);
        assert_eq!(r.read_string().unwrap(), Some("héllo"));
        assert!(r.peek_null_string());
        assert_eq!(r.read_string().unwrap(), None);
        assert!(r.is_empty());
    }

    #[test]
    fn bad_lengths_and_tags() {
        let bytes = [Tag::String as u8, Tag::VarInt8 as u8, 0xFE];
        let err = WireReader::new(&bytes).read_string().unwrap_err();
        assert_eq!(err.format_kind(), Some(&FormatError::InvalidLength(-2)));

        let err = WireReader::new(&[0xEE]).read_tag().unwrap_err();
        assert_eq!(err.format_kind(), Some(&FormatError::UnknownTag(0xEE)));

        let bytes = [Tag::ObjectEnd as u8];
        let err = WireReader::new(&bytes).read_varint().unwrap_err();
        assert!(matches!(
            err.format_kind(),
            Some(FormatError::UnexpectedTag { found: Tag::ObjectEnd, .. })
        ));

        let bytes = [Tag::String as u8, Tag::VarInt8 as u8, 2, 0xC3, 0x28];
        let err = WireReader::new(&bytes).read_string().unwrap_err();
        assert_eq!(err.format_kind(), Some(&FormatError::InvalidUtf8));
    }

    #[test]
    fn null_array_lookahead_does_not_consume() {
        let mut out = Vec::new();
        let mut w = WireWriter::new(&mut out);
        w.tag(Tag::ArrayStart);
        w.string(None).unwrap();
        w.tag(Tag::ArrayEnd);

        let r = WireReader::new(&out);
        assert!(r.peek_null_array());
        assert_eq!(r.offset(), 0);
    }
}
