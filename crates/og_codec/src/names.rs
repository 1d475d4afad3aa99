//! Type and member names on the wire.
//!
//! The first time a stream uses a name it is spelled out as
//! `String <len> <utf8> <number>`, later uses are `NameReferenceId <number>`.
//! Numbers count up from zero within one stream.
//!
//! The [`NameTable`] is shared by every codec built from the same handle and
//! caches the spelled-out bytes of each name ever written, so a name is
//! UTF-8 encoded once per process rather than once per stream.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::sync::{PoisonError, RwLock};

use og_utils::hash::HashMap;

use crate::error::{CodecError, FormatError, Result};
use crate::wire::{Tag, WireReader, WireWriter};

// -----------------------------------------------------------------------------
// DeclaredName

/// Whether a pre-declared name is used for types or for members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Type,
    Member,
}

/// A name written in the pre-declaration block of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclaredName {
    pub kind: NameKind,
    pub name: &'static str,
}

impl DeclaredName {
    #[inline]
    pub const fn of_type(name: &'static str) -> Self {
        Self {
            kind: NameKind::Type,
            name,
        }
    }

    #[inline]
    pub const fn of_member(name: &'static str) -> Self {
        Self {
            kind: NameKind::Member,
            name,
        }
    }
}

// -----------------------------------------------------------------------------
// NameTable

/// A process-lifetime cache of encoded names.
///
/// Grows monotonically and is never evicted. Cloning shares the table.
#[derive(Clone, Default)]
pub struct NameTable {
    inner: Arc<RwLock<HashMap<&'static str, Arc<[u8]>>>>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `String <len> <utf8>` bytes of `name`.
    pub fn encoded(&self, name: &'static str) -> Result<Arc<[u8]>> {
        let cached = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        if let Some(bytes) = cached {
            return Ok(bytes);
        }

        let mut bytes = Vec::with_capacity(name.len() + 6);
        WireWriter::new(&mut bytes).string(Some(name))?;
        let bytes: Arc<[u8]> = bytes.into();
        Ok(self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name)
            .or_insert(bytes)
            .clone())
    }

    /// Number of distinct names cached.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable").field("len", &self.len()).finish()
    }
}

// -----------------------------------------------------------------------------
// NameWriter

/// Per-stream name numbering on the encode side.
pub(crate) struct NameWriter<'a> {
    table: &'a NameTable,
    numbers: HashMap<&'static str, i32>,
}

impl<'a> NameWriter<'a> {
    pub fn new(table: &'a NameTable) -> Self {
        Self {
            table,
            numbers: HashMap::default(),
        }
    }

    fn next_number(&self) -> Result<i32> {
        i32::try_from(self.numbers.len()).map_err(|_| CodecError::GraphSizeOverflow {
            limit: i32::MAX as u32,
        })
    }

    /// Writes `name`, spelled out on first use.
    pub fn write(&mut self, w: &mut WireWriter, name: &'static str) -> Result<()> {
        if let Some(&number) = self.numbers.get(name) {
            w.tag(Tag::NameReferenceId);
            w.varint(number);
            return Ok(());
        }
        let number = self.next_number()?;
        w.raw(&self.table.encoded(name)?);
        w.varint(number);
        self.numbers.insert(name, number);
        Ok(())
    }

    /// Writes the `NameTable` block, numbering every name it declares.
    ///
    /// Must come before anything else in the stream.
    pub fn predeclare(&mut self, w: &mut WireWriter, names: &[DeclaredName]) -> Result<()> {
        w.tag(Tag::NameTable);
        let mut count = 0_usize;
        let mut block = Vec::new();
        {
            let mut inner = WireWriter::new(&mut block);
            for declared in names {
                if self.numbers.contains_key(declared.name) {
                    continue;
                }
                let number = self.next_number()?;
                inner.tag(match declared.kind {
                    NameKind::Type => Tag::DeclareType,
                    NameKind::Member => Tag::DeclareMember,
                });
                inner.length(declared.name.len())?;
                inner.raw(declared.name.as_bytes());
                self.numbers.insert(declared.name, number);
                count += 1;
            }
        }
        w.length(count)?;
        w.raw(&block);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// NameReader

/// Per-stream name numbering on the decode side.
#[derive(Default)]
pub(crate) struct NameReader<'de> {
    names: Vec<&'de str>,
}

impl<'de> NameReader<'de> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a name item. `None` is the null name.
    pub fn read(&mut self, r: &mut WireReader<'de>) -> Result<Option<&'de str>> {
        match r.read_tag()? {
            Tag::String => {
                let Some(name) = r.read_string_payload()? else {
                    return Ok(None);
                };
                let number = r.read_varint()?;
                if usize::try_from(number).ok() != Some(self.names.len()) {
                    return Err(r.error(FormatError::NameOutOfRange {
                        number,
                        known: self.names.len(),
                    }));
                }
                self.names.push(name);
                Ok(Some(name))
            }
            Tag::NameReferenceId => {
                let number = r.read_varint()?;
                usize::try_from(number)
                    .ok()
                    .and_then(|i| self.names.get(i).copied())
                    .map(Some)
                    .ok_or_else(|| {
                        r.error(FormatError::NameOutOfRange {
                            number,
                            known: self.names.len(),
                        })
                    })
            }
            other => Err(r.unexpected("name", other)),
        }
    }

    /// Reads a name that must not be null.
    pub fn read_required(&mut self, r: &mut WireReader<'de>, expected: &'static str) -> Result<&'de str> {
        let start = r.offset();
        self.read(r)?.ok_or_else(|| {
            CodecError::format(start, FormatError::UnexpectedTag {
                expected,
                found: Tag::String,
            })
        })
    }

    /// Reads the body of a `NameTable` block, after its tag.
    pub fn read_table(&mut self, r: &mut WireReader<'de>) -> Result<()> {
        let count = r.read_length()?;
        for _ in 0..count {
            match r.read_tag()? {
                Tag::DeclareType | Tag::DeclareMember => {}
                other => return Err(r.unexpected("DeclareType or DeclareMember", other)),
            }
            let len = r.read_length()?;
            let bytes = r.take(len)?;
            let name = core::str::from_utf8(bytes).map_err(|_| r.error(FormatError::InvalidUtf8))?;
            self.names.push(name);
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::{DeclaredName, NameReader, NameTable, NameWriter};
    use crate::error::FormatError;
    use crate::wire::{Tag, WireReader, WireWriter};

    #[test]
    fn second_use_is_a_reference() {
        let table = NameTable::new();
        let mut out = Vec::new();
        let mut w = WireWriter::new(&mut out);
        let mut names = NameWriter::new(&table);
        names.write(&mut w, "Node").unwrap();
        names.write(&mut w, "value").unwrap();
        names.write(&mut w, "Node").unwrap();

        let tail = [Tag::NameReferenceId as u8, Tag::VarInt8 as u8, 0];
        assert!(out.ends_with(&tail));

        let mut r = WireReader::new(&out);
        let mut reader = NameReader::new();
        assert_eq!(reader.read(&mut r).unwrap(), Some("Node"));
        assert_eq!(reader.read(&mut r).unwrap(), Some("value"));
        assert_eq!(reader.read(&mut r).unwrap(), Some("Node"));
        assert!(r.is_empty());
    }

    #[test]
    fn table_caches_bytes_across_streams() {
        let table = NameTable::new();
        let a = table.encoded("Node").unwrap();
        let b = table.clone().encoded("Node").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn predeclared_names_are_references_from_the_start() {
        let table = NameTable::new();
        let mut out = Vec::new();
        let mut w = WireWriter::new(&mut out);
        let mut names = NameWriter::new(&table);
        names
            .predeclare(
                &mut w,
                &[
                    DeclaredName::of_type("Point"),
                    DeclaredName::of_member("x"),
                    DeclaredName::of_type("Point"),
                ],
            )
            .unwrap();
        let body_start = w.len();
        names.write(&mut w, "x").unwrap();
        assert_eq!(out[body_start], Tag::NameReferenceId as u8);

        let mut r = WireReader::new(&out);
        let mut reader = NameReader::new();
        r.expect(Tag::NameTable, "NameTable").unwrap();
        reader.read_table(&mut r).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read(&mut r).unwrap(), Some("x"));
    }

    #[test]
    fn numbers_must_be_dense() {
        let mut out = Vec::new();
        let mut w = WireWriter::new(&mut out);
        w.string(Some("A")).unwrap();
        w.varint(3);

        let mut r = WireReader::new(&out);
        let err = NameReader::new().read(&mut r).unwrap_err();
        assert_eq!(
            err.format_kind(),
            Some(&FormatError::NameOutOfRange { number: 3, known: 0 })
        );

        let bytes = [Tag::NameReferenceId as u8, Tag::VarInt8 as u8, 0];
        let err = NameReader::new().read(&mut WireReader::new(&bytes)).unwrap_err();
        assert!(matches!(err.format_kind(), Some(FormatError::NameOutOfRange { .. })));
    }
}
