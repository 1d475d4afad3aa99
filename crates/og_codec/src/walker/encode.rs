use alloc::boxed::Box;
use alloc::vec::Vec;

use og_model::info::TypeInfo;
use og_model::layout::{LayoutCache, MemberValue};
use og_model::{Array, Graph, GraphRef, Record, SharedGraph};

use crate::error::{CodecError, Result};
use crate::names::NameWriter;
use crate::tracker::{EncodeTracker, Visit};
use crate::transform::Transforms;
use crate::wire::{Tag, WireWriter};

// -----------------------------------------------------------------------------
// Sink

/// The output side of one encode call: bytes, name numbering and the
/// nesting guard.
///
/// Shared by the graph walkers and the specialized accessor routines, so
/// both produce byte-identical output for the same input.
pub(crate) struct Sink<'a> {
    pub out: WireWriter<'a>,
    pub names: NameWriter<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Sink<'a> {
    pub fn new(out: WireWriter<'a>, names: NameWriter<'a>, max_depth: usize) -> Self {
        Self {
            out,
            names,
            depth: 0,
            max_depth,
        }
    }

    /// Writes a type or member name.
    #[inline]
    pub fn name(&mut self, name: &'static str) -> Result<()> {
        self.names.write(&mut self.out, name)
    }

    /// Enters one nesting level.
    #[inline]
    pub fn descend(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Writes `None` of the optional type `info`.
    ///
    /// Optional strings use the null string, everything else `Null`.
    pub fn none_of(&mut self, info: &'static TypeInfo) -> Result<()> {
        if info.unwrap_optional().as_str().is_some() {
            self.out.string(None)
        } else {
            self.out.tag(Tag::Null);
            Ok(())
        }
    }

    /// `ArrayStart <item name> <len>`.
    pub fn array_start(&mut self, array: &dyn Array) -> Result<()> {
        self.out.tag(Tag::ArrayStart);
        self.name(item_name(array.graph_info()))?;
        self.out.length(array.len())
    }

    /// `ObjectStart <type name>`.
    pub fn object_start(&mut self, type_name: &'static str) -> Result<()> {
        self.out.tag(Tag::ObjectStart);
        self.name(type_name)
    }

    /// `FieldName <name>`.
    pub fn field_name(&mut self, name: &'static str) -> Result<()> {
        self.out.tag(Tag::FieldName);
        self.name(name)
    }
}

/// The element type name written after `ArrayStart`.
pub(crate) fn item_name(array: &'static TypeInfo) -> &'static str {
    match array.as_array() {
        Some(info) => info.item().type_name(),
        None => array.type_name(),
    }
}

/// The element at `index`, which the array's own length promised.
pub(crate) fn element(array: &dyn Array, index: usize) -> Result<&dyn Graph> {
    array.get(index).ok_or_else(|| {
        CodecError::mismatch(array.graph_info().type_name(), "missing element")
    })
}

/// Borrows the record behind a shared handle for reading.
pub(crate) fn borrow_shared<R>(
    shared: &dyn SharedGraph,
    f: impl FnOnce(&dyn Record) -> Result<R>,
) -> Result<R> {
    let record = shared.erased();
    let guard = record.try_borrow().map_err(|_| CodecError::Borrowed {
        type_name: shared.graph_info().type_name().into(),
    })?;
    f(&*guard)
}

// -----------------------------------------------------------------------------
// Encoder

/// What an encode call reads besides the value.
#[derive(Clone, Copy)]
pub(crate) struct EncodeContext<'c> {
    pub layouts: &'c LayoutCache,
    pub transforms: &'c Transforms,
}

/// The recursive, depth-first graph walker.
///
/// Used for every strategy except
/// [`WideCircularSafe`](crate::ReuseStrategy::WideCircularSafe), and by
/// specialized accessors for values they cannot specialize.
pub(crate) struct Encoder<'a, 's, 'c> {
    sink: &'a mut Sink<'s>,
    tracker: EncodeTracker,
    cx: EncodeContext<'c>,
    // Values created during the call stay allocated until it ends, so no
    // address is handed out twice to the tracker.
    keep_alive: Vec<Box<dyn Graph>>,
}

impl<'a, 's, 'c> Encoder<'a, 's, 'c> {
    pub fn new(sink: &'a mut Sink<'s>, tracker: EncodeTracker, cx: EncodeContext<'c>) -> Self {
        Self {
            sink,
            tracker,
            cx,
            keep_alive: Vec::new(),
        }
    }

    /// Encodes `value` and everything reachable from it.
    pub fn encode_value(&mut self, value: &dyn Graph) -> Result<()> {
        if let Some(replacement) = self.cx.transforms.encode(value) {
            let result = self.encode_shape(&*replacement);
            self.keep_alive.push(replacement);
            return result;
        }
        self.encode_shape(value)
    }

    fn encode_shape(&mut self, value: &dyn Graph) -> Result<()> {
        match value.graph_ref() {
            GraphRef::Scalar(scalar) => {
                self.sink.out.scalar(scalar);
                Ok(())
            }
            GraphRef::Str(s) => self.sink.out.string(Some(s)),
            GraphRef::Option(None) => self.sink.none_of(value.graph_info()),
            GraphRef::Option(Some(inner)) => self.encode_value(inner),
            GraphRef::Array(array) => {
                self.sink.descend()?;
                self.sink.array_start(array)?;
                for index in 0..array.len() {
                    self.encode_value(element(array, index)?)?;
                }
                self.sink.out.tag(Tag::ArrayEnd);
                self.sink.ascend();
                Ok(())
            }
            GraphRef::Record(record) => {
                self.sink.descend()?;
                self.sink.object_start(record.struct_info().type_name())?;
                self.encode_members(record)?;
                self.sink.out.tag(Tag::ObjectEnd);
                self.sink.ascend();
                Ok(())
            }
            GraphRef::Shared(shared) => self.encode_shared(shared),
        }
    }

    fn encode_shared(&mut self, shared: &dyn SharedGraph) -> Result<()> {
        let identity = shared.identity();
        borrow_shared(shared, |record| {
            let type_name = record.struct_info().type_name();
            match self.tracker.enter(identity, type_name)? {
                Visit::Seen(number) => {
                    self.sink.object_start(type_name)?;
                    self.sink.out.tag(Tag::ReferenceId);
                    self.sink.out.varint(number);
                    self.sink.out.tag(Tag::ObjectEnd);
                }
                Visit::New(number) => {
                    self.sink.descend()?;
                    self.sink.object_start(type_name)?;
                    self.sink.out.tag(Tag::ReferenceId);
                    self.sink.out.varint(number);
                    self.encode_members(record)?;
                    self.sink.out.tag(Tag::ObjectEnd);
                    self.sink.ascend();
                }
                Visit::Untracked => {
                    self.sink.descend()?;
                    self.sink.object_start(type_name)?;
                    self.encode_members(record)?;
                    self.sink.out.tag(Tag::ObjectEnd);
                    self.sink.ascend();
                    self.tracker.leave(identity);
                }
            }
            Ok(())
        })
    }

    fn encode_members(&mut self, record: &dyn Record) -> Result<()> {
        let layout = self.cx.layouts.get(record.struct_info())?;
        for member in layout.members() {
            let Some(value) = member.get(record) else {
                continue;
            };
            self.sink.field_name(member.wire_name())?;
            match value {
                MemberValue::Borrowed(value) => self.encode_value(value)?,
                MemberValue::Computed(value) => {
                    let result = self.encode_value(&*value);
                    self.keep_alive.push(value);
                    result?;
                }
            }
        }
        Ok(())
    }
}
