//! The decoder.
//!
//! Open containers are kept on an explicit stack instead of the call
//! stack, so a stream nests as deep as the graph it came from without
//! growing the thread stack. Nesting still counts against `max_depth`,
//! except for the bodies of objects that claim a new reference number:
//! those are already bounded by `max_references`, and they are what deep
//! [`WideCircularSafe`](crate::ReuseStrategy::WideCircularSafe) streams
//! consist of.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use fixedbitset::FixedBitSet;
use og_model::info::{OptionInfo, SharedInfo, TypeInfo};
use og_model::layout::{LayoutCache, MemberKind, MemberLayout};
use og_model::registry::{TypeRegistry, TypeTraitShared};
use og_model::{ArrayBuilder, Graph, SharedSlot};

use crate::error::{CodecError, FormatError, Result};
use crate::names::NameReader;
use crate::tracker::{DecodeRefs, RefSlot};
use crate::transform::Transforms;
use crate::wire::{Tag, WireReader};

/// What a decode call reads besides the bytes.
#[derive(Clone, Copy)]
pub(crate) struct DecodeContext<'c> {
    pub registry: &'c TypeRegistry,
    pub layouts: &'c LayoutCache,
    pub transforms: &'c Transforms,
    pub max_depth: usize,
    pub max_references: u32,
}

/// Where the members of an open object go.
enum Target {
    /// A value-semantics record.
    Owned(Box<dyn Graph>),
    /// A shared allocation, handed out as `info` once complete.
    Shared {
        slot: SharedSlot,
        info: &'static TypeInfo,
        shared: &'static SharedInfo,
    },
    /// An object skipped by its parent but kept for later back-references.
    Detached(SharedSlot),
}

/// An object whose members are being read.
struct Body {
    target: Target,
    layout: Arc<MemberLayout>,
    seen: FixedBitSet,
    /// The member whose value is being read.
    member: usize,
    /// Mandatory members may be missing.
    lenient: bool,
    /// Counts against `max_depth`.
    counted: bool,
}

impl Body {
    fn set(&mut self, value: Box<dyn Graph>) -> Result<()> {
        let member = self.layout.member(self.member);
        let ty = member.type_info().map_or("member", TypeInfo::type_name);
        let mismatch = |value: Box<dyn Graph>| CodecError::mismatch(ty, found_type(&*value));
        match &mut self.target {
            Target::Owned(owner) => {
                let Some(record) = owner.as_record_mut() else {
                    return Err(CodecError::mismatch(ty, "non-record value"));
                };
                member.set(record, value).map_err(mismatch)?;
            }
            Target::Shared { slot, .. } | Target::Detached(slot) => {
                let record = slot.record();
                let mut guard = record.try_borrow_mut().map_err(|_| CodecError::Borrowed {
                    type_name: slot_type(slot),
                })?;
                member.set(&mut *guard, value).map_err(mismatch)?;
            }
        }

        self.seen.insert(self.member);
        if let MemberKind::Deprecated {
            replacement: Some(replacement),
            ..
        } = member.kind()
        {
            self.seen.insert(replacement);
        }
        Ok(())
    }

    /// Checks the mandatory members and yields the finished value, if the
    /// parent takes one.
    fn finish(self) -> Result<Option<Box<dyn Graph>>> {
        if !self.lenient
            && let Some(missing) = self.layout.mandatory().ones().find(|&i| !self.seen.contains(i))
        {
            return Err(CodecError::MissingField {
                type_name: self.layout.info().type_name().into(),
                member: self.layout.member(missing).wire_name().into(),
            });
        }
        match self.target {
            Target::Owned(value) => Ok(Some(value)),
            Target::Shared { slot, info, shared } => shared
                .from_slot(&slot)
                .map(Some)
                .ok_or_else(|| CodecError::mismatch(info.type_name(), slot_type(&slot))),
            Target::Detached(_) => Ok(None),
        }
    }
}

enum Frame {
    /// `Some` around the value being read above it.
    Some(&'static OptionInfo),
    /// Decode transforms waiting for the value read above them.
    Transform {
        first: usize,
        target: &'static TypeInfo,
    },
    Array {
        item: &'static TypeInfo,
        builder: Box<dyn ArrayBuilder>,
        left: usize,
    },
    Object(Body),
    SkipArray {
        left: usize,
    },
    SkipMembers {
        counted: bool,
    },
}

/// What the top frame needs next.
enum Next {
    Read(&'static TypeInfo),
    Skip,
    Close,
}

/// Driven by the declared type of each position rather than by the type
/// names in the stream. The registry is only consulted for polymorphic
/// members and for skipped objects that carry a reference number.
pub(crate) struct Decoder<'de, 'c> {
    r: WireReader<'de>,
    names: NameReader<'de>,
    refs: DecodeRefs<'de>,
    cx: DecodeContext<'c>,
    stack: Vec<Frame>,
    depth: usize,
}

fn found_type(value: &dyn Graph) -> Cow<'static, str> {
    Cow::Borrowed(value.graph_info().type_name())
}

impl<'de, 'c> Decoder<'de, 'c> {
    pub fn new(bytes: &'de [u8], cx: DecodeContext<'c>) -> Self {
        Self {
            r: WireReader::new(bytes),
            names: NameReader::new(),
            refs: DecodeRefs::new(cx.max_references),
            cx,
            stack: Vec::new(),
            depth: 0,
        }
    }

    /// Decodes a whole stream holding one value of type `info`.
    pub fn decode_root(mut self, info: &'static TypeInfo) -> Result<Box<dyn Graph>> {
        if matches!(self.r.peek_tag(), Ok(Tag::NameTable)) {
            self.r.read_tag()?;
            self.names.read_table(&mut self.r)?;
        }
        let value = match self.read(info)? {
            Some(value) => value,
            None => self.run()?,
        };
        if !self.r.is_empty() {
            return Err(self.r.error(FormatError::TrailingBytes(self.r.remaining())));
        }
        Ok(value)
    }

    /// Advances the open frames until the outermost one is complete.
    fn run(&mut self) -> Result<Box<dyn Graph>> {
        while let Some(frame) = self.stack.last_mut() {
            let next = match frame {
                Frame::Array { item, left, .. } => match left.checked_sub(1) {
                    Some(rest) => {
                        *left = rest;
                        Next::Read(*item)
                    }
                    None => Next::Close,
                },
                Frame::Object(body) => match self.r.peek_tag()? {
                    Tag::ObjectEnd => Next::Close,
                    Tag::FieldName => {
                        self.r.read_tag()?;
                        let name = self.names.read_required(&mut self.r, "member name")?;
                        match body.layout.find(name) {
                            Some(index) => match body.layout.member(index).type_info() {
                                Some(ty) => {
                                    body.member = index;
                                    Next::Read(ty)
                                }
                                None => Next::Skip,
                            },
                            None => {
                                log::trace!(
                                    "skipping unknown member `{name}` of `{}`",
                                    body.layout.info().type_name()
                                );
                                Next::Skip
                            }
                        }
                    }
                    other => return Err(self.r.unexpected("FieldName or ObjectEnd", other)),
                },
                Frame::SkipArray { left } => match left.checked_sub(1) {
                    Some(rest) => {
                        *left = rest;
                        Next::Skip
                    }
                    None => Next::Close,
                },
                Frame::SkipMembers { .. } => match self.r.read_tag()? {
                    Tag::ObjectEnd => Next::Close,
                    Tag::FieldName => {
                        self.names.read_required(&mut self.r, "member name")?;
                        Next::Skip
                    }
                    other => return Err(self.r.unexpected("FieldName or ObjectEnd", other)),
                },
                Frame::Some(_) | Frame::Transform { .. } => {
                    return Err(CodecError::mismatch("value", "empty wrapper"));
                }
            };

            let done = match next {
                Next::Read(info) => self.read(info)?,
                Next::Skip => {
                    self.skip()?;
                    None
                }
                Next::Close => self.close()?,
            };
            if let Some(value) = done
                && let Some(root) = self.deliver(value)?
            {
                return Ok(root);
            }
        }
        Err(CodecError::mismatch("value", "empty stream"))
    }

    /// Hands a finished value to the frame below it, unwrapping through
    /// `Some` and transform frames.
    ///
    /// Returns the value once no frame is left to take it.
    fn deliver(&mut self, mut value: Box<dyn Graph>) -> Result<Option<Box<dyn Graph>>> {
        loop {
            match self.stack.last_mut() {
                None => return Ok(Some(value)),
                Some(Frame::Some(option)) => {
                    let option = *option;
                    self.stack.pop();
                    value = wrap_some(option, value)?;
                }
                Some(Frame::Transform { first, target }) => {
                    let (first, target) = (*first, *target);
                    self.stack.pop();
                    value = self.transform(first, value, target)?;
                }
                Some(Frame::Array { item, builder, .. }) => {
                    let item = *item;
                    builder
                        .push(value)
                        .map_err(|value| CodecError::mismatch(item.type_name(), found_type(&*value)))?;
                    return Ok(None);
                }
                Some(Frame::Object(body)) => {
                    body.set(value)?;
                    return Ok(None);
                }
                Some(Frame::SkipArray { .. } | Frame::SkipMembers { .. }) => return Ok(None),
            }
        }
    }

    /// Pops the top frame once its end tag is next.
    fn close(&mut self) -> Result<Option<Box<dyn Graph>>> {
        let Some(frame) = self.stack.pop() else {
            return Ok(None);
        };
        match frame {
            Frame::Array { builder, .. } => {
                self.r.expect(Tag::ArrayEnd, "ArrayEnd")?;
                self.ascend();
                Ok(Some(builder.finish()))
            }
            Frame::Object(body) => {
                self.r.read_tag()?;
                if body.counted {
                    self.ascend();
                }
                body.finish()
            }
            Frame::SkipArray { .. } => {
                self.r.expect(Tag::ArrayEnd, "ArrayEnd")?;
                self.ascend();
                Ok(None)
            }
            Frame::SkipMembers { counted } => {
                if counted {
                    self.ascend();
                }
                Ok(None)
            }
            Frame::Some(_) | Frame::Transform { .. } => Ok(None),
        }
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.cx.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.cx.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Reads a tag, failing with a type mismatch on `Null`.
    fn read_non_null(&mut self, info: &'static TypeInfo) -> Result<Tag> {
        match self.r.peek_tag()? {
            Tag::Null => Err(CodecError::mismatch(info.type_name(), "null")),
            _ => self.r.read_tag(),
        }
    }

    fn transform(
        &self,
        first: usize,
        value: Box<dyn Graph>,
        target: &'static TypeInfo,
    ) -> Result<Box<dyn Graph>> {
        self.cx
            .transforms
            .decode(first, value, target)
            .map_err(|value| CodecError::mismatch(target.type_name(), found_type(&*value)))
    }

    // -------------------------------------------------------------------------
    // Values

    /// Starts reading one value declared as `info`, through the decode
    /// transforms.
    ///
    /// Scalars and back-references come back at once. Containers push a
    /// frame and return `None`; their value is delivered when it closes.
    fn read(&mut self, info: &'static TypeInfo) -> Result<Option<Box<dyn Graph>>> {
        let Some((first, source)) = self.cx.transforms.decode_source(info) else {
            return self.read_shape(info);
        };
        self.stack.push(Frame::Transform { first, target: info });
        match self.read_shape(source)? {
            Some(value) => {
                self.stack.pop();
                self.transform(first, value, info).map(Some)
            }
            None => Ok(None),
        }
    }

    fn read_shape(&mut self, info: &'static TypeInfo) -> Result<Option<Box<dyn Graph>>> {
        match info {
            TypeInfo::Scalar(scalar) => {
                let tag = self.read_non_null(info)?;
                if tag.scalar_kind() != Some(scalar.kind()) {
                    return Err(CodecError::mismatch(info.type_name(), tag.name()));
                }
                Ok(Some(self.r.read_scalar_payload(scalar.kind())?.into_graph()))
            }
            TypeInfo::Str(_) => {
                let tag = self.read_non_null(info)?;
                if tag != Tag::String {
                    return Err(CodecError::mismatch(info.type_name(), tag.name()));
                }
                match self.r.read_string_payload()? {
                    Some(s) => Ok(Some(Box::new(s.to_string()))),
                    None => Err(CodecError::mismatch(info.type_name(), "null")),
                }
            }
            TypeInfo::Enum(enum_info) => {
                let tag = self.read_non_null(info)?;
                if tag.scalar_kind() != Some(enum_info.repr()) {
                    return Err(CodecError::mismatch(info.type_name(), tag.name()));
                }
                let start = self.r.offset();
                let scalar = self.r.read_scalar_payload(enum_info.repr())?;
                let value = scalar.as_i128().unwrap_or_default();
                enum_info.from_discriminant(value).map(Some).ok_or_else(|| {
                    CodecError::format(
                        start,
                        FormatError::InvalidEnumValue {
                            type_name: info.type_name().into(),
                            value,
                        },
                    )
                })
            }
            TypeInfo::Option(option) => self.read_option(option),
            TypeInfo::Array(array) => {
                let tag = self.read_non_null(info)?;
                if tag != Tag::ArrayStart {
                    return Err(CodecError::mismatch(info.type_name(), tag.name()));
                }
                if self.names.read(&mut self.r)?.is_none() {
                    self.r.expect(Tag::ArrayEnd, "ArrayEnd")?;
                    return Err(CodecError::mismatch(info.type_name(), "null"));
                }
                let len = self.r.read_length()?;

                self.descend()?;
                self.stack.push(Frame::Array {
                    item: array.item(),
                    builder: array.builder(len.min(self.r.remaining())),
                    left: len,
                });
                Ok(None)
            }
            TypeInfo::Struct(struct_info) => {
                let tag = self.read_non_null(info)?;
                if tag != Tag::ObjectStart {
                    return Err(CodecError::mismatch(info.type_name(), tag.name()));
                }
                self.names.read_required(&mut self.r, "type name")?;
                if self.r.peek_tag()? == Tag::ReferenceId {
                    return Err(self.r.unexpected("FieldName or ObjectEnd", Tag::ReferenceId));
                }

                self.descend()?;
                let layout = self.cx.layouts.get(struct_info)?;
                self.open(Target::Owned(struct_info.construct()), layout, false, true);
                Ok(None)
            }
            TypeInfo::Shared(shared) => self.read_shared(info, shared),
        }
    }

    fn read_option(&mut self, option: &'static OptionInfo) -> Result<Option<Box<dyn Graph>>> {
        let inner = option.inner();
        match self.r.peek_tag()? {
            Tag::Null => {
                self.r.read_tag()?;
                return Ok(Some(option.none()));
            }
            Tag::String
                if inner.unwrap_optional().as_str().is_some() && self.r.peek_null_string() =>
            {
                self.r.read_string()?;
                return Ok(Some(option.none()));
            }
            Tag::ArrayStart if self.r.peek_null_array() => {
                self.r.read_tag()?;
                self.names.read(&mut self.r)?;
                self.r.expect(Tag::ArrayEnd, "ArrayEnd")?;
                return Ok(Some(option.none()));
            }
            _ => {}
        }
        self.stack.push(Frame::Some(option));
        match self.read(inner)? {
            Some(value) => {
                self.stack.pop();
                wrap_some(option, value).map(Some)
            }
            None => Ok(None),
        }
    }

    fn read_shared(
        &mut self,
        info: &'static TypeInfo,
        shared: &'static SharedInfo,
    ) -> Result<Option<Box<dyn Graph>>> {
        let tag = self.read_non_null(info)?;
        if tag != Tag::ObjectStart {
            return Err(CodecError::mismatch(info.type_name(), tag.name()));
        }
        let name = self.names.read_required(&mut self.r, "type name")?;

        let (slot, counted) = if self.r.peek_tag()? == Tag::ReferenceId {
            self.r.read_tag()?;
            let start = self.r.offset();
            let number = self.r.read_varint()?;
            let known = self.refs.len();
            match usize::try_from(number) {
                Ok(n) if n < known => {
                    self.r.expect(Tag::ObjectEnd, "ObjectEnd")?;
                    return match self.refs.get(number, &self.r)? {
                        RefSlot::Ready(slot) => shared
                            .from_slot(slot)
                            .map(Some)
                            .ok_or_else(|| CodecError::mismatch(info.type_name(), slot_type(slot))),
                        RefSlot::Vacant(name) => Err(CodecError::UnresolvableType {
                            name: name.to_string().into(),
                        }),
                    };
                }
                Ok(n) if n == known => {
                    let slot = self.new_slot(shared, name)?;
                    self.refs.push(RefSlot::Ready(slot.clone()))?;
                    (slot, false)
                }
                _ => {
                    return Err(CodecError::format(
                        start,
                        FormatError::ReferenceOutOfRange { number, known },
                    ));
                }
            }
        } else {
            self.descend()?;
            (self.new_slot(shared, name)?, true)
        };

        let layout = self.slot_layout(&slot)?;
        self.open(Target::Shared { slot, info, shared }, layout, false, counted);
        Ok(None)
    }

    /// Pushes the frame reading the members of `target`.
    fn open(&mut self, target: Target, layout: Arc<MemberLayout>, lenient: bool, counted: bool) {
        self.stack.push(Frame::Object(Body {
            target,
            seen: FixedBitSet::with_capacity(layout.len()),
            layout,
            member: 0,
            lenient,
            counted,
        }));
    }

    /// A fresh allocation for a shared value named `name` on the wire.
    fn new_slot(&self, shared: &SharedInfo, name: &str) -> Result<SharedSlot> {
        if let Some(slot) = shared.new_slot() {
            return Ok(slot);
        }
        self.cx
            .registry
            .get_with_type_name(name)
            .and_then(|meta| meta.get_trait::<TypeTraitShared>())
            .map(TypeTraitShared::new_slot)
            .ok_or_else(|| CodecError::UnresolvableType {
                name: name.to_string().into(),
            })
    }

    fn slot_layout(&self, slot: &SharedSlot) -> Result<Arc<MemberLayout>> {
        let record = slot.record();
        let info = record
            .try_borrow()
            .map_err(|_| CodecError::Borrowed {
                type_name: slot_type(slot),
            })?
            .struct_info();
        Ok(self.cx.layouts.get(info)?)
    }

    // -------------------------------------------------------------------------
    // Skipping

    /// Starts skipping one value of any shape without building it.
    ///
    /// Names are still numbered and reference numbers still claimed, so the
    /// rest of the stream stays in sync.
    fn skip(&mut self) -> Result<()> {
        let tag = self.r.read_tag()?;
        match tag {
            Tag::Null => Ok(()),
            Tag::String => self.r.read_string_payload().map(drop),
            Tag::ArrayStart => {
                self.descend()?;
                if self.names.read(&mut self.r)?.is_some() {
                    let left = self.r.read_length()?;
                    self.stack.push(Frame::SkipArray { left });
                } else {
                    self.r.expect(Tag::ArrayEnd, "ArrayEnd")?;
                    self.ascend();
                }
                Ok(())
            }
            Tag::ObjectStart => {
                let name = self.names.read_required(&mut self.r, "type name")?;
                if self.r.peek_tag()? != Tag::ReferenceId {
                    self.descend()?;
                    self.stack.push(Frame::SkipMembers { counted: true });
                    return Ok(());
                }
                self.r.read_tag()?;
                let start = self.r.offset();
                let number = self.r.read_varint()?;
                let known = self.refs.len();
                match usize::try_from(number) {
                    Ok(n) if n < known => self.r.expect(Tag::ObjectEnd, "ObjectEnd"),
                    Ok(n) if n == known => self.skip_referenced(name),
                    _ => Err(CodecError::format(
                        start,
                        FormatError::ReferenceOutOfRange { number, known },
                    )),
                }
            }
            tag if tag.scalar_kind().is_some() => self.r.skip_fixed(tag),
            other => Err(self.r.unexpected("value", other)),
        }
    }

    /// Skips the body of an object that claims a new reference number.
    ///
    /// A later back-reference may still need the instance, so it is built
    /// when the registry knows its type.
    fn skip_referenced(&mut self, name: &'de str) -> Result<()> {
        let slot = self
            .cx
            .registry
            .get_with_type_name(name)
            .and_then(|meta| meta.get_trait::<TypeTraitShared>())
            .map(TypeTraitShared::new_slot);
        match slot {
            Some(slot) => {
                self.refs.push(RefSlot::Ready(slot.clone()))?;
                let layout = self.slot_layout(&slot)?;
                self.open(Target::Detached(slot), layout, true, false);
            }
            None => {
                log::warn!("skipping object of unresolvable type `{name}`, its reference is unusable");
                self.refs.push(RefSlot::Vacant(name))?;
                self.stack.push(Frame::SkipMembers { counted: false });
            }
        }
        Ok(())
    }
}

fn wrap_some(option: &OptionInfo, value: Box<dyn Graph>) -> Result<Box<dyn Graph>> {
    option
        .some(value)
        .map_err(|value| CodecError::mismatch(option.inner().type_name(), found_type(&*value)))
}

fn slot_type(slot: &SharedSlot) -> Cow<'static, str> {
    match slot.record().try_borrow() {
        Ok(record) => Cow::Borrowed(record.struct_info().type_name()),
        Err(_) => Cow::Borrowed("<borrowed>"),
    }
}
