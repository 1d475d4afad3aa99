use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::debug;
use og_model::info::Typed;
use og_model::layout::LayoutCache;
use og_model::registry::{TypeRegistry, TypeRegistryArc};
use og_model::Graph;

use crate::accessor::{AccessorCache, AccessorEntry};
use crate::error::{CodecError, Result};
use crate::names::{NameTable, NameWriter};
use crate::options::CodecOptions;
use crate::tracker::{EncodeTracker, ReuseStrategy};
use crate::transform::{DecodeTransform, EncodeTransform, Transforms};
use crate::walker::{DecodeContext, Decoder, EncodeContext, Encoder, Sink, WideEncoder};
use crate::wire::WireWriter;

// -----------------------------------------------------------------------------
// Codec

/// Encodes object graphs to bytes and back.
///
/// A codec owns shared handles to its registry and caches. Cloning a codec,
/// or building several from the same handles, shares them.
///
/// # Examples
///
/// ```
/// use og_codec::{Codec, ReuseStrategy};
/// use og_model::derive::Graph;
///
/// #[derive(Graph, Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let codec = Codec::new();
/// let bytes = codec.encode(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(codec.decode::<Point>(&bytes).unwrap(), Point { x: 1, y: 2 });
///
/// let bytes = codec.encode_with(&Point { x: 3, y: 4 }, ReuseStrategy::NoTrackingFast).unwrap();
/// assert_eq!(codec.decode::<Point>(&bytes).unwrap(), Point { x: 3, y: 4 });
/// ```
#[derive(Clone)]
pub struct Codec {
    registry: TypeRegistryArc,
    names: NameTable,
    accessors: AccessorCache,
    layouts: LayoutCache,
    options: CodecOptions,
    transforms: Transforms,
}

impl Codec {
    /// Creates a codec with default options and a registry holding the
    /// built-in types plus every auto-registered type.
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[inline]
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    #[inline]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistryArc {
        &self.registry
    }

    // -------------------------------------------------------------------------
    // Encode

    /// Encodes `value` with the configured strategy.
    pub fn encode<T: Graph>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode_with(value, self.options.strategy)
    }

    /// Encodes `value` with `strategy`.
    pub fn encode_with<T: Graph>(&self, value: &T, strategy: ReuseStrategy) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.append(value, strategy, &mut out)?;
        Ok(out)
    }

    /// Appends the encoding of `value` to `out`.
    ///
    /// On error `out` is restored to its previous length.
    pub fn encode_into<T: Graph>(&self, value: &T, out: &mut Vec<u8>) -> Result<()> {
        self.append(value, self.options.strategy, out)
    }

    /// Encodes `value` and writes the bytes to `writer`.
    #[cfg(feature = "std")]
    pub fn encode_to_writer<T: Graph, W: std::io::Write>(&self, value: &T, mut writer: W) -> Result<()> {
        let bytes = self.encode(value)?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Encodes `value` with its specialized accessor alone.
    ///
    /// The output is a [`NoTrackingFast`](ReuseStrategy::NoTrackingFast)
    /// stream. Fails with [`CodecError::Model`] if `T` cannot be specialized.
    pub fn encode_specialized<T: Typed + Graph>(&self, value: &T) -> Result<Vec<u8>> {
        let entry = self.accessor_for::<T>();
        let routine = entry.routine().map_err(|reason| CodecError::Model(reason.clone()))?;

        let mut out = Vec::new();
        let mut sink = self.sink(&mut out);
        sink.names.predeclare(&mut sink.out, entry.names())?;
        routine(value as &dyn Graph, &mut sink)?;
        debug!("encoded `{}` specialized: {} bytes", entry.type_name(), out.len());
        Ok(out)
    }

    /// The specialized accessor of `T`, compiled on first use.
    pub fn accessor_for<T: Typed>(&self) -> Arc<AccessorEntry> {
        self.accessors.get_or_compile(T::type_info(), &self.layouts)
    }

    fn append(&self, value: &dyn Graph, strategy: ReuseStrategy, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        match self.write(value, strategy, out) {
            Ok(()) => {
                debug!(
                    "encoded `{}` with {strategy:?}: {} bytes",
                    value.graph_info().type_name(),
                    out.len() - start,
                );
                Ok(())
            }
            Err(err) => {
                out.truncate(start);
                Err(err)
            }
        }
    }

    fn write(&self, value: &dyn Graph, strategy: ReuseStrategy, out: &mut Vec<u8>) -> Result<()> {
        let tracker = EncodeTracker::new(strategy, self.options.max_references);
        let mut sink = self.sink(out);
        let cx = EncodeContext {
            layouts: &self.layouts,
            transforms: &self.transforms,
        };

        match strategy {
            ReuseStrategy::WideCircularSafe => WideEncoder::new(sink, tracker, cx).encode_root(value),
            ReuseStrategy::NoTrackingFast => {
                let entry = self.accessors.get_or_compile(value.graph_info(), &self.layouts);
                sink.names.predeclare(&mut sink.out, entry.names())?;
                match entry.routine() {
                    Ok(routine) if self.options.specialize && self.transforms.encode.is_empty() => {
                        routine(value, &mut sink)
                    }
                    _ => Encoder::new(&mut sink, tracker, cx).encode_value(value),
                }
            }
            ReuseStrategy::NoReuse | ReuseStrategy::TreeWithReuse => {
                Encoder::new(&mut sink, tracker, cx).encode_value(value)
            }
        }
    }

    #[inline]
    fn sink<'a>(&'a self, out: &'a mut Vec<u8>) -> Sink<'a> {
        Sink::new(
            WireWriter::new(out),
            NameWriter::new(&self.names),
            self.options.max_depth,
        )
    }

    // -------------------------------------------------------------------------
    // Decode

    /// Decodes a stream holding one `T`.
    pub fn decode<T: Typed + Graph>(&self, bytes: &[u8]) -> Result<T> {
        let registry = self.registry.read();
        let cx = DecodeContext {
            registry: &registry,
            layouts: &self.layouts,
            transforms: &self.transforms,
            max_depth: self.options.max_depth,
            max_references: self.options.max_references,
        };
        let value = Decoder::new(bytes, cx).decode_root(T::type_info())?;
        debug!("decoded `{}` from {} bytes", T::type_info().type_name(), bytes.len());

        value.take::<T>().map_err(|value| {
            CodecError::mismatch(T::type_info().type_name(), value.graph_info().type_name())
        })
    }

    /// Reads `reader` to the end and decodes the bytes as one `T`.
    #[cfg(feature = "std")]
    pub fn decode_from_reader<T: Typed + Graph, R: std::io::Read>(&self, mut reader: R) -> Result<T> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.decode(&bytes)
    }
}

impl Default for Codec {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("options", &self.options)
            .field("names", &self.names)
            .field("accessors", &self.accessors)
            .field("layouts", &self.layouts)
            .field("encode_transforms", &self.transforms.encode.len())
            .field("decode_transforms", &self.transforms.decode.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// CodecBuilder

/// Configures a [`Codec`].
///
/// Handles that are not given are created fresh by [`build`](Self::build).
#[derive(Default)]
pub struct CodecBuilder {
    registry: Option<TypeRegistryArc>,
    names: Option<NameTable>,
    accessors: Option<AccessorCache>,
    layouts: Option<LayoutCache>,
    options: CodecOptions,
    transforms: Transforms,
}

impl CodecBuilder {
    pub fn registry(mut self, registry: TypeRegistryArc) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn names(mut self, names: NameTable) -> Self {
        self.names = Some(names);
        self
    }

    pub fn accessors(mut self, accessors: AccessorCache) -> Self {
        self.accessors = Some(accessors);
        self
    }

    pub fn layouts(mut self, layouts: LayoutCache) -> Self {
        self.layouts = Some(layouts);
        self
    }

    /// Replaces every option at once.
    pub fn options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strategy(mut self, strategy: ReuseStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn max_references(mut self, max_references: u32) -> Self {
        self.options.max_references = max_references;
        self
    }

    /// Appends an encode transform. Transforms run in insertion order.
    pub fn encode_transform(mut self, transform: impl EncodeTransform) -> Self {
        self.transforms.encode.push(Arc::new(transform));
        self
    }

    /// Appends a decode transform. Transforms run in insertion order.
    pub fn decode_transform(mut self, transform: impl DecodeTransform) -> Self {
        self.transforms.decode.push(Arc::new(transform));
        self
    }

    pub fn build(self) -> Codec {
        Codec {
            registry: self.registry.unwrap_or_else(|| TypeRegistryArc::new(default_registry())),
            names: self.names.unwrap_or_default(),
            accessors: self.accessors.unwrap_or_default(),
            layouts: self.layouts.unwrap_or_default(),
            options: self.options,
            transforms: self.transforms,
        }
    }
}

/// The built-in types plus every `#[graph(auto_register)]` type.
pub(crate) fn default_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.auto_register();
    registry
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use og_model::derive::Graph;
    use og_model::Graph;

    use super::Codec;
    use crate::error::CodecError;
    use crate::tracker::ReuseStrategy;
    use crate::wire::Tag;

    #[derive(Graph, Default, Debug, PartialEq)]
    struct Entry {
        key: String,
        value: i64,
    }

    #[test]
    fn failed_encodes_leave_the_buffer_alone() {
        let codec = Codec::builder().max_depth(1).build();
        let mut out = Vec::from([0xAA]);
        let nested = Vec::from([Vec::from([1_u8])]);
        let err = codec.encode_into(&nested, &mut out).unwrap_err();
        assert!(matches!(err, CodecError::DepthLimitExceeded { limit: 1 }));
        assert_eq!(out, [0xAA]);

        codec.encode_into(&7_u8, &mut out).unwrap();
        assert_eq!(out, [0xAA, Tag::U8 as u8, 7]);
    }

    #[test]
    fn fast_streams_start_with_the_name_table() {
        let codec = Codec::new();
        let entry = Entry {
            key: String::from("k"),
            value: -1,
        };
        let bytes = codec.encode_with(&entry, ReuseStrategy::NoTrackingFast).unwrap();
        assert_eq!(bytes[0], Tag::NameTable as u8);
        assert_eq!(codec.encode_specialized(&entry).unwrap(), bytes);
        assert_eq!(codec.decode::<Entry>(&bytes).unwrap(), entry);

        // Every name was declared up front, so none is spelled out.
        let body = &bytes[bytes.iter().position(|&b| b == Tag::ObjectStart as u8).unwrap()..];
        assert_eq!(body[1], Tag::NameReferenceId as u8);
    }

    #[test]
    fn decoding_the_wrong_type() {
        let codec = Codec::new();
        let bytes = codec.encode(&Entry::default()).unwrap();
        let err = codec.decode::<u32>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));

        let value: &dyn Graph = &Entry::default();
        assert_eq!(value.graph_info().type_name(), "Entry");
    }
}
