#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod accessor;
mod codec;
mod error;
mod names;
mod options;
mod tracker;
mod transform;
mod walker;

pub mod wire;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use accessor::{AccessorCache, AccessorEntry};
pub use codec::{Codec, CodecBuilder};
pub use error::{CodecError, FormatError, Result};
pub use names::{DeclaredName, NameKind, NameTable};
pub use options::CodecOptions;
pub use tracker::ReuseStrategy;
pub use transform::{DecodeTransform, EncodeTransform};

// -----------------------------------------------------------------------------
// Default codec

use alloc::vec::Vec;
use std::sync::OnceLock;

use og_model::Graph;
use og_model::info::Typed;

/// The process-wide codec behind [`encode`] and [`decode`].
///
/// Built on first use with default options; its registry holds the built-in
/// types plus every auto-registered type.
pub fn default_codec() -> &'static Codec {
    static DEFAULT: OnceLock<Codec> = OnceLock::new();
    DEFAULT.get_or_init(Codec::new)
}

/// Encodes `value` with the default codec.
#[inline]
pub fn encode<T: Graph>(value: &T, strategy: ReuseStrategy) -> Result<Vec<u8>> {
    default_codec().encode_with(value, strategy)
}

/// Decodes one `T` with the default codec.
#[inline]
pub fn decode<T: Typed + Graph>(bytes: &[u8]) -> Result<T> {
    default_codec().decode(bytes)
}
