//! The byte-level grammar.
//!
//! Every item is a one-byte [`Tag`] followed by its payload. Scalars have a
//! fixed-width little-endian payload, strings are a [`varint`] length and
//! UTF-8 bytes, and the structural markers carry either nothing or a name.
//! Nothing in this module knows about object graphs.

mod reader;
mod tag;
mod writer;

pub mod varint;

pub use reader::WireReader;
pub use tag::Tag;
pub use writer::WireWriter;
