#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code refers to `::og_model`, which must also resolve inside
// this crate's own tests and doctests.
extern crate self as og_model;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod graph;

pub mod impls;
pub mod info;
pub mod layout;
pub mod registry;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub mod __macro_exports;

pub use error::{ModelError, UnsupportedReason};
pub use graph::{Array, ArrayBuilder, Graph, GraphRef, Record, SharedGraph};
pub use impls::{Shared, SharedDyn, SharedSlot};
pub use og_model_derive as derive;
