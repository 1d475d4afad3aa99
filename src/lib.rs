#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use og_codec as codec;
pub use og_model as model;
pub use og_utils as utils;

pub use og_codec::{Codec, CodecBuilder, CodecError, CodecOptions, ReuseStrategy, decode, encode};
pub use og_model::derive::Graph;
