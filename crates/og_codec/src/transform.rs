//! Pluggable value rewriting around the graph walker.
//!
//! Transforms are consulted in the order they were added, and only the
//! first one that produces a value is applied.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use og_model::Graph;
use og_model::info::TypeInfo;

/// Rewrites a value just before it is written.
///
/// Returning `None` leaves the value alone. The replacement is written in
/// place of the original and is not transformed again.
///
/// Implemented for closures of the same shape.
pub trait EncodeTransform: Send + Sync + 'static {
    fn transform(&self, value: &dyn Graph) -> Option<Box<dyn Graph>>;
}

impl<F> EncodeTransform for F
where
    F: Fn(&dyn Graph) -> Option<Box<dyn Graph>> + Send + Sync + 'static,
{
    #[inline]
    fn transform(&self, value: &dyn Graph) -> Option<Box<dyn Graph>> {
        self(value)
    }
}

/// Rewrites a decoded value just before it is assigned to `target`.
///
/// ## Return Value Semantics
///
/// - [`source_type`](Self::source_type) returns the type whose data is
///   expected on the wire where `target` is declared, or `None` if this
///   transform does not handle `target`.
/// - [`transform`](Self::transform) returns `Ok(converted)`, or hands the
///   value back with `Err(value)` so the next transform may try it.
pub trait DecodeTransform: Send + Sync + 'static {
    fn source_type(&self, target: &'static TypeInfo) -> Option<&'static TypeInfo>;

    fn transform(
        &self,
        value: Box<dyn Graph>,
        target: &'static TypeInfo,
    ) -> Result<Box<dyn Graph>, Box<dyn Graph>>;
}

/// The transform lists of a codec.
#[derive(Clone, Default)]
pub(crate) struct Transforms {
    pub encode: Vec<Arc<dyn EncodeTransform>>,
    pub decode: Vec<Arc<dyn DecodeTransform>>,
}

impl Transforms {
    /// The first encode-side replacement of `value`.
    pub fn encode(&self, value: &dyn Graph) -> Option<Box<dyn Graph>> {
        self.encode.iter().find_map(|t| t.transform(value))
    }

    /// The wire type to read where `target` is declared, with the index of
    /// the first transform that claimed it.
    pub fn decode_source(&self, target: &'static TypeInfo) -> Option<(usize, &'static TypeInfo)> {
        if self.decode.is_empty() {
            return None;
        }
        self.decode
            .iter()
            .enumerate()
            .find_map(|(i, t)| t.source_type(target).map(|source| (i, source)))
    }

    /// Runs the decode transforms from `first` on, stopping at the first success.
    pub fn decode(
        &self,
        first: usize,
        mut value: Box<dyn Graph>,
        target: &'static TypeInfo,
    ) -> Result<Box<dyn Graph>, Box<dyn Graph>> {
        for transform in self.decode.iter().skip(first) {
            match transform.transform(value, target) {
                Ok(converted) => return Ok(converted),
                Err(back) => value = back,
            }
        }
        Err(value)
    }
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transforms")
            .field("encode", &self.encode.len())
            .field("decode", &self.decode.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;

    use og_model::Graph;
    use og_model::info::{TypeInfo, Typed};

    use super::{DecodeTransform, Transforms};

    struct ParseNumber;

    impl DecodeTransform for ParseNumber {
        fn source_type(&self, target: &'static TypeInfo) -> Option<&'static TypeInfo> {
            target.is::<u32>().then(String::type_info)
        }

        fn transform(
            &self,
            value: Box<dyn Graph>,
            _target: &'static TypeInfo,
        ) -> Result<Box<dyn Graph>, Box<dyn Graph>> {
            let text = value.take::<String>()?;
            match text.parse::<u32>() {
                Ok(n) => Ok(Box::new(n)),
                Err(_) => Err(Box::new(text)),
            }
        }
    }

    #[test]
    fn first_encode_replacement_wins() {
        let mut transforms = Transforms::default();
        transforms.encode.push(Arc::new(|v: &dyn Graph| {
            v.downcast_ref::<u8>().map(|n| Box::new(n.to_string()) as Box<dyn Graph>)
        }));
        transforms
            .encode
            .push(Arc::new(|_: &dyn Graph| Some(Box::new(0_u64) as Box<dyn Graph>)));

        let out = transforms.encode(&7_u8).unwrap();
        assert_eq!(out.take::<String>().unwrap(), "7");
        assert!(transforms.encode(&1_i8).unwrap().is::<u64>());
    }

    #[test]
    fn decode_hands_back_unconverted_values() {
        let mut transforms = Transforms::default();
        assert!(transforms.decode_source(u32::type_info()).is_none());
        transforms.decode.push(Arc::new(ParseNumber));

        let (first, source) = transforms.decode_source(u32::type_info()).unwrap();
        assert!(source.is::<String>());
        assert!(transforms.decode_source(u8::type_info()).is_none());

        let ok = transforms.decode(first, Box::new(String::from("12")), u32::type_info());
        assert_eq!(ok.unwrap().take::<u32>().unwrap(), 12);
        let back = transforms.decode(first, Box::new(String::from("x")), u32::type_info());
        assert!(back.unwrap_err().is::<String>());
    }
}
