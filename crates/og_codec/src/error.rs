use alloc::borrow::Cow;

use og_model::ModelError;
use thiserror::Error;

use crate::wire::Tag;

/// A violation of the wire grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unknown tag 0x{0:02x}")]
    UnknownTag(u8),
    #[error("expected {expected}, found `{found}`")]
    UnexpectedTag { expected: &'static str, found: Tag },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("0x{0:x} is not a unicode scalar value")]
    InvalidChar(u32),
    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBool(u8),
    #[error("invalid length {0}")]
    InvalidLength(i32),
    #[error("reference number {number} is out of range, {known} known")]
    ReferenceOutOfRange { number: i32, known: usize },
    #[error("name number {number} is out of range, {known} known")]
    NameOutOfRange { number: i32, known: usize },
    #[error("{value} is not a discriminant of `{type_name}`")]
    InvalidEnumValue {
        type_name: Cow<'static, str>,
        value: i128,
    },
    #[error("{0} bytes left after the root value")]
    TrailingBytes(usize),
    #[error("temporal value out of range")]
    InvalidTimestamp,
    #[error("decimal scale out of range")]
    InvalidDecimal,
    #[error("integer does not fit the target width")]
    IntegerOverflow,
}

/// Errors raised by encode and decode calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("malformed input at byte {offset}: {kind}")]
    Format { offset: usize, kind: FormatError },
    #[error("circular reference through `{type_name}`")]
    CircularReference { type_name: Cow<'static, str> },
    #[error("`{type_name}` is missing mandatory member `{member}`")]
    MissingField {
        type_name: Cow<'static, str>,
        member: Cow<'static, str>,
    },
    #[error("type `{name}` cannot be resolved")]
    UnresolvableType { name: Cow<'static, str> },
    #[error("more than {limit} distinct references")]
    GraphSizeOverflow { limit: u32 },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },
    #[error("nesting deeper than {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("`{type_name}` is mutably borrowed")]
    Borrowed { type_name: Cow<'static, str> },
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CodecError {
    #[inline]
    pub(crate) fn format(offset: usize, kind: FormatError) -> Self {
        Self::Format { offset, kind }
    }

    #[inline]
    pub(crate) fn mismatch(
        expected: impl Into<Cow<'static, str>>,
        found: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// The format violation, if this is one.
    pub fn format_kind(&self) -> Option<&FormatError> {
        match self {
            Self::Format { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T, E = CodecError> = core::result::Result<T, E>;
