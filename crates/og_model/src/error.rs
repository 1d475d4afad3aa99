use alloc::borrow::Cow;
use core::fmt;

use thiserror::Error;

/// Why a member cannot take part in encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// Raw pointers, `NonNull` and function pointers have no portable value.
    PointerLike,
    /// The declared type is only known at runtime, so no specialized
    /// accessor can be generated for it.
    Polymorphic,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointerLike => f.write_str("pointer-like members cannot be represented"),
            Self::Polymorphic => f.write_str("polymorphic members cannot be specialized"),
        }
    }
}

/// Errors raised while analysing a type's members.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("unsupported member `{member}` on `{type_name}`: {reason}")]
    UnsupportedMember {
        type_name: Cow<'static, str>,
        member: &'static str,
        reason: UnsupportedReason,
    },
    #[error("deprecated member `{member}` on `{type_name}` names unknown replacement `{replacement}`")]
    UnresolvedReplacement {
        type_name: Cow<'static, str>,
        member: &'static str,
        replacement: &'static str,
    },
    #[error("member name `{member}` appears twice in the layout of `{type_name}`")]
    DuplicateMember {
        type_name: Cow<'static, str>,
        member: Cow<'static, str>,
    },
    #[error("`{type_name}` is not a record type")]
    NotARecord { type_name: Cow<'static, str> },
}
