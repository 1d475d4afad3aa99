//! Scalar values that map one-to-one onto a wire tag.

mod decimal;

pub use decimal::Decimal;

use alloc::boxed::Box;
use core::fmt;
use core::time::Duration;
use std::time::SystemTime;

use crate::Graph;

// -----------------------------------------------------------------------------
// ScalarKind

/// The fixed-width scalar shapes understood by the wire codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    I128,
    U128,
    Isize,
    Usize,
    F32,
    F64,
    Char,
    Decimal,
    Duration,
    Timestamp,
}

impl ScalarKind {
    /// The name used for this scalar on the wire and in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::I128 => "i128",
            Self::U128 => "u128",
            Self::Isize => "isize",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::Decimal => "Decimal",
            Self::Duration => "Duration",
            Self::Timestamp => "SystemTime",
        }
    }

    /// Returns `true` for the integer kinds a field-less enum may use as `repr`.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::U8
                | Self::I16
                | Self::U16
                | Self::I32
                | Self::U32
                | Self::I64
                | Self::U64
                | Self::Isize
                | Self::Usize
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Scalar

/// A single scalar value, detached from the field that held it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    Isize(isize),
    Usize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    Decimal(Decimal),
    Duration(Duration),
    Timestamp(SystemTime),
}

impl Scalar {
    /// Returns the kind of this scalar.
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::U8(_) => ScalarKind::U8,
            Self::I16(_) => ScalarKind::I16,
            Self::U16(_) => ScalarKind::U16,
            Self::I32(_) => ScalarKind::I32,
            Self::U32(_) => ScalarKind::U32,
            Self::I64(_) => ScalarKind::I64,
            Self::U64(_) => ScalarKind::U64,
            Self::I128(_) => ScalarKind::I128,
            Self::U128(_) => ScalarKind::U128,
            Self::Isize(_) => ScalarKind::Isize,
            Self::Usize(_) => ScalarKind::Usize,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Char(_) => ScalarKind::Char,
            Self::Decimal(_) => ScalarKind::Decimal,
            Self::Duration(_) => ScalarKind::Duration,
            Self::Timestamp(_) => ScalarKind::Timestamp,
        }
    }

    /// Boxes the native value this scalar stands for.
    pub fn into_graph(self) -> Box<dyn Graph> {
        match self {
            Self::Bool(v) => Box::new(v),
            Self::I8(v) => Box::new(v),
            Self::U8(v) => Box::new(v),
            Self::I16(v) => Box::new(v),
            Self::U16(v) => Box::new(v),
            Self::I32(v) => Box::new(v),
            Self::U32(v) => Box::new(v),
            Self::I64(v) => Box::new(v),
            Self::U64(v) => Box::new(v),
            Self::I128(v) => Box::new(v),
            Self::U128(v) => Box::new(v),
            Self::Isize(v) => Box::new(v),
            Self::Usize(v) => Box::new(v),
            Self::F32(v) => Box::new(v),
            Self::F64(v) => Box::new(v),
            Self::Char(v) => Box::new(v),
            Self::Decimal(v) => Box::new(v),
            Self::Duration(v) => Box::new(v),
            Self::Timestamp(v) => Box::new(v),
        }
    }

    /// Widens an integer scalar to `i128`, used for enum discriminants.
    pub const fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Self::I8(v) => v as i128,
            Self::U8(v) => v as i128,
            Self::I16(v) => v as i128,
            Self::U16(v) => v as i128,
            Self::I32(v) => v as i128,
            Self::U32(v) => v as i128,
            Self::I64(v) => v as i128,
            Self::U64(v) => v as i128,
            Self::Isize(v) => v as i128,
            Self::Usize(v) => v as i128,
            _ => return None,
        })
    }
}
