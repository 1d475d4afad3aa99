use core::fmt;

use og_model::value::ScalarKind;

macro_rules! define_tags {
    ($($(#[$meta:meta])* $name:ident = $byte:literal,)*) => {
        /// The one-byte marker that starts every wire item.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Tag {
            $($(#[$meta])* $name = $byte,)*
        }

        impl Tag {
            /// Parses a tag byte.
            pub const fn from_u8(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// The name used in diagnostics.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

define_tags! {
    Null = 0x00,
    ObjectStart = 0x01,
    ObjectEnd = 0x02,
    ArrayStart = 0x03,
    ArrayEnd = 0x04,
    FieldName = 0x05,
    ReferenceId = 0x06,
    NameReferenceId = 0x07,
    /// Opens the pre-declared name block.
    NameTable = 0x08,
    DeclareType = 0x09,
    DeclareMember = 0x0A,

    Bool = 0x10,
    I8 = 0x11,
    U8 = 0x12,
    I16 = 0x13,
    U16 = 0x14,
    I32 = 0x15,
    U32 = 0x16,
    I64 = 0x17,
    U64 = 0x18,
    I128 = 0x19,
    U128 = 0x1A,
    Isize = 0x1B,
    Usize = 0x1C,
    F32 = 0x20,
    F64 = 0x21,
    Char = 0x22,
    Decimal = 0x23,
    Duration = 0x24,
    Timestamp = 0x25,

    String = 0x30,

    VarInt8 = 0x38,
    VarInt16 = 0x39,
    VarInt24 = 0x3A,
    VarInt32 = 0x3B,
}

impl Tag {
    /// The tag carrying a scalar of the given kind.
    pub const fn of_scalar(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Self::Bool,
            ScalarKind::I8 => Self::I8,
            ScalarKind::U8 => Self::U8,
            ScalarKind::I16 => Self::I16,
            ScalarKind::U16 => Self::U16,
            ScalarKind::I32 => Self::I32,
            ScalarKind::U32 => Self::U32,
            ScalarKind::I64 => Self::I64,
            ScalarKind::U64 => Self::U64,
            ScalarKind::I128 => Self::I128,
            ScalarKind::U128 => Self::U128,
            ScalarKind::Isize => Self::Isize,
            ScalarKind::Usize => Self::Usize,
            ScalarKind::F32 => Self::F32,
            ScalarKind::F64 => Self::F64,
            ScalarKind::Char => Self::Char,
            ScalarKind::Decimal => Self::Decimal,
            ScalarKind::Duration => Self::Duration,
            ScalarKind::Timestamp => Self::Timestamp,
        }
    }

    /// The scalar kind carried by this tag, if it is a scalar tag.
    pub const fn scalar_kind(self) -> Option<ScalarKind> {
        Some(match self {
            Self::Bool => ScalarKind::Bool,
            Self::I8 => ScalarKind::I8,
            Self::U8 => ScalarKind::U8,
            Self::I16 => ScalarKind::I16,
            Self::U16 => ScalarKind::U16,
            Self::I32 => ScalarKind::I32,
            Self::U32 => ScalarKind::U32,
            Self::I64 => ScalarKind::I64,
            Self::U64 => ScalarKind::U64,
            Self::I128 => ScalarKind::I128,
            Self::U128 => ScalarKind::U128,
            Self::Isize => ScalarKind::Isize,
            Self::Usize => ScalarKind::Usize,
            Self::F32 => ScalarKind::F32,
            Self::F64 => ScalarKind::F64,
            Self::Char => ScalarKind::Char,
            Self::Decimal => ScalarKind::Decimal,
            Self::Duration => ScalarKind::Duration,
            Self::Timestamp => ScalarKind::Timestamp,
            _ => return None,
        })
    }

    /// Payload width in bytes of a fixed-width tag.
    pub const fn fixed_width(self) -> Option<usize> {
        Some(match self {
            Self::Bool | Self::I8 | Self::U8 | Self::VarInt8 => 1,
            Self::I16 | Self::U16 | Self::VarInt16 => 2,
            Self::VarInt24 => 3,
            Self::I32 | Self::U32 | Self::F32 | Self::Char | Self::VarInt32 => 4,
            Self::I64 | Self::U64 | Self::Isize | Self::Usize | Self::F64 => 8,
            Self::Duration | Self::Timestamp => 12,
            Self::I128 | Self::U128 | Self::Decimal => 16,
            _ => return None,
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
