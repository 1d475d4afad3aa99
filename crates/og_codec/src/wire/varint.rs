//! Variable-width integers for lengths and reference numbers.
//!
//! A value is written as the narrowest of four signed widths that holds it,
//! each with its own tag. `-1` (the null length) therefore costs two bytes.

use alloc::vec::Vec;

use crate::wire::Tag;

const I24_MIN: i32 = -(1 << 23);
const I24_MAX: i32 = (1 << 23) - 1;

/// The tag used for `value`.
pub const fn tag_for(value: i32) -> Tag {
    if value >= i8::MIN as i32 && value <= i8::MAX as i32 {
        Tag::VarInt8
    } else if value >= i16::MIN as i32 && value <= i16::MAX as i32 {
        Tag::VarInt16
    } else if value >= I24_MIN && value <= I24_MAX {
        Tag::VarInt24
    } else {
        Tag::VarInt32
    }
}

/// Appends the tag and payload of `value`.
pub fn write(out: &mut Vec<u8>, value: i32) {
    let tag = tag_for(value);
    out.push(tag as u8);
    let bytes = value.to_le_bytes();
    match tag {
        Tag::VarInt8 => out.push(bytes[0]),
        Tag::VarInt16 => out.extend_from_slice(&bytes[..2]),
        Tag::VarInt24 => out.extend_from_slice(&bytes[..3]),
        _ => out.extend_from_slice(&bytes),
    }
}

/// Sign-extends the little-endian payload of a varint tag.
///
/// `payload` must hold exactly the width of `tag`.
pub fn read(tag: Tag, payload: &[u8]) -> Option<i32> {
    Some(match (tag, payload) {
        (Tag::VarInt8, &[b0]) => b0 as i8 as i32,
        (Tag::VarInt16, &[b0, b1]) => i16::from_le_bytes([b0, b1]) as i32,
        (Tag::VarInt24, &[b0, b1, b2]) => {
            let fill = if b2 & 0x80 != 0 { 0xFF } else { 0x00 };
            i32::from_le_bytes([b0, b1, b2, fill])
        }
        (Tag::VarInt32, &[b0, b1, b2, b3]) => i32::from_le_bytes([b0, b1, b2, b3]),
        _ => return None,
    })
}
