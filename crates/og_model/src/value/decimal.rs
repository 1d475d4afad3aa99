use core::fmt;

/// A 96-bit scaled decimal number.
///
/// The value is `mantissa / 10^scale` with a separate sign, stored as four
/// 32-bit words: three mantissa words and a flags word holding the scale in
/// bits 16..24 and the sign in bit 31. The codec writes the words in that
/// order, `lo`, `mid`, `hi`, `flags`.
///
/// # Examples
///
/// ```
/// use og_model::value::Decimal;
///
/// let price = Decimal::new(-12345, 2).unwrap();
/// assert_eq!(price.to_string(), "-123.45");
/// assert_eq!(Decimal::from_words(price.words()), Some(price));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    lo: u32,
    mid: u32,
    hi: u32,
    flags: u32,
}

const SCALE_SHIFT: u32 = 16;
const SCALE_MASK: u32 = 0x00FF_0000;
const SIGN_MASK: u32 = 0x8000_0000;
const MAX_MANTISSA: u128 = (1 << 96) - 1;

impl Decimal {
    /// Largest supported scale.
    pub const MAX_SCALE: u8 = 28;

    /// Zero with scale 0.
    pub const ZERO: Self = Self {
        lo: 0,
        mid: 0,
        hi: 0,
        flags: 0,
    };

    /// Creates `mantissa / 10^scale`.
    ///
    /// Returns `None` when the mantissa does not fit in 96 bits or the scale
    /// exceeds [`Decimal::MAX_SCALE`].
    pub const fn new(mantissa: i128, scale: u8) -> Option<Self> {
        let magnitude = mantissa.unsigned_abs();
        if magnitude > MAX_MANTISSA || scale > Self::MAX_SCALE {
            return None;
        }
        let mut flags = (scale as u32) << SCALE_SHIFT;
        if mantissa < 0 {
            flags |= SIGN_MASK;
        }
        Some(Self {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
            flags,
        })
    }

    /// Rebuilds a decimal from its four words, validating the flags word.
    pub const fn from_words(words: [u32; 4]) -> Option<Self> {
        let [lo, mid, hi, flags] = words;
        let scale = (flags & SCALE_MASK) >> SCALE_SHIFT;
        if flags & !(SCALE_MASK | SIGN_MASK) != 0 || scale > Self::MAX_SCALE as u32 {
            return None;
        }
        Some(Self { lo, mid, hi, flags })
    }

    /// The four words in wire order: `lo`, `mid`, `hi`, `flags`.
    pub const fn words(&self) -> [u32; 4] {
        [self.lo, self.mid, self.hi, self.flags]
    }

    /// The signed mantissa.
    pub const fn mantissa(&self) -> i128 {
        let magnitude =
            (self.lo as i128) | ((self.mid as i128) << 32) | ((self.hi as i128) << 64);
        if self.is_negative() { -magnitude } else { magnitude }
    }

    /// Number of digits after the decimal point.
    pub const fn scale(&self) -> u8 {
        ((self.flags & SCALE_MASK) >> SCALE_SHIFT) as u8
    }

    /// Returns `true` if the sign bit is set.
    pub const fn is_negative(&self) -> bool {
        self.flags & SIGN_MASK != 0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        let magnitude = value.unsigned_abs();
        Self {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: 0,
            flags: if value < 0 { SIGN_MASK } else { 0 },
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.mantissa().unsigned_abs();
        let scale = self.scale() as u32;
        if self.is_negative() && magnitude != 0 {
            f.write_str("-")?;
        }
        if scale == 0 {
            return write!(f, "{magnitude}");
        }
        let divisor = 10_u128.pow(scale);
        write!(
            f,
            "{}.{:0width$}",
            magnitude / divisor,
            magnitude % divisor,
            width = scale as usize
        )
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::Decimal;
    use alloc::string::ToString;

    #[test]
    fn display_pads_fraction() {
        assert_eq!(Decimal::new(5, 3).unwrap().to_string(), "0.005");
        assert_eq!(Decimal::new(100, 0).unwrap().to_string(), "100");
        assert_eq!(Decimal::from(-7).to_string(), "-7");
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Decimal::new(1, 29).is_none());
        assert!(Decimal::new(1 << 96, 0).is_none());
        assert!(Decimal::from_words([0, 0, 0, 1]).is_none());
    }

    #[test]
    fn mantissa_spans_three_words() {
        let big = (1_i128 << 95) + 17;
        let d = Decimal::new(-big, 4).unwrap();
        assert_eq!(d.mantissa(), -big);
        assert_eq!(d.scale(), 4);
        assert!(d.is_negative());
    }
}
