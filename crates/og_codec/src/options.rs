use crate::tracker::ReuseStrategy;

/// Tunables of a [`Codec`](crate::Codec).
///
/// With the `serde` feature this can be loaded from configuration files.
/// Missing keys take their default values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecOptions {
    /// The strategy used by [`Codec::encode`](crate::Codec::encode).
    pub strategy: ReuseStrategy,
    /// Maximum nesting of recursive encode and decode.
    ///
    /// The [`WideCircularSafe`](ReuseStrategy::WideCircularSafe) encoder is
    /// iterative and ignores it.
    pub max_depth: usize,
    /// Maximum number of distinct reference numbers in one stream.
    pub max_references: u32,
    /// Lets [`NoTrackingFast`](ReuseStrategy::NoTrackingFast) encode the
    /// root through its specialized accessor.
    pub specialize: bool,
}

impl CodecOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 256;
    pub const DEFAULT_MAX_REFERENCES: u32 = i32::MAX as u32;

    pub const fn new() -> Self {
        Self {
            strategy: ReuseStrategy::TreeWithReuse,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_references: Self::DEFAULT_MAX_REFERENCES,
            specialize: true,
        }
    }
}

impl Default for CodecOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::CodecOptions;
    use crate::tracker::ReuseStrategy;

    #[test]
    fn defaults() {
        let options = CodecOptions::default();
        assert_eq!(options.strategy, ReuseStrategy::TreeWithReuse);
        assert_eq!(options.max_depth, 256);
        assert_eq!(options.max_references, i32::MAX as u32);
        assert!(options.specialize);
    }
}
