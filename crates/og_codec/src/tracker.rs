//! Reference tracking for reference-semantics values.
//!
//! Encoding keeps an [`EncodeTracker`] per call, whose behaviour depends on
//! the [`ReuseStrategy`]. Decoding is strategy-agnostic: [`DecodeRefs`]
//! honours every `ReferenceId` it meets.

use alloc::vec::Vec;

use og_model::SharedSlot;
use og_utils::hash::{HashMap, HashSet};

use crate::error::{CodecError, FormatError, Result};
use crate::wire::WireReader;

// -----------------------------------------------------------------------------
// ReuseStrategy

/// How shared values are tracked while encoding.
///
/// All strategies produce the same grammar, and any stream decodes the
/// same way regardless of the strategy that wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReuseStrategy {
    /// No reference numbers. Revisiting a value that is still being
    /// encoded is a [`CodecError::CircularReference`], other repeats are
    /// encoded in full again.
    NoReuse,
    /// Every shared value gets a reference number, repeats are written as
    /// a bare back-reference. Depth-first and recursive.
    #[default]
    TreeWithReuse,
    /// Same output as [`TreeWithReuse`](Self::TreeWithReuse), produced by
    /// an iterative walk whose stack usage does not grow with the graph.
    WideCircularSafe,
    /// No tracking at all. Names are pre-declared at the start of the
    /// stream and specialized accessors may encode the whole graph.
    NoTrackingFast,
}

impl ReuseStrategy {
    /// Returns `true` if shared values carry a `ReferenceId`.
    #[inline]
    pub const fn writes_references(self) -> bool {
        matches!(self, Self::TreeWithReuse | Self::WideCircularSafe)
    }

    /// Returns `true` if the stream starts with a name table.
    #[inline]
    pub const fn predeclares_names(self) -> bool {
        matches!(self, Self::NoTrackingFast)
    }
}

// -----------------------------------------------------------------------------
// EncodeTracker

/// The outcome of entering a shared value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    /// First occurrence, encode the body after this number.
    New(i32),
    /// Already numbered, write only the number.
    Seen(i32),
    /// Encode the body without a number.
    Untracked,
}

/// Per-call identity bookkeeping on the encode side.
pub(crate) struct EncodeTracker {
    strategy: ReuseStrategy,
    limit: u32,
    numbers: HashMap<usize, i32>,
    active: HashSet<usize>,
}

impl EncodeTracker {
    pub fn new(strategy: ReuseStrategy, limit: u32) -> Self {
        Self {
            strategy,
            limit: limit.min(i32::MAX as u32),
            numbers: HashMap::default(),
            active: HashSet::default(),
        }
    }

    #[inline]
    pub fn strategy(&self) -> ReuseStrategy {
        self.strategy
    }

    /// Called before the body of the shared value `identity`.
    ///
    /// Under [`ReuseStrategy::NoReuse`] every `enter` returning
    /// [`Visit::Untracked`] must be paired with a [`leave`](Self::leave).
    pub fn enter(&mut self, identity: usize, type_name: &'static str) -> Result<Visit> {
        match self.strategy {
            ReuseStrategy::NoReuse => {
                if !self.active.insert(identity) {
                    return Err(CodecError::CircularReference {
                        type_name: type_name.into(),
                    });
                }
                Ok(Visit::Untracked)
            }
            ReuseStrategy::TreeWithReuse | ReuseStrategy::WideCircularSafe => {
                if let Some(&number) = self.numbers.get(&identity) {
                    return Ok(Visit::Seen(number));
                }
                if self.numbers.len() >= self.limit as usize {
                    return Err(CodecError::GraphSizeOverflow { limit: self.limit });
                }
                let number = self.numbers.len() as i32;
                self.numbers.insert(identity, number);
                Ok(Visit::New(number))
            }
            ReuseStrategy::NoTrackingFast => Ok(Visit::Untracked),
        }
    }

    /// Called after the body of `identity` is written.
    #[inline]
    pub fn leave(&mut self, identity: usize) {
        if self.strategy == ReuseStrategy::NoReuse {
            self.active.remove(&identity);
        }
    }

    /// Number of reference numbers handed out.
    #[inline]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }
}

// -----------------------------------------------------------------------------
// DecodeRefs

/// What a decoded reference number stands for.
pub(crate) enum RefSlot<'de> {
    /// A materialized instance.
    Ready(SharedSlot),
    /// An object skipped without a resolvable type.
    Vacant(&'de str),
}

/// The decode-time reference table, grown in stream order.
pub(crate) struct DecodeRefs<'de> {
    slots: Vec<RefSlot<'de>>,
    limit: u32,
}

impl<'de> DecodeRefs<'de> {
    pub fn new(limit: u32) -> Self {
        Self {
            slots: Vec::new(),
            limit: limit.min(i32::MAX as u32),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Appends the slot for the next reference number.
    pub fn push(&mut self, slot: RefSlot<'de>) -> Result<()> {
        if self.slots.len() >= self.limit as usize {
            return Err(CodecError::GraphSizeOverflow { limit: self.limit });
        }
        self.slots.push(slot);
        Ok(())
    }

    /// Looks up an existing reference number.
    pub fn get(&self, number: i32, r: &WireReader<'_>) -> Result<&RefSlot<'de>> {
        usize::try_from(number)
            .ok()
            .and_then(|i| self.slots.get(i))
            .ok_or_else(|| {
                r.error(FormatError::ReferenceOutOfRange {
                    number,
                    known: self.slots.len(),
                })
            })
    }
}
