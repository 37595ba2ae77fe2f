use byteorder::{ByteOrder, LE};
use std::borrow::Cow;

use super::MAX_DISTANCE;

/// The bytes a block is allowed to reference, addressed by absolute position.
///
/// Without a dictionary this is a plain view over the caller's input and
/// nothing is ever copied. With a dictionary, the trailing 64 KiB of the
/// dictionary are stitched in front of the input so that the first block can
/// reference them like ordinary preceding data.
///
/// `data_zero` marks the oldest position the chain walks may still visit.
/// Sliding it forward is pure bookkeeping; the invariant is that every
/// position within [`MAX_DISTANCE`] of the upcoming block start stays live,
/// so no recorded back-reference is ever stranded.
pub struct Window<'a> {
    bytes: Cow<'a, [u8]>,
    data_zero: usize,
    origin: usize,
}

impl<'a> Window<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Window { bytes: Cow::Borrowed(input), data_zero: 0, origin: 0 }
    }

    /// Window over `dict_tail ++ input`. Dictionary content before the
    /// trailing 64 KiB can never be referenced and is dropped up front.
    pub fn with_dictionary(dictionary: &[u8], input: &'a [u8]) -> Self {
        let tail = &dictionary[dictionary.len().saturating_sub(MAX_DISTANCE)..];
        let mut bytes = Vec::with_capacity(tail.len() + input.len());
        bytes.extend_from_slice(tail);
        bytes.extend_from_slice(input);
        Window { bytes: Cow::Owned(bytes), data_zero: 0, origin: tail.len() }
    }

    /// Absolute position where the caller's input begins (the dictionary
    /// tail, if any, sits below this).
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// One past the last ingested position.
    pub fn end(&self) -> usize {
        self.bytes.len()
    }

    /// Oldest position chain walks may visit.
    pub fn data_zero(&self) -> usize {
        self.data_zero
    }

    pub fn byte(&self, pos: usize) -> u8 {
        self.bytes[pos]
    }

    /// The four bytes at `pos` as a little-endian word, the unit the hash
    /// and the match comparisons work in.
    pub fn word(&self, pos: usize) -> u32 {
        LE::read_u32(&self.bytes[pos..])
    }

    pub fn slice(&self, from: usize, to: usize) -> &[u8] {
        &self.bytes[from..to]
    }

    /// Retire everything a block starting at `block_start` can no longer
    /// reach. Safe by construction: the farthest legal back-reference from
    /// the new block is exactly [`MAX_DISTANCE`] bytes.
    pub fn prune(&mut self, block_start: usize) {
        self.data_zero = self.data_zero.max(block_start.saturating_sub(MAX_DISTANCE));
    }
}
