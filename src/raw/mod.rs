//! The raw LZ4 block format and the match-finding machinery behind it.
//!
//! Using this directly saves you the overhead of framing (~11 bytes) but you lose several features,
//! most notably the fallback mechanism for incompressible data: if the compressed version of a block
//! would be larger, the frame layer encodes the uncompressed version instead.
//!
//! A block is compressed in three passes: the scan in `finder` records the
//! longest match available at every position, the backward sweep in
//! `optimal` rewrites those matches into the cheapest token sequence, and
//! `emit` serializes the survivors into wire-format tokens. `decompress`
//! is the inverse token walk.

mod decompress;
mod emit;
mod finder;
mod index;
mod optimal;
mod window;

pub use decompress::*;
pub use emit::*;
pub use finder::*;
pub use index::*;
pub use optimal::*;
pub use window::*;

/// Matches shorter than this cannot be encoded.
pub const MIN_MATCH: u32 = 4;
/// Length value marking a position that is emitted as a plain literal.
pub const JUST_LITERAL: u32 = 1;
/// No match may start closer than this to the end of a block.
pub const BLOCK_END_NO_MATCH: usize = 12;
/// The final bytes of every block must be literals.
pub const BLOCK_END_LITERALS: usize = 5;
/// Back-references reach at most this far; also the size of the chain rings.
pub const MAX_DISTANCE: usize = 65535;
/// Chain-ring entry meaning "no predecessor" (a real distance is never 0).
pub const END_OF_CHAIN: u16 = 0;
/// Largest value a single length-extension byte can carry.
pub const MAX_LENGTH_CODE: u32 = 255;
/// Walking the whole chain at every position yields the optimal parse.
pub const MAX_CHAIN_LENGTH: u16 = MAX_DISTANCE as u16;
/// At or below this chain cap the parse is greedy and the cost sweep is skipped.
pub const SHORT_CHAINS_GREEDY: u16 = 3;
/// Chain caps up to here get lazy evaluation (one position of lookahead).
pub const SHORT_CHAINS_LAZY: u16 = 6;
/// Same-byte runs longer than this are propagated instead of re-searched;
/// re-running the match finder inside such a run is quadratic for no gain.
pub const MAX_SAME_LETTER: u32 = 19 + 255 * 256;

/// Worst-case compressed size of `n` input bytes, suitable for preallocation.
///
/// Incompressible data costs one extension byte per 255 literals plus a
/// constant for the token and frame trimmings.
pub fn compress_bound(n: usize) -> usize {
    n + n / 255 + 16
}
