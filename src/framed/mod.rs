//! The LZ4 frame format.
//!
//! An lz4-compressed file typically consists of a single frame.
//!
//! The frame format is self-terminating, i.e. it can be embedded without a length prefix.
//! This also allows LZ4 frames to be concatenated back to back.
//!
//! See `CompressionSettings` for how frames are produced here and
//! `LZ4FrameReader` for how arbitrary conforming frames are consumed.

mod compress;
mod decompress;
mod header;

/// The four magic bytes at the start of every LZ4 frame (little endian).
pub const MAGIC: u32 = 0x184D2204;
/// The frame format sets the high bit of a block's length field to indicate
/// that its payload was not compressed.
const INCOMPRESSIBLE: u32 = 1 << 31;
/// The LZ4 raw format maintains a lookback window of exactly 64KiB.
pub const WINDOW_SIZE: usize = 64 * 1024;
/// Blocks are always emitted at the largest size the format offers.
pub const MAX_BLOCK_SIZE: usize = 4 * 1024 * 1024;
/// BD-byte id corresponding to [`MAX_BLOCK_SIZE`].
const MAX_BLOCK_SIZE_ID: u8 = 7;

pub use compress::*;
pub use decompress::*;
