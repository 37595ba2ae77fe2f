use byteorder::{WriteBytesExt, LE};
use fehler::throws;
use std::hash::Hasher;
use std::io::{self, Write};
use twox_hash::XxHash32;

use super::header::Flags;
use super::{INCOMPRESSIBLE, MAGIC, MAX_BLOCK_SIZE, MAX_BLOCK_SIZE_ID};
use crate::raw::{
    self, ChainIndex, Window, BLOCK_END_NO_MATCH, MAX_CHAIN_LENGTH, SHORT_CHAINS_GREEDY,
};

/// A builder-style struct that configures compression settings.
/// This is how you compress LZ4 frames.
/// (An LZ4 file usually consists of a single frame.)
///
/// Create it using `Default::default()`, which gives you the strongest
/// setting: optimal parsing over the full candidate chain.
///
/// The frames produced here always use 4 MiB blocks that may depend on
/// their predecessors, and carry no checksums beyond the mandatory header
/// byte — the layout the reference `lz4` tool accepts without complaint.
pub struct CompressionSettings<'a> {
    max_chain_length: u16,
    dictionary: Option<&'a [u8]>,
}

impl<'a> Default for CompressionSettings<'a> {
    fn default() -> Self {
        Self {
            max_chain_length: MAX_CHAIN_LENGTH,
            dictionary: None,
        }
    }
}

impl<'a> CompressionSettings<'a> {
    /// How many successively better matches the finder chases at each
    /// position before settling.
    ///
    /// 0 stores every block uncompressed. 1–3 parse greedily, 4–6 add one
    /// position of lazy lookahead, anything above parses optimally over
    /// chains capped at this length.
    pub fn max_chain_length(&mut self, v: u16) -> &mut Self {
        self.max_chain_length = v;
        self
    }

    /// The conventional 0–9 compression-level dial, mapped onto
    /// [`Self::max_chain_length`]: 0 stores, 1 through 8 check that many
    /// candidates, 9 checks them all.
    pub fn level(&mut self, level: u8) -> &mut Self {
        self.max_chain_length = match level {
            0 => 0,
            1..=8 => level as u16,
            _ => MAX_CHAIN_LENGTH,
        };
        self
    }

    /// A constant slice of bytes shared with whoever will decompress the
    /// frame; the first block may back-reference into it as if it had just
    /// been emitted. Only the trailing 64 KiB can ever be referenced, so
    /// anything longer is silently trimmed to its tail.
    ///
    /// No dictionary-id field is written — like the `lz4` CLI, we leave
    /// the receiving side to know which dictionary applies.
    pub fn dictionary(&mut self, dict: &'a [u8]) -> &mut Self {
        self.dictionary = Some(dict);
        self
    }

    /// Compress `input` into `writer` as one complete frame.
    ///
    /// The compressor itself cannot fail; every error out of here is the
    /// writer's.
    #[throws(io::Error)]
    pub fn compress<W: Write>(&self, input: &[u8], mut writer: W) {
        let version = 1 << 6;
        let flag_byte = version | Flags::empty().bits();
        let bd_byte = MAX_BLOCK_SIZE_ID << 4;

        let mut header = Vec::new();
        header.write_u32::<LE>(MAGIC)?;
        header.write_u8(flag_byte)?;
        header.write_u8(bd_byte)?;

        let mut hasher = XxHash32::with_seed(0);
        hasher.write(&header[4..]); // the magic is not part of the header checksum
        header.write_u8((hasher.finish() >> 8) as u8)?;
        writer.write_all(&header)?;

        let store_only = self.max_chain_length == 0;

        let mut window = match self.dictionary.filter(|d| !d.is_empty()) {
            Some(dict) => Window::with_dictionary(dict, input),
            None => Window::new(input),
        };
        let origin = window.origin();
        let total = window.end();

        // candidate chains live for the whole frame so later blocks can
        // reference their predecessors; store mode never needs the 8 MiB
        let mut index = (!store_only).then(ChainIndex::new);
        let mut compressed = Vec::new();
        let mut first_block = true;

        let mut next_block = origin;
        while next_block < total {
            let block_start = next_block;
            next_block = total.min(block_start + MAX_BLOCK_SIZE);
            let block_size = next_block - block_start;

            let mut block_written = false;
            if let Some(index) = index.as_mut() {
                // positions the previous scan left unindexed (or, before
                // the first block, the whole dictionary tail)
                let lookback = if first_block {
                    origin
                } else {
                    BLOCK_END_NO_MATCH.min(window.data_zero())
                };

                let mut matches = raw::find_block_matches(
                    &window,
                    index,
                    block_start,
                    next_block,
                    self.max_chain_length,
                    lookback,
                );
                if block_size > BLOCK_END_NO_MATCH && self.max_chain_length > SHORT_CHAINS_GREEDY {
                    raw::estimate_costs(&mut matches);
                }

                compressed.clear();
                raw::emit_block(&matches, window.slice(block_start, next_block), &mut compressed);

                // did compression do harm?
                if compressed.len() < block_size {
                    writer.write_u32::<LE>(compressed.len() as u32)?;
                    writer.write_all(&compressed)?;
                    block_written = true;
                }
            }
            if !block_written {
                writer.write_u32::<LE>(block_size as u32 | INCOMPRESSIBLE)?;
                writer.write_all(window.slice(block_start, next_block))?;
            }

            first_block = false;
            window.prune(next_block);
        }

        writer.write_u32::<LE>(0)?;
    }

    /// Like [`Self::compress`], into a fresh vector.
    pub fn compress_to_vec(&self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(raw::compress_bound(input.len()));
        self.compress(input, &mut out)
            .expect("writing to a Vec cannot fail");
        out
    }
}

/// Compress `input` with the default (strongest) settings.
pub fn compress_frame(input: &[u8]) -> Vec<u8> {
    CompressionSettings::default().compress_to_vec(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 7] = [0x04, 0x22, 0x4D, 0x18, 0x40, 0x70, 0xDF];

    fn expected_frame(parts: &[&[u8]]) -> Vec<u8> {
        let mut frame = HEADER.to_vec();
        for part in parts {
            frame.extend_from_slice(part);
        }
        frame.extend_from_slice(&[0, 0, 0, 0]);
        frame
    }

    #[test]
    fn the_header_checksum_byte_is_df() {
        // the descriptor never varies, so neither may its checksum byte
        let frame = compress_frame(b"");
        assert_eq!(&frame[..7], &HEADER);
    }

    #[test]
    fn empty_input_is_header_plus_terminator() {
        let frame = compress_frame(b"");
        assert_eq!(frame, expected_frame(&[]));
        let stored = CompressionSettings::default().level(0).compress_to_vec(b"");
        assert_eq!(frame, stored);
    }

    #[test]
    fn a_single_byte_is_stored_raw() {
        // the smallest compressed rendering (token + literal) is larger
        // than the byte itself, so the raw escape wins
        for level in 0..=9 {
            let frame = CompressionSettings::default().level(level).compress_to_vec(b"A");
            assert_eq!(
                frame,
                expected_frame(&[&[0x01, 0x00, 0x00, 0x80], b"A"]),
                "level {}",
                level
            );
        }
    }

    #[test]
    fn stored_blocks_keep_their_bytes_verbatim() {
        let frame = CompressionSettings::default().level(0).compress_to_vec(b"hello");
        assert_eq!(frame, expected_frame(&[&[0x05, 0x00, 0x00, 0x80], b"hello"]));
    }

    #[test]
    fn sixteen_same_bytes_compress_to_one_match() {
        // one literal anchors the run, a distance-1 match covers ten more
        // bytes, the trailing five stay literal
        let frame = compress_frame(&[0x41; 16]);
        let block = [0x16, 0x41, 0x01, 0x00, 0x50, 0x41, 0x41, 0x41, 0x41, 0x41];
        assert_eq!(frame, expected_frame(&[&[0x0A, 0x00, 0x00, 0x00], &block]));
    }

    #[test]
    fn a_short_period_is_not_matchable() {
        // no match may start within the last 12 bytes of a block, which on
        // an 8-byte block leaves nowhere to start one
        let frame = compress_frame(b"ABCDABCD");
        assert_eq!(frame, expected_frame(&[&[0x08, 0x00, 0x00, 0x80], b"ABCDABCD"]));
    }
}
