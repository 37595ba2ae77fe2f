use byteorder::{ReadBytesExt, LE};
use fehler::{throw, throws};
use std::hash::Hasher;
use std::io::{self, BufRead, ErrorKind, Read};
use thiserror::Error;
use twox_hash::XxHash32;

use super::header::{self, BlockDescriptor, Flags};
use super::{INCOMPRESSIBLE, MAGIC, WINDOW_SIZE};
use crate::raw::{decompress_block, DecodeError};

/// Errors when decompressing an LZ4 frame.
#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("reading the compressed stream failed")]
    Io(#[from] io::Error),
    #[error("corrupt block payload")]
    Block(#[from] DecodeError),
    #[error("unsupported frame descriptor")]
    Descriptor(#[from] header::HeaderError),
    #[error("not an LZ4 frame (magic was {0:#010x})")]
    NotAFrame(u32),
    #[error("header checksum mismatch")]
    HeaderChecksum,
    #[error("block checksum mismatch")]
    BlockChecksum,
    #[error("content checksum mismatch")]
    ContentChecksum,
    #[error("block larger than the frame's declared maximum")]
    OversizedBlock,
}
type Error = DecompressionError; // do it this way for better docs

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(ErrorKind::Other, e)
    }
}

/// Reads the blocks of one LZ4 frame, in order.
///
/// Back-references are resolved against a single history buffer holding
/// the trailing 64 KiB of everything decoded so far. A dictionary, when
/// supplied, simply pre-fills that history; when the frame declares its
/// blocks independent, the history is never advanced past the dictionary,
/// so every block sees exactly the prefix it was compressed against.
#[derive(Debug)]
pub struct LZ4FrameReader<R: Read> {
    reader: R,
    flags: Flags,
    block_maxsize: usize,
    content_size: Option<u64>,
    dictionary_id: Option<u32>,
    content_hasher: Option<XxHash32>,
    history: Vec<u8>,
    payload: Vec<u8>,
    finished: bool,
}

/// Keep `history` holding the final [`WINDOW_SIZE`] bytes of everything
/// decoded so far.
fn slide_window(history: &mut Vec<u8>, block: &[u8]) {
    if block.len() >= WINDOW_SIZE {
        history.clear();
        history.extend_from_slice(&block[block.len() - WINDOW_SIZE..]);
    } else {
        let overflow = (history.len() + block.len()).saturating_sub(WINDOW_SIZE);
        history.drain(..overflow);
        history.extend_from_slice(block);
    }
}

impl<R: Read> LZ4FrameReader<R> {
    #[throws]
    pub fn new(reader: R) -> Self {
        Self::open(reader, &[])?
    }

    /// Like [`Self::new`], additionally supplying the dictionary the frame
    /// was compressed against (the format gives a decoder no way to tell;
    /// you just have to know). Only the trailing 64 KiB are kept.
    #[throws]
    pub fn with_dictionary(reader: R, dictionary: &[u8]) -> Self {
        Self::open(reader, &dictionary[dictionary.len().saturating_sub(WINDOW_SIZE)..])?
    }

    #[throws]
    fn open(mut reader: R, dictionary_tail: &[u8]) -> Self {
        let magic = reader.read_u32::<LE>()?;
        if magic != MAGIC {
            throw!(Error::NotAFrame(magic));
        }

        // FLG and BD first; everything from here to the checksum byte is
        // covered by it
        let mut descriptor = [0u8; 2];
        reader.read_exact(&mut descriptor)?;
        let flags = Flags::parse(descriptor[0])?;
        let block_maxsize = BlockDescriptor::parse(descriptor[1])?.block_maxsize()?;

        let mut hasher = XxHash32::with_seed(0);
        hasher.write(&descriptor);

        let mut content_size = None;
        if flags.contains(Flags::CONTENT_SIZE) {
            let size = reader.read_u64::<LE>()?;
            hasher.write(&size.to_le_bytes());
            content_size = Some(size);
        }

        let mut dictionary_id = None;
        if flags.contains(Flags::DICTIONARY_ID) {
            let id = reader.read_u32::<LE>()?;
            hasher.write(&id.to_le_bytes());
            dictionary_id = Some(id);
        }

        if reader.read_u8()? != (hasher.finish() >> 8) as u8 {
            throw!(Error::HeaderChecksum);
        }

        let content_hasher = flags
            .contains(Flags::CONTENT_CHECKSUM)
            .then(|| XxHash32::with_seed(0));

        LZ4FrameReader {
            reader,
            flags,
            block_maxsize,
            content_size,
            dictionary_id,
            content_hasher,
            history: dictionary_tail.to_vec(),
            payload: Vec::new(),
            finished: false,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_maxsize
    }
    pub fn frame_size(&self) -> Option<u64> {
        self.content_size
    }
    pub fn dictionary_id(&self) -> Option<u32> {
        self.dictionary_id
    }

    pub fn into_read(self) -> LZ4FrameIoReader<R> {
        LZ4FrameIoReader {
            block: Vec::with_capacity(self.block_size()),
            consumed: 0,
            frames: self,
        }
    }

    /// Decode the next block into `output`, or leave it empty once the
    /// frame's terminator has been read.
    #[throws]
    pub fn decode_block(&mut self, output: &mut Vec<u8>) {
        assert!(output.is_empty(), "decode_block wants an empty output buffer");

        if self.finished {
            return;
        }

        let word = self.reader.read_u32::<LE>()?;
        if word == 0 {
            self.finish()?;
            return;
        }

        let stored = word & INCOMPRESSIBLE != 0;
        let payload_len = (word & !INCOMPRESSIBLE) as usize;
        if payload_len > self.block_maxsize {
            throw!(Error::OversizedBlock);
        }

        self.payload.resize(payload_len, 0);
        self.reader.read_exact(&mut self.payload)?;
        self.verify_block_checksum()?;

        if stored {
            output.extend_from_slice(&self.payload);
        } else {
            decompress_block(&self.payload, &self.history, output)?;
            if output.len() > self.block_maxsize {
                throw!(Error::OversizedBlock);
            }
        }

        // independent blocks may only reference the dictionary, so their
        // output never enters the history
        if !self.flags.contains(Flags::INDEPENDENT_BLOCKS) {
            slide_window(&mut self.history, output);
        }

        if let Some(hasher) = self.content_hasher.as_mut() {
            hasher.write(output);
        }
    }

    #[throws]
    fn finish(&mut self) {
        if let Some(hasher) = self.content_hasher.take() {
            let expected = self.reader.read_u32::<LE>()?;
            if hasher.finish() as u32 != expected {
                throw!(Error::ContentChecksum);
            }
        }
        self.finished = true;
    }

    #[throws]
    fn verify_block_checksum(&mut self) {
        if !self.flags.contains(Flags::BLOCK_CHECKSUMS) {
            return;
        }
        let expected = self.reader.read_u32::<LE>()?;
        let mut hasher = XxHash32::with_seed(0);
        hasher.write(&self.payload);
        if hasher.finish() as u32 != expected {
            throw!(Error::BlockChecksum);
        }
    }
}

/// [`BufRead`] view over the decoded bytes of a frame, one block at a time.
pub struct LZ4FrameIoReader<R: Read> {
    frames: LZ4FrameReader<R>,
    block: Vec<u8>,
    consumed: usize,
}

impl<R: Read> BufRead for LZ4FrameIoReader<R> {
    #[throws(io::Error)]
    fn fill_buf(&mut self) -> &[u8] {
        if self.consumed == self.block.len() {
            self.block.clear();
            self.consumed = 0;
            self.frames.decode_block(&mut self.block)?;
        }
        &self.block[self.consumed..]
    }

    fn consume(&mut self, amt: usize) {
        self.consumed = (self.consumed + amt).min(self.block.len());
    }
}

impl<R: Read> Read for LZ4FrameIoReader<R> {
    #[throws(io::Error)]
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        n
    }
}

/// Decode a whole frame into a fresh vector.
#[throws]
pub fn decompress_frame<R: Read>(reader: R) -> Vec<u8> {
    let mut plaintext = Vec::new();
    LZ4FrameReader::new(reader)?.into_read().read_to_end(&mut plaintext)?;
    plaintext
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_blocks_accumulate_in_the_window() {
        let mut history = b"abc".to_vec();
        slide_window(&mut history, b"defg");
        assert_eq!(history, b"abcdefg");
    }

    #[test]
    fn the_window_holds_only_the_tail() {
        // 30 new bytes push 20 old ones out of the 64 KiB window
        let mut history = vec![1u8; WINDOW_SIZE - 10];
        slide_window(&mut history, &[2u8; 30]);
        assert_eq!(history.len(), WINDOW_SIZE);
        assert!(history[..WINDOW_SIZE - 30].iter().all(|&b| b == 1));
        assert!(history[WINDOW_SIZE - 30..].iter().all(|&b| b == 2));
    }

    #[test]
    fn oversized_blocks_replace_the_window_outright() {
        let mut history = vec![1u8; 100];
        let block = vec![2u8; WINDOW_SIZE + 500];
        slide_window(&mut history, &block);
        assert_eq!(history, vec![2u8; WINDOW_SIZE]);
    }

    #[test]
    fn garbage_is_not_a_frame() {
        let err = LZ4FrameReader::new(&b"not an lz4 frame at all"[..]).unwrap_err();
        assert!(matches!(err, DecompressionError::NotAFrame(_)));
    }

    #[test]
    fn a_flipped_header_byte_fails_the_checksum() {
        // valid fixed header, then the checksum byte for different flags
        let bytes = [0x04, 0x22, 0x4D, 0x18, 0x40, 0x70, 0xDE];
        let err = LZ4FrameReader::new(&bytes[..]).unwrap_err();
        assert!(matches!(err, DecompressionError::HeaderChecksum));
    }
}
