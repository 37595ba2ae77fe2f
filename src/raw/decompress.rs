use byteorder::{ReadBytesExt, LE};
use fehler::{throw, throws};
use std::io::{Cursor, Read};
use thiserror::Error;

use super::MIN_MATCH;

/// Errors when decoding a raw LZ4 block.
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    #[error("input ended in the middle of a token sequence (truncation or garbage)")]
    UnexpectedEnd,
    #[error("match distance of zero is not allowed")]
    ZeroDistance,
    #[error("match distance reaches back before the start of the data (missing dictionary?)")]
    DistanceOutOfRange,
}
type Error = DecodeError;

/// This is how LZ4 encodes varints.
/// Just keep reading and adding while it's all F.
#[throws]
fn read_lsic(nibble: u8, reader: &mut Cursor<&[u8]>) -> usize {
    let mut value = nibble as usize;
    if value == 0xF {
        loop {
            let more = reader.read_u8().map_err(|_| Error::UnexpectedEnd)?;
            value += more as usize;
            if more != 0xFF {
                break;
            }
        }
    }
    value
}

/// Decode one LZ4 block, appending the plaintext to `output`.
///
/// Back-references may reach up to 64 KiB behind the start of this block;
/// `prefix` supplies those bytes (the tail of the previously decoded data,
/// or a dictionary). Pass an empty prefix for an independent block.
#[throws]
pub fn decompress_block(input: &[u8], prefix: &[u8], output: &mut Vec<u8>) {
    let mut reader = Cursor::new(input);
    loop {
        let token = match reader.read_u8() {
            Ok(token) => token,
            Err(_) => break,
        };

        let literal_len = read_lsic(token >> 4, &mut reader)?;
        let before_literals = output.len();
        output.resize(before_literals + literal_len, 0);
        if reader.read_exact(&mut output[before_literals..]).is_err() {
            throw!(Error::UnexpectedEnd);
        }

        // the terminal token consists of literals only
        let distance = match reader.read_u16::<LE>() {
            Ok(distance) => distance as usize,
            Err(_) => break,
        };
        if distance == 0 {
            throw!(Error::ZeroDistance);
        }

        let match_len = MIN_MATCH as usize + read_lsic(token & 0xF, &mut reader)?;
        copy_match(distance, match_len, prefix, output)?;
    }
}

#[throws]
fn copy_match(distance: usize, mut match_len: usize, prefix: &[u8], output: &mut Vec<u8>) {
    let written = output.len();
    if distance > written {
        // reaches into the prefix
        let needed = distance - written;
        if needed > prefix.len() {
            throw!(Error::DistanceOutOfRange);
        }
        let from_prefix = needed.min(match_len);
        output.extend_from_slice(&prefix[prefix.len() - needed..][..from_prefix]);
        match_len -= from_prefix;
        if match_len > 0 {
            // the copy ran off the end of the prefix and continues in the
            // bytes we just appended; the distance is unchanged because the
            // cursor advanced by exactly the prefix bytes taken
            copy_match(distance, match_len, &[], output)?;
        }
    } else if distance == 1 {
        // run of a single byte
        let byte = output[written - 1];
        output.resize(written + match_len, byte);
    } else if match_len <= distance {
        // non-overlapping, one straight copy within the output
        output.resize(written + match_len, 0);
        let (head, tail) = output.split_at_mut(written);
        tail.copy_from_slice(&head[written - distance..][..match_len]);
    } else {
        // overlapping: the source grows as we copy
        output.reserve(match_len);
        for i in 0..match_len {
            let byte = output[written - distance + i];
            output.push(byte);
        }
    }
}

/// Decode a complete standalone block into a fresh vector.
#[throws]
pub fn decompress_raw(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    decompress_block(input, &[], &mut output)?;
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aaaaaaaaaaa_lots_of_aaaaaaaaa() {
        assert_eq!(decompress_raw(&[0x11, b'a', 1, 0]).unwrap(), b"aaaaaa");
    }

    #[test]
    fn multiple_repeated_groups() {
        assert_eq!(
            decompress_raw(&[0x11, b'a', 1, 0, 0x22, b'b', b'c', 2, 0]).unwrap(),
            b"aaaaaabcbcbcbc"
        );
    }

    #[test]
    fn all_literal() {
        assert_eq!(decompress_raw(&[0x30, b'a', b'4', b'9']).unwrap(), b"a49");
    }

    #[test]
    fn distance_out_of_range() {
        assert_eq!(
            decompress_raw(&[0x10, b'a', 2, 0]).unwrap_err(),
            DecodeError::DistanceOutOfRange
        );
        assert_eq!(
            decompress_raw(&[0x40, b'a', 1, 0]).unwrap_err(),
            DecodeError::UnexpectedEnd
        );
    }

    #[test]
    fn zero_distance_is_rejected() {
        assert_eq!(
            decompress_raw(&[0x11, b'a', 0, 0]).unwrap_err(),
            DecodeError::ZeroDistance
        );
    }

    #[test]
    fn matches_may_start_in_the_prefix() {
        let mut output = Vec::new();
        decompress_block(&[0x04, 4, 0], b"wxyz", &mut output).unwrap();
        assert_eq!(output, b"wxyzwxyz");
    }

    #[test]
    fn truncated_literals_are_reported() {
        assert_eq!(
            decompress_raw(&[0x40, b'a']).unwrap_err(),
            DecodeError::UnexpectedEnd
        );
    }
}
