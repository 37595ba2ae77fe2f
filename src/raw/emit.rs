use super::finder::Matches;
use super::{JUST_LITERAL, MAX_LENGTH_CODE, MIN_MATCH};

/// Fold `value` into one nibble of the token, saturating at the escape
/// value 15.
pub(crate) fn write_lsic_head(token: &mut u8, shift: u32, value: u32) {
    *token |= (value.min(0xF) as u8) << shift;
}

/// Emit the extension bytes for a length whose nibble saturated: `0xFF`
/// while at least 255 remain, then one closing byte (possibly zero).
pub(crate) fn write_lsic_tail(out: &mut Vec<u8>, value: u32) {
    if value < 0xF {
        return;
    }
    let mut rest = value - 0xF;
    while rest >= MAX_LENGTH_CODE {
        out.push(0xFF);
        rest -= MAX_LENGTH_CODE;
    }
    out.push(rest as u8);
}

/// Serialize a finished parse into LZ4 block tokens.
///
/// One forward walk over `matches`: literal positions accumulate into a
/// run, a match position flushes the run together with the match packet
/// and then skips the positions the match covers. The run that reaches
/// the end of the block becomes the terminal token, which by format rule
/// carries literals only (zero match nibble, no distance).
pub fn emit_block(matches: &Matches, block: &[u8], out: &mut Vec<u8>) {
    let n = matches.lengths.len();

    let mut literals_from = 0;
    let mut num_literals: usize = 0;
    let mut last_token = false;

    let mut offset = 0;
    while offset < n {
        let length = matches.lengths[offset];
        let distance = matches.distances[offset];

        if length <= JUST_LITERAL {
            if num_literals == 0 {
                literals_from = offset;
            }
            num_literals += 1;
            offset += 1;
            if offset < n {
                continue;
            }
            last_token = true;
        } else {
            offset += length as usize;
        }

        let match_len = if last_token { 0 } else { length - MIN_MATCH };

        let mut token = 0u8;
        write_lsic_head(&mut token, 4, num_literals as u32);
        write_lsic_head(&mut token, 0, match_len);
        out.push(token);
        write_lsic_tail(out, num_literals as u32);

        if num_literals > 0 {
            out.extend_from_slice(&block[literals_from..literals_from + num_literals]);
            if last_token {
                break;
            }
            num_literals = 0;
        }

        out.extend_from_slice(&distance.to_le_bytes());
        write_lsic_tail(out, match_len);
    }
}
