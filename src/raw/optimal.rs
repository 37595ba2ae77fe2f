use super::finder::Matches;
use super::{BLOCK_END_LITERALS, JUST_LITERAL, MAX_LENGTH_CODE, MAX_SAME_LETTER, MIN_MATCH};

/// Rewrite `matches` into the parse that minimizes the encoded block size.
///
/// A backward sweep: `cost[i]` is the number of output bytes needed to
/// encode everything from position `i` to the end of the block. At each
/// position the literal option competes against every usable prefix of the
/// recorded match; the winning length is written back into
/// `matches.lengths` so the emitter can simply replay the decisions.
///
/// The final [`BLOCK_END_LITERALS`] positions are forced literals and
/// anchor the sweep.
pub fn estimate_costs(matches: &mut Matches) {
    let block_end = matches.lengths.len();
    debug_assert!(block_end > BLOCK_END_LITERALS, "nothing to sweep in a literal-only stub");
    let mut cost = vec![0u32; block_end];

    // literals emitted after the position under consideration, needed to
    // notice when one more literal forces an extra length-extension byte
    let mut num_literals = BLOCK_END_LITERALS as u32;

    for i in (0..=block_end - 1 - BLOCK_END_LITERALS).rev() {
        num_literals += 1;
        let mut best_length = JUST_LITERAL;
        let mut min_cost = cost[i + 1] + 1;

        // the 15th literal spills into an extension byte, as does every
        // 255th after that
        if num_literals == 15
            || (num_literals >= 15 + MAX_LENGTH_CODE
                && (num_literals - 15) % MAX_LENGTH_CODE == 0)
        {
            min_cost += 1;
        }

        let match_length = matches.lengths[i];

        if match_length >= MAX_SAME_LETTER && matches.distances[i] == 1 {
            // A maximal same-byte run; trying every prefix length of it
            // would make the sweep quadratic. Taking the whole run is not
            // provably optimal but is never worse than a byte or two.
            best_length = match_length;
            min_cost = cost[i + match_length as usize] + 1 + 2 + 1 + (match_length - 19) / 255;
        } else {
            // token + distance; extension bytes join at length 19 and then
            // every 255 lengths after that
            let mut packet_cost: u32 = 1 + 2;
            let mut next_cost_increase: u32 = 18;

            for length in MIN_MATCH..=match_length {
                let current = cost[i + length as usize] + packet_cost;
                // `<=` so that equal cost prefers the match: a literal of
                // the same cost can lengthen a literal run enough to force
                // an extension byte at some earlier position, while the
                // match breaks the run. `<` here is still correct, just
                // measurably larger output.
                if current <= min_cost {
                    min_cost = current;
                    best_length = length;
                }
                if length == next_cost_increase {
                    packet_cost += 1;
                    next_cost_increase += MAX_LENGTH_CODE;
                }
            }
        }

        cost[i] = min_cost;
        matches.lengths[i] = best_length;
        if best_length != JUST_LITERAL {
            num_literals = 0;
        }
    }
}
