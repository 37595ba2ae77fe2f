use super::index::ChainIndex;
use super::window::Window;
use super::{
    BLOCK_END_LITERALS, BLOCK_END_NO_MATCH, END_OF_CHAIN, JUST_LITERAL, MAX_DISTANCE,
    MAX_SAME_LETTER, SHORT_CHAINS_GREEDY, SHORT_CHAINS_LAZY,
};

/// Per-position parse of one block.
///
/// `lengths[i]` is 0 or 1 for "emit a literal" and the match length
/// otherwise; `distances[i]` is only meaningful alongside a match length.
/// The cost sweep later rewrites `lengths` in place.
pub struct Matches {
    pub lengths: Vec<u32>,
    pub distances: Vec<u16>,
}

/// Walk the exact chain at `pos` and return the best `(length, distance)`,
/// or `(1, 0)` if nothing beats a literal.
///
/// `hard_stop` is the absolute position matches must not run past (the
/// block end minus the mandatory trailing literals). `max_chain_length`
/// bounds how many successively better matches are chased before settling.
///
/// Each candidate is screened tail-first: the four bytes just past the
/// current best length are compared first, walking backward toward `pos`
/// in 4-byte strides. Both sequences start with the same four bytes, so if
/// they differ at all it is most likely near the end; a candidate that
/// cannot beat the current best is thrown out after a single probe. Only
/// when the backward walk reaches `pos` is the match extended forward to
/// find its real length. The strides overlap near `pos` and re-compare a
/// few bytes; a check to skip those costs more than the comparison.
pub fn longest_match(
    window: &Window,
    pos: usize,
    hard_stop: usize,
    chain: &[u16],
    max_chain_length: u16,
) -> (u32, u16) {
    const CHECK_AT_ONCE: usize = 4;

    let mut best_len = JUST_LITERAL;
    let mut best_dist: u16 = 0;
    let mut steps_left = max_chain_length;

    let mut hop = chain[pos & MAX_DISTANCE];
    let mut total_distance: usize = 0;
    while hop != END_OF_CHAIN {
        total_distance += hop as usize;
        if total_distance > MAX_DISTANCE {
            break;
        }
        hop = chain[(pos - total_distance) & MAX_DISTANCE];

        // first byte a longer match would have to cover
        let at_least = pos + best_len as usize + 1;
        if at_least > hard_stop {
            break;
        }

        let mut probe = at_least;
        let tail_matches = loop {
            if probe <= pos + CHECK_AT_ONCE {
                break true;
            }
            probe -= CHECK_AT_ONCE;
            if window.word(probe) != window.word(probe - total_distance) {
                break false;
            }
        };
        if !tail_matches {
            continue;
        }

        let mut front = at_least;
        while front + CHECK_AT_ONCE <= hard_stop
            && window.word(front) == window.word(front - total_distance)
        {
            front += CHECK_AT_ONCE;
        }
        while front < hard_stop && window.byte(front) == window.byte(front - total_distance) {
            front += 1;
        }

        best_len = (front - pos) as u32;
        best_dist = total_distance as u16;

        steps_left -= 1;
        if steps_left == 0 {
            break;
        }
    }

    (best_len, best_dist)
}

/// Scan one block, feeding every position into the index and recording the
/// longest match available there.
///
/// `lookback` positions before the block start are indexed but not matched:
/// they cover bytes the previous block (or the dictionary) left out of the
/// chains because its own scan stopped short of its end.
///
/// With a short chain cap the scan turns greedy: once a match is found the
/// positions it covers are skipped, except that the immediately following
/// position gets one look (lazy evaluation) before skipping resumes.
pub fn find_block_matches(
    window: &Window,
    index: &mut ChainIndex,
    block_start: usize,
    block_end: usize,
    max_chain_length: u16,
    lookback: usize,
) -> Matches {
    let block_size = block_end - block_start;
    let mut matches = Matches {
        lengths: vec![0; block_size],
        distances: vec![0; block_size],
    };

    let is_greedy = max_chain_length <= SHORT_CHAINS_GREEDY;
    let is_lazy = !is_greedy && max_chain_length <= SHORT_CHAINS_LAZY;
    let mut skip_matches: u32 = 0;
    let mut lazy_evaluation = false;

    let limit = block_size as i64 - BLOCK_END_NO_MATCH as i64;
    for i in -(lookback as i64)..=limit {
        let pos = (block_start as i64 + i) as usize;

        // Inside a long same-byte run every position has the same match,
        // one byte shorter than its predecessor's. Copying it sidesteps
        // both the index update and the finder.
        if i > 0 && window.byte(pos) == window.byte(pos - 1) {
            let at = i as usize;
            if matches.distances[at - 1] == 1 && matches.lengths[at - 1] > MAX_SAME_LETTER {
                matches.distances[at] = 1;
                matches.lengths[at] = matches.lengths[at - 1] - 1;
                continue;
            }
        }

        index.insert(window, pos);

        // lookback region: chains updated, but matching would cross back
        // over the block boundary
        if i < 0 {
            continue;
        }

        if skip_matches > 0 {
            skip_matches -= 1;
            if !lazy_evaluation {
                continue;
            }
            lazy_evaluation = false;
        }

        let (length, distance) = longest_match(
            window,
            pos,
            block_end - BLOCK_END_LITERALS,
            index.exact_chain(),
            max_chain_length,
        );
        matches.lengths[i as usize] = length;
        matches.distances[i as usize] = distance;

        if (is_greedy || is_lazy) && length != JUST_LITERAL {
            lazy_evaluation = skip_matches == 0;
            skip_matches = length;
        }
    }

    // whatever the scan did not reach is emitted as literals
    for length in &mut matches.lengths[(limit + 1).max(0) as usize..] {
        *length = JUST_LITERAL;
    }

    matches
}
