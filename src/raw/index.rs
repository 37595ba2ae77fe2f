use super::window::Window;
use super::{END_OF_CHAIN, MAX_DISTANCE};

/// Hash table entry count; 2^20 buckets keep the whole table at 8 MiB.
const HASH_BITS: u32 = 20;
const HASH_SIZE: usize = 1 << HASH_BITS;
/// `last_hash` value for a bucket no position has ever hashed into.
/// All-ones so it can never collide with a real absolute position.
const NEVER_SEEN: usize = usize::MAX;

/// Squash a 4-byte word into [`HASH_BITS`] bits.
///
/// The multiplier is the classic minimal-standard LCG constant; collisions
/// are expected and resolved by the exact chain.
pub fn hash32(word: u32) -> usize {
    ((word.wrapping_mul(48271) >> (32 - HASH_BITS)) as usize) & (HASH_SIZE - 1)
}

/// Candidate enumeration state, kept alive for the whole frame so blocks can
/// reference their predecessors' bytes.
///
/// There are 2^32 distinct 4-byte prefixes, far too many to give each its
/// own chain head, so candidates are threaded twice:
///
/// 1. `last_hash` maps a 20-bit hash to the most recent position that
///    produced it.
/// 2. `prev_hash` chains every position to the previous one with the same
///    hash (a ring of back-distances indexed by `position & 0xFFFF`).
/// 3. `prev_exact` is the sparser chain the match finder actually walks:
///    it links positions whose leading four bytes are identical, skipping
///    the hash collisions up front.
///
/// A ring slot is overwritten every 65,536 positions, which is harmless:
/// any entry further back than [`MAX_DISTANCE`] is unreachable anyway, and
/// a stale hop is caught by re-hashing the bytes it lands on.
pub struct ChainIndex {
    last_hash: Vec<usize>,
    prev_hash: Vec<u16>,
    prev_exact: Vec<u16>,
}

impl ChainIndex {
    pub fn new() -> Self {
        ChainIndex {
            last_hash: vec![NEVER_SEEN; HASH_SIZE],
            prev_hash: vec![END_OF_CHAIN; MAX_DISTANCE + 1],
            prev_exact: vec![END_OF_CHAIN; MAX_DISTANCE + 1],
        }
    }

    /// The exact-match chain ring, as walked by the match finder.
    pub fn exact_chain(&self) -> &[u16] {
        &self.prev_exact
    }

    /// Record `pos` in both chains.
    ///
    /// Resolves the exact-chain link by hopping along the hash chain until
    /// the leading four bytes match, the chain ends, the accumulated
    /// distance leaves the window, or a hop lands on bytes that hash
    /// differently (a stale ring entry from a previous wrap).
    pub fn insert(&mut self, window: &Window, pos: usize) {
        let four = window.word(pos);
        let hash = hash32(four);
        let prev = self.last_hash[hash];
        self.last_hash[hash] = pos;

        let slot = pos & MAX_DISTANCE;
        if prev == NEVER_SEEN || pos - prev > MAX_DISTANCE {
            self.prev_hash[slot] = END_OF_CHAIN;
            self.prev_exact[slot] = END_OF_CHAIN;
            return;
        }

        let mut distance = pos - prev;
        self.prev_hash[slot] = distance as u16;

        let mut candidate = prev;
        let mut candidate_four;
        loop {
            candidate_four = window.word(candidate);
            if candidate_four == four {
                break;
            }
            if hash32(candidate_four) != hash {
                break;
            }
            let hop = self.prev_hash[candidate & MAX_DISTANCE];
            if hop == END_OF_CHAIN {
                break;
            }
            distance += hop as usize;
            if distance > MAX_DISTANCE {
                break;
            }
            match candidate.checked_sub(hop as usize) {
                Some(back) if back >= window.data_zero() => candidate = back,
                _ => break,
            }
        }

        self.prev_exact[slot] = if candidate_four == four {
            distance as u16
        } else {
            END_OF_CHAIN
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stays_in_range() {
        for word in [0u32, 1, 0xFFFF_FFFF, 0xDEAD_BEEF, 48271] {
            assert!(hash32(word) < HASH_SIZE);
        }
    }

    #[test]
    fn repeated_prefix_links_exact_chain() {
        let data = b"abcdXXXXabcdYYYYabcdZZZZ";
        let window = Window::new(data);
        let mut index = ChainIndex::new();
        for pos in 0..data.len() - 4 {
            index.insert(&window, pos);
        }
        // "abcd" occurs at 0, 8 and 16; each occurrence points at the previous one
        assert_eq!(index.exact_chain()[8], 8);
        assert_eq!(index.exact_chain()[16], 8);
        assert_eq!(index.exact_chain()[0], END_OF_CHAIN);
    }

    #[test]
    fn lone_prefix_has_no_chain() {
        let data = b"abcdefghijklmnop";
        let window = Window::new(data);
        let mut index = ChainIndex::new();
        for pos in 0..data.len() - 4 {
            index.insert(&window, pos);
        }
        for pos in 0..data.len() - 4 {
            assert_eq!(index.exact_chain()[pos], END_OF_CHAIN);
        }
    }
}
