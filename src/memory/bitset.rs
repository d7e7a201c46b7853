//! Fixed-width bit vector backing a search's candidate set
//!
//! One bit per item. Lookups of the next set bit skip whole zero words, so
//! walking a sparse set costs time proportional to the number of words plus
//! the number of survivors, never to the number of bits.

use crate::core::types::{MemoryError, MemoryResult};
use std::ops::Range;

const WORD_BITS: u64 = 64;

/// A bit vector of fixed length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBits {
    words: Vec<u64>,
    len: u64,
}

impl CandidateBits {
    /// Allocates `len` bits, all set.
    ///
    /// Allocation failure is reported as [`MemoryError::OutOfMemory`]
    /// instead of aborting.
    pub fn new_filled(len: u64) -> MemoryResult<Self> {
        let n_words = len.div_ceil(WORD_BITS);
        let bytes = n_words * 8;
        let n_words = usize::try_from(n_words).map_err(|_| MemoryError::OutOfMemory { bytes })?;

        let mut words = Vec::new();
        words
            .try_reserve_exact(n_words)
            .map_err(|_| MemoryError::OutOfMemory { bytes })?;
        words.resize(n_words, u64::MAX);

        let mut bits = CandidateBits { words, len };
        bits.mask_tail();
        Ok(bits)
    }

    // Bits past `len` in the last word must stay clear for count() and next_set().
    fn mask_tail(&mut self) {
        let rem = self.len % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    /// Number of bits
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing storage in bytes
    pub fn byte_size(&self) -> u64 {
        self.words.len() as u64 * 8
    }

    pub fn get(&self, index: u64) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[(index / WORD_BITS) as usize] & (1u64 << (index % WORD_BITS)) != 0
    }

    pub fn set(&mut self, index: u64) {
        if index < self.len {
            self.words[(index / WORD_BITS) as usize] |= 1u64 << (index % WORD_BITS);
        }
    }

    /// Clears a bit, returning whether it was set
    pub fn clear(&mut self, index: u64) -> bool {
        if index >= self.len {
            return false;
        }
        let word = &mut self.words[(index / WORD_BITS) as usize];
        let mask = 1u64 << (index % WORD_BITS);
        let was_set = *word & mask != 0;
        *word &= !mask;
        was_set
    }

    /// Population count across all words
    pub fn count(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }

    /// The 64-bit word holding bits `64 * word_index ..`
    pub fn word(&self, word_index: usize) -> u64 {
        self.words.get(word_index).copied().unwrap_or(0)
    }

    /// First set bit at or after `from`, skipping zero words
    pub fn next_set(&self, from: u64) -> Option<u64> {
        self.next_set_before(from, self.len)
    }

    /// First set bit in `from..end`, skipping zero words
    pub fn next_set_before(&self, from: u64, end: u64) -> Option<u64> {
        let end = end.min(self.len);
        if from >= end {
            return None;
        }

        let mut word_index = (from / WORD_BITS) as usize;
        // drop bits below `from` in the first word
        let mut word = self.words[word_index] & (u64::MAX << (from % WORD_BITS));

        loop {
            if word != 0 {
                let index = word_index as u64 * WORD_BITS + word.trailing_zeros() as u64;
                return (index < end).then_some(index);
            }
            word_index += 1;
            if word_index as u64 * WORD_BITS >= end {
                return None;
            }
            word = self.words[word_index];
        }
    }

    /// End of the run of set bits starting at `start` (exclusive)
    pub fn set_run_end(&self, start: u64) -> u64 {
        let mut index = start;
        while index < self.len {
            let word_index = (index / WORD_BITS) as usize;
            let shift = index % WORD_BITS;
            let ones = (!(self.words[word_index] >> shift)).trailing_zeros() as u64;
            let ones = ones.min(WORD_BITS - shift);
            index += ones;
            if ones < WORD_BITS - shift {
                break;
            }
        }
        index.min(self.len)
    }

    /// Next maximal run of set bits at or after `from`
    pub fn next_set_run(&self, from: u64) -> Option<Range<u64>> {
        let start = self.next_set(from)?;
        Some(start..self.set_run_end(start))
    }

    /// Indices of all set bits in ascending order
    pub fn iter_ones(&self) -> impl Iterator<Item = u64> + '_ {
        let mut next = 0u64;
        std::iter::from_fn(move || {
            let found = self.next_set(next)?;
            next = found + 1;
            Some(found)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filled_counts_every_bit() {
        let bits = CandidateBits::new_filled(128).unwrap();
        assert_eq!(bits.len(), 128);
        assert_eq!(bits.count(), 128);
        assert_eq!(bits.byte_size(), 16);
    }

    #[test]
    fn test_partial_last_word_is_masked() {
        let bits = CandidateBits::new_filled(70).unwrap();
        assert_eq!(bits.count(), 70);
        assert!(bits.get(69));
        assert!(!bits.get(70));
        assert_eq!(bits.word(1), (1u64 << 6) - 1);
    }

    #[test]
    fn test_empty() {
        let bits = CandidateBits::new_filled(0).unwrap();
        assert!(bits.is_empty());
        assert_eq!(bits.count(), 0);
        assert_eq!(bits.next_set(0), None);
    }

    #[test]
    fn test_clear_and_set() {
        let mut bits = CandidateBits::new_filled(64).unwrap();
        assert!(bits.clear(10));
        assert!(!bits.clear(10));
        assert!(!bits.get(10));
        assert_eq!(bits.count(), 63);
        bits.set(10);
        assert!(bits.get(10));
        assert!(!bits.clear(1000));
    }

    #[test]
    fn test_next_set_skips_zero_words() {
        let mut bits = CandidateBits::new_filled(640).unwrap();
        for i in 0..640 {
            if i != 3 && i != 500 {
                bits.clear(i);
            }
        }
        assert_eq!(bits.word(1), 0);
        assert_eq!(bits.next_set(0), Some(3));
        assert_eq!(bits.next_set(3), Some(3));
        assert_eq!(bits.next_set(4), Some(500));
        assert_eq!(bits.next_set(501), None);
        assert_eq!(bits.next_set_before(4, 500), None);
        assert_eq!(bits.next_set_before(4, 501), Some(500));
    }

    #[test]
    fn test_set_run_end() {
        let mut bits = CandidateBits::new_filled(200).unwrap();
        bits.clear(130);
        assert_eq!(bits.set_run_end(0), 130);
        assert_eq!(bits.set_run_end(64), 130);
        assert_eq!(bits.set_run_end(130), 130);
        assert_eq!(bits.set_run_end(131), 200);
        assert_eq!(bits.next_set_run(0), Some(0..130));
        assert_eq!(bits.next_set_run(130), Some(131..200));
        assert_eq!(bits.next_set_run(200), None);
    }

    #[test]
    fn test_iter_ones() {
        let mut bits = CandidateBits::new_filled(130).unwrap();
        for i in 0..130 {
            if i % 50 != 0 {
                bits.clear(i);
            }
        }
        let ones: Vec<u64> = bits.iter_ones().collect();
        assert_eq!(ones, vec![0, 50, 100]);
    }
}
