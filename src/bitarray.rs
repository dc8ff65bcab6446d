//! BitArray - dynamic bit array packed into 32-bit words.
//!
//! # Design
//!
//! - Uses `Vec<u32>` for storage (32-bit words)
//! - Bit indexing: word_idx = bit_idx / 32, bit_offset = bit_idx % 32
//! - Index 0 is the least significant bit of word 0
//! - Padding bits (positions >= size in the last word) are always zero, so
//!   equality, counting and the bitwise operators work on whole words
//!
//! # Contract violations
//!
//! Out-of-range indices and size mismatches in bitwise operators panic in
//! every build profile. The `try_*` variants report the same conditions as
//! [`BitArrayError`] and leave the array untouched.
//!
//! # Examples
//!
//! ```
//! use dynbits::BitArray;
//!
//! let mut ba = BitArray::with_value(8, 0b1100_1100);
//! assert!(ba[2]);
//! assert_eq!(ba.to_string(), "11001100");
//!
//! ba <<= 2;
//! assert_eq!(ba.to_string(), "00110000");
//! ```

use crate::error::{BitArrayError, Result};
use log::{debug, trace};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Index, Not, Shl, ShlAssign,
    Shr, ShrAssign,
};
use std::str::FromStr;

/// Word type for bit storage (32-bit unsigned integer)
pub type Word = u32;

/// Number of bits per word
pub const BITS_PER_WORD: usize = 32;

/// Maximum word value
pub const WORD_MAX: Word = Word::MAX;

/// Get word index from bit position
#[inline(always)]
const fn get_word_idx(bit_pos: usize) -> usize {
    bit_pos >> 5 // bit_pos / 32
}

/// Get bit index within word from bit position
#[inline(always)]
const fn get_bit_idx(bit_pos: usize) -> usize {
    bit_pos & 31 // bit_pos % 32
}

/// Create bitmask with n bits set (from LSB)
#[inline(always)]
const fn bitmask(n: usize) -> Word {
    if n == 0 {
        0
    } else if n >= BITS_PER_WORD {
        WORD_MAX
    } else {
        WORD_MAX >> (BITS_PER_WORD - n)
    }
}

/// Number of words needed to hold `n` bits
#[inline(always)]
const fn words_for(n: usize) -> usize {
    n.div_ceil(BITS_PER_WORD)
}

/// Resizable sequence of bits with word-level storage.
///
/// All bit indices are 0-based. `Clone` produces an independent deep copy.
/// The derived comparisons and hash rely on the zero-padding invariant.
#[derive(Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawBitArray")
)]
pub struct BitArray {
    /// Storage words (32-bit)
    words: Vec<Word>,
    /// Total number of bits
    num_bits: usize,
}

impl BitArray {
    /// Create a new BitArray with `n` bits, all initialized to 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynbits::BitArray;
    ///
    /// let ba = BitArray::new(1024);
    /// assert_eq!(ba.size(), 1024);
    /// assert_eq!(ba.count(), 0);
    /// ```
    pub fn new(n: usize) -> Self {
        Self {
            words: vec![0; words_for(n)],
            num_bits: n,
        }
    }

    /// Create a BitArray with `n` bits where bit `i` equals bit `i` of `value`.
    ///
    /// Bits beyond the 64 bits of `value` are 0. If `n < 64` the high bits of
    /// `value` are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynbits::BitArray;
    ///
    /// let ba = BitArray::with_value(5, 0b10101);
    /// assert!(ba[0]);
    /// assert!(!ba[1]);
    /// assert!(ba[4]);
    /// ```
    pub fn with_value(n: usize, value: u64) -> Self {
        let mut ba = Self::new(n);
        let num_value_words = ba.words.len().min(2);
        for (w, word) in ba.words.iter_mut().take(num_value_words).enumerate() {
            *word = (value >> (w * BITS_PER_WORD)) as Word;
        }
        ba.mask_tail();
        ba
    }

    // =========================================================================
    // Sizing
    // =========================================================================

    /// Get number of bits in array.
    #[inline]
    pub fn size(&self) -> usize {
        self.num_bits
    }

    /// Returns true if the array holds no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Resize the BitArray to contain `n` bits.
    ///
    /// When growing, the new bits are set to `fill`. When shrinking, bits at
    /// index `>= n` are discarded and cannot reappear on a later grow.
    pub fn resize(&mut self, n: usize, fill: bool) {
        let old = self.num_bits;
        trace!("resize {} -> {} bits (fill: {})", old, n, fill);

        if n <= old {
            self.words.truncate(words_for(n));
            self.num_bits = n;
            self.mask_tail();
        } else {
            self.words.resize(words_for(n), 0);
            self.num_bits = n;
            if fill {
                self.set_range(old, n);
            }
        }
    }

    /// Remove all bits and release storage.
    pub fn clear(&mut self) {
        trace!("clear {} bits", self.num_bits);
        self.words.clear();
        self.num_bits = 0;
    }

    /// Append one bit at the end.
    pub fn push_back(&mut self, bit: bool) {
        if get_bit_idx(self.num_bits) == 0 {
            self.words.push(0);
        }
        self.num_bits += 1;
        if bit {
            self.set(self.num_bits - 1);
        }
    }

    /// Remove the last bit and return it, or `None` if the array is empty.
    pub fn pop_back(&mut self) -> Option<bool> {
        let last = self.num_bits.checked_sub(1)?;
        let bit = self.get(last);
        self.reset(last);
        self.num_bits = last;
        self.words.truncate(words_for(last));
        Some(bit)
    }

    // =========================================================================
    // Single Bit Operations
    // =========================================================================

    /// Get bit at position `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b >= size()`.
    #[inline]
    #[track_caller]
    pub fn get(&self, b: usize) -> bool {
        self.check_index(b);
        (self.words[get_word_idx(b)] >> get_bit_idx(b)) & 1 == 1
    }

    /// Get bit at position `b`, or an error if `b` is out of range.
    pub fn try_get(&self, b: usize) -> Result<bool> {
        self.ensure_index(b)?;
        Ok(self.get(b))
    }

    /// Set bit at position `b` to 1.
    ///
    /// # Panics
    ///
    /// Panics if `b >= size()`.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, b: usize) {
        self.check_index(b);
        self.words[get_word_idx(b)] |= 1 << get_bit_idx(b);
    }

    /// Assign bit at position `b` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `b >= size()`.
    #[inline]
    #[track_caller]
    pub fn set_to(&mut self, b: usize, value: bool) {
        if value {
            self.set(b);
        } else {
            self.reset(b);
        }
    }

    /// Assign bit at position `b` to `value`, or return an error if `b` is out of range.
    pub fn try_set_to(&mut self, b: usize, value: bool) -> Result<()> {
        self.ensure_index(b)?;
        self.set_to(b, value);
        Ok(())
    }

    /// Clear bit at position `b` (set to 0).
    ///
    /// # Panics
    ///
    /// Panics if `b >= size()`.
    #[inline]
    #[track_caller]
    pub fn reset(&mut self, b: usize) {
        self.check_index(b);
        self.words[get_word_idx(b)] &= !(1 << get_bit_idx(b));
    }

    /// Toggle bit at position `b` (0 -> 1, 1 -> 0).
    ///
    /// # Panics
    ///
    /// Panics if `b >= size()`.
    #[inline]
    #[track_caller]
    pub fn flip(&mut self, b: usize) {
        self.check_index(b);
        self.words[get_word_idx(b)] ^= 1 << get_bit_idx(b);
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Set all bits to 1.
    pub fn set_all(&mut self) {
        self.words.fill(WORD_MAX);
        self.mask_tail();
    }

    /// Clear all bits to 0.
    pub fn reset_all(&mut self) {
        self.words.fill(0);
    }

    /// Toggle all bits.
    pub fn flip_all(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
        self.mask_tail();
    }

    // =========================================================================
    // Counting Operations
    // =========================================================================

    /// Returns true if at least one bit is set.
    #[inline]
    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    /// Returns true if no bit is set.
    #[inline]
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Returns true if every bit is set. An empty array counts as all set.
    pub fn all(&self) -> bool {
        self.count() == self.num_bits
    }

    /// Count number of set bits (population count).
    #[inline]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Count number of cleared bits.
    #[inline]
    pub fn count_zeros(&self) -> usize {
        self.num_bits - self.count()
    }

    // =========================================================================
    // Iteration and Conversion
    // =========================================================================

    /// Iterate over bits in index order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            ba: self,
            front: 0,
            back: self.num_bits,
        }
    }

    /// Get indices of all set bits, in ascending order.
    pub fn set_indices(&self) -> Vec<usize> {
        let mut idxs = Vec::with_capacity(self.count());
        for (word_idx, &word) in self.words.iter().enumerate() {
            let base = word_idx * BITS_PER_WORD;
            let mut w = word;
            while w != 0 {
                idxs.push(base + w.trailing_zeros() as usize);
                w &= w - 1;
            }
        }
        idxs
    }

    /// Convert to an integer where bit `i` of the result is bit `i` of the array.
    ///
    /// Returns [`BitArrayError::Overflow`] if a bit at index 64 or above is set.
    pub fn to_u64(&self) -> Result<u64> {
        if self.words.iter().skip(2).any(|&w| w != 0) {
            debug!("to_u64 rejected: set bits beyond index 63 (size {})", self.num_bits);
            return Err(BitArrayError::Overflow { bits: u64::BITS });
        }
        let lo = self.words.first().copied().unwrap_or(0) as u64;
        let hi = self.words.get(1).copied().unwrap_or(0) as u64;
        Ok(lo | (hi << BITS_PER_WORD))
    }

    // =========================================================================
    // Random Operations
    // =========================================================================

    /// Randomly shuffle all bits using Fisher-Yates algorithm.
    pub fn random_shuffle<R: Rng>(&mut self, rng: &mut R) {
        for i in (1..self.num_bits).rev() {
            let j = rng.gen_range(0..=i);
            let temp = self.get(i);
            self.set_to(i, self.get(j));
            self.set_to(j, temp);
        }
    }

    /// Randomly set exactly `num` bits to 1.
    ///
    /// Clears all bits, sets first `num` bits to 1, then shuffles.
    ///
    /// # Panics
    ///
    /// Panics if `num > size()`.
    pub fn random_set_num<R: Rng>(&mut self, rng: &mut R, num: usize) {
        assert!(
            num <= self.num_bits,
            "cannot set {} bits in an array of {} bits",
            num,
            self.num_bits
        );
        self.reset_all();
        self.set_range(0, num);
        self.random_shuffle(rng);
    }

    /// Randomly set approximately `pct * size()` bits to 1.
    ///
    /// `pct` should be in range [0.0, 1.0].
    pub fn random_set_pct<R: Rng>(&mut self, rng: &mut R, pct: f64) {
        debug_assert!((0.0..=1.0).contains(&pct));
        let num = (self.num_bits as f64 * pct) as usize;
        self.random_set_num(rng, num.min(self.num_bits));
    }

    // =========================================================================
    // Bitwise Operations
    // =========================================================================

    /// In-place bitwise AND with `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the arrays have different sizes.
    #[track_caller]
    pub fn bit_and_assign(&mut self, rhs: &BitArray) -> &mut Self {
        self.check_same_size(rhs);
        self.zip_words(rhs, |a, b| a & b);
        self
    }

    /// In-place bitwise OR with `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the arrays have different sizes.
    #[track_caller]
    pub fn bit_or_assign(&mut self, rhs: &BitArray) -> &mut Self {
        self.check_same_size(rhs);
        self.zip_words(rhs, |a, b| a | b);
        self
    }

    /// In-place bitwise XOR with `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the arrays have different sizes.
    #[track_caller]
    pub fn bit_xor_assign(&mut self, rhs: &BitArray) -> &mut Self {
        self.check_same_size(rhs);
        self.zip_words(rhs, |a, b| a ^ b);
        self
    }

    /// Checked [`bit_and_assign`](Self::bit_and_assign).
    pub fn try_bit_and_assign(&mut self, rhs: &BitArray) -> Result<&mut Self> {
        self.ensure_same_size(rhs)?;
        Ok(self.bit_and_assign(rhs))
    }

    /// Checked [`bit_or_assign`](Self::bit_or_assign).
    pub fn try_bit_or_assign(&mut self, rhs: &BitArray) -> Result<&mut Self> {
        self.ensure_same_size(rhs)?;
        Ok(self.bit_or_assign(rhs))
    }

    /// Checked [`bit_xor_assign`](Self::bit_xor_assign).
    pub fn try_bit_xor_assign(&mut self, rhs: &BitArray) -> Result<&mut Self> {
        self.ensure_same_size(rhs)?;
        Ok(self.bit_xor_assign(rhs))
    }

    // =========================================================================
    // Shift Operations
    // =========================================================================

    /// Logical shift toward higher indices: bit `i` moves to `i + n`.
    ///
    /// The size is unchanged. Bits pushed past the end are discarded and the
    /// low `n` bits become 0.
    pub fn shift_left_assign(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        if n >= self.num_bits {
            trace!("shift left by {} clears all {} bits", n, self.num_bits);
            self.reset_all();
            return self;
        }

        let word_shift = get_word_idx(n);
        let bit_shift = get_bit_idx(n);

        // Descending so every source word is read before it is overwritten
        for i in (0..self.words.len()).rev() {
            let mut word = 0;
            if i >= word_shift {
                word = self.words[i - word_shift] << bit_shift;
                if bit_shift != 0 && i > word_shift {
                    word |= self.words[i - word_shift - 1] >> (BITS_PER_WORD - bit_shift);
                }
            }
            self.words[i] = word;
        }

        self.mask_tail();
        self
    }

    /// Logical shift toward lower indices: bit `i` moves to `i - n`.
    ///
    /// The size is unchanged. Bits pushed below index 0 are discarded and the
    /// high `n` bits become 0.
    pub fn shift_right_assign(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        if n >= self.num_bits {
            trace!("shift right by {} clears all {} bits", n, self.num_bits);
            self.reset_all();
            return self;
        }

        let word_shift = get_word_idx(n);
        let bit_shift = get_bit_idx(n);
        let len = self.words.len();

        for i in 0..len {
            let src = i + word_shift;
            let mut word = 0;
            if src < len {
                word = self.words[src] >> bit_shift;
                if bit_shift != 0 && src + 1 < len {
                    word |= self.words[src + 1] << (BITS_PER_WORD - bit_shift);
                }
            }
            self.words[i] = word;
        }

        self
    }

    // =========================================================================
    // Information and Access
    // =========================================================================

    /// Get number of words in storage.
    #[inline]
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Get direct read-only access to word storage.
    ///
    /// Padding bits in the last word are always 0.
    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.words.capacity() * std::mem::size_of::<Word>()
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Zero the padding bits of the last word.
    #[inline]
    fn mask_tail(&mut self) {
        let valid_bits = get_bit_idx(self.num_bits);
        if valid_bits != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= bitmask(valid_bits);
            }
        }
    }

    /// Set bits [beg, end) to 1 a word at a time.
    fn set_range(&mut self, beg: usize, end: usize) {
        let mut b = beg;
        while b < end {
            let offset = get_bit_idx(b);
            let len = (BITS_PER_WORD - offset).min(end - b);
            self.words[get_word_idx(b)] |= bitmask(len) << offset;
            b += len;
        }
    }

    fn zip_words(&mut self, rhs: &BitArray, op: impl Fn(Word, Word) -> Word) {
        for (a, &b) in self.words.iter_mut().zip(&rhs.words) {
            *a = op(*a, b);
        }
    }

    #[inline]
    #[track_caller]
    fn check_index(&self, b: usize) {
        assert!(
            b < self.num_bits,
            "bit index {} out of bounds (length: {})",
            b,
            self.num_bits
        );
    }

    #[track_caller]
    fn check_same_size(&self, rhs: &BitArray) {
        assert_eq!(
            self.num_bits, rhs.num_bits,
            "BitArrays must have same size"
        );
    }

    fn ensure_index(&self, b: usize) -> Result<()> {
        if b < self.num_bits {
            Ok(())
        } else {
            debug!("rejected bit index {} (length: {})", b, self.num_bits);
            Err(BitArrayError::IndexOutOfBounds {
                index: b,
                length: self.num_bits,
            })
        }
    }

    fn ensure_same_size(&self, rhs: &BitArray) -> Result<()> {
        if self.num_bits == rhs.num_bits {
            Ok(())
        } else {
            debug!(
                "rejected bitwise operation on {} and {} bits",
                self.num_bits, rhs.num_bits
            );
            Err(BitArrayError::SizeMismatch {
                left: self.num_bits,
                right: rhs.num_bits,
            })
        }
    }
}

impl Clone for BitArray {
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            num_bits: self.num_bits,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.words.clone_from(&source.words);
        self.num_bits = source.num_bits;
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over the bits of a [`BitArray`] in index order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    ba: &'a BitArray,
    front: usize,
    back: usize,
}

impl Iterator for Iter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.front == self.back {
            return None;
        }
        let bit = self.ba.get(self.front);
        self.front += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<bool> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.ba.get(self.back))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a BitArray {
    type Item = bool;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<bool> for BitArray {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut ba = BitArray::default();
        ba.extend(iter);
        ba
    }
}

impl Extend<bool> for BitArray {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for bit in iter {
            self.push_back(bit);
        }
    }
}

// =============================================================================
// Indexing and Formatting
// =============================================================================

impl Index<usize> for BitArray {
    type Output = bool;

    fn index(&self, b: usize) -> &bool {
        if self.get(b) {
            &true
        } else {
            &false
        }
    }
}

impl fmt::Display for BitArray {
    /// Highest index first, index 0 is the rightmost character.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self
            .iter()
            .rev()
            .map(|bit| if bit { '1' } else { '0' })
            .collect();
        f.pad(&s)
    }
}

impl FromStr for BitArray {
    type Err = BitArrayError;

    /// Parse a pattern in the same order `Display` writes it.
    fn from_str(s: &str) -> Result<Self> {
        let n = s.chars().count();
        let mut ba = BitArray::new(n);
        for (position, character) in s.chars().enumerate() {
            match character {
                '0' => {}
                '1' => ba.set(n - 1 - position),
                _ => {
                    debug!("rejected bit pattern: {:?} at position {}", character, position);
                    return Err(BitArrayError::InvalidCharacter {
                        position,
                        character,
                    });
                }
            }
        }
        Ok(ba)
    }
}

// =============================================================================
// Bitwise Operators
// =============================================================================

impl BitAndAssign<&BitArray> for BitArray {
    #[track_caller]
    fn bitand_assign(&mut self, rhs: &BitArray) {
        self.bit_and_assign(rhs);
    }
}

impl BitOrAssign<&BitArray> for BitArray {
    #[track_caller]
    fn bitor_assign(&mut self, rhs: &BitArray) {
        self.bit_or_assign(rhs);
    }
}

impl BitXorAssign<&BitArray> for BitArray {
    #[track_caller]
    fn bitxor_assign(&mut self, rhs: &BitArray) {
        self.bit_xor_assign(rhs);
    }
}

impl BitAnd for &BitArray {
    type Output = BitArray;

    fn bitand(self, rhs: Self) -> BitArray {
        let mut result = self.clone();
        result &= rhs;
        result
    }
}

impl BitAnd for BitArray {
    type Output = BitArray;

    fn bitand(mut self, rhs: Self) -> BitArray {
        self &= &rhs;
        self
    }
}

impl BitOr for &BitArray {
    type Output = BitArray;

    fn bitor(self, rhs: Self) -> BitArray {
        let mut result = self.clone();
        result |= rhs;
        result
    }
}

impl BitOr for BitArray {
    type Output = BitArray;

    fn bitor(mut self, rhs: Self) -> BitArray {
        self |= &rhs;
        self
    }
}

impl BitXor for &BitArray {
    type Output = BitArray;

    fn bitxor(self, rhs: Self) -> BitArray {
        let mut result = self.clone();
        result ^= rhs;
        result
    }
}

impl BitXor for BitArray {
    type Output = BitArray;

    fn bitxor(mut self, rhs: Self) -> BitArray {
        self ^= &rhs;
        self
    }
}

impl Not for &BitArray {
    type Output = BitArray;

    fn not(self) -> BitArray {
        !self.clone()
    }
}

impl Not for BitArray {
    type Output = BitArray;

    fn not(mut self) -> BitArray {
        self.flip_all();
        self
    }
}

// =============================================================================
// Shift Operators
// =============================================================================

impl ShlAssign<usize> for BitArray {
    fn shl_assign(&mut self, n: usize) {
        self.shift_left_assign(n);
    }
}

impl ShrAssign<usize> for BitArray {
    fn shr_assign(&mut self, n: usize) {
        self.shift_right_assign(n);
    }
}

impl Shl<usize> for &BitArray {
    type Output = BitArray;

    fn shl(self, n: usize) -> BitArray {
        let mut result = self.clone();
        result <<= n;
        result
    }
}

impl Shr<usize> for &BitArray {
    type Output = BitArray;

    fn shr(self, n: usize) -> BitArray {
        let mut result = self.clone();
        result >>= n;
        result
    }
}

// =============================================================================
// Serde Support
// =============================================================================

/// Unvalidated wire form of a [`BitArray`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawBitArray {
    words: Vec<Word>,
    num_bits: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBitArray> for BitArray {
    type Error = BitArrayError;

    fn try_from(raw: RawBitArray) -> Result<Self> {
        let expected = words_for(raw.num_bits);
        if raw.words.len() != expected {
            return Err(BitArrayError::InvalidStorage(format!(
                "expected {} words for {} bits, got {}",
                expected,
                raw.num_bits,
                raw.words.len()
            )));
        }

        let valid_bits = get_bit_idx(raw.num_bits);
        if let Some(&last) = raw.words.last() {
            if valid_bits != 0 && last & !bitmask(valid_bits) != 0 {
                return Err(BitArrayError::InvalidStorage(format!(
                    "bits set beyond length {}",
                    raw.num_bits
                )));
            }
        }

        Ok(Self {
            words: raw.words,
            num_bits: raw.num_bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let ba = BitArray::new(1024);
        assert_eq!(ba.size(), 1024);
        assert_eq!(ba.num_words(), 32);
        assert_eq!(ba.count(), 0);
    }

    #[test]
    fn test_default_is_empty() {
        let ba = BitArray::default();
        assert_eq!(ba.size(), 0);
        assert!(ba.is_empty());
        assert_eq!(ba.num_words(), 0);
    }

    #[test]
    fn test_bitmask() {
        assert_eq!(bitmask(0), 0);
        assert_eq!(bitmask(1), 1);
        assert_eq!(bitmask(31), 0x7FFF_FFFF);
        assert_eq!(bitmask(32), WORD_MAX);
    }

    #[test]
    fn test_with_value_truncates() {
        let ba = BitArray::with_value(4, 0xFF);
        assert_eq!(ba.words(), &[0b1111]);
        assert_eq!(ba.count(), 4);
    }

    #[test]
    fn test_with_value_spans_words() {
        let ba = BitArray::with_value(100, u64::MAX);
        assert_eq!(ba.num_words(), 4);
        assert_eq!(ba.words(), &[WORD_MAX, WORD_MAX, 0, 0]);
        assert_eq!(ba.count(), 64);
    }

    #[test]
    fn test_set_get_bit() {
        let mut ba = BitArray::new(40);
        assert!(!ba.get(35));
        ba.set(35);
        assert!(ba.get(35));
        assert_eq!(ba.words()[1], 1 << 3);
        ba.reset(35);
        assert!(!ba.get(35));
    }

    #[test]
    fn test_flip() {
        let mut ba = BitArray::new(32);
        ba.flip(7);
        assert!(ba[7]);
        ba.flip(7);
        assert!(!ba[7]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds_panics() {
        let ba = BitArray::new(8);
        ba.get(8);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_set_in_padding_panics() {
        let mut ba = BitArray::new(5);
        ba.set(6);
    }

    #[test]
    fn test_flip_all_keeps_padding_clear() {
        let mut ba = BitArray::new(5);
        ba.flip_all();
        assert_eq!(ba.words(), &[0b11111]);
        assert!(ba.all());
    }

    #[test]
    fn test_set_all_keeps_padding_clear() {
        let mut ba = BitArray::new(33);
        ba.set_all();
        assert_eq!(ba.words(), &[WORD_MAX, 1]);
        assert_eq!(ba.count(), 33);
    }

    #[test]
    fn test_shrink_zeroes_storage() {
        let mut ba = BitArray::new(10);
        ba.set_all();
        ba.resize(3, false);
        assert_eq!(ba.words(), &[0b111]);
    }

    #[test]
    fn test_set_range_across_words() {
        let mut ba = BitArray::new(100);
        ba.set_range(30, 70);
        assert_eq!(ba.count(), 40);
        assert_eq!(ba.words()[0], 0b11 << 30);
        assert_eq!(ba.words()[1], WORD_MAX);
        assert_eq!(ba.words()[2], bitmask(6));
    }

    #[test]
    fn test_push_back_allocates_words() {
        let mut ba = BitArray::new(32);
        assert_eq!(ba.num_words(), 1);
        ba.push_back(true);
        assert_eq!(ba.num_words(), 2);
        assert!(ba[32]);
    }

    #[test]
    fn test_pop_back_releases_words() {
        let mut ba = BitArray::with_value(33, 1 << 32);
        assert_eq!(ba.pop_back(), Some(true));
        assert_eq!(ba.size(), 32);
        assert_eq!(ba.num_words(), 1);
    }

    #[test]
    fn test_shift_left_across_words() {
        let mut ba = BitArray::new(96);
        ba.set(0);
        ba.set(31);
        ba <<= 33;
        assert_eq!(ba.set_indices(), vec![33, 64]);
    }

    #[test]
    fn test_shift_left_drops_into_padding() {
        let mut ba = BitArray::new(40);
        ba.set(39);
        ba.set(38);
        ba <<= 1;
        assert_eq!(ba.set_indices(), vec![39]);
        assert_eq!(ba.words()[1], 1 << 7);
    }

    #[test]
    fn test_shift_right_across_words() {
        let mut ba = BitArray::new(96);
        ba.set(95);
        ba.set(40);
        ba >>= 40;
        assert_eq!(ba.set_indices(), vec![0, 55]);
    }

    #[test]
    fn test_shift_whole_words() {
        let mut ba = BitArray::new(128);
        ba.set(5);
        ba <<= 64;
        assert_eq!(ba.set_indices(), vec![69]);
        ba >>= 32;
        assert_eq!(ba.set_indices(), vec![37]);
    }

    #[test]
    fn test_to_u64() {
        let ba = BitArray::with_value(64, 0xDEAD_BEEF_0000_0001);
        assert_eq!(ba.to_u64(), Ok(0xDEAD_BEEF_0000_0001));

        let mut wide = BitArray::new(70);
        wide.set(69);
        assert_eq!(wide.to_u64(), Err(BitArrayError::Overflow { bits: 64 }));
    }

    #[test]
    fn test_iter_double_ended() {
        let ba = BitArray::with_value(4, 0b0110);
        let fwd: Vec<bool> = ba.iter().collect();
        assert_eq!(fwd, vec![false, true, true, false]);
        assert_eq!(ba.iter().len(), 4);
        assert_eq!(ba.iter().next_back(), Some(false));
    }

    #[test]
    fn test_display_padding() {
        let ba = BitArray::with_value(3, 0b101);
        assert_eq!(format!("{:>6}", ba), "   101");
    }

    #[test]
    fn test_clone_from_resizes_target() {
        let src = BitArray::with_value(5, 0b10101);
        let mut dst = BitArray::new(200);
        dst.set_all();
        dst.clone_from(&src);
        assert_eq!(dst, src);
        assert_eq!(dst.num_words(), 1);
    }

    #[test]
    fn test_memory_usage() {
        let ba = BitArray::new(1024);
        assert!(ba.memory_usage() >= 128); // At least 32 words * 4 bytes
    }
}
