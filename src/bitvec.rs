/*
 * Filename: /src/bitvec.rs
 * Project: rvhdl
 * Created Date: 2021-09-12, 10:02:17
 * Author: valerino <xoanino@gmail.com>
 * Copyright (c) 2021 valerino
 *
 * MIT License
 *
 * Copyright (c) 2021 valerino
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of
 * this software and associated documentation files (the "Software"), to deal in
 * the Software without restriction, including without limitation the rights to
 * use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies
 * of the Software, and to permit persons to whom the Software is furnished to do
 * so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use byteorder::{ByteOrder, LittleEndian};
use num::BigUint;
use std::cmp::Ordering;
use std::fmt;

/// number of bits per backing word.
pub const WORD_BITS: u32 = 32;

/**
 * fixed-width unsigned bit vector, the simulator's only runtime data type.
 *
 * bits are stored little-endian in an array of 32-bit words, unused high bits
 * of the top word are always kept zeroed so that equality and comparison work
 * on the raw word array.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    width: u32,
    words: Vec<u32>,
}

/**
 * number of words needed to hold `width` bits.
 */
fn num_words(width: u32) -> usize {
    ((width + WORD_BITS - 1) / WORD_BITS) as usize
}

impl BitVector {
    /**
     * all-zeros vector of the given width.
     */
    pub fn new(width: u32) -> BitVector {
        BitVector {
            width,
            words: vec![0; num_words(width)],
        }
    }

    /**
     * all-ones vector of the given width.
     */
    pub fn ones(width: u32) -> BitVector {
        let mut v = BitVector {
            width,
            words: vec![!0u32; num_words(width)],
        };
        v.mask_top();
        v
    }

    /**
     * build from an u64, truncated to the given width.
     */
    pub fn from_u64(value: u64, width: u32) -> BitVector {
        let mut v = BitVector::new(width);
        let n = v.words.len();
        if n > 0 {
            v.words[0] = value as u32;
        }
        if n > 1 {
            v.words[1] = (value >> 32) as u32;
        }
        v.mask_top();
        v
    }

    /**
     * build from a packed little-endian byte stream, excess trailing bits are
     * ignored, missing bytes read as zero.
     */
    pub fn from_le_bytes(bytes: &[u8], width: u32) -> BitVector {
        let mut v = BitVector::new(width);
        for (i, w) in v.words.iter_mut().enumerate() {
            let off = i * 4;
            if off >= bytes.len() {
                break;
            }
            let end = std::cmp::min(off + 4, bytes.len());
            let mut buf = [0u8; 4];
            buf[..end - off].copy_from_slice(&bytes[off..end]);
            *w = LittleEndian::read_u32(&buf);
        }
        v.mask_top();
        v
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /**
     * low 64 bits.
     */
    pub fn to_u64(&self) -> u64 {
        let mut v = 0u64;
        if !self.words.is_empty() {
            v |= self.words[0] as u64;
        }
        if self.words.len() > 1 {
            v |= (self.words[1] as u64) << 32;
        }
        v
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /**
     * the packed little-endian byte image, `ceil(width / 8)` bytes.
     */
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let n = ((self.width + 7) / 8) as usize;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let w = self.words[i / 4];
            out.push((w >> ((i % 4) * 8)) as u8);
        }
        out
    }

    pub fn get_bit(&self, i: u32) -> bool {
        debug_assert!(i < self.width);
        (self.words[(i / WORD_BITS) as usize] >> (i % WORD_BITS)) & 1 != 0
    }

    pub fn set_bit(&mut self, i: u32, b: bool) {
        debug_assert!(i < self.width);
        let w = &mut self.words[(i / WORD_BITS) as usize];
        if b {
            *w |= 1 << (i % WORD_BITS);
        } else {
            *w &= !(1 << (i % WORD_BITS));
        }
    }

    /// the most significant (sign) bit.
    pub fn sign_bit(&self) -> bool {
        if self.width == 0 {
            return false;
        }
        self.get_bit(self.width - 1)
    }

    /**
     * read `length` bits starting at `offset` into a new vector.
     */
    pub fn read_range(&self, offset: u32, length: u32) -> BitVector {
        debug_assert!(offset + length <= self.width);
        let mut out = BitVector::new(length);
        out.copy_slice(0, self, offset, length);
        out
    }

    /**
     * write all of `src` at `offset`.
     */
    pub fn write_range(&mut self, offset: u32, src: &BitVector) {
        let w = src.width;
        self.copy_slice(offset, src, 0, w);
    }

    /**
     * copy `length` bits from `src` starting at `src_offset` into this vector
     * at `dst_offset`.
     */
    pub fn copy_slice(&mut self, dst_offset: u32, src: &BitVector, src_offset: u32, length: u32) {
        debug_assert!(dst_offset + length <= self.width);
        debug_assert!(src_offset + length <= src.width);
        // word-aligned fast path
        if dst_offset % WORD_BITS == 0 && src_offset % WORD_BITS == 0 && length % WORD_BITS == 0 {
            let d = (dst_offset / WORD_BITS) as usize;
            let s = (src_offset / WORD_BITS) as usize;
            let n = (length / WORD_BITS) as usize;
            self.words[d..d + n].copy_from_slice(&src.words[s..s + n]);
            return;
        }
        for i in 0..length {
            let b = src.get_bit(src_offset + i);
            self.set_bit(dst_offset + i, b);
        }
    }

    /**
     * zero extension to a larger width (or truncation to a smaller one).
     */
    pub fn zero_extend(&self, width: u32) -> BitVector {
        let mut out = BitVector::new(width);
        let n = std::cmp::min(self.width, width);
        out.copy_slice(0, self, 0, n);
        out
    }

    /**
     * sign extension to a larger width (or truncation to a smaller one).
     */
    pub fn sign_extend(&self, width: u32) -> BitVector {
        let mut out = self.zero_extend(width);
        if width > self.width && self.sign_bit() {
            for i in self.width..width {
                out.set_bit(i, true);
            }
        }
        out
    }

    /**
     * unsigned comparison.
     */
    pub fn cmp_u(&self, rhs: &BitVector) -> Ordering {
        debug_assert_eq!(self.width, rhs.width);
        for i in (0..self.words.len()).rev() {
            match self.words[i].cmp(&rhs.words[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /**
     * signed (two's complement) comparison.
     */
    pub fn cmp_s(&self, rhs: &BitVector) -> Ordering {
        match (self.sign_bit(), rhs.sign_bit()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // same sign, two's complement ordering matches the unsigned one
            _ => self.cmp_u(rhs),
        }
    }

    pub fn and(&self, rhs: &BitVector) -> BitVector {
        self.zip_words(rhs, |a, b| a & b)
    }

    pub fn or(&self, rhs: &BitVector) -> BitVector {
        self.zip_words(rhs, |a, b| a | b)
    }

    pub fn xor(&self, rhs: &BitVector) -> BitVector {
        self.zip_words(rhs, |a, b| a ^ b)
    }

    pub fn not(&self) -> BitVector {
        let mut out = BitVector {
            width: self.width,
            words: self.words.iter().map(|w| !w).collect(),
        };
        out.mask_top();
        out
    }

    fn zip_words(&self, rhs: &BitVector, f: fn(u32, u32) -> u32) -> BitVector {
        debug_assert_eq!(self.width, rhs.width);
        BitVector {
            width: self.width,
            words: self
                .words
                .iter()
                .zip(rhs.words.iter())
                .map(|(a, b)| f(*a, *b))
                .collect(),
        }
    }

    /// and-reduce over all bits.
    pub fn reduce_and(&self) -> bool {
        *self == BitVector::ones(self.width)
    }

    /// or-reduce over all bits.
    pub fn reduce_or(&self) -> bool {
        !self.is_zero()
    }

    /// xor-reduce (parity) over all bits.
    pub fn reduce_xor(&self) -> bool {
        let ones: u32 = self.words.iter().map(|w| w.count_ones()).sum();
        ones & 1 != 0
    }

    /**
     * logical shift left by `amount`, bits falling off the top are lost.
     */
    pub fn shl(&self, amount: u32) -> BitVector {
        let mut out = BitVector::new(self.width);
        if amount < self.width {
            out.copy_slice(amount, self, 0, self.width - amount);
        }
        out
    }

    /**
     * logical shift right by `amount`, filling with zeros.
     */
    pub fn shr(&self, amount: u32) -> BitVector {
        let mut out = BitVector::new(self.width);
        if amount < self.width {
            out.copy_slice(0, self, amount, self.width - amount);
        }
        out
    }

    /**
     * arithmetic shift right by `amount`, filling with the sign bit.
     */
    pub fn sra(&self, amount: u32) -> BitVector {
        let mut out = if self.sign_bit() {
            BitVector::ones(self.width)
        } else {
            BitVector::new(self.width)
        };
        if amount < self.width {
            out.copy_slice(0, self, amount, self.width - amount);
        }
        out
    }

    /**
     * wrapping addition, both operands and the result share this width.
     */
    pub fn add(&self, rhs: &BitVector) -> BitVector {
        debug_assert_eq!(self.width, rhs.width);
        let mut out = BitVector::new(self.width);
        let mut carry = 0u64;
        for i in 0..self.words.len() {
            let sum = self.words[i] as u64 + rhs.words[i] as u64 + carry;
            out.words[i] = sum as u32;
            carry = sum >> 32;
        }
        out.mask_top();
        out
    }

    /**
     * wrapping subtraction.
     */
    pub fn sub(&self, rhs: &BitVector) -> BitVector {
        self.add(&rhs.neg())
    }

    /**
     * two's complement negation.
     */
    pub fn neg(&self) -> BitVector {
        let one = BitVector::from_u64(1, self.width);
        self.not().add(&one)
    }

    /**
     * wrapping multiplication.
     */
    pub fn mul(&self, rhs: &BitVector) -> BitVector {
        debug_assert_eq!(self.width, rhs.width);
        let p = self.to_biguint() * rhs.to_biguint();
        BitVector::from_biguint(&p, self.width)
    }

    /**
     * unsigned division, division by zero yields all ones.
     */
    pub fn div(&self, rhs: &BitVector) -> BitVector {
        debug_assert_eq!(self.width, rhs.width);
        if rhs.is_zero() {
            return BitVector::ones(self.width);
        }
        let q = self.to_biguint() / rhs.to_biguint();
        BitVector::from_biguint(&q, self.width)
    }

    /**
     * unsigned modulo, modulo by zero yields the dividend.
     */
    pub fn rem(&self, rhs: &BitVector) -> BitVector {
        debug_assert_eq!(self.width, rhs.width);
        if rhs.is_zero() {
            return self.clone();
        }
        let r = self.to_biguint() % rhs.to_biguint();
        BitVector::from_biguint(&r, self.width)
    }

    /**
     * signed division truncating toward zero.
     */
    pub fn div_s(&self, rhs: &BitVector) -> BitVector {
        let (a, an) = self.magnitude();
        let (b, bn) = rhs.magnitude();
        let q = a.div(&b);
        if an != bn {
            q.neg()
        } else {
            q
        }
    }

    /**
     * signed modulo, the result carries the dividend's sign.
     */
    pub fn rem_s(&self, rhs: &BitVector) -> BitVector {
        let (a, an) = self.magnitude();
        let (b, _) = rhs.magnitude();
        let r = a.rem(&b);
        if an {
            r.neg()
        } else {
            r
        }
    }

    fn magnitude(&self) -> (BitVector, bool) {
        if self.sign_bit() {
            (self.neg(), true)
        } else {
            (self.clone(), false)
        }
    }

    fn to_biguint(&self) -> BigUint {
        BigUint::from_slice(&self.words)
    }

    fn from_biguint(v: &BigUint, width: u32) -> BitVector {
        let digits = v.to_u32_digits();
        let mut out = BitVector::new(width);
        for i in 0..out.words.len() {
            if i < digits.len() {
                out.words[i] = digits[i];
            }
        }
        out.mask_top();
        out
    }

    /// zero the unused bits of the top word.
    fn mask_top(&mut self) {
        let rem = self.width % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u32 << rem) - 1;
            }
        }
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        let mut skip = true;
        for w in self.words.iter().rev() {
            if skip && self.words.len() > 1 && *w == 0 {
                continue;
            }
            if skip {
                write!(f, "{:x}", w)?;
                skip = false;
            } else {
                write!(f, "{:08x}", w)?;
            }
        }
        if skip {
            write!(f, "0")?;
        }
        Ok(())
    }
}

impl fmt::Binary for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", if self.get_bit(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}
