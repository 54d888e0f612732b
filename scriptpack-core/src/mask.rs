//! 任意精度位集合
//!
//! 模块的 power id、weight 与请求中的分类掩码都用它表示，
//! 模块总数不受机器整数宽度限制。

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor};

const WORD_BITS: usize = 64;

/// 任意宽度的位集合，按数值比较大小
///
/// 内部以小端 `u64` 字存储，末尾不保留全零字，因此相等的数值有唯一表示。
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitMask {
    words: Vec<u64>,
}

impl BitMask {
    /// 空集合（数值 0）
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// 仅包含第 `index` 位的集合（数值 `2^index`）
    pub fn bit(index: usize) -> Self {
        let mut mask = Self::new();
        mask.set(index);
        mask
    }

    /// 从十进制字符串解析
    ///
    /// 只接受 ASCII 数字；空串返回 `None`。
    pub fn from_decimal(text: &str) -> Option<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut words: Vec<u64> = Vec::new();
        for digit in text.bytes().map(|b| u64::from(b - b'0')) {
            let mut carry = digit as u128;
            for word in words.iter_mut() {
                let value = (*word as u128) * 10 + carry;
                *word = value as u64;
                carry = value >> WORD_BITS;
            }
            if carry != 0 {
                words.push(carry as u64);
            }
        }
        let mut mask = Self { words };
        mask.trim();
        Some(mask)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| word & (1 << (index % WORD_BITS)) != 0)
    }

    pub fn set(&mut self, index: usize) {
        let word = index / WORD_BITS;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (index % WORD_BITS);
    }

    pub fn intersects(&self, other: &BitMask) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// 已置位的下标，升序
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| i * WORD_BITS + bit)
        })
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    fn zip_with(&self, other: &BitMask, op: impl Fn(u64, u64) -> u64) -> BitMask {
        let len = self.words.len().max(other.words.len());
        let mut words = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.words.get(i).copied().unwrap_or(0);
            let b = other.words.get(i).copied().unwrap_or(0);
            words.push(op(a, b));
        }
        let mut mask = BitMask { words };
        mask.trim();
        mask
    }
}

impl Ord for BitMask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words
            .len()
            .cmp(&other.words.len())
            .then_with(|| self.words.iter().rev().cmp(other.words.iter().rev()))
    }
}

impl PartialOrd for BitMask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl BitOr for &BitMask {
    type Output = BitMask;

    fn bitor(self, rhs: &BitMask) -> BitMask {
        self.zip_with(rhs, |a, b| a | b)
    }
}

impl BitAnd for &BitMask {
    type Output = BitMask;

    fn bitand(self, rhs: &BitMask) -> BitMask {
        self.zip_with(rhs, |a, b| a & b)
    }
}

impl BitXor for &BitMask {
    type Output = BitMask;

    fn bitxor(self, rhs: &BitMask) -> BitMask {
        self.zip_with(rhs, |a, b| a ^ b)
    }
}

impl BitOrAssign<&BitMask> for BitMask {
    fn bitor_assign(&mut self, rhs: &BitMask) {
        if self.words.len() < rhs.words.len() {
            self.words.resize(rhs.words.len(), 0);
        }
        for (word, other) in self.words.iter_mut().zip(&rhs.words) {
            *word |= other;
        }
    }
}

/// 十六进制输出，如 `0x5`
impl fmt::Display for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.words.split_last() {
            None => write!(f, "0x0"),
            Some((high, rest)) => {
                write!(f, "0x{:x}", high)?;
                for word in rest.iter().rev() {
                    write!(f, "{:016x}", word)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}
