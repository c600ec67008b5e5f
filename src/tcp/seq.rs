//! TCP sequence numbers live in a 32-bit space that wraps; all arithmetic
//! is modulo 2^32 (RFC 793 section 3.3). Absolute positions in a stream are
//! 64-bit and never wrap; `wrap`/`unwrap` convert between the two, with a
//! checkpoint disambiguating which 2^32 block an absolute position sits in.

use std::ops::{Add, Sub};

/// A sequence number in TCP's wrapped 32-bit space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqNo(u32);

const BASE: u64 = 1 << 32;
const MASK_LOW_32: u64 = 0xFFFF_FFFF;
const MASK_HIGH_32: u64 = 0xFFFF_FFFF_0000_0000;

impl SeqNo {
    pub fn new(raw: u32) -> Self {
        SeqNo(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// Wrap an absolute position around `zero`.
    pub fn wrap(n: u64, zero: SeqNo) -> SeqNo {
        zero + n as u32
    }

    /// Recover the absolute position that wraps to `self` and is closest to
    /// `checkpoint`; ties break toward the smaller value.
    pub fn unwrap(self, zero: SeqNo, checkpoint: u64) -> u64 {
        let low = u64::from(self - zero);
        let c_low = checkpoint & MASK_LOW_32;
        let candidate = (checkpoint & MASK_HIGH_32) | low;

        if candidate >= BASE && low > c_low && low - c_low > BASE / 2 {
            return candidate - BASE;
        }
        if candidate < MASK_HIGH_32 && c_low > low && c_low - low > BASE / 2 {
            return candidate + BASE;
        }
        candidate
    }
}

impl Add<u32> for SeqNo {
    type Output = SeqNo;

    fn add(self, rhs: u32) -> SeqNo {
        SeqNo(self.0.wrapping_add(rhs))
    }
}

impl Sub for SeqNo {
    type Output = u32;

    fn sub(self, rhs: SeqNo) -> u32 {
        self.0.wrapping_sub(rhs.0)
    }
}
