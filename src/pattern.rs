//! Source-buffer fill patterns.
//!
//! The pattern only determines the bytes handed to the copy path; copy timing
//! is content-independent, so `zero` is the default. `random` exists to rule
//! out any compression or dedup effect in the page cache path, `ramp` gives
//! byte-addressable content for round-trip verification, `alt` maximizes bit
//! toggling on the memory bus.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

/// How the reusable source buffer is filled before a write run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPattern {
    /// All zeroes.
    Zero,
    /// Seeded xoshiro stream; reproducible given the same seed.
    Random,
    /// Bytes `0, 1, 2, ... 255, 0, 1, ...`.
    Ramp,
    /// Alternating `0xAA` / `0x55`.
    Alt,
}

impl FillPattern {
    /// Parse a CLI pattern string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zero" => Some(FillPattern::Zero),
            "random" => Some(FillPattern::Random),
            "ramp" => Some(FillPattern::Ramp),
            "alt" => Some(FillPattern::Alt),
            _ => None,
        }
    }

    /// Name as accepted by [`FillPattern::parse`].
    pub fn name(&self) -> &'static str {
        match self {
            FillPattern::Zero => "zero",
            FillPattern::Random => "random",
            FillPattern::Ramp => "ramp",
            FillPattern::Alt => "alt",
        }
    }

    /// Fill `buf` in place. `seed` only matters for [`FillPattern::Random`].
    pub fn fill(&self, buf: &mut [u8], seed: u64) {
        match self {
            FillPattern::Zero => buf.fill(0),
            FillPattern::Random => Xoshiro256PlusPlus::seed_from_u64(seed).fill_bytes(buf),
            FillPattern::Ramp => {
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = (i % 256) as u8;
                }
            }
            FillPattern::Alt => {
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = if i % 2 == 0 { 0xAA } else { 0x55 };
                }
            }
        }
    }
}
