use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::utils::log2_exact;

/// Number of sets in the default topology.
pub const DEFAULT_SETS: usize = 16;
/// Lines per set in the default topology.
pub const DEFAULT_WAYS: usize = 8;
/// Words per cache line in the default topology.
pub const DEFAULT_WORDS_PER_LINE: usize = 4;
/// Width of a raw address in bits.
pub const DEFAULT_ADDRESS_BITS: u32 = 16;

/// Cache topology. Fixed once a `Simulation` has been built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub sets: usize,
    pub ways: usize,
    pub words_per_line: usize,
    pub address_bits: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            sets: DEFAULT_SETS,
            ways: DEFAULT_WAYS,
            words_per_line: DEFAULT_WORDS_PER_LINE,
            address_bits: DEFAULT_ADDRESS_BITS,
        }
    }
}

impl CacheConfig {
    pub fn new(sets: usize, ways: usize, words_per_line: usize, address_bits: u32) -> Result<Self> {
        let config = CacheConfig { sets, ways, words_per_line, address_bits };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let Some(set_bits) = log2_exact(self.sets) else {
            bail!("number of sets must be a non-zero power of two, got {}", self.sets);
        };
        let Some(offset_bits) = log2_exact(self.words_per_line) else {
            bail!("words per line must be a non-zero power of two, got {}", self.words_per_line);
        };
        if self.ways == 0 {
            bail!("associativity cannot be zero");
        }
        if self.address_bits > 32 {
            bail!("address width of {} bits exceeds 32", self.address_bits);
        }
        if set_bits + offset_bits > self.address_bits {
            bail!(
                "{} set bits and {} offset bits do not fit in a {}-bit address",
                set_bits,
                offset_bits,
                self.address_bits
            );
        }
        Ok(())
    }

    pub fn set_bits(&self) -> u32 {
        self.sets.trailing_zeros()
    }

    pub fn offset_bits(&self) -> u32 {
        self.words_per_line.trailing_zeros()
    }

    pub fn tag_bits(&self) -> u32 {
        self.address_bits - self.set_bits() - self.offset_bits()
    }
}
