use log::debug;
use serde::Serialize;

use crate::config::CacheConfig;
use crate::decoder::AddressDecoder;
use crate::memory::{BackingStore, Word};
use crate::set::Set;
use crate::utils::calculate_miss_rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    /// Trace op codes: zero reads, anything else writes.
    pub fn from_code(code: u32) -> Self {
        if code == 0 { Operation::Read } else { Operation::Write }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Miss = 0,
    Hit = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessResult {
    pub value: Word,
    pub outcome: Outcome,
    /// On a hit, the serving line's dirty bit. On a miss, the dirty bit of the line that was evicted.
    pub dirty: bool,
}

impl AccessResult {
    pub fn is_hit(&self) -> bool {
        self.outcome == Outcome::Hit
    }

    pub fn wrote_back(&self) -> bool {
        self.outcome == Outcome::Miss && self.dirty
    }
}

#[derive(Debug)]
pub struct Cache {
    decoder: AddressDecoder,
    sets: Vec<Set>,
}

impl Cache {
    pub fn new(config: &CacheConfig) -> Self {
        let sets = (0..config.sets)
            .map(|index| Set::new(index, config.ways, config.words_per_line))
            .collect();
        Cache { decoder: AddressDecoder::new(config), sets }
    }

    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    pub fn access(
        &mut self,
        memory: &mut BackingStore,
        address: u32,
        op: Operation,
        data: Word,
    ) -> AccessResult {
        let decoded = self.decoder.decode(address);
        assert!(decoded.set_index < self.sets.len(), "set index {} out of range", decoded.set_index);
        self.sets[decoded.set_index].access(memory, decoded.tag, decoded.offset, op, data)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimStats {
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    pub writebacks: u64,
}

impl SimStats {
    pub fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    pub fn miss_rate(&self) -> f64 {
        calculate_miss_rate(self.misses, self.accesses())
    }

    fn record(&mut self, op: Operation, result: &AccessResult) {
        match op {
            Operation::Read => self.reads += 1,
            Operation::Write => self.writes += 1,
        }
        if result.is_hit() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        if result.wrote_back() {
            self.writebacks += 1;
        }
    }
}

/// Owns the cache and the memory behind it. Each instance is an independent simulation.
#[derive(Debug)]
pub struct Simulation {
    config: CacheConfig,
    cache: Cache,
    memory: BackingStore,
    stats: SimStats,
}

impl Simulation {
    pub fn new(config: CacheConfig) -> Self {
        Simulation {
            cache: Cache::new(&config),
            memory: BackingStore::new(&config),
            config,
            stats: SimStats::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn memory(&self) -> &BackingStore {
        &self.memory
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn access(&mut self, address: u32, op: Operation, data: Word) -> AccessResult {
        let result = self.cache.access(&mut self.memory, address, op, data);
        debug!(
            "{:?} {:#06x} data={:#x} -> {:?} value={:#x} dirty={}",
            op, address, data, result.outcome, result.value, result.dirty
        );
        self.stats.record(op, &result);
        result
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_codes() {
        assert_eq!(Operation::from_code(0), Operation::Read);
        assert_eq!(Operation::from_code(0xFF), Operation::Write);
        assert_eq!(Operation::from_code(1), Operation::Write);
    }

    #[test]
    fn sets_are_independent() {
        let mut sim = Simulation::default();
        // Same tag, sets 0 and 1.
        sim.access(0x0000, Operation::Write, 1);
        sim.access(0x0004, Operation::Write, 2);
        assert_eq!(sim.access(0x0000, Operation::Read, 0).value, 1);
        assert_eq!(sim.access(0x0004, Operation::Read, 0).value, 2);
        assert_eq!(sim.cache().sets()[0].probe(0), Some(0));
        assert_eq!(sim.cache().sets()[1].probe(0), Some(0));
    }

    #[test]
    fn stats_follow_outcomes() {
        let mut sim = Simulation::default();
        sim.access(0x0000, Operation::Write, 0xAB);
        sim.access(0x0000, Operation::Read, 0);
        for n in 1..=8u32 {
            sim.access(n << 6, Operation::Read, 0);
        }
        let stats = sim.stats();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.reads, 9);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 9);
        assert_eq!(stats.writebacks, 1);
        assert_eq!(stats.miss_rate(), 0.9);
    }

    #[test]
    fn words_within_a_line_share_a_fill() {
        let mut sim = Simulation::default();
        assert!(!sim.access(0x0100, Operation::Read, 0).is_hit());
        for offset in 1..4 {
            assert!(sim.access(0x0100 + offset, Operation::Read, 0).is_hit());
        }
    }
}
