use log::trace;

use crate::cache::{AccessResult, Operation, Outcome};
use crate::line::CacheLine;
use crate::memory::{BackingStore, Word};

/// One associative bucket of `ways` lines with LRU replacement.
#[derive(Debug, Clone)]
pub struct Set {
    index: usize,
    lines: Vec<CacheLine>,
}

impl Set {
    pub fn new(index: usize, ways: usize, words_per_line: usize) -> Self {
        // Lowest index starts out least recently used, so cold misses fill ways in order.
        let lines = (0..ways)
            .map(|way| CacheLine::new(words_per_line, (ways - 1 - way) as u64))
            .collect();
        Set { index, lines }
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn probe(&self, tag: u32) -> Option<usize> {
        self.lines.iter().position(|line| line.holds(tag))
    }

    /// Way with the largest recency counter, lowest index on ties.
    pub fn select_victim(&self) -> usize {
        let mut victim = 0;
        for (way, line) in self.lines.iter().enumerate() {
            if line.recency > self.lines[victim].recency {
                victim = way;
            }
        }
        victim
    }

    pub fn touch(&mut self, way: usize) {
        for (i, line) in self.lines.iter_mut().enumerate() {
            if i == way {
                line.recency = 0;
            } else {
                line.recency = line.recency.saturating_add(1);
            }
        }
    }

    pub fn access(
        &mut self,
        memory: &mut BackingStore,
        tag: u32,
        offset: usize,
        op: Operation,
        value: Word,
    ) -> AccessResult {
        if let Some(way) = self.probe(tag) {
            let line = &mut self.lines[way];
            let (value, dirty) = match op {
                Operation::Write => {
                    line.write_word(offset, value);
                    (value, line.is_dirty())
                }
                Operation::Read => line.read_word(offset),
            };
            self.touch(way);
            return AccessResult { value, outcome: Outcome::Hit, dirty };
        }

        let victim = self.select_victim();
        let evicted = self.lines[victim].snapshot();
        if let (true, Some(old_tag)) = (evicted.dirty, evicted.tag) {
            trace!("set {}: writing back tag {:#x} from way {}", self.index, old_tag, victim);
            memory.write_block(old_tag, self.index, &evicted.words);
        }

        let block = memory.read_block(tag, self.index);
        trace!("set {}: filling way {} with tag {:#x}", self.index, victim, tag);
        let line = &mut self.lines[victim];
        line.install(block, tag);
        let value = match op {
            Operation::Write => {
                line.write_word(offset, value);
                value
            }
            Operation::Read => line.read_word(offset).0,
        };
        self.touch(victim);

        AccessResult { value, outcome: Outcome::Miss, dirty: evicted.dirty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn setup() -> (Set, BackingStore) {
        let config = CacheConfig::default();
        (Set::new(0, config.ways, config.words_per_line), BackingStore::new(&config))
    }

    fn assert_total_order(set: &Set) {
        let mut recency: Vec<u64> = set.lines().iter().map(|line| line.recency()).collect();
        recency.sort_unstable();
        recency.dedup();
        assert_eq!(recency.len(), set.lines().len());
    }

    #[test]
    fn fresh_set_evicts_way_zero_first() {
        let (set, _) = setup();
        assert_eq!(set.select_victim(), 0);
        assert_total_order(&set);
    }

    #[test]
    fn touch_keeps_recency_distinct() {
        let (mut set, _) = setup();
        for way in [3, 0, 7, 3, 5] {
            set.touch(way);
            assert_eq!(set.lines()[way].recency(), 0);
            assert_total_order(&set);
        }
    }

    #[test]
    fn cold_fills_use_ways_in_order() {
        let (mut set, mut memory) = setup();
        for tag in 0..8 {
            let result = set.access(&mut memory, tag, 0, Operation::Read, 0);
            assert_eq!(result.outcome, Outcome::Miss);
            assert_eq!(set.probe(tag), Some(tag as usize));
        }
        assert_eq!(set.select_victim(), 0);
    }

    #[test]
    fn write_hit_reports_dirty_line() {
        let (mut set, mut memory) = setup();
        set.access(&mut memory, 4, 1, Operation::Read, 0);
        let result = set.access(&mut memory, 4, 1, Operation::Write, 0x5A);
        assert_eq!(result, AccessResult { value: 0x5A, outcome: Outcome::Hit, dirty: true });
    }

    #[test]
    fn miss_reports_evicted_dirty_flag_not_new_one() {
        let (mut set, mut memory) = setup();
        for tag in 0..8 {
            set.access(&mut memory, tag, 2, Operation::Write, tag + 0x10);
        }
        let result = set.access(&mut memory, 8, 2, Operation::Read, 0);
        assert_eq!(result.outcome, Outcome::Miss);
        assert!(result.dirty);
        assert_eq!(set.probe(0), None);
        assert_eq!(memory.read_block(0, 0), vec![0, 0, 0x10, 0]);

        let line = &set.lines()[set.probe(8).unwrap()];
        assert!(!line.is_dirty());
    }

    #[test]
    fn clean_eviction_leaves_memory_untouched() {
        let (mut set, mut memory) = setup();
        memory.write_block(0, 0, &[9, 9, 9, 9]);
        set.access(&mut memory, 0, 0, Operation::Read, 0);
        for tag in 1..9 {
            set.access(&mut memory, tag, 0, Operation::Read, 0);
        }
        assert_eq!(set.probe(0), None);
        assert_eq!(memory.read_block(0, 0), vec![9, 9, 9, 9]);
    }

    #[test]
    fn refill_reads_backing_store() {
        let (mut set, mut memory) = setup();
        memory.write_block(3, 0, &[0xA, 0xB, 0xC, 0xD]);
        let result = set.access(&mut memory, 3, 2, Operation::Read, 0);
        assert_eq!(result.value, 0xC);
        assert!(!result.dirty);
    }
}
