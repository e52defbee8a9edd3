use std::collections::HashMap;

use crate::config::CacheConfig;
use crate::decoder::AddressDecoder;

pub type Word = u32;

/// Flat word-addressable main memory behind the cache.
///
/// Blocks are stored only once written back; everything else reads as zero.
#[derive(Debug, Clone)]
pub struct BackingStore {
    blocks: HashMap<usize, Vec<Word>>,
    words_per_line: usize,
    decoder: AddressDecoder,
}

impl BackingStore {
    pub fn new(config: &CacheConfig) -> Self {
        BackingStore {
            blocks: HashMap::new(),
            words_per_line: config.words_per_line,
            decoder: AddressDecoder::new(config),
        }
    }

    pub fn read_block(&self, tag: u32, set_index: usize) -> Vec<Word> {
        let base = self.decoder.block_address(tag, set_index);
        match self.blocks.get(&base) {
            Some(block) => block.clone(),
            None => vec![0; self.words_per_line],
        }
    }

    pub fn write_block(&mut self, tag: u32, set_index: usize, block: &[Word]) {
        assert_eq!(block.len(), self.words_per_line, "block length does not match line size");
        let base = self.decoder.block_address(tag, set_index);
        self.blocks.insert(base, block.to_vec());
    }

    pub fn read_word(&self, address: usize) -> Word {
        let offset = address % self.words_per_line;
        self.blocks
            .get(&(address - offset))
            .map_or(0, |block| block[offset])
    }

    /// Number of blocks that have been written back at least once.
    pub fn resident_blocks(&self) -> usize {
        self.blocks.len()
    }
}
