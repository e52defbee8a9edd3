use crate::memory::Word;

/// Contents of a line at the moment it is evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    pub words: Vec<Word>,
    pub tag: Option<u32>,
    pub dirty: bool,
}

#[derive(Debug, Clone)]
pub struct CacheLine {
    words: Vec<Word>,
    /// `None` until the line is first filled.
    tag: Option<u32>,
    dirty: bool,
    /// 0 is most recently used.
    pub(crate) recency: u64,
}

impl CacheLine {
    pub fn new(words_per_line: usize, recency: u64) -> Self {
        CacheLine {
            words: vec![0; words_per_line],
            tag: None,
            dirty: false,
            recency,
        }
    }

    pub fn tag(&self) -> Option<u32> {
        self.tag
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn recency(&self) -> u64 {
        self.recency
    }

    pub fn holds(&self, tag: u32) -> bool {
        self.tag == Some(tag)
    }

    pub fn read_word(&self, offset: usize) -> (Word, bool) {
        assert!(offset < self.words.len(), "word offset {} out of range", offset);
        (self.words[offset], self.dirty)
    }

    pub fn write_word(&mut self, offset: usize, value: Word) {
        assert!(offset < self.words.len(), "word offset {} out of range", offset);
        self.words[offset] = value;
        self.dirty = true;
    }

    /// Refills the line from memory. The fresh copy is clean.
    pub fn install(&mut self, words: Vec<Word>, tag: u32) {
        assert_eq!(words.len(), self.words.len(), "refill block length does not match line size");
        self.words = words;
        self.tag = Some(tag);
        self.dirty = false;
    }

    pub fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            words: self.words.clone(),
            tag: self.tag,
            dirty: self.dirty,
        }
    }
}
