//! Overlapping character-window chunker.
//!
//! Text is cut into windows of at most `chunk_size` characters. Inside each
//! window the cut point is searched from the back, preferring a paragraph
//! break, then a line break, then a sentence end, then any whitespace, and
//! only then a hard cut at the window edge. The next window starts `overlap`
//! characters before the cut, nudged forward to a word start when one exists.
//!
//! Every chunk keeps its `[start_char, end_char)` span so the original text
//! can be rebuilt exactly by dropping the overlapped prefix of each chunk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub content: String,
    /// Character offset (not byte) of the first character in the source text.
    pub start_char: usize,
    /// Exclusive character offset of the end of the chunk.
    pub end_char: usize,
}

impl TextChunk {
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), ChunkerError> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::ZeroChunkSize);
        }
        if self.overlap >= self.chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Boundary kinds in order of preference.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
}

const BOUNDARIES: [Boundary; 4] = [
    Boundary::Paragraph,
    Boundary::Line,
    Boundary::Sentence,
    Boundary::Word,
];

impl Boundary {
    /// True when a cut directly before `chars[pos]` ends on this boundary.
    fn matches_at(self, chars: &[char], pos: usize) -> bool {
        if pos == 0 {
            return false;
        }
        let prev = chars[pos - 1];
        match self {
            Boundary::Paragraph => pos >= 2 && prev == '\n' && chars[pos - 2] == '\n',
            Boundary::Line => prev == '\n',
            Boundary::Sentence => {
                pos >= 2 && prev.is_whitespace() && matches!(chars[pos - 2], '.' | '!' | '?')
            }
            Boundary::Word => prev.is_whitespace(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let ChunkerConfig {
            chunk_size,
            overlap,
        } = self.config;

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            if total - start <= chunk_size {
                chunks.push(make_chunk(&chars, chunks.len(), start, total));
                break;
            }

            let limit = start + chunk_size;
            // Cuts before this point would make tiny chunks or stall progress.
            let floor = start + overlap.max(chunk_size / 2);
            let end = find_cut(&chars, floor, limit).unwrap_or(limit);
            chunks.push(make_chunk(&chars, chunks.len(), start, end));

            start = next_start(&chars, end, overlap);
        }

        chunks
    }
}

/// Last position in `(floor, limit]` that ends on the strongest boundary.
fn find_cut(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    BOUNDARIES.iter().find_map(|boundary| {
        (floor + 1..=limit)
            .rev()
            .find(|&pos| boundary.matches_at(chars, pos))
    })
}

/// Start of the window following a cut at `end`: `overlap` characters back,
/// moved forward to the first word start inside the overlap if there is one.
fn next_start(chars: &[char], end: usize, overlap: usize) -> usize {
    let nominal = end - overlap;
    if overlap == 0 || Boundary::Word.matches_at(chars, nominal) {
        return nominal;
    }
    (nominal + 1..end)
        .find(|&pos| Boundary::Word.matches_at(chars, pos) && !chars[pos].is_whitespace())
        .unwrap_or(nominal)
}

fn make_chunk(chars: &[char], index: usize, start: usize, end: usize) -> TextChunk {
    TextChunk {
        index,
        content: chars[start..end].iter().collect(),
        start_char: start,
        end_char: end,
    }
}

/// Rebuilds the source text by dropping each chunk's overlapped prefix.
pub fn reassemble(chunks: &[TextChunk]) -> String {
    let mut out = String::new();
    let mut covered: usize = 0;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start_char);
        out.extend(chunk.content.chars().skip(skip));
        covered = covered.max(chunk.end_char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(ChunkerConfig {
            chunk_size,
            overlap,
        })
        .unwrap()
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..12 {
            for s in 0..6 {
                text.push_str(&format!(
                    "Paragraph {} sentence {} talks about lifecycle hooks and borrow rules. ",
                    p, s
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunker(1000, 200).chunk("A short note.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "A short note.");
        assert_eq!(chunks[0].start_char, 0);
    }

    #[test]
    fn test_empty_text_single_empty_chunk() {
        let chunks = chunker(10, 2).chunk("");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "");
    }

    #[test]
    fn test_exact_size_is_single_chunk() {
        let text = "x".repeat(50);
        let chunks = chunker(50, 10).chunk(&text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_reassembly_reproduces_text() {
        let text = sample_text();
        for (size, overlap) in [(1000, 200), (300, 50), (64, 16), (17, 5), (5, 4), (3, 0)] {
            let chunks = chunker(size, overlap).chunk(&text);
            assert_eq!(reassemble(&chunks), text, "size={} overlap={}", size, overlap);
        }
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = sample_text();
        let chunks = chunker(300, 60).chunk(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.content.chars().count() <= 300);
            assert_eq!(c.content.chars().count(), c.char_len());
        }
    }

    #[test]
    fn test_overlap_never_exceeds_request() {
        let text = sample_text();
        let chunks = chunker(300, 60).chunk(&text);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_char < pair[0].end_char);
            let shared = pair[0].end_char - pair[1].start_char;
            assert!(shared <= 60, "shared {}", shared);
            assert!(shared > 0);
        }
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let para = "word ".repeat(30); // 150 chars
        let text = format!("{}\n\n{}\n\n{}", para, para, para);
        let chunks = chunker(400, 50).chunk(&text);
        assert!(chunks[0].content.ends_with("\n\n"));
    }

    #[test]
    fn test_does_not_split_words_when_spaces_exist() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa ".repeat(20);
        let chunks = chunker(100, 20).chunk(&text);
        for c in &chunks[..chunks.len() - 1] {
            assert!(c.content.ends_with(' '), "chunk cut mid-word: {:?}", c.content);
        }
        for c in &chunks[1..] {
            assert!(!c.content.starts_with(' '));
        }
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let text = "a".repeat(250);
        let chunks = chunker(100, 20).chunk(&text);
        assert_eq!(chunks[0].content.len(), 100);
        assert_eq!(chunks[1].start_char, 80);
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "Grüße aus Köln — 東京の天気は晴れです。 ".repeat(40);
        let chunks = chunker(90, 15).chunk(&text);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 90));
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_deterministic() {
        let text = sample_text();
        let a = chunker(250, 40).chunk(&text);
        let b = chunker(250, 40).chunk(&text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_1800_chars_needs_several_chunks() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        assert_eq!(text.len(), 1800);
        let chunks = chunker(1000, 200).chunk(&text);
        assert!(chunks.len() >= 2);
        // First cut lands on a sentence end.
        assert!(chunks[0].content.ends_with("dog. "));
        assert_eq!(reassemble(&chunks), text);
    }

    /// xorshift64; keeps generated cases reproducible without a rand dependency.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, n: usize) -> usize {
            (self.next() % n as u64) as usize
        }
    }

    #[test]
    fn test_generated_texts_hold_chunk_properties() {
        let alphabet: Vec<char> = "ab cd\n\n.!?\té東ü x".chars().collect();
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);

        for case in 0..2000 {
            let len = rng.below(400);
            let text: String = (0..len).map(|_| alphabet[rng.below(alphabet.len())]).collect();
            let size = 1 + rng.below(60);
            let overlap = rng.below(size);
            let chunks = chunker(size, overlap).chunk(&text);

            assert_eq!(reassemble(&chunks), text, "case {} size={} overlap={}", case, size, overlap);
            assert!(chunks.iter().all(|c| c.char_len() <= size), "case {}", case);
            for pair in chunks.windows(2) {
                assert!(pair[0].end_char.saturating_sub(pair[1].start_char) <= overlap, "case {}", case);
            }
            if text.chars().count() <= size {
                assert_eq!(chunks.len(), 1, "case {}", case);
                assert_eq!(chunks[0].content, text);
            }
        }
    }

    #[test]
    fn test_invalid_config() {
        assert_eq!(
            TextChunker::new(ChunkerConfig {
                chunk_size: 0,
                overlap: 0
            })
            .err(),
            Some(ChunkerError::ZeroChunkSize)
        );
        assert!(matches!(
            TextChunker::new(ChunkerConfig {
                chunk_size: 10,
                overlap: 10
            }),
            Err(ChunkerError::OverlapTooLarge { .. })
        ));
    }
}
