//! Sliding-window character splitting.
//!
//! Each window holds at most `chunk_size` characters and ends at the coarsest boundary
//! (paragraph, line, sentence, word) found in its second half, or at a hard cut when the
//! text has none. The next window starts at a boundary inside the last `chunk_overlap` to
//! `2 * chunk_overlap` characters of the previous one, so neighbours always share at least
//! `chunk_overlap` characters.

use super::{Chunk, ChunkingConfig};
use tracing::debug;

/// Boundaries from coarsest to finest, with the number of separator characters that stay
/// at the end of the left-hand window.
const SEPARATORS: &[(&str, usize)] = &[("\n\n", 0), ("\n", 0), (". ", 1), (" ", 0)];

/// Splits text into overlapping, size-bounded chunks.
#[derive(Debug, Clone, Default)]
pub struct WindowChunker {
    config: ChunkingConfig,
}

impl WindowChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split `text` into ordered chunks. Blank input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.trim().chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            if chars.len() - start <= self.config.chunk_size {
                chunks.push(Chunk::new(collect(&chars[start..]), chunks.len()));
                break;
            }

            let end = self.window_end(&chars, start);
            chunks.push(Chunk::new(collect(&chars[start..end]), chunks.len()));
            start = self.next_start(&chars, start, end);
        }

        debug!(
            "Split {} characters into {} chunks",
            chars.len(),
            chunks.len()
        );
        chunks
    }

    /// End of the window starting at `start`. Always past `start + chunk_overlap`.
    fn window_end(&self, chars: &[char], start: usize) -> usize {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let limit = start + size;
        let lower = start + (size / 2).max(overlap + 1);

        for &(sep, kept) in SEPARATORS {
            let sep: Vec<char> = sep.chars().collect();
            let Some(pos) = rfind(chars, &sep, lower.saturating_sub(kept), limit - kept) else {
                continue;
            };
            let end = trim_end(chars, start, pos + kept);
            if end > start + overlap {
                return end;
            }
        }

        limit
    }

    /// Start of the window after `[start, end)`, at most `end - chunk_overlap`.
    fn next_start(&self, chars: &[char], start: usize, end: usize) -> usize {
        let overlap = self.config.chunk_overlap;
        let latest = end - overlap;
        let coarse_floor = end.saturating_sub(2 * overlap).max(start + 1);

        for (i, &(sep, _)) in SEPARATORS.iter().enumerate() {
            let sep: Vec<char> = sep.chars().collect();
            if latest < sep.len() {
                continue;
            }
            // Word boundaries may sit anywhere after `start`.
            let floor = if i == SEPARATORS.len() - 1 {
                start + 1
            } else {
                coarse_floor
            };
            let Some(pos) = rfind(chars, &sep, floor.saturating_sub(sep.len()), latest - sep.len())
            else {
                continue;
            };
            let next = skip_whitespace(chars, pos + sep.len(), latest);
            if next > start && next <= latest && !chars[next].is_whitespace() {
                return next;
            }
        }

        latest
    }
}

/// Last position `p` in `lo..=hi` where `sep` occurs.
fn rfind(chars: &[char], sep: &[char], lo: usize, hi: usize) -> Option<usize> {
    if lo > hi {
        return None;
    }
    (lo..=hi)
        .rev()
        .find(|&p| p + sep.len() <= chars.len() && chars[p..p + sep.len()] == *sep)
}

fn trim_end(chars: &[char], start: usize, mut end: usize) -> usize {
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    end
}

fn skip_whitespace(chars: &[char], mut pos: usize, limit: usize) -> usize {
    while pos < limit && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: &[&str] = &[
        "video", "transcript", "question", "answer", "context", "rust", "memory", "index",
        "search", "vector", "model", "chunk", "overlap", "window", "speaker", "topic",
    ];

    /// Deterministic text of about `chars` characters made of space-separated words.
    fn words_text(chars: usize) -> String {
        let mut text = String::new();
        let mut i = 0;
        while text.len() < chars {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(WORDS[(i * 7 + 3) % WORDS.len()]);
            i += 1;
        }
        text.truncate(chars);
        text.trim_end().to_string()
    }

    /// Longest suffix of `a` that is also a prefix of `b`.
    fn shared_overlap(a: &str, b: &str) -> usize {
        let max = a.len().min(b.len());
        (1..=max)
            .rev()
            .find(|&k| a.ends_with(&b[..k]))
            .unwrap_or(0)
    }

    fn assert_bounded_and_overlapping(chunks: &[Chunk], size: usize, overlap: usize) {
        for chunk in chunks {
            assert!(chunk.char_len() <= size, "chunk of {}", chunk.char_len());
        }
        for pair in chunks.windows(2) {
            let shared = shared_overlap(&pair[0].text, &pair[1].text);
            assert!(shared >= overlap, "overlap of only {} characters", shared);
        }
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
        }
    }

    #[test]
    fn test_empty_input() {
        let chunker = WindowChunker::default();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = WindowChunker::default();
        let chunks = chunker.split("  a short transcript  ");
        assert_eq!(chunks, vec![Chunk::new("a short transcript".to_string(), 0)]);
    }

    #[test]
    fn test_3000_chars_gives_overlapping_chunks() {
        let chunker = WindowChunker::default();
        let chunks = chunker.split(&words_text(3000));

        assert!(chunks.len() >= 3, "got {} chunks", chunks.len());
        assert_bounded_and_overlapping(&chunks, 1200, 200);
    }

    #[test]
    fn test_long_sentences_keep_overlap() {
        let chunker = WindowChunker::default();
        let text = (0..5)
            .map(|_| words_text(700))
            .collect::<Vec<_>>()
            .join(". ");
        let chunks = chunker.split(&text);

        assert!(chunks.len() >= 4, "got {} chunks", chunks.len());
        assert_bounded_and_overlapping(&chunks, 1200, 200);
        // Windows still end on sentence boundaries where one is in reach.
        assert!(chunks[0].text.ends_with('.'));
    }

    #[test]
    fn test_run_on_sentence_keeps_overlap() {
        let chunker = WindowChunker::default();
        let text = format!(
            "{}. {}. {}.",
            words_text(480),
            words_text(1680),
            words_text(480)
        );
        let chunks = chunker.split(&text);

        assert!(chunks.len() >= 3, "got {} chunks", chunks.len());
        assert_bounded_and_overlapping(&chunks, 1200, 200);
    }

    #[test]
    fn test_every_word_is_covered() {
        let chunker = WindowChunker::default();
        let text = words_text(5000);
        let chunks = chunker.split(&text);

        let first_words: Vec<&str> = text.split(' ').take(3).collect();
        assert!(chunks[0].text.starts_with(&first_words.join(" ")));
        let last_word = text.split(' ').last().unwrap();
        assert!(chunks.last().unwrap().text.ends_with(last_word));
    }

    #[test]
    fn test_deterministic() {
        let chunker = WindowChunker::default();
        let text = words_text(4321);
        assert_eq!(chunker.split(&text), chunker.split(&text));
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let chunker = WindowChunker::default();
        let text = "x".repeat(2500);
        let chunks = chunker.split(&text);

        let lens: Vec<usize> = chunks.iter().map(Chunk::char_len).collect();
        assert_eq!(lens, vec![1200, 1200, 500]);
        assert_bounded_and_overlapping(&chunks, 1200, 200);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = WindowChunker::new(ChunkingConfig::new(60, 20).unwrap());
        let text = "First paragraph is here.\n\nSecond paragraph follows.\n\nThird one closes it.";
        let chunks = chunker.split(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].text,
            "First paragraph is here.\n\nSecond paragraph follows."
        );
        assert_eq!(chunks[1].text, "Second paragraph follows.\n\nThird one closes it.");
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let chunker = WindowChunker::new(ChunkingConfig::new(20, 5).unwrap());
        let text = "çğıöşü ".repeat(10);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 20);
        }
    }
}
