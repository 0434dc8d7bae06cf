//! Token-aware text chunking for embedding and retrieval.
//!
//! Splits extracted document text into overlapping, token-bounded
//! passages. Splitting is separator-aware: paragraph breaks are preferred
//! over line breaks, line breaks over spaces, and a character-level cut is
//! the last resort for unsplittable runs. A pure function of input and
//! config; identical input always yields the identical passage sequence.

use distill_core::Passage;
use distill_openai::TokenCounter;
use std::sync::Arc;

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum size of each chunk in tokens.
    pub chunk_size: usize,
    /// Tokens shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Split separators in priority order; the empty string means a
    /// character-level cut.
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

impl ChunkConfig {
    /// Create config from chunking settings.
    pub fn from_config(config: &distill_config::ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            ..Default::default()
        }
    }
}

/// Splits document text into passages.
pub struct Chunker {
    config: ChunkConfig,
    tokens: Arc<TokenCounter>,
}

impl Chunker {
    /// Create a new chunker with the given configuration.
    pub fn new(tokens: Arc<TokenCounter>, config: ChunkConfig) -> Self {
        Self { config, tokens }
    }

    /// Split `text` into ordered passages covering the whole input.
    ///
    /// Concatenating passage bodies minus each passage's `overlap_len`
    /// prefix reconstructs `text` exactly. Whitespace-only input yields
    /// no passages.
    pub fn chunk_text(&self, text: &str) -> Vec<Passage> {
        if text.trim().is_empty() {
            return vec![];
        }

        let total_tokens = self.tokens.count(text);
        if total_tokens <= self.config.chunk_size {
            return vec![Passage::new(0, text, total_tokens)];
        }

        let fragments = self.split_fragments(text, &self.config.separators);
        self.merge_fragments(fragments)
    }

    /// Recursively split on the first separator that divides the text,
    /// recursing into oversized pieces with the remaining separators.
    fn split_fragments(&self, text: &str, separators: &[String]) -> Vec<String> {
        if self.tokens.count(text) <= self.config.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, rest)) = separators.split_first() else {
            return self.tokens.split_at_tokens(text, self.config.chunk_size);
        };

        if separator.is_empty() {
            return self.tokens.split_at_tokens(text, self.config.chunk_size);
        }

        let parts: Vec<&str> = text.split_inclusive(separator.as_str()).collect();
        if parts.len() <= 1 {
            return self.split_fragments(text, rest);
        }

        let mut fragments = Vec::new();
        for part in parts {
            if self.tokens.count(part) > self.config.chunk_size {
                fragments.extend(self.split_fragments(part, rest));
            } else {
                fragments.push(part.to_string());
            }
        }
        fragments
    }

    /// Greedily pack fragments into token-bounded passages, carrying the
    /// configured token overlap from each passage into the next.
    fn merge_fragments(&self, fragments: Vec<String>) -> Vec<Passage> {
        let mut passages: Vec<Passage> = Vec::new();
        let mut body = String::new();
        let mut overlap_len = 0usize;

        for fragment in fragments {
            if body.is_empty() {
                body.push_str(&fragment);
                continue;
            }

            let mut candidate = body.clone();
            candidate.push_str(&fragment);

            if self.tokens.count(&candidate) > self.config.chunk_size {
                let token_count = self.tokens.count(&body);
                passages.push(
                    Passage::new(passages.len(), body.clone(), token_count)
                        .with_overlap_len(overlap_len),
                );

                let mut next = String::new();
                let mut next_overlap = 0usize;
                if self.config.chunk_overlap > 0 {
                    let tail = self.tokens.tail(&body, self.config.chunk_overlap);
                    let mut with_overlap = tail.clone();
                    with_overlap.push_str(&fragment);
                    // The overlap is skipped when it would push this chunk
                    // past the token budget.
                    if self.tokens.count(&with_overlap) <= self.config.chunk_size {
                        next_overlap = tail.len();
                        next = tail;
                    }
                }
                next.push_str(&fragment);
                body = next;
                overlap_len = next_overlap;
            } else {
                body = candidate;
            }
        }

        if !body.is_empty() {
            let token_count = self.tokens.count(&body);
            passages
                .push(Passage::new(passages.len(), body, token_count).with_overlap_len(overlap_len));
        }

        passages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Arc<TokenCounter> {
        Arc::new(TokenCounter::cl100k().unwrap())
    }

    fn small_config() -> ChunkConfig {
        ChunkConfig {
            chunk_size: 20,
            chunk_overlap: 5,
            ..Default::default()
        }
    }

    /// Rebuild the original text from passages by dropping each passage's
    /// declared overlap prefix.
    fn reconstruct(passages: &[Passage]) -> String {
        let mut text = String::new();
        for passage in passages {
            text.push_str(&passage.text[passage.overlap_len..]);
        }
        text
    }

    #[test]
    fn test_empty_text_yields_no_passages() {
        let chunker = Chunker::new(counter(), ChunkConfig::default());
        assert!(chunker.chunk_text("").is_empty());
        assert!(chunker.chunk_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk_no_overlap() {
        let chunker = Chunker::new(counter(), ChunkConfig::default());
        let text = "This is a small piece of text.";

        let passages = chunker.chunk_text(text);

        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, text);
        assert_eq!(passages[0].chunk_index, 0);
        assert_eq!(passages[0].overlap_len, 0);
        assert!(passages[0].token_count > 0);
    }

    #[test]
    fn test_long_text_round_trips() {
        let chunker = Chunker::new(counter(), small_config());
        let text = "The first paragraph talks about storage engines.\n\n\
                    The second paragraph covers query planning in databases.\n\n\
                    The third paragraph describes write-ahead logging.\n\n\
                    The fourth paragraph explains compaction strategies in detail.";

        let passages = chunker.chunk_text(text);

        assert!(passages.len() > 1, "expected multiple chunks");
        assert_eq!(reconstruct(&passages), text);
    }

    #[test]
    fn test_token_budget_respected() {
        let tokens = counter();
        let chunker = Chunker::new(tokens.clone(), small_config());
        let text = "one two three four five six seven eight nine ten. ".repeat(20);

        let passages = chunker.chunk_text(&text);

        for passage in &passages {
            assert!(
                passage.token_count <= 20,
                "chunk {} has {} tokens",
                passage.chunk_index,
                passage.token_count
            );
            assert_eq!(passage.token_count, tokens.count(&passage.text));
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let chunker = Chunker::new(counter(), small_config());
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa \
                    lambda mu nu xi omicron pi rho sigma tau upsilon phi chi psi omega "
            .repeat(4);

        let passages = chunker.chunk_text(&text);
        assert!(passages.len() > 1);

        for pair in passages.windows(2) {
            let overlap_len = pair[1].overlap_len;
            if overlap_len == 0 {
                continue;
            }
            let shared = &pair[1].text[..overlap_len];
            assert!(
                pair[0].text.ends_with(shared),
                "overlap region must be the previous passage's suffix"
            );
        }
        assert_eq!(reconstruct(&passages), text);
    }

    #[test]
    fn test_unsplittable_run_is_hard_cut() {
        let chunker = Chunker::new(counter(), small_config());
        // No paragraph breaks, line breaks, or spaces anywhere.
        let text = "abcdefghijklmnopqrstuvwxyz0123456789".repeat(30);

        let passages = chunker.chunk_text(&text);

        assert!(passages.len() > 1);
        assert_eq!(reconstruct(&passages), text);
    }

    #[test]
    fn test_deterministic() {
        let chunker = Chunker::new(counter(), small_config());
        let text = "Deterministic chunking matters for stable point identity. ".repeat(15);

        let first = chunker.chunk_text(&text);
        let second = chunker.chunk_text(&text);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.overlap_len, b.overlap_len);
        }
    }

    #[test]
    fn test_indices_are_sequential() {
        let chunker = Chunker::new(counter(), small_config());
        let text = "word ".repeat(200);

        let passages = chunker.chunk_text(&text);
        for (i, passage) in passages.iter().enumerate() {
            assert_eq!(passage.chunk_index, i);
        }
    }

    #[test]
    fn test_config_from_settings() {
        let settings = distill_config::ChunkingConfig {
            chunk_size: 512,
            chunk_overlap: 64,
        };
        let config = ChunkConfig::from_config(&settings);
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.chunk_overlap, 64);
        assert_eq!(config.separators.len(), 4);
    }
}
