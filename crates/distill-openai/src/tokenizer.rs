//! Token counting on the provider's tokenizer.

use crate::error::{OpenAiError, OpenAiResult};
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Measures text length in model tokens.
///
/// Wraps the `cl100k_base` vocabulary used by the embedding models, so
/// chunk budgets line up with what the provider actually counts. Construct
/// once and share behind an `Arc`; the vocabulary load is not free.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Load the `cl100k_base` tokenizer.
    pub fn cl100k() -> OpenAiResult<Self> {
        let bpe = cl100k_base().map_err(|e| OpenAiError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// The decoded last `n` tokens of `text`, used as chunk overlap.
    ///
    /// BPE tokens can split multi-byte characters; when a suffix does not
    /// decode cleanly, the leading token is dropped until it does.
    pub fn tail(&self, text: &str, n: usize) -> String {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.is_empty() || n == 0 {
            return String::new();
        }

        let start = tokens.len().saturating_sub(n);
        for offset in start..tokens.len() {
            if let Ok(decoded) = self.bpe.decode(tokens[offset..].to_vec()) {
                return decoded;
            }
        }
        String::new()
    }

    /// Cut `text` into consecutive pieces of at most `max_tokens` tokens,
    /// the last resort for runs with no usable separator.
    ///
    /// Pieces are extended past the budget only when a cut would land
    /// inside a multi-byte character; concatenating the pieces always
    /// reconstructs `text` exactly.
    pub fn split_at_tokens(&self, text: &str, max_tokens: usize) -> Vec<String> {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.is_empty() || max_tokens == 0 {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            };
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            let mut end = (start + max_tokens).min(tokens.len());
            loop {
                match self.bpe.decode(tokens[start..end].to_vec()) {
                    Ok(decoded) => {
                        pieces.push(decoded);
                        break;
                    }
                    Err(_) if end < tokens.len() => end += 1,
                    Err(_) => {
                        // Trailing tokens that never decode cleanly cannot
                        // happen for tokens produced by encode_ordinary.
                        pieces.push(String::new());
                        break;
                    }
                }
            }
            start = end;
        }
        pieces
    }
}
