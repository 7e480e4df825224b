//! Token estimation for the context budget.
//!
//! Two tiers: a BPE tokenizer (`tiktoken-rs`) when one can be loaded for the
//! model, otherwise `total_chars / 4`. Only message text is counted; roles,
//! ids and tool-call payloads are not. The number drives a threshold
//! comparison, so it is advisory rather than exact.

use std::sync::Arc;

use scribe_core::types::Message;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::error::FailureKind;

/// Characters per token assumed by the fallback.
const CHARS_PER_TOKEN: usize = 4;

/// Estimates the token footprint of a message sequence.
#[derive(Clone)]
pub struct TokenEstimator {
    bpe: Option<Arc<CoreBPE>>,
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("tokenizer", &self.is_tokenizer_backed())
            .finish()
    }
}

impl TokenEstimator {
    /// Load the encoding for `model`, falling back to `cl100k_base` for
    /// models tiktoken doesn't know (GLM, DeepSeek), and to character
    /// counting if neither loads.
    pub fn for_model(model: &str) -> Self {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .or_else(|_| tiktoken_rs::cl100k_base());

        match bpe {
            Ok(bpe) => {
                debug!(model = model, "loaded BPE tokenizer");
                Self {
                    bpe: Some(Arc::new(bpe)),
                }
            }
            Err(e) => {
                warn!(
                    model = model,
                    error = %e,
                    failure = ?FailureKind::Estimation,
                    "tokenizer unavailable, using character-count estimate"
                );
                Self::char_fallback()
            }
        }
    }

    /// An estimator that only ever uses the `chars / 4` approximation.
    pub fn char_fallback() -> Self {
        Self { bpe: None }
    }

    pub fn is_tokenizer_backed(&self) -> bool {
        self.bpe.is_some()
    }

    /// Estimate tokens for a message sequence (sum over message texts).
    pub fn estimate(&self, messages: &[Message]) -> usize {
        match &self.bpe {
            Some(bpe) => messages
                .iter()
                .map(|m| bpe.encode_ordinary(m.text()).len())
                .sum(),
            None => char_estimate(messages),
        }
    }

    /// Estimate tokens for a single piece of text.
    pub fn estimate_text(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.chars().count() / CHARS_PER_TOKEN,
        }
    }
}

/// The fallback: total character count over all message texts, divided by four.
pub fn char_estimate(messages: &[Message]) -> usize {
    let total_chars: usize = messages.iter().map(|m| m.text().chars().count()).sum();
    total_chars / CHARS_PER_TOKEN
}
