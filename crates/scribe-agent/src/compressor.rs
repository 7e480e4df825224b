//! Context compressor: history summarization and recovery snapshots.
//!
//! Two operations:
//! - [`ContextCompressor::compress`] replaces older history with a model-written
//!   summary and keeps the last `keep_recent` messages verbatim.
//! - [`ContextCompressor::snapshot`] writes the whole conversation to disk and
//!   changes nothing.
//!
//! Both write `.context_summary_<stamp>.md` files that `scribe --recover`
//! accepts. Neither mutates its input: on any error the caller still holds the
//! original conversation.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scribe_core::types::Message;
use scribe_core::utils::{file_stamp, timestamp};
use scribe_providers::{LlmProvider, LlmRequestConfig};
use tracing::{debug, info};

use crate::context::{compressed_block, render_transcript, SUMMARY_INSTRUCTION};
use crate::error::CompressionError;
use crate::tokens::TokenEstimator;

const SNAPSHOT_PREFIX: &str = ".context_summary_";

/// Summary text used when there is no older history to summarize.
const NOTHING_TO_SUMMARIZE: &str =
    "No earlier history to summarize; the full conversation is kept verbatim below.";

/// Result of a history-reducing compression.
#[derive(Clone, Debug)]
pub struct CompressionOutcome {
    /// Replacement conversation: system, summary turn, recent suffix.
    pub messages: Vec<Message>,
    pub summary: String,
    /// Snapshot file written for this compression.
    pub path: PathBuf,
    pub tokens_before: usize,
    pub tokens_after: usize,
    /// `tokens_before - tokens_after`; may be zero or negative.
    pub tokens_saved: i64,
}

/// Result of a pure snapshot.
#[derive(Clone, Debug)]
pub struct SnapshotOutcome {
    pub path: PathBuf,
    pub message_count: usize,
}

pub struct ContextCompressor {
    provider: Arc<dyn LlmProvider>,
    model: String,
    request_config: LlmRequestConfig,
    estimator: TokenEstimator,
}

impl ContextCompressor {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, estimator: TokenEstimator) -> Self {
        Self {
            provider,
            model: model.into(),
            request_config: LlmRequestConfig::default(),
            estimator,
        }
    }

    pub fn with_request_config(mut self, request_config: LlmRequestConfig) -> Self {
        self.request_config = request_config;
        self
    }

    /// Summarize all but the last `keep_recent` non-system messages.
    ///
    /// `conversation` is the system-prefixed sequence. The result has length
    /// `2 + min(keep_recent, conversation.len() - 1)`. When nothing is older
    /// than the kept window, no model call is made.
    pub async fn compress(
        &self,
        conversation: &[Message],
        keep_recent: usize,
        snapshot_dir: &Path,
    ) -> Result<CompressionOutcome, CompressionError> {
        let (system, history) = split_system(conversation);
        let split_at = history.len().saturating_sub(keep_recent);
        let (older, recent) = history.split_at(split_at);

        let summary = if older.is_empty() {
            NOTHING_TO_SUMMARIZE.to_string()
        } else {
            self.summarize(older).await?
        };

        let mut messages = Vec::with_capacity(recent.len() + 2);
        if let Some(system) = system {
            messages.push(system.clone());
        }
        messages.push(Message::user(compressed_block(&summary)));
        messages.extend(reframe_orphan_results(recent));

        let path = write_snapshot(snapshot_dir, |out| {
            out.push_str("# Context Summary\n\n");
            push_header(out, &self.model);
            out.push_str(&format!("- Messages summarized: {}\n", older.len()));
            out.push_str(&format!("- Messages kept verbatim: {}\n\n", recent.len()));
            out.push_str("## Summary\n\n");
            out.push_str(&summary);
            out.push_str("\n\n## Recent Messages\n\n");
            push_messages(out, recent);
        })?;

        let tokens_before = self.estimator.estimate(conversation);
        let tokens_after = self.estimator.estimate(&messages);
        let tokens_saved = tokens_before as i64 - tokens_after as i64;

        info!(
            summarized = older.len(),
            kept = recent.len(),
            tokens_before = tokens_before,
            tokens_after = tokens_after,
            path = %path.display(),
            "context compressed"
        );

        Ok(CompressionOutcome {
            messages,
            summary,
            path,
            tokens_before,
            tokens_after,
            tokens_saved,
        })
    }

    /// Write every non-system message verbatim to a new snapshot file.
    pub fn snapshot(
        &self,
        conversation: &[Message],
        snapshot_dir: &Path,
    ) -> Result<SnapshotOutcome, CompressionError> {
        let (_, history) = split_system(conversation);
        let path = write_snapshot(snapshot_dir, |out| {
            out.push_str("# Context Backup\n\n");
            push_header(out, &self.model);
            out.push_str(&format!("- Messages: {}\n\n", history.len()));
            out.push_str("## Conversation\n\n");
            push_messages(out, history);
        })?;

        debug!(messages = history.len(), path = %path.display(), "snapshot written");
        Ok(SnapshotOutcome {
            path,
            message_count: history.len(),
        })
    }

    async fn summarize(&self, older: &[Message]) -> Result<String, CompressionError> {
        let request = [
            Message::system(SUMMARY_INSTRUCTION),
            Message::user(render_transcript(older)),
        ];
        let response = self
            .provider
            .chat(&request, None, &self.model, &self.request_config)
            .await?;

        let summary = response.content.unwrap_or_default().trim().to_string();
        if summary.is_empty() {
            return Err(CompressionError::EmptySummary);
        }
        Ok(summary)
    }
}

fn split_system(conversation: &[Message]) -> (Option<&Message>, &[Message]) {
    match conversation.split_first() {
        Some((first, rest)) if first.is_system() => (Some(first), rest),
        _ => (None, conversation),
    }
}

/// Tool results whose call was summarized away are kept as user turns, since
/// a `tool` message must follow the assistant turn that issued its id.
fn reframe_orphan_results(recent: &[Message]) -> Vec<Message> {
    let mut issued: HashSet<&str> = HashSet::new();
    recent
        .iter()
        .map(|msg| {
            for call in msg.tool_calls() {
                issued.insert(call.id.as_str());
            }
            match msg.tool_call_id() {
                Some(id) if !issued.contains(id) => {
                    Message::user(format!("[tool result {id}]\n{}", msg.text()))
                }
                _ => msg.clone(),
            }
        })
        .collect()
}

fn push_header(out: &mut String, model: &str) {
    out.push_str(&format!("- Generated: {}\n", timestamp()));
    out.push_str(&format!("- Model: {model}\n"));
}

fn push_messages(out: &mut String, messages: &[Message]) {
    for (i, msg) in messages.iter().enumerate() {
        out.push_str(&format!("### {}. {}", i + 1, msg.role()));
        if let Some(id) = msg.tool_call_id() {
            out.push_str(&format!(" ({id})"));
        }
        out.push_str("\n\n");
        if !msg.text().is_empty() {
            out.push_str(msg.text());
            out.push_str("\n\n");
        }
        for call in msg.tool_calls() {
            out.push_str(&format!(
                "- tool call `{}` ({}): `{}`\n",
                call.function.name, call.id, call.function.arguments
            ));
        }
        if !msg.tool_calls().is_empty() {
            out.push('\n');
        }
    }
}

/// Render and write a snapshot under a fresh timestamped name.
///
/// Names never collide: if the millisecond stamp is taken, a numeric suffix
/// is added.
fn write_snapshot(
    dir: &Path,
    render: impl FnOnce(&mut String),
) -> Result<PathBuf, CompressionError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| CompressionError::Snapshot { path, source }
    };

    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut body = String::new();
    render(&mut body);

    let stamp = file_stamp();
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{SNAPSHOT_PREFIX}{stamp}.md")
        } else {
            format!("{SNAPSHOT_PREFIX}{stamp}_{attempt}.md")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(body.as_bytes()).map_err(io_err(&path))?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(io_err(&path)(e)),
        }
    }
}
