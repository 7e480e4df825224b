//! Agent loop: the LLM ↔ tool-calling main loop with a token budget.
//!
//! Each iteration, in order:
//! 1. honour a pending interrupt (snapshot, stop)
//! 2. estimate tokens; compress history when over the threshold
//! 3. write a backup snapshot every `backup_interval` iterations
//! 4. call the model with the tool schema attached
//! 5. either finish (no tool calls) or run every tool call in order
//!
//! The conversation held by the caller never contains the system prompt;
//! it is prepended for every model call and every compression.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scribe_core::config::AgentConfig;
use scribe_core::types::{Message, ToolCall};
use scribe_core::utils::truncate_string;
use scribe_providers::{LlmProvider, LlmRequestConfig};
use tracing::{debug, error, info, warn};

use crate::compressor::ContextCompressor;
use crate::context::{with_system, SYSTEM_PROMPT};
use crate::error::{AgentError, Recovery};
use crate::state::{InterruptFlag, RunState, RunStatus};
use crate::tokens::TokenEstimator;
use crate::tools::{parse_arguments, ToolName, ToolRegistry};

/// Tool results are logged up to this many characters.
const LOG_PREVIEW_CHARS: usize = 200;

const COMPRESSION_SCHEDULED: &str =
    "Context compression scheduled; it runs once this turn's tool results are recorded.";

const COMPRESSION_NOT_NEEDED: &str =
    "Context compression not needed: the history already fits the kept window.";

const MISSING_RESULT: &str = "Error: no result was recorded for this tool call.";

// ─────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────

/// Budget and cadence knobs for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopSettings {
    pub max_iterations: usize,
    /// The model's context window, used for reporting.
    pub context_window: usize,
    /// Token estimate at which history is compressed.
    pub compression_threshold: usize,
    /// Messages kept verbatim by a compression.
    pub keep_recent: usize,
    /// Backup snapshot cadence in iterations; 0 disables.
    pub backup_interval: usize,
}

impl LoopSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            context_window: config.context_window,
            compression_threshold: config.compression_threshold(),
            keep_recent: config.keep_recent,
            backup_interval: config.backup_interval,
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// Final state of a run plus the conversation as it stood at the end.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub state: RunState,
    pub conversation: Vec<Message>,
}

// ─────────────────────────────────────────────
// AgentLoop
// ─────────────────────────────────────────────

pub struct AgentLoop {
    provider: Arc<dyn LlmProvider>,
    model: String,
    request_config: LlmRequestConfig,
    tools: ToolRegistry,
    compressor: ContextCompressor,
    estimator: TokenEstimator,
    system_prompt: String,
    settings: LoopSettings,
    interrupt: InterruptFlag,
    /// Where projects are created, and where snapshots go before one exists.
    output_root: PathBuf,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        estimator: TokenEstimator,
        settings: LoopSettings,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let model = model.into();
        let output_root = output_root.into();
        let tools = ToolRegistry::with_defaults(&output_root);
        let compressor = ContextCompressor::new(provider.clone(), model.clone(), estimator.clone());

        info!(
            model = %model,
            tools = tools.len(),
            max_iterations = settings.max_iterations,
            threshold = settings.compression_threshold,
            "agent loop initialized"
        );

        Self {
            provider,
            model,
            request_config: LlmRequestConfig::default(),
            tools,
            compressor,
            estimator,
            system_prompt: SYSTEM_PROMPT.to_string(),
            settings,
            interrupt: InterruptFlag::new(),
            output_root,
        }
    }

    /// Temperature / max_tokens for both the main calls and summarization.
    pub fn with_request_config(mut self, request_config: LlmRequestConfig) -> Self {
        self.compressor = self.compressor.with_request_config(request_config.clone());
        self.request_config = request_config;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Share an interrupt flag with a signal handler.
    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run until the model stops calling tools, the ceiling is reached, or
    /// the interrupt flag is raised.
    pub async fn run(&self, conversation: Vec<Message>) -> RunReport {
        let mut state = RunState::new();
        let mut conversation = conversation;
        while !state.status.is_terminal() {
            self.step(&mut state, &mut conversation).await;
        }
        RunReport {
            state,
            conversation,
        }
    }

    /// Advance the run by one iteration (or into a terminal state).
    pub async fn step(&self, state: &mut RunState, conversation: &mut Vec<Message>) {
        if state.status.is_terminal() {
            return;
        }

        if self.interrupt.is_raised() {
            warn!(iteration = state.iteration, "interrupted, saving context");
            state.final_snapshot = self.save_snapshot(state, conversation, "interrupt");
            state.status = RunStatus::Interrupted;
            return;
        }

        if state.iteration >= self.settings.max_iterations {
            warn!(
                max_iterations = self.settings.max_iterations,
                "iteration ceiling reached, saving final context"
            );
            state.final_snapshot = self.save_snapshot(state, conversation, "final");
            state.status = RunStatus::MaxIterationsReached;
            return;
        }

        state.iteration += 1;
        let iteration = state.iteration;

        // ── Token budget ──
        let tokens = self.estimate(conversation);
        state.token_estimate = tokens;
        info!(
            iteration = iteration,
            max_iterations = self.settings.max_iterations,
            tokens = tokens,
            context_window = self.settings.context_window,
            used = %format!("{:.1}%", percent(tokens, self.settings.context_window)),
            "iteration"
        );

        if tokens >= self.settings.compression_threshold {
            warn!(
                tokens = tokens,
                threshold = self.settings.compression_threshold,
                "approaching context limit, compressing"
            );
            self.compress_history(state, conversation).await;
        }

        if self.settings.backup_interval > 0 && iteration % self.settings.backup_interval == 0 {
            self.save_snapshot(state, conversation, "backup");
        }

        answer_dangling_calls(conversation);

        // ── Model call ──
        let full = with_system(&self.system_prompt, conversation);
        let definitions = self.tools.get_definitions();
        debug!(iteration = iteration, messages = full.len(), "calling model");

        let response = match self
            .provider
            .chat(&full, Some(&definitions), &self.model, &self.request_config)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.handle_failure(&AgentError::from(e), iteration);
                return;
            }
        };

        let text = response.content.clone().unwrap_or_default();
        if !text.is_empty() {
            info!(iteration = iteration, response = %truncate_string(&text, LOG_PREVIEW_CHARS), "model response");
        }

        if !response.has_tool_calls() {
            conversation.push(Message::assistant(text.clone()));
            info!(iteration = iteration, "task completed");
            state.status = RunStatus::Completed { final_text: text };
            return;
        }

        // ── Tool calls ──
        let calls = response.tool_calls;
        info!(
            iteration = iteration,
            tools = ?calls.iter().map(|c| c.function.name.as_str()).collect::<Vec<_>>(),
            "model requested tool calls"
        );
        conversation.push(Message::assistant_with_tools(response.content, calls.clone()));

        // Length once every call of this turn has its result.
        let can_compress = conversation.len() + calls.len() > self.settings.keep_recent;
        let mut compression_requested = false;
        for call in &calls {
            let result = self
                .dispatch(call, state, can_compress, &mut compression_requested, iteration)
                .await;
            info!(
                tool = %call.function.name,
                result = %truncate_string(&result, LOG_PREVIEW_CHARS),
                "tool result"
            );
            conversation.push(Message::tool_result(&call.id, result));
        }

        if compression_requested {
            self.compress_history(state, conversation).await;
        }
    }

    /// Token estimate for the system-prefixed prompt.
    fn estimate(&self, conversation: &[Message]) -> usize {
        self.estimator
            .estimate(&with_system(&self.system_prompt, conversation))
    }

    /// Resolve and execute one tool call, always producing a result string.
    async fn dispatch(
        &self,
        call: &ToolCall,
        state: &mut RunState,
        can_compress: bool,
        compression_requested: &mut bool,
        iteration: usize,
    ) -> String {
        let name = &call.function.name;
        let outcome = match name.parse::<ToolName>() {
            Err(e) => Err(e),
            Ok(ToolName::CompressContext) if can_compress => {
                *compression_requested = true;
                Ok(COMPRESSION_SCHEDULED.to_string())
            }
            Ok(ToolName::CompressContext) => {
                debug!(keep_recent = self.settings.keep_recent, "compress_context declined, history is short");
                Ok(COMPRESSION_NOT_NEEDED.to_string())
            }
            Ok(tool) => match parse_arguments(name, &call.function.arguments) {
                Ok(params) => {
                    debug!(tool = %tool, id = %call.id, "executing tool call");
                    self.tools.execute(tool, params, state).await
                }
                Err(e) => Err(e),
            },
        };

        outcome.unwrap_or_else(|err| {
            self.handle_failure(&err, iteration);
            err.to_tool_result()
        })
    }

    /// Replace older history with a summary. Leaves `conversation` untouched
    /// on failure or when there is nothing older than the kept window.
    async fn compress_history(&self, state: &mut RunState, conversation: &mut Vec<Message>) {
        let keep_recent = self.settings.keep_recent;
        if conversation.len() <= keep_recent {
            debug!(
                messages = conversation.len(),
                keep_recent = keep_recent,
                "nothing older than the kept window, skipping compression"
            );
            return;
        }

        let full = with_system(&self.system_prompt, conversation);
        let dir = state.snapshot_dir(&self.output_root).to_path_buf();
        match self.compressor.compress(&full, keep_recent, &dir).await {
            Ok(outcome) => {
                *conversation = outcome
                    .messages
                    .into_iter()
                    .skip_while(Message::is_system)
                    .collect();
                state.token_estimate = outcome.tokens_after;
                info!(
                    tokens_saved = outcome.tokens_saved,
                    tokens = outcome.tokens_after,
                    path = %outcome.path.display(),
                    "history compressed"
                );
                state.snapshots.push(outcome.path);
            }
            Err(e) => self.handle_failure(&AgentError::from(e), state.iteration),
        }
    }

    /// Write a full-history snapshot and return its path. Failures are
    /// logged and yield `None`.
    fn save_snapshot(
        &self,
        state: &mut RunState,
        conversation: &[Message],
        reason: &str,
    ) -> Option<PathBuf> {
        let full = with_system(&self.system_prompt, conversation);
        let dir = state.snapshot_dir(&self.output_root).to_path_buf();
        match self.compressor.snapshot(&full, &dir) {
            Ok(outcome) => {
                info!(reason = reason, path = %outcome.path.display(), "context saved");
                state.snapshots.push(outcome.path.clone());
                Some(outcome.path)
            }
            Err(e) => {
                self.handle_failure(&AgentError::from(e), state.iteration);
                None
            }
        }
    }

    /// The single place where a failure kind is turned into an action.
    fn handle_failure(&self, err: &AgentError, iteration: usize) {
        let kind = err.kind();
        match kind.recovery() {
            Recovery::RetryNextIteration => {
                warn!(iteration = iteration, failure = ?kind, error = %err, "model call failed, continuing with next iteration");
            }
            Recovery::SkipAndContinue => {
                warn!(iteration = iteration, failure = ?kind, error = %err, "step failed, continuing without it");
            }
            Recovery::ReportToModel => {
                warn!(iteration = iteration, failure = ?kind, error = %err, "tool call failed, reporting to model");
            }
            Recovery::Fatal => {
                error!(iteration = iteration, failure = ?kind, error = %err, "fatal failure inside the loop");
            }
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Give every tool call in the trailing assistant turn a result, so the next
/// model call never sees an unanswered invocation.
fn answer_dangling_calls(conversation: &mut Vec<Message>) {
    let Some(pos) = conversation
        .iter()
        .rposition(|m| !m.tool_calls().is_empty())
    else {
        return;
    };

    let answered: Vec<String> = conversation[pos + 1..]
        .iter()
        .filter_map(|m| m.tool_call_id().map(str::to_string))
        .collect();
    let missing: Vec<String> = conversation[pos]
        .tool_calls()
        .iter()
        .filter(|c| !answered.contains(&c.id))
        .map(|c| c.id.clone())
        .collect();

    for id in missing {
        warn!(id = %id, "tool call had no result, answering with an error");
        conversation.push(Message::tool_result(id, MISSING_RESULT));
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
