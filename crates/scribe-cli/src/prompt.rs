//! Where the first user turn comes from: an argument, a recovery file, or an
//! interactive prompt (`rustyline`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use scribe_agent::context::recovery_message;
use scribe_core::types::Message;

/// Words that leave the interactive prompt (case-insensitive).
const QUIT_WORDS: &[&str] = &["quit", "exit", "q"];

/// What the interactive prompt produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Quit,
    Empty,
    Task(String),
}

pub fn classify(line: &str) -> Reply {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Reply::Empty
    } else if QUIT_WORDS.contains(&trimmed.to_lowercase().as_str()) {
        Reply::Quit
    } else {
        Reply::Task(trimmed.to_string())
    }
}

/// Ask for one writing request on the terminal.
pub fn read_request() -> Result<Reply> {
    println!("\nEnter your writing request (or 'quit' to exit):");
    println!("Example: Create a collection of 15 sci-fi short stories\n");

    let mut editor = DefaultEditor::new().context("failed to open the terminal prompt")?;
    match editor.readline("> ") {
        Ok(line) => Ok(classify(&line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Reply::Quit),
        Err(e) => Err(e).context("failed to read the writing request"),
    }
}

/// The first user turn of a run.
#[derive(Debug)]
pub enum Seed {
    Fresh(String),
    Recovered { path: PathBuf, contents: String },
}

impl Seed {
    /// Load a snapshot file for `--recover`.
    pub fn from_recovery_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recovery file {}", path.display()))?;
        debug!(path = %path.display(), bytes = contents.len(), "loaded recovery file");
        Ok(Seed::Recovered {
            path: path.to_path_buf(),
            contents,
        })
    }

    pub fn into_message(self) -> Message {
        match self {
            Seed::Fresh(task) => Message::user(task),
            Seed::Recovered { contents, .. } => recovery_message(&contents),
        }
    }
}
