//! Project tools: `create_project` and `write_file`.
//!
//! One project directory is active per run. Files are written flat inside it.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use scribe_core::utils::safe_dirname;
use serde_json::{json, Value};
use tracing::info;

use super::base::{require_string, Tool, ToolName};
use crate::state::RunState;

// ─────────────────────────────────────────────
// CreateProjectTool
// ─────────────────────────────────────────────

/// Creates (or reuses) `<output_root>/<sanitized name>` and makes it the
/// active project.
pub struct CreateProjectTool {
    output_root: PathBuf,
}

impl CreateProjectTool {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> ToolName {
        ToolName::CreateProject
    }

    fn description(&self) -> &str {
        "Creates a new project folder in the 'output' directory with a sanitized name. \
         This should be called first before writing any files. Only one project can be active at a time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_name": {
                    "type": "string",
                    "description": "The name for the project folder (will be sanitized for filesystem compatibility)"
                }
            },
            "required": ["project_name"]
        })
    }

    async fn execute(
        &self,
        params: HashMap<String, Value>,
        state: &mut RunState,
    ) -> anyhow::Result<String> {
        let requested = require_string(&params, "project_name")?;
        let dirname = safe_dirname(&requested);
        if dirname.is_empty() {
            anyhow::bail!("Project name '{requested}' has no usable characters");
        }
        let target = self.output_root.join(&dirname);

        if let Some(active) = &state.project_dir {
            if *active == target {
                return Ok(format!(
                    "Project '{dirname}' is already active at {}",
                    target.display()
                ));
            }
            anyhow::bail!(
                "A project is already active at {}. Only one project can be active per run.",
                active.display()
            );
        }

        let existed = target.is_dir();
        std::fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create directory {}", target.display()))?;
        info!(project = %dirname, path = %target.display(), "project active");
        state.project_dir = Some(target.clone());

        if existed {
            Ok(format!(
                "Project '{dirname}' already exists at {}; using it as the active project",
                target.display()
            ))
        } else {
            Ok(format!("Project '{dirname}' created at {}", target.display()))
        }
    }
}

// ─────────────────────────────────────────────
// WriteFileTool
// ─────────────────────────────────────────────

/// How `write_file` treats an existing file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Fails if the file exists.
    Create,
    /// Fails if the file does not exist.
    Append,
    /// Always writes, creating if absent.
    Overwrite,
}

impl FromStr for WriteMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(WriteMode::Create),
            "append" => Ok(WriteMode::Append),
            "overwrite" => Ok(WriteMode::Overwrite),
            other => anyhow::bail!(
                "Invalid mode '{other}'. Must be one of: create, append, overwrite"
            ),
        }
    }
}

/// Writes a markdown file inside the active project.
#[derive(Default)]
pub struct WriteFileTool;

impl WriteFileTool {
    pub fn new() -> Self {
        Self
    }
}

/// Only bare file names are accepted; no directories, no traversal.
fn validate_filename(filename: &str) -> anyhow::Result<()> {
    let trimmed = filename.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        anyhow::bail!("Invalid filename '{filename}'");
    }
    if trimmed.contains(['/', '\\']) {
        anyhow::bail!("Invalid filename '{filename}': must be a plain file name without directories");
    }
    Ok(())
}

fn write_with_mode(path: &Path, content: &str, mode: WriteMode) -> anyhow::Result<()> {
    let mut options = OpenOptions::new();
    match mode {
        WriteMode::Create => options.write(true).create_new(true),
        WriteMode::Append => options.append(true),
        WriteMode::Overwrite => options.write(true).create(true).truncate(true),
    };
    let mut file = options.open(path).map_err(|e| match (mode, e.kind()) {
        (WriteMode::Create, std::io::ErrorKind::AlreadyExists) => anyhow::anyhow!(
            "File '{}' already exists. Use 'append' or 'overwrite' mode.",
            path.display()
        ),
        (WriteMode::Append, std::io::ErrorKind::NotFound) => anyhow::anyhow!(
            "File '{}' does not exist. Use 'create' mode first.",
            path.display()
        ),
        _ => anyhow::anyhow!("Failed to open {}: {e}", path.display()),
    })?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> ToolName {
        ToolName::WriteFile
    }

    fn description(&self) -> &str {
        "Writes content to a markdown file in the active project folder. Supports three modes: \
         'create' (creates new file, fails if exists), 'append' (adds content to end of existing file), \
         'overwrite' (replaces entire file content)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "The name of the markdown file to write (should end in .md)"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                },
                "mode": {
                    "type": "string",
                    "enum": ["create", "append", "overwrite"],
                    "description": "The write mode: 'create' for new files, 'append' to add to existing, 'overwrite' to replace"
                }
            },
            "required": ["filename", "content", "mode"]
        })
    }

    async fn execute(
        &self,
        params: HashMap<String, Value>,
        state: &mut RunState,
    ) -> anyhow::Result<String> {
        let filename = require_string(&params, "filename")?;
        let content = require_string(&params, "content")?;
        let mode: WriteMode = require_string(&params, "mode")?.parse()?;

        let Some(project_dir) = state.project_dir.as_deref() else {
            anyhow::bail!("No active project. Call create_project first.");
        };
        validate_filename(&filename)?;

        let path = project_dir.join(filename.trim());
        write_with_mode(&path, &content, mode)?;

        let words = content.split_whitespace().count();
        let verb = match mode {
            WriteMode::Create => "Created",
            WriteMode::Append => "Appended to",
            WriteMode::Overwrite => "Overwrote",
        };
        info!(path = %path.display(), words = words, mode = ?mode, "file written");
        Ok(format!("{verb} '{}' ({words} words)", path.display()))
    }
}
