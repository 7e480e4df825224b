//! Shared CLI helpers: path expansion, banners, and the end-of-run report.

use std::path::{Path, PathBuf};

use colored::Colorize;

use scribe_agent::{LoopSettings, RunReport, RunStatus};

const RULE_WIDTH: usize = 60;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// `180000` → `180,000`.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

pub fn print_key_loaded(masked_key: &str, provider: &str) {
    println!(
        "{} API key loaded for {}: {}",
        "✓".green(),
        provider.bold(),
        masked_key.dimmed()
    );
}

/// Header shown once the request is known, before the first iteration.
pub fn print_banner(model: &str, settings: &LoopSettings, output_root: &Path) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}", rule('='));
    println!("{}  v{}", "✒ Scribe".cyan().bold(), version.dimmed());
    println!("{}", rule('='));
    println!("Model: {}", model.bold());
    println!("Max iterations: {}", settings.max_iterations);
    println!("Context limit: {} tokens", format_count(settings.context_window));
    println!(
        "Auto-compression at: {} tokens",
        format_count(settings.compression_threshold)
    );
    println!("Output: {}", output_root.display());
    println!("{}", rule('='));
    println!();
}

pub fn print_task(task: &str) {
    println!("\n{} {}\n", "Task:".bold(), task);
}

pub fn print_recovering(path: &Path) {
    println!("{} Loaded context from: {}", "✓".green(), path.display());
    println!("{}\n", "Recovery mode: continuing from previous context".cyan());
}

/// The command that resumes from a snapshot.
pub fn resume_command(snapshot: &Path) -> String {
    format!("scribe --recover {}", snapshot.display())
}

fn print_resume_hint(report: &RunReport) {
    match report.state.resume_snapshot() {
        Some(path) => {
            println!("{} Context saved to: {}", "✓".green(), path.display());
            println!("\nTo resume, run:");
            println!("  {}", resume_command(path).bold());
        }
        None => println!("{}", "✗ Context could not be saved".red()),
    }
}

/// Print how the run ended.
pub fn print_report(report: &RunReport) {
    let state = &report.state;
    println!();
    match &state.status {
        RunStatus::Completed { final_text } => {
            if !final_text.is_empty() {
                println!("{}", rule('-'));
                println!("{final_text}");
                println!("{}", rule('-'));
            }
            println!("{}", rule('='));
            println!("{}", "✅ TASK COMPLETED".green().bold());
            println!("{}", rule('='));
            println!("Completed in {} iteration(s)", state.iteration);
        }
        RunStatus::Interrupted => {
            println!("{}", "⚠ Interrupted by user.".yellow().bold());
            print_resume_hint(report);
        }
        RunStatus::MaxIterationsReached => {
            println!("{}", rule('='));
            println!("{}", "⚠ MAX ITERATIONS REACHED".yellow().bold());
            println!("{}", rule('='));
            println!("\nReached maximum of {} iterations.", state.iteration);
            print_resume_hint(report);
        }
        RunStatus::Running => {}
    }
    if let Some(project) = &state.project_dir {
        println!("\nProject folder: {}", project.display());
    }
    println!();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
