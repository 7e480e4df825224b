//! Scribe CLI: entry point.
//!
//! ```text
//! scribe "Create a collection of sci-fi short stories"
//! scribe --recover output/Stories/.context_summary_20250107_143022_001.md
//! scribe            # asks for the request interactively
//! ```

mod helpers;
mod prompt;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};

use scribe_agent::{AgentLoop, InterruptFlag, LoopSettings, TokenEstimator};
use scribe_core::config::{load_config, Config};
use scribe_providers::{create_provider, LlmProvider, LlmRequestConfig};

use prompt::{Reply, Seed};

const EXAMPLES: &str = "\
Examples:
  # Fresh start with inline prompt
  scribe \"Create a collection of sci-fi short stories\"

  # Recovery mode from previous context
  scribe --recover my_project/.context_summary_20250107_143022_001.md";

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// ✒ Scribe: autonomous agent for novels, books, and short story collections
#[derive(Parser, Debug)]
#[command(name = "scribe", version, about, long_about = None, after_help = EXAMPLES)]
struct Cli {
    /// Your writing request (e.g. "Create a mystery novel")
    prompt: Option<String>,

    /// Path to a context summary file to continue from
    #[arg(long, value_name = "PATH")]
    recover: Option<String>,

    /// Model identifier (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Iteration ceiling (overrides config)
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// Directory where project folders are created (overrides config)
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    logs: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.agent.model = model.clone();
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
        if let Some(output) = &self.output {
            config.agent.output_dir = output.clone();
        }
    }
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let mut config = load_config(None);
    cli.apply_overrides(&mut config);

    let provider = create_provider(&config.agent.model, &config.provider)
        .context("failed to initialize the model provider")?;
    helpers::print_key_loaded(&provider.masked_api_key(), provider.display_name());

    let seed = match resolve_seed(&cli)? {
        Some(seed) => seed,
        None => {
            println!("Goodbye!");
            return Ok(());
        }
    };

    let output_root = helpers::expand_tilde(&config.agent.output_dir);
    std::fs::create_dir_all(&output_root)
        .with_context(|| format!("failed to create output directory {}", output_root.display()))?;

    let agent = build_agent_loop(&config, Arc::new(provider), output_root);
    helpers::print_banner(agent.model(), agent.settings(), agent.output_root());
    match &seed {
        Seed::Fresh(task) => helpers::print_task(task),
        Seed::Recovered { path, .. } => helpers::print_recovering(path),
    }

    spawn_interrupt_handler(agent.interrupt_flag());

    let report = agent.run(vec![seed.into_message()]).await;
    info!(
        status = ?report.state.status,
        iterations = report.state.iteration,
        snapshots = report.state.snapshots.len(),
        "run finished"
    );
    helpers::print_report(&report);
    Ok(())
}

/// The first user turn, or `None` when the user chose to quit.
fn resolve_seed(cli: &Cli) -> Result<Option<Seed>> {
    if let Some(path) = &cli.recover {
        return Seed::from_recovery_file(&helpers::expand_tilde(path)).map(Some);
    }
    if let Some(task) = &cli.prompt {
        return Ok(Some(Seed::Fresh(task.clone())));
    }

    println!("{}", "✒ Scribe".cyan().bold());
    match prompt::read_request()? {
        Reply::Quit => Ok(None),
        Reply::Empty => anyhow::bail!("empty prompt, please provide a writing request"),
        Reply::Task(task) => Ok(Some(Seed::Fresh(task))),
    }
}

/// Build an `AgentLoop` from the loaded configuration.
fn build_agent_loop(
    config: &Config,
    provider: Arc<dyn LlmProvider>,
    output_root: std::path::PathBuf,
) -> AgentLoop {
    let agent = &config.agent;
    let request_config = LlmRequestConfig {
        max_tokens: agent.max_tokens,
        temperature: agent.temperature,
    };

    AgentLoop::new(
        provider,
        agent.model.clone(),
        TokenEstimator::for_model(&agent.model),
        LoopSettings::from_config(agent),
        output_root,
    )
    .with_request_config(request_config)
}

/// First Ctrl-C: stop at the next iteration boundary. Second: exit now.
fn spawn_interrupt_handler(flag: InterruptFlag) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
            if flag.raise() {
                eprintln!("\n{}", "Forced exit.".red());
                std::process::exit(130);
            }
            eprintln!(
                "\n{}",
                "⚠ Interrupted. Saving context after the current step (Ctrl-C again to quit now)..."
                    .yellow()
            );
        }
    });
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "scribe=debug,info"
    } else {
        "scribe=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_prompt_and_flags() {
        let cli = Cli::try_parse_from([
            "scribe",
            "Create a mystery novel",
            "--model",
            "deepseek-chat",
            "--max-iterations",
            "40",
            "-o",
            "/tmp/books",
        ])
        .unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("Create a mystery novel"));

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.agent.model, "deepseek-chat");
        assert_eq!(config.agent.max_iterations, 40);
        assert_eq!(config.agent.output_dir, "/tmp/books");
    }

    #[test]
    fn recover_wins_over_prompt() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("summary.md");
        std::fs::write(&path, "state").unwrap();

        let cli = Cli::try_parse_from([
            "scribe",
            "ignored prompt",
            "--recover",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let seed = resolve_seed(&cli).unwrap().unwrap();
        assert!(matches!(seed, Seed::Recovered { ref contents, .. } if contents == "state"));
    }

    #[test]
    fn unreadable_recovery_file_is_fatal() {
        let cli = Cli::try_parse_from(["scribe", "--recover", "/nope/missing.md"]).unwrap();
        assert!(resolve_seed(&cli).is_err());
    }

    #[test]
    fn no_overrides_keep_config() {
        let cli = Cli::try_parse_from(["scribe", "x"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.agent.model, "glm-4.7");
        assert_eq!(config.agent.max_iterations, 300);
        assert!(!cli.logs);
    }

    #[test]
    fn agent_loop_uses_config_budget() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.agent.keep_recent = 4;
        config.provider.api_key = "test-key-123456".into();
        let provider = create_provider(&config.agent.model, &config.provider).unwrap();

        let agent = build_agent_loop(&config, Arc::new(provider), tmp.path().to_path_buf());
        assert_eq!(agent.settings().keep_recent, 4);
        assert_eq!(agent.settings().compression_threshold, 180_000);
        assert_eq!(agent.model(), "glm-4.7");
    }
}
