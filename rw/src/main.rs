//! ReleaseWatch - release notification CLI
//!
//! CLI entry point for release checks and checkpoint maintenance.

use std::sync::Arc;

use checkpointstore::CheckpointStore;
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use releasewatch::cli::{Cli, Command, OutputFormat};
use releasewatch::config::Config;
use releasewatch::fetcher::GithubFetcher;
use releasewatch::notifier::SmtpNotifier;
use releasewatch::watcher::{CheckpointOutcome, ProjectOutcome, ReleaseWatcher, RunReport};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(Command::Watch { interval: Some(secs) }) = &cli.command {
        config.watch.poll_interval_secs = *secs;
    }
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_check(&config, OutputFormat::Text).await,
        Some(Command::Check { format }) => cmd_check(&config, format).await,
        Some(Command::Watch { .. }) => cmd_watch(&config).await,
        Some(Command::Projects) => cmd_projects(&config),
        Some(Command::Status { format }) => cmd_status(&config, format),
        Some(Command::Reset { project }) => cmd_reset(&config, &project),
    }
}

/// Wire the production fetcher, notifier, and checkpoint store
fn build_watcher(config: &Config) -> Result<ReleaseWatcher> {
    let credentials = config.smtp.credentials()?;
    let notifier = SmtpNotifier::new(&config.smtp, credentials).context("Failed to set up mail notifier")?;
    info!(to = %notifier.recipient(), host = %config.smtp.host, "Notifications configured");

    let fetcher = GithubFetcher::from_config(&config.github).context("Failed to set up release fetcher")?;
    if !fetcher.is_authenticated() {
        warn!(
            "{} is not set; GitHub requests are unauthenticated and heavily rate limited",
            config.github.token_env
        );
    }

    let store = config.checkpoint_store()?;
    info!(path = %store.path().display(), "Using checkpoint");

    Ok(ReleaseWatcher::new(
        config.watch.clone(),
        config.projects.clone(),
        Arc::new(fetcher),
        Arc::new(notifier),
        Arc::new(store),
    ))
}

async fn cmd_check(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_check: called");
    let watcher = build_watcher(config)?;
    let report = watcher.run_once().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for project in &report.projects {
        let outcome = match &project.outcome {
            ProjectOutcome::Unchanged { .. } => project.outcome.to_string().normal(),
            ProjectOutcome::Notified { .. } => project.outcome.to_string().green(),
            ProjectOutcome::Skipped(_) => project.outcome.to_string().yellow(),
        };
        println!("{:<24} {}", project.display_name.bold(), outcome);
    }

    match &report.checkpoint {
        CheckpointOutcome::Untouched => println!("Checkpoint: unchanged"),
        CheckpointOutcome::Saved => println!("Checkpoint: {}", "saved".green()),
        CheckpointOutcome::SaveFailed(e) => println!("Checkpoint: {} ({})", "save failed".red(), e),
    }
}

async fn cmd_watch(config: &Config) -> Result<()> {
    debug!("cmd_watch: called");
    let watcher = build_watcher(config)?;
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let handle = tokio::spawn(async move { watcher.watch(shutdown_rx).await });
    info!("Watching. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => warn!("SIGINT received"),
            _ = sigterm.recv() => warn!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        warn!("Ctrl+C received");
    }

    let _ = shutdown_tx.send(()).await;
    let runs = handle.await.context("Watcher task failed")?;
    info!(runs, "Stopped");
    Ok(())
}

fn cmd_projects(config: &Config) -> Result<()> {
    debug!("cmd_projects: called");
    for project in &config.projects {
        println!("{:<24} {}", project.display_name.bold(), project.slug());
    }
    Ok(())
}

fn cmd_status(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_status: called");
    let store = config.checkpoint_store()?;

    let (checkpoint, problem) = match store.read() {
        Ok(Some(checkpoint)) => (checkpoint, None),
        Ok(None) => (Default::default(), Some("missing".to_string())),
        Err(e) if e.is_corrupt() => (Default::default(), Some(format!("unreadable, treated as empty: {}", e))),
        Err(e) => return Err(e).context("Failed to read checkpoint"),
    };

    // Entries left behind by projects no longer in the config
    let untracked: Vec<(&str, &str)> = checkpoint
        .iter()
        .filter(|(key, _)| !config.projects.iter().any(|p| p.key() == *key))
        .collect();

    match format {
        OutputFormat::Json => {
            let projects: Vec<_> = config
                .projects
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "project": p.key(),
                        "slug": p.slug(),
                        "display_name": p.display_name,
                        "tag": checkpoint.get(p.key()),
                    })
                })
                .collect();
            let json = serde_json::json!({
                "path": store.path().to_string_lossy(),
                "problem": problem,
                "projects": projects,
                "untracked": untracked
                    .iter()
                    .map(|(key, tag)| serde_json::json!({ "project": key, "tag": tag }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Checkpoint: {}", store.path().display());
            if let Some(problem) = &problem {
                println!("  ({})", problem.yellow());
            }
            for project in &config.projects {
                let tag = match checkpoint.get(project.key()) {
                    Some(tag) => tag.green(),
                    None => "(none)".dimmed(),
                };
                println!("{:<24} {}", project.display_name.bold(), tag);
            }
            for (key, tag) in &untracked {
                println!("{:<24} {} {}", key.dimmed(), tag, "(untracked)".dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_reset(config: &Config, id: &str) -> Result<()> {
    debug!(%id, "cmd_reset: called");
    let project = config
        .find_project(id)
        .ok_or_else(|| eyre!("Unknown project '{}'. Run `rw projects` to list tracked projects.", id))?;
    let store = config.checkpoint_store()?;

    let mut checkpoint = store.load();
    match checkpoint.remove(project.key()) {
        Some(tag) => {
            store.save(&checkpoint).context("Failed to save checkpoint")?;
            println!("Reset {} (was {})", project.display_name.bold(), tag);
        }
        None => println!("{} has no checkpointed tag", project.display_name.bold()),
    }
    Ok(())
}
