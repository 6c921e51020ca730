//! Subtrans - SRT Subtitle Translation
//!
//! Command line entry point: translates a subtitle file with a live progress
//! bar fed by the shared progress tracker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::oneshot;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use subtrans::cli::{Args, Commands};
use subtrans::config::Config;
use subtrans::error::SubtransError;
use subtrans::progress::render_progress;
use subtrans::translate::create_backend;
use subtrans::workflow::{Submission, UploadedFile, Workflow};

const DEFAULT_CONFIG_FILE: &str = "subtrans.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Subtrans - SRT Subtitle Translation");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate { input, target_lang, output_dir, identity } => {
            let workflow = Workflow::from_config(&config)?;
            let output_path = translate_file(&workflow, &input, &target_lang, output_dir, &identity).await?;
            println!("Translated subtitles written to {}", output_path.display());
        }
        Commands::InitConfig { path } => {
            config.save_to_file(&path)?;
            println!("Configuration written to {}", path.display());
        }
        Commands::Check => {
            let backend = create_backend(&config.backend)?;
            backend.check_availability().await?;
            println!("{} backend is available", backend.name());
        }
    }

    Ok(())
}

async fn translate_file(
    workflow: &Workflow,
    input: &Path,
    target_lang: &str,
    output_dir: Option<PathBuf>,
    identity: &str,
) -> Result<PathBuf> {
    if !input.exists() {
        return Err(SubtransError::FileNotFound(input.display().to_string()).into());
    }

    let filename = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = tokio::fs::read(input).await?;

    let submission = Submission {
        file: Some(UploadedFile { filename, content }),
        target_lang: Some(target_lang.to_string()),
        requester: identity.to_string(),
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} entries ({percent}%)")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    let renderer = tokio::spawn(render_progress(
        Arc::clone(workflow.progress_tracker()),
        identity.to_string(),
        bar,
        Duration::from_millis(200),
        stop_rx,
    ));
    let result = workflow.submit(submission).await;

    // The renderer clears the bar before anything else is printed.
    let _ = stop_tx.send(());
    if let Err(e) = renderer.await {
        warn!("Progress display task failed: {}", e);
    }

    let translated = result?;

    let output_dir = match output_dir {
        Some(dir) => dir,
        None => match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    tokio::fs::create_dir_all(&output_dir).await?;

    let output_path = output_dir.join(&translated.filename);
    tokio::fs::write(&output_path, translated.into_bytes()).await?;

    Ok(output_path)
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".subtrans").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
