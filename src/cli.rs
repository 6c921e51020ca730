use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate an SRT subtitle file
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language code (e.g. fr, ja, pt-BR)
        #[arg(short, long)]
        target_lang: String,

        /// Output directory for the translated file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Caller identity used to key progress tracking
        #[arg(long, default_value = "local")]
        identity: String,
    },

    /// Write the default configuration file
    InitConfig {
        /// Where to write the configuration
        #[arg(short, long, default_value = "subtrans.toml")]
        path: PathBuf,
    },

    /// Check that the configured translation backend is reachable
    Check,
}
