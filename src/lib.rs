//! Subtrans - SRT Subtitle Translation
//!
//! Parses SRT files, translates every caption through a pluggable backend
//! (Google Translate or a local Ollama model) while tracking per-job progress,
//! and rebuilds the translated file.

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod subtitle;
pub mod translate;
pub mod workflow;
