//! Tracing subscriber setup.
//!
//! One-shot runs log to stderr. The TUI owns the terminal, so it only logs when
//! given a file to write to.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn filter(default: &str, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "colorize_cli=debug" } else { default })
    })
}

pub fn init_stderr(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("colorize_cli=warn", verbose))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub fn init_file(path: Option<&Path>, verbose: bool) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter("colorize_cli=info", verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialize logging: {e}"))
}
