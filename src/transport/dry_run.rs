//! Dry-run sink.
//!
//! When no transport is attached, frames are rendered as a hex dump and
//! written to stdout as `would send: 0x01, 0x01, ...`.
//!
//! # Important
//!
//! - Uses explicit `\n`, NOT `println!`
//! - Flushes immediately so the line shows up before the next command
//! - Output errors are swallowed: a dry run never fails

use std::io::Write;

use crate::protocol::Frame;

/// Prefix of every dry-run line.
pub const DRY_RUN_PREFIX: &str = "would send: ";

/// Where dry-run dumps go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DryRunOutput {
    /// One line per frame on stdout.
    #[default]
    Stdout,
    /// Only a tracing event.
    Quiet,
}

/// Formats frames instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct DryRun {
    output: DryRunOutput,
}

impl DryRun {
    pub fn new(output: DryRunOutput) -> Self {
        Self { output }
    }

    /// Dry run that prints to stdout.
    pub fn stdout() -> Self {
        Self::new(DryRunOutput::Stdout)
    }

    /// Dry run that only logs.
    pub fn quiet() -> Self {
        Self::new(DryRunOutput::Quiet)
    }

    pub fn output(&self) -> DryRunOutput {
        self.output
    }

    /// Render `frame` and emit it. Returns the hex dump.
    pub fn emit(&self, frame: &Frame) -> String {
        let dump = frame.to_hex();
        tracing::info!(counter = frame.counter(), "would send: {}", dump);

        if self.output == DryRunOutput::Stdout {
            let line = format!("{}{}", DRY_RUN_PREFIX, dump);
            if let Err(e) = write_stdout_line(&line) {
                tracing::warn!("Dry-run output failed: {}", e);
            }
        }

        dump
    }
}

/// Write a line to stdout followed by a single `\n`, then flush.
fn write_stdout_line(line: &str) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(line.as_bytes())?;
    handle.write_all(b"\n")?;
    handle.flush()?;
    Ok(())
}
