//! Newline-delimited JSON output for extracted events.
//!
//! Each event is written as one compact JSON object followed by `\n`, in the
//! order it was received.

use anyhow::{Context, Result};
use std::path::Path;
use tabledump_core::Event;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

/// Buffered NDJSON writer.
pub struct NdjsonSink<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
    written: u64,
}

impl<W: AsyncWrite + Unpin> NdjsonSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Writes one event as a single line.
    pub async fn write_event(&mut self, event: &Event) -> Result<()> {
        let mut line = serde_json::to_vec(event).context("Failed to serialize event")?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .context("Failed to write event")?;
        self.written += 1;
        Ok(())
    }

    /// Writes every event until the stream closes.
    pub async fn drain(&mut self, events: &mut mpsc::Receiver<Event>) -> Result<u64> {
        while let Some(event) = events.recv().await {
            self.write_event(&event).await?;
        }
        Ok(self.written)
    }

    /// Events written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes buffered lines and returns the inner writer.
    pub async fn finish(mut self) -> Result<W> {
        self.writer.flush().await.context("Failed to flush output")?;
        Ok(self.writer.into_inner())
    }
}

/// Opens the sink for a file, creating or truncating it.
pub async fn file_sink(path: &Path) -> Result<NdjsonSink<tokio::fs::File>> {
    let file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(NdjsonSink::new(file))
}

/// Opens the sink for stdout.
pub fn stdout_sink() -> NdjsonSink<tokio::io::Stdout> {
    NdjsonSink::new(tokio::io::stdout())
}
