//! Append-only JSON-lines health log.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::persistence::{HealthRecord, HealthSink};

/// Sink that hands records to a background writer over a bounded channel.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    tx: mpsc::Sender<HealthRecord>,
}

/// Background writer of a [`JsonlSink`]. Finishes once every sink clone
/// has been dropped and the buffer is flushed.
#[derive(Debug)]
pub struct SinkWriter {
    path: PathBuf,
    handle: JoinHandle<()>,
}

impl JsonlSink {
    /// Open (or create) the log file and start the writer task.
    pub async fn open(path: &Path, buffer: usize) -> io::Result<(Self, SinkWriter)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let (tx, rx) = mpsc::channel(buffer.max(1));
        let handle = tokio::spawn(write_loop(BufWriter::new(file), rx));

        tracing::info!(path = %path.display(), "Health log opened");
        Ok((
            Self { tx },
            SinkWriter {
                path: path.to_path_buf(),
                handle,
            },
        ))
    }
}

impl HealthSink for JsonlSink {
    fn record(&self, record: HealthRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                metrics::record_dropped_health_record();
                tracing::warn!(
                    chain = %record.chain,
                    endpoint = %record.endpoint_name,
                    "Health log buffer full, dropping record"
                );
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Health log writer stopped, dropping record");
            }
        }
    }
}

impl SinkWriter {
    /// Wait for the writer to drain, up to `grace`.
    pub async fn finish(self, grace: Duration) {
        match tokio::time::timeout(grace, self.handle).await {
            Ok(Ok(())) => tracing::info!(path = %self.path.display(), "Health log closed"),
            Ok(Err(e)) => tracing::error!(error = %e, "Health log writer panicked"),
            Err(_) => tracing::warn!(
                path = %self.path.display(),
                "Health log writer did not drain in time"
            ),
        }
    }
}

async fn write_loop<W>(mut writer: BufWriter<W>, mut rx: mpsc::Receiver<HealthRecord>)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(record) = rx.recv().await {
        if let Err(e) = write_record(&mut writer, &record).await {
            tracing::error!(error = %e, "Failed to write health record");
            continue;
        }
        // Batch whatever is already queued before flushing.
        while let Ok(record) = rx.try_recv() {
            if let Err(e) = write_record(&mut writer, &record).await {
                tracing::error!(error = %e, "Failed to write health record");
            }
        }
        if let Err(e) = writer.flush().await {
            tracing::error!(error = %e, "Failed to flush health log");
        }
    }
    let _ = writer.flush().await;
}

async fn write_record<W>(writer: &mut BufWriter<W>, record: &HealthRecord) -> io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    writer.write_all(&line).await
}
