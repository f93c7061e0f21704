//! Metric batch exporters.
//!
//! The pipeline hands every flush to one of these sinks. Exports are
//! best-effort: a failure is returned to the pipeline, logged there, and the
//! batch is dropped. Nothing here ever reaches a recording call site.

use std::sync::Mutex;

use nng::options::Options;
use nng::{Message, Protocol, Socket};

use mqtel_proto::framing::encode_frame;
use mqtel_proto::ExportBatch;

use crate::config::ExportConfig;
use crate::error::Error;

/// Exporter dispatch without dynamic trait objects.
pub enum MetricExporter {
    /// Push framed rkyv batches to a collector over nng.
    Push(PushExporter),
    /// Emit batches as JSON lines under the `metrics` tracing target.
    Log(LogExporter),
}

impl MetricExporter {
    /// Create the default push exporter for the configured endpoint.
    pub fn push(config: &ExportConfig) -> Self {
        MetricExporter::Push(PushExporter::new(config))
    }

    /// Create a logging exporter. Useful in tests and for local debugging
    /// when no collector is running.
    pub fn log() -> Self {
        MetricExporter::Log(LogExporter)
    }

    pub(crate) async fn export(&self, batch: &ExportBatch) -> Result<(), Error> {
        match self {
            MetricExporter::Push(inner) => inner.export(batch).await,
            MetricExporter::Log(inner) => inner.export(batch),
        }
    }
}

/// Pushes batches to the collector over an nng Push0 socket.
///
/// The socket is dialed lazily on the first export, with a non-blocking dial
/// that keeps retrying in the background — constructing a registry never
/// touches the network, and an unreachable collector only ever costs a
/// logged, dropped batch.
pub struct PushExporter {
    endpoint: String,
    send_timeout: std::time::Duration,
    socket: Mutex<Option<Socket>>,
}

impl PushExporter {
    /// Create an exporter for the configured endpoint. Does not dial.
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            send_timeout: config.send_timeout,
            socket: Mutex::new(None),
        }
    }

    async fn export(&self, batch: &ExportBatch) -> Result<(), Error> {
        let payload = rkyv::to_bytes::<rkyv::rancor::Error>(batch).map_err(|e| {
            Error::Payload(mqtel_proto::Error::Serialization(format!(
                "failed to serialize batch: {e}"
            )))
        })?;
        let framed = encode_frame(&payload)?;

        let socket = self.socket_handle()?;

        // nng sends are blocking with a socket-level timeout; keep them off
        // the async executor threads.
        let result = tokio::task::spawn_blocking(move || {
            let msg = Message::from(framed.as_slice());
            socket.send(msg).map_err(|(_, e)| e)
        })
        .await
        .map_err(|e| Error::Export(format!("export task failed: {e}")))?;

        match result {
            Ok(()) => Ok(()),
            Err(nng::Error::TimedOut) => {
                self.reset_socket();
                Err(Error::Timeout)
            }
            Err(e) => {
                self.reset_socket();
                Err(Error::Export(format!("failed to push batch: {e}")))
            }
        }
    }

    /// Clone the live socket, dialing first if this is the first export.
    fn socket_handle(&self) -> Result<Socket, Error> {
        let mut guard = self
            .socket
            .lock()
            .map_err(|_| Error::Export("exporter socket lock poisoned".to_string()))?;

        if let Some(socket) = guard.as_ref() {
            return Ok(socket.clone());
        }

        let socket = self.dial()?;
        *guard = Some(socket.clone());
        Ok(socket)
    }

    fn dial(&self) -> Result<Socket, Error> {
        let socket = Socket::new(Protocol::Push0)
            .map_err(|e| Error::Export(format!("failed to create socket: {e}")))?;

        socket
            .set_opt::<nng::options::SendTimeout>(Some(self.send_timeout))
            .map_err(|e| Error::Export(format!("failed to set send timeout: {e}")))?;

        // Non-blocking dial: retries in the background until the collector
        // is reachable.
        socket
            .dial_async(&self.endpoint)
            .map_err(|e| Error::Export(format!("failed to dial {}: {e}", self.endpoint)))?;

        tracing::debug!(endpoint = %self.endpoint, "metrics push socket dialing");
        Ok(socket)
    }

    /// Drop the socket so the next export re-dials.
    fn reset_socket(&self) {
        if let Ok(mut guard) = self.socket.lock() {
            *guard = None;
        }
    }
}

impl std::fmt::Debug for PushExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushExporter")
            .field("endpoint", &self.endpoint)
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

/// Writes each batch as one JSON line to the `metrics` tracing target.
#[derive(Debug, Default)]
pub struct LogExporter;

impl LogExporter {
    fn export(&self, batch: &ExportBatch) -> Result<(), Error> {
        let line = serde_json::to_string(batch).map_err(|e| {
            Error::Payload(mqtel_proto::Error::Serialization(format!(
                "failed to encode batch as JSON: {e}"
            )))
        })?;
        tracing::info!(target: "metrics", msg = %line);
        Ok(())
    }
}
