use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Duration};
use tokio_serial::SerialPortBuilderExt;

/// Bound on a single blocking read; also the worst-case latency for the
/// reader task to observe a stop request.
pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// A stream that never sends a newline must not grow the pending buffer
/// without bound.
const MAX_PENDING_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("could not open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },
}

/// Single-slot hand-off between the reader task and the frame driver.
///
/// A new publish overwrites an unread previous line; the driver only ever
/// needs the current sample, not a history.
#[derive(Clone, Default)]
pub struct SharedLineBuffer {
    slot: Arc<Mutex<Option<String>>>,
}

impl SharedLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, line: String) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(line),
            Err(_) => error!("line buffer lock poisoned; dropping sample"),
        }
    }

    /// Drain-and-clear, atomic with respect to `publish`.
    pub fn take(&self) -> Option<String> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                error!("line buffer lock poisoned; nothing drained");
                None
            }
        }
    }
}

/// Splits a raw byte stream into newline-terminated lines.
///
/// Kept separate from the read loop so CR/LF handling and partial-chunk
/// reassembly can be tested without a port.
#[derive(Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            warn!(
                "discarding {} buffered bytes with no line terminator",
                self.pending.len()
            );
            self.pending.clear();
        }

        lines
    }
}

/// Owns one serial connection and its dedicated reader task.
pub struct SerialReceiver {
    port_name: String,
    stream: Option<tokio_serial::SerialStream>,
    buffer: SharedLineBuffer,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialReceiver {
    /// Open the port. On failure the caller gets the error and no reader
    /// exists; ingestion stays disabled rather than crashing the host.
    pub fn open(
        port: &str,
        baud_rate: u32,
        buffer: SharedLineBuffer,
    ) -> Result<Self, SerialError> {
        let stream = tokio_serial::new(port, baud_rate)
            .open_native_async()
            .map_err(|source| SerialError::Open {
                port: port.to_string(),
                source,
            })?;
        info!("serial port opened: {port} @ {baud_rate} baud");

        Ok(Self {
            port_name: port.to_string(),
            stream: Some(stream),
            buffer,
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
        })
    }

    /// Spawn the reader task. At most one task per connection; repeated
    /// calls are a logged no-op.
    pub fn start(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            warn!("serial reader already started for {}", self.port_name);
            return;
        };

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let buffer = self.buffer.clone();
        let port_name = self.port_name.clone();

        self.reader = Some(tokio::spawn(async move {
            let mut assembler = LineAssembler::default();
            let mut chunk = [0u8; 256];

            while running.load(Ordering::SeqCst) {
                // AsyncReadExt::read is cancel-safe: a timeout here loses no
                // bytes, it only gives the loop a chance to see the stop flag.
                match timeout(READ_TIMEOUT, stream.read(&mut chunk)).await {
                    Err(_) => continue, // timeout: expected while the sender is idle
                    Ok(Ok(0)) => {
                        warn!("serial stream {port_name} reached EOF");
                        break;
                    }
                    Ok(Ok(n)) => {
                        for line in assembler.push(&chunk[..n]) {
                            buffer.publish(line);
                        }
                    }
                    Ok(Err(e)) => {
                        if running.load(Ordering::SeqCst) {
                            error!("serial read on {port_name} failed: {e}");
                        }
                        break;
                    }
                }
            }
            info!("serial read task for {port_name} stopped");
        }));
    }

    /// Signal the reader to stop and wait for it to exit, then release the
    /// port. Idempotent, and safe while a read is in flight: the read's own
    /// timeout guarantees the stop flag is observed within [`READ_TIMEOUT`].
    pub async fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            if reader.await.is_err() {
                error!("serial read task for {} panicked", self.port_name);
            }
            info!("serial port {} closed", self.port_name);
        }
        self.stream = None;
    }

    pub fn is_reading(&self) -> bool {
        self.reader.as_ref().is_some_and(|r| !r.is_finished())
    }
}

/// Synthetic wire-format feed for running without hardware. Publishes into
/// the same buffer the serial reader would, so the full parse/integrate path
/// is exercised.
pub fn spawn_mock_feed(buffer: SharedLineBuffer) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(20)); // ~50Hz
        let mut t = 0.0f32;
        info!("mock sensor feed started");
        loop {
            ticker.tick().await;
            t += 0.02;
            let ax = (t * std::f32::consts::TAU).sin() * 0.8;
            let ay = (t * std::f32::consts::TAU).cos() * 0.5;
            let az = 9.81f32;
            let gx = (t * 0.7).sin() * 15.0;
            let gy = (t * 0.4).sin() * 60.0;
            let gz = (t * 1.3).cos() * 45.0;
            buffer.publish(format!(
                "{ax:.3},{ay:.3},{az:.3},{gx:.3},{gy:.3},{gz:.3}"
            ));
        }
    })
}
