//! Dedicated writer task for delivering frames to a byte sink.
//!
//! The sink (serial port, socket, pipe) is owned by a single task that
//! receives frames over an mpsc channel. Each frame carries a oneshot
//! reply, so the caller's `send` resolves with the real write outcome.
//!
//! # Architecture
//!
//! ```text
//! RigControl ─┐
//! RigControl ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► Sink
//! (clones)   ─┘                                      │
//!                  oneshot::Receiver<WriteAck> ◄─────┘
//! ```
//!
//! Frames are written in channel order. Frames queued while a write is in
//! progress are batched into a single vectored write.

use std::io::{IoSlice, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::protocol::Frame;
use crate::transport::{Transport, WriteAck};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Maximum frames to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 16;

type Reply = oneshot::Sender<Result<WriteAck, TransportError>>;

/// A frame waiting to be written, with the channel its outcome goes back on.
#[derive(Debug)]
pub struct OutboundFrame {
    pub frame: Frame,
    reply: Reply,
}

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Channel capacity for the frame queue.
    pub channel_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for sending frames to the writer task.
///
/// This is cheaply cloneable and implements [`Transport`].
#[derive(Clone, Debug)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
    /// Frames queued or in flight.
    pending: Arc<AtomicUsize>,
}

impl WriterHandle {
    fn new(tx: mpsc::Sender<OutboundFrame>, pending: Arc<AtomicUsize>) -> Self {
        Self { tx, pending }
    }

    /// Queue a frame and wait until the sink accepted it.
    pub async fn send(&self, frame: Frame) -> Result<WriteAck, TransportError> {
        let (reply, outcome) = oneshot::channel();

        // Increment pending count BEFORE sending
        self.pending.fetch_add(1, Ordering::AcqRel);

        if self.tx.send(OutboundFrame { frame, reply }).await.is_err() {
            self.pending.fetch_sub(1, Ordering::Release);
            return Err(TransportError::ConnectionClosed);
        }

        // A dropped reply means the task died before reaching this frame.
        outcome.await.map_err(|_| TransportError::ConnectionClosed)?
    }

    /// Get current pending frame count.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Transport for WriterHandle {
    async fn write(&self, frame: Frame) -> Result<WriteAck, TransportError> {
        self.send(frame).await
    }
}

/// Spawn the writer task over an async sink.
///
/// Returns a `(WriterHandle, JoinHandle)`; the task ends cleanly once every
/// handle is dropped, or with the first write error.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<(), TransportError>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let pending = Arc::new(AtomicUsize::new(0));
    let handle = WriterHandle::new(tx, pending.clone());
    let task = tokio::spawn(writer_loop(rx, writer, pending));
    (handle, task)
}

/// Spawn the writer task with default configuration.
pub fn spawn_writer_task_default<W>(
    writer: W,
) -> (WriterHandle, JoinHandle<Result<(), TransportError>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_writer_task(writer, WriterConfig::default())
}

/// Spawn the writer on tokio's blocking pool for a synchronous sink.
///
/// Used for serial ports, whose driver API is blocking.
pub fn spawn_blocking_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<(), TransportError>>)
where
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let pending = Arc::new(AtomicUsize::new(0));
    let handle = WriterHandle::new(tx, pending.clone());
    let task = tokio::task::spawn_blocking(move || blocking_writer_loop(rx, writer, pending));
    (handle, task)
}

/// Wait for one frame, then drain whatever else is already queued.
fn collect_batch(first: OutboundFrame, rx: &mut mpsc::Receiver<OutboundFrame>) -> Vec<OutboundFrame> {
    let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
    batch.push(first);
    while batch.len() < MAX_BATCH_SIZE {
        match rx.try_recv() {
            Ok(frame) => batch.push(frame),
            Err(_) => break,
        }
    }
    batch
}

/// Answer every frame of a finished batch.
fn settle_batch(
    batch: Vec<OutboundFrame>,
    outcome: &Result<(), Arc<std::io::Error>>,
    pending: &AtomicUsize,
) {
    pending.fetch_sub(batch.len(), Ordering::Release);

    for OutboundFrame { frame, reply } in batch {
        let result = match outcome {
            Ok(()) => Ok(WriteAck {
                counter: frame.counter(),
                bytes_written: frame.len(),
            }),
            Err(e) => Err(TransportError::Io(Arc::clone(e))),
        };
        // Caller may have stopped waiting.
        let _ = reply.send(result);
    }
}

/// Stop accepting frames and fail everything still queued behind a
/// write error, so no caller is left waiting and `pending` drops to zero.
fn abandon_queued(
    rx: &mut mpsc::Receiver<OutboundFrame>,
    error: &Arc<std::io::Error>,
    pending: &AtomicUsize,
) {
    rx.close();
    let mut abandoned = 0;
    while let Ok(OutboundFrame { reply, .. }) = rx.try_recv() {
        pending.fetch_sub(1, Ordering::Release);
        let _ = reply.send(Err(TransportError::Io(Arc::clone(error))));
        abandoned += 1;
    }
    if abandoned > 0 {
        tracing::warn!("Dropped {} queued frames after write failure", abandoned);
    }
}

/// Settle a written batch; on failure also drain the queue and return the
/// error that stops the task.
fn finish_batch(
    batch: Vec<OutboundFrame>,
    outcome: std::io::Result<()>,
    rx: &mut mpsc::Receiver<OutboundFrame>,
    pending: &AtomicUsize,
) -> Result<(), TransportError> {
    let outcome = outcome.map_err(Arc::new);
    if let Err(e) = &outcome {
        tracing::error!("Frame write failed: {}", e);
    }
    settle_batch(batch, &outcome, pending);

    if let Err(e) = outcome {
        abandon_queued(rx, &e, pending);
        return Err(TransportError::Io(e));
    }
    Ok(())
}

async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    pending: Arc<AtomicUsize>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(first) = rx.recv().await {
        let batch = collect_batch(first, &mut rx);
        let outcome = write_batch(&mut writer, &batch).await;
        finish_batch(batch, outcome, &mut rx, &pending)?;
    }

    // Channel closed, clean shutdown
    Ok(())
}

fn blocking_writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    pending: Arc<AtomicUsize>,
) -> Result<(), TransportError>
where
    W: Write,
{
    while let Some(first) = rx.blocking_recv() {
        let batch = collect_batch(first, &mut rx);
        let outcome = batch
            .iter()
            .try_for_each(|f| writer.write_all(f.frame.as_bytes()))
            .and_then(|()| writer.flush());
        finish_batch(batch, outcome, &mut rx, &pending)?;
    }

    Ok(())
}

/// Write a batch of frames using scatter/gather I/O (write_vectored).
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if batch.is_empty() {
        return Ok(());
    }

    let total_size: usize = batch.iter().map(|f| f.frame.len()).sum();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = build_remaining_slices(batch, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            ));
        }
        total_written += written;
    }

    writer.flush().await
}

/// Build IoSlice array for the data not yet written.
fn build_remaining_slices(batch: &[OutboundFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len());
    let mut offset = 0;

    for out in batch {
        let bytes = out.frame.as_bytes();
        let end = offset + bytes.len();
        if skip_bytes < end {
            let start = skip_bytes.saturating_sub(offset);
            slices.push(IoSlice::new(&bytes[start..]));
        }
        offset = end;
    }

    slices
}
