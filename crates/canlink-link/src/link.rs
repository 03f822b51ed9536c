use std::io::{Read, Write};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use canlink_frame::{CanFrame, FrameError, FrameReader, FrameWriter, Payload, PAYLOAD_SIZE};
use canlink_transport::ReadTimeout;
use tracing::{debug, error, info, trace};

use crate::error::{LinkError, Result};

/// An open USB-to-CAN link.
///
/// Owns both halves of the transport, the shutdown flag, and at most one
/// background receive worker. Sends are serialized by a lock so frames never
/// interleave on the wire. The reader sits behind its own lock and is held
/// by the receive loop for as long as it runs, so foreground
/// [`receive`](Self::receive) calls are refused with
/// [`LinkError::ReceiverBusy`] instead of sharing decoder state.
///
/// Dropping the link closes it.
pub struct Link<T: Read + Write + Send + 'static> {
    label: String,
    reader: Arc<Mutex<Option<FrameReader<T>>>>,
    writer: Mutex<Option<FrameWriter<T>>>,
    shutdown: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    loop_error: Arc<Mutex<Option<LinkError>>>,
}

impl<T: Read + Write + ReadTimeout + Send + 'static> Link<T> {
    /// Build a link over an already-open stream pair.
    ///
    /// `reader` and `writer` are usually two handles to the same device.
    /// `read_timeout` is applied to the reader and bounds how long
    /// [`close`](Self::close) waits for a blocked receive.
    pub fn from_parts(
        label: impl Into<String>,
        reader: T,
        writer: T,
        read_timeout: Duration,
    ) -> Result<Self> {
        let reader =
            FrameReader::with_read_timeout(reader, read_timeout).map_err(LinkError::TransportIo)?;
        Ok(Self::from_framed(label, reader, FrameWriter::new(writer)))
    }
}

impl<T: Read + Write + Send + 'static> Link<T> {
    fn from_framed(
        label: impl Into<String>,
        reader: FrameReader<T>,
        writer: FrameWriter<T>,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let label = label.into();
        debug!(link = %label, "link opened");
        Self {
            label,
            reader: Arc::new(Mutex::new(Some(
                reader.with_shutdown(Arc::clone(&shutdown)),
            ))),
            writer: Mutex::new(Some(writer)),
            shutdown,
            worker: Mutex::new(None),
            loop_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Device path or caller-supplied label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the link has not been closed yet.
    pub fn is_open(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }

    /// Whether a receive loop worker is currently running.
    pub fn is_receiving(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Encode and send one frame.
    ///
    /// The identifier is truncated to 11 bits and the payload padded or
    /// truncated to 8 bytes. A failed write is reported once, never retried.
    pub fn send(&self, id: u32, payload: impl Into<Payload>) -> Result<()> {
        self.send_frame(&CanFrame::new(id, payload))
    }

    /// Send an already-built frame.
    pub fn send_frame(&self, frame: &CanFrame) -> Result<()> {
        if !self.is_open() {
            return Err(LinkError::NotOpen);
        }
        let mut guard = lock(&self.writer);
        let writer = guard.as_mut().ok_or(LinkError::NotOpen)?;
        writer.write_frame(frame).map_err(LinkError::from)?;
        trace!(link = %self.label, id = frame.id(), "sent frame");
        Ok(())
    }

    /// Block until the next valid frame arrives.
    ///
    /// Read timeouts are retried indefinitely. A bad command or tail byte is
    /// returned as [`LinkError::Framing`]; the link stays open and the next
    /// call resumes scanning for a start sentinel.
    pub fn receive(&self) -> Result<CanFrame> {
        if !self.is_open() {
            return Err(LinkError::NotOpen);
        }
        if self.is_receiving() {
            return Err(LinkError::ReceiverBusy);
        }

        let mut guard = match self.reader.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(LinkError::ReceiverBusy),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        let reader = guard.as_mut().ok_or(LinkError::NotOpen)?;

        match reader.read_frame() {
            Ok(frame) => {
                trace!(link = %self.label, id = frame.id(), "received frame");
                Ok(frame)
            }
            Err(err) => {
                if err.is_framing() {
                    debug!(link = %self.label, error = %err, "framing error");
                }
                Err(err.into())
            }
        }
    }

    /// Start a background worker that calls `callback(id, payload)` for
    /// every decoded frame.
    ///
    /// Only one worker runs per link: a second call while it is alive
    /// returns [`LinkError::AlreadyRunning`] and starts nothing. Framing
    /// errors are skipped. A transport fault ends the worker; the error is
    /// logged and kept for [`take_loop_error`](Self::take_loop_error). A
    /// worker that has exited can be replaced by calling this again.
    pub fn start_receive_loop<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(u16, [u8; PAYLOAD_SIZE]) + Send + 'static,
    {
        self.spawn_worker(move |id, data| {
            callback(id, data);
            ControlFlow::Continue(())
        })
    }

    /// Start a receive loop that forwards frames into a channel.
    ///
    /// The channel disconnects when the loop ends, so iterating the
    /// receiver finishes once the link is closed or the transport fails.
    /// Dropping the receiver stops the loop at the next frame and hands the
    /// reader back to the link.
    pub fn subscribe(&self) -> Result<mpsc::Receiver<CanFrame>> {
        let (tx, rx) = mpsc::channel();
        self.spawn_worker(move |id, data| {
            match tx.send(CanFrame::new(u32::from(id), data)) {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            }
        })?;
        Ok(rx)
    }

    fn spawn_worker<F>(&self, callback: F) -> Result<()>
    where
        F: FnMut(u16, [u8; PAYLOAD_SIZE]) -> ControlFlow<()> + Send + 'static,
    {
        if !self.is_open() {
            return Err(LinkError::NotOpen);
        }

        let mut worker = lock(&self.worker);
        if let Some(handle) = worker.as_ref() {
            if !handle.is_finished() {
                debug!(link = %self.label, "receive loop already running");
                return Err(LinkError::AlreadyRunning);
            }
        }
        if let Some(finished) = worker.take() {
            let _ = finished.join();
        }

        let reader = Arc::clone(&self.reader);
        let shutdown = Arc::clone(&self.shutdown);
        let loop_error = Arc::clone(&self.loop_error);
        let label = self.label.clone();

        let handle = thread::Builder::new()
            .name("canlink-rx".to_string())
            .spawn(move || {
                run_receive_loop(&reader, &shutdown, &loop_error, &label, callback);
            })
            .map_err(LinkError::WorkerSpawn)?;

        *worker = Some(handle);
        Ok(())
    }

    /// Take the error that ended the last receive loop, if any.
    pub fn take_loop_error(&self) -> Option<LinkError> {
        lock(&self.loop_error).take()
    }

    /// Stop the receive loop and release the transport.
    ///
    /// Raises the shutdown flag, which a blocked read observes within one
    /// transport read timeout, then joins the worker. Safe to call more than
    /// once and safe to call from inside the receive callback.
    pub fn close(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut on_worker = false;
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                // The worker drops its own reader once the callback returns.
                on_worker = true;
            } else if handle.join().is_err() {
                error!(link = %self.label, "receive worker panicked");
            }
        }

        if !on_worker {
            lock(&self.reader).take();
        }
        lock(&self.writer).take();
        info!(link = %self.label, "link closed");
    }
}

impl<T: Read + Write + Send + 'static> Drop for Link<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Read + Write + Send + 'static> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("label", &self.label)
            .field("open", &self.is_open())
            .field("receiving", &self.is_receiving())
            .finish()
    }
}

fn run_receive_loop<T, F>(
    reader: &Mutex<Option<FrameReader<T>>>,
    shutdown: &AtomicBool,
    loop_error: &Mutex<Option<LinkError>>,
    label: &str,
    mut callback: F,
) where
    T: Read,
    F: FnMut(u16, [u8; PAYLOAD_SIZE]) -> ControlFlow<()>,
{
    let mut guard = lock(reader);
    let Some(frames) = guard.as_mut() else {
        return;
    };

    info!(link = %label, "receive loop started");
    let mut received = 0u64;
    let mut framing_errors = 0u64;

    loop {
        match frames.read_frame() {
            Ok(frame) => {
                received += 1;
                if callback(frame.id(), *frame.data()).is_break() {
                    debug!(link = %label, "receive loop consumer went away");
                    break;
                }
            }
            Err(err) if err.is_framing() => {
                framing_errors += 1;
                debug!(link = %label, error = %err, "skipping malformed frame");
            }
            Err(FrameError::Cancelled) => {
                debug!(link = %label, "receive loop cancelled");
                break;
            }
            Err(err) => {
                error!(link = %label, error = %err, "receive loop terminated");
                *lock(loop_error) = Some(err.into());
                break;
            }
        }
    }

    if shutdown.load(Ordering::Acquire) {
        guard.take();
    }
    info!(link = %label, received, framing_errors, "receive loop stopped");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
