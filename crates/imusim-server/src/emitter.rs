//! [`EmissionLoop`] – drives one signal model at a fixed tick rate and
//! pushes every frame to one consumer.
//!
//! Each tick runs, in order:
//!
//! 1. drain pending [`ControlCommand`]s without blocking,
//! 2. [`SignalModel::advance`],
//! 3. encode the frame in full,
//! 4. send it on the [`FrameSink`],
//! 5. sleep for the tick interval, racing the shutdown and peer-closed
//!    signals.
//!
//! Step 5 is the only suspension point besides the send itself.  The interval
//! is a minimum spacing between ticks; time spent in steps 1–4 is not
//! compensated, so cadence drifts slightly under load.

use std::time::Duration;

use async_trait::async_trait;
use imusim_signal::SignalModel;
use imusim_types::{ControlCommand, SimError};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::envelope;

/// Destination for encoded frames.
///
/// The WebSocket write half implements this in the server; tests plug in
/// fakes that record or fail sends.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one encoded frame.  An error means the peer is gone.
    async fn send_text(&mut self, text: String) -> Result<(), SimError>;

    /// Best-effort close on shutdown.
    async fn close(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

/// Why an emission loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A send failed.
    PeerGone,
    /// The connection reader saw a close frame or end of stream.
    PeerClosed,
    /// Process-wide shutdown was requested.
    Shutdown,
}

/// Result of a finished loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub exit: LoopExit,
    /// Frames the sink accepted.
    pub frames_sent: u64,
}

/// One connection's tick loop.  Owns its model; nothing is shared with other
/// connections.
pub struct EmissionLoop<S> {
    model: Box<dyn SignalModel>,
    sink: S,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
    peer_closed: Option<watch::Receiver<bool>>,
    control: Option<mpsc::Receiver<ControlCommand>>,
}

impl<S: FrameSink> EmissionLoop<S> {
    pub fn new(
        model: Box<dyn SignalModel>,
        sink: S,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            model,
            sink,
            interval,
            shutdown,
            peer_closed: None,
            control: None,
        }
    }

    /// Stop when `rx` turns `true` (builder-style).
    pub fn with_peer_closed(mut self, rx: watch::Receiver<bool>) -> Self {
        self.peer_closed = Some(rx);
        self
    }

    /// Poll `rx` for control commands between ticks (builder-style).
    pub fn with_control(mut self, rx: mpsc::Receiver<ControlCommand>) -> Self {
        self.control = Some(rx);
        self
    }

    /// Run until the peer goes away or shutdown is requested.
    ///
    /// # Errors
    ///
    /// Returns the encoder's error if a frame cannot be serialised.  Send
    /// failures are not errors; they end the loop with
    /// [`LoopExit::PeerGone`].
    pub async fn run(self) -> Result<LoopSummary, SimError> {
        let Self {
            mut model,
            mut sink,
            interval,
            mut shutdown,
            mut peer_closed,
            mut control,
        } = self;

        let mut frames_sent = 0u64;
        let mut last_phase = model.phase();
        let summary = |exit, frames_sent| LoopSummary { exit, frames_sent };

        loop {
            if *shutdown.borrow() {
                let _ = sink.close().await;
                return Ok(summary(LoopExit::Shutdown, frames_sent));
            }
            if peer_closed.as_ref().is_some_and(|rx| *rx.borrow()) {
                return Ok(summary(LoopExit::PeerClosed, frames_sent));
            }

            if let Some(rx) = control.as_mut() {
                while let Ok(cmd) = rx.try_recv() {
                    if let Err(e) = model.apply(cmd) {
                        warn!(error = %e, "control command rejected");
                    }
                }
            }

            let frame = model.advance();
            let phase = model.phase();
            if phase != last_phase {
                debug!(?last_phase, ?phase, "motion phase changed");
                last_phase = phase;
            }

            let text = envelope::encode(&frame)?;
            if let Err(e) = sink.send_text(text).await {
                debug!(error = %e, frames_sent, "send failed, ending session");
                return Ok(summary(LoopExit::PeerGone, frames_sent));
            }
            frames_sent += 1;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = raised(&mut shutdown) => {
                    let _ = sink.close().await;
                    return Ok(summary(LoopExit::Shutdown, frames_sent));
                }
                _ = raised_opt(peer_closed.as_mut()) => {
                    return Ok(summary(LoopExit::PeerClosed, frames_sent));
                }
            }
        }
    }
}

/// Resolve once the flag is `true`.  A dropped sender never resolves.
pub(crate) async fn raised(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|flag| *flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn raised_opt(rx: Option<&mut watch::Receiver<bool>>) {
    match rx {
        Some(rx) => raised(rx).await,
        None => std::future::pending::<()>().await,
    }
}
