//! [`TelemetryServer`] – WebSocket listener that gives every consumer its
//! own simulated IMU/GNSS stream.
//!
//! Listens on `localhost:2003` by default.  Each accepted TCP connection is
//! upgraded to a WebSocket and handed a fresh signal model and
//! [`EmissionLoop`].  Inbound messages are drained and ignored; a close frame
//! or read error ends the session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use imusim_signal::{SignalConfig, build_model};
use imusim_types::{ControlCommand, SimError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::emitter::{EmissionLoop, FrameSink, LoopExit, raised};

/// Default listen host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default TCP port.
pub const DEFAULT_PORT: u16 = 2003;
/// Default tick rate.
pub const DEFAULT_RATE_HZ: f64 = 20.0;

/// Depth of the per-session control channel.
const CONTROL_CHANNEL_DEPTH: usize = 8;

/// How long shutdown waits for sessions to close their sockets.
pub const SESSION_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Read-only settings shared by every session.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_hz: f64,
    /// Base seed for reproducible noise.  Session `n` uses `seed + n`.
    pub seed: Option<u64>,
    pub signal: SignalConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rate_hz: DEFAULT_RATE_HZ,
            seed: None,
            signal: SignalConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Spacing between ticks.  Saturates at [`Duration::MAX`] for rates that
    /// [`validate`][Self::validate] rejects.
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.rate_hz).unwrap_or(Duration::MAX)
    }

    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for a non-positive rate, a rate
    /// whose tick interval does not fit a [`Duration`], or any invalid signal
    /// parameter.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "rate_hz must be > 0, got {}",
                self.rate_hz
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.rate_hz).is_err() {
            return Err(SimError::InvalidConfig(format!(
                "rate_hz {} gives a tick interval that is too long",
                self.rate_hz
            )));
        }
        if self.host.trim().is_empty() {
            return Err(SimError::InvalidConfig("host must not be empty".to_string()));
        }
        self.signal.validate()
    }
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

/// Cloneable trigger that stops the accept loop and every running session.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }
}

// ---------------------------------------------------------------------------
// TelemetryServer
// ---------------------------------------------------------------------------

/// WebSocket server streaming simulated telemetry, one model per consumer.
///
/// # Example
///
/// ```rust,no_run
/// use imusim_server::TelemetryServer;
///
/// #[tokio::main]
/// async fn main() {
///     TelemetryServer::default()
///         .with_port(2003)
///         .run()
///         .await
///         .expect("telemetry server failed");
/// }
/// ```
pub struct TelemetryServer {
    config: Arc<ServerConfig>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Default for TelemetryServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl TelemetryServer {
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        Arc::make_mut(&mut self.config).port = port;
        self
    }

    /// Override the listening host (builder-style).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).host = host.into();
        self
    }

    /// Override the tick rate (builder-style).
    pub fn with_rate_hz(mut self, rate_hz: f64) -> Self {
        Arc::make_mut(&mut self.config).rate_hz = rate_hz;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handle for stopping the server from another task or a signal handler.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// * [`SimError::InvalidConfig`] if the configuration does not validate.
    /// * [`SimError::Bind`] if the listener cannot bind.
    pub async fn bind(&self) -> Result<TcpListener, SimError> {
        self.config.validate()?;
        let addr = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|source| SimError::Bind { addr, source })
    }

    /// Bind and serve until shutdown.
    ///
    /// # Errors
    ///
    /// See [`bind`][Self::bind].  Nothing after a successful bind is fatal.
    pub async fn run(self) -> Result<(), SimError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until shutdown is triggered, then
    /// wait up to [`SESSION_DRAIN_TIMEOUT`] for running sessions to send
    /// their close frames.
    ///
    /// Accept errors are logged and the loop continues.
    pub async fn serve(self, listener: TcpListener) -> Result<(), SimError> {
        self.config.validate()?;
        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "?".to_string());
        info!(
            addr = %local,
            profile = %self.config.signal.profile,
            rate_hz = self.config.rate_hz,
            "telemetry server listening"
        );

        let mut shutdown = self.shutdown.subscribe();
        let mut session_index = 0u64;
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let session = Session {
                            id: Uuid::new_v4(),
                            seed: self.config.seed.map(|s| s.wrapping_add(session_index)),
                            config: Arc::clone(&self.config),
                            shutdown: self.shutdown.subscribe(),
                        };
                        session_index += 1;
                        let span = info_span!("session", %peer, id = %session.id);
                        sessions.spawn(
                            async move {
                                if let Err(e) = session.run(stream).await {
                                    error!(error = %e, "session ended with error");
                                }
                            }
                            .instrument(span),
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "accept error");
                    }
                },
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
                _ = raised(&mut shutdown) => {
                    info!(sessions = sessions.len(), "telemetry server shutting down");
                    drain(sessions).await;
                    return Ok(());
                }
            }
        }
    }
}

async fn drain(mut sessions: JoinSet<()>) {
    let finished = tokio::time::timeout(SESSION_DRAIN_TIMEOUT, async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if finished.is_err() {
        warn!(remaining = sessions.len(), "sessions still running after drain timeout, aborting");
        sessions.abort_all();
    }
}

// ---------------------------------------------------------------------------
// Per-connection session
// ---------------------------------------------------------------------------

struct Session {
    id: Uuid,
    seed: Option<u64>,
    config: Arc<ServerConfig>,
    shutdown: watch::Receiver<bool>,
}

impl Session {
    async fn run(self, stream: TcpStream) -> Result<(), SimError> {
        let ws_stream = accept_async(stream)
            .await
            .map_err(|e| SimError::Handshake(e.to_string()))?;
        info!("consumer connected");

        let (ws_tx, mut ws_rx) = ws_stream.split();
        let (closed_tx, closed_rx) = watch::channel(false);

        let reader = tokio::spawn(
            async move {
                while let Some(msg) = ws_rx.next().await {
                    match msg {
                        Ok(Message::Close(_)) => break,
                        Ok(Message::Text(text)) => {
                            debug!(len = text.len(), "ignoring inbound text message");
                        }
                        Ok(Message::Binary(data)) => {
                            debug!(len = data.len(), "ignoring inbound binary message");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!(error = %e, "read error");
                            break;
                        }
                    }
                }
                closed_tx.send_replace(true);
            }
            .in_current_span(),
        );

        // Nothing sends on this yet; resume commands have no wire format.
        let (_control_tx, control_rx) = mpsc::channel::<ControlCommand>(CONTROL_CHANNEL_DEPTH);

        let model = build_model(&self.config.signal, self.seed);
        let result = EmissionLoop::new(
            model,
            WsFrameSink(ws_tx),
            self.config.tick_interval(),
            self.shutdown,
        )
        .with_peer_closed(closed_rx)
        .with_control(control_rx)
        .run()
        .await;

        reader.abort();

        let summary = result?;
        match summary.exit {
            LoopExit::Shutdown => info!(frames = summary.frames_sent, "session stopped for shutdown"),
            LoopExit::PeerGone | LoopExit::PeerClosed => {
                info!(frames = summary.frames_sent, exit = ?summary.exit, "consumer disconnected")
            }
        }
        Ok(())
    }
}

/// [`FrameSink`] over the write half of a WebSocket.
struct WsFrameSink(SplitSink<WebSocketStream<TcpStream>, Message>);

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_text(&mut self, text: String) -> Result<(), SimError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SimError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SimError> {
        self.0
            .close()
            .await
            .map_err(|e| SimError::Transport(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
