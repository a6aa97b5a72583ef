//! `imusim-server` – Streams simulated IMU/GNSS telemetry over WebSocket.
//!
//! Boots a WebSocket listener (default `localhost:2003`) that gives every
//! accepted connection its own signal model and tick loop:
//!
//! 1. **Envelope** – [`envelope::encode`] turns a frame into one JSON text
//!    message, rejecting non-finite values.
//!
//! 2. **Emission loop** – [`EmissionLoop`] advances the model once per tick,
//!    sends the encoded frame and sleeps for the tick interval.  A failed
//!    send, a close from the peer or a server shutdown ends it.
//!
//! 3. **Server** – [`TelemetryServer`] accepts connections, performs the
//!    WebSocket handshake and spawns one session task per consumer.
//!
//! # Usage
//!
//! ```rust,no_run
//! use imusim_server::{ServerConfig, TelemetryServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     TelemetryServer::new(ServerConfig::default())
//!         .with_rate_hz(10.0)
//!         .run()
//!         .await
//!         .expect("telemetry server failed");
//! }
//! ```

pub mod emitter;
pub mod envelope;
pub mod server;

pub use emitter::{EmissionLoop, FrameSink, LoopExit, LoopSummary};
pub use server::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATE_HZ, SESSION_DRAIN_TIMEOUT, ServerConfig,
    ShutdownHandle, TelemetryServer,
};
