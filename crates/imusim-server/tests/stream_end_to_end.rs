//! Drives a real `TelemetryServer` over a loopback WebSocket.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use imusim_server::{ServerConfig, ShutdownHandle, TelemetryServer};
use imusim_signal::{Profile, SignalConfig};
use imusim_types::Frame;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start(config: ServerConfig) -> (SocketAddr, ShutdownHandle, tokio::task::JoinHandle<()>) {
    let server = TelemetryServer::new(config).with_host("127.0.0.1").with_port(0);
    let listener = server.bind().await.expect("bind loopback");
    let addr = listener.local_addr().unwrap();
    let handle = server.shutdown_handle();
    let task = tokio::spawn(async move {
        server.serve(listener).await.expect("serve");
    });
    (addr, handle, task)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}")).await.expect("connect");
    client
}

async fn next_frame(client: &mut Client) -> Frame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("frame within 2s")
            .expect("stream open")
            .expect("no read error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("valid frame JSON");
        }
    }
}

#[tokio::test]
async fn ten_hz_stream_delivers_ten_frames_in_about_a_second() {
    let config = ServerConfig {
        rate_hz: 10.0,
        ..ServerConfig::default()
    };
    let (addr, shutdown, _task) = start(config).await;
    let mut client = connect(addr).await;

    let first = next_frame(&mut client).await;
    let started = Instant::now();
    let mut frames = vec![first];
    for _ in 0..10 {
        frames.push(next_frame(&mut client).await);
    }
    let elapsed = started.elapsed();

    // Ten intervals of 100 ms after the first frame.
    assert!(
        elapsed >= Duration::from_millis(900) && elapsed <= Duration::from_millis(1300),
        "10 frames took {elapsed:?}"
    );
    for f in &frames {
        assert!(f.imu.pitch.is_some());
        assert!(f.imu.yaw.is_some());
    }

    shutdown.trigger();
}

#[tokio::test]
async fn ramp_profile_streams_roll_only() {
    let config = ServerConfig {
        rate_hz: 200.0,
        signal: SignalConfig {
            profile: Profile::Ramp,
            ..SignalConfig::default()
        },
        ..ServerConfig::default()
    };
    let (addr, shutdown, _task) = start(config).await;
    let mut client = connect(addr).await;

    let mut rolls = Vec::new();
    for _ in 0..65 {
        let f = next_frame(&mut client).await;
        assert!(f.imu.pitch.is_none() && f.imu.yaw.is_none());
        rolls.push(f.imu.roll);
    }
    assert_eq!(rolls[0], 2.95);
    assert!(rolls[59..].iter().all(|r| *r == 0.0));

    shutdown.trigger();
}

#[tokio::test]
async fn sessions_get_independent_models() {
    let config = ServerConfig {
        rate_hz: 100.0,
        signal: SignalConfig {
            profile: Profile::Ramp,
            ..SignalConfig::default()
        },
        ..ServerConfig::default()
    };
    let (addr, shutdown, _task) = start(config).await;

    let mut a = connect(addr).await;
    for _ in 0..30 {
        next_frame(&mut a).await;
    }
    // A late joiner starts from the baseline, not from where `a` is.
    let mut b = connect(addr).await;
    assert_eq!(next_frame(&mut b).await.imu.roll, 2.95);

    shutdown.trigger();
}

#[tokio::test]
async fn listener_survives_a_consumer_disconnect() {
    let config = ServerConfig {
        rate_hz: 50.0,
        ..ServerConfig::default()
    };
    let (addr, shutdown, _task) = start(config).await;

    let mut a = connect(addr).await;
    next_frame(&mut a).await;
    a.close(None).await.expect("close");
    drop(a);

    let mut b = connect(addr).await;
    next_frame(&mut b).await;

    shutdown.trigger();
}

#[tokio::test]
async fn shutdown_stops_server_and_ends_streams() {
    let config = ServerConfig {
        rate_hz: 20.0,
        ..ServerConfig::default()
    };
    let (addr, shutdown, task) = start(config).await;
    let mut client = connect(addr).await;
    next_frame(&mut client).await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("serve returns after shutdown")
        .unwrap();

    // Sessions are drained before `serve` returns, so the close frame is
    // already on the wire.
    let closed = tokio::time::timeout(Duration::from_secs(1), async {
        while let Some(msg) = client.next().await {
            match msg {
                Ok(Message::Close(_)) => return true,
                Ok(_) => {}
                Err(_) => return false,
            }
        }
        false
    })
    .await
    .expect("stream ends after shutdown");
    assert!(closed, "server did not send a close frame");
}

#[tokio::test]
async fn shutdown_waits_for_every_session_to_close() {
    let config = ServerConfig {
        rate_hz: 20.0,
        ..ServerConfig::default()
    };
    let (addr, shutdown, task) = start(config).await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        let mut client = connect(addr).await;
        next_frame(&mut client).await;
        clients.push(client);
    }

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("serve returns after shutdown")
        .unwrap();

    for mut client in clients {
        let close = tokio::time::timeout(Duration::from_millis(500), async {
            loop {
                match client.next().await {
                    Some(Ok(Message::Close(_))) => return true,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => return false,
                }
            }
        })
        .await
        .expect("close frame buffered before serve returned");
        assert!(close);
    }
}
