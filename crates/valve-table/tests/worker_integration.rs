//! End-to-end tests for the host stack.
//!
//! These drive the full table layout through the public API the binary
//! uses: configuration → endpoint → transport → link → worker.  The far end
//! of the link is a loopback TCP listener standing in for the serial bridge;
//! it decodes whatever arrives with [`FrameDecoder`] exactly as the
//! microcontroller would.
//!
//! ```text
//! ValveHandle ─► valve-worker thread ─► TableLink ─► TcpStream ─► listener
//!                                                                 FrameDecoder
//! ```

use std::io::Read;
use std::net::TcpListener;
use std::thread::JoinHandle;

use valve_core::protocol::DEFAULT_DATA_LINE;
use valve_core::{
    BoardChain, Coordinate, DecodedFrame, FrameDecoder, LinkState, TableLink, TABLE_LAYOUT,
};
use valve_table::application::valve_worker::{spawn_worker, WorkerError};
use valve_table::infrastructure::storage::config::{load_config_from, save_config_to, AppConfig};
use valve_table::infrastructure::transport::{open_transport, Endpoint};

/// Accepts one connection and decodes every frame until the peer hangs up.
fn spawn_bridge() -> (String, JoinHandle<Vec<DecodedFrame>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let join = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).expect("read");

        let mut decoder = FrameDecoder::new();
        decoder
            .feed(&bytes)
            .into_iter()
            .map(|frame| frame.expect("well-formed frame"))
            .collect()
    });

    (format!("tcp://{addr}"), join)
}

// ── Full-table scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_table_over_tcp_bridge() {
    // Arrange
    let (endpoint, bridge) = spawn_bridge();
    let endpoint: Endpoint = endpoint.parse().expect("endpoint");
    let transport = open_transport(&endpoint).expect("connect");
    let link = TableLink::open(transport, &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");
    let (handle, join) = spawn_worker(link, 8).expect("spawn");

    // Act
    handle.set(Coordinate::new(0, 0), true).await.expect("set");
    handle.set(Coordinate::new(13, 11), true).await.expect("set");
    handle.shutdown().await.expect("shutdown");
    let link = join.join().expect("worker thread");
    assert_eq!(link.state(), LinkState::Closed);
    // The bridge reads until the socket is dropped.
    drop(link);
    let frames = bridge.join().expect("bridge thread");

    // Assert: reset, then one full-state frame per command
    assert_eq!(frames.len(), 3);
    assert!(frames[0].is_reset());

    let last = &frames[2];
    assert_eq!(last.selector, DEFAULT_DATA_LINE);
    assert_eq!(last.payload.len(), TABLE_LAYOUT.len());

    let chain = BoardChain::from_specs(&TABLE_LAYOUT).expect("chain");
    assert_eq!(
        chain.decode_state(&last.payload),
        Some(vec![Coordinate::new(0, 0), Coordinate::new(13, 11)])
    );
}

#[tokio::test]
async fn test_fill_then_clear_round_trip_through_bridge() {
    let (endpoint, bridge) = spawn_bridge();
    let transport = open_transport(&endpoint.parse().expect("endpoint")).expect("connect");
    let link = TableLink::open(transport, &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");
    let (handle, join) = spawn_worker(link, 8).expect("spawn");

    handle.fill().await.expect("fill");
    handle.clear().await.expect("clear");
    drop(handle);
    join.join().expect("worker thread");
    let frames = bridge.join().expect("bridge thread");

    assert_eq!(frames.len(), 3);
    assert!(frames[1].payload.iter().all(|&b| b == 0xFF));
    assert!(frames[2].payload.iter().all(|&b| b == 0x00));
}

#[tokio::test]
async fn test_unmapped_cell_sends_nothing_and_worker_survives() {
    let (endpoint, bridge) = spawn_bridge();
    let transport = open_transport(&endpoint.parse().expect("endpoint")).expect("connect");
    let link = TableLink::open(transport, &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");
    let (handle, join) = spawn_worker(link, 8).expect("spawn");

    let rejected = handle.set(Coordinate::new(14, 0), true).await;
    handle.resend().await.expect("resend");
    handle.shutdown().await.expect("shutdown");
    join.join().expect("worker thread");
    let frames = bridge.join().expect("bridge thread");

    assert!(matches!(rejected, Err(WorkerError::Link(_))));
    assert_eq!(frames.len(), 2);
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[test]
fn test_saved_config_drives_endpoint_parsing() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("valve-table-it-{}", std::process::id()));
    let path = dir.join("config.toml");
    let mut config = AppConfig::default();
    config.link.endpoint = "tcp://10.0.0.7:4000".to_string();
    config.link.data_line = 7;

    // Act
    save_config_to(&path, &config).expect("save");
    let loaded = load_config_from(&path).expect("load");
    let endpoint: Endpoint = loaded.link.endpoint.parse().expect("endpoint");

    // Assert
    assert_eq!(loaded, config);
    assert_eq!(endpoint, Endpoint::Tcp("10.0.0.7:4000".to_string()));

    let _ = std::fs::remove_dir_all(&dir);
}
