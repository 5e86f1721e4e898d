//! Concrete transports to the table's microcontroller.
//!
//! Two endpoint kinds are supported:
//!
//! - A serial device node (`/dev/ttyACM0`, `COM3`).  Line settings are not
//!   touched here: the device must already be in raw mode at the configured
//!   baud rate.
//! - A TCP serial bridge (`tcp://host:port`), e.g. `ser2net` on a small board
//!   next to the table.
//!
//! Both are plain byte sinks wrapped in [`StreamTransport`], which writes and
//! flushes one frame at a time.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::info;
use valve_core::link::{StreamTransport, Transport};

const TCP_SCHEME: &str = "tcp://";

/// A transport that can be moved onto the valve worker thread.
pub type BoxedTransport = Box<dyn Transport + Send>;

/// Error type for opening a transport.
#[derive(Debug, Error)]
pub enum TransportOpenError {
    #[error("no endpoint configured")]
    EmptyEndpoint,

    #[error("failed to open serial device {path}: {source}")]
    Device {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to serial bridge {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where the microcontroller is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A serial device node.
    Device(PathBuf),
    /// A TCP serial bridge as `host:port`.
    Tcp(String),
}

impl FromStr for Endpoint {
    type Err = TransportOpenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TransportOpenError::EmptyEndpoint);
        }
        match s.strip_prefix(TCP_SCHEME) {
            Some("") => Err(TransportOpenError::EmptyEndpoint),
            Some(addr) => Ok(Endpoint::Tcp(addr.to_string())),
            None => Ok(Endpoint::Device(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Device(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "{TCP_SCHEME}{addr}"),
        }
    }
}

/// Opens `endpoint` for writing.
///
/// # Errors
///
/// Returns [`TransportOpenError`] if the device cannot be opened or the bridge
/// refuses the connection.
pub fn open_transport(endpoint: &Endpoint) -> Result<BoxedTransport, TransportOpenError> {
    match endpoint {
        Endpoint::Device(path) => {
            let file = open_device(path)?;
            info!("opened serial device {}", path.display());
            Ok(Box::new(StreamTransport::new(file)))
        }
        Endpoint::Tcp(addr) => {
            let stream = TcpStream::connect(addr.as_str()).map_err(|source| {
                TransportOpenError::Connect {
                    addr: addr.clone(),
                    source,
                }
            })?;
            // Frames are tiny; waiting to coalesce them only adds latency.
            stream.set_nodelay(true).ok();
            info!("connected to serial bridge {addr}");
            Ok(Box::new(StreamTransport::new(stream)))
        }
    }
}

fn open_device(path: &Path) -> Result<File, TransportOpenError> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| TransportOpenError::Device {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use valve_core::protocol::reset_frame;

    #[test]
    fn test_parse_device_path() {
        assert_eq!(
            "/dev/ttyACM0".parse::<Endpoint>().expect("parse"),
            Endpoint::Device(PathBuf::from("/dev/ttyACM0"))
        );
    }

    #[test]
    fn test_parse_tcp_bridge() {
        assert_eq!(
            "tcp://10.0.0.5:4000".parse::<Endpoint>().expect("parse"),
            Endpoint::Tcp("10.0.0.5:4000".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            "  ".parse::<Endpoint>(),
            Err(TransportOpenError::EmptyEndpoint)
        ));
        assert!(matches!(
            "tcp://".parse::<Endpoint>(),
            Err(TransportOpenError::EmptyEndpoint)
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["/dev/ttyUSB0", "tcp://bridge.local:2001"] {
            assert_eq!(s.parse::<Endpoint>().expect("parse").to_string(), s);
        }
    }

    #[test]
    fn test_open_missing_device_fails() {
        let endpoint = Endpoint::Device(PathBuf::from("/definitely/not/a/tty"));
        assert!(matches!(
            open_transport(&endpoint),
            Err(TransportOpenError::Device { .. })
        ));
    }

    #[test]
    fn test_device_transport_writes_frames_to_file() {
        // Arrange: a regular file stands in for the device node
        let path = std::env::temp_dir().join(format!("valve-table-dev-{}", std::process::id()));
        File::create(&path).expect("create");
        let mut transport =
            open_transport(&Endpoint::Device(path.clone())).expect("open must succeed");

        // Act
        transport.write_frame(&reset_frame()).expect("write");
        transport.close().expect("close");

        // Assert
        assert_eq!(std::fs::read(&path).expect("read"), reset_frame());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_tcp_transport_delivers_frames() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let endpoint: Endpoint = format!("tcp://{addr}").parse().expect("parse");

        // Act
        let mut transport = open_transport(&endpoint).expect("connect");
        let (mut peer, _) = listener.accept().expect("accept");
        transport.write_frame(&reset_frame()).expect("write");
        drop(transport);

        // Assert
        let mut received = Vec::new();
        peer.read_to_end(&mut received).expect("read");
        assert_eq!(received, reset_frame());
    }
}
