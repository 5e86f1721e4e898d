//! Adapter from any [`std::io::Write`] sink to a [`Transport`].

use std::io::{self, Write};

use super::Transport;

/// Writes each frame in full and flushes, so a frame is never left sitting
/// in a buffer while the caller believes it was sent.
#[derive(Debug)]
pub struct StreamTransport<W: Write> {
    inner: W,
}

impl<W: Write> StreamTransport<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Transport for StreamTransport<W> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.inner.write_all(frame)?;
        self.inner.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_whole_frame() {
        let mut transport = StreamTransport::new(Vec::new());
        transport.write_frame(&[0x02, 0x0B, 0x00]).expect("write");
        assert_eq!(transport.into_inner(), vec![0x02, 0x0B, 0x00]);
    }

    #[test]
    fn test_write_error_propagates() {
        struct Refuse;
        impl Write for Refuse {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::TimedOut, "stalled"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut transport = StreamTransport::new(Refuse);
        let err = transport.write_frame(&[0x01, 0x00]).expect_err("must fail");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
