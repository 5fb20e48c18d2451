//! Byte-stream transport abstraction.
//!
//! The record layer sits on top of any reliable byte stream. Implementations
//! own all blocking and timeout behavior; the record layer only interprets
//! an empty read as "closed or timed out".

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::{Error, Result};

/// A reliable, ordered byte-stream transport.
pub trait Transport {
    /// Send bytes, returning how many were written.
    ///
    /// Writing fewer bytes than offered is reported as-is; the record layer
    /// treats a short write as a hard error.
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Receive up to `max_len` bytes.
    ///
    /// An empty result means the peer closed the connection or the
    /// transport's read timeout elapsed.
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>>;

    /// Check whether at least one byte can be read within `timeout`.
    fn has_data_available(&mut self, timeout: Duration) -> Result<bool>;

    /// Tear the transport down. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Transport over a blocking TCP stream.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    read_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Wrap a connected TCP stream.
    ///
    /// `read_timeout` bounds every `receive` call; `None` blocks until data
    /// or EOF.
    pub fn new(stream: TcpStream, read_timeout: Option<Duration>) -> Result<Self> {
        stream
            .set_read_timeout(read_timeout)
            .map_err(|e| Error::IoError(e.to_string()))?;
        Ok(Self {
            stream,
            read_timeout,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        match self.stream.write(data) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(Error::TransportClosed),
            Err(e) => Err(Error::IoError(e.to_string())),
        }
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        match self.stream.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            },
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(Vec::new())
            },
            Err(e) => Err(Error::IoError(e.to_string())),
        }
    }

    fn has_data_available(&mut self, timeout: Duration) -> Result<bool> {
        self.stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| Error::IoError(e.to_string()))?;
        let mut probe = [0u8; 1];
        let available = match self.stream.peek(&mut probe) {
            Ok(n) => n > 0,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                false
            },
            Err(e) => return Err(Error::IoError(e.to_string())),
        };
        self.stream
            .set_read_timeout(self.read_timeout)
            .map_err(|e| Error::IoError(e.to_string()))?;
        Ok(available)
    }

    fn close(&mut self) -> Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Already closed; close() is idempotent.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::IoError(e.to_string())),
        }
    }
}

/// Scripted in-memory transport for tests.
///
/// Incoming data is queued as chunks, so tests control exactly how the
/// byte stream is sliced across reads (coalesced records, split headers).
/// Outgoing bytes are captured for inspection. An optional write limit
/// simulates short writes.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    incoming: VecDeque<Vec<u8>>,
    outgoing: Vec<u8>,
    write_limit: Option<usize>,
    closed: bool,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a chunk to be returned by a future `receive` call.
    pub fn push_incoming(&mut self, chunk: impl Into<Vec<u8>>) {
        self.incoming.push_back(chunk.into());
    }

    /// Cap how many bytes a single `send` reports as written.
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// All bytes sent so far.
    pub fn sent(&self) -> &[u8] {
        &self.outgoing
    }

    /// Drop everything captured by `sent()`.
    pub fn clear_sent(&mut self) {
        self.outgoing.clear();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::TransportClosed);
        }
        let written = match self.write_limit {
            Some(limit) => data.len().min(limit),
            None => data.len(),
        };
        self.outgoing.extend_from_slice(&data[..written]);
        Ok(written)
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        match self.incoming.pop_front() {
            None => Ok(Vec::new()),
            Some(mut chunk) => {
                if chunk.len() > max_len {
                    let rest = chunk.split_off(max_len);
                    self.incoming.push_front(rest);
                }
                Ok(chunk)
            },
        }
    }

    fn has_data_available(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.incoming.is_empty())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_chunks_are_preserved() {
        let mut transport = MemoryTransport::new();
        transport.push_incoming(vec![1, 2, 3]);
        transport.push_incoming(vec![4, 5]);

        assert!(transport.has_data_available(Duration::from_millis(1)).unwrap());
        assert_eq!(transport.receive(16).unwrap(), vec![1, 2, 3]);
        assert_eq!(transport.receive(16).unwrap(), vec![4, 5]);
        assert_eq!(transport.receive(16).unwrap(), Vec::<u8>::new());
        assert!(!transport.has_data_available(Duration::from_millis(1)).unwrap());
    }

    #[test]
    fn test_memory_transport_respects_max_len() {
        let mut transport = MemoryTransport::new();
        transport.push_incoming(vec![1, 2, 3, 4, 5]);
        assert_eq!(transport.receive(2).unwrap(), vec![1, 2]);
        assert_eq!(transport.receive(2).unwrap(), vec![3, 4]);
        assert_eq!(transport.receive(2).unwrap(), vec![5]);
    }

    #[test]
    fn test_memory_transport_short_write() {
        let mut transport = MemoryTransport::new();
        transport.set_write_limit(Some(3));
        assert_eq!(transport.send(&[9u8; 10]).unwrap(), 3);
        assert_eq!(transport.sent(), &[9u8; 3]);
    }

    #[test]
    fn test_memory_transport_close() {
        let mut transport = MemoryTransport::new();
        transport.close().unwrap();
        assert!(transport.is_closed());
        assert_eq!(transport.send(b"x"), Err(Error::TransportClosed));
    }
}
