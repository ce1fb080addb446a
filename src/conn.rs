//! TCP connection manager for PLC request/response exchanges.
//!
//! This module provides the [`PlcConn`] struct which owns at most one live
//! TCP connection to a PLC and serializes all access to it. The manager is
//! completely protocol agnostic—it only knows about sockets and bytes.
//!
//! # Design
//!
//! The manager follows these principles:
//!
//! - **Protocol agnostic** - Request and response payloads are opaque bytes
//! - **Synchronous** - Blocking dial/write/read, each bounded by the timeout
//! - **Serialized** - One mutex, one in-flight operation; concurrent callers
//!   queue rather than pipeline
//! - **Lazy** - The connection is dialed on first use and reused until closed
//!
//! # Constants
//!
//! - [`DEFAULT_TIMEOUT`] - Default timeout (2 seconds)
//! - [`RECV_BUF_LEN`] - Receive buffer capacity (256 bytes)
//!
//! # Example
//!
//! ```no_run
//! use plc_conn::PlcConn;
//! use std::time::Duration;
//!
//! let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
//!
//! // One-shot exchange: dial, send, receive, tear down
//! let response = conn.open_write_close(&[0x01, 0x02, 0x03, 0x04])?;
//! # Ok::<(), plc_conn::PlcConnError>(())
//! ```

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{PlcConnError, Result};

/// Default timeout for dialing and for each write+read exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Receive buffer capacity in bytes.
///
/// Every exchange reads into a buffer of exactly this size; responses longer
/// than this are truncated at the first read.
pub const RECV_BUF_LEN: usize = 256;

/// Thread-safe TCP connection manager for a single PLC endpoint.
///
/// Owns at most one live connection. All operations that touch the
/// connection slot take a single mutex for the whole call, so concurrent
/// callers are serialized, never interleaved. The connection is dialed
/// lazily: both [`connect`](PlcConn::connect) and [`write`](PlcConn::write)
/// establish it when absent, and an established connection is reused as-is
/// without a liveness check.
///
/// Each operation does exactly what it says: no automatic reconnects, no
/// retries, no pooling. Callers drive recovery by closing and dialing again.
///
/// # Example
///
/// ```no_run
/// use plc_conn::PlcConn;
/// use std::time::Duration;
///
/// let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
///
/// conn.connect()?;
/// let response = conn.write(b"hello")?;
/// conn.close()?;
/// # Ok::<(), plc_conn::PlcConnError>(())
/// ```
pub struct PlcConn {
    address: String,
    port: u16,
    // Milliseconds; an atomic so the setter never waits on the mutex. An
    // update racing an in-flight exchange applies from the next operation.
    timeout_ms: AtomicU64,
    stream: Mutex<Option<TcpStream>>,
}

impl PlcConn {
    /// Creates a new, disconnected manager for the given endpoint.
    ///
    /// Pure construction—no I/O happens until [`connect`](PlcConn::connect)
    /// or [`write`](PlcConn::write) is called.
    ///
    /// # Arguments
    ///
    /// * `address` - Hostname or IP literal of the PLC
    /// * `port` - Remote TCP port
    /// * `timeout` - Applied to dialing and to each write+read exchange
    ///
    /// # Example
    ///
    /// ```
    /// use plc_conn::PlcConn;
    /// use std::time::Duration;
    ///
    /// let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
    /// assert!(!conn.is_connected());
    /// ```
    pub fn new(address: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            port,
            timeout_ms: AtomicU64::new(timeout.as_millis() as u64),
            stream: Mutex::new(None),
        }
    }

    /// Creates a new manager with the default timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_conn::PlcConn;
    ///
    /// let conn = PlcConn::with_default_timeout("192.168.1.250", 9600);
    /// ```
    pub fn with_default_timeout(address: impl Into<String>, port: u16) -> Self {
        Self::new(address, port, DEFAULT_TIMEOUT)
    }

    /// Opens the TCP connection if it is not already open.
    ///
    /// An already established connection is kept and reused without
    /// re-dialing or probing liveness. A failed dial leaves the manager
    /// disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`PlcConnError::Dial`] if name resolution or TCP
    /// establishment fails, including establishment timeout.
    pub fn connect(&self) -> Result<()> {
        let mut slot = self.lock_slot();
        self.ensure_connected(&mut slot)?;
        Ok(())
    }

    /// Sends `msg` and returns one read's worth of response bytes.
    ///
    /// Dials lazily if disconnected, then performs a write-then-read
    /// exchange under a single absolute deadline of now + timeout: a slow
    /// write eats into the read budget.
    ///
    /// The returned buffer is always [`RECV_BUF_LEN`] bytes. Exactly one
    /// read is issued, so a longer response is truncated and a shorter one
    /// leaves the tail zeroed; the actual byte count is not reported.
    /// Callers must know the expected response length and slice the buffer
    /// accordingly.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `msg` is empty ([`PlcConnError::EmptyMessage`], no I/O attempted)
    /// - The lazy dial fails ([`PlcConnError::Dial`])
    /// - The deadline expires ([`PlcConnError::Timeout`])
    /// - The write or read fails ([`PlcConnError::Io`])
    ///
    /// A write or read failure leaves the connection open; callers decide
    /// whether to [`close`](PlcConn::close) and dial again.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plc_conn::PlcConn;
    /// use std::time::Duration;
    ///
    /// let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
    /// let response = conn.write(b"hello")?;
    /// println!("reply: {:?}", &response[..8]);
    /// # Ok::<(), plc_conn::PlcConnError>(())
    /// ```
    pub fn write(&self, msg: &[u8]) -> Result<Vec<u8>> {
        if msg.is_empty() {
            return Err(PlcConnError::EmptyMessage);
        }
        let mut slot = self.lock_slot();
        let stream = self.ensure_connected(&mut slot)?;
        self.exchange(stream, msg)
    }

    /// Returns whether a connection is currently held.
    ///
    /// This is a pure state read, not a liveness probe: a connection the
    /// remote end has silently dropped still reports `true` until
    /// [`close`](PlcConn::close) is called.
    pub fn is_connected(&self) -> bool {
        self.lock_slot().is_some()
    }

    /// Updates the timeout used by subsequent operations.
    ///
    /// Lock-free: never waits on an in-flight operation. An operation
    /// already past its lock acquisition keeps the timeout it started with.
    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Relaxed);
    }

    /// Returns the currently configured timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed))
    }

    /// Returns the remote address the manager was constructed with.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the remote port the manager was constructed with.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Closes the connection if one is open.
    ///
    /// The connection slot is cleared unconditionally, so the manager is
    /// disconnected afterwards even when shutdown reports an error. Calling
    /// this while already disconnected is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PlcConnError::Close`] if the socket shutdown fails. A peer
    /// that already tore the connection down does not count as a failure.
    pub fn close(&self) -> Result<()> {
        let mut slot = self.lock_slot();
        match slot.take() {
            Some(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                Err(e) => Err(PlcConnError::Close(e)),
            },
            None => Ok(()),
        }
    }

    /// Connects, writes `msg`, and closes, as one composite call.
    ///
    /// The close runs whether the exchange succeeded or failed; its outcome
    /// is discarded, and the connect or write error (in that order) is what
    /// the caller sees. On success returns the exchange response, and the
    /// manager is left disconnected.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](PlcConn::connect) and [`write`](PlcConn::write).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plc_conn::PlcConn;
    /// use std::time::Duration;
    ///
    /// let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
    /// let response = conn.open_write_close(b"hello")?;
    /// assert!(!conn.is_connected());
    /// # Ok::<(), plc_conn::PlcConnError>(())
    /// ```
    pub fn open_write_close(&self, msg: &[u8]) -> Result<Vec<u8>> {
        self.connect()?;
        let result = self.write(msg);
        // best-effort teardown; the exchange outcome is what the caller sees
        let _ = self.close();
        result
    }

    // A poisoned lock means another thread panicked mid-call; the slot is
    // still either empty or an open stream, so the guard stays usable.
    fn lock_slot(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.stream.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Dials the endpoint if the slot is empty, reusing any held connection.
    fn ensure_connected<'a>(
        &self,
        slot: &'a mut Option<TcpStream>,
    ) -> Result<&'a mut TcpStream> {
        match slot {
            Some(stream) => Ok(stream),
            None => {
                let stream = self.dial()?;
                Ok(slot.insert(stream))
            }
        }
    }

    fn dial(&self) -> Result<TcpStream> {
        let addr_str = format!("{}:{}", self.address, self.port);
        let addr = addr_str
            .to_socket_addrs()
            .map_err(|e| PlcConnError::dial(&addr_str, e))?
            .next()
            .ok_or_else(|| {
                PlcConnError::dial(
                    &addr_str,
                    io::Error::new(io::ErrorKind::NotFound, "no address resolved"),
                )
            })?;
        TcpStream::connect_timeout(&addr, self.timeout())
            .map_err(|e| PlcConnError::dial(&addr_str, e))
    }

    /// One write-then-read round trip under a single absolute deadline.
    fn exchange(&self, stream: &mut TcpStream, msg: &[u8]) -> Result<Vec<u8>> {
        let timeout = self.timeout();
        let deadline = Instant::now() + timeout;

        stream.set_write_timeout(Some(timeout))?;
        stream.write_all(msg).map_err(PlcConnError::exchange)?;

        // Whatever the write left of the budget bounds the read.
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(PlcConnError::Timeout);
        }
        stream.set_read_timeout(Some(remaining))?;

        let mut buf = vec![0u8; RECV_BUF_LEN];
        match stream.read(&mut buf) {
            Ok(_) => Ok(buf),
            Err(e) => Err(PlcConnError::exchange(e)),
        }
    }
}

impl std::fmt::Debug for PlcConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlcConn")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("timeout", &self.timeout())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;

    /// Starts a listener on a random loopback port. Each accepted connection
    /// is served `exchanges` times: read up to [`RECV_BUF_LEN`] bytes, write
    /// back `b"response"`, then close.
    fn spawn_responder(exchanges: usize) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { return };
                for _ in 0..exchanges {
                    let mut buf = [0u8; RECV_BUF_LEN];
                    if stream.read(&mut buf).is_err() {
                        break;
                    }
                    if stream.write_all(b"response").is_err() {
                        break;
                    }
                }
            }
        });
        addr
    }

    /// Binds and immediately drops a listener to get a port with nothing
    /// listening on it.
    fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_starts_disconnected() {
        let conn = PlcConn::new("127.0.0.1", 9600, Duration::from_secs(1));
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_connect_ok() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        conn.connect().unwrap();
        assert!(conn.is_connected());
        conn.close().unwrap();
    }

    #[test]
    fn test_connect_resolves_hostname() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("localhost", addr.port(), Duration::from_secs(1));

        conn.connect().unwrap();
        assert!(conn.is_connected());
        conn.close().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        let conn = PlcConn::new("127.0.0.1", unused_port(), Duration::from_secs(1));

        let err = conn.connect().unwrap_err();
        assert!(matches!(err, PlcConnError::Dial { .. }));
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        conn.connect().unwrap();
        conn.connect().unwrap();
        assert!(conn.is_connected());

        // The reused connection still carries an exchange.
        let resp = conn.write(b"hello").unwrap();
        assert_eq!(&resp[..8], b"response");
        conn.close().unwrap();
    }

    #[test]
    fn test_write_rejects_empty_message() {
        let conn = PlcConn::new("127.0.0.1", unused_port(), Duration::from_secs(1));

        // No I/O happens: the unreachable port never surfaces.
        let err = conn.write(&[]).unwrap_err();
        assert!(matches!(err, PlcConnError::EmptyMessage));
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_write_returns_response() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        conn.connect().unwrap();
        let resp = conn.write(b"hello").unwrap();
        assert_eq!(resp.len(), RECV_BUF_LEN);
        assert_eq!(&resp[..8], b"response");
        // The tail past the reply stays zeroed.
        assert!(resp[8..].iter().all(|&b| b == 0));
        conn.close().unwrap();
    }

    #[test]
    fn test_write_dials_lazily() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        let resp = conn.write(b"hello").unwrap();
        assert_eq!(&resp[..8], b"response");
        assert!(conn.is_connected());
        conn.close().unwrap();
    }

    #[test]
    fn test_write_times_out_on_silent_server() {
        // Accepts but never responds.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            // Hold the connection open until the client gives up.
            thread::sleep(Duration::from_millis(500));
            drop(stream);
        });

        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_millis(100));
        let err = conn.write(b"hello").unwrap_err();
        assert!(matches!(err, PlcConnError::Timeout));
        // The connection is left open for the caller to deal with.
        assert!(conn.is_connected());
        conn.close().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_is_connected_lifecycle() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        assert!(!conn.is_connected());
        conn.connect().unwrap();
        assert!(conn.is_connected());
        conn.close().unwrap();
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_close_is_idempotent() {
        let conn = PlcConn::new("127.0.0.1", 9600, Duration::from_secs(1));

        conn.close().unwrap();
        conn.close().unwrap();
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_close_after_peer_closed() {
        // Accepts and closes immediately.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));
        conn.connect().unwrap();
        thread::sleep(Duration::from_millis(50));

        conn.close().unwrap();
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_set_timeout_applies_to_next_operation() {
        let conn = PlcConn::new("127.0.0.1", 9600, Duration::from_secs(5));
        assert_eq!(conn.timeout(), Duration::from_secs(5));

        conn.set_timeout(Duration::from_millis(250));
        assert_eq!(conn.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_open_write_close() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        let resp = conn.open_write_close(b"hello").unwrap();
        assert_eq!(&resp[..8], b"response");
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_open_write_close_unreachable() {
        let conn = PlcConn::new("127.0.0.1", unused_port(), Duration::from_secs(1));

        let err = conn.open_write_close(b"hello").unwrap_err();
        assert!(matches!(err, PlcConnError::Dial { .. }));
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_open_write_close_closes_after_write_error() {
        let addr = spawn_responder(1);
        let conn = PlcConn::new("127.0.0.1", addr.port(), Duration::from_secs(1));

        // Connect succeeds, the empty message fails the write, and the
        // composite still tears the connection down.
        let err = conn.open_write_close(&[]).unwrap_err();
        assert!(matches!(err, PlcConnError::EmptyMessage));
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        const WRITERS: usize = 4;

        let addr = spawn_responder(WRITERS);
        let conn = Arc::new(PlcConn::new(
            "127.0.0.1",
            addr.port(),
            Duration::from_secs(1),
        ));
        conn.connect().unwrap();

        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let conn = Arc::clone(&conn);
                thread::spawn(move || conn.write(b"ping").unwrap())
            })
            .collect();

        for handle in handles {
            let resp = handle.join().unwrap();
            assert_eq!(&resp[..8], b"response");
        }
        conn.close().unwrap();
    }

    #[test]
    fn test_debug_output() {
        let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
        let debug_str = format!("{:?}", conn);
        assert!(debug_str.contains("PlcConn"));
        assert!(debug_str.contains("192.168.1.250"));
    }
}
