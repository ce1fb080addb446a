//! Trait abstraction over the connection manager.
//!
//! [`PlcLink`] exposes exactly the operations of [`PlcConn`], so callers can
//! depend on the trait and substitute an in-memory fake in tests without any
//! network I/O.
//!
//! The blanket impl for `Option<L>` carries the absent-handle contract:
//! operations on `None` fail with [`PlcConnError::NotInitialized`],
//! `is_connected` fails closed to `false`, and `set_timeout` is a no-op.
//! This lets a caller hold an optional handle and drive it uniformly.

use std::time::Duration;

use crate::conn::PlcConn;
use crate::error::{PlcConnError, Result};

/// Operations of a PLC connection manager.
///
/// Implemented by [`PlcConn`] over real TCP; test doubles implement it over
/// whatever they like.
///
/// # Example
///
/// ```no_run
/// use plc_conn::{PlcConn, PlcLink};
/// use std::time::Duration;
///
/// fn poll(link: &dyn PlcLink) -> plc_conn::Result<Vec<u8>> {
///     link.open_write_close(b"status?")
/// }
///
/// let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
/// let response = poll(&conn)?;
/// # Ok::<(), plc_conn::PlcConnError>(())
/// ```
pub trait PlcLink {
    /// Opens the connection if it is not already open.
    fn connect(&self) -> Result<()>;

    /// Sends `msg` and returns the response bytes.
    fn write(&self, msg: &[u8]) -> Result<Vec<u8>>;

    /// Returns whether a connection is currently held.
    fn is_connected(&self) -> bool;

    /// Updates the timeout used by subsequent operations.
    fn set_timeout(&self, timeout: Duration);

    /// Closes the connection, leaving the manager disconnected.
    fn close(&self) -> Result<()>;

    /// Connects, writes `msg`, and closes, as one composite call.
    fn open_write_close(&self, msg: &[u8]) -> Result<Vec<u8>>;
}

impl PlcLink for PlcConn {
    fn connect(&self) -> Result<()> {
        PlcConn::connect(self)
    }

    fn write(&self, msg: &[u8]) -> Result<Vec<u8>> {
        PlcConn::write(self, msg)
    }

    fn is_connected(&self) -> bool {
        PlcConn::is_connected(self)
    }

    fn set_timeout(&self, timeout: Duration) {
        PlcConn::set_timeout(self, timeout)
    }

    fn close(&self) -> Result<()> {
        PlcConn::close(self)
    }

    fn open_write_close(&self, msg: &[u8]) -> Result<Vec<u8>> {
        PlcConn::open_write_close(self, msg)
    }
}

impl<L: PlcLink> PlcLink for Option<L> {
    fn connect(&self) -> Result<()> {
        match self {
            Some(link) => link.connect(),
            None => Err(PlcConnError::NotInitialized),
        }
    }

    fn write(&self, msg: &[u8]) -> Result<Vec<u8>> {
        match self {
            Some(link) => link.write(msg),
            None => Err(PlcConnError::NotInitialized),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Some(link) => link.is_connected(),
            None => false,
        }
    }

    fn set_timeout(&self, timeout: Duration) {
        if let Some(link) = self {
            link.set_timeout(timeout);
        }
    }

    fn close(&self) -> Result<()> {
        match self {
            Some(link) => link.close(),
            None => Err(PlcConnError::NotInitialized),
        }
    }

    fn open_write_close(&self, msg: &[u8]) -> Result<Vec<u8>> {
        match self {
            Some(link) => link.open_write_close(msg),
            None => Err(PlcConnError::NotInitialized),
        }
    }
}
