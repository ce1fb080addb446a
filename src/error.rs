//! Error types for PLC connection handling.

use std::io;
use thiserror::Error;

/// Result type alias for connection operations.
pub type Result<T> = std::result::Result<T, PlcConnError>;

/// Errors that can occur while talking to a PLC.
#[derive(Debug, Error)]
pub enum PlcConnError {
    /// Operation invoked on an absent connection handle.
    #[error("connection handle is not initialized")]
    NotInitialized,

    /// Empty message passed to the write path.
    #[error("message is empty")]
    EmptyMessage,

    /// Name resolution or TCP establishment failed (timeout included).
    #[error("failed to connect to {addr}: {source}")]
    Dial {
        /// The `host:port` string that was dialed.
        addr: String,
        /// Underlying network error.
        #[source]
        source: io::Error,
    },

    /// The write+read exchange did not complete within the deadline.
    #[error("communication timeout")]
    Timeout,

    /// I/O error during the write+read exchange.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error while shutting the connection down. The manager is
    /// disconnected afterwards regardless.
    #[error("failed to close connection: {0}")]
    Close(#[source] io::Error),
}

impl PlcConnError {
    /// Creates a new `Dial` error for the given `host:port` string.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_conn::PlcConnError;
    /// use std::io;
    ///
    /// let err = PlcConnError::dial(
    ///     "192.168.1.250:9600",
    ///     io::Error::from(io::ErrorKind::ConnectionRefused),
    /// );
    /// ```
    pub fn dial(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Dial {
            addr: addr.into(),
            source,
        }
    }

    /// Maps an exchange I/O error, folding timeout kinds into [`Timeout`].
    ///
    /// `WouldBlock` is what a socket read/write timeout surfaces as on Unix,
    /// `TimedOut` on Windows.
    ///
    /// [`Timeout`]: PlcConnError::Timeout
    pub(crate) fn exchange(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(err),
        }
    }
}
