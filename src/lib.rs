//! # PLC Connection Library
//!
//! A minimal, thread-safe TCP client for exchanging request/response messages
//! with an industrial controller (PLC) over a single persistent connection.
//!
//! This is a **transport-only** library—no protocol framing, parsing, polling,
//! or application-level features. Payloads are opaque bytes supplied by the
//! caller; the reply is whatever one read returns.
//!
//! ## Features
//!
//! - **Transport-only** — opaque bytes out, raw bytes in, no protocol knowledge
//! - **Thread-safe** — one mutex serializes every operation on the connection
//! - **Lazy** — the connection is dialed on first use and reused until closed
//! - **Deadline-bounded** — dial and each write+read exchange honor the timeout
//! - **No panics** — all errors returned as `Result<T, PlcConnError>`
//! - **Testable** — the [`PlcLink`] trait admits in-memory fakes
//!
//! ## Quick Start
//!
//! ```no_run
//! use plc_conn::PlcConn;
//! use std::time::Duration;
//!
//! fn main() -> plc_conn::Result<()> {
//!     let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
//!
//!     // One-shot: dial, exchange, tear down
//!     let response = conn.open_write_close(&[0x01, 0x02, 0x03, 0x04])?;
//!     println!("first 8 bytes: {:?}", &response[..8]);
//!
//!     // Or keep the connection for several exchanges
//!     conn.connect()?;
//!     let first = conn.write(b"read d100")?;
//!     let second = conn.write(b"read d200")?;
//!     println!("{:?} {:?}", &first[..8], &second[..8]);
//!     conn.close()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Response buffer
//!
//! Every exchange returns a buffer of exactly [`RECV_BUF_LEN`] (256) bytes,
//! filled by a single read. A longer response is truncated; a shorter one
//! leaves the tail zeroed. The manager does not report the actual byte
//! count—callers must know their protocol's response length and slice the
//! buffer themselves.
//!
//! ## Concurrency
//!
//! A [`PlcConn`] can be shared across threads (`&self` everywhere). Callers
//! queue on an internal mutex, so exchanges are serialized, never pipelined.
//! [`set_timeout`](PlcConn::set_timeout) is lock-free and applies from the
//! next operation.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, PlcConnError>`]. The library never
//! panics in public code and never retries: every failure is surfaced to the
//! caller, which owns the recovery policy.
//!
//! ```no_run
//! use plc_conn::{PlcConn, PlcConnError};
//! use std::time::Duration;
//!
//! let conn = PlcConn::new("192.168.1.250", 9600, Duration::from_secs(1));
//!
//! match conn.open_write_close(b"hello") {
//!     Ok(response) => println!("reply: {:?}", &response[..8]),
//!     Err(PlcConnError::Timeout) => println!("controller did not answer in time"),
//!     Err(PlcConnError::Dial { addr, source }) => {
//!         println!("cannot reach {}: {}", addr, source);
//!     }
//!     Err(e) => println!("error: {}", e),
//! }
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Each operation does exactly what it says
//! 2. No magic or implicit behavior—no reconnects, retries, or pooling
//! 3. The application has full control over recovery and scheduling
//! 4. Errors are always explicit and descriptive

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod conn;
mod error;
mod link;

// Public re-exports
pub use conn::{PlcConn, DEFAULT_TIMEOUT, RECV_BUF_LEN};
pub use error::{PlcConnError, Result};
pub use link::PlcLink;
