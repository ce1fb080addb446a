//! Example: One-shot exchange with a PLC
//!
//! Run with: cargo run --example open_write_close
//!
//! This example demonstrates:
//! - Constructing a connection manager (no I/O yet)
//! - A composite connect + write + close exchange
//! - Slicing the fixed-size response buffer

use plc_conn::PlcConn;
use std::time::Duration;

fn main() -> plc_conn::Result<()> {
    // =========================================================================
    // Construct the manager
    // =========================================================================

    let conn = PlcConn::new("192.168.1.1", 1025, Duration::from_secs(5));

    // =========================================================================
    // One-shot exchange
    // =========================================================================

    let request = [0x01, 0x02, 0x03, 0x04];
    let response = conn.open_write_close(&request)?;

    // The buffer is always 256 bytes; the caller knows the reply length
    // for its protocol and slices accordingly.
    println!("first 8 bytes: {}", hex::encode(&response[..8]));
    assert!(!conn.is_connected());

    // =========================================================================
    // Persistent connection across several exchanges
    // =========================================================================

    conn.connect()?;
    for request in [&[0x01u8, 0x00][..], &[0x01, 0x01], &[0x01, 0x02]] {
        let response = conn.write(request)?;
        println!("{} -> {}", hex::encode(request), hex::encode(&response[..8]));
    }
    conn.close()?;

    Ok(())
}
