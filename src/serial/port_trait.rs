//! Trait abstraction for the IMU byte transport to enable testing

use async_trait::async_trait;
use std::io;
use std::time::Duration;

/// Byte-stream transport the acquisition loop drives
///
/// Opening the transport is the implementor's constructor; the loop only needs
/// the primitives below.
#[async_trait]
pub trait ImuTransport: Send {
    /// Upper bound on how long a single `read` may wait for data
    fn set_read_timeout(&mut self, timeout: Duration);

    /// Byte that ends a read early once received (`None` disables)
    fn set_line_termination(&mut self, terminator: Option<u8>);

    /// Write all of `data`, returning the number of bytes written
    async fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read into `buf`; returns 0 when the timeout elapses with no data
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Bytes received and not yet read
    fn pending_byte_count(&self) -> io::Result<usize>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;

    /// Discard any buffered input
    fn reset(&mut self) -> io::Result<()>;
}
