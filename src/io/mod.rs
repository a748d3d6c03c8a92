mod http;
mod local;
mod memory;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use memory::MemoryReader;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for random access reading from a byte source.
///
/// Reads are positionless: the source carries no cursor, so several entries
/// can be read against the same archive handle without coordination.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    ///
    /// Returns the number of bytes read, which may be less than the buffer
    /// length (short read at end of source, interrupted syscall).
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read exactly `buf.len()` bytes at the specified offset.
    ///
    /// Loops over [`read_at`](Self::read_at) until the buffer is full and
    /// fails with an `UnexpectedEof` I/O error if the source runs out first,
    /// so callers never see a partially filled buffer.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
            }
            filled += n;
        }
        Ok(())
    }
}
