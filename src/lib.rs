//! # lazyzip
//!
//! A lazy ZIP reader: index first, decompress on demand.
//!
//! Opening an archive parses only the central directory at the end of the
//! file, producing an immutable index of entry records. No compressed
//! payload is read until a specific entry is requested. This makes listing
//! and selective extraction cheap, whether the archive sits on disk, in
//! memory, or behind an HTTP server that honours Range requests.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lazyzip::{LocalFileReader, ZipArchive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("archive.zip".as_ref())?);
//!     let archive = ZipArchive::open(reader).await?;
//!
//!     // The index is in memory; nothing else has been read yet.
//!     for entry in archive.entries() {
//!         println!("{} ({} bytes)", entry.name, entry.uncompressed_size);
//!     }
//!
//!     // Only now is this entry's payload fetched and decompressed.
//!     let bytes = archive.read_by_name("readme.txt").await?;
//!     println!("{}", String::from_utf8_lossy(&bytes));
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;

pub use archive::{CompressionMethod, ZipArchive, ZipEntry};
pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
