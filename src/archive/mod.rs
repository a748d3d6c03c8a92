//! Lazy ZIP archive access.
//!
//! ## Architecture
//!
//! - [`structures`]: data structures for ZIP format elements (EOCD, file
//!   headers, entry records)
//! - [`parser`]: low-level parsing of ZIP structures from raw bytes
//! - [`ZipArchive`]: the archive handle exposed to users
//!
//! ## Laziness
//!
//! A ZIP file keeps its index (the central directory) at the end, so a
//! handle can be opened by reading only the file's tail: EOCD first, then
//! the central directory. The entry set is fixed at that point. Payloads
//! are decompressed one entry at a time, only when asked for, which is what
//! makes this reader useful against large local archives and remote ones
//! behind HTTP Range requests.
//!
//! ## Supported features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for archives > 4GB
//! - STORED (no compression) and DEFLATE methods, CRC-32 verified
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod archive;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use parser::DirectoryParser;
pub use structures::*;
