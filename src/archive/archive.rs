use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use flate2::read::DeflateDecoder;
use std::io::Read;

use crate::error::{Result, ZipError};
use crate::io::ReadAt;

use super::parser::DirectoryParser;
use super::structures::{CompressionMethod, ZipEntry};

/// An open archive handle: a byte source plus the entry index.
///
/// The index is built by a single central directory scan at open time and is
/// fixed afterwards. No payload byte is touched until [`read`](Self::read)
/// is called, which makes listing cheap even for archives behind slow or
/// metered sources.
///
/// `read` takes `&self`, so different entries can be read against the same
/// handle without coordination.
pub struct ZipArchive<R: ReadAt> {
    parser: DirectoryParser<R>,
    entries: Vec<ZipEntry>,
}

impl<R: ReadAt> fmt::Debug for ZipArchive<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipArchive")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<R: ReadAt> ZipArchive<R> {
    /// Open an archive: locate and parse the central directory.
    ///
    /// Fails with [`ZipError::Format`] if the directory signature is absent
    /// or the directory is truncated.
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = DirectoryParser::new(reader);
        let entries = parser.scan_directory().await?;
        debug!(entries = entries.len(), "archive opened");
        Ok(Self { parser, entries })
    }

    /// The entry index, in central directory order. No I/O.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Look up an entry by exact name.
    pub fn entry(&self, name: &str) -> Result<&ZipEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ZipError::EntryNotFound(name.to_string()))
    }

    /// Read and decompress one entry's payload.
    ///
    /// Seeks to the entry's payload, reads exactly its compressed size,
    /// decompresses per the recorded method and verifies the CRC-32 from
    /// the central directory.
    pub async fn read(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        let data_offset = self.parser.payload_offset(entry).await?;

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut compressed)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(&compressed[..]);
                let mut decompressed = Vec::with_capacity(entry.uncompressed_size as usize);
                decoder
                    .read_to_end(&mut decompressed)
                    .map_err(|e| ZipError::Decode(format!("corrupt deflate stream: {}", e)))?;
                decompressed
            }
            CompressionMethod::Unknown(method) => {
                return Err(ZipError::UnsupportedCompression(method));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(ZipError::Decode(format!(
                "decompressed size mismatch: expected {}, got {}",
                entry.uncompressed_size,
                data.len()
            )));
        }

        let actual = crc32fast::hash(&data);
        if actual != entry.crc32 {
            return Err(ZipError::ChecksumMismatch {
                name: entry.name.clone(),
                expected: entry.crc32,
                actual,
            });
        }

        Ok(data)
    }

    /// Convenience: look up an entry by name and read it.
    pub async fn read_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.entry(name)?;
        self.read(entry).await
    }

    /// Extract an entry to a file on disk, creating parent directories.
    pub async fn extract_to_file(&self, entry: &ZipEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.read(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;

        Ok(())
    }

    /// Extract an entry to stdout.
    pub async fn extract_to_stdout(&self, entry: &ZipEntry) -> Result<()> {
        let data = self.read(entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;

        Ok(())
    }
}
