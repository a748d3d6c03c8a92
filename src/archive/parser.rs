//! Low-level ZIP directory parser.
//!
//! Handles the binary parsing of ZIP structures, reading from any source
//! that implements the [`ReadAt`] trait.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's tail
//! 2. If ZIP64, follow the locator to the ZIP64 EOCD
//! 3. Read the Central Directory to index all entries
//! 4. For payload access, read the entry's Local File Header to find where
//!    its compressed data begins
//!
//! Only steps 1-3 run at open time; step 4 is deferred until an entry is
//! actually read.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, ZipError};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level directory parser, generic over the byte source.
///
/// Used by [`ZipArchive`](super::ZipArchive) for the one-time directory
/// scan and for locating payload offsets; not usually needed directly.
pub struct DirectoryParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> DirectoryParser<R> {
    /// Create a new parser for the given reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - A shared reference to a reader implementing [`ReadAt`]
    ///
    /// # Returns
    ///
    /// A new parser instance ready to read the archive.
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD is located at the end of the ZIP file. This method handles
    /// both the simple case (no trailing comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Format`] if no valid EOCD can be found,
    /// indicating the source is not a valid ZIP archive.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Fast path: no comment, EOCD sits exactly at the end.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        // The EOCD could be earlier if there's a trailing comment.
        // Search backwards through the maximum comment area.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // Candidate EOCD; the comment length field must account for
                // exactly the remaining bytes, otherwise it's payload data
                // that happens to contain the signature.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(ZipError::Format(
            "end of central directory not found".to_string(),
        ))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD carries sentinel values (0xFFFF /
    /// 0xFFFFFFFF) indicating ZIP64 extensions.
    ///
    /// # Arguments
    ///
    /// * `eocd_offset` - Offset of the regular EOCD in the file
    ///
    /// # Returns
    ///
    /// The parsed ZIP64 EOCD with 64-bit field values.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Format`] if the ZIP64 structures are missing or
    /// invalid.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64Eocd> {
        // The locator sits immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EocdLocator::SIZE as u64)
            .ok_or_else(|| ZipError::Format("ZIP64 locator out of bounds".to_string()))?;
        let mut locator_buf = vec![0u8; Zip64EocdLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EocdLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64Eocd::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64Eocd::from_bytes(&eocd64_buf)
    }

    /// Scan the central directory and build the entry index.
    ///
    /// This is the single directory scan performed at open time. The whole
    /// directory is fetched in one ranged read (one Range request for HTTP
    /// sources), then each file header is parsed in order.
    ///
    /// # Returns
    ///
    /// A vector of [`ZipEntry`] records, one per file/directory in the
    /// archive, in central directory order.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Format`] if the directory is missing, truncated
    /// or malformed.
    pub async fn scan_directory(&self) -> Result<Vec<ZipEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        match cd_offset.checked_add(cd_size) {
            Some(end) if end <= self.size => {}
            _ => {
                return Err(ZipError::Format(
                    "central directory extends past end of archive".to_string(),
                ));
            }
        }

        debug!(cd_offset, cd_size, total_entries, "scanning central directory");

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(&cd_data);

        for _ in 0..total_entries {
            let entry = self.parse_cdfh(&mut cursor)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse one Central Directory File Header from the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Format`] if the header signature is wrong or the
    /// header's fixed or variable-length parts run past the end of the
    /// directory buffer.
    fn parse_cdfh(&self, cursor: &mut Cursor<&Vec<u8>>) -> Result<ZipEntry> {
        let cd_len = cursor.get_ref().len() as u64;

        // A previous header's declared lengths may have pushed the cursor
        // past the buffer; both that and an honest truncation are the same
        // format error.
        match cd_len.checked_sub(cursor.position()) {
            Some(remaining) if remaining >= CDFH_MIN_SIZE as u64 => {}
            _ => {
                return Err(ZipError::Format(
                    "truncated central directory file header".to_string(),
                ));
            }
        }

        // Signature PK\x01\x02
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(ZipError::Format(
                "invalid central directory file header".to_string(),
            ));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

        // The three variable-length parts must fit in the directory buffer
        // before any of them is read or skipped.
        let variable_len =
            file_name_length as u64 + extra_field_length as u64 + file_comment_length as u64;
        if cursor.position() + variable_len > cd_len {
            return Err(ZipError::Format(
                "truncated central directory file header".to_string(),
            ));
        }

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy conversion handles non-UTF8 filenames gracefully
        let name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Directory entries end with '/'
        let is_directory = name.ends_with('/');

        // Walk the extra fields for ZIP64 extended information (ID 0x0001).
        // 64-bit values are present only for fields that carry the sentinel.
        let extra_field_end = cursor.position() + extra_field_length as u64;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;

            if header_id == 0x0001 {
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if header_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                    header_offset = cursor.read_u64::<LittleEndian>()?;
                }
                // Skip any remaining ZIP64 fields (disk number start)
                let remaining = extra_field_end.saturating_sub(cursor.position());
                cursor.set_position(cursor.position() + remaining);
            } else {
                cursor.set_position(cursor.position() + field_size as u64);
            }
        }

        cursor.set_position(extra_field_end);

        // Skip the file comment
        cursor.set_position(cursor.position() + file_comment_length as u64);

        Ok(ZipEntry {
            name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            header_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
        })
    }

    /// Resolve where an entry's compressed payload begins.
    ///
    /// The Local File Header carries its own variable-length name and extra
    /// field, which may differ from the central directory copy, so the
    /// header has to be read to compute the data offset.
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry record from the directory scan
    ///
    /// # Returns
    ///
    /// The byte offset where the compressed file data begins.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::Format`] if the local header is invalid.
    pub async fn payload_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.header_offset, &mut lfh_buf)
            .await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ZipError::Format("invalid local file header".to_string()));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        // Data starts after: LFH (30 bytes) + filename + extra field
        Ok(entry.header_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
