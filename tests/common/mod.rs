//! Test fixtures: ZIP archives built byte-by-byte.
//!
//! Writing the format by hand keeps the tests independent of the reader
//! under test and makes it easy to produce deliberately broken archives.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

#[derive(Clone, Copy)]
pub enum Method {
    Stored,
    Deflate,
    /// Record an arbitrary method id while storing the payload raw.
    Raw(u16),
}

impl Method {
    fn as_u16(self) -> u16 {
        match self {
            Method::Stored => 0,
            Method::Deflate => 8,
            Method::Raw(v) => v,
        }
    }
}

struct Entry {
    name: String,
    data: Vec<u8>,
    method: Method,
}

/// Builds a well-formed single-disk ZIP archive in memory.
pub struct ArchiveBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, data: &[u8], method: Method) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: data.to_vec(),
            method,
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.entries.push(Entry {
            name: name.to_string(),
            data: Vec::new(),
            method: Method::Stored,
        });
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        assert!(comment.len() <= 0xFFFF);
        self.comment = comment.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let crc = crc32fast::hash(&entry.data);
            let compressed = match entry.method {
                Method::Deflate => {
                    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(&entry.data).unwrap();
                    encoder.finish().unwrap()
                }
                Method::Stored | Method::Raw(_) => entry.data.clone(),
            };

            let header_offset = out.len() as u32;

            // Local file header
            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap(); // version needed
            out.write_u16::<LittleEndian>(0).unwrap(); // flags
            out.write_u16::<LittleEndian>(entry.method.as_u16()).unwrap();
            out.write_u16::<LittleEndian>(0x6C3B).unwrap(); // mod time 13:33:54
            out.write_u16::<LittleEndian>(0x5965).unwrap(); // mod date 2024-11-05
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(compressed.len() as u32)
                .unwrap();
            out.write_u32::<LittleEndian>(entry.data.len() as u32)
                .unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16)
                .unwrap();
            out.write_u16::<LittleEndian>(0).unwrap(); // extra len
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&compressed);

            // Central directory file header
            central.extend_from_slice(b"PK\x01\x02");
            central.write_u16::<LittleEndian>(20).unwrap(); // version made by
            central.write_u16::<LittleEndian>(20).unwrap(); // version needed
            central.write_u16::<LittleEndian>(0).unwrap(); // flags
            central
                .write_u16::<LittleEndian>(entry.method.as_u16())
                .unwrap();
            central.write_u16::<LittleEndian>(0x6C3B).unwrap();
            central.write_u16::<LittleEndian>(0x5965).unwrap();
            central.write_u32::<LittleEndian>(crc).unwrap();
            central
                .write_u32::<LittleEndian>(compressed.len() as u32)
                .unwrap();
            central
                .write_u32::<LittleEndian>(entry.data.len() as u32)
                .unwrap();
            central
                .write_u16::<LittleEndian>(entry.name.len() as u16)
                .unwrap();
            central.write_u16::<LittleEndian>(0).unwrap(); // extra len
            central.write_u16::<LittleEndian>(0).unwrap(); // comment len
            central.write_u16::<LittleEndian>(0).unwrap(); // disk number start
            central.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
            central.write_u32::<LittleEndian>(0).unwrap(); // external attrs
            central.write_u32::<LittleEndian>(header_offset).unwrap();
            central.extend_from_slice(entry.name.as_bytes());
        }

        let cd_offset = out.len() as u32;
        let cd_size = central.len() as u32;
        out.extend_from_slice(&central);

        // End of central directory
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap(); // disk number
        out.write_u16::<LittleEndian>(0).unwrap(); // disk with cd
        out.write_u16::<LittleEndian>(self.entries.len() as u16)
            .unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16)
            .unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16)
            .unwrap();
        out.extend_from_slice(&self.comment);

        out
    }
}
