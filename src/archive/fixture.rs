//! Builds small synthetic tarballs for tests and doc examples.
//!
//! Hidden from the public documentation; not part of the stable API.

use crate::constants::{PAX_GLOBAL_HEADER_NAME, TAR_BLOCK_SIZE};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

/// Appends raw tar records to an in-memory buffer.
#[doc(hidden)]
#[derive(Debug, Default, Clone)]
pub struct TarFixture {
    buf: Vec<u8>,
}

impl TarFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(self, name: &str) -> Self {
        self.record(name, b'5', b"", 0o755, "", "")
    }

    pub fn file(self, name: &str, data: &[u8]) -> Self {
        self.record(name, b'0', data, 0o644, "", "")
    }

    pub fn file_with_mode(self, name: &str, data: &[u8], mode: u32) -> Self {
        self.record(name, b'0', data, mode, "", "")
    }

    /// A file whose path is split across the ustar prefix and name fields.
    pub fn file_with_prefix(self, prefix: &str, name: &str, data: &[u8]) -> Self {
        self.record(name, b'0', data, 0o644, prefix, "")
    }

    pub fn symlink(self, name: &str, target: &str) -> Self {
        self.record(name, b'2', b"", 0o777, "", target)
    }

    /// A GNU long-name record applying to the next entry.
    pub fn long_name(self, name: &str) -> Self {
        let mut data = name.as_bytes().to_vec();
        data.push(0);
        self.record("././@LongLink", b'L', &data, 0o644, "", "")
    }

    /// A PAX extended header carrying a `path` for the next entry.
    pub fn pax_path(self, path: &str) -> Self {
        let body = pax_record("path", path);
        self.record("PaxHeader/entry", b'x', body.as_bytes(), 0o644, "", "")
    }

    /// A PAX global header, named the way hosting providers name it.
    pub fn pax_global(self, key: &str, value: &str) -> Self {
        let body = pax_record(key, value);
        self.record(PAX_GLOBAL_HEADER_NAME, b'g', body.as_bytes(), 0o666, "", "")
    }

    /// Appends an arbitrary record.
    pub fn record(
        mut self,
        name: &str,
        typeflag: u8,
        data: &[u8],
        mode: u32,
        prefix: &str,
        link: &str,
    ) -> Self {
        let mut header = [0u8; TAR_BLOCK_SIZE];
        put(&mut header[0..100], name.as_bytes());
        put(&mut header[100..108], format!("{:07o}\0", mode).as_bytes());
        put(&mut header[108..116], b"0000000\0");
        put(&mut header[116..124], b"0000000\0");
        put(&mut header[124..136], format!("{:011o}\0", data.len()).as_bytes());
        put(&mut header[136..148], b"00000000000\0");
        header[156] = typeflag;
        put(&mut header[157..257], link.as_bytes());
        put(&mut header[257..263], b"ustar\0");
        put(&mut header[263..265], b"00");
        put(&mut header[345..500], prefix.as_bytes());

        header[148..156].fill(b' ');
        let checksum: u32 = header.iter().map(|&b| u32::from(b)).sum();
        put(&mut header[148..156], format!("{:06o}\0 ", checksum).as_bytes());

        self.buf.extend_from_slice(&header);
        self.buf.extend_from_slice(data);
        let rem = data.len() % TAR_BLOCK_SIZE;
        if rem != 0 {
            let padded = self.buf.len() + TAR_BLOCK_SIZE - rem;
            self.buf.resize(padded, 0);
        }
        self
    }

    /// The uncompressed archive, terminated by two zero blocks.
    pub fn tar(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(&[0u8; TAR_BLOCK_SIZE * 2]);
        self.buf
    }

    /// The gzip-compressed archive.
    pub fn gzip(self) -> Vec<u8> {
        let tar = self.tar();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder
            .write_all(&tar)
            .and_then(|_| encoder.finish())
            .expect("in-memory gzip cannot fail")
    }

    /// Writes the gzip-compressed archive to `path`, creating parent directories.
    pub fn write_gz(self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.gzip())
    }
}

fn put(field: &mut [u8], value: &[u8]) {
    let n = value.len().min(field.len());
    field[..n].copy_from_slice(&value[..n]);
}

/// Formats one PAX record; the length prefix counts itself.
fn pax_record(key: &str, value: &str) -> String {
    let body_len = key.len() + value.len() + 3;
    let mut len = body_len + body_len.to_string().len();
    if len.to_string().len() + body_len != len {
        len = body_len + len.to_string().len();
    }
    format!("{} {}={}\n", len, key, value)
}
