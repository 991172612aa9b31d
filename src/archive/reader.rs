//! A reader for the subset of the tar format hosting providers emit.
//!
//! The decompressed archive is held in memory and walked in 512-byte header
//! blocks. Metadata records (PAX `x`/`g`, GNU long names `L`) are consumed by the
//! iterator itself and applied to the entry that follows them, so callers only
//! ever see entries with their final, resolved name.

use crate::constants::TAR_BLOCK_SIZE;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::{self, Read};
use std::ops::Range;

const NAME: Range<usize> = 0..100;
const MODE: Range<usize> = 100..108;
const SIZE: Range<usize> = 124..136;
const TYPEFLAG: usize = 156;
const MAGIC: Range<usize> = 257..263;
const PREFIX: Range<usize> = 345..500;

/// The kind of a tar entry, as far as extraction is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, hardlinks, devices, ... Walked over but never extracted.
    Other,
}

impl EntryKind {
    fn from_typeflag(flag: u8) -> Self {
        match flag {
            b'5' => EntryKind::Directory,
            b'0' | 0 => EntryKind::File,
            _ => EntryKind::Other,
        }
    }
}

/// A single logical entry of a tar archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    /// The effective name, after ustar prefix, GNU long-name and PAX overrides.
    pub name: String,
    /// The name as stored in the header's name field.
    pub raw_name: String,
    pub kind: EntryKind,
    pub mode: u32,
    pub size: u64,
    /// The entry's content, borrowed from the decompressed archive.
    pub data: &'a [u8],
}

/// Decompresses a gzip buffer into memory.
pub fn gunzip(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4));
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Iterates over the entries of an uncompressed tar buffer.
///
/// # Examples
/// ```
/// use gitsnap::archive::{gunzip, Entries, EntryKind};
/// use gitsnap::archive::fixture::TarFixture;
///
/// let gz = TarFixture::new().dir("repo-abc/").file("repo-abc/a.txt", b"hi").gzip();
/// let tar = gunzip(&gz).unwrap();
/// let names: Vec<_> = Entries::new(&tar).map(|e| (e.name, e.kind)).collect();
/// assert_eq!(names, vec![
///     ("repo-abc/".to_string(), EntryKind::Directory),
///     ("repo-abc/a.txt".to_string(), EntryKind::File),
/// ]);
/// ```
#[derive(Debug)]
pub struct Entries<'a> {
    buf: &'a [u8],
    offset: usize,
    pending_long_name: Option<String>,
    pending_pax: Option<HashMap<String, String>>,
    global_pax: HashMap<String, String>,
}

impl<'a> Entries<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            pending_long_name: None,
            pending_pax: None,
            global_pax: HashMap::new(),
        }
    }

    /// Fields of the global PAX headers seen so far.
    ///
    /// They are recorded but not applied to entry names.
    pub fn global_headers(&self) -> &HashMap<String, String> {
        &self.global_pax
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Entry<'a>> {
        loop {
            let header_end = self.offset.checked_add(TAR_BLOCK_SIZE)?;
            if header_end > self.buf.len() {
                return None;
            }
            let header = &self.buf[self.offset..header_end];

            if header.iter().all(|&b| b == 0) {
                self.offset = header_end;
                continue;
            }

            let size = parse_octal(&header[SIZE]);
            let data_start = header_end;
            let data_end = data_start
                .saturating_add(usize::try_from(size).unwrap_or(usize::MAX))
                .min(self.buf.len());
            let data = &self.buf[data_start..data_end];
            self.offset = data_start.saturating_add(padded_len(size));

            let typeflag = header[TYPEFLAG];
            match typeflag {
                b'x' => {
                    self.pending_pax = Some(parse_pax(data));
                    continue;
                }
                b'g' => {
                    self.global_pax.extend(parse_pax(data));
                    continue;
                }
                b'L' => {
                    self.pending_long_name = Some(cstr(data));
                    continue;
                }
                _ => {}
            }

            let raw_name = cstr(&header[NAME]);
            let mut name = raw_name.clone();
            if header[MAGIC].starts_with(b"ustar") {
                let prefix = cstr(&header[PREFIX]);
                if !prefix.is_empty() {
                    name = format!("{}/{}", prefix, raw_name);
                }
            }
            if let Some(long_name) = self.pending_long_name.take() {
                name = long_name;
            }
            if let Some(path) = self.pending_pax.take().and_then(|mut pax| pax.remove("path")) {
                name = path;
            }

            return Some(Entry {
                name,
                raw_name,
                kind: EntryKind::from_typeflag(typeflag),
                mode: u32::try_from(parse_octal(&header[MODE])).unwrap_or(0),
                size,
                data,
            });
        }
    }
}

/// Reads a NUL-terminated string field.
fn cstr(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Parses an octal numeric field, treating anything unparsable as zero.
fn parse_octal(field: &[u8]) -> u64 {
    let text = String::from_utf8_lossy(field);
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    u64::from_str_radix(trimmed, 8).unwrap_or(0)
}

/// `size` rounded up to the next block boundary.
fn padded_len(size: u64) -> usize {
    let block = TAR_BLOCK_SIZE as u64;
    let blocks = size / block + u64::from(size % block != 0);
    usize::try_from(blocks.saturating_mul(block)).unwrap_or(usize::MAX)
}

/// Parses PAX extended header records (`"<len> <key>=<value>\n"`).
///
/// Stops at the first malformed record and returns what was parsed so far.
pub(crate) fn parse_pax(body: &[u8]) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut pos = 0;
    while pos < body.len() {
        let rest = &body[pos..];
        let Some(space) = rest.iter().position(|&b| b == b' ') else {
            break;
        };
        let Some(len) = std::str::from_utf8(&rest[..space])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        else {
            break;
        };
        if len <= space + 1 || len > rest.len() {
            break;
        }
        let record = &rest[space + 1..len];
        let record = record.strip_suffix(b"\n").unwrap_or(record);
        if let Some(eq) = record.iter().position(|&b| b == b'=') {
            let key = String::from_utf8_lossy(&record[..eq]).into_owned();
            let value = String::from_utf8_lossy(&record[eq + 1..]).into_owned();
            fields.insert(key, value);
        }
        pos += len;
    }
    fields
}
