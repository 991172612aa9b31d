// src/git/download.rs
//! Downloads commit tarballs over HTTPS.

use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, USER_AGENT};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CHUNK_SIZE: usize = 64 * 1024;

/// Builds a blocking `reqwest` client, optionally routed through `proxy`.
///
/// Redirects are followed (the default policy), which hosting providers rely on
/// for archive URLs.
pub(super) fn build_client(proxy: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        concat!("gitsnap/", env!("CARGO_PKG_VERSION")).parse()?,
    );

    let mut builder = Client::builder().default_headers(headers);
    if let Some(proxy) = proxy {
        log::debug!("Routing downloads through proxy {}", proxy);
        builder = builder
            .proxy(reqwest::Proxy::all(proxy).with_context(|| format!("Invalid proxy '{}'", proxy))?);
    }
    Ok(builder.build()?)
}

/// The temporary name a download is written to before it is complete.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Downloads `url` to `dest`, creating parent directories.
///
/// The body is streamed to `<dest>.part` and renamed once complete, so an
/// interrupted download never shows up under the final name. Non-2xx responses
/// are errors.
pub(super) fn download_file(
    client: &Client,
    url: &str,
    dest: &Path,
    progress: Option<&Arc<dyn ProgressReporter>>,
) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }

    log::debug!("GET {}", url);
    let mut response = client.get(url).send()?.error_for_status()?;

    if let Some(p) = progress {
        p.start(response.content_length());
    }

    let part = partial_path(dest);
    let result = write_body(&mut response, &part, progress);
    if let Err(e) = result {
        let _ = fs::remove_file(&part);
        return Err(e);
    }
    fs::rename(&part, dest).with_context(|| {
        format!(
            "Failed to move '{}' to '{}'",
            part.display(),
            dest.display()
        )
    })?;

    if let Some(p) = progress {
        p.finish();
    }
    Ok(())
}

fn write_body(
    body: &mut impl Read,
    path: &Path,
    progress: Option<&Arc<dyn ProgressReporter>>,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = body.read(&mut buf).context("Failed to read response body")?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write to '{}'", path.display()))?;
        written += n as u64;
        if let Some(p) = progress {
            p.advance(n as u64);
        }
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write to '{}'", path.display()))?;
    log::debug!("Wrote {} bytes to '{}'", written, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/cache/abc.tar.gz")),
            PathBuf::from("/cache/abc.tar.gz.part")
        );
    }

    #[test]
    fn test_write_body_streams_everything() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.bin");
        let data = vec![7u8; CHUNK_SIZE * 2 + 5];
        write_body(&mut data.as_slice(), &path, None)?;
        assert_eq!(fs::read(&path)?, data);
        Ok(())
    }

    #[derive(Default)]
    struct ChunkLog {
        chunks: std::sync::Mutex<Vec<u64>>,
    }

    impl ProgressReporter for ChunkLog {
        fn start(&self, _total: Option<u64>) {}
        fn advance(&self, bytes: u64) {
            self.chunks.lock().unwrap().push(bytes);
        }
        fn finish(&self) {}
    }

    #[test]
    fn test_write_body_reports_every_chunk() -> Result<()> {
        let dir = tempdir()?;
        let log = Arc::new(ChunkLog::default());
        let reporter: Arc<dyn ProgressReporter> = log.clone();
        let data = vec![1u8; CHUNK_SIZE + 10];
        write_body(&mut data.as_slice(), &dir.path().join("out.bin"), Some(&reporter))?;
        let chunks = log.chunks.lock().unwrap().clone();
        assert_eq!(chunks.iter().sum::<u64>(), data.len() as u64);
        assert_eq!(chunks, vec![CHUNK_SIZE as u64, 10]);
        Ok(())
    }

    #[test]
    fn test_client_builds_with_proxy() -> Result<()> {
        build_client(Some("http://127.0.0.1:3128"))?;
        Ok(())
    }

    #[test]
    #[ignore = "requires network access and is slow"]
    fn test_download_real_tarball() -> Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("degit.tar.gz");
        let client = build_client(None)?;
        download_file(
            &client,
            "https://github.com/Rich-Harris/degit/archive/HEAD.tar.gz",
            &dest,
            None,
        )?;
        assert!(dest.metadata()?.len() > 0);
        assert!(!partial_path(&dest).exists());
        Ok(())
    }
}
