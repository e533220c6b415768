//! Blocking HTTP file transfer.
//!
//! Files are written to `<dest>.part` and renamed into place once complete
//! and verified, so the package cache never holds a truncated package. A
//! leftover `.part` file is resumed with a `Range` request; servers that
//! ignore the range restart the transfer from zero.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::StatusCode;

use super::checksum::verify_checksum;
use super::error::{BackendError, BackendResult};
use crate::metalink::Checksum;

/// Progress callback for a single file: `(bytes_downloaded, total_bytes)`.
///
/// `total_bytes` is 0 when the server does not announce a length.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send>;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const CHUNK_SIZE: usize = 64 * 1024;

const PART_SUFFIX: &str = "part";

const USER_AGENT: &str = concat!("pacfetch/", env!("CARGO_PKG_VERSION"));

/// HTTP-based file downloader.
///
/// A pooled downloader keeps idle connections open and is shared between
/// worker threads by cloning; an unpooled one opens a fresh connection per
/// request.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    pub(crate) timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader that reuses connections.
    pub fn pooled(timeout: Duration) -> BackendResult<Self> {
        Self::build(Client::builder(), timeout)
    }

    /// Create a downloader that opens a new connection for every request.
    pub fn unpooled(timeout: Duration) -> BackendResult<Self> {
        Self::build(Client::builder().pool_max_idle_per_host(0), timeout)
    }

    fn build(builder: reqwest::blocking::ClientBuilder, timeout: Duration) -> BackendResult<Self> {
        let client = builder
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// Download `url` to `dest`.
    ///
    /// On success `dest` holds the complete file and the number of bytes
    /// it holds is returned. A size or checksum mismatch discards the
    /// transfer.
    pub fn download(
        &self,
        url: &str,
        dest: &Path,
        expected_size: Option<u64>,
        expected_checksum: Option<&Checksum>,
        progress: Option<ProgressCallback>,
    ) -> BackendResult<u64> {
        let part = part_path(dest);
        let resume_from = fs::metadata(&part).map(|m| m.len()).unwrap_or(0);

        let mut request = self.client.get(url);
        if resume_from > 0 {
            request = request.header(RANGE, format!("bytes={}-", resume_from));
        }
        let response = request.send().map_err(|e| self.request_error(url, e))?;

        let (file, offset) = match response.status() {
            StatusCode::PARTIAL_CONTENT if resume_from > 0 => {
                tracing::debug!(%url, resume_from, "Resuming partial download");
                (open_part(&part, true)?, resume_from)
            }
            StatusCode::RANGE_NOT_SATISFIABLE => {
                // The partial file is at least as long as the resource.
                fs::remove_file(&part).ok();
                return Err(BackendError::DownloadFailed {
                    url: url.to_string(),
                    reason: "stale partial download discarded".to_string(),
                });
            }
            status if status.is_success() => (open_part(&part, false)?, 0),
            status => {
                return Err(BackendError::DownloadFailed {
                    url: url.to_string(),
                    reason: format!("server answered {}", status),
                })
            }
        };

        let total = announced_length(&response).map_or(0, |len| len + offset);
        let written = self.copy_body(url, response, file, &part, offset, total, progress)?;

        if let Some(expected) = expected_size {
            if written != expected {
                fs::remove_file(&part).ok();
                return Err(BackendError::SizeMismatch {
                    path: dest.to_path_buf(),
                    expected,
                    actual: written,
                });
            }
        }
        if let Some(expected) = expected_checksum {
            if let Err(e) = verify_checksum(&part, expected) {
                fs::remove_file(&part).ok();
                return Err(e);
            }
        }

        fs::rename(&part, dest).map_err(|e| BackendError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
        Ok(written)
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_body(
        &self,
        url: &str,
        mut response: Response,
        file: File,
        part: &Path,
        offset: u64,
        total: u64,
        progress: Option<ProgressCallback>,
    ) -> BackendResult<u64> {
        let write_error = |source: io::Error| BackendError::WriteFailed {
            path: part.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(file);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut written = offset;

        loop {
            let read = response.read(&mut chunk).map_err(|e| BackendError::DownloadFailed {
                url: url.to_string(),
                reason: format!("connection lost after {} bytes: {}", written, e),
            })?;
            if read == 0 {
                break;
            }
            writer.write_all(&chunk[..read]).map_err(write_error)?;
            written += read as u64;

            if let Some(cb) = &progress {
                cb(written, total);
            }
        }
        writer.flush().map_err(write_error)?;

        if total > 0 && written != total {
            return Err(BackendError::DownloadFailed {
                url: url.to_string(),
                reason: format!("expected {} bytes, received {}", total, written),
            });
        }
        Ok(written)
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            BackendError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Path of the in-progress file for `dest`.
pub(crate) fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PART_SUFFIX);
    dest.with_file_name(name)
}

fn open_part(part: &Path, append: bool) -> BackendResult<File> {
    if let Some(parent) = part.parent() {
        fs::create_dir_all(parent).map_err(|e| BackendError::CreateDirFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut options = OpenOptions::new();
    if append {
        options.append(true);
    } else {
        options.write(true).create(true).truncate(true);
    }
    options.open(part).map_err(|e| BackendError::WriteFailed {
        path: part.to_path_buf(),
        source: e,
    })
}

fn announced_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Serve `body` once on a local port and return a URL for it.
#[cfg(test)]
pub(crate) fn serve_once(body: &'static [u8]) -> String {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(body);
        }
    });
    format!("http://{}/file.pkg.tar.zst", addr)
}
