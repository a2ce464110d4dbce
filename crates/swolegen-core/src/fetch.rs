//! Resource fetcher: resolves instruction/history references to text.
//!
//! A reference is one of:
//! - empty (the document is absent; yields empty text),
//! - `http://` / `https://` URL (GET; status >= 300 is an error),
//! - `file://` URL or anything else (read as a local path).
//!
//! Every read is capped at `max_bytes`. Truncation is silent.

use futures::StreamExt;
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Errors from resolving a document reference.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("GET {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url}: status {status}")]
    Status { url: String, status: u16 },
}

/// Reads referenced documents from disk or over HTTP.
#[derive(Debug, Clone, Default)]
pub struct ResourceFetcher {
    http: reqwest::Client,
}

impl ResourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fetcher on a shared HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Resolve `reference` to at most `max_bytes` bytes of text.
    pub async fn fetch(&self, reference: &str, max_bytes: usize) -> Result<String, FetchError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(String::new());
        }

        let bytes = if reference.starts_with("http://") || reference.starts_with("https://") {
            self.fetch_http(reference, max_bytes).await?
        } else {
            let path = reference.strip_prefix("file://").unwrap_or(reference);
            read_file_capped(path, max_bytes).await?
        };

        tracing::debug!(reference, bytes = bytes.len(), "fetched document");
        Ok(bytes_to_text(bytes))
    }

    async fn fetch_http(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url).send().await.map_err(http_err)?;
        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut out = Vec::with_capacity(max_bytes.min(64 * 1024));
        let mut body = response.bytes_stream();
        while out.len() < max_bytes {
            let Some(chunk) = body.next().await else {
                break;
            };
            let chunk = chunk.map_err(http_err)?;
            let take = chunk.len().min(max_bytes - out.len());
            out.extend_from_slice(&chunk[..take]);
        }
        Ok(out)
    }
}

async fn read_file_capped(path: &str, max_bytes: usize) -> Result<Vec<u8>, FetchError> {
    let io_err = |source| FetchError::Io {
        path: path.to_string(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut out = Vec::new();
    file.take(max_bytes as u64)
        .read_to_end(&mut out)
        .await
        .map_err(io_err)?;
    Ok(out)
}

/// Convert capped bytes to text.
///
/// A cap can land inside a multi-byte character; that trailing fragment is
/// dropped rather than replaced. Other invalid sequences are replaced, and
/// the result is cut back so it never grows past the input length.
fn bytes_to_text(mut bytes: Vec<u8>) -> String {
    match std::str::from_utf8(&bytes) {
        Ok(_) => {}
        Err(e) if e.error_len().is_none() => bytes.truncate(e.valid_up_to()),
        Err(_) => {
            let cap = bytes.len();
            let mut text = String::from_utf8_lossy(&bytes).into_owned();
            truncate_to_boundary(&mut text, cap);
            return text;
        }
    }
    String::from_utf8(bytes).unwrap_or_default()
}

fn truncate_to_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_reference_is_absent_document() {
        let text = ResourceFetcher::new().fetch("   ", 10).await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn missing_local_file_is_an_error() {
        let err = ResourceFetcher::new()
            .fetch("/nonexistent/swolegen/history.md", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn split_multibyte_tail_is_dropped() {
        // "é" is two bytes; keep only its first byte.
        let bytes = vec![b'a', 0xC3];
        assert_eq!(bytes_to_text(bytes), "a");
    }

    #[test]
    fn replaced_bytes_stay_within_input_length() {
        // Each 0xFF becomes a three-byte U+FFFD.
        let text = bytes_to_text(vec![b'o', b'k', 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(text.len() <= 6);
        assert_eq!(text, "ok\u{FFFD}");
    }

    #[test]
    fn invalid_sequences_are_replaced() {
        let bytes = vec![b'a', 0xFF, b'b'];
        assert_eq!(bytes_to_text(bytes), "a\u{FFFD}b");
    }
}
