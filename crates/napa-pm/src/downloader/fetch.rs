//! Streaming archive download with an incremental content digest.

use std::path::Path;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use sha1::{Digest, Sha1};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{NapaError, Result};
use crate::http::HttpClient;

pub struct Fetcher {
    http: Arc<HttpClient>,
}

impl Fetcher {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Stream `url` to `dest`, returning the SHA-1 hex digest of the body.
    ///
    /// On a transport error the destination file's contents are undefined
    /// and must not be treated as a valid download.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<String> {
        let response = self.http.get(url).await.map_err(|e| NapaError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        stream_to_file(url, response.bytes_stream(), dest).await
    }
}

/// Write a chunked byte stream to `dest`, feeding every chunk through a
/// SHA-1 accumulator as it arrives.
async fn stream_to_file<S, B, E>(url: &str, mut stream: S, dest: &Path) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(dest).await?;
    let mut hasher = Sha1::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NapaError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        hasher.update(chunk.as_ref());
        file.write_all(chunk.as_ref()).await?;
    }

    file.flush().await?;

    Ok(format!("{:x}", hasher.finalize()))
}
