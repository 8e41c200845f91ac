//! HTTP transport implementation for the measurement engine
//!
//! The engine talks to the remote endpoint exclusively through the
//! [`Transport`] trait so samplers can be driven by mock transports in
//! tests. [`HttpTransport`] is the production implementation over reqwest,
//! speaking the usual endpoint contract: `__down?bytes=N` for probes and
//! downloads, `__up` for uploads, both with a cache-defeating uniquifier.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use reqwest::{Body, Client};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;
use uuid::Uuid;

/// Chunk granularity for upload bodies; each yielded chunk produces one
/// send-progress event.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Incrementally consumed download body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Network operations the samplers depend on
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one minimal round trip; resolves when the response has
    /// completed. Used by the prober, which does its own timing.
    async fn probe(&self) -> Result<()>;

    /// Open a streamed download of `payload_bytes` and return its chunk
    /// stream. Dropping the stream aborts the transfer.
    async fn open_download(&self, payload_bytes: u64) -> Result<ByteStream>;

    /// Send `block` as one upload. Cumulative sent-byte counts for this
    /// block are reported through `progress` in byte order as the
    /// transport consumes the body. Dropping the future aborts the send.
    async fn send_block(&self, block: Bytes, progress: UnboundedSender<u64>) -> Result<()>;
}

/// Reqwest-backed transport speaking the `__down`/`__up` endpoint contract
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport for the given endpoint base URL
    pub fn new(endpoint: &str) -> Result<Self> {
        let base = Url::parse(endpoint)?;
        if base.host_str().is_none() {
            return Err(AppError::validation("endpoint URL must have a host"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .user_agent(concat!("speedview/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// The endpoint this transport measures against
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// Build a request URL under the base with a fresh cache-busting
    /// uniquifier, so no intermediary can serve the response from cache.
    fn request_url(&self, path: &str, payload_bytes: Option<u64>) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(bytes) = payload_bytes {
                pairs.append_pair("bytes", &bytes.to_string());
            }
            pairs.append_pair("t", &Uuid::new_v4().simple().to_string());
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self) -> Result<()> {
        let url = self.request_url("/__down", Some(0));
        let response = self.client.get(url).send().await?;
        response.error_for_status()?;
        Ok(())
    }

    async fn open_download(&self, payload_bytes: u64) -> Result<ByteStream> {
        let url = self.request_url("/__down", Some(payload_bytes));
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(AppError::from))))
    }

    async fn send_block(&self, block: Bytes, progress: UnboundedSender<u64>) -> Result<()> {
        let url = self.request_url("/__up", None);
        let body = Body::wrap_stream(progress_chunks(block, progress));
        let response = self.client.post(url).body(body).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Split a block into upload chunks, reporting the cumulative byte count
/// as each chunk is handed to the transport. Events are inherently in byte
/// order because the body is consumed sequentially.
fn progress_chunks(
    block: Bytes,
    progress: UnboundedSender<u64>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send {
    futures::stream::unfold((block, 0usize), move |(block, offset)| {
        let progress = progress.clone();
        async move {
            if offset >= block.len() {
                return None;
            }
            let end = (offset + UPLOAD_CHUNK_BYTES).min(block.len());
            let chunk = block.slice(offset..end);
            // Receiver may already be gone when the engine stopped watching.
            let _ = progress.send(end as u64);
            Some((Ok(chunk), (block, end)))
        }
    })
}
