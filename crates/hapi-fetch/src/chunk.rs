//! Chunked data requests.
//!
//! Servers may refuse a data request that covers too much time with the
//! protocol code 1408. [`ChunkStreamer`] reacts by splitting the interval in
//! two and requesting each half, recursively, then presents the accepted
//! pieces as one byte stream in time order.
//!
//! The recursion is held as an explicit stack of pending intervals. The
//! right half of a rejected interval is pushed before the left half, so
//! intervals are popped depth-first, earliest first. A request is only
//! issued when the reader has drained every earlier piece, so no more
//! requests are made than the reader actually consumes.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use hapi_types::{HapiError, HapiVersion, RequestInterval, TimeBound, iso_to_seconds};
use reqwest::Url;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info};

use crate::progress::{ChunkProgress, LimitCallback, QueryStatus};
use crate::url::{query_params, with_query_params};
use crate::{ByteStream, DataService};

/// Default maximum number of chunks per top-level request.
pub const DEFAULT_CHUNK_LIMIT: usize = 1000;

/// Request parameter asking for a metadata header in the data stream.
const INCLUDE_PARAM: &str = "include";

/// Issues data requests, bisecting any the server rejects as too large.
#[derive(Clone)]
pub struct ChunkStreamer {
    service: Arc<dyn DataService>,
    chunk_limit: usize,
    on_limit: Option<LimitCallback>,
}

impl ChunkStreamer {
    /// Creates a streamer with the default chunk limit and no callback.
    #[must_use]
    pub fn new(service: Arc<dyn DataService>) -> Self {
        Self {
            service,
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            on_limit: None,
        }
    }

    /// Sets the maximum number of chunks per top-level request.
    #[must_use]
    pub fn with_chunk_limit(mut self, chunk_limit: usize) -> Self {
        self.chunk_limit = chunk_limit;
        self
    }

    /// Sets the callback told when a request runs out of chunks.
    #[must_use]
    pub fn with_limit_callback(mut self, callback: LimitCallback) -> Self {
        self.on_limit = Some(callback);
        self
    }

    /// Returns the chunk limit.
    #[must_use]
    pub const fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Opens the data stream for a complete data request URL.
    ///
    /// The URL must carry a start/stop pair under either the 3.x
    /// (`start`/`stop`) or the 2.x (`time.min`/`time.max`) names. The first
    /// accepted chunk is requested before this returns, so a failure of the
    /// initial request is reported here.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::MissingParameter`] if the URL has no time
    /// bounds, [`HapiError::Time`] if they cannot be parsed, or any error of
    /// the first request other than a "too much data" rejection.
    pub async fn open(&self, template: &Url) -> Result<ChunkedStream, HapiError> {
        let params = query_params(template);
        let version = HapiVersion::from_param_names(params.iter().map(|(k, _)| k.as_str()))
            .ok_or_else(|| {
                HapiError::MissingParameter("start/stop or time.min/time.max".to_string())
            })?;
        let bound = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(k, v)| TimeBound::new(k.clone(), v.clone()))
                .ok_or_else(|| HapiError::MissingParameter(name.to_string()))
        };
        let full = RequestInterval::new(
            bound(version.start_param())?,
            bound(version.stop_param())?,
        );

        let progress = Arc::new(ChunkProgress::new(
            &full,
            self.chunk_limit,
            self.on_limit.clone(),
        )?);
        let mut chunks = ChunkQueue {
            service: Arc::clone(&self.service),
            template: template.clone(),
            params,
            pending: vec![full],
            current: None,
            progress: Arc::clone(&progress),
        };

        let first = chunks.next_bytes().await?;
        let rest = stream::try_unfold(chunks, |mut chunks| async move {
            let bytes = chunks.next_bytes().await.map_err(io::Error::from)?;
            Ok::<_, io::Error>(bytes.map(|b| (b, chunks)))
        });
        let inner = stream::iter(first.map(Ok::<_, io::Error>))
            .chain(rest)
            .boxed();

        Ok(ChunkedStream { inner, progress })
    }
}

impl std::fmt::Debug for ChunkStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStreamer")
            .field("service", &self.service)
            .field("chunk_limit", &self.chunk_limit)
            .field("on_limit", &self.on_limit.is_some())
            .finish()
    }
}

/// Work state behind a [`ChunkedStream`].
struct ChunkQueue {
    service: Arc<dyn DataService>,
    template: Url,
    params: Vec<(String, String)>,
    /// Intervals still to request; the next one is on top.
    pending: Vec<RequestInterval>,
    /// Body of the chunk currently being read.
    current: Option<ByteStream>,
    progress: Arc<ChunkProgress>,
}

impl ChunkQueue {
    /// Returns the next piece of data, opening chunks as needed.
    async fn next_bytes(&mut self) -> Result<Option<Bytes>, HapiError> {
        loop {
            if let Some(body) = &mut self.current {
                if let Some(chunk) = body.next().await {
                    return Ok(Some(chunk?));
                }
                self.current = None;
            }

            let Some(interval) = self.pending.pop() else {
                return Ok(None);
            };
            if !self.progress.try_acquire(&interval) {
                // The count never goes down, so every later interval would
                // be refused as well.
                self.pending.clear();
                return Ok(None);
            }

            let url = self.request_url(&interval);
            match self.service.open_stream(&url).await {
                Ok(body) => {
                    let n = self.progress.record_chunk();
                    info!(
                        "HAPI chunk {}/{} ({:.0}%)",
                        n,
                        self.progress.limit(),
                        self.progress.percent_at(&interval.stop().value)
                    );
                    self.drop_header_request();
                    self.current = Some(body);
                }
                Err(e) if e.is_too_much_data() => {
                    let (left, right) = interval.bisect()?;
                    let (start, stop) = interval.seconds()?;
                    let mid = iso_to_seconds(&left.stop().value)?;
                    if mid <= start || mid >= stop {
                        // Too short to split at whole-second resolution.
                        return Err(e);
                    }
                    debug!(
                        "HAPI refused {} as too large; splitting at {}",
                        interval,
                        left.stop().value
                    );
                    self.pending.push(right);
                    self.pending.push(left);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Builds the request for one interval from the template parameters.
    fn request_url(&self, interval: &RequestInterval) -> Url {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| {
                let value = if *k == interval.start().name {
                    interval.start().value.as_str()
                } else if *k == interval.stop().name {
                    interval.stop().value.as_str()
                } else {
                    v.as_str()
                };
                (k.as_str(), value)
            })
            .collect();
        with_query_params(&self.template, &params)
    }

    /// Stops asking for the metadata header once the first chunk has it.
    fn drop_header_request(&mut self) {
        let before = self.params.len();
        self.params.retain(|(k, _)| k != INCLUDE_PARAM);
        if self.params.len() != before {
            debug!("Dropping '{}' from subsequent chunk requests", INCLUDE_PARAM);
        }
    }
}

/// The concatenated data of a chunked request.
///
/// Reading moves from one chunk's body to the next as each is exhausted.
/// Dropping the stream closes the open body and abandons every chunk not
/// yet requested.
pub struct ChunkedStream {
    inner: ByteStream,
    progress: Arc<ChunkProgress>,
}

impl ChunkedStream {
    /// Returns the progress record shared with the request.
    #[must_use]
    pub fn progress(&self) -> Arc<ChunkProgress> {
        Arc::clone(&self.progress)
    }

    /// Returns the query status as known so far.
    ///
    /// Truncation is only discovered as the stream is read; the status is
    /// final once the stream has ended.
    #[must_use]
    pub fn status(&self) -> QueryStatus {
        self.progress.status()
    }

    /// Splits into the raw byte stream and the progress record.
    #[must_use]
    pub fn into_parts(self) -> (ByteStream, Arc<ChunkProgress>) {
        (self.inner, self.progress)
    }
}

impl Stream for ChunkedStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for ChunkedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedStream")
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}
