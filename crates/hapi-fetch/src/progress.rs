//! Progress of one chunked request.

use hapi_types::{HapiError, RequestInterval, iso_to_seconds};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::warn;

/// Callback told, once, that a chunked request hit its chunk limit.
pub type LimitCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Whether a query delivered everything that was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryStatus {
    /// The whole requested interval was retrieved.
    #[default]
    Complete,
    /// The chunk limit cut the result short.
    Overflow,
}

impl QueryStatus {
    /// Returns true if the result was truncated.
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow)
    }
}

/// Shared progress record for one top-level chunked request.
///
/// Every piece of the bisected request reports into the same record. The
/// counter only grows, and the limit callback fires at most once.
pub struct ChunkProgress {
    full_start: f64,
    full_stop: f64,
    limit: usize,
    chunks: AtomicUsize,
    limit_hit: AtomicBool,
    on_limit: Option<LimitCallback>,
}

impl ChunkProgress {
    /// Creates the progress record for a request over `full`.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Time`] if the interval bounds cannot be parsed.
    pub fn new(
        full: &RequestInterval,
        limit: usize,
        on_limit: Option<LimitCallback>,
    ) -> Result<Self, HapiError> {
        let (full_start, full_stop) = full.seconds()?;
        Ok(Self {
            full_start,
            full_stop,
            limit,
            chunks: AtomicUsize::new(0),
            limit_hit: AtomicBool::new(false),
            on_limit,
        })
    }

    /// Maximum number of chunks.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of chunks successfully issued so far.
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.chunks.load(Ordering::SeqCst)
    }

    /// Returns true once the chunk limit has cut the request short.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.limit_hit.load(Ordering::SeqCst)
    }

    /// Returns the query status implied by this progress.
    #[must_use]
    pub fn status(&self) -> QueryStatus {
        if self.overflowed() {
            QueryStatus::Overflow
        } else {
            QueryStatus::Complete
        }
    }

    /// Percentage of the full interval that lies before `time`.
    #[must_use]
    pub fn percent_at(&self, time: &str) -> f64 {
        let span = self.full_stop - self.full_start;
        match iso_to_seconds(time) {
            Ok(t) if span > 0.0 => (100.0 * (t - self.full_start) / span).clamp(0.0, 100.0),
            _ => 100.0,
        }
    }

    /// Checks whether another chunk may be issued for `attempted`.
    ///
    /// Returns false if the limit is exhausted. The first time that happens
    /// the limit callback is invoked with a message giving the limit and how
    /// far through the full interval the request had got.
    pub fn try_acquire(&self, attempted: &RequestInterval) -> bool {
        if self.chunks() < self.limit {
            return true;
        }
        if !self.limit_hit.swap(true, Ordering::SeqCst) {
            let msg = format!(
                "HAPI chunk limit ({}) exceeded; only {:.0}% of the requested interval retrieved",
                self.limit,
                self.percent_at(&attempted.start().value),
            );
            warn!("{}", msg);
            if let Some(callback) = &self.on_limit {
                callback(&msg);
            }
        }
        false
    }

    /// Records a successfully issued chunk, returning the new chunk count.
    pub fn record_chunk(&self) -> usize {
        self.chunks.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl std::fmt::Debug for ChunkProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkProgress")
            .field("limit", &self.limit)
            .field("chunks", &self.chunks())
            .field("overflowed", &self.overflowed())
            .finish_non_exhaustive()
    }
}
