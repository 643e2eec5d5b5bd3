//! Time-bounded request intervals.

use crate::{HapiError, iso_midpoint, iso_to_seconds};

/// One end of a request interval: a query parameter name and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBound {
    /// Query parameter name (e.g. `start` or `time.min`).
    pub name: String,
    /// ISO-8601 timestamp.
    pub value: String,
}

impl TimeBound {
    /// Creates a new bound.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns a copy of this bound with a different value.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self::new(self.name.clone(), value)
    }
}

impl std::fmt::Display for TimeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// A half-open `[start, stop)` interval of a data request.
///
/// Intervals are never modified in place; narrowing produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInterval {
    start: TimeBound,
    stop: TimeBound,
}

impl RequestInterval {
    /// Creates a new interval from its two bounds.
    #[must_use]
    pub const fn new(start: TimeBound, stop: TimeBound) -> Self {
        Self { start, stop }
    }

    /// Returns the start bound.
    #[must_use]
    pub const fn start(&self) -> &TimeBound {
        &self.start
    }

    /// Returns the stop bound.
    #[must_use]
    pub const fn stop(&self) -> &TimeBound {
        &self.stop
    }

    /// Returns a copy with the start value replaced.
    #[must_use]
    pub fn with_start(&self, value: impl Into<String>) -> Self {
        Self::new(self.start.with_value(value), self.stop.clone())
    }

    /// Returns a copy with the stop value replaced.
    #[must_use]
    pub fn with_stop(&self, value: impl Into<String>) -> Self {
        Self::new(self.start.clone(), self.stop.with_value(value))
    }

    /// Returns the interval bounds in seconds since the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Time`] if either bound cannot be parsed.
    pub fn seconds(&self) -> Result<(f64, f64), HapiError> {
        Ok((
            iso_to_seconds(&self.start.value)?,
            iso_to_seconds(&self.stop.value)?,
        ))
    }

    /// Splits the interval at its (whole-second) midpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Time`] if either bound cannot be parsed.
    pub fn bisect(&self) -> Result<(Self, Self), HapiError> {
        let mid = iso_midpoint(&self.start.value, &self.stop.value)?;
        Ok((self.with_stop(mid.clone()), self.with_start(mid)))
    }
}

impl std::fmt::Display for RequestInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.value, self.stop.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: &str, stop: &str) -> RequestInterval {
        RequestInterval::new(TimeBound::new("start", start), TimeBound::new("stop", stop))
    }

    #[test]
    fn test_with_endpoints_copy() {
        let full = interval("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        let narrowed = full.with_stop("2024-01-01T06:00:00Z");
        assert_eq!(full.stop().value, "2024-01-02T00:00:00Z");
        assert_eq!(narrowed.stop().value, "2024-01-01T06:00:00Z");
        assert_eq!(narrowed.stop().name, "stop");
        assert_eq!(narrowed.start(), full.start());
    }

    #[test]
    fn test_bisect() {
        let full = interval("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        let (left, right) = full.bisect().unwrap();
        assert_eq!(left.start().value, "2024-01-01T00:00:00Z");
        assert_eq!(left.stop().value, "2024-01-01T12:00:00Z");
        assert_eq!(right.start().value, "2024-01-01T12:00:00Z");
        assert_eq!(right.stop().value, "2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_display() {
        let i = interval("2024-01-01", "2024-01-02");
        assert_eq!(i.to_string(), "[2024-01-01, 2024-01-02)");
        assert_eq!(i.start().to_string(), "start=2024-01-01");
    }
}
