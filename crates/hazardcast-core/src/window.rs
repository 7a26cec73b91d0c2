//! Half-open time intervals anchored at a prediction timestamp.
//!
//! Every event filter in the crate takes a [`TemporalWindow`] rather than
//! raw start/end timestamps. The two constructors are the only code paths
//! producing windows, and each tags its result with a [`WindowKind`]:
//! lookback windows end at the target and feed features, horizon windows
//! start at the target and feed labels. Component entry points check the
//! kind they receive, so a feature path handed a horizon window (the
//! classic label-leakage bug) fails loudly instead of silently training
//! on the future.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Which side of the target timestamp a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Past-facing window ending at the target; produces features.
    Lookback,
    /// Future-facing window starting at the target; produces labels.
    Horizon,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::Lookback => write!(f, "lookback"),
            WindowKind::Horizon => write!(f, "horizon"),
        }
    }
}

/// A half-open UTC interval `[start, end)` tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    kind: WindowKind,
}

impl TemporalWindow {
    /// Past window `[target - span_days days, target)`.
    pub fn lookback(target: DateTime<Utc>, span_days: i64) -> Self {
        Self {
            start: target - Duration::days(span_days),
            end: target,
            kind: WindowKind::Lookback,
        }
    }

    /// Future window `[target, target + span_hours hours)`.
    pub fn horizon(target: DateTime<Utc>, span_hours: i64) -> Self {
        Self {
            start: target,
            end: target + Duration::hours(span_hours),
            kind: WindowKind::Horizon,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    /// Half-open containment test: start inclusive, end exclusive.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    /// Verify this window has the kind the call site requires.
    ///
    /// A mismatch is a programming error, not a runtime condition: it
    /// trips a debug assertion during development and returns an error in
    /// release builds.
    pub fn ensure_kind(&self, expected: WindowKind) -> CoreResult<()> {
        debug_assert_eq!(
            self.kind, expected,
            "temporal window kind mismatch: this call site requires {expected} windows"
        );
        if self.kind != expected {
            return Err(CoreError::WindowKindMismatch {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}
