//! Download policy knobs.

use std::fmt;
use std::str::FromStr;

/// Fraction of the cap past which sizes are probed before fetching.
pub const DEFAULT_PROBE_THRESHOLD: f64 = 0.8;

/// What to do when a fetched tile overflows the byte cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Stop issuing fetches for the rest of the plan.
    #[default]
    Stop,
    /// Drop the tile and keep going with later, possibly smaller, tiles.
    SkipAndContinue,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(OverflowPolicy::Stop),
            "skip" | "continue" => Ok(OverflowPolicy::SkipAndContinue),
            other => Err(format!(
                "unknown overflow policy '{}' (expected 'stop' or 'skip')",
                other
            )),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Stop => write!(f, "stop"),
            OverflowPolicy::SkipAndContinue => write!(f, "skip"),
        }
    }
}

/// Download tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadPolicy {
    /// Fraction of the cap after which sizes are probed first.
    pub probe_threshold: f64,
    /// Behavior on cap overflow.
    pub overflow: OverflowPolicy,
    /// Number of concurrent fetches; 1 fetches sequentially.
    pub parallel: usize,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            probe_threshold: DEFAULT_PROBE_THRESHOLD,
            overflow: OverflowPolicy::Stop,
            parallel: 1,
        }
    }
}

impl DownloadPolicy {
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Sets the probe threshold, clamped to `0.0..=1.0`.
    pub fn with_probe_threshold(mut self, threshold: f64) -> Self {
        self.probe_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = DownloadPolicy::default();
        assert_eq!(policy.probe_threshold, 0.8);
        assert_eq!(policy.overflow, OverflowPolicy::Stop);
        assert_eq!(policy.parallel, 1);
    }

    #[test]
    fn test_overflow_parse() {
        assert_eq!("stop".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Stop));
        assert_eq!(
            " Skip ".parse::<OverflowPolicy>(),
            Ok(OverflowPolicy::SkipAndContinue)
        );
        assert!("later".parse::<OverflowPolicy>().is_err());
    }

    #[test]
    fn test_builders_clamp() {
        let policy = DownloadPolicy::default()
            .with_parallel(0)
            .with_probe_threshold(1.5);
        assert_eq!(policy.parallel, 1);
        assert_eq!(policy.probe_threshold, 1.0);
    }
}
