//! Byte budget accounting.

/// Running byte total against an optional cap.
///
/// The total never exceeds the cap: a commit that would overflow it is
/// rolled back and counted as a skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadBudget {
    cap: Option<u64>,
    total_bytes: u64,
    skipped_for_cap: usize,
}

impl DownloadBudget {
    /// A budget without a cap.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A budget capped at `cap` bytes.
    pub fn with_cap(cap: u64) -> Self {
        Self {
            cap: Some(cap),
            ..Self::default()
        }
    }

    /// Builds a budget from a signed byte count where zero or less means
    /// unbounded.
    pub fn from_cap(cap: i64) -> Self {
        if cap <= 0 {
            Self::unbounded()
        } else {
            Self::with_cap(cap as u64)
        }
    }

    pub fn cap(&self) -> Option<u64> {
        self.cap
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn skipped_for_cap(&self) -> usize {
        self.skipped_for_cap
    }

    /// Whether the running total has passed `fraction` of the cap.
    pub fn exceeds_threshold(&self, fraction: f64) -> bool {
        match self.cap {
            Some(cap) => self.total_bytes as f64 > cap as f64 * fraction,
            None => false,
        }
    }

    /// Whether adding `size` bytes would overflow the cap.
    pub fn would_exceed(&self, size: u64) -> bool {
        match self.cap {
            Some(cap) => self.total_bytes.saturating_add(size) > cap,
            None => false,
        }
    }

    /// Accumulates `size` bytes.
    ///
    /// Returns `false` and records a skip when the addition overflowed the
    /// cap; the total is left unchanged in that case.
    pub fn commit(&mut self, size: u64) -> bool {
        self.total_bytes = self.total_bytes.saturating_add(size);
        if let Some(cap) = self.cap {
            if self.total_bytes > cap {
                self.total_bytes -= size;
                self.skipped_for_cap += 1;
                return false;
            }
        }
        true
    }

    /// Records a tile skipped without being fetched.
    pub fn record_skip(&mut self) {
        self.skipped_for_cap += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cap_non_positive_is_unbounded() {
        assert_eq!(DownloadBudget::from_cap(0).cap(), None);
        assert_eq!(DownloadBudget::from_cap(-5).cap(), None);
        assert_eq!(DownloadBudget::from_cap(100).cap(), Some(100));
    }

    #[test]
    fn test_commit_within_cap() {
        let mut budget = DownloadBudget::with_cap(100);
        assert!(budget.commit(60));
        assert!(budget.commit(40));
        assert_eq!(budget.total_bytes(), 100);
        assert_eq!(budget.skipped_for_cap(), 0);
    }

    #[test]
    fn test_commit_overflow_rolls_back() {
        let mut budget = DownloadBudget::with_cap(100);
        assert!(budget.commit(60));
        assert!(!budget.commit(41));
        assert_eq!(budget.total_bytes(), 60);
        assert_eq!(budget.skipped_for_cap(), 1);
    }

    #[test]
    fn test_unbounded_never_overflows() {
        let mut budget = DownloadBudget::unbounded();
        assert!(budget.commit(u64::MAX / 2));
        assert!(!budget.would_exceed(u64::MAX));
        assert!(!budget.exceeds_threshold(0.0));
    }

    #[test]
    fn test_threshold() {
        let mut budget = DownloadBudget::with_cap(100);
        budget.commit(80);
        assert!(!budget.exceeds_threshold(0.8));
        budget.commit(1);
        assert!(budget.exceeds_threshold(0.8));
    }
}
