use thiserror::Error;

/// Fatal download outcomes. Partial coverage is not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    #[error("no tiles planned")]
    EmptyPlan,

    #[error("none of the {planned} planned tiles could be downloaded; first failure at {uri}: {reason}")]
    AllFailed {
        planned: usize,
        uri: String,
        reason: String,
    },

    #[error("none of the {planned} planned tiles fit within the {cap} byte budget")]
    BudgetExhausted { planned: usize, cap: u64 },

    #[error("download cancelled before any of the {planned} planned tiles was obtained")]
    Cancelled { planned: usize },
}
