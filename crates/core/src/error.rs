use chrono::Duration;

/// Errors produced by the aggregation engine.
///
/// The aggregation functions themselves are pure and cannot fail on valid
/// feed input; the variants here cover configuration mistakes and selection
/// validation, which are surfaced to the user before any external call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The selection contains no visits, or dereferences to no clinical
    /// records. Never forwarded to the generator.
    #[error("nothing is selected: choose at least one visit with clinical records")]
    NoSelection,

    /// A fixed clustering window must be a positive span of time.
    #[error("invalid clustering window {0}: must be positive")]
    InvalidClusterWindow(Duration),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
