// Numan Thabit 2025
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold set has no steps")]
    Empty,
    #[error("first threshold step must be unbounded")]
    MissingBaseStep,
    #[error("threshold step {index} is unbounded but only the first step may be")]
    UnboundedStepNotFirst { index: usize },
    #[error("threshold step {index} has a non-finite boundary")]
    NonFinite { index: usize },
    #[error("threshold step {index} boundary {value} does not exceed previous boundary {previous}")]
    NotIncreasing {
        index: usize,
        previous: f64,
        value: f64,
    },
}
