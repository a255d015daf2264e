use thiserror::Error;

/// Domain errors raised while resolving, loading, and styling statistics.
///
/// Resolution and styling errors are local: the caller skips the row or hides
/// the feature and carries on. `MalformedPayload` is terminal for one load.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChoroplethError {
    #[error("could not find region for locality {locality:?} / country {country:?}")]
    UnresolvedRegion { locality: String, country: String },

    #[error("malformed statistics payload: {0}")]
    MalformedPayload(String),

    #[error("range is degenerate (min == max == {value})")]
    DegenerateRange { value: f64 },

    #[error("logarithmic scale needs positive inputs, got {value}")]
    NonPositiveLogInput { value: f64 },

    #[error("no values observed yet")]
    EmptyRange,

    #[error("invalid configuration: {0}")]
    Config(String),
}
