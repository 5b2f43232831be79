use thiserror::Error;

/// Failures of one prediction run, from request validation to scoring.
///
/// The HTTP layer maps each variant to exactly one status code; nothing below
/// it knows about HTTP.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("City required")]
    MissingInput,

    /// Any upstream lookup failure. `status` is `None` when no response arrived
    /// at all (DNS, connect, timeout).
    #[error("forecast lookup failed (status={}): {detail}", display_status(.status))]
    UpstreamUnavailable { status: Option<u16>, detail: String },

    #[error("aggregation failed: {0}")]
    AggregationFailure(String),

    #[error("classification failed: {0}")]
    ClassificationFailure(String),
}

impl PipelineError {
    pub fn upstream_status(status: u16, detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            status: Some(status),
            detail: detail.into(),
        }
    }

    pub fn upstream_transport(detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            status: None,
            detail: detail.into(),
        }
    }

    pub fn aggregation(detail: impl Into<String>) -> Self {
        Self::AggregationFailure(detail.into())
    }

    pub fn classification(detail: impl Into<String>) -> Self {
        Self::ClassificationFailure(detail.into())
    }

    /// True for failures caused by the service itself rather than its input or
    /// the upstream provider.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::AggregationFailure(_) | Self::ClassificationFailure(_)
        )
    }
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}
