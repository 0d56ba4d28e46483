//! Error types for orbital sampling

/// Result type for sampling operations
pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Failures surfaced to the caller. All of them are terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum OrbitalError {
    /// (n, l, m) violates n >= 1, l <= n - 1, |m| <= l
    #[error("invalid quantum state (n={n}, l={l}, m={m}): {reason}")]
    InvalidQuantumState {
        n: u32,
        l: u32,
        m: i32,
        reason: &'static str,
    },

    /// Point count or sampling radius out of range
    #[error("invalid sample request: {0}")]
    InvalidSampleRequest(String),

    /// Envelope estimate is zero or not finite, so no candidate can ever be accepted
    #[error("degenerate envelope: pmax = {pmax} after {samples} envelope samples")]
    DegenerateEnvelope { pmax: f64, samples: usize },

    /// Maximum-attempts guard tripped before enough candidates were accepted
    #[error("rejection sampling gave up after {attempts} attempts ({accepted} of {requested} accepted)")]
    AttemptsExhausted {
        attempts: u64,
        accepted: usize,
        requested: usize,
    },

    #[error("invalid sampler configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
