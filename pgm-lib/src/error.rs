use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PgmError {
    /// The requested numbers describe a physically unreachable configuration.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("unknown grating: {0}")]
    UnknownGrating(String),

    /// Stored state disagrees with the optics formulas.
    #[error("{quantity} is inconsistent: stored {stored}, recomputed {recomputed}")]
    ConsistencyViolation {
        quantity: &'static str,
        stored: f64,
        recomputed: f64,
    },

    #[error("unknown undulator harmonic: {0}")]
    UnknownHarmonic(u32),

    #[error("model store error: {0}")]
    ModelStore(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("detector '{name}' failed: {message}")]
    Detector { name: String, message: String },

    #[error("scan aborted after {completed} points")]
    ScanAborted { completed: usize },
}

pub type Result<T> = std::result::Result<T, PgmError>;

impl PgmError {
    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }
}
