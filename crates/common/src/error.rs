/// Errors surfaced by the wave-spectrum engine.
///
/// Construction-time problems (`InvalidConfiguration`, `ResourceAllocationFailure`,
/// `NumericDegenerate`) are fatal: no partially built grid is ever returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaveError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("failed to allocate {bytes} bytes for {what}")]
    ResourceAllocationFailure { what: &'static str, bytes: usize },
    #[error("numeric degenerate: {0}")]
    NumericDegenerate(String),
    #[error("cannot {operation} while grid is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl WaveError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for the error kinds that abort construction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_)
                | Self::ResourceAllocationFailure { .. }
                | Self::NumericDegenerate(_)
        )
    }
}
