//! Bridge error types
//!
//! Only operations with a host-visible failure mode return these. Rejected
//! objects are a protocol signal (`Verdict::Rejected`), and stale handles
//! are not detected by this layer at all.

use thiserror::Error;

use crate::core::compositor::Lifecycle;

/// Errors reported by the bridge
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Failed to initialize compositor engine: {message}")]
    InitializationFailed { message: String },

    #[error("Event interface already installed")]
    AlreadyInstalled,

    #[error("Invalid lifecycle transition: cannot {operation} while {state:?}")]
    InvalidState { operation: &'static str, state: Lifecycle },

    #[error("Engine refused event source: {message}")]
    EventSourceRefused { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl BridgeError {
    // ===== Convenience constructors =====

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed { message: msg.into() }
    }

    pub fn invalid_state(operation: &'static str, state: Lifecycle) -> Self {
        Self::InvalidState { operation, state }
    }

    pub fn event_source_refused(msg: impl Into<String>) -> Self {
        Self::EventSourceRefused { message: msg.into() }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument { message: msg.into() }
    }

    /// Check if the process must not continue towards `run()`
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::InitializationFailed { .. })
    }

    /// Check if this is a caller mistake rather than an engine refusal
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            BridgeError::AlreadyInstalled
                | BridgeError::InvalidState { .. }
                | BridgeError::InvalidArgument { .. }
        )
    }

    /// Get error code for debugging
    pub fn code(&self) -> u32 {
        match self {
            BridgeError::InitializationFailed { .. } => 1,
            BridgeError::AlreadyInstalled => 2,
            BridgeError::InvalidState { .. } => 3,
            BridgeError::EventSourceRefused { .. } => 20,
            BridgeError::InvalidArgument { .. } => 30,
        }
    }
}

/// Convert interior NUL errors raised while building C strings
impl From<std::ffi::NulError> for BridgeError {
    fn from(err: std::ffi::NulError) -> Self {
        BridgeError::invalid_argument(err.to_string())
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::initialization_failed("engine returned false");
        assert_eq!(
            err.to_string(),
            "Failed to initialize compositor engine: engine returned false"
        );

        let err = BridgeError::invalid_state("run", Lifecycle::Exited);
        assert_eq!(err.to_string(), "Invalid lifecycle transition: cannot run while Exited");
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(BridgeError::initialization_failed("test").is_fatal());
        assert!(!BridgeError::AlreadyInstalled.is_fatal());
        assert!(!BridgeError::event_source_refused("fd 3").is_fatal());
    }

    #[test]
    fn test_error_is_usage_error() {
        assert!(BridgeError::AlreadyInstalled.is_usage_error());
        assert!(BridgeError::invalid_state("run", Lifecycle::Uninitialized).is_usage_error());
        assert!(!BridgeError::initialization_failed("test").is_usage_error());
    }

    #[test]
    fn test_nul_error_conversion() {
        let err: BridgeError = std::ffi::CString::new("a\0b").unwrap_err().into();
        assert_eq!(err.code(), 30);
    }
}
