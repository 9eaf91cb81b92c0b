//! Error Types for the Oracle Attestor
//!
//! Every failed call surfaces exactly one of these variants and leaves
//! no observable side effects behind.

use core::fmt;

use crate::authorization::Permission;

/// Result type alias for attestor operations
pub type AttestorResult<T> = Result<T, AttestorError>;

/// Main error enum for all attestor errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestorError {
    // ============ Protocol Errors ============
    /// Authority state read before initialization
    UninitializedState,

    /// Authority state changed between the read and the point of use
    StaleState {
        expected_version: u64,
        actual_version: u64,
    },

    /// Signature did not verify against the authority key
    InvalidSignature,

    /// Signature is structurally invalid (rejected before any crypto work)
    MalformedSignature { reason: &'static str },

    /// Prepared call was produced by an instance with a different configuration
    ForeignCall,

    // ============ Authorization Errors ============
    /// Authority state was already initialized
    AlreadyInitialized,

    /// Supplied credentials do not satisfy the required permission
    Unauthorized { required: Permission },

    /// Call requires a direct signature and none was supplied
    MissingSignature,

    /// Public key bytes do not decode to a usable curve point
    InvalidPublicKey,

    // ============ Record Errors ============
    /// Commitment hash does not commit to the supplied price and token
    CommitmentMismatch,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    // ============ Internal Errors ============
    /// A commit did not produce what its staged effects promised
    Internal { reason: &'static str },
}

impl AttestorError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::UninitializedState => "E001_UNINITIALIZED",
            Self::StaleState { .. } => "E002_STALE_STATE",
            Self::InvalidSignature => "E003_INVALID_SIGNATURE",
            Self::MalformedSignature { .. } => "E004_MALFORMED_SIGNATURE",
            Self::ForeignCall => "E005_FOREIGN_CALL",
            Self::AlreadyInitialized => "E010_ALREADY_INITIALIZED",
            Self::Unauthorized { .. } => "E011_UNAUTHORIZED",
            Self::MissingSignature => "E012_MISSING_SIGNATURE",
            Self::InvalidPublicKey => "E013_INVALID_PUBLIC_KEY",
            Self::CommitmentMismatch => "E020_COMMITMENT_MISMATCH",
            Self::InvalidInput { .. } => "E030_INVALID_INPUT",
            Self::Internal { .. } => "E099_INTERNAL",
        }
    }

    /// Returns true if the caller should re-fetch state and retry the whole call.
    ///
    /// Only staleness is transient. Every other error is a permanent
    /// rejection of the given inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleState { .. })
    }
}

impl fmt::Display for AttestorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UninitializedState => write!(f, "authority state is not initialized"),
            Self::StaleState { expected_version, actual_version } => write!(
                f,
                "authority state is stale: read at version {}, now at version {}",
                expected_version, actual_version
            ),
            Self::InvalidSignature => write!(f, "signature does not verify against the authority key"),
            Self::MalformedSignature { reason } => write!(f, "malformed signature: {}", reason),
            Self::ForeignCall => write!(f, "prepared call belongs to a differently configured instance"),
            Self::AlreadyInitialized => write!(f, "authority state is already initialized"),
            Self::Unauthorized { required } => {
                write!(f, "credentials do not satisfy permission {:?}", required)
            }
            Self::MissingSignature => write!(f, "call requires a direct signature"),
            Self::InvalidPublicKey => write!(f, "public key is not a valid curve point"),
            Self::CommitmentMismatch => {
                write!(f, "data hash does not commit to the supplied price and token")
            }
            Self::InvalidInput { param, reason } => write!(f, "invalid {}: {}", param, reason),
            Self::Internal { reason } => write!(f, "internal error: {}", reason),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AttestorError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            AttestorError::UninitializedState,
            AttestorError::StaleState { expected_version: 1, actual_version: 2 },
            AttestorError::InvalidSignature,
            AttestorError::MalformedSignature { reason: "short" },
            AttestorError::ForeignCall,
            AttestorError::AlreadyInitialized,
            AttestorError::Unauthorized { required: Permission::ProofOrSignature },
            AttestorError::MissingSignature,
            AttestorError::InvalidPublicKey,
            AttestorError::CommitmentMismatch,
            AttestorError::InvalidInput { param: "token", reason: "empty" },
            AttestorError::Internal { reason: "no event" },
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_only_stale_state_is_retryable() {
        assert!(AttestorError::StaleState { expected_version: 1, actual_version: 2 }.is_retryable());
        assert!(!AttestorError::InvalidSignature.is_retryable());
        assert!(!AttestorError::UninitializedState.is_retryable());
        assert!(!AttestorError::MalformedSignature { reason: "short" }.is_retryable());
        assert!(!AttestorError::ForeignCall.is_retryable());
    }

    #[test]
    fn test_internal_error_is_not_input_validation() {
        let err = AttestorError::Internal { reason: "verification committed no event" };
        assert_eq!(err.code(), "E099_INTERNAL");
        assert_ne!(err.code(), AttestorError::InvalidInput { param: "receipt", reason: "" }.code());
        assert!(err.to_string().starts_with("internal error"));
    }

    #[test]
    fn test_display_mentions_versions() {
        let err = AttestorError::StaleState { expected_version: 3, actual_version: 4 };
        let text = err.to_string();
        assert!(text.contains("version 3"));
        assert!(text.contains("version 4"));
    }
}
