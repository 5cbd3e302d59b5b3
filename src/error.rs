//! Error types for the ilview presentation core.
//!
//! None of these errors is allowed to escape a pane operation. Panes absorb
//! them into a displayed state (empty pane, unchanged tier, default tier) and
//! report `false` to the caller. The typed variants exist so that internal
//! helpers can use `?` and so that logs carry a precise reason.

use crate::core::il_tier::IlTier;
use thiserror::Error;

/// Main error type for ilview operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Address or function no longer resolves in the analysis engine
    #[error("No function at {address:#x}")]
    UnresolvedFunction { address: u64 },

    /// Requested IL tier has no data for the bound function
    #[error("IL tier {tier} unavailable for function at {function:#x}")]
    TierUnavailable { tier: IlTier, function: u64 },

    /// A history document references state that cannot be restored
    #[error("History entry mismatch: {0}")]
    DeserializationMismatch(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for ilview operations
pub type Result<T> = std::result::Result<T, ViewError>;
