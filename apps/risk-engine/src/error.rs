//! Error taxonomy for the risk engine.
//!
//! Every fallible engine operation returns [`EngineError`]. Errors carry an
//! [`ErrorCode`] with a stable reason string so calling layers can map them
//! onto their own transport (HTTP status, gRPC code, UI message).
//!
//! | Code | Raised when |
//! |------|-------------|
//! | `INVALID_INPUT` | Non-positive prices, empty leg lists, non-finite conversions |
//! | `INVALID_LEG` | A leg's fields are inconsistent with its instrument type |
//! | `CONFIGURATION_ERROR` | Required thresholds/weights missing or inconsistent |
//! | `CANCELLED` | A caller-supplied cancellation signal fired mid-computation |
//! | `REPOSITORY_ERROR` | Snapshot storage failed |
//!
//! Degenerate statistics (zero standard deviation, empty simulation sets) are
//! not errors; they are reported as flags inside the simulation report.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Error codes for the risk engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed numeric input.
    InvalidInput,
    /// Leg fields inconsistent with its type.
    InvalidLeg,
    /// Missing or inconsistent configuration.
    ConfigurationError,
    /// Computation cancelled by the caller.
    Cancelled,
    /// Snapshot repository failure.
    RepositoryError,
}

impl ErrorCode {
    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidLeg => "INVALID_LEG",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::RepositoryError => "REPOSITORY_ERROR",
        }
    }

    /// Whether the caller can fix the request and retry.
    #[must_use]
    pub const fn is_caller_fault(&self) -> bool {
        matches!(self, Self::InvalidInput | Self::InvalidLeg)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// What is wrong with a single leg.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegDefect {
    /// CALL/PUT leg without a strike.
    #[error("option leg is missing a strike")]
    MissingStrike,

    /// CALL/PUT leg with a zero or negative strike.
    #[error("strike must be positive, got {0}")]
    NonPositiveStrike(Decimal),

    /// STOCK leg carrying a strike.
    #[error("stock leg must not carry a strike")]
    UnexpectedStrike,

    /// Quantity of zero (neither long nor short).
    #[error("quantity must be non-zero")]
    ZeroQuantity,

    /// Negative premium.
    #[error("premium must be non-negative, got {0}")]
    NegativePremium(Decimal),

    /// Negative margin.
    #[error("margin must be non-negative, got {0}")]
    NegativeMargin(Decimal),
}

/// Errors produced by engine computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed numeric input, rejected before computation starts.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },

    /// A leg is inconsistent with its instrument type.
    #[error(
        "Invalid leg{}: {defect}",
        .index.map(|i| format!(" #{i}")).unwrap_or_default()
    )]
    InvalidLeg {
        /// Position of the leg within its strategy, when known.
        index: Option<usize>,
        /// The defect.
        defect: LegDefect,
    },

    /// Required configuration is missing or inconsistent.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The caller's cancellation signal fired.
    #[error("Computation cancelled")]
    Cancelled,

    /// Snapshot repository failure.
    #[error("Repository error: {message}")]
    Repository {
        /// Error message.
        message: String,
    },
}

impl EngineError {
    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// `InvalidInput` for an intermediate value that left the decimal range.
    #[must_use]
    pub fn overflow(what: &str) -> Self {
        Self::invalid_input(format!("{what} overflows the decimal range"))
    }

    /// Create a `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a `Repository` error.
    #[must_use]
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    /// Attach a leg index to an `InvalidLeg` error; other variants pass through.
    #[must_use]
    pub fn at_leg(self, index: usize) -> Self {
        match self {
            Self::InvalidLeg { defect, .. } => Self::InvalidLeg {
                index: Some(index),
                defect,
            },
            other => other,
        }
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::InvalidLeg { .. } => ErrorCode::InvalidLeg,
            Self::Configuration { .. } => ErrorCode::ConfigurationError,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Repository { .. } => ErrorCode::RepositoryError,
        }
    }
}

impl From<LegDefect> for EngineError {
    fn from(defect: LegDefect) -> Self {
        Self::InvalidLeg {
            index: None,
            defect,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
