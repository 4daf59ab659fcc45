//! Error types for Skirmish.
//!
//! The combat core treats invalid in-simulation states as no-ops; these
//! errors only cover misuse of the public API and bad configuration.

use crate::ids::ActorId;
use thiserror::Error;

/// Top-level error type for Skirmish operations.
#[derive(Debug, Error)]
pub enum SkirmishError {
    /// Simulation API errors
    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the simulation driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// No live actor with this id
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// Operation requires a player-controlled actor
    #[error("{0} is not player-controlled")]
    NotAPlayer(ActorId),

    /// Operation requires an autonomous enemy
    #[error("{0} is not an enemy")]
    NotAnEnemy(ActorId),

    /// Damage amounts must be non-negative
    #[error("negative damage amount: {0}")]
    NegativeDamage(i32),
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field holds a value outside its valid domain
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for building an [`ConfigError::InvalidValue`].
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for simulation API calls.
pub type SimResult<T> = Result<T, SimError>;

/// Result type alias for Skirmish operations.
pub type SkirmishResult<T> = Result<T, SkirmishError>;
