//! Error types for the Quizbot engine.
//!
//! This module defines the error hierarchy for all engine operations,
//! including configuration loading, content validation, question drawing,
//! actor interactions, and session state transitions.

use std::path::PathBuf;

/// A specialized `Result` type for Quizbot engine operations.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors that can occur while preparing or running a quiz session.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues. An unrecognized answer is not
/// an error: it is an ordinary outcome that scores as incorrect.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your quizbot.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Content Errors
    // ========================================================================
    /// Two quiz items share the same label.
    #[error("Duplicate quiz item label: '{label}'\n\nSuggestion: Give every entry in 'items' a unique label")]
    DuplicateLabel {
        /// The label that appears more than once.
        label: String,
    },

    /// A round asked for more items than the question bank holds.
    ///
    /// Raised before any actor interaction so a session never starts with
    /// a plan that would have to repeat items.
    #[error("Cannot draw {requested} questions from a bank of {available} items\n\nSuggestion: Lower 'rounds' or add more entries to 'items'")]
    InsufficientItems {
        /// Number of items requested for the round.
        requested: usize,
        /// Number of distinct items in the bank.
        available: usize,
    },

    // ========================================================================
    // Actor Errors
    // ========================================================================
    /// The actor failed or disconnected mid-interaction.
    #[error("Actor unavailable: {message}\n\nSuggestion: Check the connection to the robot and start a new session")]
    ActorUnavailable {
        /// Description of the failure reported by the actor.
        message: String,
    },

    // ========================================================================
    // State Machine Errors
    // ========================================================================
    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },
}

impl QuizError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `DuplicateLabel` error.
    #[must_use]
    pub fn duplicate_label(label: impl Into<String>) -> Self {
        Self::DuplicateLabel {
            label: label.into(),
        }
    }

    /// Creates a new `InsufficientItems` error.
    #[must_use]
    pub const fn insufficient_items(requested: usize, available: usize) -> Self {
        Self::InsufficientItems {
            requested,
            available,
        }
    }

    /// Creates a new `ActorUnavailable` error.
    #[must_use]
    pub fn actor_unavailable(message: impl Into<String>) -> Self {
        Self::ActorUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if the actor went away and the session must stop
    /// without emitting further intents.
    #[must_use]
    pub const fn is_actor_failure(&self) -> bool {
        matches!(self, Self::ActorUnavailable { .. })
    }
}
