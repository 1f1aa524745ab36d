//! Error types for the interview orchestrator.
//!
//! This module defines the error hierarchy for all orchestrator operations,
//! including configuration loading, question bank validation, session
//! commands, proctoring gates, and transcription capability failures.

use std::path::PathBuf;

/// A specialized `Result` type for interview orchestrator operations.
pub type Result<T> = std::result::Result<T, InterviewError>;

/// Errors that can occur while running an interview session.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues.
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your interview.json with a JSON linter")]
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
    // Question Bank Errors
    // ========================================================================
    /// A custom question bank file was not found.
    #[error("Question bank not found: '{path}'\n\nSuggestion: Check the 'questionBank' field in interview.json or remove it to use the built-in bank")]
    QuestionBankNotFound {
        /// Path where the bank was expected.
        path: PathBuf,
    },

    /// A question bank failed validation.
    #[error("Invalid question bank: {message}\n\nSuggestion: Every bank needs at least one default question and unique question ids")]
    QuestionBankInvalid {
        /// Description of the validation failure.
        message: String,
    },

    // ========================================================================
    // Transcription Errors
    // ========================================================================
    /// The speech capability is not available in the host environment.
    ///
    /// Non-fatal: typed submissions keep working.
    #[error("Speech transcription unavailable: {reason}\n\nSuggestion: Type your answer instead; speech input is optional")]
    TranscriptionUnavailable {
        /// Why the capability could not be started.
        reason: String,
    },

    // ========================================================================
    // Proctoring Gates
    // ========================================================================
    /// Interaction was attempted while the room is not in fullscreen.
    #[error("Fullscreen required: {remaining_warnings} warning(s) remaining\n\nSuggestion: Re-enter fullscreen to continue the interview")]
    FullscreenRequired {
        /// Violations left before lockout.
        remaining_warnings: u32,
    },

    /// The session was terminated by the proctoring lockout.
    #[error("Interview terminated: exceeded maximum proctoring violations ({violation_count})\n\nSuggestion: Start a new session to try again")]
    LockedOut {
        /// Violation count at the time of the attempt.
        violation_count: u32,
    },

    // ========================================================================
    // Session Lifecycle Errors
    // ========================================================================
    /// A command was sent to a session that has already ended.
    #[error("Session has already concluded")]
    SessionConcluded,

    /// A deferred transition was cancelled because the session ended.
    #[error("Deferred transition cancelled: session terminated")]
    Cancelled,

    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InterviewError {
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

    /// Creates a new `QuestionBankNotFound` error.
    #[must_use]
    pub fn bank_not_found(path: impl Into<PathBuf>) -> Self {
        Self::QuestionBankNotFound { path: path.into() }
    }

    /// Creates a new `QuestionBankInvalid` error.
    #[must_use]
    pub fn bank_invalid(message: impl Into<String>) -> Self {
        Self::QuestionBankInvalid {
            message: message.into(),
        }
    }

    /// Creates a new `TranscriptionUnavailable` error.
    #[must_use]
    pub fn transcription_unavailable(reason: impl Into<String>) -> Self {
        Self::TranscriptionUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new `FullscreenRequired` error.
    #[must_use]
    pub const fn fullscreen_required(remaining_warnings: u32) -> Self {
        Self::FullscreenRequired { remaining_warnings }
    }

    /// Creates a new `LockedOut` error.
    #[must_use]
    pub const fn locked_out(violation_count: u32) -> Self {
        Self::LockedOut { violation_count }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if this error prevents a session from starting at all.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::QuestionBankNotFound { .. }
                | Self::QuestionBankInvalid { .. }
        )
    }

    /// Returns `true` if this error comes from a proctoring gate rather than a fault.
    #[must_use]
    pub const fn is_gating(&self) -> bool {
        matches!(
            self,
            Self::FullscreenRequired { .. } | Self::LockedOut { .. }
        )
    }
}
