// ABOUTME: Unified error handling for the workout engine
// ABOUTME: Defines the generation failure taxonomy and collaborator error wrappers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Unified Error Handling
//!
//! Every failure mode in the engine maps to one [`EngineError`] variant so
//! callers can distinguish retried-and-exhausted generation failures from
//! collaborator faults. Generation attempt failures (`Transport`, `Parse`,
//! `Structural`, `QualityRejected`) are consumed internally by the retry
//! protocol and only surface wrapped in [`EngineError::ExhaustedRetries`].

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Unified error type for the workout engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The completion service call failed at the transport level
    #[error("completion service call failed: {0}")]
    Transport(String),

    /// The completion text could not be parsed into a workout candidate
    #[error("unparsable completion: {reason}")]
    Parse {
        /// Why deserialization failed
        reason: String,
    },

    /// A parsed candidate is missing required fields or violates the
    /// exercise-name uniqueness invariant
    #[error("invalid workout structure: {reason}")]
    Structural {
        /// Human-readable description of the defect
        reason: String,
        /// Duplicated exercise names, when uniqueness was violated
        duplicates: Vec<String>,
    },

    /// The quality reviewer returned a critical verdict
    #[error("workout rejected by quality review ({} issues)", issues.len())]
    QualityRejected {
        /// Issues reported by the reviewer
        issues: Vec<String>,
    },

    /// All generation attempts failed; carries the last concrete error
    #[error("workout generation failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        /// Number of attempts made
        attempts: usize,
        /// The error recorded on the final attempt
        #[source]
        last_error: Box<EngineError>,
    },

    /// A record store or workout cache operation failed
    #[error("storage operation failed: {0}")]
    Storage(String),

    /// Internal serialization failure (engine-produced data, not peer output)
    #[error("serialization failed")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Transport-level completion failure
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Unparsable completion text
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Structural defect without duplicate names
    pub fn structural(reason: impl Into<String>) -> Self {
        Self::Structural {
            reason: reason.into(),
            duplicates: Vec::new(),
        }
    }

    /// Structural defect caused by duplicated exercise names
    pub fn duplicate_exercises(duplicates: Vec<String>) -> Self {
        Self::Structural {
            reason: format!("duplicate exercise names: {}", duplicates.join(", ")),
            duplicates,
        }
    }

    /// Storage collaborator failure
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether this error is an attempt-level failure the retry protocol
    /// feeds back to the peer (as opposed to a terminal or collaborator error)
    #[must_use]
    pub const fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Parse { .. }
                | Self::Structural { .. }
                | Self::QualityRejected { .. }
        )
    }

    /// Corrective feedback text sent back to the completion service after a
    /// failed attempt, naming the exact defect
    #[must_use]
    pub fn corrective_feedback(&self) -> String {
        match self {
            Self::Parse { reason } => format!(
                "Your previous response was not valid JSON ({reason}). \
                Respond with ONLY the JSON object, no markdown, no code fences, \
                no commentary."
            ),
            Self::Structural { reason, duplicates } => {
                if duplicates.is_empty() {
                    format!(
                        "Your previous response had an invalid structure: {reason}. \
                        Return a complete JSON object with all required fields."
                    )
                } else {
                    format!(
                        "Your previous response repeated these exercises: {}. \
                        Every exercise name must be unique. Regenerate the workout \
                        with distinct exercises.",
                        duplicates.join(", ")
                    )
                }
            }
            Self::QualityRejected { issues } => format!(
                "Your previous workout had these problems:\n- {}\n\
                Regenerate the workout fixing every listed problem.",
                issues.join("\n- ")
            ),
            other => format!(
                "Your previous response could not be used ({other}). \
                Generate the workout again as a single JSON object."
            ),
        }
    }
}
