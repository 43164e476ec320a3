// ABOUTME: Structural and quality validation gates for parsed workout candidates
// ABOUTME: Structural checks are pure and local; quality review is a second completion round-trip
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Candidate Validation
//!
//! Two gates run over a parsed [`WorkoutCandidate`], strictly in order:
//!
//! 1. **Structural** — pure, local checks: type-specific required fields and
//!    exercise-name uniqueness. Repeated names are a correctness failure,
//!    not a style issue: the progression merger keys sets by exercise name,
//!    and duplicates corrupt that identity.
//! 2. **Quality** — a second completion round-trip asking the service to
//!    judge realism and safety, returning a `{valid, issues, severity}`
//!    verdict. An unparsable verdict is treated as critical: an approval the
//!    engine cannot read is not an approval.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, warn};

use super::parser::{parse_lenient, WorkoutCandidate};
use crate::constants::generation::QUALITY_REVIEW_TEMPERATURE;
use crate::errors::{EngineError, EngineResult};
use crate::llm::{prompts, CompletionClient, CompletionRequest, TaskType};
use crate::models::{ChatMessage, WorkoutType};

// ============================================================================
// Structural Validation
// ============================================================================

/// Check a parsed candidate for required shape
///
/// For strength/stretching/mixed the candidate must carry a non-empty
/// exercise list; for cardio/mixed it must carry a cardio block. Set targets
/// must be non-negative, and exercise names must be unique after trimming
/// and lowercasing.
///
/// # Errors
///
/// Returns [`EngineError::Structural`] naming the missing field, the invalid
/// value, or the duplicated exercise names.
pub fn validate_structure(
    candidate: &WorkoutCandidate,
    requested_type: WorkoutType,
) -> EngineResult<()> {
    let workout_type = candidate.workout_type.unwrap_or(requested_type);

    if workout_type.has_exercises() {
        let exercises = candidate
            .exercises
            .as_deref()
            .filter(|list| !list.is_empty())
            .ok_or_else(|| {
                EngineError::structural(format!(
                    "missing exercises list for {} workout",
                    workout_type.as_str()
                ))
            })?;

        for exercise in exercises {
            if exercise.name.trim().is_empty() {
                return Err(EngineError::structural("exercise with empty name"));
            }
            for set in &exercise.sets {
                if set.weight < 0.0 {
                    return Err(EngineError::structural(format!(
                        "negative weight in '{}'",
                        exercise.name
                    )));
                }
            }
        }

        check_unique_names(exercises.iter().map(|e| e.name.as_str()))?;
    }

    if workout_type.has_cardio() && candidate.cardio.is_none() {
        return Err(EngineError::structural(format!(
            "missing cardio block for {} workout",
            workout_type.as_str()
        )));
    }

    Ok(())
}

/// Enforce the exercise-name uniqueness invariant
///
/// Names are compared case-insensitively after trimming. On violation the
/// duplicated names are listed explicitly so the corrective feedback can
/// name them.
///
/// # Errors
///
/// Returns [`EngineError::Structural`] with the duplicated names.
pub fn check_unique_names<'a>(names: impl Iterator<Item = &'a str>) -> EngineResult<()> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for name in names {
        let canonical = name.trim().to_lowercase();
        if !seen.insert(canonical) {
            let trimmed = name.trim().to_owned();
            if !duplicates.contains(&trimmed) {
                duplicates.push(trimmed);
            }
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(EngineError::duplicate_exercises(duplicates))
    }
}

// ============================================================================
// Quality Review
// ============================================================================

/// Severity of a quality verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Acceptable with warnings; does not trigger a retry
    Minor,
    /// The workout must be regenerated
    Critical,
}

/// Parsed second-opinion verdict on a candidate workout
#[derive(Debug, Clone)]
pub struct QualityVerdict {
    /// Whether the reviewer accepted the workout
    pub valid: bool,
    /// Reported problems, used as corrective feedback on rejection
    pub issues: Vec<String>,
    /// Whether the problems require regeneration
    pub severity: Severity,
}

impl QualityVerdict {
    /// Whether this verdict forces a regeneration attempt
    ///
    /// Severity alone decides: a minor verdict is accepted with warnings
    /// even when invalid, and a critical verdict rejects regardless.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.severity == Severity::Critical
    }

    /// Fail-safe verdict for an unreadable reviewer response
    fn unreadable(reason: &str) -> Self {
        Self {
            valid: false,
            issues: vec![format!("quality verdict could not be parsed: {reason}")],
            severity: Severity::Critical,
        }
    }
}

/// Wire shape of the reviewer's response
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    severity: Option<String>,
}

impl RawVerdict {
    /// Interpret the loosely-typed wire verdict
    ///
    /// An unknown or missing severity resolves from the valid flag: an
    /// invalid verdict without a readable severity is critical (fail safe,
    /// not fail open).
    fn into_verdict(self) -> QualityVerdict {
        let severity = match self.severity.as_deref().map(str::to_lowercase).as_deref() {
            Some("critical") => Severity::Critical,
            Some("minor") => Severity::Minor,
            other => {
                if let Some(unknown) = other {
                    warn!("unknown quality severity {unknown:?}");
                }
                if self.valid {
                    Severity::Minor
                } else {
                    Severity::Critical
                }
            }
        };
        QualityVerdict {
            valid: self.valid,
            issues: self.issues,
            severity,
        }
    }
}

/// Ask the completion service for a second opinion on a candidate workout
///
/// The raw completion text is embedded in the review request so the reviewer
/// sees exactly what the client would. The verdict is parsed with the same
/// formatting tolerance as the main response; a verdict that still cannot be
/// parsed is treated as a critical rejection.
///
/// # Errors
///
/// Returns [`EngineError::Transport`] when the review call itself fails.
pub async fn review_quality<C: CompletionClient + ?Sized>(
    client: &C,
    raw_workout: &str,
    requested_type: WorkoutType,
) -> EngineResult<QualityVerdict> {
    let user_message = format!(
        "Requested workout type: {}\n\nGenerated workout:\n{}\n\n\
        Return your verdict as JSON.",
        requested_type.as_str(),
        raw_workout
    );

    let request = CompletionRequest::new(vec![
        ChatMessage::system(prompts::quality_review_prompt()),
        ChatMessage::user(user_message),
    ])
    .with_temperature(QUALITY_REVIEW_TEMPERATURE)
    .with_task(TaskType::QualityReview);

    let completion = client.complete(&request).await?;

    let verdict = match parse_lenient::<RawVerdict>(&completion.content) {
        Ok(raw) => raw.into_verdict(),
        Err(err) => {
            warn!("quality verdict unparsable: {err}");
            QualityVerdict::unreadable(&err.to_string())
        }
    };

    debug!(
        valid = verdict.valid,
        issues = verdict.issues.len(),
        critical = verdict.severity == Severity::Critical,
        "quality review verdict"
    );

    Ok(verdict)
}
