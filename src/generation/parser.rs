// ABOUTME: Completion text cleanup and deserialization into workout candidates
// ABOUTME: Tolerates code fences, trailing commas, and prose wrapped around the JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Response Parser
//!
//! Completions arrive as untrusted free text. Despite the system prompt
//! demanding bare JSON, models routinely wrap the object in a fenced code
//! block, leave trailing commas, or add commentary around it. This module
//! strips that incidental noise and deserializes the result into a
//! [`WorkoutCandidate`] for structural validation.

use serde::Deserialize;

use crate::errors::{EngineError, EngineResult};
use crate::models::{CardioSession, Exercise, ExerciseSet, SetMetric, WorkoutType};

// ============================================================================
// Candidate Types
// ============================================================================

/// Parsed but not yet validated workout payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutCandidate {
    /// Declared workout type; absent defaults to the requested type
    #[serde(rename = "type", default)]
    pub workout_type: Option<WorkoutType>,
    /// Exercise list, required for strength/stretching/mixed
    #[serde(default)]
    pub exercises: Option<Vec<ExerciseCandidate>>,
    /// Cardio block, required for cardio/mixed
    #[serde(default)]
    pub cardio: Option<CardioSession>,
    /// Coach explanation of the workout
    #[serde(default)]
    pub summary: Option<String>,
}

/// One exercise as emitted by the completion service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCandidate {
    /// Exercise name (identity key after trim/lowercase)
    pub name: String,
    /// Whether performed independently per body side
    #[serde(default)]
    pub is_per_side: bool,
    /// Unit the sets are measured in
    #[serde(default)]
    pub metric: SetMetric,
    /// Suggested rest between sets
    #[serde(default)]
    pub recommended_rest_seconds: Option<u32>,
    /// Coaching cues
    #[serde(default)]
    pub form_cues: Vec<String>,
    /// Prescribed sets
    #[serde(default)]
    pub sets: Vec<SetCandidate>,
}

/// One prescribed set as emitted by the completion service
#[derive(Debug, Clone, Deserialize)]
pub struct SetCandidate {
    /// Prescribed weight
    #[serde(default)]
    pub weight: f64,
    /// Prescribed reps
    #[serde(default)]
    pub reps: u32,
    /// Completion flag (always false on a fresh prescription)
    #[serde(default)]
    pub completed: bool,
}

impl From<ExerciseCandidate> for Exercise {
    fn from(candidate: ExerciseCandidate) -> Self {
        Self {
            name: candidate.name,
            is_per_side: candidate.is_per_side,
            metric: candidate.metric,
            recommended_rest_seconds: candidate.recommended_rest_seconds,
            form_cues: candidate.form_cues,
            sets: candidate
                .sets
                .into_iter()
                .map(|set| {
                    let mut prescribed = ExerciseSet::new(set.weight, set.reps);
                    prescribed.completed = set.completed;
                    prescribed
                })
                .collect(),
        }
    }
}

// ============================================================================
// Cleanup
// ============================================================================

/// Strip one leading/trailing fenced-code wrapper, if present
fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some((_, body)) = rest.split_once('\n') else {
        // Single-line fence: keep the payload, dropping the language tag
        // and the closing backticks
        let inline = rest.trim_end();
        let inline = inline.strip_suffix("```").unwrap_or(inline);
        return inline
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
            .trim();
    };
    // Drop the fence line, including any language tag (```json)
    let body = body.trim_end();
    body.strip_suffix("```").map_or(body, str::trim_end).trim()
}

/// Remove trailing commas before closing brackets, outside string literals
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = input.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Clean incidental formatting noise from a completion
///
/// Trims whitespace, removes a single surrounding code fence, and deletes
/// trailing commas before closing brackets. Applied identically to workout
/// completions and quality-review verdicts.
#[must_use]
pub fn clean_completion(raw: &str) -> String {
    strip_trailing_commas(strip_code_fence(raw))
}

/// Find an embedded JSON object inside text with surrounding prose
///
/// Returns the widest `{ ... }` slice that parses as JSON, if any.
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let candidate = &text[start..=end];
    serde_json::from_str::<serde_json::Value>(candidate)
        .is_ok()
        .then_some(candidate)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a cleaned completion into a workout candidate
///
/// # Errors
///
/// Returns [`EngineError::Parse`] when the completion is not valid JSON even
/// after cleanup and embedded-object extraction.
pub fn parse_workout(raw: &str) -> EngineResult<WorkoutCandidate> {
    let cleaned = clean_completion(raw);
    match serde_json::from_str(&cleaned) {
        Ok(candidate) => Ok(candidate),
        Err(first_error) => {
            if let Some(embedded) = extract_object(&cleaned) {
                if let Ok(candidate) = serde_json::from_str(embedded) {
                    return Ok(candidate);
                }
            }
            Err(EngineError::parse(first_error.to_string()))
        }
    }
}

/// Parse a generic JSON payload with the same noise tolerance as workouts
///
/// # Errors
///
/// Returns [`EngineError::Parse`] when no valid JSON can be recovered.
pub fn parse_lenient<T: serde::de::DeserializeOwned>(raw: &str) -> EngineResult<T> {
    let cleaned = clean_completion(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            if let Some(embedded) = extract_object(&cleaned) {
                if let Ok(value) = serde_json::from_str(embedded) {
                    return Ok(value);
                }
            }
            Err(EngineError::parse(first_error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"{"exercises":[{"name":"Squat","sets":[{"weight":135,"reps":8,"completed":false}]}],"summary":"Leg day"}"#;

    #[test]
    fn parses_bare_json() {
        let candidate = parse_workout(PLAIN).unwrap();
        let exercises = candidate.exercises.unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Squat");
        assert_eq!(exercises[0].sets[0].reps, 8);
    }

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{PLAIN}\n```");
        assert!(parse_workout(&fenced).is_ok());
    }

    #[test]
    fn strips_bare_fence() {
        let fenced = format!("```\n{PLAIN}\n```");
        assert!(parse_workout(&fenced).is_ok());
    }

    #[test]
    fn strips_single_line_fence() {
        let fenced = format!("```json {PLAIN}```");
        let candidate = parse_workout(&fenced).unwrap();
        assert_eq!(candidate.summary.as_deref(), Some("Leg day"));

        let bare = format!("```{PLAIN}```");
        assert!(parse_workout(&bare).is_ok());
    }

    #[test]
    fn removes_trailing_commas() {
        let noisy = r#"{"exercises": [{"name": "Squat", "sets": [{"weight": 135, "reps": 8,},],},], "summary": "Legs",}"#;
        let candidate = parse_workout(noisy).unwrap();
        assert_eq!(candidate.summary.as_deref(), Some("Legs"));
    }

    #[test]
    fn keeps_commas_inside_strings() {
        let input = r#"{"summary": "push, then pull, }"}"#;
        let candidate = parse_workout(input).unwrap();
        assert_eq!(candidate.summary.as_deref(), Some("push, then pull, }"));
    }

    #[test]
    fn extracts_object_from_prose() {
        let chatty = format!("Here is your workout!\n{PLAIN}\nEnjoy!");
        assert!(parse_workout(&chatty).is_ok());
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_workout("I cannot generate a workout today.").unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn candidate_converts_to_exercise() {
        let candidate = parse_workout(PLAIN).unwrap();
        let exercise: Exercise = candidate.exercises.unwrap().remove(0).into();
        assert!((exercise.sets[0].target_weight - 135.0).abs() < f64::EPSILON);
        assert_eq!(exercise.sets[0].target_reps, 8);
        assert!(!exercise.sets[0].completed);
    }
}
