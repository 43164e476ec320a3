// ABOUTME: Core domain data model for workouts, exercises, sets, and chat messages
// ABOUTME: Shared by the generation protocol, progression merger, and recommendation scorer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Domain Model
//!
//! Data structures for the workout engine. A [`Workout`] is produced by the
//! generation protocol, performed by the user, and cached as a history entry
//! for progression merging and recommendation scoring.
//!
//! Exercise identity is the trimmed, lowercased name (see
//! [`Exercise::canonical_name`]). This weak key is deliberate: set-level
//! progression matching falls back to exactly this comparison, so a stronger
//! synthetic id must not be introduced.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Chat Messages
// ============================================================================

/// Role of a message in a completion-service conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// String representation used on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Workout Types
// ============================================================================

/// Category of a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    /// Resistance training with exercises and sets
    #[default]
    Strength,
    /// Cardio session (run, ride, swim, ...)
    Cardio,
    /// Stretching and mobility work
    Stretching,
    /// Combined strength and cardio
    Mixed,
}

impl WorkoutType {
    /// String representation used on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Stretching => "stretching",
            Self::Mixed => "mixed",
        }
    }

    /// Whether this type carries an exercise list
    #[must_use]
    pub const fn has_exercises(&self) -> bool {
        matches!(self, Self::Strength | Self::Stretching | Self::Mixed)
    }

    /// Whether this type carries a cardio block
    #[must_use]
    pub const fn has_cardio(&self) -> bool {
        matches!(self, Self::Cardio | Self::Mixed)
    }
}

/// Unit each set of an exercise is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SetMetric {
    /// Repetition count
    #[default]
    Reps,
    /// Duration (seconds)
    Time,
    /// Distance (meters)
    Distance,
}

/// How a workout entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutSource {
    /// Produced by the generation protocol
    #[default]
    Generated,
    /// Scheduled from a training plan
    Plan,
    /// Copied from a saved template
    Template,
    /// Logged by hand
    Manual,
}

// ============================================================================
// Exercises and Sets
// ============================================================================

/// One prescribed or performed set of an exercise
///
/// Completed sets are immutable inputs to progression merging; the engine
/// never retroactively edits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    /// Prescribed weight for this set (non-negative)
    pub target_weight: f64,
    /// Prescribed reps for this set (non-negative)
    pub target_reps: u32,
    /// Whether the user actually completed this set
    pub completed: bool,
    /// Rate of perceived exertion (1-10), if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
    /// Reps in reserve, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rir: Option<f64>,
    /// Whether the set was taken to failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_failure: Option<bool>,
    /// Whether form broke down during the set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_breakdown: Option<bool>,
    /// Whether the user reported pain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain: Option<bool>,
    /// Free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseSet {
    /// Create a prescribed set with the given targets
    #[must_use]
    pub const fn new(target_weight: f64, target_reps: u32) -> Self {
        Self {
            target_weight,
            target_reps,
            completed: false,
            rpe: None,
            rir: None,
            to_failure: None,
            form_breakdown: None,
            pain: None,
            notes: None,
        }
    }

    /// Mark the set completed, returning self for fixture-style chaining
    #[must_use]
    pub const fn mark_completed(mut self) -> Self {
        self.completed = true;
        self
    }

    /// Volume contribution of this set (weight x reps)
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.target_weight * f64::from(self.target_reps)
    }
}

/// A named exercise with its ordered sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Exercise name; trimmed lowercase form is the identity key
    pub name: String,
    /// Whether the exercise is performed independently per body side
    #[serde(default)]
    pub is_per_side: bool,
    /// Unit the sets are measured in
    #[serde(default)]
    pub metric: SetMetric,
    /// Suggested rest between sets, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_rest_seconds: Option<u32>,
    /// Ordered coaching cues for form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_cues: Vec<String>,
    /// Ordered sets
    pub sets: Vec<ExerciseSet>,
}

impl Exercise {
    /// Create an exercise with the given name and sets
    #[must_use]
    pub fn new(name: impl Into<String>, sets: Vec<ExerciseSet>) -> Self {
        Self {
            name: name.into(),
            is_per_side: false,
            metric: SetMetric::default(),
            recommended_rest_seconds: None,
            form_cues: Vec::new(),
            sets,
        }
    }

    /// Identity key: trimmed, lowercased name
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// Whether two exercises refer to the same movement
    #[must_use]
    pub fn same_movement(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
    }
}

/// Cardio block of a cardio or mixed workout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioSession {
    /// Activity name (run, row, cycle, ...)
    pub activity: String,
    /// Planned duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    /// Planned distance in kilometers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Target intensity description (easy, tempo, intervals, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,
}

// ============================================================================
// Workout
// ============================================================================

/// A generated or logged workout
///
/// Either a live instance being executed or a cached instance stored for
/// reuse and ranking (see [`crate::history::HistoryEntry`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// Unique workout id
    pub id: Uuid,
    /// Calendar date the workout is for
    pub date: NaiveDate,
    /// Workout category
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    /// Exercises, for strength/stretching/mixed workouts
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// Cardio block, for cardio/mixed workouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardio: Option<CardioSession>,
    /// Coach-style explanation of the workout's focus
    pub summary: String,
    /// Focus keyword the workout was generated for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// How the workout entered the system
    #[serde(default)]
    pub source: WorkoutSource,
    /// Raw completion text the workout was assembled from, kept for audit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// When the workout was generated
    pub generated_at: DateTime<Utc>,
}

impl Workout {
    /// Total volume across completed sets only (weight x reps)
    #[must_use]
    pub fn completed_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .map(ExerciseSet::volume)
            .sum()
    }
}

// ============================================================================
// Generation Request
// ============================================================================

/// Structured request for one workout generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Requested workout category
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    /// Optional focus (muscle group, movement pattern, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Optional available equipment description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    /// Optional free-text notes for today
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GenerationRequest {
    /// Request a workout of the given type with no preferences
    #[must_use]
    pub fn new(workout_type: WorkoutType) -> Self {
        Self {
            workout_type,
            ..Self::default()
        }
    }

    /// Set the focus keyword
    #[must_use]
    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    /// Set the available equipment
    #[must_use]
    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment = Some(equipment.into());
        self
    }

    /// Set free-text notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
