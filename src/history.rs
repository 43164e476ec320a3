// ABOUTME: Cached workout history entries with derived metadata and effectiveness tracking
// ABOUTME: Metadata is a pure projection of exercises and sets, recomputed on every change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Workout History
//!
//! A [`HistoryEntry`] wraps a cached [`Workout`] with derived
//! [`WorkoutMetadata`] and [`Effectiveness`] bookkeeping used for ranking.
//!
//! Metadata is never hand-edited. It is recomputed in full from the
//! underlying exercises and sets via [`WorkoutMetadata::derive`] whenever
//! they change, so stored intensity and volume cannot drift from the sets
//! that justify them.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{history, intensity};
use crate::models::{Exercise, Workout, WorkoutType};

// ============================================================================
// Muscle Group Tagging
// ============================================================================

/// Keyword-to-muscle-group lookup applied over exercise names
///
/// Matching is substring-based on the lowercased name, so "Incline Bench
/// Press" tags through the "bench press" keyword.
const MUSCLE_GROUP_MAP: &[(&str, &[&str])] = &[
    // Push
    ("bench press", &["chest", "triceps", "shoulders"]),
    ("push up", &["chest", "triceps", "shoulders"]),
    ("overhead press", &["shoulders", "triceps"]),
    ("shoulder press", &["shoulders", "triceps"]),
    ("dumbbell press", &["chest", "triceps", "shoulders"]),
    ("tricep", &["triceps"]),
    ("chest fly", &["chest"]),
    ("dips", &["chest", "triceps"]),
    // Pull
    ("pull up", &["back", "biceps"]),
    ("row", &["back", "biceps"]),
    ("lat pulldown", &["back", "biceps"]),
    ("deadlift", &["back", "legs", "core"]),
    ("bicep curl", &["biceps"]),
    ("chin up", &["back", "biceps"]),
    // Legs
    ("squat", &["legs", "glutes"]),
    ("lunge", &["legs", "glutes"]),
    ("leg press", &["legs", "glutes"]),
    ("leg curl", &["legs"]),
    ("leg extension", &["legs"]),
    ("calf raise", &["calves"]),
    ("hip thrust", &["glutes"]),
    // Core
    ("plank", &["core"]),
    ("crunch", &["core"]),
    ("sit up", &["core"]),
    ("ab", &["core"]),
    ("russian twist", &["core"]),
    // Full body
    ("burpee", &["full body"]),
    ("mountain climber", &["full body", "core"]),
    ("thruster", &["full body"]),
];

/// Extract the muscle groups a list of exercises works, sorted and deduped
#[must_use]
pub fn muscle_groups_for(exercises: &[Exercise]) -> Vec<String> {
    let mut groups = BTreeSet::new();
    for exercise in exercises {
        let name = exercise.name.to_lowercase();
        for (keyword, tagged) in MUSCLE_GROUP_MAP {
            if name.contains(keyword) {
                for group in *tagged {
                    groups.insert((*group).to_owned());
                }
            }
        }
    }
    groups.into_iter().collect()
}

// ============================================================================
// Intensity
// ============================================================================

/// Coarse workout intensity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// Fewer than 15 sets or under 2000 volume
    Low,
    /// Between the low and high thresholds
    #[default]
    Medium,
    /// More than 25 sets or over 5000 volume
    High,
}

impl Intensity {
    /// String representation used on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Classify a session volume alone, for recent-effort balancing
    #[must_use]
    pub fn from_volume(volume: f64) -> Self {
        if volume > intensity::HIGH_VOLUME_THRESHOLD {
            Self::High
        } else if volume < intensity::LOW_VOLUME_THRESHOLD {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

/// Classify intensity from derived totals
///
/// The high check runs first, so a workout that trips the high sets
/// threshold is high even when its volume alone would read low.
#[must_use]
pub fn classify_intensity(total_sets: u32, total_volume: f64) -> Intensity {
    if total_sets > intensity::HIGH_SETS_THRESHOLD || total_volume > intensity::HIGH_VOLUME_THRESHOLD
    {
        Intensity::High
    } else if total_sets < intensity::LOW_SETS_THRESHOLD
        || total_volume < intensity::LOW_VOLUME_THRESHOLD
    {
        Intensity::Low
    } else {
        Intensity::Medium
    }
}

// ============================================================================
// Derived Metadata
// ============================================================================

/// Derived projection over a cached workout's exercises and sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutMetadata {
    /// Day of week of the workout date (0 = Sunday, matching the source data)
    pub day_of_week: u32,
    /// Total number of sets
    pub total_sets: u32,
    /// Total prescribed reps
    pub total_reps: u32,
    /// Total volume: sum of weight x reps over all sets
    pub total_volume: f64,
    /// Muscle groups the workout touches
    pub muscle_groups: Vec<String>,
    /// Intensity bucket derived from sets and volume
    pub intensity: Intensity,
    /// Estimated duration in minutes
    pub estimated_duration_minutes: f64,
}

impl WorkoutMetadata {
    /// Derive metadata from a workout (pure function of exercises + date)
    #[must_use]
    pub fn derive(workout: &Workout) -> Self {
        let mut total_sets: u32 = 0;
        let mut total_reps: u32 = 0;
        let mut total_volume: f64 = 0.0;

        for exercise in &workout.exercises {
            total_sets += u32::try_from(exercise.sets.len()).unwrap_or(u32::MAX);
            for set in &exercise.sets {
                total_reps += set.target_reps;
                total_volume += set.volume();
            }
        }

        Self {
            day_of_week: workout.date.weekday().num_days_from_sunday(),
            total_sets,
            total_reps,
            total_volume,
            muscle_groups: muscle_groups_for(&workout.exercises),
            intensity: classify_intensity(total_sets, total_volume),
            estimated_duration_minutes: f64::from(total_sets) * history::MINUTES_PER_SET,
        }
    }
}

// ============================================================================
// Effectiveness and Update Tracking
// ============================================================================

/// Observed effectiveness of a cached workout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effectiveness {
    /// Times the entry has been resurfaced for use
    pub times_used: u32,
    /// When the entry was last used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    /// User rating, 1-5 stars, if rated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    /// Whether the user completed the workout
    pub completed: bool,
}

impl Effectiveness {
    /// Initial effectiveness for a freshly cached workout
    #[must_use]
    pub fn first_use(now: DateTime<Utc>) -> Self {
        Self {
            times_used: 1,
            last_used_at: Some(now),
            user_rating: None,
            completed: false,
        }
    }
}

/// Progression-merge bookkeeping for a cached workout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdates {
    /// When targets were last ratcheted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// How many merges have changed this entry
    pub update_count: u32,
}

// ============================================================================
// History Entry
// ============================================================================

/// A cached workout plus the derived data used for ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Entry id (shared with the wrapped workout)
    pub id: Uuid,
    /// The cached workout
    pub workout: Workout,
    /// Derived metadata; recomputed whenever exercises/sets change
    pub metadata: WorkoutMetadata,
    /// Usage and rating bookkeeping
    pub effectiveness: Effectiveness,
    /// Progression-merge bookkeeping
    pub progress_updates: ProgressUpdates,
}

impl HistoryEntry {
    /// Cache a workout as a new history entry, deriving its metadata
    #[must_use]
    pub fn from_workout(workout: Workout, now: DateTime<Utc>) -> Self {
        let metadata = WorkoutMetadata::derive(&workout);
        Self {
            id: workout.id,
            workout,
            metadata,
            effectiveness: Effectiveness::first_use(now),
            progress_updates: ProgressUpdates::default(),
        }
    }

    /// Recompute derived metadata from the current exercises and sets
    pub fn refresh_metadata(&mut self) {
        self.metadata = WorkoutMetadata::derive(&self.workout);
    }
}

// ============================================================================
// History Statistics
// ============================================================================

/// Aggregate statistics over a user's cached history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    /// Total cached entries
    pub total: usize,
    /// Entry counts per workout type
    pub by_type: HashMap<WorkoutType, usize>,
    /// Entry counts per intensity bucket
    pub by_intensity: HashMap<Intensity, usize>,
    /// Ids of the five most-used entries, most used first
    pub most_used: Vec<Uuid>,
    /// Muscle groups touched by the most recent entries
    pub recent_muscle_groups: Vec<String>,
}

/// Summarize a user's history (entries are expected newest first)
#[must_use]
pub fn history_stats(entries: &[HistoryEntry]) -> HistoryStats {
    let mut by_type: HashMap<WorkoutType, usize> = HashMap::new();
    let mut by_intensity: HashMap<Intensity, usize> = HashMap::new();
    for entry in entries {
        *by_type.entry(entry.workout.workout_type).or_default() += 1;
        *by_intensity.entry(entry.metadata.intensity).or_default() += 1;
    }

    let mut by_usage: Vec<&HistoryEntry> = entries.iter().collect();
    by_usage.sort_by(|a, b| b.effectiveness.times_used.cmp(&a.effectiveness.times_used));

    let recent_muscle_groups = entries
        .iter()
        .take(history::RECENT_STATS_ENTRIES)
        .flat_map(|e| e.metadata.muscle_groups.iter().cloned())
        .collect();

    HistoryStats {
        total: entries.len(),
        by_type,
        by_intensity,
        most_used: by_usage.iter().take(5).map(|e| e.id).collect(),
        recent_muscle_groups,
    }
}

/// Whether a workout should be skipped as a duplicate of an existing entry
///
/// Two entries are considered duplicates when they were generated at the
/// same instant with the same exercise count.
#[must_use]
pub fn is_duplicate_entry(entries: &[HistoryEntry], workout: &Workout) -> bool {
    entries.iter().any(|entry| {
        entry.workout.generated_at == workout.generated_at
            && entry.workout.exercises.len() == workout.exercises.len()
    })
}
