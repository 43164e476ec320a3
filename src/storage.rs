// ABOUTME: Collaborator storage contracts and in-memory implementations
// ABOUTME: Record store for user state, workout cache for ranked history entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Storage Contracts
//!
//! The engine reads and writes user state through two abstract collaborator
//! interfaces; it defines neither transport nor schema beyond these shapes.
//!
//! - [`RecordStore`] holds per-user [`UserRecord`]s: completed workouts
//!   (newest first), conversation history, and the current workout.
//! - [`WorkoutCache`] holds per-user [`HistoryEntry`] lists consumed by the
//!   progression merger and recommendation scorer.
//!
//! [`InMemoryRecordStore`] and [`InMemoryWorkoutCache`] are `DashMap`-backed
//! implementations for embedding and tests. Each user's key is independent:
//! concurrent sequences for different users never contend on shared state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::history::MAX_ENTRIES_PER_USER;
use crate::errors::{EngineError, EngineResult};
use crate::history::{is_duplicate_entry, HistoryEntry};
use crate::models::{ChatMessage, Workout};

// ============================================================================
// User Records
// ============================================================================

/// Per-user state held by the record store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Completed workouts, newest first
    #[serde(default)]
    pub workouts: Vec<Workout>,
    /// Coaching conversation, oldest first
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    /// The workout currently in progress, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_workout: Option<Workout>,
}

/// Partial update applied to a user record
///
/// Absent fields are left untouched. `current_workout` is doubly optional so
/// callers can distinguish "leave as is" (`None`) from "clear it"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// Replace the completed-workout list
    pub workouts: Option<Vec<Workout>>,
    /// Replace the conversation history
    pub conversation_history: Option<Vec<ChatMessage>>,
    /// Set or clear the current workout
    pub current_workout: Option<Option<Workout>>,
}

impl UserUpdate {
    fn apply(self, record: &mut UserRecord) {
        if let Some(workouts) = self.workouts {
            record.workouts = workouts;
        }
        if let Some(conversation) = self.conversation_history {
            record.conversation_history = conversation;
        }
        if let Some(current) = self.current_workout {
            record.current_workout = current;
        }
    }
}

/// Store of per-user records
///
/// Implementations upsert on update: an update against an unknown user
/// creates the record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a user's record, or `None` for an unknown user
    async fn get_user(&self, user_id: &str) -> EngineResult<Option<UserRecord>>;

    /// Apply a partial update and return the resulting record
    async fn update_user(&self, user_id: &str, update: UserUpdate) -> EngineResult<UserRecord>;
}

/// Keyed in-memory record store
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<String, UserRecord>,
}

impl InMemoryRecordStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_user(&self, user_id: &str) -> EngineResult<Option<UserRecord>> {
        Ok(self.records.get(user_id).map(|record| record.clone()))
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> EngineResult<UserRecord> {
        let mut record = self.records.entry(user_id.to_owned()).or_default();
        update.apply(&mut record);
        Ok(record.clone())
    }
}

// ============================================================================
// Workout Cache
// ============================================================================

/// Store of per-user cached history entries
#[async_trait]
pub trait WorkoutCache: Send + Sync {
    /// The user's cached entries, newest first
    async fn entries(&self, user_id: &str) -> EngineResult<Vec<HistoryEntry>>;

    /// Replace the user's cached entries wholesale
    ///
    /// Used after a progression merge mutates entries in place.
    async fn replace(&self, user_id: &str, entries: Vec<HistoryEntry>) -> EngineResult<()>;

    /// Cache a workout as a new entry at the front of the user's list
    ///
    /// Returns `false` when the workout was skipped as a duplicate of an
    /// existing entry. The list is trimmed to the retention cap after
    /// insertion, dropping the oldest entries.
    async fn cache_workout(
        &self,
        user_id: &str,
        workout: Workout,
        now: DateTime<Utc>,
    ) -> EngineResult<bool>;
}

/// Keyed in-memory workout cache honoring the retention cap and dedup rule
#[derive(Debug, Default)]
pub struct InMemoryWorkoutCache {
    entries: DashMap<String, Vec<HistoryEntry>>,
}

impl InMemoryWorkoutCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkoutCache for InMemoryWorkoutCache {
    async fn entries(&self, user_id: &str) -> EngineResult<Vec<HistoryEntry>> {
        Ok(self
            .entries
            .get(user_id)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn replace(&self, user_id: &str, entries: Vec<HistoryEntry>) -> EngineResult<()> {
        if entries.len() > MAX_ENTRIES_PER_USER {
            return Err(EngineError::storage(format!(
                "refusing to store {} entries for one user (cap {MAX_ENTRIES_PER_USER})",
                entries.len()
            )));
        }
        self.entries.insert(user_id.to_owned(), entries);
        Ok(())
    }

    async fn cache_workout(
        &self,
        user_id: &str,
        workout: Workout,
        now: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let mut entries = self.entries.entry(user_id.to_owned()).or_default();

        if is_duplicate_entry(&entries, &workout) {
            debug!(user_id, workout_id = %workout.id, "duplicate workout not cached");
            return Ok(false);
        }

        entries.insert(0, HistoryEntry::from_workout(workout, now));
        entries.truncate(MAX_ENTRIES_PER_USER);
        debug!(user_id, cached = entries.len(), "workout cached");
        Ok(true)
    }
}
