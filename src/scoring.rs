// ABOUTME: Recommendation scorer ranking cached workouts against today's context
// ABOUTME: Five weighted factors: recovery, day match, effort balance, variety, effectiveness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Recommendation Scoring
//!
//! [`RecommendationScorer`] ranks a pool of [`HistoryEntry`] candidates
//! against today's [`ScoringContext`]. Each candidate receives five factor
//! scores in `[0, 1]`, combined by [`ScoreWeights`]:
//!
//! | factor | rewards |
//! |---|---|
//! | recovery | low overlap with muscles worked in the last 3 days |
//! | day match | workouts recorded on or near today's weekday |
//! | effort balance | intensity complementing the last completed session |
//! | variety | rested entries over overused ones |
//! | effectiveness | completed, well-rated, proven entries |
//!
//! Weights need not sum to 1 and are never renormalized: a caller raising
//! one weight raises that factor's absolute influence. Sorting is stable,
//! so equal totals keep their pool order.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::constants::scoring;
use crate::history::{HistoryEntry, Intensity};
use crate::models::WorkoutType;

// ============================================================================
// Context and Preferences
// ============================================================================

/// What the engine knows about the user's recent training state
#[derive(Debug, Clone)]
pub struct ScoringContext {
    /// Scoring instant, used for rest-day arithmetic
    pub now: DateTime<Utc>,
    /// Today's day of week (0 = Sunday)
    pub day_of_week: u32,
    /// Muscle groups worked within the recent window; `None` when no
    /// recent-muscle data exists
    pub recent_muscle_groups: Option<HashSet<String>>,
    /// Intensity of the user's most recent completed workout
    pub recent_effort: RecentEffort,
}

/// Recent completed-workout intensity, including the degenerate cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentEffort {
    /// No cached history at all
    NoHistory,
    /// History exists but nothing recent was completed
    NoneCompleted,
    /// Intensity bucket of the last completed workout, classified from the
    /// volume of its completed sets
    Completed(Intensity),
}

impl ScoringContext {
    /// Build a context from the user's cached history (newest first)
    #[must_use]
    pub fn from_history(now: DateTime<Utc>, entries: &[HistoryEntry]) -> Self {
        let today = now.date_naive();

        let recent_muscle_groups = if entries.is_empty() {
            None
        } else {
            let mut worked = HashSet::new();
            for entry in entries {
                let age = (today - entry.workout.date).num_days();
                if (0..=scoring::RECENT_MUSCLE_WINDOW_DAYS).contains(&age) {
                    worked.extend(entry.metadata.muscle_groups.iter().cloned());
                }
            }
            Some(worked)
        };

        let recent_effort = if entries.is_empty() {
            RecentEffort::NoHistory
        } else {
            entries
                .iter()
                .take(scoring::RECENT_COMPLETED_WINDOW)
                .find(|entry| entry.effectiveness.completed)
                .map_or(RecentEffort::NoneCompleted, |entry| {
                    // Classified from the volume the user actually performed,
                    // not the prescribed total
                    RecentEffort::Completed(Intensity::from_volume(
                        entry.workout.completed_volume(),
                    ))
                })
        };

        Self {
            now,
            day_of_week: now.date_naive().weekday().num_days_from_sunday(),
            recent_muscle_groups,
            recent_effort,
        }
    }
}

/// Caller filters applied to the pool before scoring
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    /// Only candidates of this workout type
    pub workout_type: Option<WorkoutType>,
    /// Keyword matched case-insensitively against the candidate's focus,
    /// exercise names, and muscle-group tags
    pub focus: Option<String>,
    /// Only candidates in this intensity bucket
    pub intensity: Option<Intensity>,
    /// Skip candidates estimated to run longer than this
    pub max_duration_minutes: Option<f64>,
}

impl Preferences {
    fn admits(&self, entry: &HistoryEntry) -> bool {
        if let Some(workout_type) = self.workout_type {
            if entry.workout.workout_type != workout_type {
                return false;
            }
        }
        if let Some(intensity) = self.intensity {
            if entry.metadata.intensity != intensity {
                return false;
            }
        }
        if let Some(max_minutes) = self.max_duration_minutes {
            if entry.metadata.estimated_duration_minutes > max_minutes {
                return false;
            }
        }
        if let Some(focus) = &self.focus {
            let keyword = focus.trim().to_lowercase();
            if !keyword.is_empty() && !matches_focus(entry, &keyword) {
                return false;
            }
        }
        true
    }
}

fn matches_focus(entry: &HistoryEntry, keyword: &str) -> bool {
    if let Some(focus) = &entry.workout.focus {
        if focus.to_lowercase().contains(keyword) {
            return true;
        }
    }
    if entry
        .workout
        .exercises
        .iter()
        .any(|exercise| exercise.name.to_lowercase().contains(keyword))
    {
        return true;
    }
    entry
        .metadata
        .muscle_groups
        .iter()
        .any(|group| group.contains(keyword))
}

// ============================================================================
// Weights and Breakdown
// ============================================================================

/// Per-factor weights combined into a candidate's total score
///
/// Weights are applied as given. They need not sum to 1 and are not
/// renormalized.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    /// Weight of the recovery factor
    pub recovery: f64,
    /// Weight of the day-of-week factor
    pub day_match: f64,
    /// Weight of the effort-balance factor
    pub effort_balance: f64,
    /// Weight of the variety factor
    pub variety: f64,
    /// Weight of the effectiveness factor
    pub effectiveness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            recovery: 0.25,
            day_match: 0.15,
            effort_balance: 0.20,
            variety: 0.20,
            effectiveness: 0.20,
        }
    }
}

/// Per-factor scores for one ranked candidate, kept for explainability
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Recovery factor in [0, 1]
    pub recovery: f64,
    /// Day-of-week factor in [0, 1]
    pub day_match: f64,
    /// Effort-balance factor in [0, 1]
    pub effort_balance: f64,
    /// Variety factor in [0, 1]
    pub variety: f64,
    /// Effectiveness factor in [0, 1]
    pub effectiveness: f64,
    /// Weighted sum of the five factors
    pub total: f64,
}

/// A scored candidate returned by [`RecommendationScorer::rank`]
#[derive(Debug, Clone)]
pub struct RankedEntry<'a> {
    /// The candidate history entry
    pub entry: &'a HistoryEntry,
    /// Its per-factor scores and weighted total
    pub breakdown: ScoreBreakdown,
}

// ============================================================================
// Scorer
// ============================================================================

/// Ranks cached workouts against today's training context
#[derive(Debug, Clone, Default)]
pub struct RecommendationScorer {
    weights: ScoreWeights,
}

impl RecommendationScorer {
    /// Scorer with the default factor weights
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer with caller-supplied weights, applied without renormalization
    #[must_use]
    pub const fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// The weights this scorer applies
    #[must_use]
    pub const fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Return the best-matching entry, or `None` when the filtered pool is
    /// empty
    #[must_use]
    pub fn select<'a>(
        &self,
        pool: &'a [HistoryEntry],
        context: &ScoringContext,
        preferences: &Preferences,
    ) -> Option<&'a HistoryEntry> {
        self.rank(pool, context, preferences, 1)
            .into_iter()
            .next()
            .map(|ranked| ranked.entry)
    }

    /// Return up to `limit` candidates, best first, with factor breakdowns
    ///
    /// The sort is stable: candidates with equal totals keep their pool
    /// order, so repeated calls over the same inputs return the same list.
    #[must_use]
    pub fn rank<'a>(
        &self,
        pool: &'a [HistoryEntry],
        context: &ScoringContext,
        preferences: &Preferences,
        limit: usize,
    ) -> Vec<RankedEntry<'a>> {
        let mut ranked: Vec<RankedEntry<'a>> = pool
            .iter()
            .filter(|entry| preferences.admits(entry))
            .map(|entry| RankedEntry {
                entry,
                breakdown: self.score(entry, context),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.breakdown
                .total
                .partial_cmp(&a.breakdown.total)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(limit);

        debug!(
            pool = pool.len(),
            ranked = ranked.len(),
            top = ranked.first().map(|r| r.breakdown.total),
            "ranked workout candidates"
        );
        ranked
    }

    /// Score one candidate against the context
    #[must_use]
    pub fn score(&self, entry: &HistoryEntry, context: &ScoringContext) -> ScoreBreakdown {
        let recovery = recovery_factor(entry, context);
        let day_match = day_match_factor(entry.metadata.day_of_week, context.day_of_week);
        let effort_balance = effort_balance_factor(entry.metadata.intensity, context.recent_effort);
        let variety = variety_factor(entry, context.now);
        let effectiveness = effectiveness_factor(entry);

        let total = self.weights.recovery * recovery
            + self.weights.day_match * day_match
            + self.weights.effort_balance * effort_balance
            + self.weights.variety * variety
            + self.weights.effectiveness * effectiveness;

        ScoreBreakdown {
            recovery,
            day_match,
            effort_balance,
            variety,
            effectiveness,
            total,
        }
    }
}

// ============================================================================
// Factors
// ============================================================================

/// Reward low overlap with muscles worked in the recent window
///
/// Neutral 0.5 when the candidate has no muscle groups or there is no
/// recently-worked-muscle data. An empty worked set counts as no data, so a
/// rest gap does not inflate every tagged candidate to a perfect score.
fn recovery_factor(entry: &HistoryEntry, context: &ScoringContext) -> f64 {
    let recent = match &context.recent_muscle_groups {
        Some(recent) if !recent.is_empty() => recent,
        _ => return 0.5,
    };
    let groups = &entry.metadata.muscle_groups;
    if groups.is_empty() {
        return 0.5;
    }
    let overlap = groups.iter().filter(|group| recent.contains(*group)).count();
    1.0 - overlap as f64 / groups.len() as f64
}

/// Score closeness of the candidate's weekday to today, circularly
fn day_match_factor(candidate_day: u32, today: u32) -> f64 {
    if candidate_day == today {
        return scoring::DAY_EXACT_SCORE;
    }
    let diff = candidate_day.abs_diff(today);
    let circular = diff.min(7 - diff);
    if circular <= 1 {
        scoring::DAY_ADJACENT_SCORE
    } else {
        scoring::DAY_DISTANT_SCORE
    }
}

/// Prefer candidates whose intensity complements the last completed session
///
/// After a high-volume session, low-intensity candidates score best and
/// high-intensity ones worst; the inversion is symmetric after a low-volume
/// session. A medium last session, or no completed session, is a flat 0.6;
/// no history at all is neutral 0.5.
fn effort_balance_factor(candidate: Intensity, recent: RecentEffort) -> f64 {
    match recent {
        RecentEffort::NoHistory => 0.5,
        RecentEffort::NoneCompleted | RecentEffort::Completed(Intensity::Medium) => 0.6,
        RecentEffort::Completed(Intensity::High) => match candidate {
            Intensity::Low => 1.0,
            Intensity::Medium => 0.8,
            Intensity::High => 0.3,
        },
        RecentEffort::Completed(Intensity::Low) => match candidate {
            Intensity::Low => 0.3,
            Intensity::Medium => 0.8,
            Intensity::High => 1.0,
        },
    }
}

/// Penalize overused entries, reward well-rested ones, clamped to [0, 1]
fn variety_factor(entry: &HistoryEntry, now: DateTime<Utc>) -> f64 {
    let times_used = entry.effectiveness.times_used;
    let days_since_use = entry
        .effectiveness
        .last_used_at
        .map_or(scoring::NEVER_USED_DAYS, |used| (now - used).num_days());

    let mut factor = 1.0;
    if times_used > 5 {
        factor -= scoring::VARIETY_OVERUSE_PENALTY;
    }
    if times_used > 10 {
        factor -= scoring::VARIETY_OVERUSE_PENALTY;
    }
    if days_since_use > 14 {
        factor += scoring::VARIETY_RESTED_BOOST;
    }
    if days_since_use > 30 {
        factor += scoring::VARIETY_LONG_RESTED_BOOST;
    }
    factor.clamp(0.0, 1.0)
}

/// Reward completed, well-rated, proven entries from a 0.5 baseline
fn effectiveness_factor(entry: &HistoryEntry) -> f64 {
    let mut factor = 0.5;
    if entry.effectiveness.completed {
        factor += scoring::EFFECTIVENESS_COMPLETED_BOOST;
    }
    if let Some(rating) = entry.effectiveness.user_rating {
        factor += (f64::from(rating) - 3.0) * scoring::EFFECTIVENESS_RATING_STEP;
    }
    let times_used = entry.effectiveness.times_used;
    if times_used > 2 && times_used < 8 {
        factor += scoring::EFFECTIVENESS_PROVEN_BOOST;
    }
    factor.clamp(0.0, 1.0)
}
