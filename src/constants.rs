// ABOUTME: Named threshold constants for generation, intensity, and scoring
// ABOUTME: Single home for tuning values so behavior is auditable in one place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Engine Constants
//!
//! Tuning values grouped by concern. These are behavioral constants, not
//! configuration: changing one changes documented engine semantics.

/// Generation protocol limits
pub mod generation {
    /// Maximum completion attempts before surfacing the last error
    pub const MAX_GENERATION_ATTEMPTS: usize = 3;

    /// Conversation turns carried into the generation request (3 exchanges)
    pub const RECENT_CONVERSATION_TURNS: usize = 6;

    /// Low temperature for the quality-review round-trip, for consistent
    /// verdicts
    pub const QUALITY_REVIEW_TEMPERATURE: f32 = 0.2;
}

/// Intensity classification thresholds over derived workout metadata
pub mod intensity {
    /// Set count above which a workout is classified high intensity
    pub const HIGH_SETS_THRESHOLD: u32 = 25;

    /// Volume (total weight x reps) above which a workout is high intensity
    pub const HIGH_VOLUME_THRESHOLD: f64 = 5000.0;

    /// Set count below which a workout is classified low intensity
    pub const LOW_SETS_THRESHOLD: u32 = 15;

    /// Volume below which a workout is classified low intensity
    pub const LOW_VOLUME_THRESHOLD: f64 = 2000.0;
}

/// History bookkeeping limits
pub mod history {
    /// Cached workouts retained per user, newest first
    pub const MAX_ENTRIES_PER_USER: usize = 100;

    /// Estimated minutes per set, including rest
    pub const MINUTES_PER_SET: f64 = 1.5;

    /// History entries scanned for the recent muscle-group summary
    pub const RECENT_STATS_ENTRIES: usize = 7;
}

/// Recommendation scoring factors
pub mod scoring {
    /// Days a muscle group counts as recently worked
    pub const RECENT_MUSCLE_WINDOW_DAYS: i64 = 3;

    /// Completed workouts examined when classifying recent effort
    pub const RECENT_COMPLETED_WINDOW: usize = 5;

    /// Day-of-week factor for an exact match
    pub const DAY_EXACT_SCORE: f64 = 1.0;

    /// Day-of-week factor when the circular distance is at most one day
    pub const DAY_ADJACENT_SCORE: f64 = 0.7;

    /// Day-of-week factor otherwise
    pub const DAY_DISTANT_SCORE: f64 = 0.3;

    /// Variety penalty once an entry has been used more than 5 times,
    /// applied again past 10 uses
    pub const VARIETY_OVERUSE_PENALTY: f64 = 0.3;

    /// Variety boost when an entry has rested for more than 14 days
    pub const VARIETY_RESTED_BOOST: f64 = 0.3;

    /// Additional variety boost past 30 days of rest
    pub const VARIETY_LONG_RESTED_BOOST: f64 = 0.2;

    /// Days-since-use stand-in for entries that were never used
    pub const NEVER_USED_DAYS: i64 = 999;

    /// Effectiveness boost for entries marked completed
    pub const EFFECTIVENESS_COMPLETED_BOOST: f64 = 0.2;

    /// Per-star effectiveness adjustment around the 3-star midpoint
    pub const EFFECTIVENESS_RATING_STEP: f64 = 0.15;

    /// Effectiveness boost for proven entries (used more than 2, fewer
    /// than 8 times)
    pub const EFFECTIVENESS_PROVEN_BOOST: f64 = 0.1;
}
