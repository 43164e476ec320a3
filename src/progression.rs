// ABOUTME: Progressive-overload merger that ratchets cached set targets upward
// ABOUTME: Targets never decrease; a heavier performed set becomes the new reference point
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Progression Merger
//!
//! After a user performs a cached workout, [`merge_performance`] folds the
//! performed sets back into the cached copy so the next prescription starts
//! from the user's best demonstrated output.
//!
//! Ratchet rules, evaluated independently per set index:
//!
//! - performed weight above the cached target adopts the performed weight
//!   AND reps: a heavier set is the new reference point regardless of its
//!   rep count
//! - equal weight with more reps adopts the reps only
//! - anything else leaves the cached target untouched
//!
//! Targets are monotonically non-decreasing across any number of merges.
//! Uncompleted performed sets are ignored entirely.

use tracing::{debug, info};

use crate::history::HistoryEntry;
use crate::models::Exercise;

/// Default perceived-exertion ceiling assumed when a cached set has no RPE
const DEFAULT_RPE: f64 = 10.0;

/// Merge a performed workout's exercises into a cached history entry
///
/// Exercises are paired by position first; when the positional counterpart
/// does not carry an equivalent name (case-insensitive, trimmed), pairing
/// falls back to a name search so reordered workouts still merge. Unmatched
/// cached exercises are left untouched.
///
/// When any set changed, the entry's metadata is recomputed in full from the
/// merged sets and the update counter is incremented. Returns whether any
/// change occurred, so callers can decide whether to persist.
pub fn merge_performance(
    entry: &mut HistoryEntry,
    performed: &[Exercise],
    now: chrono::DateTime<chrono::Utc>,
) -> bool {
    let mut changed = false;

    for (index, cached) in entry.workout.exercises.iter_mut().enumerate() {
        let matched = match_performed(cached, performed, index);
        let Some(performed_exercise) = matched else {
            continue;
        };

        for (set_index, cached_set) in cached.sets.iter_mut().enumerate() {
            let Some(performed_set) = performed_exercise.sets.get(set_index) else {
                continue;
            };
            if !performed_set.completed {
                continue;
            }

            let new_weight = performed_set.target_weight;
            let new_reps = performed_set.target_reps;

            if new_weight > cached_set.target_weight {
                debug!(
                    exercise = %cached.name,
                    set = set_index + 1,
                    old_weight = cached_set.target_weight,
                    new_weight,
                    "weight ratchet"
                );
                cached_set.target_weight = new_weight;
                cached_set.target_reps = new_reps;
                changed = true;
            } else if (new_weight - cached_set.target_weight).abs() < f64::EPSILON
                && new_reps > cached_set.target_reps
            {
                debug!(
                    exercise = %cached.name,
                    set = set_index + 1,
                    old_reps = cached_set.target_reps,
                    new_reps,
                    "rep ratchet"
                );
                cached_set.target_reps = new_reps;
                changed = true;
            }

            // RPE adoption: a lower perceived effort for the same or better
            // output replaces the cached value. The rule is inherited as-is
            // and its link to progression is unverified; do not reinterpret.
            if let Some(rpe) = performed_set.rpe {
                if rpe < cached_set.rpe.unwrap_or(DEFAULT_RPE) {
                    cached_set.rpe = Some(rpe);
                    changed = true;
                }
            }
            // RIR carries over unconditionally when recorded
            if let Some(rir) = performed_set.rir {
                if cached_set.rir != Some(rir) {
                    cached_set.rir = Some(rir);
                    changed = true;
                }
            }
        }
    }

    if changed {
        entry.refresh_metadata();
        entry.progress_updates.last_updated = Some(now);
        entry.progress_updates.update_count += 1;
        info!(
            entry_id = %entry.id,
            update_count = entry.progress_updates.update_count,
            total_volume = entry.metadata.total_volume,
            "cached workout ratcheted"
        );
    }

    changed
}

/// Find the performed exercise matching a cached one
///
/// Position wins when the names agree; otherwise the performed list is
/// searched for an equivalent name.
fn match_performed<'a>(
    cached: &Exercise,
    performed: &'a [Exercise],
    index: usize,
) -> Option<&'a Exercise> {
    if let Some(positional) = performed.get(index) {
        if positional.same_movement(cached) {
            return Some(positional);
        }
    }
    performed.iter().find(|p| p.same_movement(cached))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseSet, Workout, WorkoutSource, WorkoutType};
    use chrono::Utc;
    use uuid::Uuid;

    fn cached_entry(exercises: Vec<Exercise>) -> HistoryEntry {
        let workout = Workout {
            id: Uuid::new_v4(),
            date: Utc::now().date_naive(),
            workout_type: WorkoutType::Strength,
            exercises,
            cardio: None,
            summary: String::new(),
            focus: None,
            source: WorkoutSource::Generated,
            raw_response: None,
            generated_at: Utc::now(),
        };
        HistoryEntry::from_workout(workout, Utc::now())
    }

    fn performed_set(weight: f64, reps: u32) -> ExerciseSet {
        ExerciseSet::new(weight, reps).mark_completed()
    }

    #[test]
    fn more_reps_at_same_weight_ratchets_reps() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Bench Press",
            vec![ExerciseSet::new(135.0, 8)],
        )]);
        let performed = vec![Exercise::new("Bench Press", vec![performed_set(135.0, 10)])];

        assert!(merge_performance(&mut entry, &performed, Utc::now()));
        let set = &entry.workout.exercises[0].sets[0];
        assert!((set.target_weight - 135.0).abs() < f64::EPSILON);
        assert_eq!(set.target_reps, 10);
    }

    #[test]
    fn heavier_set_wins_even_with_fewer_reps() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Bench Press",
            vec![ExerciseSet::new(135.0, 8)],
        )]);
        let performed = vec![Exercise::new("Bench Press", vec![performed_set(140.0, 5)])];

        assert!(merge_performance(&mut entry, &performed, Utc::now()));
        let set = &entry.workout.exercises[0].sets[0];
        assert!((set.target_weight - 140.0).abs() < f64::EPSILON);
        assert_eq!(set.target_reps, 5);
    }

    #[test]
    fn weaker_performance_is_discarded() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(185.0, 5)],
        )]);
        let performed = vec![Exercise::new("Squat", vec![performed_set(155.0, 12)])];

        assert!(!merge_performance(&mut entry, &performed, Utc::now()));
        let set = &entry.workout.exercises[0].sets[0];
        assert!((set.target_weight - 185.0).abs() < f64::EPSILON);
        assert_eq!(set.target_reps, 5);
        assert_eq!(entry.progress_updates.update_count, 0);
    }

    #[test]
    fn uncompleted_sets_are_ignored() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(185.0, 5)],
        )]);
        let performed = vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(225.0, 5)], // not completed
        )];

        assert!(!merge_performance(&mut entry, &performed, Utc::now()));
        assert!((entry.workout.exercises[0].sets[0].target_weight - 185.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reordered_exercises_match_by_name() {
        let mut entry = cached_entry(vec![
            Exercise::new("Squat", vec![ExerciseSet::new(185.0, 5)]),
            Exercise::new("Bench Press", vec![ExerciseSet::new(135.0, 8)]),
        ]);
        let performed = vec![
            Exercise::new("bench press ", vec![performed_set(145.0, 8)]),
            Exercise::new("SQUAT", vec![performed_set(195.0, 5)]),
        ];

        assert!(merge_performance(&mut entry, &performed, Utc::now()));
        assert!((entry.workout.exercises[0].sets[0].target_weight - 195.0).abs() < f64::EPSILON);
        assert!((entry.workout.exercises[1].sets[0].target_weight - 145.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unmatched_cached_exercise_is_untouched() {
        let mut entry = cached_entry(vec![
            Exercise::new("Squat", vec![ExerciseSet::new(185.0, 5)]),
            Exercise::new("Deadlift", vec![ExerciseSet::new(225.0, 3)]),
        ]);
        let performed = vec![Exercise::new("Squat", vec![performed_set(205.0, 5)])];

        assert!(merge_performance(&mut entry, &performed, Utc::now()));
        assert!((entry.workout.exercises[1].sets[0].target_weight - 225.0).abs() < f64::EPSILON);
    }

    #[test]
    fn targets_are_monotonic_across_merges() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(135.0, 8)],
        )]);
        let sessions: &[(f64, u32)] = &[(140.0, 5), (135.0, 12), (140.0, 8), (120.0, 20)];

        let mut best_weight = 135.0_f64;
        let mut best_reps = 8_u32;
        for (weight, reps) in sessions {
            let performed = vec![Exercise::new("Squat", vec![performed_set(*weight, *reps)])];
            merge_performance(&mut entry, &performed, Utc::now());
            let set = &entry.workout.exercises[0].sets[0];
            assert!(set.target_weight >= best_weight);
            if (set.target_weight - best_weight).abs() < f64::EPSILON {
                assert!(set.target_reps >= best_reps);
            }
            best_weight = set.target_weight;
            best_reps = set.target_reps;
        }
        // Final state: 140 lbs took over, then 8 reps ratcheted at 140
        let set = &entry.workout.exercises[0].sets[0];
        assert!((set.target_weight - 140.0).abs() < f64::EPSILON);
        assert_eq!(set.target_reps, 8);
    }

    #[test]
    fn lower_rpe_is_adopted_higher_is_not() {
        // Inherited rule, implemented literally: lower perceived effort
        // replaces the cached value even without a weight/rep ratchet.
        let mut entry = cached_entry(vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(185.0, 5)],
        )]);
        entry.workout.exercises[0].sets[0].rpe = Some(8.0);

        let mut easier = performed_set(185.0, 5);
        easier.rpe = Some(7.0);
        let performed = vec![Exercise::new("Squat", vec![easier])];
        assert!(merge_performance(&mut entry, &performed, Utc::now()));
        assert_eq!(entry.workout.exercises[0].sets[0].rpe, Some(7.0));

        let mut harder = performed_set(185.0, 5);
        harder.rpe = Some(9.5);
        let performed = vec![Exercise::new("Squat", vec![harder])];
        assert!(!merge_performance(&mut entry, &performed, Utc::now()));
        assert_eq!(entry.workout.exercises[0].sets[0].rpe, Some(7.0));
    }

    #[test]
    fn rir_carries_over_unconditionally() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(185.0, 5)],
        )]);
        entry.workout.exercises[0].sets[0].rir = Some(1.0);

        let mut performed_one = performed_set(185.0, 5);
        performed_one.rir = Some(3.0);
        let performed = vec![Exercise::new("Squat", vec![performed_one])];

        assert!(merge_performance(&mut entry, &performed, Utc::now()));
        assert_eq!(entry.workout.exercises[0].sets[0].rir, Some(3.0));
    }

    #[test]
    fn metadata_recomputed_after_ratchet() {
        let mut entry = cached_entry(vec![Exercise::new(
            "Squat",
            vec![ExerciseSet::new(100.0, 10), ExerciseSet::new(100.0, 10)],
        )]);
        let before = entry.metadata.total_volume;

        let performed = vec![Exercise::new(
            "Squat",
            vec![performed_set(110.0, 10), performed_set(110.0, 10)],
        )];
        assert!(merge_performance(&mut entry, &performed, Utc::now()));

        assert!((before - 2000.0).abs() < f64::EPSILON);
        assert!((entry.metadata.total_volume - 2200.0).abs() < f64::EPSILON);
        assert_eq!(entry.progress_updates.update_count, 1);
        assert!(entry.progress_updates.last_updated.is_some());
    }
}
