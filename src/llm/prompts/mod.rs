// ABOUTME: System prompts for completion-service interactions loaded at compile time
// ABOUTME: Provides workout generation, quality review, and progress summary prompts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy
//! maintenance. The workout prompt pins the JSON schema the parser expects;
//! changing one requires changing the other.

/// System prompt for structured workout generation
///
/// Instructs the coach persona and pins the exact JSON object shape the
/// response parser deserializes, including type-specific fields.
pub const WORKOUT_SYSTEM_PROMPT: &str = include_str!("workout_system.md");

/// Rubric prompt for the second-opinion quality review round-trip
///
/// Asks the service to judge realism and safety of a candidate workout and
/// answer with a `{valid, issues, severity}` verdict object.
pub const QUALITY_REVIEW_PROMPT: &str = include_str!("quality_review.md");

/// Prompt for generating a client progress summary from history
pub const PROGRESS_SUMMARY_PROMPT: &str = include_str!("progress_summary.md");

/// Prompt for brief post-workout coaching feedback
pub const WORKOUT_FEEDBACK_PROMPT: &str = "You are an expert personal fitness coach \
analyzing your client's workout performance. Provide brief, motivating feedback \
(2-3 sentences) and note any important observations for future planning.";

/// Get the workout generation system prompt
#[must_use]
pub const fn workout_system_prompt() -> &'static str {
    WORKOUT_SYSTEM_PROMPT
}

/// Get the quality review rubric prompt
#[must_use]
pub const fn quality_review_prompt() -> &'static str {
    QUALITY_REVIEW_PROMPT
}

/// Get the progress summary prompt
#[must_use]
pub const fn progress_summary_prompt() -> &'static str {
    PROGRESS_SUMMARY_PROMPT
}

/// Get the post-workout feedback prompt
#[must_use]
pub const fn workout_feedback_prompt() -> &'static str {
    WORKOUT_FEEDBACK_PROMPT
}
