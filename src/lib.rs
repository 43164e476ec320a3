// ABOUTME: Main library entry point for the adaptive workout coaching engine
// ABOUTME: Provides workout generation, progression merging, and recommendation scoring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

#![deny(unsafe_code)]

//! # Coach Engine
//!
//! An adaptive workout recommendation and progression engine built around an
//! external text-completion service. The engine turns unreliable free-text
//! completions into validated structured workouts, folds performed results
//! back into cached prescriptions, and ranks cached workouts against the
//! user's current training context.
//!
//! ## Features
//!
//! - **Bounded generation protocol**: up to three completion attempts, each
//!   gated by parsing, structural validation, and a second-opinion quality
//!   review, with corrective feedback between attempts
//! - **Progressive overload merging**: performed sets ratchet cached targets
//!   monotonically upward, never downward
//! - **Weighted recommendation scoring**: five explainable factors (recovery,
//!   day match, effort balance, variety, effectiveness) with caller-tunable
//!   weights
//! - **Collaborator contracts**: abstract record-store and workout-cache
//!   interfaces with in-memory implementations for embedding and tests
//!
//! ## Architecture
//!
//! The engine is a library embedded by a host; it defines no transport of
//! its own. The completion service sits behind the
//! [`CompletionClient`](llm::CompletionClient) capability trait, and all
//! engine logic outside that boundary is synchronous pure functions.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use coach_engine::scoring::{Preferences, RecommendationScorer, ScoringContext};
//!
//! let scorer = RecommendationScorer::new();
//! let context = ScoringContext::from_history(Utc::now(), &[]);
//!
//! // An empty pool yields no recommendation rather than an error
//! assert!(scorer.select(&[], &context, &Preferences::default()).is_none());
//! ```

/// Named threshold constants for generation, intensity, and scoring
pub mod constants;

/// Unified error handling with the generation failure taxonomy
pub mod errors;

/// Bounded retry protocol turning completions into validated workouts
pub mod generation;

/// Cached workout history with derived metadata and statistics
pub mod history;

/// Completion-service capability interface and system prompts
pub mod llm;

/// Core domain data model for workouts, exercises, and sets
pub mod models;

/// Progressive-overload merging of performed sets into cached targets
pub mod progression;

/// Weighted recommendation scoring over cached workout history
pub mod scoring;

/// Collaborator storage contracts and in-memory implementations
pub mod storage;

pub use errors::{EngineError, EngineResult};
pub use generation::GenerationProtocol;
pub use models::Workout;
