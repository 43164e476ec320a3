// ABOUTME: Completion-service capability interface for pluggable text generation
// ABOUTME: Defines the async contract the engine holds against its untrusted text peer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Completion Service Interface
//!
//! The engine treats the text-generation service as an untyped, unreliable
//! text channel behind the [`CompletionClient`] capability trait. A request
//! is an ordered list of role-tagged messages plus an optional task-type
//! hint used only for model routing; a response is one text completion.
//!
//! The engine never assumes clean structured output from this channel; see
//! [`crate::generation::parser`] for the tolerance rules.
//!
//! ## Example
//!
//! ```rust,no_run
//! use coach_engine::llm::{CompletionClient, CompletionRequest};
//! use coach_engine::models::ChatMessage;
//!
//! async fn example(client: &dyn CompletionClient) {
//!     let request = CompletionRequest::new(vec![
//!         ChatMessage::system("You are an expert personal fitness coach."),
//!         ChatMessage::user("Generate today's workout."),
//!     ]);
//!     let completion = client.complete(&request).await;
//! }
//! ```

pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;
use crate::models::ChatMessage;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Hint for the kind of work a completion request carries
///
/// Used only for model routing by clients that serve multiple models; the
/// engine attaches it and otherwise ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Structured workout generation
    WorkoutGeneration,
    /// Second-opinion quality review of a generated workout
    QualityReview,
    /// Free-text coaching prose (summaries, feedback)
    Coaching,
}

/// Configuration for one completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Ordered conversation messages
    pub messages: Vec<ChatMessage>,
    /// Model identifier (client-specific), if the caller wants to pin one
    pub model: Option<String>,
    /// Temperature for response randomness
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Task-type routing hint
    pub task: Option<TaskType>,
}

impl CompletionRequest {
    /// Create a new completion request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            task: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the task-type routing hint
    #[must_use]
    pub const fn with_task(mut self, task: TaskType) -> Self {
        self.task = Some(task);
        self
    }
}

/// One text completion returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text
    pub content: String,
    /// Model that produced the completion, if reported
    pub model: Option<String>,
    /// Token usage statistics, if reported
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// Wrap plain text as a completion with no metadata
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            usage: None,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Client Trait
// ============================================================================

/// Capability interface to the external text-generation service
///
/// Implementations own transport, authentication, and caller-level timeouts;
/// the engine issues at most one outstanding request at a time and treats
/// any failure as a transport-level attempt failure.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send an ordered message sequence and return one text completion
    async fn complete(&self, request: &CompletionRequest) -> EngineResult<Completion>;
}

#[async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    async fn complete(&self, request: &CompletionRequest) -> EngineResult<Completion> {
        (**self).complete(request).await
    }
}
