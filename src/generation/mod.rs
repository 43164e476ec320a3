// ABOUTME: Bounded retry protocol that turns completions into validated workouts
// ABOUTME: Orchestrates parse, structural, and quality gates with corrective feedback loops
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach Engine Contributors

//! # Generation Protocol
//!
//! [`GenerationProtocol`] negotiates with the unreliable completion peer
//! through a bounded retry state machine:
//!
//! ```text
//! Drafting -> AwaitingCompletion -> Parsing -> StructuralCheck
//!     -> QualityCheck -> Accepted | Failed
//! ```
//!
//! Each attempt runs the full gate chain in order; a structural failure
//! never reaches the quality gate. On failure before the last attempt, the
//! rejected completion is appended as an assistant turn and a corrective
//! instruction naming the exact defect as a user turn, then the next attempt
//! runs over the grown conversation. After
//! [`MAX_GENERATION_ATTEMPTS`](crate::constants::generation::MAX_GENERATION_ATTEMPTS)
//! failures the last concrete error surfaces; no partial workout is ever
//! returned.
//!
//! Retries are strictly sequential: at most one completion request is
//! outstanding at any time.

pub mod parser;
pub mod validation;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::generation::{MAX_GENERATION_ATTEMPTS, RECENT_CONVERSATION_TURNS};
use crate::errors::{EngineError, EngineResult};
use crate::llm::{prompts, CompletionClient, CompletionRequest, TaskType};
use crate::models::{
    ChatMessage, Exercise, GenerationRequest, Workout, WorkoutSource,
};
use parser::WorkoutCandidate;

// ============================================================================
// Protocol State
// ============================================================================

/// Phase of one generation attempt, logged for auditability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// Building the message sequence
    Drafting,
    /// Completion request in flight
    AwaitingCompletion,
    /// Cleaning and deserializing the completion
    Parsing,
    /// Pure structural checks
    StructuralCheck,
    /// Second-opinion quality round-trip
    QualityCheck,
    /// Workout assembled and returned
    Accepted,
    /// Attempt failed; feedback appended if attempts remain
    Failed,
}

/// Client profile context for a generation request
///
/// A progress summary replaces the raw intake once one exists, keeping the
/// conversation short while preserving programming-relevant history.
#[derive(Debug, Clone, Copy)]
pub enum ProfileContext<'a> {
    /// Condensed coach-written summary of the client's progress
    ProgressSummary(&'a str),
    /// Raw intake information from a new client
    InitialIntake(&'a str),
}

// ============================================================================
// Protocol
// ============================================================================

/// Orchestrates workout generation against a completion client
#[derive(Debug)]
pub struct GenerationProtocol<C> {
    client: C,
    max_attempts: usize,
}

impl<C: CompletionClient> GenerationProtocol<C> {
    /// Create a protocol with the default attempt budget
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self {
            client,
            max_attempts: MAX_GENERATION_ATTEMPTS,
        }
    }

    /// Borrow the underlying completion client
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Generate a validated workout for the given request
    ///
    /// Builds the message sequence from the profile context, the recent
    /// conversation turns, and the structured request, then negotiates with
    /// the completion service through up to three validated attempts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ExhaustedRetries`] carrying the last attempt's
    /// concrete error when every attempt fails.
    pub async fn generate(
        &self,
        profile: ProfileContext<'_>,
        recent_conversation: &[ChatMessage],
        request: &GenerationRequest,
    ) -> EngineResult<Workout> {
        debug!(phase = ?AttemptPhase::Drafting, "building generation conversation");
        let mut messages = build_generation_messages(profile, recent_conversation, request);
        let mut last_error: Option<EngineError> = None;

        for attempt in 1..=self.max_attempts {
            debug!(attempt, messages = messages.len(), "starting generation attempt");
            match self.run_attempt(&messages, request).await {
                Ok(workout) => {
                    debug!(phase = ?AttemptPhase::Accepted, attempt, "workout accepted");
                    info!(
                        workout_id = %workout.id,
                        workout_type = workout.workout_type.as_str(),
                        exercises = workout.exercises.len(),
                        attempt,
                        "generated workout"
                    );
                    return Ok(workout);
                }
                Err(AttemptFailure { rejected, error }) => {
                    debug!(phase = ?AttemptPhase::Failed, attempt, "attempt failed");
                    warn!(attempt, error = %error, "generation attempt rejected");
                    if attempt < self.max_attempts {
                        // Feedback loop: show the peer its own rejected output,
                        // then tell it exactly what was wrong.
                        if let Some(raw) = rejected {
                            messages.push(ChatMessage::assistant(raw));
                        }
                        messages.push(ChatMessage::user(error.corrective_feedback()));
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(EngineError::ExhaustedRetries {
            attempts: self.max_attempts,
            last_error: Box::new(
                last_error.unwrap_or_else(|| EngineError::transport("no attempt was made")),
            ),
        })
    }

    /// Run one attempt through the full gate chain
    async fn run_attempt(
        &self,
        messages: &[ChatMessage],
        request: &GenerationRequest,
    ) -> Result<Workout, AttemptFailure> {
        debug!(phase = ?AttemptPhase::AwaitingCompletion, "requesting completion");
        let completion_request = CompletionRequest::new(messages.to_vec())
            .with_task(TaskType::WorkoutGeneration);
        let completion = self
            .client
            .complete(&completion_request)
            .await
            .map_err(AttemptFailure::before_response)?;
        let raw = completion.content;

        debug!(phase = ?AttemptPhase::Parsing, bytes = raw.len(), "parsing completion");
        let candidate =
            parser::parse_workout(&raw).map_err(|e| AttemptFailure::rejected(&raw, e))?;

        debug!(phase = ?AttemptPhase::StructuralCheck, "checking structure");
        validation::validate_structure(&candidate, request.workout_type)
            .map_err(|e| AttemptFailure::rejected(&raw, e))?;

        debug!(phase = ?AttemptPhase::QualityCheck, "requesting quality review");
        let verdict = validation::review_quality(&self.client, &raw, request.workout_type)
            .await
            .map_err(|e| AttemptFailure::rejected(&raw, e))?;

        if verdict.is_rejection() {
            return Err(AttemptFailure::rejected(
                &raw,
                EngineError::QualityRejected {
                    issues: verdict.issues,
                },
            ));
        }
        if !verdict.issues.is_empty() {
            // Minor severity: accepted with warnings, never a retry
            warn!(issues = ?verdict.issues, "workout accepted with quality warnings");
        }

        Ok(assemble_workout(candidate, raw, request))
    }

    // ========================================================================
    // Coaching Prose (no retry protocol; free text, not structured output)
    // ========================================================================

    /// Generate a concise client progress summary from history
    ///
    /// # Errors
    ///
    /// Returns the transport error when the completion call fails.
    pub async fn progress_summary(
        &self,
        client_name: &str,
        initial_prompt: &str,
        completed_workouts: usize,
        client_since: chrono::NaiveDate,
        conversation: &[ChatMessage],
    ) -> EngineResult<String> {
        let conversation_json = serde_json::to_string_pretty(conversation)?;
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::progress_summary_prompt()),
            ChatMessage::user(format!(
                "Client: {client_name}\n\n\
                Initial Information:\n{initial_prompt}\n\n\
                Completed {completed_workouts} workouts since {client_since}.\n\n\
                Recent conversation history:\n{conversation_json}\n\n\
                Create a comprehensive progress summary."
            )),
        ])
        .with_task(TaskType::Coaching);

        let completion = self.client.complete(&request).await?;
        info!(client = client_name, "generated progress summary");
        Ok(completion.content)
    }

    /// Generate brief coach feedback on a completed workout
    ///
    /// Only completed sets are reported. A transport failure degrades to a
    /// canned encouragement rather than an error: feedback is nice to have,
    /// never worth failing the completion flow for.
    pub async fn workout_feedback(
        &self,
        client_info: &str,
        recent_conversation: &[ChatMessage],
        completed: &Workout,
    ) -> String {
        let performed = completed_workout_report(completed);

        let mut messages = vec![
            ChatMessage::system(prompts::workout_feedback_prompt()),
            ChatMessage::user(format!("Client info: {client_info}")),
        ];
        messages.extend(
            recent_turns(recent_conversation, RECENT_CONVERSATION_TURNS)
                .iter()
                .cloned(),
        );
        messages.push(ChatMessage::user(format!(
            "I just completed this workout:\n{performed}\n\n\
            Give me brief feedback and note anything important for future workouts."
        )));

        let request = CompletionRequest::new(messages).with_task(TaskType::Coaching);
        match self.client.complete(&request).await {
            Ok(completion) => completion.content,
            Err(err) => {
                warn!(error = %err, "feedback call failed, using fallback");
                "Great work completing your workout! Keep up the consistency.".to_owned()
            }
        }
    }
}

/// One failed attempt: the rejected completion (when one was received) plus
/// the concrete error to feed back
struct AttemptFailure {
    rejected: Option<String>,
    error: EngineError,
}

impl AttemptFailure {
    /// Failure before any completion text was received (transport)
    const fn before_response(error: EngineError) -> Self {
        Self {
            rejected: None,
            error,
        }
    }

    /// Failure that rejected a received completion
    fn rejected(raw: &str, error: EngineError) -> Self {
        Self {
            rejected: Some(raw.to_owned()),
            error,
        }
    }
}

// ============================================================================
// Message Assembly
// ============================================================================

/// Last `limit` turns of a conversation
fn recent_turns(conversation: &[ChatMessage], limit: usize) -> &[ChatMessage] {
    let start = conversation.len().saturating_sub(limit);
    &conversation[start..]
}

/// Build the ordered message sequence for a generation request
fn build_generation_messages(
    profile: ProfileContext<'_>,
    recent_conversation: &[ChatMessage],
    request: &GenerationRequest,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(prompts::workout_system_prompt())];

    match profile {
        ProfileContext::ProgressSummary(summary) => {
            messages.push(ChatMessage::user(format!(
                "I'm your client. Here's my progress summary:\n\n{summary}"
            )));
            messages.push(ChatMessage::assistant(
                "Got it! I have your full progress history. Let's continue building on your gains.",
            ));
        }
        ProfileContext::InitialIntake(intake) => {
            messages.push(ChatMessage::user(format!(
                "I'm your new client. Here's my information:\n\n{intake}"
            )));
            messages.push(ChatMessage::assistant(
                "Perfect! I understand your background and goals. I'll create personalized \
                workouts that progress with you over time.",
            ));
        }
    }

    messages.extend(
        recent_turns(recent_conversation, RECENT_CONVERSATION_TURNS)
            .iter()
            .cloned(),
    );

    let mut current = format!(
        "Generate today's {} workout.",
        request.workout_type.as_str()
    );
    if request.focus.is_some() || request.equipment.is_some() || request.notes.is_some() {
        current.push_str("\n\nToday's preferences:");
        if let Some(focus) = &request.focus {
            current.push_str(&format!("\n- Focus: {focus}"));
        }
        if let Some(equipment) = &request.equipment {
            current.push_str(&format!("\n- Equipment: {equipment}"));
        }
        if let Some(notes) = &request.notes {
            current.push_str(&format!("\n- Notes: {notes}"));
        }
    }
    messages.push(ChatMessage::user(current));

    messages
}

/// Report of a performed workout, completed sets only
fn completed_workout_report(workout: &Workout) -> String {
    let exercises: Vec<serde_json::Value> = workout
        .exercises
        .iter()
        .map(|exercise| {
            let completed_sets: Vec<serde_json::Value> = exercise
                .sets
                .iter()
                .filter(|set| set.completed)
                .map(|set| json!({"weight": set.target_weight, "reps": set.target_reps}))
                .collect();
            json!({
                "name": exercise.name,
                "completedSets": completed_sets.len(),
                "totalSets": exercise.sets.len(),
                "sets": completed_sets,
            })
        })
        .collect();

    let report = json!({"date": workout.date, "exercises": exercises});
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_owned())
}

// ============================================================================
// Workout Assembly
// ============================================================================

/// Assemble the final workout record from an accepted candidate
fn assemble_workout(
    candidate: WorkoutCandidate,
    raw_response: String,
    request: &GenerationRequest,
) -> Workout {
    let now = Utc::now();
    Workout {
        id: Uuid::new_v4(),
        date: now.date_naive(),
        workout_type: candidate.workout_type.unwrap_or(request.workout_type),
        exercises: candidate
            .exercises
            .unwrap_or_default()
            .into_iter()
            .map(Exercise::from)
            .collect(),
        cardio: candidate.cardio,
        summary: candidate
            .summary
            .unwrap_or_else(|| "Workout generated".to_owned()),
        focus: request.focus.clone(),
        source: WorkoutSource::Generated,
        raw_response: Some(raw_response),
        generated_at: now,
    }
}
