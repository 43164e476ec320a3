// ABOUTME: Integration tests for the bounded generation retry protocol
// ABOUTME: Exercises every gate branch with a scripted completion client

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use coach_engine::errors::EngineError;
use coach_engine::generation::{GenerationProtocol, ProfileContext};
use coach_engine::llm::TaskType;
use coach_engine::models::{GenerationRequest, MessageRole, WorkoutType};

use common::{
    Scripted, ScriptedClient, CRITICAL_VERDICT, DUPLICATE_WORKOUT, MINOR_VERDICT, VALID_VERDICT,
    VALID_WORKOUT,
};

fn strength_request() -> GenerationRequest {
    GenerationRequest::new(WorkoutType::Strength)
}

fn protocol(script: Vec<Scripted>) -> GenerationProtocol<ScriptedClient> {
    GenerationProtocol::new(ScriptedClient::new(script))
}

#[tokio::test]
async fn accepts_valid_workout_on_first_attempt() {
    common::init_tracing();
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(VALID_VERDICT),
    ]);

    let workout = protocol
        .generate(
            ProfileContext::InitialIntake("new lifter, 3 days a week"),
            &[],
            &strength_request(),
        )
        .await
        .unwrap();

    assert_eq!(workout.workout_type, WorkoutType::Strength);
    assert_eq!(workout.exercises.len(), 3);
    assert_eq!(workout.raw_response.as_deref(), Some(VALID_WORKOUT));

    // One generation call plus one quality-review call
    let requests = protocol.client().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].task, Some(TaskType::WorkoutGeneration));
    assert_eq!(requests[1].task, Some(TaskType::QualityReview));
    // The review runs cool for consistent verdicts
    assert!(requests[1].temperature.unwrap() < 0.5);
    // The reviewer sees the raw completion verbatim
    assert!(requests[1].messages[1].content.contains("Squat"));
}

#[tokio::test]
async fn unparsable_completions_fail_after_exactly_three_attempts() {
    let protocol = protocol(vec![
        Scripted::Text("I cannot produce a workout today."),
        Scripted::Text("Sorry, still no JSON."),
        Scripted::Text("Here are some general fitness tips instead..."),
    ]);

    let err = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap_err();

    match err {
        EngineError::ExhaustedRetries {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last_error, EngineError::Parse { .. }));
        }
        other => panic!("expected exhausted retries, got {other}"),
    }
    // Parse failures never reach the quality gate: three generation calls only
    assert_eq!(protocol.client().call_count(), 3);
}

#[tokio::test]
async fn minor_verdict_with_issues_is_accepted_without_retry() {
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(MINOR_VERDICT),
    ]);

    let workout = protocol
        .generate(ProfileContext::ProgressSummary("steady progress"), &[], &strength_request())
        .await
        .unwrap();

    assert_eq!(workout.exercises.len(), 3);
    assert_eq!(protocol.client().call_count(), 2);
}

#[tokio::test]
async fn critical_verdict_feeds_issues_back_and_retries() {
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(CRITICAL_VERDICT),
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(VALID_VERDICT),
    ]);

    let workout = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap();
    assert_eq!(workout.exercises.len(), 3);

    let requests = protocol.client().requests();
    assert_eq!(requests.len(), 4);

    // The second generation attempt carries the rejected output as an
    // assistant turn followed by corrective feedback naming the issue
    let retry = &requests[2];
    assert_eq!(retry.task, Some(TaskType::WorkoutGeneration));
    let assistant_echo = &retry.messages[retry.messages.len() - 2];
    assert_eq!(assistant_echo.role, MessageRole::Assistant);
    assert!(assistant_echo.content.contains("Squat"));
    let feedback = retry.messages.last().unwrap();
    assert_eq!(feedback.role, MessageRole::User);
    assert!(feedback.content.contains("dangerously high"));
}

#[tokio::test]
async fn duplicate_exercise_names_trigger_structural_retry() {
    let protocol = protocol(vec![
        Scripted::Text(DUPLICATE_WORKOUT),
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(VALID_VERDICT),
    ]);

    let workout = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap();
    assert_eq!(workout.exercises.len(), 3);

    // Structural failure skips the quality gate, so the second call is the
    // retry generation, not a review
    let requests = protocol.client().requests();
    assert_eq!(requests[1].task, Some(TaskType::WorkoutGeneration));
    let feedback = requests[1].messages.last().unwrap();
    assert!(feedback.content.to_lowercase().contains("squat"));
    assert!(feedback.content.contains("unique"));
}

#[tokio::test]
async fn transport_failures_exhaust_the_attempt_budget() {
    let protocol = protocol(vec![
        Scripted::TransportError,
        Scripted::TransportError,
        Scripted::TransportError,
    ]);

    let err = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap_err();

    match err {
        EngineError::ExhaustedRetries {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last_error, EngineError::Transport(_)));
        }
        other => panic!("expected exhausted retries, got {other}"),
    }
}

#[tokio::test]
async fn fenced_verdict_is_tolerated_like_the_main_response() {
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text("```json\n{\"valid\": true, \"issues\": [], \"severity\": \"minor\",}\n```"),
    ]);

    assert!(protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .is_ok());
}

#[tokio::test]
async fn unreadable_verdict_rejects_the_attempt() {
    // An approval the engine cannot read is not an approval
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text("looks good to me!"),
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(VALID_VERDICT),
    ]);

    let workout = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap();
    assert_eq!(workout.exercises.len(), 3);
    assert_eq!(protocol.client().call_count(), 4);
}

#[tokio::test]
async fn accepted_workouts_never_repeat_exercise_names() {
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(VALID_VERDICT),
    ]);

    let workout = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap();

    let mut names: Vec<String> = workout
        .exercises
        .iter()
        .map(|e| e.canonical_name())
        .collect();
    names.sort();
    let before = names.len();
    names.dedup();
    assert_eq!(names.len(), before);
}

#[tokio::test]
async fn feedback_falls_back_on_transport_failure() {
    let protocol = protocol(vec![
        Scripted::Text(VALID_WORKOUT),
        Scripted::Text(VALID_VERDICT),
    ]);
    let workout = protocol
        .generate(ProfileContext::InitialIntake("intake"), &[], &strength_request())
        .await
        .unwrap();

    // Script is now exhausted, so the feedback call fails at transport level
    let feedback = protocol
        .workout_feedback("returning client", &[], &workout)
        .await;
    assert!(feedback.contains("Great work"));
}

#[tokio::test]
async fn progress_summary_assembles_profile_and_conversation() {
    let protocol = protocol(vec![Scripted::Text(
        "Maria has made steady strength gains over 12 workouts.",
    )]);

    let summary = protocol
        .progress_summary(
            "Maria",
            "wants general strength",
            12,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            &[],
        )
        .await
        .unwrap();
    assert!(summary.contains("steady strength gains"));

    let requests = protocol.client().requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].messages[1].content;
    assert!(prompt.contains("Client: Maria"));
    assert!(prompt.contains("Completed 12 workouts since 2025-03-01"));
}
