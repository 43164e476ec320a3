// ABOUTME: Shared test fixtures, including a scripted completion-client double
// ABOUTME: Scripts let each test exercise a specific retry/validation branch

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use coach_engine::errors::{EngineError, EngineResult};
use coach_engine::llm::{Completion, CompletionClient, CompletionRequest};

/// Install a test-friendly tracing subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A valid strength workout completion
pub const VALID_WORKOUT: &str = r#"{
    "type": "strength",
    "exercises": [
        {"name": "Squat", "sets": [
            {"weight": 135, "reps": 5}, {"weight": 135, "reps": 5}, {"weight": 135, "reps": 5}
        ]},
        {"name": "Bench Press", "sets": [
            {"weight": 95, "reps": 8}, {"weight": 95, "reps": 8}
        ]},
        {"name": "Barbell Row", "sets": [
            {"weight": 85, "reps": 10}, {"weight": 85, "reps": 10}
        ]}
    ],
    "summary": "Full-body strength session building on last week's loads."
}"#;

/// A workout that repeats an exercise name (case/whitespace variant)
pub const DUPLICATE_WORKOUT: &str = r#"{
    "type": "strength",
    "exercises": [
        {"name": "Squat", "sets": [{"weight": 135, "reps": 5}]},
        {"name": " squat ", "sets": [{"weight": 135, "reps": 5}]}
    ],
    "summary": "Legs twice over."
}"#;

/// A clean approval verdict
pub const VALID_VERDICT: &str = r#"{"valid": true, "issues": [], "severity": "minor"}"#;

/// An accept-with-warnings verdict: minor severity, non-empty issues
pub const MINOR_VERDICT: &str =
    r#"{"valid": true, "issues": ["rest periods are a little short"], "severity": "minor"}"#;

/// A rejection verdict forcing a regeneration attempt
pub const CRITICAL_VERDICT: &str =
    r#"{"valid": false, "issues": ["volume is dangerously high for a beginner"], "severity": "critical"}"#;

/// One scripted turn: a completion or a transport failure
pub enum Scripted {
    /// Return this text as the completion
    Text(&'static str),
    /// Fail the call at the transport level
    TransportError,
}

/// Completion-client double that replays a fixed script
///
/// Every request is recorded for assertions on message assembly, task
/// routing, and call counts. Running past the end of the script returns a
/// transport error, so a runaway retry loop fails loudly instead of hanging.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client that answers every call with the same text
    pub fn repeating(text: &'static str, times: usize) -> Self {
        Self::new((0..times).map(|_| Scripted::Text(text)).collect())
    }

    /// Snapshot of every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> EngineResult<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(Completion::text(text)),
            Some(Scripted::TransportError) => {
                Err(EngineError::transport("scripted transport failure"))
            }
            None => Err(EngineError::transport("script exhausted")),
        }
    }
}
