//! A [`Generator`] that replays scripted outputs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use waypoint_core::generation::{GenerationError, GenerationOutput, GenerationRequest, Generator};

enum Scripted {
    Output(GenerationOutput),
    ApiError { status: u16, message: String },
}

/// Returns queued outputs in order and records every request.
///
/// An exhausted script yields [`GenerationError::InvalidResponse`].
pub struct ScriptedGenerator {
    profile: String,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new("scripted")
    }
}

impl ScriptedGenerator {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_owned(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, item: Scripted) -> &Self {
        self.script.lock().unwrap().push_back(item);
        self
    }

    /// Queue an already-parsed JSON result.
    pub fn push_json(&self, value: Value) -> &Self {
        self.push(Scripted::Output(GenerationOutput::Structured(value)))
    }

    /// Queue a raw text result.
    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push(Scripted::Output(GenerationOutput::Text(text.into())))
    }

    /// Queue a backend failure.
    pub fn push_error(&self, status: u16, message: impl Into<String>) -> &Self {
        self.push(Scripted::ApiError {
            status,
            message: message.into(),
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn profile(&self) -> &str {
        &self.profile
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::ApiError { status, message }) => Err(GenerationError::Api { status, message }),
            None => Err(GenerationError::InvalidResponse("script exhausted".into())),
        }
    }
}
