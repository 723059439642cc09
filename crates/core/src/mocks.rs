//! Mock implementations of core traits for testing.
//!
//! Scripted backends replay a queue of outcomes and record every call so
//! tests can assert on what the orchestration layer sent out.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{
    traits::{Agent, GenerationBackend, GenerationOutput, GenerationRequest, TextBackend, TextReply, TextRequest},
    types::{AgentRequest, AgentResponse, Capability, CapabilitySet, Intent, RequestContext},
    Error, Result,
};

// =============================================================================
// Mock Text Backend
// =============================================================================

/// Text backend that replays scripted outcomes.
///
/// When the script runs out, the last outcome repeats.
pub struct ScriptedTextBackend {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    last: Mutex<Option<std::result::Result<String, String>>>,
    calls: Mutex<Vec<TextRequest>>,
}

impl ScriptedTextBackend {
    pub fn new(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that always answers with `text`.
    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Backend that always fails with `error`.
    pub fn failing(error: &str) -> Self {
        Self::new(vec![Err(error.to_string())])
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<TextRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> std::result::Result<String, String> {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(outcome) = script.pop_front() {
            *last = Some(outcome.clone());
            outcome
        } else {
            last.clone().unwrap_or_else(|| Err("script exhausted".to_string()))
        }
    }
}

#[async_trait]
impl TextBackend for ScriptedTextBackend {
    async fn respond(&self, request: TextRequest) -> Result<TextReply> {
        self.calls.lock().unwrap().push(request);
        match self.next_outcome() {
            Ok(text) => Ok(TextReply {
                text,
                confidence: Some(0.9),
            }),
            Err(e) => Err(Error::text_backend(e)),
        }
    }
}

// =============================================================================
// Mock Generation Backend
// =============================================================================

/// Generation backend that replays scripted outcomes.
pub struct ScriptedGenerationBackend {
    id: String,
    script: Mutex<VecDeque<Result<GenerationOutput>>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerationBackend {
    pub fn new(id: &str, script: Vec<Result<GenerationOutput>>) -> Self {
        Self {
            id: id.to_string(),
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose next call returns `count` one-pixel PNG images.
    pub fn producing(count: usize) -> Self {
        Self::new("mock-imagen", vec![Ok(Self::output(count))])
    }

    /// Backend whose every call fails.
    pub fn failing() -> Self {
        Self::new("mock-imagen", Vec::new())
    }

    /// Output holding `count` images and a caption.
    pub fn output(count: usize) -> GenerationOutput {
        GenerationOutput {
            text: Some("Here is your design".to_string()),
            images: (0..count).map(|i| Bytes::from(vec![0x89, b'P', b'N', b'G', i as u8])).collect(),
            mime_types: vec!["image/png".to_string(); count],
        }
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedGenerationBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        self.calls.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::generation_backend("backend unavailable")))
    }
}

// =============================================================================
// Mock Agent
// =============================================================================

/// Agent with a fixed capability set and a fixed answer.
pub struct StaticAgent {
    id: String,
    capabilities: CapabilitySet,
    reply: std::result::Result<String, String>,
    fail_lifecycle: bool,
    executions: AtomicUsize,
}

impl StaticAgent {
    pub fn new(id: &str, capabilities: &[Capability]) -> Self {
        Self {
            id: id.to_string(),
            capabilities: capabilities.iter().cloned().collect(),
            reply: Ok(format!("{id} handled it")),
            fail_lifecycle: false,
            executions: AtomicUsize::new(0),
        }
    }

    /// Make `execute` return an error response.
    pub fn failing(mut self, error: &str) -> Self {
        self.reply = Err(error.to_string());
        self
    }

    /// Make `initialize` and `dispose` fail.
    pub fn with_failing_lifecycle(mut self) -> Self {
        self.fail_lifecycle = true;
        self
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for StaticAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    fn can_handle(&self, _intent: &Intent, _context: &RequestContext) -> bool {
        true
    }

    async fn execute(&self, request: AgentRequest) -> AgentResponse {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let response = match &self.reply {
            Ok(text) => AgentResponse::success(request.request_id, text.clone(), None, HashMap::new()),
            Err(e) => AgentResponse::error(request.request_id, e.clone()),
        };
        response.with_agent(self.id.clone())
    }

    async fn initialize(&self) -> Result<()> {
        if self.fail_lifecycle {
            return Err(Error::lifecycle(format!("{} failed to start", self.id)));
        }
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        if self.fail_lifecycle {
            return Err(Error::lifecycle(format!("{} failed to stop", self.id)));
        }
        Ok(())
    }
}
