#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskforge_core::api::{
    ActionCapability, ActionRequest, ActionResult, ExecutionEngine, ExecutionOpts,
    GraphBuilder, GraphSynthesizer, OutputRendererPlugin, RecoveryPlanner, RenderEvent,
    SynthesisRequest, ValidationCapability, ValidationRequest, ValidationResult,
};

/// Action capability answering from a per-task script; unscripted tasks succeed.
#[derive(Default)]
pub struct ScriptedAction {
    results: Mutex<HashMap<String, ActionResult>>,
    delays: Mutex<HashMap<String, Duration>>,
    performed: Mutex<Vec<ActionRequest>>,
}

impl ScriptedAction {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, task_id: &str, result: ActionResult) {
        self.results
            .lock()
            .unwrap()
            .insert(task_id.to_string(), result);
    }

    pub fn delay(&self, task_id: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(task_id.to_string(), delay);
    }

    pub fn performed_ids(&self) -> Vec<String> {
        self.performed
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.task_id.clone())
            .collect()
    }

    pub fn performed(&self) -> Vec<ActionRequest> {
        self.performed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionCapability for ScriptedAction {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn perform(&self, request: &ActionRequest) -> ActionResult {
        self.performed.lock().unwrap().push(request.clone());
        let delay = self.delays.lock().unwrap().get(&request.task_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.results
            .lock()
            .unwrap()
            .get(&request.task_id)
            .cloned()
            .unwrap_or_else(|| ActionResult::ok(format!("did {}", request.task_id)))
    }
}

/// Validator answering from a per-command exit code; unscripted commands pass.
#[derive(Default)]
pub struct ScriptedValidator {
    exits: Mutex<HashMap<String, (i32, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedValidator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, command: &str, exit_code: i32, stderr: &str) {
        self.exits
            .lock()
            .unwrap()
            .insert(command.to_string(), (exit_code, stderr.to_string()));
    }

    pub fn delay(&self, command: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(command.to_string(), delay);
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValidationCapability for ScriptedValidator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        self.seen.lock().unwrap().push(request.command.clone());
        let delay = self.delays.lock().unwrap().get(&request.command).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.exits.lock().unwrap().get(&request.command) {
            Some((code, stderr)) => ValidationResult {
                exit_code: *code,
                stdout: String::new(),
                stderr: stderr.clone(),
            },
            None => ValidationResult::default(),
        }
    }
}

/// Synthesizer replaying queued replies; an exhausted queue answers `[]`.
#[derive(Default)]
pub struct QueuedSynthesizer {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl QueuedSynthesizer {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphSynthesizer for QueuedSynthesizer {
    fn name(&self) -> &str {
        "queued"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "[]".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl OutputRendererPlugin for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "test"
    }

    fn render(&self, event: &RenderEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Fakes wired into one engine.
pub struct Harness {
    pub action: Arc<ScriptedAction>,
    pub validator: Arc<ScriptedValidator>,
    pub synthesizer: Arc<QueuedSynthesizer>,
    pub renderer: Arc<RecordingRenderer>,
    pub builder: Arc<GraphBuilder>,
}

impl Harness {
    /// `replies` feed every synthesis call, planning and recovery alike.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let synthesizer = QueuedSynthesizer::new(replies);
        let builder = Arc::new(GraphBuilder::new(Some(synthesizer.clone())));
        Self {
            action: ScriptedAction::new(),
            validator: ScriptedValidator::new(),
            synthesizer,
            renderer: RecordingRenderer::new(),
            builder,
        }
    }

    pub fn engine(&self, opts: ExecutionOpts) -> ExecutionEngine {
        ExecutionEngine::builder(
            self.action.clone(),
            self.action.clone(),
            self.validator.clone(),
        )
        .recovery(Arc::new(RecoveryPlanner::new(self.builder.clone())))
        .renderer(self.renderer.clone())
        .opts(opts)
        .build()
    }
}

pub fn opts_with_depth(max_recovery_depth: u32) -> ExecutionOpts {
    ExecutionOpts {
        max_recovery_depth,
        ..ExecutionOpts::default()
    }
}
