//! Fake collaborators shared by the pipeline integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use framesmith_core::generation::GenerationOptions;
use framesmith_core::job::{JobStore, JobStoreError, JobUpdate, MemoryJobStore};
use framesmith_core::render::{RenderError, RenderOutcome, RenderRequest, Renderer};
use framesmith_core::text_generation::{TextGenerationError, TextGenerator, ToolSegment};
use framesmith_core::types::DbId;
use framesmith_pipeline::prompts::{ENHANCER_SYSTEM, REMEDIATION_SYSTEM};
use framesmith_pipeline::{PipelineConfig, SelfHealingPipeline};

pub const VALID_SCRIPT: &str = "from manim import *

class PythagoreanTheorem(Scene):
    def construct(self):
        triangle = Polygon(ORIGIN, RIGHT * 3, UP * 4, color=BLUE)
        label = MathTex(r\"a^2 + b^2 = c^2\")
        self.play(Create(triangle))
        self.wait(1)
        self.play(Write(label))
        self.wait(1)
";

pub const GROUP_DEFECT_SCRIPT: &str = "from manim import *

class PythagoreanTheorem(Scene):
    def construct(self):
        a = Square()
        b = Circle()
        self.play(Create(VGroup(a, b)))
        self.wait(1)
";

pub const REPAIRED_SCRIPT: &str = "from manim import *

class PythagoreanTheorem(Scene):
    def construct(self):
        a = Square()
        b = Circle()
        self.play(LaggedStart(*[Create(m) for m in VGroup(a, b)], lag_ratio=0.2))
        self.wait(1)
";

/// First line indented and an unmarked MathTex literal: a critical and a
/// high finding, both on the mechanical whitelist.
pub const INDENTED_MATH_SCRIPT: &str = "    from manim import *

class PythagoreanTheorem(Scene):
    def construct(self):
        half = MathTex(\"\\frac{1}{2}\")
        self.play(Write(half))
        self.wait(1)
";

pub const INDENTED_MATH_FIXED: &str = "from manim import *

class PythagoreanTheorem(Scene):
    def construct(self):
        half = MathTex(r\"\\frac{1}{2}\")
        self.play(Write(half))
        self.wait(1)";

pub fn options() -> GenerationOptions {
    GenerationOptions {
        title: "Pythagorean Theorem".to_string(),
        prompt: "Show a right triangle and the Pythagorean theorem".to_string(),
        voiceover: false,
        voice: String::new(),
        language: "en".to_string(),
        duration_secs: 30,
        aspect_ratio: "16:9".to_string(),
        resolution: "1080p".to_string(),
        style: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

/// Scripted text generator. Each queue is consumed in order; an empty queue
/// falls back to a default response.
#[derive(Default)]
pub struct FakeTextGenerator {
    spec_responses: Mutex<VecDeque<Result<String, TextGenerationError>>>,
    repair_responses: Mutex<VecDeque<Result<String, TextGenerationError>>>,
    code_responses: Mutex<VecDeque<Result<Vec<ToolSegment>, TextGenerationError>>>,
    default_code: Mutex<String>,
    pub complete_calls: Mutex<Vec<(String, String)>>,
    pub code_calls: Mutex<Vec<(String, String)>>,
}

impl FakeTextGenerator {
    pub fn new() -> Self {
        let fake = Self::default();
        *fake.default_code.lock().unwrap() = VALID_SCRIPT.to_string();
        fake
    }

    pub fn with_default_code(self, code: &str) -> Self {
        *self.default_code.lock().unwrap() = code.to_string();
        self
    }

    pub fn push_spec(&self, response: Result<String, TextGenerationError>) {
        self.spec_responses.lock().unwrap().push_back(response);
    }

    pub fn push_repair(&self, response: Result<String, TextGenerationError>) {
        self.repair_responses.lock().unwrap().push_back(response);
    }

    pub fn push_code(&self, response: Result<Vec<ToolSegment>, TextGenerationError>) {
        self.code_responses.lock().unwrap().push_back(response);
    }

    pub fn repair_calls(&self) -> usize {
        self.complete_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(system, _)| system == REMEDIATION_SYSTEM)
            .count()
    }

    pub fn enhancer_calls(&self) -> usize {
        self.complete_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(system, _)| system == ENHANCER_SYSTEM)
            .count()
    }

    pub fn code_instructions(&self) -> Vec<String> {
        self.code_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, user)| user.clone())
            .collect()
    }
}

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TextGenerationError> {
        self.complete_calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        let queue = if system == REMEDIATION_SYSTEM {
            &self.repair_responses
        } else {
            &self.spec_responses
        };
        queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(TextGenerationError::Transport(
                "no scripted completion".to_string(),
            ))
        })
    }

    async fn complete_with_code_tool(
        &self,
        system: &str,
        user: &str,
    ) -> Result<Vec<ToolSegment>, TextGenerationError> {
        self.code_calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        let scripted = self.code_responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(vec![ToolSegment::CodeExecution {
                code: self.default_code.lock().unwrap().clone(),
            }])
        })
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Scripted renderer; once the queue is empty every render succeeds.
#[derive(Default)]
pub struct FakeRenderer {
    outcomes: Mutex<VecDeque<Result<RenderOutcome, RenderError>>>,
    always_fail: bool,
    pub requests: Mutex<Vec<RenderRequest>>,
}

impl FakeRenderer {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn push(&self, outcome: Result<RenderOutcome, RenderError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

pub fn success_outcome() -> RenderOutcome {
    RenderOutcome {
        success: true,
        error: None,
        logs: "Rendered 1 scene".to_string(),
        stderr: String::new(),
        output_url: Some("https://cdn.example.com/renders/1/PythagoreanTheorem.mp4".to_string()),
    }
}

pub fn failure_outcome(error: &str, stderr: &str) -> RenderOutcome {
    RenderOutcome {
        success: false,
        error: Some(error.to_string()),
        logs: String::new(),
        stderr: stderr.to_string(),
        output_url: None,
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, RenderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return outcome;
        }
        if self.always_fail {
            Ok(failure_outcome(
                "NameError: name 'Foo' is not defined",
                "Traceback (most recent call last):",
            ))
        } else {
            Ok(success_outcome())
        }
    }
}

// ---------------------------------------------------------------------------
// Job store
// ---------------------------------------------------------------------------

/// Store whose every write fails.
pub struct FailingStore;

#[async_trait]
impl JobStore for FailingStore {
    async fn update_job(&self, _job_id: DbId, _update: JobUpdate) -> Result<(), JobStoreError> {
        Err(JobStoreError::Backend("database unavailable".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub text: Arc<FakeTextGenerator>,
    pub renderer: Arc<FakeRenderer>,
    pub store: Arc<MemoryJobStore>,
    pub pipeline: SelfHealingPipeline,
}

pub fn harness(text: FakeTextGenerator, renderer: FakeRenderer) -> Harness {
    let text = Arc::new(text);
    let renderer = Arc::new(renderer);
    let store = Arc::new(MemoryJobStore::new());
    let pipeline = SelfHealingPipeline::new(
        text.clone(),
        renderer.clone(),
        store.clone(),
        PipelineConfig::default(),
    );
    Harness {
        text,
        renderer,
        store,
        pipeline,
    }
}
