//! Request and response bodies for the OpenAI-compatible endpoints.

use framesmith_core::text_generation::ToolSegment;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Chat completions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, system: &'a str, user: &'a str) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if it is non-empty.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CreateContainerRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ContainerResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Responses API with the code-execution tool
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CodeToolRequest<'a> {
    pub model: &'a str,
    pub instructions: &'a str,
    pub input: &'a str,
    pub tools: Vec<CodeInterpreterTool<'a>>,
    pub tool_choice: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CodeInterpreterTool<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub container: &'a str,
}

impl<'a> CodeToolRequest<'a> {
    /// Request that forces the model to call the code interpreter running in
    /// `container_id`.
    pub fn new(model: &'a str, system: &'a str, user: &'a str, container_id: &'a str) -> Self {
        Self {
            model,
            instructions: system,
            input: user,
            tools: vec![CodeInterpreterTool {
                kind: "code_interpreter",
                container: container_id,
            }],
            tool_choice: "required",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeToolResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

/// One item of the `output` array. Item types this client does not use are
/// kept as [`OutputItem::Other`] so new types never break decoding.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<MessageContent>,
    },
    CodeInterpreterCall {
        #[serde(default)]
        code: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl CodeToolResponse {
    /// Flatten the output items into segments, preserving response order.
    pub fn into_segments(self) -> Vec<ToolSegment> {
        let mut segments = Vec::new();
        for item in self.output {
            match item {
                OutputItem::Message { content } => {
                    for part in content {
                        if let MessageContent::OutputText { text } = part {
                            segments.push(ToolSegment::Text(text));
                        }
                    }
                }
                OutputItem::CodeInterpreterCall { code: Some(code) } => {
                    segments.push(ToolSegment::CodeExecution { code });
                }
                OutputItem::CodeInterpreterCall { code: None } | OutputItem::Other => {}
            }
        }
        segments
    }
}
