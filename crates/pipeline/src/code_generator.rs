//! Specification or fix directive to program text.

use std::sync::Arc;

use framesmith_core::code_cleanup::clean_generated_code;
use framesmith_core::generation::GenerationOptions;
use framesmith_core::naming::scene_class_name;
use framesmith_core::spec::TechnicalSpecification;
use framesmith_core::text_generation::{first_program_text, TextGenerator};

use crate::error::PipelineError;
use crate::prompts;

/// What the generator is asked to produce code from.
#[derive(Debug, Clone, Copy)]
pub enum GeneratorInput<'a> {
    /// First attempt: implement this specification.
    Specification(&'a TechnicalSpecification),
    /// No usable specification; work from the raw prompt.
    Degraded(&'a str),
    /// Retry: correct the previous script given the enriched error.
    Fix {
        previous_code: &'a str,
        error: &'a str,
    },
}

/// Cleaned generator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: String,
    pub scene_name: String,
    /// Outcome of the light structural check.
    pub is_valid: bool,
    pub problems: Vec<String>,
}

pub struct CodeGenerator {
    text: Arc<dyn TextGenerator>,
}

impl CodeGenerator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    pub async fn generate(
        &self,
        input: GeneratorInput<'_>,
        options: &GenerationOptions,
    ) -> Result<GeneratedCode, PipelineError> {
        let scene_name = scene_class_name(&options.title);
        let system = prompts::generation_system(options);
        let instruction = build_instruction(input, options, &scene_name);

        let segments = self
            .text
            .complete_with_code_tool(&system, &instruction)
            .await?;
        let raw = first_program_text(&segments).ok_or(PipelineError::MissingCode)?;

        let cleaned = clean_generated_code(raw, options.voiceover);
        if !cleaned.is_valid {
            tracing::warn!(
                scene_name = %scene_name,
                problems = ?cleaned.problems,
                "Generated code failed the structural check",
            );
        }

        Ok(GeneratedCode {
            code: cleaned.code,
            scene_name,
            is_valid: cleaned.is_valid,
            problems: cleaned.problems,
        })
    }
}

fn build_instruction(
    input: GeneratorInput<'_>,
    options: &GenerationOptions,
    scene_name: &str,
) -> String {
    match input {
        GeneratorInput::Specification(spec) => match spec.to_pretty_json() {
            Ok(json) => prompts::specification_instruction(&json, options, scene_name),
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize specification, using raw prompt");
                prompts::degraded_instruction(&options.prompt, options, scene_name)
            }
        },
        GeneratorInput::Degraded(prompt) => {
            prompts::degraded_instruction(prompt, options, scene_name)
        }
        GeneratorInput::Fix {
            previous_code,
            error,
        } => prompts::fix_instruction(previous_code, error, options, scene_name),
    }
}
