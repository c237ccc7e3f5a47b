//! Creative prompt to structured technical specification.

use std::sync::Arc;

use framesmith_core::code_cleanup::strip_code_fences;
use framesmith_core::generation::GenerationOptions;
use framesmith_core::spec::{TechnicalSpecification, VoiceoverSettings};
use framesmith_core::spec_fallback::fallback_specification;
use framesmith_core::text_generation::TextGenerator;

use crate::prompts;

/// Result of [`SpecificationEnhancer::enhance`]. The fallback is a value,
/// not an error: generation always proceeds with some specification.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecOutcome {
    Enhanced(TechnicalSpecification),
    Fallback {
        spec: TechnicalSpecification,
        reason: String,
    },
}

impl SpecOutcome {
    pub fn specification(&self) -> &TechnicalSpecification {
        match self {
            SpecOutcome::Enhanced(spec) | SpecOutcome::Fallback { spec, .. } => spec,
        }
    }

    pub fn into_specification(self) -> TechnicalSpecification {
        match self {
            SpecOutcome::Enhanced(spec) | SpecOutcome::Fallback { spec, .. } => spec,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SpecOutcome::Fallback { .. })
    }
}

pub struct SpecificationEnhancer {
    text: Arc<dyn TextGenerator>,
}

impl SpecificationEnhancer {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Ask the service for a specification; any failure yields the
    /// deterministic fallback.
    pub async fn enhance(&self, options: &GenerationOptions) -> SpecOutcome {
        let instruction = prompts::enhancer_instruction(options);
        let raw = match self.text.complete(prompts::ENHANCER_SYSTEM, &instruction).await {
            Ok(raw) => raw,
            Err(e) => return fallback(options, e.to_string()),
        };

        let mut spec = match TechnicalSpecification::from_json(&strip_code_fences(&raw)) {
            Ok(spec) => spec,
            Err(e) => return fallback(options, e.to_string()),
        };

        // The job's own voiceover settings are authoritative.
        spec.voiceover = VoiceoverSettings {
            enabled: options.voiceover,
            voice: options.voice.clone(),
        };

        for dangling in spec.dangling_targets() {
            tracing::warn!(
                scene_id = %dangling.scene_id,
                target = %dangling.target,
                "Animation targets an object not declared in this or an earlier scene",
            );
        }

        tracing::info!(
            scenes = spec.scenes.len(),
            language = %spec.language,
            "Technical specification generated",
        );
        SpecOutcome::Enhanced(spec)
    }
}

fn fallback(options: &GenerationOptions, reason: String) -> SpecOutcome {
    tracing::warn!(error = %reason, "Specification enhancement failed, using fallback");
    SpecOutcome::Fallback {
        spec: fallback_specification(options),
        reason,
    }
}
