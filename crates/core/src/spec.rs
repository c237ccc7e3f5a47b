//! Structured technical specification produced from a creative prompt.
//!
//! The specification is produced once per job (by the enhancer or its
//! deterministic fallback) and handed read-only to the code generator. The
//! JSON shape here is the exact shape the text-generation service is asked to
//! emit, so every field tolerates omission.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Voiceover settings carried by a specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceoverSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub voice: String,
}

/// A visual object declared by a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    /// Object type, e.g. `MathTex`, `Circle`, `Text`.
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub placement: String,
    #[serde(default)]
    pub style: BTreeMap<String, serde_json::Value>,
}

/// An animation applied to one or more previously declared objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Animation type, e.g. `Create`, `Write`, `FadeIn`, `LaggedStart`.
    pub kind: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub run_time: Option<f64>,
    /// Per-item delay fraction for staggered starts.
    #[serde(default)]
    pub lag_ratio: Option<f64>,
}

/// One timed segment of the animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    /// Free-text timing window such as `"0-5s"`.
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    /// Object ids to remove before the next scene starts.
    #[serde(default)]
    pub cleanup: Vec<String>,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub special_requirements: Vec<String>,
}

/// Complete technical specification for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSpecification {
    pub language: String,
    pub total_duration: f64,
    #[serde(default)]
    pub voiceover: VoiceoverSettings,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub special_requirements: Vec<String>,
}

/// An animation target that does not name an object declared in the same or
/// an earlier scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingTarget {
    pub scene_id: String,
    pub target: String,
}

impl TechnicalSpecification {
    /// Parse a specification from raw JSON text.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let spec: Self = serde_json::from_str(text)?;
        if spec.scenes.is_empty() {
            return Err(CoreError::MalformedSpecification(
                "specification declares no scenes".to_string(),
            ));
        }
        Ok(spec)
    }

    /// Serialize for embedding in a generation instruction.
    pub fn to_pretty_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Animation targets that reference undeclared objects.
    ///
    /// Objects accumulate across scenes in order; cleanup directives are not
    /// taken into account.
    pub fn dangling_targets(&self) -> Vec<DanglingTarget> {
        let mut declared: HashSet<&str> = HashSet::new();
        let mut dangling = Vec::new();

        for scene in &self.scenes {
            declared.extend(scene.objects.iter().map(|o| o.id.as_str()));
            for animation in &scene.animations {
                for target in &animation.targets {
                    if !declared.contains(target.as_str()) {
                        dangling.push(DanglingTarget {
                            scene_id: scene.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        dangling
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
