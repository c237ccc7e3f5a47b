//! Deterministic minimal specification used when enhancement fails.
//!
//! Everything here is derived purely from [`GenerationOptions`], so two calls
//! with the same options always produce the same specification.

use std::collections::BTreeMap;

use crate::generation::{GenerationOptions, DEFAULT_LANGUAGE};
use crate::spec::{Animation, Scene, SceneObject, TechnicalSpecification, VoiceoverSettings};

/// Language used when no indicator matches.
pub const BASE_LANGUAGE: &str = DEFAULT_LANGUAGE;

/// Substring indicators checked against the lowercased prompt, in order.
const LANGUAGE_INDICATORS: &[(&str, &str)] = &[
    ("hindi", "hi"),
    ("हिंदी", "hi"),
    ("spanish", "es"),
    ("español", "es"),
    ("french", "fr"),
    ("français", "fr"),
    ("german", "de"),
    ("deutsch", "de"),
    ("portuguese", "pt"),
    ("japanese", "ja"),
    ("日本語", "ja"),
    ("chinese", "zh"),
    ("中文", "zh"),
];

/// Guess the narration language from prompt keywords.
pub fn guess_language(prompt: &str) -> &'static str {
    let lowered = prompt.to_lowercase();
    LANGUAGE_INDICATORS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, code)| *code)
        .unwrap_or(BASE_LANGUAGE)
}

/// Build the two-scene fallback specification: a title card followed by a
/// single generic shape.
pub fn fallback_specification(options: &GenerationOptions) -> TechnicalSpecification {
    let total = f64::from(options.duration_secs.max(2));
    let split = (total / 2.0).floor();
    let title = if options.title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        options.title.trim().to_string()
    };

    let title_scene = Scene {
        id: "title_card".to_string(),
        timing: format!("0-{split}s"),
        objects: vec![SceneObject {
            id: "title".to_string(),
            kind: "Text".to_string(),
            content: title.clone(),
            placement: "center".to_string(),
            style: BTreeMap::new(),
        }],
        animations: vec![Animation {
            kind: "Write".to_string(),
            targets: vec!["title".to_string()],
            duration: None,
            run_time: Some(2.0),
            lag_ratio: None,
        }],
        cleanup: vec!["title".to_string()],
        narration: options.voiceover.then(|| title.clone()),
        special_requirements: Vec::new(),
    };

    let mut shape_style = BTreeMap::new();
    shape_style.insert("color".to_string(), serde_json::json!("BLUE"));

    let shape_scene = Scene {
        id: "main_shape".to_string(),
        timing: format!("{split}-{total}s"),
        objects: vec![SceneObject {
            id: "shape".to_string(),
            kind: "Circle".to_string(),
            content: String::new(),
            placement: "center".to_string(),
            style: shape_style,
        }],
        animations: vec![Animation {
            kind: "Create".to_string(),
            targets: vec!["shape".to_string()],
            duration: None,
            run_time: Some(2.0),
            lag_ratio: None,
        }],
        cleanup: Vec::new(),
        narration: options
            .voiceover
            .then(|| options.prompt.chars().take(200).collect()),
        special_requirements: Vec::new(),
    };

    TechnicalSpecification {
        language: options
            .target_language()
            .unwrap_or_else(|| guess_language(&options.prompt))
            .to_string(),
        total_duration: total,
        voiceover: VoiceoverSettings {
            enabled: options.voiceover,
            voice: options.voice.clone(),
        },
        scenes: vec![title_scene, shape_scene],
        special_requirements: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::tests::sample_options;

    #[test]
    fn guesses_language_from_keywords() {
        assert_eq!(guess_language("Explain gravity in Spanish"), "es");
        assert_eq!(guess_language("एक वीडियो हिंदी में"), "hi");
        assert_eq!(guess_language("Erkläre es auf Deutsch"), "de");
    }

    #[test]
    fn defaults_to_base_language() {
        assert_eq!(guess_language("Explain gravity"), BASE_LANGUAGE);
    }

    #[test]
    fn chosen_language_wins_over_keywords() {
        let options = GenerationOptions {
            language: "fr".to_string(),
            prompt: "Explain gravity in Spanish".to_string(),
            ..sample_options()
        };
        assert_eq!(fallback_specification(&options).language, "fr");
    }

    #[test]
    fn default_language_defers_to_keywords() {
        let options = GenerationOptions {
            prompt: "Explain gravity in Spanish".to_string(),
            ..sample_options()
        };
        assert_eq!(fallback_specification(&options).language, "es");
    }

    #[test]
    fn fallback_is_deterministic() {
        let options = sample_options();
        let a = fallback_specification(&options);
        let b = fallback_specification(&options);
        assert_eq!(a, b);
        assert_eq!(a.language, b.language);
        assert_eq!(a.scenes.len(), 2);
    }

    #[test]
    fn fallback_has_title_card_then_shape() {
        let spec = fallback_specification(&sample_options());
        assert_eq!(spec.scenes[0].objects[0].content, "Pythagorean Theorem");
        assert_eq!(spec.scenes[1].objects[0].kind, "Circle");
        assert_eq!(spec.total_duration, 30.0);
        assert!(spec.dangling_targets().is_empty());
    }

    #[test]
    fn fallback_narrates_only_with_voiceover() {
        let mut options = sample_options();
        assert!(fallback_specification(&options).scenes[0].narration.is_none());
        options.voiceover = true;
        options.voice = "alloy".to_string();
        let spec = fallback_specification(&options);
        assert!(spec.voiceover.enabled);
        assert_eq!(spec.scenes[0].narration.as_deref(), Some("Pythagorean Theorem"));
    }
}
