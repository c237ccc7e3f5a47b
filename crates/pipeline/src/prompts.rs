//! Instruction text sent to the text-generation service.
//!
//! The generation guidance restates every static-analysis rule as an
//! always/never directive so the model avoids the defects the validator
//! looks for.

use framesmith_core::generation::GenerationOptions;
use framesmith_core::static_analysis::rules::{
    LAGGED_CREATE_SHAPE, LAGGED_WRITE_SHAPE, UNSUPPORTED_CHARTS,
};
use framesmith_core::static_analysis::ValidationIssue;

// ---------------------------------------------------------------------------
// Specification enhancer
// ---------------------------------------------------------------------------

pub const ENHANCER_SYSTEM: &str = r#"You are a storyboard planner for mathematical and educational animations rendered with Manim Community Edition.
Turn the user's request into a technical specification. Respond with a single JSON object and nothing else, in exactly this shape:

{
  "language": "en",
  "total_duration": 30,
  "voiceover": { "enabled": false, "voice": "" },
  "scenes": [
    {
      "id": "intro",
      "timing": "0-5s",
      "objects": [
        { "id": "title", "kind": "Text", "content": "Title text", "placement": "top", "style": { "color": "WHITE" } }
      ],
      "animations": [
        { "kind": "Write", "targets": ["title"], "run_time": 2.0 }
      ],
      "cleanup": ["title"],
      "narration": "Optional narration for this scene",
      "special_requirements": []
    }
  ],
  "special_requirements": []
}

Rules:
- Language: use the target language when one is given. Otherwise use the language the request is written in. If the request names a language ("in Spanish", "in Hindi"), use that one. Use ISO 639-1 codes. Default to "en".
- When one animation targets several objects, use kind "LaggedStart" with a lag_ratio (for example 0.2). Never animate a group of objects as a single literal.
- Mathematical content must use kind "MathTex" with LaTeX syntax, e.g. "\\frac{a}{b}", written to be used as a raw string.
- If the request asks that content does not overlap, every scene must list in "cleanup" the objects to remove before the next scene starts.
- Every animation target must be the id of an object declared in the same or an earlier scene.
- Scene timings are consecutive and must add up to the total duration."#;

/// User instruction for the specification enhancer.
pub fn enhancer_instruction(options: &GenerationOptions) -> String {
    let mut text = format!(
        "Title: {}\nRequest: {}\nTotal duration: {} seconds\nAspect ratio: {}\n",
        options.title, options.prompt, options.duration_secs, options.aspect_ratio,
    );
    if !options.style.trim().is_empty() {
        text.push_str(&format!("Visual style: {}\n", options.style));
    }
    if let Some(language) = options.target_language() {
        text.push_str(&format!("Target language: {language}\n"));
    }
    if options.voiceover {
        text.push_str(&format!(
            "Voiceover: enabled with voice \"{}\". Write narration for every scene that fits its timing window.\n",
            options.voice
        ));
    } else {
        text.push_str("Voiceover: disabled. Leave narration empty.\n");
    }
    text
}

// ---------------------------------------------------------------------------
// Code generator
// ---------------------------------------------------------------------------

/// System guidance for code generation.
pub fn generation_system(options: &GenerationOptions) -> String {
    let mut text = format!(
        "You write complete, directly executable Manim Community Edition scripts. \
         Run the script with the code interpreter tool and return the final script.\n\n\
         ALWAYS:\n\
         - Start the file at column 0 with `from manim import *`.\n\
         - Declare exactly one scene class and put the animation in `def construct(self):`.\n\
         - Animate several objects with a staggered start: `self.play({LAGGED_CREATE_SHAPE})` \
           or `self.play({LAGGED_WRITE_SHAPE})`.\n\
         - Write every MathTex and Tex literal as a raw string: MathTex(r\"\\frac{{a}}{{b}}\").\n\
         - Use MathTex for exponents, fractions, roots and symbols like × or ±; Text is for plain words.\n\
         - Follow each self.play(...) with self.wait(...) on the next line.\n\
         - Build charts from Axes plus Line, Dot, Sector and Rectangle.\n\
         - Remove or fade out objects before the next scene when content must not overlap.\n\n\
         NEVER:\n\
         - Pass Create(VGroup(...)), Create(Group(...)), Write(VGroup(...)) or Write(Group(...)) to self.play().\n\
         - Use self.camera.frame; it does not exist on a plain Scene.\n\
         - Use CONFIG dictionaries.\n\
         - Use {}; they do not exist.\n\
         - Wrap the script in markdown fences or add explanations after it.\n",
        UNSUPPORTED_CHARTS.join(", "),
    );

    if let Some(language) = options.target_language() {
        text.push_str(&format!(
            "\nLANGUAGE:\n\
             - Write every Text string and narration line in `{language}` (ISO 639-1). \
               Keep code identifiers and LaTeX in English.\n",
        ));
    }
    if let Some(voice) = options.expected_voice() {
        let (service, module) = speech_service_for(voice);
        text.push_str(&format!(
            "\nVOICEOVER:\n\
             - Import `from manim_voiceover import VoiceoverScene` and \
               `from manim_voiceover.services.{module} import {service}`.\n\
             - The scene class extends VoiceoverScene.\n\
             - Call `self.set_speech_service({service}(voice=\"{voice}\"))` with exactly that voice.\n\
             - Wrap each narrated section in `with self.voiceover(text=\"...\") as tracker:`.\n",
        ));
    }
    text
}

/// Speech service class and module used for a voice identifier.
pub fn speech_service_for(voice: &str) -> (&'static str, &'static str) {
    if voice.ends_with("Neural") {
        ("AzureService", "azure")
    } else {
        ("OpenAIService", "openai")
    }
}

fn scene_header(options: &GenerationOptions, scene_name: &str) -> String {
    let mut header = format!(
        "The scene class must be named `{scene_name}`. Target duration: {} seconds. \
         Aspect ratio: {}. Resolution: {}.",
        options.duration_secs, options.aspect_ratio, options.resolution,
    );
    if !options.style.trim().is_empty() {
        header.push_str(&format!(" Visual style: {}.", options.style));
    }
    if let Some(language) = options.target_language() {
        header.push_str(&format!(" Language for on-screen text and narration: {language}."));
    }
    header
}

/// First-attempt instruction embedding the serialized specification.
pub fn specification_instruction(
    spec_json: &str,
    options: &GenerationOptions,
    scene_name: &str,
) -> String {
    format!(
        "Generate code implementing exactly this specification.\n{}\n\nSpecification:\n{spec_json}",
        scene_header(options, scene_name),
    )
}

/// Instruction used when no structured specification is available.
pub fn degraded_instruction(prompt: &str, options: &GenerationOptions, scene_name: &str) -> String {
    format!(
        "Generate an animation for this request.\n{}\n\nRequest:\n{prompt}",
        scene_header(options, scene_name),
    )
}

/// Retry instruction embedding the failing code and the enriched error.
pub fn fix_instruction(
    previous_code: &str,
    error: &str,
    options: &GenerationOptions,
    scene_name: &str,
) -> String {
    format!(
        "The previous script failed. Produce a corrected, complete version.\n{}\n\n\
         Error:\n{error}\n\nPrevious script:\n{previous_code}",
        scene_header(options, scene_name),
    )
}

// ---------------------------------------------------------------------------
// Remediator
// ---------------------------------------------------------------------------

pub const REMEDIATION_SYSTEM: &str = "You repair Manim Community Edition scripts. \
Change only what the listed issues require and preserve all other behavior. \
Return the complete corrected script with no explanation and no markdown fences.";

/// Directive listing each issue to repair, followed by the full script.
pub fn remediation_instruction(code: &str, issues: &[&ValidationIssue]) -> String {
    let mut text = String::from("Fix these issues:\n");
    for issue in issues {
        text.push_str(&format!(
            "- line {}: [{}] {} Fix: {}\n",
            issue.line, issue.pattern, issue.issue, issue.fix
        ));
    }
    text.push_str("\nScript:\n");
    text.push_str(code);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesmith_core::static_analysis::{IssueKind, Severity};

    fn options(voiceover: bool) -> GenerationOptions {
        GenerationOptions {
            title: "Pythagorean Theorem".to_string(),
            prompt: "Prove a^2 + b^2 = c^2".to_string(),
            voiceover,
            voice: if voiceover { "en-US-AriaNeural".to_string() } else { String::new() },
            language: "en".to_string(),
            duration_secs: 30,
            aspect_ratio: "16:9".to_string(),
            resolution: "1080p".to_string(),
            style: String::new(),
        }
    }

    #[test]
    fn generation_guidance_names_both_lagged_shapes() {
        let text = generation_system(&options(false));
        assert!(text.contains(LAGGED_CREATE_SHAPE));
        assert!(text.contains(LAGGED_WRITE_SHAPE));
        assert!(text.contains("PieChart"));
        assert!(!text.contains("VOICEOVER"));
    }

    #[test]
    fn voiceover_guidance_pins_the_voice() {
        let text = generation_system(&options(true));
        assert!(text.contains("AzureService(voice=\"en-US-AriaNeural\")"));
    }

    #[test]
    fn target_language_reaches_every_instruction() {
        let french = GenerationOptions {
            language: "fr".to_string(),
            ..options(false)
        };
        assert!(enhancer_instruction(&french).contains("Target language: fr"));
        assert!(generation_system(&french).contains("`fr`"));
        for text in [
            specification_instruction("{}", &french, "PythagoreanTheorem"),
            degraded_instruction("prompt", &french, "PythagoreanTheorem"),
            fix_instruction("CODE", "ERR", &french, "PythagoreanTheorem"),
        ] {
            assert!(text.contains("Language for on-screen text and narration: fr."));
        }
    }

    #[test]
    fn blank_language_is_left_out() {
        let blank = GenerationOptions {
            language: "  ".to_string(),
            ..options(false)
        };
        assert!(!enhancer_instruction(&blank).contains("Target language"));
        assert!(!generation_system(&blank).contains("LANGUAGE:"));
    }

    #[test]
    fn fix_instruction_embeds_code_and_error() {
        let text = fix_instruction("CODE", "ERR", &options(false), "PythagoreanTheorem");
        assert!(text.contains("CODE"));
        assert!(text.contains("ERR"));
        assert!(text.contains("`PythagoreanTheorem`"));
    }

    #[test]
    fn remediation_instruction_lists_issues() {
        let issue = ValidationIssue {
            kind: IssueKind::Error,
            line: 7,
            pattern: "camera.frame access".to_string(),
            issue: "no frame".to_string(),
            fix: "animate objects".to_string(),
            severity: Severity::Critical,
        };
        let text = remediation_instruction("x = 1", &[&issue]);
        assert!(text.contains("- line 7: [camera.frame access] no frame Fix: animate objects"));
        assert!(text.ends_with("x = 1"));
    }
}
