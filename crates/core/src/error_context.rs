//! Render failure classification.
//!
//! Turns the renderer's error text and stderr into a diagnostic that is fed
//! back into the next generation attempt. Pure: no I/O, never empty.

use std::sync::LazyLock;

use regex::Regex;

use crate::static_analysis::rules::{LAGGED_CREATE_SHAPE, LAGGED_WRITE_SHAPE};

/// Filename the renderer's post-processing cleanup step runs under. Its
/// presence in stderr means the failure happened after the generated script
/// was rewritten, not in the script as generated.
pub const CLEANUP_SCRIPT_MARKER: &str = "fallback_fix.py";

static LINE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"line (\d+)").expect("valid regex"));

/// A failure category recognised in the error text.
struct ErrorPattern {
    label: &'static str,
    /// Lowercase substrings; any one selects the pattern.
    indicators: &'static [&'static str],
    hint: &'static str,
}

/// Evaluated in order; the first matching pattern wins.
const ERROR_PATTERNS: &[ErrorPattern] = &[
    ErrorPattern {
        label: "Indentation error",
        indicators: &["indentationerror", "unexpected indent"],
        hint: "Use four spaces per level consistently. The first line must start at column 0 \
               and every block under `class` and `def` must be indented exactly one level.",
    },
    ErrorPattern {
        label: "Syntax error",
        indicators: &["syntaxerror"],
        hint: "Check for unbalanced parentheses, brackets and quotes, missing colons after \
               `def`/`class`/`with`, and stray markdown fences left in the script.",
    },
    ErrorPattern {
        label: "Import error",
        indicators: &["importerror", "modulenotfounderror", "no module named"],
        hint: "Only import from `manim` and, for narrated scenes, the narration plugin. \
               Start the script with `from manim import *` and do not import other packages.",
    },
    ErrorPattern {
        label: "Undefined name",
        indicators: &["nameerror", "is not defined"],
        hint: "Every object must be created before it is animated or referenced. \
               Do not use classes that do not exist in the runtime; build them from primitives.",
    },
    ErrorPattern {
        label: "Invalid animation on a group literal",
        indicators: &["passed to scene.play"],
        hint: "",
    },
];

/// Build the enriched diagnostic for a failed render.
pub fn enhance_error_context(error: &str, stderr: &str, attempt: u32) -> String {
    let mut message = if stderr.contains(CLEANUP_SCRIPT_MARKER) {
        cleanup_stage_message(error, stderr)
    } else {
        original_code_message(error, attempt)
    };

    if attempt > 1 {
        message.push_str(&format!(
            "\n\nThis is retry attempt {attempt}. Previous attempts failed; take a different, \
             simpler approach rather than repeating the same construction."
        ));
    }
    message
}

fn cleanup_stage_message(error: &str, stderr: &str) -> String {
    let mut message = String::from(
        "The failure happened in the renderer's post-processing cleanup step, \
         not necessarily in the code as generated.",
    );
    if let Some(line) = LINE_NUMBER_RE
        .captures(stderr)
        .and_then(|caps| caps.get(1))
    {
        message.push_str(&format!(" The cleanup step reported a problem at line {}.", line.as_str()));
    }
    if !error.trim().is_empty() {
        message.push_str(&format!("\nRenderer error: {}", error.trim()));
    }
    message.push_str(
        "\nGenerate code that is directly executable as written, with no leading \
         indentation, no markdown fences and no constructs that need rewriting before \
         they run.",
    );
    message
}

fn original_code_message(error: &str, attempt: u32) -> String {
    let mut message = format!(
        "The code generated in attempt {attempt} failed to render.\nRenderer error: {}",
        if error.trim().is_empty() { "(no error text)" } else { error.trim() },
    );

    let lowered = error.to_lowercase();
    let matched = ERROR_PATTERNS
        .iter()
        .find(|p| p.indicators.iter().any(|needle| lowered.contains(needle)));

    if let Some(pattern) = matched {
        message.push_str(&format!("\n\n{}: ", pattern.label));
        if pattern.hint.is_empty() {
            message.push_str(&group_literal_hint());
        } else {
            message.push_str(pattern.hint);
        }
    }
    message
}

fn group_literal_hint() -> String {
    format!(
        "Never pass Create(VGroup(...)) or Write(VGroup(...)) to self.play(). \
         Animate the members individually with one of:\n  self.play({LAGGED_CREATE_SHAPE})\n  \
         self.play({LAGGED_WRITE_SHAPE})"
    )
}

/// A speech-synthesis failure: a known exception type, or a speech service
/// named on the same line as, and before, failure context such as an error
/// word or an HTTP status.
static SPEECH_FAILURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\bgttserror\b|cancellationreason\.error|",
        r"(?:\b(?:azure|gtts|openai|elevenlabs|coqui|recorder)service\b",
        r"|\bgtts\b|\belevenlabs\b|text-to-speech|speech synthesis)",
        r"[^\n]*?\b(?:error|exception|failed|failure|timed out|timeout|unauthorized",
        r"|forbidden|quota|rate limit|too many requests|[45]\d{2})\b",
    ))
    .expect("valid regex")
});

/// Whether a failure came from speech synthesis rather than the scene
/// itself. Such jobs are retried with voiceover disabled.
pub fn is_voice_service_failure(error: &str, stderr: &str) -> bool {
    SPEECH_FAILURE_RE.is_match(error) || SPEECH_FAILURE_RE.is_match(stderr)
}
