//! Cleanup and light structural check for generated program text.
//!
//! This runs on every generator response before the full static analysis
//! pass. It only answers "does this look like a complete scene script?"; the
//! rule table in [`crate::static_analysis`] does the detailed work.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum length in characters for a plausible scene script.
pub const MIN_CODE_LENGTH: usize = 100;

/// Import every script needs.
pub const REQUIRED_IMPORT: &str = "from manim import";

/// Import needed by scripts that narrate through a speech service.
pub const VOICEOVER_IMPORT: &str = "manim_voiceover";

/// First fenced block, with an optional language tag.
static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("valid regex")
});

/// Opening fence line of an unterminated block.
static OPEN_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid regex"));

static CLASS_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*class\s+\w+\s*\([^)]*Scene[^)]*\)\s*:").expect("valid regex")
});

static CONSTRUCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"def\s+construct\s*\(\s*self").expect("valid regex"));

/// Remove markdown code-fence wrapping from a model response.
///
/// Takes the contents of the first fenced block when one exists. Leading
/// blank lines and trailing whitespace are dropped; indentation on the first
/// non-blank line is preserved so it can still be diagnosed.
pub fn strip_code_fences(text: &str) -> String {
    let inner = if let Some(caps) = FENCED_BLOCK_RE.captures(text) {
        caps.get(1).map_or("", |m| m.as_str()).to_string()
    } else {
        let trimmed = text.trim_start_matches(['\n', '\r']);
        let without_open = OPEN_FENCE_RE.replace(trimmed, "");
        without_open.trim_end().trim_end_matches("```").to_string()
    };
    strip_blank_edges(&inner)
}

fn strip_blank_edges(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines.join("\n").trim_end().to_string()
}

/// Result of [`clean_generated_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedCode {
    pub code: String,
    pub is_valid: bool,
    /// Human-readable reasons the check failed; empty when valid.
    pub problems: Vec<String>,
}

/// Strip fences and run the light structural check.
pub fn clean_generated_code(raw: &str, voiceover: bool) -> CleanedCode {
    let code = strip_code_fences(raw);
    let mut problems = Vec::new();

    if code.chars().count() < MIN_CODE_LENGTH {
        problems.push(format!(
            "script is shorter than {MIN_CODE_LENGTH} characters"
        ));
    }
    if !code.contains(REQUIRED_IMPORT) {
        problems.push(format!("missing `{REQUIRED_IMPORT} *`"));
    }
    if voiceover && !code.contains(VOICEOVER_IMPORT) {
        problems.push(format!("missing `{VOICEOVER_IMPORT}` import"));
    }
    if !CLASS_DECL_RE.is_match(&code) {
        problems.push("no Scene subclass declared".to_string());
    }
    if !CONSTRUCT_RE.is_match(&code) {
        problems.push("no construct(self) method".to_string());
    }

    CleanedCode {
        is_valid: problems.is_empty(),
        code,
        problems,
    }
}
