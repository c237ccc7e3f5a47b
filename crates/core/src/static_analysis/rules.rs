//! Rule table for the static validator.
//!
//! Adding a detection is a data change: append a row to [`LINE_RULES`] or
//! [`REQUIRED_MARKERS`]. Pattern names are public constants because the
//! remediator and the generation prompts refer to them.

use super::{IssueKind, Severity};

// ---------------------------------------------------------------------------
// Pattern names
// ---------------------------------------------------------------------------

pub const PATTERN_CREATE_ON_GROUP: &str = "Create on group literal";
pub const PATTERN_WRITE_ON_GROUP: &str = "Write on group literal";
pub const PATTERN_MATHTEX_WITHOUT_RAW: &str = "MathTex without raw string";
pub const PATTERN_TEX_WITHOUT_RAW: &str = "Tex without raw string";
pub const PATTERN_CAMERA_FRAME: &str = "camera.frame access";
pub const PATTERN_LEADING_INDENTATION: &str = "leading indentation";
pub const PATTERN_MISSING_IMPORT: &str = "missing manim import";
pub const PATTERN_CONFIG_DICT: &str = "removed CONFIG dictionary";
pub const PATTERN_UNSUPPORTED_CHART: &str = "unsupported chart class";
pub const PATTERN_MATH_IN_TEXT: &str = "math notation in Text";
pub const PATTERN_PLAY_WITHOUT_WAIT: &str = "play without wait";
pub const PATTERN_VOICE_MISMATCH: &str = "voice mismatch";
pub const PATTERN_VOICE_MISSING: &str = "missing voice parameter";
pub const PATTERN_MISSING_SCENE_CLASS: &str = "missing scene class";
pub const PATTERN_MISSING_CONSTRUCT: &str = "missing construct method";

/// Chart classes that do not exist in the targeted runtime.
pub const UNSUPPORTED_CHARTS: &[&str] = &[
    "PieChart",
    "LineChart",
    "ScatterPlot",
    "Histogram",
    "DonutChart",
];

/// The approved staggered-start replacements for animating a group literal.
pub const LAGGED_CREATE_SHAPE: &str = "LaggedStart(*[Create(m) for m in group], lag_ratio=0.2)";
pub const LAGGED_WRITE_SHAPE: &str = "LaggedStart(*[Write(m) for m in group], lag_ratio=0.2)";

// ---------------------------------------------------------------------------
// Line rules
// ---------------------------------------------------------------------------

/// Extra condition a line must meet before a rule's regex is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGuard {
    None,
    /// The line contains a literal backslash.
    ContainsBackslash,
}

/// A regex evaluated independently against every source line.
///
/// `issue` may contain `{match}`, replaced with the first capture group (or
/// the whole match when the regex has no group).
#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    pub pattern: &'static str,
    pub regex: &'static str,
    pub guard: LineGuard,
    /// Report every match on the line instead of at most one.
    pub per_occurrence: bool,
    pub kind: IssueKind,
    pub severity: Severity,
    pub issue: &'static str,
    pub fix: &'static str,
}

pub const LINE_RULES: &[LineRule] = &[
    LineRule {
        pattern: PATTERN_CREATE_ON_GROUP,
        regex: r"play\(.*\bCreate\(\s*V?Group\(",
        guard: LineGuard::None,
        per_occurrence: false,
        kind: IssueKind::Error,
        severity: Severity::Critical,
        issue: "Create() applied to a Group/VGroup literal built inside play(); the runtime rejects it",
        fix: "Use LaggedStart(*[Create(m) for m in group], lag_ratio=0.2) over the individual objects",
    },
    LineRule {
        pattern: PATTERN_WRITE_ON_GROUP,
        regex: r"play\(.*\bWrite\(\s*V?Group\(",
        guard: LineGuard::None,
        per_occurrence: false,
        kind: IssueKind::Error,
        severity: Severity::Critical,
        issue: "Write() applied to a Group/VGroup literal built inside play(); the runtime rejects it",
        fix: "Use LaggedStart(*[Write(m) for m in group], lag_ratio=0.2) over the individual objects",
    },
    LineRule {
        pattern: PATTERN_MATHTEX_WITHOUT_RAW,
        regex: r#"\bMathTex\(\s*["']"#,
        guard: LineGuard::ContainsBackslash,
        per_occurrence: false,
        kind: IssueKind::Error,
        severity: Severity::High,
        issue: "MathTex string with backslashes is not a raw string; escapes will be corrupted",
        fix: r#"Prefix the literal with r, e.g. MathTex(r"\frac{a}{b}")"#,
    },
    LineRule {
        pattern: PATTERN_TEX_WITHOUT_RAW,
        regex: r#"\bTex\(\s*["']"#,
        guard: LineGuard::ContainsBackslash,
        per_occurrence: false,
        kind: IssueKind::Error,
        severity: Severity::High,
        issue: "Tex string with backslashes is not a raw string; escapes will be corrupted",
        fix: r#"Prefix the literal with r, e.g. Tex(r"\textbf{Title}")"#,
    },
    LineRule {
        pattern: PATTERN_CAMERA_FRAME,
        regex: r"\bcamera\.frame\b",
        guard: LineGuard::None,
        per_occurrence: false,
        kind: IssueKind::Error,
        severity: Severity::Critical,
        issue: "self.camera.frame does not exist on a plain Scene",
        fix: "Animate the objects instead of the camera, or scale/shift a VGroup of the scene contents",
    },
    LineRule {
        pattern: PATTERN_CONFIG_DICT,
        regex: r"\bCONFIG\s*=\s*\{|\.CONFIG\b",
        guard: LineGuard::None,
        per_occurrence: false,
        kind: IssueKind::Error,
        severity: Severity::High,
        issue: "CONFIG class dictionaries were removed from the runtime",
        fix: "Pass settings as constructor keyword arguments or set attributes in construct()",
    },
    LineRule {
        pattern: PATTERN_UNSUPPORTED_CHART,
        regex: r"\b(PieChart|LineChart|ScatterPlot|Histogram|DonutChart)\s*\(",
        guard: LineGuard::None,
        per_occurrence: true,
        kind: IssueKind::Error,
        severity: Severity::High,
        issue: "{match} does not exist in the runtime",
        fix: "Compose the chart from Axes plus Line/Dot/Sector/Rectangle primitives",
    },
    LineRule {
        pattern: PATTERN_MATH_IN_TEXT,
        regex: r#"\bText\(\s*["'][^"']*(?:\^|\\frac|\\sqrt|×|±)"#,
        guard: LineGuard::None,
        per_occurrence: false,
        kind: IssueKind::Warning,
        severity: Severity::Medium,
        issue: "Text() literal contains mathematical notation",
        fix: r#"Use MathTex(r"...") for mathematical content"#,
    },
];

// ---------------------------------------------------------------------------
// Required markers
// ---------------------------------------------------------------------------

/// A regex that must match somewhere in the file; absence is the issue.
#[derive(Debug, Clone, Copy)]
pub struct RequiredMarker {
    pub pattern: &'static str,
    pub regex: &'static str,
    pub kind: IssueKind,
    pub severity: Severity,
    pub issue: &'static str,
    pub fix: &'static str,
}

pub const REQUIRED_MARKERS: &[RequiredMarker] = &[
    RequiredMarker {
        pattern: PATTERN_MISSING_IMPORT,
        regex: r"(?m)^\s*from\s+manim\s+import\b",
        kind: IssueKind::Error,
        severity: Severity::Critical,
        issue: "The mandatory `from manim import *` statement is missing",
        fix: "Add `from manim import *` as the first line",
    },
    RequiredMarker {
        pattern: PATTERN_MISSING_SCENE_CLASS,
        regex: r"(?m)^\s*class\s+\w+\s*\([^)]*Scene[^)]*\)\s*:",
        kind: IssueKind::Error,
        severity: Severity::Critical,
        issue: "No class extending Scene (or VoiceoverScene) is declared",
        fix: "Declare `class <SceneName>(Scene):` (VoiceoverScene when narrating)",
    },
    RequiredMarker {
        pattern: PATTERN_MISSING_CONSTRUCT,
        regex: r"def\s+construct\s*\(\s*self",
        kind: IssueKind::Error,
        severity: Severity::Critical,
        issue: "The scene has no construct(self) entry point",
        fix: "Define `def construct(self):` containing the animation",
    },
];

// ---------------------------------------------------------------------------
// Remaining rules (implemented in the validator)
// ---------------------------------------------------------------------------

pub const LEADING_INDENTATION_ISSUE: &str = "The first line is indented; the interpreter rejects unexpected indentation at module start";
pub const LEADING_INDENTATION_FIX: &str = "Remove the leading whitespace from line 1";

pub const PLAY_WITHOUT_WAIT_ISSUE: &str = "self.play() is not followed by self.wait(); timing may be ambiguous";
pub const PLAY_WITHOUT_WAIT_FIX: &str = "Add self.wait(...) after the animation";

pub const VOICE_MISSING_ISSUE: &str = "Speech service is constructed without a voice= argument";
