//! Rule evaluator. Pure logic, no I/O.

use std::sync::LazyLock;

use regex::Regex;

use super::rules::{
    LineGuard, LineRule, RequiredMarker, LEADING_INDENTATION_FIX, LEADING_INDENTATION_ISSUE,
    LINE_RULES, PATTERN_LEADING_INDENTATION, PATTERN_PLAY_WITHOUT_WAIT, PATTERN_VOICE_MISMATCH,
    PATTERN_VOICE_MISSING, PLAY_WITHOUT_WAIT_FIX, PLAY_WITHOUT_WAIT_ISSUE, REQUIRED_MARKERS,
    VOICE_MISSING_ISSUE,
};
use super::{IssueKind, Severity, ValidationIssue};

/// Line rules paired with their compiled regexes. Compiled once.
static COMPILED_LINE_RULES: LazyLock<Vec<(&'static LineRule, Regex)>> = LazyLock::new(|| {
    LINE_RULES
        .iter()
        .map(|rule| (rule, Regex::new(rule.regex).expect("valid regex")))
        .collect()
});

static COMPILED_MARKERS: LazyLock<Vec<(&'static RequiredMarker, Regex)>> = LazyLock::new(|| {
    REQUIRED_MARKERS
        .iter()
        .map(|marker| (marker, Regex::new(marker.regex).expect("valid regex")))
        .collect()
});

/// Construction of a speech-service object, e.g. `GTTSService(`.
static SPEECH_SERVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]\w*Service)\s*\(").expect("valid regex"));

static VOICE_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bvoice\s*=\s*["']([^"']*)["']"#).expect("valid regex"));

/// Scan a script against every rule.
///
/// When `expected_voice` is given, speech-service constructions must pass
/// exactly that voice. Issues are returned in source-line order, with
/// file-level issues (line 0) first; nothing is deduplicated.
pub fn validate(code: &str, expected_voice: Option<&str>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_leading_indentation(code, &mut issues);
    check_required_markers(code, &mut issues);

    for (idx, line) in code.lines().enumerate() {
        for (rule, regex) in COMPILED_LINE_RULES.iter() {
            evaluate_line_rule(rule, regex, idx + 1, line, &mut issues);
        }
    }

    check_play_followed_by_wait(code, &mut issues);

    if let Some(voice) = expected_voice {
        check_voice(code, voice, &mut issues);
    }

    issues.sort_by_key(|issue| issue.line);
    issues
}

fn issue(
    kind: IssueKind,
    severity: Severity,
    line: usize,
    pattern: &str,
    text: String,
    fix: &str,
) -> ValidationIssue {
    ValidationIssue {
        kind,
        line,
        pattern: pattern.to_string(),
        issue: text,
        fix: fix.to_string(),
        severity,
    }
}

fn evaluate_line_rule(
    rule: &LineRule,
    regex: &Regex,
    line_number: usize,
    line: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if rule.guard == LineGuard::ContainsBackslash && !line.contains('\\') {
        return;
    }

    let describe = |caps: &regex::Captures<'_>| {
        let matched = caps
            .get(1)
            .or_else(|| caps.get(0))
            .map_or("", |m| m.as_str());
        rule.issue.replace("{match}", matched)
    };

    if rule.per_occurrence {
        for caps in regex.captures_iter(line) {
            issues.push(issue(
                rule.kind,
                rule.severity,
                line_number,
                rule.pattern,
                describe(&caps),
                rule.fix,
            ));
        }
    } else if let Some(caps) = regex.captures(line) {
        issues.push(issue(
            rule.kind,
            rule.severity,
            line_number,
            rule.pattern,
            describe(&caps),
            rule.fix,
        ));
    }
}

fn check_leading_indentation(code: &str, issues: &mut Vec<ValidationIssue>) {
    if code.starts_with([' ', '\t']) {
        issues.push(issue(
            IssueKind::Error,
            Severity::Critical,
            1,
            PATTERN_LEADING_INDENTATION,
            LEADING_INDENTATION_ISSUE.to_string(),
            LEADING_INDENTATION_FIX,
        ));
    }
}

fn check_required_markers(code: &str, issues: &mut Vec<ValidationIssue>) {
    for (marker, regex) in COMPILED_MARKERS.iter() {
        if !regex.is_match(code) {
            issues.push(issue(
                marker.kind,
                marker.severity,
                0,
                marker.pattern,
                marker.issue.to_string(),
                marker.fix,
            ));
        }
    }
}

/// Only the line directly after a `self.play(` line is inspected.
fn check_play_followed_by_wait(code: &str, issues: &mut Vec<ValidationIssue>) {
    let mut last_play: Option<usize> = None;

    for (idx, line) in code.lines().enumerate() {
        if let Some(play_idx) = last_play.take() {
            if play_idx + 1 == idx && !line.contains("wait(") {
                issues.push(issue(
                    IssueKind::Warning,
                    Severity::Low,
                    play_idx + 1,
                    PATTERN_PLAY_WITHOUT_WAIT,
                    PLAY_WITHOUT_WAIT_ISSUE.to_string(),
                    PLAY_WITHOUT_WAIT_FIX,
                ));
            }
        }
        if line.trim_start().starts_with("self.play(") {
            last_play = Some(idx);
        }
    }
}

fn check_voice(code: &str, expected: &str, issues: &mut Vec<ValidationIssue>) {
    for caps in SPEECH_SERVICE_RE.captures_iter(code) {
        let Some(whole) = caps.get(0) else { continue };
        let service = caps.get(1).map_or("", |m| m.as_str());
        let line_number = line_of_offset(code, whole.start());
        let call = call_arguments(code, whole.end() - 1);

        match VOICE_ARG_RE.captures(call).and_then(|c| c.get(1)) {
            Some(actual) if actual.as_str() == expected => {}
            Some(actual) => issues.push(issue(
                IssueKind::Error,
                Severity::High,
                line_number,
                PATTERN_VOICE_MISMATCH,
                format!(
                    "{service} uses voice \"{}\" but the job requested \"{expected}\"",
                    actual.as_str()
                ),
                &format!("Pass voice=\"{expected}\" to {service}"),
            )),
            None => issues.push(issue(
                IssueKind::Error,
                Severity::High,
                line_number,
                PATTERN_VOICE_MISSING,
                format!("{VOICE_MISSING_ISSUE} ({service})"),
                &format!("Pass voice=\"{expected}\" to {service}"),
            )),
        }
    }
}

/// 1-based line number containing the byte at `offset`.
fn line_of_offset(code: &str, offset: usize) -> usize {
    code[..offset].matches('\n').count() + 1
}

/// Text between the parenthesis at `open_idx` and its matching close, or
/// the rest of the file when unbalanced.
fn call_arguments(code: &str, open_idx: usize) -> &str {
    let mut depth = 0usize;
    for (offset, ch) in code[open_idx..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &code[open_idx..open_idx + offset + 1];
                }
            }
            _ => {}
        }
    }
    &code[open_idx..]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_analysis::rules::*;

    const CLEAN: &str = r#"from manim import *

class Demo(Scene):
    def construct(self):
        eq = MathTex(r"\frac{a}{b}")
        label = Tex(r"\textbf{Hi}")
        self.play(Write(eq))
        self.wait(1)
        self.play(LaggedStart(*[Create(m) for m in VGroup(eq, label)], lag_ratio=0.2))
        self.wait()
"#;

    fn patterns(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.pattern.as_str()).collect()
    }

    fn wrap(body: &str) -> String {
        format!("from manim import *\n\nclass Demo(Scene):\n    def construct(self):\n{body}")
    }

    // -- Whole-file behaviour --

    #[test]
    fn clean_script_has_no_issues() {
        assert_eq!(validate(CLEAN, None), Vec::new());
    }

    #[test]
    fn validation_is_idempotent() {
        let code = wrap("        self.play(Create(VGroup(a, b)))\n        t = Text(\"x^2\")\n");
        assert_eq!(validate(&code, Some("alloy")), validate(&code, Some("alloy")));
    }

    #[test]
    fn issues_are_in_line_order() {
        let code = wrap(
            "        self.play(Create(VGroup(a, b)))\n        self.wait()\n        eq = MathTex(\"\\frac{1}{2}\")\n",
        );
        let lines: Vec<usize> = validate(&code, None).iter().map(|i| i.line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }

    // -- Group literal --

    #[test]
    fn create_on_vgroup_is_critical() {
        let code = wrap("        self.play(Create(VGroup(a, b)))\n        self.wait()\n");
        let issues = validate(&code, None);
        let found = issues
            .iter()
            .find(|i| i.pattern == PATTERN_CREATE_ON_GROUP)
            .expect("group literal detected");
        assert_eq!(found.severity, Severity::Critical);
        assert_eq!(found.line, 5);
    }

    #[test]
    fn write_on_group_with_nested_calls_is_critical() {
        let code = wrap("        self.play(FadeIn(x), Write(Group(a, b)), run_time=2)\n        self.wait()\n");
        let issues = validate(&code, None);
        assert!(issues
            .iter()
            .any(|i| i.pattern == PATTERN_WRITE_ON_GROUP && i.is_critical()));
    }

    #[test]
    fn create_on_named_group_is_fine() {
        let code = wrap("        group = VGroup(a, b)\n        self.play(Create(group))\n        self.wait()\n");
        assert!(!patterns(&validate(&code, None)).contains(&PATTERN_CREATE_ON_GROUP));
    }

    // -- Raw strings --

    #[test]
    fn mathtex_without_raw_prefix_is_high() {
        let code = wrap("        eq = MathTex(\"\\frac{1}{2}\")\n");
        let issues = validate(&code, None);
        let found = issues
            .iter()
            .find(|i| i.pattern == PATTERN_MATHTEX_WITHOUT_RAW)
            .expect("missing raw prefix detected");
        assert_eq!(found.severity, Severity::High);
        assert_eq!(found.line, 5);
    }

    #[test]
    fn tex_without_raw_prefix_is_high() {
        let code = wrap("        t = Tex('\\textbf{Hi}')\n");
        assert!(patterns(&validate(&code, None)).contains(&PATTERN_TEX_WITHOUT_RAW));
        assert!(!patterns(&validate(&code, None)).contains(&PATTERN_MATHTEX_WITHOUT_RAW));
    }

    #[test]
    fn raw_literals_produce_no_raw_string_issues() {
        let code = wrap("        a = MathTex(r\"\\sqrt{2}\")\n        b = Tex(r'\\emph{x}')\n");
        let issues = validate(&code, None);
        assert!(!issues.iter().any(|i| i.pattern.contains("without raw string")));
    }

    #[test]
    fn literal_without_backslash_is_not_flagged() {
        let code = wrap("        a = MathTex(\"x + y\")\n");
        assert!(validate(&code, None).is_empty());
    }

    // -- Structure --

    #[test]
    fn leading_indentation_on_first_line_is_critical() {
        let code = format!("  {}", CLEAN);
        let issues = validate(&code, None);
        let found = issues
            .iter()
            .find(|i| i.pattern == PATTERN_LEADING_INDENTATION)
            .expect("indentation detected");
        assert_eq!(found.line, 1);
        assert!(found.is_critical());
    }

    #[test]
    fn missing_import_class_and_construct_are_critical() {
        let issues = validate("x = 1\n", None);
        let names = patterns(&issues);
        assert!(names.contains(&PATTERN_MISSING_IMPORT));
        assert!(names.contains(&PATTERN_MISSING_SCENE_CLASS));
        assert!(names.contains(&PATTERN_MISSING_CONSTRUCT));
        assert!(issues.iter().all(|i| i.line == 0 && i.is_critical()));
    }

    #[test]
    fn voiceover_scene_counts_as_scene_class() {
        let code = CLEAN.replace("class Demo(Scene)", "class Demo(VoiceoverScene)");
        assert!(!patterns(&validate(&code, None)).contains(&PATTERN_MISSING_SCENE_CLASS));
    }

    #[test]
    fn camera_frame_is_critical() {
        let code = wrap("        self.camera.frame.animate.scale(2)\n");
        let issues = validate(&code, None);
        assert!(issues
            .iter()
            .any(|i| i.pattern == PATTERN_CAMERA_FRAME && i.is_critical()));
    }

    #[test]
    fn config_dictionary_is_high() {
        let code = "from manim import *\n\nclass Demo(Scene):\n    CONFIG = {\"color\": RED}\n    def construct(self):\n        pass\n";
        let issues = validate(code, None);
        let found = issues
            .iter()
            .find(|i| i.pattern == PATTERN_CONFIG_DICT)
            .expect("CONFIG detected");
        assert_eq!(found.severity, Severity::High);
        assert_eq!(found.line, 4);
    }

    // -- Charts --

    #[test]
    fn each_unsupported_chart_occurrence_is_reported() {
        let code = wrap("        a, b = PieChart(data), LineChart(data)\n        c = BarChart(values)\n");
        let charts: Vec<_> = validate(&code, None)
            .into_iter()
            .filter(|i| i.pattern == PATTERN_UNSUPPORTED_CHART)
            .collect();
        assert_eq!(charts.len(), 2);
        assert!(charts[0].issue.contains("PieChart"));
        assert!(charts[1].issue.contains("LineChart"));
        assert!(charts.iter().all(|i| i.severity == Severity::High));
    }

    // -- Warnings --

    #[test]
    fn math_in_plain_text_is_medium_warning() {
        let code = wrap("        t = Text(\"a^2 + b^2 = c^2\")\n");
        let found = validate(&code, None)
            .into_iter()
            .find(|i| i.pattern == PATTERN_MATH_IN_TEXT)
            .expect("math in Text detected");
        assert_eq!(found.kind, IssueKind::Warning);
        assert_eq!(found.severity, Severity::Medium);
    }

    #[test]
    fn math_inside_mathtex_is_not_a_text_warning() {
        let code = wrap("        t = MathTex(r\"a^2 \\times b\")\n");
        assert!(!patterns(&validate(&code, None)).contains(&PATTERN_MATH_IN_TEXT));
    }

    #[test]
    fn play_without_wait_checks_only_next_line() {
        let code = wrap(
            "        self.play(Create(a))\n        x = 1\n        self.wait()\n        self.play(Create(b))\n        self.wait(0.5)\n",
        );
        let found: Vec<_> = validate(&code, None)
            .into_iter()
            .filter(|i| i.pattern == PATTERN_PLAY_WITHOUT_WAIT)
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 5);
        assert_eq!(found[0].severity, Severity::Low);
        assert_eq!(found[0].kind, IssueKind::Warning);
    }

    // -- Voice --

    const VOICE_SCRIPT: &str = "from manim import *\nfrom manim_voiceover import VoiceoverScene\nfrom manim_voiceover.services.azure import AzureService\n\nclass Demo(VoiceoverScene):\n    def construct(self):\n        self.set_speech_service(AzureService(voice=\"en-US-GuyNeural\", style=\"newscast\"))\n";

    #[test]
    fn matching_voice_passes() {
        let issues = validate(VOICE_SCRIPT, Some("en-US-GuyNeural"));
        assert!(!patterns(&issues).contains(&PATTERN_VOICE_MISMATCH));
        assert!(!patterns(&issues).contains(&PATTERN_VOICE_MISSING));
    }

    #[test]
    fn mismatched_voice_reports_actual_value() {
        let issues = validate(VOICE_SCRIPT, Some("en-US-AriaNeural"));
        let found = issues
            .iter()
            .find(|i| i.pattern == PATTERN_VOICE_MISMATCH)
            .expect("mismatch detected");
        assert_eq!(found.severity, Severity::High);
        assert!(found.issue.contains("en-US-GuyNeural"));
        assert_eq!(found.line, 7);
    }

    #[test]
    fn missing_voice_argument_is_distinct() {
        let code = VOICE_SCRIPT.replace("voice=\"en-US-GuyNeural\", ", "");
        let issues = validate(&code, Some("en-US-AriaNeural"));
        assert!(patterns(&issues).contains(&PATTERN_VOICE_MISSING));
        assert!(!patterns(&issues).contains(&PATTERN_VOICE_MISMATCH));
    }

    #[test]
    fn voice_is_not_checked_without_expectation() {
        let issues = validate(VOICE_SCRIPT, None);
        assert!(!patterns(&issues).contains(&PATTERN_VOICE_MISMATCH));
    }

    #[test]
    fn every_line_rule_regex_compiles() {
        assert_eq!(COMPILED_LINE_RULES.len(), LINE_RULES.len());
        assert_eq!(COMPILED_MARKERS.len(), REQUIRED_MARKERS.len());
    }
}
