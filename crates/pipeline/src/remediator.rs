//! Conditional repair of critical static-analysis findings.
//!
//! Two tiers: deterministic line edits when every critical issue is on the
//! mechanical whitelist, otherwise a generative repair call. A mechanical
//! pass also fixes whitelisted findings of lower severity. Remediation never
//! fails; the worst case hands back the original code.

use std::sync::{Arc, LazyLock};

use framesmith_core::code_cleanup::strip_code_fences;
use framesmith_core::static_analysis::rules::{
    PATTERN_LEADING_INDENTATION, PATTERN_MATHTEX_WITHOUT_RAW, PATTERN_TEX_WITHOUT_RAW,
};
use framesmith_core::static_analysis::{critical_issues, ValidationIssue};
use framesmith_core::text_generation::TextGenerator;
use regex::Regex;

use crate::prompts;

/// Patterns fixable by line-level substitution.
pub const MECHANICAL_PATTERNS: &[&str] = &[
    PATTERN_MATHTEX_WITHOUT_RAW,
    PATTERN_TEX_WITHOUT_RAW,
    PATTERN_LEADING_INDENTATION,
];

static MATHTEX_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\bMathTex\(\s*)(["'])"#).expect("valid regex"));

static TEX_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\bTex\(\s*)(["'])"#).expect("valid regex"));

/// How a set of critical issues will be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    None,
    Mechanical,
    Generative,
}

/// Outcome of [`IssueRemediator::remediate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// No critical issues; the code is returned as given.
    Unchanged(String),
    /// Deterministic line edits were applied.
    Mechanical { code: String, lines: Vec<usize> },
    /// The service returned a repaired script.
    Generative(String),
    /// The repair call failed; the original code is kept.
    GenerativeFailed { code: String, reason: String },
}

impl Remediation {
    pub fn into_code(self) -> String {
        match self {
            Remediation::Unchanged(code)
            | Remediation::Mechanical { code, .. }
            | Remediation::Generative(code)
            | Remediation::GenerativeFailed { code, .. } => code,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Remediation::Unchanged(_) => "unchanged",
            Remediation::Mechanical { .. } => "mechanical",
            Remediation::Generative(_) => "generative",
            Remediation::GenerativeFailed { .. } => "generative_failed",
        }
    }
}

/// Pick a strategy for the critical subset of `issues`.
pub fn choose_strategy(issues: &[ValidationIssue]) -> Strategy {
    let critical = critical_issues(issues);
    if critical.is_empty() {
        Strategy::None
    } else if critical
        .iter()
        .all(|i| MECHANICAL_PATTERNS.contains(&i.pattern.as_str()))
    {
        Strategy::Mechanical
    } else {
        Strategy::Generative
    }
}

/// Every issue on the mechanical whitelist, whatever its severity.
pub fn mechanical_targets(issues: &[ValidationIssue]) -> Vec<&ValidationIssue> {
    issues
        .iter()
        .filter(|i| MECHANICAL_PATTERNS.contains(&i.pattern.as_str()))
        .collect()
}

/// Apply line-addressed substitutions for whitelisted issues.
///
/// Only the reported lines are touched. Issues outside the whitelist, or with
/// a line number past the end of the code, are ignored. Returns the new code
/// and the 1-based lines that changed.
pub fn apply_mechanical_fixes(code: &str, issues: &[&ValidationIssue]) -> (String, Vec<usize>) {
    let mut lines: Vec<String> = code.split('\n').map(str::to_string).collect();
    let mut changed = Vec::new();

    for issue in issues {
        let Some(index) = issue.line.checked_sub(1) else {
            continue;
        };
        let Some(line) = lines.get_mut(index) else {
            continue;
        };

        let fixed = match issue.pattern.as_str() {
            p if p == PATTERN_MATHTEX_WITHOUT_RAW => {
                insert_raw_marker(&MATHTEX_LITERAL_RE, line.as_str())
            }
            p if p == PATTERN_TEX_WITHOUT_RAW => insert_raw_marker(&TEX_LITERAL_RE, line.as_str()),
            p if p == PATTERN_LEADING_INDENTATION => line.trim_start().to_string(),
            _ => continue,
        };

        if fixed != *line {
            *line = fixed;
            if !changed.contains(&issue.line) {
                changed.push(issue.line);
            }
        }
    }

    (lines.join("\n"), changed)
}

fn insert_raw_marker(regex: &Regex, line: &str) -> String {
    regex.replace_all(line, "${1}r${2}").into_owned()
}

pub struct IssueRemediator {
    text: Arc<dyn TextGenerator>,
}

impl IssueRemediator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    pub async fn remediate(&self, code: &str, issues: &[ValidationIssue]) -> Remediation {
        let critical = critical_issues(issues);

        match choose_strategy(issues) {
            Strategy::None => Remediation::Unchanged(code.to_string()),
            Strategy::Mechanical => {
                let (code, lines) = apply_mechanical_fixes(code, &mechanical_targets(issues));
                tracing::info!(lines = ?lines, "Applied mechanical fixes");
                Remediation::Mechanical { code, lines }
            }
            Strategy::Generative => {
                let instruction = prompts::remediation_instruction(code, &critical);
                match self
                    .text
                    .complete(prompts::REMEDIATION_SYSTEM, &instruction)
                    .await
                {
                    Ok(raw) => {
                        let repaired = strip_code_fences(&raw);
                        if repaired.trim().is_empty() {
                            return generative_failed(code, "repair returned no code".to_string());
                        }
                        tracing::info!(issues = critical.len(), "Applied generative repair");
                        Remediation::Generative(repaired)
                    }
                    Err(e) => generative_failed(code, e.to_string()),
                }
            }
        }
    }
}

fn generative_failed(code: &str, reason: String) -> Remediation {
    tracing::warn!(error = %reason, "Generative repair failed, keeping original code");
    Remediation::GenerativeFailed {
        code: code.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesmith_core::static_analysis::rules::PATTERN_CREATE_ON_GROUP;
    use framesmith_core::static_analysis::{IssueKind, Severity};

    fn issue(line: usize, pattern: &str, severity: Severity) -> ValidationIssue {
        ValidationIssue {
            kind: IssueKind::Error,
            line,
            pattern: pattern.to_string(),
            issue: String::new(),
            fix: String::new(),
            severity,
        }
    }

    // -- Strategy --

    #[test]
    fn no_critical_issues_means_no_strategy() {
        let issues = vec![issue(3, PATTERN_MATHTEX_WITHOUT_RAW, Severity::High)];
        assert_eq!(choose_strategy(&issues), Strategy::None);
        assert_eq!(choose_strategy(&[]), Strategy::None);
    }

    #[test]
    fn whitelisted_critical_issues_are_mechanical() {
        let issues = vec![
            issue(1, PATTERN_LEADING_INDENTATION, Severity::Critical),
            issue(4, PATTERN_MATHTEX_WITHOUT_RAW, Severity::High),
        ];
        assert_eq!(choose_strategy(&issues), Strategy::Mechanical);
    }

    #[test]
    fn any_other_critical_issue_is_generative() {
        let issues = vec![
            issue(1, PATTERN_LEADING_INDENTATION, Severity::Critical),
            issue(6, PATTERN_CREATE_ON_GROUP, Severity::Critical),
        ];
        assert_eq!(choose_strategy(&issues), Strategy::Generative);
    }

    // -- Mechanical fixes --

    #[test]
    fn raw_marker_is_inserted_on_reported_line_only() {
        let code = "a = MathTex(\"\\frac{1}{2}\")\nb = MathTex(\"\\sqrt{2}\")";
        let found = issue(1, PATTERN_MATHTEX_WITHOUT_RAW, Severity::High);
        let (fixed, lines) = apply_mechanical_fixes(code, &[&found]);
        assert_eq!(fixed, "a = MathTex(r\"\\frac{1}{2}\")\nb = MathTex(\"\\sqrt{2}\")");
        assert_eq!(lines, vec![1]);
    }

    #[test]
    fn tex_fix_does_not_touch_mathtex() {
        let code = "t = Tex('\\emph{x}') + MathTex(\"\\pi\")";
        let found = issue(1, PATTERN_TEX_WITHOUT_RAW, Severity::High);
        let (fixed, _) = apply_mechanical_fixes(code, &[&found]);
        assert_eq!(fixed, "t = Tex(r'\\emph{x}') + MathTex(\"\\pi\")");
    }

    #[test]
    fn leading_indentation_is_stripped_from_first_line() {
        let code = "   from manim import *\n\nclass A(Scene):\n    pass\n";
        let found = issue(1, PATTERN_LEADING_INDENTATION, Severity::Critical);
        let (fixed, _) = apply_mechanical_fixes(code, &[&found]);
        assert_eq!(fixed, "from manim import *\n\nclass A(Scene):\n    pass\n");
    }

    #[test]
    fn out_of_range_lines_are_ignored() {
        let found = issue(99, PATTERN_LEADING_INDENTATION, Severity::Critical);
        let (fixed, lines) = apply_mechanical_fixes("x = 1", &[&found]);
        assert_eq!(fixed, "x = 1");
        assert!(lines.is_empty());
    }

    #[test]
    fn into_code_returns_carried_code() {
        let remediation = Remediation::GenerativeFailed {
            code: "orig".to_string(),
            reason: "down".to_string(),
        };
        assert_eq!(remediation.label(), "generative_failed");
        assert_eq!(remediation.into_code(), "orig");
    }
}
