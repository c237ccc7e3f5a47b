//! Static analysis of generated scene scripts.
//!
//! Provides the issue types, the data-driven rule table, and a pure
//! validator. Nothing here performs I/O; the same input always yields the
//! same issue list.

pub mod rules;
pub mod validator;

use serde::Serialize;

pub use validator::validate;

/// Whether an issue is a likely runtime failure or a style hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
}

/// Confidence level controlling remediation. Only `Critical` triggers an
/// automatic fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// A single finding. `line` is 1-based; 0 means the issue concerns the file
/// as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub line: usize,
    pub pattern: String,
    pub issue: String,
    pub fix: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Critical-severity issues only.
pub fn critical_issues(issues: &[ValidationIssue]) -> Vec<&ValidationIssue> {
    issues.iter().filter(|i| i.is_critical()).collect()
}

/// Count issues per severity, in `Critical, High, Medium, Low` order.
pub fn severity_counts(issues: &[ValidationIssue]) -> [usize; 4] {
    let mut counts = [0; 4];
    for issue in issues {
        let slot = match issue.severity {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        };
        counts[slot] += 1;
    }
    counts
}
