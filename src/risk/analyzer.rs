//! Static risk classification of SQL statements
//!
//! The analyzer never parses SQL fully; it scans statement shapes the
//! generator emits. Anything it does not recognize is rated medium rather
//! than silently low.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sync::script::{ScriptSide, SyncScript};

/// Risk buckets, ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// One destructive statement found during the scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructiveOperation {
    pub statement: String,
    pub action: String,
    pub object: Option<String>,
}

/// Outcome of scanning a statement list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskReport {
    pub level: RiskLevel,
    pub destructive_operations: Vec<DestructiveOperation>,
    pub affected_objects: Vec<String>,
    pub requires_acknowledgement: bool,
}

struct Pattern {
    regex: Regex,
    action: &'static str,
}

fn pattern(expr: &str, action: &'static str) -> Pattern {
    Pattern {
        // Patterns are static; a failure here is a programming error.
        regex: Regex::new(expr).unwrap(),
        action,
    }
}

static HIGH_RISK: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        pattern(
            r"(?i)\bdrop\s+table\s+(?:if\s+exists\s+)?([`\w.]+)",
            "DROP TABLE",
        ),
        pattern(
            r"(?i)\bdrop\s+(?:database|schema)\s+(?:if\s+exists\s+)?([`\w.]+)",
            "DROP DATABASE",
        ),
        pattern(r"(?i)\bdrop\s+column\s+([`\w]+)", "DROP COLUMN"),
        pattern(r"(?i)\btruncate\s+(?:table\s+)?([`\w.]+)", "TRUNCATE"),
    ]
});

static MEDIUM_RISK: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        pattern(
            r"(?i)\bdrop\s+(?:index|view|trigger|procedure|function|partition|check|foreign\s+key|primary\s+key)\b(?:\s+(?:if\s+exists\s+)?([`\w.]+))?",
            "DROP",
        ),
        pattern(r"(?i)\bmodify\s+column\s+([`\w]+)", "MODIFY COLUMN"),
        pattern(r"(?i)\bchange\s+column\s+([`\w]+)", "CHANGE COLUMN"),
        pattern(r"(?i)\brename\s+(?:table\s+)?([`\w.]+)", "RENAME"),
        pattern(r"(?i)\bpartition\s+by\b", "PARTITION BY"),
    ]
});

static LOW_RISK: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^\s*create\b").unwrap(),
        Regex::new(r"(?i)^\s*alter\s+table\s+[`\w.]+\s+add\b").unwrap(),
        Regex::new(r"(?i)^\s*set\b").unwrap(),
    ]
});

/// True for comment-only statements, which the executor skips
pub fn is_comment(statement: &str) -> bool {
    let trimmed = statement.trim();
    trimmed.is_empty() || trimmed.starts_with("--") || trimmed.starts_with("/*")
}

#[derive(Debug, Default)]
pub struct RiskAnalyzer;

impl RiskAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Scan a statement list and aggregate the worst finding
    pub fn analyze(&self, statements: &[String]) -> RiskReport {
        let mut report = RiskReport::default();

        for statement in statements {
            if is_comment(statement) {
                continue;
            }

            if let Some((action, object)) = match_patterns(&HIGH_RISK, statement) {
                report.level = report.level.max(RiskLevel::High);
                record(&mut report, statement, action, object);
                continue;
            }
            if let Some((action, object)) = match_patterns(&MEDIUM_RISK, statement) {
                report.level = report.level.max(RiskLevel::Medium);
                record(&mut report, statement, action, object);
                continue;
            }
            if LOW_RISK.iter().any(|p| p.is_match(statement)) {
                continue;
            }
            // Unrecognized shape: conservative default
            report.level = report.level.max(RiskLevel::Medium);
        }

        report.requires_acknowledgement = report.level == RiskLevel::High;
        report
    }

    pub fn analyze_script(&self, script: &SyncScript, side: ScriptSide) -> RiskReport {
        self.analyze(script.statements(side))
    }
}

fn match_patterns(patterns: &[Pattern], statement: &str) -> Option<(&'static str, Option<String>)> {
    for pattern in patterns {
        if let Some(captures) = pattern.regex.captures(statement) {
            let object = captures
                .get(1)
                .map(|m| m.as_str().replace('`', "").trim().to_string());
            return Some((pattern.action, object));
        }
    }
    None
}

fn record(report: &mut RiskReport, statement: &str, action: &'static str, object: Option<String>) {
    if let Some(object) = &object {
        if !report.affected_objects.contains(object) {
            report.affected_objects.push(object.clone());
        }
    }
    report.destructive_operations.push(DestructiveOperation {
        statement: statement.to_string(),
        action: action.to_string(),
        object,
    });
}
