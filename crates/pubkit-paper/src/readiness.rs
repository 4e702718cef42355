//! Submission readiness thresholds
//!
//! A paper is "ready" when its metrics meet every threshold. The defaults
//! match the venues the site submits to: at least 5000 words, four Mermaid
//! diagrams, one table, 8 to 12 keywords and a 150 to 250 word abstract.

use crate::metrics::PaperMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threshold configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessThresholds {
    pub min_words: usize,
    pub min_diagrams: usize,
    pub min_tables: usize,
    pub min_keywords: usize,
    pub max_keywords: usize,
    pub min_abstract_words: usize,
    pub max_abstract_words: usize,
}

impl Default for ReadinessThresholds {
    fn default() -> Self {
        Self {
            min_words: 5000,
            min_diagrams: 4,
            min_tables: 1,
            min_keywords: 8,
            max_keywords: 12,
            min_abstract_words: 150,
            max_abstract_words: 250,
        }
    }
}

/// Single threshold outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessCheck {
    pub name: String,
    pub actual: usize,
    pub expected: String,
    pub passed: bool,
}

/// Outcome of evaluating all thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub checks: Vec<ReadinessCheck>,
    pub ready: bool,
}

impl ReadinessReport {
    /// Checks that did not pass
    pub fn failures(&self) -> impl Iterator<Item = &ReadinessCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

impl fmt::Display for ReadinessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(
                f,
                "[{}] {:<16} {:>6}  (expected {})",
                if check.passed { "PASS" } else { "FAIL" },
                check.name,
                check.actual,
                check.expected
            )?;
        }
        write!(f, "ready: {}", if self.ready { "yes" } else { "no" })
    }
}

impl ReadinessThresholds {
    /// Evaluate metrics against the thresholds
    #[must_use]
    pub fn evaluate(&self, metrics: &PaperMetrics) -> ReadinessReport {
        let checks = vec![
            at_least("words", metrics.word_count, self.min_words),
            at_least("mermaid diagrams", metrics.mermaid_diagrams, self.min_diagrams),
            at_least("tables", metrics.tables, self.min_tables),
            between(
                "keywords",
                metrics.keyword_count,
                self.min_keywords,
                self.max_keywords,
            ),
            between(
                "abstract words",
                metrics.abstract_words,
                self.min_abstract_words,
                self.max_abstract_words,
            ),
        ];
        let ready = checks.iter().all(|c| c.passed);
        ReadinessReport { checks, ready }
    }
}

fn at_least(name: &str, actual: usize, min: usize) -> ReadinessCheck {
    ReadinessCheck {
        name: name.to_string(),
        actual,
        expected: format!(">= {min}"),
        passed: actual >= min,
    }
}

fn between(name: &str, actual: usize, min: usize, max: usize) -> ReadinessCheck {
    ReadinessCheck {
        name: name.to_string(),
        actual,
        expected: format!("{min}-{max}"),
        passed: (min..=max).contains(&actual),
    }
}
