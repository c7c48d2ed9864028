//! Sensitive-data detection against the pattern registry
//!
//! Rules are evaluated in registry order. For each rule:
//! 1. context-activated rules are skipped unless a keyword appears anywhere
//!    in the text outside reserved tokens (case-insensitive, checked once
//!    per rule per call)
//! 2. all non-overlapping matches are collected
//! 3. matches are deduplicated by their literal value within the rule
//!
//! Findings therefore describe distinct sensitive values, ordered by rule
//! and then by first occurrence.

use super::compliance::ComplianceFramework;
use super::masking::mask_value;
use super::registry::PatternRegistry;
use super::risk::RiskAggregator;
use super::rules::{Category, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Byte range into the scanned text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A distinct sensitive value found by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub category: Category,
    /// Always the owning rule's configured level
    pub risk_level: RiskLevel,
    /// Span of the first occurrence
    #[serde(rename = "matchedSpan")]
    pub span: Span,
    pub masked_preview: String,
}

impl Finding {
    /// The raw value in the text this finding was produced from
    pub fn raw<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.span.start..self.span.end)
    }
}

/// Result of a detection pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub flagged: bool,
    pub findings: Vec<Finding>,
    pub overall_risk_level: RiskLevel,
    /// Distinct categories in order of first finding
    pub detected_categories: Vec<Category>,
    pub mapped_controls: Vec<ComplianceFramework>,
}

impl DetectionResult {
    /// The "not flagged, LOW risk" result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ids of the rules that produced findings, in finding order
    pub fn rule_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for f in &self.findings {
            if !ids.contains(&f.rule_id.as_str()) {
                ids.push(&f.rule_id);
            }
        }
        ids
    }
}

/// Scans text against a shared pattern registry
#[derive(Debug, Clone)]
pub struct Detector {
    registry: Arc<PatternRegistry>,
    aggregator: RiskAggregator,
}

impl Detector {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self::with_aggregator(registry, RiskAggregator::default())
    }

    pub fn with_aggregator(registry: Arc<PatternRegistry>, aggregator: RiskAggregator) -> Self {
        Self {
            registry,
            aggregator,
        }
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Scan `text` and build a detection result
    pub fn detect(&self, text: &str) -> DetectionResult {
        if text.is_empty() {
            return DetectionResult::empty();
        }

        let lowered = self.registry.context_text(text);
        let mut findings = Vec::new();

        for rule in self.registry.all_rules() {
            if !rule.context_satisfied(&lowered) {
                continue;
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for range in rule.value_spans(text) {
                let value = &text[range.clone()];
                if !seen.insert(value) {
                    continue;
                }
                findings.push(Finding {
                    rule_id: rule.id().to_string(),
                    category: rule.category(),
                    risk_level: rule.risk_level(),
                    span: Span {
                        start: range.start,
                        end: range.end,
                    },
                    masked_preview: mask_value(value, rule.mask()),
                });
            }

            if !seen.is_empty() {
                tracing::debug!(rule = rule.id(), hits = seen.len(), "Rule matched");
            }
        }

        let mut detected_categories = Vec::new();
        for f in &findings {
            if !detected_categories.contains(&f.category) {
                detected_categories.push(f.category);
            }
        }

        let assessment = self.aggregator.aggregate(&findings);

        DetectionResult {
            flagged: !findings.is_empty(),
            findings,
            overall_risk_level: assessment.overall_risk_level,
            detected_categories,
            mapped_controls: assessment.mapped_controls,
        }
    }

    /// Scan possibly-absent input; absence yields the empty result
    pub fn detect_optional(&self, text: Option<&str>) -> DetectionResult {
        text.map(|t| self.detect(t)).unwrap_or_default()
    }
}
