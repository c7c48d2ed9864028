//! Host-facing analysis report
//!
//! Wraps a [`DetectionResult`] with an id, a timestamp and the metadata
//! block host integrations read (`detected_pii`, `risk_factors`, ...).

use super::compliance::ComplianceFramework;
use super::detector::DetectionResult;
use super::rules::{Category, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label reported in `metadata.detection_method`
pub const DETECTION_METHOD: &str = "pattern_registry";

/// Detection result plus reporting metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: DetectionResult,
    pub metadata: AnalysisMetadata,
}

/// Summary block consumed by host integrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub detection_method: String,
    pub detected_pii: Vec<Category>,
    pub risk_factors: Vec<String>,
    pub mapped_controls: Vec<ComplianceFramework>,
    pub auto_flagged: bool,
    /// Opaque caller label, passed through untouched
    pub platform_detected: String,
}

impl AnalysisReport {
    pub fn new(result: DetectionResult, platform: impl Into<String>) -> Self {
        let metadata = AnalysisMetadata {
            detection_method: DETECTION_METHOD.to_string(),
            detected_pii: result.detected_categories.clone(),
            risk_factors: risk_factors(&result),
            mapped_controls: result.mapped_controls.clone(),
            auto_flagged: result.flagged,
            platform_detected: platform.into(),
        };

        Self {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            result,
            metadata,
        }
    }
}

/// Human-readable risk factors for a detection result
pub fn risk_factors(result: &DetectionResult) -> Vec<String> {
    let mut factors = Vec::new();

    if !result.findings.is_empty() {
        factors.push("PII detected".to_string());
    }
    if result
        .findings
        .iter()
        .any(|f| f.category == Category::Secrets)
        || has_rule(result, &["password"])
    {
        factors.push("Credentials found".to_string());
    }
    if result.overall_risk_level == RiskLevel::Critical {
        factors.push("Critical sensitive data".to_string());
    }
    if has_rule(result, &["ssn", "credit_card"]) {
        factors.push("Regulated data".to_string());
    }

    factors
}

fn has_rule(result: &DetectionResult, ids: &[&str]) -> bool {
    result
        .findings
        .iter()
        .any(|f| ids.contains(&f.rule_id.as_str()))
}
