//! Risk aggregation over a finding set

use super::compliance::{ComplianceFramework, ComplianceMapper};
use super::detector::Finding;
use super::rules::RiskLevel;
use serde::{Deserialize, Serialize};

/// Overall risk and applicable compliance controls for a finding set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub overall_risk_level: RiskLevel,
    pub mapped_controls: Vec<ComplianceFramework>,
}

/// Reduces findings to an overall risk level and a control list.
///
/// The overall level is the maximum finding level (`Low` when there are
/// none). Controls are deduplicated and kept in order of first trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAggregator {
    mapper: ComplianceMapper,
}

impl RiskAggregator {
    pub fn new(mapper: ComplianceMapper) -> Self {
        Self { mapper }
    }

    pub fn aggregate(&self, findings: &[Finding]) -> RiskAssessment {
        let overall_risk_level = findings
            .iter()
            .map(|f| f.risk_level)
            .max()
            .unwrap_or_default();

        RiskAssessment {
            overall_risk_level,
            mapped_controls: self.mapper.map(findings.iter().map(|f| f.rule_id.as_str())),
        }
    }

    pub fn mapper(&self) -> &ComplianceMapper {
        &self.mapper
    }
}
