//! Compliance mapping for detected sensitive data.
//!
//! Static, table-driven lookup from rule ids to regulatory frameworks:
//! - HIPAA (Health Insurance Portability and Accountability Act)
//! - PCI DSS (Payment Card Industry Data Security Standard)
//! - GDPR (General Data Protection Regulation)

use serde::{Deserialize, Serialize};

/// Compliance framework identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceFramework {
    /// HIPAA: Protected Health Information
    #[serde(rename = "HIPAA")]
    Hipaa,
    /// PCI DSS: Payment card data
    #[serde(rename = "PCI DSS")]
    PciDss,
    /// GDPR: EU personal data
    #[serde(rename = "GDPR")]
    Gdpr,
}

impl ComplianceFramework {
    /// Frameworks in table order
    pub const ALL: [ComplianceFramework; 3] = [Self::Hipaa, Self::PciDss, Self::Gdpr];

    /// Control identifier as reported in `mapped_controls`
    pub fn id(&self) -> &'static str {
        match self {
            Self::Hipaa => "HIPAA",
            Self::PciDss => "PCI DSS",
            Self::Gdpr => "GDPR",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hipaa => "HIPAA Privacy Rule",
            Self::PciDss => "PCI DSS v4.0",
            Self::Gdpr => "GDPR",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Hipaa => "Health Insurance Portability and Accountability Act - protected health information",
            Self::PciDss => "Payment Card Industry Data Security Standard - cardholder and account data",
            Self::Gdpr => "General Data Protection Regulation - EU personal data",
        }
    }

    /// Rule ids that trigger this framework
    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            Self::Hipaa => HIPAA_TRIGGERS,
            Self::PciDss => PCI_DSS_TRIGGERS,
            Self::Gdpr => GDPR_TRIGGERS,
        }
    }
}

impl std::fmt::Display for ComplianceFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

const HIPAA_TRIGGERS: &[&str] = &[
    "ssn",
    "medicare_id",
    "dea_number",
    "medical_record_number",
    "npi",
];

const PCI_DSS_TRIGGERS: &[&str] = &["credit_card", "bank_account", "card_cvv", "routing_number"];

const GDPR_TRIGGERS: &[&str] = &["email", "phone", "ip_address", "passport", "iban"];

/// Static lookup from rule ids to compliance frameworks
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceMapper;

impl ComplianceMapper {
    pub fn new() -> Self {
        Self
    }

    /// Frameworks triggered by a single rule, in table order
    pub fn frameworks_for(&self, rule_id: &str) -> Vec<ComplianceFramework> {
        ComplianceFramework::ALL
            .into_iter()
            .filter(|f| f.triggers().contains(&rule_id))
            .collect()
    }

    /// Frameworks triggered by a sequence of rule ids, without duplicates,
    /// in order of first trigger.
    pub fn map<'a, I>(&self, rule_ids: I) -> Vec<ComplianceFramework>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut controls = Vec::new();
        for id in rule_ids {
            for framework in self.frameworks_for(id) {
                if !controls.contains(&framework) {
                    controls.push(framework);
                }
            }
        }
        controls
    }

    /// All known frameworks
    pub fn frameworks(&self) -> &'static [ComplianceFramework] {
        &ComplianceFramework::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_display_and_serde() {
        assert_eq!(ComplianceFramework::PciDss.to_string(), "PCI DSS");
        assert_eq!(
            serde_json::to_string(&ComplianceFramework::Hipaa).unwrap(),
            "\"HIPAA\""
        );
        let f: ComplianceFramework = serde_json::from_str("\"PCI DSS\"").unwrap();
        assert_eq!(f, ComplianceFramework::PciDss);
    }

    #[test]
    fn test_frameworks_for() {
        let mapper = ComplianceMapper::new();
        assert_eq!(mapper.frameworks_for("ssn"), vec![ComplianceFramework::Hipaa]);
        assert_eq!(
            mapper.frameworks_for("credit_card"),
            vec![ComplianceFramework::PciDss]
        );
        assert_eq!(mapper.frameworks_for("email"), vec![ComplianceFramework::Gdpr]);
        assert!(mapper.frameworks_for("jwt").is_empty());
    }

    #[test]
    fn test_map_insertion_order_no_duplicates() {
        let mapper = ComplianceMapper::new();
        let controls = mapper.map(["email", "credit_card", "phone", "ssn", "bank_account"]);
        assert_eq!(
            controls,
            vec![
                ComplianceFramework::Gdpr,
                ComplianceFramework::PciDss,
                ComplianceFramework::Hipaa,
            ]
        );
    }

    #[test]
    fn test_triggers_name_builtin_rules() {
        let ids: Vec<String> = crate::privacy::rules::builtin_rules()
            .into_iter()
            .map(|r| r.id)
            .collect();
        for framework in ComplianceFramework::ALL {
            for trigger in framework.triggers() {
                assert!(
                    ids.iter().any(|id| id == trigger),
                    "{} trigger '{}' is not a rule",
                    framework,
                    trigger
                );
            }
        }
    }
}
