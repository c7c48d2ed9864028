//! Declarative rule table for sensitive-data detection
//!
//! Every rule is plain data: an id, a category, a risk weight, the token
//! that replaces its matches, and an optional set of context keywords.
//! Patterns are compiled once by [`PatternRegistry`](super::PatternRegistry).

use serde::{Deserialize, Serialize};

/// Data category a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Personally identifiable information
    #[serde(rename = "PII")]
    Pii,
    /// Protected health information
    #[serde(rename = "PHI")]
    Phi,
    /// Payment and banking data
    Financial,
    /// Credentials, keys and tokens
    Secrets,
    /// Internal company information
    Corporate,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 5] = [
        Category::Pii,
        Category::Phi,
        Category::Financial,
        Category::Secrets,
        Category::Corporate,
    ];

    /// Stable label used in reports and rewrite requests
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pii => "PII",
            Self::Phi => "PHI",
            Self::Financial => "Financial",
            Self::Secrets => "Secrets",
            Self::Corporate => "Corporate",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pii" => Ok(Self::Pii),
            "phi" => Ok(Self::Phi),
            "financial" => Ok(Self::Financial),
            "secrets" => Ok(Self::Secrets),
            "corporate" => Ok(Self::Corporate),
            other => Err(format!(
                "unknown category: {}. Valid: pii, phi, financial, secrets, corporate",
                other
            )),
        }
    }
}

/// Risk level, totally ordered `Low < Medium < High < Critical`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// How a matched value is previewed in findings and audit records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStyle {
    /// `ab***@domain.tld`
    Email,
    /// `***-**-1234`
    Ssn,
    /// `***-***-1234`
    Phone,
    /// `****-****-****-1234`
    Card,
    /// first 10 and last 4 characters
    Key,
    /// first 3 and last 2 characters, or `***` when short
    #[default]
    Default,
}

/// A detection rule before compilation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Unique rule id
    pub id: String,
    /// Category of the data this rule detects
    pub category: Category,
    /// Regex pattern
    pub pattern: String,
    /// Fixed token that replaces every match, `[<MNEMONIC>_REDACTED]`
    pub replacement_token: String,
    /// Risk weight of a match
    pub risk_level: RiskLevel,
    /// Preview masking policy
    #[serde(default)]
    pub mask: MaskStyle,
    /// Keywords, one of which must appear somewhere in the text for the
    /// rule to fire. Empty means the rule is always active.
    #[serde(default)]
    pub context_keywords: Vec<String>,
    /// When set, only capture group 1 is the sensitive value
    #[serde(default)]
    pub value_group: bool,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl RuleDefinition {
    /// Create a rule definition with the default mask and no context
    pub fn new(
        id: impl Into<String>,
        category: Category,
        risk_level: RiskLevel,
        replacement_token: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            pattern: pattern.into(),
            replacement_token: replacement_token.into(),
            risk_level,
            mask: MaskStyle::Default,
            context_keywords: Vec::new(),
            value_group: false,
            description: String::new(),
        }
    }

    /// Set the preview masking policy
    pub fn mask(mut self, mask: MaskStyle) -> Self {
        self.mask = mask;
        self
    }

    /// Require one of `keywords` to appear in the text
    pub fn context(mut self, keywords: &[&str]) -> Self {
        self.context_keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Treat capture group 1 as the sensitive value
    pub fn value_group(mut self) -> Self {
        self.value_group = true;
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Built-in rule table, in registry order.
///
/// Container rules (private keys, connection strings) come first so the
/// values nested inside them are consumed whole.
pub fn builtin_rules() -> Vec<RuleDefinition> {
    use Category::*;
    use RiskLevel::*;

    vec![
        // ---- Containers ----
        RuleDefinition::new(
            "private_key",
            Secrets,
            Critical,
            "[PRIVATE_KEY_REDACTED]",
            r"-----BEGIN (?:[A-Z]+ )?PRIVATE KEY-----[\s\S]+?-----END (?:[A-Z]+ )?PRIVATE KEY-----",
        )
        .mask(MaskStyle::Key)
        .description("PEM private key block"),
        RuleDefinition::new(
            "connection_string",
            Secrets,
            Critical,
            "[CONNECTION_STRING_REDACTED]",
            r"\b(?:postgres(?:ql)?|mysql|mongodb(?:\+srv)?|redis|amqp)://[^\s:@/]+:[^\s@/]+@[^\s]+",
        )
        .mask(MaskStyle::Key)
        .description("Database URL with embedded credentials"),
        // ---- PII ----
        RuleDefinition::new(
            "email",
            Pii,
            Medium,
            "[EMAIL_REDACTED]",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        )
        .mask(MaskStyle::Email)
        .description("Email address"),
        RuleDefinition::new("ssn", Pii, Critical, "[SSN_REDACTED]", r"\b\d{3}-\d{2}-\d{4}\b")
            .mask(MaskStyle::Ssn)
            .description("US Social Security Number"),
        RuleDefinition::new(
            "phone",
            Pii,
            Medium,
            "[PHONE_REDACTED]",
            r"(?:\+1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
        )
        .mask(MaskStyle::Phone)
        .description("North American phone number"),
        RuleDefinition::new(
            "passport",
            Pii,
            High,
            "[PASSPORT_REDACTED]",
            r"\b[A-Z]{1,2}\d{6,9}\b",
        )
        .context(&["passport"])
        .description("Passport number"),
        RuleDefinition::new(
            "date_of_birth",
            Pii,
            Medium,
            "[DOB_REDACTED]",
            r"\b(?:(?:0?[1-9]|1[0-2])[/.-](?:0?[1-9]|[12]\d|3[01])[/.-](?:19|20)\d{2}|(?:19|20)\d{2}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01]))\b",
        )
        .context(&["born", "birth", "dob", "birthday"])
        .description("Date of birth"),
        RuleDefinition::new(
            "ip_address",
            Pii,
            Low,
            "[IP_REDACTED]",
            r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b",
        )
        .description("IPv4 address"),
        // ---- PHI ----
        RuleDefinition::new(
            "medical_record_number",
            Phi,
            High,
            "[MRN_REDACTED]",
            r"(?i)\b(?:MRN|medical\s+record(?:\s+(?:number|no\.?))?)\s*[#:]?\s*(\d{6,10})\b",
        )
        .value_group()
        .description("Medical record number"),
        RuleDefinition::new(
            "medicare_id",
            Phi,
            High,
            "[MEDICARE_ID_REDACTED]",
            r"\b[1-9][AC-HJKMNP-RT-Y][AC-HJKMNP-RT-Y0-9]\d[AC-HJKMNP-RT-Y][AC-HJKMNP-RT-Y0-9]\d[AC-HJKMNP-RT-Y]{2}\d{2}\b",
        )
        .description("Medicare beneficiary identifier"),
        RuleDefinition::new(
            "dea_number",
            Phi,
            High,
            "[DEA_REDACTED]",
            r"\b[ABFGMPRX][A-Z9]\d{7}\b",
        )
        .context(&["dea", "prescriber", "prescription", "rx"])
        .description("DEA prescriber registration number"),
        RuleDefinition::new(
            "npi",
            Phi,
            Medium,
            "[NPI_REDACTED]",
            r"(?i)\bNPI\s*(?:number|no\.?)?\s*[#:]?\s*(\d{10})\b",
        )
        .value_group()
        .description("National Provider Identifier"),
        // ---- Financial ----
        RuleDefinition::new(
            "credit_card",
            Financial,
            Critical,
            "[CARD_REDACTED]",
            r"\b(?:4\d{3}|5[1-5]\d{2}|2[2-7]\d{2}|6(?:011|5\d{2}))(?:[-\s]?\d{4}){3}\b|\b3[47]\d{2}[-\s]?\d{6}[-\s]?\d{5}\b",
        )
        .mask(MaskStyle::Card)
        .description("Payment card number"),
        RuleDefinition::new(
            "card_cvv",
            Financial,
            Critical,
            "[CVV_REDACTED]",
            r"(?i)\b(?:cvv2?|cvc2?|security\s+code)\s*[:#]?\s*(\d{3,4})\b",
        )
        .value_group()
        .description("Card verification value"),
        RuleDefinition::new(
            "iban",
            Financial,
            High,
            "[IBAN_REDACTED]",
            r"\b[A-Z]{2}\d{2}\s?[A-Z0-9]{4}\s?(?:\d{4}\s?){2,7}\d{1,4}\b",
        )
        .description("International bank account number"),
        RuleDefinition::new("routing_number", Financial, High, "[ROUTING_REDACTED]", r"\b\d{9}\b")
            .context(&["routing", "aba"])
            .description("ABA routing number"),
        RuleDefinition::new(
            "bank_account",
            Financial,
            High,
            "[ACCOUNT_REDACTED]",
            r"\b\d{8,17}\b",
        )
        .context(&["account", "bank", "checking", "savings", "wire"])
        .description("Bank account number"),
        // ---- Secrets ----
        RuleDefinition::new(
            "anthropic_api_key",
            Secrets,
            Critical,
            "[API_KEY_REDACTED]",
            r"\bsk-ant-[A-Za-z0-9_-]{20,}",
        )
        .mask(MaskStyle::Key)
        .description("Anthropic API key"),
        RuleDefinition::new(
            "openai_api_key",
            Secrets,
            Critical,
            "[API_KEY_REDACTED]",
            r"\bsk-(?:proj-)?[A-Za-z0-9]{20,}[A-Za-z0-9_-]*",
        )
        .mask(MaskStyle::Key)
        .description("OpenAI-style secret key"),
        RuleDefinition::new(
            "stripe_key",
            Secrets,
            Critical,
            "[API_KEY_REDACTED]",
            r"\b(?:sk|pk|rk)_(?:live|test)_[A-Za-z0-9]{16,}",
        )
        .mask(MaskStyle::Key)
        .description("Stripe API key"),
        RuleDefinition::new(
            "aws_access_key",
            Secrets,
            Critical,
            "[AWS_KEY_REDACTED]",
            r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b",
        )
        .mask(MaskStyle::Key)
        .description("AWS access key id"),
        RuleDefinition::new(
            "github_token",
            Secrets,
            Critical,
            "[GITHUB_TOKEN_REDACTED]",
            r"\b(?:gh[pousr]_[A-Za-z0-9]{36,}|github_pat_[A-Za-z0-9_]{22,})\b",
        )
        .mask(MaskStyle::Key)
        .description("GitHub token"),
        RuleDefinition::new(
            "slack_token",
            Secrets,
            Critical,
            "[SLACK_TOKEN_REDACTED]",
            r"\bxox[abposr]-[A-Za-z0-9-]{10,}",
        )
        .mask(MaskStyle::Key)
        .description("Slack token"),
        RuleDefinition::new(
            "google_api_key",
            Secrets,
            Critical,
            "[API_KEY_REDACTED]",
            r"\bAIza[0-9A-Za-z_-]{35}",
        )
        .mask(MaskStyle::Key)
        .description("Google API key"),
        RuleDefinition::new(
            "jwt",
            Secrets,
            High,
            "[JWT_REDACTED]",
            r"\beyJ[A-Za-z0-9_-]{8,}\.eyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}",
        )
        .mask(MaskStyle::Key)
        .description("JSON Web Token"),
        RuleDefinition::new(
            "password",
            Secrets,
            High,
            "[PASSWORD_REDACTED]",
            r"(?i)\b(?:password|passwd|passcode|pwd)\s*(?:is|[:=])\s*([^\s\[\]]*[^\s\[\].,;:!?])",
        )
        .value_group()
        .description("Password disclosed in prose"),
        // ---- Corporate ----
        RuleDefinition::new(
            "employee_id",
            Corporate,
            Medium,
            "[EMPLOYEE_ID_REDACTED]",
            r"\bEMP-?\d{5,8}\b",
        )
        .description("Employee identifier"),
        RuleDefinition::new(
            "internal_hostname",
            Corporate,
            Medium,
            "[INTERNAL_HOST_REDACTED]",
            r"\b[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)*\.(?:internal|corp|intranet|lan)\b",
        )
        .description("Internal hostname"),
        RuleDefinition::new(
            "project_codename",
            Corporate,
            Medium,
            "[PROJECT_REDACTED]",
            r"\b(?:[Pp]roject|[Oo]peration|[Cc]odename)\s+([A-Z][A-Za-z0-9]{2,})\b",
        )
        .value_group()
        .context(&["confidential", "internal", "nda", "unreleased", "secret"])
        .description("Confidential project codename"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
        assert_eq!(
            [RiskLevel::Medium, RiskLevel::Critical, RiskLevel::Low]
                .into_iter()
                .max(),
            Some(RiskLevel::Critical)
        );
    }

    #[test]
    fn test_risk_level_serde() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"CRITICAL\""
        );
        let level: RiskLevel = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(level, RiskLevel::Medium);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Pii.to_string(), "PII");
        assert_eq!(serde_json::to_string(&Category::Phi).unwrap(), "\"PHI\"");
        assert_eq!(
            serde_json::to_string(&Category::Financial).unwrap(),
            "\"Financial\""
        );
        assert_eq!("secrets".parse::<Category>().unwrap(), Category::Secrets);
        assert_eq!("PII".parse::<Category>().unwrap(), Category::Pii);
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn test_builtin_ids_unique() {
        let rules = builtin_rules();
        let ids: HashSet<_> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_builtin_covers_every_category() {
        let rules = builtin_rules();
        for category in Category::ALL {
            assert!(
                rules.iter().any(|r| r.category == category),
                "no rule for {}",
                category
            );
        }
    }

    #[test]
    fn test_builtin_patterns_compile() {
        for rule in builtin_rules() {
            assert!(
                regex::Regex::new(&rule.pattern).is_ok(),
                "rule '{}' has invalid pattern: {}",
                rule.id,
                rule.pattern
            );
        }
    }

    #[test]
    fn test_rule_definition_from_toml() {
        let rule: RuleDefinition = toml::from_str(
            r#"
            id = "ticket_ref"
            category = "Corporate"
            pattern = 'TCK-\d{6}'
            replacement_token = "[TICKET_REDACTED]"
            risk_level = "LOW"
            context_keywords = ["ticket"]
            "#,
        )
        .unwrap();
        assert_eq!(rule.id, "ticket_ref");
        assert_eq!(rule.mask, MaskStyle::Default);
        assert!(!rule.value_group);
        assert_eq!(rule.context_keywords, vec!["ticket"]);
    }
}
