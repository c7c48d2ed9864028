//! Pattern registry: the compiled, immutable rule table
//!
//! Built once at startup from [`RuleDefinition`]s and shared by reference
//! (`Arc<PatternRegistry>`) with the detector and redactor. Construction
//! validates the whole table and fails with [`Error::Config`] on:
//! - a pattern that does not compile
//! - a duplicate rule id
//! - a replacement token outside the `[<MNEMONIC>_REDACTED]` shape
//! - a value-group rule without a capture group
//! - a replacement token that some rule's pattern would match again

use super::rules::{builtin_rules, Category, MaskStyle, RiskLevel, RuleDefinition};
use crate::config::DetectionConfig;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

/// Shape every replacement token must have
const TOKEN_SHAPE: &str = r"\[[A-Z][A-Z0-9_]*_REDACTED\]";

/// A compiled detection rule
#[derive(Debug)]
pub struct PatternRule {
    id: String,
    category: Category,
    matcher: Regex,
    replacement_token: String,
    risk_level: RiskLevel,
    mask: MaskStyle,
    /// Lowercased context keywords; empty when the rule is always active
    context_keywords: Vec<String>,
    value_group: bool,
    description: String,
}

impl PatternRule {
    fn compile(def: RuleDefinition) -> Result<Self> {
        let matcher = Regex::new(&def.pattern).map_err(|e| {
            Error::Config(format!(
                "Invalid regex pattern for rule '{}': {}",
                def.id, e
            ))
        })?;

        if def.value_group && matcher.captures_len() < 2 {
            return Err(Error::Config(format!(
                "Rule '{}' uses a value group but its pattern has no capture group",
                def.id
            )));
        }

        Ok(Self {
            id: def.id,
            category: def.category,
            matcher,
            replacement_token: def.replacement_token,
            risk_level: def.risk_level,
            mask: def.mask,
            context_keywords: def
                .context_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            value_group: def.value_group,
            description: def.description,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn replacement_token(&self) -> &str {
        &self.replacement_token
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn mask(&self) -> MaskStyle {
        self.mask
    }

    pub fn context_keywords(&self) -> &[String] {
        &self.context_keywords
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the rule only fires when a context keyword is present
    pub fn requires_context(&self) -> bool {
        !self.context_keywords.is_empty()
    }

    /// Check context activation against already-lowercased text.
    ///
    /// The whole text is searched, not a window around the match.
    pub fn context_satisfied(&self, lowered_text: &str) -> bool {
        !self.requires_context()
            || self
                .context_keywords
                .iter()
                .any(|k| lowered_text.contains(k.as_str()))
    }

    /// Byte ranges of the sensitive values this rule finds in `text`,
    /// non-overlapping and in text order.
    pub fn value_spans(&self, text: &str) -> Vec<Range<usize>> {
        if self.value_group {
            self.matcher
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect()
        } else {
            self.matcher
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect()
        }
    }
}

/// Immutable, process-wide rule table
#[derive(Debug)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
    reserved: Regex,
}

impl PatternRegistry {
    /// Compile and validate a rule table
    pub fn new(definitions: Vec<RuleDefinition>) -> Result<Self> {
        let reserved = Regex::new(TOKEN_SHAPE)
            .map_err(|e| Error::Config(format!("Invalid token shape pattern: {}", e)))?;

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(definitions.len());

        for def in definitions {
            if !seen.insert(def.id.clone()) {
                return Err(Error::Config(format!("Duplicate rule id '{}'", def.id)));
            }
            let well_formed = reserved
                .find(&def.replacement_token)
                .is_some_and(|m| m.as_str() == def.replacement_token);
            if !well_formed {
                return Err(Error::Config(format!(
                    "Rule '{}' has replacement token '{}'; expected [<NAME>_REDACTED]",
                    def.id, def.replacement_token
                )));
            }
            rules.push(PatternRule::compile(def)?);
        }

        // Redaction is only idempotent if no token is itself a match
        for rule in &rules {
            for other in &rules {
                if other.matcher.is_match(&rule.replacement_token) {
                    return Err(Error::Config(format!(
                        "Replacement token '{}' of rule '{}' is matched by rule '{}'",
                        rule.replacement_token, rule.id, other.id
                    )));
                }
            }
        }

        tracing::debug!(rules = rules.len(), "Pattern registry built");

        Ok(Self { rules, reserved })
    }

    /// Registry with the built-in rule table
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_rules())
    }

    /// Built-in rules minus disabled ids, followed by custom rules
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let mut definitions = builtin_rules();

        for id in &config.disabled_rules {
            if !definitions.iter().any(|d| &d.id == id) {
                return Err(Error::Config(format!(
                    "Cannot disable unknown rule '{}'",
                    id
                )));
            }
        }
        definitions.retain(|d| !config.disabled_rules.contains(&d.id));
        definitions.extend(config.custom_rules.iter().cloned());

        Self::new(definitions)
    }

    /// All rules in registry order
    pub fn all_rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Rules grouped by category, each group in registry order
    pub fn rules_by_category(&self) -> BTreeMap<Category, Vec<&PatternRule>> {
        let mut grouped: BTreeMap<Category, Vec<&PatternRule>> = BTreeMap::new();
        for rule in &self.rules {
            grouped.entry(rule.category).or_default().push(rule);
        }
        grouped
    }

    /// Byte ranges of reserved tokens already present in `text`
    pub fn token_ranges(&self, text: &str) -> Vec<Range<usize>> {
        self.reserved.find_iter(text).map(|m| m.range()).collect()
    }

    /// Lowercased text for context checks, with reserved tokens blanked.
    ///
    /// Tokens such as `[ACCOUNT_REDACTED]` must not activate context
    /// keywords, or redacting twice would not be a no-op.
    pub fn context_text(&self, text: &str) -> String {
        self.reserved.replace_all(text, " ").to_lowercase()
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
