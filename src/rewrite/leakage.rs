//! Post-hoc leakage check on remote rewrite output
//!
//! The remote service never sees raw values, but its output is still checked
//! before it is trusted. An original raw value is considered leaked when:
//! - re-detection of the output finds it again under its original category
//! - it appears verbatim, ignoring case
//! - its base64 encoding appears
//!
//! The same check runs on the locally redacted text before anything is
//! sent, and [`scrub_leaks`] removes whatever it finds there.

use crate::privacy::{Category, Detector, Finding, PatternRegistry, Span};
use base64::Engine;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// How a raw value resurfaced in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakVector {
    /// Detected again with its original category
    Redetected,
    /// Present verbatim (case-insensitive)
    Verbatim,
    /// Present base64-encoded
    Base64,
}

impl std::fmt::Display for LeakVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redetected => write!(f, "redetected"),
            Self::Verbatim => write!(f, "verbatim"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// One original finding that leaked into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakMatch {
    pub rule_id: String,
    pub category: Category,
    pub vector: LeakVector,
    /// Span of the raw value in the source text
    pub span: Span,
}

impl std::fmt::Display for LeakMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) {}", self.rule_id, self.category, self.vector)
    }
}

/// Check `output` for raw values of `findings`, which were produced from
/// `source`. Returns one entry per leaked finding.
pub fn find_leaks(
    detector: &Detector,
    source: &str,
    findings: &[Finding],
    output: &str,
) -> Vec<LeakMatch> {
    if findings.is_empty() || output.is_empty() {
        return Vec::new();
    }

    let redetected = detector.detect(output);
    // Reserved tokens are blanked so a value like "redacted" is not found
    // inside [PASSWORD_REDACTED]
    let lowered_output = detector.registry().context_text(output);
    let mut leaks = Vec::new();

    for finding in findings {
        let Some(raw) = finding.raw(source) else {
            continue;
        };

        let vector = if redetected
            .findings
            .iter()
            .any(|f| f.category == finding.category && f.raw(output) == Some(raw))
        {
            Some(LeakVector::Redetected)
        } else if lowered_output.contains(&raw.to_lowercase()) {
            Some(LeakVector::Verbatim)
        } else if contains_base64(output, raw) {
            Some(LeakVector::Base64)
        } else {
            None
        };

        if let Some(vector) = vector {
            leaks.push(LeakMatch {
                rule_id: finding.rule_id.clone(),
                category: finding.category,
                vector,
                span: finding.span,
            });
        }
    }

    leaks
}

/// Replace every form of each leaked value in `text` with its rule's
/// token: case-insensitive literal matches and the unpadded base64
/// encoding. Reserved tokens already in `text` are left alone.
pub fn scrub_leaks(
    registry: &PatternRegistry,
    source: &str,
    leaks: &[LeakMatch],
    text: &str,
) -> String {
    let mut scrubbed = text.to_string();
    for leak in leaks {
        let Some(raw) = source.get(leak.span.start..leak.span.end) else {
            continue;
        };
        let Some(rule) = registry.get(&leak.rule_id) else {
            continue;
        };

        let literal = RegexBuilder::new(&regex::escape(raw))
            .case_insensitive(true)
            .build();
        let encoded = Regex::new(&regex::escape(&unpadded_base64(raw)));
        for matcher in [literal, encoded].into_iter().flatten() {
            scrubbed =
                replace_outside_tokens(registry, &scrubbed, &matcher, rule.replacement_token());
        }
    }
    scrubbed
}

fn replace_outside_tokens(
    registry: &PatternRegistry,
    text: &str,
    matcher: &Regex,
    token: &str,
) -> String {
    let tokens = registry.token_ranges(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for m in matcher.find_iter(text) {
        let span = m.range();
        let in_token = tokens.iter().any(|t| span.start < t.end && t.start < span.end);
        if span.is_empty() || in_token {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(token);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn unpadded_base64(raw: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_bytes());
    encoded.trim_end_matches('=').to_string()
}

fn contains_base64(output: &str, raw: &str) -> bool {
    let unpadded = unpadded_base64(raw);
    !unpadded.is_empty() && output.contains(&unpadded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::PatternRegistry;
    use std::sync::Arc;

    const SOURCE: &str = "My email is john.doe@company.com, SSN 123-45-6789";

    fn detector() -> Detector {
        Detector::new(Arc::new(PatternRegistry::builtin().unwrap()))
    }

    fn leaks_in(output: &str) -> Vec<LeakMatch> {
        let d = detector();
        let findings = d.detect(SOURCE).findings;
        find_leaks(&d, SOURCE, &findings, output)
    }

    #[test]
    fn test_clean_output() {
        assert!(leaks_in("Please contact me by email about my records.").is_empty());
    }

    #[test]
    fn test_redetected() {
        let leaks = leaks_in("Contact john.doe@company.com please");
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].rule_id, "email");
        assert_eq!(leaks[0].vector, LeakVector::Redetected);
    }

    #[test]
    fn test_verbatim_case_insensitive() {
        // re-detection compares exact values, so case changes fall through
        let leaks = leaks_in("Contact JOHN.DOE@COMPANY.COM please");
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].vector, LeakVector::Verbatim);

        let leaks = leaks_in("ssn:123-45-6789x");
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].rule_id, "ssn");
        assert_eq!(leaks[0].vector, LeakVector::Verbatim);
    }

    #[test]
    fn test_base64_encoded() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("123-45-6789");
        let leaks = leaks_in(&format!("Reference: {}", encoded));
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].vector, LeakVector::Base64);
    }

    #[test]
    fn test_other_values_of_same_category_are_not_leaks() {
        assert!(leaks_in("Write to support@example.org instead").is_empty());
    }

    #[test]
    fn test_leak_carries_source_span() {
        let leaks = leaks_in("ssn:123-45-6789x");
        let span = leaks[0].span;
        assert_eq!(&SOURCE[span.start..span.end], "123-45-6789");
    }

    #[test]
    fn test_scrub_removes_every_form() {
        let d = detector();
        let findings = d.detect(SOURCE).findings;
        let encoded = base64::engine::general_purpose::STANDARD.encode("123-45-6789");
        let encoded = encoded.trim_end_matches('=');
        let output = format!("Mail JOHN.DOE@company.com, ref {} [EMAIL_REDACTED]", encoded);

        let leaks = find_leaks(&d, SOURCE, &findings, &output);
        assert_eq!(leaks.len(), 2);
        let scrubbed = scrub_leaks(d.registry(), SOURCE, &leaks, &output);
        assert_eq!(
            scrubbed,
            "Mail [EMAIL_REDACTED], ref [SSN_REDACTED] [EMAIL_REDACTED]"
        );
        assert!(find_leaks(&d, SOURCE, &findings, &scrubbed).is_empty());
    }

    #[test]
    fn test_scrub_short_value_inside_number() {
        let d = detector();
        let source = "cvv: 123";
        let findings = d.detect(source).findings;
        let leaks = find_leaks(&d, source, &findings, "order 41234");
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].vector, LeakVector::Verbatim);
        assert_eq!(
            scrub_leaks(d.registry(), source, &leaks, "order 41234"),
            "order 4[CVV_REDACTED]4"
        );
    }

    #[test]
    fn test_value_inside_reserved_token_is_not_a_leak() {
        let d = detector();
        let source = "pwd: Redacted";
        let findings = d.detect(source).findings;
        assert_eq!(findings.len(), 1);
        assert!(find_leaks(&d, source, &findings, "pwd: [PASSWORD_REDACTED]").is_empty());
    }

    #[test]
    fn test_no_findings() {
        let d = detector();
        assert!(find_leaks(&d, "hello", &[], "hello").is_empty());
    }
}
