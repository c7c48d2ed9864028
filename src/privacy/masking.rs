//! Preview masking for findings and audit records
//!
//! Masked previews are for display only. Redacted text always carries the
//! rule's fixed replacement token instead.

use super::rules::MaskStyle;

const FULL_MASK: &str = "***";

/// Keys longer than this show their first ten and last four characters
const KEY_PREVIEW_MIN: usize = 14;

/// Mask a matched value according to its rule's style
pub fn mask_value(value: &str, style: MaskStyle) -> String {
    match style {
        MaskStyle::Email => mask_email(value),
        MaskStyle::Ssn => last_four_digits(value)
            .map(|d| format!("***-**-{}", d))
            .unwrap_or_else(|| FULL_MASK.to_string()),
        MaskStyle::Phone => last_four_digits(value)
            .map(|d| format!("***-***-{}", d))
            .unwrap_or_else(|| FULL_MASK.to_string()),
        MaskStyle::Card => last_four_digits(value)
            .map(|d| format!("****-****-****-{}", d))
            .unwrap_or_else(|| FULL_MASK.to_string()),
        MaskStyle::Key => mask_key(value),
        MaskStyle::Default => mask_default(value),
    }
}

fn mask_email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            let kept: String = local.chars().take(2).collect();
            format!("{}***@{}", kept, domain)
        }
        _ => mask_default(value),
    }
}

fn mask_key(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    // Short keys get the default policy
    if chars.len() <= KEY_PREVIEW_MIN {
        return mask_default(value);
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn mask_default(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 6 {
        return FULL_MASK.to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn last_four_digits(value: &str) -> Option<String> {
    let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    Some(digits[digits.len() - 4..].iter().collect())
}
