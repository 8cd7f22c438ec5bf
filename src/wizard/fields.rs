//! Field value rules for wizard steps.
//!
//! Validation is pure and total: a rule evaluated against a missing field
//! treats the value as empty rather than failing. Patterns mirror the
//! client-side validators — Korean mobile numbers in `010-XXXX-XXXX` form
//! and six-digit OTP/PIN codes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name to current string value, for one step.
pub type FieldMap = BTreeMap<String, String>;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^010-\d{4}-\d{4}$").expect("phone regex is valid"));

/// Check a formatted Korean mobile number (`010-XXXX-XXXX`).
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// Check a six-digit OTP or PIN code.
pub fn is_valid_code(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_digit())
}

/// Strip everything but digits, for submission to the backend.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Re-format raw input as `010-XXXX-XXXX` while typing.
///
/// Keeps at most eleven digits and inserts dashes at the group boundaries,
/// so partial input stays readable.
pub fn format_phone(raw: &str) -> String {
    let digits: String = digits_only(raw).chars().take(11).collect();
    match digits.len() {
        0..=3 => digits,
        4..=7 => format!("{}-{}", &digits[..3], &digits[3..]),
        _ => format!("{}-{}-{}", &digits[..3], &digits[3..7], &digits[7..]),
    }
}

/// Shape constraint applied to a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldPattern {
    /// Any non-structural text.
    #[default]
    Any,
    /// ASCII digits only.
    Digits,
    /// Korean mobile number, `010-XXXX-XXXX`.
    Phone,
    /// Six-digit OTP or PIN code.
    Code,
}

impl FieldPattern {
    fn matches(self, value: &str) -> bool {
        match self {
            FieldPattern::Any => true,
            FieldPattern::Digits => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            FieldPattern::Phone => is_valid_phone(value),
            FieldPattern::Code => is_valid_code(value),
        }
    }
}

/// Declarative validation rule for one field of a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field identifier, unique within the wizard.
    pub name: String,
    /// Whether the field must be non-empty for the step to be valid.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Shape constraint for non-empty values.
    #[serde(rename = "type", default)]
    pub pattern: FieldPattern,
    /// Minimum length after trimming, if any.
    #[serde(default)]
    pub min_length: Option<usize>,
    /// Maximum length after trimming, if any.
    #[serde(default)]
    pub max_length: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl FieldRule {
    pub fn new(name: impl Into<String>, pattern: FieldPattern) -> Self {
        Self {
            name: name.into(),
            required: true,
            pattern,
            min_length: None,
            max_length: None,
        }
    }

    /// Free-text rule that only requires a non-empty value.
    pub fn required_text(name: impl Into<String>) -> Self {
        Self::new(name, FieldPattern::Any)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Evaluate this rule against the step's current fields.
    ///
    /// Total over any map: a missing field is treated as empty.
    pub fn accepts(&self, fields: &FieldMap) -> bool {
        let value = fields.get(&self.name).map(String::as_str).unwrap_or("");
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return !self.required;
        }
        if !self.pattern.matches(trimmed) {
            return false;
        }
        if let Some(min) = self.min_length {
            if trimmed.len() < min {
                return false;
            }
        }
        if let Some(max) = self.max_length {
            if trimmed.len() > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_format() {
        assert!(is_valid_phone("010-1234-5678"));
        assert!(!is_valid_phone("01012345678"));
        assert!(!is_valid_phone("011-1234-5678"));
        assert!(!is_valid_phone("010-123-5678"));
    }

    #[test]
    fn test_code_is_six_digits() {
        assert!(is_valid_code("123456"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code("12345a"));
    }

    #[test]
    fn test_format_phone_inserts_dashes() {
        assert_eq!(format_phone("010"), "010");
        assert_eq!(format_phone("0101234"), "010-1234");
        assert_eq!(format_phone("01012345678"), "010-1234-5678");
        // Extra digits are dropped, non-digits stripped.
        assert_eq!(format_phone("010-1234-5678999"), "010-1234-5678");
        assert_eq!(format_phone("(010) 1234 5678"), "010-1234-5678");
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("010-1234-5678"), "01012345678");
    }

    #[test]
    fn test_rule_total_over_missing_fields() {
        let rule = FieldRule::new("phone", FieldPattern::Phone);
        let empty = FieldMap::new();
        // Missing field reads as empty, which a required rule rejects.
        assert!(!rule.accepts(&empty));
        assert!(rule.clone().optional().accepts(&empty));
    }

    #[test]
    fn test_rule_pattern_and_length() {
        let mut fields = FieldMap::new();
        fields.insert("pin".to_string(), "123456".to_string());

        let rule = FieldRule::new("pin", FieldPattern::Code);
        assert!(rule.accepts(&fields));

        fields.insert("pin".to_string(), "12345".to_string());
        assert!(!rule.accepts(&fields));

        let mut title = FieldRule::required_text("pin");
        title.max_length = Some(4);
        assert!(!title.accepts(&fields));
    }
}
