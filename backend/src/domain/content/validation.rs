//! Schema validation helpers shared by the content entity constructors.
//!
//! Constructors run every check and collect the failures into a
//! [`ValidationReport`] so callers see all field problems at once.

use std::fmt;

use crate::domain::slug::is_valid_slug;

/// Minimum length, in characters, of a title or name.
pub const TITLE_MIN: usize = 3;
/// Maximum length, in characters, of a title or name.
pub const TITLE_MAX: usize = 200;

/// Kind of constraint a field violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    TooShort { min: usize },
    TooLong { max: usize },
    InvalidSlug,
    InvalidFormat { expected: &'static str },
    Negative,
    TooMany { max: usize },
}

/// A single field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    field: String,
    kind: ViolationKind,
}

impl SchemaViolation {
    /// Build a violation for `field`.
    pub fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Shorthand for a missing required field.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, ViolationKind::Required)
    }

    /// Shorthand for a field exceeding `max` characters.
    pub fn too_long(field: impl Into<String>, max: usize) -> Self {
        Self::new(field, ViolationKind::TooLong { max })
    }

    /// Dotted path of the offending field.
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Violated constraint.
    pub fn kind(&self) -> &ViolationKind {
        &self.kind
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.kind {
            ViolationKind::Required => write!(f, "{field} is required"),
            ViolationKind::TooShort { min } => {
                write!(f, "{field} must be at least {min} characters")
            }
            ViolationKind::TooLong { max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            ViolationKind::InvalidSlug => write!(
                f,
                "{field} must contain lowercase ASCII letters, digits, and single hyphens"
            ),
            ViolationKind::InvalidFormat { expected } => {
                write!(f, "{field} must be {expected}")
            }
            ViolationKind::Negative => write!(f, "{field} must not be negative"),
            ViolationKind::TooMany { max } => {
                write!(f, "{field} must contain at most {max} entries")
            }
        }
    }
}

/// Every violation found while validating one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<SchemaViolation>,
}

impl ValidationReport {
    /// Record a violation.
    pub fn push(&mut self, violation: SchemaViolation) {
        self.violations.push(violation);
    }

    /// Violations in the order they were found.
    pub fn violations(&self) -> &[SchemaViolation] {
        self.violations.as_slice()
    }

    /// `true` when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// `true` when `field` has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Return `Ok(value)` when clean, otherwise the report itself.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Trim and check a required text field, recording violations.
    pub(crate) fn text(
        &mut self,
        field: &str,
        value: &str,
        min: usize,
        max: usize,
    ) -> String {
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        if length == 0 {
            self.push(SchemaViolation::required(field));
        } else if length < min {
            self.push(SchemaViolation::new(field, ViolationKind::TooShort { min }));
        } else if length > max {
            self.push(SchemaViolation::too_long(field, max));
        }
        trimmed.to_owned()
    }

    /// Check an optional text field; blank input collapses to `None`.
    pub(crate) fn optional_text(
        &mut self,
        field: &str,
        value: Option<String>,
        max: usize,
    ) -> Option<String> {
        let trimmed = value
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())?;
        if trimmed.chars().count() > max {
            self.push(SchemaViolation::too_long(field, max));
        }
        Some(trimmed)
    }

    /// Check a title-like field against [`TITLE_MIN`] and [`TITLE_MAX`].
    pub(crate) fn title(&mut self, field: &str, value: &str) -> String {
        self.text(field, value, TITLE_MIN, TITLE_MAX)
    }

    /// Check an explicit slug.
    pub(crate) fn slug(&mut self, field: &str, value: &str) {
        if !is_valid_slug(value) {
            self.push(SchemaViolation::new(field, ViolationKind::InvalidSlug));
        }
    }

    /// Trim list entries, drop blank ones, and check at most `max` remain.
    pub(crate) fn items(&mut self, field: &str, values: Vec<String>, max: usize) -> Vec<String> {
        let cleaned: Vec<String> = values
            .into_iter()
            .map(|item| item.trim().to_owned())
            .filter(|item| !item.is_empty())
            .collect();
        if cleaned.len() > max {
            self.push(SchemaViolation::new(field, ViolationKind::TooMany { max }));
        }
        cleaned
    }

    /// Like [`ValidationReport::items`], lowercasing each entry.
    pub(crate) fn tags(&mut self, field: &str, values: Vec<String>, max: usize) -> Vec<String> {
        let lowered = values.into_iter().map(|tag| tag.to_lowercase()).collect();
        self.items(field, lowered, max)
    }

    /// Check an optional monetary figure is finite and non-negative.
    pub(crate) fn amount(&mut self, field: &str, value: Option<f64>) -> Option<f64> {
        let amount = value?;
        if !amount.is_finite() {
            self.push(SchemaViolation::new(
                field,
                ViolationKind::InvalidFormat {
                    expected: "a finite number",
                },
            ));
        } else if amount < 0.0 {
            self.push(SchemaViolation::new(field, ViolationKind::Negative));
        }
        Some(amount)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("validation passed");
        }
        let messages: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "validation failed: {}", messages.join("; "))
    }
}

impl std::error::Error for ValidationReport {}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  Revenue Cycle Basics  ", true)]
    #[case("ab", false)]
    #[case("   ", false)]
    fn title_checks_trimmed_length(#[case] input: &str, #[case] ok: bool) {
        let mut report = ValidationReport::default();
        let value = report.title("title", input);
        assert_eq!(report.is_empty(), ok);
        assert_eq!(value, input.trim());
    }

    #[rstest]
    fn title_rejects_overlong_values() {
        let mut report = ValidationReport::default();
        report.title("title", &"x".repeat(TITLE_MAX + 1));
        assert!(matches!(
            report.violations().first().map(SchemaViolation::kind),
            Some(ViolationKind::TooLong { max: TITLE_MAX })
        ));
    }

    #[rstest]
    fn optional_text_collapses_blank_input() {
        let mut report = ValidationReport::default();
        assert_eq!(report.optional_text("excerpt", Some("  ".to_owned()), 10), None);
        assert!(report.is_empty());
    }

    #[rstest]
    fn amount_rejects_negative_figures() {
        let mut report = ValidationReport::default();
        report.amount("results.costSavings", Some(-1.0));
        assert!(report.has_field("results.costSavings"));
    }

    #[rstest]
    fn tags_are_lowercased_and_bounded() {
        let mut report = ValidationReport::default();
        let tags = report.tags("tags", vec![" RCM ".to_owned(), String::new()], 1);
        assert_eq!(tags, vec!["rcm".to_owned()]);
        assert!(report.is_empty());

        report.tags("tags", vec!["a".to_owned(), "b".to_owned()], 1);
        assert!(report.has_field("tags"));
    }

    #[rstest]
    fn report_display_joins_messages() {
        let mut report = ValidationReport::default();
        report.push(SchemaViolation::required("title"));
        report.push(SchemaViolation::new("slug", ViolationKind::InvalidSlug));
        let message = report.to_string();
        assert!(message.starts_with("validation failed: title is required; slug"));
    }
}
