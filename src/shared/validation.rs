//! Declarative field validation threaded through entity constructors.
//!
//! A [`Validator`] is a plain configuration object: it carries the message
//! language and the set of enabled custom rules. Checks are accumulated in a
//! [`Checks`] collector so a caller receives every failing field at once.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[expect(clippy::expect_used, reason = "static pattern is known to compile")]
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").expect("email pattern")
});

#[expect(clippy::expect_used, reason = "static pattern is known to compile")]
static COLOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color pattern"));

#[expect(clippy::expect_used, reason = "static pattern is known to compile")]
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}0-9\s()\-_]*$").expect("name pattern"));

/// Returns `true` when `value` is a lowercase email address.
#[must_use]
pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Returns `true` when `value` is a `#RRGGBB` color.
#[must_use]
pub fn is_color(value: &str) -> bool {
    COLOR_PATTERN.is_match(value)
}

/// Language used for validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Russian.
    Ru,
}

/// Custom rules that can be switched on or off per validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Value must be an `https://` URL.
    IsHttps,
    /// Value must not carry leading or trailing whitespace.
    Trim,
    /// Value must be a `#RRGGBB` color.
    Color,
    /// Value may contain letters, digits, spaces, parentheses, `-` and `_`.
    Name,
    /// Value must be digits that do not start with `00`.
    LegalEntityField,
    /// Value is empty or an email address.
    OptionalEmail,
}

impl Rule {
    /// All custom rules.
    pub const ALL: [Self; 6] = [
        Self::IsHttps,
        Self::Trim,
        Self::Color,
        Self::Name,
        Self::LegalEntityField,
        Self::OptionalEmail,
    ];

    fn holds(self, value: &str) -> bool {
        match self {
            Self::IsHttps => value.starts_with("https://"),
            Self::Trim => value.trim() == value,
            Self::Color => is_color(value),
            Self::Name => NAME_PATTERN.is_match(value),
            Self::LegalEntityField => {
                !value.is_empty()
                    && value.chars().all(|c| c.is_ascii_digit())
                    && !value.starts_with("00")
            }
            Self::OptionalEmail => value.is_empty() || is_email(value),
        }
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Name of the offending field.
    pub field: String,
    /// Localized message.
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Non-empty list of field violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_violations(.0))]
pub struct ValidationErrors(pub Vec<FieldViolation>);

impl ValidationErrors {
    /// Returns the violations.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Returns `true` when `field` has at least one violation.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|violation| violation.field == field)
    }
}

fn render_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration object replacing a global validator singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    language: Language,
    rules: BTreeSet<Rule>,
}

impl Validator {
    /// Creates a validator with every custom rule enabled.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language,
            rules: Rule::ALL.into_iter().collect(),
        }
    }

    /// Disables a custom rule; checks using it always pass.
    #[must_use]
    pub fn without_rule(mut self, rule: Rule) -> Self {
        self.rules.remove(&rule);
        self
    }

    /// Returns the message language.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Returns `true` when `rule` is enabled.
    #[must_use]
    pub fn has_rule(&self, rule: Rule) -> bool {
        self.rules.contains(&rule)
    }

    /// Starts a batch of checks.
    #[must_use]
    pub const fn checks(&self) -> Checks<'_> {
        Checks {
            validator: self,
            violations: Vec::new(),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Language::En)
    }
}

/// Collector for one validation pass.
#[derive(Debug)]
pub struct Checks<'a> {
    validator: &'a Validator,
    violations: Vec<FieldViolation>,
}

enum Message {
    Length { min: usize, max: usize },
    MaxLength(usize),
    Email,
    Range { min: i64, max: i64 },
    Required,
    Rule(Rule),
}

impl Message {
    fn render(&self, language: Language) -> String {
        match (language, self) {
            (Language::En, Self::Length { min, max }) => {
                format!("must be between {min} and {max} characters")
            }
            (Language::Ru, Self::Length { min, max }) => {
                format!("должно содержать от {min} до {max} символов")
            }
            (Language::En, Self::MaxLength(max)) => format!("must be at most {max} characters"),
            (Language::Ru, Self::MaxLength(max)) => {
                format!("должно содержать не более {max} символов")
            }
            (Language::En, Self::Email) => "must be a valid email".to_owned(),
            (Language::Ru, Self::Email) => "должен быть корректный email".to_owned(),
            (Language::En, Self::Range { min, max }) => format!("must be between {min} and {max}"),
            (Language::Ru, Self::Range { min, max }) => {
                format!("должно быть в диапазоне от {min} до {max}")
            }
            (Language::En, Self::Required) => "is required".to_owned(),
            (Language::Ru, Self::Required) => "обязательно для заполнения".to_owned(),
            (_, Self::Rule(rule)) => rule_message(language, *rule).to_owned(),
        }
    }
}

const fn rule_message(language: Language, rule: Rule) -> &'static str {
    match (language, rule) {
        (Language::En, Rule::IsHttps) => "must start with https://",
        (Language::Ru, Rule::IsHttps) => "должно начинаться с https://",
        (Language::En, Rule::Trim) => "must not have leading or trailing spaces",
        (Language::Ru, Rule::Trim) => "не должно содержать пробелов в начале и в конце",
        (Language::En, Rule::Color) => "must be a color in #RRGGBB format",
        (Language::Ru, Rule::Color) => "должен быть цвет в формате #RRGGBB",
        (Language::En, Rule::Name) => "contains forbidden characters",
        (Language::Ru, Rule::Name) => "содержит недопустимые символы",
        (Language::En, Rule::LegalEntityField) => "must contain digits only and not start with 00",
        (Language::Ru, Rule::LegalEntityField) => {
            "должно содержать только цифры и не начинаться с 00"
        }
        (Language::En, Rule::OptionalEmail) => "must be empty or a valid email",
        (Language::Ru, Rule::OptionalEmail) => "должно быть пустым или корректным email",
    }
}

impl Checks<'_> {
    fn push(&mut self, field: &str, message: &Message) {
        self.violations.push(FieldViolation {
            field: field.to_owned(),
            message: message.render(self.validator.language),
        });
    }

    /// Requires `value` to have between `min` and `max` characters.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let count = value.chars().count();
        if count < min || count > max {
            self.push(field, &Message::Length { min, max });
        }
        self
    }

    /// Requires `value` to have at most `max` characters.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.push(field, &Message::MaxLength(max));
        }
        self
    }

    /// Requires `value` to be an email address.
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_email(value) {
            self.push(field, &Message::Email);
        }
        self
    }

    /// Requires `value` to lie in `min..=max`.
    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.push(field, &Message::Range { min, max });
        }
        self
    }

    /// Requires `present` to be `true`.
    pub fn required(&mut self, field: &str, present: bool) -> &mut Self {
        if !present {
            self.push(field, &Message::Required);
        }
        self
    }

    /// Applies a custom rule when the validator enables it.
    pub fn rule(&mut self, field: &str, value: &str, rule: Rule) -> &mut Self {
        if self.validator.has_rule(rule) && !rule.holds(value) {
            self.push(field, &Message::Rule(rule));
        }
        self
    }

    /// Finishes the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every failed check.
    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.violations)))
        }
    }
}
