//! The validation engine.
//!
//! A [`Schema`] is an ordered list of fields, each carrying a [`FieldRule`]:
//! a set of [`Rule`]s plus optional message overrides. [`validate`] checks a
//! [`FormRecord`] against a schema and either hands the record back
//! untouched or returns [`FieldErrors`] with exactly one message per failing
//! field.
//!
//! Rules on a field run in a fixed precedence (see [`RuleKind`]) and the
//! first failure wins. A blank field without a `required` rule skips every
//! other rule.
//!
//! # Examples
//!
//! ```
//! use newsdesk_forms::record::FormRecord;
//! use newsdesk_forms::validation::{validate, FieldRule, RuleKind, Schema};
//!
//! let schema = Schema::new()
//!     .field("email", FieldRule::new().required().email()
//!         .error_message(RuleKind::Email, "Please enter a valid email address"))
//!     .field("phone", FieldRule::new().phone());
//!
//! let errors = validate(&schema, &FormRecord::new().with("email", "nope")).unwrap_err();
//! assert_eq!(errors.message("email").as_deref(), Some("Please enter a valid email address"));
//! assert!(!errors.contains("phone"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use newsdesk_core::{Translator, ValidationError};
use newsdesk_db::Value;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::FormRecord;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+]?[\d\s\-()]{8,}$").expect("valid regex"));

/// A cross-field check: gets the field's value and the whole record and
/// returns `Err(message)` on failure.
pub type CustomCheck = Arc<dyn Fn(&Value, &FormRecord) -> Result<(), String> + Send + Sync>;

/// Identifies a rule. The declaration order is the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    Required,
    MinLength,
    Email,
    Phone,
    Custom,
    OneOf,
    MinItems,
}

impl RuleKind {
    /// Stable identifier used in log lines.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "min_length",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Custom => "custom",
            Self::OneOf => "enum",
            Self::MinItems => "array_min_length",
        }
    }
}

/// One constraint on a field.
#[derive(Clone)]
pub enum Rule {
    /// The value must be present and non-blank; a checkbox must be checked.
    Required,
    /// A string of at least this many characters.
    MinLength(usize),
    /// A plausible email address.
    Email,
    /// A plausible phone number, eight or more digits and separators.
    Phone,
    /// A caller-supplied check.
    Custom(CustomCheck),
    /// One of a fixed set of strings.
    OneOf(Vec<String>),
    /// A list with at least this many items.
    MinItems(usize),
}

impl Rule {
    pub const fn kind(&self) -> RuleKind {
        match self {
            Self::Required => RuleKind::Required,
            Self::MinLength(_) => RuleKind::MinLength,
            Self::Email => RuleKind::Email,
            Self::Phone => RuleKind::Phone,
            Self::Custom(_) => RuleKind::Custom,
            Self::OneOf(_) => RuleKind::OneOf,
            Self::MinItems(_) => RuleKind::MinItems,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "Required"),
            Self::MinLength(n) => write!(f, "MinLength({n})"),
            Self::Email => write!(f, "Email"),
            Self::Phone => write!(f, "Phone"),
            Self::Custom(_) => write!(f, "Custom(..)"),
            Self::OneOf(values) => write!(f, "OneOf({values:?})"),
            Self::MinItems(n) => write!(f, "MinItems({n})"),
        }
    }
}

/// A field-level error message: an English msgid plus an optional count
/// substituted for `{n}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    kind: RuleKind,
    msgid: String,
    count: Option<u64>,
}

impl FieldError {
    fn new(kind: RuleKind, msgid: impl Into<String>, count: Option<usize>) -> Self {
        Self {
            kind,
            msgid: msgid.into(),
            count: count.map(|n| u64::try_from(n).unwrap_or(u64::MAX)),
        }
    }

    /// The rule that failed.
    pub const fn kind(&self) -> RuleKind {
        self.kind
    }

    /// The untranslated message id.
    pub fn msgid(&self) -> &str {
        &self.msgid
    }

    /// The message in the translator's language.
    pub fn translate(&self, translator: &dyn Translator) -> String {
        match self.count {
            Some(n) => translator.gettext_n(&self.msgid, n),
            None => translator.gettext(&self.msgid),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count {
            Some(n) => f.write_str(&self.msgid.replace("{n}", &n.to_string())),
            None => f.write_str(&self.msgid),
        }
    }
}

/// All constraints on one field, with optional per-rule messages.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    rules: BTreeMap<RuleKind, Rule>,
    messages: HashMap<RuleKind, String>,
}

impl FieldRule {
    /// A rule set with no constraints; blank values always pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, replacing any earlier rule of the same kind.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.insert(rule.kind(), rule);
        self
    }

    /// Rejects blank values and unchecked checkboxes. Without this, a blank
    /// value skips every other rule.
    #[must_use]
    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    /// At least `n` characters, counted as chars.
    #[must_use]
    pub fn min_length(self, n: usize) -> Self {
        self.rule(Rule::MinLength(n))
    }

    /// Must look like `local@domain.tld`.
    #[must_use]
    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    /// Eight or more digits, spaces, dashes, parentheses, or a leading `+`.
    #[must_use]
    pub fn phone(self) -> Self {
        self.rule(Rule::Phone)
    }

    /// Runs `check` with the value and the whole record. An empty error
    /// string falls back to the generic message.
    #[must_use]
    pub fn custom<F>(self, check: F) -> Self
    where
        F: Fn(&Value, &FormRecord) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rule(Rule::Custom(Arc::new(check)))
    }

    /// Must equal one of `values`.
    #[must_use]
    pub fn one_of<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule(Rule::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// A list with at least `n` entries.
    #[must_use]
    pub fn min_items(self, n: usize) -> Self {
        self.rule(Rule::MinItems(n))
    }

    /// Overrides the message shown when the `kind` rule fails.
    #[must_use]
    pub fn error_message(mut self, kind: RuleKind, message: impl Into<String>) -> Self {
        self.messages.insert(kind, message.into());
        self
    }

    /// Whether [`required`](Self::required) was added.
    pub fn is_required(&self) -> bool {
        self.rules.contains_key(&RuleKind::Required)
    }

    /// Runs the rules against `value`, returning the first failure.
    pub fn check(&self, value: Option<&Value>, record: &FormRecord) -> Option<FieldError> {
        let value = value.unwrap_or(&Value::Null);
        if value.is_blank() && !self.is_required() {
            return None;
        }
        self.rules
            .values()
            .find_map(|rule| self.check_rule(rule, value, record))
    }

    fn check_rule(&self, rule: &Rule, value: &Value, record: &FormRecord) -> Option<FieldError> {
        let kind = rule.kind();
        let fail = |default: &str, count: Option<usize>| {
            let msgid = self
                .messages
                .get(&kind)
                .map_or(default, String::as_str);
            Some(FieldError::new(kind, msgid, count))
        };
        match rule {
            Rule::Required => {
                let missing = value.is_blank() || value.as_bool() == Some(false);
                missing.then(|| fail("This field is required", None)).flatten()
            }
            Rule::MinLength(n) => match value.as_str() {
                Some(s) if s.chars().count() < *n => {
                    fail("Must be at least {n} characters", Some(*n))
                }
                _ => None,
            },
            Rule::Email => {
                let ok = value.as_str().is_some_and(|s| EMAIL_RE.is_match(s));
                (!ok).then(|| fail("Invalid email address", None)).flatten()
            }
            Rule::Phone => {
                let ok = value.as_str().is_some_and(|s| PHONE_RE.is_match(s));
                (!ok).then(|| fail("Invalid phone number", None)).flatten()
            }
            Rule::Custom(check) => match check(value, record) {
                Ok(()) => None,
                Err(message) if message.is_empty() => fail("Invalid value", None),
                Err(message) => {
                    let msgid = self.messages.get(&kind).cloned().unwrap_or(message);
                    Some(FieldError::new(kind, msgid, None))
                }
            },
            Rule::OneOf(allowed) => {
                if value.is_blank() {
                    return None;
                }
                let ok = value
                    .as_str()
                    .is_some_and(|s| allowed.iter().any(|a| a == s));
                (!ok)
                    .then(|| fail("Please select a valid option", None))
                    .flatten()
            }
            Rule::MinItems(n) => match value.as_list() {
                Some(items) if items.len() < *n => {
                    fail("Please select at least {n} item(s)", Some(*n))
                }
                Some(_) => None,
                None if self.is_required() => {
                    fail("Please select at least {n} item(s)", Some(*n))
                }
                None => None,
            },
        }
    }
}

/// An ordered set of uniquely named fields.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    ///
    /// # Panics
    ///
    /// Panics if the schema already has a field called `name`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        assert!(
            self.get(&name).is_none(),
            "duplicate field '{name}' in schema"
        );
        self.fields.push((name, rule));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A sub-schema with only the named fields, in this schema's order.
    /// Unknown names are ignored.
    #[must_use]
    pub fn pick(&self, names: &[&str]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|(name, _)| names.contains(&name.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// The first error of each failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, FieldError>,
}

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    /// The untranslated, formatted message for `field`.
    pub fn message(&self, field: &str) -> Option<String> {
        self.errors.get(field).map(ToString::to_string)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, field: &str, error: FieldError) {
        self.errors.entry(field.to_string()).or_insert(error);
    }

    pub(crate) fn remove(&mut self, field: &str) -> Option<FieldError> {
        self.errors.remove(field)
    }

    pub(crate) fn clear(&mut self) {
        self.errors.clear();
    }

    /// Every message in the translator's language.
    pub fn translate(&self, translator: &dyn Translator) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(field, error)| (field.clone(), error.translate(translator)))
            .collect()
    }

    /// Packs the errors into a core [`ValidationError`].
    pub fn to_validation_error(&self) -> ValidationError {
        ValidationError::with_field_errors(
            self.errors
                .iter()
                .map(|(field, error)| (field.clone(), error.to_string()))
                .collect(),
        )
    }
}

/// `Ok` carries the record back unchanged.
pub type ValidationResult = Result<FormRecord, FieldErrors>;

/// Validates every field of `schema` against `record`.
pub fn validate(schema: &Schema, record: &FormRecord) -> ValidationResult {
    let mut errors = FieldErrors::default();
    for (name, rule) in &schema.fields {
        if let Some(error) = rule.check(record.get(name), record) {
            errors.insert(name, error);
        }
    }
    if errors.is_empty() {
        Ok(record.clone())
    } else {
        Err(errors)
    }
}

/// Validates a single field. Cross-field checks still see the whole record.
pub fn validate_field(schema: &Schema, field: &str, record: &FormRecord) -> Option<FieldError> {
    validate(&schema.pick(&[field]), record)
        .err()
        .and_then(|mut errors| errors.remove(field))
}
