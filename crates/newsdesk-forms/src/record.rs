//! The draft a form is editing.

use newsdesk_db::{Row, Value};

/// Field values of one form, keyed by the form's field names.
///
/// A controller owns exactly one record and replaces it wholesale on reset.
///
/// # Examples
///
/// ```
/// use newsdesk_forms::record::FormRecord;
///
/// let mut record = FormRecord::new().with("adTypes", Vec::<String>::new());
/// record.toggle_choice("adTypes", "banner", true);
/// record.toggle_choice("adTypes", "video", true);
/// record.toggle_choice("adTypes", "banner", false);
/// assert_eq!(record.strings("adTypes"), vec!["video".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormRecord {
    fields: Row,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The field as text; empty when missing or not a string.
    pub fn text(&self, field: &str) -> &str {
        self.fields.get_str(field).unwrap_or_default()
    }

    /// The field as text, or `None` when it is missing or blank.
    pub fn optional_text(&self, field: &str) -> Option<String> {
        let text = self.text(field);
        (!text.trim().is_empty()).then(|| text.to_string())
    }

    /// `true` only for a `Bool(true)` value.
    pub fn is_checked(&self, field: &str) -> bool {
        self.fields.get(field).and_then(Value::as_bool) == Some(true)
    }

    /// String items of a list field.
    pub fn strings(&self, field: &str) -> Vec<String> {
        self.fields
            .get(field)
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Adds `value` to (or removes it from) a set-valued field.
    ///
    /// A missing or non-list field is treated as empty.
    pub fn toggle_choice(&mut self, field: &str, value: &str, checked: bool) {
        let mut items = self.strings(field);
        let position = items.iter().position(|item| item == value);
        match (checked, position) {
            (true, None) => items.push(value.to_string()),
            (false, Some(index)) => {
                items.remove(index);
            }
            _ => {}
        }
        self.set(field, items);
    }

    /// The underlying row.
    pub const fn as_row(&self) -> &Row {
        &self.fields
    }
}

impl From<Row> for FormRecord {
    fn from(fields: Row) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_accessors() {
        let record = FormRecord::new()
            .with("email", "a@b.com")
            .with("phone", "   ")
            .with("boostAd", true);
        assert_eq!(record.text("email"), "a@b.com");
        assert_eq!(record.text("missing"), "");
        assert_eq!(record.optional_text("phone"), None);
        assert_eq!(record.optional_text("email").as_deref(), Some("a@b.com"));
        assert!(record.is_checked("boostAd"));
        assert!(!record.is_checked("agreeTerms"));
    }

    #[test]
    fn test_toggle_choice_is_idempotent() {
        let mut record = FormRecord::new();
        record.toggle_choice("selectedUsers", "u1", true);
        record.toggle_choice("selectedUsers", "u1", true);
        assert_eq!(record.strings("selectedUsers"), vec!["u1".to_string()]);
        record.toggle_choice("selectedUsers", "u2", false);
        assert_eq!(record.strings("selectedUsers").len(), 1);
    }
}
