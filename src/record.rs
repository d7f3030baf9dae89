//! Record value shapes handed over by the database layer
//!
//! The index never walks the tree itself; the surrounding database passes
//! the affected record (or the relevant subset of it) on every update.

use std::collections::HashMap;

/// Attribute value of a record, as stored in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    /// An array of strings is indexed as one text.
    TextList(Vec<String>),
}

impl Value {
    /// The text that gets tokenized. List elements are joined with a single
    /// space so word positions remain continuous across elements.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::TextList(items) => items.join(" "),
        }
    }
}

/// A record as seen by the index: attribute name to value.
pub type Record = HashMap<String, Value>;

/// Text at `key` of the given record side, or `None` when the record or the
/// attribute is missing.
pub fn text_of(record: Option<&Record>, key: &str) -> Option<String> {
    record.and_then(|r| r.get(key)).map(Value::to_text)
}

/// Locale override stored on the record itself, if the index is configured
/// with a locale key and the record carries a text value for it.
pub fn locale_of(record: Option<&Record>, locale_key: Option<&str>) -> Option<String> {
    let key = locale_key?;
    match record?.get(key)? {
        Value::Text(locale) => Some(locale.clone()),
        Value::TextList(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_of_joins_lists() {
        let mut record = Record::new();
        record.insert(
            "tags".to_string(),
            Value::TextList(vec!["quick".into(), "brown fox".into()]),
        );
        assert_eq!(
            text_of(Some(&record), "tags"),
            Some("quick brown fox".to_string())
        );
    }

    #[test]
    fn test_text_of_missing() {
        let record = Record::new();
        assert_eq!(text_of(Some(&record), "text"), None);
        assert_eq!(text_of(None, "text"), None);
    }

    #[test]
    fn test_locale_of() {
        let mut record = Record::new();
        record.insert("lang".to_string(), Value::Text("nl".into()));
        assert_eq!(
            locale_of(Some(&record), Some("lang")),
            Some("nl".to_string())
        );
        assert_eq!(locale_of(Some(&record), None), None);
        assert_eq!(locale_of(None, Some("lang")), None);
    }
}
