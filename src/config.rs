//! Full-text index configuration
//!
//! Tokenization knobs plus the optional caller-supplied hooks (text
//! preparation, word transform, transliteration). Hooks are captured at
//! construction time and called with documented signatures during
//! tokenization.

use std::fmt;
use std::sync::Arc;

use crate::locale::PatternFlags;

/// Pre-tokenization hook: `(text, locale, keep_chars)` to replacement text.
///
/// `keep_chars` is an opaque pass-through the callee may use to protect
/// characters it would otherwise strip; the index forwards it unchanged.
pub type PrepareFn = Arc<dyn Fn(&str, &str, &str) -> String + Send + Sync>;

/// Per-word transform hook: `(word, locale)` to the word that gets indexed,
/// or `None` to drop the word. Dropped words are recorded as ignored.
pub type TransformFn = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// Unicode to ASCII transliteration, supplied by the host database. Applied
/// repeatedly until a fixed point is reached.
pub type TransliterateFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Configuration of a full-text index.
#[derive(Clone)]
pub struct FullTextConfig {
    /// Default locale for records that carry no locale attribute.
    pub locale: String,
    /// Record attribute holding a per-record locale override.
    pub locale_key: Option<String>,
    /// Word pattern override; the locale default applies when absent.
    pub pattern: Option<String>,
    /// Pattern flag override; the locale default applies when absent.
    pub flags: Option<PatternFlags>,
    /// Words shorter than this are ignored (unless whitelisted).
    pub min_length: usize,
    /// Longer words are truncated to this many characters.
    pub max_length: usize,
    /// Words never indexed (compared after lowercasing).
    pub blacklist: Vec<String>,
    /// Words always indexed, overriding length and blacklist checks.
    pub whitelist: Vec<String>,
    /// Extend the blacklist with the locale stoplist.
    pub use_stoplist: bool,
    /// Number of memoized query results.
    pub cache_size: usize,
    pub prepare: Option<PrepareFn>,
    pub transform: Option<TransformFn>,
    pub transliterate: Option<TransliterateFn>,
}

impl Default for FullTextConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            locale_key: None,
            pattern: None,
            flags: None,
            min_length: 1,
            max_length: 25,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            use_stoplist: false,
            cache_size: 1000,
            prepare: None,
            transform: None,
            transliterate: None,
        }
    }
}

impl FullTextConfig {
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_locale_key(mut self, key: impl Into<String>) -> Self {
        self.locale_key = Some(key.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_flags(mut self, flags: PatternFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_word_length(mut self, min: usize, max: usize) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_blacklist(mut self, words: Vec<String>) -> Self {
        self.blacklist = words;
        self
    }

    pub fn with_whitelist(mut self, words: Vec<String>) -> Self {
        self.whitelist = words;
        self
    }

    pub fn with_stoplist(mut self) -> Self {
        self.use_stoplist = true;
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn with_prepare(mut self, prepare: PrepareFn) -> Self {
        self.prepare = Some(prepare);
        self
    }

    pub fn with_transform(mut self, transform: TransformFn) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_transliterate(mut self, transliterate: TransliterateFn) -> Self {
        self.transliterate = Some(transliterate);
        self
    }
}

impl fmt::Debug for FullTextConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FullTextConfig")
            .field("locale", &self.locale)
            .field("locale_key", &self.locale_key)
            .field("pattern", &self.pattern)
            .field("flags", &self.flags)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("blacklist", &self.blacklist)
            .field("whitelist", &self.whitelist)
            .field("use_stoplist", &self.use_stoplist)
            .field("cache_size", &self.cache_size)
            .field("prepare", &self.prepare.as_ref().map(|_| "fn"))
            .field("transform", &self.transform.as_ref().map(|_| "fn"))
            .field("transliterate", &self.transliterate.as_ref().map(|_| "fn"))
            .finish()
    }
}

/// Options for querying a full-text index.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Require query words to occur at consecutive positions.
    pub phrase: bool,
    /// Locale the query text is tokenized with; the index default applies
    /// when absent.
    pub locale: Option<String>,
    /// Words whose first `*` wildcard sits before this character index are
    /// too broad to execute and are ignored.
    pub min_wildcard_word_length: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            phrase: false,
            locale: None,
            min_wildcard_word_length: 2,
        }
    }
}

impl QueryOptions {
    pub(crate) fn as_phrase(&self) -> Self {
        Self {
            phrase: true,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FullTextConfig::default();
        assert_eq!(config.locale, "en");
        assert_eq!(config.min_length, 1);
        assert_eq!(config.max_length, 25);
        assert!(!config.use_stoplist);
        assert!(config.pattern.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = FullTextConfig::default()
            .with_locale("nl")
            .with_word_length(2, 10)
            .with_stoplist()
            .with_blacklist(vec!["foo".into()]);
        assert_eq!(config.locale, "nl");
        assert_eq!(config.min_length, 2);
        assert_eq!(config.max_length, 10);
        assert!(config.use_stoplist);
        assert_eq!(config.blacklist, vec!["foo".to_string()]);
    }

    #[test]
    fn test_debug_hides_hooks() {
        let config = FullTextConfig::default()
            .with_transform(Arc::new(|word, _| Some(word.to_string())));
        let printed = format!("{:?}", config);
        assert!(printed.contains("transform: Some(\"fn\")"));
    }
}
