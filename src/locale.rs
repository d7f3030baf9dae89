//! Locale registry for tokenization
//!
//! Answers, per locale: which pattern extracts words, which regex flags the
//! pattern is compiled with, and which stoplist applies when stoplist use is
//! enabled. The registry is a process-wide read-only table.

use phf::{phf_set, Set};

/// Word pattern used when no locale-specific pattern exists.
pub const DEFAULT_PATTERN: &str = "[A-Za-z0-9']+";

/// Flags a word pattern is compiled with. Matching is always global: every
/// match in the text is visited in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
}

impl Default for PatternFlags {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            multi_line: true,
        }
    }
}

/// Resolved tokenization settings for a locale. Locale-specific fields win
/// over the defaults; absent fields fall back to the default locale.
#[derive(Debug, Clone, Copy)]
pub struct LocaleSettings {
    pub pattern: &'static str,
    pub flags: PatternFlags,
    pub stoplist: Option<&'static Set<&'static str>>,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN,
            flags: PatternFlags::default(),
            stoplist: None,
        }
    }
}

/// The fixed 127-word English stoplist.
static EN_STOPLIST: Set<&'static str> = phf_set! {
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves",
    "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "this", "that", "these", "those",
    "am", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having", "do", "does", "did", "doing",
    "a", "an", "the", "and", "but", "if", "or", "because", "as",
    "until", "while", "of", "at", "by", "for", "with", "about",
    "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off",
    "over", "under", "again", "further", "then", "once", "here", "there",
    "when", "where", "why", "how", "all", "any", "both", "each", "few",
    "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now",
};

/// Look up tokenization settings for a locale.
///
/// An unknown locale containing a `-` is retried with the segment after the
/// first `-` (so `nl-BE` falls back to `BE`). Anything still unknown gets
/// the defaults.
pub fn get(locale: &str) -> LocaleSettings {
    if let Some(settings) = lookup(locale) {
        return settings;
    }
    if let Some((_, region)) = locale.split_once('-') {
        if let Some(settings) = lookup(region) {
            return settings;
        }
    }
    LocaleSettings::default()
}

fn lookup(locale: &str) -> Option<LocaleSettings> {
    match locale {
        "default" => Some(LocaleSettings::default()),
        "en" => Some(LocaleSettings {
            stoplist: Some(&EN_STOPLIST),
            ..LocaleSettings::default()
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = get("default");
        assert_eq!(settings.pattern, DEFAULT_PATTERN);
        assert!(settings.flags.case_insensitive);
        assert!(settings.flags.multi_line);
        assert!(settings.stoplist.is_none());
    }

    #[test]
    fn test_en_inherits_defaults_and_adds_stoplist() {
        let settings = get("en");
        assert_eq!(settings.pattern, DEFAULT_PATTERN);
        let stoplist = settings.stoplist.expect("en carries a stoplist");
        assert_eq!(stoplist.len(), 127);
        assert!(stoplist.contains("the"));
        assert!(stoplist.contains("ourselves"));
        assert!(!stoplist.contains("quick"));
    }

    #[test]
    fn test_unknown_locale_falls_back_to_defaults() {
        let settings = get("xx");
        assert_eq!(settings.pattern, DEFAULT_PATTERN);
        assert!(settings.stoplist.is_none());
    }

    #[test]
    fn test_region_fallback_after_dash() {
        // "en-AU" is unknown as a whole; "AU" is unknown too, so defaults
        // apply. "nl-en" falls back to the known "en" segment.
        assert!(get("en-AU").stoplist.is_none());
        assert!(get("nl-en").stoplist.is_some());
    }
}
