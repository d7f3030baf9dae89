//! Text tokenization
//!
//! Turns a raw text value into the per-word positional bookkeeping the index
//! maintains, applying the full normalization pipeline in order:
//!
//! 1. locale resolution (pattern, flags, stoplist)
//! 2. pattern override and include-character splicing
//! 3. caller `prepare` hook
//! 4. transliteration to a fixed point
//! 5. apostrophe removal
//! 6. per-match: `transform` hook, locale lowercasing, length and
//!    blacklist/whitelist filtering, max-length clamping
//!
//! Rejected tokens are recorded as ignored and still consume a position
//! slot, so the surviving words keep the offsets they had in the source
//! sequence. Phrase matching relies on those offsets.

use std::collections::HashMap;
use std::sync::OnceLock;

use dashmap::DashMap;
use regex::{Regex, RegexBuilder};

use crate::config::FullTextConfig;
use crate::error::{IndexError, Result};
use crate::locale::{self, PatternFlags};

/// Positions of one normalized word within a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordInfo {
    /// Position slots the word occupies, in tokenization order.
    pub indexes: Vec<u32>,
    /// Byte offsets of the matches in the normalized source text.
    pub source_indexes: Vec<u32>,
}

impl WordInfo {
    pub fn occurs(&self) -> usize {
        self.indexes.len()
    }
}

/// Tokenization result: normalized words with their positions, plus the
/// tokens that were dropped along the way.
#[derive(Debug, Clone, Default)]
pub struct TextInfo {
    locale: String,
    words: HashMap<String, WordInfo>,
    ignored: Vec<String>,
    slots: u32,
}

/// Options for a single tokenization run.
#[derive(Clone, Copy)]
pub struct TokenizeOptions<'a> {
    pub config: &'a FullTextConfig,
    /// Overrides the configured locale (a record-level locale attribute).
    pub locale: Option<&'a str>,
    /// Extra characters spliced into the word pattern's character classes.
    /// Queries pass `"*?"` here so wildcards survive tokenization.
    pub include_chars: Option<&'a str>,
}

impl<'a> TokenizeOptions<'a> {
    pub fn new(config: &'a FullTextConfig) -> Self {
        Self {
            config,
            locale: None,
            include_chars: None,
        }
    }

    pub fn with_locale(mut self, locale: Option<&'a str>) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_include_chars(mut self, chars: &'a str) -> Self {
        self.include_chars = Some(chars);
        self
    }
}

impl TextInfo {
    fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ..Self::default()
        }
    }

    /// Tokenize `text` with the given options. A missing text yields an
    /// empty result, not an error.
    pub fn parse(text: Option<&str>, options: &TokenizeOptions<'_>) -> Result<TextInfo> {
        let config = options.config;
        let locale = options.locale.unwrap_or(&config.locale);
        let settings = locale::get(locale);

        let base_pattern = config.pattern.as_deref().unwrap_or(settings.pattern);
        let pattern = match options.include_chars {
            Some(chars) if !chars.is_empty() => splice_include_chars(base_pattern, chars)?,
            _ => base_pattern.to_string(),
        };
        let flags = config.flags.unwrap_or(settings.flags);
        let re = compiled(&pattern, flags)?;

        let stoplist = if config.use_stoplist {
            settings.stoplist
        } else {
            None
        };

        let mut info = TextInfo::new(locale);
        let Some(text) = text else {
            return Ok(info);
        };

        let mut text = match &config.prepare {
            Some(prepare) => {
                let keep_chars = format!("\"{}", options.include_chars.unwrap_or(""));
                prepare(text, locale, &keep_chars)
            }
            None => text.to_string(),
        };

        // Some transliterators decompose in several passes; keep applying
        // until the text stops changing.
        if let Some(transliterate) = &config.transliterate {
            loop {
                let next = transliterate(&text);
                if next == text {
                    break;
                }
                text = next;
            }
        }

        text.retain(|c| c != '\'');

        for m in re.find_iter(&text) {
            let source_index = m.start() as u32;
            let mut word = m.as_str().to_string();

            if let Some(transform) = &config.transform {
                match transform(&word, locale) {
                    Some(replacement) => word = replacement,
                    None => {
                        info.push_ignored(&word);
                        continue;
                    }
                }
            }

            let mut word = word.to_lowercase();
            let length = word.chars().count();
            let whitelisted = config.whitelist.iter().any(|w| w == &word);
            let blacklisted = config.blacklist.iter().any(|w| w == &word)
                || stoplist.is_some_and(|s| s.contains(word.as_str()));
            if (length < config.min_length || blacklisted) && !whitelisted {
                info.push_ignored(&word);
                continue;
            }
            if length > config.max_length {
                word = word.chars().take(config.max_length).collect();
            }
            info.push_occurrence(word, source_index);
        }
        Ok(info)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn words(&self) -> &HashMap<String, WordInfo> {
        &self.words
    }

    pub fn word_info(&self, word: &str) -> Option<&WordInfo> {
        self.words.get(word)
    }

    /// Tokens that were dropped, unique, in first-seen order.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Total kept occurrences.
    pub fn word_count(&self) -> usize {
        self.words.values().map(WordInfo::occurs).sum()
    }

    pub fn unique_word_count(&self) -> usize {
        self.words.len()
    }

    /// Unique words ordered by first occurrence.
    pub fn to_words(&self) -> Vec<&str> {
        self.words_in_order()
            .into_iter()
            .map(|(word, _)| word)
            .collect()
    }

    /// Unique words with their positions, ordered by first occurrence.
    pub fn words_in_order(&self) -> Vec<(&str, &WordInfo)> {
        let mut words: Vec<(&str, &WordInfo)> = self
            .words
            .iter()
            .map(|(word, info)| (word.as_str(), info))
            .collect();
        words.sort_by_key(|(_, info)| info.indexes.first().copied());
        words
    }

    /// The word sequence as tokenized, one slot per token. Slots of ignored
    /// tokens are `None`.
    pub fn to_sequence(&self) -> Vec<Option<&str>> {
        let mut sequence = vec![None; self.slots as usize];
        for (word, info) in &self.words {
            for &index in &info.indexes {
                sequence[index as usize] = Some(word.as_str());
            }
        }
        sequence
    }

    fn push_ignored(&mut self, word: &str) {
        if !self.ignored.iter().any(|w| w == word) {
            self.ignored.push(word.to_string());
        }
        self.slots += 1;
    }

    fn push_occurrence(&mut self, word: String, source_index: u32) {
        let entry = self.words.entry(word).or_default();
        entry.indexes.push(self.slots);
        entry.source_indexes.push(source_index);
        self.slots += 1;
    }
}

/// Splice extra characters into every character class of `pattern`. Fails
/// when the pattern has no class to extend.
pub(crate) fn splice_include_chars(pattern: &str, include_chars: &str) -> Result<String> {
    if !pattern.contains('[') {
        return Err(IndexError::PatternShape(pattern.to_string()));
    }
    let escaped: String = include_chars
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    Ok(pattern.replace('[', &format!("[{escaped}")))
}

/// Compile a word pattern, reusing earlier compilations of the same pattern
/// and flags.
pub(crate) fn compiled(pattern: &str, flags: PatternFlags) -> Result<Regex> {
    static CACHE: OnceLock<DashMap<(String, bool, bool), Regex>> = OnceLock::new();
    let cache = CACHE.get_or_init(DashMap::new);
    let key = (
        pattern.to_string(),
        flags.case_insensitive,
        flags.multi_line,
    );
    if let Some(re) = cache.get(&key) {
        return Ok(re.value().clone());
    }
    let re = RegexBuilder::new(pattern)
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multi_line)
        .build()?;
    cache.insert(key, re.clone());
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn parse(text: &str, config: &FullTextConfig) -> TextInfo {
        TextInfo::parse(Some(text), &TokenizeOptions::new(config)).unwrap()
    }

    #[test]
    fn test_basic_positions() {
        let config = FullTextConfig::default();
        let info = parse("The quick brown fox", &config);
        assert_eq!(info.unique_word_count(), 4);
        assert_eq!(info.word_count(), 4);
        assert_eq!(info.word_info("quick").unwrap().indexes, vec![1]);
        assert_eq!(info.word_info("fox").unwrap().indexes, vec![3]);
        assert_eq!(info.word_info("the").unwrap().source_indexes, vec![0]);
        assert_eq!(info.word_info("quick").unwrap().source_indexes, vec![4]);
    }

    #[test]
    fn test_repeated_words_accumulate() {
        let config = FullTextConfig::default();
        let info = parse("Hello HELLO hello", &config);
        assert_eq!(info.unique_word_count(), 1);
        let word = info.word_info("hello").unwrap();
        assert_eq!(word.occurs(), 3);
        assert_eq!(word.indexes, vec![0, 1, 2]);
        assert_eq!(info.word_count(), 3);
    }

    #[test]
    fn test_missing_text_is_empty() {
        let config = FullTextConfig::default();
        let info = TextInfo::parse(None, &TokenizeOptions::new(&config)).unwrap();
        assert_eq!(info.unique_word_count(), 0);
        assert!(info.ignored().is_empty());
    }

    #[test]
    fn test_apostrophes_are_removed() {
        let config = FullTextConfig::default();
        let info = parse("don't won't", &config);
        assert!(info.word_info("dont").is_some());
        assert!(info.word_info("wont").is_some());
    }

    #[test]
    fn test_min_length_and_whitelist() {
        let config = FullTextConfig::default()
            .with_word_length(3, 25)
            .with_whitelist(vec!["ok".into()]);
        let info = parse("ok no fine", &config);
        assert!(info.word_info("ok").is_some());
        assert!(info.word_info("no").is_none());
        assert!(info.word_info("fine").is_some());
        assert_eq!(info.ignored(), ["no"]);
    }

    #[test]
    fn test_max_length_truncates() {
        let config = FullTextConfig::default().with_word_length(1, 5);
        let info = parse("abcdefghij", &config);
        assert!(info.word_info("abcde").is_some());
        assert_eq!(info.word_count(), 1);
    }

    #[test]
    fn test_blacklist() {
        let config = FullTextConfig::default().with_blacklist(vec!["noise".into()]);
        let info = parse("signal Noise signal", &config);
        assert_eq!(info.word_info("signal").unwrap().occurs(), 2);
        assert!(info.word_info("noise").is_none());
        assert_eq!(info.ignored(), ["noise"]);
    }

    #[test]
    fn test_stoplist_keeps_position_slots() {
        let config = FullTextConfig::default().with_stoplist();
        let info = parse("the quick brown fox", &config);
        assert!(info.word_info("the").is_none());
        assert_eq!(info.ignored(), ["the"]);
        // "the" consumed slot 0, so the kept words keep their offsets.
        assert_eq!(info.word_info("quick").unwrap().indexes, vec![1]);
        assert_eq!(info.word_info("fox").unwrap().indexes, vec![3]);
        assert_eq!(
            info.to_sequence(),
            vec![None, Some("quick"), Some("brown"), Some("fox")]
        );
    }

    #[test]
    fn test_transform_rejection_consumes_slot() {
        let config = FullTextConfig::default().with_transform(Arc::new(|word, _| {
            if word.len() > 4 {
                None
            } else {
                Some(word.to_string())
            }
        }));
        let info = parse("big elephant cat", &config);
        assert!(info.word_info("elephant").is_none());
        assert_eq!(info.ignored(), ["elephant"]);
        assert_eq!(info.word_info("big").unwrap().indexes, vec![0]);
        assert_eq!(info.word_info("cat").unwrap().indexes, vec![2]);
    }

    #[test]
    fn test_transform_as_stemmer() {
        let config = FullTextConfig::default().with_transform(Arc::new(|word: &str, _| {
            Some(word.trim_end_matches('s').to_string())
        }));
        let info = parse("dogs dog", &config);
        let word = info.word_info("dog").unwrap();
        assert_eq!(word.occurs(), 2);
    }

    #[test]
    fn test_prepare_receives_opaque_keep_chars() {
        let config = FullTextConfig::default().with_prepare(Arc::new(
            |text: &str, locale: &str, keep_chars: &str| {
                assert_eq!(locale, "en");
                assert_eq!(keep_chars, "\"*?");
                text.replace("grey", "gray")
            },
        ));
        let options = TokenizeOptions::new(&config).with_include_chars("*?");
        let info = TextInfo::parse(Some("grey fox"), &options).unwrap();
        assert!(info.word_info("gray").is_some());
        assert!(info.word_info("grey").is_none());
    }

    #[test]
    fn test_transliteration_runs_to_fixed_point() {
        // A two-stage transliterator: the first pass leaves text the second
        // pass still changes.
        let config = FullTextConfig::default().with_transliterate(Arc::new(|text: &str| {
            if text.contains('ǣ') {
                text.replace('ǣ', "æ")
            } else {
                text.replace('æ', "ae")
            }
        }));
        let info = parse("ǣther", &config);
        assert!(info.word_info("aether").is_some());
        assert_eq!(info.unique_word_count(), 1);
    }

    #[test]
    fn test_include_chars_keep_wildcards() {
        let config = FullTextConfig::default();
        let options = TokenizeOptions::new(&config).with_include_chars("*?");
        let info = TextInfo::parse(Some("br* fo?x plain"), &options).unwrap();
        assert!(info.word_info("br*").is_some());
        assert!(info.word_info("fo?x").is_some());
        assert!(info.word_info("plain").is_some());
    }

    #[test]
    fn test_include_chars_require_character_class() {
        let config = FullTextConfig::default().with_pattern(r"\w+");
        let options = TokenizeOptions::new(&config).with_include_chars("*?");
        let err = TextInfo::parse(Some("anything"), &options).unwrap_err();
        assert!(matches!(err, IndexError::PatternShape(_)));
    }

    #[test]
    fn test_splice_into_every_class() {
        let spliced = splice_include_chars("[a-z]+[0-9]*", "*").unwrap();
        assert_eq!(spliced, r"[\*a-z]+[\*0-9]*");
    }

    #[test]
    fn test_sequence_roundtrip_is_equivalent() {
        let config = FullTextConfig::default();
        let info = parse("Quick brown quick foxes", &config);
        let joined = info
            .to_sequence()
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let again = parse(&joined, &config);
        assert_eq!(info.words(), again.words());
    }

    #[test]
    fn test_indexes_strictly_increasing_and_distinct() {
        let config = FullTextConfig::default();
        let info = parse("a b a c b a", &config);
        let mut seen = std::collections::HashSet::new();
        for word in info.words().values() {
            assert!(word.indexes.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(word.indexes.len(), word.source_indexes.len());
            for &index in &word.indexes {
                assert!(seen.insert(index));
            }
        }
        assert_eq!(seen.len(), info.word_count());
    }
}
