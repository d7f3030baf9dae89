//! Full-text index
//!
//! Maintains an inverted word index over one string attribute of the
//! records below a configured path. Writes diff the old and new text and
//! translate the difference into posting mutations; reads go through the
//! query layer. The index owns tokenization, diffing and query planning;
//! the posting store owns durability and layout.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cache::{CacheStats, QueryCache};
use crate::config::{FullTextConfig, QueryOptions};
use crate::encoding::{encode_occurs, OCCURS_FIELD};
use crate::error::{IndexError, Result};
use crate::postings::{BlacklistingScan, PostingStore, ResultSet};
use crate::query::{FullTextOp, QueryExecutor};
use crate::record::{self, Record, Value};
use crate::text_info::{TextInfo, TokenizeOptions, WordInfo};

/// The placeholder addressing a node's own key. Node keys are not text
/// content and cannot be full-text indexed.
const NODE_KEY: &str = "{key}";

/// Value argument of [`FullTextIndex::query`]. Plain record indexes accept
/// scan operators here; a full-text index only takes query text.
pub enum QueryValue<'a> {
    Text(&'a str),
    Scan(BlacklistingScan),
}

pub struct FullTextIndex {
    key: String,
    config: FullTextConfig,
    store: Arc<dyn PostingStore>,
    cache: QueryCache,
}

impl std::fmt::Debug for FullTextIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullTextIndex")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl FullTextIndex {
    /// Create an index over the `key` attribute of records, posting into
    /// `store`. Fails when the key is the node-key placeholder or the
    /// configured word pattern cannot be compiled.
    pub fn new(
        store: Arc<dyn PostingStore>,
        key: impl Into<String>,
        config: FullTextConfig,
    ) -> Result<Self> {
        let key = key.into();
        if key == NODE_KEY {
            return Err(IndexError::InvalidKey);
        }
        // Compile the word pattern both ways it will be used (plain for
        // record text, wildcard-extended for query text) so shape problems
        // surface here instead of at the first update.
        let probe = TokenizeOptions::new(&config);
        TextInfo::parse(None, &probe)?;
        TextInfo::parse(None, &probe.with_include_chars("*?"))?;

        let cache = QueryCache::new(config.cache_size);
        Ok(Self {
            key,
            config,
            store,
            cache,
        })
    }

    pub fn index_type(&self) -> &'static str {
        "fulltext"
    }

    /// The sole metadata field this index type stores per posting.
    pub fn metadata_keys(&self) -> &'static [&'static str] {
        &[OCCURS_FIELD]
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &FullTextConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Apply a record change. Both sides are tokenized with the record's
    /// own locale where one is stored; words present on one side only are
    /// removed or added, words whose positions shifted are reposted.
    pub fn handle_record_update(
        &self,
        path: &str,
        old_record: Option<&Record>,
        new_record: Option<&Record>,
    ) -> Result<()> {
        let old_text = record::text_of(old_record, &self.key);
        let new_text = record::text_of(new_record, &self.key);

        let locale_key = self.config.locale_key.as_deref();
        let old_locale = record::locale_of(old_record, locale_key);
        let new_locale = record::locale_of(new_record, locale_key);

        let old_info = TextInfo::parse(
            old_text.as_deref(),
            &TokenizeOptions::new(&self.config).with_locale(old_locale.as_deref()),
        )?;
        let new_info = TextInfo::parse(
            new_text.as_deref(),
            &TokenizeOptions::new(&self.config).with_locale(new_locale.as_deref()),
        )?;

        if new_text.is_some() && new_info.unique_word_count() == 0 {
            warn!(path, key = %self.key, "record text yields no indexable words");
        }

        let mut removed: Vec<&str> = Vec::new();
        let mut added: Vec<(&str, &WordInfo)> = Vec::new();
        for word in old_info.words().keys() {
            if new_info.word_info(word).is_none() {
                removed.push(word);
            }
        }
        for (word, word_info) in new_info.words() {
            match old_info.word_info(word) {
                None => added.push((word, word_info)),
                Some(old_word) if old_word.indexes != word_info.indexes => {
                    removed.push(word);
                    added.push((word, word_info));
                }
                Some(_) => {}
            }
        }
        if removed.is_empty() && added.is_empty() {
            return Ok(());
        }
        debug!(
            path,
            removed = removed.len(),
            added = added.len(),
            "updating postings"
        );

        // Removals complete before inserts so a reposted word cannot lose
        // its fresh posting; within a pass all words are independent keys.
        removed
            .par_iter()
            .try_for_each(|word| self.store.remove(word, path))?;
        added.par_iter().try_for_each(|(word, word_info)| {
            let occurs = encode_occurs(&word_info.indexes, word, path);
            self.store.insert(word, path, &occurs)
        })?;

        self.cache.clear();
        Ok(())
    }

    /// Post every word of a raw value during a full rebuild. The store
    /// drives the rebuild and supplies `add`; the returned list names the
    /// words posted for this record.
    pub fn rebuild_entry(
        &self,
        add: &mut dyn FnMut(&str, &str, &str) -> Result<()>,
        raw: &Value,
        path: &str,
        locale: Option<&str>,
    ) -> Result<Vec<String>> {
        let text = raw.to_text();
        let info = TextInfo::parse(
            Some(&text),
            &TokenizeOptions::new(&self.config).with_locale(locale),
        )?;
        if info.unique_word_count() == 0 {
            warn!(path, key = %self.key, "record text yields no indexable words");
        }
        let mut posted = Vec::with_capacity(info.unique_word_count());
        for (word, word_info) in info.words_in_order() {
            let occurs = encode_occurs(&word_info.indexes, word, path);
            add(word, path, &occurs)?;
            posted.push(word.to_string());
        }
        Ok(posted)
    }

    /// Execute `fulltext:contains` or `fulltext:!contains`. Other operators
    /// are unsupported, and scan operators cannot drive a full-text query.
    pub fn query(
        &self,
        operator: &str,
        value: QueryValue<'_>,
        options: &QueryOptions,
    ) -> Result<ResultSet> {
        let op = FullTextOp::from_operator(operator)
            .ok_or_else(|| IndexError::UnsupportedOperator(operator.to_string()))?;
        let text = match value {
            QueryValue::Text(text) => text,
            QueryValue::Scan(_) => {
                return Err(IndexError::NotImplemented(
                    "blacklisting scans cannot drive a full-text query",
                ))
            }
        };
        let executor = QueryExecutor::new(self.store.as_ref(), &self.config, &self.cache);
        executor.execute(op, text, options)
    }

    /// Convenience wrapper for `fulltext:contains`.
    pub fn contains(&self, query: &str, options: &QueryOptions) -> Result<ResultSet> {
        self.query(
            crate::query::OP_CONTAINS,
            QueryValue::Text(query),
            options,
        )
    }

    /// Convenience wrapper for `fulltext:!contains`.
    pub fn not_contains(&self, query: &str, options: &QueryOptions) -> Result<ResultSet> {
        self.query(
            crate::query::OP_NOT_CONTAINS,
            QueryValue::Text(query),
            options,
        )
    }
}
