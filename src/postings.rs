//! Posting-store contract and result sets
//!
//! The index does not own the inverted tree. It delegates posting storage to
//! a generic record index (one logical posting per contained word, all
//! sharing the record's path) through the [`PostingStore`] trait, and gets
//! result sets back. Durability, tree layout and locking are the store's
//! concern.
//!
//! [`MemoryPostingStore`] is a reference implementation backing the test
//! suite and small in-process use.

use std::collections::{BTreeMap, HashSet};

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::Result;

/// Comparison the underlying tree supports on word keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOp {
    /// Exact word match.
    Eq,
    /// Wildcard word match (`*` and `?`).
    Like,
}

/// One matching record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMatch {
    pub path: String,
    /// Raw position metadata as stored with the posting.
    pub occurs: String,
}

/// Why a query returned fewer or zero results. Hints are diagnostics, not
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "word", rename_all = "camelCase")]
pub enum QueryHint {
    /// The word was dropped during tokenization or wildcard pruning.
    IgnoredWord(String),
    /// The word occurs in no record at all.
    MissingWord(String),
}

/// Execution report of one (sub)query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub operator: String,
    pub query: String,
    pub words: Vec<String>,
    pub result_count: usize,
}

/// Ordered collection of matching records with the stats and hints gathered
/// while producing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub matches: Vec<IndexMatch>,
    pub stats: Vec<QueryStats>,
    pub hints: Vec<QueryHint>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.path.as_str())
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.matches.iter().any(|m| m.path == path)
    }

    pub(crate) fn path_set(&self) -> HashSet<&str> {
        self.paths().collect()
    }
}

/// A word predicate used to exclude postings during a blacklisting scan.
#[derive(Debug, Clone)]
pub enum WordCheck {
    Literal(String),
    Pattern(Regex),
}

impl WordCheck {
    /// Build the check for a query word: an anchored case-insensitive
    /// pattern when the word carries wildcards, a lowercased literal
    /// otherwise.
    pub fn for_word(word: &str) -> Result<Self> {
        if !word.contains(['*', '?']) {
            return Ok(WordCheck::Literal(word.to_lowercase()));
        }
        let mut pattern = String::from("^");
        for c in word.chars() {
            match c {
                '*' => pattern.push_str(".*"),
                '?' => pattern.push('.'),
                _ => pattern.push_str(&regex::escape(&c.to_string())),
            }
        }
        pattern.push('$');
        let re = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(WordCheck::Pattern(re))
    }

    pub fn matches(&self, word: &str) -> bool {
        match self {
            WordCheck::Literal(literal) => literal == &word.to_lowercase(),
            WordCheck::Pattern(re) => re.is_match(word),
        }
    }
}

/// Scan-time negation operator: the store enumerates every index entry and
/// excludes the postings of entries whose word matches any check. The scan
/// result is the record universe minus the exclusions.
#[derive(Debug, Clone)]
pub struct BlacklistingScan {
    checks: Vec<WordCheck>,
}

impl BlacklistingScan {
    pub fn new(checks: Vec<WordCheck>) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &[WordCheck] {
        &self.checks
    }

    /// True when the postings stored under `word` must be excluded.
    pub fn excludes(&self, word: &str) -> bool {
        self.checks.iter().any(|check| check.matches(word))
    }
}

/// The generic record index the full-text index posts words into.
///
/// Implementations must be commutative on independent (word, path) keys;
/// the maintainer issues its per-word mutations concurrently.
pub trait PostingStore: Send + Sync {
    /// Add a posting. `occurs` is the encoded position metadata.
    fn insert(&self, word: &str, path: &str, occurs: &str) -> Result<()>;

    /// Remove the posting of `path` under `word`.
    fn remove(&self, word: &str, path: &str) -> Result<()>;

    /// Number of postings matching `word` under `op`.
    fn count(&self, op: TreeOp, word: &str) -> Result<usize>;

    /// Postings matching `word` under `op`, optionally restricted to the
    /// record paths of an earlier result set.
    fn query(&self, op: TreeOp, word: &str, filter: Option<&ResultSet>) -> Result<ResultSet>;

    /// Execute a blacklisting scan over all entries.
    fn query_blacklisting(&self, scan: &BlacklistingScan) -> Result<ResultSet>;
}

/// In-memory posting store: word to (path to encoded positions).
#[derive(Debug, Default)]
pub struct MemoryPostingStore {
    postings: RwLock<BTreeMap<String, BTreeMap<String, String>>>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All indexed words, for inspection.
    pub fn indexed_words(&self) -> Vec<String> {
        self.postings.read().keys().cloned().collect()
    }

    /// Stored position metadata of one posting, for inspection.
    pub fn occurs_for(&self, word: &str, path: &str) -> Option<String> {
        self.postings.read().get(word)?.get(path).cloned()
    }
}

impl PostingStore for MemoryPostingStore {
    fn insert(&self, word: &str, path: &str, occurs: &str) -> Result<()> {
        self.postings
            .write()
            .entry(word.to_string())
            .or_default()
            .insert(path.to_string(), occurs.to_string());
        Ok(())
    }

    fn remove(&self, word: &str, path: &str) -> Result<()> {
        let mut postings = self.postings.write();
        if let Some(entries) = postings.get_mut(word) {
            entries.remove(path);
            if entries.is_empty() {
                postings.remove(word);
            }
        }
        Ok(())
    }

    fn count(&self, op: TreeOp, word: &str) -> Result<usize> {
        let postings = self.postings.read();
        match op {
            TreeOp::Eq => Ok(postings.get(word).map_or(0, BTreeMap::len)),
            TreeOp::Like => {
                let check = WordCheck::for_word(word)?;
                Ok(postings
                    .iter()
                    .filter(|(key, _)| check.matches(key))
                    .map(|(_, entries)| entries.len())
                    .sum())
            }
        }
    }

    fn query(&self, op: TreeOp, word: &str, filter: Option<&ResultSet>) -> Result<ResultSet> {
        let postings = self.postings.read();
        let mut matches = Vec::new();
        let mut seen = HashSet::new();
        match op {
            TreeOp::Eq => {
                if let Some(entries) = postings.get(word) {
                    for (path, occurs) in entries {
                        matches.push(IndexMatch {
                            path: path.clone(),
                            occurs: occurs.clone(),
                        });
                    }
                }
            }
            TreeOp::Like => {
                let check = WordCheck::for_word(word)?;
                for (key, entries) in postings.iter() {
                    if !check.matches(key) {
                        continue;
                    }
                    for (path, occurs) in entries {
                        if seen.insert(path.clone()) {
                            matches.push(IndexMatch {
                                path: path.clone(),
                                occurs: occurs.clone(),
                            });
                        }
                    }
                }
            }
        }
        if let Some(filter) = filter {
            let keep = filter.path_set();
            matches.retain(|m| keep.contains(m.path.as_str()));
        }
        Ok(ResultSet {
            matches,
            ..ResultSet::default()
        })
    }

    fn query_blacklisting(&self, scan: &BlacklistingScan) -> Result<ResultSet> {
        let postings = self.postings.read();
        let mut universe = Vec::new();
        let mut seen = HashSet::new();
        let mut excluded = HashSet::new();
        for (word, entries) in postings.iter() {
            let exclude = scan.excludes(word);
            for path in entries.keys() {
                if seen.insert(path.clone()) {
                    universe.push(path.clone());
                }
                if exclude {
                    excluded.insert(path.clone());
                }
            }
        }
        let matches = universe
            .into_iter()
            .filter(|path| !excluded.contains(path))
            .map(|path| IndexMatch {
                path,
                occurs: String::new(),
            })
            .collect();
        Ok(ResultSet {
            matches,
            ..ResultSet::default()
        })
    }
}
