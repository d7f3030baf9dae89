//! Query execution
//!
//! `contains` queries run branch by branch: quoted phrases and residual
//! words become sub-queries whose result sets are intersected by record
//! path, OR branches are unioned preserving first occurrence. Bare words
//! are probed for cardinality first and executed most-selective-first,
//! feeding each result set into the next query as a filter so the working
//! set only shrinks. `!contains` hands a word-check vector to the store's
//! blacklisting scan.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::cache::QueryCache;
use crate::config::{FullTextConfig, QueryOptions};
use crate::encoding::decode_occurs;
use crate::error::Result;
use crate::postings::{
    BlacklistingScan, IndexMatch, PostingStore, QueryHint, QueryStats, ResultSet, TreeOp,
    WordCheck,
};
use crate::query::parse::{split_or, QueryBranch};
use crate::query::phrase::phrase_matches;
use crate::text_info::{TextInfo, TokenizeOptions, WordInfo};

pub const OP_CONTAINS: &str = "fulltext:contains";
pub const OP_NOT_CONTAINS: &str = "fulltext:!contains";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullTextOp {
    Contains,
    NotContains,
}

impl FullTextOp {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            OP_CONTAINS => Some(Self::Contains),
            OP_NOT_CONTAINS => Some(Self::NotContains),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => OP_CONTAINS,
            Self::NotContains => OP_NOT_CONTAINS,
        }
    }
}

pub struct QueryExecutor<'a> {
    store: &'a dyn PostingStore,
    config: &'a FullTextConfig,
    cache: &'a QueryCache,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(
        store: &'a dyn PostingStore,
        config: &'a FullTextConfig,
        cache: &'a QueryCache,
    ) -> Self {
        Self {
            store,
            config,
            cache,
        }
    }

    /// Execute a query. Sub-queries (OR branches, phrases, residual words)
    /// recurse through here, so each is memoized under its own text.
    pub fn execute(
        &self,
        op: FullTextOp,
        query: &str,
        options: &QueryOptions,
    ) -> Result<ResultSet> {
        if let Some(hit) = self.cache.get(op.as_str(), query, options.phrase) {
            return Ok((*hit).clone());
        }
        self.cache.record_miss();

        let results = match op {
            FullTextOp::NotContains => self.execute_not_contains(query, options)?,
            FullTextOp::Contains if options.phrase => self.execute_words(query, options)?,
            FullTextOp::Contains => {
                let branches: Vec<&str> = split_or(query).collect();
                if branches.len() > 1 {
                    let mut sets = Vec::with_capacity(branches.len());
                    for branch in branches {
                        sets.push(self.execute(op, branch, options)?);
                    }
                    union(sets)
                } else {
                    self.execute_branch(&QueryBranch::parse(query), options)?
                }
            }
        };
        self.cache.put(op.as_str(), query, options.phrase, &results);
        Ok(results)
    }

    fn execute_branch(&self, branch: &QueryBranch, options: &QueryOptions) -> Result<ResultSet> {
        if !branch.has_phrases() {
            return self.execute_words(&branch.residual, options);
        }
        let mut sets = Vec::new();
        for phrase in &branch.phrases {
            sets.push(self.execute(FullTextOp::Contains, phrase, &options.as_phrase())?);
        }
        if branch.has_residual() {
            sets.push(self.execute(FullTextOp::Contains, &branch.residual, options)?);
        }
        Ok(intersect(sets))
    }

    fn execute_words(&self, text: &str, options: &QueryOptions) -> Result<ResultSet> {
        let tokenize = TokenizeOptions::new(self.config)
            .with_locale(options.locale.as_deref())
            .with_include_chars("*?");
        let info = TextInfo::parse(Some(text), &tokenize)?;

        let mut hints: Vec<QueryHint> = info
            .ignored()
            .iter()
            .cloned()
            .map(QueryHint::IgnoredWord)
            .collect();
        let words = prune_wildcards(info.words_in_order(), options, &mut hints);
        let word_names: Vec<String> = words.iter().map(|(w, _)| w.to_string()).collect();

        if words.is_empty() {
            return Ok(ResultSet {
                matches: Vec::new(),
                stats: vec![self.stats(OP_CONTAINS, text, word_names, 0)],
                hints,
            });
        }

        // Cardinality probe: a single absent word empties the whole AND.
        let mut counted = Vec::with_capacity(words.len());
        let mut missing = Vec::new();
        for (original, (word, _)) in words.iter().enumerate() {
            let op = operator_for(word);
            let count = self.store.count(op, word)?;
            if count == 0 {
                missing.push(word.to_string());
            }
            counted.push((original, *word, op, count));
        }
        if !missing.is_empty() {
            hints.extend(missing.into_iter().map(QueryHint::MissingWord));
            return Ok(ResultSet {
                matches: Vec::new(),
                stats: vec![self.stats(OP_CONTAINS, text, word_names, 0)],
                hints,
            });
        }

        // Most selective word first; every result set becomes the filter of
        // the next query, so the working set only shrinks.
        counted.sort_by_key(|&(_, _, _, count)| count);
        debug!(query = text, order = ?counted, "word execution order");
        let mut word_results: Vec<Option<ResultSet>> = vec![None; words.len()];
        let mut current: Option<ResultSet> = None;
        for &(original, word, op, _) in &counted {
            let results = self.store.query(op, word, current.as_ref())?;
            word_results[original] = Some(results.clone());
            current = Some(results);
        }
        let mut matches = current.map(|r| r.matches).unwrap_or_default();

        if options.phrase {
            matches = prune_phrase(matches, &words, &word_results);
        }

        let count = matches.len();
        Ok(ResultSet {
            matches,
            stats: vec![self.stats(OP_CONTAINS, text, word_names, count)],
            hints,
        })
    }

    fn execute_not_contains(&self, query: &str, options: &QueryOptions) -> Result<ResultSet> {
        let tokenize = TokenizeOptions::new(self.config)
            .with_locale(options.locale.as_deref())
            .with_include_chars("*?");
        let info = TextInfo::parse(Some(query), &tokenize)?;

        let mut hints: Vec<QueryHint> = info
            .ignored()
            .iter()
            .cloned()
            .map(QueryHint::IgnoredWord)
            .collect();
        let words = prune_wildcards(info.words_in_order(), options, &mut hints);
        let word_names: Vec<String> = words.iter().map(|(w, _)| w.to_string()).collect();

        let mut checks = Vec::with_capacity(words.len());
        for (word, _) in &words {
            checks.push(WordCheck::for_word(word)?);
        }
        let scan = BlacklistingScan::new(checks);
        let mut results = self.store.query_blacklisting(&scan)?;
        let count = results.len();
        results
            .stats
            .push(self.stats(OP_NOT_CONTAINS, query, word_names, count));
        results.hints.extend(hints);
        Ok(results)
    }

    fn stats(
        &self,
        operator: &str,
        query: &str,
        words: Vec<String>,
        result_count: usize,
    ) -> QueryStats {
        QueryStats {
            operator: operator.to_string(),
            query: query.to_string(),
            words,
            result_count,
        }
    }
}

fn operator_for(word: &str) -> TreeOp {
    if word.contains(['*', '?']) {
        TreeOp::Like
    } else {
        TreeOp::Eq
    }
}

/// Drop wildcard words too broad to execute: tokens that are nothing but
/// wildcards, and words whose first `*` comes before the minimum prefix
/// length.
fn prune_wildcards<'w>(
    words: Vec<(&'w str, &'w WordInfo)>,
    options: &QueryOptions,
    hints: &mut Vec<QueryHint>,
) -> Vec<(&'w str, &'w WordInfo)> {
    words
        .into_iter()
        .filter(|(word, _)| {
            let too_broad = word.chars().all(|c| c == '*' || c == '?')
                || word
                    .chars()
                    .position(|c| c == '*')
                    .is_some_and(|star| star < options.min_wildcard_word_length);
            if too_broad {
                hints.push(QueryHint::IgnoredWord(word.to_string()));
            }
            !too_broad
        })
        .collect()
}

/// Keep only matches where the phrase words occur at consecutive positions
/// (their slot offsets within the phrase).
fn prune_phrase(
    matches: Vec<IndexMatch>,
    words: &[(&str, &WordInfo)],
    word_results: &[Option<ResultSet>],
) -> Vec<IndexMatch> {
    let occurs_by_word: Vec<HashMap<&str, &str>> = word_results
        .iter()
        .map(|results| {
            results
                .as_ref()
                .map(|r| {
                    r.matches
                        .iter()
                        .map(|m| (m.path.as_str(), m.occurs.as_str()))
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    matches
        .into_iter()
        .filter(|candidate| {
            let mut slots: Vec<(u32, Vec<u32>)> = Vec::new();
            for (word_index, (_, word_info)) in words.iter().enumerate() {
                let Some(encoded) = occurs_by_word[word_index].get(candidate.path.as_str())
                else {
                    return false;
                };
                let positions = decode_occurs(encoded);
                for &offset in &word_info.indexes {
                    slots.push((offset, positions.clone()));
                }
            }
            slots.sort_by_key(|&(offset, _)| offset);
            phrase_matches(&slots)
        })
        .collect()
}

/// Union by record path, preserving the order of first occurrence; stats
/// and hints are concatenated.
fn union(sets: Vec<ResultSet>) -> ResultSet {
    let mut seen = HashSet::new();
    let mut combined = ResultSet::empty();
    for set in sets {
        for m in set.matches {
            if seen.insert(m.path.clone()) {
                combined.matches.push(m);
            }
        }
        combined.stats.extend(set.stats);
        combined.hints.extend(set.hints);
    }
    combined
}

/// Intersect by record path: the smallest set drives, members missing from
/// any other set are dropped.
fn intersect(mut sets: Vec<ResultSet>) -> ResultSet {
    if sets.is_empty() {
        return ResultSet::empty();
    }
    let smallest = sets
        .iter()
        .enumerate()
        .min_by_key(|(_, set)| set.len())
        .map(|(index, _)| index)
        .unwrap_or(0);
    sets.swap(0, smallest);

    let rest = sets.split_off(1);
    let mut base = sets.pop().expect("at least one set");
    {
        let keeps: Vec<HashSet<&str>> = rest.iter().map(ResultSet::path_set).collect();
        base.matches
            .retain(|m| keeps.iter().all(|keep| keep.contains(m.path.as_str())));
    }
    for set in rest {
        base.stats.extend(set.stats);
        base.hints.extend(set.hints);
    }
    base
}
