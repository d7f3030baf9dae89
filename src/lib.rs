//! treetext: full-text secondary index for hierarchical key-value databases
//!
//! Indexes one string attribute of the records below a path: text is
//! tokenized and normalized, and every contained word becomes a posting in
//! a generic record index (the posting store), keyed by word and carrying
//! the word's positions as metadata. Queries support word containment,
//! quoted phrases, `*`/`?` wildcards, OR branches and negation.
//!
//! ## Layers
//! - tokenization: locale-aware pattern matching with caller hooks
//!   (`prepare`, `transform`, transliteration), stoplists and length rules
//! - maintenance: record updates are diffed word by word into posting
//!   mutations, with positions packed into a fixed-size metadata slot
//! - querying: cardinality-ordered intersection, positional phrase checks,
//!   blacklisting scans for negation, LRU-cached result sets
//!
//! The posting store itself (durability, tree layout, locking) is supplied
//! by the caller through the [`PostingStore`] trait;
//! [`postings::MemoryPostingStore`] is an in-memory reference.

pub mod cache;
pub mod config;
pub mod encoding;
pub mod fulltext;
pub mod locale;
pub mod postings;
pub mod query;
pub mod record;
pub mod text_info;

mod error;

pub use cache::CacheStats;
pub use config::{FullTextConfig, QueryOptions};
pub use error::{IndexError, Result};
pub use fulltext::{FullTextIndex, QueryValue};
pub use postings::{
    BlacklistingScan, IndexMatch, PostingStore, QueryHint, QueryStats, ResultSet, TreeOp,
    WordCheck,
};
pub use query::{OP_CONTAINS, OP_NOT_CONTAINS};
pub use text_info::{TextInfo, WordInfo};
