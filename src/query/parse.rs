//! Query string parsing
//!
//! A query is a disjunction of branches separated by the literal ` OR `.
//! Within a branch, double-quoted phrases are extracted in order (shortest
//! match first); whatever text remains forms the branch's residual words.
//! Wildcard handling happens later, during tokenization and execution.

/// Parsed query: one branch per disjunct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub branches: Vec<QueryBranch>,
}

/// One disjunct: quoted phrases plus residual bare-word text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBranch {
    pub phrases: Vec<String>,
    pub residual: String,
}

impl ParsedQuery {
    pub fn parse(query: &str) -> Self {
        Self {
            branches: split_or(query).map(QueryBranch::parse).collect(),
        }
    }
}

/// Split a query into its OR branches. The separator is the literal,
/// space-delimited word OR; quoting does not protect it.
pub(crate) fn split_or(query: &str) -> impl Iterator<Item = &str> {
    query.split(" OR ")
}

impl QueryBranch {
    pub fn parse(text: &str) -> Self {
        let mut phrases = Vec::new();
        let mut residual = String::new();
        let mut rest = text;
        while let Some(open) = rest.find('"') {
            residual.push_str(&rest[..open]);
            match rest[open + 1..].find('"') {
                Some(close) => {
                    phrases.push(rest[open + 1..open + 1 + close].to_string());
                    rest = &rest[open + close + 2..];
                }
                None => {
                    // Unmatched quote: keep the tail as residual text; the
                    // quote itself never survives tokenization.
                    residual.push_str(&rest[open..]);
                    rest = "";
                    break;
                }
            }
        }
        residual.push_str(rest);
        QueryBranch {
            phrases,
            residual: residual.trim().to_string(),
        }
    }

    pub fn has_phrases(&self) -> bool {
        !self.phrases.is_empty()
    }

    pub fn has_residual(&self) -> bool {
        !self.residual.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_words() {
        let parsed = ParsedQuery::parse("quick brown fox");
        assert_eq!(parsed.branches.len(), 1);
        let branch = &parsed.branches[0];
        assert!(branch.phrases.is_empty());
        assert_eq!(branch.residual, "quick brown fox");
    }

    #[test]
    fn test_or_branches() {
        let parsed = ParsedQuery::parse("quick OR turtles OR dogs");
        assert_eq!(parsed.branches.len(), 3);
        assert_eq!(parsed.branches[1].residual, "turtles");
    }

    #[test]
    fn test_phrase_extraction() {
        let branch = QueryBranch::parse("\"brown fox\" jumps");
        assert_eq!(branch.phrases, ["brown fox"]);
        assert_eq!(branch.residual, "jumps");
    }

    #[test]
    fn test_multiple_phrases_in_order() {
        let branch = QueryBranch::parse("a \"first phrase\" b \"second\" c");
        assert_eq!(branch.phrases, ["first phrase", "second"]);
        assert_eq!(branch.residual, "a  b  c");
    }

    #[test]
    fn test_phrases_are_non_greedy() {
        // Two quoted sections, not one long one.
        let branch = QueryBranch::parse("\"a b\" x \"c d\"");
        assert_eq!(branch.phrases, ["a b", "c d"]);
        assert_eq!(branch.residual, "x");
    }

    #[test]
    fn test_unmatched_quote_stays_in_residual() {
        let branch = QueryBranch::parse("brown \"fox");
        assert!(branch.phrases.is_empty());
        assert_eq!(branch.residual, "brown \"fox");
    }

    #[test]
    fn test_or_inside_quotes_still_splits() {
        // The disjunction split runs before phrase extraction.
        let parsed = ParsedQuery::parse("\"cats OR dogs\"");
        assert_eq!(parsed.branches.len(), 2);
        assert_eq!(parsed.branches[0].residual, "\"cats");
        assert_eq!(parsed.branches[1].residual, "dogs\"");
    }

    #[test]
    fn test_phrase_only_branch() {
        let branch = QueryBranch::parse("\"slow green turtles\"");
        assert!(branch.has_phrases());
        assert!(!branch.has_residual());
    }
}
