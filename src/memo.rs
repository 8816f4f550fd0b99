//! Packrat memoization table for the recursive-descent parser.
//!
//! Keyed by (rule, offset) with the offset taken after trivia skipping.
//! Entries are recorded once and never replaced: a later attempt at the
//! same key returns the identical recorded outcome without re-running
//! the rule body. The table is owned by one parser instance; two
//! unrelated parses never share entries.

use std::collections::HashMap;

use crate::SyntaxError;
use crate::ast::Node;

/// Identity of a memoized grammar rule. One tag per parse entry point,
/// not per AST node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTag {
    Bareword,
    StringLiteral,
    Term,
    Expression,
}

/// Recorded outcome of a rule attempt. Absence from the table means
/// "not yet parsed".
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Node),
    Failure(SyntaxError),
}

/// The parse table: (rule, offset) to recorded outcome.
#[derive(Debug, Default)]
pub struct ParseMemoTable {
    entries: HashMap<(RuleTag, usize), Outcome>,
}

impl ParseMemoTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn check(&self, tag: RuleTag, offset: usize) -> Option<&Outcome> {
        self.entries.get(&(tag, offset))
    }

    pub fn put_success(&mut self, tag: RuleTag, offset: usize, node: Node) {
        let prev = self.entries.insert((tag, offset), Outcome::Success(node));
        debug_assert!(prev.is_none(), "memo entry overwritten at {tag:?}@{offset}");
    }

    pub fn put_failure(&mut self, tag: RuleTag, offset: usize, error: SyntaxError) {
        let prev = self.entries.insert((tag, offset), Outcome::Failure(error));
        debug_assert!(prev.is_none(), "memo entry overwritten at {tag:?}@{offset}");
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::source::SourceSpan;

    fn node() -> Node {
        Node::new(NodeKind::Literal("x".to_string()), SourceSpan::new(0, 3))
    }

    #[test]
    fn unparsed_by_default() {
        let table = ParseMemoTable::new();
        assert!(table.check(RuleTag::Bareword, 0).is_none());
    }

    #[test]
    fn success_recorded_per_tag_and_offset() {
        let mut table = ParseMemoTable::new();
        table.put_success(RuleTag::Bareword, 3, node());
        assert_eq!(
            table.check(RuleTag::Bareword, 3),
            Some(&Outcome::Success(node()))
        );
        assert!(table.check(RuleTag::Bareword, 4).is_none());
        assert!(table.check(RuleTag::Term, 3).is_none());
    }

    #[test]
    fn failure_recorded() {
        let mut table = ParseMemoTable::new();
        let err = SyntaxError {
            message: "unexpected empty bareword".to_string(),
            offset: 3,
            line: 1,
            column: 4,
            source_name: "test".to_string(),
            unclosed: false,
        };
        table.put_failure(RuleTag::Bareword, 3, err.clone());
        assert_eq!(
            table.check(RuleTag::Bareword, 3),
            Some(&Outcome::Failure(err))
        );
    }
}
