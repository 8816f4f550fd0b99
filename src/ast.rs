//! AST for parsed slsh expressions.
//!
//! A closed variant set: word-level nodes (`Literal`, `Interpolation`,
//! `Bareword`) produced by the string and bareword rules, and
//! expression-level nodes (`Command`, `Pipeline`, `Conjunction`)
//! produced by the operator grammar. Every node carries the exact span
//! of the characters consumed to build it.

use std::cell::RefCell;

use crate::expand::ExpansionSnapshot;
use crate::source::{SourceSpan, SourceUnit};

/// A parsed node with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: SourceSpan,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A fully decoded string with no embedded sub-expressions.
    Literal(String),
    /// A string with at least one embedded `$(...)` part. Parts are the
    /// alternating literal runs and sub-expression nodes in source
    /// order. A pure-literal string never takes this form.
    Interpolation(Vec<Node>),
    /// An unquoted word, possibly carrying deferred tilde/wildcard
    /// expansion.
    Bareword(Bareword),
    /// A run of words with their redirections.
    Command {
        words: Vec<Node>,
        redirects: Vec<Redirect>,
    },
    /// Two or more commands joined by `|`. `background` is set when the
    /// expression ended with `&` and no conjunction was involved.
    Pipeline {
        commands: Vec<Node>,
        background: bool,
    },
    /// Two or more pipelines joined by `&&`.
    Conjunction {
        pipelines: Vec<Node>,
        background: bool,
    },
}

impl Node {
    #[must_use]
    pub const fn new(kind: NodeKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }

    /// The exact source text this node was parsed from.
    #[must_use]
    pub fn source_text(&self, source: &SourceUnit) -> String {
        source.slice(self.span)
    }

    /// Decoded text when the node is a plain literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Literal(text) => Some(text),
            _ => None,
        }
    }
}

/// An unquoted word. `raw` preserves the marker characters (`~`, `*`)
/// as written; expansion is deferred until [`Bareword::value`] is
/// called with a live environment.
///
/// [`Bareword::value`]: crate::expand
#[derive(Debug, Clone, Default)]
pub struct Bareword {
    pub raw: String,
    pub needs_tilde: bool,
    pub needs_wildcard: bool,
    /// Single-slot expansion cache, written on first use and replaced
    /// whenever the recorded user/directory no longer match.
    pub(crate) cache: RefCell<Option<ExpansionSnapshot>>,
}

impl Bareword {
    #[must_use]
    pub fn new(raw: impl Into<String>, needs_tilde: bool, needs_wildcard: bool) -> Self {
        Self {
            raw: raw.into(),
            needs_tilde,
            needs_wildcard,
            cache: RefCell::new(None),
        }
    }
}

// The cache slot is derived state; two barewords are the same word
// regardless of what either has memoized.
impl PartialEq for Bareword {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
            && self.needs_tilde == other.needs_tilde
            && self.needs_wildcard == other.needs_wildcard
    }
}

/// Direction of a file-descriptor redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: read the target.
    Input,
    /// `>`: write the target.
    Output,
}

/// A redirection attached to a command. The target is a term; what it
/// resolves to (file path, inherited stream) is the execution layer's
/// concern.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    /// Explicit file descriptor (`2>`), if any.
    pub fd: Option<u32>,
    pub kind: RedirectKind,
    pub target: Node,
}

/// Operator recognized at the current offset by the operator rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOperator {
    /// `<` or `>`, optionally preceded by one descriptor digit.
    Redirect { fd: Option<u32>, kind: RedirectKind },
    /// `&`.
    Background,
    /// `&&`.
    Conjunction,
    /// `|`.
    Pipe,
    /// No operator here: the next input is a term or the sequence ended.
    Atomic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bareword_equality_ignores_cache() {
        let a = Bareword::new("~x", true, false);
        let b = Bareword::new("~x", true, false);
        *a.cache.borrow_mut() = Some(ExpansionSnapshot {
            value: "/home/u/x".to_string(),
            user: "u".to_string(),
            working_dir: "/tmp".into(),
        });
        assert_eq!(a, b);
    }

    #[test]
    fn literal_accessor() {
        let node = Node::new(NodeKind::Literal("hi".to_string()), SourceSpan::new(0, 4));
        assert_eq!(node.as_literal(), Some("hi"));
        let bare = Node::new(
            NodeKind::Bareword(Bareword::new("hi", false, false)),
            SourceSpan::new(0, 2),
        );
        assert_eq!(bare.as_literal(), None);
    }
}
