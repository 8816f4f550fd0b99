//! Lexer, parser, and AST for the slsh shell command language.
//!
//! Turns raw source text into a tree of string and word expressions,
//! detecting quoting, escape sequences, `$(...)` interpolation,
//! glob/tilde markers, and the shell control operators (pipe,
//! background, conjunction, redirection). Parsing is packrat-style:
//! rule outcomes are memoized per source offset so backtracking never
//! re-runs a rule body.
//!
//! # Quick start
//!
//! ```
//! use slsh_syntax::{NodeKind, parse_str};
//!
//! let node = parse_str("demo", "cat ~/notes/*.txt | grep TODO &").unwrap();
//! assert!(matches!(node.kind, NodeKind::Pipeline { background: true, .. }));
//! ```
//!
//! ```
//! use slsh_syntax::parse_str;
//!
//! let err = parse_str("demo", "\"left open").unwrap_err();
//! assert_eq!(err.to_string(), "demo:1:11: unterminated string literal");
//! ```
//!
//! Evaluating the tree (spawning processes, wiring redirections) is a
//! separate layer's job; this crate only produces the AST and exact
//! source positions for every node and error.

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod assemble;
pub mod ast;
pub mod classify;
pub mod escape;
pub mod expand;
pub mod memo;
pub mod parser;
pub mod source;

pub use ast::{Bareword, ExprOperator, Node, NodeKind, Redirect, RedirectKind};
pub use classify::{CharClass, classify};
pub use escape::{EscapeFault, EscapeMode, EscapeState};
pub use expand::{Environment, SystemEnvironment};
pub use memo::{Outcome, ParseMemoTable, RuleTag};
pub use parser::Parser;
pub use source::{SourceSpan, SourceUnit};

/// Malformed input at a specific offset.
///
/// `unclosed` is set exactly when the error was caused by reaching
/// end-of-input inside an open construct (quote, heredoc, escape,
/// parenthesis); an interactive caller may prompt for more input on
/// such errors instead of rejecting them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source_name}:{line}:{column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    /// Character offset at the point of detection, not the token start.
    pub offset: usize,
    /// 1-based line resolved through the source line table.
    pub line: usize,
    /// 1-based column resolved through the source line table.
    pub column: usize,
    pub source_name: String,
    pub unclosed: bool,
}

/// The parser reached a state it believes unreachable. A logic bug,
/// not user feedback; never cached and not meaningfully recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal parser error at offset {offset}: {message}")]
pub struct InternalError {
    pub message: String,
    pub offset: usize,
}

/// Unified error type covering both error kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A syntax error in the input.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// An implementation bug.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// True when the error only reflects input ending inside an open
    /// construct.
    #[must_use]
    pub const fn is_unclosed(&self) -> bool {
        matches!(self, Self::Syntax(SyntaxError { unclosed: true, .. }))
    }
}

/// Parse one complete expression from a named source text.
///
/// Trailing trivia and one final `;` are permitted; anything else after
/// the expression is a syntax error.
pub fn parse_str(name: &str, text: &str) -> Result<Node, Error> {
    let source = SourceUnit::new(name, text);
    let mut parser = Parser::new(&source);
    let node = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(node)
}

/// Parse a whole compilation unit: any number of `;`-separated
/// expressions.
pub fn parse_program(name: &str, text: &str) -> Result<Vec<Node>, Error> {
    let source = SourceUnit::new(name, text);
    let mut parser = Parser::new(&source);
    parser.parse_program()
}
