//! Memoized recursive-descent parser for slsh expressions.
//!
//! One parser instance owns one offset cursor and one memo table for a
//! single source unit. Recursion for `$(...)` interpolation re-enters
//! the same instance; that is safe because each recursive call works at
//! a strictly later offset and the memo table is keyed by absolute
//! offset.

use crate::assemble::StringAssembler;
use crate::ast::{Bareword, ExprOperator, Node, NodeKind, Redirect, RedirectKind};
use crate::classify::{CharClass, classify};
use crate::escape::{EscapeFault, EscapeState};
use crate::memo::{Outcome, ParseMemoTable, RuleTag};
use crate::source::{SourceSpan, SourceUnit};
use crate::{Error, InternalError, SyntaxError};

/// Recursive-descent driver over one source unit.
///
/// Single-threaded and non-reentrant per instance: a parse either
/// produces a node or unwinds with a syntax error, rolling the cursor
/// back so an outer rule can try an alternative.
#[derive(Debug)]
pub struct Parser<'a> {
    source: &'a SourceUnit,
    offset: usize,
    memo: ParseMemoTable,
    #[cfg(test)]
    rule_runs: usize,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a SourceUnit) -> Self {
        Self {
            source,
            offset: 0,
            memo: ParseMemoTable::new(),
            #[cfg(test)]
            rule_runs: 0,
        }
    }

    /// Current cursor position, in characters.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    // ---------------------------------------------------------------
    // Cursor primitives.
    // ---------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.source.char_at(self.offset)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.source.char_at(self.offset + ahead)
    }

    fn advance(&mut self) {
        self.offset += 1;
    }

    /// Length of the run of `ch` starting at the cursor.
    fn run_len(&self, ch: char) -> usize {
        let mut n = 0;
        while self.peek_at(n) == Some(ch) {
            n += 1;
        }
        n
    }

    /// Skip insignificant whitespace and `#` line comments. A shebang
    /// line is an ordinary comment.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    // ---------------------------------------------------------------
    // Errors.
    // ---------------------------------------------------------------

    fn error_at(&self, offset: usize, message: impl Into<String>, unclosed: bool) -> SyntaxError {
        let (line, column) = self.source.line_col(offset);
        SyntaxError {
            message: message.into(),
            offset,
            line,
            column,
            source_name: self.source.name().to_string(),
            unclosed,
        }
    }

    /// Syntax error at the point of detection.
    fn syntax_error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(self.offset, message, false)
    }

    /// End-of-input inside an open construct; callers such as a REPL
    /// may prompt for more input instead of rejecting.
    fn unclosed_error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(self.offset, message, true)
    }

    // ---------------------------------------------------------------
    // Memoized rule driver.
    // ---------------------------------------------------------------

    /// Run `body` as the memoized rule `tag`.
    ///
    /// Trivia is skipped first and the offset after skipping is the
    /// memo key. A recorded success is returned without re-running the
    /// body (advancing just past the node); a recorded failure is
    /// re-raised immediately. On any error the cursor rolls back to its
    /// position before trivia skipping, so backtracking resumes from a
    /// clean position. Internal errors propagate uncached.
    fn with_context<F>(&mut self, tag: RuleTag, body: F) -> Result<Node, Error>
    where
        F: FnOnce(&mut Self) -> Result<Node, Error>,
    {
        let before = self.offset;
        self.skip_trivia();
        let key = self.offset;

        match self.memo.check(tag, key) {
            Some(Outcome::Success(node)) => {
                log::trace!("memo hit: {tag:?} at {key}");
                let node = node.clone();
                self.offset = node.span.end();
                return Ok(node);
            }
            Some(Outcome::Failure(error)) => {
                log::trace!("memo failure hit: {tag:?} at {key}");
                let error = error.clone();
                self.offset = before;
                return Err(Error::Syntax(error));
            }
            None => {}
        }

        #[cfg(test)]
        {
            self.rule_runs += 1;
        }
        match body(self) {
            Ok(node) => {
                self.memo.put_success(tag, key, node.clone());
                Ok(node)
            }
            Err(Error::Syntax(error)) => {
                self.memo.put_failure(tag, key, error.clone());
                self.offset = before;
                Err(Error::Syntax(error))
            }
            Err(internal @ Error::Internal(_)) => {
                self.offset = before;
                Err(internal)
            }
        }
    }

    // ---------------------------------------------------------------
    // Barewords.
    // ---------------------------------------------------------------

    /// Parse an unquoted word, recording tilde/wildcard markers for
    /// deferred expansion.
    ///
    /// # Errors
    ///
    /// Syntax errors for an invalid character, a misplaced tilde, or an
    /// empty production.
    pub fn parse_bareword(&mut self) -> Result<Node, Error> {
        self.with_context(RuleTag::Bareword, Self::bareword_body)
    }

    fn bareword_body(&mut self) -> Result<Node, Error> {
        let start = self.offset;
        let mut raw = String::new();
        let mut needs_tilde = false;
        let mut needs_wildcard = false;

        while let Some(ch) = self.peek() {
            match classify(ch) {
                CharClass::EndingHint => break,
                CharClass::Invalid => {
                    return Err(self.syntax_error("invalid character in bareword").into());
                }
                CharClass::Tilde => {
                    if !raw.is_empty() {
                        return Err(self
                            .syntax_error(
                                "tilde symbol can only be placed at the beginning of a bareword",
                            )
                            .into());
                    }
                    raw.push('~');
                    needs_tilde = true;
                }
                CharClass::Wildcard => {
                    raw.push('*');
                    needs_wildcard = true;
                }
                CharClass::Ordinary(c) => raw.push(c),
            }
            self.advance();
        }

        if raw.is_empty() {
            return Err(self.syntax_error("unexpected empty bareword").into());
        }
        let span = SourceSpan::new(start, self.offset - start);
        Ok(Node::new(
            NodeKind::Bareword(Bareword::new(raw, needs_tilde, needs_wildcard)),
            span,
        ))
    }

    // ---------------------------------------------------------------
    // Quoted strings.
    // ---------------------------------------------------------------

    /// Parse a single-quoted, double-quoted, or heredoc (triple-quoted)
    /// string literal.
    ///
    /// # Errors
    ///
    /// Syntax errors for malformed escapes or quote counts; unclosed
    /// errors when input ends inside the literal.
    pub fn parse_string(&mut self) -> Result<Node, Error> {
        self.with_context(RuleTag::StringLiteral, Self::string_body)
    }

    fn string_body(&mut self) -> Result<Node, Error> {
        match self.peek() {
            Some('\'') => self.single_quoted(),
            Some('"') => self.double_or_heredoc(),
            _ => Err(self.syntax_error("expected string literal").into()),
        }
    }

    /// `'...'` with `''` as the only escape; no interpolation.
    fn single_quoted(&mut self) -> Result<Node, Error> {
        let start = self.offset;
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self
                        .unclosed_error("unterminated single-quoted string")
                        .into());
                }
                Some('\'') => {
                    self.advance();
                    if self.peek() == Some('\'') {
                        value.push('\'');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
        let span = SourceSpan::new(start, self.offset - start);
        Ok(Node::new(NodeKind::Literal(value), span))
    }

    /// Shared driver for `"..."` and `"""..."""`, selected by the count
    /// of leading quotes. Two or six adjacent quotes are the degenerate
    /// empty literal.
    fn double_or_heredoc(&mut self) -> Result<Node, Error> {
        let start = self.offset;
        let leading = self.run_len('"');
        match leading {
            1 | 3 => {
                for _ in 0..leading {
                    self.advance();
                }
                self.quoted_body(start, leading)
            }
            2 | 6 => {
                for _ in 0..leading {
                    self.advance();
                }
                let span = SourceSpan::new(start, leading);
                Ok(Node::new(NodeKind::Literal(String::new()), span))
            }
            _ => Err(self.syntax_error("unexpected number of quote characters").into()),
        }
    }

    fn quoted_body(&mut self, start: usize, closing: usize) -> Result<Node, Error> {
        let mut assembler = StringAssembler::new(self.offset);
        let mut escape = EscapeState::new();

        loop {
            let Some(ch) = self.peek() else {
                let message = if escape.is_active() {
                    "unterminated escape sequence"
                } else if closing == 3 {
                    "unterminated heredoc string"
                } else {
                    "unterminated string literal"
                };
                return Err(self.unclosed_error(message).into());
            };

            if escape.is_active() {
                match escape.feed(ch) {
                    Ok(Some(decoded)) => {
                        assembler.push_char(decoded);
                        self.advance();
                    }
                    Ok(None) => self.advance(),
                    Err(EscapeFault::Inactive) => {
                        return Err(InternalError {
                            message: "escape decoder fed while idle".to_string(),
                            offset: self.offset,
                        }
                        .into());
                    }
                    Err(fault) => {
                        return Err(self.syntax_error(fault.to_string()).into());
                    }
                }
                continue;
            }

            match ch {
                '\\' => {
                    escape.begin();
                    self.advance();
                }
                '$' => {
                    assembler.flush_run(self.offset);
                    self.advance();
                    match self.peek() {
                        Some('(') => {}
                        // The string is still open, so input ending
                        // here is a continuation point.
                        None => {
                            return Err(self
                                .unclosed_error("expected '(' after '$' in string interpolation")
                                .into());
                        }
                        Some(_) => {
                            return Err(self
                                .syntax_error("expected '(' after '$' in string interpolation")
                                .into());
                        }
                    }
                    let part = self.parse_parenthesized()?;
                    assembler.push_part(part, self.offset);
                }
                '"' if closing == 1 || self.run_len('"') >= 3 => {
                    let content_end = self.offset;
                    for _ in 0..closing {
                        self.advance();
                    }
                    let span = SourceSpan::new(start, self.offset - start);
                    return Ok(assembler.finish(content_end, span));
                }
                other => {
                    assembler.push_char(other);
                    self.advance();
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Terms and operators.
    // ---------------------------------------------------------------

    /// Parse one expression term: a quoted string, a parenthesized
    /// sub-expression, or a bareword.
    ///
    /// # Errors
    ///
    /// Propagates the dispatched rule's error; end of input where a
    /// term was required is a syntax error.
    pub fn parse_expression_term(&mut self) -> Result<Node, Error> {
        self.with_context(RuleTag::Term, |parser| match parser.peek() {
            Some('\'' | '"') => parser.parse_string(),
            Some('(') => parser.parse_parenthesized(),
            Some(_) => parser.parse_bareword(),
            None => Err(parser
                .unclosed_error("unexpected end of input, expected expression term")
                .into()),
        })
    }

    /// `( expression )`; the resulting node is the inner expression
    /// with its span widened to cover the parentheses, so memo replay
    /// of the surrounding term advances past the `)`.
    fn parse_parenthesized(&mut self) -> Result<Node, Error> {
        debug_assert_eq!(self.peek(), Some('('));
        let start = self.offset;
        self.advance();
        let mut node = self.parse_expression()?;
        self.skip_trivia();
        match self.peek() {
            Some(')') => {
                self.advance();
                node.span = SourceSpan::new(start, self.offset - start);
                Ok(node)
            }
            None => Err(self
                .unclosed_error("unterminated parenthesized expression")
                .into()),
            Some(_) => Err(self.syntax_error("expected ')'").into()),
        }
    }

    /// Classify the operator at the cursor, consuming it if one is
    /// recognized. [`ExprOperator::Atomic`] (no operator here) leaves
    /// the cursor untouched.
    ///
    /// # Errors
    ///
    /// "unknown expression operator" for a malformed repeat count such
    /// as `&&&`, `||`, or `>>`.
    pub fn parse_expr_operator(&mut self) -> Result<ExprOperator, Error> {
        let before = self.offset;
        self.skip_trivia();
        let at = self.offset;

        let operator = match self.peek() {
            Some('&') => match self.run_len('&') {
                1 => Some((ExprOperator::Background, 1)),
                2 => Some((ExprOperator::Conjunction, 2)),
                _ => None,
            },
            Some('|') => match self.run_len('|') {
                1 => Some((ExprOperator::Pipe, 1)),
                _ => None,
            },
            Some(arrow @ ('<' | '>')) => match self.run_len(arrow) {
                1 => Some((
                    ExprOperator::Redirect {
                        fd: None,
                        kind: redirect_kind(arrow),
                    },
                    1,
                )),
                _ => None,
            },
            Some(digit @ '0'..='9') => match self.peek_at(1) {
                Some(arrow @ ('<' | '>')) => {
                    if self.peek_at(2) == Some(arrow) {
                        None
                    } else {
                        Some((
                            ExprOperator::Redirect {
                                fd: digit.to_digit(10),
                                kind: redirect_kind(arrow),
                            },
                            2,
                        ))
                    }
                }
                _ => {
                    self.offset = before;
                    return Ok(ExprOperator::Atomic);
                }
            },
            _ => {
                self.offset = before;
                return Ok(ExprOperator::Atomic);
            }
        };

        match operator {
            Some((op, width)) => {
                self.offset = at + width;
                Ok(op)
            }
            None => {
                let error = self.error_at(at, "unknown expression operator", false);
                self.offset = before;
                Err(error.into())
            }
        }
    }

    // ---------------------------------------------------------------
    // Expressions.
    // ---------------------------------------------------------------

    /// command := ( term | redirect )+
    fn parse_command(&mut self) -> Result<(Node, ExprOperator), Error> {
        let mut words: Vec<Node> = Vec::new();
        let mut redirects: Vec<Redirect> = Vec::new();
        let mut redirect_starts: Vec<usize> = Vec::new();
        let trailing;
        loop {
            match self.parse_expr_operator()? {
                ExprOperator::Atomic => {
                    let checkpoint = self.offset;
                    self.skip_trivia();
                    match self.peek() {
                        None | Some(')' | ';') => {
                            self.offset = checkpoint;
                            trailing = ExprOperator::Atomic;
                            break;
                        }
                        Some(_) => words.push(self.parse_expression_term()?),
                    }
                }
                ExprOperator::Redirect { fd, kind } => {
                    // The operator rule consumed `<`/`>` plus an
                    // optional fd digit; the command span starts there
                    // when no word precedes the redirect.
                    let width = if fd.is_some() { 2 } else { 1 };
                    redirect_starts.push(self.offset - width);
                    let target = self.parse_expression_term()?;
                    redirects.push(Redirect { fd, kind, target });
                }
                op => {
                    trailing = op;
                    break;
                }
            }
        }

        let spans = words
            .iter()
            .map(|w| w.span)
            .chain(redirects.iter().map(|r| r.target.span))
            .collect::<Vec<_>>();
        let Some(first) = spans
            .iter()
            .map(|s| s.start)
            .chain(redirect_starts.iter().copied())
            .min()
        else {
            // At end of input this is a continuation point (`a |`,
            // `a &&`); mid-input it is a stray operator.
            let error = if self.peek().is_none() {
                self.unclosed_error("expected a command term")
            } else {
                self.syntax_error("expected a command term")
            };
            return Err(error.into());
        };
        let last = spans.iter().map(SourceSpan::end).max().unwrap_or(first);
        let span = SourceSpan::new(first, last - first);

        // A lone word with no redirections is its own command.
        if redirects.is_empty() && words.len() == 1 {
            return Ok((words.swap_remove(0), trailing));
        }
        Ok((Node::new(NodeKind::Command { words, redirects }, span), trailing))
    }

    /// pipeline := command ( "|" command )*
    fn parse_pipeline(&mut self) -> Result<(Node, ExprOperator), Error> {
        let (first, mut op) = self.parse_command()?;
        let mut commands = vec![first];
        while op == ExprOperator::Pipe {
            let (next, next_op) = self.parse_command()?;
            commands.push(next);
            op = next_op;
        }
        if commands.len() == 1 {
            return Ok((commands.swap_remove(0), op));
        }
        let start = commands[0].span.start;
        let end = commands[commands.len() - 1].span.end();
        let node = Node::new(
            NodeKind::Pipeline {
                commands,
                background: false,
            },
            SourceSpan::new(start, end - start),
        );
        Ok((node, op))
    }

    /// expression := pipeline ( "&&" pipeline )* [ "&" ]
    ///
    /// Left-to-right grouping; parenthesized sub-expressions are atomic
    /// terms. Single-command pipelines and single-pipeline conjunctions
    /// collapse to the inner node.
    ///
    /// # Errors
    ///
    /// Any term/operator error, plus "unexpected input after '&'" when
    /// a backgrounded expression is not the last thing in its sequence.
    pub fn parse_expression(&mut self) -> Result<Node, Error> {
        self.with_context(RuleTag::Expression, Self::expression_body)
    }

    fn expression_body(&mut self) -> Result<Node, Error> {
        let (first, mut op) = self.parse_pipeline()?;
        let mut pipelines = vec![first];
        while op == ExprOperator::Conjunction {
            let (next, next_op) = self.parse_pipeline()?;
            pipelines.push(next);
            op = next_op;
        }

        let background = op == ExprOperator::Background;
        let mut end = pipelines[pipelines.len() - 1].span.end();
        if background {
            // The '&' was consumed by the operator rule.
            end = self.offset;
            let checkpoint = self.offset;
            self.skip_trivia();
            match self.peek() {
                None | Some(')' | ';') => self.offset = checkpoint,
                Some(_) => {
                    return Err(self.syntax_error("unexpected input after '&'").into());
                }
            }
        }

        if pipelines.len() == 1 {
            let node = pipelines.swap_remove(0);
            if !background {
                return Ok(node);
            }
            let span = SourceSpan::new(node.span.start, end - node.span.start);
            let kind = match node.kind {
                NodeKind::Pipeline { commands, .. } => NodeKind::Pipeline {
                    commands,
                    background: true,
                },
                _ => NodeKind::Pipeline {
                    commands: vec![node],
                    background: true,
                },
            };
            return Ok(Node::new(kind, span));
        }

        let start = pipelines[0].span.start;
        Ok(Node::new(
            NodeKind::Conjunction {
                pipelines,
                background,
            },
            SourceSpan::new(start, end - start),
        ))
    }

    /// program := expression ( ";" expression )* [";"]
    ///
    /// Stray separators are tolerated; anything else left over after an
    /// expression is a syntax error.
    ///
    /// # Errors
    ///
    /// Any expression error, or "unexpected trailing input".
    pub fn parse_program(&mut self) -> Result<Vec<Node>, Error> {
        let mut nodes = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(';') => {
                    self.advance();
                    continue;
                }
                Some(_) => {}
            }
            nodes.push(self.parse_expression()?);
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(';') => self.advance(),
                Some(_) => {
                    return Err(self.syntax_error("unexpected trailing input").into());
                }
            }
        }
        Ok(nodes)
    }

    /// Require that only trivia and an optional final `;` remain.
    ///
    /// # Errors
    ///
    /// "unexpected trailing input" otherwise.
    pub fn expect_end(&mut self) -> Result<(), Error> {
        self.skip_trivia();
        if self.peek() == Some(';') {
            self.advance();
            self.skip_trivia();
        }
        if self.peek().is_some() {
            return Err(self.syntax_error("unexpected trailing input").into());
        }
        Ok(())
    }
}

const fn redirect_kind(arrow: char) -> RedirectKind {
    if arrow == '<' {
        RedirectKind::Input
    } else {
        RedirectKind::Output
    }
}
