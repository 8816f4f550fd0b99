//! Accumulates decoded string content into a single AST node.

use crate::ast::{Node, NodeKind};
use crate::source::SourceSpan;

/// Collects literal runs and interpolated sub-nodes while the string
/// driver walks a quoted body. Produces a flat [`NodeKind::Literal`]
/// unless at least one sub-expression was submitted, in which case the
/// result is a [`NodeKind::Interpolation`] with parts in source order.
#[derive(Debug)]
pub struct StringAssembler {
    run: String,
    run_start: usize,
    parts: Vec<Node>,
}

impl StringAssembler {
    /// `at` is the offset where decoded content begins (just after the
    /// opening quotes).
    #[must_use]
    pub const fn new(at: usize) -> Self {
        Self {
            run: String::new(),
            run_start: at,
            parts: Vec::new(),
        }
    }

    pub fn push_char(&mut self, ch: char) {
        self.run.push(ch);
    }

    /// Close the pending literal run at `at`, emitting it as a part if
    /// it holds any decoded characters.
    pub fn flush_run(&mut self, at: usize) {
        if !self.run.is_empty() {
            let literal = std::mem::take(&mut self.run);
            let span = SourceSpan::new(self.run_start, at - self.run_start);
            self.parts.push(Node::new(NodeKind::Literal(literal), span));
        }
        self.run_start = at;
    }

    /// Append an interpolated sub-expression; the next literal run
    /// starts at `at` (just past the sub-expression).
    pub fn push_part(&mut self, node: Node, at: usize) {
        self.parts.push(node);
        self.run_start = at;
    }

    /// Finish the string. `content_end` is the offset of the closing
    /// quotes; `span` covers the full token, quotes included.
    #[must_use]
    pub fn finish(mut self, content_end: usize, span: SourceSpan) -> Node {
        if self.parts.is_empty() {
            return Node::new(NodeKind::Literal(self.run), span);
        }
        self.flush_run(content_end);
        Node::new(NodeKind::Interpolation(self.parts), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_literal_stays_flat() {
        let mut asm = StringAssembler::new(1);
        asm.push_char('h');
        asm.push_char('i');
        let node = asm.finish(3, SourceSpan::new(0, 4));
        assert_eq!(node.kind, NodeKind::Literal("hi".to_string()));
    }

    #[test]
    fn empty_literal() {
        let asm = StringAssembler::new(1);
        let node = asm.finish(1, SourceSpan::new(0, 2));
        assert_eq!(node.kind, NodeKind::Literal(String::new()));
    }

    #[test]
    fn interpolation_keeps_source_order() {
        let mut asm = StringAssembler::new(1);
        asm.push_char('a');
        asm.flush_run(2);
        let sub = Node::new(NodeKind::Literal("x".to_string()), SourceSpan::new(2, 4));
        asm.push_part(sub, 6);
        asm.push_char('b');
        let node = asm.finish(8, SourceSpan::new(0, 9));
        let NodeKind::Interpolation(parts) = node.kind else {
            panic!("expected interpolation");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].as_literal(), Some("a"));
        assert_eq!(parts[2].as_literal(), Some("b"));
        assert_eq!(parts[2].span, SourceSpan::new(6, 2));
    }

    #[test]
    fn leading_interpolation_has_no_empty_run() {
        let mut asm = StringAssembler::new(1);
        asm.flush_run(1);
        let sub = Node::new(NodeKind::Literal("x".to_string()), SourceSpan::new(1, 4));
        asm.push_part(sub, 5);
        let node = asm.finish(5, SourceSpan::new(0, 6));
        let NodeKind::Interpolation(parts) = node.kind else {
            panic!("expected interpolation");
        };
        assert_eq!(parts.len(), 1);
    }
}
