//! Codepoint classification for bareword recognition.

/// Lexical class of a single codepoint inside a bareword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Contributes itself to the bareword.
    Ordinary(char),
    /// `~`, legal only as the first character; marks tilde expansion.
    Tilde,
    /// `*`; marks wildcard expansion.
    Wildcard,
    /// Cannot continue the token. Never consumed by the classifier's
    /// caller; the caller decides what the boundary means.
    EndingHint,
    /// ASCII punctuation or control with no defined meaning here.
    Invalid,
}

/// Punctuation that is always safe inside a bareword.
const OPERATOR_SAFE: [char; 8] = ['!', '%', '+', '-', ',', '/', '\\', '_'];

/// Classify one codepoint.
///
/// Barewords accept arbitrary non-ASCII text (paths, filenames) while
/// rejecting the few ASCII codepoints that would indicate a typo or
/// unsupported syntax. `|`, `;`, `)` and whitespace end the token.
#[must_use]
pub fn classify(ch: char) -> CharClass {
    match ch {
        '~' => CharClass::Tilde,
        '*' => CharClass::Wildcard,
        '|' | ';' | ')' => CharClass::EndingHint,
        c if OPERATOR_SAFE.contains(&c) => CharClass::Ordinary(c),
        c if c.is_whitespace() => CharClass::EndingHint,
        c if c.is_numeric() || c.is_alphabetic() || is_printable(c) => CharClass::Ordinary(c),
        c if c.is_ascii() => CharClass::Invalid,
        c => CharClass::Ordinary(c),
    }
}

/// Printable here means: not a control character, not a Unicode
/// noncharacter, and not in the Specials block (U+FFF0..=U+FFFF).
fn is_printable(ch: char) -> bool {
    let cp = u32::from(ch);
    if ch.is_control() || (0xFFF0..=0xFFFF).contains(&cp) {
        return false;
    }
    // Noncharacters: U+FDD0..=U+FDEF and the last two codepoints of
    // every plane.
    if (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE {
        return false;
    }
    true
}
