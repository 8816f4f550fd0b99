//! Escape-sequence state machine for double-quoted and heredoc strings.
//!
//! The decoder consumes one character per step while a sequence is in
//! flight. Numeric modes have a fixed digit width; reaching the width
//! flushes the accumulated codepoint immediately, so the character after
//! the final digit is examined by the caller in plain-text mode.

use std::fmt;

/// Decoder mode. `None` means no escape sequence is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    #[default]
    None,
    /// Just saw a backslash; the next character selects the sequence.
    Start,
    /// `\ooo`, up to 3 octal digits.
    Octal,
    /// `\xHH`, exactly 2 hex digits.
    Hex,
    /// `\uHHHH`, exactly 4 hex digits.
    SmallUnicode,
    /// `\UHHHHHHHH`, exactly 8 hex digits.
    LargeUnicode,
}

impl EscapeMode {
    /// Fixed digit width of a numeric mode.
    const fn width(self) -> u8 {
        match self {
            Self::None | Self::Start => 0,
            Self::Hex => 2,
            Self::Octal => 3,
            Self::SmallUnicode => 4,
            Self::LargeUnicode => 8,
        }
    }

    const fn base(self) -> u32 {
        if matches!(self, Self::Octal) { 8 } else { 16 }
    }
}

/// Why a decoding step failed. The parser maps these onto syntax or
/// internal errors with the offending character's offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeFault {
    /// Character after `\` selects no known sequence.
    UnknownEscape(char),
    /// Non-digit inside a numeric sequence.
    BadDigit { mode: EscapeMode },
    /// Accumulated value is not a Unicode scalar value.
    InvalidCodepoint(u32),
    /// `feed` called while no sequence was in flight (a caller bug).
    Inactive,
}

impl fmt::Display for EscapeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEscape(ch) => {
                write!(f, "unknown escape character: {ch:?}")
            }
            Self::BadDigit {
                mode: EscapeMode::Octal,
            } => write!(f, "invalid octal digit"),
            Self::BadDigit { .. } => write!(f, "invalid hexadecimal digit"),
            Self::InvalidCodepoint(v) => {
                write!(f, "escape value {v:#x} is not a valid codepoint")
            }
            Self::Inactive => {
                write!(f, "escape decoder fed outside an escape sequence")
            }
        }
    }
}

/// Escape decoder state: mode, value accumulator, digits consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscapeState {
    mode: EscapeMode,
    accumulator: u32,
    digits: u8,
}

impl EscapeState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an escape sequence is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode != EscapeMode::None
    }

    /// Record the backslash that opens a sequence.
    pub fn begin(&mut self) {
        self.mode = EscapeMode::Start;
        self.accumulator = 0;
        self.digits = 0;
    }

    /// Consume one character of an in-flight sequence.
    ///
    /// Returns `Ok(Some(ch))` when the sequence completed and decoded
    /// `ch`, `Ok(None)` when more characters are required.
    ///
    /// # Errors
    ///
    /// [`EscapeFault`] on an unknown escape selector, a bad digit, or a
    /// completed value outside the Unicode scalar range.
    pub fn feed(&mut self, ch: char) -> Result<Option<char>, EscapeFault> {
        match self.mode {
            EscapeMode::None => Err(EscapeFault::Inactive),
            EscapeMode::Start => self.select(ch),
            mode => {
                let digit = ch
                    .to_digit(mode.base())
                    .ok_or(EscapeFault::BadDigit { mode })?;
                self.accumulator = self.accumulator * mode.base() + digit;
                self.digits += 1;
                debug_assert!(self.digits <= mode.width());
                if self.digits == mode.width() {
                    self.flush()
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn select(&mut self, ch: char) -> Result<Option<char>, EscapeFault> {
        let decoded = match ch {
            'a' => '\u{0007}',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{000B}',
            '\\' => '\\',
            '"' => '"',
            '$' => '$',
            'x' => {
                self.mode = EscapeMode::Hex;
                return Ok(None);
            }
            'u' => {
                self.mode = EscapeMode::SmallUnicode;
                return Ok(None);
            }
            'U' => {
                self.mode = EscapeMode::LargeUnicode;
                return Ok(None);
            }
            '0'..='7' => {
                self.mode = EscapeMode::Octal;
                // The selecting digit is the first octal digit.
                self.accumulator = u32::from(ch) - u32::from('0');
                self.digits = 1;
                return Ok(None);
            }
            other => return Err(EscapeFault::UnknownEscape(other)),
        };
        self.mode = EscapeMode::None;
        Ok(Some(decoded))
    }

    fn flush(&mut self) -> Result<Option<char>, EscapeFault> {
        let value = self.accumulator;
        self.mode = EscapeMode::None;
        self.accumulator = 0;
        self.digits = 0;
        char::from_u32(value)
            .map(Some)
            .ok_or(EscapeFault::InvalidCodepoint(value))
    }
}
