//! Module `scanner` implements a one‑pass, streaming, indentation‑aware lexer for
//! the minipy language.
//!
//! It transforms a source string into a sequence of `Token<'a>`s, skipping
//! whitespace and comments, synthesising the layout tokens `NEWLINE`, `INDENT`
//! and `DEDENT`, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token<'a>, PyError>` on each `.next()`. A lexing error is
//!   reported in place and scanning resumes with the following byte.
//!
//! # Layout rules
//!
//! 1. **Logical lines**
//!    - A `NEWLINE` closes every line that produced at least one token.
//!    - Blank lines and comment‑only lines produce nothing.
//!    - Line breaks inside `()`, `[]` or `{}` are ignored, as are breaks
//!      preceded by a backslash.
//!
//! 2. **Indentation**
//!    - The width of the leading whitespace (tab = 4 columns) is compared with
//!      a stack of open levels: deeper pushes a level and emits `INDENT`,
//!      shallower pops levels and emits one `DEDENT` per level.
//!    - Dedenting to a width that was never opened is an error.
//!
//! 3. **End of input**
//!    - The last line is closed with `NEWLINE` if needed, every open level is
//!      closed with `DEDENT`, then `EOF` is emitted.
//!
//! # Token recognition
//!
//! - Punctuators: `(`, `)`, `[`, `]`, `{`, `}`, `,`, `:`, `.`.
//! - Operators: `+ - * /` with their `=`‑suffixed augmented forms, `=`, `==`,
//!   `!=`, `<`, `<=`, `>`, `>=`.
//! - String literals in single or double quotes with backslash escapes.
//! - Integer and float literals (fraction and/or exponent make a float).
//! - Identifiers/keywords resolved via a perfect‑hash `KEYWORDS` map.
//! - `#` comments skipped with `memchr` up to the next new‑line.

use crate::error::{PyError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::collections::VecDeque;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"      => TokenType::AND,
    b"or"       => TokenType::OR,
    b"not"      => TokenType::NOT,
    b"in"       => TokenType::IN,
    b"if"       => TokenType::IF,
    b"elif"     => TokenType::ELIF,
    b"else"     => TokenType::ELSE,
    b"while"    => TokenType::WHILE,
    b"for"      => TokenType::FOR,
    b"def"      => TokenType::DEF,
    b"return"   => TokenType::RETURN,
    b"break"    => TokenType::BREAK,
    b"continue" => TokenType::CONTINUE,
    b"pass"     => TokenType::PASS,
    b"assert"   => TokenType::ASSERT,
    b"exit"     => TokenType::EXIT,
    b"class"    => TokenType::CLASS,
    b"lambda"   => TokenType::LAMBDA,
    b"True"     => TokenType::TRUE,
    b"False"    => TokenType::FALSE,
    b"None"     => TokenType::NONE,
};

/// Width of a tab character when measuring indentation.
const TAB_WIDTH: usize = 4;

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.  The lifetime `'a` ties every emitted token’s
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    source: &'a str,            // entire source file
    src: &'a [u8],              // byte view of `source`
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    token_line: usize,          // line on which the current lexeme started
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
    queued: VecDeque<Token<'a>>, // synthesised layout tokens waiting to be emitted
    indents: Vec<usize>,        // open indentation levels, bottom is always 0
    nesting: usize,             // bracket depth; layout is suspended while > 0
    at_line_start: bool,        // next byte begins a physical line
    line_has_tokens: bool,      // current logical line produced a token
    finished: bool,             // EOF has been queued
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            token_line: 1,
            pending: None,
            queued: VecDeque::new(),
            indents: vec![0],
            nesting: 0,
            at_line_start: true,
            line_has_tokens: false,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip a `#` comment, leaving the terminating new‑line unconsumed.
    #[inline(always)]
    fn skip_comment(&mut self) {
        if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
            self.curr += pos;
        } else {
            self.curr = self.len();
        }
    }

    fn queue(&mut self, token_type: TokenType) {
        self.queued.push_back(Token::new(token_type, "", self.line));
    }

    // ───────────────────────────── layout ──────────────────────────────────

    /// Measure the indentation of the physical line starting at `self.curr`
    /// and queue the matching `INDENT`/`DEDENT` tokens.  Blank and
    /// comment‑only lines are consumed entirely.
    fn scan_indentation(&mut self) -> Result<()> {
        let mut width: usize = 0;

        while !self.is_at_end() {
            match self.peek() {
                b' ' => width += 1,
                b'\t' => width += TAB_WIDTH,
                b'\r' => {}
                _ => break,
            }

            self.advance();
        }

        match self.peek() {
            // blank line or end of input: indentation is meaningless
            0 if self.is_at_end() => return Ok(()),

            b'\n' => {
                self.advance();
                self.line += 1;

                return Ok(());
            }

            b'#' => {
                self.skip_comment();

                return Ok(());
            }

            _ => {}
        }

        self.at_line_start = false;

        let current: usize = *self.indents.last().unwrap_or(&0);

        if width > current {
            debug!("Indent to width {} on line {}", width, self.line);

            self.indents.push(width);
            self.queue(TokenType::INDENT);
        } else if width < current {
            while self.indents.last().is_some_and(|&level| level > width) {
                self.indents.pop();
                self.queue(TokenType::DEDENT);
            }

            if self.indents.last() != Some(&width) {
                self.indents.push(width);

                return Err(PyError::lex(
                    self.line,
                    "unindent does not match any outer indentation level",
                ));
            }

            debug!("Dedent to width {} on line {}", width, self.line);
        }

        Ok(())
    }

    /// Close the last logical line and every open block, then emit `EOF`.
    fn finish(&mut self) {
        if self.line_has_tokens {
            self.line_has_tokens = false;
            self.queue(TokenType::NEWLINE);
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.queue(TokenType::DEDENT);
        }

        self.queue(TokenType::EOF);
        self.finished = true;
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── brackets (track nesting to suspend layout) ───────────────
            b'(' => self.open(TokenType::LEFT_PAREN),
            b'[' => self.open(TokenType::LEFT_BRACKET),
            b'{' => self.open(TokenType::LEFT_BRACE),
            b')' => self.close(TokenType::RIGHT_PAREN),
            b']' => self.close(TokenType::RIGHT_BRACKET),
            b'}' => self.close(TokenType::RIGHT_BRACE),

            // ── single‑character punctuators ──────────────────────────────
            b',' => self.pending = Some(TokenType::COMMA),
            b':' => self.pending = Some(TokenType::COLON),
            b'.' => self.pending = Some(TokenType::DOT),

            // ── arithmetic with optional augmented form ──────────────────
            b'+' => self.operator(TokenType::PLUS_EQUAL, TokenType::PLUS),
            b'-' => self.operator(TokenType::MINUS_EQUAL, TokenType::MINUS),
            b'*' => self.operator(TokenType::STAR_EQUAL, TokenType::STAR),
            b'/' => self.operator(TokenType::SLASH_EQUAL, TokenType::SLASH),

            // ── comparison / assignment ──────────────────────────────────
            b'=' => self.operator(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.operator(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.operator(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'!' => {
                if !self.match_byte(b'=') {
                    return Err(PyError::lex(self.line, "Unexpected character: !"));
                }

                self.pending = Some(TokenType::BANG_EQUAL);
            }

            // ── whitespace ───────────────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                if self.nesting == 0 && self.line_has_tokens {
                    self.line_has_tokens = false;
                    self.pending = Some(TokenType::NEWLINE);
                }

                self.line += 1;
                self.at_line_start = self.nesting == 0;

                return Ok(());
            }

            // ── explicit line continuation ───────────────────────────────
            b'\\' => {
                self.match_byte(b'\r');

                if !self.match_byte(b'\n') {
                    return Err(PyError::lex(
                        self.line,
                        "unexpected character after line continuation character",
                    ));
                }

                self.line += 1;

                return Ok(());
            }

            b'#' => {
                self.skip_comment();

                return Ok(());
            }

            b'"' | b'\'' => {
                return self.parse_string(b);
            }

            b'0'..=b'9' => {
                return self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                // Report the whole UTF‑8 character, not just its lead byte.
                let ch: char = self.source[self.start..].chars().next().unwrap_or('?');
                self.curr = self.start + ch.len_utf8();

                return Err(PyError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        }

        Ok(())
    }

    #[inline(always)]
    fn open(&mut self, tt: TokenType) {
        self.nesting += 1;
        self.pending = Some(tt);
    }

    #[inline(always)]
    fn close(&mut self, tt: TokenType) {
        self.nesting = self.nesting.saturating_sub(1);
        self.pending = Some(tt);
    }

    /// Emit `with_equal` if the next byte is `=`, otherwise `alone`.
    #[inline(always)]
    fn operator(&mut self, with_equal: TokenType, alone: TokenType) {
        let tt = if self.match_byte(b'=') { with_equal } else { alone };

        self.pending = Some(tt);
    }

    /// Parse a quoted string literal delimited by `quote`.
    ///
    /// * `self.start` still points to the opening quote.
    /// * When we return, `self.curr` points **past** the closing quote.
    fn parse_string(&mut self, quote: u8) -> Result<()> {
        let mut value: Vec<u8> = Vec::new();

        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(PyError::lex(self.line, "Unterminated string."));
            }

            let c = self.advance();

            if c == quote {
                break;
            }

            if c != b'\\' {
                value.push(c);
                continue;
            }

            if self.is_at_end() {
                return Err(PyError::lex(self.line, "Unterminated string."));
            }

            match self.advance() {
                b'n' => value.push(b'\n'),
                b't' => value.push(b'\t'),
                b'r' => value.push(b'\r'),
                b'0' => value.push(0),
                b'\\' => value.push(b'\\'),
                b'"' => value.push(b'"'),
                b'\'' => value.push(b'\''),
                b'\n' => self.line += 1,
                other => {
                    value.push(b'\\');
                    value.push(other);
                }
            }
        }

        let s: String = String::from_utf8(value)
            .map_err(|_| PyError::lex(self.line, "Invalid UTF-8 in string literal."))?;

        self.pending = Some(TokenType::STRING(s));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`, `1e9`, `2.5E-3`).
    fn parse_number(&mut self) -> Result<()> {
        let mut is_float = false;

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part; `1.` is a float, `1.x` is attribute access.
        let next: u8 = self.peek_next();

        if self.peek() == b'.' && !(next.is_ascii_alphabetic() || next == b'_') {
            is_float = true;
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Optional exponent.
        if matches!(self.peek(), b'e' | b'E') {
            is_float = true;
            self.advance();

            if matches!(self.peek(), b'+' | b'-') {
                self.advance();
            }

            if !self.peek().is_ascii_digit() {
                return Err(PyError::lex(self.line, "Invalid float literal."));
            }

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: &str = &self.source[self.start..self.curr];

        let tt = if is_float {
            let n: f64 = text
                .parse::<f64>()
                .map_err(|_| PyError::lex(self.line, "Invalid float literal."))?;

            TokenType::FLOAT(n)
        } else {
            let n: i64 = text.parse::<i64>().map_err(|_| {
                PyError::lex(self.line, format!("Integer literal too large: {}", text))
            })?;

            TokenType::INT(n)
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>; // alias = Result<T, PyError>

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // 1. Layout tokens already decided take priority.
            if let Some(token) = self.queued.pop_front() {
                return Some(Ok(token));
            }

            if self.finished {
                return None;
            }

            // 2. Measure indentation at the start of each physical line.
            if self.at_line_start && self.nesting == 0 {
                if let Err(e) = self.scan_indentation() {
                    self.at_line_start = false;

                    return Some(Err(e));
                }

                if self.at_line_start && self.is_at_end() {
                    self.finish();
                }

                continue;
            }

            // 3. EOF guard – close lines and blocks, then emit EOF once.
            if self.is_at_end() {
                self.finish();

                continue;
            }

            // 4. Reset per‑token state and attempt to scan a token.
            self.start = self.curr;
            self.token_line = self.line;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 5. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lex: &'a str = if tt == TokenType::NEWLINE {
                    ""
                } else {
                    self.line_has_tokens = true;
                    &self.source[self.start..self.curr]
                };

                debug!("Scanned token ({:?}) on line {}", tt, self.token_line);

                return Some(Ok(Token::new(tt, lex, self.token_line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<&'static str> {
        Scanner::new(source)
            .map(|t| t.map(|t| t.token_type.name()).unwrap_or("ERROR"))
            .collect()
    }

    #[test]
    fn closes_last_line_without_trailing_newline() {
        assert_eq!(kinds("x"), vec!["IDENTIFIER", "NEWLINE", "EOF"]);
    }

    #[test]
    fn blank_and_comment_lines_are_invisible() {
        let source = "a = 1\n\n   # note\n\nb = 2\n";

        assert_eq!(
            kinds(source),
            vec![
                "IDENTIFIER", "EQUAL", "INT", "NEWLINE", "IDENTIFIER", "EQUAL", "INT", "NEWLINE",
                "EOF"
            ]
        );
    }

    #[test]
    fn nested_blocks_close_at_end_of_input() {
        let source = "if a:\n    if b:\n        pass";

        assert_eq!(
            kinds(source),
            vec![
                "IF", "IDENTIFIER", "COLON", "NEWLINE", "INDENT", "IF", "IDENTIFIER", "COLON",
                "NEWLINE", "INDENT", "PASS", "NEWLINE", "DEDENT", "DEDENT", "EOF"
            ]
        );
    }

    #[test]
    fn newlines_inside_brackets_are_ignored() {
        let source = "x = [1,\n     2]\n";

        assert_eq!(
            kinds(source),
            vec![
                "IDENTIFIER", "EQUAL", "LEFT_BRACKET", "INT", "COMMA", "INT", "RIGHT_BRACKET",
                "NEWLINE", "EOF"
            ]
        );
    }

    #[test]
    fn inconsistent_dedent_is_reported() {
        let source = "if a:\n        b\n    c\n";
        let errors: Vec<PyError> = Scanner::new(source).filter_map(|r| r.err()).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("unindent"));
    }

    #[test]
    fn string_escapes_are_resolved() {
        let tokens: Vec<Token> = Scanner::new(r#"'a\tb' "q\"" "#)
            .filter_map(|t| t.ok())
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::STRING(String::new()));
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "a\tb"));
        assert!(matches!(&tokens[1].token_type, TokenType::STRING(s) if s == "q\""));
    }

    #[test]
    fn numbers_split_into_int_and_float() {
        let tokens: Vec<Token> = Scanner::new("42 3.5 1e3").filter_map(|t| t.ok()).collect();

        assert!(matches!(tokens[0].token_type, TokenType::INT(42)));
        assert!(matches!(tokens[1].token_type, TokenType::FLOAT(f) if f == 3.5));
        assert!(matches!(tokens[2].token_type, TokenType::FLOAT(f) if f == 1000.0));
    }

    #[test]
    fn newline_token_reports_the_line_it_ends() {
        let tokens: Vec<Token> = Scanner::new("a\nb\n").filter_map(|t| t.ok()).collect();

        assert_eq!(tokens[1].token_type, TokenType::NEWLINE);
        assert_eq!(tokens[1].line, 1);
        assert_eq!(tokens[2].line, 2);
    }
}
