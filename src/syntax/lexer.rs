//! Tokenizer that keeps every byte of the input as token text or trivia.
//!
//! Trailing trivia of a token runs to the end of its line (newline
//! included); everything after that is leading trivia of the next token.

use super::{GreenToken, SyntaxError, SyntaxKind};

const PUNCTUATORS: &[&str] = &[
    "??=", "<<=", "=>", "==", "!=", "<=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "<<", "->", "::", "??", "?.", "..", "{", "}", "(", ")", "[", "]", ";", ",",
    ".", ":", "?", "~", "!", "=", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^",
];

enum Piece<'a> {
    Trivia(&'a str),
    Token(SyntaxKind, &'a str),
}

/// Splits `source` into tokens; the last token is always `Eof`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<GreenToken>, SyntaxError> {
    let pieces = Lexer::new(source).pieces()?;
    let mut tokens = Vec::new();
    let mut leading = String::new();
    let mut index = 0;
    while index < pieces.len() {
        match pieces[index] {
            Piece::Trivia(text) => {
                leading.push_str(text);
                index += 1;
            }
            Piece::Token(kind, text) => {
                index += 1;
                let mut trailing = String::new();
                while let Some(Piece::Trivia(trivia)) = pieces.get(index) {
                    if trivia.starts_with('#') {
                        break;
                    }
                    trailing.push_str(trivia);
                    index += 1;
                    if is_newline(trivia) {
                        break;
                    }
                }
                tokens.push(GreenToken::new(kind, std::mem::take(&mut leading), text, trailing));
            }
        }
    }
    tokens.push(GreenToken::new(SyntaxKind::Eof, leading, "", ""));
    Ok(tokens)
}

pub(crate) fn is_newline(text: &str) -> bool {
    matches!(text, "\n" | "\r\n" | "\r")
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek_char(&self, skip: usize) -> Option<char> {
        self.rest().chars().nth(skip)
    }

    fn error(&self, offset: usize, message: &str) -> SyntaxError {
        SyntaxError::at(self.source, offset, message)
    }

    fn at_line_start(&self) -> bool {
        let line_start = self.source[..self.pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
        self.source[line_start..self.pos].chars().all(|c| c == ' ' || c == '\t')
    }

    fn pieces(mut self) -> Result<Vec<Piece<'a>>, SyntaxError> {
        let mut pieces = Vec::new();
        while self.pos < self.source.len() {
            let start = self.pos;
            let Some(c) = self.peek_char(0) else { break };
            let piece = if c == '\r' || c == '\n' {
                let len = if self.rest().starts_with("\r\n") { 2 } else { 1 };
                self.pos += len;
                Piece::Trivia(&self.source[start..self.pos])
            } else if c.is_whitespace() {
                let len = self
                    .rest()
                    .find(|ch: char| !ch.is_whitespace() || ch == '\r' || ch == '\n')
                    .unwrap_or(self.rest().len());
                self.pos += len;
                Piece::Trivia(&self.source[start..self.pos])
            } else if self.rest().starts_with("//") || (c == '#' && self.at_line_start()) {
                self.pos += self.rest().find(['\r', '\n']).unwrap_or(self.rest().len());
                Piece::Trivia(&self.source[start..self.pos])
            } else if self.rest().starts_with("/*") {
                let end = self.rest()[2..]
                    .find("*/")
                    .ok_or_else(|| self.error(start, "unterminated block comment"))?;
                self.pos += end + 4;
                Piece::Trivia(&self.source[start..self.pos])
            } else if self.at_string_start() {
                self.string()?;
                Piece::Token(SyntaxKind::StringLiteral, &self.source[start..self.pos])
            } else if c == '\'' {
                self.char_literal()?;
                Piece::Token(SyntaxKind::CharLiteral, &self.source[start..self.pos])
            } else if c.is_ascii_digit()
                || (c == '.' && self.peek_char(1).is_some_and(|n| n.is_ascii_digit()))
            {
                self.number();
                Piece::Token(SyntaxKind::NumericLiteral, &self.source[start..self.pos])
            } else if c == '_' || c == '@' || c.is_alphabetic() {
                self.pos += c.len_utf8();
                let len = self
                    .rest()
                    .find(|ch: char| !(ch == '_' || ch.is_alphanumeric()))
                    .unwrap_or(self.rest().len());
                self.pos += len;
                if &self.source[start..self.pos] == "@" {
                    return Err(self.error(start, "unexpected character '@'"));
                }
                Piece::Token(SyntaxKind::Ident, &self.source[start..self.pos])
            } else if let Some(punct) = PUNCTUATORS.iter().find(|p| self.rest().starts_with(**p)) {
                self.pos += punct.len();
                Piece::Token(SyntaxKind::Punct, &self.source[start..self.pos])
            } else {
                return Err(self.error(start, &format!("unexpected character '{c}'")));
            };
            pieces.push(piece);
        }
        Ok(pieces)
    }

    fn at_string_start(&self) -> bool {
        let prefix_len = self
            .rest()
            .find(|c: char| c != '$' && c != '@')
            .unwrap_or(self.rest().len());
        let prefix = &self.rest()[..prefix_len];
        prefix.matches('@').count() <= 1 && self.rest()[prefix_len..].starts_with('"')
    }

    fn string(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let mut dollars = 0;
        let mut verbatim = false;
        while let Some(c) = self.peek_char(0) {
            match c {
                '$' => dollars += 1,
                '@' => verbatim = true,
                _ => break,
            }
            self.pos += 1;
        }
        let quotes = self.rest().chars().take_while(|c| *c == '"').count();
        if quotes >= 3 {
            self.pos += quotes;
            let closing = "\"".repeat(quotes);
            let end = self
                .rest()
                .find(&closing)
                .ok_or_else(|| self.error(start, "unterminated raw string literal"))?;
            self.pos += end + quotes;
            return Ok(());
        }
        self.pos += 1;
        loop {
            let Some(c) = self.peek_char(0) else {
                return Err(self.error(start, "unterminated string literal"));
            };
            match c {
                '"' if verbatim && self.rest().starts_with("\"\"") => self.pos += 2,
                '"' => {
                    self.pos += 1;
                    return Ok(());
                }
                '\\' if !verbatim => {
                    self.pos += 1;
                    if let Some(next) = self.peek_char(0) {
                        self.pos += next.len_utf8();
                    }
                }
                '\n' if !verbatim => {
                    return Err(self.error(start, "newline in string literal"));
                }
                '{' if dollars > 0 && self.rest().starts_with("{{") => self.pos += 2,
                '{' if dollars > 0 => self.interpolation_hole(start)?,
                _ => self.pos += c.len_utf8(),
            }
        }
    }

    fn interpolation_hole(&mut self, string_start: usize) -> Result<(), SyntaxError> {
        let mut depth = 0usize;
        loop {
            let Some(c) = self.peek_char(0) else {
                return Err(self.error(string_start, "unterminated interpolated string"));
            };
            match c {
                '{' => {
                    depth += 1;
                    self.pos += 1;
                }
                '}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                '\'' => self.char_literal()?,
                _ if self.at_string_start() => self.string()?,
                _ => self.pos += c.len_utf8(),
            }
        }
    }

    fn char_literal(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek_char(0) {
                None | Some('\n') => return Err(self.error(start, "unterminated character literal")),
                Some('\\') => {
                    self.pos += 1;
                    if let Some(next) = self.peek_char(0) {
                        self.pos += next.len_utf8();
                    }
                }
                Some('\'') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(c) => self.pos += c.len_utf8(),
            }
        }
    }

    fn number(&mut self) {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        let mut previous = '\0';
        while let Some(c) = self.peek_char(0) {
            let exponent_sign =
                (c == '+' || c == '-') && (previous == 'e' || previous == 'E') && !hex;
            let fraction = c == '.' && self.peek_char(1).is_some_and(|n| n.is_ascii_digit());
            if c.is_ascii_alphanumeric() || c == '_' || exponent_sign || fraction {
                self.pos += 1;
                previous = c;
            } else {
                break;
            }
        }
    }
}
