//! The scan loop.
//!
//! A hand-rolled byte-level scanner over raw source bytes. Offsets are
//! byte offsets, which is what the rest of the pipeline works in. Non-UTF-8
//! input cannot panic the scanner; continuation bytes are treated as
//! identifier characters and surface as odd identifiers, not as errors.

use crate::token::{Token, TokenKind};

/// Go source scanner with automatic semicolon insertion.
pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    /// Whether a newline at the current position inserts a semicolon.
    insert_semi: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Scanner {
            src,
            pos: 0,
            insert_semi: false,
        }
    }

    /// Scan and return the next token. After the last real token this
    /// yields one inserted semicolon when required, then `Eof` forever.
    pub fn next_token(&mut self) -> Token {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.pos += 1;
                }
                Some(b'\n') => {
                    if self.insert_semi {
                        let off = self.pos as u32;
                        self.pos += 1;
                        self.insert_semi = false;
                        return Token {
                            offset: off,
                            kind: TokenKind::Semicolon,
                            literal: "\n".to_string(),
                        };
                    }
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    if self.skip_block_comment() && self.insert_semi {
                        // A comment spanning lines acts as a newline.
                        self.insert_semi = false;
                        return Token {
                            offset: self.pos as u32,
                            kind: TokenKind::Semicolon,
                            literal: "\n".to_string(),
                        };
                    }
                }
                Some(_) => return self.scan_token(),
                None => {
                    if self.insert_semi {
                        self.insert_semi = false;
                        return Token {
                            offset: self.pos as u32,
                            kind: TokenKind::Semicolon,
                            literal: "\n".to_string(),
                        };
                    }
                    return Token {
                        offset: self.pos as u32,
                        kind: TokenKind::Eof,
                        literal: String::new(),
                    };
                }
            }
        }
    }

    fn scan_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.src[self.pos];

        if is_ident_start(b) {
            return self.scan_ident(start);
        }
        if b.is_ascii_digit() {
            return self.scan_number(start);
        }

        self.pos += 1;
        let kind = match b {
            b'"' => return self.scan_string(start),
            b'`' => return self.scan_raw_string(start),
            b'\'' => return self.scan_char(start),
            b'.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return self.scan_number(start);
                }
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.pos += 2;
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Period
                }
            }
            b'+' => self.pick3(b'=', TokenKind::AddAssign, b'+', TokenKind::Inc, TokenKind::Add),
            b'-' => self.pick3(b'=', TokenKind::SubAssign, b'-', TokenKind::Dec, TokenKind::Sub),
            b'*' => self.pick2(b'=', TokenKind::MulAssign, TokenKind::Mul),
            b'/' => self.pick2(b'=', TokenKind::QuoAssign, TokenKind::Quo),
            b'%' => self.pick2(b'=', TokenKind::RemAssign, TokenKind::Rem),
            b'^' => self.pick2(b'=', TokenKind::XorAssign, TokenKind::Xor),
            b'=' => self.pick2(b'=', TokenKind::Eql, TokenKind::Assign),
            b'!' => self.pick2(b'=', TokenKind::Neq, TokenKind::Not),
            b':' => self.pick2(b'=', TokenKind::Define, TokenKind::Colon),
            b'<' => {
                if self.eat(b'-') {
                    TokenKind::Arrow
                } else if self.eat(b'<') {
                    self.pick2(b'=', TokenKind::ShlAssign, TokenKind::Shl)
                } else {
                    self.pick2(b'=', TokenKind::Leq, TokenKind::Lss)
                }
            }
            b'>' => {
                if self.eat(b'>') {
                    self.pick2(b'=', TokenKind::ShrAssign, TokenKind::Shr)
                } else {
                    self.pick2(b'=', TokenKind::Geq, TokenKind::Gtr)
                }
            }
            b'&' => {
                if self.eat(b'^') {
                    self.pick2(b'=', TokenKind::AndNotAssign, TokenKind::AndNot)
                } else if self.eat(b'&') {
                    TokenKind::LAnd
                } else {
                    self.pick2(b'=', TokenKind::AndAssign, TokenKind::And)
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    TokenKind::LOr
                } else {
                    self.pick2(b'=', TokenKind::OrAssign, TokenKind::Or)
                }
            }
            b'(' => TokenKind::LParen,
            b'[' => TokenKind::LBracket,
            b'{' => TokenKind::LBrace,
            b',' => TokenKind::Comma,
            b')' => TokenKind::RParen,
            b']' => TokenKind::RBracket,
            b'}' => TokenKind::RBrace,
            b';' => TokenKind::Semicolon,
            b'~' => TokenKind::Tilde,
            _ => TokenKind::Illegal,
        };

        self.insert_semi = matches!(
            kind,
            TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        );

        let literal = if kind == TokenKind::Semicolon {
            ";".to_string()
        } else if kind == TokenKind::Illegal {
            String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
        } else {
            String::new()
        };
        Token {
            offset: start as u32,
            kind,
            literal,
        }
    }

    fn scan_ident(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let literal = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let kind = TokenKind::keyword_from_text(&literal).unwrap_or(TokenKind::Ident);
        self.insert_semi = matches!(
            kind,
            TokenKind::Ident
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
        );
        Token {
            offset: start as u32,
            kind,
            literal,
        }
    }

    fn scan_number(&mut self, start: usize) -> Token {
        let mut kind = TokenKind::Int;
        // self.pos may already be past a leading '.' (from scan_token).
        if self.pos > start {
            kind = TokenKind::Float;
            self.eat_digits(10);
        } else if self.peek() == Some(b'0')
            && matches!(
                self.peek_at(1),
                Some(b'x') | Some(b'X') | Some(b'b') | Some(b'B') | Some(b'o') | Some(b'O')
            )
        {
            let base = match self.peek_at(1) {
                Some(b'x') | Some(b'X') => 16,
                Some(b'b') | Some(b'B') => 2,
                _ => 8,
            };
            self.pos += 2;
            self.eat_digits(base);
            if base == 16 && self.eat(b'.') {
                kind = TokenKind::Float;
                self.eat_digits(16);
            }
            if base == 16 && matches!(self.peek(), Some(b'p') | Some(b'P')) {
                kind = TokenKind::Float;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
                self.eat_digits(10);
            }
        } else {
            self.eat_digits(10);
            if self.peek() == Some(b'.')
                // Not a float if the dot starts an ellipsis (`a[1...]` is
                // nonsense anyway, but `1..` must not swallow both dots).
                && self.peek_at(1) != Some(b'.')
            {
                kind = TokenKind::Float;
                self.pos += 1;
                self.eat_digits(10);
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                kind = TokenKind::Float;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
                self.eat_digits(10);
            }
        }
        if self.eat(b'i') {
            kind = TokenKind::Imag;
        }
        self.insert_semi = true;
        Token {
            offset: start as u32,
            kind,
            literal: String::from_utf8_lossy(&self.src[start..self.pos]).into_owned(),
        }
    }

    /// Interpreted string literal. An unterminated string (newline or end
    /// of input before the closing quote) is returned as-is; completion
    /// inside string literals depends on seeing the partial text.
    fn scan_string(&mut self, start: usize) -> Token {
        loop {
            match self.peek() {
                None | Some(b'\n') => break,
                Some(b'\\') => {
                    self.pos += 1;
                    if self.peek().is_some() {
                        self.pos += 1;
                    }
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.insert_semi = true;
        Token {
            offset: start as u32,
            kind: TokenKind::String,
            literal: String::from_utf8_lossy(&self.src[start..self.pos]).into_owned(),
        }
    }

    fn scan_raw_string(&mut self, start: usize) -> Token {
        loop {
            match self.peek() {
                None => break,
                Some(b'`') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.insert_semi = true;
        Token {
            offset: start as u32,
            kind: TokenKind::String,
            literal: String::from_utf8_lossy(&self.src[start..self.pos]).into_owned(),
        }
    }

    fn scan_char(&mut self, start: usize) -> Token {
        loop {
            match self.peek() {
                None | Some(b'\n') => break,
                Some(b'\\') => {
                    self.pos += 1;
                    if self.peek().is_some() {
                        self.pos += 1;
                    }
                }
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.insert_semi = true;
        Token {
            offset: start as u32,
            kind: TokenKind::Char,
            literal: String::from_utf8_lossy(&self.src[start..self.pos]).into_owned(),
        }
    }

    /// Skip a `/* */` comment; reports whether it spanned a newline.
    fn skip_block_comment(&mut self) -> bool {
        self.pos += 2;
        let mut crossed_newline = false;
        while let Some(b) = self.peek() {
            if b == b'\n' {
                crossed_newline = true;
            }
            if b == b'*' && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                return crossed_newline;
            }
            self.pos += 1;
        }
        crossed_newline
    }

    fn eat_digits(&mut self, base: u32) {
        while let Some(b) = self.peek() {
            if b != b'_' && !digit_in_base(b, base) {
                break;
            }
            self.pos += 1;
        }
    }

    fn pick2(&mut self, next: u8, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.eat(next) {
            then
        } else {
            otherwise
        }
    }

    fn pick3(
        &mut self,
        a: u8,
        then_a: TokenKind,
        b: u8,
        then_b: TokenKind,
        otherwise: TokenKind,
    ) -> TokenKind {
        if self.eat(a) {
            then_a
        } else if self.eat(b) {
            then_b
        } else {
            otherwise
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn digit_in_base(b: u8, base: u32) -> bool {
    (b as char).to_digit(base).is_some()
}
