//! Backward token cursor.
//!
//! Tokenizes the source up to (never past) the cursor and lets the
//! context deducer walk the stream backwards, treating bracket pairs as
//! balanced units.

use goco_scanner::{Scanner, Token, TokenKind};

pub struct TokenIterator {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenIterator {
    /// Collect every token starting strictly before the cursor.
    pub fn up_to_cursor(src: &[u8], cursor: usize) -> TokenIterator {
        let mut scanner = Scanner::new(src);
        let mut tokens = Vec::new();
        loop {
            let tok = scanner.next_token();
            if tok.kind == TokenKind::Eof || cursor <= tok.offset as usize {
                break;
            }
            tokens.push(tok);
        }
        let index = tokens.len().saturating_sub(1);
        TokenIterator { tokens, index }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token under the cursor position of the walk.
    pub fn token(&self) -> &Token {
        &self.tokens[self.index]
    }

    /// Step back one token; false at the start of the stream.
    pub fn go_back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn skip_to_left(&mut self, left: TokenKind, right: TokenKind) -> bool {
        if self.token().kind == left {
            return true;
        }
        let mut balance = 1i32;
        while balance != 0 {
            if !self.go_back() {
                return false;
            }
            let kind = self.token().kind;
            if kind == right {
                balance += 1;
            } else if kind == left {
                balance -= 1;
            }
        }
        true
    }

    /// With the cursor on `)`, `]`, or `}`, move to the matching opening
    /// bracket, taking nested pairs into account.
    pub fn skip_to_balanced_pair(&mut self) -> bool {
        let right = self.token().kind;
        let left = match right {
            TokenKind::RParen => TokenKind::LParen,
            TokenKind::RBracket => TokenKind::LBracket,
            TokenKind::RBrace => TokenKind::LBrace,
            _ => return false,
        };
        self.skip_to_left(left, right)
    }

    /// Move to the `{` opening the current block, nested blocks included.
    pub fn skip_to_left_curly(&mut self) -> bool {
        self.skip_to_left(TokenKind::LBrace, TokenKind::RBrace)
    }

    /// Extract the type expression right before the enclosing brace
    /// block: `&lib.Struct{Whatever: 1, Hel|}` gives `lib.Struct`,
    /// `X{|}` gives `X`. Anonymous struct literals yield nothing.
    pub fn extract_composite_type(&mut self) -> String {
        if !self.skip_to_left_curly() {
            return String::new();
        }
        if !self.go_back() {
            return String::new();
        }
        if self.token().kind != TokenKind::Ident {
            return String::new();
        }
        let name = self.token().text().to_string();
        if !self.go_back() {
            return name;
        }
        if self.token().kind != TokenKind::Period {
            return name;
        }
        if !self.go_back() {
            return name;
        }
        if self.token().kind != TokenKind::Ident {
            return name;
        }
        format!("{}.{name}", self.token().text())
    }

    /// Starting at the token under the walk cursor, move back over
    /// something shaped like a primary expression and return its text.
    ///
    /// Primary expressions reduce to identifier/bracket-group chains
    /// joined by dots (`f.p[i].x()`, `Point{1, 2}.m["foo"]`), so a
    /// small state machine over the previous token's kind plus balanced
    /// bracket skipping is enough to find where one starts.
    pub fn extract_expr(&mut self) -> String {
        let orig = self.index;
        // Kind of the previously inspected token, i.e. the one to the
        // right of the current position.
        let mut prev = self.token().kind;
        loop {
            if !self.go_back() {
                return self.join(0, orig);
            }
            match self.token().kind {
                TokenKind::Period => {
                    // A '.' must be followed by an identifier.
                    if prev != TokenKind::Ident {
                        break;
                    }
                }
                TokenKind::Ident => {
                    // Valid tokens after an identifier: '.', '[', '{', '('.
                    if !matches!(
                        prev,
                        TokenKind::Period
                            | TokenKind::LBracket
                            | TokenKind::LBrace
                            | TokenKind::LParen
                    ) {
                        break;
                    }
                }
                TokenKind::RBrace => {
                    // Only as a composite literal followed by a selector:
                    // `Dummy{}.Hello()`.
                    if prev != TokenKind::Period {
                        break;
                    }
                    self.skip_to_balanced_pair();
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    if !matches!(
                        prev,
                        TokenKind::Period | TokenKind::LBracket | TokenKind::LParen
                    ) {
                        break;
                    }
                    self.skip_to_balanced_pair();
                }
                _ => break,
            }
            prev = self.token().kind;
        }
        self.join(self.index + 1, orig)
    }

    /// Reassemble the literal text of `tokens[from..to]`.
    fn join(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        for tok in &self.tokens[from..to] {
            out.push_str(tok.text());
        }
        out
    }
}
