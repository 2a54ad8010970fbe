//! Recursive-descent parser with error recovery.
//!
//! The whole file is tokenized up front (the scanner is error-silent),
//! then parsed by index. Every loop either consumes a token or bails, so
//! arbitrarily broken input terminates. Unrecognized constructs become
//! `Bad` nodes and a diagnostic; parsing continues at the next
//! synchronization point.

use goco_common::Span;
use goco_scanner::{Scanner, Token, TokenKind};

use crate::ast::*;

/// A recoverable parse error.
#[derive(Clone, Debug)]
pub struct ParseDiagnostic {
    pub span: Span,
    pub message: String,
}

/// Parse a whole source file, returning the AST and every diagnostic.
pub fn parse_file(src: &[u8]) -> (File, Vec<ParseDiagnostic>) {
    parse_file_at(src, 0)
}

/// Parse a file placing its spans at `base`. Callers analyzing several
/// files together give each a disjoint span range, the way a file set
/// assigns every file its own position interval.
pub fn parse_file_at(src: &[u8], base: u32) -> (File, Vec<ParseDiagnostic>) {
    let mut p = Parser::new_at(src, base);
    let file = p.parse_file();
    (file, p.diags)
}

/// Parse only the package clause; cheap sibling-file classification.
pub fn parse_package_clause(src: &[u8]) -> Option<String> {
    let mut s = Scanner::new(src);
    let t = s.next_token();
    if t.kind != TokenKind::Package {
        return None;
    }
    let name = s.next_token();
    if name.kind != TokenKind::Ident {
        return None;
    }
    Some(name.literal)
}

/// Parse a standalone expression (the checker's `eval` entry point).
pub fn parse_expr(src: &[u8]) -> Option<Expr> {
    let mut p = Parser::new(src);
    if p.at(TokenKind::Eof) {
        return None;
    }
    let expr = p.parse_expr();
    match expr {
        Expr::Bad(_) => None,
        e => Some(e),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diags: Vec<ParseDiagnostic>,
    /// Added to every span; see [`parse_file_at`].
    base: u32,
    /// Suppresses composite literals in if/for/switch headers, where a
    /// `{` opens the body instead.
    no_composite: bool,
}

impl Parser {
    fn new(src: &[u8]) -> Self {
        Self::new_at(src, 0)
    }

    fn new_at(src: &[u8], base: u32) -> Self {
        let mut scanner = Scanner::new(src);
        let mut tokens = Vec::new();
        loop {
            let t = scanner.next_token();
            let done = t.kind == TokenKind::Eof;
            tokens.push(t);
            if done {
                break;
            }
        }
        Parser {
            tokens,
            pos: 0,
            diags: Vec::new(),
            base,
            no_composite: false,
        }
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn tok(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.tok().kind
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn tok_span(&self) -> Span {
        let t = self.tok();
        let start = t.offset + self.base;
        Span::new(start, start + t.text().len() as u32)
    }

    fn bump(&mut self) -> Span {
        let span = self.tok_span();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        span
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> u32 {
        let t = &self.tokens[self.pos.saturating_sub(1)];
        t.offset + self.base + t.text().len() as u32
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Span {
        if self.at(kind) {
            return self.bump();
        }
        self.error_here(format!("expected {what}"));
        Span::at(self.tok_span().start)
    }

    fn error_here(&mut self, message: String) {
        let span = self.tok_span();
        tracing::debug!(target: "goco::parser", %span, "{message}");
        self.diags.push(ParseDiagnostic { span, message });
    }

    /// Consume a statement terminator; missing ones before `}` / `)` are
    /// fine (the scanner only inserts semicolons at newlines).
    fn expect_semi(&mut self) {
        if self.eat(TokenKind::Semicolon) {
            return;
        }
        if !matches!(self.kind(), TokenKind::RBrace | TokenKind::RParen | TokenKind::Eof) {
            self.error_here("expected ';'".to_string());
            self.sync_stmt();
        }
    }

    /// Skip forward to just after the next terminator (or before a `}`).
    fn sync_stmt(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace | TokenKind::Eof => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn ident(&mut self) -> Ident {
        if self.at(TokenKind::Ident) {
            let name = self.tok().literal.clone();
            let span = self.bump();
            return Ident { name, span };
        }
        self.error_here("expected identifier".to_string());
        Ident {
            name: "_".to_string(),
            span: Span::at(self.tok_span().start),
        }
    }

    // ------------------------------------------------------------------
    // File structure
    // ------------------------------------------------------------------

    fn parse_file(&mut self) -> File {
        let start = self.tok_span().start;
        let mut package_name = "_".to_string();
        let mut package_span = Span::at(start);
        if self.eat(TokenKind::Package) {
            if self.at(TokenKind::Ident) {
                package_name = self.tok().literal.clone();
                package_span = self.bump();
            } else {
                self.error_here("expected package name".to_string());
            }
            self.expect_semi();
        } else {
            self.error_here("expected 'package'".to_string());
        }

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            self.bump();
            if self.eat(TokenKind::LParen) {
                while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                    if self.at(TokenKind::Semicolon) {
                        self.bump();
                        continue;
                    }
                    if let Some(spec) = self.parse_import_spec() {
                        imports.push(spec);
                    } else {
                        self.sync_stmt();
                    }
                }
                self.expect(TokenKind::RParen, "')'");
            } else if let Some(spec) = self.parse_import_spec() {
                imports.push(spec);
            }
            self.expect_semi();
        }

        let mut decls = Vec::new();
        while !self.at(TokenKind::Eof) {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Const => decls.push(Decl::Const(self.parse_value_specs())),
                TokenKind::Var => decls.push(Decl::Var(self.parse_value_specs())),
                TokenKind::Type => decls.push(Decl::Type(self.parse_type_specs())),
                TokenKind::Func => decls.push(self.parse_func_decl()),
                _ => {
                    let span = self.tok_span();
                    self.error_here("expected declaration".to_string());
                    self.bump();
                    self.sync_stmt();
                    decls.push(Decl::Bad(span));
                }
            }
        }

        let end = self.tok_span().end;
        File {
            package_name,
            package_span,
            imports,
            decls,
            span: Span::new(start, end),
        }
    }

    fn parse_import_spec(&mut self) -> Option<ImportSpec> {
        let start = self.tok_span().start;
        let alias = if self.at(TokenKind::Ident) {
            Some(self.ident())
        } else if self.at(TokenKind::Period) {
            let span = self.bump();
            Some(Ident {
                name: ".".to_string(),
                span,
            })
        } else {
            None
        };
        if !self.at(TokenKind::String) {
            self.error_here("expected import path".to_string());
            return None;
        }
        let raw = self.tok().literal.clone();
        let span = self.bump();
        Some(ImportSpec {
            alias,
            path: unquote(&raw),
            span: Span::new(start, span.end),
        })
    }

    /// `const`/`var` declarations, grouped or single.
    fn parse_value_specs(&mut self) -> Vec<ValueSpec> {
        self.bump(); // const | var
        let mut specs = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                if self.at(TokenKind::Semicolon) {
                    self.bump();
                    continue;
                }
                specs.push(self.parse_value_spec());
                self.expect_semi();
            }
            self.expect(TokenKind::RParen, "')'");
        } else {
            specs.push(self.parse_value_spec());
        }
        self.expect_semi();
        specs
    }

    fn parse_value_spec(&mut self) -> ValueSpec {
        let start = self.tok_span().start;
        let mut names = vec![self.ident()];
        while self.eat(TokenKind::Comma) {
            names.push(self.ident());
        }
        let typ = if !matches!(
            self.kind(),
            TokenKind::Assign | TokenKind::Semicolon | TokenKind::RParen | TokenKind::Eof
        ) {
            Some(self.parse_type())
        } else {
            None
        };
        let mut values = Vec::new();
        if self.eat(TokenKind::Assign) {
            values.push(self.parse_expr());
            while self.eat(TokenKind::Comma) {
                values.push(self.parse_expr());
            }
        }
        let end = values
            .last()
            .map(|v| v.span().end)
            .or_else(|| typ.as_ref().map(|t| t.span().end))
            .unwrap_or_else(|| names.last().map(|n| n.span.end).unwrap_or(start));
        ValueSpec {
            names,
            typ,
            values,
            span: Span::new(start, end),
        }
    }

    fn parse_type_specs(&mut self) -> Vec<TypeSpec> {
        self.bump(); // type
        let mut specs = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                if self.at(TokenKind::Semicolon) {
                    self.bump();
                    continue;
                }
                specs.push(self.parse_type_spec());
                self.expect_semi();
            }
            self.expect(TokenKind::RParen, "')'");
        } else {
            specs.push(self.parse_type_spec());
        }
        self.expect_semi();
        specs
    }

    fn parse_type_spec(&mut self) -> TypeSpec {
        let name = self.ident();
        // Type parameter lists are skipped wholesale; the completion
        // pipeline treats generic types as their base type.
        if self.at(TokenKind::LBracket) && self.looks_like_type_params() {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
        }
        let alias = self.eat(TokenKind::Assign);
        let typ = self.parse_type();
        let span = name.span.merge(typ.span());
        TypeSpec {
            name,
            alias,
            typ,
            span,
        }
    }

    fn parse_func_decl(&mut self) -> Decl {
        let start = self.bump().start; // func
        let recv = if self.at(TokenKind::LParen) {
            let mut fields = self.parse_param_list();
            fields.pop()
        } else {
            None
        };
        let name = self.ident();
        if self.at(TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
        }
        let sig = self.parse_signature();
        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_block())
        } else {
            None
        };
        self.expect_semi();
        let end = body
            .as_ref()
            .map(|b| b.span.end)
            .unwrap_or_else(|| self.tok_span().start);
        Decl::Func(FuncDecl {
            recv,
            name,
            sig,
            body,
            span: Span::new(start, end),
        })
    }

    fn looks_like_type_params(&self) -> bool {
        // `type T[...]` at declaration level is always a parameter list;
        // `[` elsewhere belongs to an array/slice type.
        matches!(self.peek_kind(1), TokenKind::Ident)
            && !matches!(self.peek_kind(2), TokenKind::RBracket | TokenKind::Comma)
    }

    fn skip_balanced(&mut self, left: TokenKind, right: TokenKind) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                k if k == left => depth += 1,
                k if k == right => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.bump();
        }
    }

    // ------------------------------------------------------------------
    // Signatures, parameters, fields
    // ------------------------------------------------------------------

    fn parse_signature(&mut self) -> FuncSig {
        let params = self.parse_param_list();
        let results = if self.at(TokenKind::LParen) {
            self.parse_param_list()
        } else if self.starts_type() {
            let typ = self.parse_type();
            let span = typ.span();
            vec![Field {
                names: Vec::new(),
                typ,
                span,
            }]
        } else {
            Vec::new()
        };
        FuncSig { params, results }
    }

    /// Parse `( ... )` parameter groups, resolving the `a, b T` vs
    /// `T1, T2` ambiguity after the fact the way Go's own parser does.
    fn parse_param_list(&mut self) -> Vec<Field> {
        self.expect(TokenKind::LParen, "'('");
        let mut fields = Vec::new();
        let mut pending: Vec<Expr> = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            let variadic = self.at(TokenKind::Ellipsis);
            let elem = if variadic {
                let span = self.bump();
                let elt = self.parse_type();
                let full = span.merge(elt.span());
                Expr::Ellipsis {
                    elt: Some(Box::new(elt)),
                    span: full,
                }
            } else {
                self.parse_type()
            };
            if self.eat(TokenKind::Comma) {
                pending.push(elem);
                continue;
            }
            if self.at(TokenKind::RParen) || self.at(TokenKind::Eof) {
                pending.push(elem);
                break;
            }
            // A type follows: everything pending plus `elem` are names.
            let mut names = Vec::new();
            for e in pending.drain(..).chain(std::iter::once(elem)) {
                match e {
                    Expr::Ident(id) => names.push(id),
                    other => {
                        self.diags.push(ParseDiagnostic {
                            span: other.span(),
                            message: "expected parameter name".to_string(),
                        });
                    }
                }
            }
            let variadic = self.at(TokenKind::Ellipsis);
            let typ = if variadic {
                let span = self.bump();
                let elt = self.parse_type();
                let full = span.merge(elt.span());
                Expr::Ellipsis {
                    elt: Some(Box::new(elt)),
                    span: full,
                }
            } else {
                self.parse_type()
            };
            let span = names
                .first()
                .map(|n| n.span.merge(typ.span()))
                .unwrap_or_else(|| typ.span());
            fields.push(Field { names, typ, span });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        for e in pending {
            let span = e.span();
            fields.push(Field {
                names: Vec::new(),
                typ: e,
                span,
            });
        }
        self.expect(TokenKind::RParen, "')'");
        fields
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Ident
                | TokenKind::Mul
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Interface
                | TokenKind::Struct
                | TokenKind::Func
                | TokenKind::LParen
        )
    }

    fn parse_type(&mut self) -> Expr {
        match self.kind() {
            TokenKind::Ident => {
                let id = self.ident();
                if self.at(TokenKind::Period) && self.peek_kind(1) == TokenKind::Ident {
                    self.bump();
                    let sel = self.ident();
                    let span = id.span.merge(sel.span);
                    Expr::Selector {
                        x: Box::new(Expr::Ident(id)),
                        sel,
                        span,
                    }
                } else {
                    Expr::Ident(id)
                }
            }
            TokenKind::Mul => {
                let start = self.bump().start;
                let x = self.parse_type();
                let span = Span::new(start, x.span().end);
                Expr::Star {
                    x: Box::new(x),
                    span,
                }
            }
            TokenKind::LBracket => {
                let start = self.bump().start;
                let len = if self.at(TokenKind::RBracket) {
                    None
                } else if self.at(TokenKind::Ellipsis) {
                    let span = self.bump();
                    Some(Box::new(Expr::Ellipsis { elt: None, span }))
                } else {
                    Some(Box::new(self.parse_expr()))
                };
                self.expect(TokenKind::RBracket, "']'");
                let elt = self.parse_type();
                let span = Span::new(start, elt.span().end);
                Expr::ArrayType {
                    len,
                    elt: Box::new(elt),
                    span,
                }
            }
            TokenKind::Map => {
                let start = self.bump().start;
                self.expect(TokenKind::LBracket, "'['");
                let key = self.parse_type();
                self.expect(TokenKind::RBracket, "']'");
                let value = self.parse_type();
                let span = Span::new(start, value.span().end);
                Expr::MapType {
                    key: Box::new(key),
                    value: Box::new(value),
                    span,
                }
            }
            TokenKind::Chan => {
                let start = self.bump().start;
                let dir = if self.eat(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elt = self.parse_type();
                let span = Span::new(start, elt.span().end);
                Expr::ChanType {
                    dir,
                    elt: Box::new(elt),
                    span,
                }
            }
            TokenKind::Arrow => {
                let start = self.bump().start;
                self.expect(TokenKind::Chan, "'chan'");
                let elt = self.parse_type();
                let span = Span::new(start, elt.span().end);
                Expr::ChanType {
                    dir: ChanDir::Recv,
                    elt: Box::new(elt),
                    span,
                }
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::Func => {
                let start = self.bump().start;
                let sig = self.parse_signature();
                let end = self.prev_end();
                Expr::FuncType {
                    sig,
                    span: Span::new(start, end),
                }
            }
            TokenKind::LParen => {
                let start = self.bump().start;
                let x = self.parse_type();
                let end = self.expect(TokenKind::RParen, "')'").end;
                Expr::Paren {
                    x: Box::new(x),
                    span: Span::new(start, end),
                }
            }
            _ => {
                let span = self.tok_span();
                self.error_here("expected type".to_string());
                Expr::Bad(span)
            }
        }
    }

    fn parse_struct_type(&mut self) -> Expr {
        let start = self.bump().start; // struct
        self.expect(TokenKind::LBrace, "'{'");
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Semicolon) {
                self.bump();
                continue;
            }
            fields.push(self.parse_struct_field());
            // Field tag.
            if self.at(TokenKind::String) {
                self.bump();
            }
            self.expect_semi();
        }
        let end = self.expect(TokenKind::RBrace, "'}'").end;
        Expr::StructType {
            fields,
            span: Span::new(start, end),
        }
    }

    fn parse_struct_field(&mut self) -> Field {
        // `*T` or a leading non-ident type is always an embedded field.
        if !self.at(TokenKind::Ident) {
            let typ = self.parse_type();
            let span = typ.span();
            return Field {
                names: Vec::new(),
                typ,
                span,
            };
        }
        let mut names = vec![self.ident()];
        // Embedded `pkg.T` or bare `T`.
        if names.len() == 1
            && matches!(
                self.kind(),
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String | TokenKind::Period
            )
        {
            let id = names.pop().unwrap();
            let typ = if self.at(TokenKind::Period) && self.peek_kind(1) == TokenKind::Ident {
                self.bump();
                let sel = self.ident();
                let span = id.span.merge(sel.span);
                Expr::Selector {
                    x: Box::new(Expr::Ident(id)),
                    sel,
                    span,
                }
            } else {
                Expr::Ident(id)
            };
            let span = typ.span();
            return Field {
                names: Vec::new(),
                typ,
                span,
            };
        }
        while self.eat(TokenKind::Comma) {
            names.push(self.ident());
        }
        let typ = self.parse_type();
        let span = names[0].span.merge(typ.span());
        Field { names, typ, span }
    }

    fn parse_interface_type(&mut self) -> Expr {
        let start = self.bump().start; // interface
        self.expect(TokenKind::LBrace, "'{'");
        let mut elems = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Semicolon) {
                self.bump();
                continue;
            }
            if self.at(TokenKind::Ident) && self.peek_kind(1) == TokenKind::LParen {
                let name = self.ident();
                let sig = self.parse_signature();
                let span = name.span;
                elems.push(InterfaceElem::Method { name, sig, span });
            } else {
                // Embedded interface or a type-set term; union terms are
                // consumed but collapse to their first operand.
                self.eat(TokenKind::Tilde);
                let t = self.parse_type();
                while self.eat(TokenKind::Or) {
                    self.eat(TokenKind::Tilde);
                    let _ = self.parse_type();
                }
                elems.push(InterfaceElem::Embedded(t));
            }
            self.expect_semi();
        }
        let end = self.expect(TokenKind::RBrace, "'}'").end;
        Expr::InterfaceType {
            elems,
            span: Span::new(start, end),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Expr {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Expr {
        let mut x = self.parse_unary();
        loop {
            let prec = binary_prec(self.kind());
            if prec < min_prec {
                return x;
            }
            let op = self.kind();
            self.bump();
            let y = self.parse_binary(prec + 1);
            let span = x.span().merge(y.span());
            x = Expr::Binary {
                op,
                x: Box::new(x),
                y: Box::new(y),
                span,
            };
        }
    }

    fn parse_unary(&mut self) -> Expr {
        match self.kind() {
            TokenKind::Add | TokenKind::Sub | TokenKind::Not | TokenKind::Xor | TokenKind::And
            | TokenKind::Arrow => {
                let op = self.kind();
                let start = self.bump().start;
                let x = self.parse_unary();
                let span = Span::new(start, x.span().end);
                Expr::Unary {
                    op,
                    x: Box::new(x),
                    span,
                }
            }
            TokenKind::Mul => {
                let start = self.bump().start;
                let x = self.parse_unary();
                let span = Span::new(start, x.span().end);
                Expr::Star {
                    x: Box::new(x),
                    span,
                }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let mut x = self.parse_operand();
        loop {
            match self.kind() {
                TokenKind::Period => {
                    self.bump();
                    if self.eat(TokenKind::LParen) {
                        // Type assertion `x.(T)` / type-switch `x.(type)`.
                        let typ = if self.at(TokenKind::Type) {
                            self.bump();
                            None
                        } else {
                            Some(Box::new(self.parse_type()))
                        };
                        let end = self.expect(TokenKind::RParen, "')'").end;
                        let span = Span::new(x.span().start, end);
                        x = Expr::TypeAssert {
                            x: Box::new(x),
                            typ,
                            span,
                        };
                    } else {
                        let sel = self.ident();
                        let span = x.span().merge(sel.span);
                        x = Expr::Selector {
                            x: Box::new(x),
                            sel,
                            span,
                        };
                    }
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                        args.push(self.parse_expr());
                        self.eat(TokenKind::Ellipsis);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.no_composite = saved;
                    let end = self.expect(TokenKind::RParen, "')'").end;
                    let span = Span::new(x.span().start, end);
                    x = Expr::Call {
                        fun: Box::new(x),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let low = if self.at(TokenKind::Colon) {
                        None
                    } else {
                        Some(Box::new(self.parse_expr()))
                    };
                    if self.eat(TokenKind::Colon) {
                        let high = if matches!(self.kind(), TokenKind::RBracket | TokenKind::Colon)
                        {
                            None
                        } else {
                            Some(Box::new(self.parse_expr()))
                        };
                        if self.eat(TokenKind::Colon)
                            && !matches!(self.kind(), TokenKind::RBracket)
                        {
                            let _max = self.parse_expr();
                        }
                        let end = self.expect(TokenKind::RBracket, "']'").end;
                        let span = Span::new(x.span().start, end);
                        x = Expr::Slice {
                            x: Box::new(x),
                            low,
                            high,
                            span,
                        };
                    } else {
                        let index = low.unwrap_or_else(|| {
                            Box::new(Expr::Bad(Span::at(self.tok_span().start)))
                        });
                        let end = self.expect(TokenKind::RBracket, "']'").end;
                        let span = Span::new(x.span().start, end);
                        x = Expr::Index {
                            x: Box::new(x),
                            index,
                            span,
                        };
                    }
                    self.no_composite = saved;
                }
                TokenKind::LBrace if !self.no_composite && is_literal_type(&x) => {
                    x = self.parse_composite_body(Some(x));
                }
                _ => return x,
            }
        }
    }

    fn parse_operand(&mut self) -> Expr {
        match self.kind() {
            TokenKind::Ident => {
                let id = self.ident();
                Expr::Ident(id)
            }
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::String => {
                let kind = self.kind();
                let value = self.tok().literal.clone();
                let span = self.bump();
                Expr::BasicLit { kind, value, span }
            }
            TokenKind::LParen => {
                let start = self.bump().start;
                let saved = std::mem::replace(&mut self.no_composite, false);
                let x = self.parse_expr();
                self.no_composite = saved;
                let end = self.expect(TokenKind::RParen, "')'").end;
                Expr::Paren {
                    x: Box::new(x),
                    span: Span::new(start, end),
                }
            }
            TokenKind::Func => {
                let start = self.bump().start;
                let sig = self.parse_signature();
                if self.at(TokenKind::LBrace) {
                    let saved = std::mem::replace(&mut self.no_composite, false);
                    let body = self.parse_block();
                    self.no_composite = saved;
                    let span = Span::new(start, body.span.end);
                    Expr::FuncLit { sig, body, span }
                } else {
                    let end = self.prev_end();
                    Expr::FuncType {
                        sig,
                        span: Span::new(start, end),
                    }
                }
            }
            TokenKind::Mul
            | TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Arrow
            | TokenKind::Struct
            | TokenKind::Interface => self.parse_type(),
            TokenKind::LBrace if !self.no_composite => self.parse_composite_body(None),
            _ => {
                let span = self.tok_span();
                self.error_here("expected expression".to_string());
                self.bump();
                Expr::Bad(span)
            }
        }
    }

    fn parse_composite_body(&mut self, typ: Option<Expr>) -> Expr {
        let start = typ
            .as_ref()
            .map(|t| t.span().start)
            .unwrap_or_else(|| self.tok_span().start);
        self.expect(TokenKind::LBrace, "'{'");
        let saved = std::mem::replace(&mut self.no_composite, false);
        let mut elts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let elt = if self.at(TokenKind::LBrace) {
                self.parse_composite_body(None)
            } else {
                self.parse_expr()
            };
            let elt = if self.eat(TokenKind::Colon) {
                let value = if self.at(TokenKind::LBrace) {
                    self.parse_composite_body(None)
                } else {
                    self.parse_expr()
                };
                let span = elt.span().merge(value.span());
                Expr::KeyValue {
                    key: Box::new(elt),
                    value: Box::new(value),
                    span,
                }
            } else {
                elt
            };
            elts.push(elt);
            if !self.eat(TokenKind::Comma) {
                self.eat(TokenKind::Semicolon);
                break;
            }
        }
        self.no_composite = saved;
        let end = self.expect(TokenKind::RBrace, "'}'").end;
        Expr::Composite {
            typ: typ.map(Box::new),
            elts,
            span: Span::new(start, end),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Block {
        let start = self.expect(TokenKind::LBrace, "'{'").start;
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            stmts.push(self.parse_stmt());
            if self.pos == before {
                // Defensive hatch; parse_stmt always consumes, but a bug
                // here must not hang a completion request.
                self.bump();
            }
        }
        let end = self.expect(TokenKind::RBrace, "'}'").end;
        Block {
            stmts,
            span: Span::new(start, end),
        }
    }

    fn parse_stmt(&mut self) -> Stmt {
        match self.kind() {
            TokenKind::Semicolon => Stmt::Empty(self.bump()),
            TokenKind::Const => Stmt::Decl(Decl::Const(self.parse_value_specs())),
            TokenKind::Var => Stmt::Decl(Decl::Var(self.parse_value_specs())),
            TokenKind::Type => Stmt::Decl(Decl::Type(self.parse_type_specs())),
            TokenKind::LBrace => {
                let b = self.parse_block();
                self.expect_semi();
                Stmt::Block(b)
            }
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::Select => self.parse_select_stmt(),
            TokenKind::Return => {
                let start = self.bump().start;
                let mut results = Vec::new();
                if !matches!(
                    self.kind(),
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    results.push(self.parse_expr());
                    while self.eat(TokenKind::Comma) {
                        results.push(self.parse_expr());
                    }
                }
                let end = results
                    .last()
                    .map(|e| e.span().end)
                    .unwrap_or(start + "return".len() as u32);
                self.expect_semi();
                Stmt::Return {
                    results,
                    span: Span::new(start, end),
                }
            }
            TokenKind::Go => {
                self.bump();
                let e = self.parse_expr();
                self.expect_semi();
                Stmt::Go(e)
            }
            TokenKind::Defer => {
                self.bump();
                let e = self.parse_expr();
                self.expect_semi();
                Stmt::Defer(e)
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                let kind = self.kind();
                let span = self.bump();
                let label = if self.at(TokenKind::Ident) {
                    Some(self.ident())
                } else {
                    None
                };
                self.expect_semi();
                Stmt::Branch { kind, label, span }
            }
            TokenKind::Func => {
                // Function literal expression statement.
                let e = self.parse_expr();
                self.expect_semi();
                Stmt::Expr(e)
            }
            _ => {
                let stmt = self.parse_simple_stmt(false);
                // A labeled statement's inner statement already consumed
                // its own terminator.
                if !matches!(stmt, Stmt::Labeled { .. }) {
                    self.expect_semi();
                }
                stmt
            }
        }
    }

    /// Assignment, short declaration, send, inc/dec, labeled, or
    /// expression statement. `for_header` allows a `range` right-hand side.
    fn parse_simple_stmt(&mut self, for_header: bool) -> Stmt {
        let start = self.tok_span().start;
        let mut lhs = vec![self.parse_expr()];
        while self.eat(TokenKind::Comma) {
            lhs.push(self.parse_expr());
        }
        match self.kind() {
            op @ (TokenKind::Assign
            | TokenKind::Define
            | TokenKind::AddAssign
            | TokenKind::SubAssign
            | TokenKind::MulAssign
            | TokenKind::QuoAssign
            | TokenKind::RemAssign
            | TokenKind::AndAssign
            | TokenKind::OrAssign
            | TokenKind::XorAssign
            | TokenKind::ShlAssign
            | TokenKind::ShrAssign
            | TokenKind::AndNotAssign) => {
                self.bump();
                if for_header && self.at(TokenKind::Range) {
                    self.bump();
                    let x = self.parse_expr();
                    let x_end = Span::at(x.span().end);
                    let mut it = lhs.into_iter();
                    let key = it.next();
                    let value = it.next();
                    let span = Span::new(start, x.span().end);
                    return Stmt::Range {
                        key,
                        value,
                        define: op == TokenKind::Define,
                        x,
                        x_end,
                        body: Block {
                            stmts: Vec::new(),
                            span: Span::at(x_end.start),
                        },
                        span,
                    };
                }
                let mut rhs = vec![self.parse_expr()];
                while self.eat(TokenKind::Comma) {
                    rhs.push(self.parse_expr());
                }
                let end = rhs.last().map(|e| e.span().end).unwrap_or(start);
                Stmt::Assign {
                    lhs,
                    op,
                    rhs,
                    span: Span::new(start, end),
                }
            }
            TokenKind::Inc | TokenKind::Dec => {
                let end = self.bump().end;
                Stmt::IncDec {
                    x: lhs.remove(0),
                    span: Span::new(start, end),
                }
            }
            TokenKind::Arrow => {
                self.bump();
                let value = self.parse_expr();
                let span = Span::new(start, value.span().end);
                Stmt::Send {
                    chan: lhs.remove(0),
                    value,
                    span,
                }
            }
            TokenKind::Colon if lhs.len() == 1 => {
                if let Expr::Ident(label) = lhs.remove(0) {
                    self.bump();
                    let stmt = Box::new(self.parse_stmt());
                    let span = Span::new(start, stmt.span().end);
                    Stmt::Labeled { label, stmt, span }
                } else {
                    Stmt::Bad(Span::new(start, self.tok_span().start))
                }
            }
            _ => Stmt::Expr(lhs.remove(0)),
        }
    }

    fn parse_if_stmt(&mut self) -> Stmt {
        let start = self.bump().start; // if
        let saved = std::mem::replace(&mut self.no_composite, true);
        let mut init = None;
        let mut cond_stmt = self.parse_simple_stmt(false);
        if self.eat(TokenKind::Semicolon) {
            init = Some(Box::new(cond_stmt));
            cond_stmt = Stmt::Expr(self.parse_expr());
        }
        self.no_composite = saved;
        let cond = match cond_stmt {
            Stmt::Expr(e) => e,
            other => {
                let span = other.span();
                init = Some(Box::new(other));
                Expr::Bad(span)
            }
        };
        let then = self.parse_block();
        let els = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                Some(Box::new(self.parse_if_stmt()))
            } else {
                let b = self.parse_block();
                self.expect_semi();
                Some(Box::new(Stmt::Block(b)))
            }
        } else {
            self.expect_semi();
            None
        };
        let end = els
            .as_ref()
            .map(|s| s.span().end)
            .unwrap_or(then.span.end);
        Stmt::If {
            init,
            cond,
            then,
            els,
            span: Span::new(start, end),
        }
    }

    fn parse_for_stmt(&mut self) -> Stmt {
        let start = self.bump().start; // for
        let saved = std::mem::replace(&mut self.no_composite, true);

        if self.at(TokenKind::LBrace) {
            self.no_composite = saved;
            let body = self.parse_block();
            self.expect_semi();
            let span = Span::new(start, body.span.end);
            return Stmt::For {
                init: None,
                cond: None,
                post: None,
                body,
                span,
            };
        }

        if self.at(TokenKind::Range) {
            // `for range x { ... }`
            self.bump();
            let x = self.parse_expr();
            let x_end = Span::at(x.span().end);
            self.no_composite = saved;
            let body = self.parse_block();
            self.expect_semi();
            let span = Span::new(start, body.span.end);
            return Stmt::Range {
                key: None,
                value: None,
                define: false,
                x,
                x_end,
                body,
                span,
            };
        }

        let first = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_simple_stmt(true))
        };

        let first = match first {
            Some(Stmt::Range {
                key,
                value,
                define,
                x,
                x_end,
                ..
            }) => {
                self.no_composite = saved;
                let body = self.parse_block();
                self.expect_semi();
                let span = Span::new(start, body.span.end);
                return Stmt::Range {
                    key,
                    value,
                    define,
                    x,
                    x_end,
                    body,
                    span,
                };
            }
            other => other,
        };

        let (init, cond, post) = if self.eat(TokenKind::Semicolon) {
            let cond = if self.at(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr())
            };
            self.eat(TokenKind::Semicolon);
            let post = if self.at(TokenKind::LBrace) {
                None
            } else {
                Some(Box::new(self.parse_simple_stmt(false)))
            };
            (first.map(Box::new), cond, post)
        } else {
            let cond = match first {
                Some(Stmt::Expr(e)) => Some(e),
                Some(other) => {
                    // `for x := f() {` is broken; treat it as init.
                    self.no_composite = saved;
                    let body = self.parse_block();
                    self.expect_semi();
                    let span = Span::new(start, body.span.end);
                    return Stmt::For {
                        init: Some(Box::new(other)),
                        cond: None,
                        post: None,
                        body,
                        span,
                    };
                }
                None => None,
            };
            (None, cond, None)
        };

        self.no_composite = saved;
        let body = self.parse_block();
        self.expect_semi();
        let span = Span::new(start, body.span.end);
        Stmt::For {
            init,
            cond,
            post,
            body,
            span,
        }
    }

    fn parse_switch_stmt(&mut self) -> Stmt {
        let start = self.bump().start; // switch
        let saved = std::mem::replace(&mut self.no_composite, true);
        let mut init = None;
        let mut tag = None;
        if !self.at(TokenKind::LBrace) {
            let first = self.parse_simple_stmt(false);
            if self.eat(TokenKind::Semicolon) {
                init = Some(Box::new(first));
                if !self.at(TokenKind::LBrace) {
                    tag = Some(match self.parse_simple_stmt(false) {
                        Stmt::Expr(e) => e,
                        other => {
                            init = Some(Box::new(other));
                            Expr::Bad(Span::at(self.tok_span().start))
                        }
                    });
                }
            } else {
                match first {
                    Stmt::Expr(e) => tag = Some(e),
                    other => init = Some(Box::new(other)),
                }
            }
        }
        self.no_composite = saved;

        self.expect(TokenKind::LBrace, "'{'");
        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            cases.push(self.parse_case_clause());
        }
        let end = self.expect(TokenKind::RBrace, "'}'").end;
        self.expect_semi();
        Stmt::Switch {
            init,
            tag,
            cases,
            span: Span::new(start, end),
        }
    }

    fn parse_select_stmt(&mut self) -> Stmt {
        let start = self.bump().start; // select
        self.expect(TokenKind::LBrace, "'{'");
        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            cases.push(self.parse_case_clause());
        }
        let end = self.expect(TokenKind::RBrace, "'}'").end;
        self.expect_semi();
        Stmt::Select {
            cases,
            span: Span::new(start, end),
        }
    }

    fn parse_case_clause(&mut self) -> CaseClause {
        let start = self.tok_span().start;
        let mut exprs = Vec::new();
        if self.eat(TokenKind::Case) {
            exprs.push(self.parse_expr());
            while self.eat(TokenKind::Comma) {
                exprs.push(self.parse_expr());
            }
        } else if !self.eat(TokenKind::Default) {
            // Resynchronize: skip the stray token into the clause body.
            self.error_here("expected 'case' or 'default'".to_string());
            self.bump();
        }
        self.expect(TokenKind::Colon, "':'");
        let mut body = Vec::new();
        while !matches!(
            self.kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
        ) {
            let before = self.pos;
            body.push(self.parse_stmt());
            if self.pos == before {
                self.bump();
            }
        }
        let end = body
            .last()
            .map(|s| s.span().end)
            .unwrap_or_else(|| self.tok_span().start);
        CaseClause {
            exprs,
            body,
            span: Span::new(start, end),
        }
    }
}

fn binary_prec(kind: TokenKind) -> u8 {
    use TokenKind::*;
    match kind {
        LOr => 1,
        LAnd => 2,
        Eql | Neq | Lss | Leq | Gtr | Geq => 3,
        Add | Sub | Or | Xor => 4,
        Mul | Quo | Rem | Shl | Shr | And | AndNot => 5,
        _ => 0,
    }
}

/// Whether an already-parsed expression can be the type of a composite
/// literal (`T{...}`, `pkg.T{...}`, `[]T{...}`, `map[K]V{...}`, ...).
fn is_literal_type(x: &Expr) -> bool {
    matches!(
        x,
        Expr::Ident(_)
            | Expr::Selector { .. }
            | Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::StructType { .. }
    )
}

fn unquote(raw: &str) -> String {
    let trimmed = raw
        .strip_prefix('"')
        .or_else(|| raw.strip_prefix('`'))
        .unwrap_or(raw);
    trimmed
        .strip_suffix('"')
        .or_else(|| trimmed.strip_suffix('`'))
        .unwrap_or(trimmed)
        .to_string()
}
