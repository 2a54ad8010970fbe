//! Cursor-context deduction.
//!
//! Classifies what the cursor sits inside by looking at the last token
//! before it: an import path, a selector, a composite literal body, or
//! nothing recognizable. Everything downstream dispatches on this.

use goco_scanner::TokenKind;

use crate::token_iter::TokenIterator;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorContext {
    Unknown,
    /// Inside an import path string.
    Import,
    /// After `expr.`; the expression text is in [`DeducedContext::expr`].
    Select,
    /// Inside a composite literal body; the literal's type text is in
    /// [`DeducedContext::expr`].
    CompositeLiteral,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeducedContext {
    pub context: CursorContext,
    /// Selector expression or composite-literal type text.
    pub expr: String,
    /// The partially typed identifier (or import path) being completed.
    pub partial: String,
}

impl DeducedContext {
    fn unknown() -> DeducedContext {
        DeducedContext {
            context: CursorContext::Unknown,
            expr: String::new(),
            partial: String::new(),
        }
    }

    fn unknown_with(partial: String) -> DeducedContext {
        DeducedContext {
            context: CursorContext::Unknown,
            expr: String::new(),
            partial,
        }
    }
}

pub fn deduce_cursor_context(src: &[u8], cursor: usize) -> DeducedContext {
    let mut iter = TokenIterator::up_to_cursor(src, cursor);
    if iter.is_empty() {
        return DeducedContext::unknown();
    }

    let tok = iter.token().clone();
    match tok.kind {
        TokenKind::String => {
            // Make sure the cursor is still inside the string.
            let s = tok.literal.clone();
            if s.len() > 1 && s.ends_with('"') && tok.offset as usize + s.len() <= cursor {
                return DeducedContext::unknown();
            }
            deduce_import_path(&mut iter, &s, tok.offset as usize, cursor)
        }
        TokenKind::Period => {
            // `<expr>.` with nothing typed yet.
            DeducedContext {
                context: CursorContext::Select,
                expr: iter.extract_expr(),
                partial: String::new(),
            }
        }
        TokenKind::Ident
        | TokenKind::Type
        | TokenKind::Const
        | TokenKind::Var
        | TokenKind::Func
        | TokenKind::Package => {
            // `<expr>.<partial-ident>` or a bare partial.
            let partial = if tok.kind == TokenKind::Ident {
                // Cut the identifier at the cursor: completing `ab|c`
                // means the partial is `ab`.
                let partial_len = cursor - tok.offset as usize;
                // Cursor past the end of the literal means whitespace
                // separates them; that is no context at all.
                if partial_len > tok.literal.len() {
                    return DeducedContext::unknown();
                }
                match tok.literal.get(..partial_len) {
                    Some(p) => p.to_string(),
                    // Mid-codepoint cursor in a non-ASCII identifier.
                    None => return DeducedContext::unknown(),
                }
            } else {
                // Keywords are taken whole; they engage class filters.
                tok.text().to_string()
            };

            iter.go_back();
            match iter.token().kind {
                TokenKind::Period => DeducedContext {
                    context: CursorContext::Select,
                    expr: iter.extract_expr(),
                    partial,
                },
                TokenKind::Comma | TokenKind::LBrace => {
                    // `&Struct{Hello: 1, Wor|}`: struct field names.
                    DeducedContext {
                        context: CursorContext::CompositeLiteral,
                        expr: iter.extract_composite_type(),
                        partial,
                    }
                }
                _ => DeducedContext::unknown_with(partial),
            }
        }
        TokenKind::Comma | TokenKind::LBrace => DeducedContext {
            context: CursorContext::CompositeLiteral,
            expr: iter.extract_composite_type(),
            partial: String::new(),
        },
        _ => DeducedContext::unknown(),
    }
}

/// Backward walk checking that the tokens before a string literal form
/// an import declaration (`import` optionally followed by a
/// parenthesized list of optional-alias-then-path entries). The
/// previously seen token drives what is grammatical next.
fn deduce_import_path(
    iter: &mut TokenIterator,
    literal: &str,
    offset: usize,
    cursor: usize,
) -> DeducedContext {
    let mut prev = TokenKind::String;
    while iter.go_back() {
        let kind = iter.token().kind;
        match kind {
            TokenKind::String => {
                if !matches!(
                    prev,
                    TokenKind::Semicolon | TokenKind::Ident | TokenKind::Period
                ) {
                    return DeducedContext::unknown();
                }
            }
            TokenKind::LParen | TokenKind::Semicolon => {
                if !matches!(
                    prev,
                    TokenKind::String | TokenKind::Ident | TokenKind::Period
                ) {
                    return DeducedContext::unknown();
                }
            }
            TokenKind::Ident | TokenKind::Period => {
                if prev != TokenKind::String {
                    return DeducedContext::unknown();
                }
            }
            TokenKind::Import => {
                if matches!(
                    prev,
                    TokenKind::String
                        | TokenKind::Ident
                        | TokenKind::Period
                        | TokenKind::LParen
                ) {
                    let path_len = (cursor - offset).min(literal.len());
                    let path = literal.get(1..path_len).unwrap_or("").to_string();
                    return DeducedContext {
                        context: CursorContext::Import,
                        expr: String::new(),
                        partial: path,
                    };
                }
                return DeducedContext::unknown();
            }
            _ => return DeducedContext::unknown(),
        }
        prev = kind;
    }
    DeducedContext::unknown()
}
