use goco_scanner::{Scanner, TokenKind};
use pretty_assertions::assert_eq;

fn kinds(src: &str) -> Vec<TokenKind> {
    let mut s = Scanner::new(src.as_bytes());
    let mut out = Vec::new();
    loop {
        let t = s.next_token();
        if t.kind == TokenKind::Eof {
            break;
        }
        out.push(t.kind);
    }
    out
}

fn texts(src: &str) -> Vec<String> {
    let mut s = Scanner::new(src.as_bytes());
    let mut out = Vec::new();
    loop {
        let t = s.next_token();
        if t.kind == TokenKind::Eof {
            break;
        }
        out.push(t.text().to_string());
    }
    out
}

#[test]
fn scans_package_clause() {
    use TokenKind::*;
    assert_eq!(kinds("package main\n"), vec![Package, Ident, Semicolon]);
}

#[test]
fn semicolon_inserted_after_ident_and_brackets() {
    use TokenKind::*;
    assert_eq!(
        kinds("x := f()\ny++\n"),
        vec![Ident, Define, Ident, LParen, RParen, Semicolon, Ident, Inc, Semicolon]
    );
}

#[test]
fn no_semicolon_after_operators() {
    use TokenKind::*;
    assert_eq!(kinds("x +\ny\n"), vec![Ident, Add, Ident, Semicolon]);
}

#[test]
fn semicolon_inserted_at_eof() {
    use TokenKind::*;
    assert_eq!(kinds("return x"), vec![Return, Ident, Semicolon]);
}

#[test]
fn keywords_recognized() {
    use TokenKind::*;
    assert_eq!(
        kinds("func (s *S) M() interface{} { return nil }"),
        vec![
            Func, LParen, Ident, Mul, Ident, RParen, Ident, LParen, RParen, Interface, LBrace,
            RBrace, LBrace, Return, Ident, RBrace, Semicolon
        ]
    );
}

#[test]
fn string_literals_keep_quotes() {
    assert_eq!(texts(r#"import "fmt""#), vec!["import", "\"fmt\"", ";"]);
}

#[test]
fn unterminated_string_is_preserved() {
    let mut s = Scanner::new(br#"import "fo"#);
    assert_eq!(s.next_token().kind, TokenKind::Import);
    let t = s.next_token();
    assert_eq!(t.kind, TokenKind::String);
    assert_eq!(t.literal, "\"fo");
}

#[test]
fn raw_string_spans_newlines() {
    let mut s = Scanner::new(b"`a\nb`");
    let t = s.next_token();
    assert_eq!(t.kind, TokenKind::String);
    assert_eq!(t.literal, "`a\nb`");
}

#[test]
fn comments_are_skipped_but_still_break_lines() {
    use TokenKind::*;
    assert_eq!(kinds("x // trailing\ny"), vec![Ident, Semicolon, Ident, Semicolon]);
    assert_eq!(kinds("x /* inline */ y"), vec![Ident, Ident, Semicolon]);
    assert_eq!(kinds("x /* multi\nline */ y"), vec![Ident, Semicolon, Ident, Semicolon]);
}

#[test]
fn numbers() {
    use TokenKind::*;
    assert_eq!(
        kinds("1 0x1f 0b101 1_000 3.14 1e9 2i .5"),
        vec![Int, Int, Int, Int, Float, Float, Imag, Float, Semicolon]
    );
}

#[test]
fn compound_operators() {
    use TokenKind::*;
    assert_eq!(
        kinds("a &^= b << 2"),
        vec![Ident, AndNotAssign, Ident, Shl, Int, Semicolon]
    );
    assert_eq!(kinds("ch <- v"), vec![Ident, Arrow, Ident, Semicolon]);
    assert_eq!(kinds("a := b != c"), vec![Ident, Define, Ident, Neq, Ident, Semicolon]);
}

#[test]
fn ellipsis_and_period() {
    use TokenKind::*;
    assert_eq!(kinds("f(a...)"), vec![Ident, LParen, Ident, Ellipsis, RParen, Semicolon]);
    assert_eq!(kinds("a.b"), vec![Ident, Period, Ident, Semicolon]);
}

#[test]
fn offsets_are_byte_positions() {
    let mut s = Scanner::new(b"ab cd");
    assert_eq!(s.next_token().offset, 0);
    assert_eq!(s.next_token().offset, 3);
}
