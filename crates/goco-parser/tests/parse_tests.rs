use goco_parser::ast::{Decl, Expr, Stmt};
use goco_parser::{parse_expr, parse_file, parse_package_clause};
use pretty_assertions::assert_eq;

#[test]
fn package_clause_only() {
    assert_eq!(
        parse_package_clause(b"package mylib\n\nfunc F() {}\n"),
        Some("mylib".to_string())
    );
    assert_eq!(parse_package_clause(b"// comment\nfunc F() {}"), None);
}

#[test]
fn file_structure() {
    let src = b"package main

import (
\t\"fmt\"
\tstr \"strings\"
)

const K = 1

var a, b int

type T struct {
\tName string
\tage  int
\tinner
}

func (t *T) M(n int) string { return \"\" }

func main() {
\tfmt.Println(str.ToUpper(\"hi\"))
}
";
    let (file, diags) = parse_file(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert_eq!(file.package_name, "main");
    assert_eq!(file.imports.len(), 2);
    assert_eq!(file.imports[0].path, "fmt");
    assert_eq!(file.imports[1].alias.as_ref().unwrap().name, "str");
    assert_eq!(file.decls.len(), 5);

    match &file.decls[2] {
        Decl::Type(specs) => match &specs[0].typ {
            Expr::StructType { fields, .. } => {
                assert_eq!(fields.len(), 3);
                assert!(!fields[0].is_embedded());
                assert!(fields[2].is_embedded());
            }
            other => panic!("expected struct type, got {other:?}"),
        },
        other => panic!("expected type decl, got {other:?}"),
    }

    match &file.decls[3] {
        Decl::Func(f) => {
            assert!(f.recv.is_some());
            assert_eq!(f.name.name, "M");
            assert_eq!(f.sig.params.len(), 1);
            assert_eq!(f.sig.results.len(), 1);
        }
        other => panic!("expected method decl, got {other:?}"),
    }
}

#[test]
fn statements_and_scoped_constructs() {
    let src = b"package p

func f(items []int) int {
\ttotal := 0
\tfor i, v := range items {
\t\tif v > 0 {
\t\t\ttotal += v
\t\t} else if i == 0 {
\t\t\ttotal--
\t\t}
\t}
\tswitch total {
\tcase 0:
\t\treturn -1
\tdefault:
\t\treturn total
\t}
}
";
    let (file, diags) = parse_file(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Decl::Func(f) = &file.decls[0] else {
        panic!("expected func");
    };
    let body = f.body.as_ref().unwrap();
    assert!(matches!(body.stmts[0], Stmt::Assign { .. }));
    assert!(matches!(body.stmts[1], Stmt::Range { .. }));
    let Stmt::Switch { cases, .. } = &body.stmts[2] else {
        panic!("expected switch, got {:?}", body.stmts[2]);
    };
    assert_eq!(cases.len(), 2);
    assert!(cases[1].exprs.is_empty(), "default clause has no exprs");
}

#[test]
fn composite_literals_vs_blocks() {
    let src = b"package p

func f() {
\tp := Point{X: 1, Y: 2}
\tif p.X > 0 {
\t\t_ = p
\t}
}
";
    let (file, diags) = parse_file(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Decl::Func(f) = &file.decls[0] else {
        panic!("expected func");
    };
    let body = f.body.as_ref().unwrap();
    let Stmt::Assign { rhs, .. } = &body.stmts[0] else {
        panic!("expected assign");
    };
    assert!(matches!(rhs[0], Expr::Composite { .. }));
    assert!(matches!(body.stmts[1], Stmt::If { .. }));
}

#[test]
fn recovery_keeps_package_name_and_later_decls() {
    let src = b"package p

func broken( {
\tzzzz !!
}

var Fine = 1
";
    let (file, _) = parse_file(src);
    assert_eq!(file.package_name, "p");
    let has_fine = file.decls.iter().any(|d| match d {
        Decl::Var(specs) => specs.iter().any(|s| s.names.iter().any(|n| n.name == "Fine")),
        _ => false,
    });
    assert!(has_fine, "declaration after broken code was lost: {:?}", file.decls);
}

#[test]
fn missing_package_clause_defaults() {
    let (file, diags) = parse_file(b"func F() {}\n");
    assert_eq!(file.package_name, "_");
    assert!(!diags.is_empty());
}

#[test]
fn expression_entry_point() {
    let e = parse_expr(b"f.p[i].x()").expect("expression should parse");
    assert!(matches!(e, Expr::Call { .. }));
    assert!(parse_expr(b"").is_none());
}

#[test]
fn never_hangs_on_garbage() {
    // A soup of brackets and operators must terminate.
    let (file, _) = parse_file(b"package p\nfunc f() { ((((]]]] if for >>= ,,, } var x = ");
    assert_eq!(file.package_name, "p");
}
