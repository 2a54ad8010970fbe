//! Ground truth for the selector walker: method sets, embedding,
//! shadowing, ambiguity, and cycles, checked against what the Go
//! compiler itself would accept after the dot.

use goco_checker::{check_package, eval, NullImporter, PkgId, TypeCtx};
use goco_parser::parse_file;

use crate::member;

const SRC: &str = "
package p

type S struct { x int; y int }
func (S) Sv() {}
func (*S) Sp() {}
var s S

type I interface { f(); g() }

type P *S

type T1 struct { *T2 }
type T2 struct { *T1 }
func (*T1) t1() {}
func (*T2) t2() {}

type X int
func (*X) x() {}
type X1 struct { X }
type X2 struct { *X }
type X12 struct { X1; X2 }

type A1 int
func (A1) A() int { return 0 }
type A2 int
func (A2) A() int { return 0 }
type A struct { A1; A2 }
";

fn checked() -> (TypeCtx, PkgId) {
    let (file, _) = parse_file(SRC.as_bytes());
    let mut ctx = TypeCtx::new();
    let pkg = check_package(&mut ctx, "p", &[file], &mut NullImporter);
    (ctx, pkg)
}

fn members(ctx: &mut TypeCtx, pkg: PkgId, expr: &str) -> Vec<String> {
    let pos = SRC.len() as u32;
    let tv = eval(ctx, pkg, pos, expr);
    let mut out = Vec::new();
    assert!(
        member::walk(ctx, &tv, &mut |obj| out.push(ctx.obj(obj).name.clone())),
        "walk({expr}) failed to evaluate"
    );
    out.sort();
    out
}

#[test]
fn ground_truth_table() {
    let (mut ctx, pkg) = checked();
    let cases: &[(&str, &[&str])] = &[
        // Method expressions on a named type: value-receiver only.
        ("S", &["Sv"]),
        // ... but a pointer type gets the full method set.
        ("*S", &["Sp", "Sv"]),
        // A non-addressable value: fields, no pointer-receiver methods.
        ("S{}", &["Sv", "x", "y"]),
        // An addressable variable: everything.
        ("s", &["Sp", "Sv", "x", "y"]),
        // Interfaces, as type and as value.
        ("I", &["f", "g"]),
        ("I(nil)", &["f", "g"]),
        // A pointer to an interface has no methods at all.
        ("(*I)(nil)", &[]),
        // Mutually embedded pointer structs terminate and promote both.
        ("*T1", &["t1", "t2"]),
        ("T1", &["t2"]),
        // Named type with pointer underlying: no method expressions.
        ("P", &[]),
        // Pointer-receiver method via value embedding: unreachable.
        ("X1", &[]),
        // ... but reachable through pointer embedding.
        ("X2", &["x"]),
        // Both at the same depth: ambiguity suppresses the name.
        ("X12", &[]),
        // Equal-depth methods from two embedded types: ambiguous.
        ("A", &[]),
        // The predeclared error interface.
        ("error", &["Error"]),
    ];
    for (expr, want) in cases {
        let got = members(&mut ctx, pkg, expr);
        assert_eq!(&got, want, "members of {expr}");
    }
}

#[test]
fn shallow_member_shadows_deeper_one() {
    let src = "
package p

type Inner struct { Name string; Only int }
type Outer struct {
\tInner
\tName int
}
var o Outer
";
    let (file, _) = parse_file(src.as_bytes());
    let mut ctx = TypeCtx::new();
    let pkg = check_package(&mut ctx, "p", &[file], &mut NullImporter);
    let got = members(&mut ctx, pkg, "o");
    // Outer.Name shadows Inner.Name; Inner itself and the promoted
    // Only both surface.
    assert_eq!(got, vec!["Inner", "Name", "Only"]);
}

fn members_with(ctx: &mut TypeCtx, pkg: PkgId, pos: u32, expr: &str) -> Vec<String> {
    let tv = eval(ctx, pkg, pos, expr);
    let mut out = Vec::new();
    member::walk(ctx, &tv, &mut |obj| out.push(ctx.obj(obj).name.clone()));
    out.sort();
    out
}

#[test]
fn value_through_pointer_gets_pointer_methods() {
    let src = "
package p

type S struct { n int }
func (S) V() {}
func (*S) P() {}

func f(p *S) {
}
";
    let (file, _) = parse_file(src.as_bytes());
    let mut ctx = TypeCtx::new();
    let pkg = check_package(&mut ctx, "p", &[file], &mut NullImporter);
    let pos = src.rfind('}').unwrap() as u32 - 2;
    let got = members_with(&mut ctx, pkg, pos, "p");
    assert_eq!(got, vec!["P", "V", "n"]);
}
