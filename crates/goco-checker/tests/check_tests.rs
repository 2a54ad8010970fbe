use goco_checker::{
    check_package, eval, type_string, NullImporter, ObjKind, PkgId, TypeCtx,
};
use goco_parser::parse_file;

fn checked(src: &str) -> (TypeCtx, PkgId) {
    let (file, _) = parse_file(src.as_bytes());
    let mut ctx = TypeCtx::new();
    let pkg = check_package(&mut ctx, "p", &[file], &mut NullImporter);
    (ctx, pkg)
}

fn unqualified(ctx: &TypeCtx, id: goco_checker::TypeId) -> String {
    type_string(ctx, id, &|_| None)
}

#[test]
fn package_scope_collects_declarations() {
    let src = "
package p

const K = 2
var V int
type T struct { N int }
func F(a int) string { return \"\" }
";
    let (ctx, pkg) = checked(src);
    let scope = ctx.pkg(pkg).scope;
    for (name, kind) in [
        ("K", ObjKind::Const),
        ("V", ObjKind::Var),
        ("T", ObjKind::TypeName),
        ("F", ObjKind::Func),
    ] {
        let obj = ctx.lookup(scope, name).unwrap_or_else(|| panic!("missing {name}"));
        assert_eq!(ctx.obj(obj).kind, kind, "kind of {name}");
    }
}

#[test]
fn eval_distinguishes_types_and_values() {
    let src = "
package p

type T struct { N int }
var v T
";
    let (mut ctx, pkg) = checked(src);
    let pos = src.len() as u32;

    let t = eval(&mut ctx, pkg, pos, "T");
    assert!(t.is_type());

    let v = eval(&mut ctx, pkg, pos, "v");
    assert!(v.is_value());
    assert!(v.addressable());

    let lit = eval(&mut ctx, pkg, pos, "T{}");
    assert!(lit.is_value());
    assert!(!lit.addressable());

    let ptr = eval(&mut ctx, pkg, pos, "&v");
    assert!(ptr.is_value());
    assert_eq!(unqualified(&ctx, ptr.typ), "*T");

    let field = eval(&mut ctx, pkg, pos, "v.N");
    assert!(field.is_value());
    assert_eq!(unqualified(&ctx, field.typ), "int");
}

#[test]
fn function_locals_are_position_scoped() {
    let src = "\
package p

func f() {
	x := 1
	_ = x
	y := 2
	_ = y
}
";
    let (mut ctx, pkg) = checked(src);
    // A position between the two declarations sees x but not y.
    let pos = src.find("y :=").unwrap() as u32 - 1;
    let x = eval(&mut ctx, pkg, pos, "x");
    assert!(x.is_value(), "x should be in scope");
    let y = eval(&mut ctx, pkg, pos, "y");
    assert!(!y.is_value(), "y is declared later");
}

#[test]
fn range_variables_live_from_the_range_expression() {
    let src = "\
package p

func f(items []string) {
	for i, s := range items {
		_ = i
		_ = s
	}
}
";
    let (mut ctx, pkg) = checked(src);
    // Right at the start of the loop body, both range variables are in
    // scope with their element types.
    let pos = src.find("_ = i").unwrap() as u32;
    let i = eval(&mut ctx, pkg, pos, "i");
    assert!(i.is_value());
    assert_eq!(unqualified(&ctx, i.typ), "int");
    let s = eval(&mut ctx, pkg, pos, "s");
    assert!(s.is_value());
    assert_eq!(unqualified(&ctx, s.typ), "string");
}

#[test]
fn signatures_render_like_go() {
    let src = "
package p

func F(cli *T, n int, rest ...string) (out string, err error) { return }
type T struct { N int }
";
    let (ctx, pkg) = checked(src);
    let scope = ctx.pkg(pkg).scope;
    let f = ctx.lookup(scope, "F").unwrap();
    assert_eq!(
        unqualified(&ctx, ctx.obj(f).typ),
        "func(cli *T, n int, rest ...string) (out string, err error)"
    );
}

#[test]
fn qualifier_prefixes_foreign_packages() {
    let src = "
package p

type T struct { N int }
var v T
";
    let (mut ctx, pkg) = checked(src);
    let tv = eval(&mut ctx, pkg, src.len() as u32, "v");
    let qualified = type_string(&ctx, tv.typ, &|p| Some(ctx.pkg(p).name.clone()));
    assert_eq!(qualified, "p.T");
    let local = type_string(&ctx, tv.typ, &|_| None);
    assert_eq!(local, "T");
}

#[test]
fn tuple_results_spread_across_short_declarations() {
    let src = "\
package p

func pair() (int, string) { return 0, \"\" }

func f() {
	a, b := pair()
	_ = a
	_ = b
}
";
    let (mut ctx, pkg) = checked(src);
    let pos = src.find("_ = a").unwrap() as u32;
    let a = eval(&mut ctx, pkg, pos, "a");
    assert_eq!(unqualified(&ctx, a.typ), "int");
    let b = eval(&mut ctx, pkg, pos, "b");
    assert_eq!(unqualified(&ctx, b.typ), "string");
}

#[test]
fn broken_code_still_produces_a_package() {
    let src = "
package p

type T struct { N undefinedType }
var v = missingFunc(
func f( {
";
    let (file, _) = parse_file(src.as_bytes());
    let mut ctx = TypeCtx::new();
    let pkg = check_package(&mut ctx, "p", &[file], &mut NullImporter);
    assert_eq!(ctx.pkg(pkg).name, "p");
    let scope = ctx.pkg(pkg).scope;
    assert!(ctx.lookup(scope, "T").is_some());
}

#[test]
fn closure_bodies_get_scopes() {
    let src = "\
package p

func f() {
	go func(msg string) {
		_ = msg
	}(\"hi\")
}
";
    let (mut ctx, pkg) = checked(src);
    let pos = src.find("_ = msg").unwrap() as u32;
    let msg = eval(&mut ctx, pkg, pos, "msg");
    assert!(msg.is_value(), "closure parameter should be in scope");
    assert_eq!(unqualified(&ctx, msg.typ), "string");
}
