//! End-to-end suggestion scenarios through the public `Suggester` API.

use std::io::Write as _;

use goco_common::BuildEnv;

use crate::collector::Class;
use crate::suggest::{Config, Suggester};

fn test_env(src_dirs: Vec<std::path::PathBuf>) -> BuildEnv {
    BuildEnv {
        goos: "linux".to_string(),
        goarch: "amd64".to_string(),
        compiler: "gc".to_string(),
        src_dirs,
        build_tags: Vec::new(),
        cgo_enabled: false,
        install_suffix: String::new(),
        release_tags: Vec::new(),
    }
}

fn suggester() -> Suggester {
    Suggester::new(Config {
        env: test_env(Vec::new()),
        ..Config::default()
    })
}

/// Run a suggestion over a source with an `@` cursor marker.
fn suggest(s: &Suggester, src_with_marker: &str) -> (Vec<(Class, String, String)>, usize) {
    let cursor = src_with_marker.find('@').expect("missing @ marker");
    let src = src_with_marker.replace('@', "");
    let (candidates, len) = s.suggest("", src.as_bytes(), cursor as isize);
    (
        candidates
            .into_iter()
            .map(|c| (c.class, c.name, c.typ))
            .collect(),
        len,
    )
}

fn names(results: &[(Class, String, String)]) -> Vec<&str> {
    results.iter().map(|(_, n, _)| n.as_str()).collect()
}

#[test]
fn scope_respects_declaration_order() {
    let s = suggester();
    let (got, len) = suggest(
        &s,
        "package p

var Z1 = 1

func f() {
\tx := 1
\t@
\ty := 2
}

var Z2 = 2
",
    );
    // Locals declared before the cursor and package-scope names
    // declared anywhere are visible; the later local is not.
    assert_eq!(names(&got), vec!["f", "Z1", "Z2", "x"]);
    assert_eq!(got[0].0, Class::Func);
    assert!(got[1..].iter().all(|(c, _, _)| *c == Class::Var));
    assert_eq!(len, 0);
}

#[test]
fn select_lists_fields_and_methods() {
    let s = suggester();
    let (got, _) = suggest(
        &s,
        "package p

type Point struct { X int; Y int }

func (p Point) Dist() int { return 0 }

var pt Point

func g() {
\tpt.@
}
",
    );
    assert_eq!(
        got,
        vec![
            (Class::Func, "Dist".to_string(), "func() int".to_string()),
            (Class::Var, "X".to_string(), "int".to_string()),
            (Class::Var, "Y".to_string(), "int".to_string()),
        ]
    );
}

#[test]
fn select_partial_sets_replacement_length() {
    let s = suggester();
    let (got, len) = suggest(
        &s,
        "package p

type Point struct { X int; Y int }

func (p Point) Dist() int { return 0 }

func g(pt Point) {
\tpt.Di@
}
",
    );
    assert_eq!(names(&got), vec!["Dist"]);
    assert_eq!(len, 2);
}

#[test]
fn composite_literal_lists_fields_only() {
    let s = suggester();
    let (got, _) = suggest(
        &s,
        "package p

type Point struct { X int; Y int }

func (p Point) Dist() int { return 0 }

func h() {
\t_ = Point{X: 1, @}
}
",
    );
    assert_eq!(
        got,
        vec![
            (Class::Var, "X".to_string(), "int".to_string()),
            (Class::Var, "Y".to_string(), "int".to_string()),
        ]
    );
}

#[test]
fn unexported_fields_of_local_package_are_offered() {
    let s = suggester();
    let (got, _) = suggest(
        &s,
        "package p

type box struct { inner int; Outer int }

func h(b box) {
\tb.@
}
",
    );
    assert_eq!(names(&got), vec!["Outer", "inner"]);
}

#[test]
fn class_literal_partial_engages_kind_filter() {
    let s = suggester();
    let (got, len) = suggest(
        &s,
        "package p

type Point struct { X int }

var V = 1

func F() {}

func g() {
\tx := 1
\t_ = x
\tvar@
}
",
    );
    // Partial \"var\" filters by class instead of by name.
    assert!(got.iter().all(|(c, _, _)| *c == Class::Var));
    assert_eq!(names(&got), vec!["V", "x"]);
    assert_eq!(len, 3);
}

#[test]
fn wrong_case_prefix_is_a_fallback() {
    let s = suggester();
    let (got, _) = suggest(
        &s,
        "package p

var Xylophone = 1

func g() {
\tx := 1
\t_ = x
\txy@
}
",
    );
    // No exact match for \"xy\", so the case-insensitive partition wins.
    assert_eq!(names(&got), vec!["Xylophone"]);
}

#[test]
fn no_candidates_means_zero_length() {
    let s = suggester();
    let (got, len) = suggest(
        &s,
        "package p

func g() {
\tzzz.@
}
",
    );
    assert!(got.is_empty());
    assert_eq!(len, 0);
}

#[test]
fn import_paths_from_package_roots() {
    let tmp = tempfile::tempdir().unwrap();
    let pkgdir = tmp.path().join("pkg").join("linux_amd64");
    std::fs::create_dir_all(pkgdir.join("foo")).unwrap();
    for rel in ["fmt.a", "foobar.a", "foo/sub.a", "strings.a"] {
        let mut f = std::fs::File::create(pkgdir.join(rel)).unwrap();
        f.write_all(b"!<arch>").unwrap();
    }

    let s = Suggester::new(Config {
        env: test_env(vec![tmp.path().join("src")]),
        ..Config::default()
    });
    let (got, len) = suggest(&s, "package p\n\nimport \"fo@\n");
    assert_eq!(
        got,
        vec![
            (Class::Import, "foo/sub".to_string(), String::new()),
            (Class::Import, "foobar".to_string(), String::new()),
        ]
    );
    assert_eq!(len, 2);
}

#[test]
fn package_member_selection_is_exported_only() {
    let tmp = tempfile::tempdir().unwrap();
    let libdir = tmp.path().join("src").join("mylib");
    std::fs::create_dir_all(&libdir).unwrap();
    std::fs::write(
        libdir.join("lib.go"),
        "package mylib

const Version = 3

func Exported() {}

func hidden() {}

type Thing struct { N int }
",
    )
    .unwrap();

    let s = Suggester::new(Config {
        env: test_env(vec![tmp.path().join("src")]),
        ..Config::default()
    });
    let (got, _) = suggest(
        &s,
        "package p

import \"mylib\"

func g() {
\tmylib.@
}
",
    );
    assert_eq!(names(&got), vec!["Version", "Exported", "Thing"]);
    assert_eq!(got[0].0, Class::Const);
    assert_eq!(got[1].0, Class::Func);
    assert_eq!(got[2].0, Class::Type);
    assert_eq!(got[2].2, "struct");
}

#[test]
fn imported_type_members_resolve_across_packages() {
    let tmp = tempfile::tempdir().unwrap();
    let libdir = tmp.path().join("src").join("mylib");
    std::fs::create_dir_all(&libdir).unwrap();
    std::fs::write(
        libdir.join("lib.go"),
        "package mylib

type Thing struct { N int; hidden int }

func (t Thing) Shout() string { return \"\" }
",
    )
    .unwrap();

    let s = Suggester::new(Config {
        env: test_env(vec![tmp.path().join("src")]),
        ..Config::default()
    });
    let (got, _) = suggest(
        &s,
        "package p

import \"mylib\"

func g(t mylib.Thing) {
\tt.@
}
",
    );
    // The unexported field of the foreign struct stays hidden.
    assert_eq!(names(&got), vec!["Shout", "N"]);
}
