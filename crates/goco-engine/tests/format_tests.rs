//! Formatter outputs are a protocol; these pin them byte-for-byte.

use goco_engine::{formatter_by_name, Candidate, Class};
use pretty_assertions::assert_eq;

fn candidates() -> Vec<Candidate> {
    let mk = |name: &str, typ: &str| Candidate {
        class: Class::Func,
        name: name.to_string(),
        typ: typ.to_string(),
    };
    vec![
        mk("remote_complete", "func(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)"),
        mk("remote_shutdown", "func(conn *rpc.Conn, code int) int"),
        mk("remote_status", "func(conn *rpc.Conn) string"),
    ]
}

fn render(format: &str, candidates: &[Candidate], num: usize) -> String {
    let f = formatter_by_name(format);
    let mut buf = Vec::new();
    f(&mut buf, candidates, num).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn nice() {
    let want = "Found 3 candidates:
  func remote_complete(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)
  func remote_shutdown(conn *rpc.Conn, code int) int
  func remote_status(conn *rpc.Conn) string
";
    assert_eq!(render("nice", &candidates(), 7), want);
}

#[test]
fn json() {
    let want = r#"[7, [{"class": "func", "name": "remote_complete", "type": "func(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)"}, {"class": "func", "name": "remote_shutdown", "type": "func(conn *rpc.Conn, code int) int"}, {"class": "func", "name": "remote_status", "type": "func(conn *rpc.Conn) string"}]]"#;
    assert_eq!(render("json", &candidates(), 7), want);
}

#[test]
fn vim() {
    let want = "[7, [{'word': 'remote_complete(', 'abbr': 'func remote_complete(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)', 'info': 'func remote_complete(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)'}, {'word': 'remote_shutdown(', 'abbr': 'func remote_shutdown(conn *rpc.Conn, code int) int', 'info': 'func remote_shutdown(conn *rpc.Conn, code int) int'}, {'word': 'remote_status(', 'abbr': 'func remote_status(conn *rpc.Conn) string', 'info': 'func remote_status(conn *rpc.Conn) string'}]]";
    assert_eq!(render("vim", &candidates(), 7), want);
}

#[test]
fn emacs() {
    let want = "remote_complete,,func(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)
remote_shutdown,,func(conn *rpc.Conn, code int) int
remote_status,,func(conn *rpc.Conn) string
";
    assert_eq!(render("emacs", &candidates(), 7), want);
}

#[test]
fn csv() {
    let want = "func,,remote_complete,,func(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int)
func,,remote_shutdown,,func(conn *rpc.Conn, code int) int
func,,remote_status,,func(conn *rpc.Conn) string
";
    assert_eq!(render("csv", &candidates(), 7), want);
}

#[test]
fn godit() {
    let want = "7,,3
func remote_complete(conn *rpc.Conn, src []byte, cursor int) (c []Candidate, n int),,remote_complete(
func remote_shutdown(conn *rpc.Conn, code int) int,,remote_shutdown(
func remote_status(conn *rpc.Conn) string,,remote_status(
";
    assert_eq!(render("godit", &candidates(), 7), want);
}

#[test]
fn unknown_format_falls_back_to_nice() {
    assert_eq!(
        render("nonsense", &[], 0),
        "Found 0 candidates:\n"
    );
}

#[test]
fn nullary_func_suggestion_includes_parens() {
    let c = Candidate {
        class: Class::Func,
        name: "Close".to_string(),
        typ: "func() error".to_string(),
    };
    assert_eq!(c.suggestion(), "Close()");
    let c2 = Candidate {
        class: Class::Var,
        name: "count".to_string(),
        typ: "int".to_string(),
    };
    assert_eq!(c2.suggestion(), "count");
}

#[test]
fn mixed_classes_render_with_types() {
    let list = vec![
        Candidate {
            class: Class::Const,
            name: "MaxSize".to_string(),
            typ: "untyped int".to_string(),
        },
        Candidate {
            class: Class::Type,
            name: "Reader".to_string(),
            typ: "interface".to_string(),
        },
        Candidate {
            class: Class::Var,
            name: "buf".to_string(),
            typ: "[]byte".to_string(),
        },
    ];
    let want = "Found 3 candidates:
  const MaxSize untyped int
  type Reader interface
  var buf []byte
";
    assert_eq!(render("nice", &list, 0), want);
}
