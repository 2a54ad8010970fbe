//! Package analysis for one request.
//!
//! Parses the subject file (with a semicolon injected at the cursor),
//! pulls in sibling files of the same package, and runs the tolerant
//! checker over the lot. Every file gets a disjoint span interval so
//! cursor positions stay unambiguous across files.

use std::path::Path;

use goco_checker::{check_package, Importer, PkgId, TypeCtx};
use goco_parser::parse_file_at;

/// Result of analyzing the package around the cursor.
pub struct Analysis {
    pub ctx: TypeCtx,
    pub pkg: PkgId,
    /// The cursor as a position in the analyzed span space.
    pub pos: u32,
}

pub fn analyze_package(
    filename: &str,
    src: &[u8],
    cursor: usize,
    importer: &mut dyn Importer,
) -> Analysis {
    // Inject a statement terminator at the cursor. When the cursor sits
    // in trailing whitespace at the end of a block, the checker would
    // otherwise consider the block's variables already out of scope;
    // the terminator pins the innermost scope open. Bytes before the
    // cursor do not move, so the cursor position stays valid.
    let mut with_semi = Vec::with_capacity(src.len() + 1);
    with_semi.extend_from_slice(&src[..cursor]);
    with_semi.push(b';');
    with_semi.extend_from_slice(&src[cursor..]);

    let (file, diags) = parse_file_at(&with_semi, 0);
    for d in &diags {
        tracing::debug!(target: "goco::analyze", span = %d.span, "parse error in subject file: {}", d.message);
    }

    let mut files = Vec::new();
    let mut base = with_semi.len() as u32 + 1;
    for other in find_other_package_files(filename, &file.package_name) {
        match std::fs::read(&other) {
            Ok(bytes) => {
                let (ast, _) = parse_file_at(&bytes, base);
                base += bytes.len() as u32 + 1;
                files.push(ast);
            }
            Err(err) => panic!("reading sibling file {other}: {err}"),
        }
    }
    files.push(file);

    let mut ctx = TypeCtx::new();
    let pkg = check_package(&mut ctx, "", &files, importer);
    Analysis {
        ctx,
        pkg,
        pos: cursor as u32,
    }
}

/// Files in the subject file's directory that belong to the same
/// package: same package clause, not the subject itself, not hidden,
/// and `_test` files only when the subject is itself a test file.
fn find_other_package_files(filename: &str, package_name: &str) -> Vec<String> {
    if filename.is_empty() {
        return Vec::new();
    }
    let path = Path::new(filename);
    let Some(dir) = path.parent() else {
        return Vec::new();
    };
    let own_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let is_test_file = filename.ends_with("_test.go");

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => panic!("reading package directory {}: {err}", dir.display()),
    };

    let mut out = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if Some(&name) == own_name.as_ref() || !name.ends_with(".go") {
            continue;
        }
        if !is_test_file && name.ends_with("_test.go") {
            continue;
        }
        let abspath = dir.join(&name);
        if package_name_of(&abspath).as_deref() == Some(package_name) {
            out.push(abspath.to_string_lossy().into_owned());
        }
    }
    out.sort();
    out
}

fn package_name_of(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    goco_parser::parse_package_clause(&bytes)
}
