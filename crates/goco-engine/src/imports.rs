//! Import-path enumeration and the source importer.
//!
//! Two separate concerns share this module because they share the
//! build environment: suggesting import paths (walking the compiled
//! package archive tree) and resolving `import` declarations to typed
//! packages (parsing package source, with a process-wide parse cache).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use walkdir::WalkDir;

use goco_checker::{check_package, Importer, PkgId, TypeCtx};
use goco_common::BuildEnv;
use goco_parser::ast::File;

use crate::collector::CandidateCollector;

// ---------------------------------------------------------------------
// Import-path candidates
// ---------------------------------------------------------------------

/// Walk each package root and collect import paths for every compiled
/// archive, filtered by the typed partial unless it ends in `/`.
pub fn import_candidates(
    env: &BuildEnv,
    partial: &str,
    case_insensitive: bool,
    b: &mut CandidateCollector<'_>,
) {
    for root in env.package_roots() {
        import_candidates_dir(&root, partial, case_insensitive, b);
    }
}

fn import_candidates_dir(
    root: &Path,
    partial: &str,
    case_insensitive: bool,
    b: &mut CandidateCollector<'_>,
) {
    let (start, filter) = if partial.ends_with('/') {
        (root.join(partial), false)
    } else {
        let dir = Path::new(partial).parent().unwrap_or(Path::new(""));
        (root.join(dir), true)
    };

    for entry in WalkDir::new(&start).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                if err.path() == Some(start.as_path()) {
                    panic!("reading package archive directory {}: {err}", start.display());
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("a") {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        let path = rel.strip_suffix(".a").unwrap_or(&rel);
        if filter {
            let matches = if case_insensitive {
                path.to_lowercase().starts_with(&partial.to_lowercase())
            } else {
                path.starts_with(partial)
            };
            if !matches {
                continue;
            }
        }
        b.append_import(path.to_string());
    }
}

// ---------------------------------------------------------------------
// Source importer with a process-wide parse cache
// ---------------------------------------------------------------------

struct CacheEntry {
    files: Arc<Vec<File>>,
    mtime: SystemTime,
}

/// Process-wide package parse cache: directory → parsed files + source
/// modification time. Guarded by one mutex; entries are evicted least
/// recently used past a soft cap.
#[derive(Default)]
struct PackageCache {
    entries: FxHashMap<PathBuf, CacheEntry>,
    /// LRU order, least recent first.
    order: Vec<PathBuf>,
}

const CACHE_SOFT_CAP: usize = 100;

static PACKAGE_CACHE: Lazy<Mutex<PackageCache>> = Lazy::new(|| Mutex::new(PackageCache::default()));

impl PackageCache {
    fn touch(&mut self, dir: &Path) {
        if let Some(i) = self.order.iter().position(|p| p == dir) {
            let p = self.order.remove(i);
            self.order.push(p);
        } else {
            self.order.push(dir.to_path_buf());
        }
    }

    fn evict_over_cap(&mut self) {
        while self.entries.len() > CACHE_SOFT_CAP && !self.order.is_empty() {
            let oldest = self.order.remove(0);
            self.entries.remove(&oldest);
        }
    }
}

/// Drop every cached package; exposed for the daemon's debug tooling
/// and for test isolation.
pub fn clear_package_cache() {
    let mut cache = PACKAGE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    cache.entries.clear();
    cache.order.clear();
}

/// Parse the non-test Go files of `dir`, through the cache. A changed
/// newest-mtime invalidates the entry.
fn parse_package_dir(dir: &Path) -> Option<Arc<Vec<File>>> {
    let mut sources: Vec<PathBuf> = Vec::new();
    let mut newest = SystemTime::UNIX_EPOCH;
    for entry in std::fs::read_dir(dir).ok()? {
        let entry = entry.ok()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if !name.ends_with(".go") || name.ends_with("_test.go") {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            if let Ok(modified) = meta.modified() {
                newest = newest.max(modified);
            }
        }
        sources.push(entry.path());
    }
    if sources.is_empty() {
        return None;
    }
    sources.sort();

    let mut cache = PACKAGE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    let hit = cache
        .entries
        .get(dir)
        .filter(|e| e.mtime == newest)
        .map(|e| e.files.clone());
    if let Some(files) = hit {
        cache.touch(dir);
        return Some(files);
    }

    let mut files = Vec::with_capacity(sources.len());
    for path in &sources {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        let (ast, _) = goco_parser::parse_file_at(&bytes, 0);
        files.push(ast);
    }
    let files = Arc::new(files);
    cache.entries.insert(
        dir.to_path_buf(),
        CacheEntry {
            files: files.clone(),
            mtime: newest,
        },
    );
    cache.touch(dir);
    cache.evict_over_cap();
    Some(files)
}

/// Imports packages by locating and parsing their source under the
/// build environment's source roots.
pub struct SourceImporter<'e> {
    env: &'e BuildEnv,
    depth: u8,
    /// Per-request memo; also breaks import cycles in broken code.
    memo: FxHashMap<String, Option<PkgId>>,
}

/// Transitive imports deeper than this resolve to nothing; completion
/// rarely needs more than the directly imported package's surface.
const MAX_IMPORT_DEPTH: u8 = 4;

impl<'e> SourceImporter<'e> {
    pub fn new(env: &'e BuildEnv) -> SourceImporter<'e> {
        SourceImporter {
            env,
            depth: 0,
            memo: FxHashMap::default(),
        }
    }

    fn find_package_dir(&self, path: &str) -> Option<PathBuf> {
        for src in &self.env.src_dirs {
            let dir = src.join(path);
            if dir.is_dir() {
                return Some(dir);
            }
        }
        None
    }
}

impl<'e> Importer for SourceImporter<'e> {
    fn import(&mut self, ctx: &mut TypeCtx, path: &str) -> Option<PkgId> {
        if let Some(cached) = self.memo.get(path) {
            return *cached;
        }
        if let Some(existing) = ctx.find_package(path) {
            return Some(existing);
        }
        if self.depth >= MAX_IMPORT_DEPTH {
            return None;
        }

        // Break cycles: a re-entrant import of the same path resolves
        // to nothing rather than recursing forever.
        self.memo.insert(path.to_string(), None);

        let dir = self.find_package_dir(path)?;
        let files = parse_package_dir(&dir)?;

        self.depth += 1;
        let pkg = check_package(ctx, path, &files, self);
        self.depth -= 1;

        self.memo.insert(path.to_string(), Some(pkg));
        Some(pkg)
    }
}
