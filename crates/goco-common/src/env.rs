//! The build-environment descriptor.
//!
//! Editors and the daemon can run with different environments; the client
//! packs its view of the Go build configuration into every request so the
//! daemon resolves packages the same way the editor's toolchain would.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Build configuration mirrored from the client's Go environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
    /// Target operating system (`GOOS`).
    pub goos: String,
    /// Target architecture (`GOARCH`).
    pub goarch: String,
    /// Compiler identifier, normally `gc`.
    pub compiler: String,
    /// Source root directories: `$GOROOT/src` plus each `$GOPATH/src`.
    pub src_dirs: Vec<PathBuf>,
    /// Active build tags.
    pub build_tags: Vec<String>,
    /// Whether cgo is enabled.
    pub cgo_enabled: bool,
    /// Installation suffix appended to the package directory name.
    pub install_suffix: String,
    /// Release tags (e.g. `go1.1` .. `go1.12`).
    pub release_tags: Vec<String>,
}

impl Default for BuildEnv {
    fn default() -> Self {
        let goos = env_or("GOOS", default_goos());
        let goarch = env_or("GOARCH", default_goarch());
        let mut src_dirs = Vec::new();
        if let Ok(goroot) = std::env::var("GOROOT") {
            src_dirs.push(Path::new(&goroot).join("src"));
        }
        if let Ok(gopath) = std::env::var("GOPATH") {
            for p in std::env::split_paths(&gopath) {
                src_dirs.push(p.join("src"));
            }
        }
        BuildEnv {
            goos,
            goarch,
            compiler: "gc".to_string(),
            src_dirs,
            build_tags: Vec::new(),
            cgo_enabled: true,
            install_suffix: String::new(),
            release_tags: Vec::new(),
        }
    }
}

impl BuildEnv {
    /// Directories holding compiled package archives: for each source root
    /// `<dir>/src`, the sibling `<dir>/pkg/<goos>_<goarch><suffix>` tree.
    pub fn package_roots(&self) -> Vec<PathBuf> {
        let mut leaf = format!("{}_{}", self.goos, self.goarch);
        if !self.install_suffix.is_empty() {
            leaf.push('_');
            leaf.push_str(&self.install_suffix);
        }
        self.src_dirs
            .iter()
            .filter_map(|src| src.parent().map(|base| base.join("pkg").join(&leaf)))
            .collect()
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn default_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => match other {
            "linux" | "windows" | "freebsd" | "netbsd" | "openbsd" | "solaris" => other,
            _ => "linux",
        },
    }
}

fn default_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "arm" => "arm",
        _ => "amd64",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_roots_derived_from_src_dirs() {
        let env = BuildEnv {
            goos: "linux".into(),
            goarch: "amd64".into(),
            compiler: "gc".into(),
            src_dirs: vec![PathBuf::from("/goroot/src"), PathBuf::from("/home/u/go/src")],
            build_tags: vec![],
            cgo_enabled: true,
            install_suffix: String::new(),
            release_tags: vec![],
        };
        assert_eq!(
            env.package_roots(),
            vec![
                PathBuf::from("/goroot/pkg/linux_amd64"),
                PathBuf::from("/home/u/go/pkg/linux_amd64"),
            ]
        );
    }

    #[test]
    fn install_suffix_extends_leaf() {
        let env = BuildEnv {
            install_suffix: "race".into(),
            src_dirs: vec![PathBuf::from("/g/src")],
            ..BuildEnv::default()
        };
        let roots = env.package_roots();
        let leaf = roots[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(leaf.ends_with("_race"));
    }
}
