//! Candidate collection, classification, and ordering.

use serde::{Deserialize, Serialize};

use goco_checker::{type_string, ObjId, ObjKind, PkgId, TypeCtx, TypeData, TypeId};

/// Candidate class. The variant order matches the lexical order of the
/// wire strings, so the derived ordering sorts classes the same way the
/// protocol does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Class {
    #[serde(rename = "PANIC")]
    Panic,
    #[serde(rename = "const")]
    Const,
    #[serde(rename = "func")]
    Func,
    #[serde(rename = "import")]
    Import,
    #[serde(rename = "package")]
    Package,
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "var")]
    Var,
}

impl Class {
    pub fn as_str(self) -> &'static str {
        match self {
            Class::Panic => "PANIC",
            Class::Const => "const",
            Class::Func => "func",
            Class::Import => "import",
            Class::Package => "package",
            Class::Type => "type",
            Class::Var => "var",
        }
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completion candidate as it travels to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub class: Class,
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
}

impl Candidate {
    /// The synthetic candidate produced when a request handler panics.
    pub fn panic() -> Candidate {
        Candidate {
            class: Class::Panic,
            name: "PANIC".to_string(),
            typ: "PANIC".to_string(),
        }
    }

    /// The text an editor inserts on acceptance: functions get an open
    /// paren (or a whole call for nullary ones), everything else is the
    /// bare name.
    pub fn suggestion(&self) -> String {
        if self.class != Class::Func {
            return self.name.clone();
        }
        if self.typ.starts_with("func()") {
            return format!("{}()", self.name);
        }
        format!("{}(", self.name)
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.class == Class::Func {
            let tail = self.typ.strip_prefix("func").unwrap_or(&self.typ);
            write!(f, "{} {}{}", self.class, self.name, tail)
        } else {
            write!(f, "{} {} {}", self.class, self.name, self.typ)
        }
    }
}

fn classify(kind: ObjKind) -> Class {
    match kind {
        ObjKind::Const => Class::Const,
        ObjKind::Var => Class::Var,
        ObjKind::Func | ObjKind::Builtin => Class::Func,
        ObjKind::TypeName => Class::Type,
        ObjKind::PkgName => Class::Package,
    }
}

/// A class filter engaged when the typed partial literally names a
/// candidate class; matching is then by class instead of by prefix.
fn class_filter(partial: &str) -> Option<ObjKind> {
    Some(match partial {
        "const" => ObjKind::Const,
        "func" => ObjKind::Func,
        "package" => ObjKind::PkgName,
        "type" => ObjKind::TypeName,
        "var" => ObjKind::Var,
        _ => return None,
    })
}

/// Accumulates objects for one request, partitioning exact from
/// wrong-case prefix matches, then renders the winning partition.
pub struct CandidateCollector<'a> {
    ctx: &'a TypeCtx,
    local_pkg: PkgId,
    partial: String,
    filter: Option<ObjKind>,
    propose_builtins: bool,
    /// Pre-rendered candidates (import paths) that skip object filtering.
    seeded: Vec<Candidate>,
    exact: Vec<ObjId>,
    badcase: Vec<ObjId>,
}

impl<'a> CandidateCollector<'a> {
    pub fn new(
        ctx: &'a TypeCtx,
        local_pkg: PkgId,
        partial: &str,
        propose_builtins: bool,
    ) -> CandidateCollector<'a> {
        CandidateCollector {
            ctx,
            local_pkg,
            partial: partial.to_string(),
            filter: class_filter(partial),
            propose_builtins,
            seeded: Vec::new(),
            exact: Vec::new(),
            badcase: Vec::new(),
        }
    }

    pub fn append_import(&mut self, path: String) {
        self.seeded.push(Candidate {
            class: Class::Import,
            name: path,
            typ: String::new(),
        });
    }

    pub fn append_object(&mut self, obj: ObjId) {
        let o = self.ctx.obj(obj);

        // Universe-scope objects stay out of results unless builtins are
        // enabled; the `error` interface's method is the one exception.
        if !self.propose_builtins && o.pkg.is_none() && o.name != "Error" {
            return;
        }

        // Unexported members of other packages are unreachable here.
        if let Some(pkg) = o.pkg {
            if pkg != self.local_pkg && !o.is_exported() {
                return;
            }
        }

        if let Some(kind) = self.filter {
            if o.kind == kind {
                self.exact.push(obj);
            }
            return;
        }

        if o.name.starts_with(&self.partial) {
            self.exact.push(obj);
        } else if o
            .name
            .to_lowercase()
            .starts_with(&self.partial.to_lowercase())
        {
            self.badcase.push(obj);
        }
    }

    /// Exact matches win outright; the wrong-case partition only
    /// surfaces when nothing matched case-sensitively.
    pub fn into_candidates(self) -> Vec<Candidate> {
        let objs = if self.exact.is_empty() {
            &self.badcase
        } else {
            &self.exact
        };
        let mut rendered: Vec<Candidate> = objs.iter().map(|&o| self.as_candidate(o)).collect();
        let mut out = self.seeded;
        out.append(&mut rendered);
        out.sort_by(|a, b| (a.class, &a.name).cmp(&(b.class, &b.name)));
        out
    }

    fn as_candidate(&self, obj: ObjId) -> Candidate {
        let o = self.ctx.obj(obj);
        let class = classify(o.kind);
        let typ = match class {
            Class::Const | Class::Func | Class::Var => Some(o.typ),
            Class::Type => Some(self.ctx.underlying(o.typ)),
            _ => None,
        };

        let typ_str = match typ.map(|t| (t, self.ctx.type_data(t))) {
            Some((_, TypeData::Interface { .. })) => "interface".to_string(),
            Some((_, TypeData::Struct { .. })) => "struct".to_string(),
            Some((t, _)) => {
                if o.kind == ObjKind::Builtin {
                    goco_checker::builtin_signature(&o.name)
                        .unwrap_or("func(args ...Type) Type")
                        .to_string()
                } else if t == TypeId::INVALID {
                    String::new()
                } else {
                    let local = self.local_pkg;
                    let ctx = self.ctx;
                    type_string(ctx, t, &|pkg| {
                        if pkg == local {
                            None
                        } else {
                            Some(ctx.pkg(pkg).name.clone())
                        }
                    })
                }
            }
            None => String::new(),
        };

        Candidate {
            class,
            name: o.name.clone(),
            typ: typ_str,
        }
    }

    pub fn partial(&self) -> &str {
        &self.partial
    }
}
