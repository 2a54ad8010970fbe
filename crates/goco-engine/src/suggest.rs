//! The suggestion entry point: context dispatch and scope walking.

use goco_checker::{eval, PkgId, ScopeId, TypeAndValue, TypeCtx, TypeData};
use goco_common::BuildEnv;

use crate::analyze::analyze_package;
use crate::collector::{Candidate, CandidateCollector};
use crate::context::{deduce_cursor_context, CursorContext};
use crate::imports::{import_candidates, SourceImporter};
use crate::member;

/// Engine configuration. The two boolean knobs correspond to behaviors
/// the protocol historically left undecided.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Log request internals (parse errors, contexts, candidates).
    pub debug: bool,
    /// Offer predeclared functions and types in scope completions.
    pub propose_builtins: bool,
    /// Match import-path completions case-insensitively.
    pub case_insensitive_imports: bool,
    /// The client's build environment.
    pub env: BuildEnv,
}

pub struct Suggester {
    config: Config,
}

impl Suggester {
    pub fn new(config: Config) -> Suggester {
        Suggester { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Produce completion candidates for the cursor, plus the byte
    /// length of the partial identifier they replace.
    ///
    /// This never reports errors: unanalyzable code produces an empty
    /// list. It may panic on filesystem failures mid-request; the
    /// transport catches that and answers with the PANIC candidate.
    pub fn suggest(&self, filename: &str, src: &[u8], cursor: isize) -> (Vec<Candidate>, usize) {
        if cursor < 0 {
            return (Vec::new(), 0);
        }
        let cursor = (cursor as usize).min(src.len());

        let deduced = deduce_cursor_context(src, cursor);
        tracing::debug!(
            target: "goco::suggest",
            context = ?deduced.context,
            expr = %deduced.expr,
            partial = %deduced.partial,
            "deduced cursor context"
        );

        let mut importer = SourceImporter::new(&self.config.env);
        let mut analysis = analyze_package(filename, src, cursor, &mut importer);
        let pkg = analysis.pkg;
        let pos = analysis.pos;

        // Work needing the arena mutably (expression evaluation) happens
        // before the collector takes its shared borrow.
        let plan = match deduced.context {
            CursorContext::Import => Plan::Imports,
            CursorContext::Select => {
                let tv = eval(&mut analysis.ctx, pkg, pos, &deduced.expr);
                if tv.is_type() || tv.is_value() {
                    Plan::Members(tv)
                } else {
                    // Not a value or type; maybe a package name.
                    let root = analysis.ctx.pkg(pkg).scope;
                    let scope = analysis.ctx.innermost(root, pos);
                    let dep = analysis
                        .ctx
                        .lookup_parent(scope, &deduced.expr, Some(pos))
                        .and_then(|obj| analysis.ctx.obj(obj).imported);
                    match dep {
                        Some(dep) => Plan::Package(dep),
                        None => return (Vec::new(), 0),
                    }
                }
            }
            CursorContext::CompositeLiteral => {
                let tv = eval(&mut analysis.ctx, pkg, pos, &deduced.expr);
                let is_struct = tv.is_type()
                    && matches!(
                        analysis.ctx.type_data(analysis.ctx.underlying(tv.typ)),
                        TypeData::Struct { .. }
                    );
                if is_struct {
                    Plan::Fields(tv.typ)
                } else {
                    Plan::Scope
                }
            }
            CursorContext::Unknown => Plan::Scope,
        };

        let ctx = &analysis.ctx;
        let mut b =
            CandidateCollector::new(ctx, pkg, &deduced.partial, self.config.propose_builtins);

        match plan {
            Plan::Imports => import_candidates(
                &self.config.env,
                &deduced.partial,
                self.config.case_insensitive_imports,
                &mut b,
            ),
            Plan::Members(tv) => {
                member::walk(ctx, &tv, &mut |obj| b.append_object(obj));
            }
            Plan::Package(dep) => {
                let dep_scope = ctx.pkg(dep).scope;
                scope_candidates(ctx, dep_scope, None, &mut b);
            }
            Plan::Fields(typ) => {
                if let TypeData::Struct { fields } = ctx.type_data(ctx.underlying(typ)) {
                    // Every field, unexported included: in-package
                    // literals may set them all. The collector still
                    // hides unexported fields of foreign types.
                    for f in fields {
                        b.append_object(f.obj);
                    }
                }
            }
            Plan::Scope => {
                let root = ctx.pkg(pkg).scope;
                let scope = ctx.innermost(root, pos);
                scope_candidates(ctx, scope, Some(pos), &mut b);
            }
        }

        let res = b.into_candidates();
        if res.is_empty() {
            return (Vec::new(), 0);
        }
        let num = deduced.partial.len();
        (res, num)
    }
}

enum Plan {
    Imports,
    Members(TypeAndValue),
    Package(PkgId),
    Fields(goco_checker::TypeId),
    Scope,
}

/// Walk a scope and its parents collecting visible objects.
///
/// In position-bearing scopes, objects declared after the cursor are
/// skipped without shadowing, so a same-named package-scope object can
/// still surface. Names are visited in sorted order; candidate output
/// must not depend on map iteration.
fn scope_candidates(
    ctx: &TypeCtx,
    scope: ScopeId,
    pos: Option<u32>,
    b: &mut CandidateCollector<'_>,
) {
    let mut seen: Vec<String> = Vec::new();
    let mut cur = Some(scope);
    while let Some(s) = cur {
        let data = ctx.scope(s);
        let positional = !data.extent.is_dummy();
        let mut names: Vec<&String> = data.names.keys().collect();
        names.sort();
        for name in names {
            if seen.iter().any(|n| n == name) {
                continue;
            }
            let obj = data.names[name];
            if positional {
                if let Some(p) = pos {
                    let decl = ctx.obj(obj).pos;
                    if !decl.is_dummy() && decl.start > p {
                        continue;
                    }
                }
            }
            seen.push(name.clone());
            b.append_object(obj);
        }
        cur = data.parent;
    }
}
