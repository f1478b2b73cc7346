//! Capture-avoiding parallel substitution.
//!
//! `Subst` is a snapshot, not a pipeline: `add_type` installs a mapping
//! without applying the substitution-so-far to its own right-hand side
//! (callers pre-substitute if they need that), and `apply` reads every
//! entry against the one `Subst` value it was given — there is no notion of
//! composing two `Subst`s into a third.

use std::collections::HashMap;

use crate::ids::TVar;
use crate::ty::{view, RowEnd, Ty, TyCtx};

enum Binding {
    /// A substitution proper: `v` maps to an arbitrary type of the same
    /// kind.
    Type(Ty),
    /// A pure renaming: `v` maps to another rigid of the same kind. Kept
    /// distinct from `Type` only for callers that care (e.g. `refresh`
    /// goes through `Perm` instead, since a renaming is invertible and a
    /// general substitution is not).
    Rename(TVar),
}

/// A parallel substitution from rigid type variables to types. Only ever
/// replaces variables listed in its domain.
pub struct Subst {
    map: HashMap<TVar, Binding>,
}

impl Subst {
    pub fn empty() -> Subst {
        Subst { map: HashMap::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn domain_contains(&self, v: TVar) -> bool {
        self.map.contains_key(&v)
    }

    /// Adds `v -> v'` as a pure renaming. Panics if `v` is already bound:
    /// re-binding is treated as an invariant violation rather than silently
    /// overwritten or merged.
    pub fn rename_to_fresh(&mut self, v: TVar, v2: TVar) {
        assert!(
            !self.map.contains_key(&v),
            "Subst::rename_to_fresh: {:?} is already in the domain",
            v
        );
        self.map.insert(v, Binding::Rename(v2));
    }

    /// Adds `v -> t`. `t` is stored exactly as given: this call does *not*
    /// apply `self` to `t` first (the combinator is parallel, not
    /// sequential) — if the caller needs `t` to reflect earlier bindings,
    /// it must pre-substitute before calling. Panics if `v` is already
    /// bound, treating re-binding as an invariant violation rather than a
    /// silent overwrite or merge.
    pub fn add_type(&mut self, v: TVar, t: Ty) {
        assert!(!self.map.contains_key(&v), "Subst::add_type: {:?} is already in the domain", v);
        self.map.insert(v, Binding::Type(t));
    }

    fn lookup(&self, v: TVar) -> Option<&Ty> {
        match self.map.get(&v) {
            None => None,
            Some(Binding::Type(t)) => Some(t),
            // Renamings are resolved through `lookup_var`, not `lookup`;
            // this arm only matters to callers that do not care which kind
            // of binding they hit, so route them through an owned Ty.
            Some(Binding::Rename(_)) => None,
        }
    }

    fn lookup_var(&self, v: TVar) -> Option<TVar> {
        match self.map.get(&v) {
            Some(Binding::Rename(v2)) => Some(*v2),
            _ => None,
        }
    }

    /// Applies the substitution to `t`. Unset uvar mentions are left
    /// completely untouched (their delayed permutations already carry
    /// whatever rigid-renaming they need, and a uvar is not itself a rigid
    /// variable so it can never be in the domain); rigids in the domain are
    /// replaced, and the recursion otherwise follows the term structure.
    /// Row ends that are rigid variables are substituted and re-spliced:
    /// substituting a row-kinded rigid end for a longer row grows the
    /// simple-variable set rather than nesting.
    pub fn apply(&self, ctx: &impl TyCtx, t: &Ty) -> Ty {
        match view(ctx, t) {
            Ty::UVar(pi, u) => Ty::UVar(pi, u),
            Ty::Var(v) => {
                if let Some(t2) = self.lookup(v) {
                    t2.clone()
                } else if let Some(v2) = self.lookup_var(v) {
                    Ty::Var(v2)
                } else {
                    Ty::Var(v)
                }
            }
            Ty::Effect(vars) => {
                Ty::Effect(vars.into_iter().map(|v| self.lookup_var(v).unwrap_or(v)).collect())
            }
            Ty::EffRow(vars, end) => self.apply_row(ctx, vars, end),
            Ty::PureArrow(sch, body) => {
                crate::ty::t_pure_arrow(self.apply_scheme(ctx, &sch), self.apply(ctx, &body))
            }
            Ty::Arrow(sch, body, rho) => {
                let sch2 = self.apply_scheme(ctx, &sch);
                let body2 = self.apply(ctx, &body);
                let rho2 = self.apply(ctx, &rho);
                crate::ty::t_arrow(ctx, sch2, body2, rho2)
            }
            Ty::Handler(a, tp, itp, ieff, otp, oeff) => crate::ty::t_handler(
                self.apply(ctx, &a),
                self.apply(ctx, &tp),
                self.apply(ctx, &itp),
                self.apply(ctx, &ieff),
                self.apply(ctx, &otp),
                self.apply(ctx, &oeff),
            ),
            Ty::Label(e, tp, rho) => {
                crate::ty::t_label(self.apply(ctx, &e), self.apply(ctx, &tp), self.apply(ctx, &rho))
            }
            Ty::App(f, a) => crate::ty::t_app(ctx, self.apply(ctx, &f), self.apply(ctx, &a)),
        }
    }

    fn apply_row(
        &self,
        ctx: &impl TyCtx,
        vars: std::collections::BTreeSet<TVar>,
        end: RowEnd,
    ) -> Ty {
        let mut new_vars: std::collections::BTreeSet<TVar> =
            vars.into_iter().map(|v| self.lookup_var(v).unwrap_or(v)).collect();
        match end {
            RowEnd::Closed => Ty::EffRow(new_vars, RowEnd::Closed),
            RowEnd::UVar(pi, u) => Ty::EffRow(new_vars, RowEnd::UVar(pi, u)),
            RowEnd::App(t) => Ty::EffRow(new_vars, RowEnd::App(Box::new(self.apply(ctx, &t)))),
            RowEnd::Var(v) => {
                if let Some(t2) = self.lookup(v) {
                    // A rigid row end substituted for a whole row: splice
                    // its simple variables and end into the result rather
                    // than nesting an `App`/`Var` inside the end slot.
                    match view(ctx, t2) {
                        Ty::EffRow(more_vars, more_end) => {
                            new_vars.extend(more_vars);
                            Ty::EffRow(new_vars, more_end)
                        }
                        other => panic!("Subst::apply: row end substituted for a non-row: {:?}", other),
                    }
                } else if let Some(v2) = self.lookup_var(v) {
                    Ty::EffRow(new_vars, RowEnd::Var(v2))
                } else {
                    Ty::EffRow(new_vars, RowEnd::Var(v))
                }
            }
        }
    }

    fn apply_scheme(&self, ctx: &impl TyCtx, sch: &crate::scheme::Scheme) -> crate::scheme::Scheme {
        crate::scheme::Scheme {
            targs: sch.targs.clone(),
            named: sch
                .named
                .iter()
                .map(|np| crate::scheme::NamedParam {
                    name: np.name.clone(),
                    scheme: self.apply_scheme(ctx, &np.scheme),
                })
                .collect(),
            body: self.apply(ctx, &sch.body),
        }
    }
}

impl Default for Subst {
    fn default() -> Self { Subst::empty() }
}
