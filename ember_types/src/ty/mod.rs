//! The type term algebra and effect-row operations.
//!
//! Types are never inspected by matching on `Ty` directly outside this
//! module (with the narrow exception of the pattern-matches in `view`/`whnf`
//! themselves); callers go through [`view`] or [`whnf`] rather than
//! destructuring a term ad hoc.

mod row;

use std::collections::BTreeSet;
use std::fmt;

use crate::ids::{TVar, UVar};
use crate::kind::{Kind, KindStore};
use crate::perm::Perm;
use crate::rigid::RigidRegistry;
use crate::scheme::Scheme;
use crate::uvar::UVarStore;

pub use row::{cons_eff, is_pure, row_view, RowEnd, RowView};

/// Read-only access to the three mutable stores a type operation needs:
/// the kind store (for kind equality checks), the uvar store (to resolve
/// `view`/`whnf` through set cells) and the rigid registry (to look up a
/// rigid's kind). Decouples `ty.rs` from any one concrete aggregate owning
/// those stores.
pub trait TyCtx {
    fn kinds(&self) -> &KindStore;
    fn uvars(&self) -> &UVarStore;
    fn rigids(&self) -> &RigidRegistry;
}

/// A [`TyCtx`] that also grants mutable access to the uvar store and the
/// kind store, for operations (`raw_set`/`filter_scope` on uvars, `set` on
/// kinds) that read a type *through* the same store they mutate. Kept as a
/// separate trait rather than folding `&mut` accessors into `TyCtx` itself:
/// pure query functions (`view`, `whnf`, `kind`, `row_view`, display) only
/// ever need `TyCtx`, and keeping them generic over the weaker bound means
/// they compose with a bare `&C` reborrowed out of a `&mut C` rather than
/// demanding exclusive access they do not use.
pub trait TyCtxMut: TyCtx {
    fn uvars_mut(&mut self) -> &mut UVarStore;
    fn kinds_mut(&mut self) -> &mut KindStore;
}

/// A type term. Inspected only through [`view`]/[`whnf`]; constructed
/// only through the `t_*` functions below, which enforce kind checks.
#[derive(Clone, PartialEq, Eq)]
pub enum Ty {
    /// A uvar mention, paired with the permutation delayed at this site.
    UVar(Perm, UVar),
    /// A rigid (skolem) variable.
    Var(TVar),
    /// A ground effect: a finite set of effect-kinded rigids.
    Effect(BTreeSet<TVar>),
    /// An effect row: a set of simple effect variables plus an end.
    EffRow(BTreeSet<TVar>, RowEnd),
    /// A total, effect-free function.
    PureArrow(Box<Scheme>, Box<Ty>),
    /// An impure function with a row of effects it may perform.
    Arrow(Box<Scheme>, Box<Ty>, Box<Ty>),
    /// A first-class handler: `(a, tp, itp, ieff, otp, oeff)`.
    Handler(Box<Ty>, Box<Ty>, Box<Ty>, Box<Ty>, Box<Ty>, Box<Ty>),
    /// A first-class delimiter/label: `(e, tp, row)`.
    Label(Box<Ty>, Box<Ty>, Box<Ty>),
    /// A neutral type application.
    App(Box<Ty>, Box<Ty>),
}

impl Ty {
    fn var(v: TVar) -> Ty { Ty::Var(v) }
}

/// The result of reducing a type to weak-head normal form. `Neutral`
/// carries the unreducible head (a rigid variable, or an unset uvar mention)
/// and its arguments in *reverse* application order.
pub enum Whnf {
    Neutral(Ty, Vec<Ty>),
    Effect(BTreeSet<TVar>),
    EffRow(BTreeSet<TVar>, RowEnd),
    PureArrow(Scheme, Ty),
    Arrow(Scheme, Ty, Ty),
    Handler(Ty, Ty, Ty, Ty, Ty, Ty),
    Label(Ty, Ty, Ty),
}

/// Peels exactly one constructor. A `TUVar(π, u)` with `u` set to `t'` has
/// the composed permutation applied to `t'` and the result viewed again;
/// this is the only recursion `view` performs, so it never returns a set
/// uvar.
pub fn view(ctx: &impl TyCtx, t: &Ty) -> Ty {
    match t {
        Ty::UVar(pi, u) => match ctx.uvars().content(*u) {
            None => Ty::UVar(pi.clone(), *u),
            Some((content, cell_pi)) => {
                let combined = pi.then(cell_pi);
                let rewritten = apply_perm(&combined, content);
                view(ctx, &rewritten)
            }
        },
        other => other.clone(),
    }
}

/// Reduces `t` to weak-head normal form: repeatedly unfolds uvars and
/// `TApp` heads until a concrete shape or an irreducible neutral is
/// reached; the result is stable under re-application.
pub fn whnf(ctx: &impl TyCtx, t: &Ty) -> Whnf {
    let mut args_reversed: Vec<Ty> = Vec::new();
    let mut cur = view(ctx, t);
    loop {
        match cur {
            Ty::App(f, a) => {
                args_reversed.push(*a);
                cur = view(ctx, &f);
            }
            Ty::Var(v) => return Whnf::Neutral(Ty::Var(v), args_reversed),
            Ty::UVar(pi, u) => return Whnf::Neutral(Ty::UVar(pi, u), args_reversed),
            Ty::Effect(e) => return Whnf::Effect(e),
            Ty::EffRow(e, end) => return Whnf::EffRow(e, end),
            Ty::PureArrow(sch, t) => return Whnf::PureArrow(*sch, *t),
            Ty::Arrow(sch, t, rho) => return Whnf::Arrow(*sch, *t, *rho),
            Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
                return Whnf::Handler(*a, *tp, *itp, *ieff, *otp, *oeff)
            }
            Ty::Label(e, tp, rho) => return Whnf::Label(*e, *tp, *rho),
        }
    }
}

/// Computes the kind of `t` on demand.
pub fn kind(ctx: &impl TyCtx, t: &Ty) -> Kind {
    match view(ctx, t) {
        Ty::UVar(_, u) => ctx.uvars().kind(u),
        Ty::Var(v) => ctx.rigids().kind(v),
        Ty::Effect(_) => Kind::Effect,
        Ty::EffRow(_, _) => Kind::EffRow,
        Ty::PureArrow(_, _) | Ty::Arrow(_, _, _) | Ty::Handler(_, _, _, _, _, _) | Ty::Label(_, _, _) => {
            Kind::Type
        }
        Ty::App(f, _) => match kind(ctx, &f) {
            Kind::Arrow(_, k2) => *k2,
            other => other,
        },
    }
}

/// Rewrites every rigid mention in `t` through `p`; uvar mentions have `p`
/// composed onto their own delayed permutation rather than being unfolded.
/// Mentions of rigids outside `p`'s domain are left unchanged.
pub fn apply_perm(p: &Perm, t: &Ty) -> Ty {
    match t {
        Ty::UVar(pi, u) => Ty::UVar(pi.then(p), *u),
        Ty::Var(v) => Ty::Var(p.apply(*v)),
        Ty::Effect(e) => Ty::Effect(e.iter().map(|&v| p.apply(v)).collect()),
        Ty::EffRow(e, end) => {
            let e2 = e.iter().map(|&v| p.apply(v)).collect();
            Ty::EffRow(e2, row::apply_perm_to_end(p, end))
        }
        Ty::PureArrow(sch, t) => {
            Ty::PureArrow(Box::new(sch.apply_perm(p)), Box::new(apply_perm(p, t)))
        }
        Ty::Arrow(sch, t, rho) => Ty::Arrow(
            Box::new(sch.apply_perm(p)),
            Box::new(apply_perm(p, t)),
            Box::new(apply_perm(p, rho)),
        ),
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => Ty::Handler(
            Box::new(apply_perm(p, a)),
            Box::new(apply_perm(p, tp)),
            Box::new(apply_perm(p, itp)),
            Box::new(apply_perm(p, ieff)),
            Box::new(apply_perm(p, otp)),
            Box::new(apply_perm(p, oeff)),
        ),
        Ty::Label(e, tp, rho) => Ty::Label(
            Box::new(apply_perm(p, e)),
            Box::new(apply_perm(p, tp)),
            Box::new(apply_perm(p, rho)),
        ),
        Ty::App(f, a) => Ty::App(Box::new(apply_perm(p, f)), Box::new(apply_perm(p, a))),
    }
}

/// Collects every rigid variable mentioned freely in `t`. Unset uvar
/// mentions are opaque (their eventual content is not yet known); set ones
/// are resolved by `view` before this function ever sees them because
/// callers always operate on `view`ed terms when computing free rigids for
/// scope purposes (see `shrink.rs`).
pub fn free_rigids(t: &Ty, out: &mut BTreeSet<TVar>) {
    match t {
        Ty::UVar(_, _) => {}
        Ty::Var(v) => {
            out.insert(*v);
        }
        Ty::Effect(e) => out.extend(e.iter().cloned()),
        Ty::EffRow(e, end) => {
            out.extend(e.iter().cloned());
            match end {
                RowEnd::Closed | RowEnd::UVar(_, _) => {}
                RowEnd::Var(v) => {
                    out.insert(*v);
                }
                RowEnd::App(t) => free_rigids(t, out),
            }
        }
        Ty::PureArrow(sch, t) => {
            sch.free_rigids(out);
            free_rigids(t, out);
        }
        Ty::Arrow(sch, t, rho) => {
            sch.free_rigids(out);
            free_rigids(t, out);
            free_rigids(rho, out);
        }
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
            for sub in [a, tp, itp, ieff, otp, oeff] {
                free_rigids(sub, out);
            }
        }
        Ty::Label(e, tp, rho) => {
            free_rigids(e, out);
            free_rigids(tp, out);
            free_rigids(rho, out);
        }
        Ty::App(f, a) => {
            free_rigids(f, out);
            free_rigids(a, out);
        }
    }
}

// --- Kind-checked constructors -------------------------------------------
//
// Each constructor panics on a kind mismatch: kind conflict is a structural,
// internal-invariant failure, not a user-facing error.

pub fn t_uvar(ctx: &impl TyCtx, u: UVar) -> Ty {
    let _ = ctx.uvars().kind(u);
    Ty::UVar(Perm::identity(), u)
}

pub fn t_var(ctx: &impl TyCtx, v: TVar) -> Ty {
    let _ = ctx.rigids().kind(v);
    Ty::var(v)
}

pub fn t_effect(ctx: &impl TyCtx, vars: BTreeSet<TVar>) -> Ty {
    for &v in &vars {
        assert_eq!(ctx.rigids().kind(v), Kind::Effect, "t_effect: {:?} is not effect-kinded", v);
    }
    Ty::Effect(vars)
}

pub fn t_closed_effrow(ctx: &impl TyCtx, vars: BTreeSet<TVar>) -> Ty {
    for &v in &vars {
        assert_eq!(ctx.rigids().kind(v), Kind::Effect, "t_closed_effrow: {:?} is not effect-kinded", v);
    }
    Ty::EffRow(vars, RowEnd::Closed)
}

pub fn t_effrow(ctx: &impl TyCtx, vars: BTreeSet<TVar>, end: RowEnd) -> Ty {
    for &v in &vars {
        assert_eq!(ctx.rigids().kind(v), Kind::Effect, "t_effrow: {:?} is not effect-kinded", v);
    }
    match &end {
        RowEnd::Closed | RowEnd::App(_) => {}
        RowEnd::UVar(_, u) => {
            assert_eq!(ctx.uvars().kind(*u), Kind::EffRow, "t_effrow: end uvar {:?} is not row-kinded", u);
        }
        RowEnd::Var(v) => {
            assert_eq!(ctx.rigids().kind(*v), Kind::EffRow, "t_effrow: end var {:?} is not row-kinded", v);
        }
    }
    Ty::EffRow(vars, end)
}

pub fn t_pure_arrow(sch: Scheme, t: Ty) -> Ty {
    Ty::PureArrow(Box::new(sch), Box::new(t))
}

pub fn t_arrow(ctx: &impl TyCtx, sch: Scheme, t: Ty, rho: Ty) -> Ty {
    assert_eq!(kind(ctx, &rho), Kind::EffRow, "t_arrow: effect argument is not row-kinded");
    Ty::Arrow(Box::new(sch), Box::new(t), Box::new(rho))
}

pub fn t_handler(a: Ty, tp: Ty, itp: Ty, ieff: Ty, otp: Ty, oeff: Ty) -> Ty {
    Ty::Handler(Box::new(a), Box::new(tp), Box::new(itp), Box::new(ieff), Box::new(otp), Box::new(oeff))
}

pub fn t_label(e: Ty, tp: Ty, rho: Ty) -> Ty {
    Ty::Label(Box::new(e), Box::new(tp), Box::new(rho))
}

/// Builds `TApp(f, a)`, asserting `kind(f)` is an arrow whose domain matches
/// `kind(a)`.
pub fn t_app(ctx: &impl TyCtx, f: Ty, a: Ty) -> Ty {
    match kind(ctx, &f) {
        Kind::Arrow(k1, k2) => {
            let ka = kind(ctx, &a);
            assert_eq!(*k1, ka, "t_app: argument kind {} does not match domain {}", ka, k1);
            let _ = k2;
        }
        other => panic!("t_app: head kind {} is not an arrow", other),
    }
    Ty::App(Box::new(f), Box::new(a))
}

/// `t_app` folded over a list of arguments, left to right.
pub fn t_apps(ctx: &impl TyCtx, f: Ty, args: impl IntoIterator<Item = Ty>) -> Ty {
    let mut result = f;
    for a in args {
        result = t_app(ctx, result, a);
    }
    result
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ty::UVar(pi, u) => {
                if pi.is_identity() {
                    write!(f, "{:?}", u)
                } else {
                    write!(f, "{:?}@{:?}", u, pi)
                }
            }
            Ty::Var(v) => write!(f, "{:?}", v),
            Ty::Effect(e) => write!(f, "{{{}}}", debug_set(e)),
            Ty::EffRow(e, end) => write!(f, "<{}|{:?}>", debug_set(e), end),
            Ty::PureArrow(sch, t) => write!(f, "({:?} -> {:?})", sch, t),
            Ty::Arrow(sch, t, rho) => write!(f, "({:?} ->{:?} {:?})", sch, rho, t),
            Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
                write!(f, "Handler({:?},{:?},{:?},{:?},{:?},{:?})", a, tp, itp, ieff, otp, oeff)
            }
            Ty::Label(e, tp, rho) => write!(f, "Label({:?},{:?},{:?})", e, tp, rho),
            Ty::App(t1, t2) => write!(f, "({:?} {:?})", t1, t2),
        }
    }
}

impl fmt::Debug for RowEnd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RowEnd::Closed => write!(f, "."),
            RowEnd::UVar(pi, u) => {
                if pi.is_identity() {
                    write!(f, "{:?}", u)
                } else {
                    write!(f, "{:?}@{:?}", u, pi)
                }
            }
            RowEnd::Var(v) => write!(f, "{:?}", v),
            RowEnd::App(t) => write!(f, "{:?}", t),
        }
    }
}

fn debug_set(e: &BTreeSet<TVar>) -> String {
    e.iter().map(|v| format!("{:?}", v)).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigid::RigidRegistry;
    use crate::scope::Scope;
    use crate::uvar::UVarStore;

    struct TestCtx {
        kinds: KindStore,
        uvars: UVarStore,
        rigids: RigidRegistry,
    }

    impl TyCtx for TestCtx {
        fn kinds(&self) -> &KindStore { &self.kinds }
        fn uvars(&self) -> &UVarStore { &self.uvars }
        fn rigids(&self) -> &RigidRegistry { &self.rigids }
    }

    fn fresh_ctx() -> TestCtx {
        TestCtx { kinds: KindStore::new(), uvars: UVarStore::new(), rigids: RigidRegistry::new() }
    }

    #[test]
    fn view_resolves_a_set_uvar_through_its_mention_permutation() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Type, 0, crate::name::TypeParamName::Anonymous);
        let u = ctx.uvars.fresh(Kind::Type, Scope::initial().add(a), 0);
        assert_eq!(view(&ctx, &Ty::UVar(Perm::identity(), u)), Ty::UVar(Perm::identity(), u));
        ctx.uvars.raw_set(&Perm::identity(), u, Ty::Var(a), &Kind::Type);
        assert_eq!(view(&ctx, &Ty::UVar(Perm::identity(), u)), Ty::Var(a));
    }

    #[test]
    fn view_is_idempotent() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Type, 0, crate::name::TypeParamName::Anonymous);
        let u = ctx.uvars.fresh(Kind::Type, Scope::initial().add(a), 0);
        ctx.uvars.raw_set(&Perm::identity(), u, Ty::Var(a), &Kind::Type);
        let t = Ty::UVar(Perm::identity(), u);
        let once = view(&ctx, &t);
        let twice = view(&ctx, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn whnf_unfolds_application_spine_in_reverse_order() {
        let mut ctx = fresh_ctx();
        let k = ctx.kinds.k_arrow(Kind::Type, ctx.kinds.k_arrow(Kind::Type, Kind::Type));
        let f = ctx.rigids.fresh(k, 0, crate::name::TypeParamName::Anonymous);
        let x = ctx.rigids.fresh(Kind::Type, 0, crate::name::TypeParamName::Anonymous);
        let y = ctx.rigids.fresh(Kind::Type, 0, crate::name::TypeParamName::Anonymous);
        let applied = t_app(&ctx, t_app(&ctx, t_var(&ctx, f), t_var(&ctx, x)), t_var(&ctx, y));
        match whnf(&ctx, &applied) {
            Whnf::Neutral(head, args) => {
                assert_eq!(head, Ty::Var(f));
                assert_eq!(args, vec![Ty::Var(y), Ty::Var(x)]);
            }
            _ => panic!("expected a neutral whnf"),
        }
    }

    #[test]
    #[should_panic]
    fn t_app_rejects_non_arrow_heads() {
        let mut ctx = fresh_ctx();
        let f = ctx.rigids.fresh(Kind::Type, 0, crate::name::TypeParamName::Anonymous);
        t_app(&ctx, t_var(&ctx, f), t_var(&ctx, f));
    }
}
