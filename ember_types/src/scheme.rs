//! Type schemes: higher-rank polymorphism via named, possibly-dependent
//! implicit/method parameters.

use std::collections::BTreeSet;
use std::fmt;

use crate::ids::TVar;
use crate::kind::Kind;
use crate::name::{TypeParamName, ValueParamName};
use crate::perm::Perm;
use crate::rigid::RigidRegistry;
use crate::ty::{apply_perm, free_rigids, Ty};

/// A named value parameter with its own scheme, enabling a later parameter
/// in the same binder list to be polymorphic in an earlier one's type.
#[derive(Clone, PartialEq, Eq)]
pub struct NamedParam {
    pub name: ValueParamName,
    pub scheme: Scheme,
}

/// `(targs, named, body)`: universally quantified type variables, named
/// value parameters (each itself polymorphic), and a monomorphic result
/// type. Monomorphic iff `targs` and `named` are both empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Scheme {
    pub targs: Vec<(TVar, TypeParamName)>,
    pub named: Vec<NamedParam>,
    pub body: Ty,
}

impl Scheme {
    pub fn of_type(t: Ty) -> Scheme {
        Scheme { targs: Vec::new(), named: Vec::new(), body: t }
    }

    pub fn is_monomorphic(&self) -> bool {
        self.targs.is_empty() && self.named.is_empty()
    }

    pub fn apply_perm(&self, p: &Perm) -> Scheme {
        Scheme {
            targs: self.targs.iter().map(|&(v, ref n)| (p.apply(v), n.clone())).collect(),
            named: self
                .named
                .iter()
                .map(|np| NamedParam { name: np.name.clone(), scheme: np.scheme.apply_perm(p) })
                .collect(),
            body: apply_perm(p, &self.body),
        }
    }

    pub fn free_rigids(&self, out: &mut BTreeSet<TVar>) {
        let mut bound = BTreeSet::new();
        for &(v, _) in &self.targs {
            bound.insert(v);
        }
        let mut local = BTreeSet::new();
        for np in &self.named {
            np.scheme.free_rigids(&mut local);
        }
        free_rigids(&self.body, &mut local);
        out.extend(local.difference(&bound));
    }

    /// Alpha-renames every bound target variable to a fresh rigid allocated
    /// from `registry` at `level`, substituting the renaming through the
    /// scheme's named parameters and body. The only safe way to instantiate
    /// a scheme: the freshly allocated variables are pairwise distinct from
    /// any previously observed scheme's.
    pub fn refresh(&self, registry: &mut RigidRegistry, level: u32) -> Scheme {
        let mut p = Perm::identity();
        let mut new_targs = Vec::with_capacity(self.targs.len());
        for &(v, ref name) in &self.targs {
            let kind = registry.kind(v);
            let fresh = registry.fresh(kind, level, name.clone());
            p = p.then(&Perm::transposition(v, fresh));
            new_targs.push((fresh, name.clone()));
        }
        Scheme {
            targs: new_targs,
            named: self.named.iter().map(|np| NamedParam { name: np.name.clone(), scheme: np.scheme.apply_perm(&p) }).collect(),
            body: apply_perm(&p, &self.body),
        }
    }

    /// Every uvar mentioned anywhere in the scheme (body and every nested
    /// named parameter scheme), without duplicates.
    pub fn collect_uvars(&self, ctx: &impl crate::ty::TyCtx, out: &mut BTreeSet<crate::ids::UVar>) {
        collect_uvars_ty(ctx, &self.body, out);
        for np in &self.named {
            np.scheme.collect_uvars(ctx, out);
        }
    }

    pub fn uvars(&self, ctx: &impl crate::ty::TyCtx) -> BTreeSet<crate::ids::UVar> {
        let mut out = BTreeSet::new();
        self.collect_uvars(ctx, &mut out);
        out
    }
}

fn collect_uvars_ty(ctx: &impl crate::ty::TyCtx, t: &Ty, out: &mut BTreeSet<crate::ids::UVar>) {
    use crate::ty::{view, RowEnd};
    match view(ctx, t) {
        Ty::UVar(_, u) => {
            out.insert(u);
        }
        Ty::Var(_) => {}
        Ty::Effect(_) => {}
        Ty::EffRow(_, end) => match end {
            RowEnd::UVar(_, u) => {
                out.insert(u);
            }
            RowEnd::App(t) => collect_uvars_ty(ctx, &t, out),
            RowEnd::Closed | RowEnd::Var(_) => {}
        },
        Ty::PureArrow(sch, t) => {
            sch.collect_uvars(ctx, out);
            collect_uvars_ty(ctx, &t, out);
        }
        Ty::Arrow(sch, t, rho) => {
            sch.collect_uvars(ctx, out);
            collect_uvars_ty(ctx, &t, out);
            collect_uvars_ty(ctx, &rho, out);
        }
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
            for sub in [a, tp, itp, ieff, otp, oeff] {
                collect_uvars_ty(ctx, &sub, out);
            }
        }
        Ty::Label(e, tp, rho) => {
            collect_uvars_ty(ctx, &e, out);
            collect_uvars_ty(ctx, &tp, out);
            collect_uvars_ty(ctx, &rho, out);
        }
        Ty::App(f, a) => {
            collect_uvars_ty(ctx, &f, out);
            collect_uvars_ty(ctx, &a, out);
        }
    }
}

/// A constructor declaration: name, existential type args, named
/// parameters, and the regular parameter schemes.
#[derive(Clone)]
pub struct ConstructorDecl {
    pub name: String,
    pub existentials: Vec<(TVar, TypeParamName)>,
    pub named: Vec<NamedParam>,
    pub params: Vec<Scheme>,
}

/// Returns the 0-based index of the first constructor named `name`.
pub fn find_index(ctors: &[ConstructorDecl], name: &str) -> Option<usize> {
    ctors.iter().position(|c| c.name == name)
}

/// Polarity of a type position, used by the strict-positivity walk and by
/// `open_down`/`open_up`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn flip(self) -> Polarity {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Holds iff every rigid mentioned in non-strictly-positive position of any
/// parameter scheme of `ctor`, and every uvar's scope reachable from those
/// parameters, lies within `nonrec_scope`. Monotone in the scope: widening
/// `nonrec_scope` can only turn a failing check into a passing one.
pub fn strictly_positive(
    ctx: &impl crate::ty::TyCtx,
    nonrec_scope: &crate::scope::Scope,
    ctor: &ConstructorDecl,
) -> bool {
    for np in &ctor.named {
        if !scheme_strictly_positive(ctx, nonrec_scope, &np.scheme, Polarity::Positive) {
            return false;
        }
    }
    for param in &ctor.params {
        if !scheme_strictly_positive(ctx, nonrec_scope, param, Polarity::Positive) {
            return false;
        }
    }
    true
}

fn scheme_strictly_positive(
    ctx: &impl crate::ty::TyCtx,
    nonrec_scope: &crate::scope::Scope,
    sch: &Scheme,
    polarity: Polarity,
) -> bool {
    for np in &sch.named {
        if !scheme_strictly_positive(ctx, nonrec_scope, &np.scheme, polarity.flip()) {
            return false;
        }
    }
    ty_strictly_positive(ctx, nonrec_scope, &sch.body, polarity)
}

fn ty_strictly_positive(
    ctx: &impl crate::ty::TyCtx,
    nonrec_scope: &crate::scope::Scope,
    t: &Ty,
    polarity: Polarity,
) -> bool {
    use crate::ty::{view, RowEnd};
    match view(ctx, t) {
        Ty::Var(v) => polarity == Polarity::Positive || nonrec_scope.mem(v),
        Ty::UVar(_, u) => ctx.uvars().scope(u).is_subset_of(nonrec_scope),
        Ty::Effect(vars) => vars.iter().all(|&v| polarity == Polarity::Positive || nonrec_scope.mem(v)),
        Ty::EffRow(vars, end) => {
            let vars_ok = vars.iter().all(|&v| polarity == Polarity::Positive || nonrec_scope.mem(v));
            let end_ok = match end {
                RowEnd::Closed => true,
                RowEnd::UVar(_, u) => ctx.uvars().scope(u).is_subset_of(nonrec_scope),
                RowEnd::Var(v) => polarity == Polarity::Positive || nonrec_scope.mem(v),
                RowEnd::App(t) => ty_strictly_positive(ctx, nonrec_scope, &t, polarity),
            };
            vars_ok && end_ok
        }
        Ty::PureArrow(sch, t) => {
            scheme_strictly_positive(ctx, nonrec_scope, &sch, polarity.flip())
                && ty_strictly_positive(ctx, nonrec_scope, &t, polarity)
        }
        Ty::Arrow(sch, t, rho) => {
            scheme_strictly_positive(ctx, nonrec_scope, &sch, polarity.flip())
                && ty_strictly_positive(ctx, nonrec_scope, &t, polarity)
                && ty_strictly_positive(ctx, nonrec_scope, &rho, polarity)
        }
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
            [a, tp, itp, ieff, otp, oeff].iter().all(|sub| ty_strictly_positive(ctx, nonrec_scope, sub, polarity))
        }
        Ty::Label(e, tp, rho) => {
            ty_strictly_positive(ctx, nonrec_scope, &e, polarity)
                && ty_strictly_positive(ctx, nonrec_scope, &tp, polarity)
                && ty_strictly_positive(ctx, nonrec_scope, &rho, polarity)
        }
        Ty::App(f, a) => {
            ty_strictly_positive(ctx, nonrec_scope, &f, polarity)
                && ty_strictly_positive(ctx, nonrec_scope, &a, polarity)
        }
    }
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_monomorphic() {
            return write!(f, "{:?}", self.body);
        }
        write!(f, "forall ")?;
        for (v, n) in &self.targs {
            write!(f, "{:?}:{:?} ", v, n)?;
        }
        for np in &self.named {
            write!(f, "{{{:?}: {:?}}} ", np.name, np.scheme)?;
        }
        write!(f, ". {:?}", self.body)
    }
}
