//! Effect-row operations.
//!
//! Ordering of the simple effect variables in a row carries no meaning: two
//! rows with the same set and the same end are the same row. This is
//! why the simple portion is a `BTreeSet<TVar>` rather than a `Vec` —
//! consing and comparison are then set operations by construction, and
//! `RCons` below exposes one element and hands back the rest as a row in
//! its own right rather than as an index into a sequence.

use std::collections::BTreeSet;

use crate::ids::TVar;
use crate::perm::Perm;
use crate::ty::{apply_perm, view, Ty, TyCtx};

/// The end of an effect row: what the row is attached to beyond its finite
/// set of simple effect variables.
#[derive(Clone, PartialEq, Eq)]
pub enum RowEnd {
    /// A row that admits no further effects.
    Closed,
    /// An open row awaiting unification, with the mention's delayed
    /// permutation.
    UVar(Perm, crate::ids::UVar),
    /// A rigid row-kinded variable (e.g. an effect-polymorphic parameter).
    Var(TVar),
    /// A neutral application that reduces (in `whnf`) to a row.
    App(Box<Ty>),
}

/// The result of peeling one layer off an effect row (distinct from the
/// generic [`crate::ty::view`], which only resolves uvar mentions at the
/// top of a `Ty`; `row_view` additionally exposes row structure).
pub enum RowView {
    /// The empty, closed row.
    Pure,
    /// An unresolved row uvar.
    UVar(Perm, crate::ids::UVar),
    /// A rigid row variable end with no simple effects left to expose.
    Var(TVar),
    /// A neutral application end with no simple effects left to expose.
    App(Ty, Ty),
    /// One simple effect variable exposed; `tail` is the rest of the row.
    Cons(TVar, Ty),
}

/// Peels one simple effect variable off `t` (which must be an `EffRow`),
/// or exposes the row's end if none remain.
pub fn row_view(ctx: &impl TyCtx, t: &Ty) -> RowView {
    match view(ctx, t) {
        Ty::EffRow(mut set, end) => {
            if let Some(&v) = set.iter().next() {
                set.remove(&v);
                RowView::Cons(v, Ty::EffRow(set, end))
            } else {
                match end {
                    RowEnd::Closed => RowView::Pure,
                    RowEnd::UVar(pi, u) => RowView::UVar(pi, u),
                    RowEnd::Var(v) => RowView::Var(v),
                    RowEnd::App(t) => match *t {
                        Ty::App(f, a) => RowView::App(*f, *a),
                        other => panic!("row_view: malformed App end {:?}", other),
                    },
                }
            }
        }
        other => panic!("row_view: not an effect row: {:?}", other),
    }
}

/// True iff `t` views as the closed empty row.
pub fn is_pure(ctx: &impl TyCtx, t: &Ty) -> bool {
    matches!(view(ctx, t), Ty::EffRow(set, RowEnd::Closed) if set.is_empty())
}

/// The closed empty row.
pub fn pure() -> Ty {
    Ty::EffRow(BTreeSet::new(), RowEnd::Closed)
}

/// The closed row containing only the `IO` ground effect rigid.
pub fn io(io_var: TVar) -> Ty {
    let mut set = BTreeSet::new();
    set.insert(io_var);
    Ty::EffRow(set, RowEnd::Closed)
}

/// Splatters the rigids of a ground effect into a row. Idempotent: a rigid
/// already present in the row's simple set is not added twice.
pub fn cons_eff(ctx: &impl TyCtx, e: &Ty, rho: &Ty) -> Ty {
    let vars = match view(ctx, e) {
        Ty::Effect(vars) => vars,
        other => panic!("cons_eff: not a ground effect: {:?}", other),
    };
    match view(ctx, rho) {
        Ty::EffRow(mut set, end) => {
            log::trace!("cons_eff: splattering {:?} into row", vars);
            set.extend(vars);
            Ty::EffRow(set, end)
        }
        other => panic!("cons_eff: not an effect row: {:?}", other),
    }
}

/// Rewrites every rigid mention in a row end through `p`; exposed for
/// `subst.rs` and `apply_perm` in the parent module, which already handles
/// the `App` case by recursing through `apply_perm` directly.
pub fn apply_perm_to_end(p: &Perm, end: &RowEnd) -> RowEnd {
    match end {
        RowEnd::Closed => RowEnd::Closed,
        RowEnd::UVar(pi, u) => RowEnd::UVar(pi.then(p), *u),
        RowEnd::Var(v) => RowEnd::Var(p.apply(*v)),
        RowEnd::App(t) => RowEnd::App(Box::new(apply_perm(p, t))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Kind, KindStore};
    use crate::name::TypeParamName;
    use crate::rigid::RigidRegistry;
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
    fn rows_are_equal_regardless_of_cons_order() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Effect, 0, TypeParamName::Anonymous);
        let b = ctx.rigids.fresh(Kind::Effect, 0, TypeParamName::Anonymous);
        let row1 = {
            let mut set = BTreeSet::new();
            set.insert(a);
            set.insert(b);
            Ty::EffRow(set, RowEnd::Closed)
        };
        let row2 = {
            let mut set = BTreeSet::new();
            set.insert(b);
            set.insert(a);
            Ty::EffRow(set, RowEnd::Closed)
        };
        assert_eq!(view(&ctx, &row1), view(&ctx, &row2));
        let _ = &mut ctx;
    }

    #[test]
    fn cons_eff_is_idempotent() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Effect, 0, TypeParamName::Anonymous);
        let mut set = BTreeSet::new();
        set.insert(a);
        let e = Ty::Effect(set);
        let rho = pure();
        let once = cons_eff(&ctx, &e, &rho);
        let twice = cons_eff(&ctx, &e, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn is_pure_holds_only_for_the_closed_empty_row() {
        let ctx = fresh_ctx();
        assert!(is_pure(&ctx, &pure()));
    }
}
