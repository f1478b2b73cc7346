//! Property tests for the unification engine's core invariants: substitution
//! parallelism, row equality up to permutation, scope monotonicity under
//! `filter_scope`, and scope-shrink correctness.
//!
//! Terms here are built directly through the crate's constructors (no
//! surface parser is in scope), and kept small and closed so `proptest`'s
//! shrinker stays useful.

use std::collections::BTreeSet;

use ember_types::kind::{Kind, KindStore};
use ember_types::name::TypeParamName;
use ember_types::rigid::RigidRegistry;
use ember_types::scope::Scope;
use ember_types::shrink;
use ember_types::subst::Subst;
use ember_types::ty::{free_rigids, is_pure, view, RowEnd, Ty, TyCtx, TyCtxMut};
use ember_types::uvar::UVarStore;
use proptest::prelude::*;

struct TestCtx {
    kinds: KindStore,
    uvars: UVarStore,
    rigids: RigidRegistry,
}

impl TestCtx {
    fn new() -> TestCtx {
        TestCtx { kinds: KindStore::new(), uvars: UVarStore::new(), rigids: RigidRegistry::new() }
    }
}

impl TyCtx for TestCtx {
    fn kinds(&self) -> &KindStore { &self.kinds }
    fn uvars(&self) -> &UVarStore { &self.uvars }
    fn rigids(&self) -> &RigidRegistry { &self.rigids }
}

impl TyCtxMut for TestCtx {
    fn uvars_mut(&mut self) -> &mut UVarStore { &mut self.uvars }
    fn kinds_mut(&mut self) -> &mut KindStore { &mut self.kinds }
}

proptest! {
    /// Applying a substitution with two disjoint renamings to a rigid
    /// variable gives the same answer regardless of which entry is added
    /// first, since `add_type` never pre-substitutes its own right-hand
    /// side onto an existing binding.
    #[test]
    fn p1_substitution_is_parallel_not_sequential(_seed in 0u32..1000) {
        let mut ctx = TestCtx::new();
        let a = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Anonymous);
        let b = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Anonymous);
        let c = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Anonymous);

        let mut s1 = Subst::empty();
        s1.add_type(a, Ty::Var(b));
        s1.add_type(b, Ty::Var(c));

        let mut s2 = Subst::empty();
        s2.add_type(b, Ty::Var(c));
        s2.add_type(a, Ty::Var(b));

        prop_assert_eq!(s1.apply(&ctx, &Ty::Var(a)), s2.apply(&ctx, &Ty::Var(a)));
        prop_assert_eq!(s1.apply(&ctx, &Ty::Var(b)), s2.apply(&ctx, &Ty::Var(b)));
    }

    /// Two closed effect rows built from the same finite set of effect
    /// rigids, consed in opposite orders, view as equal.
    #[test]
    fn p4_rows_equal_regardless_of_construction_order(n in 1usize..6) {
        let mut ctx = TestCtx::new();
        let vars: Vec<_> = (0..n)
            .map(|_| ctx.rigids.fresh(Kind::Effect, 0, TypeParamName::Anonymous))
            .collect();

        let forward: BTreeSet<_> = vars.iter().cloned().collect();
        let backward: BTreeSet<_> = vars.iter().rev().cloned().collect();
        let row1 = Ty::EffRow(forward, RowEnd::Closed);
        let row2 = Ty::EffRow(backward, RowEnd::Closed);

        prop_assert_eq!(view(&ctx, &row1), view(&ctx, &row2));
        prop_assert_eq!(is_pure(&ctx, &row1), is_pure(&ctx, &row2));
    }

    /// `filter_scope_pred` never grows a scope, and `incr_level` is
    /// monotone along a chain of extensions.
    #[test]
    fn p5_filter_scope_never_grows_and_level_is_monotone(keep in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut registry = RigidRegistry::new();
        let vars: Vec<_> = keep
            .iter()
            .map(|_| registry.fresh(Kind::Type, 0, TypeParamName::Anonymous))
            .collect();
        let mut scope = Scope::initial();
        for &v in &vars {
            scope = scope.add(v);
        }
        let mut store = UVarStore::new();
        let u = store.fresh(Kind::Type, scope.clone(), 0);
        let before = store.scope(u).len();

        let keep_set: BTreeSet<_> = vars.iter().zip(keep.iter()).filter(|(_, &k)| k).map(|(&v, _)| v).collect();
        store.filter_scope_pred(u, |v| keep_set.contains(&v));
        let after = store.scope(u).len();
        prop_assert!(after <= before);

        let s0 = Scope::initial();
        let s1 = s0.incr_level();
        let s2 = s1.incr_level();
        prop_assert!(s0.level() <= s1.level());
        prop_assert!(s1.level() <= s2.level());
    }

    /// After `try_shrink_scope(S, t) = Ok`, every rigid free in `t` is in
    /// `S`; on `Err(v)`, `v` is free in `t` and not in `S`.
    #[test]
    fn p9_shrink_correctness(in_scope in any::<bool>()) {
        let mut ctx = TestCtx::new();
        let a = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Named("a".into()));
        let scope = if in_scope { Scope::initial().add(a) } else { Scope::initial() };

        let result = shrink::try_shrink_scope(&mut ctx, &scope, &Ty::Var(a));
        match result {
            Ok(()) => {
                let mut free = BTreeSet::new();
                free_rigids(&Ty::Var(a), &mut free);
                prop_assert!(free.iter().all(|&v| scope.mem(v)));
            }
            Err(v) => {
                prop_assert_eq!(v, a);
                prop_assert!(!scope.mem(v));
            }
        }
    }
}
