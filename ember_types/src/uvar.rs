//! The unification-variable store: an arena of cells addressed by a stable
//! index.
//!
//! A uvar cell starts life unset, with a scope and level fixed at creation.
//! It may be written exactly once (`raw_set`): after that it carries both
//! the content it was set to and the permutation that was in force at the
//! mention site doing the setting, composed onto whatever permutation the
//! cell already carried (always identity, for a cell that was unset). The
//! cell's scope may still narrow afterward via `filter_scope`, and the cell
//! may be promoted to a rigid via `fix` at a generalization boundary.

use ember_env::IdSupply;

use crate::ids::{TVar, UVar};
use crate::kind::Kind;
use crate::perm::Perm;
use crate::rigid::RigidRegistry;
use crate::scheme::Scheme;
use crate::scope::Scope;
use crate::ty::{RowEnd, Ty};

#[derive(Clone)]
enum UVarState {
    Unset,
    Set(Ty),
}

struct UVarCell {
    kind: Kind,
    scope: Scope,
    level: u32,
    state: UVarState,
    /// The permutation accumulated at this cell by `raw_set`; composed onto
    /// every mention-site permutation when the cell's content is read.
    perm: Perm,
}

/// The arena of unification-variable cells: an index into `cells` is the
/// uvar's stable identity for the lifetime of the session.
pub struct UVarStore {
    cells: Vec<UVarCell>,
    ids: IdSupply,
}

impl UVarStore {
    pub fn new() -> UVarStore {
        UVarStore { cells: Vec::new(), ids: IdSupply::new() }
    }

    pub fn fresh(&mut self, kind: Kind, scope: Scope, level: u32) -> UVar {
        let id = self.ids.next();
        self.cells.push(UVarCell { kind, scope, level, state: UVarState::Unset, perm: Perm::identity() });
        UVar(id)
    }

    fn cell(&self, u: UVar) -> &UVarCell {
        &self.cells[u.to_usize()]
    }

    pub fn kind(&self, u: UVar) -> Kind {
        self.cell(u).kind.clone()
    }

    pub fn scope(&self, u: UVar) -> Scope {
        self.cell(u).scope.clone()
    }

    pub fn level(&self, u: UVar) -> u32 {
        self.cell(u).level
    }

    pub fn is_set(&self, u: UVar) -> bool {
        matches!(self.cell(u).state, UVarState::Set(_))
    }

    /// The raw content of a set uvar together with the permutation
    /// accumulated at the cell, if set. `view` (ty.rs) is responsible for
    /// composing this with the mention-site permutation and recursing.
    pub fn content(&self, u: UVar) -> Option<(&Ty, &Perm)> {
        match &self.cell(u).state {
            UVarState::Unset => None,
            UVarState::Set(t) => Some((t, &self.cell(u).perm)),
        }
    }

    /// Links an unset `u` to `t`, as observed through the mention-site
    /// permutation `pi`. `kind_of_t` must equal `kind(u)` (an internal
    /// invariant, checked by assertion). Panics if `t` mentions `u` itself,
    /// through any nesting — the occurs check, without which this store
    /// could be made to hold a cyclic type. Returns the scope `t`'s free
    /// rigids must lie within (the cell's own scope); the caller is
    /// responsible for checking/enforcing that with `try_shrink_scope`
    /// before or immediately after calling this.
    pub fn raw_set(&mut self, pi: &Perm, u: UVar, t: Ty, kind_of_t: &Kind) -> Scope {
        {
            let cell = &self.cells[u.to_usize()];
            assert!(matches!(cell.state, UVarState::Unset), "UVarStore::raw_set on already-set {:?}", u);
            assert_eq!(&cell.kind, kind_of_t, "UVarStore::raw_set kind mismatch for {:?}", u);
        }
        assert!(!uvar_occurs_in_ty(self, &t, u), "UVarStore::raw_set: occurs check failed, {:?} occurs in its own content", u);
        log::debug!("raw_set {:?} := {:?}", u, t);
        let cell = &mut self.cells[u.to_usize()];
        cell.perm = cell.perm.then(pi);
        cell.state = UVarState::Set(t);
        cell.scope.clone()
    }

    /// Shrinks `scope(u)` to the rigids `v` with `level(v) <= target_level`
    /// (when `target_level` is given) or `pred(v)`. Never grows the scope.
    /// `target_level: None` means the level shortcut is skipped entirely
    /// and only `pred` governs — the shape `try_shrink_scope` wants when it
    /// narrows a uvar's scope to its intersection with another scope.
    /// `target_level: Some(l)` is the generalization-boundary shape, which
    /// automatically retains every rigid older than `l` regardless of
    /// `pred`. The caller must already have established that
    /// no eliminated rigid actually occurs in `u`'s content; this method
    /// does not itself re-check occurrence.
    pub fn filter_scope<F: Fn(TVar) -> bool>(
        &mut self,
        u: UVar,
        registry: &RigidRegistry,
        target_level: Option<u32>,
        pred: F,
    ) {
        let cell = &mut self.cells[u.to_usize()];
        cell.scope = cell
            .scope
            .filter(|v| target_level.map_or(false, |l| registry.level(v) <= l) || pred(v));
    }

    /// Narrows `scope(u)` to the rigids satisfying `pred`, with no level
    /// shortcut (`filter_scope` with `target_level: None`, spelled out
    /// separately so callers that only ever want the predicate form — the
    /// scope-shrinking walk — don't need a `RigidRegistry` in hand just to
    /// satisfy `filter_scope`'s signature).
    pub fn filter_scope_pred<F: Fn(TVar) -> bool>(&mut self, u: UVar, pred: F) {
        let cell = &mut self.cells[u.to_usize()];
        cell.scope = cell.scope.filter(pred);
    }

    /// Promotes an unset uvar to a fresh rigid of the same kind, at the
    /// cell's own level; reading the uvar thereafter should go through the
    /// new rigid (callers are expected to have a follow-up indirection, not
    /// modeled here, that treats a `fix`ed uvar as that rigid — see
    /// `Ty::view`).
    pub fn fix(&mut self, u: UVar, registry: &mut RigidRegistry, name: crate::name::TypeParamName) -> TVar {
        let (kind, level) = {
            let cell = self.cell(u);
            assert!(matches!(cell.state, UVarState::Unset), "fix on already-set {:?}", u);
            (cell.kind.clone(), cell.level)
        };
        let v = registry.fresh(kind.clone(), level, name);
        self.cells[u.to_usize()].state = UVarState::Set(Ty::Var(v));
        log::debug!("fix {:?} -> {:?}", u, v);
        v
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for UVarStore {
    fn default() -> Self { UVarStore::new() }
}

/// The occurs check for `raw_set`: does `t` mention `target`, through any
/// nesting, including inside the already-set content of some other uvar
/// reachable from `t`? Resolves uvar mentions directly against `store`
/// (mirroring `Ty::view`'s own resolution) rather than through a `TyCtx`,
/// since this check only ever needs the one store being mutated.
fn uvar_occurs_in_ty(store: &UVarStore, t: &Ty, target: UVar) -> bool {
    match t {
        Ty::UVar(_, u) => {
            if *u == target {
                return true;
            }
            match store.content(*u) {
                Some((content, _)) => uvar_occurs_in_ty(store, content, target),
                None => false,
            }
        }
        Ty::Var(_) => false,
        Ty::Effect(_) => false,
        Ty::EffRow(_, end) => match end {
            RowEnd::UVar(_, u) => {
                if *u == target {
                    true
                } else {
                    match store.content(*u) {
                        Some((content, _)) => uvar_occurs_in_ty(store, content, target),
                        None => false,
                    }
                }
            }
            RowEnd::Closed | RowEnd::Var(_) => false,
            RowEnd::App(t) => uvar_occurs_in_ty(store, t, target),
        },
        Ty::PureArrow(sch, t) => uvar_occurs_in_scheme(store, sch, target) || uvar_occurs_in_ty(store, t, target),
        Ty::Arrow(sch, t, rho) => {
            uvar_occurs_in_scheme(store, sch, target)
                || uvar_occurs_in_ty(store, t, target)
                || uvar_occurs_in_ty(store, rho, target)
        }
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
            [a, tp, itp, ieff, otp, oeff].iter().any(|sub| uvar_occurs_in_ty(store, sub, target))
        }
        Ty::Label(e, tp, rho) => {
            uvar_occurs_in_ty(store, e, target)
                || uvar_occurs_in_ty(store, tp, target)
                || uvar_occurs_in_ty(store, rho, target)
        }
        Ty::App(f, a) => uvar_occurs_in_ty(store, f, target) || uvar_occurs_in_ty(store, a, target),
    }
}

fn uvar_occurs_in_scheme(store: &UVarStore, sch: &Scheme, target: UVar) -> bool {
    if uvar_occurs_in_ty(store, &sch.body, target) {
        return true;
    }
    sch.named.iter().any(|np| uvar_occurs_in_scheme(store, &np.scheme, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::TypeParamName;

    #[test]
    fn fresh_uvar_is_unset_with_given_scope_and_level() {
        let mut store = UVarStore::new();
        let scope = Scope::initial();
        let u = store.fresh(Kind::Type, scope.clone(), 3);
        assert!(!store.is_set(u));
        assert_eq!(store.level(u), 3);
        assert!(store.content(u).is_none());
    }

    #[test]
    #[should_panic]
    fn raw_set_twice_panics() {
        let mut store = UVarStore::new();
        let u = store.fresh(Kind::Type, Scope::initial(), 0);
        store.raw_set(&Perm::identity(), u, Ty::Var(TVar(0)), &Kind::Type);
        store.raw_set(&Perm::identity(), u, Ty::Var(TVar(1)), &Kind::Type);
    }

    #[test]
    #[should_panic]
    fn raw_set_to_a_type_mentioning_itself_panics() {
        let mut store = UVarStore::new();
        let u = store.fresh(Kind::Type, Scope::initial(), 0);
        let self_app = Ty::App(Box::new(Ty::UVar(Perm::identity(), u)), Box::new(Ty::Var(TVar(0))));
        store.raw_set(&Perm::identity(), u, self_app, &Kind::Type);
    }

    #[test]
    #[should_panic]
    fn raw_set_to_a_type_mentioning_itself_through_an_already_set_uvar_panics() {
        let mut store = UVarStore::new();
        let u = store.fresh(Kind::Type, Scope::initial(), 0);
        let w = store.fresh(Kind::Type, Scope::initial(), 0);
        store.raw_set(&Perm::identity(), w, Ty::UVar(Perm::identity(), u), &Kind::Type);
        store.raw_set(&Perm::identity(), u, Ty::UVar(Perm::identity(), w), &Kind::Type);
    }

    #[test]
    fn raw_set_to_a_type_mentioning_a_different_uvar_succeeds() {
        let mut store = UVarStore::new();
        let u = store.fresh(Kind::Type, Scope::initial(), 0);
        let w = store.fresh(Kind::Type, Scope::initial(), 0);
        store.raw_set(&Perm::identity(), u, Ty::UVar(Perm::identity(), w), &Kind::Type);
        assert!(store.is_set(u));
    }

    #[test]
    fn fix_promotes_to_a_fresh_rigid() {
        let mut store = UVarStore::new();
        let mut registry = RigidRegistry::new();
        let u = store.fresh(Kind::Effect, Scope::initial(), 0);
        let v = store.fix(u, &mut registry, TypeParamName::Anonymous);
        assert_eq!(registry.kind(v), Kind::Effect);
        assert!(store.is_set(u));
    }

    #[test]
    fn filter_scope_never_grows_the_scope() {
        let mut store = UVarStore::new();
        let mut registry = RigidRegistry::new();
        let a = registry.fresh(Kind::Type, 0, TypeParamName::Anonymous);
        let b = registry.fresh(Kind::Type, 5, TypeParamName::Anonymous);
        let scope = Scope::initial().add(a).add(b);
        let u = store.fresh(Kind::Type, scope, 0);
        let before = store.scope(u).len();
        store.filter_scope(u, &registry, None, |v| v == a);
        let after = store.scope(u).len();
        assert!(after <= before);
        assert!(store.scope(u).mem(a));
        assert!(!store.scope(u).mem(b));
    }
}
