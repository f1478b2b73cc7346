//! The `Session` aggregate.
//!
//! A `Session` bundles every mutable store a unification computation needs
//! — the kind store, the uvar store, the rigid-variable registry, the
//! built-in rigids, and an error channel — behind one constructible,
//! resettable value. This is the crate's only "configuration surface": the
//! caller picks the error sink at construction time and otherwise drives
//! inference through the `TyCtx`/`TyCtxMut` accessors `Session` implements.
//! Collapses what a frontend would otherwise split across a checker and a
//! separate type context into a single owner, since this crate has no
//! surface-syntax or elaboration phase of its own.

use ember_diag::Report;

use crate::builtins::Builtins;
use crate::kind::KindStore;
use crate::rigid::RigidRegistry;
use crate::scope::Scope;
use crate::ty::{TyCtx, TyCtxMut};
use crate::uvar::UVarStore;

/// Owns every mutable store for one inference session, parametrized over
/// the error sink `R` (a [`Report`]) so the engine never depends on a
/// particular presentation.
pub struct Session<R: Report> {
    kinds: KindStore,
    uvars: UVarStore,
    rigids: RigidRegistry,
    builtins: Builtins,
    report: R,
    top_scope: Scope,
}

impl<R: Report> Session<R> {
    /// Builds a fresh session: allocates the built-in rigids at the base
    /// scope/level and wires `report` as the error sink.
    pub fn new(report: R) -> Session<R> {
        let mut rigids = RigidRegistry::new();
        let builtins = Builtins::new(&mut rigids);
        Session {
            kinds: KindStore::new(),
            uvars: UVarStore::new(),
            rigids,
            builtins,
            report,
            top_scope: Scope::initial(),
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn report(&self) -> &R {
        &self.report
    }

    /// The scope new top-level bindings are added to; starts as
    /// `Scope::initial()` and is widened by callers via `Scope::add` as they
    /// introduce top-level rigid variables (data type parameters, built-in
    /// extern signatures, ...).
    pub fn top_scope(&self) -> &Scope {
        &self.top_scope
    }

    pub fn set_top_scope(&mut self, scope: Scope) {
        self.top_scope = scope;
    }

    /// Resets every mutable store to a fresh, empty session, re-allocating
    /// the built-ins. The rigid-variable registry is *not* swapped for a new
    /// one — only `RigidRegistry::fresh` hands out ids, and a brand-new
    /// registry would restart its id supply at zero, so a rigid allocated
    /// before this call could collide with one allocated after it. Reusing
    /// the registry keeps its id supply strictly increasing across a reset,
    /// at the cost of carrying forward the (now-unreachable) entries
    /// allocated before the reset. Does **not** reset `report`'s own
    /// phase-barrier state — callers that want a clean error channel too
    /// call `self.report().reset()` separately, since resetting the store
    /// and resetting the diagnostic history are independent concerns a
    /// caller may want to perform at different times (e.g. a REPL that
    /// keeps accumulated warnings across a failed top-level binding but
    /// discards the half-built uvar store).
    pub fn reset(&mut self) {
        let builtins = Builtins::new(&mut self.rigids);
        self.kinds = KindStore::new();
        self.uvars = UVarStore::new();
        self.builtins = builtins;
        self.top_scope = Scope::initial();
    }
}

impl<R: Report> TyCtx for Session<R> {
    fn kinds(&self) -> &KindStore { &self.kinds }
    fn uvars(&self) -> &UVarStore { &self.uvars }
    fn rigids(&self) -> &RigidRegistry { &self.rigids }
}

impl<R: Report> TyCtxMut for Session<R> {
    fn uvars_mut(&mut self) -> &mut UVarStore { &mut self.uvars }
    fn kinds_mut(&mut self) -> &mut KindStore { &mut self.kinds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_diag::CollectedReport;

    #[test]
    fn a_fresh_session_exposes_the_five_builtins_at_type_kind() {
        let session = Session::new(CollectedReport::new());
        for (_, v) in session.builtins().all() {
            assert_eq!(session.rigids().kind(v), crate::kind::Kind::Type);
        }
    }

    #[test]
    fn reset_reallocates_builtins_as_distinct_rigids() {
        let mut session = Session::new(CollectedReport::new());
        let before = session.builtins().int;
        session.reset();
        let after = session.builtins().int;
        assert_ne!(before, after);
    }

    #[test]
    fn top_scope_starts_empty_and_can_be_widened() {
        let mut session = Session::new(CollectedReport::new());
        assert!(session.top_scope().is_empty());
        let a = session.rigids.fresh(crate::kind::Kind::Type, 0, crate::name::TypeParamName::Anonymous);
        let widened = session.top_scope().add(a);
        session.set_top_scope(widened);
        assert!(session.top_scope().mem(a));
    }
}
