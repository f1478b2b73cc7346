//! Kinds and the kind store.
//!
//! Kinds classify types the way types classify values: `Type` for ordinary
//! value types, `Effect`/`EffRow` for the two-sorted effect system, `Arrow`
//! for kind-level functions (whose codomain is always non-effect), and
//! `KUVar` for an as-yet-unresolved kind.

use std::fmt;

use ember_env::IdSupply;

use crate::ids::KUVar;

/// A kind, possibly containing unresolved kind unification variables.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Kind {
    /// The kind of value types.
    Type,
    /// The kind of closed ground effects.
    Effect,
    /// The kind of effect rows.
    EffRow,
    /// A kind-level function; `non_effect(codomain)` always holds.
    Arrow(Box<Kind>, Box<Kind>),
    /// An unresolved kind unification variable.
    KUVar(KUVar),
}

impl Kind {
    pub fn arrow(k1: Kind, k2: Kind) -> Kind {
        Kind::Arrow(Box::new(k1), Box::new(k2))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Type => write!(f, "Type"),
            Kind::Effect => write!(f, "Effect"),
            Kind::EffRow => write!(f, "EffRow"),
            Kind::Arrow(k1, k2) => write!(f, "({} -> {})", k1, k2),
            Kind::KUVar(u) => write!(f, "?k{}", u.0),
        }
    }
}

#[derive(Clone)]
enum KUVarState {
    Unset,
    Set(Kind),
}

struct KUVarCell {
    non_effect: bool,
    state: KUVarState,
}

/// The kind store: an arena of kind unification variable cells, each
/// with a one-shot write discipline and an accompanying non-effect flag.
pub struct KindStore {
    cells: Vec<KUVarCell>,
    ids: IdSupply,
}

impl KindStore {
    pub fn new() -> KindStore {
        KindStore { cells: Vec::new(), ids: IdSupply::new() }
    }

    /// Allocates a fresh kind unification variable. `non_effect` pins the
    /// variable so it can never be set to `Effect` or `EffRow`.
    pub fn fresh_uvar(&mut self, non_effect: bool) -> KUVar {
        let id = self.ids.next();
        self.cells.push(KUVarCell { non_effect, state: KUVarState::Unset });
        KUVar(id)
    }

    fn cell(&self, u: KUVar) -> &KUVarCell {
        &self.cells[u.to_usize()]
    }

    /// Forces follow-ups through set kind uvars. An unset uvar is returned
    /// unchanged; a concrete head is returned unchanged. Never returns a set
    /// `KUVar`.
    pub fn view(&self, k: &Kind) -> Kind {
        let mut cur = k.clone();
        loop {
            match cur {
                Kind::KUVar(u) => match &self.cell(u).state {
                    KUVarState::Unset => return Kind::KUVar(u),
                    KUVarState::Set(k2) => { cur = k2.clone(); }
                },
                other => return other,
            }
        }
    }

    /// The occurs check for kinds: does `k` transitively mention `u`?
    pub fn contains_uvar(&self, k: &Kind, u: KUVar) -> bool {
        match self.view(k) {
            Kind::KUVar(u2) => u2 == u,
            Kind::Arrow(k1, k2) => self.contains_uvar(&k1, u) || self.contains_uvar(&k2, u),
            Kind::Type | Kind::Effect | Kind::EffRow => false,
        }
    }

    /// Links `u` to `k`. Panics if `u` is already set or the occurs check
    /// fails (both are internal invariant violations); returns `false`
    /// without mutating anything if `u`'s non-effect flag forbids `k`.
    pub fn set(&mut self, u: KUVar, k: Kind) -> bool {
        {
            let cell = self.cell(u);
            assert!(matches!(cell.state, KUVarState::Unset), "KindStore::set on already-set {:?}", u);
        }
        assert!(!self.contains_uvar(&k, u), "KindStore::set occurs check failed for {:?}", u);

        let head = self.view(&k);
        if self.cell(u).non_effect && matches!(head, Kind::Effect | Kind::EffRow) {
            return false;
        }
        self.cells[u.to_usize()].state = KUVarState::Set(k);
        true
    }

    /// Same as `set`, restricted to a `k` the caller has statically
    /// guaranteed to be non-effect; used where the non-effect check would
    /// always trivially succeed.
    pub fn set_safe(&mut self, u: KUVar, k: Kind) {
        let ok = self.set(u, k);
        assert!(ok, "set_safe called with a disallowed kind for {:?}", u);
    }

    /// Walks to the head of `k`: a concrete non-effect head returns `true`;
    /// `Effect`/`EffRow` returns `false`; an unset `KUVar` has its flag
    /// flipped on and returns `true`. Idempotent.
    pub fn set_non_effect(&mut self, k: &Kind) -> bool {
        match self.view(k) {
            Kind::Effect | Kind::EffRow => false,
            Kind::KUVar(u) => {
                self.cells[u.to_usize()].non_effect = true;
                true
            }
            Kind::Type | Kind::Arrow(_, _) => true,
        }
    }

    /// True iff the (resolved) head of `k` is guaranteed non-effect: either
    /// structurally (`Type`/`Arrow`) or because the uvar's flag is set.
    pub fn non_effect(&self, k: &Kind) -> bool {
        match self.view(k) {
            Kind::Type | Kind::Arrow(_, _) => true,
            Kind::Effect | Kind::EffRow => false,
            Kind::KUVar(u) => self.cell(u).non_effect,
        }
    }

    /// True iff the resolved head of `k` is `Effect` or `EffRow`.
    pub fn is_effect(&self, k: &Kind) -> bool {
        matches!(self.view(k), Kind::Effect | Kind::EffRow)
    }

    pub fn k_type(&self) -> Kind { Kind::Type }
    pub fn k_effect(&self) -> Kind { Kind::Effect }
    pub fn k_effrow(&self) -> Kind { Kind::EffRow }

    /// Builds `k1 -> k2`, asserting `non_effect(k2)` (an internal invariant:
    /// callers must never construct an effectful kind codomain).
    pub fn k_arrow(&self, k1: Kind, k2: Kind) -> Kind {
        assert!(self.non_effect(&k2), "k_arrow: effectful codomain {}", k2);
        Kind::arrow(k1, k2)
    }

    /// `k_arrow` folded over a list of domain kinds.
    pub fn k_arrows(&self, ks: impl IntoIterator<Item = Kind>, k2: Kind) -> Kind {
        let mut ks: Vec<Kind> = ks.into_iter().collect();
        let mut result = k2;
        while let Some(k1) = ks.pop() {
            result = self.k_arrow(k1, result);
        }
        result
    }
}

impl Default for KindStore {
    fn default() -> Self { KindStore::new() }
}
