//! Scopes: append-only chains of rigid variables tagged with a monotone
//! level.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ids::TVar;
use crate::perm::Perm;

struct ScopeData {
    /// Append order, oldest first; kept so iteration is deterministic.
    order: Vec<TVar>,
    set: HashSet<TVar>,
    level: u32,
}

/// A persistent, append-only set of rigid variables with a monotone level.
/// Cloning a `Scope` is `O(1)` (it shares its backing data via `Rc`);
/// `add`/`filter`/`perm` build a new `Scope` rather than mutating in place.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeData>,
}

impl Scope {
    /// The empty scope at level 0.
    pub fn initial() -> Scope {
        Scope { inner: Rc::new(ScopeData { order: Vec::new(), set: HashSet::new(), level: 0 }) }
    }

    /// Extends the scope with `v`. Idempotent: adding an already-present
    /// variable returns a scope identical to `self`.
    pub fn add(&self, v: TVar) -> Scope {
        if self.inner.set.contains(&v) {
            return self.clone();
        }
        let mut order = self.inner.order.clone();
        let mut set = self.inner.set.clone();
        order.push(v);
        set.insert(v);
        Scope { inner: Rc::new(ScopeData { order, set, level: self.inner.level }) }
    }

    /// Same as `add`; the name is carried only for documentation at call
    /// sites (binder introductions), since `Scope` itself does not retain
    /// surface names — those live in the rigid-variable registry.
    pub fn add_named(&self, v: TVar) -> Scope {
        self.add(v)
    }

    pub fn mem(&self, v: TVar) -> bool {
        self.inner.set.contains(&v)
    }

    pub fn level(&self) -> u32 {
        self.inner.level
    }

    /// A scope identical to `self` except that the level has been
    /// incremented by one; used to open a fresh region during
    /// generalization or let-binding.
    pub fn incr_level(&self) -> Scope {
        Scope {
            inner: Rc::new(ScopeData {
                order: self.inner.order.clone(),
                set: self.inner.set.clone(),
                level: self.inner.level + 1,
            }),
        }
    }

    /// Rewrites every variable in the scope through `p`.
    pub fn perm(&self, p: &Perm) -> Scope {
        let order: Vec<TVar> = self.inner.order.iter().map(|&v| p.apply(v)).collect();
        let set: HashSet<TVar> = order.iter().cloned().collect();
        Scope { inner: Rc::new(ScopeData { order, set, level: self.inner.level }) }
    }

    /// Shrinks the scope to the variables satisfying `pred`, preserving
    /// relative order and the level.
    pub fn filter<F: Fn(TVar) -> bool>(&self, pred: F) -> Scope {
        let order: Vec<TVar> = self.inner.order.iter().cloned().filter(|&v| pred(v)).collect();
        let set: HashSet<TVar> = order.iter().cloned().collect();
        Scope { inner: Rc::new(ScopeData { order, set, level: self.inner.level }) }
    }

    pub fn iter(&self) -> impl Iterator<Item = TVar> + '_ {
        self.inner.order.iter().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.order.is_empty()
    }

    /// True iff every variable in `self` is also in `other` (the scopes
    /// need not share a level).
    pub fn is_subset_of(&self, other: &Scope) -> bool {
        self.inner.order.iter().all(|v| other.mem(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u32) -> TVar { TVar(n) }

    #[test]
    fn add_is_idempotent_and_append_only() {
        let s = Scope::initial().add(v(1)).add(v(2)).add(v(1));
        assert_eq!(s.len(), 2);
        assert!(s.mem(v(1)));
        assert!(s.mem(v(2)));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![v(1), v(2)]);
    }

    #[test]
    fn incr_level_is_monotone() {
        let s0 = Scope::initial();
        let s1 = s0.incr_level();
        let s2 = s1.incr_level();
        assert!(s0.level() <= s1.level());
        assert!(s1.level() <= s2.level());
        assert_eq!(s2.level(), 2);
    }

    #[test]
    fn filter_never_grows_scope() {
        let s = Scope::initial().add(v(1)).add(v(2)).add(v(3));
        let s2 = s.filter(|x| x != v(2));
        assert!(s2.len() <= s.len());
        assert!(!s2.mem(v(2)));
        assert!(s2.mem(v(1)) && s2.mem(v(3)));
    }

    #[test]
    fn perm_rewrites_variables_in_place() {
        let s = Scope::initial().add(v(1)).add(v(2));
        let p = Perm::transposition(v(1), v(9));
        let s2 = s.perm(&p);
        assert!(s2.mem(v(9)));
        assert!(!s2.mem(v(1)));
        assert!(s2.mem(v(2)));
    }
}
