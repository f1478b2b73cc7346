//! Permutations.
//!
//! A `Perm` is a finite bijection on rigid type variables, represented as a
//! set of disjoint transpositions (a swap list) rather than a general
//! mapping — this is sufficient because permutations only ever arise from
//! reordering simple effect-row variables under row unification, and
//! composing swap lists is cheaper than composing arbitrary maps.

use std::collections::HashMap;

use crate::ids::TVar;

/// A finite permutation of rigid variables, represented as a swap map.
/// `identity()` is the empty map; composition is "apply `self` first, then
/// `other`" for `self.then(other)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Perm {
    // v -> image(v); entries only for v with image(v) != v.
    map: HashMap<TVar, TVar>,
}

impl Perm {
    pub fn identity() -> Perm {
        Perm { map: HashMap::new() }
    }

    pub fn is_identity(&self) -> bool {
        self.map.is_empty()
    }

    /// The transposition swapping `a` and `b`. A no-op if `a == b`.
    pub fn transposition(a: TVar, b: TVar) -> Perm {
        if a == b {
            return Perm::identity();
        }
        let mut map = HashMap::new();
        map.insert(a, b);
        map.insert(b, a);
        Perm { map }
    }

    /// Applies the permutation to a single variable.
    pub fn apply(&self, v: TVar) -> TVar {
        self.map.get(&v).cloned().unwrap_or(v)
    }

    /// The inverse permutation (every permutation here is its own inverse
    /// swap-for-swap, but composition need not be, so this is not simply
    /// `self.clone()` in general).
    pub fn inverse(&self) -> Perm {
        let map = self.map.iter().map(|(&k, &v)| (v, k)).collect();
        Perm { map }
    }

    /// Composes two permutations: `self.then(other).apply(v) ==
    /// other.apply(self.apply(v))`. Used to fold a new permutation onto the
    /// delayed permutation already attached to a uvar mention.
    pub fn then(&self, other: &Perm) -> Perm {
        let mut map = HashMap::new();
        let mut domain: Vec<TVar> = self.map.keys().cloned().collect();
        for v in other.map.keys() {
            if !self.map.contains_key(v) {
                domain.push(*v);
            }
        }
        for v in domain {
            let image = other.apply(self.apply(v));
            if image != v {
                map.insert(v, image);
            }
        }
        Perm { map }
    }

    pub fn domain(&self) -> impl Iterator<Item = TVar> + '_ {
        self.map.keys().cloned()
    }
}
