//! Built-in rigid types.

use crate::kind::Kind;
use crate::name::TypeParamName;
use crate::rigid::RigidRegistry;
use crate::ty::Ty;

/// The fixed set of predefined rigid variables, each of kind `Type`, plus
/// the computationally-irrelevant proof term for `Unit`.
pub struct Builtins {
    pub int: crate::ids::TVar,
    pub int64: crate::ids::TVar,
    pub string: crate::ids::TVar,
    pub char: crate::ids::TVar,
    pub unit: crate::ids::TVar,
}

impl Builtins {
    /// Allocates the built-in rigids in `registry` at the base level (0).
    pub fn new(registry: &mut RigidRegistry) -> Builtins {
        let fresh = |registry: &mut RigidRegistry, name: &str| {
            registry.fresh(Kind::Type, 0, TypeParamName::Named(name.to_string()))
        };
        Builtins {
            int: fresh(registry, "Int"),
            int64: fresh(registry, "Int64"),
            string: fresh(registry, "String"),
            char: fresh(registry, "Char"),
            unit: fresh(registry, "Unit"),
        }
    }

    /// `(name, rigid)` pairs, addressable by the frontend's name resolver.
    pub fn all(&self) -> [(&'static str, crate::ids::TVar); 5] {
        [
            ("Int", self.int),
            ("Int64", self.int64),
            ("String", self.string),
            ("Char", self.char),
            ("Unit", self.unit),
        ]
    }

    pub fn t_int(&self) -> Ty { Ty::Var(self.int) }
    pub fn t_int64(&self) -> Ty { Ty::Var(self.int64) }
    pub fn t_string(&self) -> Ty { Ty::Var(self.string) }
    pub fn t_char(&self) -> Ty { Ty::Var(self.char) }
    pub fn t_unit(&self) -> Ty { Ty::Var(self.unit) }
}

/// The (computationally irrelevant) proof term witnessing a value of type
/// `Unit`; carried as inert data, never inspected by this crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EUnitPrf;
