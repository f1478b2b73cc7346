//! Ember's type system: kinds, rigid type variables, unification variables,
//! the type term algebra (including effect rows), schemes, substitution, and
//! the scope/escape/positivity machinery that ties them together.
//!
//! This crate is the type-inference and unification engine of the Ember
//! compiler. It owns no surface syntax, no elaboration to a runtime
//! representation, and no presentation layer; it is a library of data types
//! plus a small mutable store (see [`session::Session`]) for unification
//! state, meant to be driven by a type-checking phase that lives elsewhere.

pub mod builtins;
pub mod display;
pub mod ids;
pub mod kind;
pub mod name;
pub mod perm;
pub mod rigid;
pub mod scheme;
pub mod scope;
pub mod session;
pub mod shrink;
pub mod subst;
pub mod ty;
pub mod uvar;

pub use builtins::{Builtins, EUnitPrf};
pub use display::Display;
pub use kind::{Kind, KindStore};
pub use name::{TypeParamName, ValueParamName};
pub use perm::Perm;
pub use rigid::RigidRegistry;
pub use scheme::{ConstructorDecl, NamedParam, Polarity, Scheme};
pub use scope::Scope;
pub use session::Session;
pub use subst::Subst;
pub use ty::{Ty, TyCtx, TyCtxMut, Whnf};
pub use uvar::UVarStore;
