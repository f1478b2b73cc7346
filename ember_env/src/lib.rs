//! Foundational, source-independent infrastructure shared by the rest of the
//! Ember compiler: opaque source locations (`Pos`/`Span`) and the
//! fresh-identifier supply used to mint unique ids for variables and
//! unification variables.

mod ids;
mod loc;

pub use ids::IdSupply;
pub use loc::{Pos, Span, Spanned, Unit, WithLoc};
