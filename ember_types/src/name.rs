//! Parameter names.
//!
//! Type-parameter names distinguish anonymous type arguments from ones tied
//! to an effect or carrying a surface name; value-parameter names carry the
//! calling-convention flavor (label/regular/optional/implicit/method) that
//! the elaborator needs to match arguments at call sites. Equality on both
//! is purely structural — there is no hidden identity beyond the variant and
//! its payload.

use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeParamName {
    /// An ordinary, unnamed universally-quantified type argument.
    Anonymous,
    /// The implicit type argument associated with an effect operation.
    Effect,
    /// A user-facing name, e.g. from `forall a.`.
    Named(String),
}

impl fmt::Debug for TypeParamName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeParamName::Anonymous => write!(f, "_"),
            TypeParamName::Effect => write!(f, "$eff"),
            TypeParamName::Named(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ValueParamName {
    /// A positional argument distinguished only by a call-site label.
    Label(String),
    /// An ordinary positional argument.
    Regular(String),
    /// An argument with a default, omissible at call sites.
    Optional(String),
    /// An implicit (method-resolution-style) argument.
    Implicit(String),
    /// A method receiver parameter.
    Method(String),
}

impl ValueParamName {
    pub fn as_str(&self) -> &str {
        match self {
            ValueParamName::Label(s)
            | ValueParamName::Regular(s)
            | ValueParamName::Optional(s)
            | ValueParamName::Implicit(s)
            | ValueParamName::Method(s) => s,
        }
    }
}

impl fmt::Debug for ValueParamName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueParamName::Label(s) => write!(f, "~{}", s),
            ValueParamName::Regular(s) => write!(f, "{}", s),
            ValueParamName::Optional(s) => write!(f, "?{}", s),
            ValueParamName::Implicit(s) => write!(f, "{{{}}}", s),
            ValueParamName::Method(s) => write!(f, ".{}", s),
        }
    }
}
