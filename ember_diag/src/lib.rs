//! The Ember compiler's error channel: severities, error classes, a
//! phase-barrier (`assert_no_error`) and a handful of pluggable sinks.
//!
//! This crate is deliberately small and presentation-agnostic: it does not
//! format source snippets or talk to a terminal (that belongs to a
//! surrounding frontend/CLI). It only defines the shape of a diagnostic and
//! the contract every sink must honor.

mod report;

pub use report::{
    CollectedReport, ErrorClass, LogReport, NoReport, Report, Reporter, Result, Severity, Stop,
};
