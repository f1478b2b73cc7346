//! The error channel: a process-wide sink for diagnostics, tagged with a
//! severity, with an explicit phase-barrier (`assert_no_error`) and an
//! explicit `reset`.
//!
//! Structural invariant violations (occurs check, kind mismatch, scope
//! membership bugs) are never routed through here: they are bugs in the
//! calling phase and `panic!` immediately. Only the five semantic error
//! kinds below (and ordinary warnings/notes) travel through `Report`.

use std::cell::{Cell, RefCell};
use std::cmp;
use std::result;

use ember_env::{Pos, Span};

/// The severity of a single diagnostic.
///
/// Ordered so that `Note < Warning < Error < FatalError`; a report sink's
/// "worst severity seen" can therefore be tracked with a plain `cmp::max`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
    FatalError,
}

/// The five error kinds the unification engine itself can raise, plus an
/// escape hatch for diagnostics authored by a surrounding phase (elaborator,
/// frontend) that reuses this same channel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ErrorClass {
    /// Attempting to set a kind uvar to a disallowed kind, or constructing a
    /// type whose arguments have mismatching kinds.
    KindConflict,
    /// A rigid variable appears outside its binding scope.
    ScopeEscape,
    /// An effect kind was required where a value kind was expected, or vice
    /// versa.
    NonEffectViolation,
    /// A unification variable would be set to a type mentioning itself.
    OccursCheck,
    /// A recursive ADT failed the strict-positivity test in a context that
    /// required it.
    StrictPositivityFailure,
    /// Any diagnostic not raised by the unification engine itself (reserved
    /// for the surrounding phase).
    Other,
}

/// Returned by a fallible report; `#[must_use]` so that a caller cannot
/// silently ignore a `FatalError` having aborted the current phase.
#[must_use]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Stop;

pub type Result<T> = result::Result<T, Stop>;

/// A sink for diagnostics. Implementations decide how (or whether) to
/// present a report; all of them agree on the phase-barrier contract:
/// `can_continue` must go false the moment an `Error` or `FatalError` has
/// been recorded since the last `reset`.
pub trait Report {
    /// Records one diagnostic. Returns `Err(Stop)` iff `severity` is
    /// `FatalError` (the caller must unwind the current phase).
    fn add(&self, severity: Severity, pos: Option<Pos>, class: ErrorClass, msg: String) -> Result<()>;

    /// True iff no `Error`/`FatalError` has been recorded since the last
    /// `reset`.
    fn can_continue(&self) -> bool;

    /// Clears the recorded severity state (but not necessarily any
    /// collected diagnostics — see `CollectedReport::into_reports`).
    fn reset(&self);

    /// The phase-barrier: fails iff at least one `Error`/`FatalError` has
    /// been recorded since the last `reset`.
    fn assert_no_error(&self) -> Result<()> {
        if self.can_continue() { Ok(()) } else { Err(Stop) }
    }
}

impl<'a, R: Report + ?Sized> Report for &'a R {
    fn add(&self, severity: Severity, pos: Option<Pos>, class: ErrorClass, msg: String) -> Result<()> {
        (**self).add(severity, pos, class, msg)
    }
    fn can_continue(&self) -> bool { (**self).can_continue() }
    fn reset(&self) { (**self).reset() }
}

/// Ergonomic wrappers over `Report::add` mirroring the four severities.
pub trait Reporter: Report + Sized {
    fn fatal<Loc: Into<Span>>(&self, loc: Loc, class: ErrorClass, msg: impl Into<String>) -> Stop {
        let _ = self.add(Severity::FatalError, Some(loc.into().begin()), class, msg.into());
        Stop
    }

    fn error<Loc: Into<Span>>(&self, loc: Loc, class: ErrorClass, msg: impl Into<String>) -> Result<()> {
        self.add(Severity::Error, Some(loc.into().begin()), class, msg.into())
    }

    fn warn<Loc: Into<Span>>(&self, loc: Loc, class: ErrorClass, msg: impl Into<String>) -> Result<()> {
        self.add(Severity::Warning, Some(loc.into().begin()), class, msg.into())
    }

    fn note<Loc: Into<Span>>(&self, loc: Loc, class: ErrorClass, msg: impl Into<String>) -> Result<()> {
        self.add(Severity::Note, Some(loc.into().begin()), class, msg.into())
    }
}

impl<T: Report> Reporter for T {}

/// An in-memory sink that simply accumulates every diagnostic in order.
/// Useful for tests and for callers that want to sort/batch diagnostics
/// before presenting them.
pub struct CollectedReport {
    collected: RefCell<Vec<(Severity, Option<Pos>, ErrorClass, String)>>,
    maxseverity: Cell<Option<Severity>>,
}

impl CollectedReport {
    pub fn new() -> CollectedReport {
        CollectedReport { collected: RefCell::new(Vec::new()), maxseverity: Cell::new(None) }
    }

    /// Consumes the sink, returning every diagnostic recorded in FIFO order,
    /// the only observable ordering a caller can depend on.
    pub fn into_reports(self) -> Vec<(Severity, Option<Pos>, ErrorClass, String)> {
        self.collected.into_inner()
    }
}

impl Default for CollectedReport {
    fn default() -> Self { CollectedReport::new() }
}

impl Report for CollectedReport {
    fn add(&self, severity: Severity, pos: Option<Pos>, class: ErrorClass, msg: String) -> Result<()> {
        self.collected.borrow_mut().push((severity, pos, class, msg));
        let max = match self.maxseverity.get() {
            Some(prev) => cmp::max(prev, severity),
            None => severity,
        };
        self.maxseverity.set(Some(max));
        if severity == Severity::FatalError { Err(Stop) } else { Ok(()) }
    }

    fn can_continue(&self) -> bool {
        self.maxseverity.get() < Some(Severity::Error)
    }

    fn reset(&self) {
        self.maxseverity.set(None);
    }
}

/// A sink that discards every diagnostic. `FatalError` still aborts the
/// current phase.
pub struct NoReport;

impl Report for NoReport {
    fn add(&self, severity: Severity, _pos: Option<Pos>, _class: ErrorClass, _msg: String) -> Result<()> {
        if severity == Severity::FatalError { Err(Stop) } else { Ok(()) }
    }
    fn can_continue(&self) -> bool { true }
    fn reset(&self) {}
}

/// A sink that forwards every diagnostic through the `log` facade, for
/// binaries that wire up `env_logger` (or any other `log` backend) rather
/// than presenting diagnostics directly, with no terminal-attached
/// presentation layer of its own.
pub struct LogReport {
    maxseverity: Cell<Option<Severity>>,
}

impl LogReport {
    pub fn new() -> LogReport {
        LogReport { maxseverity: Cell::new(None) }
    }
}

impl Default for LogReport {
    fn default() -> Self { LogReport::new() }
}

impl Report for LogReport {
    fn add(&self, severity: Severity, pos: Option<Pos>, class: ErrorClass, msg: String) -> Result<()> {
        match severity {
            Severity::FatalError => log::error!("[fatal] {:?} {:?}: {}", class, pos, msg),
            Severity::Error => log::error!("{:?} {:?}: {}", class, pos, msg),
            Severity::Warning => log::warn!("{:?} {:?}: {}", class, pos, msg),
            Severity::Note => log::info!("{:?} {:?}: {}", class, pos, msg),
        }
        let max = match self.maxseverity.get() {
            Some(prev) => cmp::max(prev, severity),
            None => severity,
        };
        self.maxseverity.set(Some(max));
        if severity == Severity::FatalError { Err(Stop) } else { Ok(()) }
    }

    fn can_continue(&self) -> bool {
        self.maxseverity.get() < Some(Severity::Error)
    }

    fn reset(&self) {
        self.maxseverity.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collected_report_tracks_phase_barrier() {
        let report = CollectedReport::new();
        assert!(report.can_continue());
        report.add(Severity::Warning, None, ErrorClass::Other, "just a warning".into()).unwrap();
        assert!(report.can_continue());
        report.add(Severity::Error, None, ErrorClass::ScopeEscape, "escaped".into()).unwrap();
        assert!(!report.can_continue());
        assert!(report.assert_no_error().is_err());
        report.reset();
        assert!(report.can_continue());
    }

    #[test]
    fn fatal_error_short_circuits() {
        let report = CollectedReport::new();
        let err = report.add(Severity::FatalError, None, ErrorClass::OccursCheck, "boom".into());
        assert_eq!(err, Err(Stop));
    }

    #[test]
    fn reports_preserve_fifo_order() {
        let report = CollectedReport::new();
        report.add(Severity::Note, None, ErrorClass::Other, "first".into()).unwrap();
        report.add(Severity::Note, None, ErrorClass::Other, "second".into()).unwrap();
        let reports = report.into_reports();
        assert_eq!(reports[0].3, "first");
        assert_eq!(reports[1].3, "second");
    }

    #[test]
    fn no_report_discards_but_still_aborts_on_fatal() {
        let report = NoReport;
        assert!(report.add(Severity::Error, None, ErrorClass::Other, "ignored".into()).is_ok());
        assert!(report.can_continue());
        assert_eq!(report.add(Severity::FatalError, None, ErrorClass::Other, "boom".into()), Err(Stop));
    }
}
