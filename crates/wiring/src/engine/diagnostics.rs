//! Soft-failure reporting
//!
//! Nothing in the wiring layer is an error. A trigger without providers, a
//! provider without rules or a result without handlers simply ends that branch
//! of the fan-out; the only trace it leaves is a log line at the configured
//! level.

use crate::config::DiagnosticLevel;

/// What could not be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unmatched {
    DataProvider,
    Rule,
    ResultHandler,
}

impl Unmatched {
    fn as_str(self) -> &'static str {
        match self {
            Self::DataProvider => "no matching data provider",
            Self::Rule => "no matching rule",
            Self::ResultHandler => "no matching result handler",
        }
    }
}

/// Reports a fan-out branch that ended early.
pub(crate) fn unmatched(level: DiagnosticLevel, validator: &str, what: Unmatched) {
    report(level, validator, None, what.as_str());
}

/// Reports a map/unmap call with both sides absent.
pub(crate) fn ambiguous_unmap(level: DiagnosticLevel, validator: &str, operation: &'static str) {
    report(
        level,
        validator,
        Some(operation),
        "both sides of the association are None, nothing to do",
    );
}

fn report(
    level: DiagnosticLevel,
    validator: &str,
    operation: Option<&'static str>,
    message: &'static str,
) {
    macro_rules! at_level {
        ($mac:ident) => {
            tracing::$mac!(validator, operation, "{message}")
        };
    }
    match level {
        DiagnosticLevel::Off => {}
        DiagnosticLevel::Trace => at_level!(trace),
        DiagnosticLevel::Debug => at_level!(debug),
        DiagnosticLevel::Warn => at_level!(warn),
    }
}
