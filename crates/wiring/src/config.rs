//! Engine configuration
//!
//! Validators behave identically under every configuration as far as fan-out
//! is concerned. The knobs only affect how loudly unmatched associations are
//! reported and whether cascading disposal may touch an object twice.
//!
//! ```rust,ignore
//! use nebula_wiring::config::{DiagnosticLevel, DisposalPolicy, EngineConfig};
//!
//! let config = EngineConfig::default()
//!     .with_name("signup-form")
//!     .with_disposal(DisposalPolicy::AtMostOnce)
//!     .with_unmatched(DiagnosticLevel::Debug);
//!
//! let same = EngineConfig::from_json(
//!     r#"{ "name": "signup-form", "disposal": "at_most_once", "unmatched": "debug" }"#,
//! )?;
//! assert_eq!(config, same);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::{WiringError, WiringResult};

/// How cascading disposal treats objects reachable from several associations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalPolicy {
    /// Dispose every object once per association that holds it. An object
    /// that is a provider of one trigger *and* the key of a provider→rule
    /// entry is disposed twice, so `Disposable` implementations must be
    /// idempotent.
    #[default]
    Cascade,
    /// Track disposed objects by identity and dispose each at most once per
    /// `dispose()` call.
    AtMostOnce,
}

impl DisposalPolicy {
    const EXPECTED: &'static str = "cascade, at_most_once";

    /// The serialized spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::AtMostOnce => "at_most_once",
        }
    }
}

impl fmt::Display for DisposalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisposalPolicy {
    type Err = WiringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cascade" => Ok(Self::Cascade),
            "at_most_once" => Ok(Self::AtMostOnce),
            _ => Err(WiringError::unknown_variant(
                "disposal policy",
                s,
                Self::EXPECTED,
            )),
        }
    }
}

/// Log level for soft wiring problems: a trigger with no provider, a provider
/// with no rule, a result with no handler, or an unmap call with nothing to
/// unmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    /// Don't report.
    Off,
    /// `tracing::trace!`
    Trace,
    /// `tracing::debug!`
    Debug,
    /// `tracing::warn!`
    #[default]
    Warn,
}

impl DiagnosticLevel {
    const EXPECTED: &'static str = "off, trace, debug, warn";

    /// The serialized spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticLevel {
    type Err = WiringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "warn" | "warning" => Ok(Self::Warn),
            _ => Err(WiringError::unknown_variant(
                "diagnostic level",
                s,
                Self::EXPECTED,
            )),
        }
    }
}

/// Per-validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Label attached to every log line the validator emits.
    pub name: Option<String>,
    /// Cascading disposal behavior.
    pub disposal: DisposalPolicy,
    /// Level for unmatched-association reports.
    pub unmatched: DiagnosticLevel,
}

impl EngineConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> WiringResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the log label.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the disposal policy.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_disposal(mut self, disposal: DisposalPolicy) -> Self {
        self.disposal = disposal;
        self
    }

    /// Sets the level for unmatched-association reports.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_unmatched(mut self, level: DiagnosticLevel) -> Self {
        self.unmatched = level;
        self
    }

    /// The log label, or `"anonymous"`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}
