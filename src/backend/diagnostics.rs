//! Non-fatal translation diagnostics.
//!
//! Degradations (dropped modifiers, placeholders, forced cycle drains) are collected per unit instead of aborting
//! translation. Each carries a stable code so tooling can filter them.

use std::fmt;

use serde::Serialize;

/// Stable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Generic abstract method: emitted as a plain declaration, unit marked failed.
    #[serde(rename = "CN0100")]
    GenericAbstractMethod,
    /// Generic virtual method: `virtual` dropped.
    #[serde(rename = "CN0101")]
    GenericVirtualMethod,
    /// Construct rendered as a `[==name==]` placeholder.
    #[serde(rename = "CN0200")]
    Unimplemented,
    /// Dependency cycle force-drained.
    #[serde(rename = "CN0300")]
    DependencyCycle,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::GenericAbstractMethod => "CN0100",
            DiagnosticCode::GenericVirtualMethod => "CN0101",
            DiagnosticCode::Unimplemented => "CN0200",
            DiagnosticCode::DependencyCycle => "CN0300",
        }
    }

    /// Default severity of this code.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::GenericAbstractMethod => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A degradation recorded while translating a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Managed name of the type or member being translated (`NS.Type::Method`).
    pub location: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            location: location.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if !self.location.is_empty() {
            write!(f, " ({})", self.location)?;
        }
        for note in &self.notes {
            write!(f, "\n  = note: {}", note)?;
        }
        Ok(())
    }
}
