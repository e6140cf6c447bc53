//! Diagnostic Infrastructure
//!
//! The core never aborts on user errors: a cyclic supertype or an unresolved
//! reference becomes an error-typed reference in the IR. The resolver records
//! each of those substitutions here so a downstream reporter can render them.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

pub mod diagnostic_codes {
    /// "Loop in supertype definition for {0}"
    pub const LOOP_IN_SUPERTYPES: u32 = 1001;
    /// "Type parameter cannot be a super-type: {0}"
    pub const TYPE_PARAMETER_AS_SUPERTYPE: u32 = 1002;
    /// "Unresolved expanded typeRef for {0}"
    pub const UNRESOLVED_EXPANSION: u32 = 1003;
    /// "Unresolved reference: {0}"
    pub const UNRESOLVED_REFERENCE: u32 = 1004;
    /// "{0} type argument(s) expected for {1}, got {2}"
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: u32 = 1005;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl DiagnosticCategory {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Message => "message",
        }
    }
}

/// A single diagnostic attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Rendered identity of the declaration the diagnostic belongs to
    /// (e.g. `com.example/Outer.Inner`).
    pub declaration: String,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(declaration: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            declaration: declaration.into(),
            message_text: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} K{}: {}",
            self.declaration,
            self.category.name(),
            self.code,
            self.message_text
        )
    }
}

/// A collection of diagnostics for one compilation phase.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, declaration: impl Into<String>, message: impl Into<String>, code: u32) {
        self.push(Diagnostic::error(declaration, message, code));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
