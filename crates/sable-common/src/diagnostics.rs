//! Diagnostic types and message lookup for semantic resolution.
//!
//! A diagnostic only ever holds source text, names and spans. It never
//! references a scope, symbol or work item, so diagnostics collected on any
//! worker can be merged into the final result freely.

use serde::Serialize;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Every diagnostic the resolver can produce.
///
/// Numeric codes are stable and are what hosts match on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticCode {
    DuplicateDeclaration = 1001,
    UnresolvedReference = 1002,
    NoApplicableOverload = 1003,
    AmbiguousOverload = 1004,
    TemplateArgumentInferenceFailed = 1005,
    TemplateArgumentCountMismatch = 1006,
    UnresolvedExternalSymbol = 1007,
    ResolutionDeadlock = 1008,
    TypeMismatch = 1009,
    InstantiationDepthExceeded = 1010,
    NotCallable = 1011,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 11] = [
        DiagnosticCode::DuplicateDeclaration,
        DiagnosticCode::UnresolvedReference,
        DiagnosticCode::NoApplicableOverload,
        DiagnosticCode::AmbiguousOverload,
        DiagnosticCode::TemplateArgumentInferenceFailed,
        DiagnosticCode::TemplateArgumentCountMismatch,
        DiagnosticCode::UnresolvedExternalSymbol,
        DiagnosticCode::ResolutionDeadlock,
        DiagnosticCode::TypeMismatch,
        DiagnosticCode::InstantiationDepthExceeded,
        DiagnosticCode::NotCallable,
    ];

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Message template with `{0}`, `{1}`, ... placeholders.
    pub const fn template(self) -> &'static str {
        match self {
            DiagnosticCode::DuplicateDeclaration => "Duplicate declaration of '{0}'.",
            DiagnosticCode::UnresolvedReference => "Cannot find name '{0}'.",
            DiagnosticCode::NoApplicableOverload => {
                "No overload of '{0}' accepts arguments ({1}). Rejected candidates: {2}."
            }
            DiagnosticCode::AmbiguousOverload => {
                "Call to '{0}' with arguments ({1}) is ambiguous between: {2}."
            }
            DiagnosticCode::TemplateArgumentInferenceFailed => {
                "Cannot infer type arguments for '{0}': {1}."
            }
            DiagnosticCode::TemplateArgumentCountMismatch => {
                "'{0}' expects {1} type argument(s) but {2} were supplied."
            }
            DiagnosticCode::UnresolvedExternalSymbol => {
                "External symbol '{0}' could not be found."
            }
            DiagnosticCode::ResolutionDeadlock => {
                "Resolution deadlock: '{0}' cannot complete because of the dependency cycle {1}."
            }
            DiagnosticCode::TypeMismatch => "Type '{0}' is not implicitly convertible to '{1}'.",
            DiagnosticCode::InstantiationDepthExceeded => {
                "Instantiation of '{0}' is excessively deep and possibly infinite."
            }
            DiagnosticCode::NotCallable => "'{0}' is not callable.",
        }
    }

    pub const fn category(self) -> DiagnosticCategory {
        DiagnosticCategory::Error
    }
}

/// Related information for a diagnostic (e.g., the first declaration of a duplicate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A resolution diagnostic with optional related information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., where a clashing name was first declared)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a diagnostic for `code`, filling its template with `args`.
    #[must_use]
    pub fn from_code(
        code: DiagnosticCode,
        file: impl Into<String>,
        span: crate::Span,
        args: &[&str],
    ) -> Self {
        Self {
            file: file.into(),
            start: span.start,
            length: span.len(),
            message_text: format_message(code.template(), args),
            category: code.category(),
            code: code.code(),
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    pub fn diagnostic_code(&self) -> Option<DiagnosticCode> {
        DiagnosticCode::from_code(self.code)
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
