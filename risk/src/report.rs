//! Validation report type.

use serde::Serialize;

/// Result of validating one order draft.
///
/// Submission proceeds only when `errors` is empty; warnings are advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Errors joined into one line, for error messages.
    pub fn summary(&self) -> String {
        self.errors.join("; ")
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "VALIDATION:")?;
        for error in &self.errors {
            writeln!(f, "  [FAIL] {error}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "  [WARN] {warning}")?;
        }
        if self.errors.is_empty() && self.warnings.is_empty() {
            writeln!(f, "  [PASS] all checks")?;
        }
        Ok(())
    }
}
