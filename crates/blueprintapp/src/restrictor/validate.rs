use serde::Serialize;
use std::fmt;

/// A write touched columns that the blueprint locks.
///
/// Carries every offending column so all violations can be reported at once.
/// This is a validation result, not a failure of the save machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictedColumnError {
    pub columns: Vec<String>,
}

impl RestrictedColumnError {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl fmt::Display for RestrictedColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot change column(s): {} - locked by Master Course",
            self.columns.join(", ")
        )
    }
}

impl std::error::Error for RestrictedColumnError {}

/// How a save fared against the child content restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionCheck {
    /// Checking did not apply: a new record, an import, a system edit, an
    /// exempt kind, or content that is not a blueprint copy.
    Unrestricted,
    /// Checked, and no locked column was touched.
    Accepted,
}
