// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Error kinds surfaced by the alignment pipeline.
///
/// Warnings (insufficient anchors, empty runs, degenerate geometry) are not
/// errors; they travel in [`crate::Diagnostics`] and the job still returns a
/// result.
#[derive(Debug, thiserror::Error)]
pub enum IlaError {
    /// A run's row set is missing a mandatory canonical header, or a
    /// mandatory column is entirely null. The job cannot continue.
    #[error("schema error in run {run_year}, field `{field}`: {detail}")]
    Schema {
        run_year: i32,
        field: &'static str,
        detail: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("numerical issue: {0}")]
    NumericalIssue(String),

    #[error("cancelled")]
    Cancelled,

    /// Bug-class assertion failure; propagates to the caller untouched.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl IlaError {
    pub fn schema(run_year: i32, field: &'static str, detail: impl Into<String>) -> Self {
        Self::Schema {
            run_year,
            field,
            detail: detail.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    pub fn internal_invariant(message: impl Into<String>) -> Self {
        Self::InternalInvariant(message.into())
    }
}
