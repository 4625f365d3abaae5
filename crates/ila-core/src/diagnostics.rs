// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::fmt;

/// Diagnostics schema version for alignment-job metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Recoverable conditions attached to a completed job.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "kind", rename_all = "snake_case")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobWarning {
    /// Fewer than two girth welds in a run; drift correction was skipped.
    InsufficientAnchors { run_year: i32, anchor_count: usize },
    /// A run contributed zero anomalies to matching.
    EmptyRun { run_year: i32 },
    /// Degenerate geometry made a downstream output empty.
    NumericDegeneracy { component: Cow<'static, str> },
}

impl fmt::Display for JobWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientAnchors {
                run_year,
                anchor_count,
            } => write!(
                f,
                "run {run_year} has {anchor_count} girth weld(s); odometer correction skipped"
            ),
            Self::EmptyRun { run_year } => {
                write!(f, "run {run_year} has zero anomalies")
            }
            Self::NumericDegeneracy { component } => {
                write!(f, "{component} skipped: anomaly positions are degenerate")
            }
        }
    }
}

/// Structured diagnostics captured from one job execution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<JobWarning>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, JobWarning};
    use std::borrow::Cow;

    #[test]
    fn default_diagnostics_set_schema_and_engine_version() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.schema_version, DIAGNOSTICS_SCHEMA_VERSION);
        assert_eq!(
            diagnostics.engine_version,
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        assert!(diagnostics.runtime_ms.is_none());
        assert!(diagnostics.notes.is_empty());
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn warning_display_names_the_run() {
        let warning = JobWarning::InsufficientAnchors {
            run_year: 2015,
            anchor_count: 1,
        };
        assert_eq!(
            warning.to_string(),
            "run 2015 has 1 girth weld(s); odometer correction skipped"
        );
        assert_eq!(
            JobWarning::EmptyRun { run_year: 2022 }.to_string(),
            "run 2022 has zero anomalies"
        );
        assert_eq!(
            JobWarning::NumericDegeneracy {
                component: Cow::Borrowed("cluster analysis"),
            }
            .to_string(),
            "cluster analysis skipped: anomaly positions are degenerate"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn warning_serde_tags_by_kind() {
        let warning = JobWarning::EmptyRun { run_year: 2015 };
        let encoded = serde_json::to_value(&warning).expect("warning should serialize");
        assert_eq!(encoded["kind"], "empty_run");
        assert_eq!(encoded["run_year"], 2015);
        let decoded: JobWarning =
            serde_json::from_value(encoded).expect("warning should deserialize");
        assert_eq!(decoded, warning);
    }
}
