// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod assignment;
pub mod cost;
pub mod drift;
pub mod matcher;

pub use assignment::{CostMatrix, min_cost_assignment};
pub use cost::{CostBreakdown, FeatureClass, GATE_COST, feature_class, feature_cost, pair_cost};
pub use drift::{DriftCorrection, DriftOutcome, PiecewiseLinearMap, correct_run, weld_positions};
pub use matcher::{Match, MatchComponents, match_anomalies};

/// Drift correction and cross-run matching for the alignment pipeline.
pub fn crate_name() -> &'static str {
    let _ = ila_core::crate_name();
    "ila-align"
}
