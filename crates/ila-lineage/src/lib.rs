// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod assemble;
pub mod growth;

pub use assemble::{LineageEntry, LineageStatus, PairScore, PerPair, PerRun, assemble_lineage};
pub use growth::{GrowthMetrics, Severity, classify_growth_rate, growth_between};

/// Lineage assembly and growth metrics for the alignment pipeline.
pub fn crate_name() -> &'static str {
    let _ = (ila_core::crate_name(), ila_align::crate_name());
    "ila-lineage"
}
