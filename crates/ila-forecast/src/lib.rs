// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod cluster;
pub mod kde;
pub mod risk;

pub use cluster::{ClusterAnalysis, ClusterZone, compute_clusters};
pub use kde::{gaussian_kde, silverman_bandwidth};
pub use risk::{PROJECTION_HORIZONS_YEARS, RiskForecast, RiskZone, compute_risk};

/// Density clustering and risk forecasting over the fused lineage.
pub fn crate_name() -> &'static str {
    let _ = (ila_core::crate_name(), ila_lineage::crate_name());
    "ila-forecast"
}
