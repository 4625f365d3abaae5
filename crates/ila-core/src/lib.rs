// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod context;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod observability;
pub mod record;

pub use clock::{clock_distance, normalize_clock, parse_clock_text, wrap_clock};
pub use config::{ClusterConfig, JobConfig, MatchConfig, RiskConfig};
pub use context::JobContext;
pub use control::CancelToken;
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, JobWarning};
pub use error::IlaError;
pub use observability::{ProgressSink, TelemetrySink};
pub use record::{CanonicalRecord, FeatureKind, RawRow, RawValue, RunInput};

/// Depth (% of wall thickness) at which a defect is considered critical.
pub const CRITICAL_DEPTH_PCT: f64 = 80.0;

/// Core shared types for the ILI lineage alignment pipeline.
pub fn crate_name() -> &'static str {
    "ila-core"
}
