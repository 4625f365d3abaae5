// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Receives clamped progress fractions in [0, 1] as a job advances.
pub trait ProgressSink: Sync {
    fn on_progress(&self, fraction: f32);
}

/// Receives named scalar measurements (counts, runtimes) from components.
pub trait TelemetrySink: Sync {
    fn record_scalar(&self, key: &'static str, value: f64);
}
