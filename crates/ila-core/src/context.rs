// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::JobConfig;
use crate::control::CancelToken;
use crate::error::IlaError;
use crate::observability::{ProgressSink, TelemetrySink};

/// Unified execution context threaded through every pipeline component.
pub struct JobContext<'a> {
    pub config: &'a JobConfig,
    pub cancel: Option<&'a CancelToken>,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> JobContext<'a> {
    /// Creates a context with no optional hooks attached.
    pub fn new(config: &'a JobConfig) -> Self {
        Self {
            config,
            cancel: None,
            progress: None,
            telemetry: None,
        }
    }

    /// Sets the optional cancellation token.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets an optional progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets an optional telemetry sink.
    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Returns a cancelled error when cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), IlaError> {
        if self.is_cancelled() {
            return Err(IlaError::cancelled());
        }
        Ok(())
    }

    /// Polls cancellation every `every` iterations; zero means every one.
    pub fn check_cancelled_every(&self, iteration: usize, every: usize) -> Result<(), IlaError> {
        let every = every.max(1);
        if iteration % every != 0 {
            return Ok(());
        }
        self.check_cancelled()
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    /// Emits a scalar telemetry value to the sink, if configured.
    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JobContext;
    use crate::config::JobConfig;
    use crate::control::CancelToken;
    use crate::observability::{ProgressSink, TelemetrySink};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockProgressSink {
        values: Mutex<Vec<f32>>,
    }

    impl ProgressSink for MockProgressSink {
        fn on_progress(&self, fraction: f32) {
            self.values
                .lock()
                .expect("progress mutex should lock")
                .push(fraction);
        }
    }

    #[derive(Default)]
    struct MockTelemetrySink {
        values: Mutex<Vec<(&'static str, f64)>>,
    }

    impl TelemetrySink for MockTelemetrySink {
        fn record_scalar(&self, key: &'static str, value: f64) {
            self.values
                .lock()
                .expect("telemetry mutex should lock")
                .push((key, value));
        }
    }

    #[test]
    fn new_context_has_no_hooks() {
        let config = JobConfig::default();
        let ctx = JobContext::new(&config);
        assert!(ctx.cancel.is_none());
        assert!(ctx.progress.is_none());
        assert!(ctx.telemetry.is_none());
        assert!(!ctx.is_cancelled());
        assert!(ctx.check_cancelled().is_ok());
    }

    #[test]
    fn cancellation_propagates_through_check() {
        let config = JobConfig::default();
        let cancel = CancelToken::new();
        let ctx = JobContext::new(&config).with_cancel(&cancel);

        assert!(ctx.check_cancelled().is_ok());
        cancel.cancel();
        let err = ctx
            .check_cancelled()
            .expect_err("cancelled token should error");
        assert_eq!(err.to_string(), "cancelled");
    }

    #[test]
    fn cadence_polling_skips_off_cycle_iterations() {
        let config = JobConfig::default();
        let cancel = CancelToken::new();
        let ctx = JobContext::new(&config).with_cancel(&cancel);
        cancel.cancel();

        assert!(ctx.check_cancelled_every(1, 4).is_ok());
        assert!(ctx.check_cancelled_every(4, 4).is_err());
        // Zero cadence always polls.
        assert!(ctx.check_cancelled_every(3, 0).is_err());
    }

    #[test]
    fn progress_is_clamped_and_non_finite_dropped() {
        let config = JobConfig::default();
        let progress = MockProgressSink::default();
        let ctx = JobContext::new(&config).with_progress_sink(&progress);

        ctx.report_progress(-0.5);
        ctx.report_progress(0.25);
        ctx.report_progress(2.0);
        ctx.report_progress(f32::NAN);

        let got = progress
            .values
            .lock()
            .expect("progress values should lock")
            .clone();
        assert_eq!(got, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn telemetry_records_key_value_pairs() {
        let config = JobConfig::default();
        let telemetry = MockTelemetrySink::default();
        let ctx = JobContext::new(&config).with_telemetry_sink(&telemetry);

        ctx.record_scalar("matcher.windows", 12.0);
        let got = telemetry
            .values
            .lock()
            .expect("telemetry values should lock")
            .clone();
        assert_eq!(got, vec![("matcher.windows", 12.0)]);
    }
}
