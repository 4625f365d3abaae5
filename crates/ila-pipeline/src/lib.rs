// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_align::{DriftCorrection, Match, correct_run, match_anomalies, weld_positions};
use ila_core::{
    CanonicalRecord, Diagnostics, IlaError, JobContext, JobWarning, RunInput,
};
use ila_forecast::{ClusterAnalysis, RiskForecast, compute_clusters, compute_risk};
use ila_lineage::{LineageEntry, LineageStatus, assemble_lineage};
use ila_normalize::{NormalizedRun, normalize_run};
use std::time::Instant;

/// One counter per run, earliest to latest.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub y0: usize,
    pub y1: usize,
    pub y2: usize,
}

/// Headline counters for one completed job.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobSummary {
    pub run_count: usize,
    pub total_anomalies: RunTotals,
    pub total_girth_welds: RunTotals,
    pub matched_count: usize,
    pub new_y1_count: usize,
    pub new_y2_count: usize,
    pub missing_count: usize,
    /// Mean first-present pair score over matched entries; a present
    /// zero score participates.
    pub avg_match_score: f64,
    /// Mean of the strictly positive annual depth growth rates.
    pub avg_growth_rate_pct: f64,
    pub max_odometer_shift_ft: f64,
}

/// Complete value-object result of one alignment job.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct JobResult {
    pub summary: JobSummary,
    pub lineage: Vec<LineageEntry>,
    pub corrections_y1: Vec<DriftCorrection>,
    pub corrections_y2: Vec<DriftCorrection>,
    pub clusters: ClusterAnalysis,
    pub risk: RiskForecast,
    pub diagnostics: Diagnostics,
}

fn anomaly_subset(run: &NormalizedRun) -> Vec<CanonicalRecord> {
    run.anomalies().cloned().collect()
}

fn note_normalization(notes: &mut Vec<String>, run: &NormalizedRun) {
    notes.push(format!(
        "run {}: {} rows, {} girth welds, {} anomalies",
        run.year,
        run.records.len(),
        run.girth_weld_count(),
        run.anomaly_count()
    ));
    if run.dropped_clock_values > 0 {
        notes.push(format!(
            "run {}: dropped {} unparseable clock value(s)",
            run.year, run.dropped_clock_values
        ));
    }
    if run.dropped_odometer_values > 0 {
        notes.push(format!(
            "run {}: dropped {} unparseable odometer value(s)",
            run.year, run.dropped_odometer_values
        ));
    }
}

/// Applies drift correction for one target run against the baseline welds,
/// producing correction records and, when anchors are short, a warning.
fn correct_target_run(
    baseline_welds: &[f64],
    target: &mut NormalizedRun,
    warnings: &mut Vec<JobWarning>,
) -> Result<Vec<DriftCorrection>, IlaError> {
    let target_welds = weld_positions(target.girth_welds());
    let outcome = correct_run(baseline_welds, &target_welds, &mut target.records)?;
    if !outcome.applied {
        warnings.push(JobWarning::InsufficientAnchors {
            run_year: target.year,
            anchor_count: baseline_welds.len().min(target_welds.len()),
        });
    }
    Ok(outcome.corrections)
}

/// Runs the three pair-passes. They share no mutable state, so the rayon
/// build fans them out; windows inside one pass always stay sequential.
#[allow(clippy::type_complexity)]
fn run_pair_passes(
    anomalies_y0: &[CanonicalRecord],
    anomalies_y1: &[CanonicalRecord],
    anomalies_y2: &[CanonicalRecord],
    ctx: &JobContext<'_>,
) -> Result<(Vec<Match>, Vec<Match>, Vec<Match>), IlaError> {
    let matching = &ctx.config.matching;

    #[cfg(feature = "rayon")]
    {
        let (m01, (m12, m02)) = rayon::join(
            || match_anomalies(anomalies_y0, anomalies_y1, matching, ctx),
            || {
                rayon::join(
                    || match_anomalies(anomalies_y1, anomalies_y2, matching, ctx),
                    || match_anomalies(anomalies_y0, anomalies_y2, matching, ctx),
                )
            },
        );
        Ok((m01?, m12?, m02?))
    }

    #[cfg(not(feature = "rayon"))]
    {
        let m01 = match_anomalies(anomalies_y0, anomalies_y1, matching, ctx)?;
        let m12 = match_anomalies(anomalies_y1, anomalies_y2, matching, ctx)?;
        let m02 = match_anomalies(anomalies_y0, anomalies_y2, matching, ctx)?;
        Ok((m01, m12, m02))
    }
}

fn summarize(
    runs: [&NormalizedRun; 3],
    lineage: &[LineageEntry],
    corrections_y1: &[DriftCorrection],
    corrections_y2: &[DriftCorrection],
) -> JobSummary {
    let mut matched_count = 0usize;
    let mut new_y1_count = 0usize;
    let mut new_y2_count = 0usize;
    let mut missing_count = 0usize;
    for entry in lineage {
        match entry.status {
            LineageStatus::Matched => matched_count += 1,
            LineageStatus::NewY1 => new_y1_count += 1,
            LineageStatus::NewY2 => new_y2_count += 1,
            LineageStatus::Missing => missing_count += 1,
        }
    }

    let matched_scores: Vec<f64> = lineage
        .iter()
        .filter(|entry| entry.status == LineageStatus::Matched)
        .filter_map(LineageEntry::primary_score)
        .collect();
    let avg_match_score = if matched_scores.is_empty() {
        0.0
    } else {
        matched_scores.iter().sum::<f64>() / matched_scores.len() as f64
    };

    let positive_rates: Vec<f64> = lineage
        .iter()
        .filter(|entry| entry.status == LineageStatus::Matched)
        .filter_map(|entry| entry.latest_growth())
        .filter_map(|growth| growth.annual_growth_rate_pct)
        .filter(|&rate| rate > 0.0)
        .collect();
    let avg_growth_rate_pct = if positive_rates.is_empty() {
        0.0
    } else {
        positive_rates.iter().sum::<f64>() / positive_rates.len() as f64
    };

    let max_odometer_shift_ft = corrections_y1
        .iter()
        .chain(corrections_y2.iter())
        .map(|c| c.shift_ft.abs())
        .fold(0.0f64, f64::max);

    JobSummary {
        run_count: runs.len(),
        total_anomalies: RunTotals {
            y0: runs[0].anomaly_count(),
            y1: runs[1].anomaly_count(),
            y2: runs[2].anomaly_count(),
        },
        total_girth_welds: RunTotals {
            y0: runs[0].girth_weld_count(),
            y1: runs[1].girth_weld_count(),
            y2: runs[2].girth_weld_count(),
        },
        matched_count,
        new_y1_count,
        new_y2_count,
        missing_count,
        avg_match_score,
        avg_growth_rate_pct,
        max_odometer_shift_ft,
    }
}

/// Runs the full alignment pipeline over three surveys of one pipeline.
///
/// `inputs` must be ordered earliest to latest with strictly increasing
/// years. The job either returns a complete result (possibly carrying
/// warnings in its diagnostics) or a single error naming the offending
/// run and field. Cancellation is polled between components and between
/// matcher windows; a cancelled job returns [`IlaError::Cancelled`] and
/// discards partial state.
pub fn run_job(inputs: &[RunInput; 3], ctx: &JobContext<'_>) -> Result<JobResult, IlaError> {
    let started_at = Instant::now();
    ctx.config.validate()?;
    ctx.check_cancelled()?;

    if !(inputs[0].year < inputs[1].year && inputs[1].year < inputs[2].year) {
        return Err(IlaError::invalid_input(format!(
            "run years must be strictly increasing; got {}, {}, {}",
            inputs[0].year, inputs[1].year, inputs[2].year
        )));
    }

    let mut notes = Vec::new();
    let mut warnings = Vec::new();

    let run_y0 = normalize_run(&inputs[0])?;
    let mut run_y1 = normalize_run(&inputs[1])?;
    let mut run_y2 = normalize_run(&inputs[2])?;
    for run in [&run_y0, &run_y1, &run_y2] {
        note_normalization(&mut notes, run);
    }
    ctx.check_cancelled()?;
    ctx.report_progress(0.2);

    let baseline_welds = weld_positions(run_y0.girth_welds());
    let corrections_y1 = correct_target_run(&baseline_welds, &mut run_y1, &mut warnings)?;
    let corrections_y2 = correct_target_run(&baseline_welds, &mut run_y2, &mut warnings)?;
    ctx.check_cancelled()?;
    ctx.report_progress(0.3);

    let anomalies_y0 = anomaly_subset(&run_y0);
    let anomalies_y1 = anomaly_subset(&run_y1);
    let anomalies_y2 = anomaly_subset(&run_y2);
    for (year, anomalies) in [
        (run_y0.year, &anomalies_y0),
        (run_y1.year, &anomalies_y1),
        (run_y2.year, &anomalies_y2),
    ] {
        if anomalies.is_empty() {
            warnings.push(JobWarning::EmptyRun { run_year: year });
        }
    }

    let (matches_y0_y1, matches_y1_y2, matches_y0_y2) =
        run_pair_passes(&anomalies_y0, &anomalies_y1, &anomalies_y2, ctx)?;
    notes.push(format!(
        "matches: {} (y0-y1), {} (y1-y2), {} (y0-y2)",
        matches_y0_y1.len(),
        matches_y1_y2.len(),
        matches_y0_y2.len()
    ));
    ctx.check_cancelled()?;
    ctx.report_progress(0.7);

    let lineage = assemble_lineage(
        &anomalies_y0,
        &anomalies_y1,
        &anomalies_y2,
        &matches_y0_y1,
        &matches_y1_y2,
        &matches_y0_y2,
    )?;
    ctx.check_cancelled()?;
    ctx.report_progress(0.8);

    let (clusters, cluster_warning) = compute_clusters(&lineage, &ctx.config.cluster)?;
    if let Some(warning) = cluster_warning {
        warnings.push(warning);
    }
    ctx.check_cancelled()?;

    let (risk, risk_warning) = compute_risk(&lineage, &ctx.config.risk)?;
    if let Some(warning) = risk_warning {
        warnings.push(warning);
    }
    ctx.check_cancelled()?;

    let summary = summarize(
        [&run_y0, &run_y1, &run_y2],
        &lineage,
        &corrections_y1,
        &corrections_y2,
    );

    let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.record_scalar("pipeline.lineage_entries", lineage.len() as f64);
    ctx.record_scalar("pipeline.runtime_ms", runtime_ms as f64);
    ctx.report_progress(1.0);

    let diagnostics = Diagnostics {
        runtime_ms: Some(runtime_ms),
        notes,
        warnings,
        ..Diagnostics::default()
    };

    Ok(JobResult {
        summary,
        lineage,
        corrections_y1,
        corrections_y2,
        clusters,
        risk,
        diagnostics,
    })
}
