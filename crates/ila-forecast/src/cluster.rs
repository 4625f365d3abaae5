// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_core::{ClusterConfig, IlaError, JobWarning};
use ila_lineage::{LineageEntry, Severity};
use std::borrow::Cow;

/// One contiguous run of hot bins.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterZone {
    pub id: usize,
    pub start_ft: f64,
    pub end_ft: f64,
    pub anomaly_count: usize,
    pub avg_depth_pct: f64,
    pub dominant_severity: Severity,
}

/// Histogram of anomaly positions plus the detected high-density zones.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterAnalysis {
    pub bin_centers_ft: Vec<f64>,
    pub anomaly_counts: Vec<usize>,
    pub mean_density: f64,
    pub threshold: f64,
    pub clusters: Vec<ClusterZone>,
}

/// Severity mode with ties broken critical > moderate > low > unknown.
fn dominant_severity(severities: &[Severity]) -> Severity {
    let count_of = |severity: Severity| severities.iter().filter(|&&s| s == severity).count();
    let mut best = Severity::Unknown;
    let mut best_count = 0usize;
    for candidate in [
        Severity::Critical,
        Severity::Moderate,
        Severity::Low,
        Severity::Unknown,
    ] {
        let count = count_of(candidate);
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Histograms the lineage's latest positions and extracts contiguous bins
/// whose count reaches `threshold_factor` times the mean. A single cold
/// bin between two hot runs keeps them separate clusters.
///
/// Degenerate geometry (no positions, or every position identical) yields
/// an empty analysis plus a warning instead of an error.
pub fn compute_clusters(
    entries: &[LineageEntry],
    config: &ClusterConfig,
) -> Result<(ClusterAnalysis, Option<JobWarning>), IlaError> {
    config.validate()?;

    let mut positions = Vec::new();
    let mut depths = Vec::new();
    let mut severities = Vec::new();
    for entry in entries {
        let Some((record, position)) = entry.latest_with_position() else {
            continue;
        };
        positions.push(position);
        depths.push(record.depth_pct.unwrap_or(0.0));
        severities.push(entry.severity);
    }

    if positions.is_empty() {
        return Ok((ClusterAnalysis::default(), None));
    }

    let min_pos = positions.iter().fold(f64::INFINITY, |acc, &p| acc.min(p));
    let max_pos = positions
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &p| acc.max(p));
    if min_pos == max_pos {
        return Ok((
            ClusterAnalysis::default(),
            Some(JobWarning::NumericDegeneracy {
                component: Cow::Borrowed("cluster analysis"),
            }),
        ));
    }

    let width = config.bin_width_ft;
    let start = (min_pos / width).floor() * width;
    let end = (max_pos / width).ceil() * width;
    let bin_count = ((end - start) / width).round() as usize;
    if bin_count == 0 {
        return Err(IlaError::internal_invariant(
            "cluster histogram collapsed to zero bins on a non-degenerate range",
        ));
    }

    let mut counts = vec![0usize; bin_count];
    let mut bin_of = Vec::with_capacity(positions.len());
    for &position in &positions {
        let bin = (((position - start) / width).floor() as usize).min(bin_count - 1);
        counts[bin] += 1;
        bin_of.push(bin);
    }

    let mean_density = counts.iter().sum::<usize>() as f64 / bin_count as f64;
    let threshold = config.threshold_factor * mean_density;
    let bin_centers_ft: Vec<f64> = (0..bin_count)
        .map(|i| start + width * (i as f64 + 0.5))
        .collect();

    let mut clusters = Vec::new();
    let mut bin = 0usize;
    while bin < bin_count {
        if (counts[bin] as f64) < threshold {
            bin += 1;
            continue;
        }
        let first_hot = bin;
        while bin < bin_count && counts[bin] as f64 >= threshold {
            bin += 1;
        }
        let last_hot = bin - 1;

        let member_indices: Vec<usize> = (0..positions.len())
            .filter(|&i| bin_of[i] >= first_hot && bin_of[i] <= last_hot)
            .collect();
        let anomaly_count = counts[first_hot..=last_hot].iter().sum();
        let avg_depth_pct = if member_indices.is_empty() {
            0.0
        } else {
            member_indices.iter().map(|&i| depths[i]).sum::<f64>() / member_indices.len() as f64
        };
        let member_severities: Vec<Severity> =
            member_indices.iter().map(|&i| severities[i]).collect();

        clusters.push(ClusterZone {
            id: clusters.len(),
            start_ft: start + width * first_hot as f64,
            end_ft: start + width * (last_hot + 1) as f64,
            anomaly_count,
            avg_depth_pct,
            dominant_severity: dominant_severity(&member_severities),
        });
    }

    Ok((
        ClusterAnalysis {
            bin_centers_ft,
            anomaly_counts: counts,
            mean_density,
            threshold,
            clusters,
        },
        None,
    ))
}
