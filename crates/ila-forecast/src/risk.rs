// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::kde::gaussian_kde;
use ila_core::{CRITICAL_DEPTH_PCT, IlaError, JobWarning, RiskConfig};
use ila_lineage::{LineageEntry, LineageStatus};
use std::borrow::Cow;

/// Projection horizons, in years, for the critical-count curves.
pub const PROJECTION_HORIZONS_YEARS: [f64; 4] = [5.0, 10.0, 15.0, 20.0];

const EMERGENCE_WEIGHT: f64 = 0.4;
const GROWTH_WEIGHT: f64 = 0.3;
const PROJECTION_WEIGHT: f64 = 0.3;
/// Width of the fallback proximity bump when too few new anomalies exist
/// for a KDE.
const FALLBACK_BUMP_WIDTH_FT: f64 = 500.0;

/// One contiguous stretch of grid points at or above the risk threshold.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RiskZone {
    pub start_ft: f64,
    pub end_ft: f64,
    pub risk_score: f64,
}

/// Composite forward-looking risk profile along the pipeline.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RiskForecast {
    pub positions_ft: Vec<f64>,
    pub new_anomaly_density: Vec<f64>,
    pub avg_growth_rate: Vec<f64>,
    pub avg_growth_rate_norm: Vec<f64>,
    pub critical_count_5yr: Vec<usize>,
    pub critical_count_10yr: Vec<usize>,
    pub critical_count_15yr: Vec<usize>,
    pub critical_count_20yr: Vec<usize>,
    pub composite_risk_score: Vec<f64>,
    pub high_risk_zones: Vec<RiskZone>,
}

/// Normalizes a curve to [0, 1] by its maximum; an all-zero curve stays
/// zero.
fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().fold(0.0f64, |acc, &v| acc.max(v));
    if max > 0.0 {
        values.iter().map(|&v| v / max).collect()
    } else {
        vec![0.0; values.len()]
    }
}

/// Emergence density over the grid from new-anomaly positions.
fn emergence_density(new_positions: &[f64], grid: &[f64]) -> Vec<f64> {
    if new_positions.is_empty() {
        return vec![0.0; grid.len()];
    }

    let density = if new_positions.len() >= 3 {
        gaussian_kde(new_positions, grid)
    } else {
        None
    };
    let raw = density.unwrap_or_else(|| {
        // Too few (or coincident) emergence points for a KDE: one Gaussian
        // bump centered at their mean.
        let mean = new_positions.iter().sum::<f64>() / new_positions.len() as f64;
        grid.iter()
            .map(|&x| {
                let z = (x - mean) / FALLBACK_BUMP_WIDTH_FT;
                (-0.5 * z * z).exp()
            })
            .collect()
    });
    normalize_by_max(&raw)
}

/// Forecasts composite risk along the pipeline from the fused lineage.
///
/// Degenerate geometry (no usable positions, or every position identical)
/// yields an empty forecast plus a warning instead of an error.
pub fn compute_risk(
    entries: &[LineageEntry],
    config: &RiskConfig,
) -> Result<(RiskForecast, Option<JobWarning>), IlaError> {
    config.validate()?;

    let mut all_positions = Vec::new();
    let mut new_positions = Vec::new();
    // (position, annual rate %, current depth %) per matched entry.
    let mut growth_points: Vec<(f64, f64, f64)> = Vec::new();

    for entry in entries {
        let Some((record, position)) = entry.latest_with_position() else {
            continue;
        };
        all_positions.push(position);

        match entry.status {
            LineageStatus::NewY1 | LineageStatus::NewY2 => new_positions.push(position),
            LineageStatus::Matched => {
                if let Some(rate) = entry
                    .latest_growth()
                    .and_then(|growth| growth.annual_growth_rate_pct)
                {
                    growth_points.push((position, rate, record.depth_pct.unwrap_or(0.0)));
                }
            }
            LineageStatus::Missing => {}
        }
    }

    if all_positions.is_empty() {
        return Ok((RiskForecast::default(), None));
    }

    let min_pos = all_positions
        .iter()
        .fold(f64::INFINITY, |acc, &p| acc.min(p));
    let max_pos = all_positions
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &p| acc.max(p));
    if min_pos == max_pos {
        return Ok((
            RiskForecast::default(),
            Some(JobWarning::NumericDegeneracy {
                component: Cow::Borrowed("risk forecast"),
            }),
        ));
    }

    let mut grid = Vec::new();
    let mut x = min_pos;
    while x <= max_pos {
        grid.push(x);
        x += config.grid_step_ft;
    }

    let density = emergence_density(&new_positions, &grid);

    let mut avg_growth_rate = vec![0.0; grid.len()];
    for (i, &x) in grid.iter().enumerate() {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &(position, rate, _) in &growth_points {
            if (position - x).abs() <= config.window_ft {
                sum += rate;
                count += 1;
            }
        }
        if count > 0 {
            avg_growth_rate[i] = sum / count as f64;
        }
    }
    let avg_growth_rate_norm = normalize_by_max(&avg_growth_rate);

    let mut critical_counts: Vec<Vec<usize>> = PROJECTION_HORIZONS_YEARS
        .iter()
        .map(|_| vec![0usize; grid.len()])
        .collect();
    for (h, &horizon) in PROJECTION_HORIZONS_YEARS.iter().enumerate() {
        for (i, &x) in grid.iter().enumerate() {
            critical_counts[h][i] = growth_points
                .iter()
                .filter(|&&(position, rate, depth)| {
                    (position - x).abs() <= config.window_ft
                        && depth + rate * horizon >= CRITICAL_DEPTH_PCT
                })
                .count();
        }
    }

    let projection_curve: Vec<f64> = critical_counts[3].iter().map(|&c| c as f64).collect();
    let projection_norm = normalize_by_max(&projection_curve);

    let composite_risk_score: Vec<f64> = (0..grid.len())
        .map(|i| {
            (EMERGENCE_WEIGHT * density[i]
                + GROWTH_WEIGHT * avg_growth_rate_norm[i]
                + PROJECTION_WEIGHT * projection_norm[i])
                .clamp(0.0, 1.0)
        })
        .collect();

    let mut high_risk_zones = Vec::new();
    let mut zone_start: Option<usize> = None;
    for (i, &score) in composite_risk_score.iter().enumerate() {
        if score >= config.risk_threshold {
            zone_start.get_or_insert(i);
        } else if let Some(start) = zone_start.take() {
            high_risk_zones.push(zone(&grid, &composite_risk_score, start, i - 1));
        }
    }
    if let Some(start) = zone_start {
        high_risk_zones.push(zone(
            &grid,
            &composite_risk_score,
            start,
            composite_risk_score.len() - 1,
        ));
    }

    let mut counts = critical_counts.into_iter();
    let forecast = RiskForecast {
        positions_ft: grid,
        new_anomaly_density: density,
        avg_growth_rate,
        avg_growth_rate_norm,
        critical_count_5yr: counts.next().unwrap_or_default(),
        critical_count_10yr: counts.next().unwrap_or_default(),
        critical_count_15yr: counts.next().unwrap_or_default(),
        critical_count_20yr: counts.next().unwrap_or_default(),
        composite_risk_score,
        high_risk_zones,
    };
    Ok((forecast, None))
}

fn zone(grid: &[f64], scores: &[f64], start: usize, end: usize) -> RiskZone {
    let risk_score = scores[start..=end]
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &s| acc.max(s));
    RiskZone {
        start_ft: grid[start],
        end_ft: grid[end],
        risk_score,
    }
}
