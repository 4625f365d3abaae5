// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_core::{CRITICAL_DEPTH_PCT, CanonicalRecord};

const CRITICAL_RATE_PCT_PER_YEAR: f64 = 10.0;
const MODERATE_RATE_PCT_PER_YEAR: f64 = 5.0;

/// Growth observed between two matched observations of one defect.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthMetrics {
    pub depth_growth_pct: Option<f64>,
    pub depth_growth_in: Option<f64>,
    pub annual_growth_rate_pct: Option<f64>,
    pub annual_growth_rate_in: Option<f64>,
    pub length_growth_in: Option<f64>,
    pub annual_length_growth_in: Option<f64>,
    pub width_growth_in: Option<f64>,
    pub annual_width_growth_in: Option<f64>,
    /// Projected years until 80% wall loss at the current rate; present
    /// only for positive rates on defects still under the critical depth.
    pub time_to_critical_years: Option<f64>,
}

/// Severity classification from the most recent annual depth growth rate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Moderate,
    Low,
    #[default]
    Unknown,
}

/// Thresholds are inclusive: exactly 10 %/yr is critical, exactly 5 %/yr
/// is moderate.
pub fn classify_growth_rate(annual_growth_rate_pct: Option<f64>) -> Severity {
    let Some(rate) = annual_growth_rate_pct else {
        return Severity::Unknown;
    };
    if rate >= CRITICAL_RATE_PCT_PER_YEAR {
        Severity::Critical
    } else if rate >= MODERATE_RATE_PCT_PER_YEAR {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

/// Computes growth between an earlier and a later observation of the same
/// defect. Missing fields yield nulls, never errors; a non-positive year
/// span yields an all-null result.
pub fn growth_between(earlier: &CanonicalRecord, later: &CanonicalRecord) -> GrowthMetrics {
    let mut metrics = GrowthMetrics::default();
    let years = f64::from(later.run_year - earlier.run_year);
    if years <= 0.0 {
        return metrics;
    }

    if let (Some(depth_a), Some(depth_b)) = (earlier.depth_pct, later.depth_pct) {
        let growth_pct = depth_b - depth_a;
        let annual_pct = growth_pct / years;
        metrics.depth_growth_pct = Some(growth_pct);
        metrics.annual_growth_rate_pct = Some(annual_pct);

        // Wall thickness from the later run when available; the earlier
        // run's value is the fallback for inch conversions.
        if let Some(wall_thickness) = later.wall_thickness_in.or(earlier.wall_thickness_in)
            && wall_thickness > 0.0
        {
            let growth_in = growth_pct / 100.0 * wall_thickness;
            metrics.depth_growth_in = Some(growth_in);
            metrics.annual_growth_rate_in = Some(growth_in / years);
        }

        if annual_pct > 0.0 && depth_b < CRITICAL_DEPTH_PCT {
            metrics.time_to_critical_years = Some((CRITICAL_DEPTH_PCT - depth_b) / annual_pct);
        }
    }

    if let (Some(length_a), Some(length_b)) = (earlier.length_in, later.length_in) {
        let growth = length_b - length_a;
        metrics.length_growth_in = Some(growth);
        metrics.annual_length_growth_in = Some(growth / years);
    }

    if let (Some(width_a), Some(width_b)) = (earlier.width_in, later.width_in) {
        let growth = width_b - width_a;
        metrics.width_growth_in = Some(growth);
        metrics.annual_width_growth_in = Some(growth / years);
    }

    metrics
}
