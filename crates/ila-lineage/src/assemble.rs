// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::growth::{GrowthMetrics, Severity, classify_growth_rate, growth_between};
use ila_align::{Match, MatchComponents};
use ila_core::{CanonicalRecord, IlaError};
use std::collections::{HashMap, HashSet};

/// Match quality carried into a lineage entry.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PairScore {
    pub score: f64,
    pub components: MatchComponents,
}

impl From<&Match> for PairScore {
    fn from(m: &Match) -> Self {
        Self {
            score: m.score,
            components: m.components,
        }
    }
}

/// Per-pair slot over the three run pairings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerPair<T> {
    pub y0_y1: Option<T>,
    pub y1_y2: Option<T>,
    pub y0_y2: Option<T>,
}

/// Per-run observation slots, sparse.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerRun {
    pub y0: Option<CanonicalRecord>,
    pub y1: Option<CanonicalRecord>,
    pub y2: Option<CanonicalRecord>,
}

/// Lifecycle status of one physical defect across the three runs.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineageStatus {
    /// Observed in the earliest run and re-observed at least once.
    Matched,
    /// First observed in the middle run.
    NewY1,
    /// First observed in the latest run.
    NewY2,
    /// Observed in the earliest run and never found again.
    Missing,
}

/// One physical defect's history across the three runs.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LineageEntry {
    pub status: LineageStatus,
    pub per_run: PerRun,
    pub pair_scores: PerPair<PairScore>,
    pub growth: PerPair<GrowthMetrics>,
    pub severity: Severity,
}

impl LineageEntry {
    /// Latest available observation, preferring the most recent run.
    pub fn latest(&self) -> Option<&CanonicalRecord> {
        self.per_run
            .y2
            .as_ref()
            .or(self.per_run.y1.as_ref())
            .or(self.per_run.y0.as_ref())
    }

    /// Latest observation that carries a usable position.
    pub fn latest_with_position(&self) -> Option<(&CanonicalRecord, f64)> {
        let record = self.latest()?;
        record.position().map(|position| (record, position))
    }

    /// Most recent growth interval, first-present over
    /// (Y₁→Y₂, Y₀→Y₂, Y₀→Y₁). A present-but-zero interval is selected.
    pub fn latest_growth(&self) -> Option<&GrowthMetrics> {
        self.growth
            .y1_y2
            .as_ref()
            .or(self.growth.y0_y2.as_ref())
            .or(self.growth.y0_y1.as_ref())
    }

    /// First-present pair score over (Y₀→Y₁, Y₁→Y₂, Y₀→Y₂).
    pub fn primary_score(&self) -> Option<f64> {
        self.pair_scores
            .y0_y1
            .as_ref()
            .or(self.pair_scores.y1_y2.as_ref())
            .or(self.pair_scores.y0_y2.as_ref())
            .map(|pair| pair.score)
    }
}

fn accepted_by_a_row<'a>(matches: &'a [Match]) -> HashMap<usize, &'a Match> {
    matches
        .iter()
        .filter(|m| m.accepted)
        .map(|m| (m.a_row_index, m))
        .collect()
}

fn by_row_index(records: &[CanonicalRecord]) -> HashMap<usize, &CanonicalRecord> {
    records.iter().map(|r| (r.row_index, r)).collect()
}

fn lookup<'a>(
    index: &HashMap<usize, &'a CanonicalRecord>,
    row_index: usize,
    run: &'static str,
) -> Result<&'a CanonicalRecord, IlaError> {
    index.get(&row_index).copied().ok_or_else(|| {
        IlaError::internal_invariant(format!(
            "accepted match references unknown {run} anomaly row {row_index}"
        ))
    })
}

/// Computes growth for every pair of observations present in the chain.
fn fill_growth(per_run: &PerRun) -> PerPair<GrowthMetrics> {
    let mut growth = PerPair::default();
    if let (Some(a), Some(b)) = (&per_run.y0, &per_run.y1) {
        growth.y0_y1 = Some(growth_between(a, b));
    }
    if let (Some(a), Some(b)) = (&per_run.y1, &per_run.y2) {
        growth.y1_y2 = Some(growth_between(a, b));
    }
    if let (Some(a), Some(b)) = (&per_run.y0, &per_run.y2) {
        growth.y0_y2 = Some(growth_between(a, b));
    }
    growth
}

fn finish_entry(
    status: LineageStatus,
    per_run: PerRun,
    pair_scores: PerPair<PairScore>,
) -> LineageEntry {
    let growth = fill_growth(&per_run);
    let severity = {
        let latest = growth
            .y1_y2
            .as_ref()
            .or(growth.y0_y2.as_ref())
            .or(growth.y0_y1.as_ref());
        classify_growth_rate(latest.and_then(|g| g.annual_growth_rate_pct))
    };
    LineageEntry {
        status,
        per_run,
        pair_scores,
        growth,
        severity,
    }
}

/// Fuses the three pairwise match sets into one lineage table.
///
/// Every input anomaly row lands in exactly one entry. Chains start from
/// the earliest run; Y₁ rows untouched by those chains seed `new_y1`
/// entries, and the remaining Y₂ rows are `new_y2`.
pub fn assemble_lineage(
    anomalies_y0: &[CanonicalRecord],
    anomalies_y1: &[CanonicalRecord],
    anomalies_y2: &[CanonicalRecord],
    matches_y0_y1: &[Match],
    matches_y1_y2: &[Match],
    matches_y0_y2: &[Match],
) -> Result<Vec<LineageEntry>, IlaError> {
    let m01 = accepted_by_a_row(matches_y0_y1);
    let m12 = accepted_by_a_row(matches_y1_y2);
    let m02 = accepted_by_a_row(matches_y0_y2);

    let index_y1 = by_row_index(anomalies_y1);
    let index_y2 = by_row_index(anomalies_y2);

    let mut claimed_y1: HashSet<usize> = HashSet::new();
    let mut claimed_y2: HashSet<usize> = HashSet::new();
    let mut entries = Vec::with_capacity(
        anomalies_y0.len() + anomalies_y1.len() + anomalies_y2.len(),
    );

    for record_y0 in anomalies_y0 {
        let mut per_run = PerRun {
            y0: Some(record_y0.clone()),
            ..PerRun::default()
        };
        let mut pair_scores = PerPair::default();

        if let Some(m) = m01.get(&record_y0.row_index) {
            let record_y1 = lookup(&index_y1, m.b_row_index, "middle-run")?;
            if !claimed_y1.insert(record_y1.row_index) {
                return Err(IlaError::internal_invariant(format!(
                    "middle-run anomaly row {} claimed by two chains",
                    record_y1.row_index
                )));
            }
            per_run.y1 = Some(record_y1.clone());
            pair_scores.y0_y1 = Some(PairScore::from(*m));

            if let Some(m2) = m12.get(&record_y1.row_index) {
                let record_y2 = lookup(&index_y2, m2.b_row_index, "latest-run")?;
                if claimed_y2.insert(record_y2.row_index) {
                    per_run.y2 = Some(record_y2.clone());
                    pair_scores.y1_y2 = Some(PairScore::from(*m2));
                }
            }
        } else if let Some(m2) = m02.get(&record_y0.row_index) {
            let record_y2 = lookup(&index_y2, m2.b_row_index, "latest-run")?;
            if claimed_y2.insert(record_y2.row_index) {
                per_run.y2 = Some(record_y2.clone());
                pair_scores.y0_y2 = Some(PairScore::from(*m2));
            }
        }

        let status = if per_run.y1.is_none() && per_run.y2.is_none() {
            LineageStatus::Missing
        } else {
            LineageStatus::Matched
        };
        entries.push(finish_entry(status, per_run, pair_scores));
    }

    for record_y1 in anomalies_y1 {
        if claimed_y1.contains(&record_y1.row_index) {
            continue;
        }
        let mut per_run = PerRun {
            y1: Some(record_y1.clone()),
            ..PerRun::default()
        };
        let mut pair_scores = PerPair::default();

        if let Some(m2) = m12.get(&record_y1.row_index) {
            let record_y2 = lookup(&index_y2, m2.b_row_index, "latest-run")?;
            if claimed_y2.insert(record_y2.row_index) {
                per_run.y2 = Some(record_y2.clone());
                pair_scores.y1_y2 = Some(PairScore::from(*m2));
            }
        }
        entries.push(finish_entry(LineageStatus::NewY1, per_run, pair_scores));
    }

    for record_y2 in anomalies_y2 {
        if claimed_y2.contains(&record_y2.row_index) {
            continue;
        }
        let per_run = PerRun {
            y2: Some(record_y2.clone()),
            ..PerRun::default()
        };
        entries.push(finish_entry(
            LineageStatus::NewY2,
            per_run,
            PerPair::default(),
        ));
    }

    Ok(entries)
}
