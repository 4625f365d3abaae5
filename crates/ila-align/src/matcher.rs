// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::assignment::{CostMatrix, min_cost_assignment};
use crate::cost::{FeatureClass, GATE_FILTER, feature_class, pair_cost};
use ila_core::{CanonicalRecord, IlaError, JobContext, MatchConfig};
use std::collections::HashSet;

/// Confidence components reported alongside each match, each in [0, 1].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchComponents {
    pub distance_confidence: f64,
    pub clock_confidence: f64,
    pub feature_confidence: f64,
}

/// One cross-run assignment between two anomaly records.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub a_run_year: i32,
    pub a_row_index: usize,
    pub b_run_year: i32,
    pub b_row_index: usize,
    pub cost: f64,
    /// `max(0, 1 - cost)`.
    pub score: f64,
    pub components: MatchComponents,
    /// True when `cost <= cost_threshold`; lineage assembly ignores
    /// non-accepted matches, which are emitted for auditing only.
    pub accepted: bool,
}

/// Column-oriented view of one side's matchable anomalies. Rows without a
/// usable position are excluded up front.
struct AnomalyColumns {
    run_year: i32,
    row_indices: Vec<usize>,
    positions: Vec<f64>,
    clocks: Vec<Option<f64>>,
    classes: Vec<FeatureClass>,
}

impl AnomalyColumns {
    fn build(records: &[CanonicalRecord]) -> Self {
        let mut columns = Self {
            run_year: records.first().map_or(0, |r| r.run_year),
            row_indices: Vec::with_capacity(records.len()),
            positions: Vec::with_capacity(records.len()),
            clocks: Vec::with_capacity(records.len()),
            classes: Vec::with_capacity(records.len()),
        };
        for record in records {
            let Some(position) = record.position() else {
                continue;
            };
            columns.row_indices.push(record.row_index);
            columns.positions.push(position);
            columns.clocks.push(record.clock_position);
            columns
                .classes
                .push(feature_class(record.feature_description.as_deref()));
        }
        columns
    }

    fn len(&self) -> usize {
        self.row_indices.len()
    }
}

/// Solves one assignment block over the given column indices of each side
/// and converts the solver output into candidate matches.
fn solve_block(
    a: &AnomalyColumns,
    b: &AnomalyColumns,
    idx_a: &[usize],
    idx_b: &[usize],
    config: &MatchConfig,
) -> Result<Vec<Match>, IlaError> {
    if idx_a.is_empty() || idx_b.is_empty() {
        return Ok(vec![]);
    }

    let mut values = Vec::with_capacity(idx_a.len() * idx_b.len());
    for &i in idx_a {
        for &j in idx_b {
            values.push(
                pair_cost(
                    a.positions[i],
                    b.positions[j],
                    a.clocks[i],
                    b.clocks[j],
                    a.classes[i],
                    b.classes[j],
                    config,
                )
                .cost,
            );
        }
    }
    let matrix = CostMatrix::new(idx_a.len(), idx_b.len(), values)?;
    let assignment = min_cost_assignment(&matrix);

    let mut matches = Vec::new();
    for (row, col) in assignment.into_iter().enumerate() {
        let Some(col) = col else {
            continue;
        };
        let i = idx_a[row];
        let j = idx_b[col];
        let breakdown = pair_cost(
            a.positions[i],
            b.positions[j],
            a.clocks[i],
            b.clocks[j],
            a.classes[i],
            b.classes[j],
            config,
        );
        if breakdown.cost >= GATE_FILTER {
            continue;
        }
        matches.push(Match {
            a_run_year: a.run_year,
            a_row_index: a.row_indices[i],
            b_run_year: b.run_year,
            b_row_index: b.row_indices[j],
            cost: breakdown.cost,
            score: (1.0 - breakdown.cost).max(0.0),
            components: MatchComponents {
                distance_confidence: breakdown.distance_confidence,
                clock_confidence: breakdown.clock_confidence,
                feature_confidence: breakdown.feature_confidence,
            },
            accepted: breakdown.cost <= config.cost_threshold,
        });
    }
    Ok(matches)
}

/// Matches two runs' anomaly lists under the weighted cost of §cost.
///
/// Small inputs solve one global assignment. Large inputs are segmented
/// into overlapping position windows processed in ascending order; rows
/// accepted in an earlier window are excluded from later ones, which is
/// why window order matters and windows are never parallelized.
pub fn match_anomalies(
    a_records: &[CanonicalRecord],
    b_records: &[CanonicalRecord],
    config: &MatchConfig,
    ctx: &JobContext<'_>,
) -> Result<Vec<Match>, IlaError> {
    config.validate()?;
    ctx.check_cancelled()?;

    let a = AnomalyColumns::build(a_records);
    let b = AnomalyColumns::build(b_records);
    if a.len() == 0 || b.len() == 0 {
        return Ok(vec![]);
    }

    let all_a: Vec<usize> = (0..a.len()).collect();
    let all_b: Vec<usize> = (0..b.len()).collect();

    if a.len() * b.len() <= config.segmentation_threshold {
        return solve_block(&a, &b, &all_a, &all_b, config);
    }

    let min_pos = a
        .positions
        .iter()
        .chain(b.positions.iter())
        .fold(f64::INFINITY, |acc, &p| acc.min(p))
        - 1.0;
    let max_pos = a
        .positions
        .iter()
        .chain(b.positions.iter())
        .fold(f64::NEG_INFINITY, |acc, &p| acc.max(p))
        + 1.0;

    let mut all_matches = Vec::new();
    let mut matched_a: HashSet<usize> = HashSet::new();
    let mut matched_b: HashSet<usize> = HashSet::new();

    let mut window_start = min_pos;
    let mut window_index = 0usize;
    while window_start < max_pos {
        ctx.check_cancelled_every(window_index, 1)?;
        let window_end = window_start + config.window_size_ft;

        let in_window = |positions: &[f64], matched: &HashSet<usize>| -> Vec<usize> {
            positions
                .iter()
                .enumerate()
                .filter(|&(i, &p)| p >= window_start && p < window_end && !matched.contains(&i))
                .map(|(i, _)| i)
                .collect()
        };
        let idx_a = in_window(&a.positions, &matched_a);
        let idx_b = in_window(&b.positions, &matched_b);

        for candidate in solve_block(&a, &b, &idx_a, &idx_b, config)? {
            // Map the candidate's row indices back to column positions to
            // maintain the exclusion sets.
            let col_a = idx_a
                .iter()
                .copied()
                .find(|&i| a.row_indices[i] == candidate.a_row_index)
                .ok_or_else(|| {
                    IlaError::internal_invariant("window match references an unknown a-row")
                })?;
            let col_b = idx_b
                .iter()
                .copied()
                .find(|&i| b.row_indices[i] == candidate.b_row_index)
                .ok_or_else(|| {
                    IlaError::internal_invariant("window match references an unknown b-row")
                })?;
            if matched_a.contains(&col_a) || matched_b.contains(&col_b) {
                continue;
            }
            if candidate.accepted {
                matched_a.insert(col_a);
                matched_b.insert(col_b);
            }
            all_matches.push(candidate);
        }

        window_start += config.window_step_ft;
        window_index += 1;
    }

    ctx.record_scalar("matcher.windows", window_index as f64);
    Ok(all_matches)
}
