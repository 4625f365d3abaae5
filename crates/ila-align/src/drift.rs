// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_core::{CanonicalRecord, IlaError};

/// One paired girth-weld anchor between a target run and the baseline.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DriftCorrection {
    pub gw_index: usize,
    pub baseline_ft: f64,
    pub target_ft: f64,
    pub shift_ft: f64,
}

/// Continuous piecewise-linear map from target-run odometer space to
/// baseline odometer space, extrapolating with the slope of the nearest
/// segment beyond the outermost breakpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct PiecewiseLinearMap {
    /// `(target_ft, baseline_ft)` breakpoints, strictly increasing in
    /// target.
    breakpoints: Vec<(f64, f64)>,
}

impl PiecewiseLinearMap {
    /// Builds the map from paired anchors. Requires at least two
    /// breakpoints after collapsing duplicate target positions.
    pub fn new(breakpoints: Vec<(f64, f64)>) -> Result<Self, IlaError> {
        if breakpoints.len() < 2 {
            return Err(IlaError::invalid_input(format!(
                "piecewise linear map needs >= 2 breakpoints; got {}",
                breakpoints.len()
            )));
        }
        for window in breakpoints.windows(2) {
            if window[1].0 <= window[0].0 {
                return Err(IlaError::invalid_input(format!(
                    "breakpoint targets must be strictly increasing; got {} then {}",
                    window[0].0, window[1].0
                )));
            }
        }
        Ok(Self { breakpoints })
    }

    pub fn breakpoints(&self) -> &[(f64, f64)] {
        &self.breakpoints
    }

    /// Maps one target-run position into baseline space.
    pub fn apply(&self, x: f64) -> f64 {
        let first = self.breakpoints[0];
        let last = self.breakpoints[self.breakpoints.len() - 1];

        let (left, right) = if x <= first.0 {
            (first, self.breakpoints[1])
        } else if x >= last.0 {
            (self.breakpoints[self.breakpoints.len() - 2], last)
        } else {
            let upper = self
                .breakpoints
                .partition_point(|&(target, _)| target <= x);
            (self.breakpoints[upper - 1], self.breakpoints[upper])
        };

        let slope = (right.1 - left.1) / (right.0 - left.0);
        left.1 + slope * (x - left.0)
    }
}

/// Sorted, de-nulled girth-weld positions of one run, in raw odometer
/// space.
pub fn weld_positions<'a>(welds: impl Iterator<Item = &'a CanonicalRecord>) -> Vec<f64> {
    let mut positions: Vec<f64> = welds.filter_map(|record| record.odometer_ft).collect();
    positions.sort_by(f64::total_cmp);
    positions
}

/// Result of one drift-correction pass over a target run.
#[derive(Clone, Debug, PartialEq)]
pub struct DriftOutcome {
    /// One record per paired anchor; empty when correction was skipped.
    pub corrections: Vec<DriftCorrection>,
    /// False when fewer than two usable anchors were available.
    pub applied: bool,
}

/// Pairs the first `min(n, m)` welds of both runs by index, fits the
/// piecewise-linear correction, and rewrites `corrected_odometer_ft` on
/// every target record.
///
/// With fewer than two usable anchors the correction is skipped and each
/// record keeps `corrected_odometer_ft == odometer_ft`.
pub fn correct_run(
    baseline_welds: &[f64],
    target_welds: &[f64],
    target_records: &mut [CanonicalRecord],
) -> Result<DriftOutcome, IlaError> {
    let pair_count = baseline_welds.len().min(target_welds.len());
    if pair_count < 2 {
        for record in target_records.iter_mut() {
            record.corrected_odometer_ft = record.odometer_ft;
        }
        return Ok(DriftOutcome {
            corrections: vec![],
            applied: false,
        });
    }

    // Inputs arrive sorted from `weld_positions`; re-sorting here keeps the
    // monotone-by-index pairing honest even for hand-built inputs.
    let mut baseline: Vec<f64> = baseline_welds[..].to_vec();
    let mut target: Vec<f64> = target_welds[..].to_vec();
    baseline.sort_by(f64::total_cmp);
    target.sort_by(f64::total_cmp);

    let corrections: Vec<DriftCorrection> = (0..pair_count)
        .map(|i| DriftCorrection {
            gw_index: i,
            baseline_ft: baseline[i],
            target_ft: target[i],
            shift_ft: baseline[i] - target[i],
        })
        .collect();

    // Duplicate target anchors collapse into one breakpoint whose baseline
    // is the mean of the paired baselines.
    let mut breakpoints: Vec<(f64, f64)> = Vec::with_capacity(pair_count);
    let mut i = 0;
    while i < pair_count {
        let mut j = i;
        let mut baseline_sum = 0.0;
        while j < pair_count && target[j] == target[i] {
            baseline_sum += baseline[j];
            j += 1;
        }
        breakpoints.push((target[i], baseline_sum / (j - i) as f64));
        i = j;
    }

    if breakpoints.len() < 2 {
        for record in target_records.iter_mut() {
            record.corrected_odometer_ft = record.odometer_ft;
        }
        return Ok(DriftOutcome {
            corrections: vec![],
            applied: false,
        });
    }

    let map = PiecewiseLinearMap::new(breakpoints)?;
    for record in target_records.iter_mut() {
        record.corrected_odometer_ft = record.odometer_ft.map(|odo| map.apply(odo));
    }

    Ok(DriftOutcome {
        corrections,
        applied: true,
    })
}

#[cfg(test)]
mod tests {
    use super::{DriftOutcome, PiecewiseLinearMap, correct_run, weld_positions};
    use ila_core::CanonicalRecord;

    fn records_at(year: i32, positions: &[Option<f64>]) -> Vec<CanonicalRecord> {
        positions
            .iter()
            .enumerate()
            .map(|(i, pos)| {
                let mut record = CanonicalRecord::empty(year, i);
                record.odometer_ft = *pos;
                record.corrected_odometer_ft = *pos;
                record
            })
            .collect()
    }

    #[test]
    fn identity_anchors_yield_identity_map() {
        let anchors = vec![(0.0, 0.0), (1000.0, 1000.0)];
        let map = PiecewiseLinearMap::new(anchors).expect("two anchors suffice");
        for x in [-50.0, 0.0, 123.4, 1000.0, 2000.0] {
            assert_eq!(map.apply(x), x);
        }
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let map =
            PiecewiseLinearMap::new(vec![(100.0, 98.0), (200.0, 196.0), (300.0, 297.0)])
                .expect("map should build");
        // Midpoint of the first segment.
        assert!((map.apply(150.0) - 147.0).abs() < 1e-9);
        // Exact breakpoints map exactly.
        assert_eq!(map.apply(200.0), 196.0);
    }

    #[test]
    fn extrapolates_with_endpoint_slopes() {
        let map = PiecewiseLinearMap::new(vec![(100.0, 90.0), (200.0, 200.0)])
            .expect("map should build");
        // Slope 1.1 on both sides of the single segment.
        assert!((map.apply(0.0) - (90.0 - 110.0)).abs() < 1e-9);
        assert!((map.apply(300.0) - 310.0).abs() < 1e-9);
    }

    #[test]
    fn non_increasing_breakpoints_are_rejected() {
        assert!(PiecewiseLinearMap::new(vec![(5.0, 1.0)]).is_err());
        assert!(PiecewiseLinearMap::new(vec![(5.0, 1.0), (5.0, 2.0)]).is_err());
        assert!(PiecewiseLinearMap::new(vec![(5.0, 1.0), (4.0, 2.0)]).is_err());
    }

    #[test]
    fn weld_positions_sorts_and_drops_nulls() {
        let records = records_at(2015, &[Some(300.0), None, Some(100.0), Some(200.0)]);
        let positions = weld_positions(records.iter());
        assert_eq!(positions, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn uniform_shift_is_removed_exactly() {
        let baseline = vec![0.0, 1000.0];
        let target = vec![5.0, 1005.0];
        let mut records = records_at(2015, &[Some(105.0), Some(505.0), None]);

        let outcome =
            correct_run(&baseline, &target, &mut records).expect("correction should succeed");
        assert!(outcome.applied);
        assert_eq!(outcome.corrections.len(), 2);
        assert_eq!(outcome.corrections[0].shift_ft, -5.0);
        assert_eq!(records[0].corrected_odometer_ft, Some(100.0));
        assert_eq!(records[1].corrected_odometer_ft, Some(500.0));
        assert_eq!(records[2].corrected_odometer_ft, None);
    }

    #[test]
    fn correcting_a_run_against_itself_is_identity() {
        let welds = vec![100.0, 200.0, 300.0, 400.0];
        let mut records = records_at(2015, &[Some(150.0), Some(250.0), Some(350.0)]);
        let outcome =
            correct_run(&welds, &welds, &mut records).expect("correction should succeed");
        assert!(outcome.applied);
        for correction in &outcome.corrections {
            assert_eq!(correction.shift_ft, 0.0);
        }
        assert_eq!(records[0].corrected_odometer_ft, Some(150.0));
        assert_eq!(records[1].corrected_odometer_ft, Some(250.0));
        assert_eq!(records[2].corrected_odometer_ft, Some(350.0));
    }

    #[test]
    fn fewer_than_two_anchors_is_a_no_op() {
        let mut records = records_at(2022, &[Some(10.0), Some(20.0)]);
        let outcome = correct_run(&[100.0], &[105.0, 205.0], &mut records)
            .expect("no-op correction should succeed");
        assert_eq!(
            outcome,
            DriftOutcome {
                corrections: vec![],
                applied: false
            }
        );
        assert_eq!(records[0].corrected_odometer_ft, Some(10.0));
        assert_eq!(records[1].corrected_odometer_ft, Some(20.0));
    }

    #[test]
    fn duplicate_target_anchors_collapse_to_mean_baseline() {
        // Target reports the same weld position twice; its breakpoint takes
        // the mean of the paired baselines.
        let baseline = vec![100.0, 110.0, 300.0];
        let target = vec![105.0, 105.0, 305.0];
        let mut records = records_at(2022, &[Some(105.0)]);
        let outcome =
            correct_run(&baseline, &target, &mut records).expect("correction should succeed");
        assert!(outcome.applied);
        assert_eq!(records[0].corrected_odometer_ft, Some(105.0));
        assert_eq!(outcome.corrections.len(), 3);
    }

    #[test]
    fn correction_preserves_position_order() {
        let baseline = vec![0.0, 400.0, 900.0];
        let target = vec![10.0, 430.0, 950.0];
        let mut records = records_at(
            2022,
            &[Some(5.0), Some(100.0), Some(430.0), Some(700.0), Some(1200.0)],
        );
        correct_run(&baseline, &target, &mut records).expect("correction should succeed");
        let corrected: Vec<f64> = records
            .iter()
            .filter_map(|r| r.corrected_odometer_ft)
            .collect();
        for pair in corrected.windows(2) {
            assert!(
                pair[0] <= pair[1],
                "corrected positions must stay ordered: {corrected:?}"
            );
        }
    }
}
