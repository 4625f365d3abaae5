// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod classify;
pub mod header;

pub use classify::classify_feature;
pub use header::{HeaderTarget, normalize_header, resolve_header};

use ila_core::{CanonicalRecord, FeatureKind, IlaError, RunInput, normalize_clock};

/// One run after schema normalization.
///
/// Records keep the stable `row_index` assigned here; every later pair
/// index keys on it.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRun {
    pub year: i32,
    pub records: Vec<CanonicalRecord>,
    /// Non-null clock cells that failed to parse and were dropped.
    pub dropped_clock_values: usize,
    /// Non-null odometer cells that failed to parse and were dropped.
    pub dropped_odometer_values: usize,
}

impl NormalizedRun {
    pub fn girth_welds(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records
            .iter()
            .filter(|r| r.feature_kind == FeatureKind::GirthWeld)
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records
            .iter()
            .filter(|r| r.feature_kind == FeatureKind::Anomaly)
    }

    pub fn girth_weld_count(&self) -> usize {
        self.girth_welds().count()
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies().count()
    }
}

/// Maps a legacy "internal" marker to the canonical ID/OD vocabulary.
fn infer_id_od(raw: &str) -> Option<&'static str> {
    match raw.trim().to_uppercase().as_str() {
        "I" | "ID" | "INTERNAL" | "YES" | "TRUE" => Some("ID"),
        "O" | "OD" | "EXTERNAL" | "NO" | "FALSE" => Some("OD"),
        _ => None,
    }
}

/// Normalizes one run's row set into canonical records.
///
/// Rows are never dropped: a row with no recognizable distance survives
/// with a null `odometer_ft` and is skipped by geometric computations
/// downstream. Unparseable clock and odometer cells are dropped per cell
/// and counted.
pub fn normalize_run(input: &RunInput) -> Result<NormalizedRun, IlaError> {
    let year = input.year;
    let mut records = Vec::with_capacity(input.rows.len());
    let mut dropped_clock_values = 0usize;
    let mut dropped_odometer_values = 0usize;
    let mut saw_odometer_header = false;
    let mut saw_description_header = false;

    for (row_index, row) in input.rows.iter().enumerate() {
        let mut record = CanonicalRecord::empty(year, row_index);
        let mut inferred_id_od: Option<&'static str> = None;

        for header in row.headers() {
            let Some(target) = resolve_header(header) else {
                continue;
            };
            let value = row
                .get(header)
                .ok_or_else(|| IlaError::internal_invariant("row header vanished mid-scan"))?;

            match target {
                HeaderTarget::Canonical(canonical) => match canonical {
                    "odometer_ft" => {
                        saw_odometer_header = true;
                        match value.as_f64() {
                            Some(v) => record.odometer_ft = Some(v),
                            None if value.is_null() => {}
                            None => dropped_odometer_values += 1,
                        }
                    }
                    "wall_thickness_in" => record.wall_thickness_in = value.as_f64(),
                    "feature_description" => {
                        saw_description_header = true;
                        record.feature_description = value.as_text().map(str::to_string);
                    }
                    "clock_raw" => match normalize_clock(value) {
                        Some(clock) => record.clock_position = Some(clock),
                        None if value.is_null() => {}
                        None => dropped_clock_values += 1,
                    },
                    "depth_pct" => record.depth_pct = value.as_f64(),
                    "depth_in" => record.depth_in = value.as_f64(),
                    "length_in" => record.length_in = value.as_f64(),
                    "width_in" => record.width_in = value.as_f64(),
                    "joint_number" => record.joint_number = value.as_f64(),
                    "joint_length_ft" => record.joint_length_ft = value.as_f64(),
                    "id_od" => record.id_od = value.as_text().map(str::to_string),
                    "id_od_raw" => {
                        inferred_id_od = value.as_text().and_then(infer_id_od);
                    }
                    "erf" => record.erf = value.as_f64(),
                    "rpr" => record.rpr = value.as_f64(),
                    "dist_to_us_weld_ft" => record.dist_to_us_weld_ft = value.as_f64(),
                    "dist_to_ds_weld_ft" => record.dist_to_ds_weld_ft = value.as_f64(),
                    "comments" => record.comments = value.as_text().map(str::to_string),
                    other => {
                        return Err(IlaError::internal_invariant(format!(
                            "unhandled canonical header `{other}`"
                        )));
                    }
                },
                HeaderTarget::Extra(key) => {
                    if !value.is_null() {
                        record.extras.insert(key.to_string(), value.clone());
                    }
                }
            }
        }

        if record.id_od.is_none()
            && let Some(inferred) = inferred_id_od
        {
            record.id_od = Some(inferred.to_string());
        }

        record.feature_kind = classify_feature(record.feature_description.as_deref());

        if record.depth_in.is_none()
            && let (Some(depth_pct), Some(wall_thickness)) =
                (record.depth_pct, record.wall_thickness_in)
        {
            record.depth_in = Some(depth_pct / 100.0 * wall_thickness);
        }

        record.corrected_odometer_ft = record.odometer_ft;
        records.push(record);
    }

    if !saw_odometer_header {
        return Err(IlaError::schema(
            year,
            "odometer_ft",
            "no recognized distance header in this run",
        ));
    }
    if !saw_description_header {
        return Err(IlaError::schema(
            year,
            "feature_description",
            "no recognized feature description header in this run",
        ));
    }
    if records.iter().all(|r| r.odometer_ft.is_none()) {
        return Err(IlaError::schema(
            year,
            "odometer_ft",
            "distance column is entirely null",
        ));
    }

    Ok(NormalizedRun {
        year,
        records,
        dropped_clock_values,
        dropped_odometer_values,
    })
}

#[cfg(test)]
mod tests {
    use super::{infer_id_od, normalize_run};
    use ila_core::{FeatureKind, IlaError, RawRow, RawValue, RunInput};

    fn row(fields: &[(&str, RawValue)]) -> RawRow {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn num(v: f64) -> RawValue {
        RawValue::Number(v)
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn normalizes_oldest_vocabulary() {
        let input = RunInput::new(
            2007,
            vec![
                row(&[
                    ("log dist. [ft]", num(100.0)),
                    ("event", text("Girth Weld")),
                ]),
                row(&[
                    ("log dist. [ft]", num(150.0)),
                    ("event", text("metal loss")),
                    ("depth [%]", num(20.0)),
                    ("t [in]", num(0.375)),
                    ("o'clock", text("9:30")),
                    ("internal", text("yes")),
                ]),
            ],
        );

        let run = normalize_run(&input).expect("normalization should succeed");
        assert_eq!(run.records.len(), 2);
        assert_eq!(run.girth_weld_count(), 1);
        assert_eq!(run.anomaly_count(), 1);

        let anomaly = &run.records[1];
        assert_eq!(anomaly.feature_kind, FeatureKind::Anomaly);
        assert_eq!(anomaly.feature_id, "2007-0001");
        assert_eq!(anomaly.clock_position, Some(9.5));
        assert_eq!(anomaly.id_od.as_deref(), Some("ID"));
        // depth_in derived from depth_pct and wall thickness.
        let depth_in = anomaly.depth_in.expect("depth_in should be derived");
        assert!((depth_in - 0.075).abs() < 1e-12);
        assert_eq!(anomaly.corrected_odometer_ft, Some(150.0));
    }

    #[test]
    fn normalizes_latest_vocabulary_with_time_cells() {
        let input = RunInput::new(
            2022,
            vec![row(&[
                ("ILI Wheel Count [ft.]", num(1204.2)),
                ("Feature Description", text("Metal Loss")),
                ("Metal Loss Depth [%]", num(41.0)),
                ("WT [in]", num(0.375)),
                (
                    "O'clock [hh:mm]",
                    RawValue::Time {
                        hour: 12,
                        minute: 0,
                        second: 0,
                    },
                ),
                ("Mod B31G Psafe [PSI]", num(1432.0)),
            ])],
        );

        let run = normalize_run(&input).expect("normalization should succeed");
        let record = &run.records[0];
        // Hour 12 lives at 0.0 on the canonical ring.
        assert_eq!(record.clock_position, Some(0.0));
        assert_eq!(
            record.extras.get("mod_b31g_psafe"),
            Some(&RawValue::Number(1432.0))
        );
    }

    #[test]
    fn missing_distance_header_is_a_schema_error() {
        let input = RunInput::new(
            2015,
            vec![row(&[("Event Description", text("metal loss"))])],
        );
        let err = normalize_run(&input).expect_err("missing distance header must fail");
        match err {
            IlaError::Schema {
                run_year, field, ..
            } => {
                assert_eq!(run_year, 2015);
                assert_eq!(field, "odometer_ft");
            }
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[test]
    fn all_null_distance_column_is_a_schema_error() {
        let input = RunInput::new(
            2015,
            vec![
                row(&[
                    ("Log Dist. [ft]", RawValue::Null),
                    ("Event Description", text("metal loss")),
                ]),
                row(&[
                    ("Log Dist. [ft]", text("not a number")),
                    ("Event Description", text("dent")),
                ]),
            ],
        );
        let err = normalize_run(&input).expect_err("all-null distance must fail");
        assert!(err.to_string().contains("entirely null"));
    }

    #[test]
    fn unparseable_cells_are_dropped_but_rows_survive() {
        let input = RunInput::new(
            2015,
            vec![
                row(&[
                    ("Log Dist. [ft]", text("garbage")),
                    ("Event Description", text("metal loss")),
                    ("O'clock", text("sideways")),
                ]),
                row(&[
                    ("Log Dist. [ft]", num(10.0)),
                    ("Event Description", text("metal loss")),
                ]),
            ],
        );

        let run = normalize_run(&input).expect("rows with bad cells survive");
        assert_eq!(run.records.len(), 2);
        assert_eq!(run.dropped_odometer_values, 1);
        assert_eq!(run.dropped_clock_values, 1);
        assert!(run.records[0].odometer_ft.is_none());
        assert!(run.records[0].position().is_none());
    }

    #[test]
    fn explicit_id_od_wins_over_inferred() {
        let input = RunInput::new(
            2015,
            vec![row(&[
                ("Log Dist. [ft]", num(5.0)),
                ("Event Description", text("metal loss")),
                ("ID/OD", text("OD")),
            ])],
        );
        let run = normalize_run(&input).expect("normalization should succeed");
        assert_eq!(run.records[0].id_od.as_deref(), Some("OD"));
    }

    #[test]
    fn id_od_inference_vocabulary() {
        assert_eq!(infer_id_od(" internal "), Some("ID"));
        assert_eq!(infer_id_od("I"), Some("ID"));
        assert_eq!(infer_id_od("no"), Some("OD"));
        assert_eq!(infer_id_od("external"), Some("OD"));
        assert_eq!(infer_id_od("maybe"), None);
    }

    #[test]
    fn depth_in_not_derived_without_wall_thickness() {
        let input = RunInput::new(
            2007,
            vec![row(&[
                ("log dist. [ft]", num(5.0)),
                ("event", text("metal loss")),
                ("depth [%]", num(30.0)),
            ])],
        );
        let run = normalize_run(&input).expect("normalization should succeed");
        assert!(run.records[0].depth_in.is_none());
    }

    #[test]
    fn supplied_depth_in_is_not_overwritten() {
        let input = RunInput::new(
            2015,
            vec![row(&[
                ("Log Dist. [ft]", num(5.0)),
                ("Event Description", text("metal loss")),
                ("Depth [%]", num(30.0)),
                ("Depth [in]", num(0.2)),
                ("Wt [in]", num(0.5)),
            ])],
        );
        let run = normalize_run(&input).expect("normalization should succeed");
        assert_eq!(run.records[0].depth_in, Some(0.2));
    }
}
