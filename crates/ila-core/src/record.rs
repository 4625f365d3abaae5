// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

/// One cell value as delivered by the upstream tabular reader.
///
/// The reader owns file parsing and encoding; the pipeline only ever sees
/// these variants. `Time` covers spreadsheet time-of-day cells, which some
/// vendors use for clock positions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
    Time { hour: u8, minute: u8, second: u8 },
}

impl RawValue {
    /// Numeric view of the cell. Text cells holding a plain number parse;
    /// everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) if v.is_finite() => Some(*v),
            Self::Number(_) | Self::Null | Self::Time { .. } => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
    }

    /// Textual view of the cell; blank text reads as `None`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// One row from one run: an unordered collection of string-keyed cells.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    fields: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: RawValue) {
        self.fields.insert(header.into(), value);
    }

    pub fn get(&self, header: &str) -> Option<&RawValue> {
        self.fields.get(header)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// One run's row set together with its nominal survey year.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunInput {
    pub year: i32,
    pub rows: Vec<RawRow>,
}

impl RunInput {
    pub fn new(year: i32, rows: Vec<RawRow>) -> Self {
        Self { year, rows }
    }
}

/// Feature classification derived from the raw description.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    GirthWeld,
    Anomaly,
    Other,
}

/// One normalized row from one run.
///
/// Records are immutable after normalization, except that the drift
/// corrector attaches `corrected_odometer_ft`. All fields other than
/// `run_year` and `row_index` are optional; absent raw cells stay `None`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalRecord {
    pub run_year: i32,
    /// Stable ordinal within the run; pair indices key on this, never on
    /// reference identity.
    pub row_index: usize,
    pub feature_id: String,
    pub feature_kind: FeatureKind,
    pub feature_description: Option<String>,
    pub odometer_ft: Option<f64>,
    /// Defaults to `odometer_ft` until the drift corrector runs.
    pub corrected_odometer_ft: Option<f64>,
    pub wall_thickness_in: Option<f64>,
    pub depth_pct: Option<f64>,
    pub depth_in: Option<f64>,
    pub length_in: Option<f64>,
    pub width_in: Option<f64>,
    /// Decimal hours on a 12-hour ring, always in [0, 12).
    pub clock_position: Option<f64>,
    pub joint_number: Option<f64>,
    pub joint_length_ft: Option<f64>,
    pub dist_to_us_weld_ft: Option<f64>,
    pub dist_to_ds_weld_ft: Option<f64>,
    pub id_od: Option<String>,
    pub erf: Option<f64>,
    pub rpr: Option<f64>,
    pub comments: Option<String>,
    /// Pass-through safety fields present in only some vendor schemas,
    /// preserved verbatim.
    pub extras: BTreeMap<String, RawValue>,
}

impl CanonicalRecord {
    /// Blank record carrying only the identity fields.
    pub fn empty(run_year: i32, row_index: usize) -> Self {
        Self {
            run_year,
            row_index,
            feature_id: format!("{run_year}-{row_index:04}"),
            feature_kind: FeatureKind::Other,
            feature_description: None,
            odometer_ft: None,
            corrected_odometer_ft: None,
            wall_thickness_in: None,
            depth_pct: None,
            depth_in: None,
            length_in: None,
            width_in: None,
            clock_position: None,
            joint_number: None,
            joint_length_ft: None,
            dist_to_us_weld_ft: None,
            dist_to_ds_weld_ft: None,
            id_od: None,
            erf: None,
            rpr: None,
            comments: None,
            extras: BTreeMap::new(),
        }
    }

    /// Geometric position: corrected odometer when present, raw otherwise.
    /// Rows without either are skipped by every geometric computation.
    pub fn position(&self) -> Option<f64> {
        self.corrected_odometer_ft.or(self.odometer_ft)
    }
}
