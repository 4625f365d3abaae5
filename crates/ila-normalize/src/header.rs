// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Destination of one recognized raw header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderTarget {
    /// One of the typed canonical fields, identified by canonical name.
    Canonical(&'static str),
    /// A pass-through safety field preserved opaquely under this key.
    Extra(&'static str),
}

/// Canonical field -> accepted raw header names, across every known run
/// vocabulary. The table is data so a new vendor schema is one more row,
/// not new logic. Raw names here are pre-normalized (lowercase, single
/// spaces); incoming headers are normalized before lookup.
const CANONICAL_HEADERS: &[(&str, &[&str])] = &[
    (
        "odometer_ft",
        &["log dist. [ft]", "ili wheel count [ft.]"],
    ),
    ("wall_thickness_in", &["t [in]", "wt [in]"]),
    (
        "feature_description",
        &["event", "event description", "feature description"],
    ),
    ("clock_raw", &["o'clock", "o'clock [hh:mm]"]),
    ("depth_pct", &["depth [%]", "metal loss depth [%]"]),
    ("depth_in", &["depth [in]", "metal loss depth [in]"]),
    ("length_in", &["length [in]", "length [in.]"]),
    ("width_in", &["width [in]", "width [in.]"]),
    ("joint_number", &["jt #", "j. no.", "joint number"]),
    (
        "joint_length_ft",
        &["jt lgth [ft]", "j. len [ft]", "joint length [ft.]"],
    ),
    ("id_od", &["id/od", "anomaly id/od"]),
    ("id_od_raw", &["internal"]),
    ("erf", &["erf"]),
    ("rpr", &["rpr"]),
    (
        "dist_to_us_weld_ft",
        &[
            "us weld dist [ft]",
            "to u/s w. [ft]",
            "distance to u/s gw [ft]",
            "distance marker upstream [ft.]",
        ],
    ),
    (
        "dist_to_ds_weld_ft",
        &[
            "ds weld dist [ft]",
            "to d/s w. [ft]",
            "distance to d/s gw [ft]",
            "distance marker downstream [ft.]",
        ],
    ),
    ("comments", &["comment", "comments"]),
];

/// Safety and metadata columns that exist in only some vendor schemas.
/// These are never interpreted, only carried through verbatim.
const PASS_THROUGH_HEADERS: &[(&str, &[&str])] = &[
    ("burst_mop_ratio", &["p2 burst / mop"]),
    ("id_reduction_pct", &["id reduction [%]"]),
    ("od_reduction_pct", &["od reduction [%]"]),
    ("od_reduction_in", &["od reduction [in]"]),
    ("height_ft", &["height [ft]"]),
    ("b31g_psafe", &["b31g psafe [psi]"]),
    ("b31g_pburst", &["b31g pburst [psi]"]),
    ("mod_b31g_psafe", &["mod b31g psafe [psi]"]),
    ("mod_b31g_pburst", &["mod b31g pburst [psi]"]),
    ("eff_area_psafe", &["effective area psafe [psi]"]),
    ("eff_area_pburst", &["effective area pburst [psi]"]),
    ("tool_velocity", &["tool velocity [ft/s]"]),
    ("elevation_ft", &["elevation [ft]"]),
    ("mop_psi", &["mop [psi]"]),
    ("smys_psi", &["smys [psi]"]),
    ("anomalies_per_joint", &["anomalies per joint"]),
    ("dent_depth_pct", &["dent depth [%]"]),
    ("dent_depth_in", &["dent depth [in]"]),
    ("eval_pressure_psi", &["evaluation pressure [psi]"]),
    ("pipe_od_in", &["pipe diameter (o.d.) [in.]"]),
    (
        "depth_plus_tolerance_pct",
        &["metal loss depth + tolerance [%]"],
    ),
    ("depth_tolerance_pct", &["metal loss depth tolerance [%]"]),
    ("dimension_class", &["dimension classification"]),
];

/// Normalizes a raw header for lookup: lowercased, whitespace runs
/// (including embedded newlines) collapsed to single spaces, trimmed.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolves a raw header to its destination, or `None` for unrecognized
/// columns.
pub fn resolve_header(raw: &str) -> Option<HeaderTarget> {
    let normalized = normalize_header(raw);
    for (canonical, raw_names) in CANONICAL_HEADERS {
        if raw_names.contains(&normalized.as_str()) {
            return Some(HeaderTarget::Canonical(canonical));
        }
    }
    for (key, raw_names) in PASS_THROUGH_HEADERS {
        if raw_names.contains(&normalized.as_str()) {
            return Some(HeaderTarget::Extra(key));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{HeaderTarget, normalize_header, resolve_header};

    #[test]
    fn normalization_collapses_whitespace_and_case() {
        assert_eq!(normalize_header("  Log  Dist.\n[ft] "), "log dist. [ft]");
        assert_eq!(normalize_header("O'clock [hh:mm]"), "o'clock [hh:mm]");
    }

    #[test]
    fn every_run_vocabulary_resolves_odometer() {
        for raw in ["log dist. [ft]", "Log Dist. [ft]", "ILI Wheel Count [ft.]"] {
            assert_eq!(
                resolve_header(raw),
                Some(HeaderTarget::Canonical("odometer_ft")),
                "{raw:?} should resolve to odometer_ft"
            );
        }
    }

    #[test]
    fn per_year_clock_and_depth_headers_resolve() {
        assert_eq!(
            resolve_header("o'clock"),
            Some(HeaderTarget::Canonical("clock_raw"))
        );
        assert_eq!(
            resolve_header("O'clock [hh:mm]"),
            Some(HeaderTarget::Canonical("clock_raw"))
        );
        assert_eq!(
            resolve_header("Metal Loss Depth [%]"),
            Some(HeaderTarget::Canonical("depth_pct"))
        );
        assert_eq!(
            resolve_header("depth [%]"),
            Some(HeaderTarget::Canonical("depth_pct"))
        );
    }

    #[test]
    fn safety_columns_resolve_as_extras() {
        assert_eq!(
            resolve_header("Mod B31G Psafe [PSI]"),
            Some(HeaderTarget::Extra("mod_b31g_psafe"))
        );
        assert_eq!(
            resolve_header("Pipe Diameter (O.D.) [in.]"),
            Some(HeaderTarget::Extra("pipe_od_in"))
        );
    }

    #[test]
    fn unknown_headers_do_not_resolve() {
        assert_eq!(resolve_header("Operator Notes"), None);
        assert_eq!(resolve_header(""), None);
    }
}
