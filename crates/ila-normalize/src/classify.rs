// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_core::FeatureKind;
use regex::Regex;
use std::sync::LazyLock;

static GIRTH_WELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(girth\s*weld|girthweld|gw)$").expect("girth weld pattern is valid")
});

static ANOMALY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)metal\s*loss|corrosion|cluster|dent|crack|seam\s*weld\s*anomaly")
        .expect("anomaly pattern is valid")
});

/// Classifies a raw feature description.
///
/// Girth welds take precedence over anomalies: "Girth Weld" must never read
/// as an anomaly even though vendors describe weld anomalies with similar
/// words.
pub fn classify_feature(description: Option<&str>) -> FeatureKind {
    let Some(description) = description else {
        return FeatureKind::Other;
    };
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return FeatureKind::Other;
    }
    if GIRTH_WELD_RE.is_match(trimmed) {
        return FeatureKind::GirthWeld;
    }
    if ANOMALY_RE.is_match(trimmed) {
        return FeatureKind::Anomaly;
    }
    FeatureKind::Other
}
