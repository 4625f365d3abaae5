// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use ila_core::{MatchConfig, clock_distance};

/// Cost assigned to candidate pairs separated by more than the distance
/// gate; large enough that the solver always prefers leaving rows
/// unmatched.
pub const GATE_COST: f64 = 1.0e6;

/// Matches at or above this cost are artifacts of the gate and are never
/// emitted.
pub const GATE_FILTER: f64 = 1.0e5;

const CLOCK_HALF_RING: f64 = 6.0;
const NULL_CLOCK_PENALTY: f64 = 0.5;
const COMPATIBLE_FEATURE_COST: f64 = 0.3;

const CORROSION_KEYWORDS: &[(&str, FeatureClass)] = &[
    ("metal loss", FeatureClass::MetalLoss),
    ("corrosion", FeatureClass::Corrosion),
    ("cluster", FeatureClass::Cluster),
];

/// Fine-grained feature classification used only for match costing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureClass {
    MetalLoss,
    Corrosion,
    Cluster,
    Dent,
    SeamWeldDent,
    Other,
}

impl FeatureClass {
    fn is_corrosion_family(self) -> bool {
        matches!(self, Self::MetalLoss | Self::Corrosion | Self::Cluster)
    }
}

/// Classifies a description for costing. Corrosion-family keywords take
/// precedence over dents so "cluster of dents"-style text stays in one
/// family deterministically.
pub fn feature_class(description: Option<&str>) -> FeatureClass {
    let Some(description) = description else {
        return FeatureClass::Other;
    };
    let lowered = description.trim().to_lowercase();
    if lowered.is_empty() {
        return FeatureClass::Other;
    }
    for (keyword, class) in CORROSION_KEYWORDS {
        if lowered.contains(keyword) {
            return *class;
        }
    }
    if lowered.contains("seam weld dent") {
        return FeatureClass::SeamWeldDent;
    }
    if lowered.contains("dent") {
        return FeatureClass::Dent;
    }
    FeatureClass::Other
}

/// Feature-comparison cost: identical classes cost nothing,
/// cross-classification inside the corrosion family is compatible (0.3),
/// anything else is a full mismatch.
pub fn feature_cost(a: FeatureClass, b: FeatureClass) -> f64 {
    if a == b {
        0.0
    } else if a.is_corrosion_family() && b.is_corrosion_family() {
        COMPATIBLE_FEATURE_COST
    } else {
        1.0
    }
}

/// Per-pair cost with its reported confidence components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostBreakdown {
    pub cost: f64,
    pub distance_confidence: f64,
    pub clock_confidence: f64,
    pub feature_confidence: f64,
}

/// Weighted matching cost for one candidate pair.
///
/// Positions must be in the same (baseline-corrected) odometer space.
/// Pairs separated by more than `max_distance_ft` get [`GATE_COST`].
pub fn pair_cost(
    position_a: f64,
    position_b: f64,
    clock_a: Option<f64>,
    clock_b: Option<f64>,
    class_a: FeatureClass,
    class_b: FeatureClass,
    config: &MatchConfig,
) -> CostBreakdown {
    let distance = (position_a - position_b).abs();
    let distance_norm = (distance / config.max_distance_ft).clamp(0.0, 1.0);
    let clock_norm = match (clock_a, clock_b) {
        (Some(a), Some(b)) => clock_distance(a, b) / CLOCK_HALF_RING,
        _ => NULL_CLOCK_PENALTY,
    };
    let feature = feature_cost(class_a, class_b);

    let cost = if distance > config.max_distance_ft {
        GATE_COST
    } else {
        config.distance_weight * distance_norm
            + config.clock_weight * clock_norm
            + config.feature_weight * feature
    };

    CostBreakdown {
        cost,
        distance_confidence: 1.0 - distance_norm,
        clock_confidence: 1.0 - clock_norm,
        feature_confidence: 1.0 - feature,
    }
}
