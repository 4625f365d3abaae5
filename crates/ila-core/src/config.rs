// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::IlaError;

const DEFAULT_DISTANCE_WEIGHT: f64 = 0.5;
const DEFAULT_CLOCK_WEIGHT: f64 = 0.3;
const DEFAULT_FEATURE_WEIGHT: f64 = 0.2;
const DEFAULT_MAX_DISTANCE_FT: f64 = 50.0;
const DEFAULT_COST_THRESHOLD: f64 = 0.8;
const DEFAULT_WINDOW_SIZE_FT: f64 = 500.0;
const DEFAULT_WINDOW_STEP_FT: f64 = 400.0;
const DEFAULT_SEGMENTATION_THRESHOLD: usize = 1_000_000;
const DEFAULT_CLUSTER_BIN_WIDTH_FT: f64 = 200.0;
const DEFAULT_CLUSTER_THRESHOLD_FACTOR: f64 = 2.0;
const DEFAULT_RISK_GRID_STEP_FT: f64 = 100.0;
const DEFAULT_RISK_WINDOW_FT: f64 = 500.0;
const DEFAULT_RISK_THRESHOLD: f64 = 0.6;

/// Configuration for the cross-run anomaly matcher.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    pub distance_weight: f64,
    pub clock_weight: f64,
    pub feature_weight: f64,
    /// Hard gate: candidate pairs further apart than this never match.
    pub max_distance_ft: f64,
    /// A match is accepted when its cost is at or below this threshold.
    pub cost_threshold: f64,
    pub window_size_ft: f64,
    pub window_step_ft: f64,
    /// Above `|A| * |B|` of this size, the matcher switches from one global
    /// assignment to overlapping windows.
    pub segmentation_threshold: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            distance_weight: DEFAULT_DISTANCE_WEIGHT,
            clock_weight: DEFAULT_CLOCK_WEIGHT,
            feature_weight: DEFAULT_FEATURE_WEIGHT,
            max_distance_ft: DEFAULT_MAX_DISTANCE_FT,
            cost_threshold: DEFAULT_COST_THRESHOLD,
            window_size_ft: DEFAULT_WINDOW_SIZE_FT,
            window_step_ft: DEFAULT_WINDOW_STEP_FT,
            segmentation_threshold: DEFAULT_SEGMENTATION_THRESHOLD,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), IlaError> {
        for (name, weight) in [
            ("distance_weight", self.distance_weight),
            ("clock_weight", self.clock_weight),
            ("feature_weight", self.feature_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(IlaError::invalid_input(format!(
                    "MatchConfig.{name} must be finite and >= 0; got {weight}"
                )));
            }
        }
        if !self.max_distance_ft.is_finite() || self.max_distance_ft <= 0.0 {
            return Err(IlaError::invalid_input(format!(
                "MatchConfig.max_distance_ft must be > 0; got {}",
                self.max_distance_ft
            )));
        }
        if !self.cost_threshold.is_finite() || self.cost_threshold < 0.0 {
            return Err(IlaError::invalid_input(format!(
                "MatchConfig.cost_threshold must be finite and >= 0; got {}",
                self.cost_threshold
            )));
        }
        if !self.window_size_ft.is_finite() || self.window_size_ft <= 0.0 {
            return Err(IlaError::invalid_input(format!(
                "MatchConfig.window_size_ft must be > 0; got {}",
                self.window_size_ft
            )));
        }
        if !self.window_step_ft.is_finite()
            || self.window_step_ft <= 0.0
            || self.window_step_ft > self.window_size_ft
        {
            return Err(IlaError::invalid_input(format!(
                "MatchConfig.window_step_ft must be in (0, window_size_ft]; got {}",
                self.window_step_ft
            )));
        }
        if self.segmentation_threshold == 0 {
            return Err(IlaError::invalid_input(
                "MatchConfig.segmentation_threshold must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Configuration for spatial density clustering.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterConfig {
    pub bin_width_ft: f64,
    /// A bin is hot when its count reaches `threshold_factor * mean`.
    pub threshold_factor: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            bin_width_ft: DEFAULT_CLUSTER_BIN_WIDTH_FT,
            threshold_factor: DEFAULT_CLUSTER_THRESHOLD_FACTOR,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), IlaError> {
        if !self.bin_width_ft.is_finite() || self.bin_width_ft <= 0.0 {
            return Err(IlaError::invalid_input(format!(
                "ClusterConfig.bin_width_ft must be > 0; got {}",
                self.bin_width_ft
            )));
        }
        if !self.threshold_factor.is_finite() || self.threshold_factor <= 0.0 {
            return Err(IlaError::invalid_input(format!(
                "ClusterConfig.threshold_factor must be > 0; got {}",
                self.threshold_factor
            )));
        }
        Ok(())
    }
}

/// Configuration for the composite risk forecast.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RiskConfig {
    pub grid_step_ft: f64,
    /// Half-width of the local averaging window around each grid point.
    pub window_ft: f64,
    /// Grid points at or above this composite score form high-risk zones.
    pub risk_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            grid_step_ft: DEFAULT_RISK_GRID_STEP_FT,
            window_ft: DEFAULT_RISK_WINDOW_FT,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), IlaError> {
        if !self.grid_step_ft.is_finite() || self.grid_step_ft <= 0.0 {
            return Err(IlaError::invalid_input(format!(
                "RiskConfig.grid_step_ft must be > 0; got {}",
                self.grid_step_ft
            )));
        }
        if !self.window_ft.is_finite() || self.window_ft < 0.0 {
            return Err(IlaError::invalid_input(format!(
                "RiskConfig.window_ft must be >= 0; got {}",
                self.window_ft
            )));
        }
        if !self.risk_threshold.is_finite() || !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(IlaError::invalid_input(format!(
                "RiskConfig.risk_threshold must be in [0, 1]; got {}",
                self.risk_threshold
            )));
        }
        Ok(())
    }
}

/// Aggregate configuration for one alignment job.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobConfig {
    pub matching: MatchConfig,
    pub cluster: ClusterConfig,
    pub risk: RiskConfig,
}

impl JobConfig {
    pub fn validate(&self) -> Result<(), IlaError> {
        self.matching.validate()?;
        self.cluster.validate()?;
        self.risk.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClusterConfig, JobConfig, MatchConfig, RiskConfig};

    #[test]
    fn defaults_match_documented_values() {
        let cfg = MatchConfig::default();
        assert_eq!(cfg.distance_weight, 0.5);
        assert_eq!(cfg.clock_weight, 0.3);
        assert_eq!(cfg.feature_weight, 0.2);
        assert_eq!(cfg.max_distance_ft, 50.0);
        assert_eq!(cfg.cost_threshold, 0.8);
        assert_eq!(cfg.window_size_ft, 500.0);
        assert_eq!(cfg.window_step_ft, 400.0);
        assert_eq!(cfg.segmentation_threshold, 1_000_000);

        let cluster = ClusterConfig::default();
        assert_eq!(cluster.bin_width_ft, 200.0);
        assert_eq!(cluster.threshold_factor, 2.0);

        let risk = RiskConfig::default();
        assert_eq!(risk.grid_step_ft, 100.0);
        assert_eq!(risk.window_ft, 500.0);
        assert_eq!(risk.risk_threshold, 0.6);
    }

    #[test]
    fn default_job_config_validates() {
        JobConfig::default()
            .validate()
            .expect("defaults must be valid");
    }

    #[test]
    fn negative_weight_is_rejected() {
        let cfg = MatchConfig {
            clock_weight: -0.1,
            ..MatchConfig::default()
        };
        let err = cfg.validate().expect_err("negative weight must fail");
        assert!(err.to_string().contains("clock_weight"));
    }

    #[test]
    fn window_step_larger_than_window_is_rejected() {
        let cfg = MatchConfig {
            window_step_ft: 600.0,
            ..MatchConfig::default()
        };
        let err = cfg.validate().expect_err("step > size must fail");
        assert!(err.to_string().contains("window_step_ft"));
    }

    #[test]
    fn zero_max_distance_is_rejected() {
        let cfg = MatchConfig {
            max_distance_ft: 0.0,
            ..MatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cluster_and_risk_bounds_are_enforced() {
        assert!(
            ClusterConfig {
                bin_width_ft: 0.0,
                ..ClusterConfig::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            RiskConfig {
                risk_threshold: 1.5,
                ..RiskConfig::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            RiskConfig {
                grid_step_ft: f64::NAN,
                ..RiskConfig::default()
            }
            .validate()
            .is_err()
        );
    }
}
