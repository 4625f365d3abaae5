// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::f64::consts::PI;

/// Silverman's rule-of-thumb bandwidth for a univariate Gaussian KDE:
/// `sigma * (3n/4)^(-1/5)` with the unbiased sample deviation.
///
/// Returns `None` when fewer than two samples exist or the samples are
/// degenerate (zero spread), in which case the caller falls back to a
/// fixed-width proximity bump.
pub fn silverman_bandwidth(samples: &[f64]) -> Option<f64> {
    let n = samples.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean = samples.iter().sum::<f64>() / n_f;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n_f - 1.0);
    let sigma = variance.sqrt();
    if !sigma.is_finite() || sigma <= 0.0 {
        return None;
    }
    let factor = (3.0 * n_f / 4.0).powf(-0.2);
    Some(sigma * factor)
}

/// Evaluates a Gaussian kernel density estimate over `grid`.
///
/// Returns `None` when no usable bandwidth exists.
pub fn gaussian_kde(samples: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let bandwidth = silverman_bandwidth(samples)?;
    let n = samples.len() as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());

    Some(
        grid.iter()
            .map(|&x| {
                let sum: f64 = samples
                    .iter()
                    .map(|&sample| {
                        let z = (x - sample) / bandwidth;
                        (-0.5 * z * z).exp()
                    })
                    .sum();
                norm * sum
            })
            .collect(),
    )
}
