// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::record::RawValue;

const HOURS_ON_RING: f64 = 12.0;

/// Wraps a raw decimal-hour value onto the canonical [0, 12) ring.
///
/// Values in [0, 12) pass through, 12 and above wrap modulo 12, negative or
/// non-finite values are unusable and map to `None`.
pub fn wrap_clock(value: f64) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let wrapped = value % HOURS_ON_RING;
    // `x % 12.0` can return 12.0-epsilon noise but never 12.0 itself for
    // finite non-negative x, so the result is already in [0, 12).
    Some(wrapped)
}

/// Parses a textual clock position of the form `H`, `H:M`, or `H:M:S`,
/// with `:` or `.` accepted as the separator.
///
/// Seconds are validated but do not contribute to the decimal value: the
/// canonical mapping is `h + m/60`.
pub fn parse_clock_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parts = trimmed.split([':', '.']);
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(raw) => raw.trim().parse().ok()?,
        None => 0,
    };
    if let Some(raw_seconds) = parts.next() {
        let _: u32 = raw_seconds.trim().parse().ok()?;
    }
    if parts.next().is_some() || minute >= 60 {
        return None;
    }

    wrap_clock(f64::from(hour) + f64::from(minute) / 60.0)
}

/// Normalizes any raw cell to a decimal clock position in [0, 12).
pub fn normalize_clock(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Null => None,
        RawValue::Time { hour, minute, .. } => {
            wrap_clock(f64::from(*hour) + f64::from(*minute) / 60.0)
        }
        RawValue::Number(v) => wrap_clock(*v),
        RawValue::Text(s) => parse_clock_text(s),
    }
}

/// Circular distance between two clock positions on the 12-hour ring.
pub fn clock_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(HOURS_ON_RING - diff)
}
