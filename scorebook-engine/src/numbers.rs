//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Divide two counters as `f64`, returning 0.0 when the denominator is zero.
#[must_use]
pub fn rate(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    f64::from(numerator) / f64::from(denominator)
}

/// Earned runs per nine innings given outs recorded, 0.0 with no outs.
#[must_use]
pub fn per_nine(runs: u32, outs: u32) -> f64 {
    if outs == 0 {
        return 0.0;
    }
    f64::from(runs) * 27.0 / f64::from(outs)
}

/// Saturating conversion of a collection length into a `u32` counter.
#[must_use]
pub fn len_to_u32(len: usize) -> u32 {
    cast::<usize, u32>(len).unwrap_or(u32::MAX)
}

/// Signed run total from an unsigned score, clamped to the `i32` range.
#[must_use]
pub fn score_to_i32(score: u32) -> i32 {
    cast::<u32, i32>(score).unwrap_or(i32::MAX)
}

/// Convert a small base-count into the signed domain used by lead math.
#[must_use]
pub fn count_to_i32(count: usize) -> i32 {
    cast::<usize, i32>(count).unwrap_or(i32::MAX)
}
