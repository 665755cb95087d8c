//! Quartile reduction for timing sequences
//!
//! Quartiles use the exclusive interpolation method. Below 4 samples the
//! 25th/75th percentile degrade to the minimum/maximum observed value;
//! quartile interpolation is meaningless at those sizes.

/// Median of a sorted sequence (midpoint average for even counts)
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Exclusive-method quantile of a sorted sequence, `q` in (0, 1)
fn quantile_exclusive(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let position = (n as f64 + 1.0) * q;
    if position <= 1.0 {
        return sorted[0];
    }
    if position >= n as f64 {
        return sorted[n - 1];
    }
    let lower = position.floor() as usize; // 1-based rank
    let weight = position - lower as f64;
    sorted[lower - 1] + weight * (sorted[lower] - sorted[lower - 1])
}

/// 25th percentile of a sorted sequence
pub fn p25(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() < 4 {
        sorted[0]
    } else {
        quantile_exclusive(sorted, 0.25)
    }
}

/// 75th percentile of a sorted sequence
pub fn p75(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() < 4 {
        sorted[sorted.len() - 1]
    } else {
        quantile_exclusive(sorted, 0.75)
    }
}
