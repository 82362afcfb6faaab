/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `sum(value * weight) / sum(weight)`. `None` when the weights sum to zero.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let weight_sum: f64 = pairs.iter().map(|(_, weight)| weight).sum();
    if weight_sum <= 0.0 {
        return None;
    }
    let weighted: f64 = pairs.iter().map(|(value, weight)| value * weight).sum();
    Some(weighted / weight_sum)
}

/// Returns a sorted copy, ascending. NaN sorts last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Middle value of a sorted slice; the mean of the two middle values when
/// the length is even.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Index of the 90th percentile in a sorted sample of `n`: `floor(0.9 n)`,
/// clamped to the last element. Integer arithmetic keeps it exact.
pub fn p90_index(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    Some((n * 9 / 10).min(n - 1))
}

/// 90th percentile by index selection, no interpolation.
pub fn p90_sorted(sorted: &[f64]) -> Option<f64> {
    p90_index(sorted.len()).map(|idx| sorted[idx])
}

/// Median, mean, p90 and count of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub median: f64,
    pub mean: f64,
    pub p90: f64,
    pub count: u64,
}

impl SampleStats {
    /// `None` for an empty sample.
    pub fn of(values: &[f64]) -> Option<Self> {
        let ordered = sorted(values);
        Some(Self {
            median: median_sorted(&ordered)?,
            mean: mean(&ordered),
            p90: p90_sorted(&ordered)?,
            count: ordered.len() as u64,
        })
    }
}
