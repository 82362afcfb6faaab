use super::types::BucketCount;

/// Labels of the response-time histogram, in bucket order.
pub const BUCKET_LABELS: [&str; 9] = [
    "0-5", "5-10", "10-15", "15-20", "20-30", "30-45", "45-60", "60-120", "120+",
];

/// Maps a response time in minutes onto its histogram bucket.
///
/// | Range       | Bucket |
/// |-------------|--------|
/// | [0, 5)      | 0-5    |
/// | [5, 10)     | 5-10   |
/// | [10, 15)    | 10-15  |
/// | [15, 20)    | 15-20  |
/// | [20, 30)    | 20-30  |
/// | [30, 45)    | 30-45  |
/// | [45, 60)    | 45-60  |
/// | [60, 120)   | 60-120 |
/// | [120, 180]  | 120+   |
///
/// Values outside `(0, 180]` are not valid response times and map to `None`.
pub fn bucket_index(minutes: f64) -> Option<usize> {
    match minutes {
        m if !(m > 0.0 && m <= 180.0) => None,
        m if m < 5.0 => Some(0),
        m if m < 10.0 => Some(1),
        m if m < 15.0 => Some(2),
        m if m < 20.0 => Some(3),
        m if m < 30.0 => Some(4),
        m if m < 45.0 => Some(5),
        m if m < 60.0 => Some(6),
        m if m < 120.0 => Some(7),
        _ => Some(8),
    }
}

/// Counts valid response times per bucket. All nine buckets are returned,
/// including empty ones.
pub fn histogram(minutes: impl IntoIterator<Item = f64>) -> Vec<BucketCount> {
    let mut counts = [0u64; BUCKET_LABELS.len()];
    for idx in minutes.into_iter().filter_map(bucket_index) {
        counts[idx] += 1;
    }

    BUCKET_LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| BucketCount {
            bucket: (*label).to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(minutes: f64) -> Option<&'static str> {
        bucket_index(minutes).map(|idx| BUCKET_LABELS[idx])
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(label(0.01), Some("0-5"));
        assert_eq!(label(4.999), Some("0-5"));
        assert_eq!(label(5.0), Some("5-10"));
        assert_eq!(label(9.99), Some("5-10"));
        assert_eq!(label(10.0), Some("10-15"));
        assert_eq!(label(15.0), Some("15-20"));
        assert_eq!(label(20.0), Some("20-30"));
        assert_eq!(label(30.0), Some("30-45"));
        assert_eq!(label(45.0), Some("45-60"));
        assert_eq!(label(60.0), Some("60-120"));
        assert_eq!(label(119.9), Some("60-120"));
        assert_eq!(label(120.0), Some("120+"));
        assert_eq!(label(180.0), Some("120+"));
    }

    #[test]
    fn test_invalid_values_have_no_bucket() {
        assert_eq!(bucket_index(0.0), None);
        assert_eq!(bucket_index(-3.0), None);
        assert_eq!(bucket_index(180.01), None);
        assert_eq!(bucket_index(f64::NAN), None);
    }

    #[test]
    fn test_every_valid_value_lands_in_exactly_one_bucket() {
        let values: Vec<f64> = (1..=1800).map(|tenths| f64::from(tenths) / 10.0).collect();

        let buckets = histogram(values.iter().copied());

        let total: u64 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, values.len() as u64);
    }

    #[test]
    fn test_histogram_keeps_empty_buckets_in_order() {
        let buckets = histogram([1.0, 5.0, 7.5, 150.0, 0.0, 200.0]);

        let labels: Vec<&str> = buckets.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(labels, BUCKET_LABELS.to_vec());
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 0, 0, 0, 0, 0, 0, 1]);
    }
}
