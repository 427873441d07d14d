//! Order statistics used to summarise a sample series.

/// Standard order-statistic median. Even-length input averages the two
/// middle values. Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute percentage error as a fraction of the median.
///
/// Defined as zero for fewer than two values and for a zero median.
pub fn median_absolute_percent_error(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let Some(center) = median(values) else {
        return 0.0;
    };
    if center == 0.0 {
        return 0.0;
    }
    let errors: Vec<f64> = values
        .iter()
        .map(|value| ((value - center) / center).abs())
        .collect();
    median(&errors).unwrap_or(0.0)
}

/// Relative change of `current` against `previous`, `None` when `previous` is zero.
pub fn relative_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous)
    }
}
