//! Small numeric helpers shared by the record model and the evaluation.

/// Returns a split point between `lower` and `upper` that has as few
/// significant decimal digits as possible.
///
/// The point is chosen from the middle third of the interval by rounding
/// the midpoint to the coarsest decimal grid that still lands strictly
/// inside `(2l+u)/3 .. (l+2u)/3`. Falls back to the exact midpoint.
///
/// # Examples
///
/// ```
/// use skip_rules::util::split_point_with_few_digits;
///
/// assert_eq!(split_point_with_few_digits(0.0, 100.01), 50.0);
/// assert_eq!(split_point_with_few_digits(-1.0, 0.0), -0.5);
/// ```
pub fn split_point_with_few_digits(lower: f64, upper: f64) -> f64 {
    let mid = (lower + upper) / 2.0;
    let lower_bound = (2.0 * lower + upper) / 3.0;
    let upper_bound = (lower + 2.0 * upper) / 3.0;
    for exponent in -10..10 {
        let scale = 10f64.powi(exponent);
        let rounded = (mid * scale + 0.5).floor() / scale;
        if rounded > lower_bound && rounded < upper_bound {
            return rounded;
        }
    }
    mid
}

/// Mean after discarding the lowest and highest 10% of the values.
///
/// Returns 0 for an empty slice.
pub fn trimmed_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let trim = sorted.len() / 10;
    let kept = &sorted[trim..sorted.len() - trim];
    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Formats a number the way rule text shows it: integral values keep one
/// decimal (`3.0`), everything else uses the shortest representation.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
