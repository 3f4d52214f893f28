use num_traits::Float;
use single_utilities::traits::FloatOps;

/// Arithmetic mean of the finite values, `None` when there are none.
pub fn mean<T>(values: &[T]) -> Option<f64>
where
    T: FloatOps,
{
    let (sum, count) = values
        .iter()
        .filter_map(|v| v.to_f64())
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Ratio of the case mean to the control mean.
///
/// Undefined when either mean is undefined or the control mean is exactly zero.
pub fn fold_change(case_mean: Option<f64>, control_mean: Option<f64>) -> Option<f64> {
    let (case_mean, control_mean) = (case_mean?, control_mean?);
    if control_mean == 0.0 {
        return None;
    }
    let fc = case_mean / control_mean;
    if Float::is_finite(fc) { Some(fc) } else { None }
}

/// log2 of a fold change, defined only for strictly positive fold changes.
pub fn log2_fold_change(fold_change: Option<f64>) -> Option<f64> {
    match fold_change {
        Some(fc) if fc > 0.0 => Some(fc.log2()),
        _ => None,
    }
}
