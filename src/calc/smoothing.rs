use arrow::array::Float64Array;

use crate::table::value_at;

/// Trailing mean over the last `window` samples.
///
/// Row `i` is null while `i < window - 1` or when any value in the window is
/// missing. A zero window yields an all-null column.
pub fn moving_average(values: &Float64Array, window: usize) -> Float64Array {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let mut sum = 0.0;
            for j in i + 1 - window..=i {
                sum += value_at(values, j)?;
            }
            Some(sum / window as f64)
        })
        .collect()
}

/// One moving average per window, in the order given.
pub fn moving_averages(values: &Float64Array, windows: &[usize]) -> Vec<(usize, Float64Array)> {
    windows
        .iter()
        .map(|&w| (w, moving_average(values, w)))
        .collect()
}
