use arrow::array::{Array, Float64Array};

use crate::table::value_at;

/// Fill interior gaps of `values` by linear interpolation over `years`.
///
/// Each missing value between two known points (y0, a) and (y1, b) becomes
/// `a + (b - a) * (y - y0) / (y1 - y0)`. Leading and trailing gaps stay null;
/// known values are copied through unchanged. `years` must be ascending.
pub fn interpolate_linear(years: &[i64], values: &Float64Array) -> Float64Array {
    debug_assert_eq!(years.len(), values.len());

    let known: Vec<usize> = (0..values.len()).filter(|&i| values.is_valid(i)).collect();
    let mut out: Vec<Option<f64>> = (0..values.len()).map(|i| value_at(values, i)).collect();

    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (y0, y1) = (years[lo] as f64, years[hi] as f64);
        let (a, b) = (values.value(lo), values.value(hi));
        for (i, slot) in out.iter_mut().enumerate().take(hi).skip(lo + 1) {
            let y = years[i] as f64;
            *slot = Some(a + (b - a) * (y - y0) / (y1 - y0));
        }
    }

    out.into_iter().collect()
}
