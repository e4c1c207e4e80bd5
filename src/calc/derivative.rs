use arrow::array::Float64Array;

use crate::table::value_at;

/// Velocity and acceleration of one series.
#[derive(Debug, Clone)]
pub struct Derivatives {
    pub velocity: Float64Array,
    pub acceleration: Float64Array,
}

/// First difference divided by `step`: `(v[i] - v[i-1]) / step`.
///
/// Row 0, and any row where either operand is missing, is null.
pub fn first_difference(values: &Float64Array, step: f64) -> Float64Array {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            match (value_at(values, i - 1), value_at(values, i)) {
                (Some(prev), Some(cur)) => Some((cur - prev) / step),
                _ => None,
            }
        })
        .collect()
}

/// Velocity, then acceleration as the first difference of velocity.
///
/// `step` is the number of periods between consecutive samples, e.g. 2 for a
/// biennial count.
pub fn derivatives(values: &Float64Array, step: f64) -> Derivatives {
    let velocity = first_difference(values, step);
    let acceleration = first_difference(&velocity, step);
    Derivatives {
        velocity,
        acceleration,
    }
}
