//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between `min` and `max`.
///
/// Unlike `f64::clamp` this does not panic if `min > max`, in that case `min`
/// takes priority. A `NAN` value is returned unchanged.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Clamp a value symmetrically about zero, i.e. into `[-limit, limit]`.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    clamp(&value, &-limit.abs(), &limit.abs())
}

/// Returns true if every value in the slice is finite.
pub fn all_finite<T>(values: &[T]) -> bool
where
    T: Float
{
    values.iter().all(|v| v.is_finite())
}
