//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Move `current` towards `target` by at most `max_step`, never overshooting the target.
///
/// `max_step` is expected to be non-negative.
pub fn approach<T>(target: T, current: T, max_step: T) -> T
where
    T: Float,
{
    if target < current {
        target.max(current - max_step)
    } else {
        target.min(current + max_step)
    }
}

/// Return `magnitude` with the sign chosen by `value`: negative if `value < 0`, otherwise
/// positive. Zero counts as positive.
pub fn signed_by<T>(magnitude: T, value: T) -> T
where
    T: Float,
{
    if value < T::zero() {
        -magnitude.abs()
    } else {
        magnitude.abs()
    }
}
