//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::AddAssign
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

/// One dimensional linear interpolation into a breakpoint table.
///
/// `bp` must be sorted ascending. Values outside the table are clamped to
/// the first/last entry of `values` rather than extrapolated.
///
/// Table validity (equal lengths, non-empty, sorted breakpoints) is checked
/// by parameter validation at init, not here.
pub fn interp<T>(value: T, bp: &[T], values: &[T]) -> T
where
    T: Float
{
    if value <= bp[0] {
        return values[0];
    }
    if value >= bp[bp.len() - 1] {
        return values[values.len() - 1];
    }

    let mut i = 0;
    while value > bp[i + 1] {
        i += 1;
    }

    let frac = (value - bp[i]) / (bp[i + 1] - bp[i]);
    values[i] + frac * (values[i + 1] - values[i])
}

/// Limit the change of a value relative to its last value.
///
/// `down_step` is the most negative allowed change and `up_step` the most
/// positive, both per call (i.e. already scaled by the cycle period).
pub fn rate_limit<T>(new_value: T, last_value: T, down_step: T, up_step: T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::AddAssign
{
    clamp(&new_value, &(last_value + down_step), &(last_value + up_step))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interp() {
        let bp = [0f64, 5f64, 20f64];
        let v = [2f64, 3f64, 2f64];

        assert_eq!(interp(-1f64, &bp, &v), 2f64);
        assert_eq!(interp(0f64, &bp, &v), 2f64);
        assert_eq!(interp(2.5f64, &bp, &v), 2.5f64);
        assert_eq!(interp(5f64, &bp, &v), 3f64);
        assert_eq!(interp(12.5f64, &bp, &v), 2.5f64);
        assert_eq!(interp(20f64, &bp, &v), 2f64);
        assert_eq!(interp(100f64, &bp, &v), 2f64);
    }

    #[test]
    fn test_rate_limit() {
        assert_eq!(rate_limit(10f64, 0f64, -1f64, 1f64), 1f64);
        assert_eq!(rate_limit(-10f64, 0f64, -1f64, 1f64), -1f64);
        assert_eq!(rate_limit(0.5f64, 0f64, -1f64, 1f64), 0.5f64);
    }

}
