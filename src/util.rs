const FLOAT_TO_INT_MAX: f64 = 9007199254740991_f64;

/// Truncates `f` to an i64, or gives None when its magnitude is beyond 2^53 - 1, past which an f64
/// no longer holds every integer exactly.
pub(crate) fn f64_to_i64_safe(f: f64) -> Option<i64> {
    if f.abs() <= FLOAT_TO_INT_MAX {
        Some(f as i64)
    } else {
        None
    }
}

/// Returns the integer value of `f` if it has no fractional part and fits losslessly in an i64.
#[allow(clippy::float_cmp)]
pub(crate) fn f64_as_integral(f: f64) -> Option<i64> {
    f64_to_i64_safe(f).filter(|i| *i as f64 == f)
}
