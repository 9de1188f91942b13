//! Zero-safe ratio helpers
//!
//! Every conversion rate in the system goes through these. A zero (or
//! non-positive) denominator yields exactly `0.0`, never NaN or infinity.

/// `numerator / denominator * 100`, or 0 when the denominator is not positive
#[inline]
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let value = numerator / denominator * 100.0;
        if value.is_finite() {
            value
        } else {
            0.0
        }
    } else {
        0.0
    }
}

/// Percentage rounded to two decimals, 0.0 on a zero denominator
#[inline]
pub fn safe_percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round_to(percent(numerator, denominator), 2)
}

/// `numerator / denominator`, or 0 when the denominator is not positive
#[inline]
pub fn per_unit(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Round half away from zero to `places` decimals
#[inline]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
