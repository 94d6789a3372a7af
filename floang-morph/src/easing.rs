/// Easing curve: raw progress and a power parameter in, eased progress out.
pub type EasingFn = fn(f64, f64) -> f64;

/// Ignores `power`.
pub fn linear(t: f64, _power: f64) -> f64 {
    t
}

/// Symmetric power ease-in-out. `power = 3` is the cubic ease.
pub fn ease_in_out_power(t: f64, power: f64) -> f64 {
    if t < 0.5 {
        2f64.powf(power - 1.0) * t.powf(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powf(power) / 2.0
    }
}
