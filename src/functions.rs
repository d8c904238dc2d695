//! Built-in mathematical functions for expression evaluation.
//!
//! With the default `libm` feature every routine goes through the `libm` crate, choosing the
//! `f32` or `f64` variant to match [`Real`]. Without it the std float methods are used.
//! Domain errors are not trapped: `sqrt(-1)` is NaN and `1/0` is infinite, and the sampler
//! drops such samples.

#[cfg(all(feature = "libm", feature = "f32"))]
use libm::{cosf as libm_cos, powf as libm_pow, sinf as libm_sin, sqrtf as libm_sqrt};

#[cfg(all(feature = "libm", not(feature = "f32")))]
use libm::{cos as libm_cos, pow as libm_pow, sin as libm_sin, sqrt as libm_sqrt};

use crate::Real;

/// Sine of `a` (radians).
pub fn sin(a: Real) -> Real {
    #[cfg(feature = "libm")]
    {
        libm_sin(a)
    }
    #[cfg(not(feature = "libm"))]
    {
        a.sin()
    }
}

/// Cosine of `a` (radians).
pub fn cos(a: Real) -> Real {
    #[cfg(feature = "libm")]
    {
        libm_cos(a)
    }
    #[cfg(not(feature = "libm"))]
    {
        a.cos()
    }
}

/// Square root of `a`; NaN for negative input.
pub fn sqrt(a: Real) -> Real {
    #[cfg(feature = "libm")]
    {
        libm_sqrt(a)
    }
    #[cfg(not(feature = "libm"))]
    {
        a.sqrt()
    }
}

/// `a` raised to the power `b`.
pub fn pow(a: Real, b: Real) -> Real {
    #[cfg(feature = "libm")]
    {
        libm_pow(a, b)
    }
    #[cfg(not(feature = "libm"))]
    {
        a.powf(b)
    }
}

/// Returns the larger of two values, or `b` when they do not compare.
pub fn max(a: Real, b: Real) -> Real {
    if a > b { a } else { b }
}

/// Returns the smaller of two values, or `b` when they do not compare.
pub fn min(a: Real, b: Real) -> Real {
    if a < b { a } else { b }
}

/// Clamps a blend weight to `[0, 1]` as `min(1, max(0, v))`.
///
/// NaN passes through unchanged so that an undefined weight yields an undefined sample
/// instead of silently snapping to one side.
pub fn clamp_unit(v: Real) -> Real {
    if v.is_nan() {
        return v;
    }
    min(1.0, max(0.0, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use crate::constants::PI;

    #[test]
    fn test_trig_at_known_points() {
        assert_approx_eq!(sin(0.0), 0.0);
        assert_approx_eq!(sin(PI / 2.0), 1.0);
        assert_approx_eq!(cos(PI), -1.0);
    }

    #[test]
    fn test_sqrt_and_pow() {
        assert_approx_eq!(sqrt(16.0), 4.0);
        assert!(sqrt(-1.0).is_nan());
        assert_approx_eq!(pow(2.0, 10.0), 1024.0);
        assert_approx_eq!(pow(4.0, 0.5), 2.0);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-3.0), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(2.0), 1.0);
        assert_eq!(clamp_unit(Real::INFINITY), 1.0);
        assert!(clamp_unit(Real::NAN).is_nan());
    }
}
