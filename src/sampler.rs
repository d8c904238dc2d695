//! Curve sampling into pixel space.
//!
//! The domain `[min_x, max_x]` is split into `steps` equal intervals and the curve is
//! evaluated at all `steps + 1` boundaries. Each sample maps to `(p * width, (1 - y) * height)`
//! where `p` is the fraction of the domain covered, so larger `y` plots higher on screen.
//! Samples whose `y` is NaN or infinite are dropped, leaving a gap in the polyline.

use core::fmt;

use log::trace;
use serde::Serialize;

use crate::Real;
use crate::compiler::CompiledCurve;
use crate::config::PlotConfig;
use crate::error::SampleError;

/// Anything that can be evaluated as `y = f(x)`.
pub trait Curve {
    fn y(&self, x: Real) -> Real;
}

impl<F> Curve for F
where
    F: Fn(Real) -> Real,
{
    fn y(&self, x: Real) -> Real {
        self(x)
    }
}

impl Curve for CompiledCurve<'_> {
    fn y(&self, x: Real) -> Real {
        self.eval(x)
    }
}

/// A polyline vertex in pixel space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: Real,
    pub y: Real,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Sample `curve` over `[min_x, max_x]` into a `width` x `height` viewport.
///
/// ```
/// use funfun::Real;
/// use funfun::sampler::sample;
///
/// let points = sample(&|x: Real| x, 0.0, 1.0, 2, 100.0, 50.0).unwrap();
/// assert_eq!(points.len(), 3);
/// assert_eq!((points[0].x, points[0].y), (0.0, 50.0));
/// assert_eq!((points[2].x, points[2].y), (100.0, 0.0));
/// ```
pub fn sample<C: Curve + ?Sized>(
    curve: &C,
    min_x: Real,
    max_x: Real,
    steps: usize,
    width: Real,
    height: Real,
) -> Result<Vec<Point>, SampleError> {
    let config = PlotConfig {
        min_x,
        max_x,
        steps,
        width,
        height,
    };
    sample_with(curve, &config)
}

/// [`sample`] with the domain and viewport taken from `config`.
pub fn sample_with<C: Curve + ?Sized>(
    curve: &C,
    config: &PlotConfig,
) -> Result<Vec<Point>, SampleError> {
    config.validate()?;

    let steps = config.steps;
    let mut points = Vec::with_capacity(steps + 1);
    for step in 0..=steps {
        let p = step as Real / steps as Real;
        let x = config.min_x + (config.max_x - config.min_x) * p;
        let y = curve.y(x);
        if !y.is_finite() {
            trace!("dropping non-finite sample y={} at x={}", y, x);
            continue;
        }
        points.push(Point {
            x: p * config.width,
            y: (1.0 - y) * config.height,
        });
    }
    Ok(points)
}

/// Text form of a polyline: `"x,y"` pairs joined by commas, usable as an SVG `points`
/// attribute.
pub fn polyline_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
