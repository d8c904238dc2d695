#![doc = r#"
# funfun

The core of a blended-curve plotter: two user expressions `f1(x)` and `f2(x)` are mixed by a
third, the blend, into

```text
y = f1(x) * (1 - alpha) + f2(x) * alpha,    alpha = clamp(blend(x), 0, 1)
```

and sampled into a pixel-space polyline.

## Overview

Expressions are plain arithmetic over `x`, never evaluated as host code:

- Numbers (`2`, `0.5`, `.5`), `x`, the constant `pi`, and the blend weight `alpha` (inside
  `f1` and `f2` only)
- Operators `+ - * / ^` with the usual precedence; `^` is right-associative and binds tighter
  than unary minus, so `-2^2` is `-4`
- The functions `sin`, `cos` and `sqrt`
- Any other identifier is a parameter, bound to a user-adjustable value that defaults to `0`

The pipeline is:

1. [`extract::extract_parameters`] finds the parameter names in the three texts.
2. [`compiler::compile`] parses, resolves and binds them into a [`compiler::CompiledCurve`].
3. [`sampler::sample`] evaluates the curve over a domain and maps it into a viewport.

[`session::Session`] drives the whole pipeline after every edit and persists the editable
state through a [`state::StateStore`].

## Quick Start

```rust
use funfun::Bump;
use funfun::compiler::{compile, Sources};
use funfun::extract::extract_parameters;
use funfun::sampler::{polyline_points, sample};
use funfun::state::Environment;

let sources = Sources::new("a * x", "1 - x", "x");
let params = extract_parameters(&sources.texts());
assert_eq!(params, vec!["a".to_string()]);

let mut env = Environment::new();
env.set("a", 2.0);

let arena = Bump::new();
let curve = compile(&arena, &sources, &params, &env).unwrap();
// 2x * (1 - x) + (1 - x) * x
assert_eq!(curve.eval(0.5), 0.75);

let points = sample(&curve, 0.0, 1.0, 2, 100.0, 100.0).unwrap();
assert_eq!(polyline_points(&points), "0,100,50,25,100,100");
```

## Errors

Compilation errors carry the field they came from, so an editor can show each one next to the
right input:

```rust
use funfun::Bump;
use funfun::compiler::{compile, Slot, Sources};
use funfun::error::ExprError;
use funfun::state::Environment;

let arena = Bump::new();
let sources = Sources::new("x", "tan(x)", "x");
let err = compile(&arena, &sources, &[], &Environment::new()).unwrap_err();
assert_eq!(err.slot, Slot::F2);
assert_eq!(err.error, ExprError::UnknownFunction { name: "tan".to_string() });
```

Evaluation itself never fails: `1 / 0` is infinite and `sqrt(-1)` is NaN, and the sampler
drops such points.

## Feature Flags

- `libm` (default): use `libm` for the transcendental functions
- `f32`: use 32-bit floating point instead of the default 64-bit
"#]

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod extract;
pub mod functions;
pub mod lexer;
pub mod sampler;
pub mod session;
pub mod state;
pub mod symbols;
pub mod types;

pub use bumpalo::Bump;
pub use compiler::{CompiledCurve, Param, Slot, Sources, compile, validate_sources};
pub use config::PlotConfig;
pub use engine::parse_expression;
pub use error::{CompileError, ExprError, SampleError, StateError};
pub use extract::extract_parameters;
pub use sampler::{Curve, Point, polyline_points, sample, sample_with};
pub use session::{Frame, Session};
pub use state::{AppState, Edit, Environment, FileStore, MemoryStore, StateStore};
pub use symbols::SymbolTable;
pub use types::AstExpr;

/// Define the floating-point type based on feature flags
#[cfg(feature = "f32")]
pub type Real = f32;

#[cfg(not(feature = "f32"))]
pub type Real = f64;

pub mod constants {
    use super::Real;

    #[cfg(feature = "f32")]
    pub const PI: Real = core::f32::consts::PI;
    #[cfg(feature = "f32")]
    pub const TEST_PRECISION: Real = 1e-6;

    #[cfg(not(feature = "f32"))]
    pub const PI: Real = core::f64::consts::PI;
    #[cfg(not(feature = "f32"))]
    pub const TEST_PRECISION: Real = 1e-10;
}

/// Utility macro to check if two floating point values are approximately equal
/// within a specified epsilon. Supports an optional message like assert_eq!.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $epsilon, "values differ")
    };
    ($left:expr, $right:expr, $epsilon:expr, $($arg:tt)+) => {{
        let left_val: $crate::Real = $left;
        let right_val: $crate::Real = $right;
        let eps: $crate::Real = $epsilon;

        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // Same-signed infinities are equal
        } else {
            assert!(
                (left_val - right_val).abs() < eps,
                "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`): {}",
                left_val,
                right_val,
                eps,
                format_args!($($arg)+)
            );
        }
    }};
}
