//! The expression compiler.
//!
//! [`compile`] turns the three source texts (`f1`, `f2` and `blend`) into a
//! [`CompiledCurve`]: a pure function of `x` that closes over the parameter values current
//! at compile time, together with a canonical rendering of the composed computation.
//!
//! The blend expression yields the raw weight; the effective weight is
//! `alpha = min(1, max(0, blend))` and the curve is `f1 * (1 - alpha) + f2 * alpha`. An empty
//! `f1` or `f2` is not an error: the other side is used on its own, and with both sides
//! empty the curve is the constant `0`. An empty blend means `alpha = 0`.

use core::fmt;

use bumpalo::Bump;

use crate::Real;
use crate::engine::parse_expression;
use crate::error::CompileError;
use crate::eval::{Node, Resolver, Scope};
use crate::functions::clamp_unit;
use crate::state::Environment;
use crate::types::AstExpr;

/// One of the three user-editable expressions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    F1,
    F2,
    Blend,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::F1, Slot::F2, Slot::Blend];

    pub fn label(self) -> &'static str {
        match self {
            Slot::F1 => "f1",
            Slot::F2 => "f2",
            Slot::Blend => "blend",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three source texts of a curve.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sources<'s> {
    pub f1: &'s str,
    pub f2: &'s str,
    pub blend: &'s str,
}

impl<'s> Sources<'s> {
    pub fn new(f1: &'s str, f2: &'s str, blend: &'s str) -> Self {
        Self { f1, f2, blend }
    }

    pub fn get(&self, slot: Slot) -> &'s str {
        match slot {
            Slot::F1 => self.f1,
            Slot::F2 => self.f2,
            Slot::Blend => self.blend,
        }
    }

    pub fn texts(&self) -> [&'s str; 3] {
        [self.f1, self.f2, self.blend]
    }
}

/// A parameter with its name and bound value
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Real,
}

#[derive(Copy, Clone, Debug)]
struct Part<'arena> {
    ast: AstExpr<'arena>,
    node: &'arena Node<'arena>,
}

#[derive(Copy, Clone, Debug)]
enum Weight<'arena> {
    /// Folded at compile time, already clamped.
    Fixed(Real),
    Varying(Part<'arena>),
}

/// A compiled, safely evaluable blended curve.
///
/// The trees it evaluates live in the arena passed to [`compile`].
#[derive(Debug)]
pub struct CompiledCurve<'arena> {
    f1: Option<Part<'arena>>,
    f2: Option<Part<'arena>>,
    weight: Weight<'arena>,
    params: Vec<Param>,
    values: Vec<Real>,
    rendering: String,
}

impl CompiledCurve<'_> {
    /// The effective blend weight at `x`, clamped to `[0, 1]`.
    pub fn alpha(&self, x: Real) -> Real {
        match self.weight {
            Weight::Fixed(alpha) => alpha,
            Weight::Varying(part) => clamp_unit(part.node.eval(&Scope {
                x,
                // `alpha` never resolves inside the blend expression
                alpha: Real::NAN,
                params: &self.values,
            })),
        }
    }

    /// Evaluate the curve at `x`.
    pub fn eval(&self, x: Real) -> Real {
        let scope = Scope {
            x,
            alpha: self.alpha(x),
            params: &self.values,
        };
        match (self.f1, self.f2) {
            (Some(f1), Some(f2)) => {
                f1.node.eval(&scope) * (1.0 - scope.alpha) + f2.node.eval(&scope) * scope.alpha
            }
            (Some(only), None) | (None, Some(only)) => only.node.eval(&scope),
            (None, None) => 0.0,
        }
    }

    /// Parameters in the order they were compiled, with their bound values.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Human-readable listing of the compiled function. Display only.
    pub fn rendering(&self) -> &str {
        &self.rendering
    }
}

/// The listing behind [`CompiledCurve::rendering`].
impl fmt::Display for CompiledCurve<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x")?;
        for param in &self.params {
            write!(f, ", {} = {}", param.name, param.value)?;
        }
        writeln!(f, ") => {{")?;
        if let Some(f1) = &self.f1 {
            writeln!(f, "  f1 = {}", f1.ast)?;
        }
        if let Some(f2) = &self.f2 {
            writeln!(f, "  f2 = {}", f2.ast)?;
        }
        match &self.weight {
            Weight::Fixed(alpha) => writeln!(f, "  alpha = {}", alpha)?,
            Weight::Varying(part) => writeln!(f, "  alpha = min(1, max(0, {}))", part.ast)?,
        }
        let body = match (self.f1.is_some(), self.f2.is_some()) {
            (true, true) => "f1 * (1 - alpha) + f2 * alpha",
            (true, false) => "f1",
            (false, true) => "f2",
            (false, false) => "0",
        };
        writeln!(f, "  return {}", body)?;
        write!(f, "}}")
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Parse and resolve one slot's text.
///
/// Blank text is valid and yields `None`. `params` must be the parameter set extracted from
/// the current texts; a name missing from it is reported as unknown.
pub fn check_slot<'arena>(
    arena: &'arena Bump,
    slot: Slot,
    text: &str,
    params: &[String],
) -> Result<Option<(AstExpr<'arena>, &'arena Node<'arena>)>, CompileError> {
    if is_blank(text) {
        return Ok(None);
    }
    let ast = parse_expression(text, arena).map_err(|e| CompileError::new(slot, e))?;
    let resolver = Resolver::new(arena, params);
    let resolver = if slot == Slot::Blend {
        resolver.without_alpha()
    } else {
        resolver
    };
    let node = resolver
        .resolve(&ast)
        .map_err(|e| CompileError::new(slot, e))?;
    Ok(Some((ast, node)))
}

/// Validate every slot independently, so each broken field gets its own error.
pub fn validate_sources(sources: &Sources<'_>, params: &[String]) -> Vec<CompileError> {
    let arena = Bump::new();
    Slot::ALL
        .iter()
        .filter_map(|&slot| check_slot(&arena, slot, sources.get(slot), params).err())
        .collect()
}

/// Compile the three sources into a [`CompiledCurve`].
///
/// Fails with the first broken slot in `f1`, `f2`, `blend` order.
///
/// ```
/// use bumpalo::Bump;
/// use funfun::compiler::{compile, Sources};
/// use funfun::extract::extract_parameters;
/// use funfun::state::Environment;
///
/// let sources = Sources::new("x + a", "1 - x", "x");
/// let params = extract_parameters(&sources.texts());
/// let mut env = Environment::new();
/// env.set("a", 0.5);
///
/// let arena = Bump::new();
/// let curve = compile(&arena, &sources, &params, &env).unwrap();
/// assert_eq!(curve.eval(0.0), 0.5);
/// assert_eq!(curve.eval(1.0), 0.0);
/// ```
pub fn compile<'arena>(
    arena: &'arena Bump,
    sources: &Sources<'_>,
    params: &[String],
    env: &Environment,
) -> Result<CompiledCurve<'arena>, CompileError> {
    let part = |slot: Slot| -> Result<Option<Part<'arena>>, CompileError> {
        let checked = check_slot(arena, slot, sources.get(slot), params)?;
        Ok(checked.map(|(ast, node)| Part { ast, node }))
    };
    let f1 = part(Slot::F1)?;
    let f2 = part(Slot::F2)?;
    let blend = part(Slot::Blend)?;

    let params: Vec<Param> = params
        .iter()
        .map(|name| Param {
            name: name.clone(),
            value: env.get(name),
        })
        .collect();
    let values: Vec<Real> = params.iter().map(|p| p.value).collect();

    let weight = match blend {
        None => Weight::Fixed(0.0),
        Some(part) if part.node.is_constant() => {
            let raw = part.node.eval(&Scope {
                x: 0.0,
                alpha: Real::NAN,
                params: &values,
            });
            Weight::Fixed(clamp_unit(raw))
        }
        Some(part) => Weight::Varying(part),
    };

    let mut curve = CompiledCurve {
        f1,
        f2,
        weight,
        params,
        values,
        rendering: String::new(),
    };
    curve.rendering = curve.to_string();
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use crate::error::ExprError;
    use crate::extract::extract_parameters;

    fn build<'arena>(
        arena: &'arena Bump,
        f1: &str,
        f2: &str,
        blend: &str,
        env: &Environment,
    ) -> Result<CompiledCurve<'arena>, CompileError> {
        let sources = Sources::new(f1, f2, blend);
        let params = extract_parameters(&sources.texts());
        compile(arena, &sources, &params, env)
    }

    #[test]
    fn test_linear_blend_endpoints() {
        let arena = Bump::new();
        let curve = build(&arena, "1", "0", "x", &Environment::new()).unwrap();
        assert_approx_eq!(curve.eval(0.0), 1.0);
        assert_approx_eq!(curve.eval(1.0), 0.0);
        assert_approx_eq!(curve.eval(0.25), 0.75);
    }

    #[test]
    fn test_blend_is_clamped() {
        let arena = Bump::new();
        let curve = build(&arena, "x * 100", "x * x", "2", &Environment::new()).unwrap();
        for x in [-1.0, 0.0, 0.3, 2.0] {
            assert_approx_eq!(curve.alpha(x), 1.0);
            assert_approx_eq!(curve.eval(x), x * x);
        }
        let curve = build(&arena, "3", "4", "x - 10", &Environment::new()).unwrap();
        assert_approx_eq!(curve.alpha(0.5), 0.0);
        assert_approx_eq!(curve.eval(0.5), 3.0);
    }

    #[test]
    fn test_missing_sides_degrade_gracefully() {
        let arena = Bump::new();
        let env = Environment::new();
        let only_f2 = build(&arena, "", "x + 2", "0.5", &env).unwrap();
        assert_approx_eq!(only_f2.eval(1.0), 3.0);
        let only_f1 = build(&arena, "x * 3", "  ", "0.5", &env).unwrap();
        assert_approx_eq!(only_f1.eval(1.0), 3.0);
        let neither = build(&arena, "", "", "x", &env).unwrap();
        assert_eq!(neither.eval(0.7), 0.0);
    }

    #[test]
    fn test_empty_blend_uses_f1() {
        let arena = Bump::new();
        let curve = build(&arena, "1", "2", "", &Environment::new()).unwrap();
        assert_eq!(curve.alpha(0.5), 0.0);
        assert_approx_eq!(curve.eval(0.5), 1.0);
    }

    #[test]
    fn test_parameters_bind_current_values() {
        let arena = Bump::new();
        let mut env = Environment::new();
        env.set("amp", 2.0);
        let curve = build(&arena, "amp * x + offset", "0", "0", &env).unwrap();
        // offset is absent from the environment and binds to 0
        assert_eq!(
            curve.params(),
            &[
                Param {
                    name: "amp".to_string(),
                    value: 2.0
                },
                Param {
                    name: "offset".to_string(),
                    value: 0.0
                },
            ]
        );
        assert_approx_eq!(curve.eval(3.0), 6.0);
    }

    #[test]
    fn test_alpha_is_visible_in_sides() {
        let arena = Bump::new();
        let curve = build(&arena, "alpha", "0", "x", &Environment::new()).unwrap();
        // f1 * (1 - alpha) with f1 = alpha
        assert_approx_eq!(curve.eval(0.5), 0.25);
    }

    #[test]
    fn test_errors_are_tagged_with_slot() {
        let arena = Bump::new();
        let env = Environment::new();
        let err = build(&arena, "x +", "1 - x", "x", &env).unwrap_err();
        assert_eq!(err.slot, Slot::F1);
        assert!(matches!(err.error, ExprError::Syntax(_)));

        let err = build(&arena, "x", "tan(x)", "x", &env).unwrap_err();
        assert_eq!(err.slot, Slot::F2);

        let err = build(&arena, "x", "x", "alpha", &env).unwrap_err();
        assert_eq!(err.slot, Slot::Blend);
        assert!(matches!(err.error, ExprError::Unavailable { .. }));
    }

    #[test]
    fn test_validate_reports_each_broken_slot() {
        let params = Vec::new();
        let errors = validate_sources(&Sources::new("x +", "1 - x", "x"), &params);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].slot, Slot::F1);

        let errors = validate_sources(&Sources::new("(", "1 - x", "sin(x, x)"), &params);
        let slots: Vec<Slot> = errors.iter().map(|e| e.slot).collect();
        assert_eq!(slots, vec![Slot::F1, Slot::Blend]);
    }

    #[test]
    fn test_stale_parameter_list_is_rejected() {
        let arena = Bump::new();
        let sources = Sources::new("x + b", "0", "0");
        let stale = vec!["a".to_string()];
        let err = compile(&arena, &sources, &stale, &Environment::new()).unwrap_err();
        assert_eq!(
            err.error,
            ExprError::UnknownVariable {
                name: "b".to_string()
            }
        );
    }

    #[test]
    fn test_rendering() {
        let arena = Bump::new();
        let mut env = Environment::new();
        env.set("a", 0.5);
        let curve = build(&arena, "x + a", "1 - x", "x", &env).unwrap();
        assert_eq!(
            curve.rendering(),
            "(x, a = 0.5) => {\n  f1 = x + a\n  f2 = 1 - x\n  alpha = min(1, max(0, x))\n  return f1 * (1 - alpha) + f2 * alpha\n}"
        );
        assert_eq!(curve.to_string(), curve.rendering());
    }

    #[test]
    fn test_rendering_folds_constant_blend() {
        let arena = Bump::new();
        let curve = build(&arena, "", "sin(pi * x)", "3 / 2", &Environment::new()).unwrap();
        assert_eq!(
            curve.rendering(),
            "(x) => {\n  f2 = sin(pi * x)\n  alpha = 1\n  return f2\n}"
        );
    }
}
