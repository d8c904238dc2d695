//! Name resolution and tree-walking evaluation.
//!
//! A parsed [`AstExpr`] is resolved once against the symbol table and the parameter list
//! into a [`Node`] tree in which every name is already bound: `x` and `alpha` become slots,
//! parameters become indices into the value array, and `pi` becomes a constant. Evaluating
//! a `Node` can therefore never fail; undefined arithmetic yields NaN or infinity.

use bumpalo::Bump;

use crate::Real;
use crate::error::{ExprError, Result};
use crate::functions::pow;
use crate::symbols::{Symbol, SymbolTable, UnaryFunction};
use crate::types::{AstExpr, NEG};

/// A binary arithmetic operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn from_symbol(name: &str) -> Option<Self> {
        match name {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            "^" => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    pub fn apply(self, a: Real, b: Real) -> Real {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => pow(a, b),
        }
    }
}

/// A resolved expression tree, allocated in the same arena as its AST.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Node<'arena> {
    Constant(Real),
    /// The domain variable.
    X,
    /// The clamped blend weight at the current `x`.
    Alpha,
    /// Index into the bound parameter values.
    Param(usize),
    Neg(&'arena Node<'arena>),
    Binary {
        op: BinaryOp,
        left: &'arena Node<'arena>,
        right: &'arena Node<'arena>,
    },
    Call {
        func: UnaryFunction,
        arg: &'arena Node<'arena>,
    },
}

/// Values visible to a [`Node`] during evaluation.
#[derive(Copy, Clone, Debug)]
pub struct Scope<'v> {
    pub x: Real,
    pub alpha: Real,
    pub params: &'v [Real],
}

impl Node<'_> {
    pub fn eval(&self, scope: &Scope<'_>) -> Real {
        match *self {
            Node::Constant(value) => value,
            Node::X => scope.x,
            Node::Alpha => scope.alpha,
            // Resolution only hands out indices below params.len()
            Node::Param(idx) => scope.params.get(idx).copied().unwrap_or(0.0),
            Node::Neg(operand) => -operand.eval(scope),
            Node::Binary { op, left, right } => op.apply(left.eval(scope), right.eval(scope)),
            Node::Call { func, arg } => func.apply(arg.eval(scope)),
        }
    }

    /// True when the value does not depend on `x`, `alpha` or any parameter.
    pub fn is_constant(&self) -> bool {
        match *self {
            Node::Constant(_) => true,
            Node::X | Node::Alpha | Node::Param(_) => false,
            Node::Neg(operand) => operand.is_constant(),
            Node::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Node::Call { arg, .. } => arg.is_constant(),
        }
    }
}

/// Binds the names of an [`AstExpr`] and checks calls against the function library.
pub struct Resolver<'p, 'arena> {
    arena: &'arena Bump,
    table: SymbolTable,
    params: &'p [String],
    allow_alpha: bool,
}

impl<'p, 'arena> Resolver<'p, 'arena> {
    pub fn new(arena: &'arena Bump, params: &'p [String]) -> Self {
        Self {
            arena,
            table: SymbolTable::standard(),
            params,
            allow_alpha: true,
        }
    }

    /// Forbid `alpha`, for the expression that defines it.
    pub fn without_alpha(mut self) -> Self {
        self.allow_alpha = false;
        self
    }

    pub fn resolve(&self, ast: &AstExpr<'_>) -> Result<&'arena Node<'arena>> {
        let node = match ast {
            AstExpr::Constant(value) => Node::Constant(*value),
            AstExpr::Variable(name) => self.resolve_name(name)?,
            AstExpr::Function { name, args } => self.resolve_call(name, args)?,
        };
        Ok(self.arena.alloc(node))
    }

    fn resolve_name(&self, name: &str) -> Result<Node<'arena>> {
        match self.table.lookup(name) {
            Some(Symbol::Variable) => Ok(Node::X),
            Some(Symbol::BlendWeight) if self.allow_alpha => Ok(Node::Alpha),
            Some(Symbol::BlendWeight) => Err(ExprError::Unavailable {
                name: name.to_string(),
            }),
            Some(Symbol::Constant(value)) => Ok(Node::Constant(value)),
            Some(Symbol::Function(func)) => Err(ExprError::Syntax(format!(
                "'{}' is a function and must be called, e.g. {}(x)",
                name,
                func.name()
            ))),
            None => self
                .params
                .iter()
                .position(|p| p == name)
                .map(Node::Param)
                .ok_or_else(|| ExprError::UnknownVariable {
                    name: name.to_string(),
                }),
        }
    }

    fn resolve_call(&self, name: &str, args: &[AstExpr<'_>]) -> Result<Node<'arena>> {
        if name == NEG && args.len() == 1 {
            return Ok(Node::Neg(self.resolve(&args[0])?));
        }
        if let Some(op) = BinaryOp::from_symbol(name) {
            if let [left, right] = args {
                return Ok(Node::Binary {
                    op,
                    left: self.resolve(left)?,
                    right: self.resolve(right)?,
                });
            }
        }

        match self.table.lookup(name) {
            Some(Symbol::Function(func)) => match args {
                [arg] => Ok(Node::Call {
                    func,
                    arg: self.resolve(arg)?,
                }),
                _ => Err(ExprError::InvalidFunctionCall {
                    name: name.to_string(),
                    expected: 1,
                    found: args.len(),
                }),
            },
            _ => Err(ExprError::UnknownFunction {
                name: name.to_string(),
            }),
        }
    }
}
