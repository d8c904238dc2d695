//! Type definitions for the expression parser.
//!
//! This module contains the Abstract Syntax Tree (AST) produced by the parser and the token
//! kinds produced by the lexer. AST nodes live in a `bumpalo` arena owned by the caller.

use core::fmt;

use crate::Real;

/// Abstract Syntax Tree (AST) node representing an expression.
///
/// Operators are stored as [`AstExpr::Function`] nodes named after the operator symbol
/// (`"+"`, `"-"`, `"*"`, `"/"`, `"^"`); unary minus is `"-"` with a single argument.
/// Identifiers never contain operator characters, so these names cannot be spelled as calls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AstExpr<'arena> {
    /// A literal numerical value.
    ///
    /// Examples: `3.14`, `42`, `.5`
    Constant(Real),

    /// A named reference: `x`, `alpha`, `pi` or a parameter.
    Variable(&'arena str),

    /// An operator application or a call to a library function.
    ///
    /// Examples: `sin(x)`, `a * b`
    Function {
        /// The function name or operator symbol
        name: &'arena str,
        /// The arguments passed to the function
        args: &'arena [AstExpr<'arena>],
    },
}

/// Name used for unary minus nodes, told apart from subtraction by arity.
pub const NEG: &str = "-";

impl AstExpr<'_> {
    /// Binding strength used when printing, higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            AstExpr::Function { name, args } if args.len() == 2 => match *name {
                "+" | "-" => 1,
                "*" | "/" => 2,
                "^" => 4,
                _ => 5,
            },
            AstExpr::Function { name, args } if *name == NEG && args.len() == 1 => 3,
            _ => 5,
        }
    }

    fn is_operator(name: &str) -> bool {
        matches!(name, "+" | "-" | "*" | "/" | "^")
    }
}

/// Canonical infix rendering, parenthesized only where the tree needs it.
impl fmt::Display for AstExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstExpr::Constant(value) => write!(f, "{}", value),
            AstExpr::Variable(name) => write!(f, "{}", name),
            AstExpr::Function { name, args } if *name == NEG && args.len() == 1 => {
                let operand = &args[0];
                if operand.precedence() < 3 {
                    write!(f, "-({})", operand)
                } else {
                    write!(f, "-{}", operand)
                }
            }
            AstExpr::Function { name, args } if Self::is_operator(name) && args.len() == 2 => {
                let own = self.precedence();
                let (left, right) = (&args[0], &args[1]);
                // `^` groups to the right, the others to the left
                let (wrap_left, wrap_right) = if *name == "^" {
                    (left.precedence() <= own, right.precedence() < own)
                } else {
                    (left.precedence() < own, right.precedence() <= own)
                };
                if wrap_left {
                    write!(f, "({})", left)?;
                } else {
                    write!(f, "{}", left)?;
                }
                if *name == "^" {
                    write!(f, "^")?;
                } else {
                    write!(f, " {} ", name)?;
                }
                if wrap_right {
                    write!(f, "({})", right)
                } else {
                    write!(f, "{}", right)
                }
            }
            AstExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Classifies the kind of token produced during lexical analysis.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// A numerical literal.
    Number,

    /// An identifier: a run of ASCII letters and underscores.
    Variable,

    /// One of `+ - * / ^`.
    Operator,

    /// An opening parenthesis.
    Open,

    /// A closing parenthesis.
    Close,

    /// The argument separator `,`.
    Separator,

    /// Input the lexer could not classify.
    Error,
}
