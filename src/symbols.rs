//! The reserved-symbol table.
//!
//! One table answers both "is this name reserved" and "what does it evaluate to", so the
//! parameter extractor and the compiler can never disagree about a name.

use crate::Real;
use crate::constants::PI;
use crate::functions;

/// A library function of one argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryFunction {
    Sin,
    Cos,
    Sqrt,
}

impl UnaryFunction {
    pub fn apply(self, arg: Real) -> Real {
        match self {
            UnaryFunction::Sin => functions::sin(arg),
            UnaryFunction::Cos => functions::cos(arg),
            UnaryFunction::Sqrt => functions::sqrt(arg),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryFunction::Sin => "sin",
            UnaryFunction::Cos => "cos",
            UnaryFunction::Sqrt => "sqrt",
        }
    }
}

/// What a reserved name means.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Symbol {
    /// The domain variable `x`.
    Variable,
    /// The clamped blend weight `alpha`.
    BlendWeight,
    /// A named constant such as `pi`.
    Constant(Real),
    /// A library function such as `sin`.
    Function(UnaryFunction),
}

const STANDARD_SYMBOLS: &[(&str, Symbol)] = &[
    ("x", Symbol::Variable),
    ("alpha", Symbol::BlendWeight),
    ("cos", Symbol::Function(UnaryFunction::Cos)),
    ("sin", Symbol::Function(UnaryFunction::Sin)),
    ("sqrt", Symbol::Function(UnaryFunction::Sqrt)),
    ("pi", Symbol::Constant(PI)),
];

/// Immutable mapping from reserved names to their meaning.
///
/// Names are case-sensitive: `pi` is reserved, `PI` is an ordinary parameter.
#[derive(Copy, Clone, Debug)]
pub struct SymbolTable {
    entries: &'static [(&'static str, Symbol)],
}

impl SymbolTable {
    /// The table with `x`, `alpha`, `cos`, `sin`, `sqrt` and `pi`.
    pub const fn standard() -> Self {
        Self {
            entries: STANDARD_SYMBOLS,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, symbol)| *symbol)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(name, _)| *name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Whether `name` is reserved in the standard table.
pub fn is_reserved(name: &str) -> bool {
    SymbolTable::standard().is_reserved(name)
}
