use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

use crate::error::{ExprError, Result};
use crate::lexer::{Lexer, Token};
use crate::types::{AstExpr, NEG, TokenKind};

/// Deepest accepted nesting, both of parser recursion and of the finished tree.
///
/// Resolution, evaluation and printing all walk the tree recursively, so bounding its height
/// bounds their stack use too.
pub const MAX_RECURSION_DEPTH: usize = 256;

/// A parsed sub-expression together with the height of its tree.
#[derive(Debug, Clone, Copy)]
struct Parsed<'arena> {
    expr: AstExpr<'arena>,
    depth: usize,
}

impl<'arena> Parsed<'arena> {
    fn leaf(expr: AstExpr<'arena>) -> Self {
        Self { expr, depth: 1 }
    }
}

/// Pratt parser for arithmetic expressions
struct PrattParser<'a, 'arena> {
    lexer: Lexer<'a>,
    current: Option<Token<'a>>,
    arena: &'arena Bump,
    recursion_depth: usize,
    max_recursion_depth: usize,
}

/// Token binding powers for the Pratt parser
#[derive(Debug, Clone, Copy)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    // For left-associative operators, right binding power is left + 1
    const fn left_assoc(power: u8) -> Self {
        Self::new(power, power + 1)
    }

    // For right-associative operators, right binding power is left - 1
    const fn right_assoc(power: u8) -> Self {
        Self::new(power, power - 1)
    }
}

impl<'a, 'arena> PrattParser<'a, 'arena> {
    fn new(input: &'a str, arena: &'arena Bump) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            arena,
            recursion_depth: 0,
            max_recursion_depth: MAX_RECURSION_DEPTH,
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.current.as_ref()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let tok = self.current.take();
        self.current = self.lexer.next_token();
        tok
    }

    fn get_binding_power(op: &str) -> Option<BindingPower> {
        match op {
            "+" | "-" => Some(BindingPower::left_assoc(1)),
            "*" | "/" => Some(BindingPower::left_assoc(3)),
            // Tighter than prefix minus so that -2^2 is -(2^2)
            "^" => Some(BindingPower::right_assoc(8)),
            _ => None,
        }
    }

    fn get_prefix_binding_power(op: &str) -> Option<u8> {
        match op {
            "+" | "-" => Some(5),
            _ => None,
        }
    }

    fn too_deep(&self) -> ExprError {
        ExprError::RecursionLimit(format!(
            "Expression too complex: exceeded maximum nesting depth of {}",
            self.max_recursion_depth
        ))
    }

    /// Allocate an operator or call node over `args`, one level above the deepest of them.
    fn node(&self, name: &'arena str, args: &[Parsed<'arena>]) -> Result<Parsed<'arena>> {
        let depth = args.iter().map(|a| a.depth).max().unwrap_or(0) + 1;
        if depth > self.max_recursion_depth {
            return Err(self.too_deep());
        }
        Ok(Parsed {
            expr: AstExpr::Function {
                name,
                args: self.arena.alloc_slice_fill_iter(args.iter().map(|a| a.expr)),
            },
            depth,
        })
    }

    fn operator_name(op: &str) -> &'static str {
        match op {
            "+" => "+",
            "-" => "-",
            "*" => "*",
            "/" => "/",
            _ => "^",
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Parsed<'arena>> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_recursion_depth {
            self.recursion_depth -= 1;
            return Err(self.too_deep());
        }

        let lhs = self.parse_prefix_or_primary()?;
        let lhs = self.parse_infix_operators(lhs, min_bp)?;

        self.recursion_depth -= 1;
        Ok(lhs)
    }

    fn parse_prefix_or_primary(&mut self) -> Result<Parsed<'arena>> {
        let prefix = match self.peek() {
            Some(tok) if tok.kind == TokenKind::Operator => {
                Self::get_prefix_binding_power(tok.text).map(|bp| (tok.text, tok.position, bp))
            }
            _ => None,
        };
        let Some((op, op_position, r_bp)) = prefix else {
            return self.parse_primary();
        };

        self.next();
        if self.peek().is_none() {
            return Err(ExprError::Syntax(format!(
                "Expected expression after '{}' at position {}",
                op, op_position
            )));
        }

        let rhs = self.parse_expr(r_bp)?;
        if op == "-" {
            self.node(NEG, &[rhs])
        } else {
            // Unary + is a no-op
            Ok(rhs)
        }
    }

    fn parse_infix_operators(
        &mut self,
        mut lhs: Parsed<'arena>,
        min_bp: u8,
    ) -> Result<Parsed<'arena>> {
        loop {
            let (op, position) = match self.peek() {
                Some(tok) if tok.kind == TokenKind::Operator => (tok.text, tok.position),
                _ => break,
            };

            let Some(bp) = Self::get_binding_power(op) else {
                break;
            };
            if bp.left < min_bp {
                break;
            }

            self.next();
            if self.peek().is_none() {
                return Err(ExprError::Syntax(format!(
                    "Expected expression after '{}' at position {}",
                    op, position
                )));
            }

            let rhs = self.parse_expr(bp.right)?;
            // a flat chain like `x+x+x` deepens the tree without deepening the recursion
            lhs = self.node(Self::operator_name(op), &[lhs, rhs])?;
        }
        Ok(lhs)
    }

    // Parse a primary expression (number, name, call, parenthesized expression)
    fn parse_primary(&mut self) -> Result<Parsed<'arena>> {
        let tok = match self.next() {
            Some(tok) => tok,
            None => return Err(ExprError::Syntax("Unexpected end of input".to_string())),
        };

        match tok.kind {
            TokenKind::Number => Ok(Parsed::leaf(AstExpr::Constant(tok.value.unwrap_or(0.0)))),
            TokenKind::Variable => {
                let name: &'arena str = self.arena.alloc_str(tok.text);
                if self.peek().is_some_and(|t| t.kind == TokenKind::Open) {
                    self.parse_function_call(name, tok.position)
                } else {
                    Ok(Parsed::leaf(AstExpr::Variable(name)))
                }
            }
            TokenKind::Open => {
                let expr = self.parse_expr(0)?;
                self.expect_close(tok.position)?;
                Ok(expr)
            }
            TokenKind::Close => Err(ExprError::Syntax(format!(
                "Unexpected closing parenthesis at position {}: check for balanced parentheses",
                tok.position
            ))),
            TokenKind::Error => Err(ExprError::Tokenizer(format!(
                "Unexpected input '{}' at position {}",
                tok.text, tok.position
            ))),
            TokenKind::Operator | TokenKind::Separator => Err(ExprError::Syntax(format!(
                "Unexpected token at position {}: '{}'",
                tok.position, tok.text
            ))),
        }
    }

    fn parse_function_call(
        &mut self,
        name: &'arena str,
        name_position: usize,
    ) -> Result<Parsed<'arena>> {
        let open_position = self.peek().map(|t| t.position).unwrap_or(name_position);
        self.next(); // consume '('

        let mut args = BumpVec::new_in(self.arena);
        if self.peek().is_some_and(|t| t.kind == TokenKind::Close) {
            self.next();
            return self.node(name, &args);
        }

        loop {
            args.push(self.parse_expr(0)?);
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::Separator => {
                    self.next();
                }
                _ => break,
            }
        }
        self.expect_close(open_position)?;

        self.node(name, &args)
    }

    fn expect_close(&mut self, open_position: usize) -> Result<()> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Close => {
                self.next();
                Ok(())
            }
            Some(tok) => Err(ExprError::Syntax(format!(
                "Expected closing parenthesis ')' but found '{}' at position {} (opening at position {})",
                tok.text, tok.position, open_position
            ))),
            None => Err(ExprError::UnmatchedParenthesis {
                position: open_position,
                found: "(".to_string(),
            }),
        }
    }

    fn parse(&mut self) -> Result<AstExpr<'arena>> {
        self.recursion_depth = 0;

        let parsed = self.parse_expr(0)?;

        if let Some(tok) = self.peek() {
            return Err(match tok.kind {
                TokenKind::Close => ExprError::UnmatchedParenthesis {
                    position: tok.position,
                    found: ")".to_string(),
                },
                TokenKind::Error => ExprError::Tokenizer(format!(
                    "Unexpected input '{}' at position {}",
                    tok.text, tok.position
                )),
                _ => ExprError::Syntax(format!(
                    "Unexpected token at position {}: '{}'",
                    tok.position, tok.text
                )),
            });
        }

        Ok(parsed.expr)
    }
}

/// Parse an expression string into an AST allocated in `arena`.
///
/// Only the arithmetic grammar is accepted; nothing in the text is ever executed. There is
/// no limit on the length of `input`, only on how deeply its tree nests.
///
/// ```
/// use bumpalo::Bump;
/// use funfun::engine::parse_expression;
///
/// let arena = Bump::new();
/// let ast = parse_expression("-2^2 + sin(x)", &arena).unwrap();
/// assert_eq!(ast.to_string(), "-2^2 + sin(x)");
/// assert!(parse_expression("x +", &arena).is_err());
/// ```
pub fn parse_expression<'arena>(input: &str, arena: &'arena Bump) -> Result<AstExpr<'arena>> {
    let mut parser = PrattParser::new(input, arena);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<String> {
        let arena = Bump::new();
        parse_expression(input, &arena).map(|ast| ast.to_string())
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(parse("1 + 2 * 3").unwrap(), "1 + 2 * 3");
        assert_eq!(parse("(1 + 2) * 3").unwrap(), "(1 + 2) * 3");
        assert_eq!(parse("a - b - c").unwrap(), "a - b - c");
        assert_eq!(parse("a - (b - c)").unwrap(), "a - (b - c)");
        assert_eq!(parse("2^3^2").unwrap(), "2^3^2");
        assert_eq!(parse("(2^3)^2").unwrap(), "(2^3)^2");
    }

    #[test]
    fn test_unary_operators() {
        let arena = Bump::new();
        let ast = parse_expression("-2^2", &arena).unwrap();
        match ast {
            AstExpr::Function { name, args } => {
                assert_eq!(name, NEG);
                assert!(matches!(args[0], AstExpr::Function { name: "^", .. }));
            }
            other => panic!("Expected negation, got {:?}", other),
        }
        assert_eq!(parse("+x").unwrap(), "x");
        assert_eq!(parse("2^-x").unwrap(), "2^(-x)");
        assert_eq!(parse("-x * 2").unwrap(), "-x * 2");
        assert_eq!(parse("-(x + 1)").unwrap(), "-(x + 1)");
    }

    #[test]
    fn test_function_calls() {
        let arena = Bump::new();
        let ast = parse_expression("sqrt(1 - x^2)", &arena).unwrap();
        match ast {
            AstExpr::Function { name, args } => {
                assert_eq!(name, "sqrt");
                assert_eq!(args.len(), 1);
            }
            other => panic!("Expected call, got {:?}", other),
        }
        // arity is checked later, during resolution
        match parse_expression("f(1, 2)", &arena).unwrap() {
            AstExpr::Function { args, .. } => assert_eq!(args.len(), 2),
            other => panic!("Expected call, got {:?}", other),
        }
        match parse_expression("g()", &arena).unwrap() {
            AstExpr::Function { args, .. } => assert!(args.is_empty()),
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_expressions() {
        assert!(matches!(parse("x +"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("-"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse(""), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("* 2"), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            parse("(x + 1"),
            Err(ExprError::UnmatchedParenthesis { position: 0, .. })
        ));
        assert!(matches!(
            parse("x + 1)"),
            Err(ExprError::UnmatchedParenthesis { position: 5, .. })
        ));
        assert!(matches!(parse(")"), Err(ExprError::Syntax(_))));
        assert!(matches!(
            parse("sin(x"),
            Err(ExprError::UnmatchedParenthesis { position: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_constructs_outside_grammar() {
        assert!(matches!(parse("x = 1"), Err(ExprError::Tokenizer(_))));
        assert!(matches!(parse("\"text\""), Err(ExprError::Tokenizer(_))));
        assert!(matches!(parse("[1, 2]"), Err(ExprError::Tokenizer(_))));
        assert!(matches!(parse("x; 1"), Err(ExprError::Tokenizer(_))));
        // no implicit multiplication
        assert!(matches!(parse("2x"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("a b"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("1, 2"), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn test_recursion_limit() {
        let deep = format!("{}x{}", "(".repeat(300), ")".repeat(300));
        assert!(matches!(parse(&deep), Err(ExprError::RecursionLimit(_))));
        let fine = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&fine).unwrap(), "x");
    }

    #[test]
    fn test_flat_chains_are_bounded_by_tree_depth() {
        // `x` plus k terms is a left-leaning tree of height k + 1
        let deepest = format!("x{}", "+x".repeat(MAX_RECURSION_DEPTH - 1));
        assert!(parse(&deepest).is_ok());
        let over = format!("x{}", "+x".repeat(MAX_RECURSION_DEPTH));
        assert!(matches!(parse(&over), Err(ExprError::RecursionLimit(_))));
        for n in [1000, 2500, 4999, 50_000] {
            let chain = format!("x{}", "*x".repeat(n));
            assert!(matches!(parse(&chain), Err(ExprError::RecursionLimit(_))));
        }
        let nested_calls = format!("{}x{}", "sin(".repeat(300), ")".repeat(300));
        assert!(matches!(parse(&nested_calls), Err(ExprError::RecursionLimit(_))));
    }

    #[test]
    fn test_long_input_is_not_rejected() {
        let padded = format!("{}x + 1{}", " ".repeat(20_000), " ".repeat(20_000));
        assert_eq!(parse(&padded).unwrap(), "x + 1");
    }
}
