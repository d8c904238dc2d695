use crate::Real;
use crate::types::TokenKind;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: Option<Real>,
    pub text: &'a str,
    pub position: usize,
}

/// The lexer struct, which produces tokens from an input string.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pub pos: usize,
}

/// Identifiers are runs of ASCII letters and underscores; digits end them.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Peek at the current character.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Advance the position by one character.
    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize, value: Option<Real>) -> Token<'a> {
        Token {
            kind,
            value,
            text: &self.input[start..self.pos],
            position: start,
        }
    }

    /// Scan a decimal literal: digits with at most one `.`, at least one digit overall.
    fn lex_number(&mut self, start: usize) -> Token<'a> {
        let mut saw_dot = false;
        let mut has_digits = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                has_digits = true;
                self.advance();
            } else if c == '.' && !saw_dot {
                saw_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if !has_digits {
            return self.token(TokenKind::Error, start, None);
        }

        match self.input[start..self.pos].parse::<Real>() {
            Ok(val) => self.token(TokenKind::Number, start, Some(val)),
            Err(_) => self.token(TokenKind::Error, start, None),
        }
    }

    /// Get the next token from the input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        let start_pos = self.pos;
        let c = self.peek()?;

        if c.is_ascii_digit() || c == '.' {
            return Some(self.lex_number(start_pos));
        }

        if is_identifier_char(c) {
            while self.peek().is_some_and(is_identifier_char) {
                self.advance();
            }
            return Some(self.token(TokenKind::Variable, start_pos, None));
        }

        let kind = match c {
            '+' | '-' | '*' | '/' | '^' => TokenKind::Operator,
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            ',' => TokenKind::Separator,
            _ => TokenKind::Error,
        };
        self.advance();
        Some(self.token(kind, start_pos, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token() {
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn test_lexer_tokenization_all_types() {
        let mut lexer = Lexer::new("1 + foo_bar * (2.5) , -baz / 4.2 ^ _x");
        let mut tokens = Vec::new();
        while let Some(tok) = lexer.next_token() {
            tokens.push(tok);
        }
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Number));
        assert!(kinds.contains(&TokenKind::Operator));
        assert!(kinds.contains(&TokenKind::Variable));
        assert!(kinds.contains(&TokenKind::Open));
        assert!(kinds.contains(&TokenKind::Close));
        assert!(kinds.contains(&TokenKind::Separator));
        assert!(!kinds.contains(&TokenKind::Error));
        assert_eq!(tokens[2].text, "foo_bar");
        assert_eq!(tokens[2].position, 4);
    }

    #[test]
    fn test_lexer_decimal_with_leading_dot() {
        let mut lexer = Lexer::new(".5 .125 3.");
        assert_eq!(lexer.next_token().unwrap().value, Some(0.5));
        assert_eq!(lexer.next_token().unwrap().value, Some(0.125));
        assert_eq!(lexer.next_token().unwrap().value, Some(3.0));
        assert!(lexer.next_token().is_none());
    }

    #[test]
    fn test_lexer_digits_split_identifiers() {
        let mut lexer = Lexer::new("a1b");
        let a = lexer.next_token().unwrap();
        let one = lexer.next_token().unwrap();
        let b = lexer.next_token().unwrap();
        assert_eq!((a.kind, a.text), (TokenKind::Variable, "a"));
        assert_eq!((one.kind, one.value), (TokenKind::Number, Some(1.0)));
        assert_eq!((b.kind, b.text), (TokenKind::Variable, "b"));
    }

    #[test]
    fn test_lexer_error_tokens() {
        assert_eq!(
            kinds("1 $ 2"),
            vec![TokenKind::Number, TokenKind::Error, TokenKind::Number]
        );
        // a lone dot has no digits
        assert_eq!(kinds("."), vec![TokenKind::Error]);
        assert_eq!(kinds("x = 1")[1], TokenKind::Error);
    }

    #[test]
    fn test_lexer_second_dot_starts_new_token() {
        let mut lexer = Lexer::new("1.2.3");
        assert_eq!(lexer.next_token().unwrap().value, Some(1.2));
        let rest = lexer.next_token().unwrap();
        assert_eq!(rest.text, ".3");
        assert_eq!(rest.value, Some(0.3));
    }

    #[test]
    fn test_lexer_handles_multibyte_input() {
        assert_eq!(
            kinds("π + 1"),
            vec![TokenKind::Error, TokenKind::Operator, TokenKind::Number]
        );
    }
}
