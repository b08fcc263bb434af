pub mod error;
mod expression;
mod lexer;
mod statement;

use std::ops::Range;

pub use error::ParseError;

use crate::Program;
use crate::parser::lexer::{Spanned, Token};

/// Stop collecting after this many syntax errors; later ones are usually noise.
const MAX_ERRORS: usize = 16;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source text into a complete Program.
    ///
    /// Statement-level errors are collected and parsing resumes at the next
    /// statement boundary, so one call can report several problems.
    pub fn parse(&self) -> Result<Program, Vec<ParseError>> {
        let tokens = lexer::tokenize(&self.source, self.file_id).map_err(|e| vec![e])?;
        let mut cursor = Cursor::new(tokens, self.file_id, self.source.len());

        let mut statements = Vec::new();
        let mut errors = Vec::new();

        while !cursor.at_end() {
            match cursor.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    errors.push(error);
                    if errors.len() >= MAX_ERRORS {
                        break;
                    }
                    cursor.synchronize();
                }
            }
        }

        if errors.is_empty() {
            Ok(Program {
                statements,
                source_id: self.file_id,
            })
        } else {
            Err(errors)
        }
    }
}

/// Token cursor shared by the expression and statement parsers.
pub(crate) struct Cursor {
    tokens: Vec<Spanned>,
    pos: usize,
    file_id: usize,
    source_len: usize,
}

impl Cursor {
    fn new(tokens: Vec<Spanned>, file_id: usize, source_len: usize) -> Self {
        Cursor {
            tokens,
            pos: 0,
            file_id,
            source_len,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume `token` if it is next.
    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Span of the next token, or an empty span at end of input.
    fn current_span(&self) -> Range<usize> {
        match self.tokens.get(self.pos) {
            Some(s) => s.span.clone(),
            None => self.source_len..self.source_len,
        }
    }

    /// End offset of the last consumed token.
    fn previous_end(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(s) => s.span.end,
            None => 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::error(message, self.current_span(), self.file_id)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => self.error(format!("expected {expected}, found {}", token.describe())),
            None => self.error(format!("expected {expected}, found end of input")),
        }
    }

    fn expect(&mut self, token: Token) -> Result<Range<usize>, ParseError> {
        if self.check(&token) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(&token.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Range<usize>), ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                let span = self.current_span();
                self.pos += 1;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Skip ahead to a plausible statement start after an error.
    fn synchronize(&mut self) {
        // Always make progress so a bad token cannot stall the loop.
        if self.advance().is_none() {
            return;
        }
        while let Some(token) = self.peek() {
            match token {
                Token::Semicolon => {
                    self.pos += 1;
                    return;
                }
                Token::RBrace
                | Token::Var
                | Token::Function
                | Token::If
                | Token::While
                | Token::For
                | Token::Return => return,
                _ => self.pos += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOperator, BinaryOperator, Expr, Statement};

    fn parse(source: &str) -> Program {
        Parser::new(source.to_string(), 0).parse().unwrap()
    }

    #[test]
    fn parses_declarations_and_calls() {
        let program = parse("var x;\nx = 5;\n__print(x);\n");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(&program.statements[0], Statement::Var { declarations, .. } if declarations[0].0 == "x"));
        assert!(matches!(
            &program.statements[1],
            Statement::Assignment { target, operator: AssignOperator::Assign, value: Expr::NumberLiteral(n), .. }
                if target == "x" && *n == 5.0
        ));
        assert!(matches!(&program.statements[2], Statement::Expression { value: Expr::Call { .. }, .. }));
    }

    #[test]
    fn parses_function_with_return() {
        let program = parse("function doble(n) {\n  return n * 2;\n}\n");
        let Statement::Function(decl) = &program.statements[0] else {
            panic!("expected function, got {:?}", program.statements[0]);
        };
        assert_eq!(decl.name, "doble");
        assert_eq!(decl.params, vec!["n".to_string()]);
        assert!(matches!(
            &decl.body[0],
            Statement::Return { value: Some(Expr::BinaryOperation { operator: BinaryOperator::Multiplication, .. }), .. }
        ));
    }

    #[test]
    fn collects_multiple_errors() {
        let errors = Parser::new("var = 1;\nx = ;\n__print(1);".to_string(), 7)
            .parse()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.file_id == 7));
    }

    #[test]
    fn reports_end_of_input() {
        let errors = Parser::new("if (x".to_string(), 0).parse().unwrap_err();
        assert!(errors[0].message.contains("end of input"), "{}", errors[0].message);
        assert_eq!(errors[0].span, 5..5);
    }

    #[test]
    fn lexer_errors_surface_as_parse_errors() {
        let errors = Parser::new("x = \"open".to_string(), 0).parse().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated"));
    }
}
