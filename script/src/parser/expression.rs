use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::parser::Cursor;
use crate::parser::error::ParseError;
use crate::parser::lexer::Token;
use crate::precedence::Precedence;

/// Infix operator for a token, if it is one.
fn infix_operator(token: &Token) -> Option<BinaryOperator> {
    Some(match token {
        Token::Plus => BinaryOperator::Addition,
        Token::Minus => BinaryOperator::Subtraction,
        Token::Star => BinaryOperator::Multiplication,
        Token::Slash => BinaryOperator::Division,
        Token::Percent => BinaryOperator::Modulo,
        Token::EqEq => BinaryOperator::Equality,
        Token::BangEq => BinaryOperator::Inequality,
        Token::Gt => BinaryOperator::GreaterThan,
        Token::Lt => BinaryOperator::LessThan,
        Token::GtEq => BinaryOperator::GreaterThanOrEqual,
        Token::LtEq => BinaryOperator::LessThanOrEqual,
        Token::AmpAmp => BinaryOperator::LogicalAnd,
        Token::PipePipe => BinaryOperator::LogicalOr,
        _ => return None,
    })
}

impl Cursor {
    /// Parse a whole expression.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr(Precedence::None)
    }

    // ------------------------------------------------------------------
    // Pratt parser core
    // ------------------------------------------------------------------

    /// Parse an expression whose operators all bind at least as tightly as
    /// `min`. Every binary operator is left-associative: its right operand
    /// is parsed one class tighter.
    fn parse_expr(&mut self, min: Precedence) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;

        loop {
            let Some(operator) = self.peek().and_then(infix_operator) else {
                break;
            };
            let precedence = operator.precedence();
            if precedence < min || precedence == Precedence::None {
                break;
            }
            self.advance();
            let right = self.parse_expr(precedence.tighter())?;
            left = Expr::BinaryOperation {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let operator = match self.peek() {
            Some(Token::Minus) => Some(UnaryOperator::Negation),
            Some(Token::Bang) => Some(UnaryOperator::LogicalNot),
            _ => None,
        };

        match operator {
            Some(operator) => {
                self.advance();
                let operand = self.parse_expr(Precedence::Unary)?;
                Ok(Expr::UnaryOperation {
                    operator,
                    operand: Box::new(operand),
                })
            }
            None => {
                let start = self.current_span().start;
                let primary = self.parse_primary()?;
                self.parse_postfix(primary, start)
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(spanned) = self.advance() else {
            return Err(self.unexpected("expression"));
        };

        match spanned.token {
            Token::Number(n) => Ok(Expr::NumberLiteral(n)),
            Token::StringLit(s) => Ok(Expr::StringLiteral(s)),
            Token::True => Ok(Expr::BooleanLiteral(true)),
            Token::False => Ok(Expr::BooleanLiteral(false)),
            Token::Undefined => Ok(Expr::UndefinedLiteral),
            Token::Ident(name) => Ok(Expr::Identifier(name, spanned.span)),

            // Parenthesized expression
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            // List literal
            Token::LBracket => {
                let items = self.parse_comma_list(Token::RBracket)?;
                Ok(Expr::ListLiteral(items))
            }

            _ => {
                // Point the error at the token we just consumed.
                self.pos -= 1;
                Err(self.unexpected("expression"))
            }
        }
    }

    /// Calls, member access and indexing, all left to right.
    fn parse_postfix(&mut self, mut expr: Expr, start: usize) -> Result<Expr, ParseError> {
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.advance();
                    let arguments = self.parse_comma_list(Token::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        arguments,
                        span: start..self.previous_end(),
                    };
                }
                Some(Token::Dot) => {
                    self.advance();
                    let (property, _) = self.expect_ident()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        span: start..self.previous_end(),
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span: start..self.previous_end(),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_comma_list(&mut self, close: Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.eat(&close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }
}
