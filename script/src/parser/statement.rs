use crate::ast::{AssignOperator, Expr, FunctionDecl, Statement};
use crate::parser::Cursor;
use crate::parser::error::ParseError;
use crate::parser::lexer::Token;

impl Cursor {
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_span().start;

        let statement = match self.peek() {
            Some(Token::Var) => {
                let statement = self.parse_var(start)?;
                self.end_statement()?;
                statement
            }
            Some(Token::Function) => Statement::Function(self.parse_function(start)?),
            Some(Token::If) => self.parse_if(start)?,
            Some(Token::While) => {
                self.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_body()?;
                Statement::While {
                    condition,
                    body,
                    span: start..self.previous_end(),
                }
            }
            Some(Token::For) => self.parse_for(start)?,
            Some(Token::Return) => {
                self.advance();
                let value = if self.check(&Token::Semicolon) || self.check(&Token::RBrace) || self.at_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.end_statement()?;
                Statement::Return {
                    value,
                    span: start..self.previous_end(),
                }
            }
            Some(Token::Break) => {
                self.advance();
                self.end_statement()?;
                Statement::Break(start..self.previous_end())
            }
            Some(Token::Continue) => {
                self.advance();
                self.end_statement()?;
                Statement::Continue(start..self.previous_end())
            }
            Some(Token::LBrace) => {
                return Err(self
                    .error("bare blocks are not supported")
                    .with_note("blocks may only follow `if`, `else`, loops and functions"));
            }
            _ => {
                let statement = self.parse_simple(start)?;
                self.end_statement()?;
                statement
            }
        };

        Ok(statement)
    }

    /// A statement terminator: `;`, or nothing before `}` or end of input.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semicolon) || self.check(&Token::RBrace) || self.at_end() {
            Ok(())
        } else {
            Err(self.unexpected("`;`"))
        }
    }

    fn parse_var(&mut self, start: usize) -> Result<Statement, ParseError> {
        self.expect(Token::Var)?;
        let mut declarations = Vec::new();
        loop {
            let (name, _) = self.expect_ident()?;
            let init = if self.eat(&Token::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            declarations.push((name, init));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(Statement::Var {
            declarations,
            span: start..self.previous_end(),
        })
    }

    /// Assignment, increment or bare expression, without a terminator.
    fn parse_simple(&mut self, start: usize) -> Result<Statement, ParseError> {
        if let (Some(Token::Ident(name)), Some(next)) = (self.peek(), self.peek_at(1)) {
            let operator = match next {
                Token::Eq => Some(AssignOperator::Assign),
                Token::PlusEq | Token::PlusPlus => Some(AssignOperator::AddAssign),
                Token::MinusEq | Token::MinusMinus => Some(AssignOperator::SubtractAssign),
                _ => None,
            };
            if let Some(operator) = operator {
                let target = name.clone();
                let step = matches!(next, Token::PlusPlus | Token::MinusMinus);
                self.advance();
                self.advance();
                let value = if step {
                    Expr::NumberLiteral(1.0)
                } else {
                    self.parse_expression()?
                };
                return Ok(Statement::Assignment {
                    target,
                    operator,
                    value,
                    span: start..self.previous_end(),
                });
            }
        }

        let value = self.parse_expression()?;
        if matches!(self.peek(), Some(Token::Eq | Token::PlusEq | Token::MinusEq)) {
            return Err(self
                .error("invalid assignment target")
                .with_note("only plain variable names can be assigned"));
        }
        Ok(Statement::Expression {
            value,
            span: start..self.previous_end(),
        })
    }

    fn parse_function(&mut self, start: usize) -> Result<FunctionDecl, ParseError> {
        self.expect(Token::Function)?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                let (param, span) = self.expect_ident()?;
                if params.contains(&param) {
                    return Err(ParseError::error(
                        format!("duplicate parameter `{param}`"),
                        span,
                        self.file_id,
                    ));
                }
                params.push(param);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            params,
            body,
            span: start..self.previous_end(),
        })
    }

    fn parse_if(&mut self, start: usize) -> Result<Statement, ParseError> {
        self.expect(Token::If)?;
        let mut branches = vec![(self.parse_condition()?, self.parse_body()?)];
        let mut otherwise = None;

        while self.eat(&Token::Else) {
            if self.eat(&Token::If) {
                branches.push((self.parse_condition()?, self.parse_body()?));
            } else {
                otherwise = Some(self.parse_body()?);
                break;
            }
        }

        Ok(Statement::If {
            branches,
            otherwise,
            span: start..self.previous_end(),
        })
    }

    fn parse_for(&mut self, start: usize) -> Result<Statement, ParseError> {
        self.expect(Token::For)?;
        self.expect(Token::LParen)?;

        // for (var x of e) / for (x of e)
        let declare = self.check(&Token::Var);
        let name_offset = usize::from(declare);
        if let (Some(Token::Ident(name)), Some(Token::Of)) =
            (self.peek_at(name_offset), self.peek_at(name_offset + 1))
        {
            let variable = name.clone();
            for _ in 0..name_offset + 2 {
                self.advance();
            }
            let iterable = self.parse_expression()?;
            self.expect(Token::RParen)?;
            let body = self.parse_body()?;
            return Ok(Statement::ForOf {
                variable,
                declare,
                iterable,
                body,
                span: start..self.previous_end(),
            });
        }

        let init = if self.check(&Token::Semicolon) {
            None
        } else if declare {
            let init_start = self.current_span().start;
            Some(Box::new(self.parse_var(init_start)?))
        } else {
            let init_start = self.current_span().start;
            Some(Box::new(self.parse_simple(init_start)?))
        };
        self.expect(Token::Semicolon)?;

        let condition = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::Semicolon)?;

        let update = if self.check(&Token::RParen) {
            None
        } else {
            let update_start = self.current_span().start;
            Some(Box::new(self.parse_simple(update_start)?))
        };
        self.expect(Token::RParen)?;

        let body = self.parse_body()?;
        Ok(Statement::For {
            init,
            condition,
            update,
            body,
            span: start..self.previous_end(),
        })
    }

    /// `( expr )` after `if` or `while`.
    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;
        Ok(condition)
    }

    /// A braced block, or a single statement.
    fn parse_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        if self.check(&Token::LBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.at_end() {
                return Err(self.unexpected("`}`"));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;
        Ok(statements)
    }
}
