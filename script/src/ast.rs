use std::ops::Range;

use crate::precedence::Precedence;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// Arithmetic negation: -x
    Negation,
    /// Logical not: !x
    LogicalNot,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Negation => "-",
            UnaryOperator::LogicalNot => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LogicalAnd,
    LogicalOr,
    Equality,
    Inequality,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl BinaryOperator {
    pub fn precedence(self) -> Precedence {
        match self {
            BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => Precedence::Logical,
            BinaryOperator::Equality
            | BinaryOperator::Inequality
            | BinaryOperator::GreaterThan
            | BinaryOperator::LessThan
            | BinaryOperator::GreaterThanOrEqual
            | BinaryOperator::LessThanOrEqual => Precedence::Relational,
            BinaryOperator::Addition | BinaryOperator::Subtraction => Precedence::Additive,
            BinaryOperator::Multiplication | BinaryOperator::Division | BinaryOperator::Modulo => {
                Precedence::Multiplicative
            }
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::Equality => "==",
            BinaryOperator::Inequality => "!=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LessThanOrEqual => "<=",
        }
    }
}

/// An expression AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    NumberLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    UndefinedLiteral,
    ListLiteral(Vec<Expr>),

    Identifier(String, Range<usize>),

    // Operations
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // Postfix forms
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        span: Range<usize>,
    },
    Member {
        object: Box<Expr>,
        property: String,
        span: Range<usize>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Range<usize>,
    },
}

impl Expr {
    /// Best-effort source span; literals and operators report `None`.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Expr::Identifier(_, span)
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. } => Some(span.clone()),
            Expr::BinaryOperation { left, right, .. } => match (left.span(), right.span()) {
                (Some(l), Some(r)) => Some(l.start..r.end),
                (l, r) => l.or(r),
            },
            Expr::UnaryOperation { operand, .. } => operand.span(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignOperator {
    /// `x = e`
    Assign,
    /// `x += e` (and `x++`)
    AddAssign,
    /// `x -= e`
    SubtractAssign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `var a, b = e;`
    Var {
        declarations: Vec<(String, Option<Expr>)>,
        span: Range<usize>,
    },
    /// `name = e;`, `name += e;`, `name -= e;`, `name++;`
    Assignment {
        target: String,
        operator: AssignOperator,
        value: Expr,
        span: Range<usize>,
    },
    /// Expression evaluated for its side effects.
    Expression { value: Expr, span: Range<usize> },
    Function(FunctionDecl),
    /// `if (c) { } else if (c) { } else { }`
    If {
        branches: Vec<(Expr, Vec<Statement>)>,
        otherwise: Option<Vec<Statement>>,
        span: Range<usize>,
    },
    While {
        condition: Expr,
        body: Vec<Statement>,
        span: Range<usize>,
    },
    /// `for (init; condition; update) { }`
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expr>,
        update: Option<Box<Statement>>,
        body: Vec<Statement>,
        span: Range<usize>,
    },
    /// `for (var x of e) { }`
    ForOf {
        variable: String,
        declare: bool,
        iterable: Expr,
        body: Vec<Statement>,
        span: Range<usize>,
    },
    Return {
        value: Option<Expr>,
        span: Range<usize>,
    },
    Break(Range<usize>),
    Continue(Range<usize>),
}

impl Statement {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Statement::Var { span, .. }
            | Statement::Assignment { span, .. }
            | Statement::Expression { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::For { span, .. }
            | Statement::ForOf { span, .. }
            | Statement::Return { span, .. }
            | Statement::Break(span)
            | Statement::Continue(span) => span,
            Statement::Function(decl) => &decl.span,
        }
    }
}
