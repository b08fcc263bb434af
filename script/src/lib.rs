pub mod ast;
pub mod parser;
pub mod precedence;

use crate::ast::Statement;

/// A parsed script program.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
