//! Block graph to script source.
//!
//! Every block type maps to a [`Rule`]: statement rules emit lines of code,
//! value rules emit an expression together with its [`Precedence`] class.
//! A parent asks for a child's code at the class its position requires and
//! the child is parenthesized only when it binds strictly looser, so the
//! output carries no redundant parentheses and never regroups.
//!
//! Generation is total. Missing inputs become default literals and block
//! types without a rule become inline comments plus a
//! [`GenerationDiagnostic`].

mod names;
mod rules;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use script::precedence::Precedence;

use crate::block::{Block, BlockId};
use crate::catalog::{SocketKind, ValueKind};
use crate::procedures;
use crate::workspace::Workspace;

pub use names::{NameCategory, NameDb, RESERVED_WORDS, safe_name};
pub use rules::{number_literal, quote};

/// One level of indentation in generated code.
pub const INDENT: &str = "  ";

pub type StatementRule = fn(&mut Context<'_>, &Block) -> String;
pub type ValueRule = fn(&mut Context<'_>, &Block) -> (String, Precedence);

#[derive(Clone, Copy)]
pub enum Rule {
    Statement(StatementRule),
    Value(ValueRule),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Statement(_) => f.write_str("Rule::Statement"),
            Rule::Value(_) => f.write_str("Rule::Value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationDiagnostic {
    UnsupportedBlockType { block: BlockId, type_name: String },
}

impl fmt::Display for GenerationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationDiagnostic::UnsupportedBlockType { block, type_name } => {
                write!(f, "block {block}: no code generator for block type `{type_name}`")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    pub source: String,
    /// Precedence class of every value block that was emitted.
    pub precedences: BTreeMap<BlockId, Precedence>,
    pub diagnostics: Vec<GenerationDiagnostic>,
}

/// Dispatch table from block type to emission rule.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    rules: HashMap<String, Rule>,
}

impl Generator {
    pub fn empty() -> Self {
        Generator::default()
    }

    /// Rules for every block type of [`BlockCatalog::standard`](crate::catalog::BlockCatalog::standard).
    pub fn standard() -> Self {
        let mut generator = Generator::empty();
        rules::register_standard(&mut generator);
        generator
    }

    pub fn register(&mut self, type_name: &str, rule: Rule) {
        self.rules.insert(type_name.to_string(), rule);
    }

    pub fn has_rule(&self, type_name: &str) -> bool {
        self.rules.contains_key(type_name)
    }

    pub fn generate(&self, workspace: &Workspace) -> GeneratedProgram {
        let mut ctx = Context {
            workspace,
            rules: &self.rules,
            names: NameDb::new(),
            helpers: BTreeMap::new(),
            precedences: BTreeMap::new(),
            diagnostics: Vec::new(),
        };

        // Claim names in a fixed order: helpers, procedures, then variables.
        for helper in rules::HELPER_NAMES {
            ctx.names.reserve(helper);
        }
        for procedure in workspace.list_procedures() {
            ctx.procedure_name(&procedure.name);
        }
        let variables: Vec<String> = workspace
            .variables()
            .iter()
            .map(|v| ctx.variable_name(v))
            .collect();

        let mut definitions = Vec::new();
        let mut statements = Vec::new();
        for id in workspace.top_blocks() {
            let Some(block) = workspace.block(id) else { continue };
            if procedures::is_definition(block.type_name()) {
                definitions.push(ctx.block_to_code(block));
            } else {
                statements.push(ctx.chain_to_code(id));
            }
        }

        let mut sections = Vec::new();
        if !variables.is_empty() {
            sections.push(format!("var {};\n", variables.join(", ")));
        }
        sections.extend(ctx.helpers.values().cloned());
        sections.extend(definitions);
        sections.extend(statements);

        tracing::debug!(
            blocks = workspace.len(),
            diagnostics = ctx.diagnostics.len(),
            "generated program"
        );

        GeneratedProgram {
            source: sections.join("\n"),
            precedences: ctx.precedences,
            diagnostics: ctx.diagnostics,
        }
    }
}

/// Generation state handed to every rule.
pub struct Context<'a> {
    workspace: &'a Workspace,
    rules: &'a HashMap<String, Rule>,
    names: NameDb,
    helpers: BTreeMap<&'static str, String>,
    precedences: BTreeMap<BlockId, Precedence>,
    diagnostics: Vec<GenerationDiagnostic>,
}

impl<'a> Context<'a> {
    pub fn workspace(&self) -> &'a Workspace {
        self.workspace
    }

    pub fn variable_name(&mut self, name: &str) -> String {
        self.names.get_name(NameCategory::Variable, name)
    }

    pub fn procedure_name(&mut self, name: &str) -> String {
        self.names.get_name(NameCategory::Procedure, name)
    }

    /// A fresh identifier for generated temporaries (loop counters and the like).
    pub fn distinct_name(&mut self, base: &str) -> String {
        self.names.get_distinct_name(base)
    }

    /// Emit `definition` once, ahead of procedure definitions.
    pub fn require_helper(&mut self, name: &'static str, definition: &str) {
        self.helpers.entry(name).or_insert_with(|| definition.to_string());
    }

    /// Code of the block in value input `socket`, parenthesized if it binds
    /// looser than `required`, or the socket's default literal when empty.
    pub fn value_to_code(&mut self, block: &Block, socket: &str, required: Precedence) -> String {
        let default = default_literal(block, socket);
        self.value_to_code_or(block, socket, required, default)
    }

    /// Like [`Context::value_to_code`] with an explicit default.
    pub fn value_to_code_or(&mut self, block: &Block, socket: &str, required: Precedence, default: &str) -> String {
        let workspace = self.workspace;
        let Some(child) = block.child(socket).and_then(|id| workspace.block(id)) else {
            return default.to_string();
        };
        match self.expression(child) {
            Some((code, precedence)) if precedence.needs_parens_in(required) => format!("({code})"),
            Some((code, _)) => code,
            None => format!("/* unsupported block type: {} */ {default}", child.type_name()),
        }
    }

    /// Indented code of the statement chain in input `socket`.
    pub fn statement_to_code(&mut self, block: &Block, socket: &str) -> String {
        let Some(first) = block.child(socket) else {
            return String::new();
        };
        let code = self.chain_to_code(first);
        let mut indented = String::with_capacity(code.len());
        for line in code.lines() {
            if !line.is_empty() {
                indented.push_str(INDENT);
                indented.push_str(line);
            }
            indented.push('\n');
        }
        indented
    }

    fn chain_to_code(&mut self, first: BlockId) -> String {
        let workspace = self.workspace;
        workspace
            .chain(first)
            .into_iter()
            .filter_map(|id| workspace.block(id))
            .map(|block| self.block_to_code(block))
            .collect()
    }

    fn block_to_code(&mut self, block: &Block) -> String {
        match self.rules.get(block.type_name()).copied() {
            Some(Rule::Statement(rule)) => rule(self, block),
            // An orphan value block runs as an expression statement.
            Some(Rule::Value(_)) => match self.expression(block) {
                Some((code, _)) => format!("{code};\n"),
                None => String::new(),
            },
            None => {
                self.unsupported(block);
                format!("// unsupported block type: {}\n", block.type_name())
            }
        }
    }

    fn expression(&mut self, block: &Block) -> Option<(String, Precedence)> {
        match self.rules.get(block.type_name()).copied() {
            Some(Rule::Value(rule)) => {
                let (code, precedence) = rule(self, block);
                self.precedences.insert(block.id(), precedence);
                Some((code, precedence))
            }
            _ => {
                self.unsupported(block);
                None
            }
        }
    }

    fn unsupported(&mut self, block: &Block) {
        tracing::warn!(block = %block.id(), type_name = block.type_name(), "no generator rule for block type");
        self.diagnostics.push(GenerationDiagnostic::UnsupportedBlockType {
            block: block.id(),
            type_name: block.type_name().to_string(),
        });
    }
}

/// The literal an empty value socket stands for.
fn default_literal(block: &Block, socket: &str) -> &'static str {
    match block.input(socket).map(|i| i.kind) {
        Some(SocketKind::Value(ValueKind::Number)) => "0",
        Some(SocketKind::Value(ValueKind::Boolean)) => "false",
        Some(SocketKind::Value(ValueKind::List)) => "[]",
        _ => "''",
    }
}
