use std::ops::Range;
use std::rc::Rc;

use script::Program;
use script::ast::{AssignOperator, BinaryOperator, FunctionDecl, Statement};

use crate::ambient::Ambient;
use crate::builtins::{self, Builtin};
use crate::config::SandboxConfig;
use crate::environment::{Environment, Scope};
use crate::error::{Fault, RuntimeError};
use crate::evaluator::eval_binary_op;
use crate::runtime_value::RuntimeValue;

/// Emit a trace event every this many steps.
const STEP_CHECKPOINT: u64 = 100_000;

/// Observable effects of a run.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub output_lines: Vec<String>,
    pub declared_answer: Option<f64>,
}

/// How a statement finished.
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Break(Range<usize>),
    Continue(Range<usize>),
    Return(RuntimeValue),
}

/// State of one run: fresh for every program, dropped afterwards.
pub(crate) struct Interpreter<'a> {
    pub(crate) env: Environment,
    pub(crate) effects: Effects,
    pub(crate) ambient: &'a mut dyn Ambient,
    pub(crate) source_id: usize,
    config: &'a SandboxConfig,
    steps: u64,
    nesting: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(config: &'a SandboxConfig, ambient: &'a mut dyn Ambient, source_id: usize) -> Self {
        let mut globals = Scope::default();
        globals.set_variable(Builtin::Print.name(), RuntimeValue::Builtin(Builtin::Print));
        globals.set_variable(Builtin::SetAnswer.name(), RuntimeValue::Builtin(Builtin::SetAnswer));
        for (name, value) in builtins::ambient_globals() {
            globals.set_variable(name, value);
        }
        Interpreter {
            env: Environment::new(globals),
            effects: Effects::default(),
            ambient,
            source_id,
            config,
            steps: 0,
            nesting: 0,
        }
    }

    /// Execute a whole program. The value of a top-level `return` is its
    /// completion value.
    pub fn execute_program(&mut self, program: &Program) -> Result<Option<RuntimeValue>, Fault> {
        self.hoist(&program.statements);
        let flow = self.execute_block(&program.statements)?;
        tracing::debug!(steps = self.steps, "program finished");
        match flow {
            Flow::Normal => Ok(None),
            Flow::Return(value) => Ok(Some(value)),
            Flow::Break(span) => Err(self.fault(RuntimeError::IllegalControlFlow("break"), span)),
            Flow::Continue(span) => Err(self.fault(RuntimeError::IllegalControlFlow("continue"), span)),
        }
    }

    pub(crate) fn fault(&self, error: RuntimeError, span: Range<usize>) -> Fault {
        Fault::new(error, span, self.source_id)
    }

    /// Count one step against the budget.
    fn tick(&mut self, span: &Range<usize>) -> Result<(), Fault> {
        self.steps += 1;
        if self.steps > self.config.step_limit {
            tracing::warn!(limit = self.config.step_limit, "step limit exceeded");
            return Err(self.fault(RuntimeError::StepLimitExceeded(self.config.step_limit), span.clone()));
        }
        if self.steps % STEP_CHECKPOINT == 0 {
            tracing::trace!(steps = self.steps, depth = self.env.depth(), "step checkpoint");
        }
        Ok(())
    }

    /// Enter a nested expression or block. Native recursion follows the
    /// script's nesting, so this budget also bounds the host stack.
    pub(crate) fn enter(&mut self) -> Result<(), Fault> {
        if self.nesting >= self.config.max_nesting {
            tracing::warn!(limit = self.config.max_nesting, "nesting limit exceeded");
            return Err(Fault::from(RuntimeError::StackOverflow));
        }
        self.nesting += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Declare the `var`s and functions of a body in the current scope.
    fn hoist(&mut self, statements: &[Statement]) {
        let mut vars = Vec::new();
        let mut functions = Vec::new();
        collect_hoisted(statements, &mut vars, &mut functions);
        let scope = self.env.current_scope_mut();
        for name in vars {
            scope.declare(&name);
        }
        for decl in functions {
            scope.set_variable(&decl.name, RuntimeValue::Function(Rc::new(decl.clone())));
        }
    }

    pub(crate) fn execute_block(&mut self, statements: &[Statement]) -> Result<Flow, Fault> {
        self.enter()?;
        let mut flow = Ok(Flow::Normal);
        for statement in statements {
            flow = self.execute_statement(statement);
            if !matches!(flow, Ok(Flow::Normal)) {
                break;
            }
        }
        self.leave();
        flow
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Flow, Fault> {
        let span = statement.span();
        self.tick(span)?;
        let source_id = self.source_id;
        self.execute_statement_inner(statement)
            .map_err(|e| e.at(span, source_id))
    }

    fn execute_statement_inner(&mut self, statement: &Statement) -> Result<Flow, Fault> {
        match statement {
            Statement::Var { declarations, .. } => {
                for (name, init) in declarations {
                    if let Some(init) = init {
                        let value = self.evaluate(init)?;
                        self.env.set_variable(name, value);
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Assignment {
                target,
                operator,
                value,
                span,
            } => {
                let value = self.evaluate(value)?;
                let value = match operator {
                    AssignOperator::Assign => value,
                    AssignOperator::AddAssign | AssignOperator::SubtractAssign => {
                        let current = self
                            .env
                            .get_variable(target)
                            .cloned()
                            .ok_or_else(|| self.fault(RuntimeError::ReferenceError(target.clone()), span.clone()))?;
                        let op = if *operator == AssignOperator::AddAssign {
                            BinaryOperator::Addition
                        } else {
                            BinaryOperator::Subtraction
                        };
                        eval_binary_op(op, &current, &value)?
                    }
                };
                self.env.set_variable(target, value);
                Ok(Flow::Normal)
            }
            Statement::Expression { value, .. } => {
                self.evaluate(value)?;
                Ok(Flow::Normal)
            }
            // Hoisted on entry to the enclosing body.
            Statement::Function(_) => Ok(Flow::Normal),
            Statement::If {
                branches, otherwise, ..
            } => {
                for (condition, body) in branches {
                    if self.evaluate(condition)?.is_truthy() {
                        return self.execute_block(body);
                    }
                }
                match otherwise {
                    Some(body) => self.execute_block(body),
                    None => Ok(Flow::Normal),
                }
            }
            Statement::While { condition, body, span } => {
                loop {
                    self.tick(span)?;
                    if !self.evaluate(condition)?.is_truthy() {
                        break;
                    }
                    match self.execute_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::For {
                init,
                condition,
                update,
                body,
                span,
            } => {
                if let Some(init) = init {
                    self.execute_statement(init)?;
                }
                loop {
                    self.tick(span)?;
                    if let Some(condition) = condition
                        && !self.evaluate(condition)?.is_truthy()
                    {
                        break;
                    }
                    match self.execute_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                    if let Some(update) = update {
                        self.execute_statement(update)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::ForOf {
                variable,
                iterable,
                body,
                span,
                ..
            } => {
                let items = match self.evaluate(iterable)? {
                    RuntimeValue::List(items) => {
                        let snapshot = items.borrow().clone();
                        snapshot
                    }
                    RuntimeValue::String(s) => s.chars().map(|c| RuntimeValue::String(c.to_string())).collect(),
                    other => {
                        return Err(self.fault(
                            RuntimeError::type_error(format!("{} is not iterable", other.type_name())),
                            iterable.span().unwrap_or_else(|| span.clone()),
                        ));
                    }
                };
                for item in items {
                    self.tick(span)?;
                    self.env.set_variable(variable, item);
                    match self.execute_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => RuntimeValue::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Statement::Break(span) => Ok(Flow::Break(span.clone())),
            Statement::Continue(span) => Ok(Flow::Continue(span.clone())),
        }
    }

    /// Invoke a script function. Missing arguments are `undefined`, extra
    /// ones are ignored.
    pub(crate) fn call_function(
        &mut self,
        decl: Rc<FunctionDecl>,
        arguments: Vec<RuntimeValue>,
        call_span: &Range<usize>,
    ) -> Result<RuntimeValue, Fault> {
        if self.env.depth() >= self.config.max_call_depth {
            return Err(self.fault(RuntimeError::StackOverflow, call_span.clone()));
        }

        let mut scope = Scope::default();
        let mut arguments = arguments.into_iter();
        for param in &decl.params {
            scope.set_variable(param, arguments.next().unwrap_or(RuntimeValue::Undefined));
        }
        self.env.push_scope(scope);
        self.hoist(&decl.body);

        let result = self.execute_block(&decl.body);
        self.env.pop_scope();

        match result? {
            Flow::Normal => Ok(RuntimeValue::Undefined),
            Flow::Return(value) => Ok(value),
            Flow::Break(span) => Err(self.fault(RuntimeError::IllegalControlFlow("break"), span)),
            Flow::Continue(span) => Err(self.fault(RuntimeError::IllegalControlFlow("continue"), span)),
        }
    }
}

/// Collect `var` names and function declarations of a body, looking into
/// nested blocks but not into nested functions.
fn collect_hoisted<'s>(statements: &'s [Statement], vars: &mut Vec<String>, functions: &mut Vec<&'s FunctionDecl>) {
    fn declare(name: &str, vars: &mut Vec<String>) {
        if !vars.iter().any(|v| v == name) {
            vars.push(name.to_string());
        }
    }

    for statement in statements {
        match statement {
            Statement::Var { declarations, .. } => {
                for (name, _) in declarations {
                    declare(name, vars);
                }
            }
            Statement::Function(decl) => functions.push(decl),
            Statement::If {
                branches, otherwise, ..
            } => {
                for (_, body) in branches {
                    collect_hoisted(body, vars, functions);
                }
                if let Some(body) = otherwise {
                    collect_hoisted(body, vars, functions);
                }
            }
            Statement::While { body, .. } => collect_hoisted(body, vars, functions),
            Statement::For { init, body, .. } => {
                if let Some(init) = init {
                    collect_hoisted(std::slice::from_ref(init.as_ref()), vars, functions);
                }
                collect_hoisted(body, vars, functions);
            }
            Statement::ForOf {
                variable,
                declare: declared,
                body,
                ..
            } => {
                if *declared {
                    declare(variable, vars);
                }
                collect_hoisted(body, vars, functions);
            }
            _ => {}
        }
    }
}
