use script::parser::Parser;

use crate::ambient::{Ambient, AmbientGuard, CannedAmbient, HostAmbient};
use crate::config::SandboxConfig;
use crate::error::{Fault, RuntimeError};
use crate::executor::{Effects, Interpreter};
use crate::runtime_value::RuntimeValue;

/// File id used for every source handed to the sandbox.
pub const SOURCE_ID: usize = 0;

/// Result of a run that finished without a fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub output_lines: Vec<String>,
    pub declared_answer: Option<f64>,
    /// Value of a top-level `return`, if the program ended with one.
    pub completion: Option<RuntimeValue>,
}

/// Result of [`Sandbox::run`]: output up to the point of failure, with a
/// trailing `Error: ...` line when the run faulted.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub output_lines: Vec<String>,
    pub declared_answer: Option<f64>,
    pub fault: Option<Fault>,
}

/// Runs script programs in isolation. Every call starts from a fresh
/// global scope; nothing carries over between calls.
pub struct Sandbox {
    config: SandboxConfig,
    ambient: Box<dyn Ambient>,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_ambient(config, Box::new(HostAmbient))
    }

    /// Use `ambient` as the embedder's ambient. It is swapped out for the
    /// duration of every run and put back afterwards.
    pub fn with_ambient(config: SandboxConfig, ambient: Box<dyn Ambient>) -> Self {
        Sandbox { config, ambient }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn ambient_mut(&mut self) -> &mut dyn Ambient {
        self.ambient.as_mut()
    }

    /// Parse and execute `source`, failing with the first fault.
    pub fn execute(&mut self, source: &str) -> Result<Execution, Fault> {
        let (effects, result) = self.execute_inner(source);
        let completion = result?;
        Ok(Execution {
            output_lines: effects.output_lines,
            declared_answer: effects.declared_answer,
            completion,
        })
    }

    /// Like [`Sandbox::execute`], but a fault is reported as the last
    /// output line instead of an error.
    pub fn run(&mut self, source: &str) -> RunOutcome {
        let (effects, result) = self.execute_inner(source);
        let mut output_lines = effects.output_lines;
        let fault = result.err();
        if let Some(fault) = &fault {
            tracing::warn!(error = %fault, "run faulted");
            output_lines.push(format!("Error: {fault}"));
        }
        RunOutcome {
            output_lines,
            declared_answer: effects.declared_answer,
            fault,
        }
    }

    fn execute_inner(&mut self, source: &str) -> (Effects, Result<Option<RuntimeValue>, Fault>) {
        let program = match Parser::new(source.to_string(), SOURCE_ID).parse() {
            Ok(program) => program,
            Err(errors) => return (Effects::default(), Err(syntax_fault(errors))),
        };

        let config = &self.config;
        let mut guard = AmbientGuard::install(&mut self.ambient, Box::new(CannedAmbient::new(config)));
        let mut interpreter = Interpreter::new(config, guard.ambient(), SOURCE_ID);
        let result = interpreter.execute_program(&program);
        (interpreter.effects, result)
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Sandbox::new(SandboxConfig::default())
    }
}

fn syntax_fault(errors: Vec<script::parser::ParseError>) -> Fault {
    let mut errors = errors.into_iter();
    let Some(first) = errors.next() else {
        return Fault::from(RuntimeError::Syntax("invalid program".to_string()));
    };
    let rest = errors.count();
    let message = if rest == 0 {
        first.message
    } else {
        format!("{} (and {rest} more)", first.message)
    };
    Fault::new(RuntimeError::Syntax(message), first.span, first.file_id)
}
