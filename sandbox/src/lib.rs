//! Isolated execution of generated script programs.
//!
//! A [`Sandbox`] parses a program, runs it against a fresh global scope that
//! exposes the two intrinsic hooks `__print` and `__setAnswer`, and reports
//! what the program printed and declared. Interactive globals are answered
//! by a canned [`Ambient`] for the duration of each run, and step and call
//! depth budgets keep runaway programs from hanging the caller.

pub mod ambient;
pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod runner;
pub mod runtime_value;

pub use ambient::{Ambient, AmbientGuard, CannedAmbient, HostAmbient};
pub use config::SandboxConfig;
pub use error::{Fault, RuntimeError};
pub use runner::{Execution, RunOutcome, SOURCE_ID, Sandbox};
pub use runtime_value::RuntimeValue;
