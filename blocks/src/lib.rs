//! Block programs: a typed, validated block graph and its translation to
//! script source.
//!
//! A [`Workspace`] holds the blocks a learner has placed. Every edit is
//! checked against the [`BlockCatalog`] before it is applied, so the graph
//! is always well formed: sockets only hold compatible values, chains
//! never loop, and procedure calls track their definitions. The
//! [`Generator`] turns a workspace into source text for the `script`
//! parser.

pub mod block;
pub mod catalog;
pub mod error;
pub mod generator;
pub mod procedures;
pub mod workspace;

pub use block::{Block, BlockId, FieldValue, Mutation, Parent};
pub use catalog::{BlockCatalog, BlockSpec, SocketKind, ValueKind};
pub use error::GraphError;
pub use generator::{GeneratedProgram, GenerationDiagnostic, Generator};
pub use procedures::ProcedureInfo;
pub use workspace::Workspace;
