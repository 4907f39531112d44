//! Graft lowers typed formula programs into node-and-socket graphs inside a
//! host graph document. Compilation happens in two stages: the [compiler]
//! walks the typed tree and emits a linear stack-oriented [ir::Operation]
//! sequence, and the [interpreter] executes that sequence against a
//! [host::HostDocument], materializing nodes and links.
//!
//! The front-end parser and type checker are external; this crate consumes
//! their output shape ([ast]) and trusts it to be well typed.

pub mod ast;
pub mod backend;
pub mod compiler;
pub mod diagnostics;
pub mod host;
pub mod interfaces;
pub mod interpreter;
pub mod ir;
pub mod utils;

#[cfg(test)]
mod tests;

use ast::Program;
use backend::TreeKind;
use diagnostics::{CompilationResult, InterpretationResult};
use host::HostDocument;
use interfaces::InterfaceRegistry;
use ir::Operation;

/// Compile a typed program into an operation sequence, using the backend for
/// the given host tree kind and the built-in interface registry.
pub fn compile(program: &Program, tree_kind: TreeKind) -> CompilationResult<Vec<Operation>> {
    let backend = backend::choose_backend(tree_kind);
    let registry = InterfaceRegistry::with_builtin_types();
    compiler::compile(program, backend, registry)
}

/// Execute an operation sequence against the root graph of a host document.
pub fn interpret(
    operations: &[Operation],
    doc: &mut dyn HostDocument,
    tree_kind: TreeKind,
) -> InterpretationResult<()> {
    interpreter::interpret(operations, doc, tree_kind)
}
