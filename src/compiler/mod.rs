//! Stage one: walk the typed tree and emit the linear operation sequence.
//! The compiler owns the calling convention, the struct-splitting rules and
//! the desugaring of field accesses through the interface registry.

mod op_compiler;

use crate::ast::Program;
use crate::backend::Backend;
use crate::diagnostics::CompilationResult;
use crate::interfaces::InterfaceRegistry;
use crate::ir::Operation;

use self::op_compiler::OpCompiler;

/// Compile a typed program into an operation sequence.
pub fn compile(
    program: &Program,
    backend: Box<dyn Backend>,
    registry: InterfaceRegistry,
) -> CompilationResult<Vec<Operation>> {
    OpCompiler::new(backend, registry).compile(program)
}
