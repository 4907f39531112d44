//! Error reporting for both pipeline stages.
//!
//! Two tiers of failure exist. Compilation errors are reachable from
//! well-typed-looking input (an unregistered interface, an unimplemented
//! split) and are reported as [CompilationError]. Broken invariants between
//! stages ("the type checker should have rejected this") either panic in the
//! compiler or surface as a structured [InterpreterError] on the first
//! offending instruction.

use std::fmt::Display;

use crate::ast::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationError {
    pub description: String,
}

impl CompilationError {
    pub fn new_generic<S>(description: S) -> Self
    where
        S: ToString,
    {
        Self {
            description: description.to_string(),
        }
    }

    pub fn new_unknown_interface(dtype: DataType) -> Self {
        Self::new_generic(format!("Type `{dtype}` has no registered interfaces."))
    }

    pub fn new_unknown_field(dtype: DataType, field: &str) -> Self {
        Self::new_generic(format!("Type `{dtype}` has no field `{field}`."))
    }
}

impl Display for CompilationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}

pub type CompilationResult<T> = Result<T, CompilationError>;

/// Fatal interpretation failures. Every variant indicates an instruction
/// sequence the compiler should not have produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterError {
    /// An instruction popped more values than the stack held.
    StackUnderflow(&'static str),
    UndefinedVariable(String),
    /// A struct instruction was applied to a non-struct value.
    NotAStruct(&'static str),
    StructIndexOutOfRange { index: usize, len: usize },
    /// A node-targeting instruction ran before any node was created.
    NoCurrentNode(&'static str),
    NoOpenRepeatZone,
    /// The repeat iteration count was neither a socket nor an integer.
    InvalidIterationCount,
    /// An argument had a kind the call site cannot wire up.
    InvalidArgument(&'static str),
    FunctionOutputIndexOutOfRange { index: usize, arity: usize },
    /// A multi-output call finished without setting one of its outputs.
    FunctionOutputUnset(usize),
}

impl Display for InterpreterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpreterError::StackUnderflow(op) => {
                write!(f, "Stack underflow while executing {op}.")
            }
            InterpreterError::UndefinedVariable(name) => {
                write!(f, "Variable `{name}` is not bound in this scope.")
            }
            InterpreterError::NotAStruct(op) => {
                write!(f, "{op} expects a struct on top of the stack.")
            }
            InterpreterError::StructIndexOutOfRange { index, len } => {
                write!(f, "Output index {index} out of range for struct of {len}.")
            }
            InterpreterError::NoCurrentNode(op) => {
                write!(f, "{op} executed before any node was created.")
            }
            InterpreterError::NoOpenRepeatZone => {
                write!(f, "Repeat body executed without an open repeat zone.")
            }
            InterpreterError::InvalidIterationCount => {
                write!(f, "Repeat iteration count must be an integer or a socket.")
            }
            InterpreterError::InvalidArgument(what) => {
                write!(f, "Invalid argument: {what}.")
            }
            InterpreterError::FunctionOutputIndexOutOfRange { index, arity } => {
                write!(f, "Function output {index} out of range for arity {arity}.")
            }
            InterpreterError::FunctionOutputUnset(index) => {
                write!(f, "Function output {index} was never set.")
            }
        }
    }
}

pub type InterpretationResult<T> = Result<T, InterpreterError>;
