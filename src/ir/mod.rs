//! The stack-oriented intermediate representation shared by the compiler and
//! the interpreter.
//!
//! Operations form a flat, ordered sequence. Sequences nest only as operands
//! of call and loop-body instructions; there are no jumps. Because
//! [Operation] is a data-carrying enum, adding an instruction forces every
//! `match` over it — compiler emitters and the interpreter dispatch alike —
//! to be updated before the crate compiles again.

use std::fmt::Display;

use crate::ast::{Literal, Param};
use crate::host::OutSocket;

/// One IR instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Push a literal onto the stack. `None` is the absent-argument sentinel:
    /// it fills a builtin input slot without overriding the node's default.
    PushValue(Option<Literal>),
    /// Push the value bound to a variable.
    GetVar(String),
    /// Pop the stack top and bind it to a new variable.
    CreateVar(String),
    /// Pop the stack top and (re)bind it, whether or not the name exists.
    BindVar(String),
    /// Remove a binding. Used to clean up compiler temporaries.
    DestroyVar(String),
    /// Pop a struct and push its component at the logical index.
    GetOutput(usize),
    /// Set a static default on an output slot of the most recent node.
    SetOutput { slot: usize, value: Literal },
    /// Pop the stack top and record it as the current call's output.
    SetFunctionOut(usize),
    /// Pop a struct and push all components individually, preserving the
    /// struct's storage order.
    SplitStruct,
    /// Pop the declared argument count and run the body in an isolated scope.
    CallFunction(CompiledFunction),
    /// Like [Operation::CallFunction], but materializes (or reuses) a named
    /// subgraph and instantiates a call-site node.
    CallNodeGroup(CompiledNodeGroup),
    /// Pop the declared argument count and create one primitive host node.
    CallBuiltin(BuiltinNode),
    /// Set a display label on the most recent node.
    RenameNode(String),
    /// Eagerly materialize a subgraph without instantiating a call site.
    CreateNodeGroup(CompiledNodeGroup),
    /// Pop an iteration count and open a runtime loop construct.
    CreateRepeatZone,
    /// Run the sequence as the body of the open loop, capturing loop-carried
    /// variables across the zone boundary.
    RepeatBody(Vec<Operation>),
    /// Statement boundary: reset the stack.
    EndOfStatement,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::PushValue(Some(value)) => write!(f, "PUSH_VALUE {value}"),
            Operation::PushValue(None) => write!(f, "PUSH_VALUE <absent>"),
            Operation::GetVar(name) => write!(f, "GET_VAR {name}"),
            Operation::CreateVar(name) => write!(f, "CREATE_VAR {name}"),
            Operation::BindVar(name) => write!(f, "BIND_VAR {name}"),
            Operation::DestroyVar(name) => write!(f, "DESTROY_VAR {name}"),
            Operation::GetOutput(index) => write!(f, "GET_OUTPUT {index}"),
            Operation::SetOutput { slot, value } => write!(f, "SET_OUTPUT {slot} = {value}"),
            Operation::SetFunctionOut(index) => write!(f, "SET_FUNCTION_OUT {index}"),
            Operation::SplitStruct => write!(f, "SPLIT_STRUCT"),
            Operation::CallFunction(function) => {
                write!(f, "CALL_FUNCTION <{} ops>", function.body.len())
            }
            Operation::CallNodeGroup(group) => write!(f, "CALL_NODEGROUP {}", group.name),
            Operation::CallBuiltin(node) => write!(f, "CALL_BUILTIN {}", node.kind),
            Operation::RenameNode(label) => write!(f, "RENAME_NODE {label}"),
            Operation::CreateNodeGroup(group) => write!(f, "CREATE_NODE_GROUP {}", group.name),
            Operation::CreateRepeatZone => write!(f, "CREATE_REPEAT_ZONE"),
            Operation::RepeatBody(body) => write!(f, "REPEAT_BODY <{} ops>", body.len()),
            Operation::EndOfStatement => write!(f, "END_OF_STATEMENT"),
        }
    }
}

/// A value on the interpreter stack or in a variable environment.
///
/// Struct components are stored in reverse of their logical order; every
/// struct producer and consumer applies the same inversion, so logical index
/// `i` always reads storage slot `len - 1 - i`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    Socket(OutSocket),
    Struct(Vec<OutSocket>),
    /// The absent-argument sentinel.
    Absent,
}

/// A callable body compiled once per call site and re-executed fresh on every
/// call. No state survives between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub inputs: Vec<String>,
    pub body: Vec<Operation>,
    pub output_count: usize,
}

impl CompiledFunction {
    pub fn new(inputs: Vec<String>, body: Vec<Operation>, output_count: usize) -> Self {
        Self {
            inputs,
            body,
            output_count,
        }
    }
}

/// A callable that materializes as a named subgraph in the host document.
/// The subgraph itself is built once per name and reused by every later call
/// site within an interpretation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledNodeGroup {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub body: Vec<Operation>,
}

impl CompiledNodeGroup {
    pub fn new(name: String, inputs: Vec<Param>, outputs: Vec<Param>, body: Vec<Operation>) -> Self {
        Self {
            name,
            inputs,
            outputs,
            body,
        }
    }
}

/// Declarative recipe for instantiating one primitive host node: its kind,
/// static property assignments, which input slots the stack arguments map to
/// (in order), and which output slots are exposed as the call's result.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinNode {
    pub kind: String,
    pub props: Vec<(String, Literal)>,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
}

impl BuiltinNode {
    pub fn new<S>(kind: S, inputs: Vec<usize>, outputs: Vec<usize>, props: Vec<(String, Literal)>) -> Self
    where
        S: ToString,
    {
        Self {
            kind: kind.to_string(),
            props,
            inputs,
            outputs,
        }
    }
}
