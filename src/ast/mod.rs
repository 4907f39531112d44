//! Shapes of the typed program representation handed over by the front end.
//!
//! Parsing and type checking happen outside this crate. Every expression
//! arrives annotated with its resolved semantic types and a stack shape, and
//! the compiler trusts those annotations completely.

use std::fmt::Display;
use std::rc::Rc;

use crate::ir::BuiltinNode;

/// Semantic data types of the host node system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int,
    Float,
    Vec3,
    Rgba,
    Geometry,
    String,
    Shader,
    Object,
    Image,
    Collection,
    Texture,
    Material,
    Rotation,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Vec3 => "vec3",
            DataType::Rgba => "rgba",
            DataType::Geometry => "geometry",
            DataType::String => "string",
            DataType::Shader => "shader",
            DataType::Object => "object",
            DataType::Image => "image",
            DataType::Collection => "collection",
            DataType::Texture => "texture",
            DataType::Material => "material",
            DataType::Rotation => "rotation",
        };
        write!(f, "{s}")
    }
}

/// A literal value as written in the source program.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vec3([f64; 3]),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Str(s) => write!(f, "\"{s}\""),
            Literal::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

/// How an expression's result lives on the value stack: a single value, or a
/// multi-component struct (e.g. the result of a multi-output call).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackShape {
    Scalar,
    Struct,
}

/// A declared input or output of a function or node group.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub dtype: DataType,
    pub default: Option<Literal>,
}

impl Param {
    pub fn new<S>(name: S, dtype: DataType, default: Option<Literal>) -> Self
    where
        S: ToString,
    {
        Self {
            name: name.to_string(),
            dtype,
            default,
        }
    }
}

/// A user-defined callable. Node groups additionally materialize as named,
/// reusable subgraphs in the host document.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub body: Vec<Statement>,
    pub is_node_group: bool,
}

/// A whole typed program: the top-level statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// An expression evaluated for its graph side effects.
    Expression(Expression),
    Assign(AssignStatement),
    FieldAssign(FieldAssignStatement),
    /// A bounded loop over a compile-time-known integer range, unrolled by the
    /// compiler.
    Unroll(UnrollStatement),
    /// A loop with a runtime iteration count, realized as a repeat zone in the
    /// host graph.
    Repeat(RepeatStatement),
}

/// Destination of one assignment target. `FunctionOutput` targets only occur
/// inside function and node-group bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Variable(String),
    FunctionOutput(usize),
}

/// `a, b = expr` — targets in declaration order; a `None` target discards
/// that component.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    pub targets: Vec<Option<AssignTarget>>,
    pub value: Expression,
}

/// `object.field = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignStatement {
    pub target: Expression,
    pub field: String,
    pub value: Expression,
}

/// Range is inclusive on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrollStatement {
    pub var: Option<String>,
    pub start: i64,
    pub end: i64,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatStatement {
    pub iterations: Expression,
    pub body: Vec<Statement>,
}

/// A typed expression. `types` is the resolved semantic type tuple (multiple
/// entries for multi-output calls, first entry is the primary type) and
/// `shape` classifies how the value sits on the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub types: Vec<DataType>,
    pub shape: StackShape,
}

impl Expression {
    pub fn new(kind: ExpressionKind, types: Vec<DataType>, shape: StackShape) -> Self {
        Self { kind, types, shape }
    }

    /// A single-valued expression of the given type.
    pub fn scalar(kind: ExpressionKind, dtype: DataType) -> Self {
        Self::new(kind, vec![dtype], StackShape::Scalar)
    }

    /// The primary semantic type of this expression.
    pub fn dtype(&self) -> DataType {
        self.types[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Const(Literal),
    VariableRef(String),
    /// Direct invocation of a primitive host node.
    BuiltinCall(BuiltinCallExpression),
    FunctionCall(FunctionCallExpression),
    /// Select one output of a multi-output value.
    AccessOutput(AccessOutputExpression),
    /// `object.field`, resolved through the interface registry.
    FieldAccess(FieldAccessExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinCallExpression {
    pub node: BuiltinNode,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallExpression {
    pub function: Rc<Function>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessOutputExpression {
    pub value: Box<Expression>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccessExpression {
    pub object: Box<Expression>,
    pub field: String,
}
