mod compilation;

use std::rc::Rc;

use crate::ast::{
    AccessOutputExpression, AssignStatement, AssignTarget, BuiltinCallExpression, DataType,
    Expression, ExpressionKind, FieldAccessExpression, FieldAssignStatement, Function,
    FunctionCallExpression, Literal, Param, Program, RepeatStatement, StackShape, Statement,
    StatementKind, UnrollStatement,
};
use crate::backend::TreeKind;
use crate::host::GraphDoc;
use crate::interfaces::vec3;
use crate::ir::{BuiltinNode, Operation};

pub fn program(body: Vec<Statement>) -> Program {
    Program { body }
}

pub fn int_lit(value: i64) -> Expression {
    Expression::scalar(ExpressionKind::Const(Literal::Int(value)), DataType::Int)
}

pub fn float_lit(value: f64) -> Expression {
    Expression::scalar(ExpressionKind::Const(Literal::Float(value)), DataType::Float)
}

pub fn vec3_lit(components: [f64; 3]) -> Expression {
    Expression::scalar(
        ExpressionKind::Const(Literal::Vec3(components)),
        DataType::Vec3,
    )
}

pub fn var(name: &str, dtype: DataType) -> Expression {
    Expression::scalar(ExpressionKind::VariableRef(name.to_string()), dtype)
}

/// A two-input, one-output math builtin. Stands in for any primitive node.
pub fn math_node() -> BuiltinNode {
    BuiltinNode::new(
        "ShaderNodeMath",
        vec![0, 1],
        vec![0],
        vec![("operation".to_string(), Literal::Str("ADD".to_string()))],
    )
}

pub fn math(args: Vec<Expression>) -> Expression {
    Expression::scalar(
        ExpressionKind::BuiltinCall(BuiltinCallExpression {
            node: math_node(),
            args,
        }),
        DataType::Float,
    )
}

/// A vector decompose call: three float outputs, struct-shaped.
pub fn separate(arg: Expression) -> Expression {
    Expression::new(
        ExpressionKind::BuiltinCall(BuiltinCallExpression {
            node: vec3::decompose_node(),
            args: vec![arg],
        }),
        vec![DataType::Float; 3],
        StackShape::Struct,
    )
}

pub fn output(value: Expression, index: usize) -> Expression {
    let dtype = value.types[index];
    Expression::scalar(
        ExpressionKind::AccessOutput(AccessOutputExpression {
            value: Box::new(value),
            index,
        }),
        dtype,
    )
}

pub fn field(object: Expression, name: &str) -> Expression {
    Expression::scalar(
        ExpressionKind::FieldAccess(FieldAccessExpression {
            object: Box::new(object),
            field: name.to_string(),
        }),
        DataType::Float,
    )
}

pub fn call(function: &Rc<Function>, args: Vec<Expression>) -> Expression {
    let types: Vec<DataType> = function.outputs.iter().map(|p| p.dtype).collect();
    let shape = if types.len() > 1 {
        StackShape::Struct
    } else {
        StackShape::Scalar
    };
    Expression::new(
        ExpressionKind::FunctionCall(FunctionCallExpression {
            function: function.clone(),
            args,
        }),
        types,
        shape,
    )
}

pub fn assign(name: &str, value: Expression) -> Statement {
    Statement::new(StatementKind::Assign(AssignStatement {
        targets: vec![Some(AssignTarget::Variable(name.to_string()))],
        value,
    }))
}

pub fn assign_many(names: &[Option<&str>], value: Expression) -> Statement {
    Statement::new(StatementKind::Assign(AssignStatement {
        targets: names
            .iter()
            .map(|name| name.map(|name| AssignTarget::Variable(name.to_string())))
            .collect(),
        value,
    }))
}

/// Assignment to a function output slot, for function and node-group bodies.
pub fn out_assign(index: usize, value: Expression) -> Statement {
    Statement::new(StatementKind::Assign(AssignStatement {
        targets: vec![Some(AssignTarget::FunctionOutput(index))],
        value,
    }))
}

pub fn field_assign(target: Expression, field: &str, value: Expression) -> Statement {
    Statement::new(StatementKind::FieldAssign(FieldAssignStatement {
        target,
        field: field.to_string(),
        value,
    }))
}

pub fn repeat(iterations: Expression, body: Vec<Statement>) -> Statement {
    Statement::new(StatementKind::Repeat(RepeatStatement { iterations, body }))
}

pub fn unroll(var: Option<&str>, start: i64, end: i64, body: Vec<Statement>) -> Statement {
    Statement::new(StatementKind::Unroll(UnrollStatement {
        var: var.map(str::to_string),
        start,
        end,
        body,
    }))
}

pub fn param(name: &str, dtype: DataType, default: Option<Literal>) -> Param {
    Param::new(name, dtype, default)
}

pub fn function(
    name: &str,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    body: Vec<Statement>,
    is_node_group: bool,
) -> Rc<Function> {
    Rc::new(Function {
        name: name.to_string(),
        inputs,
        outputs,
        body,
        is_node_group,
    })
}

pub fn compile_geometry(program: &Program) -> Vec<Operation> {
    crate::compile(program, TreeKind::GeometryNodeTree).unwrap()
}

pub fn run_geometry(program: &Program) -> GraphDoc {
    let operations = compile_geometry(program);
    let mut doc = GraphDoc::new();
    crate::interpret(&operations, &mut doc, TreeKind::GeometryNodeTree).unwrap();
    doc
}
