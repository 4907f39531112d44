//! Sequence-level tests: the exact operations the compiler emits.

use pretty_assertions::assert_eq;

use crate::ast::{DataType, Literal};
use crate::diagnostics::CompilationError;
use crate::interfaces::vec3;
use crate::ir::{BuiltinNode, Operation};

use super::*;

#[test]
fn literal_assignment_skips_the_stack() {
    let ops = compile_geometry(&program(vec![assign("count", int_lit(4))]));
    assert_eq!(
        ops,
        vec![
            Operation::CallBuiltin(BuiltinNode::new(
                "FunctionNodeInputInt",
                vec![],
                vec![0],
                vec![("integer".to_string(), Literal::Int(4))],
            )),
            Operation::RenameNode("count".to_string()),
            Operation::BindVar("count".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn every_statement_ends_with_a_boundary() {
    let ops = compile_geometry(&program(vec![
        assign("a", float_lit(1.0)),
        assign("b", math(vec![var("a", DataType::Float), float_lit(2.0)])),
    ]));
    let boundaries = ops
        .iter()
        .filter(|op| **op == Operation::EndOfStatement)
        .count();
    assert_eq!(boundaries, 2);
    assert_eq!(ops.last(), Some(&Operation::EndOfStatement));
}

#[test]
fn builtin_args_are_compiled_in_declared_order() {
    let ops = compile_geometry(&program(vec![assign(
        "s",
        math(vec![var("a", DataType::Float), var("b", DataType::Float)]),
    )]));
    assert_eq!(
        ops,
        vec![
            Operation::GetVar("a".to_string()),
            Operation::GetVar("b".to_string()),
            Operation::CallBuiltin(math_node()),
            Operation::BindVar("s".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn missing_trailing_builtin_args_become_absent() {
    let ops = compile_geometry(&program(vec![assign("h", math(vec![float_lit(3.0)]))]));
    assert_eq!(
        ops,
        vec![
            Operation::PushValue(Some(Literal::Float(3.0))),
            Operation::PushValue(None),
            Operation::CallBuiltin(math_node()),
            Operation::BindVar("h".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn multi_target_struct_assignment_splits() {
    let ops = compile_geometry(&program(vec![assign_many(
        &[Some("x"), Some("y"), Some("z")],
        separate(var("v", DataType::Vec3)),
    )]));
    assert_eq!(
        ops,
        vec![
            Operation::GetVar("v".to_string()),
            Operation::CallBuiltin(vec3::decompose_node()),
            Operation::SplitStruct,
            Operation::BindVar("x".to_string()),
            Operation::BindVar("y".to_string()),
            Operation::BindVar("z".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn discarded_trailing_target_leaves_residue_for_the_boundary() {
    let ops = compile_geometry(&program(vec![assign_many(
        &[Some("x"), Some("y"), None],
        separate(var("v", DataType::Vec3)),
    )]));
    assert_eq!(
        ops,
        vec![
            Operation::GetVar("v".to_string()),
            Operation::CallBuiltin(vec3::decompose_node()),
            Operation::SplitStruct,
            Operation::BindVar("x".to_string()),
            Operation::BindVar("y".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn splitting_a_vector_inserts_a_decompose_node() {
    let ops = compile_geometry(&program(vec![assign_many(
        &[Some("x"), Some("y"), Some("z")],
        var("v", DataType::Vec3),
    )]));
    assert_eq!(
        ops,
        vec![
            Operation::GetVar("v".to_string()),
            Operation::CallBuiltin(vec3::decompose_node()),
            Operation::SplitStruct,
            Operation::BindVar("x".to_string()),
            Operation::BindVar("y".to_string()),
            Operation::BindVar("z".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn splitting_a_color_is_rejected() {
    let err = crate::compile(
        &program(vec![assign_many(
            &[Some("r"), Some("g")],
            var("c", DataType::Rgba),
        )]),
        TreeKind::GeometryNodeTree,
    )
    .unwrap_err();
    assert_eq!(
        err,
        CompilationError::new_generic(
            "Splitting a color value into components is not implemented."
        )
    );
}

#[test]
fn single_target_struct_assignment_takes_the_first_component() {
    let ops = compile_geometry(&program(vec![assign(
        "x",
        separate(var("v", DataType::Vec3)),
    )]));
    assert_eq!(
        ops,
        vec![
            Operation::GetVar("v".to_string()),
            Operation::CallBuiltin(vec3::decompose_node()),
            Operation::GetOutput(0),
            Operation::BindVar("x".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn unroll_expands_the_body_per_iteration() {
    let body = vec![assign("s", math(vec![var("i", DataType::Int), int_lit(0)]))];
    let ops = compile_geometry(&program(vec![unroll(Some("i"), 1, 3, body)]));

    let mut expected = vec![];
    for i in 1..=3 {
        expected.push(Operation::PushValue(Some(Literal::Int(i))));
        expected.push(Operation::BindVar("i".to_string()));
        expected.push(Operation::GetVar("i".to_string()));
        expected.push(Operation::PushValue(Some(Literal::Int(0))));
        expected.push(Operation::CallBuiltin(math_node()));
        expected.push(Operation::BindVar("s".to_string()));
        expected.push(Operation::EndOfStatement);
    }
    expected.push(Operation::EndOfStatement);

    assert_eq!(ops, expected);
}

#[test]
fn repeat_body_is_sequenced_after_the_iteration_count() {
    let ops = compile_geometry(&program(vec![repeat(
        int_lit(3),
        vec![assign(
            "x",
            math(vec![var("x", DataType::Float), float_lit(1.0)]),
        )],
    )]));
    assert_eq!(
        ops,
        vec![
            Operation::PushValue(Some(Literal::Int(3))),
            Operation::CreateRepeatZone,
            Operation::RepeatBody(vec![
                Operation::GetVar("x".to_string()),
                Operation::PushValue(Some(Literal::Float(1.0))),
                Operation::CallBuiltin(math_node()),
                Operation::BindVar("x".to_string()),
                Operation::EndOfStatement,
            ]),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn field_access_expands_through_the_registry() {
    let ops = compile_geometry(&program(vec![assign(
        "f",
        field(var("v", DataType::Vec3), "y"),
    )]));
    // The object is parked in a fresh temporary while the accessor expands.
    assert!(matches!(&ops[0], Operation::GetVar(name) if name == "v"));
    let Operation::BindVar(temp) = &ops[1] else {
        panic!("expected the object to be bound to a temporary, got {}", ops[1]);
    };
    assert_eq!(
        ops[2..],
        vec![
            Operation::GetVar(temp.clone()),
            Operation::CallBuiltin(vec3::decompose_node()),
            Operation::GetOutput(1),
            Operation::DestroyVar(temp.clone()),
            Operation::BindVar("f".to_string()),
            Operation::EndOfStatement,
        ]
    );
}

#[test]
fn field_write_carries_the_result_back_to_the_variable() {
    let ops = compile_geometry(&program(vec![
        assign("v", vec3_lit([1.0, 2.0, 3.0])),
        field_assign(var("v", DataType::Vec3), "x", float_lit(0.5)),
    ]));
    let rebind = ops
        .iter()
        .rposition(|op| *op == Operation::BindVar("v".to_string()))
        .unwrap();
    assert!(matches!(&ops[rebind - 1], Operation::GetVar(_)));
    assert!(matches!(&ops[rebind + 1], Operation::DestroyVar(_)));
    assert!(matches!(&ops[rebind + 2], Operation::DestroyVar(_)));
    assert_eq!(ops[rebind + 3], Operation::EndOfStatement);
    assert!(ops.contains(&Operation::CallBuiltin(vec3::compose_node())));
}

#[test]
fn unknown_field_is_a_compilation_error() {
    let err = crate::compile(
        &program(vec![assign("f", field(var("v", DataType::Vec3), "w"))]),
        TreeKind::GeometryNodeTree,
    )
    .unwrap_err();
    assert_eq!(err, CompilationError::new_unknown_field(DataType::Vec3, "w"));
}

#[test]
fn unregistered_type_is_a_compilation_error() {
    let err = crate::compile(
        &program(vec![assign("f", field(var("g", DataType::Geometry), "x"))]),
        TreeKind::GeometryNodeTree,
    )
    .unwrap_err();
    assert_eq!(err, CompilationError::new_unknown_interface(DataType::Geometry));
}

#[test]
fn function_call_fills_missing_args_from_defaults() {
    let double = function(
        "double",
        vec![param("a", DataType::Float, Some(Literal::Float(1.0)))],
        vec![param("out", DataType::Float, None)],
        vec![out_assign(
            0,
            math(vec![var("a", DataType::Float), var("a", DataType::Float)]),
        )],
        false,
    );
    let ops = compile_geometry(&program(vec![assign("r", call(&double, vec![]))]));
    assert_eq!(ops[0], Operation::PushValue(Some(Literal::Float(1.0))));
    assert!(matches!(&ops[1], Operation::CallFunction(f) if f.inputs == vec!["a".to_string()]));
}

#[test]
fn struct_args_forward_only_their_first_component() {
    let sink = function(
        "sink",
        vec![param("p", DataType::Float, None)],
        vec![param("out", DataType::Float, None)],
        vec![out_assign(0, var("p", DataType::Float))],
        false,
    );
    let ops = compile_geometry(&program(vec![assign(
        "r",
        call(&sink, vec![separate(var("v", DataType::Vec3))]),
    )]));
    assert_eq!(
        ops[..3],
        vec![
            Operation::GetVar("v".to_string()),
            Operation::CallBuiltin(vec3::decompose_node()),
            Operation::GetOutput(0),
        ]
    );
}
