//! Per-tree-kind backends.
//!
//! A backend knows the host node kinds for the tree being built. Its one job
//! in the pipeline is literal-input synthesis: turning a literal assignment
//! into an input-producing node instead of a PushValue/BindVar round trip, so
//! the literal shows up as an editable node in the final graph.

use crate::ast::{DataType, Literal};
use crate::ir::{BuiltinNode, Operation};

/// The kind of host tree being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    GeometryNodeTree,
    ShaderNodeTree,
}

impl TreeKind {
    /// The node kind of a subgraph call site in this tree.
    pub fn group_node_kind(&self) -> &'static str {
        match self {
            TreeKind::GeometryNodeTree => "GeometryNodeGroup",
            TreeKind::ShaderNodeTree => "ShaderNodeGroup",
        }
    }
}

pub trait Backend {
    fn tree_kind(&self) -> TreeKind;

    /// Append the operations that materialize `value` as an input-producing
    /// node labeled `name`, leaving the node's output socket on the stack.
    fn create_input(
        &self,
        operations: &mut Vec<Operation>,
        name: &str,
        value: &Literal,
        dtype: DataType,
    );
}

pub fn choose_backend(tree_kind: TreeKind) -> Box<dyn Backend> {
    match tree_kind {
        TreeKind::GeometryNodeTree => Box::new(GeometryBackend),
        TreeKind::ShaderNodeTree => Box::new(ShaderBackend),
    }
}

/// An input node with no input slots and a single exposed output.
fn input_node(kind: &str, props: Vec<(String, Literal)>) -> BuiltinNode {
    BuiltinNode::new(kind, vec![], vec![0], props)
}

/// A literal carried as a static property of the input node.
fn prop_input(operations: &mut Vec<Operation>, kind: &str, prop: &str, value: &Literal) {
    operations.push(Operation::CallBuiltin(input_node(
        kind,
        vec![(prop.to_string(), value.clone())],
    )));
}

/// A literal carried as the default of the input node's output socket.
fn output_default_input(operations: &mut Vec<Operation>, kind: &str, value: &Literal) {
    operations.push(Operation::CallBuiltin(input_node(kind, vec![])));
    operations.push(Operation::SetOutput {
        slot: 0,
        value: value.clone(),
    });
}

pub struct GeometryBackend;

impl Backend for GeometryBackend {
    fn tree_kind(&self) -> TreeKind {
        TreeKind::GeometryNodeTree
    }

    fn create_input(
        &self,
        operations: &mut Vec<Operation>,
        name: &str,
        value: &Literal,
        dtype: DataType,
    ) {
        match dtype {
            DataType::Bool => prop_input(operations, "FunctionNodeInputBool", "boolean", value),
            DataType::Int => prop_input(operations, "FunctionNodeInputInt", "integer", value),
            DataType::Float => output_default_input(operations, "ShaderNodeValue", value),
            DataType::String => prop_input(operations, "FunctionNodeInputString", "string", value),
            DataType::Vec3 => prop_input(operations, "FunctionNodeInputVector", "vector", value),
            DataType::Rgba => prop_input(operations, "FunctionNodeInputColor", "color", value),
            other => panic!(
                "No input node for literal of type `{other}`. This is probably a bug in the type checker."
            ),
        }
        operations.push(Operation::RenameNode(name.to_string()));
    }
}

pub struct ShaderBackend;

impl Backend for ShaderBackend {
    fn tree_kind(&self) -> TreeKind {
        TreeKind::ShaderNodeTree
    }

    fn create_input(
        &self,
        operations: &mut Vec<Operation>,
        name: &str,
        value: &Literal,
        dtype: DataType,
    ) {
        match dtype {
            // Shader trees have no dedicated bool/int inputs; a value node
            // carries them as numbers.
            DataType::Bool | DataType::Int | DataType::Float => {
                output_default_input(operations, "ShaderNodeValue", value)
            }
            DataType::Rgba => output_default_input(operations, "ShaderNodeRGB", value),
            DataType::Vec3 => {
                // Feed the components into a combine node as input defaults.
                let components = match value {
                    Literal::Vec3(components) => *components,
                    other => panic!(
                        "Vector literal expected, found `{other}`. This is probably a bug in the type checker."
                    ),
                };
                for component in components {
                    operations.push(Operation::PushValue(Some(Literal::Float(component))));
                }
                operations.push(Operation::CallBuiltin(BuiltinNode::new(
                    "ShaderNodeCombineXYZ",
                    vec![0, 1, 2],
                    vec![0],
                    vec![],
                )));
            }
            other => panic!(
                "No input node for literal of type `{other}` in a shader tree. This is probably a bug in the type checker."
            ),
        }
        operations.push(Operation::RenameNode(name.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn geometry_int_literal_is_a_property() {
        let mut operations = vec![];
        GeometryBackend.create_input(&mut operations, "count", &Literal::Int(4), DataType::Int);
        assert_eq!(
            operations,
            vec![
                Operation::CallBuiltin(BuiltinNode::new(
                    "FunctionNodeInputInt",
                    vec![],
                    vec![0],
                    vec![("integer".to_string(), Literal::Int(4))],
                )),
                Operation::RenameNode("count".to_string()),
            ]
        );
    }

    #[test]
    fn float_literal_is_an_output_default() {
        let mut operations = vec![];
        ShaderBackend.create_input(&mut operations, "t", &Literal::Float(0.5), DataType::Float);
        assert_eq!(
            operations,
            vec![
                Operation::CallBuiltin(BuiltinNode::new("ShaderNodeValue", vec![], vec![0], vec![])),
                Operation::SetOutput {
                    slot: 0,
                    value: Literal::Float(0.5),
                },
                Operation::RenameNode("t".to_string()),
            ]
        );
    }
}
