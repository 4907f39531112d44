//! Component accessors for the 3-component vector type.
//!
//! The underlying composite value is a single socket; components are not
//! independently addressable. Reads go through a decompose node and writes
//! are whole-value reconstruction: recompute the untouched components, splice
//! in the new one, recompose, and rebind the variable to the result.

use std::rc::Rc;

use crate::ast::DataType;
use crate::ir::{BuiltinNode, Operation};

use super::{AccessMode, Attribute, TypeInterfaceDefinition};

/// The builtin that splits a vector into its three component outputs.
pub fn decompose_node() -> BuiltinNode {
    BuiltinNode::new("ShaderNodeSeparateXYZ", vec![0], vec![0, 1, 2], vec![])
}

/// The builtin that joins three components back into a vector.
pub fn compose_node() -> BuiltinNode {
    BuiltinNode::new("ShaderNodeCombineXYZ", vec![0, 1, 2], vec![0], vec![])
}

/// Push component `index` of the vector bound to `var`.
fn read_component(operations: &mut Vec<Operation>, index: usize, var: &str) {
    operations.push(Operation::GetVar(var.to_string()));
    operations.push(Operation::CallBuiltin(decompose_node()));
    operations.push(Operation::GetOutput(index));
}

/// Rebuild the vector bound to `var` with component `index` replaced by the
/// value bound to `value_var`.
fn write_component(operations: &mut Vec<Operation>, index: usize, var: &str, value_var: &str) {
    for component in 0..3 {
        if component == index {
            operations.push(Operation::GetVar(value_var.to_string()));
        } else {
            read_component(operations, component, var);
        }
    }
    operations.push(Operation::CallBuiltin(compose_node()));
    operations.push(Operation::BindVar(var.to_string()));
}

struct ComponentAttribute {
    index: usize,
    name: &'static str,
}

impl ComponentAttribute {
    fn new(index: usize) -> Self {
        let name = match index {
            0 => "x",
            1 => "y",
            2 => "z",
            _ => panic!("vec3 has components 0..3, got {index}"),
        };
        Self { index, name }
    }
}

impl Attribute for ComponentAttribute {
    fn name(&self) -> &str {
        self.name
    }

    fn return_type(&self) -> DataType {
        DataType::Float
    }

    fn access_mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn read(&self, operations: &mut Vec<Operation>, var: &str) {
        read_component(operations, self.index, var);
    }

    fn write(&self, operations: &mut Vec<Operation>, var: &str, value_var: &str) {
        write_component(operations, self.index, var, value_var);
    }
}

/// The interface definition for [DataType::Vec3]: read-write `x`, `y`, `z`.
pub fn definition() -> TypeInterfaceDefinition {
    let mut definition = TypeInterfaceDefinition::new(DataType::Vec3);
    for index in 0..3 {
        definition.add(Rc::new(ComponentAttribute::new(index)));
    }
    definition
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn read_goes_through_decompose() {
        let mut operations = vec![];
        read_component(&mut operations, 2, "v");
        assert_eq!(
            operations,
            vec![
                Operation::GetVar("v".to_string()),
                Operation::CallBuiltin(decompose_node()),
                Operation::GetOutput(2),
            ]
        );
    }

    #[test]
    fn write_reconstructs_the_whole_vector() {
        let mut operations = vec![];
        write_component(&mut operations, 1, "v", "value");
        let mut expected = vec![];
        read_component(&mut expected, 0, "v");
        expected.push(Operation::GetVar("value".to_string()));
        read_component(&mut expected, 2, "v");
        expected.push(Operation::CallBuiltin(compose_node()));
        expected.push(Operation::BindVar("v".to_string()));
        assert_eq!(operations, expected);
    }
}
