//! The interface/attribute registry.
//!
//! An [Attribute] is a named, typed accessor on a semantic data type. It does
//! not touch the graph itself; it only appends the [Operation]s that read or
//! write it, given the name of a variable bound to a value of the owning
//! type. The compiler resolves attributes at compile time — the object's type
//! is already known from the typed tree — and expands field accesses into
//! primitive operations before the interpreter ever runs.

pub mod vec3;

use std::rc::Rc;

use fnv::FnvHashMap;

use crate::ast::DataType;
use crate::ir::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    /// Exposes nested interfaces but no value of its own.
    InterfaceOnly,
}

pub trait Attribute {
    fn name(&self) -> &str;

    fn return_type(&self) -> DataType;

    fn access_mode(&self) -> AccessMode;

    /// Append the operations that push this attribute's value, reading from
    /// the variable `var`.
    fn read(&self, operations: &mut Vec<Operation>, var: &str);

    /// Append the operations that replace this attribute with the value bound
    /// to `value_var`, rebinding `var` to the reconstructed whole.
    fn write(&self, operations: &mut Vec<Operation>, var: &str, value_var: &str);
}

/// All accessors registered for one semantic type.
pub struct TypeInterfaceDefinition {
    pub base_type: DataType,
    interfaces: FnvHashMap<String, Rc<dyn Attribute>>,
}

impl TypeInterfaceDefinition {
    pub fn new(base_type: DataType) -> Self {
        Self {
            base_type,
            interfaces: FnvHashMap::default(),
        }
    }

    pub fn add(&mut self, attribute: Rc<dyn Attribute>) {
        self.interfaces
            .insert(attribute.name().to_string(), attribute);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Attribute>> {
        self.interfaces.get(name).cloned()
    }
}

/// Registry from semantic type to its interface definition.
///
/// Constructed explicitly and handed to the compiler, never ambient state, so
/// isolated instances with a subset of types are trivial to build in tests.
pub struct InterfaceRegistry {
    types: FnvHashMap<DataType, TypeInterfaceDefinition>,
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            types: FnvHashMap::default(),
        }
    }

    /// A registry with the built-in type interfaces registered.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register(vec3::definition());
        registry
    }

    pub fn register(&mut self, definition: TypeInterfaceDefinition) {
        self.types.insert(definition.base_type, definition);
    }

    pub fn get_type(&self, dtype: DataType) -> Option<&TypeInterfaceDefinition> {
        self.types.get(&dtype)
    }

    pub fn get_interface(&self, dtype: DataType, name: &str) -> Option<Rc<dyn Attribute>> {
        self.get_type(dtype)?.get(name)
    }
}
