//! The host graph capability surface.
//!
//! The interpreter only ever talks to a [HostDocument]: an opaque, mutable
//! collection of graphs, nodes and socket links. A real host application
//! would implement this trait over its own document model; [GraphDoc] is the
//! in-memory implementation used for tests and offline inspection.

mod document;
pub mod visualizer;

pub use document::{GraphData, GraphDoc, Link, NodeData, Port};

use crate::ast::{DataType, Literal};

/// Index of a graph in a host document.
pub type GraphId = u64;

/// Index of a node in a host document.
pub type NodeId = u64;

/// An output port of a materialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutSocket {
    pub node: NodeId,
    pub index: usize,
}

/// An input port of a materialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InSocket {
    pub node: NodeId,
    pub index: usize,
}

impl OutSocket {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl InSocket {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// The host's socket type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    Bool,
    Int,
    Float,
    Color,
    Vector,
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

impl SocketType {
    pub fn from_data_type(dtype: DataType) -> SocketType {
        match dtype {
            DataType::Bool => SocketType::Bool,
            DataType::Int => SocketType::Int,
            DataType::Float => SocketType::Float,
            DataType::Rgba => SocketType::Color,
            DataType::Vec3 => SocketType::Vector,
            DataType::Geometry => SocketType::Geometry,
            DataType::String => SocketType::String,
            DataType::Shader => SocketType::Shader,
            DataType::Object => SocketType::Object,
            DataType::Image => SocketType::Image,
            DataType::Collection => SocketType::Collection,
            DataType::Texture => SocketType::Texture,
            DataType::Material => SocketType::Material,
            DataType::Rotation => SocketType::Rotation,
        }
    }
}

/// Graph-editing primitives consumed from the host application.
///
/// This is the surface a host application exposes for building node trees:
/// node creation, wiring, static defaults, named subgraphs with typed ports,
/// plus the loop-zone item management used by repeat constructs.
pub trait HostDocument {
    /// The top-level graph that a plain interpretation pass targets.
    fn root(&self) -> GraphId;

    fn create_node(&mut self, graph: GraphId, kind: &str) -> NodeId;

    /// Set a static property on a node (e.g. an operation enum).
    fn set_property(&mut self, node: NodeId, name: &str, value: Literal);

    /// Set a node's display label.
    fn set_label(&mut self, node: NodeId, label: &str);

    fn link(&mut self, graph: GraphId, from: OutSocket, to: InSocket);

    /// Set the static default shown on an unconnected input slot.
    fn set_input_default(&mut self, socket: InSocket, value: Literal);

    /// Set the static default of an output slot (literal-producing nodes
    /// carry their value here).
    fn set_output_default(&mut self, socket: OutSocket, value: Literal);

    fn create_subgraph(&mut self, name: &str) -> GraphId;

    fn declare_subgraph_port(
        &mut self,
        graph: GraphId,
        name: &str,
        direction: PortDirection,
        socket_type: SocketType,
        default: Option<Literal>,
    );

    /// Point a call-site node at the subgraph it instantiates.
    fn assign_subgraph(&mut self, node: NodeId, graph: GraphId);

    /// Append a loop-carried item slot to a repeat boundary node.
    fn add_zone_item(&mut self, node: NodeId, name: &str, socket_type: SocketType);

    /// The host-side type of an output socket, if the host can determine it.
    fn socket_type(&self, socket: OutSocket) -> Option<SocketType>;
}
