//! In-memory [HostDocument] implementation.

use fnv::FnvHashMap;

use crate::ast::Literal;

use super::{GraphId, HostDocument, InSocket, NodeId, OutSocket, PortDirection, SocketType};

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: String,
    pub label: Option<String>,
    pub props: Vec<(String, Literal)>,
    pub input_defaults: FnvHashMap<usize, Literal>,
    pub output_defaults: FnvHashMap<usize, Literal>,
    /// Subgraph instantiated by this node, for call-site nodes.
    pub subgraph: Option<GraphId>,
    /// Loop-carried item slots, for repeat boundary nodes.
    pub zone_items: Vec<(String, SocketType)>,
}

impl NodeData {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            label: None,
            props: vec![],
            input_defaults: FnvHashMap::default(),
            output_defaults: FnvHashMap::default(),
            subgraph: None,
            zone_items: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub from: OutSocket,
    pub to: InSocket,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    pub socket_type: SocketType,
    pub default: Option<Literal>,
}

#[derive(Debug, Clone)]
pub struct GraphData {
    pub name: String,
    pub nodes: Vec<NodeId>,
    pub links: Vec<Link>,
    pub ports: Vec<Port>,
}

impl GraphData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: vec![],
            links: vec![],
            ports: vec![],
        }
    }
}

/// A plain data document: graphs, nodes, links and defaults in hash tables.
/// Stands in for the host application in tests and offline runs.
pub struct GraphDoc {
    pub graphs: FnvHashMap<GraphId, GraphData>,
    pub nodes: FnvHashMap<NodeId, NodeData>,
    socket_types: FnvHashMap<OutSocket, SocketType>,
    root: GraphId,
    next_graph: GraphId,
    next_node: NodeId,
}

impl Default for GraphDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphDoc {
    pub fn new() -> Self {
        let mut graphs = FnvHashMap::default();
        graphs.insert(0, GraphData::new("root"));
        Self {
            graphs,
            nodes: FnvHashMap::default(),
            socket_types: FnvHashMap::default(),
            root: 0,
            next_graph: 1,
            next_node: 0,
        }
    }

    pub fn node(&self, nid: NodeId) -> &NodeData {
        self.nodes.get(&nid).expect("node id handed out by this doc")
    }

    pub fn graph(&self, gid: GraphId) -> &GraphData {
        self.graphs.get(&gid).expect("graph id handed out by this doc")
    }

    /// Ids of all nodes of the given kind within one graph, in creation order.
    pub fn nodes_of_kind(&self, graph: GraphId, kind: &str) -> Vec<NodeId> {
        self.graph(graph)
            .nodes
            .iter()
            .copied()
            .filter(|nid| self.node(*nid).kind == kind)
            .collect()
    }

    /// All links ending at any input slot of the given node.
    pub fn links_into(&self, graph: GraphId, node: NodeId) -> Vec<Link> {
        self.graph(graph)
            .links
            .iter()
            .copied()
            .filter(|link| link.to.node == node)
            .collect()
    }

    pub fn subgraph_by_name(&self, name: &str) -> Option<GraphId> {
        self.graphs
            .iter()
            .find(|(gid, data)| **gid != self.root && data.name == name)
            .map(|(gid, _)| *gid)
    }

    /// Record a socket's host type, so [HostDocument::socket_type] can answer
    /// for it. The document has no node-kind schema, so types are only known
    /// where someone registered them.
    pub fn note_socket_type(&mut self, socket: OutSocket, socket_type: SocketType) {
        self.socket_types.insert(socket, socket_type);
    }

    fn node_mut(&mut self, nid: NodeId) -> &mut NodeData {
        self.nodes
            .get_mut(&nid)
            .expect("node id handed out by this doc")
    }
}

impl HostDocument for GraphDoc {
    fn root(&self) -> GraphId {
        self.root
    }

    fn create_node(&mut self, graph: GraphId, kind: &str) -> NodeId {
        let nid = self.next_node;
        self.next_node += 1;
        self.nodes.insert(nid, NodeData::new(kind));
        self.graphs
            .get_mut(&graph)
            .expect("graph id handed out by this doc")
            .nodes
            .push(nid);
        nid
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: Literal) {
        self.node_mut(node).props.push((name.to_string(), value));
    }

    fn set_label(&mut self, node: NodeId, label: &str) {
        self.node_mut(node).label = Some(label.to_string());
    }

    fn link(&mut self, graph: GraphId, from: OutSocket, to: InSocket) {
        self.graphs
            .get_mut(&graph)
            .expect("graph id handed out by this doc")
            .links
            .push(Link { from, to });
    }

    fn set_input_default(&mut self, socket: InSocket, value: Literal) {
        self.node_mut(socket.node)
            .input_defaults
            .insert(socket.index, value);
    }

    fn set_output_default(&mut self, socket: OutSocket, value: Literal) {
        self.node_mut(socket.node)
            .output_defaults
            .insert(socket.index, value);
    }

    fn create_subgraph(&mut self, name: &str) -> GraphId {
        let gid = self.next_graph;
        self.next_graph += 1;
        self.graphs.insert(gid, GraphData::new(name));
        gid
    }

    fn declare_subgraph_port(
        &mut self,
        graph: GraphId,
        name: &str,
        direction: PortDirection,
        socket_type: SocketType,
        default: Option<Literal>,
    ) {
        self.graphs
            .get_mut(&graph)
            .expect("graph id handed out by this doc")
            .ports
            .push(Port {
                name: name.to_string(),
                direction,
                socket_type,
                default,
            });
    }

    fn assign_subgraph(&mut self, node: NodeId, graph: GraphId) {
        self.node_mut(node).subgraph = Some(graph);
    }

    fn add_zone_item(&mut self, node: NodeId, name: &str, socket_type: SocketType) {
        self.node_mut(node)
            .zone_items
            .push((name.to_string(), socket_type));
    }

    fn socket_type(&self, socket: OutSocket) -> Option<SocketType> {
        self.socket_types.get(&socket).copied()
    }
}
