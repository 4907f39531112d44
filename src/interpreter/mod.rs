//! Stage two: a stack machine that executes an operation sequence against a
//! live host document.
//!
//! Each active scope owns three pieces of mutable state: the value stack, the
//! variable environment, and (inside calls) an output array sized to the
//! callee's declared arity. Sequences run strictly in order; nesting is
//! realized by recursing into a sub-sequence under freshly swapped-in state
//! and restoring the caller's state on return.

use fnv::FnvHashMap;

use crate::ast::Literal;
use crate::backend::TreeKind;
use crate::diagnostics::{InterpretationResult, InterpreterError};
use crate::host::{GraphId, HostDocument, InSocket, NodeId, OutSocket, PortDirection, SocketType};
use crate::ir::{BuiltinNode, CompiledFunction, CompiledNodeGroup, Operation, Value};

const REPEAT_INPUT_KIND: &str = "GeometryNodeRepeatInput";
const REPEAT_OUTPUT_KIND: &str = "GeometryNodeRepeatOutput";
const GROUP_INPUT_KIND: &str = "NodeGroupInput";
const GROUP_OUTPUT_KIND: &str = "NodeGroupOutput";

/// The pending loop construct between CreateRepeatZone and RepeatBody.
struct RepeatZone {
    input_node: NodeId,
    output_node: NodeId,
}

/// Execute an operation sequence against the root graph of a document.
pub fn interpret(
    operations: &[Operation],
    doc: &mut dyn HostDocument,
    tree_kind: TreeKind,
) -> InterpretationResult<()> {
    let root = doc.root();
    Interpreter::new(doc, root, tree_kind).run(operations)
}

pub struct Interpreter<'a> {
    doc: &'a mut dyn HostDocument,
    tree_kind: TreeKind,
    /// The graph nodes are currently being created in. Temporarily points at
    /// a subgraph while a node group's internal graph is built.
    graph: GraphId,
    stack: Vec<Value>,
    /// Nodes created so far; the last entry is the target of node-modifying
    /// instructions like SetOutput and RenameNode.
    nodes: Vec<NodeId>,
    variables: FnvHashMap<String, Value>,
    function_outputs: Vec<Option<Value>>,
    /// Subgraphs already materialized this pass, by stable group name.
    group_graphs: FnvHashMap<String, GraphId>,
    current_zone: Option<RepeatZone>,
}

impl<'a> Interpreter<'a> {
    pub fn new(doc: &'a mut dyn HostDocument, graph: GraphId, tree_kind: TreeKind) -> Self {
        Self {
            doc,
            tree_kind,
            graph,
            stack: vec![],
            nodes: vec![],
            variables: FnvHashMap::default(),
            function_outputs: vec![],
            group_graphs: FnvHashMap::default(),
            current_zone: None,
        }
    }

    pub fn run(&mut self, operations: &[Operation]) -> InterpretationResult<()> {
        for operation in operations {
            self.operation(operation)?;
        }
        Ok(())
    }

    fn operation(&mut self, operation: &Operation) -> InterpretationResult<()> {
        match operation {
            Operation::PushValue(Some(literal)) => {
                self.stack.push(Value::Literal(literal.clone()))
            }
            Operation::PushValue(None) => self.stack.push(Value::Absent),
            Operation::GetVar(name) => {
                let value = self
                    .variables
                    .get(name)
                    .ok_or_else(|| InterpreterError::UndefinedVariable(name.clone()))?
                    .clone();
                self.stack.push(value);
            }
            Operation::CreateVar(name) | Operation::BindVar(name) => {
                let value = self.pop("BIND_VAR")?;
                self.variables.insert(name.clone(), value);
            }
            Operation::DestroyVar(name) => {
                self.variables.remove(name);
            }
            Operation::GetOutput(index) => {
                let components = self.pop_struct("GET_OUTPUT")?;
                let len = components.len();
                if *index >= len {
                    return Err(InterpreterError::StructIndexOutOfRange { index: *index, len });
                }
                // Logical index i lives at storage slot len - 1 - i.
                self.stack.push(Value::Socket(components[len - 1 - index]));
            }
            Operation::SetOutput { slot, value } => {
                let node = self.current_node("SET_OUTPUT")?;
                self.doc
                    .set_output_default(OutSocket::new(node, *slot), value.clone());
            }
            Operation::SetFunctionOut(index) => {
                let value = self.pop("SET_FUNCTION_OUT")?;
                let arity = self.function_outputs.len();
                if *index >= arity {
                    return Err(InterpreterError::FunctionOutputIndexOutOfRange {
                        index: *index,
                        arity,
                    });
                }
                self.function_outputs[*index] = Some(value);
            }
            Operation::SplitStruct => {
                let components = self.pop_struct("SPLIT_STRUCT")?;
                self.stack.extend(components.into_iter().map(Value::Socket));
            }
            Operation::CallFunction(function) => self.call_function(function)?,
            Operation::CallNodeGroup(group) => {
                let args = self.pop_args(group.inputs.len(), "CALL_NODEGROUP")?;
                self.call_node_group(group, args)?;
            }
            Operation::CallBuiltin(descriptor) => self.call_builtin(descriptor)?,
            Operation::RenameNode(label) => {
                let node = self.current_node("RENAME_NODE")?;
                self.doc.set_label(node, label);
            }
            Operation::CreateNodeGroup(group) => {
                self.materialize_node_group(group)?;
            }
            Operation::CreateRepeatZone => self.create_repeat_zone()?,
            Operation::RepeatBody(body) => self.execute_repeat_body(body)?,
            Operation::EndOfStatement => self.stack.clear(),
        }
        Ok(())
    }

    fn pop(&mut self, operation: &'static str) -> InterpretationResult<Value> {
        self.stack
            .pop()
            .ok_or(InterpreterError::StackUnderflow(operation))
    }

    /// Pop the top `count` values, in argument order (bottom-most first).
    fn pop_args(
        &mut self,
        count: usize,
        operation: &'static str,
    ) -> InterpretationResult<Vec<Value>> {
        if self.stack.len() < count {
            return Err(InterpreterError::StackUnderflow(operation));
        }
        Ok(self.stack.split_off(self.stack.len() - count))
    }

    fn pop_struct(&mut self, operation: &'static str) -> InterpretationResult<Vec<OutSocket>> {
        match self.pop(operation)? {
            Value::Struct(components) => Ok(components),
            _ => Err(InterpreterError::NotAStruct(operation)),
        }
    }

    fn current_node(&self, operation: &'static str) -> InterpretationResult<NodeId> {
        self.nodes
            .last()
            .copied()
            .ok_or(InterpreterError::NoCurrentNode(operation))
    }

    /// Wire one call argument into an input slot: sockets become links,
    /// literals become static defaults, the absent sentinel leaves the slot
    /// at the node's own default.
    fn wire_argument(
        &mut self,
        arg: Value,
        input: InSocket,
        what: &'static str,
    ) -> InterpretationResult<()> {
        match arg {
            Value::Socket(socket) => self.doc.link(self.graph, socket, input),
            Value::Literal(literal) => self.doc.set_input_default(input, literal),
            Value::Absent => {}
            Value::Struct(_) => return Err(InterpreterError::InvalidArgument(what)),
        }
        Ok(())
    }

    /// Push the exposed outputs of a materialized node: a single output
    /// directly, several as a struct in reversed storage order.
    fn push_node_outputs(&mut self, node: NodeId, outputs: &[usize]) {
        if outputs.len() == 1 {
            self.stack.push(Value::Socket(OutSocket::new(node, outputs[0])));
        } else if outputs.len() > 1 {
            self.stack.push(Value::Struct(
                outputs
                    .iter()
                    .rev()
                    .map(|slot| OutSocket::new(node, *slot))
                    .collect(),
            ));
        }
    }

    fn call_builtin(&mut self, descriptor: &BuiltinNode) -> InterpretationResult<()> {
        let args = self.pop_args(descriptor.inputs.len(), "CALL_BUILTIN")?;

        let node = self.doc.create_node(self.graph, &descriptor.kind);
        for (name, value) in &descriptor.props {
            self.doc.set_property(node, name, value.clone());
        }
        for (arg, slot) in args.into_iter().zip(descriptor.inputs.clone()) {
            self.wire_argument(arg, InSocket::new(node, slot), "builtin argument")?;
        }

        self.push_node_outputs(node, &descriptor.outputs);
        self.nodes.push(node);
        Ok(())
    }

    fn call_function(&mut self, function: &CompiledFunction) -> InterpretationResult<()> {
        let args = self.pop_args(function.inputs.len(), "CALL_FUNCTION")?;

        // Save the caller's state and run the body in an isolated scope.
        let outer_variables = std::mem::take(&mut self.variables);
        for (name, arg) in function.inputs.iter().zip(args) {
            self.variables.insert(name.clone(), arg);
        }
        let outer_outputs = std::mem::replace(
            &mut self.function_outputs,
            vec![None; function.output_count],
        );
        let outer_stack = std::mem::take(&mut self.stack);

        let result = self.run(&function.body);

        self.stack = outer_stack;
        let outputs = std::mem::replace(&mut self.function_outputs, outer_outputs);
        self.variables = outer_variables;
        result?;

        self.push_function_outputs(outputs)
    }

    fn push_function_outputs(&mut self, outputs: Vec<Option<Value>>) -> InterpretationResult<()> {
        if let [output] = &outputs[..] {
            let output = output
                .clone()
                .ok_or(InterpreterError::FunctionOutputUnset(0))?;
            self.stack.push(output);
        } else if outputs.len() > 1 {
            let mut sockets = Vec::with_capacity(outputs.len());
            for (index, output) in outputs.into_iter().enumerate() {
                match output {
                    Some(Value::Socket(socket)) => sockets.push(socket),
                    Some(_) => {
                        return Err(InterpreterError::InvalidArgument(
                            "multi-output calls must produce sockets",
                        ))
                    }
                    None => return Err(InterpreterError::FunctionOutputUnset(index)),
                }
            }
            sockets.reverse();
            self.stack.push(Value::Struct(sockets));
        }
        Ok(())
    }

    fn call_node_group(
        &mut self,
        group: &CompiledNodeGroup,
        args: Vec<Value>,
    ) -> InterpretationResult<()> {
        let subgraph = self.materialize_node_group(group)?;

        // Each call site gets its own instantiation node with fresh wiring.
        let node = self
            .doc
            .create_node(self.graph, self.tree_kind.group_node_kind());
        self.doc.assign_subgraph(node, subgraph);
        for (index, arg) in args.into_iter().enumerate() {
            self.wire_argument(arg, InSocket::new(node, index), "node group argument")?;
        }
        self.nodes.push(node);

        let output_slots: Vec<usize> = (0..group.outputs.len()).collect();
        self.push_node_outputs(node, &output_slots);
        Ok(())
    }

    /// Build the group's internal subgraph, or return the one already built
    /// this pass. Materialization happens exactly once per distinct name.
    fn materialize_node_group(
        &mut self,
        group: &CompiledNodeGroup,
    ) -> InterpretationResult<GraphId> {
        if let Some(subgraph) = self.group_graphs.get(&group.name) {
            return Ok(*subgraph);
        }

        let subgraph = self.doc.create_subgraph(&group.name);
        for input in &group.inputs {
            self.doc.declare_subgraph_port(
                subgraph,
                &input.name,
                PortDirection::Input,
                SocketType::from_data_type(input.dtype),
                input.default.clone(),
            );
        }
        for output in &group.outputs {
            self.doc.declare_subgraph_port(
                subgraph,
                &output.name,
                PortDirection::Output,
                SocketType::from_data_type(output.dtype),
                output.default.clone(),
            );
        }
        let group_input = self.doc.create_node(subgraph, GROUP_INPUT_KIND);
        let group_output = self.doc.create_node(subgraph, GROUP_OUTPUT_KIND);

        // Build the internal graph under swapped-in state targeting it.
        let outer_graph = std::mem::replace(&mut self.graph, subgraph);
        let outer_variables = std::mem::take(&mut self.variables);
        for (index, input) in group.inputs.iter().enumerate() {
            self.variables.insert(
                input.name.clone(),
                Value::Socket(OutSocket::new(group_input, index)),
            );
        }
        let outer_outputs =
            std::mem::replace(&mut self.function_outputs, vec![None; group.outputs.len()]);
        let outer_stack = std::mem::take(&mut self.stack);

        let result = self.run(&group.body);

        let outputs = std::mem::replace(&mut self.function_outputs, outer_outputs);
        let wired = result.and_then(|()| self.wire_group_outputs(outputs, group_output));

        self.stack = outer_stack;
        self.variables = outer_variables;
        self.graph = outer_graph;
        wired?;

        self.group_graphs.insert(group.name.clone(), subgraph);
        Ok(subgraph)
    }

    fn wire_group_outputs(
        &mut self,
        outputs: Vec<Option<Value>>,
        group_output: NodeId,
    ) -> InterpretationResult<()> {
        for (index, output) in outputs.into_iter().enumerate() {
            match output {
                Some(value) => {
                    self.wire_argument(value, InSocket::new(group_output, index), "group output")?
                }
                // An unset output port keeps its declared default.
                None => {}
            }
        }
        Ok(())
    }

    fn create_repeat_zone(&mut self) -> InterpretationResult<()> {
        let iterations = self.pop("CREATE_REPEAT_ZONE")?;

        let input_node = self.doc.create_node(self.graph, REPEAT_INPUT_KIND);
        let output_node = self.doc.create_node(self.graph, REPEAT_OUTPUT_KIND);

        // Slot 0 of the input node is the iteration count.
        match iterations {
            Value::Socket(socket) => {
                self.doc
                    .link(self.graph, socket, InSocket::new(input_node, 0))
            }
            Value::Literal(literal @ Literal::Int(_)) => self
                .doc
                .set_input_default(InSocket::new(input_node, 0), literal),
            _ => return Err(InterpreterError::InvalidIterationCount),
        }

        self.nodes.push(input_node);
        self.nodes.push(output_node);
        self.current_zone = Some(RepeatZone {
            input_node,
            output_node,
        });
        Ok(())
    }

    fn execute_repeat_body(&mut self, body: &[Operation]) -> InterpretationResult<()> {
        let zone = self
            .current_zone
            .take()
            .ok_or(InterpreterError::NoOpenRepeatZone)?;

        // Shallow scan: only the body's top-level instructions are
        // inspected, so a variable first bound inside a further-nested zone
        // or call is not treated as loop-carried.
        let mut captured: Vec<(String, OutSocket)> = vec![];
        for operation in body {
            if let Operation::CreateVar(name) | Operation::BindVar(name) = operation {
                if captured.iter().any(|(existing, _)| existing == name) {
                    continue;
                }
                if let Some(Value::Socket(socket)) = self.variables.get(name) {
                    captured.push((name.clone(), *socket));
                }
            }
        }

        // Captures occupy input slots 1.. (after the iteration count) and
        // output slots 0.. on the boundary pair.
        for (index, (name, socket)) in captured.iter().enumerate() {
            let socket_type = self
                .doc
                .socket_type(*socket)
                .unwrap_or(SocketType::Float);
            self.doc.add_zone_item(zone.input_node, name, socket_type);
            self.doc.add_zone_item(zone.output_node, name, socket_type);

            self.doc
                .link(self.graph, *socket, InSocket::new(zone.input_node, index + 1));
            // Inside the body the variable reads from the zone's inner side.
            self.variables.insert(
                name.clone(),
                Value::Socket(OutSocket::new(zone.input_node, index + 1)),
            );
        }

        self.run(body)?;

        for (index, (name, _)) in captured.iter().enumerate() {
            if let Some(Value::Socket(socket)) = self.variables.get(name) {
                let socket = *socket;
                self.doc
                    .link(self.graph, socket, InSocket::new(zone.output_node, index));
            }
            // After the loop the variable reads from the zone's result.
            self.variables.insert(
                name.clone(),
                Value::Socket(OutSocket::new(zone.output_node, index)),
            );
        }
        Ok(())
    }
}
