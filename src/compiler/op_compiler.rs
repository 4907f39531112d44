use std::rc::Rc;

use crate::ast::{
    AssignStatement, AssignTarget, DataType, Expression, ExpressionKind, FieldAccessExpression,
    FieldAssignStatement, Function, FunctionCallExpression, BuiltinCallExpression, Literal,
    Program, RepeatStatement, StackShape, Statement, StatementKind, UnrollStatement,
};
use crate::backend::Backend;
use crate::diagnostics::{CompilationError, CompilationResult};
use crate::interfaces::{vec3, Attribute, InterfaceRegistry};
use crate::ir::{CompiledFunction, CompiledNodeGroup, Operation};

/// Generate a name no user variable can collide with, for compiler
/// temporaries around field accesses.
fn temp_var_name(prefix: &str) -> String {
    format!("{prefix}_{:08x}", rand::random::<u32>())
}

pub struct OpCompiler {
    /// The implicit current sequence. Swapped out while compiling a nested
    /// body so the nested sequence is captured independently.
    operations: Vec<Operation>,
    backend: Box<dyn Backend>,
    registry: InterfaceRegistry,
    /// The function whose body is being compiled, for naming its outputs.
    current_function: Option<Rc<Function>>,
}

impl OpCompiler {
    pub fn new(backend: Box<dyn Backend>, registry: InterfaceRegistry) -> Self {
        Self {
            operations: vec![],
            backend,
            registry,
            current_function: None,
        }
    }

    pub fn compile(mut self, program: &Program) -> CompilationResult<Vec<Operation>> {
        for statement in &program.body {
            self.compile_statement(statement)?;
        }
        Ok(self.operations)
    }

    fn compile_statement(&mut self, statement: &Statement) -> CompilationResult<()> {
        match &statement.kind {
            StatementKind::Expression(expression) => self.compile_expression(expression)?,
            StatementKind::Assign(assign) => self.compile_assign(assign)?,
            StatementKind::FieldAssign(field_assign) => self.compile_field_assign(field_assign)?,
            StatementKind::Unroll(unroll) => self.compile_unroll(unroll)?,
            StatementKind::Repeat(repeat) => self.compile_repeat(repeat)?,
        }
        self.operations.push(Operation::EndOfStatement);
        Ok(())
    }

    /// Compile a nested statement list into its own sequence, leaving the
    /// current sequence untouched.
    fn compile_body(&mut self, body: &[Statement]) -> CompilationResult<Vec<Operation>> {
        let outer_operations = std::mem::take(&mut self.operations);
        let result = body
            .iter()
            .try_for_each(|statement| self.compile_statement(statement));
        let compiled_body = std::mem::replace(&mut self.operations, outer_operations);
        result?;
        Ok(compiled_body)
    }

    // TODO: Lower bounded loops to repeat zones instead of unrolling them.
    fn compile_unroll(&mut self, unroll: &UnrollStatement) -> CompilationResult<()> {
        let compiled_body = self.compile_body(&unroll.body)?;
        for i in unroll.start..=unroll.end {
            if let Some(var) = &unroll.var {
                self.operations.push(Operation::PushValue(Some(Literal::Int(i))));
                self.operations.push(Operation::BindVar(var.clone()));
            }
            self.operations.extend(compiled_body.iter().cloned());
        }
        Ok(())
    }

    fn compile_repeat(&mut self, repeat: &RepeatStatement) -> CompilationResult<()> {
        let compiled_body = self.compile_body(&repeat.body)?;

        // The iteration count is evaluated in the enclosing scope; its result
        // is on the stack when the zone opens.
        self.compile_expression(&repeat.iterations)?;
        self.operations.push(Operation::CreateRepeatZone);
        self.operations.push(Operation::RepeatBody(compiled_body));
        Ok(())
    }

    fn compile_assign(&mut self, assign: &AssignStatement) -> CompilationResult<()> {
        if let ExpressionKind::Const(literal) = &assign.value.kind {
            // A literal assignment materializes an input node directly; it
            // never round-trips through PushValue/BindVar.
            let Some(Some(target)) = assign.targets.first() else {
                return Ok(());
            };
            let dtype = assign.value.dtype();
            match target {
                AssignTarget::Variable(name) => {
                    self.backend
                        .create_input(&mut self.operations, name, literal, dtype);
                    self.operations.push(Operation::BindVar(name.clone()));
                }
                AssignTarget::FunctionOutput(index) => {
                    let name = self.function_output_name(*index);
                    self.backend
                        .create_input(&mut self.operations, &name, literal, dtype);
                    self.operations.push(Operation::SetFunctionOut(*index));
                }
            }
            return Ok(());
        }

        self.compile_expression(&assign.value)?;

        if assign.targets.len() > 1 {
            if assign.value.shape == StackShape::Struct {
                self.operations.push(Operation::SplitStruct);
            } else if assign.value.dtype() == DataType::Vec3 {
                // A vector still lives on one socket; decompose it first.
                self.operations
                    .push(Operation::CallBuiltin(vec3::decompose_node()));
                self.operations.push(Operation::SplitStruct);
            } else if assign.value.dtype() == DataType::Rgba {
                return Err(CompilationError::new_generic(
                    "Splitting a color value into components is not implemented.",
                ));
            } else {
                panic!(
                    "Cannot split a `{}` value across multiple targets. This is probably a bug in the type checker.",
                    assign.value.dtype()
                );
            }
        } else if assign.value.shape == StackShape::Struct {
            // Single target: keep the first logical component.
            self.operations.push(Operation::GetOutput(0));
        }

        for target in &assign.targets {
            match target {
                Some(AssignTarget::Variable(name)) => {
                    self.operations.push(Operation::BindVar(name.clone()))
                }
                Some(AssignTarget::FunctionOutput(index)) => {
                    self.operations.push(Operation::SetFunctionOut(*index))
                }
                // Discarded component; residue is cleared at the statement
                // boundary.
                None => continue,
            }
        }
        Ok(())
    }

    fn compile_field_assign(&mut self, field_assign: &FieldAssignStatement) -> CompilationResult<()> {
        let attribute =
            self.lookup_attribute(field_assign.target.dtype(), &field_assign.field)?;

        // Value first, object second; both temporaries exist while the
        // attribute expands its write sequence.
        self.compile_expression(&field_assign.value)?;
        let value_temp = temp_var_name(&field_assign.field);
        self.operations.push(Operation::BindVar(value_temp.clone()));

        self.compile_expression(&field_assign.target)?;
        let target_temp = temp_var_name("target");
        self.operations.push(Operation::BindVar(target_temp.clone()));

        attribute.write(&mut self.operations, &target_temp, &value_temp);

        // The write rebound the temporary to the reconstructed value. If the
        // target was a plain variable, carry the result back to it before the
        // temporaries go away.
        if let ExpressionKind::VariableRef(name) = &field_assign.target.kind {
            self.operations.push(Operation::GetVar(target_temp.clone()));
            self.operations.push(Operation::BindVar(name.clone()));
        }

        self.operations.push(Operation::DestroyVar(value_temp));
        self.operations.push(Operation::DestroyVar(target_temp));
        Ok(())
    }

    fn compile_field_access(&mut self, access: &FieldAccessExpression) -> CompilationResult<()> {
        let attribute = self.lookup_attribute(access.object.dtype(), &access.field)?;

        self.compile_expression(&access.object)?;
        let temp = temp_var_name(&access.field);
        self.operations.push(Operation::BindVar(temp.clone()));
        attribute.read(&mut self.operations, &temp);
        self.operations.push(Operation::DestroyVar(temp));
        Ok(())
    }

    fn compile_expression(&mut self, expression: &Expression) -> CompilationResult<()> {
        match &expression.kind {
            ExpressionKind::Const(literal) => self
                .operations
                .push(Operation::PushValue(Some(literal.clone()))),
            ExpressionKind::VariableRef(name) => {
                self.operations.push(Operation::GetVar(name.clone()))
            }
            ExpressionKind::BuiltinCall(call) => self.compile_builtin_call(call)?,
            ExpressionKind::FunctionCall(call) => self.compile_function_call(call)?,
            ExpressionKind::AccessOutput(access) => {
                self.compile_expression(&access.value)?;
                self.operations.push(Operation::GetOutput(access.index));
            }
            ExpressionKind::FieldAccess(access) => self.compile_field_access(access)?,
        }
        Ok(())
    }

    /// Compile call arguments in declared order. Struct-shaped arguments
    /// forward only their first logical component.
    fn compile_call_args(&mut self, args: &[Expression]) -> CompilationResult<()> {
        for arg in args {
            self.compile_expression(arg)?;
            if arg.shape == StackShape::Struct {
                self.operations.push(Operation::GetOutput(0));
            }
        }
        Ok(())
    }

    fn compile_builtin_call(&mut self, call: &BuiltinCallExpression) -> CompilationResult<()> {
        self.compile_call_args(&call.args)?;
        // Missing trailing arguments keep the node's own defaults.
        for _ in call.args.len()..call.node.inputs.len() {
            self.operations.push(Operation::PushValue(None));
        }
        self.operations.push(Operation::CallBuiltin(call.node.clone()));
        Ok(())
    }

    fn compile_function_call(&mut self, call: &FunctionCallExpression) -> CompilationResult<()> {
        self.compile_call_args(&call.args)?;
        // Missing trailing arguments are filled from declared defaults.
        for param in call.function.inputs.iter().skip(call.args.len()) {
            self.operations
                .push(Operation::PushValue(param.default.clone()));
        }
        if call.function.is_node_group {
            let group = self.compile_node_group(&call.function)?;
            self.operations.push(Operation::CallNodeGroup(group));
        } else {
            let function = self.compile_function(&call.function)?;
            self.operations.push(Operation::CallFunction(function));
        }
        Ok(())
    }

    fn compile_function(&mut self, function: &Rc<Function>) -> CompilationResult<CompiledFunction> {
        let outer_function = self.current_function.replace(function.clone());
        let body = self.compile_body(&function.body);
        self.current_function = outer_function;
        Ok(CompiledFunction::new(
            function.inputs.iter().map(|p| p.name.clone()).collect(),
            body?,
            function.outputs.len(),
        ))
    }

    fn compile_node_group(&mut self, function: &Rc<Function>) -> CompilationResult<CompiledNodeGroup> {
        let outer_function = self.current_function.replace(function.clone());
        let body = self.compile_body(&function.body);
        self.current_function = outer_function;
        Ok(CompiledNodeGroup::new(
            function.name.clone(),
            function.inputs.clone(),
            function.outputs.clone(),
            body?,
        ))
    }

    fn function_output_name(&self, index: usize) -> String {
        let function = self
            .current_function
            .as_ref()
            .expect("Function outputs can only be assigned inside a function body. This is probably a bug in the type checker.");
        function
            .outputs
            .get(index)
            .unwrap_or_else(|| {
                panic!(
                    "Function `{}` has no output {index}. This is probably a bug in the type checker.",
                    function.name
                )
            })
            .name
            .clone()
    }

    fn lookup_attribute(
        &self,
        dtype: DataType,
        field: &str,
    ) -> CompilationResult<Rc<dyn Attribute>> {
        let definition = self
            .registry
            .get_type(dtype)
            .ok_or_else(|| CompilationError::new_unknown_interface(dtype))?;
        definition
            .get(field)
            .ok_or_else(|| CompilationError::new_unknown_field(dtype, field))
    }
}
