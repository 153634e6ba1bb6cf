use arbor_core::{Local, NodeDataMut, NodeId, RuntimeBuffer, RuntimeValue, SlotRange, TickContext};

use crate::{RunnerError, VarValue, VariableTable};

/// What an action sees while it is initialized, executed or deinitialized: the host, its own
/// slots in the runner's buffer and the tree variables.
pub struct NodeCtx<'a, C> {
    host: &'a mut C,
    buffer: &'a mut RuntimeBuffer,
    slots: SlotRange,
    variables: &'a VariableTable,
    tick: TickContext,
    node: NodeId,
}

impl<'a, C> NodeCtx<'a, C> {
    pub(crate) fn new(
        host: &'a mut C,
        buffer: &'a mut RuntimeBuffer,
        slots: SlotRange,
        variables: &'a VariableTable,
        tick: TickContext,
        node: NodeId,
    ) -> Self {
        Self {
            host,
            buffer,
            slots,
            variables,
            tick,
            node,
        }
    }

    pub fn host(&self) -> &C {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut C {
        &mut *self.host
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tick(&self) -> TickContext {
        self.tick
    }

    pub fn dt_seconds(&self) -> f32 {
        self.tick.dt_seconds
    }

    /// # Panics
    /// If the node did not register `local` with this type during layout.
    pub fn get<T: RuntimeValue>(&self, local: Local<T>) -> &T {
        self.buffer.get(self.slots.handle(local))
    }

    pub fn get_mut<T: RuntimeValue>(&mut self, local: Local<T>) -> &mut T {
        self.buffer.get_mut(self.slots.handle(local))
    }

    pub fn set<T: RuntimeValue>(&mut self, local: Local<T>, value: T) -> T {
        self.buffer.set(self.slots.handle(local), value)
    }

    pub fn data(&mut self) -> NodeDataMut<'_> {
        NodeDataMut::new(&mut *self.buffer, self.slots)
    }

    pub fn variable(&self, name: &str) -> Option<VarValue> {
        read_variable(&*self.buffer, self.variables, name)
    }

    /// Writes a tree variable of this instance. The value must keep the variable's kind.
    pub fn set_variable(&mut self, name: &str, value: VarValue) -> Result<VarValue, RunnerError> {
        write_variable(&mut *self.buffer, self.variables, name, value)
    }
}

/// Read-only view handed to selector conditions and gate triggers.
pub struct EvalCtx<'a, C> {
    host: &'a C,
    buffer: &'a RuntimeBuffer,
    variables: &'a VariableTable,
    tick: TickContext,
    node: NodeId,
}

impl<'a, C> EvalCtx<'a, C> {
    pub(crate) fn new(
        host: &'a C,
        buffer: &'a RuntimeBuffer,
        variables: &'a VariableTable,
        tick: TickContext,
        node: NodeId,
    ) -> Self {
        Self {
            host,
            buffer,
            variables,
            tick,
            node,
        }
    }

    pub fn host(&self) -> &C {
        self.host
    }

    /// The selector or gate consulting this condition.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tick(&self) -> TickContext {
        self.tick
    }

    pub fn variable(&self, name: &str) -> Option<VarValue> {
        read_variable(self.buffer, self.variables, name)
    }

    pub fn bool_variable(&self, name: &str) -> Option<bool> {
        self.variable(name).and_then(VarValue::as_bool)
    }

    pub fn int_variable(&self, name: &str) -> Option<i64> {
        self.variable(name).and_then(VarValue::as_int)
    }

    pub fn float_variable(&self, name: &str) -> Option<f32> {
        self.variable(name).and_then(VarValue::as_float)
    }
}

pub(crate) fn read_variable(
    buffer: &RuntimeBuffer,
    variables: &VariableTable,
    name: &str,
) -> Option<VarValue> {
    variables.handle(name).map(|handle| buffer[handle])
}

pub(crate) fn write_variable(
    buffer: &mut RuntimeBuffer,
    variables: &VariableTable,
    name: &str,
    value: VarValue,
) -> Result<VarValue, RunnerError> {
    let handle = variables
        .handle(name)
        .ok_or_else(|| RunnerError::UnknownVariable(name.to_owned()))?;
    let current = buffer[handle];
    if current.kind() != value.kind() {
        return Err(RunnerError::VariableType {
            name: name.to_owned(),
            expected: current.kind(),
            found: value.kind(),
        });
    }
    Ok(buffer.set(handle, value))
}
