use arbor_core::{
    Handle, Layout, Local, NodeDataMut, NodeId, RuntimeBuffer, SlotRange, Status, TickContext,
};
use arbor_tools::{TraceEvent, TraceKind, TraceSink};
use tracing::trace;

use crate::{EvalCtx, NodeCtx, NodeKind, Tree, VariableTable};

pub(crate) mod sequence {
    use super::*;

    pub const ACTIVE: Local<usize> = Local::new(0);
    pub const OUTCOME: Local<Option<Status>> = Local::new(1);
}

pub(crate) mod selector {
    use super::*;

    pub const ACTIVE: Local<Option<usize>> = Local::new(0);
}

pub(crate) mod parallel {
    use super::*;

    pub const DONE: Local<Vec<bool>> = Local::new(0);
}

pub(crate) mod gate {
    use super::*;

    pub const STARTED: Local<bool> = Local::new(0);
}

/// Where one node keeps its state in a runner's buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeLayout {
    pub active: Handle<bool>,
    pub slots: SlotRange,
}

/// Lays out every attached node in pre-order: the node's `active` flag, then its own slots.
///
/// The returned table is indexed by [`NodeId::index`].
pub(crate) fn lay_out<C>(tree: &Tree<C>, buffer: &mut RuntimeBuffer) -> Vec<Option<NodeLayout>> {
    let mut layouts: Vec<Option<NodeLayout>> = Vec::new();
    for id in tree.walk() {
        let node = tree.expect_node(id);
        let active = buffer.register(false);
        let mut layout = Layout::new(buffer);
        match node.kind() {
            NodeKind::Sequence { .. } => {
                layout.register(sequence::ACTIVE, 0);
                layout.register(sequence::OUTCOME, None);
            }
            NodeKind::Selector { .. } => {
                layout.register(selector::ACTIVE, None);
            }
            NodeKind::Parallel => {
                layout.register(parallel::DONE, vec![false; node.children().len()]);
            }
            NodeKind::Repeater { .. } => {}
            NodeKind::Gate { .. } => {
                layout.register(gate::STARTED, false);
            }
            NodeKind::Action(action) => action.create_layout(&mut layout),
        }
        let slots = layout.finish();

        if layouts.len() <= id.index() {
            layouts.resize(id.index() + 1, None);
        }
        layouts[id.index()] = Some(NodeLayout { active, slots });
    }
    layouts
}

/// One pass of lifecycle calls over a runner's state.
pub(crate) struct Exec<'r, 't, C> {
    pub tree: &'t Tree<C>,
    pub buffer: &'r mut RuntimeBuffer,
    pub layouts: &'r [Option<NodeLayout>],
    pub variables: &'r VariableTable,
    pub tick: TickContext,
    pub trace: &'r mut Option<Box<dyn TraceSink>>,
}

impl<C> Exec<'_, '_, C> {
    fn layout(&self, id: NodeId) -> NodeLayout {
        match self.layouts.get(id.index()).copied().flatten() {
            Some(layout) => layout,
            None => panic!("node {id} was not laid out by this runner"),
        }
    }

    fn data(&mut self, slots: SlotRange) -> NodeDataMut<'_> {
        NodeDataMut::new(&mut *self.buffer, slots)
    }

    fn emit(&mut self, node: NodeId, kind: TraceKind) {
        if let Some(sink) = self.trace.as_mut() {
            sink.emit(TraceEvent::new(self.tick.tick, node, kind));
        }
    }

    /// Brings `id` into its initial state. No-op for a node that is already initialized.
    pub fn initialize(&mut self, id: NodeId, host: &mut C) {
        let layout = self.layout(id);
        if self.buffer[layout.active] {
            return;
        }
        self.buffer[layout.active] = true;
        self.emit(id, TraceKind::Initialized);

        let tree = self.tree;
        let node = tree.expect_node(id);
        match node.kind() {
            NodeKind::Sequence { .. } => {
                let mut data = self.data(layout.slots);
                data.set(sequence::ACTIVE, 0);
                data.set(sequence::OUTCOME, None);
                if let Some(&first) = node.children().first() {
                    self.initialize(first, host);
                }
            }
            NodeKind::Selector { .. } => {
                self.data(layout.slots).set(selector::ACTIVE, None);
            }
            NodeKind::Parallel => {
                self.data(layout.slots)
                    .get_mut(parallel::DONE)
                    .fill(false);
                for &child in node.children() {
                    self.initialize(child, host);
                }
            }
            NodeKind::Repeater { .. } => {
                if let Some(child) = node.child() {
                    self.initialize(child, host);
                }
            }
            NodeKind::Gate { .. } => {
                self.data(layout.slots).set(gate::STARTED, false);
            }
            NodeKind::Action(action) => {
                let mut ctx = NodeCtx::new(
                    host,
                    &mut *self.buffer,
                    layout.slots,
                    self.variables,
                    self.tick,
                    id,
                );
                action.initialize(&mut ctx);
            }
        }
    }

    /// Tears `id` and every initialized descendant down. No-op for an inactive node.
    pub fn deinitialize(&mut self, id: NodeId, host: &mut C) {
        let layout = self.layout(id);
        if !self.buffer[layout.active] {
            return;
        }

        let tree = self.tree;
        let node = tree.expect_node(id);
        match node.kind() {
            NodeKind::Action(action) => {
                let mut ctx = NodeCtx::new(
                    host,
                    &mut *self.buffer,
                    layout.slots,
                    self.variables,
                    self.tick,
                    id,
                );
                action.deinitialize(&mut ctx);
            }
            _ => {
                for &child in node.children() {
                    self.deinitialize(child, host);
                }
            }
        }

        self.buffer[layout.active] = false;
        self.emit(id, TraceKind::Deinitialized);
    }

    /// Ticks `id` once, initializing it first if needed.
    pub fn execute(&mut self, id: NodeId, host: &mut C) -> Status {
        self.initialize(id, host);
        let layout = self.layout(id);
        let tree = self.tree;
        let node = tree.expect_node(id);

        let status = match node.kind() {
            NodeKind::Sequence { never_fail } => {
                self.execute_sequence(node.children(), layout.slots, *never_fail, host)
            }
            NodeKind::Selector { condition } => {
                let selection = condition.as_ref().and_then(|condition| {
                    let ctx = EvalCtx::new(&*host, &*self.buffer, self.variables, self.tick, id);
                    condition.evaluate(&ctx)
                });
                self.execute_selector(id, node.children(), layout.slots, selection, host)
            }
            NodeKind::Parallel => self.execute_parallel(node.children(), layout.slots, host),
            NodeKind::Repeater { break_on_failure } => match node.child() {
                Some(child) => self.execute_repeater(child, *break_on_failure, host),
                None => Status::Finished,
            },
            NodeKind::Gate { trigger } => match node.child() {
                Some(child) => {
                    let started = *self.data(layout.slots).get(gate::STARTED);
                    let fire = started
                        || trigger.as_ref().is_some_and(|trigger| {
                            let ctx =
                                EvalCtx::new(&*host, &*self.buffer, self.variables, self.tick, id);
                            trigger.can_fire(&ctx)
                        });
                    if fire {
                        self.execute_gate(child, layout.slots, started, host)
                    } else {
                        Status::InProgress
                    }
                }
                None => Status::Finished,
            },
            NodeKind::Action(action) => {
                let mut ctx = NodeCtx::new(
                    host,
                    &mut *self.buffer,
                    layout.slots,
                    self.variables,
                    self.tick,
                    id,
                );
                action.execute(&mut ctx)
            }
        };

        self.emit(id, TraceKind::Executed(status));
        status
    }

    fn execute_sequence(
        &mut self,
        children: &[NodeId],
        slots: SlotRange,
        never_fail: bool,
        host: &mut C,
    ) -> Status {
        if let Some(outcome) = *self.data(slots).get(sequence::OUTCOME) {
            return outcome;
        }
        let index = *self.data(slots).get(sequence::ACTIVE);
        let Some(&child) = children.get(index) else {
            self.data(slots).set(sequence::OUTCOME, Some(Status::Finished));
            return Status::Finished;
        };

        match self.execute(child, host) {
            Status::InProgress => Status::InProgress,
            Status::Finished => {
                self.deinitialize(child, host);
                let next = index + 1;
                self.data(slots).set(sequence::ACTIVE, next);
                match children.get(next) {
                    Some(&next_child) => {
                        self.initialize(next_child, host);
                        Status::InProgress
                    }
                    None => {
                        self.data(slots).set(sequence::OUTCOME, Some(Status::Finished));
                        Status::Finished
                    }
                }
            }
            Status::Failed => {
                self.deinitialize(child, host);
                let outcome = if never_fail {
                    Status::Finished
                } else {
                    Status::Failed
                };
                self.data(slots).set(sequence::OUTCOME, Some(outcome));
                outcome
            }
        }
    }

    fn execute_selector(
        &mut self,
        id: NodeId,
        children: &[NodeId],
        slots: SlotRange,
        selection: Option<usize>,
        host: &mut C,
    ) -> Status {
        let Some((index, child)) =
            selection.and_then(|index| children.get(index).map(|child| (index, *child)))
        else {
            return Status::Finished;
        };

        let previous = *self.data(slots).get(selector::ACTIVE);
        if previous != Some(index) {
            if let Some(old) = previous.and_then(|old| children.get(old)) {
                self.deinitialize(*old, host);
            }
            self.data(slots).set(selector::ACTIVE, Some(index));
            trace!(selector = %id, ?previous, index, "selector switched child");
            self.emit(id, TraceKind::Selected(index));
            self.initialize(child, host);
        }

        let status = self.execute(child, host);
        if status.is_terminal() {
            self.deinitialize(child, host);
            self.data(slots).set(selector::ACTIVE, None);
        }
        status
    }

    fn execute_parallel(&mut self, children: &[NodeId], slots: SlotRange, host: &mut C) -> Status {
        for (i, &child) in children.iter().enumerate() {
            if self.data(slots).get(parallel::DONE)[i] {
                continue;
            }
            match self.execute(child, host) {
                Status::InProgress => {}
                Status::Finished => {
                    self.data(slots).get_mut(parallel::DONE)[i] = true;
                    self.deinitialize(child, host);
                }
                Status::Failed => return Status::Failed,
            }
        }

        if self.data(slots).get(parallel::DONE).iter().all(|done| *done) {
            Status::Finished
        } else {
            Status::InProgress
        }
    }

    fn execute_repeater(&mut self, child: NodeId, break_on_failure: bool, host: &mut C) -> Status {
        match self.execute(child, host) {
            Status::InProgress => Status::InProgress,
            Status::Failed if break_on_failure => {
                self.deinitialize(child, host);
                Status::Failed
            }
            Status::Finished | Status::Failed => {
                self.deinitialize(child, host);
                self.initialize(child, host);
                Status::InProgress
            }
        }
    }

    fn execute_gate(
        &mut self,
        child: NodeId,
        slots: SlotRange,
        started: bool,
        host: &mut C,
    ) -> Status {
        if !started {
            self.data(slots).set(gate::STARTED, true);
            self.initialize(child, host);
        }
        let status = self.execute(child, host);
        if status.is_terminal() {
            self.deinitialize(child, host);
            self.data(slots).set(gate::STARTED, false);
        }
        status
    }
}
