use arbor_core::{NodeData, NodeId, RuntimeBuffer, Status, TickContext};
use arbor_tools::{TraceEvent, TraceKind, TraceSink};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{read_variable, write_variable};
use crate::exec::{lay_out, Exec, NodeLayout};
use crate::{RunnerError, Tree, VarValue, VariableTable};

/// What a runner does once the root reports a terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Completion {
    /// Stop and keep reporting the final status until restarted.
    #[default]
    Halt,
    /// Start over on the same tick, like a looping agent brain.
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RunnerConfig {
    pub on_completion: Completion,
    pub think_every_ticks: u32,
    pub think_offset_ticks: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            on_completion: Completion::Halt,
            think_every_ticks: 1,
            think_offset_ticks: 0,
        }
    }
}

impl RunnerConfig {
    /// Ticks the tree every `every` frames, offset by `instance` so that a crowd of instances
    /// does not think on the same frame.
    pub fn staggered(instance: u64, every: u32) -> Self {
        let every = every.max(1);
        Self {
            think_every_ticks: every,
            think_offset_ticks: (instance % every as u64) as u32,
            ..Self::default()
        }
    }

    pub fn with_completion(mut self, on_completion: Completion) -> Self {
        self.on_completion = on_completion;
        self
    }

    pub fn should_think(&self, frame: u64) -> bool {
        let every = self.think_every_ticks.max(1) as u64;
        (frame + self.think_offset_ticks as u64) % every == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Buffer laid out; no node initialized.
    LaidOut,
    Active,
    /// The root finished under [`Completion::Halt`].
    Completed(Status),
}

/// One running instance of a shared [`Tree`].
///
/// Owns the instance's [`RuntimeBuffer`], laid out once at construction, and drives the root
/// through initialize, execute and deinitialize. The tree is borrowed for the runner's whole
/// life.
pub struct Runner<'t, C> {
    tree: &'t Tree<C>,
    buffer: RuntimeBuffer,
    layouts: Vec<Option<NodeLayout>>,
    variables: VariableTable,
    config: RunnerConfig,
    state: RunnerState,
    frame: u64,
    pending_dt: f32,
    last: Option<Status>,
    trace: Option<Box<dyn TraceSink>>,
}

impl<'t, C> Runner<'t, C> {
    pub fn new(tree: &'t Tree<C>) -> Self {
        Self::with_config(tree, RunnerConfig::default())
    }

    pub fn with_config(tree: &'t Tree<C>, config: RunnerConfig) -> Self {
        let mut buffer = RuntimeBuffer::new();
        let layouts = lay_out(tree, &mut buffer);
        let variables = VariableTable::register(&mut buffer, tree.variables());
        buffer.seal();
        debug!(
            buffer = %buffer.id(),
            slots = buffer.len(),
            variables = variables.len(),
            "runner laid out"
        );

        Self {
            tree,
            buffer,
            layouts,
            variables,
            config,
            state: RunnerState::LaidOut,
            frame: 0,
            pending_dt: 0.0,
            last: None,
            trace: None,
        }
    }

    pub fn tree(&self) -> &'t Tree<C> {
        self.tree
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Frames seen by [`execute`](Self::execute), skipped ones included.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn last_status(&self) -> Option<Status> {
        self.last
    }

    pub fn buffer(&self) -> &RuntimeBuffer {
        &self.buffer
    }

    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.trace = Some(Box::new(sink));
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    fn exec(&mut self, tick: TickContext) -> Exec<'_, 't, C> {
        Exec {
            tree: self.tree,
            buffer: &mut self.buffer,
            layouts: &self.layouts,
            variables: &self.variables,
            tick,
            trace: &mut self.trace,
        }
    }

    fn idle_tick(&self) -> TickContext {
        TickContext::new(self.frame, 0.0)
    }

    /// Initializes the root. Does nothing while already active; a completed runner starts
    /// over.
    pub fn initialize(&mut self, host: &mut C) {
        if self.state == RunnerState::Active {
            return;
        }
        let root = self.tree.root();
        let tick = self.idle_tick();
        self.exec(tick).initialize(root, host);
        self.state = RunnerState::Active;
        self.last = None;
        debug!(buffer = %self.buffer.id(), frame = self.frame, "runner initialized");
    }

    /// Tears down every initialized node. Safe at any time, also mid-progress, and idempotent.
    pub fn deinitialize(&mut self, host: &mut C) {
        let root = self.tree.root();
        let tick = self.idle_tick();
        self.exec(tick).deinitialize(root, host);
        if self.state != RunnerState::LaidOut {
            debug!(buffer = %self.buffer.id(), frame = self.frame, "runner deinitialized");
        }
        self.state = RunnerState::LaidOut;
    }

    pub fn restart(&mut self, host: &mut C) {
        self.deinitialize(host);
        self.initialize(host);
    }

    /// Advances one frame of `dt_seconds`.
    ///
    /// Frames skipped by decimation return the last status without touching any node; their
    /// time is handed to the next tick that runs. A laid-out runner initializes first.
    pub fn execute(&mut self, host: &mut C, dt_seconds: f32) -> Status {
        let frame = self.frame;
        self.frame += 1;

        if let RunnerState::Completed(status) = self.state {
            return status;
        }
        self.pending_dt += dt_seconds;
        if !self.config.should_think(frame) {
            return self.last.unwrap_or(Status::InProgress);
        }

        if self.state == RunnerState::LaidOut {
            self.initialize(host);
        }
        let tick = TickContext::new(frame, std::mem::take(&mut self.pending_dt));
        let root = self.tree.root();
        let status = self.exec(tick).execute(root, host);
        self.last = Some(status);

        if status.is_terminal() {
            self.exec(tick).deinitialize(root, host);
            if let Some(sink) = self.trace.as_mut() {
                sink.emit(TraceEvent::new(frame, root, TraceKind::Completed(status)));
            }
            match self.config.on_completion {
                Completion::Halt => self.state = RunnerState::Completed(status),
                Completion::Restart => self.exec(tick).initialize(root, host),
            }
            debug!(
                buffer = %self.buffer.id(),
                frame,
                ?status,
                policy = ?self.config.on_completion,
                "tree completed"
            );
        }
        status
    }

    /// Whether `node` is currently initialized in this instance.
    pub fn is_active(&self, node: NodeId) -> bool {
        self.layouts
            .get(node.index())
            .copied()
            .flatten()
            .is_some_and(|layout| self.buffer[layout.active])
    }

    /// The slots `node` registered during layout.
    pub fn node_data(&self, node: NodeId) -> Option<NodeData<'_>> {
        let layout = self.layouts.get(node.index()).copied().flatten()?;
        Some(NodeData::new(&self.buffer, layout.slots))
    }

    pub fn variable(&self, name: &str) -> Option<VarValue> {
        read_variable(&self.buffer, &self.variables, name)
    }

    /// Overrides a tree variable for this instance only. Returns the previous value.
    pub fn set_variable(
        &mut self,
        name: &str,
        value: impl Into<VarValue>,
    ) -> Result<VarValue, RunnerError> {
        write_variable(&mut self.buffer, &self.variables, name, value.into())
    }
}

impl<C> std::fmt::Debug for Runner<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("buffer", &self.buffer.id())
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("last", &self.last)
            .field("config", &self.config)
            .finish()
    }
}
