#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};

use arbor_bt::{Action, Condition, EvalCtx, NodeCtx, NodeId, NodeKind, Tree, Trigger};
use arbor_core::{Layout, Local, Status};

/// Host that records every lifecycle call and feeds scripted inputs by frame.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub log: Vec<String>,
    pub scripts: BTreeMap<&'static str, VecDeque<Status>>,
    /// Selector input per frame; frames past the end select nothing.
    pub selections: Vec<Option<usize>>,
    /// Gate input per frame.
    pub armed: Vec<bool>,
    pub dts: Vec<f32>,
}

impl RecordingHost {
    pub fn script(&mut self, name: &'static str, statuses: impl IntoIterator<Item = Status>) {
        self.scripts.insert(name, statuses.into_iter().collect());
    }

    pub fn take_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }
}

/// Logs `init`, `exec` and `deinit`, and plays back the host's script for its name. Finishes
/// once the script runs out.
#[derive(Debug)]
pub struct Scripted(pub &'static str);

impl Action<RecordingHost> for Scripted {
    fn initialize(&self, ctx: &mut NodeCtx<'_, RecordingHost>) {
        ctx.host_mut().log.push(format!("init {}", self.0));
    }

    fn execute(&self, ctx: &mut NodeCtx<'_, RecordingHost>) -> Status {
        let host = ctx.host_mut();
        host.log.push(format!("exec {}", self.0));
        host.scripts
            .get_mut(self.0)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Status::Finished)
    }

    fn deinitialize(&self, ctx: &mut NodeCtx<'_, RecordingHost>) {
        ctx.host_mut().log.push(format!("deinit {}", self.0));
    }
}

/// Runs for `ticks` executions, keeping its progress in the runner's buffer.
#[derive(Debug)]
pub struct Countdown {
    pub ticks: u32,
}

impl Countdown {
    pub const REMAINING: Local<u32> = Local::new(0);
}

impl<C> Action<C> for Countdown {
    fn create_layout(&self, layout: &mut Layout<'_>) {
        layout.register(Self::REMAINING, 0);
    }

    fn initialize(&self, ctx: &mut NodeCtx<'_, C>) {
        ctx.set(Self::REMAINING, self.ticks);
    }

    fn execute(&self, ctx: &mut NodeCtx<'_, C>) -> Status {
        let remaining = ctx.get_mut(Self::REMAINING);
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            Status::Finished
        } else {
            Status::InProgress
        }
    }
}

/// Records the simulated time of every tick it runs.
#[derive(Debug)]
pub struct RecordDt;

impl Action<RecordingHost> for RecordDt {
    fn execute(&self, ctx: &mut NodeCtx<'_, RecordingHost>) -> Status {
        let dt = ctx.dt_seconds();
        ctx.host_mut().dts.push(dt);
        Status::InProgress
    }
}

/// Selects `host.selections[frame]`.
#[derive(Debug)]
pub struct ByFrame;

impl Condition<RecordingHost> for ByFrame {
    fn evaluate(&self, ctx: &EvalCtx<'_, RecordingHost>) -> Option<usize> {
        ctx.host()
            .selections
            .get(ctx.tick().tick as usize)
            .copied()
            .flatten()
    }
}

/// Fires when `host.armed[frame]` is set.
#[derive(Debug)]
pub struct ArmedAt;

impl Trigger<RecordingHost> for ArmedAt {
    fn can_fire(&self, ctx: &EvalCtx<'_, RecordingHost>) -> bool {
        ctx.host()
            .armed
            .get(ctx.tick().tick as usize)
            .copied()
            .unwrap_or(false)
    }
}

pub fn scripted(tree: &mut Tree<RecordingHost>, name: &'static str) -> NodeId {
    tree.create(name, NodeKind::action(Scripted(name)))
}

/// Creates `kind` and appends it to `parent`.
pub fn add(
    tree: &mut Tree<RecordingHost>,
    parent: NodeId,
    name: &str,
    kind: NodeKind<RecordingHost>,
) -> NodeId {
    let id = tree.create(name, kind);
    tree.add(parent, id).expect("add node");
    id
}

pub fn add_scripted(tree: &mut Tree<RecordingHost>, parent: NodeId, name: &'static str) -> NodeId {
    let id = scripted(tree, name);
    tree.add(parent, id).expect("add leaf");
    id
}
