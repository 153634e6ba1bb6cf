use std::fmt;

use arbor_core::{Layout, NodeId, Status};

use crate::{EvalCtx, NodeCtx};

/// User leaf behaviour.
///
/// One boxed action is shared by every runner of a tree, so it must not keep per-instance state
/// in `self`. Anything that has to survive between ticks is registered in
/// [`create_layout`](Action::create_layout) and read back through [`NodeCtx`].
pub trait Action<C>: Send + Sync {
    fn create_layout(&self, _layout: &mut Layout<'_>) {}

    fn initialize(&self, _ctx: &mut NodeCtx<'_, C>) {}

    fn execute(&self, ctx: &mut NodeCtx<'_, C>) -> Status;

    /// Called once per initialize, also when the action is interrupted mid-progress.
    fn deinitialize(&self, _ctx: &mut NodeCtx<'_, C>) {}
}

/// Child selection of a [`NodeKind::Selector`]. `None` selects nothing.
pub trait Condition<C>: Send + Sync {
    fn evaluate(&self, ctx: &EvalCtx<'_, C>) -> Option<usize>;
}

/// Permission for a [`NodeKind::Gate`] to start its child.
pub trait Trigger<C>: Send + Sync {
    fn can_fire(&self, ctx: &EvalCtx<'_, C>) -> bool;
}

/// Composite, decorator or leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Composite,
    Decorator,
    Leaf,
}

pub enum NodeKind<C> {
    /// Runs children one after another.
    Sequence { never_fail: bool },
    /// Runs the child picked by its condition.
    Selector {
        condition: Option<Box<dyn Condition<C>>>,
    },
    /// Runs every unfinished child each tick.
    Parallel,
    /// Restarts its child whenever it stops.
    Repeater { break_on_failure: bool },
    /// Holds its child back until the trigger fires.
    Gate {
        trigger: Option<Box<dyn Trigger<C>>>,
    },
    Action(Box<dyn Action<C>>),
}

impl<C> NodeKind<C> {
    pub fn sequence() -> Self {
        NodeKind::Sequence { never_fail: false }
    }

    pub fn never_fail_sequence() -> Self {
        NodeKind::Sequence { never_fail: true }
    }

    pub fn selector(condition: impl Condition<C> + 'static) -> Self {
        NodeKind::Selector {
            condition: Some(Box::new(condition)),
        }
    }

    pub fn parallel() -> Self {
        NodeKind::Parallel
    }

    pub fn repeater(break_on_failure: bool) -> Self {
        NodeKind::Repeater { break_on_failure }
    }

    pub fn gate(trigger: impl Trigger<C> + 'static) -> Self {
        NodeKind::Gate {
            trigger: Some(Box::new(trigger)),
        }
    }

    pub fn action(action: impl Action<C> + 'static) -> Self {
        NodeKind::Action(Box::new(action))
    }

    pub fn category(&self) -> Category {
        match self {
            NodeKind::Sequence { .. } | NodeKind::Selector { .. } | NodeKind::Parallel => {
                Category::Composite
            }
            NodeKind::Repeater { .. } | NodeKind::Gate { .. } => Category::Decorator,
            NodeKind::Action(_) => Category::Leaf,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Sequence { .. } => "sequence",
            NodeKind::Selector { .. } => "selector",
            NodeKind::Parallel => "parallel",
            NodeKind::Repeater { .. } => "repeater",
            NodeKind::Gate { .. } => "gate",
            NodeKind::Action(_) => "action",
        }
    }
}

impl<C> fmt::Debug for NodeKind<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Sequence { never_fail } => f
                .debug_struct("Sequence")
                .field("never_fail", never_fail)
                .finish(),
            NodeKind::Selector { condition } => f
                .debug_struct("Selector")
                .field("condition", &condition.is_some())
                .finish(),
            NodeKind::Parallel => f.write_str("Parallel"),
            NodeKind::Repeater { break_on_failure } => f
                .debug_struct("Repeater")
                .field("break_on_failure", break_on_failure)
                .finish(),
            NodeKind::Gate { trigger } => f
                .debug_struct("Gate")
                .field("trigger", &trigger.is_some())
                .finish(),
            NodeKind::Action(_) => f.write_str("Action"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Links {
    Leaf,
    Children(Vec<NodeId>),
    Child(Option<NodeId>),
}

impl Links {
    fn for_category(category: Category) -> Self {
        match category {
            Category::Composite => Links::Children(Vec::new()),
            Category::Decorator => Links::Child(None),
            Category::Leaf => Links::Leaf,
        }
    }

    pub(crate) fn as_slice(&self) -> &[NodeId] {
        match self {
            Links::Leaf => &[],
            Links::Children(children) => children,
            Links::Child(child) => child.as_slice(),
        }
    }
}

/// One node of a [`Tree`](crate::Tree). Only the tree hands out nodes, so the parent link and
/// attachment flag are always consistent with the structure.
pub struct Node<C> {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) attached: bool,
    pub(crate) kind: NodeKind<C>,
    pub(crate) links: Links,
}

impl<C> Node<C> {
    pub(crate) fn new(name: String, kind: NodeKind<C>) -> Self {
        Self {
            name,
            parent: None,
            attached: false,
            links: Links::for_category(kind.category()),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn kind(&self) -> &NodeKind<C> {
        &self.kind
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Children of a composite, the decorated child of a decorator, nothing for a leaf.
    pub fn children(&self) -> &[NodeId] {
        self.links.as_slice()
    }

    pub fn child(&self) -> Option<NodeId> {
        match self.links {
            Links::Child(child) => child,
            _ => None,
        }
    }
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("attached", &self.attached)
            .field("kind", &self.kind)
            .field("children", &self.children())
            .finish()
    }
}
