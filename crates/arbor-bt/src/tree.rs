use std::collections::VecDeque;
use std::fmt;

use arbor_core::NodeId;
use tracing::trace;

use crate::node::Links;
use crate::{
    Action, Condition, Node, NodeKind, Result, TreeError, TreeEvent, TreeListener, Trigger,
    VarValue, VariableDef,
};

struct Entry<C> {
    generation: u32,
    node: Option<Node<C>>,
}

/// Shared behavior tree definition.
///
/// Nodes live in an arena and are addressed by generational [`NodeId`]s. The root is a sequence
/// named `"Root"` that is always attached; a node is attached exactly while it is reachable from
/// the root. Every edit below the root is queued as a [`TreeEvent`] for editing tools to drain.
///
/// Runners borrow the tree immutably, so the tree cannot be edited while any runner is alive.
pub struct Tree<C> {
    entries: Vec<Entry<C>>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
    variables: Vec<VariableDef>,
    events: VecDeque<TreeEvent>,
    revision: u64,
}

impl<C> Tree<C> {
    pub const ROOT_NAME: &'static str = "Root";

    pub fn new() -> Self {
        let mut root = Node::new(Self::ROOT_NAME.to_owned(), NodeKind::sequence());
        root.attached = true;
        Self {
            entries: vec![Entry {
                generation: 0,
                node: Some(root),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            live: 1,
            variables: Vec::new(),
            events: VecDeque::new(),
            revision: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Incremented by every successful edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Creates a detached, parentless node.
    pub fn create(&mut self, name: impl Into<String>, kind: NodeKind<C>) -> NodeId {
        let node = Node::new(name.into(), kind);
        self.live += 1;
        self.revision += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            NodeId::new(index, entry.generation)
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node<C>> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.node.as_ref())
            .ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<C>> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.node.as_mut())
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Lookup for nodes the runner laid out; those cannot disappear while it borrows the tree.
    pub(crate) fn expect_node(&self, id: NodeId) -> &Node<C> {
        match self.node(id) {
            Ok(node) => node,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn is_attached(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.attached)
    }

    /// First attached node named `name`, in pre-order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.walk()
            .find(|id| self.node(*id).is_ok_and(|node| node.name == name))
    }

    /// Attached nodes, depth-first pre-order from the root.
    pub fn walk(&self) -> Walk<'_, C> {
        self.walk_from(self.root)
    }

    /// `id` and its descendants, depth-first pre-order.
    pub fn walk_from(&self, id: NodeId) -> Walk<'_, C> {
        Walk {
            tree: self,
            stack: vec![id],
        }
    }

    /// Appends `node` to the composite `parent` and returns its index.
    pub fn add(&mut self, parent: NodeId, node: NodeId) -> Result<usize> {
        self.insert(parent, usize::MAX, node)
    }

    /// Inserts `node` into the composite `parent`; `index` is clamped to the child count.
    ///
    /// Adding a node that is already a child of `parent` leaves the tree unchanged and returns
    /// its current index.
    pub fn insert(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<usize> {
        let target = self.node(parent)?;
        let Links::Children(children) = &target.links else {
            return Err(TreeError::NotComposite(parent));
        };
        if let Some(existing) = children.iter().position(|child| *child == node) {
            return Ok(existing);
        }
        let index = index.min(children.len());
        let attached = target.attached;
        self.check_adoptable(parent, node)?;

        if let Links::Children(children) = &mut self.node_mut(parent)?.links {
            children.insert(index, node);
        }
        self.adopt(parent, index, node, attached);
        Ok(index)
    }

    /// Detaches `node` from the composite `parent`. The subtree stays alive and is returned for
    /// reuse or [`destroy`](Self::destroy).
    pub fn remove(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId> {
        let target = self.node_mut(parent)?;
        let attached = target.attached;
        let Links::Children(children) = &mut target.links else {
            return Err(TreeError::NotComposite(parent));
        };
        let position = children
            .iter()
            .position(|child| *child == node)
            .ok_or(TreeError::NotAChild { parent, node })?;
        children.remove(position);
        self.release(parent, node, attached);
        Ok(node)
    }

    /// Detaches every child of the composite `parent`, returned in their former order.
    pub fn clear(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        let target = self.node_mut(parent)?;
        let attached = target.attached;
        let Links::Children(children) = &mut target.links else {
            return Err(TreeError::NotComposite(parent));
        };
        let removed = std::mem::take(children);
        for &node in &removed {
            self.release(parent, node, attached);
        }
        Ok(removed)
    }

    /// Replaces the child of `decorator` and returns the previous one, detached but alive.
    pub fn set_decorated(
        &mut self,
        decorator: NodeId,
        child: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        let target = self.node(decorator)?;
        let Links::Child(current) = target.links else {
            return Err(TreeError::NotDecorator(decorator));
        };
        if current == child {
            return Ok(None);
        }
        let attached = target.attached;
        if let Some(new) = child {
            self.check_adoptable(decorator, new)?;
        }

        if let Links::Child(slot) = &mut self.node_mut(decorator)?.links {
            *slot = child;
        }
        if let Some(old) = current {
            self.release(decorator, old, attached);
        }
        if let Some(new) = child {
            self.adopt(decorator, 0, new, attached);
        }
        Ok(current)
    }

    /// Frees a detached, parentless node and its whole subtree. Their ids become stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.parent.is_some() || node.attached {
            return Err(TreeError::StillLinked(id));
        }
        let doomed: Vec<NodeId> = self.walk_from(id).collect();
        for victim in &doomed {
            let entry = &mut self.entries[victim.index()];
            entry.node = None;
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(victim.index() as u32);
        }
        self.live -= doomed.len();
        self.revision += 1;
        trace!(node = %id, freed = doomed.len(), "subtree destroyed");
        Ok(())
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let node = self.node_mut(id)?;
        node.name = name.into();
        let attached = node.attached;
        self.changed(id, attached);
        Ok(())
    }

    pub fn set_never_fail(&mut self, id: NodeId, value: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        let NodeKind::Sequence { never_fail } = &mut node.kind else {
            return Err(TreeError::NotSequence(id));
        };
        *never_fail = value;
        let attached = node.attached;
        self.changed(id, attached);
        Ok(())
    }

    pub fn set_break_on_failure(&mut self, id: NodeId, value: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        let NodeKind::Repeater { break_on_failure } = &mut node.kind else {
            return Err(TreeError::NotRepeater(id));
        };
        *break_on_failure = value;
        let attached = node.attached;
        self.changed(id, attached);
        Ok(())
    }

    /// Replaces the condition of a selector, returning the previous one.
    pub fn set_condition(
        &mut self,
        id: NodeId,
        condition: Option<Box<dyn Condition<C>>>,
    ) -> Result<Option<Box<dyn Condition<C>>>> {
        let node = self.node_mut(id)?;
        let NodeKind::Selector { condition: slot } = &mut node.kind else {
            return Err(TreeError::NotSelector(id));
        };
        let previous = std::mem::replace(slot, condition);
        let attached = node.attached;
        self.changed(id, attached);
        Ok(previous)
    }

    /// Replaces the trigger of a gate, returning the previous one.
    pub fn set_trigger(
        &mut self,
        id: NodeId,
        trigger: Option<Box<dyn Trigger<C>>>,
    ) -> Result<Option<Box<dyn Trigger<C>>>> {
        let node = self.node_mut(id)?;
        let NodeKind::Gate { trigger: slot } = &mut node.kind else {
            return Err(TreeError::NotGate(id));
        };
        let previous = std::mem::replace(slot, trigger);
        let attached = node.attached;
        self.changed(id, attached);
        Ok(previous)
    }

    pub fn set_action(
        &mut self,
        id: NodeId,
        action: Box<dyn Action<C>>,
    ) -> Result<Box<dyn Action<C>>> {
        let node = self.node_mut(id)?;
        let NodeKind::Action(slot) = &mut node.kind else {
            return Err(TreeError::NotAction(id));
        };
        let previous = std::mem::replace(slot, action);
        let attached = node.attached;
        self.changed(id, attached);
        Ok(previous)
    }

    /// Edits a node's kind in place and publishes the change.
    ///
    /// # Panics
    /// If `edit` turns the node into another category (composite, decorator, leaf); use
    /// [`create`](Self::create) for that.
    pub fn modify<R>(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut NodeKind<C>) -> R,
    ) -> Result<R> {
        let node = self.node_mut(id)?;
        let category = node.kind.category();
        let out = edit(&mut node.kind);
        assert_eq!(
            node.kind.category(),
            category,
            "modify cannot change the category of node {id}"
        );
        let attached = node.attached;
        self.changed(id, attached);
        Ok(out)
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDef> {
        self.variables.iter().find(|def| def.name == name)
    }

    fn variable_position(&self, name: &str) -> Result<usize> {
        self.variables
            .iter()
            .position(|def| def.name == name)
            .ok_or_else(|| TreeError::UnknownVariable(name.to_owned()))
    }

    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        default: impl Into<VarValue>,
    ) -> Result<()> {
        let name = name.into();
        if self.variable(&name).is_some() {
            return Err(TreeError::DuplicateVariable(name));
        }
        self.variables.push(VariableDef {
            name: name.clone(),
            default: default.into(),
        });
        self.revision += 1;
        trace!(variable = %name, "variable added");
        self.events.push_back(TreeEvent::VariableAdded { name });
        Ok(())
    }

    /// Removes a variable and returns its default.
    pub fn remove_variable(&mut self, name: &str) -> Result<VarValue> {
        let position = self.variable_position(name)?;
        let def = self.variables.remove(position);
        self.revision += 1;
        self.events.push_back(TreeEvent::VariableRemoved { name: def.name });
        Ok(def.default)
    }

    /// Changes the value new runners seed the variable with; returns the previous default.
    pub fn set_variable_default(
        &mut self,
        name: &str,
        value: impl Into<VarValue>,
    ) -> Result<VarValue> {
        let position = self.variable_position(name)?;
        let previous = std::mem::replace(&mut self.variables[position].default, value.into());
        self.revision += 1;
        self.events.push_back(TreeEvent::VariableChanged {
            name: name.to_owned(),
        });
        Ok(previous)
    }

    pub fn rename_variable(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        let position = self.variable_position(from)?;
        if from == to {
            return Ok(());
        }
        if self.variable(&to).is_some() {
            return Err(TreeError::DuplicateVariable(to));
        }
        self.variables[position].name = to.clone();
        self.revision += 1;
        self.events.push_back(TreeEvent::VariableRenamed {
            from: from.to_owned(),
            to,
        });
        Ok(())
    }

    /// Replays the current structure as `NodeAdded` for every edge (pre-order) followed by
    /// `VariableAdded` for every variable. Does not touch the event queue.
    pub fn pull_structure<L: TreeListener + ?Sized>(&self, listener: &mut L) {
        for parent in self.walk() {
            let Ok(node) = self.node(parent) else {
                continue;
            };
            for (index, &child) in node.children().iter().enumerate() {
                listener.on_node_added(parent, index, child);
            }
        }
        for def in &self.variables {
            listener.on_variable_added(&def.name);
        }
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Removes and returns queued events, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = TreeEvent> + '_ {
        self.events.drain(..)
    }

    /// Delivers every queued event to `listener`, returning how many were delivered.
    pub fn publish<L: TreeListener + ?Sized>(&mut self, listener: &mut L) -> usize {
        let mut delivered = 0;
        for event in self.events.drain(..) {
            event.dispatch(listener);
            delivered += 1;
        }
        delivered
    }

    fn check_adoptable(&self, parent: NodeId, node: NodeId) -> Result<()> {
        let child = self.node(node)?;
        if let Some(existing) = child.parent {
            return Err(TreeError::AlreadyParented {
                node,
                parent: existing,
            });
        }
        if child.attached {
            return Err(TreeError::AlreadyAttached(node));
        }
        if self.is_self_or_ancestor(node, parent) {
            return Err(TreeError::WouldCycle { parent, node });
        }
        Ok(())
    }

    fn is_self_or_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.node(id).ok().and_then(Node::parent);
        }
        false
    }

    fn adopt(&mut self, parent: NodeId, index: usize, node: NodeId, parent_attached: bool) {
        if let Ok(child) = self.node_mut(node) {
            child.parent = Some(parent);
        }
        if parent_attached {
            self.set_attached(node, true);
            self.events
                .push_back(TreeEvent::NodeAdded { parent, index, node });
        }
        self.revision += 1;
        trace!(%parent, %node, index, "node added");
    }

    fn release(&mut self, parent: NodeId, node: NodeId, parent_attached: bool) {
        if let Ok(child) = self.node_mut(node) {
            child.parent = None;
        }
        if parent_attached {
            self.set_attached(node, false);
            self.events
                .push_back(TreeEvent::NodeRemoved { parent, node });
        }
        self.revision += 1;
        trace!(%parent, %node, "node removed");
    }

    fn set_attached(&mut self, id: NodeId, attached: bool) {
        let subtree: Vec<NodeId> = self.walk_from(id).collect();
        for member in subtree {
            if let Ok(node) = self.node_mut(member) {
                assert_ne!(
                    node.attached, attached,
                    "node {member} attachment set twice"
                );
                node.attached = attached;
            }
        }
    }

    fn changed(&mut self, id: NodeId, attached: bool) {
        self.revision += 1;
        if attached {
            self.events.push_back(TreeEvent::NodeChanged { node: id });
        }
    }
}

impl<C> Default for Tree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Tree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("len", &self.live)
            .field("variables", &self.variables)
            .field("revision", &self.revision)
            .finish()
    }
}

/// Depth-first pre-order traversal of node ids.
pub struct Walk<'a, C> {
    tree: &'a Tree<C>,
    stack: Vec<NodeId>,
}

impl<C> Iterator for Walk<'_, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Ok(node) = self.tree.node(id) {
            self.stack.extend(node.children().iter().rev().copied());
        }
        Some(id)
    }
}
