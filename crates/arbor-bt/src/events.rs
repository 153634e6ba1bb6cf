use arbor_core::NodeId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Structural change published by a [`Tree`](crate::Tree).
///
/// Node events are only queued for edits below the root; building a detached subtree is silent
/// until it is added.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TreeEvent {
    NodeAdded {
        parent: NodeId,
        index: usize,
        node: NodeId,
    },
    NodeRemoved {
        parent: NodeId,
        node: NodeId,
    },
    NodeChanged {
        node: NodeId,
    },
    VariableAdded {
        name: String,
    },
    VariableRemoved {
        name: String,
    },
    VariableChanged {
        name: String,
    },
    VariableRenamed {
        from: String,
        to: String,
    },
}

impl TreeEvent {
    pub fn dispatch<L: TreeListener + ?Sized>(&self, listener: &mut L) {
        match self {
            TreeEvent::NodeAdded {
                parent,
                index,
                node,
            } => listener.on_node_added(*parent, *index, *node),
            TreeEvent::NodeRemoved { parent, node } => listener.on_node_removed(*parent, *node),
            TreeEvent::NodeChanged { node } => listener.on_node_changed(*node),
            TreeEvent::VariableAdded { name } => listener.on_variable_added(name),
            TreeEvent::VariableRemoved { name } => listener.on_variable_removed(name),
            TreeEvent::VariableChanged { name } => listener.on_variable_changed(name),
            TreeEvent::VariableRenamed { from, to } => listener.on_variable_renamed(from, to),
        }
    }
}

/// Editing-tool side of the event queue. The runtime never listens.
pub trait TreeListener {
    fn on_node_added(&mut self, parent: NodeId, index: usize, node: NodeId);
    fn on_node_removed(&mut self, parent: NodeId, node: NodeId);
    fn on_node_changed(&mut self, node: NodeId);

    fn on_variable_added(&mut self, _name: &str) {}
    fn on_variable_removed(&mut self, _name: &str) {}
    fn on_variable_changed(&mut self, _name: &str) {}
    fn on_variable_renamed(&mut self, _from: &str, _to: &str) {}
}

/// Listener that keeps everything it hears.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventLog {
    pub events: Vec<TreeEvent>,
}

impl TreeListener for EventLog {
    fn on_node_added(&mut self, parent: NodeId, index: usize, node: NodeId) {
        self.events.push(TreeEvent::NodeAdded {
            parent,
            index,
            node,
        });
    }

    fn on_node_removed(&mut self, parent: NodeId, node: NodeId) {
        self.events.push(TreeEvent::NodeRemoved { parent, node });
    }

    fn on_node_changed(&mut self, node: NodeId) {
        self.events.push(TreeEvent::NodeChanged { node });
    }

    fn on_variable_added(&mut self, name: &str) {
        self.events.push(TreeEvent::VariableAdded {
            name: name.to_owned(),
        });
    }

    fn on_variable_removed(&mut self, name: &str) {
        self.events.push(TreeEvent::VariableRemoved {
            name: name.to_owned(),
        });
    }

    fn on_variable_changed(&mut self, name: &str) {
        self.events.push(TreeEvent::VariableChanged {
            name: name.to_owned(),
        });
    }

    fn on_variable_renamed(&mut self, from: &str, to: &str) {
        self.events.push(TreeEvent::VariableRenamed {
            from: from.to_owned(),
            to: to.to_owned(),
        });
    }
}
