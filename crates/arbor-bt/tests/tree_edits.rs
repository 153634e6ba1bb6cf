mod common;

use arbor_bt::{
    EventLog, NodeKind, Tree, TreeError, TreeEvent, VarValue, VariableSwitch,
};
use common::{scripted, RecordingHost};

fn events(tree: &mut Tree<RecordingHost>) -> Vec<TreeEvent> {
    tree.drain_events().collect()
}

#[test]
fn new_tree_has_attached_root_sequence() {
    let tree: Tree<RecordingHost> = Tree::new();
    let root = tree.node(tree.root()).expect("root");

    assert_eq!(root.name(), "Root");
    assert!(root.is_attached());
    assert!(matches!(root.kind(), NodeKind::Sequence { never_fail: false }));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.pending_events(), 0);
}

#[test]
fn detached_subtrees_build_silently_and_attach_as_a_whole() {
    let mut tree = Tree::new();
    let root = tree.root();
    let seq = tree.create("seq", NodeKind::sequence());
    let a = scripted(&mut tree, "a");

    tree.add(seq, a).expect("add to detached parent");
    assert!(events(&mut tree).is_empty());
    assert!(!tree.is_attached(a).expect("a"));

    assert_eq!(tree.add(root, seq), Ok(0));
    assert_eq!(
        events(&mut tree),
        [TreeEvent::NodeAdded {
            parent: root,
            index: 0,
            node: seq
        }]
    );
    assert!(tree.is_attached(seq).expect("seq"));
    assert!(tree.is_attached(a).expect("a"));
    assert_eq!(tree.walk().collect::<Vec<_>>(), [root, seq, a]);
}

#[test]
fn insert_clamps_index_and_duplicate_add_is_ignored() {
    let mut tree = Tree::new();
    let root = tree.root();
    let a = scripted(&mut tree, "a");
    let b = scripted(&mut tree, "b");
    let c = scripted(&mut tree, "c");

    assert_eq!(tree.add(root, a), Ok(0));
    assert_eq!(tree.insert(root, 99, b), Ok(1));
    assert_eq!(tree.insert(root, 0, c), Ok(0));
    assert_eq!(tree.children(root).expect("root"), [c, a, b]);
    tree.drain_events().for_each(drop);

    assert_eq!(tree.add(root, b), Ok(2));
    assert_eq!(tree.pending_events(), 0);
}

#[test]
fn structural_misuse_is_rejected() {
    let mut tree = Tree::new();
    let root = tree.root();
    let outer = tree.create("outer", NodeKind::sequence());
    let inner = tree.create("inner", NodeKind::sequence());
    let leaf = scripted(&mut tree, "leaf");
    tree.add(outer, inner).expect("nest");

    assert_eq!(tree.add(inner, outer), Err(TreeError::WouldCycle { parent: inner, node: outer }));
    assert_eq!(tree.add(outer, outer), Err(TreeError::WouldCycle { parent: outer, node: outer }));
    assert_eq!(tree.add(inner, root), Err(TreeError::AlreadyAttached(root)));
    assert_eq!(tree.add(root, inner), Err(TreeError::AlreadyParented { node: inner, parent: outer }));
    assert_eq!(tree.add(leaf, inner), Err(TreeError::NotComposite(leaf)));
    assert_eq!(tree.set_decorated(outer, Some(leaf)), Err(TreeError::NotDecorator(outer)));
    assert_eq!(tree.remove(outer, leaf), Err(TreeError::NotAChild { parent: outer, node: leaf }));
    assert_eq!(tree.set_never_fail(leaf, true), Err(TreeError::NotSequence(leaf)));
    assert_eq!(tree.set_break_on_failure(outer, true), Err(TreeError::NotRepeater(outer)));
    assert!(matches!(tree.set_condition(outer, None), Err(TreeError::NotSelector(id)) if id == outer));
    assert!(matches!(tree.set_trigger(outer, None), Err(TreeError::NotGate(id)) if id == outer));
}

#[test]
fn remove_and_clear_detach_recursively() {
    let mut tree = Tree::new();
    let root = tree.root();
    let seq = tree.create("seq", NodeKind::sequence());
    let a = scripted(&mut tree, "a");
    let b = scripted(&mut tree, "b");
    tree.add(seq, a).expect("a");
    tree.add(root, seq).expect("seq");
    tree.add(root, b).expect("b");
    tree.drain_events().for_each(drop);

    assert_eq!(tree.remove(root, seq), Ok(seq));
    assert_eq!(events(&mut tree), [TreeEvent::NodeRemoved { parent: root, node: seq }]);
    assert!(!tree.is_attached(seq).expect("seq"));
    assert!(!tree.is_attached(a).expect("a"));
    assert_eq!(tree.parent(seq), Ok(None));
    assert_eq!(tree.parent(a), Ok(Some(seq)));

    tree.add(root, seq).expect("re-add");
    assert_eq!(tree.clear(root), Ok(vec![b, seq]));
    assert_eq!(
        events(&mut tree),
        [
            TreeEvent::NodeAdded { parent: root, index: 1, node: seq },
            TreeEvent::NodeRemoved { parent: root, node: b },
            TreeEvent::NodeRemoved { parent: root, node: seq },
        ]
    );
    assert_eq!(tree.walk().count(), 1);
}

#[test]
fn set_decorated_returns_previous_child_alive() {
    let mut tree = Tree::new();
    let root = tree.root();
    let rep = tree.create("rep", NodeKind::repeater(false));
    tree.add(root, rep).expect("rep");
    let x = scripted(&mut tree, "x");
    let y = scripted(&mut tree, "y");
    tree.drain_events().for_each(drop);

    assert_eq!(tree.set_decorated(rep, Some(x)), Ok(None));
    assert_eq!(tree.set_decorated(rep, Some(x)), Ok(None));
    assert_eq!(tree.set_decorated(rep, Some(y)), Ok(Some(x)));
    assert_eq!(
        events(&mut tree),
        [
            TreeEvent::NodeAdded { parent: rep, index: 0, node: x },
            TreeEvent::NodeRemoved { parent: rep, node: x },
            TreeEvent::NodeAdded { parent: rep, index: 0, node: y },
        ]
    );
    assert!(!tree.is_attached(x).expect("x"));
    assert_eq!(tree.node(x).expect("x").name(), "x");
    assert_eq!(tree.node(rep).expect("rep").child(), Some(y));

    assert_eq!(tree.set_decorated(rep, None), Ok(Some(y)));
    assert!(tree.children(rep).expect("rep").is_empty());
}

#[test]
fn destroy_frees_subtree_and_invalidates_ids() {
    let mut tree = Tree::new();
    let root = tree.root();
    let seq = tree.create("seq", NodeKind::sequence());
    let a = scripted(&mut tree, "a");
    tree.add(seq, a).expect("a");
    tree.add(root, seq).expect("seq");

    assert_eq!(tree.destroy(seq), Err(TreeError::StillLinked(seq)));
    assert_eq!(tree.destroy(a), Err(TreeError::StillLinked(a)));

    tree.remove(root, seq).expect("remove");
    assert_eq!(tree.len(), 3);
    tree.destroy(seq).expect("destroy");
    assert_eq!(tree.len(), 1);
    assert!(!tree.contains(seq));
    assert_eq!(tree.node(a).map(|_| ()), Err(TreeError::UnknownNode(a)));

    let reused = scripted(&mut tree, "reused");
    assert_ne!(reused, seq);
    assert_ne!(reused, a);
    assert!(tree.node(seq).is_err());
}

#[test]
fn property_edits_notify_only_for_attached_nodes() {
    let mut tree = Tree::new();
    let root = tree.root();
    let loose = tree.create("loose", NodeKind::sequence());
    let sel = tree.create("sel", NodeKind::Selector { condition: None });
    tree.add(root, sel).expect("sel");
    tree.drain_events().for_each(drop);

    tree.set_name(loose, "still loose").expect("rename");
    tree.set_never_fail(loose, true).expect("never fail");
    assert_eq!(tree.pending_events(), 0);

    tree.set_name(root, "Brain").expect("rename root");
    let previous = tree
        .set_condition(sel, Some(Box::new(VariableSwitch::new("alert"))))
        .expect("condition");
    assert!(previous.is_none());
    tree.modify(sel, |kind| {
        if let NodeKind::Selector { condition } = kind {
            *condition = None;
        }
    })
    .expect("modify");

    assert_eq!(
        events(&mut tree),
        [
            TreeEvent::NodeChanged { node: root },
            TreeEvent::NodeChanged { node: sel },
            TreeEvent::NodeChanged { node: sel },
        ]
    );
    assert_eq!(tree.node(root).expect("root").name(), "Brain");
    assert_eq!(tree.find("sel"), Some(sel));
    assert_eq!(tree.find("loose"), None);
}

#[test]
#[should_panic(expected = "cannot change the category")]
fn modify_rejects_category_change() {
    let mut tree: Tree<RecordingHost> = Tree::new();
    let root = tree.root();
    let _ = tree.modify(root, |kind| *kind = NodeKind::repeater(false));
}

#[test]
fn variable_edits_are_published() {
    let mut tree: Tree<RecordingHost> = Tree::new();

    tree.add_variable("alert", false).expect("alert");
    tree.add_variable("speed", 2.5f32).expect("speed");
    assert_eq!(
        tree.add_variable("alert", true),
        Err(TreeError::DuplicateVariable("alert".into()))
    );
    assert_eq!(tree.set_variable_default("speed", 4.0f32), Ok(VarValue::Float(2.5)));
    tree.rename_variable("speed", "pace").expect("rename");
    assert_eq!(
        tree.rename_variable("pace", "alert"),
        Err(TreeError::DuplicateVariable("alert".into()))
    );
    assert_eq!(tree.remove_variable("alert"), Ok(VarValue::Bool(false)));
    assert_eq!(
        tree.remove_variable("alert"),
        Err(TreeError::UnknownVariable("alert".into()))
    );

    assert_eq!(
        events(&mut tree),
        [
            TreeEvent::VariableAdded { name: "alert".into() },
            TreeEvent::VariableAdded { name: "speed".into() },
            TreeEvent::VariableChanged { name: "speed".into() },
            TreeEvent::VariableRenamed { from: "speed".into(), to: "pace".into() },
            TreeEvent::VariableRemoved { name: "alert".into() },
        ]
    );
    assert_eq!(tree.variables().len(), 1);
    assert_eq!(tree.variable("pace").map(|def| def.default), Some(VarValue::Float(4.0)));
}

#[test]
fn publish_delivers_queue_in_order_and_pull_structure_replays_it() {
    let mut tree = Tree::new();
    let root = tree.root();
    let seq = tree.create("seq", NodeKind::sequence());
    tree.add(root, seq).expect("seq");
    let a = scripted(&mut tree, "a");
    let b = scripted(&mut tree, "b");
    tree.add(seq, a).expect("a");
    tree.add(root, b).expect("b");
    tree.add_variable("alert", false).expect("alert");

    let mut live = EventLog::default();
    assert_eq!(tree.publish(&mut live), 4);
    assert_eq!(tree.pending_events(), 0);

    let mut replay = EventLog::default();
    tree.pull_structure(&mut replay);
    assert_eq!(
        replay.events,
        [
            TreeEvent::NodeAdded { parent: root, index: 0, node: seq },
            TreeEvent::NodeAdded { parent: root, index: 1, node: b },
            TreeEvent::NodeAdded { parent: seq, index: 0, node: a },
            TreeEvent::VariableAdded { name: "alert".into() },
        ]
    );
    assert_eq!(live.events.len(), replay.events.len());
    assert!(replay.events.iter().all(|event| live.events.contains(event)));
    assert_eq!(tree.pending_events(), 0);
}
