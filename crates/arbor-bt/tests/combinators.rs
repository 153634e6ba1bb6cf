mod common;

use arbor_bt::{NodeKind, Runner, Tree};
use arbor_core::{Local, Status};
use common::{add, add_scripted, ArmedAt, ByFrame, RecordingHost};

use Status::{Failed, Finished, InProgress};

#[test]
fn sequence_initializes_next_child_only_after_previous_finished() {
    let mut tree = Tree::new();
    let root = tree.root();
    let seq = add(&mut tree, root, "seq", NodeKind::sequence());
    add_scripted(&mut tree, seq, "a");
    add_scripted(&mut tree, seq, "b");

    let mut host = RecordingHost::default();
    host.script("a", [Finished]);
    host.script("b", [InProgress, Finished]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["init a", "exec a", "deinit a", "init b"]);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["exec b"]);

    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert_eq!(host.take_log(), ["exec b", "deinit b"]);
}

#[test]
fn sequence_propagates_failure_and_skips_remaining_children() {
    let mut tree = Tree::new();
    let root = tree.root();
    add_scripted(&mut tree, root, "a");
    add_scripted(&mut tree, root, "b");

    let mut host = RecordingHost::default();
    host.script("a", [Failed]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), Failed);
    assert_eq!(host.take_log(), ["init a", "exec a", "deinit a"]);
}

#[test]
fn never_fail_sequence_absorbs_failure_and_stays_put() {
    let mut tree = Tree::new();
    let root = tree.root();
    let seq = add(&mut tree, root, "seq", NodeKind::never_fail_sequence());
    add_scripted(&mut tree, seq, "a");
    add_scripted(&mut tree, seq, "b");

    let mut host = RecordingHost::default();
    host.script("a", [Failed]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    let log = host.take_log();
    assert_eq!(log, ["init a", "exec a", "deinit a"]);

    // Active index never moved past the failing child; the outcome is remembered.
    let data = runner.node_data(seq).expect("laid out");
    assert_eq!(*data.get(Local::<usize>::new(0)), 0);
    assert_eq!(*data.get(Local::<Option<Status>>::new(1)), Some(Finished));
}

#[test]
fn empty_sequence_finishes_immediately() {
    let tree: Tree<RecordingHost> = Tree::new();
    let mut host = RecordingHost::default();
    let mut runner = Runner::new(&tree);
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
}

#[test]
fn selector_switches_children_only_when_selection_changes() {
    let mut tree = Tree::new();
    let root = tree.root();
    let sel = add(&mut tree, root, "sel", NodeKind::selector(ByFrame));
    add_scripted(&mut tree, sel, "x");
    add_scripted(&mut tree, sel, "y");

    let mut host = RecordingHost::default();
    host.script("x", [InProgress; 4]);
    host.script("y", [InProgress; 4]);
    host.selections = vec![Some(0), Some(0), Some(1), None];
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["init x", "exec x"]);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["exec x"]);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["deinit x", "init y", "exec y"]);

    // No child runs; y is only torn down because the finished selector is deinitialized.
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert_eq!(host.take_log(), ["deinit y"]);
}

#[test]
fn selector_out_of_range_or_without_condition_finishes() {
    let mut tree = Tree::new();
    let root = tree.root();
    let sel = add(&mut tree, root, "sel", NodeKind::selector(ByFrame));
    add_scripted(&mut tree, sel, "x");

    let mut host = RecordingHost::default();
    host.selections = vec![Some(1)];
    let mut runner = Runner::new(&tree);
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert!(host.take_log().is_empty());
    drop(runner);

    let mut tree = Tree::new();
    let root = tree.root();
    let bare = add(&mut tree, root, "bare", NodeKind::Selector { condition: None });
    add_scripted(&mut tree, bare, "x");
    let mut runner = Runner::new(&tree);
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert!(host.take_log().is_empty());
}

#[test]
fn selector_mirrors_child_failure() {
    let mut tree = Tree::new();
    let root = tree.root();
    let sel = add(&mut tree, root, "sel", NodeKind::selector(ByFrame));
    add_scripted(&mut tree, sel, "x");

    let mut host = RecordingHost::default();
    host.script("x", [InProgress, Failed]);
    host.selections = vec![Some(0), Some(0)];
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(runner.execute(&mut host, 0.1), Failed);
    assert_eq!(host.take_log(), ["init x", "exec x", "exec x", "deinit x"]);
}

#[test]
fn parallel_fails_fast() {
    let mut tree = Tree::new();
    let root = tree.root();
    let par = add(&mut tree, root, "par", NodeKind::parallel());
    add_scripted(&mut tree, par, "p0");
    add_scripted(&mut tree, par, "p1");
    add_scripted(&mut tree, par, "p2");

    let mut host = RecordingHost::default();
    host.script("p0", [InProgress]);
    host.script("p1", [InProgress]);
    host.script("p2", [Failed]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), Failed);
    let log = host.take_log();
    assert_eq!(
        &log[..6],
        ["init p0", "init p1", "init p2", "exec p0", "exec p1", "exec p2"]
    );
    assert!(log.contains(&"deinit p0".to_owned()));
    assert!(log.contains(&"deinit p1".to_owned()));
}

#[test]
fn parallel_failure_stops_later_siblings_that_tick() {
    let mut tree = Tree::new();
    let root = tree.root();
    let par = add(&mut tree, root, "par", NodeKind::parallel());
    add_scripted(&mut tree, par, "p0");
    add_scripted(&mut tree, par, "p1");

    let mut host = RecordingHost::default();
    host.script("p0", [Failed]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), Failed);
    assert!(!host.take_log().contains(&"exec p1".to_owned()));
}

#[test]
fn parallel_finishes_when_every_child_finished_once() {
    let mut tree = Tree::new();
    let root = tree.root();
    let par = add(&mut tree, root, "par", NodeKind::parallel());
    add_scripted(&mut tree, par, "p0");
    add_scripted(&mut tree, par, "p1");

    let mut host = RecordingHost::default();
    host.script("p0", [InProgress, Finished]);
    host.script("p1", [Finished]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(
        host.take_log(),
        ["init p0", "init p1", "exec p0", "exec p1", "deinit p1"]
    );

    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert_eq!(host.take_log(), ["exec p0", "deinit p0"]);
}

#[test]
fn repeater_keeps_restarting_child() {
    let mut tree = Tree::new();
    let root = tree.root();
    let rep = add(&mut tree, root, "rep", NodeKind::repeater(false));
    let r = common::scripted(&mut tree, "r");
    tree.set_decorated(rep, Some(r)).expect("decorate");

    let mut host = RecordingHost::default();
    host.script("r", [Finished, Failed, Finished, Failed, Finished, Failed]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["init r", "exec r", "deinit r", "init r"]);
    for _ in 0..5 {
        assert_eq!(runner.execute(&mut host, 0.1), InProgress);
        assert_eq!(host.take_log(), ["exec r", "deinit r", "init r"]);
    }
}

#[test]
fn repeater_breaks_on_failure_when_asked() {
    let mut tree = Tree::new();
    let root = tree.root();
    let rep = add(&mut tree, root, "rep", NodeKind::repeater(true));
    let r = common::scripted(&mut tree, "r");
    tree.set_decorated(rep, Some(r)).expect("decorate");

    let mut host = RecordingHost::default();
    host.script("r", [Finished, InProgress, Failed]);
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(runner.execute(&mut host, 0.1), Failed);
}

#[test]
fn decorators_without_child_finish() {
    let mut tree = Tree::new();
    let root = tree.root();
    add(&mut tree, root, "rep", NodeKind::repeater(false));
    add(&mut tree, root, "gate", NodeKind::gate(ArmedAt));

    let mut host = RecordingHost::default();
    let mut runner = Runner::new(&tree);
    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
}

#[test]
fn gate_holds_child_until_trigger_fires() {
    let mut tree = Tree::new();
    let root = tree.root();
    let gate = add(&mut tree, root, "gate", NodeKind::gate(ArmedAt));
    let g = common::scripted(&mut tree, "g");
    tree.set_decorated(gate, Some(g)).expect("decorate");

    let mut host = RecordingHost::default();
    host.script("g", [InProgress, Finished]);
    host.armed = vec![false, false, true, false];
    let mut runner = Runner::new(&tree);

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert!(host.take_log().is_empty());

    assert_eq!(runner.execute(&mut host, 0.1), InProgress);
    assert_eq!(host.take_log(), ["init g", "exec g"]);

    // Started gates no longer consult the trigger.
    assert_eq!(runner.execute(&mut host, 0.1), Finished);
    assert_eq!(host.take_log(), ["exec g", "deinit g"]);
}
