#![cfg(feature = "serde")]

use arbor_bt::{Completion, NodeId, RunnerConfig, TreeEvent, VarValue, VariableDef};

#[test]
fn runner_config_json_roundtrip() {
    let config = RunnerConfig::staggered(7, 4).with_completion(Completion::Restart);
    let json = serde_json::to_string(&config).expect("serialize");
    let roundtrip: RunnerConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, config);
}

#[test]
fn runner_config_fills_missing_fields_with_defaults() {
    let config: RunnerConfig =
        serde_json::from_str(r#"{ "think_every_ticks": 5 }"#).expect("deserialize");
    assert_eq!(config.think_every_ticks, 5);
    assert_eq!(config.think_offset_ticks, 0);
    assert_eq!(config.on_completion, Completion::Halt);
}

#[test]
fn variables_and_events_json_roundtrip() {
    let defs = vec![
        VariableDef {
            name: "alert".into(),
            default: VarValue::Bool(true),
        },
        VariableDef {
            name: "lane".into(),
            default: VarValue::Int(-1),
        },
        VariableDef {
            name: "speed".into(),
            default: VarValue::Float(1.5),
        },
        VariableDef {
            name: "heading".into(),
            default: VarValue::Vector([0.0, 1.0, -0.5]),
        },
    ];
    let json = serde_json::to_string(&defs).expect("serialize");
    let roundtrip: Vec<VariableDef> = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, defs);

    let events = vec![
        TreeEvent::NodeAdded {
            parent: NodeId::new(0, 0),
            index: 2,
            node: NodeId::new(4, 1),
        },
        TreeEvent::VariableRenamed {
            from: "speed".into(),
            to: "pace".into(),
        },
    ];
    let json = serde_json::to_string(&events).expect("serialize");
    let roundtrip: Vec<TreeEvent> = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, events);
}
