use loadblocks::dsl::builder::TestBuilder;
use loadblocks::dsl::shape::Slot;
use loadblocks::dsl::{Block, BlockId, BlockKind, CheckExpression, Document, Executor, Parameter, Test};
use serde_json::json;

#[test]
fn test_build_scenario_chain() {
    let test = TestBuilder::new()
        .scenario("s1", "Smoke")
            .constant_vus(1, "30s")
            .steps(vec![
                Block::http_request("r1", "get", "https://example.com/a"),
                Block::sleep("z1", 1.0),
                Block::http_request("r2", "post", "https://example.com/b"),
            ])
            .build()
        .build();

    assert_eq!(test.roots.len(), 1);
    let scenario = &test.roots[0].block;
    assert_eq!(scenario.id, BlockId::from("s1"));

    // executor 槽位
    let executor = scenario.kind.slot(Slot::Executor).expect("executor missing");
    assert_eq!(executor.id, BlockId::from("s1-executor"));
    assert_eq!(
        executor.kind,
        BlockKind::Executor {
            executor: Executor::ConstantVus { vus: 1, duration: "30s".to_string() }
        }
    );

    // step 链按顺序连接
    let first = scenario.kind.slot(Slot::Step).expect("step missing");
    let second = first.kind.slot(Slot::Next).expect("next missing");
    let third = second.kind.slot(Slot::Next).expect("next missing");
    assert_eq!(first.id.as_str(), "r1");
    assert_eq!(second.id.as_str(), "z1");
    assert_eq!(third.id.as_str(), "r2");
    assert!(third.kind.slot(Slot::Next).is_none());
}

#[test]
fn test_roots_are_stacked() {
    let test = TestBuilder::new()
        .root(Block::group("g1", "one"))
        .root(Block::sleep("z1", 2.0))
        .build();

    assert_eq!(test.roots[0].top, 0.0);
    assert!(test.roots[1].top > test.roots[0].top);
    assert_eq!(test.blocks().count(), 2);
}

#[test]
fn test_block_json_shape() {
    let block = Block::check("c1", vec![CheckExpression::status(200)])
        .with_target(Block::http_request("r1", "get", "https://example.com"));

    let value = serde_json::to_value(&block).expect("serialize failed");
    assert_eq!(value["id"], json!("c1"));
    assert_eq!(value["type"], json!("check"));
    assert_eq!(value["target"]["type"], json!("http-request"));
    assert_eq!(value["target"]["next"], json!(null));
    assert_eq!(value["checks"][0]["type"], json!("status"));
    assert_eq!(value["checks"][0]["value"], json!(200));
    assert_eq!(value["next"], json!(null));
}

#[test]
fn test_deserialize_block_with_missing_slots() {
    let block: Block = serde_json::from_value(json!({
        "id": "e1",
        "type": "executor",
        "executor": { "type": "ramping-vus", "startVUs": 2, "stages": [{ "target": 10, "duration": "1m" }] }
    }))
    .expect("deserialize failed");

    match block.kind {
        BlockKind::Executor { executor: Executor::RampingVus { start_vus, stages } } => {
            assert_eq!(start_vus, Some(2));
            assert_eq!(stages.len(), 1);
            assert_eq!(stages[0].target, 10);
        }
        other => panic!("unexpected kind: {:?}", other),
    }

    let sleep: Block = serde_json::from_value(json!({ "id": "z", "type": "sleep", "seconds": 3 }))
        .expect("deserialize failed");
    assert_eq!(sleep.kind, BlockKind::Sleep { seconds: 3.0, next: None });
}

#[test]
fn test_document_round_trip() {
    let test = TestBuilder::new()
        .scenario("s1", "Smoke")
            .constant_vus(1, "30s")
            .steps(vec![Block::group("g1", "login")
                .with_step(Block::http_request("r1", "get", "{{host}}/login").with_header("Accept", "text/html"))])
            .build()
        .root(Block::library("l1", "List pets", "get", "/pets").with_parameter("limit", "10"))
        .build();

    let text = serde_json::to_string(&Document::from(test.clone())).expect("serialize failed");
    let document: Document = serde_json::from_str(&text).expect("deserialize failed");
    assert_eq!(document.version, 0);

    let loaded: Test = document.into_test().expect("version rejected");
    assert_eq!(loaded, test);
}

#[test]
fn test_root_json_shape() {
    let test = TestBuilder::new().root(Block::sleep("z1", 1.0)).build();

    let value = serde_json::to_value(Document::from(test)).expect("serialize failed");
    let root = &value["roots"][0];
    assert_eq!(root["type"], json!("root"));
    assert_eq!(root["top"], json!(0.0));
    assert_eq!(root["left"], json!(0.0));
    assert_eq!(root["block"]["id"], json!("z1"));
}

#[test]
fn test_document_version_is_checked() {
    let document: Document = serde_json::from_value(json!({
        "version": 7,
        "library": {},
        "roots": []
    }))
    .expect("deserialize failed");

    let err = document.into_test().expect_err("version 7 accepted");
    assert!(err.to_string().contains("7"));
}

#[test]
fn test_parameter_display() {
    assert_eq!(Parameter::Number(10.0).to_string(), "10");
    assert_eq!(Parameter::Number(2.5).to_string(), "2.5");
    assert_eq!(Parameter::Number(1e20).to_string(), "100000000000000000000");
    assert_eq!(Parameter::Number(-3.0).to_string(), "-3");
    assert_eq!(Parameter::Boolean(true).to_string(), "true");
    assert_eq!(Parameter::String("abc".to_string()).to_string(), "abc");
}

#[test]
fn test_slot_accepts() {
    let executor = Block::constant_vus("e", 1, "1m");
    let request = Block::http_request("r", "get", "/");
    let sleep = Block::sleep("z", 1.0);

    assert!(Slot::Executor.accepts(&executor.kind));
    assert!(!Slot::Executor.accepts(&request.kind));
    assert!(Slot::Step.accepts(&request.kind));
    assert!(Slot::Next.accepts(&sleep.kind));
    assert!(!Slot::Next.accepts(&executor.kind));
    assert!(Slot::Target.accepts(&request.kind));
    assert!(!Slot::Target.accepts(&sleep.kind));
    assert!(!Slot::Step.accepts(&Block::scenario("s", "x").kind));
}
