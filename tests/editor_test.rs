use loadblocks::dsl::builder::TestBuilder;
use loadblocks::dsl::shape::Slot;
use loadblocks::dsl::template::{Dropped, Template};
use loadblocks::dsl::{Block, BlockId, BlockKind, Position, Test};
use loadblocks::editor::{self, fold};
use std::ops::ControlFlow;

fn id(s: &str) -> BlockId {
    BlockId::from(s)
}

/// Ids along a `next` chain, starting at `head`.
fn chain_ids(head: &Block) -> Vec<String> {
    let mut ids = vec![head.id.to_string()];
    let mut current = head;
    while let Some(next) = current.kind.slot(Slot::Next) {
        ids.push(next.id.to_string());
        current = next;
    }
    ids
}

fn all_ids(test: &Test) -> Vec<BlockId> {
    let mut ids = Vec::new();
    let _ = fold::walk_test(test, &mut |block| {
        ids.push(block.id.clone());
        ControlFlow::<()>::Continue(())
    });
    ids
}

/// Scenario → [group(r1 → r2) → check(target r3) → sleep], plus a loose request.
fn sample() -> Test {
    TestBuilder::new()
        .scenario("s1", "Smoke")
            .constant_vus(1, "30s")
            .steps(vec![
                Block::group("g1", "login").with_step(
                    Block::http_request("r1", "get", "/a").with_next(Block::http_request("r2", "get", "/b")),
                ),
                Block::check("c1", vec![]).with_target(Block::http_request("r3", "get", "/c")),
                Block::sleep("z1", 1.0),
            ])
            .build()
        .root(Block::http_request("loose", "get", "/loose"))
        .build()
}

fn sleep_root(block: Block) -> Test {
    TestBuilder::new().root(block).build()
}

#[test]
fn test_insert_next_on_empty_slot() {
    let test = sleep_root(Block::sleep("1", 1.0));
    let test = editor::insert_next(test, &id("1"), Block::sleep("2", 2.0));

    assert_eq!(chain_ids(&test.roots[0].block), vec!["1", "2"]);
}

#[test]
fn test_insert_next_moves_existing_after_new_step() {
    let test = sleep_root(Block::sleep("1", 1.0).with_next(Block::sleep("2", 2.0)));
    let test = editor::insert_next(test, &id("1"), Block::sleep("3", 2.0));

    assert_eq!(chain_ids(&test.roots[0].block), vec!["1", "3", "2"]);
}

#[test]
fn test_insert_next_appends_existing_to_end_of_new_chain() {
    let test = sleep_root(Block::sleep("1", 1.0).with_next(Block::sleep("2", 2.0)));
    let dropped = Block::sleep("3", 2.0).with_next(Block::sleep("4", 2.0).with_next(Block::sleep("5", 2.0)));
    let test = editor::insert_next(test, &id("1"), dropped);

    assert_eq!(chain_ids(&test.roots[0].block), vec!["1", "3", "4", "5", "2"]);
}

#[test]
fn test_insert_next_instantiates_template() {
    let test = sleep_root(Block::sleep("1", 1.0));
    let template = Template::new(Block::sleep("my-template", 2.0));
    let test = editor::insert_next(test, &id("1"), template);

    let next = test.roots[0].block.kind.slot(Slot::Next).expect("next missing");
    assert_ne!(next.id.as_str(), "my-template");
    assert_eq!(next.kind, BlockKind::Sleep { seconds: 2.0, next: None });
}

#[test]
fn test_insert_child_goes_before_existing_steps() {
    let test = sample();
    let test = editor::insert_child(test, &id("g1"), Block::sleep("z2", 0.5));

    let group = editor::find_by_id(&test, &id("g1")).expect("group missing");
    let head = group.kind.slot(Slot::Step).expect("step missing");
    assert_eq!(chain_ids(head), vec!["z2", "r1", "r2"]);
}

#[test]
fn test_find_by_id() {
    let test = sample();

    let found = editor::find_by_id(&test, &id("r3")).expect("r3 missing");
    assert!(found.kind.is_http_request());
    assert!(editor::find_by_id(&test, &id("s1-executor")).is_some());
    assert!(editor::find_by_id(&test, &id("loose")).is_some());
    assert!(editor::find_by_id(&test, &id("nope")).is_none());
}

#[test]
fn test_detach_then_find_is_none() {
    let test = sample();
    for block_id in all_ids(&test) {
        let detached = editor::detach(test.clone(), &block_id);
        assert!(
            editor::find_by_id(&detached, &block_id).is_none(),
            "{} still reachable",
            block_id
        );
    }
}

#[test]
fn test_detach_takes_subtree() {
    let test = editor::detach(sample(), &id("r1"));

    // r2 hangs off r1, so it goes too
    assert!(editor::find_by_id(&test, &id("r2")).is_none());
    let group = editor::find_by_id(&test, &id("g1")).expect("group missing");
    assert!(group.kind.slot(Slot::Step).is_none());

    // 其余结构不变
    assert!(editor::find_by_id(&test, &id("c1")).is_some());
    assert_eq!(test.roots.len(), 2);
}

#[test]
fn test_detach_root_removes_it() {
    let test = editor::detach(sample(), &id("loose"));
    assert_eq!(test.roots.len(), 1);
}

#[test]
fn test_detach_unknown_id_is_noop() {
    let test = sample();
    assert_eq!(editor::detach(test.clone(), &id("nope")), test);
}

#[test]
fn test_concat_laws() {
    // A.next == None: tail becomes next
    let joined = editor::concat(Block::sleep("a", 1.0), Block::sleep("b", 1.0));
    assert_eq!(chain_ids(&joined), vec!["a", "b"]);

    // A.next == C: C gets the tail recursively
    let joined = editor::concat(
        Block::sleep("a", 1.0).with_next(Block::sleep("c", 1.0)),
        Block::sleep("b", 1.0).with_next(Block::sleep("d", 1.0)),
    );
    assert_eq!(chain_ids(&joined), vec!["a", "c", "b", "d"]);
}

#[test]
fn test_replace_and_update_block() {
    let test = editor::replace(sample(), &id("z1"), Block::sleep("z9", 5.0));
    assert!(editor::find_by_id(&test, &id("z1")).is_none());
    let check = editor::find_by_id(&test, &id("c1")).expect("check missing");
    assert_eq!(check.kind.slot(Slot::Next).map(|b| b.id.as_str()), Some("z9"));

    let renamed = Block::group("g1", "logout");
    let test = editor::update_block(test, renamed.clone());
    assert_eq!(editor::find_by_id(&test, &id("g1")), Some(&renamed));
}

#[test]
fn test_modify() {
    let test = editor::modify(sample(), &id("g1"), |block| block.named("checkout"));
    let group = editor::find_by_id(&test, &id("g1")).expect("group missing");
    if let BlockKind::Group { name, step, .. } = &group.kind {
        assert_eq!(name, "checkout");
        assert!(step.is_some());
    } else {
        panic!("Block type mismatch");
    }
}

#[test]
fn test_attach_replaces_executor() {
    let test = sample();
    let test = editor::attach(test, &id("s1"), Slot::Executor, Block::constant_vus("e2", 5, "1m"));

    let scenario = editor::find_by_id(&test, &id("s1")).expect("scenario missing");
    assert_eq!(scenario.kind.slot(Slot::Executor).map(|b| b.id.as_str()), Some("e2"));
    assert!(editor::find_by_id(&test, &id("s1-executor")).is_none());
}

#[test]
fn test_attach_replaces_check_target() {
    let test = sample();
    let loose = test.roots[1].block.clone();
    let test = editor::attach(test, &id("c1"), Slot::Target, loose);

    let check = editor::find_by_id(&test, &id("c1")).expect("check missing");
    assert_eq!(check.kind.slot(Slot::Target).map(|b| b.id.as_str()), Some("loose"));
    assert!(editor::find_by_id(&test, &id("r3")).is_none());
    // the loose root moved into the slot
    assert_eq!(test.roots.len(), 1);
}

#[test]
fn test_attach_moves_block_between_slots() {
    let test = sample();
    let sleep = editor::find_by_id(&test, &id("z1")).cloned().expect("sleep missing");
    let test = editor::insert_child(test, &id("g1"), sleep);

    let check = editor::find_by_id(&test, &id("c1")).expect("check missing");
    assert!(check.kind.slot(Slot::Next).is_none());

    let group = editor::find_by_id(&test, &id("g1")).expect("group missing");
    let head = group.kind.slot(Slot::Step).expect("step missing");
    assert_eq!(chain_ids(head), vec!["z1", "r1", "r2"]);
    assert!(editor::duplicate_ids(&test).is_empty());
}

#[test]
fn test_attach_onto_current_slot_is_noop() {
    let test = sample();
    let r1 = editor::find_by_id(&test, &id("r1")).cloned().expect("r1 missing");
    assert_eq!(editor::insert_child(test.clone(), &id("g1"), r1), test);
}

#[test]
fn test_can_attach() {
    let test = sample();
    let group = editor::find_by_id(&test, &id("g1")).cloned().expect("group missing");

    // slot kind
    assert!(editor::can_attach(&test, &id("s1"), Slot::Executor, &Dropped::from(Block::constant_vus("e", 1, "1m"))));
    assert!(!editor::can_attach(&test, &id("s1"), Slot::Executor, &Dropped::from(Block::sleep("z", 1.0))));
    assert!(!editor::can_attach(&test, &id("c1"), Slot::Target, &Dropped::from(Block::sleep("z", 1.0))));
    assert!(!editor::can_attach(&test, &id("z1"), Slot::Step, &Dropped::from(Block::sleep("z", 1.0))));

    // 不能拖进自己的子孙
    assert!(!editor::can_attach(&test, &id("r2"), Slot::Next, &Dropped::from(group.clone())));
    assert!(!editor::can_attach(&test, &id("g1"), Slot::Next, &Dropped::from(group)));

    // templates are never in the tree
    let template = Template::new(Block::group("group-template", ""));
    assert!(editor::can_attach(&test, &id("r2"), Slot::Next, &Dropped::from(template)));

    assert!(!editor::can_attach(&test, &id("nope"), Slot::Next, &Dropped::from(Block::sleep("z", 1.0))));
}

#[test]
fn test_is_descendant_of() {
    let test = sample();
    assert!(editor::is_descendant_of(&test, &id("r2"), &id("g1")));
    assert!(editor::is_descendant_of(&test, &id("r3"), &id("s1")));
    assert!(editor::is_descendant_of(&test, &id("g1"), &id("g1")));
    assert!(!editor::is_descendant_of(&test, &id("g1"), &id("r1")));
    assert!(!editor::is_descendant_of(&test, &id("loose"), &id("s1")));
}

#[test]
fn test_drop_group_child_on_canvas() {
    let test = sample();
    let r1 = editor::find_by_id(&test, &id("r1")).cloned().expect("r1 missing");
    let test = editor::drop_on_canvas(test, r1, Position { top: 50.0, left: 400.0 });

    let group = editor::find_by_id(&test, &id("g1")).expect("group missing");
    assert!(group.kind.slot(Slot::Step).is_none());

    assert_eq!(test.roots.len(), 3);
    let root = test.roots.last().expect("no roots");
    assert_eq!(root.block.id.as_str(), "r1");
    assert_eq!(chain_ids(&root.block), vec!["r1", "r2"]);
    assert_eq!((root.top, root.left), (50.0, 400.0));
}

#[test]
fn test_drop_existing_root_only_moves_it() {
    let test = sample();
    let loose = test.roots[1].block.clone();
    let moved = editor::drop_on_canvas(test.clone(), loose, Position { top: 10.0, left: 20.0 });

    assert_eq!(moved.roots.len(), 2);
    assert_eq!(moved.roots[1].block, test.roots[1].block);
    assert_eq!((moved.roots[1].top, moved.roots[1].left), (10.0, 20.0));
}

#[test]
fn test_drop_template_on_canvas() {
    let template = Template::new(Block::scenario("scenario-template", "New"));
    let test = editor::drop_on_canvas(Test::default(), template, Position::default());

    assert_eq!(test.roots.len(), 1);
    assert_ne!(test.roots[0].block.id.as_str(), "scenario-template");
    assert!(test.roots[0].block.kind.is_scenario());
}

#[test]
fn test_duplicate_ids() {
    let test = TestBuilder::new()
        .root(Block::sleep("x", 1.0).with_next(Block::sleep("y", 1.0)))
        .root(Block::group("g", "").with_step(Block::sleep("x", 2.0)))
        .build();

    assert_eq!(editor::duplicate_ids(&test), vec![id("x")]);
    assert!(editor::duplicate_ids(&sample()).is_empty());
}
