//! 树编辑器：对 loose 模型的结构化编辑
//!
//! Every operation takes the test by value and returns the edited test; no
//! operation fails. Callers are expected to run [`can_attach`] (slot accepts
//! the kind, no cycle) before [`attach`], the editor itself does not check.

pub mod fold;

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use tracing::debug;
use crate::dsl::{Block, BlockId, Position, Root, Test};
use crate::dsl::shape::Slot;
use crate::dsl::template::Dropped;
use self::fold::{Rewrite, rewrite_test, walk_test};

/// Templates become fresh instances, instances pass through unchanged.
pub fn instantiate(dropped: impl Into<Dropped>) -> Block {
    dropped.into().instantiate()
}

/// Depth-first lookup across every root and slot.
pub fn find_by_id<'a>(test: &'a Test, id: &BlockId) -> Option<&'a Block> {
    debug_assert!(
        occurrences(test, id) <= 1,
        "block id {} is reachable from more than one slot",
        id
    );

    match walk_test(test, &mut |block| {
        if block.id == *id {
            ControlFlow::Break(block)
        } else {
            ControlFlow::Continue(())
        }
    }) {
        ControlFlow::Break(block) => Some(block),
        ControlFlow::Continue(()) => None,
    }
}

/// True if `candidate` is `ancestor` itself or sits in any slot below it.
pub fn is_descendant_of(test: &Test, candidate: &BlockId, ancestor: &BlockId) -> bool {
    find_by_id(test, ancestor).is_some_and(|ancestor| ancestor.contains(candidate))
}

/// Clear whatever root or slot holds `id`. No-op when nothing does.
pub fn detach(test: Test, id: &BlockId) -> Test {
    take(test, id).0
}

/// Detach `id` and hand back the block that was removed, subtree included.
fn take(test: Test, id: &BlockId) -> (Test, Option<Block>) {
    let mut taken = None;
    let test = rewrite_test(test, &mut |block| {
        if block.id == *id {
            taken = Some(block);
            Rewrite::Replace(None)
        } else {
            Rewrite::Descend(block)
        }
    });
    (test, taken)
}

/// Put `replacement` wherever `id` currently sits.
pub fn replace(test: Test, id: &BlockId, replacement: Block) -> Test {
    rewrite_test(test, &mut |block| {
        if block.id == *id {
            Rewrite::Replace(Some(replacement.clone()))
        } else {
            Rewrite::Descend(block)
        }
    })
}

/// Write an edited block back into the tree, keyed by its id.
pub fn update_block(test: Test, block: Block) -> Test {
    let id = block.id.clone();
    replace(test, &id, block)
}

/// Splice `tail` onto the end of `head`'s `next` chain.
///
/// `concat(A, B)` with `A.next == None` gives `A.next == B`; with
/// `A.next == C` it gives `A.next == concat(C, B)`.
pub fn concat(mut head: Block, tail: Block) -> Block {
    debug_assert!(head.kind.is_chainable(), "{} blocks have no next slot", head.kind.type_name());

    if let Some(next) = head.kind.slot_mut(Slot::Next) {
        *next = Some(Box::new(match next.take() {
            Some(existing) => concat(*existing, tail),
            None => tail,
        }));
    }
    head
}

/// The check a front-end runs before offering `owner.slot` as a drop target.
pub fn can_attach(test: &Test, owner: &BlockId, slot: Slot, dropped: &Dropped) -> bool {
    let Some(owner_block) = find_by_id(test, owner) else {
        return false;
    };

    if !owner_block.kind.has_slot(slot) || !slot.accepts(dropped.kind()) {
        return false;
    }

    match dropped {
        Dropped::Template(_) => true,
        Dropped::Instance(block) => {
            let current = find_by_id(test, &block.id).unwrap_or(block);
            !current.contains(owner)
        }
    }
}

/// Drop `dropped` onto `owner.slot`.
///
/// The block is detached from its previous owner and instantiated first. On
/// chain slots (`step`, `next`) it is inserted before the existing content,
/// which is moved to the end of the dropped chain. On `executor` and `target`
/// it replaces the previous occupant. Dropping a block onto the slot it
/// already occupies changes nothing.
pub fn attach(test: Test, owner: &BlockId, slot: Slot, dropped: impl Into<Dropped>) -> Test {
    let dropped = dropped.into();

    let Some(current_owner) = find_by_id(&test, owner) else {
        debug!("attach: owner {} not found", owner);
        return test;
    };
    if current_owner.kind.slot(slot).is_some_and(|child| child.id == *dropped.id()) {
        return test;
    }

    let (test, instance) = detach_dropped(test, dropped);

    let Some(mut owner_block) = find_by_id(&test, owner).cloned() else {
        // The owner lived inside the dropped subtree; callers must prevent this.
        debug!("attach: owner {} was detached together with {}", owner, instance.id);
        return test;
    };

    if let Some(field) = owner_block.kind.slot_mut(slot) {
        let placed = match field.take() {
            Some(existing) if slot.is_chain() => concat(instance, *existing),
            _ => instance,
        };
        *field = Some(Box::new(placed));
    }

    update_block(test, owner_block)
}

/// Drop onto the `step` slot of a scenario or group.
pub fn insert_child(test: Test, owner: &BlockId, step: impl Into<Dropped>) -> Test {
    attach(test, owner, Slot::Step, step)
}

/// Drop onto the `next` slot of a chain block.
pub fn insert_next(test: Test, owner: &BlockId, next: impl Into<Dropped>) -> Test {
    attach(test, owner, Slot::Next, next)
}

/// Place a block on the canvas.
///
/// A block that already is a root only moves. Anything else is detached from
/// its owner, instantiated and appended as a new root.
pub fn drop_on_canvas(mut test: Test, dropped: impl Into<Dropped>, position: Position) -> Test {
    let dropped = dropped.into();

    if !dropped.is_template() {
        if let Some(root) = test.roots.iter_mut().find(|root| root.block.id == *dropped.id()) {
            root.top = position.top;
            root.left = position.left;
            return test;
        }
    }

    let (mut test, block) = detach_dropped(test, dropped);
    test.roots.push(Root {
        top: position.top,
        left: position.left,
        block,
    });
    test
}

/// Ids reachable from more than one place, sorted.
pub fn duplicate_ids(test: &Test) -> Vec<BlockId> {
    let mut counts: BTreeMap<&BlockId, usize> = BTreeMap::new();
    let _ = walk_test(test, &mut |block| {
        *counts.entry(&block.id).or_default() += 1;
        ControlFlow::<()>::Continue(())
    });

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Remove an instance from wherever it sits and return the tree's current
/// copy of it; templates are just instantiated.
fn detach_dropped(test: Test, dropped: Dropped) -> (Test, Block) {
    match dropped {
        Dropped::Template(template) => (test, template.instantiate()),
        Dropped::Instance(block) => {
            let id = block.id.clone();
            let (test, taken) = take(test, &id);
            (test, taken.unwrap_or(block))
        }
    }
}

fn occurrences(test: &Test, id: &BlockId) -> usize {
    let mut count = 0;
    let _ = walk_test(test, &mut |block| {
        if block.id == *id {
            count += 1;
        }
        ControlFlow::<()>::Continue(())
    });
    count
}

/// Apply `f` to the block with `id`, leaving the rest of the tree alone.
pub fn modify(test: Test, id: &BlockId, f: impl FnOnce(Block) -> Block) -> Test {
    let mut f = Some(f);
    rewrite_test(test, &mut |block| {
        if block.id == *id {
            match f.take() {
                Some(f) => Rewrite::Replace(Some(f(block))),
                None => Rewrite::Descend(block),
            }
        } else {
            Rewrite::Descend(block)
        }
    })
}

