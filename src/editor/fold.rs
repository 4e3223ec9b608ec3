//! 通用的槽位遍历
//!
//! Read-only walks and slot rewrites over the ownership slots of a tree. The
//! editor operations are all expressed with these two folds, so adding a block
//! kind only means updating `BlockKind::slots`/`slots_mut`.

use std::ops::ControlFlow;
use crate::dsl::{Block, Root, Test};

/// Pre-order walk: the block itself, then its slots in visit order.
pub fn walk<'a, B>(
    block: &'a Block,
    visit: &mut impl FnMut(&'a Block) -> ControlFlow<B>,
) -> ControlFlow<B> {
    visit(block)?;
    for (_, child) in block.children() {
        walk(child, visit)?;
    }
    ControlFlow::Continue(())
}

/// [`walk`] every root of the test in order.
pub fn walk_test<'a, B>(
    test: &'a Test,
    visit: &mut impl FnMut(&'a Block) -> ControlFlow<B>,
) -> ControlFlow<B> {
    for root in &test.roots {
        walk(&root.block, visit)?;
    }
    ControlFlow::Continue(())
}

/// What to do with a block found in a slot during [`rewrite`].
pub enum Rewrite {
    /// Keep the block and keep rewriting inside it.
    Descend(Block),
    /// Put this in the slot instead and do not look inside it. `None` empties the slot.
    Replace(Option<Block>),
}

/// Top-down rewrite of every occupied slot below `block`.
pub fn rewrite<F>(mut block: Block, f: &mut F) -> Block
where
    F: FnMut(Block) -> Rewrite,
{
    for (_, field) in block.kind.slots_mut() {
        if let Some(child) = field.take() {
            *field = match f(*child) {
                Rewrite::Descend(child) => Some(Box::new(rewrite(child, f))),
                Rewrite::Replace(replacement) => replacement.map(Box::new),
            };
        }
    }
    block
}

/// [`rewrite`] applied to the roots as well: a root replaced with `None` is
/// removed from the canvas, positions are kept.
pub fn rewrite_test<F>(test: Test, f: &mut F) -> Test
where
    F: FnMut(Block) -> Rewrite,
{
    let mut roots = Vec::with_capacity(test.roots.len());
    for root in test.roots {
        let block = match f(root.block) {
            Rewrite::Descend(block) => Some(rewrite(block, f)),
            Rewrite::Replace(replacement) => replacement,
        };
        if let Some(block) = block {
            roots.push(Root { top: root.top, left: root.left, block });
        }
    }
    Test { library: test.library, roots }
}
