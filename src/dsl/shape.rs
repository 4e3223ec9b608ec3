//! Shape queries over blocks: kind predicates, ownership slots and the
//! accepts-predicate of every slot.
//!
//! `slots` and `slots_mut` are the only places that know which fields of a
//! block own other blocks. Every traversal in the editor goes through them.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::dsl::{Block, BlockKind};

/// 连接槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// `Scenario.executor`
    Executor,
    /// Head of a nested chain (`Scenario.step`, `Group.step`).
    Step,
    /// Continuation of a chain.
    Next,
    /// `Check.target`
    Target,
}

impl Slot {
    /// Whether a block of `kind` may sit in this slot.
    pub fn accepts(&self, kind: &BlockKind) -> bool {
        match self {
            Slot::Executor => kind.is_executor(),
            Slot::Step | Slot::Next => kind.is_step(),
            Slot::Target => kind.is_http_request(),
        }
    }

    /// Chain slots insert before existing content; the others hold exactly one block.
    pub fn is_chain(&self) -> bool {
        matches!(self, Slot::Step | Slot::Next)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Executor => "executor",
            Slot::Step => "step",
            Slot::Next => "next",
            Slot::Target => "target",
        };
        f.write_str(name)
    }
}

impl BlockKind {
    /// The serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Scenario { .. } => "scenario",
            BlockKind::Group { .. } => "group",
            BlockKind::HttpRequest { .. } => "http-request",
            BlockKind::Library { .. } => "library",
            BlockKind::Check { .. } => "check",
            BlockKind::Executor { .. } => "executor",
            BlockKind::Sleep { .. } => "sleep",
        }
    }

    pub fn is_scenario(&self) -> bool {
        matches!(self, BlockKind::Scenario { .. })
    }

    pub fn is_executor(&self) -> bool {
        matches!(self, BlockKind::Executor { .. })
    }

    pub fn is_http_request(&self) -> bool {
        matches!(self, BlockKind::HttpRequest { .. })
    }

    pub fn is_step(&self) -> bool {
        matches!(
            self,
            BlockKind::Group { .. }
                | BlockKind::HttpRequest { .. }
                | BlockKind::Library { .. }
                | BlockKind::Check { .. }
                | BlockKind::Sleep { .. }
        )
    }

    /// Blocks with a `next` slot.
    pub fn is_chainable(&self) -> bool {
        self.is_step()
    }

    pub fn has_slot(&self, slot: Slot) -> bool {
        self.slots().iter().any(|(s, _)| *s == slot)
    }

    /// 所有权槽位 (按固定顺序访问)
    ///
    /// scenario: executor, step; group: step, next; check: next, target;
    /// other chain blocks: next; executor: none.
    pub fn slots(&self) -> Vec<(Slot, Option<&Block>)> {
        match self {
            BlockKind::Scenario { executor, step, .. } => vec![
                (Slot::Executor, executor.as_deref()),
                (Slot::Step, step.as_deref()),
            ],
            BlockKind::Group { step, next, .. } => vec![
                (Slot::Step, step.as_deref()),
                (Slot::Next, next.as_deref()),
            ],
            BlockKind::Check { target, next, .. } => vec![
                (Slot::Next, next.as_deref()),
                (Slot::Target, target.as_deref()),
            ],
            BlockKind::HttpRequest { next, .. }
            | BlockKind::Library { next, .. }
            | BlockKind::Sleep { next, .. } => vec![(Slot::Next, next.as_deref())],
            BlockKind::Executor { .. } => Vec::new(),
        }
    }

    /// Mutable counterpart of [`BlockKind::slots`], same order.
    pub fn slots_mut(&mut self) -> Vec<(Slot, &mut Option<Box<Block>>)> {
        match self {
            BlockKind::Scenario { executor, step, .. } => {
                vec![(Slot::Executor, executor), (Slot::Step, step)]
            }
            BlockKind::Group { step, next, .. } => vec![(Slot::Step, step), (Slot::Next, next)],
            BlockKind::Check { target, next, .. } => vec![(Slot::Next, next), (Slot::Target, target)],
            BlockKind::HttpRequest { next, .. }
            | BlockKind::Library { next, .. }
            | BlockKind::Sleep { next, .. } => vec![(Slot::Next, next)],
            BlockKind::Executor { .. } => Vec::new(),
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> Option<&mut Option<Box<Block>>> {
        self.slots_mut()
            .into_iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, field)| field)
    }

    pub fn slot(&self, slot: Slot) -> Option<&Block> {
        self.slots()
            .into_iter()
            .find(|(s, _)| *s == slot)
            .and_then(|(_, child)| child)
    }
}

impl Block {
    /// Occupied slots only, in visit order.
    pub fn children(&self) -> impl Iterator<Item = (Slot, &Block)> {
        self.kind
            .slots()
            .into_iter()
            .filter_map(|(slot, child)| child.map(|c| (slot, c)))
    }

    /// True if `id` is this block or sits anywhere below it.
    pub fn contains(&self, id: &crate::dsl::BlockId) -> bool {
        self.id == *id || self.children().any(|(_, child)| child.contains(id))
    }
}
