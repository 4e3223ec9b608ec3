//! 严格模型：校验通过后的测试，每个槽位都已正确填充
//!
//! Only the validator builds these. `to_loose` lifts them back into the
//! editable model so a strict tree serializes exactly like a document.

use std::collections::BTreeMap;
use serde_json::Value;
use crate::dsl::{self, Block, BlockId, BlockKind, CheckExpression, Executor, NameValue, Parameter};

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub library: Value,
    pub roots: Vec<Root>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub top: f64,
    pub left: f64,
    pub scenario: ScenarioBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBlock {
    pub id: BlockId,
    pub name: String,
    pub executor: ExecutorBlock,
    pub step: Option<Box<StepBlock>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorBlock {
    pub id: BlockId,
    pub executor: Executor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepBlock {
    Group(GroupBlock),
    HttpRequest(HttpRequestBlock),
    Library(LibraryBlock),
    Check(CheckBlock),
    Sleep(SleepBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupBlock {
    pub id: BlockId,
    pub name: String,
    pub step: Option<Box<StepBlock>>,
    pub next: Option<Box<StepBlock>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestBlock {
    pub id: BlockId,
    pub name: String,
    pub method: String,
    pub url: String,
    pub parameters: Vec<NameValue>,
    pub headers: Vec<NameValue>,
    pub next: Option<Box<StepBlock>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryBlock {
    pub id: BlockId,
    pub name: String,
    pub method: String,
    pub url: String,
    pub parameters: BTreeMap<String, Parameter>,
    pub next: Option<Box<StepBlock>>,
}

/// `target` is always a plain request with nothing chained after it.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckBlock {
    pub id: BlockId,
    pub target: HttpRequestBlock,
    pub checks: Vec<CheckExpression>,
    pub next: Option<Box<StepBlock>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepBlock {
    pub id: BlockId,
    pub seconds: f64,
    pub next: Option<Box<StepBlock>>,
}

impl StepBlock {
    pub fn next(&self) -> Option<&StepBlock> {
        match self {
            StepBlock::Group(block) => block.next.as_deref(),
            StepBlock::HttpRequest(block) => block.next.as_deref(),
            StepBlock::Library(block) => block.next.as_deref(),
            StepBlock::Check(block) => block.next.as_deref(),
            StepBlock::Sleep(block) => block.next.as_deref(),
        }
    }

    pub fn to_loose(&self) -> Block {
        match self {
            StepBlock::Group(block) => Block::new(block.id.clone(), BlockKind::Group {
                name: block.name.clone(),
                step: lift(&block.step),
                next: lift(&block.next),
            }),
            StepBlock::HttpRequest(block) => block.to_loose(),
            StepBlock::Library(block) => Block::new(block.id.clone(), BlockKind::Library {
                name: block.name.clone(),
                method: block.method.clone(),
                url: block.url.clone(),
                parameters: block.parameters.clone(),
                next: lift(&block.next),
            }),
            StepBlock::Check(block) => Block::new(block.id.clone(), BlockKind::Check {
                target: Some(Box::new(block.target.to_loose())),
                checks: block.checks.clone(),
                next: lift(&block.next),
            }),
            StepBlock::Sleep(block) => Block::new(block.id.clone(), BlockKind::Sleep {
                seconds: block.seconds,
                next: lift(&block.next),
            }),
        }
    }
}

/// Follow `next` links starting at `head`.
pub fn chain(head: Option<&StepBlock>) -> impl Iterator<Item = &StepBlock> {
    std::iter::successors(head, |step| step.next())
}

impl HttpRequestBlock {
    pub fn to_loose(&self) -> Block {
        Block::new(self.id.clone(), BlockKind::HttpRequest {
            name: self.name.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
            parameters: self.parameters.clone(),
            headers: self.headers.clone(),
            next: lift(&self.next),
        })
    }
}

impl ScenarioBlock {
    pub fn steps(&self) -> impl Iterator<Item = &StepBlock> {
        chain(self.step.as_deref())
    }

    pub fn to_loose(&self) -> Block {
        Block::new(self.id.clone(), BlockKind::Scenario {
            name: self.name.clone(),
            executor: Some(Box::new(Block::new(self.executor.id.clone(), BlockKind::Executor {
                executor: self.executor.executor.clone(),
            }))),
            step: lift(&self.step),
        })
    }
}

impl Test {
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioBlock> {
        self.roots.iter().map(|root| &root.scenario)
    }

    pub fn to_loose(&self) -> dsl::Test {
        dsl::Test {
            library: self.library.clone(),
            roots: self
                .roots
                .iter()
                .map(|root| dsl::Root {
                    top: root.top,
                    left: root.left,
                    block: root.scenario.to_loose(),
                })
                .collect(),
        }
    }
}

fn lift(step: &Option<Box<StepBlock>>) -> Option<Box<Block>> {
    step.as_deref().map(|step| Box::new(step.to_loose()))
}
