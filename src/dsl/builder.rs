use serde_json::Value;
use crate::dsl::{
    Block, BlockKind, CheckExpression, Executor, NameValue, Parameter, Position, Root,
    Stage, Test, empty_library,
};
use crate::dsl::shape::Slot;

/// Vertical gap between roots added without an explicit position.
const ROOT_SPACING: f64 = 200.0;

pub struct TestBuilder {
    library: Value,
    roots: Vec<Root>,
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuilder {
    pub fn new() -> Self {
        Self {
            library: empty_library(),
            roots: Vec::new(),
        }
    }

    pub fn library(mut self, library: Value) -> Self {
        self.library = library;
        self
    }

    /// Place a block on the canvas below the previous root.
    pub fn root(self, block: Block) -> Self {
        let top = self.roots.len() as f64 * ROOT_SPACING;
        self.root_at(block, Position { top, left: 0.0 })
    }

    pub fn root_at(mut self, block: Block, position: Position) -> Self {
        self.roots.push(Root {
            top: position.top,
            left: position.left,
            block,
        });
        self
    }

    pub fn scenario(self, id: &str, name: &str) -> ScenarioBuilder {
        ScenarioBuilder {
            test_builder: self,
            block: Block::scenario(id, name),
        }
    }

    pub fn build(self) -> Test {
        Test {
            library: self.library,
            roots: self.roots,
        }
    }
}

pub struct ScenarioBuilder {
    test_builder: TestBuilder,
    block: Block,
}

impl ScenarioBuilder {
    pub fn executor(mut self, executor: Block) -> Self {
        self.block = self.block.with(Slot::Executor, executor);
        self
    }

    pub fn constant_vus(self, vus: u32, duration: &str) -> Self {
        let id = format!("{}-executor", self.block.id);
        self.executor(Block::constant_vus(&id, vus, duration))
    }

    /// Set the scenario's step chain, linking `steps` in order.
    pub fn steps(mut self, steps: Vec<Block>) -> Self {
        if let Some(head) = Block::chain(steps) {
            self.block = self.block.with(Slot::Step, head);
        }
        self
    }

    pub fn build(self) -> TestBuilder {
        self.test_builder.root(self.block)
    }
}

impl Block {
    pub fn scenario(id: &str, name: &str) -> Self {
        Block::new(id, BlockKind::Scenario {
            name: name.to_string(),
            executor: None,
            step: None,
        })
    }

    pub fn group(id: &str, name: &str) -> Self {
        Block::new(id, BlockKind::Group {
            name: name.to_string(),
            step: None,
            next: None,
        })
    }

    pub fn http_request(id: &str, method: &str, url: &str) -> Self {
        Block::new(id, BlockKind::HttpRequest {
            name: String::new(),
            method: method.to_string(),
            url: url.to_string(),
            parameters: Vec::new(),
            headers: Vec::new(),
            next: None,
        })
    }

    pub fn library(id: &str, name: &str, method: &str, url: &str) -> Self {
        Block::new(id, BlockKind::Library {
            name: name.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            parameters: Default::default(),
            next: None,
        })
    }

    pub fn check(id: &str, checks: Vec<CheckExpression>) -> Self {
        Block::new(id, BlockKind::Check {
            target: None,
            checks,
            next: None,
        })
    }

    pub fn executor(id: &str, executor: Executor) -> Self {
        Block::new(id, BlockKind::Executor { executor })
    }

    pub fn constant_vus(id: &str, vus: u32, duration: &str) -> Self {
        Block::executor(id, Executor::ConstantVus {
            vus,
            duration: duration.to_string(),
        })
    }

    pub fn ramping_vus(id: &str, start_vus: Option<u32>, stages: &[(u32, &str)]) -> Self {
        let stages = stages
            .iter()
            .map(|(target, duration)| Stage {
                target: *target,
                duration: duration.to_string(),
            })
            .collect();
        Block::executor(id, Executor::RampingVus { start_vus, stages })
    }

    pub fn sleep(id: &str, seconds: f64) -> Self {
        Block::new(id, BlockKind::Sleep { seconds, next: None })
    }

    /// Put `child` into `slot`, replacing whatever was there. Blocks without
    /// that slot are returned unchanged.
    pub fn with(mut self, slot: Slot, child: Block) -> Self {
        if let Some(field) = self.kind.slot_mut(slot) {
            *field = Some(Box::new(child));
        }
        self
    }

    pub fn with_next(self, next: Block) -> Self {
        self.with(Slot::Next, next)
    }

    pub fn with_step(self, step: Block) -> Self {
        self.with(Slot::Step, step)
    }

    pub fn with_target(self, target: Block) -> Self {
        self.with(Slot::Target, target)
    }

    pub fn named(mut self, new_name: &str) -> Self {
        match &mut self.kind {
            BlockKind::Scenario { name, .. }
            | BlockKind::Group { name, .. }
            | BlockKind::HttpRequest { name, .. }
            | BlockKind::Library { name, .. } => *name = new_name.to_string(),
            BlockKind::Check { .. } | BlockKind::Executor { .. } | BlockKind::Sleep { .. } => {}
        }
        self
    }

    /// Add a query parameter. Applies to `http-request` and `library` blocks.
    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        match &mut self.kind {
            BlockKind::HttpRequest { parameters, .. } => parameters.push(NameValue::new(key, value)),
            BlockKind::Library { parameters, .. } => {
                parameters.insert(key.to_string(), Parameter::String(value.to_string()));
            }
            _ => {}
        }
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        if let BlockKind::HttpRequest { headers, .. } = &mut self.kind {
            headers.push(NameValue::new(key, value));
        }
        self
    }

    /// 线性连接：把 `blocks` 依次用 `next` 串起来，返回链头
    pub fn chain(blocks: Vec<Block>) -> Option<Block> {
        blocks
            .into_iter()
            .rev()
            .fold(None, |tail: Option<Block>, block| match tail {
                Some(tail) => Some(block.with_next(tail)),
                None => Some(block),
            })
    }
}

