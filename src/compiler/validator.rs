use std::collections::{BTreeMap, HashSet};
use serde::Serialize;
use tracing::debug;
use crate::compiler::emitter::sanitize_name;
use crate::compiler::strict::{
    self, CheckBlock, ExecutorBlock, GroupBlock, HttpRequestBlock, LibraryBlock, ScenarioBlock,
    SleepBlock, StepBlock,
};
use crate::dsl::{Block, BlockId, BlockKind, Executor, Test};
use crate::dsl::shape::Slot;

/// 结构问题：测试还不完整或槽位类型错误
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "kebab-case")]
pub enum ValidationIssue {
    #[error("scenario {scenario} has no executor")]
    MissingExecutor { scenario: BlockId },

    #[error("check {check} has no target request")]
    MissingCheckTarget { check: BlockId },

    #[error("slot `{slot}` of block {owner} cannot hold a {found} block")]
    WrongSlotKind {
        owner: BlockId,
        slot: Slot,
        found: &'static str,
    },

    #[error("target {target} of check {check} has steps chained after it")]
    ChainedTarget { check: BlockId, target: BlockId },

    #[error("block id {id} is used more than once")]
    DuplicateId { id: BlockId },

    #[error("ramping executor {executor} has no stages")]
    EmptyStages { executor: BlockId },

    #[error("scenarios {first} and {second} both compile to `{function}`")]
    DuplicateScenarioName {
        first: BlockId,
        second: BlockId,
        function: String,
    },
}

/// Marker for a subtree that produced at least one issue.
struct Invalid;

type Parsed<T> = Result<T, Invalid>;

/// Promote a loose test to a strict one.
///
/// Only scenario roots are validated; detached blocks on the canvas are
/// ignored. All issues are collected, and any issue fails the whole test.
pub fn validate(test: &Test) -> Result<strict::Test, Vec<ValidationIssue>> {
    Validator::new().validate(test)
}

#[derive(Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
    seen: HashSet<BlockId>,
    reported: HashSet<BlockId>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(mut self, test: &Test) -> Result<strict::Test, Vec<ValidationIssue>> {
        let mut roots = Vec::new();
        let mut failed = false;

        for root in test.roots.iter().filter(|root| root.block.kind.is_scenario()) {
            match self.scenario(&root.block) {
                Ok(scenario) => roots.push(strict::Root {
                    top: root.top,
                    left: root.left,
                    scenario,
                }),
                Err(Invalid) => failed = true,
            }
        }

        self.check_function_names(&roots);

        if failed || !self.issues.is_empty() {
            debug!("validation failed with {} issue(s)", self.issues.len());
            return Err(self.issues);
        }

        debug!("validated {} scenario(s)", roots.len());
        Ok(strict::Test {
            library: test.library.clone(),
            roots,
        })
    }

    fn issue(&mut self, issue: ValidationIssue) -> Invalid {
        self.issues.push(issue);
        Invalid
    }

    fn visit(&mut self, id: &BlockId) -> Parsed<()> {
        if self.seen.insert(id.clone()) {
            return Ok(());
        }
        if self.reported.insert(id.clone()) {
            self.issues.push(ValidationIssue::DuplicateId { id: id.clone() });
        }
        Err(Invalid)
    }

    fn scenario(&mut self, block: &Block) -> Parsed<ScenarioBlock> {
        let BlockKind::Scenario { name, executor, step } = &block.kind else {
            return Err(Invalid);
        };
        let visited = self.visit(&block.id);

        let executor = match executor.as_deref() {
            Some(executor) => self.executor(&block.id, executor),
            None => Err(self.issue(ValidationIssue::MissingExecutor {
                scenario: block.id.clone(),
            })),
        };
        let step = self.chain(&block.id, Slot::Step, step.as_deref());

        visited?;
        Ok(ScenarioBlock {
            id: block.id.clone(),
            name: name.clone(),
            executor: executor?,
            step: step?,
        })
    }

    fn executor(&mut self, owner: &BlockId, block: &Block) -> Parsed<ExecutorBlock> {
        let BlockKind::Executor { executor } = &block.kind else {
            return Err(self.wrong_slot(owner, Slot::Executor, block));
        };
        self.visit(&block.id)?;

        if let Executor::RampingVus { stages, .. } = executor {
            if stages.is_empty() {
                return Err(self.issue(ValidationIssue::EmptyStages {
                    executor: block.id.clone(),
                }));
            }
        }

        Ok(ExecutorBlock {
            id: block.id.clone(),
            executor: executor.clone(),
        })
    }

    /// A chain slot: empty is fine, otherwise it must hold a step.
    fn chain(&mut self, owner: &BlockId, slot: Slot, head: Option<&Block>) -> Parsed<Option<Box<StepBlock>>> {
        let Some(head) = head else {
            return Ok(None);
        };
        if !slot.accepts(&head.kind) {
            return Err(self.wrong_slot(owner, slot, head));
        }
        self.step(head).map(|step| Some(Box::new(step)))
    }

    fn step(&mut self, block: &Block) -> Parsed<StepBlock> {
        let visited = self.visit(&block.id);
        let id = block.id.clone();

        let step = match &block.kind {
            BlockKind::Group { name, step, next } => {
                let step = self.chain(&id, Slot::Step, step.as_deref());
                let next = self.chain(&id, Slot::Next, next.as_deref());
                StepBlock::Group(GroupBlock {
                    id,
                    name: name.clone(),
                    step: step?,
                    next: next?,
                })
            }
            BlockKind::HttpRequest { .. } => StepBlock::HttpRequest(self.http_request(block)?),
            BlockKind::Library { name, method, url, parameters, next } => {
                let next = self.chain(&id, Slot::Next, next.as_deref())?;
                StepBlock::Library(LibraryBlock {
                    id,
                    name: name.clone(),
                    method: method.clone(),
                    url: url.clone(),
                    parameters: parameters.clone(),
                    next,
                })
            }
            BlockKind::Check { target, checks, next } => {
                let target = self.target(&id, target.as_deref());
                let next = self.chain(&id, Slot::Next, next.as_deref());
                StepBlock::Check(CheckBlock {
                    id,
                    target: target?,
                    checks: checks.clone(),
                    next: next?,
                })
            }
            BlockKind::Sleep { seconds, next } => {
                let next = self.chain(&id, Slot::Next, next.as_deref())?;
                StepBlock::Sleep(SleepBlock {
                    id,
                    seconds: *seconds,
                    next,
                })
            }
            // Callers only pass blocks a chain slot accepts.
            BlockKind::Scenario { .. } | BlockKind::Executor { .. } => return Err(Invalid),
        };

        visited?;
        Ok(step)
    }

    fn http_request(&mut self, block: &Block) -> Parsed<HttpRequestBlock> {
        let BlockKind::HttpRequest { name, method, url, parameters, headers, next } = &block.kind else {
            return Err(Invalid);
        };
        let next = self.chain(&block.id, Slot::Next, next.as_deref())?;

        Ok(HttpRequestBlock {
            id: block.id.clone(),
            name: name.clone(),
            method: method.clone(),
            url: url.clone(),
            parameters: parameters.clone(),
            headers: headers.clone(),
            next,
        })
    }

    fn target(&mut self, check: &BlockId, target: Option<&Block>) -> Parsed<HttpRequestBlock> {
        let Some(target) = target else {
            return Err(self.issue(ValidationIssue::MissingCheckTarget { check: check.clone() }));
        };
        if !Slot::Target.accepts(&target.kind) {
            return Err(self.wrong_slot(check, Slot::Target, target));
        }
        self.visit(&target.id)?;

        if target.kind.slot(Slot::Next).is_some() {
            return Err(self.issue(ValidationIssue::ChainedTarget {
                check: check.clone(),
                target: target.id.clone(),
            }));
        }
        self.http_request(target)
    }

    fn wrong_slot(&mut self, owner: &BlockId, slot: Slot, found: &Block) -> Invalid {
        self.issue(ValidationIssue::WrongSlotKind {
            owner: owner.clone(),
            slot,
            found: found.kind.type_name(),
        })
    }

    fn check_function_names(&mut self, roots: &[strict::Root]) {
        self.issues.extend(function_name_clashes(roots, str::to_string));
    }
}

/// Pairs of scenarios whose names, after `resolve`, sanitize to the same
/// function. Emitting both would declare that function twice.
///
/// The validator resolves nothing; the compiler passes environment
/// substitution so clashes introduced by variables are caught too.
pub fn function_name_clashes(roots: &[strict::Root], resolve: impl Fn(&str) -> String) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut functions: BTreeMap<String, &BlockId> = BTreeMap::new();
    for root in roots {
        let function = sanitize_name(&resolve(&root.scenario.name));
        if let Some(first) = functions.get(&function) {
            issues.push(ValidationIssue::DuplicateScenarioName {
                first: (*first).clone(),
                second: root.scenario.id.clone(),
                function,
            });
        } else {
            functions.insert(function, &root.scenario.id);
        }
    }
    issues
}
