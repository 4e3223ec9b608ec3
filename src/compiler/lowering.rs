use crate::compiler::strict::{self, HttpRequestBlock, LibraryBlock, ScenarioBlock, StepBlock};
use crate::dsl::{CheckExpression, Parameter};
use crate::ir::{self, Check, HttpRequestStep, KeyValue, Step};

/// Lower a strict test into the IR: every scenario root becomes one IR
/// scenario with its chain flattened into a step list.
pub fn lower(test: &strict::Test) -> ir::Test {
    ir::Test {
        scenarios: test.scenarios().map(lower_scenario).collect(),
    }
}

fn lower_scenario(scenario: &ScenarioBlock) -> ir::Scenario {
    ir::Scenario {
        name: scenario.name.clone(),
        executor: scenario.executor.executor.clone(),
        steps: scenario.steps().map(lower_step).collect(),
    }
}

fn lower_step(step: &StepBlock) -> Step {
    match step {
        StepBlock::Group(group) => Step::Group {
            name: group.name.clone(),
            steps: strict::chain(group.step.as_deref()).map(lower_step).collect(),
        },
        StepBlock::HttpRequest(request) => Step::HttpRequest(http_request(request)),
        StepBlock::Library(library) => Step::HttpRequest(library_request(library)),
        StepBlock::Check(check) => Step::Check {
            target: http_request(&check.target),
            checks: check.checks.iter().map(lower_check).collect(),
        },
        StepBlock::Sleep(sleep) => Step::Sleep {
            seconds: sleep.seconds,
        },
    }
}

fn http_request(block: &HttpRequestBlock) -> HttpRequestStep {
    HttpRequestStep {
        name: block.name.clone(),
        method: block.method.clone(),
        url: block.url.clone(),
        parameters: block
            .parameters
            .iter()
            .map(|p| KeyValue {
                name: p.name.clone(),
                value: p.value.clone(),
            })
            .collect(),
        headers: block
            .headers
            .iter()
            .map(|h| KeyValue {
                name: h.name.clone(),
                value: h.value.clone(),
            })
            .collect(),
    }
}

fn library_request(block: &LibraryBlock) -> HttpRequestStep {
    HttpRequestStep {
        name: block.name.clone(),
        method: block.method.clone(),
        url: block.url.clone(),
        // Schema parameters without a default are left out of the query.
        parameters: block
            .parameters
            .iter()
            .filter(|(_, value)| !matches!(value, Parameter::String(s) if s.is_empty()))
            .map(|(name, value)| KeyValue {
                name: name.clone(),
                value: value.to_string(),
            })
            .collect(),
        headers: Vec::new(),
    }
}

fn lower_check(check: &CheckExpression) -> Check {
    match check {
        CheckExpression::Status { value, .. } => Check::HasStatus { status: *value },
        CheckExpression::Contains { value, .. } => Check::BodyContains {
            value: value.clone(),
        },
    }
}
