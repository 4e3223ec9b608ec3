use serde::{Serialize, Deserialize};
use crate::dsl::Executor;

/// 编译后的中间表示 (与目标脚本语法无关，可序列化)
///
/// Lowering produces this from a strict test; a backend renders it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Test {
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub executor: Executor,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Step {
    HttpRequest(HttpRequestStep),
    Group {
        name: String,
        steps: Vec<Step>,
    },
    Check {
        target: HttpRequestStep,
        checks: Vec<Check>,
    },
    Sleep {
        seconds: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpRequestStep {
    pub name: String,
    pub method: String,
    pub url: String,
    /// Sent as the query string, in order.
    #[serde(default)]
    pub parameters: Vec<KeyValue>,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Check {
    HasStatus { status: u16 },
    BodyContains { value: String },
}
