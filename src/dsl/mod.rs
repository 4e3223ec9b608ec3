pub mod builder;
pub mod shape;
pub mod template;

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Version tag written into every saved document.
pub const DOCUMENT_VERSION: u32 = 0;

/// 方块 ID (不透明字符串，在一棵树内唯一)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A new random id, used when a template is instantiated.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 编辑器中的方块 (loose 模型：槽位可以为空)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self { id: id.into(), kind }
    }
}

/// 方块类型。每个 `Option<Box<Block>>` 字段都是一个所有权槽位。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockKind {
    Scenario {
        name: String,
        executor: Option<Box<Block>>,
        step: Option<Box<Block>>,
    },
    Group {
        name: String,
        step: Option<Box<Block>>,
        next: Option<Box<Block>>,
    },
    HttpRequest {
        name: String,
        method: String,
        url: String,
        #[serde(default)]
        parameters: Vec<NameValue>,
        #[serde(default)]
        headers: Vec<NameValue>,
        next: Option<Box<Block>>,
    },
    /// An endpoint picked from the test's API library.
    Library {
        name: String,
        method: String,
        url: String,
        #[serde(default)]
        parameters: BTreeMap<String, Parameter>,
        next: Option<Box<Block>>,
    },
    Check {
        target: Option<Box<Block>>,
        #[serde(default)]
        checks: Vec<CheckExpression>,
        next: Option<Box<Block>>,
    },
    Executor {
        executor: Executor,
    },
    Sleep {
        seconds: f64,
        next: Option<Box<Block>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameValue {
    pub id: String,
    pub name: String,
    pub value: String,
}

impl NameValue {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Typed value of a library endpoint parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Parameter {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::String(s) => f.write_str(s),
            Parameter::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => write!(f, "{}", *n as i64),
            Parameter::Number(n) => write!(f, "{}", n),
            Parameter::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// 断言表达式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CheckExpression {
    Status { id: String, value: u16 },
    Contains { id: String, value: String },
}

impl CheckExpression {
    pub fn status(value: u16) -> Self {
        CheckExpression::Status { id: Uuid::new_v4().to_string(), value }
    }

    pub fn contains(value: &str) -> Self {
        CheckExpression::Contains { id: Uuid::new_v4().to_string(), value: value.to_string() }
    }
}

/// 负载形状描述
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Executor {
    ConstantVus {
        vus: u32,
        duration: String,
    },
    RampingVus {
        #[serde(rename = "startVUs", default, skip_serializing_if = "Option::is_none")]
        start_vus: Option<u32>,
        stages: Vec<Stage>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stage {
    pub target: u32,
    pub duration: String,
}

/// A block placed directly on the canvas. Saved as `{"type": "root", ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename = "root")]
pub struct Root {
    pub top: f64,
    pub left: f64,
    pub block: Block,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

/// 编辑器持有的测试 (loose tree)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Test {
    /// The API schema the library blocks were taken from. Opaque to the core.
    pub library: Value,
    pub roots: Vec<Root>,
}

impl Default for Test {
    fn default() -> Self {
        Self {
            library: empty_library(),
            roots: Vec::new(),
        }
    }
}

impl Test {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.roots.iter().map(|root| &root.block)
    }
}

/// The schema a freshly created test starts with.
pub fn empty_library() -> Value {
    json!({
        "swagger": "2.0",
        "info": {
            "title": "Untitled API",
            "version": "0.0.0"
        },
        "paths": {}
    })
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unsupported document version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// 持久化格式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub version: u32,
    pub library: Value,
    pub roots: Vec<Root>,
}

impl Document {
    pub fn into_test(self) -> Result<Test, DocumentError> {
        if self.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
                expected: DOCUMENT_VERSION,
            });
        }
        Ok(Test {
            library: self.library,
            roots: self.roots,
        })
    }
}

impl From<Test> for Document {
    fn from(test: Test) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            library: test.library,
            roots: test.roots,
        }
    }
}
