use std::collections::BTreeMap;
use serde_json::Value;
use crate::dsl::{Block, BlockId, BlockKind, CheckExpression, Executor, Parameter, Test};

/// 模板：工具箱中的只读原型，使用前必须实例化
///
/// A template is never stored inside a [`Test`]; the only way to get a
/// [`Block`] out of it is [`Template::instantiate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    block: Block,
}

impl Template {
    pub fn new(block: Block) -> Self {
        Self { block }
    }

    pub fn id(&self) -> &BlockId {
        &self.block.id
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Clone into a fresh instance. Every block inside the template gets a new
    /// id so one palette entry can be dragged out repeatedly.
    pub fn instantiate(&self) -> Block {
        let mut instance = self.block.clone();
        refresh_ids(&mut instance);
        instance
    }
}

fn refresh_ids(block: &mut Block) {
    block.id = BlockId::fresh();
    for (_, slot) in block.kind.slots_mut() {
        if let Some(child) = slot {
            refresh_ids(child);
        }
    }
}

/// Whatever the user is dragging: a palette template or a block already in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Dropped {
    Template(Template),
    Instance(Block),
}

impl Dropped {
    pub fn id(&self) -> &BlockId {
        match self {
            Dropped::Template(template) => template.id(),
            Dropped::Instance(block) => &block.id,
        }
    }

    pub fn kind(&self) -> &BlockKind {
        match self {
            Dropped::Template(template) => &template.block().kind,
            Dropped::Instance(block) => &block.kind,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Dropped::Template(_))
    }

    /// Templates become fresh instances; instances are returned unchanged.
    pub fn instantiate(self) -> Block {
        match self {
            Dropped::Template(template) => template.instantiate(),
            Dropped::Instance(block) => block,
        }
    }
}

impl From<Block> for Dropped {
    fn from(block: Block) -> Self {
        Dropped::Instance(block)
    }
}

impl From<Template> for Dropped {
    fn from(template: Template) -> Self {
        Dropped::Template(template)
    }
}

/// 工具箱分类
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteCategory {
    pub id: String,
    pub name: String,
    pub templates: Vec<Template>,
}

/// Built-in categories followed by one category for the test's API library.
pub fn palette(test: &Test) -> Vec<PaletteCategory> {
    let mut categories = default_palette();
    categories.push(library_category(&test.library));
    categories
}

pub fn default_palette() -> Vec<PaletteCategory> {
    vec![
        PaletteCategory {
            id: "scenarios".to_string(),
            name: "Scenarios".to_string(),
            templates: vec![
                template("scenario-template", BlockKind::Scenario {
                    name: String::new(),
                    executor: None,
                    step: None,
                }),
                template("executor-template", BlockKind::Executor {
                    executor: Executor::ConstantVus {
                        vus: 1,
                        duration: "1m".to_string(),
                    },
                }),
            ],
        },
        PaletteCategory {
            id: "steps".to_string(),
            name: "Steps".to_string(),
            templates: vec![
                template("group-template", BlockKind::Group {
                    name: String::new(),
                    step: None,
                    next: None,
                }),
                template("http-request-template", BlockKind::HttpRequest {
                    name: String::new(),
                    method: "get".to_string(),
                    url: String::new(),
                    parameters: Vec::new(),
                    headers: Vec::new(),
                    next: None,
                }),
                template("check-template", BlockKind::Check {
                    target: None,
                    checks: vec![CheckExpression::status(200)],
                    next: None,
                }),
                template("sleep-template", BlockKind::Sleep {
                    seconds: 1.0,
                    next: None,
                }),
            ],
        },
    ]
}

fn template(id: &str, kind: BlockKind) -> Template {
    Template::new(Block::new(id, kind))
}

const LIBRARY_METHODS: [&str; 2] = ["get", "post"];

/// One `library` template per `get`/`post` operation in the schema.
///
/// Works for both Swagger 2.0 and OpenAPI 3 documents. URLs are joined onto
/// the `x-synced-from` base the schema was fetched from.
pub fn library_category(library: &Value) -> PaletteCategory {
    let base_url = library.get("x-synced-from").and_then(Value::as_str).unwrap_or("");
    let title = library
        .pointer("/info/title")
        .and_then(Value::as_str)
        .unwrap_or("API")
        .to_string();

    let mut templates = Vec::new();
    if let Some(paths) = library.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            for method in LIBRARY_METHODS {
                let Some(operation) = item.get(method) else {
                    continue;
                };

                let name = operation
                    .get("summary")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{} {}", method.to_uppercase(), path));

                templates.push(template(
                    &format!("library-{}-{}", method, path),
                    BlockKind::Library {
                        name,
                        method: method.to_string(),
                        url: join_url(base_url, path),
                        parameters: query_parameters(operation),
                        next: None,
                    },
                ));
            }
        }
    }

    PaletteCategory {
        id: "api".to_string(),
        name: title,
        templates,
    }
}

fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn query_parameters(operation: &Value) -> BTreeMap<String, Parameter> {
    let mut parameters = BTreeMap::new();
    let Some(list) = operation.get("parameters").and_then(Value::as_array) else {
        return parameters;
    };

    for param in list {
        if param.get("in").and_then(Value::as_str) != Some("query") {
            continue;
        }
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };

        // Swagger 2.0 keeps the type on the parameter, OpenAPI 3 under `schema`.
        let schema = param.get("schema").unwrap_or(param);
        let default = schema.get("default");
        let value = match schema.get("type").and_then(Value::as_str) {
            Some("integer") | Some("number") => {
                Parameter::Number(default.and_then(Value::as_f64).unwrap_or(0.0))
            }
            Some("boolean") => Parameter::Boolean(default.and_then(Value::as_bool).unwrap_or(false)),
            _ => Parameter::String(default.and_then(Value::as_str).unwrap_or("").to_string()),
        };
        parameters.insert(name.to_string(), value);
    }

    parameters
}
