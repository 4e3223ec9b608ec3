use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// 运行环境：脚本生成时用于替换 `{{name}}` 的变量
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_string(), value.to_string());
        self
    }

    /// Replace every `{{name}}` whose name is a known variable.
    pub fn substitute(&self, target: &str) -> String {
        if !target.contains("{{") {
            return target.to_string();
        }
        self.variables
            .iter()
            .fold(target.to_string(), |acc, (name, value)| {
                acc.replace(&format!("{{{{{}}}}}", name), value)
            })
    }
}

/// Names of the `{{name}}` tokens left in `text`.
pub fn unresolved_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() && !name.contains("{{") {
            tokens.push(name);
        }
        rest = &after[end + 2..];
    }
    tokens
}
