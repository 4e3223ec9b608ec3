use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};
use crate::compiler::emitter::emit_script;
use crate::compiler::formatter::{FormatError, Formatter, ScriptFormatter};
use crate::compiler::lowering::lower;
use crate::compiler::validator::{function_name_clashes, validate, ValidationIssue};
use crate::dsl::Test;
use crate::environment::Environment;
use crate::ir;

/// 编译配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Spaces per indent level in the formatted script.
    pub indent_width: usize,
    /// Log a warning for every `{{name}}` the environment does not define.
    pub warn_unresolved: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            warn_unresolved: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("test is not complete: {}", summary(.0))]
    Invalid(Vec<ValidationIssue>),

    #[error("failed to write script")]
    Emit(#[from] fmt::Error),

    #[error("failed to format script: {0}")]
    Format(#[from] FormatError),
}

fn summary(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Test → k6 script.
pub struct Compiler {
    config: CompilerConfig,
    formatter: Box<dyn Formatter>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        let formatter = Box::new(ScriptFormatter::new(config.indent_width));
        Self { config, formatter }
    }

    /// Swap the layout pass, e.g. for an external formatter.
    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Validate and lower, stopping before emission.
    pub fn lower(&self, test: &Test) -> Result<ir::Test, CompileError> {
        let strict = validate(test).map_err(CompileError::Invalid)?;
        let ir = lower(&strict);
        debug!("lowered {} scenario(s)", ir.scenarios.len());
        Ok(ir)
    }

    pub async fn compile(&self, environment: &Environment, test: &Test) -> Result<String, CompileError> {
        // 1. Validate
        let strict = validate(test).map_err(CompileError::Invalid)?;

        // Names are only final once the environment is applied.
        let clashes = function_name_clashes(&strict.roots, |name| environment.substitute(name));
        if !clashes.is_empty() {
            return Err(CompileError::Invalid(clashes));
        }

        // 2. Lower
        let ir = lower(&strict);

        // 3. Emit
        let raw = emit_script(environment, &ir, self.config.warn_unresolved)?;
        debug!("emitted {} bytes", raw.len());

        // 4. Format
        let script = self.formatter.format(&raw).await?;
        info!(
            "compiled {} scenario(s) against environment `{}`",
            ir.scenarios.len(),
            environment.name
        );
        Ok(script)
    }
}
