pub mod core;
pub mod emitter;
pub mod formatter;
pub mod loader;
pub mod lowering;
pub mod strict;
pub mod validator;

use crate::dsl::Test;
use crate::environment::Environment;
use self::core::{CompileError, Compiler};

/// Compile with the default configuration and the built-in formatter.
pub async fn compile(environment: &Environment, test: &Test) -> Result<String, CompileError> {
    Compiler::new().compile(environment, test).await
}
