use clap::{Parser, Subcommand};
use loadblocks::compiler::core::{CompileError, Compiler, CompilerConfig};
use loadblocks::compiler::loader::{load_config, load_document, load_environment};
use loadblocks::compiler::validator::validate;
use loadblocks::environment::Environment;
use std::path::PathBuf;
use std::fs;
use anyhow::{Result, Context as AnyhowContext, bail};
use tracing::{info, error};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a test document into a k6 script
    Compile {
        /// Path to the test document (JSON or YAML)
        #[arg(long, short)]
        file: PathBuf,

        /// Environment file providing `{{name}}` variables
        #[arg(long, short)]
        env: Option<PathBuf>,

        /// Extra variables (key=value), overriding the environment file
        #[arg(long, short = 'D', value_parser = parse_key_val)]
        vars: Vec<(String, String)>,

        /// Compiler configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the script here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Check that every scenario in a document is complete
    Validate {
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Print the lowered intermediate representation as JSON
    Ir {
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s.find('=').ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, env, vars, config, out } => {
            let test = load_document(&file)?;

            let mut environment = match env {
                Some(path) => load_environment(path)?,
                None => Environment::new("default"),
            };
            environment.variables.extend(vars);

            let config = match config {
                Some(path) => load_config(path)?,
                None => CompilerConfig::default(),
            };

            let compiler = Compiler::with_config(config);
            let script = match compiler.compile(&environment, &test).await {
                Ok(script) => script,
                Err(CompileError::Invalid(issues)) => {
                    for issue in &issues {
                        error!("{}", issue);
                    }
                    bail!("{} has {} issue(s)", file.display(), issues.len());
                }
                Err(e) => return Err(e.into()),
            };

            match out {
                Some(path) => {
                    fs::write(&path, script)
                        .with_context(|| format!("Failed to write script to {}", path.display()))?;
                    info!("Script written to {}", path.display());
                }
                None => print!("{}", script),
            }
        }

        Commands::Validate { file } => {
            let test = load_document(&file)?;
            match validate(&test) {
                Ok(strict) => info!("{}: {} scenario(s) ok", file.display(), strict.roots.len()),
                Err(issues) => {
                    for issue in &issues {
                        error!("{}", issue);
                    }
                    bail!("{} has {} issue(s)", file.display(), issues.len());
                }
            }
        }

        Commands::Ir { file } => {
            let test = load_document(&file)?;
            let ir = Compiler::new().lower(&test)?;
            println!("{}", serde_json::to_string_pretty(&ir)?);
        }
    }

    Ok(())
}
