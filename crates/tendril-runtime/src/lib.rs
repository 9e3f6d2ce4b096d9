//! Driving the Tendril transpiler: whole files, REPL contexts and the
//! project configuration that feeds both.

use std::sync::Arc;

use rhizome_tendril_codegen_js::{
    Definitions, Env, JsModule, ModuleError, ModuleLoader, TranspileError, TranspileMode,
    TranspileOptions, Writer, base, transpile_block,
};
use rhizome_tendril_syntax_reader::{ParseError, read_block};
use thiserror::Error;
use tracing::{debug, warn};

pub mod config;
pub mod context;
pub mod loader;
pub mod pool;

pub use config::{ConfigError, ProjectConfig, ProvidedSymbols};
pub use context::{Context, ContextId};
pub use loader::{FsModuleLoader, exported_names};
pub use pool::{Command, ContextPool, Reply};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("transpile error: {0}")]
    Transpile(#[from] TranspileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("unknown context: {0}")]
    UnknownContext(ContextId),

    #[error("context {0} has shut down")]
    ContextClosed(ContextId),
}

/// The builtin library plus the host's own top-level names, bound as
/// constants.
pub fn builtins(provided: &ProvidedSymbols) -> Definitions {
    let mut definitions = base::library();
    for id in &provided.js_top_levels {
        definitions.insert(id.clone(), Writer::Const);
    }
    definitions
}

/// Builds an environment for `provided` and runs its implicit statements.
///
/// Returns the environment along with the JavaScript the implicit
/// statements produced, which the host must run before anything else.
pub fn init_env(
    provided: &ProvidedSymbols,
    mode: TranspileMode,
    loader: Arc<dyn ModuleLoader>,
) -> Result<(Env, JsModule), RuntimeError> {
    let options = TranspileOptions {
        mode,
        src_path: Some(provided.from.clone()),
        module_paths: provided.module_paths.clone(),
    };
    let mut env = Env::new(builtins(provided), options).with_module_loader(loader);

    let implicit = read_block(&provided.implicit_statements)?;
    let js = transpile_block(&implicit, &mut env)?;
    env.forget_references();
    debug!(
        "Ran {} implicit statement(s) for {}",
        implicit.len(),
        provided.from
    );
    Ok((env, js))
}

/// Transpiles a whole source file in module mode.
pub fn compile_source(
    source: &str,
    provided: &ProvidedSymbols,
    loader: Arc<dyn ModuleLoader>,
) -> Result<JsModule, RuntimeError> {
    let result = compile_module(source, provided, loader);
    match &result {
        Ok(js) => debug!("Transpiled {} ({} bytes)", provided.from, js.body.len()),
        Err(err) => warn!("Failed to transpile {}: {}", provided.from, err),
    }
    result
}

fn compile_module(
    source: &str,
    provided: &ProvidedSymbols,
    loader: Arc<dyn ModuleLoader>,
) -> Result<JsModule, RuntimeError> {
    let (mut env, mut js) = init_env(provided, TranspileMode::Module, loader)?;
    let block = read_block(source)?;
    js.append(transpile_block(&block, &mut env)?);
    env.forget_references();
    Ok(js)
}
