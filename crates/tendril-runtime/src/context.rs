//! A REPL context: one environment that lives across many evaluations.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rhizome_tendril_codegen_js::{
    Env, JsModule, ModuleLoader, TranspileMode, transpile_block, transpile_statement,
};
use rhizome_tendril_ir::Form;
use rhizome_tendril_syntax_reader::read_block;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ProvidedSymbols, RuntimeError, init_env};

/// Unique context identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(u64);

impl ContextId {
    /// Generate a new unique context ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every unit is transpiled in REPL mode, so top-level bindings persist
/// through `_cu$env.topLevelValues` between units.
///
/// A unit either succeeds completely or leaves the environment as it was:
/// the environment is snapshotted before the unit and restored if the unit
/// fails.
pub struct Context {
    id: ContextId,
    env: Env,
}

impl Context {
    /// Creates a context and runs the implicit statements of `provided`.
    ///
    /// The returned module holds what the implicit statements produced.
    pub fn new(
        provided: &ProvidedSymbols,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<(Self, JsModule), RuntimeError> {
        let (env, js) = init_env(provided, TranspileMode::Repl, loader)?;
        let context = Self {
            id: ContextId::new(),
            env,
        };
        debug!("Initialized context {} for {}", context.id, provided.from);
        Ok((context, js))
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Transpiles a single form. The result is not terminated by `;`, so the
    /// host can take its value.
    pub fn eval_form(&mut self, form: &Form) -> Result<JsModule, RuntimeError> {
        self.run_unit("form", |env| Ok(transpile_statement(form, env)?))
    }

    pub fn eval_block(&mut self, block: &[Form]) -> Result<JsModule, RuntimeError> {
        self.run_unit("block", |env| Ok(transpile_block(block, env)?))
    }

    /// Reads `source` and evaluates it as a block.
    pub fn eval_source(&mut self, source: &str) -> Result<JsModule, RuntimeError> {
        let block = read_block(source)?;
        self.eval_block(&block)
    }

    fn run_unit(
        &mut self,
        kind: &str,
        unit: impl FnOnce(&mut Env) -> Result<JsModule, RuntimeError>,
    ) -> Result<JsModule, RuntimeError> {
        let snapshot = self.env.clone();
        match unit(&mut self.env) {
            Ok(js) => {
                self.env.forget_references();
                debug!("Context {} transpiled a {}", self.id, kind);
                Ok(js)
            }
            Err(err) => {
                warn!("Context {} rejected a {}: {}", self.id, kind, err);
                self.env = snapshot;
                Err(err)
            }
        }
    }
}
