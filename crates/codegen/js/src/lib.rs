//! Tendril to JavaScript code generation.
//!
//! Forms are transpiled against an [`Env`], which resolves every symbol to a
//! [`Writer`] and records where it was referenced from. The builtin writers
//! live in [`base`].
//!
//! ```
//! use rhizome_tendril_codegen_js::{base, transpile_block, Env, TranspileOptions};
//! use rhizome_tendril_ir::Form;
//!
//! let mut env = Env::new(base::library(), TranspileOptions::default());
//! let block = vec![Form::call("const", vec![Form::symbol("x"), Form::Integer32(1)])];
//! let js = transpile_block(&block, &mut env).unwrap();
//! assert_eq!(js.body, "const x = 1;\n");
//! ```

pub mod base;
mod env;
mod js;
mod module;
mod options;
mod transpile;
mod writer;

use thiserror::Error;

pub use env::{Env, Reference, Resolved, ScopeKind, ScopePath};
pub use js::{
    CU_ENV, JsModule, json_string, pseudo_top_level_access, pseudo_top_level_assignment,
    pseudo_top_level_reference,
};
pub use module::{ModuleError, ModuleLoader, StaticModules};
pub use options::{TranspileMode, TranspileOptions};
pub use transpile::{
    is_non_expression_call, transpile_block, transpile_expression, transpile_join_with_comma,
    transpile_key_values, transpile_statement,
};
pub use writer::{Definitions, DirectWriter, DynamicVar, Namespace, Syntax, Writer};

/// A well-formed form that cannot be transpiled. The message is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TranspileError {
    message: String,
}

impl TranspileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests;
