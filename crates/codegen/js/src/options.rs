//! Per-unit transpile options.

use rhizome_tendril_ir::Id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How top-level bindings are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranspileMode {
    /// Native `const`/`let` declarations.
    #[default]
    Module,
    /// Every entry is evaluated on its own, so top-level bindings go through
    /// `_cu$env.topLevelValues`.
    Repl,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileOptions {
    pub mode: TranspileMode,
    /// Path of the unit being transpiled, exposed as `srcPath`.
    pub src_path: Option<String>,
    /// Module name to import path, consulted by `import`.
    pub module_paths: HashMap<Id, String>,
}

impl TranspileOptions {
    pub fn repl() -> Self {
        Self {
            mode: TranspileMode::Repl,
            ..Self::default()
        }
    }

    pub fn with_src_path(mut self, path: impl Into<String>) -> Self {
        self.src_path = Some(path.into());
        self
    }

    pub fn with_module(mut self, name: impl Into<Id>, path: impl Into<String>) -> Self {
        self.module_paths.insert(name.into(), path.into());
        self
    }
}
