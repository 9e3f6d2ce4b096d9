//! Loading the members of imported modules.

use std::collections::HashMap;
use thiserror::Error;

use crate::writer::Definitions;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module not found: {0}")]
    NotFound(String),

    #[error("failed to read module {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan module {path}: {message}")]
    Scan { path: String, message: String },
}

/// Resolves an import path to the bindings the module exports.
///
/// Called synchronously while transpiling, in source order.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<Definitions, ModuleError>;
}

/// Modules registered up front, keyed by import path.
#[derive(Debug, Clone, Default)]
pub struct StaticModules {
    modules: HashMap<String, Definitions>,
}

impl StaticModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, members: Definitions) {
        self.modules.insert(path.into(), members);
    }

    pub fn with_module(mut self, path: impl Into<String>, members: Definitions) -> Self {
        self.insert(path, members);
        self
    }
}

impl ModuleLoader for StaticModules {
    fn load(&self, path: &str) -> Result<Definitions, ModuleError> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| ModuleError::NotFound(path.to_string()))
    }
}
