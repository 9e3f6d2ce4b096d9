//! Project configuration (`tendril.toml`).
//!
//! ```toml
//! mode = "module"
//! implicit_statements = "(import base)"
//! js_top_levels = ["console", "document"]
//!
//! [modules]
//! base = "./lib/base.mjs"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rhizome_tendril_codegen_js::TranspileMode;
use rhizome_tendril_ir::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up by [`ProjectConfig::discover`].
pub const CONFIG_FILE: &str = "tendril.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub mode: TranspileMode,
    /// Source read and transpiled before every unit.
    pub implicit_statements: String,
    /// Host globals usable without an import.
    pub js_top_levels: Vec<Id>,
    /// Module name to import path.
    pub modules: HashMap<Id, String>,
    /// Directory the config was loaded from; relative module paths are
    /// resolved against it.
    #[serde(skip)]
    pub root: PathBuf,
}

impl ProjectConfig {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Loads `tendril.toml` from `dir` or the nearest ancestor that has one.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        for ancestor in dir.ancestors() {
            let candidate = ancestor.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// What a unit at `from` is given to start with.
    pub fn provided_symbols(&self, from: impl Into<String>) -> ProvidedSymbols {
        ProvidedSymbols {
            from: from.into(),
            module_paths: self.modules.clone(),
            implicit_statements: self.implicit_statements.clone(),
            js_top_levels: self.js_top_levels.clone(),
        }
    }
}

/// The names a context or file starts with, in the shape the REPL host sends
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProvidedSymbols {
    /// Path of the unit, exposed as `srcPath`.
    pub from: String,
    pub module_paths: HashMap<Id, String>,
    pub implicit_statements: String,
    pub js_top_levels: Vec<Id>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = ProjectConfig::parse(
            r#"
mode = "repl"
implicit_statements = "(import base)"
js_top_levels = ["console"]

[modules]
base = "./base.mjs"
"#,
        )
        .unwrap();
        assert_eq!(config.mode, TranspileMode::Repl);
        assert_eq!(config.implicit_statements, "(import base)");
        assert_eq!(config.js_top_levels, vec!["console".to_string()]);
        assert_eq!(config.modules["base"], "./base.mjs");
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = ProjectConfig::parse("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.mode, TranspileMode::Module);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        assert!(ProjectConfig::parse("mode = \"script\"").is_err());
    }

    #[test]
    fn test_load_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[modules]\na = \"./a.mjs\"\n",
        )
        .unwrap();

        let config = ProjectConfig::discover(&nested).unwrap().unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.modules["a"], "./a.mjs");
    }

    #[test]
    fn test_load_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ProjectConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join(CONFIG_FILE);
        std::fs::write(&broken, "mode = ").unwrap();
        assert!(matches!(
            ProjectConfig::load(&broken),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn test_provided_symbols() {
        let mut config = ProjectConfig::default();
        config.modules.insert("a".into(), "./a.mjs".into());
        config.implicit_statements = "(import a)".into();

        let provided = config.provided_symbols("main.cu");
        assert_eq!(provided.from, "main.cu");
        assert_eq!(provided.module_paths["a"], "./a.mjs");
        assert_eq!(provided.implicit_statements, "(import a)");
    }

    #[test]
    fn test_provided_symbols_json_is_camel_case() {
        let provided: ProvidedSymbols = serde_json::from_str(
            r#"{"from":"x.cu","modulePaths":{"a":"./a.mjs"},"implicitStatements":"","jsTopLevels":["console"]}"#,
        )
        .unwrap();
        assert_eq!(provided.module_paths["a"], "./a.mjs");
        assert_eq!(provided.js_top_levels, vec!["console".to_string()]);
    }
}
