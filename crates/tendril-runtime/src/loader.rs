//! Loading imported JavaScript modules from disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;
use rhizome_tendril_codegen_js::{Definitions, ModuleError, ModuleLoader, Writer};
use rhizome_tendril_ir::Id;
use tracing::debug;

/// `export const a`, `export async function b`, `export class C`, ...
const EXPORT_DECLARATION: &str =
    r"(?m)^\s*export\s+(?:const|let|var|class|(?:async\s+)?function\s*\*?)\s*([A-Za-z_$][\w$]*)";

/// `export { a, b as c }`
const EXPORT_LIST: &str = r"(?m)^\s*export\s*\{([^}]*)\}";

/// Reads a module's exported names straight from its source, without
/// running it. Every export becomes a constant member of the namespace.
#[derive(Debug, Clone)]
pub struct FsModuleLoader {
    base_dir: PathBuf,
}

impl FsModuleLoader {
    /// Relative import paths are resolved against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// A loader for imports written in the file at `src_path`.
    pub fn for_source(src_path: &str) -> Self {
        let dir = Path::new(src_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::new(dir)
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ModuleLoader for FsModuleLoader {
    fn load(&self, path: &str) -> Result<Definitions, ModuleError> {
        let resolved = self.resolve(path);
        let source = std::fs::read_to_string(&resolved).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ModuleError::NotFound(resolved.display().to_string())
            } else {
                ModuleError::Io {
                    path: resolved.display().to_string(),
                    source,
                }
            }
        })?;

        let names = exported_names(&source).map_err(|e| ModuleError::Scan {
            path: resolved.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Loaded {} export(s) from {}", names.len(), resolved.display());

        Ok(names
            .into_iter()
            .map(|name| (name, Writer::Const))
            .collect())
    }
}

/// Names exported by an ES module, in source order, without duplicates.
/// `export default` has no name and is skipped.
pub fn exported_names(source: &str) -> Result<Vec<Id>, regex::Error> {
    let declaration = Regex::new(EXPORT_DECLARATION)?;
    let list = Regex::new(EXPORT_LIST)?;

    let mut found: Vec<(usize, Id)> = declaration
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect();

    for caps in list.captures_iter(source) {
        let Some(entries) = caps.get(1) else {
            continue;
        };
        for entry in entries.as_str().split(',') {
            // `a as b` exports `b`.
            let Some(name) = entry.split_whitespace().last() else {
                continue;
            };
            if name != "default" {
                found.push((entries.start(), name.to_string()));
            }
        }
    }

    found.sort_by_key(|(at, _)| *at);
    let mut names = Vec::with_capacity(found.len());
    for (_, name) in found {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}
