//! Scope stack and reference log.

use rhizome_tendril_ir::{Id, PropertyAccess};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::module::{ModuleLoader, StaticModules};
use crate::options::{TranspileMode, TranspileOptions};
use crate::writer::{Definitions, Writer};
use crate::TranspileError;

/// Address of a scope: the birth index of each scope from the root down.
///
/// The root is `[]`; the second scope opened directly inside the root's
/// first child is `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopePath(Vec<usize>);

impl ScopePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// True if `self` strictly encloses `other`.
    pub fn is_ancestor_of(&self, other: &ScopePath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// True if `other` is `self` or nested inside it.
    pub fn contains(&self, other: &ScopePath) -> bool {
        other.0.starts_with(&self.0)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for ScopePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, index) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", index)?;
        }
        f.write_str("]")
    }
}

/// One resolved use of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Scope the identifier was used in.
    pub referer: ScopePath,
    /// Scope holding the definition it resolved to.
    pub defined_at: ScopePath,
    pub id: Id,
}

/// Result of [`Env::refer_to`].
#[derive(Debug, Clone)]
pub struct Resolved {
    pub writer: Writer,
    pub defined_at: ScopePath,
    pub is_builtin: bool,
}

/// What kind of construct opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// A function body. `return` becomes legal; loop jumps do not cross it.
    Function { is_async: bool },
    /// A loop body. Inherits async-ness from the enclosing scope.
    Loop,
    /// Any other block, such as an `if` arm. Inherits everything.
    Block,
}

#[derive(Debug, Clone)]
struct Scope {
    path: ScopePath,
    definitions: Definitions,
    children: usize,
    is_async: bool,
    in_loop: bool,
    in_function: bool,
}

impl Scope {
    fn root(definitions: Definitions) -> Self {
        Self {
            path: ScopePath::root(),
            definitions,
            children: 0,
            // Modules allow top-level await.
            is_async: true,
            in_loop: false,
            in_function: false,
        }
    }
}

/// The lexical environment of one compilation context.
///
/// Never shared between contexts. Cloning takes a snapshot that can be put
/// back when a unit fails.
#[derive(Clone)]
pub struct Env {
    scopes: Vec<Scope>,
    references: HashMap<Id, Vec<Reference>>,
    builtins: HashSet<Id>,
    options: TranspileOptions,
    modules: Arc<dyn ModuleLoader>,
    tmp_vars: usize,
}

impl Env {
    /// Creates an env whose root scope holds `builtins`.
    pub fn new(builtins: Definitions, options: TranspileOptions) -> Self {
        Self {
            builtins: builtins.keys().cloned().collect(),
            scopes: vec![Scope::root(builtins)],
            references: HashMap::new(),
            options,
            modules: Arc::new(StaticModules::new()),
            tmp_vars: 0,
        }
    }

    pub fn with_module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.modules = loader;
        self
    }

    pub fn options(&self) -> &TranspileOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut TranspileOptions {
        &mut self.options
    }

    pub fn module_loader(&self) -> Arc<dyn ModuleLoader> {
        Arc::clone(&self.modules)
    }

    fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn current_path(&self) -> &ScopePath {
        &self.current().path
    }

    /// Opens a child of the current scope.
    pub fn push(&mut self, kind: ScopeKind) {
        let parent = self.current_mut();
        let index = parent.children;
        parent.children += 1;

        let (is_async, in_loop, in_function) = match kind {
            ScopeKind::Function { is_async } => (is_async, false, true),
            ScopeKind::Loop => (parent.is_async, true, parent.in_function),
            ScopeKind::Block => (parent.is_async, parent.in_loop, parent.in_function),
        };
        let scope = Scope {
            path: parent.path.child(index),
            definitions: Definitions::new(),
            children: 0,
            is_async,
            in_loop,
            in_function,
        };
        self.scopes.push(scope);
    }

    /// Closes the current scope. The root is never popped.
    ///
    /// References to definitions of the closed scope are dropped: no later
    /// `set` can be affected by them.
    pub fn pop(&mut self) {
        if self.scopes.len() == 1 {
            return;
        }
        if let Some(scope) = self.scopes.pop() {
            self.references.retain(|_, references| {
                references.retain(|reference| reference.defined_at != scope.path);
                !references.is_empty()
            });
        }
    }

    /// Runs `f` in a new scope, popping it whether `f` succeeds or not.
    pub fn with_scope<T>(
        &mut self,
        kind: ScopeKind,
        f: impl FnOnce(&mut Env) -> Result<T, TranspileError>,
    ) -> Result<T, TranspileError> {
        self.push(kind);
        let result = f(self);
        self.pop();
        result
    }

    /// Defines `id` in the current scope.
    ///
    /// Fails if `id` was already used from here (or a scope nested here) and
    /// resolved to a definition further out, unless `writer` is a
    /// [`Writer::RecursiveConst`].
    pub fn set(&mut self, id: &str, writer: Writer) -> Result<(), TranspileError> {
        if !matches!(writer, Writer::RecursiveConst) && self.is_referred_as_outer(id) {
            return Err(TranspileError::new(format!(
                "No variable `{id}` is defined! NOTE: If you want to define `{id}` recursively, wrap the declaration(s) with `recursive`."
            )));
        }
        if self.scopes.len() == 1 {
            self.builtins.remove(id);
        }
        self.current_mut().definitions.insert(id.to_string(), writer);
        Ok(())
    }

    fn is_referred_as_outer(&self, id: &str) -> bool {
        let current = self.current_path();
        self.references.get(id).is_some_and(|references| {
            references.iter().any(|reference| {
                current.contains(&reference.referer) && reference.defined_at.is_ancestor_of(current)
            })
        })
    }

    fn lookup(&self, id: &str) -> Option<(usize, &Writer)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, scope)| scope.definitions.get(id).map(|writer| (idx, writer)))
    }

    /// Resolves `id` from the innermost scope outwards and logs the reference.
    pub fn refer_to(&mut self, id: &str) -> Result<Resolved, TranspileError> {
        let (scope_idx, writer) = self
            .lookup(id)
            .ok_or_else(|| TranspileError::new(format!("No variable `{}` is defined!", id)))?;
        let writer = writer.clone();
        let defined_at = self.scopes[scope_idx].path.clone();
        let is_builtin = scope_idx == 0 && self.builtins.contains(id);

        let reference = Reference {
            referer: self.current_path().clone(),
            defined_at: defined_at.clone(),
            id: id.to_string(),
        };
        self.references
            .entry(id.to_string())
            .or_default()
            .push(reference);

        Ok(Resolved {
            writer,
            defined_at,
            is_builtin,
        })
    }

    /// Resolves the head of `access`, then walks namespace members.
    ///
    /// Segments after the first non-namespace are plain JavaScript property
    /// reads and are not checked.
    pub fn refer_to_access(&mut self, access: &PropertyAccess) -> Result<Resolved, TranspileError> {
        let mut resolved = self.refer_to(access.head())?;
        let mut owner = access.head().to_string();
        for member in access.tail() {
            let Writer::Namespace(namespace) = &resolved.writer else {
                break;
            };
            let writer = namespace.member(member).cloned().ok_or_else(|| {
                TranspileError::new(format!("No member `{}` in namespace `{}`!", member, owner))
            })?;
            resolved.writer = writer;
            owner.push('.');
            owner.push_str(member);
        }
        Ok(resolved)
    }

    /// Like [`Env::refer_to`], without logging or failing.
    pub fn find(&self, id: &str) -> Option<&Writer> {
        self.lookup(id).map(|(_, writer)| writer)
    }

    /// Like [`Env::refer_to_access`], without logging or failing.
    pub fn find_access(&self, access: &PropertyAccess) -> Option<&Writer> {
        let mut writer = self.find(access.head())?;
        for member in access.tail() {
            match writer {
                Writer::Namespace(namespace) => writer = namespace.member(member)?,
                _ => break,
            }
        }
        Some(writer)
    }

    pub fn find_in_this_scope(&self, id: &str) -> Option<&Writer> {
        self.current().definitions.get(id)
    }

    pub fn is_defined_in_this_scope(&self, id: &str) -> bool {
        self.current().definitions.contains_key(id)
    }

    /// Every logged reference to `id`, oldest first.
    pub fn references(&self, id: &str) -> &[Reference] {
        self.references
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Drops the whole reference log once every scope is closed.
    ///
    /// Scopes opened later get fresh paths, so no logged reference can affect
    /// a later `set`. Returns false, keeping the log, inside a scope.
    pub fn forget_references(&mut self) -> bool {
        if !self.is_at_top_level() {
            return false;
        }
        self.references.clear();
        true
    }

    pub fn is_at_top_level(&self) -> bool {
        self.scopes.len() == 1
    }

    pub fn is_at_repl_top_level(&self) -> bool {
        self.options.mode == TranspileMode::Repl && self.is_at_top_level()
    }

    /// True if `resolved` must be read through `_cu$env.topLevelValues`.
    pub fn writer_is_at_repl_top_level(&self, resolved: &Resolved) -> bool {
        self.options.mode == TranspileMode::Repl
            && resolved.defined_at.is_root()
            && !resolved.is_builtin
    }

    pub fn is_inside_async_function(&self) -> bool {
        self.current().is_async
    }

    pub fn is_inside_loop(&self) -> bool {
        self.current().in_loop
    }

    pub fn is_inside_function(&self) -> bool {
        self.current().in_function
    }

    /// A fresh identifier for generated temporaries.
    pub fn tmp_var(&mut self) -> Id {
        let id = format!("_cu$tmp{}", self.tmp_vars);
        self.tmp_vars += 1;
        id
    }
}
