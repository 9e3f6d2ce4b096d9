//! What an identifier resolves to.

use rhizome_tendril_ir::{Form, Id};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{Env, JsModule, TranspileError};

/// Bindings of one scope or one namespace.
pub type Definitions = HashMap<Id, Writer>;

type WriteFn = dyn Fn(&mut Env, &[Form]) -> Result<JsModule, TranspileError> + Send + Sync;
type ComputeFn = dyn Fn(&Env) -> Result<JsModule, TranspileError> + Send + Sync;

/// The meaning of a bound identifier.
#[derive(Debug, Clone)]
pub enum Writer {
    /// Only legal inside the construct named by `companion`, like `else` in `if`.
    ContextualKeyword { companion: Id },
    /// Declared by `let` or a function parameter.
    Var,
    Const,
    /// A `const` inside `recursive` whose declaration has not finished yet.
    RecursiveConst,
    /// A syntax that receives its arguments unevaluated.
    Direct(DirectWriter),
    /// A function called with the runtime env as `this`.
    FunctionWithEnv,
    /// A value computed from the env when it is referenced.
    DynamicVar(DynamicVar),
    /// Members accessible through `name.member`; never callable itself.
    Namespace(Namespace),
}

impl Writer {
    pub fn contextual_keyword(companion: impl Into<Id>) -> Self {
        Writer::ContextualKeyword {
            companion: companion.into(),
        }
    }

    /// Short name of the variant, for messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Writer::ContextualKeyword { .. } => "contextual keyword",
            Writer::Var => "var",
            Writer::Const => "const",
            Writer::RecursiveConst => "recursive const",
            Writer::Direct(_) => "syntax",
            Writer::FunctionWithEnv => "function with env",
            Writer::DynamicVar(_) => "dynamic var",
            Writer::Namespace(_) => "namespace",
        }
    }
}

/// Whether a direct writer's output may appear where a value is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Expression,
    /// Declarations, loops and jumps. Rejected as the value of a function.
    Statement,
}

#[derive(Clone)]
pub struct DirectWriter {
    name: Id,
    syntax: Syntax,
    write: Arc<WriteFn>,
}

impl DirectWriter {
    pub fn new<F>(name: impl Into<Id>, syntax: Syntax, write: F) -> Self
    where
        F: Fn(&mut Env, &[Form]) -> Result<JsModule, TranspileError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            syntax,
            write: Arc::new(write),
        }
    }

    pub fn expression<F>(name: impl Into<Id>, write: F) -> Self
    where
        F: Fn(&mut Env, &[Form]) -> Result<JsModule, TranspileError> + Send + Sync + 'static,
    {
        Self::new(name, Syntax::Expression, write)
    }

    pub fn statement<F>(name: impl Into<Id>, write: F) -> Self
    where
        F: Fn(&mut Env, &[Form]) -> Result<JsModule, TranspileError> + Send + Sync + 'static,
    {
        Self::new(name, Syntax::Statement, write)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn write(&self, env: &mut Env, args: &[Form]) -> Result<JsModule, TranspileError> {
        (self.write)(env, args)
    }
}

impl fmt::Debug for DirectWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectWriter")
            .field("name", &self.name)
            .field("syntax", &self.syntax)
            .finish_non_exhaustive()
    }
}

impl From<DirectWriter> for Writer {
    fn from(writer: DirectWriter) -> Self {
        Writer::Direct(writer)
    }
}

#[derive(Clone)]
pub struct DynamicVar {
    name: Id,
    compute: Arc<ComputeFn>,
}

impl DynamicVar {
    pub fn new<F>(name: impl Into<Id>, compute: F) -> Self
    where
        F: Fn(&Env) -> Result<JsModule, TranspileError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compute: Arc::new(compute),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compute(&self, env: &Env) -> Result<JsModule, TranspileError> {
        (self.compute)(env)
    }
}

impl fmt::Debug for DynamicVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicVar")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl From<DynamicVar> for Writer {
    fn from(var: DynamicVar) -> Self {
        Writer::DynamicVar(var)
    }
}

/// An imported module.
#[derive(Debug, Clone)]
pub struct Namespace {
    /// Import path the members were loaded from.
    pub path: String,
    pub members: Arc<Definitions>,
}

impl Namespace {
    pub fn new(path: impl Into<String>, members: Definitions) -> Self {
        Self {
            path: path.into(),
            members: Arc::new(members),
        }
    }

    pub fn member(&self, id: &str) -> Option<&Writer> {
        self.members.get(id)
    }
}

impl From<Namespace> for Writer {
    fn from(namespace: Namespace) -> Self {
        Writer::Namespace(namespace)
    }
}
