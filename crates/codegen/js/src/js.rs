//! JavaScript output.

use rhizome_tendril_ir::PropertyAccess;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the runtime object that holds REPL top-level values.
pub const CU_ENV: &str = "_cu$env";

/// Transpiled JavaScript, kept as two accumulators.
///
/// Imports are hoisted out of nested constructs, so they are only joined
/// with the body when the whole unit is done (see [`JsModule::to_source`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsModule {
    pub imports: String,
    pub body: String,
}

impl JsModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            imports: String::new(),
            body: body.into(),
        }
    }

    pub fn from_imports(imports: impl Into<String>) -> Self {
        Self {
            imports: imports.into(),
            body: String::new(),
        }
    }

    /// Appends both accumulators of `other`.
    pub fn append(&mut self, other: JsModule) {
        self.imports.push_str(&other.imports);
        self.body.push_str(&other.body);
    }

    pub fn push_body(&mut self, src: &str) {
        self.body.push_str(src);
    }

    /// Appends `statement` followed by `;` and a newline. A statement with
    /// an empty body, such as a bare import, only contributes its imports.
    pub fn push_statement(&mut self, statement: JsModule) {
        let terminate = !statement.body.is_empty();
        self.append(statement);
        if terminate {
            self.body.push_str(";\n");
        }
    }

    /// Surrounds the body with `prefix` and `suffix`.
    pub fn wrap(mut self, prefix: &str, suffix: &str) -> Self {
        self.body = format!("{}{}{}", prefix, self.body, suffix);
        self
    }

    /// Concatenates modules, putting `separator` between the bodies.
    pub fn join(modules: impl IntoIterator<Item = JsModule>, separator: &str) -> Self {
        let mut joined = JsModule::new();
        for (idx, module) in modules.into_iter().enumerate() {
            if idx > 0 {
                joined.push_body(separator);
            }
            joined.append(module);
        }
        joined
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.body.is_empty()
    }

    /// Imports first, then the body.
    pub fn to_source(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for JsModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.imports, self.body)
    }
}

impl From<&str> for JsModule {
    fn from(body: &str) -> Self {
        Self::from_body(body)
    }
}

impl From<String> for JsModule {
    fn from(body: String) -> Self {
        Self::from_body(body)
    }
}

impl FromIterator<JsModule> for JsModule {
    fn from_iter<I: IntoIterator<Item = JsModule>>(iter: I) -> Self {
        Self::join(iter, "")
    }
}

impl Extend<JsModule> for JsModule {
    fn extend<I: IntoIterator<Item = JsModule>>(&mut self, iter: I) {
        for module in iter {
            self.append(module);
        }
    }
}

/// Quotes `value` as a JavaScript string literal.
pub fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// `_cu$env.topLevelValues.get("x")`
pub fn pseudo_top_level_reference(id: &str) -> String {
    format!("{}.topLevelValues.get({})", CU_ENV, json_string(id))
}

/// `_cu$env.topLevelValues.get("a").b.c`
pub fn pseudo_top_level_access(access: &PropertyAccess) -> String {
    format!(
        "{}.{}",
        pseudo_top_level_reference(access.head()),
        access.tail().join(".")
    )
}

/// `_cu$env.topLevelValues.set("x", exp)`
pub fn pseudo_top_level_assignment(id: &str, exp: JsModule) -> JsModule {
    let prefix = format!("{}.topLevelValues.set({}, ", CU_ENV, json_string(id));
    exp.wrap(&prefix, ")")
}
