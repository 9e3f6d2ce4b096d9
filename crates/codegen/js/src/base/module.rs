//! `import` and `srcPath`.

use rhizome_tendril_ir::Form;

use super::{define, insert};
use crate::js::{JsModule, json_string, pseudo_top_level_assignment};
use crate::writer::{Definitions, DirectWriter, DynamicVar, Namespace};
use crate::TranspileError;

pub(super) fn register(definitions: &mut Definitions) {
    insert(definitions, import());
    definitions.insert(
        "srcPath".to_string(),
        DynamicVar::new("srcPath", |env| {
            env.options()
                .src_path
                .as_deref()
                .map(|path| JsModule::from_body(json_string(path)))
                .ok_or_else(|| {
                    TranspileError::new("`srcPath` is not available: the source path is unknown!")
                })
        })
        .into(),
    );
}

/// `(import name)`: binds the module registered as `name` as a namespace.
fn import() -> DirectWriter {
    DirectWriter::statement("import", |env, args| {
        let [Form::Symbol(symbol)] = args else {
            return Err(TranspileError::new(
                "`import` must receive exactly one symbol!",
            ));
        };
        if !env.is_at_top_level() {
            return Err(TranspileError::new(
                "`import` must be used at the top level!",
            ));
        }

        let id = symbol.as_str();
        let path = env.options().module_paths.get(id).cloned().ok_or_else(|| {
            TranspileError::new(format!("No module `{id}` is registered in the module paths!"))
        })?;
        let members = env
            .module_loader()
            .load(&path)
            .map_err(|e| TranspileError::new(format!("Failed to import `{id}`: {e}")))?;
        define(env, id, Namespace::new(path.as_str(), members).into())?;

        let imports = format!("import * as {id} from {};\n", json_string(&path));
        let mut src = JsModule::from_imports(imports);
        if env.is_at_repl_top_level() {
            src.append(pseudo_top_level_assignment(id, id.into()));
        }
        Ok(src)
    })
}
