//! Form to JavaScript.

use rhizome_tendril_ir::{Form, KeyValue};

use crate::env::{Env, Resolved};
use crate::js::{
    CU_ENV, JsModule, json_string, pseudo_top_level_access, pseudo_top_level_reference,
};
use crate::writer::{Syntax, Writer};
use crate::TranspileError;

/// A symbol in head position together with what it resolved to.
struct Callee {
    name: String,
    writer: Writer,
}

pub fn transpile_statement(form: &Form, env: &mut Env) -> Result<JsModule, TranspileError> {
    transpile_expression(form, env)
}

/// Transpiles a form whose value is used.
pub fn transpile_expression(form: &Form, env: &mut Env) -> Result<JsModule, TranspileError> {
    let (src, callee) = transpile_operand(form, env)?;
    if let Some(callee) = callee {
        check_value(&callee)?;
    }
    Ok(src)
}

/// Each form as a statement terminated by `;` and a newline.
pub fn transpile_block(forms: &[Form], env: &mut Env) -> Result<JsModule, TranspileError> {
    let mut src = JsModule::new();
    for form in forms {
        src.push_statement(transpile_statement(form, env)?);
    }
    Ok(src)
}

pub fn transpile_join_with_comma(forms: &[Form], env: &mut Env) -> Result<JsModule, TranspileError> {
    let parts = forms
        .iter()
        .map(|form| transpile_expression(form, env))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(JsModule::join(parts, ","))
}

/// An object literal.
pub fn transpile_key_values(entries: &[KeyValue], env: &mut Env) -> Result<JsModule, TranspileError> {
    let mut parts = Vec::with_capacity(entries.len());
    for entry in entries {
        let part = match entry {
            KeyValue::Shorthand(symbol) => {
                let id = symbol.as_str();
                let resolved = env.refer_to(id)?;
                check_value(&Callee {
                    name: id.to_string(),
                    writer: resolved.writer.clone(),
                })?;
                if env.writer_is_at_repl_top_level(&resolved) {
                    JsModule::from_body(format!("{}: {}", id, pseudo_top_level_reference(id)))
                } else {
                    JsModule::from_body(id)
                }
            }
            KeyValue::Pair { key, value } => {
                let key_src = match key {
                    Form::Symbol(symbol) => JsModule::from_body(symbol.as_str()),
                    // `[expr]` doubles as JavaScript's computed key syntax.
                    key => transpile_expression(key, env)?,
                };
                let value_src = transpile_expression(value, env)?;
                [key_src, ": ".into(), value_src].into_iter().collect()
            }
        };
        parts.push(part);
    }
    Ok(JsModule::join(parts, ", ").wrap("{", "}"))
}

/// True if `form` calls a writer that produces a statement, such as
/// `const` or `while`.
pub fn is_non_expression_call(env: &Env, form: &Form) -> bool {
    let Some((head, _)) = form.as_call() else {
        return false;
    };
    let writer = match head {
        Form::Symbol(symbol) => env.find(symbol.as_str()),
        Form::PropertyAccess(access) => env.find_access(access),
        _ => None,
    };
    matches!(writer, Some(Writer::Direct(direct)) if direct.syntax() == Syntax::Statement)
}

/// Transpiles a form and, for symbols and property accesses, returns the
/// writer it resolved to so a caller in head position can dispatch on it.
fn transpile_operand(
    form: &Form,
    env: &mut Env,
) -> Result<(JsModule, Option<Callee>), TranspileError> {
    let src = match form {
        Form::List(items) => transpile_call(items, env)?,
        Form::Integer32(v) => JsModule::from_body(v.to_string()),
        Form::Float64(v) => JsModule::from_body(float_literal(*v)),
        Form::String(s) => JsModule::from_body(json_string(s)),
        Form::Bool(b) => JsModule::from_body(b.to_string()),
        Form::Undefined => JsModule::from_body("void 0"),
        Form::LiteralArray(items) => transpile_join_with_comma(items, env)?.wrap("[", "]"),
        Form::KeyValues(entries) => transpile_key_values(entries, env)?,
        Form::Symbol(symbol) => {
            let id = symbol.as_str();
            let resolved = env.refer_to(id)?;
            let src = reference_src(env, &resolved, || id.to_string(), || {
                pseudo_top_level_reference(id)
            })?;
            return Ok((src, Some(callee(id.to_string(), resolved))));
        }
        Form::PropertyAccess(access) => {
            let resolved = env.refer_to_access(access)?;
            let src = reference_src(env, &resolved, || access.to_string(), || {
                pseudo_top_level_access(access)
            })?;
            return Ok((src, Some(callee(access.to_string(), resolved))));
        }
    };
    Ok((src, None))
}

fn callee(name: String, resolved: Resolved) -> Callee {
    Callee {
        name,
        writer: resolved.writer,
    }
}

fn reference_src(
    env: &Env,
    resolved: &Resolved,
    plain: impl FnOnce() -> String,
    pseudo: impl FnOnce() -> String,
) -> Result<JsModule, TranspileError> {
    if let Writer::DynamicVar(var) = &resolved.writer {
        return var.compute(env);
    }
    if env.writer_is_at_repl_top_level(resolved) {
        Ok(JsModule::from_body(pseudo()))
    } else {
        Ok(JsModule::from_body(plain()))
    }
}

fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        v.to_string()
    }
}

/// Rejects writers that have no runtime value.
fn check_value(callee: &Callee) -> Result<(), TranspileError> {
    match &callee.writer {
        Writer::Direct(_) => Err(TranspileError::new(format!(
            "`{}` is a syntax; it can't be used as a value!",
            callee.name
        ))),
        Writer::ContextualKeyword { companion } => Err(TranspileError::new(format!(
            "`{}` must be used with `{}`!",
            callee.name, companion
        ))),
        _ => Ok(()),
    }
}

fn transpile_call(items: &[Form], env: &mut Env) -> Result<JsModule, TranspileError> {
    let (head, args) = items
        .split_first()
        .ok_or_else(|| TranspileError::new("Invalid function call: empty"))?;

    let (head_src, callee) = transpile_operand(head, env)?;
    let Some(callee) = callee else {
        let args_src = transpile_join_with_comma(args, env)?;
        return Ok([head_src.wrap("(", ")("), args_src, ")".into()]
            .into_iter()
            .collect());
    };

    match callee.writer {
        Writer::ContextualKeyword { companion } => Err(TranspileError::new(format!(
            "`{}` must be used with `{}`!",
            callee.name, companion
        ))),
        Writer::Namespace(_) => Err(TranspileError::new(format!(
            "`{}` is just a namespace. Doesn't represent a function!",
            callee.name
        ))),
        Writer::Var | Writer::Const | Writer::RecursiveConst | Writer::DynamicVar(_) => {
            let args_src = transpile_join_with_comma(args, env)?;
            Ok([head_src, "(".into(), args_src, ")".into()]
                .into_iter()
                .collect())
        }
        Writer::FunctionWithEnv => {
            let args_src = transpile_join_with_comma(args, env)?;
            let open = if args.is_empty() {
                format!(".call({}", CU_ENV)
            } else {
                format!(".call({},", CU_ENV)
            };
            Ok([head_src, open.into(), args_src, ")".into()]
                .into_iter()
                .collect())
        }
        Writer::Direct(direct) => direct.write(env, args),
    }
}
