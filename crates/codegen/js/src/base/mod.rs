//! Builtin writers.
//!
//! Every construct of the language, from `plusF` to `while`, is an ordinary
//! [`Writer`] registered in the root scope. [`library`] returns the full set.

mod asynchronous;
mod iteration;
mod module;
mod safe;

use rhizome_tendril_ir::{Form, KeyValue};

use crate::env::{Env, ScopeKind};
use crate::js::{JsModule, json_string, pseudo_top_level_assignment};
use crate::transpile::{is_non_expression_call, transpile_expression, transpile_statement};
use crate::writer::{Definitions, DirectWriter, Writer};
use crate::TranspileError;

/// All builtin writers, keyed by name.
pub fn library() -> Definitions {
    let mut definitions = Definitions::new();
    safe::register(&mut definitions);
    iteration::register(&mut definitions);
    asynchronous::register(&mut definitions);
    module::register(&mut definitions);
    definitions
}

fn insert(definitions: &mut Definitions, writer: DirectWriter) {
    definitions.insert(writer.name().to_string(), writer.into());
}

/// `(a op b)`
fn binary_operator(name: &'static str, op: &'static str) -> DirectWriter {
    DirectWriter::expression(name, move |env, args| {
        let [a, b] = args else {
            return Err(TranspileError::new(format!(
                "`{name}` must receive exactly two expressions!"
            )));
        };
        let a = transpile_expression(a, env)?;
        let b = transpile_expression(b, env)?;
        Ok(["(".into(), a, format!(" {op} ").into(), b, ")".into()]
            .into_iter()
            .collect())
    })
}

/// `op(a)`
fn unary_operator(name: &'static str, op: &'static str) -> DirectWriter {
    DirectWriter::expression(name, move |env, args| {
        let [a] = args else {
            return Err(TranspileError::new(format!(
                "`{name}` must receive exactly one expression!"
            )));
        };
        Ok(transpile_expression(a, env)?.wrap(&format!("{op}("), ")"))
    })
}

/// Fails if `form` calls a statement writer. `role` names the position.
fn ensure_expression(env: &Env, form: &Form, role: &str) -> Result<(), TranspileError> {
    if !is_non_expression_call(env, form) {
        return Ok(());
    }
    let head = form
        .as_call()
        .map(|(head, _)| head.to_string())
        .unwrap_or_default();
    Err(TranspileError::new(format!(
        "{role} must be an expression! But `{head}` is a statement!"
    )))
}

fn parameters(form: &Form) -> Result<&[Form], TranspileError> {
    match form {
        Form::List(items) | Form::LiteralArray(items) => Ok(items),
        other => Err(invalid_parameters(other)),
    }
}

fn invalid_parameters(form: &Form) -> TranspileError {
    TranspileError::new(format!(
        "Arguments for a function must be an array of symbols! But actually {form}"
    ))
}

/// An arrow function. With `returns_last`, the last form of `body` is
/// returned and must be an expression.
fn build_function(
    env: &mut Env,
    form_id: &str,
    params: &[Form],
    body: &[Form],
    is_async: bool,
    returns_last: bool,
) -> Result<JsModule, TranspileError> {
    if body.is_empty() {
        return Err(TranspileError::new(format!(
            "`{form_id}` must receive at least one expression!"
        )));
    }

    env.with_scope(ScopeKind::Function { is_async }, |env| {
        let mut names = Vec::with_capacity(params.len());
        for param in params {
            let Form::Symbol(symbol) = param else {
                return Err(invalid_parameters(&Form::List(params.to_vec())));
            };
            if env.is_defined_in_this_scope(symbol.as_str()) {
                return Err(TranspileError::new(format!(
                    "Parameter `{symbol}` is specified more than once in a `{form_id}`!"
                )));
            }
            env.set(symbol.as_str(), Writer::Var)?;
            names.push(symbol.as_str());
        }

        let prefix = if is_async { "async " } else { "" };
        let mut src = JsModule::from_body(format!("{prefix}({}) => {{\n", names.join(", ")));

        let (init, last) = match body.split_last() {
            Some((last, init)) if returns_last => (init, Some(last)),
            _ => (body, None),
        };
        for form in init {
            src.push_body("  ");
            src.push_statement(transpile_statement(form, env)?);
        }
        if let Some(last) = last {
            ensure_expression(env, last, &format!("The last statement in a `{form_id}`"))?;
            src.push_body("  return ");
            src.push_statement(transpile_expression(last, env)?);
        }
        src.push_body("}");
        Ok(src)
    })
}

/// `fn`, `procedure` and their async variants.
fn function_writer(name: &'static str, is_async: bool, returns_last: bool) -> DirectWriter {
    DirectWriter::expression(name, move |env, args| {
        let Some((params, body)) = args.split_first() else {
            return Err(TranspileError::new(format!(
                "`{name}` must receive a list of arguments!"
            )));
        };
        build_function(env, name, parameters(params)?, body, is_async, returns_last)
    })
}

/// An immediately invoked function, so the body gets its own scope.
fn scope_writer(name: &'static str, is_async: bool) -> DirectWriter {
    DirectWriter::expression(name, move |env, args| {
        Ok(build_function(env, name, &[], args, is_async, true)?.wrap("(", ")()"))
    })
}

/// Defines `id` in the current scope. Only a pending `recursive`
/// declaration may be redefined.
fn define(env: &mut Env, id: &str, writer: Writer) -> Result<(), TranspileError> {
    match env.find_in_this_scope(id) {
        None | Some(Writer::RecursiveConst) => env.set(id, writer),
        Some(_) => Err(TranspileError::new(format!(
            "Variable {} is already defined!",
            json_string(id)
        ))),
    }
}

fn invalid_assignee(form: &Form) -> TranspileError {
    TranspileError::new(format!(
        "`{form}` must be a symbol or key values of symbols!"
    ))
}

fn assignee_name<'a>(form_id: &str, value: &'a Form) -> Result<&'a str, TranspileError> {
    value.as_symbol().map(|symbol| symbol.as_str()).ok_or_else(|| {
        TranspileError::new(format!(
            "`{form_id}`'s assignee must be a symbol, but `{value}` is not!"
        ))
    })
}

/// The left-hand side of a declaration: a symbol or a destructuring
/// pattern. Defines every name it binds.
fn declare(
    form_id: &str,
    env: &mut Env,
    assignee: &Form,
    writer: &Writer,
) -> Result<JsModule, TranspileError> {
    let entries = match assignee {
        Form::Symbol(symbol) => {
            define(env, symbol.as_str(), writer.clone())?;
            return Ok(symbol.as_str().into());
        }
        Form::KeyValues(entries) => entries,
        other => return Err(invalid_assignee(other)),
    };

    let mut parts = Vec::with_capacity(entries.len());
    for entry in entries {
        let part = match entry {
            KeyValue::Shorthand(symbol) => {
                define(env, symbol.as_str(), writer.clone())?;
                JsModule::from_body(symbol.as_str())
            }
            KeyValue::Pair { key, value } => {
                let key_src = match key {
                    Form::Symbol(symbol) => JsModule::from_body(symbol.as_str()),
                    key => transpile_expression(key, env)?,
                };
                let name = assignee_name(form_id, value)?;
                define(env, name, writer.clone())?;
                [key_src, format!(": {name}").into()].into_iter().collect()
            }
        };
        parts.push(part);
    }
    Ok(JsModule::join(parts, ", ").wrap("{", "}"))
}

/// A declaration at the REPL top level: every bound name is stored in
/// `_cu$env.topLevelValues`. Destructuring goes through a temporary.
fn declare_at_repl_top_level(
    form_id: &str,
    env: &mut Env,
    assignee: &Form,
    exp: JsModule,
    writer: &Writer,
) -> Result<JsModule, TranspileError> {
    let entries = match assignee {
        Form::Symbol(symbol) => {
            define(env, symbol.as_str(), writer.clone())?;
            return Ok(pseudo_top_level_assignment(symbol.as_str(), exp));
        }
        Form::KeyValues(entries) => entries,
        other => return Err(invalid_assignee(other)),
    };

    let tmp = env.tmp_var();
    let mut statements = vec![exp.wrap(&format!("const {tmp} = "), "")];
    for entry in entries {
        let (name, read) = match entry {
            KeyValue::Shorthand(symbol) => (
                symbol.as_str(),
                JsModule::from_body(format!("{tmp}.{symbol}")),
            ),
            KeyValue::Pair { key, value } => {
                let read = match key {
                    Form::Symbol(symbol) => JsModule::from_body(format!("{tmp}.{symbol}")),
                    Form::String(s) => JsModule::from_body(format!("{tmp}[{}]", json_string(s))),
                    // A computed key is already bracketed.
                    key @ Form::LiteralArray(_) => transpile_expression(key, env)?.wrap(&tmp, ""),
                    key => transpile_expression(key, env)?.wrap(&format!("{tmp}["), "]"),
                };
                (assignee_name(form_id, value)?, read)
            }
        };
        define(env, name, writer.clone())?;
        statements.push(pseudo_top_level_assignment(name, read));
    }
    Ok(JsModule::join(statements, ";\n"))
}
