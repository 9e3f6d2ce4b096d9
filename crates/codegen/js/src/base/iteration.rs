//! Loops, jumps and `recursive`.

use rhizome_tendril_ir::Form;

use super::{declare, ensure_expression, insert};
use crate::env::ScopeKind;
use crate::js::{JsModule, json_string};
use crate::transpile::{transpile_block, transpile_expression, transpile_statement};
use crate::writer::{Definitions, DirectWriter, Writer};
use crate::TranspileError;

pub(super) fn register(definitions: &mut Definitions) {
    insert(definitions, while_statement());
    insert(definitions, for_statement());
    insert(definitions, for_each());
    insert(definitions, recursive());
    insert(definitions, jump("break"));
    insert(definitions, jump("continue"));
}

fn loop_body(header: JsModule, body: JsModule) -> JsModule {
    [header, "{\n".into(), body, "}".into()].into_iter().collect()
}

fn while_statement() -> DirectWriter {
    DirectWriter::statement("while", |env, args| {
        let Some((condition, body)) = args.split_first() else {
            return Err(TranspileError::new(
                "No conditional expression given to a `while` statement!",
            ));
        };
        ensure_expression(env, condition, "The conditional expression in a `while`")?;
        let condition = transpile_expression(condition, env)?;
        let body = env.with_scope(ScopeKind::Loop, |env| transpile_block(body, env))?;
        Ok(loop_body(condition.wrap("while(", ")"), body))
    })
}

fn for_statement() -> DirectWriter {
    DirectWriter::statement("for", |env, args| {
        let (init, condition, update, body) = match args {
            [] => {
                return Err(TranspileError::new(
                    "No initialization statement given to a `for` statement!",
                ));
            }
            [_] => {
                return Err(TranspileError::new(
                    "No conditional expression given to a `for` statement!",
                ));
            }
            [_, _] => {
                return Err(TranspileError::new(
                    "No final expression given to a `for` statement!",
                ));
            }
            [init, condition, update, body @ ..] => (init, condition, update, body),
        };

        env.with_scope(ScopeKind::Loop, |env| {
            ensure_expression(env, condition, "The conditional expression in a `for`")?;
            let header = [
                "for(".into(),
                transpile_statement(init, env)?,
                ";".into(),
                transpile_expression(condition, env)?,
                ";".into(),
                transpile_statement(update, env)?,
                ")".into(),
            ]
            .into_iter()
            .collect();
            let body = transpile_block(body, env)?;
            Ok(loop_body(header, body))
        })
    })
}

fn for_each() -> DirectWriter {
    DirectWriter::statement("forEach", |env, args| {
        let (assignee, iterable, body) = match args {
            [] => {
                return Err(TranspileError::new(
                    "No variable name given to a `forEach` statement!",
                ));
            }
            [_] => {
                return Err(TranspileError::new(
                    "No iterable expression given to a `forEach` statement!",
                ));
            }
            [assignee, iterable, body @ ..] => (assignee, iterable, body),
        };

        env.with_scope(ScopeKind::Loop, |env| {
            ensure_expression(env, iterable, "The iterable expression in a `forEach`")?;
            let iterable = transpile_expression(iterable, env)?;
            let assignee = declare("forEach", env, assignee, &Writer::Const)?;
            let header = [
                "for(const ".into(),
                assignee,
                " of ".into(),
                iterable,
                ")".into(),
            ]
            .into_iter()
            .collect();
            let body = transpile_block(body, env)?;
            Ok(loop_body(header, body))
        })
    })
}

/// Lets a group of `const` declarations refer to each other, and to
/// themselves, from inside functions.
fn recursive() -> DirectWriter {
    DirectWriter::statement("recursive", |env, args| {
        if args.is_empty() {
            return Err(TranspileError::new(
                "No `const` statements given to `recursive`!",
            ));
        }

        for statement in args {
            let Some((head, rest)) = statement.as_call() else {
                return Err(TranspileError::new(
                    "All arguments in `recursive` must be `const` declarations!",
                ));
            };
            let is_const = head.as_symbol().is_some_and(|symbol| {
                matches!(
                    env.find(symbol.as_str()),
                    Some(Writer::Direct(direct)) if direct.name() == "const"
                )
            });
            if !is_const {
                return Err(TranspileError::new(
                    "All declarations in `recursive` must be `const`!",
                ));
            }
            let id = match rest.first() {
                Some(Form::Symbol(symbol)) => symbol.as_str(),
                Some(other) => {
                    return Err(TranspileError::new(format!(
                        "`{other}` is not a symbol!"
                    )));
                }
                None => {
                    return Err(TranspileError::new(
                        "The number of arguments to `const` must be 2!",
                    ));
                }
            };
            if env.is_defined_in_this_scope(id) {
                return Err(TranspileError::new(format!(
                    "Variable {} is already defined!",
                    json_string(id)
                )));
            }
            env.set(id, Writer::RecursiveConst)?;
        }

        let members = args
            .iter()
            .map(|statement| transpile_statement(statement, env))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JsModule::join(members, ";\n"))
    })
}

/// `break` and `continue`.
fn jump(name: &'static str) -> DirectWriter {
    DirectWriter::statement(name, move |env, args| {
        if !args.is_empty() {
            return Err(TranspileError::new(format!(
                "`{name}` must receive no arguments!"
            )));
        }
        if !env.is_inside_loop() {
            return Err(TranspileError::new(format!(
                "`{name}` must be used inside a loop!"
            )));
        }
        Ok(name.into())
    })
}
