//! Operators, declarations and non-looping control flow.

use rhizome_tendril_ir::Form;

use super::{
    binary_operator, declare, declare_at_repl_top_level, function_writer, insert,
    invalid_assignee, scope_writer, unary_operator,
};
use crate::env::{Env, ScopeKind};
use crate::js::{JsModule, json_string, pseudo_top_level_assignment, pseudo_top_level_reference};
use crate::transpile::{transpile_block, transpile_expression, transpile_join_with_comma};
use crate::writer::{Definitions, DirectWriter, Writer};
use crate::TranspileError;

pub(super) fn register(definitions: &mut Definitions) {
    for (name, op) in [
        ("plusF", "+"),
        ("minusF", "-"),
        ("timesF", "*"),
        ("dividedByF", "/"),
        ("equals", "==="),
        ("notEquals", "!=="),
        ("isLessThan", "<"),
        ("isLessThanOrEquals", "<="),
        ("isGreaterThan", ">"),
        ("isGreaterThanOrEquals", ">="),
        ("and", "&&"),
        ("or", "||"),
    ] {
        insert(definitions, binary_operator(name, op));
    }
    insert(definitions, unary_operator("not", "!"));

    insert(definitions, declaration("const", Writer::Const));
    insert(definitions, declaration("let", Writer::Var));
    insert(definitions, assign());

    insert(definitions, scope_writer("scope", false));
    insert(definitions, if_expression());
    definitions.insert("else".to_string(), Writer::contextual_keyword("if"));
    insert(definitions, when());

    insert(definitions, function_writer("fn", false, true));
    insert(definitions, function_writer("procedure", false, false));
    insert(definitions, return_statement());

    insert(definitions, mutation("incrementF", "+"));
    insert(definitions, mutation("decrementF", "-"));

    insert(
        definitions,
        DirectWriter::expression("array", |env, args| {
            Ok(transpile_join_with_comma(args, env)?.wrap("[", "]"))
        }),
    );
}

/// `const` and `let`.
fn declaration(name: &'static str, writer: Writer) -> DirectWriter {
    DirectWriter::statement(name, move |env, args| {
        let [assignee, value] = args else {
            return Err(TranspileError::new(format!(
                "The number of arguments to `{name}` must be 2!"
            )));
        };
        if !matches!(assignee, Form::Symbol(_) | Form::KeyValues(_)) {
            return Err(invalid_assignee(assignee));
        }

        // The value is resolved before the name exists.
        let exp = transpile_expression(value, env)?;
        if env.is_at_repl_top_level() {
            return declare_at_repl_top_level(name, env, assignee, exp, &writer);
        }
        let assignee = declare(name, env, assignee, &writer)?;
        Ok([format!("{name} ").into(), assignee, " = ".into(), exp]
            .into_iter()
            .collect())
    })
}

fn assign() -> DirectWriter {
    DirectWriter::expression("assign", |env, args| {
        let [target, value] = args else {
            return Err(TranspileError::new(
                "The number of arguments to `assign` must be 2!",
            ));
        };
        match target {
            Form::Symbol(symbol) => {
                let id = symbol.as_str();
                let resolved = env.refer_to(id)?;
                if !matches!(resolved.writer, Writer::Var) {
                    return Err(TranspileError::new(format!(
                        "Variable {} is NOT declared by `let`!",
                        json_string(id)
                    )));
                }
                let exp = transpile_expression(value, env)?;
                if env.writer_is_at_repl_top_level(&resolved) {
                    Ok(pseudo_top_level_assignment(id, exp))
                } else {
                    Ok(exp.wrap(&format!("{id} = "), ""))
                }
            }
            Form::PropertyAccess(_) => {
                let target = transpile_expression(target, env)?;
                let exp = transpile_expression(value, env)?;
                Ok([target, " = ".into(), exp].into_iter().collect())
            }
            other => Err(TranspileError::new(format!(
                "`{other}` can't be assigned to! Only a variable or a property can be."
            ))),
        }
    })
}

fn is_else(env: &Env, form: &Form) -> bool {
    form.as_symbol().is_some_and(|symbol| {
        matches!(
            env.find(symbol.as_str()),
            Some(Writer::ContextualKeyword { companion }) if companion == "if"
        )
    })
}

/// One arm of an `if`: a comma expression when it has several forms.
fn transpile_arm(forms: &[&Form], env: &mut Env) -> Result<JsModule, TranspileError> {
    env.with_scope(ScopeKind::Block, |env| {
        let parts = forms
            .iter()
            .map(|form| transpile_expression(form, env))
            .collect::<Result<Vec<_>, _>>()?;
        let joined = JsModule::join(parts, ", ");
        Ok(if forms.len() > 1 {
            joined.wrap("(", ")")
        } else {
            joined
        })
    })
}

fn if_expression() -> DirectWriter {
    DirectWriter::expression("if", |env, args| {
        let Some((condition, rest)) = args.split_first() else {
            return Err(TranspileError::new(
                "No expressions given to an `if` expression!",
            ));
        };
        let condition = transpile_expression(condition, env)?;

        let mut if_true = Vec::new();
        let mut if_false = Vec::new();
        let mut else_found = false;
        for form in rest {
            if is_else(env, form) {
                if else_found {
                    return Err(TranspileError::new(
                        "`else` is specified more than once in an `if` expression!",
                    ));
                }
                else_found = true;
            } else if else_found {
                if_false.push(form);
            } else {
                if_true.push(form);
            }
        }

        match (if_true.is_empty(), if_false.is_empty(), else_found) {
            (true, _, true) => Err("No expressions specified before `else`!"),
            (true, _, false) => Err("No expressions given to an `if` expression!"),
            (false, true, true) => Err("No expressions specified after `else`!"),
            (false, true, false) => Err("`else` not specified for an `if` expression!"),
            (false, false, _) => Ok(()),
        }
        .map_err(TranspileError::new)?;

        let if_true = transpile_arm(&if_true, env)?;
        let if_false = transpile_arm(&if_false, env)?;
        Ok([
            condition.wrap("(", " ? "),
            if_true,
            " : ".into(),
            if_false,
            ")".into(),
        ]
        .into_iter()
        .collect())
    })
}

fn when() -> DirectWriter {
    DirectWriter::statement("when", |env, args| {
        let Some((condition, body)) = args.split_first() else {
            return Err(TranspileError::new(
                "No expressions given to a `when` statement!",
            ));
        };
        if body.is_empty() {
            return Err(TranspileError::new(
                "No statements given to a `when` statement!",
            ));
        }
        let condition = transpile_expression(condition, env)?;
        let body = env.with_scope(ScopeKind::Block, |env| transpile_block(body, env))?;
        Ok([condition.wrap("if(", "){\n"), body, "}".into()]
            .into_iter()
            .collect())
    })
}

fn return_statement() -> DirectWriter {
    DirectWriter::statement("return", |env, args| {
        if !env.is_inside_function() {
            return Err(TranspileError::new(
                "`return` must be used inside a function!",
            ));
        }
        match args {
            [] => Ok("return".into()),
            [value] => Ok(transpile_expression(value, env)?.wrap("return ", "")),
            _ => Err(TranspileError::new(
                "`return` must receive at most one expression!",
            )),
        }
    })
}

/// `incrementF` and `decrementF`.
fn mutation(name: &'static str, op: &'static str) -> DirectWriter {
    DirectWriter::statement(name, move |env, args| {
        let [target] = args else {
            return Err(TranspileError::new(format!(
                "`{name}` must receive only one symbol!"
            )));
        };
        let Form::Symbol(symbol) = target else {
            return Err(TranspileError::new(format!(
                "The argument to `{name}` must be a name of a variable!"
            )));
        };
        let id = symbol.as_str();
        let resolved = env
            .refer_to(id)
            .ok()
            .filter(|resolved| matches!(resolved.writer, Writer::Var))
            .ok_or_else(|| {
                TranspileError::new(format!(
                    "The argument to `{name}` must be a name of a variable declared by `let`!"
                ))
            })?;

        if env.writer_is_at_repl_top_level(&resolved) {
            let exp = format!("{} {op} 1", pseudo_top_level_reference(id));
            Ok(pseudo_top_level_assignment(id, exp.into()))
        } else {
            Ok(format!("{id}{op}{op}").into())
        }
    })
}
