//! Async functions and `await`.

use super::{function_writer, insert, scope_writer};
use crate::transpile::transpile_expression;
use crate::writer::{Definitions, DirectWriter};
use crate::TranspileError;

pub(super) fn register(definitions: &mut Definitions) {
    insert(definitions, function_writer("asyncFn", true, true));
    insert(definitions, function_writer("asyncProcedure", true, false));
    insert(definitions, scope_writer("asyncScope", true));
    insert(
        definitions,
        DirectWriter::expression("await", |env, args| {
            let [value] = args else {
                return Err(TranspileError::new(
                    "`await` must receive exactly one expression!",
                ));
            };
            if !env.is_inside_async_function() {
                return Err(TranspileError::new(
                    "`await` must be used inside an async function!",
                ));
            }
            Ok(transpile_expression(value, env)?.wrap("(await ", ")"))
        }),
    );
}
