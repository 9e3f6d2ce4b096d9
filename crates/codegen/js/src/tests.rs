//! Tests for the transpiler and the builtin writers.

use super::*;
use rhizome_tendril_ir::Form;
use rhizome_tendril_syntax_reader::{read_block, read_form};
use std::sync::Arc;

fn env_with(options: TranspileOptions) -> Env {
    let mut builtins = base::library();
    builtins.insert("console".to_string(), Writer::Const);
    builtins.insert("g".to_string(), Writer::Const);
    builtins.insert("withEnv".to_string(), Writer::FunctionWithEnv);
    Env::new(builtins, options)
}

fn transpile_in(env: &mut Env, source: &str) -> Result<JsModule, TranspileError> {
    let block = read_block(source).expect("read failed");
    transpile_block(&block, env)
}

fn transpile(source: &str) -> Result<JsModule, TranspileError> {
    transpile_in(&mut env_with(TranspileOptions::default()), source)
}

fn assert_transpile(source: &str, expected: &str) {
    let result = transpile(source).expect("transpile failed");
    assert_eq!(result.body, expected, "source: {}", source);
}

fn assert_error(source: &str, message: &str) {
    let error = transpile(source).expect_err("transpile should fail");
    assert_eq!(error.message(), message, "source: {}", source);
}

#[test]
fn test_atoms() {
    assert_transpile(
        r#"(const a [1 -2 2.5 "s\n\"" true false none])"#,
        "const a = [1,-2,2.5,\"s\\n\\\"\",true,false,void 0];\n",
    );
}

#[test]
fn test_const_declaration() {
    assert_transpile("(const x 1)", "const x = 1;\n");
    assert_transpile("(let x 1) (assign x 2)", "let x = 1;\nx = 2;\n");
}

#[test]
fn test_already_defined() {
    assert_error("(const x 1) (const x 2)", "Variable \"x\" is already defined!");
    assert_error("(let x 1) (const x 2)", "Variable \"x\" is already defined!");
}

#[test]
fn test_declaration_arity_and_assignee() {
    assert_error("(const x)", "The number of arguments to `const` must be 2!");
    assert_error(
        "(let 1 2)",
        "`1` must be a symbol or key values of symbols!",
    );
}

#[test]
fn test_assign_requires_let() {
    assert_error(
        "(const x 1) (assign x 2)",
        "Variable \"x\" is NOT declared by `let`!",
    );
    assert_transpile(
        "(const o {}) (assign o.a 1)",
        "const o = {};\no.a = 1;\n",
    );
}

#[test]
fn test_undefined_variable() {
    assert_error("(f 1)", "No variable `f` is defined!");
    assert_error("(const x y)", "No variable `y` is defined!");
}

#[test]
fn test_value_is_resolved_before_its_name() {
    assert_error("(const x x)", "No variable `x` is defined!");
}

#[test]
fn test_empty_call() {
    assert_error("()", "Invalid function call: empty");
}

#[test]
fn test_operators() {
    assert_transpile(
        "(plusF 1 (timesF 2 3))",
        "(1 + (2 * 3));\n",
    );
    assert_transpile(
        "(not (and true (notEquals 1 2)))",
        "!((true && (1 !== 2)));\n",
    );
    assert_transpile("(isLessThanOrEquals 1 2)", "(1 <= 2);\n");
    assert_error("(plusF 1)", "`plusF` must receive exactly two expressions!");
}

#[test]
fn test_function() {
    assert_transpile(
        "(const f (fn (a b) (const c (plusF a b)) (timesF c 2)))",
        "const f = (a, b) => {\n  const c = (a + b);\n  return (c * 2);\n};\n",
    );
    assert_transpile(
        "((fn (x) x) 1)",
        "((x) => {\n  return x;\n})(1);\n",
    );
}

#[test]
fn test_function_errors() {
    assert_error("(fn (a))", "`fn` must receive at least one expression!");
    assert_error(
        "(fn (a 1) a)",
        "Arguments for a function must be an array of symbols! But actually (a 1)",
    );
    assert_error(
        "(fn (a a) a)",
        "Parameter `a` is specified more than once in a `fn`!",
    );
}

#[test]
fn test_last_statement_must_be_expression() {
    assert_error(
        "(fn () (while true (break)))",
        "The last statement in a `fn` must be an expression! But `while` is a statement!",
    );
    assert_error(
        "(scope (const x 1))",
        "The last statement in a `scope` must be an expression! But `const` is a statement!",
    );
}

#[test]
fn test_procedure_and_when() {
    assert_transpile(
        "(procedure (x) (when x (return 1)))",
        "(x) => {\n  if(x){\nreturn 1;\n};\n};\n",
    );
    assert_error("(when true)", "No statements given to a `when` statement!");
}

#[test]
fn test_return_outside_function() {
    assert_error("(return 1)", "`return` must be used inside a function!");
    assert_error(
        "(procedure () (return 1 2))",
        "`return` must receive at most one expression!",
    );
}

#[test]
fn test_scope() {
    assert_transpile(
        "(scope (const x 1) x)",
        "(() => {\n  const x = 1;\n  return x;\n})();\n",
    );
}

#[test]
fn test_if() {
    assert_transpile(
        "(const y (if true 1 else 2 3))",
        "const y = (true ? 1 : (2, 3));\n",
    );
    assert_error("(if true 1)", "`else` not specified for an `if` expression!");
    assert_error("(if true else 2)", "No expressions specified before `else`!");
    assert_error("(if true 1 else)", "No expressions specified after `else`!");
    assert_error(
        "(if true 1 else 2 else 3)",
        "`else` is specified more than once in an `if` expression!",
    );
}

#[test]
fn test_syntax_misuse() {
    assert_error("(else)", "`else` must be used with `if`!");
    assert_error("(const e else)", "`else` must be used with `if`!");
    assert_error("(const p if)", "`if` is a syntax; it can't be used as a value!");
}

#[test]
fn test_key_values() {
    assert_transpile(
        r#"(const x 1) (const o { x y: 2 "z w": 3 [x]: 4 })"#,
        "const x = 1;\nconst o = {x, y: 2, \"z w\": 3, [x]: 4};\n",
    );
}

#[test]
fn test_destructuring() {
    assert_transpile(
        "(const o {}) (const { a b: c } o)",
        "const o = {};\nconst {a, b: c} = o;\n",
    );
    assert_error(
        "(const o {}) (const { a: 1 } o)",
        "`const`'s assignee must be a symbol, but `1` is not!",
    );
}

#[test]
fn test_while() {
    assert_transpile(
        "(let i 0) (while (isLessThan i 3) (incrementF i))",
        "let i = 0;\nwhile((i < 3)){\ni++;\n};\n",
    );
    assert_error(
        "(while (const x 1) (break))",
        "The conditional expression in a `while` must be an expression! But `const` is a statement!",
    );
}

#[test]
fn test_for() {
    assert_transpile(
        "(for (let i 0) (isLessThan i 3) (decrementF i) (console.log i))",
        "for(let i = 0;(i < 3);i--){\nconsole.log(i);\n};\n",
    );
    assert_error(
        "(for (let i 0) (isLessThan i 3))",
        "No final expression given to a `for` statement!",
    );
}

#[test]
fn test_for_each() {
    assert_transpile(
        "(forEach x [1 2] (console.log x))",
        "for(const x of [1,2]){\nconsole.log(x);\n};\n",
    );
    assert_error(
        "(forEach x [1 2] (incrementF x))",
        "The argument to `incrementF` must be a name of a variable declared by `let`!",
    );
}

#[test]
fn test_loop_jumps() {
    assert_error("(break)", "`break` must be used inside a loop!");
    assert_error(
        "(while true (procedure () (continue)))",
        "`continue` must be used inside a loop!",
    );
    assert_transpile(
        "(while true (when false (continue)) (break))",
        "while(true){\nif(false){\ncontinue;\n};\nbreak;\n};\n",
    );
}

#[test]
fn test_recursive() {
    let source = "
        (recursive
          (const isEven (fn (n) (if (equals n 0) true else (isOdd (minusF n 1)))))
          (const isOdd (fn (n) (if (equals n 0) false else (isEven (minusF n 1))))))";
    assert_transpile(
        source,
        "const isEven = (n) => {\n  return ((n === 0) ? true : isOdd((n - 1)));\n};\n\
         const isOdd = (n) => {\n  return ((n === 0) ? false : isEven((n - 1)));\n};\n",
    );
}

#[test]
fn test_mutual_reference_requires_recursive() {
    assert_error(
        "(const isEven (fn (n) (isOdd n))) (const isOdd (fn (n) (isEven n)))",
        "No variable `isOdd` is defined!",
    );
    assert_error("(const f (fn (n) (f n)))", "No variable `f` is defined!");
    assert_transpile(
        "(recursive (const f (fn (n) (f n))))",
        "const f = (n) => {\n  return f(n);\n};\n",
    );
}

#[test]
fn test_recursive_errors() {
    assert_error("(recursive)", "No `const` statements given to `recursive`!");
    assert_error(
        "(recursive (let f 1))",
        "All declarations in `recursive` must be `const`!",
    );
    assert_error(
        "(recursive 1)",
        "All arguments in `recursive` must be `const` declarations!",
    );
}

#[test]
fn test_shadowing_after_use() {
    assert_error(
        "(const x 1) (scope (const y x) (const x 2) y)",
        "No variable `x` is defined! NOTE: If you want to define `x` recursively, wrap the declaration(s) with `recursive`.",
    );
    assert_transpile(
        "(const x 1) (scope (const x 2) x)",
        "const x = 1;\n(() => {\n  const x = 2;\n  return x;\n})();\n",
    );
}

#[test]
fn test_async() {
    assert_transpile(
        "(const f (asyncFn () (await (g))))",
        "const f = async () => {\n  return (await g());\n};\n",
    );
    assert_transpile(
        "(asyncScope (await 1))",
        "(async () => {\n  return (await 1);\n})();\n",
    );
    assert_transpile("(await 1)", "(await 1);\n");
    assert_error(
        "(fn () (await 1))",
        "`await` must be used inside an async function!",
    );
}

#[test]
fn test_function_with_env() {
    assert_transpile("(withEnv 1 2)", "withEnv.call(_cu$env,1,2);\n");
    assert_transpile("(withEnv)", "withEnv.call(_cu$env);\n");
}

#[test]
fn test_src_path() {
    let mut env = env_with(TranspileOptions::default().with_src_path("/src/main.tendril"));
    let js = transpile_in(&mut env, "(const p srcPath)").unwrap();
    assert_eq!(js.body, "const p = \"/src/main.tendril\";\n");
    assert_error(
        "srcPath",
        "`srcPath` is not available: the source path is unknown!",
    );
}

fn module_env(options: TranspileOptions) -> Env {
    let mut members = Definitions::new();
    members.insert("greet".to_string(), Writer::Const);
    let modules = StaticModules::new().with_module("./a.mjs", members);
    env_with(options.with_module("a", "./a.mjs")).with_module_loader(Arc::new(modules))
}

#[test]
fn test_import() {
    let mut env = module_env(TranspileOptions::default());
    let js = transpile_in(&mut env, r#"(import a) (a.greet "x")"#).unwrap();
    assert_eq!(js.imports, "import * as a from \"./a.mjs\";\n");
    assert_eq!(js.body, "a.greet(\"x\");\n");
    assert_eq!(
        js.to_source(),
        "import * as a from \"./a.mjs\";\na.greet(\"x\");\n"
    );
}

#[test]
fn test_import_errors() {
    let mut env = module_env(TranspileOptions::default());
    transpile_in(&mut env, "(import a)").unwrap();
    let error = transpile_in(&mut env, "(a.missing)").unwrap_err();
    assert_eq!(error.message(), "No member `missing` in namespace `a`!");
    let error = transpile_in(&mut env, "(a 1)").unwrap_err();
    assert_eq!(
        error.message(),
        "`a` is just a namespace. Doesn't represent a function!"
    );

    let mut env = module_env(TranspileOptions::default());
    let error = transpile_in(&mut env, "(scope (import a) 1)").unwrap_err();
    assert_eq!(error.message(), "`import` must be used at the top level!");
    let error = transpile_in(&mut env, "(import b)").unwrap_err();
    assert_eq!(
        error.message(),
        "No module `b` is registered in the module paths!"
    );

    let mut env = env_with(TranspileOptions::default().with_module("a", "./gone.mjs"));
    let error = transpile_in(&mut env, "(import a)").unwrap_err();
    assert_eq!(
        error.message(),
        "Failed to import `a`: module not found: ./gone.mjs"
    );
}

#[test]
fn test_repl_top_level_values() {
    let mut env = env_with(TranspileOptions::repl());
    let mut run = |source: &str| transpile_in(&mut env, source).unwrap().body;

    assert_eq!(run("(const x 1)"), "_cu$env.topLevelValues.set(\"x\", 1);\n");
    assert_eq!(
        run("(let y x)"),
        "_cu$env.topLevelValues.set(\"y\", _cu$env.topLevelValues.get(\"x\"));\n"
    );
    assert_eq!(
        run("(incrementF y)"),
        "_cu$env.topLevelValues.set(\"y\", _cu$env.topLevelValues.get(\"y\") + 1);\n"
    );
    assert_eq!(
        run("(assign y 5)"),
        "_cu$env.topLevelValues.set(\"y\", 5);\n"
    );
    assert_eq!(
        run("(const o { x })"),
        "_cu$env.topLevelValues.set(\"o\", {x: _cu$env.topLevelValues.get(\"x\")});\n"
    );
    assert_eq!(
        run("(const { a b: c } o)"),
        "const _cu$tmp0 = _cu$env.topLevelValues.get(\"o\");\n\
         _cu$env.topLevelValues.set(\"a\", _cu$tmp0.a);\n\
         _cu$env.topLevelValues.set(\"c\", _cu$tmp0.b);\n"
    );
    assert_eq!(
        run("(scope (const z x) z)"),
        "(() => {\n  const z = _cu$env.topLevelValues.get(\"x\");\n  return z;\n})();\n"
    );
    assert_eq!(run("(console.log 1)"), "console.log(1);\n");
}

#[test]
fn test_repl_destructuring_keys() {
    let mut env = env_with(TranspileOptions::repl());
    assert_eq!(
        transpile_in(&mut env, "(const {1: a} [10 20])").unwrap().body,
        "const _cu$tmp0 = [10,20];\n\
         _cu$env.topLevelValues.set(\"a\", _cu$tmp0[1]);\n"
    );
    assert_eq!(
        transpile_in(&mut env, "(const {\"k\": b [\"j\"]: c} {})")
            .unwrap()
            .body,
        "const _cu$tmp1 = {};\n\
         _cu$env.topLevelValues.set(\"b\", _cu$tmp1[\"k\"]);\n\
         _cu$env.topLevelValues.set(\"c\", _cu$tmp1[\"j\"]);\n"
    );

    let mut env = env_with(TranspileOptions::default());
    assert_eq!(
        transpile_in(&mut env, "(const {1: a} [10 20])").unwrap().body,
        "const {1: a} = [10,20];\n"
    );
}

#[test]
fn test_repl_import() {
    let mut env = module_env(TranspileOptions::repl());
    let js = transpile_in(&mut env, "(import a)").unwrap();
    assert_eq!(js.imports, "import * as a from \"./a.mjs\";\n");
    assert_eq!(js.body, "_cu$env.topLevelValues.set(\"a\", a);\n");

    let js = transpile_in(&mut env, "(a.greet 1)").unwrap();
    assert_eq!(js.body, "_cu$env.topLevelValues.get(\"a\").greet(1);\n");
}

#[test]
fn test_is_non_expression_call() {
    let env = env_with(TranspileOptions::default());
    let statement = read_form("(while true (break))").unwrap();
    let expression = read_form("(plusF 1 2)").unwrap();
    assert!(is_non_expression_call(&env, &statement));
    assert!(!is_non_expression_call(&env, &expression));
    assert!(!is_non_expression_call(&env, &Form::symbol("while")));
}

#[test]
fn test_transpile_is_idempotent_across_fresh_envs() {
    let source = "(const f (fn (a) (plusF a 1))) (let x (f 2)) (while (isLessThan x 10) (incrementF x))";
    let first = transpile(source).unwrap();
    let second = transpile(source).unwrap();
    assert_eq!(first, second);
}
