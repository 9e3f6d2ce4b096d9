//! Tests for projects on disk: config, module loading and file compilation.

use std::sync::Arc;

use rhizome_tendril_runtime::{
    ContextPool, FsModuleLoader, ProjectConfig, RuntimeError, compile_source,
};
use rhizome_tendril_syntax_reader::read_form;

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "tendril.toml",
        r#"
implicit_statements = "(import base)"
js_top_levels = ["console"]

[modules]
base = "./lib/base.mjs"
a = "./lib/a.mjs"
"#,
    );
    write(
        dir.path(),
        "lib/base.mjs",
        "export function print(x) { console.log(x); }\n",
    );
    write(dir.path(), "lib/a.mjs", "export const a = \"Module A\";\n");
    dir
}

#[test]
fn test_compile_file() {
    let dir = project();
    let config = ProjectConfig::discover(dir.path()).unwrap().unwrap();
    let src_path = dir.path().join("main.cu");
    let provided = config.provided_symbols(src_path.display().to_string());

    let js = compile_source(
        "(import a) (base.print a.a)",
        &provided,
        Arc::new(FsModuleLoader::new(&config.root)),
    )
    .unwrap();

    assert_eq!(
        js.imports,
        "import * as base from \"./lib/base.mjs\";\nimport * as a from \"./lib/a.mjs\";\n"
    );
    assert_eq!(js.body, "base.print(a.a);\n");
}

#[test]
fn test_missing_member() {
    let dir = project();
    let config = ProjectConfig::discover(dir.path()).unwrap().unwrap();

    let err = compile_source(
        "(import a) a.b",
        &config.provided_symbols("main.cu"),
        Arc::new(FsModuleLoader::new(&config.root)),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "transpile error: No member `b` in namespace `a`!"
    );
}

#[test]
fn test_missing_module_file() {
    let dir = project();
    let mut config = ProjectConfig::discover(dir.path()).unwrap().unwrap();
    config
        .modules
        .insert("gone".to_string(), "./lib/gone.mjs".to_string());

    let err = compile_source(
        "(import gone)",
        &config.provided_symbols("main.cu"),
        Arc::new(FsModuleLoader::new(&config.root)),
    )
    .unwrap_err();
    let RuntimeError::Transpile(err) = err else {
        panic!("expected a transpile error");
    };
    assert!(err.message().starts_with("Failed to import `gone`: module not found"));
}

#[tokio::test]
async fn test_context_loads_relative_to_source() {
    let dir = project();
    let config = ProjectConfig::discover(dir.path()).unwrap().unwrap();
    // Imports resolve against the directory of `from`.
    let from = dir.path().join("repl.cu").display().to_string();

    let pool = ContextPool::new();
    let (id, implicit) = pool
        .init_context(config.provided_symbols(from))
        .await
        .unwrap();
    assert_eq!(
        implicit.imports,
        "import * as base from \"./lib/base.mjs\";\n"
    );

    let js = pool
        .eval_form(id, read_form("(base.print srcPath)").unwrap())
        .await
        .unwrap();
    assert!(js.body.starts_with("_cu$env.topLevelValues.get(\"base\").print(\""));
    assert!(js.body.ends_with("repl.cu\")"));
}
