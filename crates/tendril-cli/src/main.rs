//! Tendril CLI entry point.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use rhizome_tendril_codegen_js::{JsModule, TranspileMode};
use rhizome_tendril_runtime::{
    Context, ContextPool, FsModuleLoader, ProjectConfig, compile_source,
};
use rhizome_tendril_syntax_reader::{ParseError, read_block};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tendril")]
#[command(about = "Tendril to JavaScript transpiler")]
struct Cli {
    /// Project config file (defaults to the nearest tendril.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transpile Tendril source files to JavaScript modules
    Transpile {
        /// Input file(s)
        #[arg(required = true)]
        files: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        out: Option<String>,

        /// Write to stdout instead of files
        #[arg(long)]
        stdout: bool,

        /// How top-level bindings are emitted (overrides the config)
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,
    },

    /// Parse a file and print its forms as JSON
    Read {
        /// Input file (or - for stdin)
        file: String,
    },

    /// Transpile input line by line, printing the JavaScript of each entry
    Repl,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Module,
    Repl,
}

impl From<Mode> for TranspileMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Module => TranspileMode::Module,
            Mode::Repl => TranspileMode::Repl,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tendril=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Transpile {
            files,
            out,
            stdout,
            mode,
        } => {
            let mode = mode.map(TranspileMode::from).unwrap_or(config.mode);
            for file in files {
                let source = std::fs::read_to_string(&file)?;
                let js = transpile_file(&config, &file, &source, mode)?;

                if stdout {
                    print!("{}", js);
                } else {
                    let out_path = output_path(&file, out.as_deref());
                    std::fs::write(&out_path, js.to_source())?;
                    println!("{} -> {}", file, out_path.display());
                }
            }
        }

        Commands::Read { file } => {
            let input = read_input(&file)?;
            let block = read_block(&input)?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }

        Commands::Repl => repl(&config).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::discover(&std::env::current_dir()?)?.unwrap_or_default(),
    };
    debug!("Using config rooted at {}", config.root.display());
    Ok(config)
}

fn read_input(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

fn transpile_file(
    config: &ProjectConfig,
    file: &str,
    source: &str,
    mode: TranspileMode,
) -> Result<JsModule, Box<dyn std::error::Error>> {
    let provided = config.provided_symbols(file);
    let loader = Arc::new(FsModuleLoader::new(&config.root));
    let js = match mode {
        TranspileMode::Module => compile_source(source, &provided, loader)?,
        TranspileMode::Repl => {
            let (mut context, mut js) = Context::new(&provided, loader)?;
            js.append(context.eval_source(source)?);
            js
        }
    };
    Ok(js)
}

/// `src/main.cu` becomes `src/main.mjs`, or `<out>/main.mjs` with an output
/// directory.
fn output_path(file: &str, out: Option<&str>) -> PathBuf {
    let path = Path::new(file).with_extension("mjs");
    match out {
        Some(dir) => Path::new(dir).join(path.file_name().unwrap_or_default()),
        None => path,
    }
}

/// Lines typed so far for one entry.
#[derive(Default)]
struct Entry {
    source: String,
}

impl Entry {
    /// Adds a line. Returns the complete source once it parses, `None` while
    /// forms are still open.
    fn push_line(&mut self, line: &str) -> Result<Option<String>, ParseError> {
        self.source.push_str(line);
        self.source.push('\n');
        match read_block(&self.source) {
            Ok(_) => Ok(Some(std::mem::take(&mut self.source))),
            Err(err) if err.is_unexpected_end() => Ok(None),
            Err(err) => {
                self.source.clear();
                Err(err)
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

async fn repl(config: &ProjectConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = ContextPool::with_loader(Arc::new(FsModuleLoader::new(&config.root)));
    let (id, implicit) = pool.init_context(config.provided_symbols("repl")).await?;
    info!("REPL context {} ready", id);
    if !implicit.is_empty() {
        print!("{}", implicit);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut entry = Entry::default();
    prompt(&entry)?;
    while let Some(line) = lines.next_line().await? {
        match entry.push_line(&line) {
            Ok(Some(source)) => {
                let block = read_block(&source)?;
                match pool.eval_block(id, block).await {
                    Ok(js) => print!("{}", js),
                    Err(err) => eprintln!("{}", err),
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("parse error: {}", err),
        }
        prompt(&entry)?;
    }

    pool.drop_context(id).await?;
    Ok(())
}

fn prompt(entry: &Entry) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", if entry.is_empty() { "> " } else { ". " })?;
    stdout.flush()
}
