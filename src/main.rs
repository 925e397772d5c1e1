// cminus: C- front end and MIPS code generator

use std::fmt::Write as _;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cminus::ast::dump::dump;
use cminus::codegen::{self, CodegenOptions};
use cminus::diagnostics::{render, DiagnosticManager, DiagnosticSink};
use cminus::parser::lexer::Scanner;
use cminus::source::SourceFile;

#[derive(Parser, Debug)]
#[command(name = "cminus", version)]
#[command(about = "Check C- programs and compile them to MIPS assembly")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// When to colour diagnostics
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every word of the input as (line,GROUP,"lexeme")
    Lex(Files),
    /// Check the input and print its syntax tree
    Parse(Files),
    /// Check the input and emit assembly for SPIM/MARS
    Codegen {
        #[command(flatten)]
        files: Files,

        /// Do not check array subscripts at run time
        #[arg(long)]
        no_bounds_checks: bool,
    },
}

impl Command {
    fn files(&self) -> &Files {
        match self {
            Command::Lex(files) | Command::Parse(files) => files,
            Command::Codegen { files, .. } => files,
        }
    }
}

#[derive(Args, Debug)]
struct Files {
    /// Source file, `-` for stdin
    input: PathBuf,

    /// Output file, `-` or omitted for stdout
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("cannot write '{path}': {source}")]
    Write { path: String, source: io::Error },

    #[error("{0} error(s) generated")]
    Failed(usize),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cminus=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        match e {
            CliError::Failed(_) => eprintln!("{}", e),
            _ => eprintln!("error: {}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let files = cli.command.files();
    let file = read_input(&files.input)?;
    let color = cli.color.enabled();

    let diags = DiagnosticManager::new();
    diags.handler(|diag| {
        eprintln!("{}", render::render(&file, diag, color));
        true
    });

    let output = match &cli.command {
        Command::Lex(_) => Some(lex(&file, &diags)),
        Command::Parse(_) => cminus::compile(file.text(), &diags)
            .ok()
            .map(|ast| dump(&ast)),
        Command::Codegen {
            no_bounds_checks, ..
        } => {
            let options = CodegenOptions {
                bounds_checks: !no_bounds_checks,
            };
            cminus::compile(file.text(), &diags)
                .ok()
                .filter(|_| !diags.has_errors())
                .map(|ast| codegen::generate(&ast, &options))
        }
    };

    if let Some(output) = output {
        write_output(files.output.as_deref(), &output)?;
    }

    tracing::debug!(diagnostics = diags.reported(), "done");
    if diags.has_errors() {
        return Err(CliError::Failed(diags.reported()));
    }
    Ok(())
}

fn lex(file: &SourceFile, diags: &dyn DiagnosticSink) -> String {
    let mut out = String::new();
    for word in Scanner::new(file.text(), diags).tokenize() {
        let line = file.location(word.location()).line;
        let _ = writeln!(
            out,
            "({},{},\"{}\")",
            line,
            word.category.group(),
            word.text(file.text())
        );
    }
    out
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<SourceFile, CliError> {
    let read_error = |source: io::Error| CliError::Read {
        path: path.display().to_string(),
        source,
    };

    if is_stdio(path) {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(read_error)?;
        Ok(SourceFile::new("<stdin>", text))
    } else {
        let text = fs::read_to_string(path).map_err(read_error)?;
        Ok(SourceFile::new(path.display().to_string(), text))
    }
}

fn write_output(path: Option<&Path>, output: &str) -> Result<(), CliError> {
    match path {
        Some(path) if !is_stdio(path) => fs::write(path, output).map_err(|source| CliError::Write {
            path: path.display().to_string(),
            source,
        }),
        _ => io::stdout()
            .write_all(output.as_bytes())
            .map_err(|source| CliError::Write {
                path: "<stdout>".to_string(),
                source,
            }),
    }
}
