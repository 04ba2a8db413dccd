use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Emit {
    /// Three-address code
    Tac,
    /// Pseudo-x86 lowered from the three-address code
    Asm,
}

#[derive(Parser, Debug)]
#[command(name = "tacc", version, about)]
struct Cli {
    /// Source file, or `-` to read from stdin.
    input: PathBuf,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::Tac)]
    emit: Emit,

    /// Indent instructions inside labelled blocks (stdout only).
    #[arg(long)]
    pretty: bool,

    /// Print the final symbol table to stderr.
    #[arg(long)]
    symbols: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
            .context("reading source from stdin")
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("reading {}", input.display()))
    }
}

fn lines_to_text(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!(?cli, "starting");

    let source = read_source(&cli.input)?;
    let compilation = compiler::compile(&source)?;
    if cli.symbols {
        eprint!("{}", compilation.symbols);
    }

    let text = match cli.emit {
        Emit::Tac => compilation.tac(),
        Emit::Asm => lines_to_text(&compiler::asm::generate(&compilation.tac())?),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None if cli.pretty && cli.emit == Emit::Tac => {
            print!("{}", compilation.pretty())
        }
        None => print!("{text}"),
    }
    Ok(())
}
