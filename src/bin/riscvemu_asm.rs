//! Assemble a `.s` file into its encoded words (spec.md §6).

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

/// Assemble RV32I assembly text into encoded instruction words
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the assembly source file
    input: PathBuf,

    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: a hex word per line, or a raw little-endian binary
    #[arg(short, long, value_enum, default_value_t = Format::Words)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Words,
    Bin,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading {}: {err}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let words = match riscvemu::assembler::assemble(&source) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let rendered = match args.format {
        Format::Words => words
            .iter()
            .map(|word| format!("{word:08x}\n"))
            .collect::<String>()
            .into_bytes(),
        Format::Bin => words.iter().flat_map(|word| word.to_le_bytes()).collect(),
    };

    let result = match &args.output {
        Some(path) => fs::write(path, &rendered),
        None => std::io::stdout().write_all(&rendered),
    };

    if let Err(err) = result {
        eprintln!("error writing output: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
