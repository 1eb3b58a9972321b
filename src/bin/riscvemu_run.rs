//! Assemble, load, and run a program to completion, optionally
//! single-stepping interactively (spec.md §6). Grounded on the
//! debug/step loop of `src/bin/emulate.rs`, with `press_enter_to_continue`
//! upgraded to a `rustyline` prompt since the crate already depends on it.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap_num::maybe_hex;
use rustyline::DefaultEditor;

use riscvemu::simulator::{Simulator, DEFAULT_MAX_INSTRUCTIONS};

/// Assemble and run an RV32I program
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the assembly source file
    input: PathBuf,

    /// Single-step through each instruction, printing the trace entry
    /// and any changed registers after each step
    #[arg(short, long)]
    debug: bool,

    /// Stop instruction-by-instruction once the PC reaches this
    /// address (use 0x prefix for hexadecimal)
    #[arg(short, long, value_parser=maybe_hex::<u32>)]
    break_pc: Option<u32>,

    /// Maximum number of instructions `run` executes before giving up
    #[arg(short, long, default_value_t = DEFAULT_MAX_INSTRUCTIONS)]
    max_instructions: u64,
}

fn print_snapshot(snapshot: &riscvemu::Snapshot) {
    println!("pc = 0x{:08x}", snapshot.pc);
    for (index, value) in snapshot.registers.iter().enumerate() {
        if *value != 0 {
            println!("  x{index} = 0x{value:08x}");
        }
    }
    println!("instructions executed: {}", snapshot.instructions_executed);
}

fn run_debug(sim: &mut Simulator, break_pc: Option<u32>) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("failed to start line editor: {err}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        let snapshot_before = sim.snapshot();
        if snapshot_before.halted {
            break;
        }
        if break_pc == Some(snapshot_before.pc) {
            println!("breakpoint hit at pc=0x{:08x}", snapshot_before.pc);
        }

        let step = match sim.step() {
            Ok(step) => step,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        };

        if let Some(entry) = step.snapshot.recent_trace.last() {
            println!("0x{:08x}: {:08x}  {}", entry.pc, entry.word, entry.mnemonic);
            for (reg, old, new) in &entry.writes {
                println!("  x{reg}: 0x{old:08x} -> 0x{new:08x}");
            }
        }

        if step.halt_reason.is_some() {
            break;
        }

        if editor.readline("(step) ").is_err() {
            break;
        }
    }

    print_snapshot(&sim.snapshot());
    ExitCode::SUCCESS
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

    let mut sim = Simulator::new();
    if let Err(err) = sim.load(&source) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    if args.debug || args.break_pc.is_some() {
        return run_debug(&mut sim, args.break_pc);
    }

    match sim.run(args.max_instructions) {
        Ok(result) => {
            print_snapshot(&result.snapshot);
            match result.halt_reason {
                Some(riscvemu::HaltReason::BudgetExhausted) => {
                    eprintln!("stopped: instruction budget exhausted");
                    ExitCode::FAILURE
                }
                _ => ExitCode::SUCCESS,
            }
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
