//! The driver state machine (spec.md §4.F): owns memory, CPU state,
//! and the execution trace, and exposes `load`/`step`/`run`/`reset`
//! plus the `snapshot`/`read_memory`/`write_memory` introspection
//! surface (spec.md §6). Grounded on the `platform.step()`-in-a-loop
//! shape of `src/bin/emulate.rs`, reworked from a CLI loop into an
//! in-process state machine the CLI binaries drive from outside.

use std::collections::VecDeque;

use crate::assembler;
use crate::cpu::Cpu;
use crate::decode::{decode, Instr};
use crate::error::{ExecutionError, SimulatorError};
use crate::memory::{Memory, DEFAULT_SIZE};

/// Default number of instructions `run` executes before giving up and
/// reporting [`HaltReason::BudgetExhausted`] (spec.md §6).
pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 10_000;

/// Default number of trace entries retained; older entries are
/// dropped, matching the teacher's bounded-buffer treatment of
/// transient debug state (spec.md §3).
pub const DEFAULT_TRACE_RETENTION: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimState {
    Idle,
    Loaded,
    Running,
    Halted(HaltReason),
    Error,
}

/// Why a `Halted` transition happened (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    Ecall,
    Ebreak,
    RanOffEnd,
    BudgetExhausted,
}

/// One entry in the execution trace (spec.md §3): the PC the
/// instruction was fetched from, the raw word, its mnemonic, and any
/// register writes it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub pc: u32,
    pub word: u32,
    pub mnemonic: String,
    pub writes: Vec<(u8, u32, u32)>,
}

/// Observable state snapshot (spec.md §6's `snapshot()` shape).
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub pc: u32,
    pub registers: [u32; 32],
    pub halted: bool,
    pub instructions_executed: u64,
    pub recent_trace: Vec<TraceEntry>,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub snapshot: Snapshot,
    pub halt_reason: Option<HaltReason>,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub snapshot: Snapshot,
    pub halt_reason: Option<HaltReason>,
}

pub struct Simulator {
    cpu: Cpu,
    memory: Memory,
    state: SimState,
    program_len_bytes: u32,
    instructions_executed: u64,
    trace: VecDeque<TraceEntry>,
    trace_retention: usize,
    last_error: Option<ExecutionError>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_memory_size(DEFAULT_SIZE)
    }

    pub fn with_memory_size(memory_size: usize) -> Self {
        Self {
            cpu: Cpu::new(),
            memory: Memory::new(memory_size),
            state: SimState::Idle,
            program_len_bytes: 0,
            instructions_executed: 0,
            trace: VecDeque::new(),
            trace_retention: DEFAULT_TRACE_RETENTION,
            last_error: None,
        }
    }

    /// Assemble `text`, reset the CPU and memory, and place the
    /// resulting words at address 0 (spec.md §4.F's `Idle → Loaded`
    /// transition). No partial state survives a failed assemble.
    pub fn load(&mut self, text: &str) -> Result<(), SimulatorError> {
        let words = assembler::assemble(text)?;
        let size = self.memory.len();
        self.memory = Memory::new(size);
        for (index, word) in words.iter().enumerate() {
            self.memory.write_word((index * 4) as u32, *word)?;
        }
        self.cpu.reset();
        self.program_len_bytes = (words.len() * 4) as u32;
        self.instructions_executed = 0;
        self.trace.clear();
        self.last_error = None;
        self.state = SimState::Loaded;
        Ok(())
    }

    /// Back to `Idle`: no program loaded, CPU state cleared (spec.md
    /// §4.F's `Any → Idle` transition). Memory contents are dropped
    /// too, since `Idle` means nothing is installed to read.
    pub fn reset(&mut self) {
        let size = self.memory.len();
        self.memory = Memory::new(size);
        self.cpu.reset();
        self.state = SimState::Idle;
        self.program_len_bytes = 0;
        self.instructions_executed = 0;
        self.trace.clear();
        self.last_error = None;
    }

    fn ran_off_end(&self) -> bool {
        self.cpu.pc >= self.program_len_bytes
    }

    fn push_trace(&mut self, entry: TraceEntry) {
        self.trace.push_back(entry);
        while self.trace.len() > self.trace_retention {
            self.trace.pop_front();
        }
    }

    /// Execute exactly one instruction, appending a trace entry
    /// (spec.md §4.F). Returns the resulting snapshot and, if this
    /// step left `Running`, the reason why.
    pub fn step(&mut self) -> Result<StepResult, SimulatorError> {
        if matches!(self.state, SimState::Loaded | SimState::Running) {
            self.state = SimState::Running;
        }

        if self.ran_off_end() {
            self.state = SimState::Halted(HaltReason::RanOffEnd);
            return Ok(self.step_result(Some(HaltReason::RanOffEnd)));
        }

        let pc_before = self.cpu.pc;
        let fetch = self.memory.read_word(pc_before).and_then(|word| {
            decode(word, pc_before).map(|instr| (word, instr))
        });
        let (word, instr) = match fetch {
            Ok(pair) => pair,
            Err(err) => {
                self.state = SimState::Error;
                self.last_error = Some(err.clone());
                return Err(err.into());
            }
        };

        let write = match crate::exec::execute(&mut self.cpu, &mut self.memory, &instr) {
            Ok(write) => write,
            Err(err) => {
                self.state = SimState::Error;
                self.last_error = Some(err.clone());
                return Err(err.into());
            }
        };

        self.instructions_executed += 1;
        self.push_trace(TraceEntry {
            pc: pc_before,
            word,
            mnemonic: instr.mnemonic().to_string(),
            writes: write.into_iter().collect(),
        });

        let halt_reason = match instr {
            Instr::Ecall => Some(HaltReason::Ecall),
            Instr::Ebreak => Some(HaltReason::Ebreak),
            _ if self.ran_off_end() => Some(HaltReason::RanOffEnd),
            _ => None,
        };
        self.state = match halt_reason {
            Some(reason) => SimState::Halted(reason),
            None => SimState::Running,
        };

        Ok(self.step_result(halt_reason))
    }

    /// Step until leaving `Running`, up to `max_instructions` steps
    /// within this call (spec.md §4.F/§6).
    pub fn run(&mut self, max_instructions: u64) -> Result<RunResult, SimulatorError> {
        let mut executed_this_run = 0u64;
        loop {
            if matches!(self.state, SimState::Halted(_) | SimState::Error) {
                break;
            }
            if executed_this_run >= max_instructions {
                self.state = SimState::Halted(HaltReason::BudgetExhausted);
                break;
            }
            let result = self.step()?;
            executed_this_run += 1;
            if result.halt_reason.is_some() {
                break;
            }
        }
        Ok(RunResult {
            snapshot: self.snapshot(),
            halt_reason: self.current_halt_reason(),
        })
    }

    fn current_halt_reason(&self) -> Option<HaltReason> {
        match self.state {
            SimState::Halted(reason) => Some(reason),
            _ => None,
        }
    }

    fn step_result(&self, halt_reason: Option<HaltReason>) -> StepResult {
        StepResult {
            snapshot: self.snapshot(),
            halt_reason,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.cpu.pc,
            registers: std::array::from_fn(|i| self.cpu.registers.read(i as u8)),
            halted: matches!(self.state, SimState::Halted(_)),
            instructions_executed: self.instructions_executed,
            recent_trace: self.trace.iter().cloned().collect(),
        }
    }

    /// `true` once the driver is in `Error` state; the faulting error
    /// itself was already returned from the `step`/`run` call that
    /// caused it.
    pub fn is_error(&self) -> bool {
        matches!(self.state, SimState::Error)
    }

    pub fn last_error(&self) -> Option<&ExecutionError> {
        self.last_error.as_ref()
    }

    pub fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, ExecutionError> {
        self.memory.read_bytes(addr, len).map(|bytes| bytes.to_vec())
    }

    pub fn write_memory(&mut self, addr: u32, bytes: &[u8]) -> Result<(), ExecutionError> {
        self.memory.write_bytes(addr, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_add_two_constants() {
        let mut sim = Simulator::new();
        sim.load("addi x1, x0, 10\naddi x2, x0, 20\nadd x3, x1, x2\necall\n")
            .unwrap();
        let result = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        assert_eq!(result.halt_reason, Some(HaltReason::Ecall));
        assert_eq!(result.snapshot.registers[1], 10);
        assert_eq!(result.snapshot.registers[2], 20);
        assert_eq!(result.snapshot.registers[3], 30);
        assert_eq!(result.snapshot.pc, 16);
        assert!(result.snapshot.halted);
    }

    #[test]
    fn scenario_sign_extended_immediate() {
        let mut sim = Simulator::new();
        sim.load("addi x1, x0, -1\necall\n").unwrap();
        let result = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        assert_eq!(result.snapshot.registers[1], 0xFFFF_FFFF);
    }

    #[test]
    fn scenario_backward_branch_fibonacci() {
        // x10 = prev, x11 = curr (fib(n)), x12 = countdown counter
        // (reaches exactly 0 when the loop exits).
        let source = "\
            addi x10, x0, 0\n\
            addi x11, x0, 1\n\
            addi x12, x0, 10\n\
            loop:\n\
            add x13, x10, x11\n\
            addi x10, x11, 0\n\
            addi x11, x13, 0\n\
            addi x12, x12, -1\n\
            bne x12, x0, loop\n\
            ecall\n\
        ";
        let mut sim = Simulator::new();
        sim.load(source).unwrap();
        let result = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        assert_eq!(result.snapshot.registers[11], 89);
        assert_eq!(result.snapshot.registers[12], 0);
        assert!(result.snapshot.halted);
    }

    #[test]
    fn scenario_store_then_load_sign_extension() {
        let mut sim = Simulator::new();
        sim.load("addi x1, x0, -1\nsw x1, 0(x0)\nlb x2, 0(x0)\nlbu x3, 0(x0)\necall\n")
            .unwrap();
        let result = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        assert_eq!(result.snapshot.registers[2], 0xFFFF_FFFF);
        assert_eq!(result.snapshot.registers[3], 0x0000_00FF);
    }

    #[test]
    fn scenario_jal_link_register() {
        let mut sim = Simulator::new();
        sim.load("jal x1, target\naddi x0, x0, 0\naddi x0, x0, 0\ntarget:\necall\n")
            .unwrap();
        let result = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        assert_eq!(result.snapshot.registers[1], 4);
        assert!(result.snapshot.halted);
    }

    #[test]
    fn scenario_misaligned_load_is_an_error() {
        let mut sim = Simulator::new();
        sim.load("lw x1, 1(x0)\necall\n").unwrap();
        let err = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::Execution(ExecutionError::MemoryAlignment { addr: 1, width: 4 })
        ));
        assert!(sim.is_error());
    }

    #[test]
    fn run_off_end_of_program_halts_without_error() {
        let mut sim = Simulator::new();
        sim.load("addi x1, x0, 1\n").unwrap();
        let result = sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        assert_eq!(result.halt_reason, Some(HaltReason::RanOffEnd));
    }

    #[test]
    fn run_stops_at_instruction_budget() {
        let mut sim = Simulator::new();
        sim.load("loop:\naddi x1, x1, 1\nbeq x0, x0, loop\n").unwrap();
        let result = sim.run(5).unwrap();
        assert_eq!(result.halt_reason, Some(HaltReason::BudgetExhausted));
        assert_eq!(result.snapshot.instructions_executed, 5);
    }

    #[test]
    fn reset_returns_to_a_clean_slate() {
        let mut sim = Simulator::new();
        sim.load("addi x1, x0, 5\necall\n").unwrap();
        sim.run(DEFAULT_MAX_INSTRUCTIONS).unwrap();
        sim.reset();
        let snap = sim.snapshot();
        assert_eq!(snap.pc, 0);
        assert_eq!(snap.registers[1], 0);
        assert!(snap.recent_trace.is_empty());
    }

    #[test]
    fn trace_is_capped_at_retention_limit() {
        let mut sim = Simulator::new();
        sim.trace_retention = 3;
        sim.load("loop:\naddi x1, x1, 1\nbeq x0, x0, loop\n").unwrap();
        sim.run(10).unwrap();
        assert_eq!(sim.snapshot().recent_trace.len(), 3);
    }

    #[test]
    fn read_and_write_memory_round_trip() {
        let mut sim = Simulator::new();
        sim.load("ecall\n").unwrap();
        sim.write_memory(100, &[1, 2, 3, 4]).unwrap();
        assert_eq!(sim.read_memory(100, 4).unwrap(), vec![1, 2, 3, 4]);
    }
}
