//! Crate-wide error taxonomy.
//!
//! Mirrors the shape used throughout the teacher's `hart` and
//! `trace_file` modules: one `thiserror::Error` enum per subsystem,
//! wrapped with enough context (source line, faulting PC) that a
//! caller never has to re-derive it from a bare message string.

use thiserror::Error;

/// A single kind of assemble-time failure (spec.md §7's taxonomy).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AssembleErrorKind {
    #[error("syntax error: {0}")]
    SyntaxError(String),
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("unknown label '{0}'")]
    UnknownLabel(String),
    #[error("label '{0}' is already defined")]
    DuplicateLabel(String),
    #[error("immediate {value} does not fit in {bits}-bit signed range{note}")]
    ImmediateOutOfRange {
        value: i64,
        bits: u32,
        note: &'static str,
    },
    #[error("expected {expected} operand(s), found {found}")]
    OperandCountMismatch { expected: usize, found: usize },
}

/// An [`AssembleErrorKind`] anchored to the 1-based source line it came
/// from. No partial program is ever installed when this is returned.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("line {line}: {kind}")]
pub struct AssembleError {
    pub line: usize,
    pub kind: AssembleErrorKind,
}

impl AssembleError {
    pub fn new(line: usize, kind: AssembleErrorKind) -> Self {
        Self { line, kind }
    }
}

/// A fault raised by the decoder or executor while running an already
/// assembled program. Distinct from [`AssembleError`]: this happens
/// during `step`/`run`, not during `assemble`/`load`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExecutionError {
    #[error("illegal instruction 0x{word:08x} at pc=0x{pc:08x}")]
    IllegalInstruction { pc: u32, word: u32 },
    #[error("memory access out of bounds at address 0x{addr:08x}")]
    MemoryBounds { addr: u32 },
    #[error("misaligned memory access at address 0x{addr:08x} (width {width} bytes)")]
    MemoryAlignment { addr: u32, width: u8 },
}

/// Wraps whichever of the two lower-level error types a [`crate::simulator::Simulator`]
/// call can fail with, the way the teacher's `TraceFileError` wraps a
/// lower-level I/O or parse cause with file-position context.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SimulatorError {
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
