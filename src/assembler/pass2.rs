//! Pass 2: parse each instruction line's mnemonic and operands,
//! resolve any label operand, and encode into a 32-bit word (spec.md
//! §4.E). [`Instr`] is shared with [`crate::decode`] /
//! [`crate::encode`], so once an [`Instr`] is built here the bit
//! packing itself is just [`crate::encode::encode`].

use std::collections::HashMap;

use super::immediates::{check_branch_offset, check_signed_range, check_upper_immediate, parse_immediate};
use super::pass1::InstrLine;
use super::registers::parse_register;
use crate::decode::Instr;
use crate::encode::encode;
use crate::error::{AssembleError, AssembleErrorKind};

fn split_operands(rest: &str) -> Vec<&str> {
    if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|s| s.trim()).collect()
    }
}

fn check_count(found: usize, expected: usize) -> Result<(), AssembleErrorKind> {
    if found != expected {
        return Err(AssembleErrorKind::OperandCountMismatch { expected, found });
    }
    Ok(())
}

/// Parse `imm(reg)` memory operand syntax (spec.md §4.E).
fn parse_mem_operand(token: &str) -> Result<(&str, &str), AssembleErrorKind> {
    let open = token.find('(').ok_or_else(|| {
        AssembleErrorKind::SyntaxError(format!("expected 'imm(reg)', got '{token}'"))
    })?;
    if !token.ends_with(')') {
        return Err(AssembleErrorKind::SyntaxError(format!(
            "expected 'imm(reg)', got '{token}'"
        )));
    }
    let imm = token[..open].trim();
    let reg = token[open + 1..token.len() - 1].trim();
    let imm = if imm.is_empty() { "0" } else { imm };
    Ok((imm, reg))
}

/// Resolve a branch/jump target operand: either a label (PC-relative
/// offset computed against `current_addr`) or a literal immediate
/// offset, per spec.md §4.E.
fn resolve_target(
    token: &str,
    current_addr: u32,
    symbols: &HashMap<String, u32>,
    bits: u32,
) -> Result<i32, AssembleErrorKind> {
    let looks_numeric = matches!(token.as_bytes().first(), Some(b'+') | Some(b'-'))
        || token.chars().next().is_some_and(|c| c.is_ascii_digit());
    let offset = if looks_numeric {
        parse_immediate(token)?
    } else {
        match symbols.get(token) {
            Some(&target) => target as i64 - current_addr as i64,
            None => return Err(AssembleErrorKind::UnknownLabel(token.to_string())),
        }
    };
    check_branch_offset(offset, bits)
}

fn parse_instr(
    addr: u32,
    text: &str,
    symbols: &HashMap<String, u32>,
) -> Result<Instr, AssembleErrorKind> {
    let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r.trim()),
        None => (text, ""),
    };
    let mnemonic = mnemonic.to_ascii_lowercase();
    let ops = split_operands(rest);

    macro_rules! rtype {
        ($variant:ident) => {{
            check_count(ops.len(), 3)?;
            Ok(Instr::$variant {
                rd: parse_register(ops[0])?,
                rs1: parse_register(ops[1])?,
                rs2: parse_register(ops[2])?,
            })
        }};
    }

    macro_rules! itype {
        ($variant:ident) => {{
            check_count(ops.len(), 3)?;
            let rd = parse_register(ops[0])?;
            let rs1 = parse_register(ops[1])?;
            let imm = check_signed_range(parse_immediate(ops[2])?, 12)?;
            Ok(Instr::$variant { rd, rs1, imm })
        }};
    }

    macro_rules! shift_itype {
        ($variant:ident) => {{
            check_count(ops.len(), 3)?;
            let rd = parse_register(ops[0])?;
            let rs1 = parse_register(ops[1])?;
            let shamt = parse_immediate(ops[2])?;
            if !(0..=31).contains(&shamt) {
                return Err(AssembleErrorKind::ImmediateOutOfRange {
                    value: shamt,
                    bits: 5,
                    note: "",
                });
            }
            Ok(Instr::$variant {
                rd,
                rs1,
                shamt: shamt as u32,
            })
        }};
    }

    macro_rules! load {
        ($variant:ident) => {{
            check_count(ops.len(), 2)?;
            let rd = parse_register(ops[0])?;
            let (imm_tok, reg_tok) = parse_mem_operand(ops[1])?;
            let rs1 = parse_register(reg_tok)?;
            let imm = check_signed_range(parse_immediate(imm_tok)?, 12)?;
            Ok(Instr::$variant { rd, rs1, imm })
        }};
    }

    macro_rules! store {
        ($variant:ident) => {{
            check_count(ops.len(), 2)?;
            let rs2 = parse_register(ops[0])?;
            let (imm_tok, reg_tok) = parse_mem_operand(ops[1])?;
            let rs1 = parse_register(reg_tok)?;
            let imm = check_signed_range(parse_immediate(imm_tok)?, 12)?;
            Ok(Instr::$variant { rs1, rs2, imm })
        }};
    }

    macro_rules! branch {
        ($variant:ident) => {{
            check_count(ops.len(), 3)?;
            let rs1 = parse_register(ops[0])?;
            let rs2 = parse_register(ops[1])?;
            let imm = resolve_target(ops[2], addr, symbols, 13)?;
            Ok(Instr::$variant { rs1, rs2, imm })
        }};
    }

    match mnemonic.as_str() {
        "add" => rtype!(Add),
        "sub" => rtype!(Sub),
        "sll" => rtype!(Sll),
        "slt" => rtype!(Slt),
        "sltu" => rtype!(Sltu),
        "xor" => rtype!(Xor),
        "srl" => rtype!(Srl),
        "sra" => rtype!(Sra),
        "or" => rtype!(Or),
        "and" => rtype!(And),

        "addi" => itype!(Addi),
        "slti" => itype!(Slti),
        "sltiu" => itype!(Sltiu),
        "xori" => itype!(Xori),
        "ori" => itype!(Ori),
        "andi" => itype!(Andi),
        "slli" => shift_itype!(Slli),
        "srli" => shift_itype!(Srli),
        "srai" => shift_itype!(Srai),

        "lb" => load!(Lb),
        "lh" => load!(Lh),
        "lw" => load!(Lw),
        "lbu" => load!(Lbu),
        "lhu" => load!(Lhu),

        "sb" => store!(Sb),
        "sh" => store!(Sh),
        "sw" => store!(Sw),

        "beq" => branch!(Beq),
        "bne" => branch!(Bne),
        "blt" => branch!(Blt),
        "bge" => branch!(Bge),
        "bltu" => branch!(Bltu),
        "bgeu" => branch!(Bgeu),

        "jal" => {
            check_count(ops.len(), 2)?;
            let rd = parse_register(ops[0])?;
            let imm = resolve_target(ops[1], addr, symbols, 21)?;
            Ok(Instr::Jal { rd, imm })
        }
        "jalr" => {
            check_count(ops.len(), 2)?;
            let rd = parse_register(ops[0])?;
            let (imm_tok, reg_tok) = parse_mem_operand(ops[1])?;
            let rs1 = parse_register(reg_tok)?;
            let imm = check_signed_range(parse_immediate(imm_tok)?, 12)?;
            Ok(Instr::Jalr { rd, rs1, imm })
        }

        "lui" => {
            check_count(ops.len(), 2)?;
            let rd = parse_register(ops[0])?;
            let imm = check_upper_immediate(parse_immediate(ops[1])?)?;
            Ok(Instr::Lui { rd, imm })
        }
        "auipc" => {
            check_count(ops.len(), 2)?;
            let rd = parse_register(ops[0])?;
            let imm = check_upper_immediate(parse_immediate(ops[1])?)?;
            Ok(Instr::Auipc { rd, imm })
        }

        "ecall" => {
            check_count(ops.len(), 0)?;
            Ok(Instr::Ecall)
        }
        "ebreak" => {
            check_count(ops.len(), 0)?;
            Ok(Instr::Ebreak)
        }

        other => Err(AssembleErrorKind::UnknownMnemonic(other.to_string())),
    }
}

pub fn run(lines: &[InstrLine], symbols: &HashMap<String, u32>) -> Result<Vec<u32>, AssembleError> {
    lines
        .iter()
        .map(|line| {
            parse_instr(line.addr, &line.text, symbols)
                .map(|instr| encode(&instr))
                .map_err(|kind| AssembleError::new(line.line_no, kind))
        })
        .collect()
}
