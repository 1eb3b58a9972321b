//! Register operand parsing: numeric (`x0`..`x31`) and ABI names.

use crate::error::AssembleErrorKind;

/// ABI register names in register-index order, `fp` being a second
/// name for `x8` handled separately below (spec.md §4.E).
const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Parse a register operand: `x0`..`x31`, an ABI name, or `fp` (an
/// alias for `s0`/`x8`).
pub fn parse_register(token: &str) -> Result<u8, AssembleErrorKind> {
    if token == "fp" {
        return Ok(8);
    }
    if let Some(digits) = token.strip_prefix('x') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = digits.parse::<u32>() {
                if n < 32 {
                    return Ok(n as u8);
                }
            }
        }
    }
    if let Some(index) = ABI_NAMES.iter().position(|&name| name == token) {
        return Ok(index as u8);
    }
    Err(AssembleErrorKind::UnknownRegister(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_names_resolve() {
        assert_eq!(parse_register("x0").unwrap(), 0);
        assert_eq!(parse_register("x31").unwrap(), 31);
    }

    #[test]
    fn abi_names_resolve() {
        assert_eq!(parse_register("zero").unwrap(), 0);
        assert_eq!(parse_register("ra").unwrap(), 1);
        assert_eq!(parse_register("sp").unwrap(), 2);
        assert_eq!(parse_register("a0").unwrap(), 10);
        assert_eq!(parse_register("t6").unwrap(), 31);
    }

    #[test]
    fn fp_aliases_s0() {
        assert_eq!(parse_register("fp").unwrap(), 8);
        assert_eq!(parse_register("s0").unwrap(), 8);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            parse_register("x32"),
            Err(AssembleErrorKind::UnknownRegister("x32".to_string()))
        );
        assert_eq!(
            parse_register("bogus"),
            Err(AssembleErrorKind::UnknownRegister("bogus".to_string()))
        );
    }

    #[test]
    fn register_names_are_case_sensitive() {
        assert!(parse_register("ZERO").is_err());
        assert!(parse_register("X0").is_err());
    }
}
