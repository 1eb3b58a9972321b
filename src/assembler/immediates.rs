//! Immediate literal parsing: decimal, `0x` hex, `0b` binary (spec.md
//! §4.E), plus the per-format range checks.

use crate::error::AssembleErrorKind;

/// Parse a decimal, `0x`-hex, or `0b`-binary literal (optionally
/// sign-prefixed) into a signed 64-bit value, so range checks below
/// have room to reject out-of-range values cleanly rather than
/// wrapping.
pub fn parse_immediate(token: &str) -> Result<i64, AssembleErrorKind> {
    let (negative, unsigned_token) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let magnitude = if let Some(hex) = unsigned_token
        .strip_prefix("0x")
        .or_else(|| unsigned_token.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = unsigned_token
        .strip_prefix("0b")
        .or_else(|| unsigned_token.strip_prefix("0B"))
    {
        i64::from_str_radix(bin, 2)
    } else {
        unsigned_token.parse::<i64>()
    }
    .map_err(|_| AssembleErrorKind::SyntaxError(format!("not a valid immediate: '{token}'")))?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Check that `value` fits a signed field of `bits` bits, returning the
/// truncated `i32` on success.
pub fn check_signed_range(value: i64, bits: u32) -> Result<i32, AssembleErrorKind> {
    let half = 1i64 << (bits - 1);
    if value < -half || value >= half {
        return Err(AssembleErrorKind::ImmediateOutOfRange {
            value,
            bits,
            note: "",
        });
    }
    Ok(value as i32)
}

/// Check a branch/jump PC-relative offset: it must fit the signed
/// range for `bits` (13 for B-type, 21 for J-type) *and* be even (the
/// low bit is implicitly zero and not encoded).
pub fn check_branch_offset(value: i64, bits: u32) -> Result<i32, AssembleErrorKind> {
    if value % 2 != 0 {
        return Err(AssembleErrorKind::ImmediateOutOfRange {
            value,
            bits,
            note: " (must be a multiple of 2)",
        });
    }
    check_signed_range(value, bits)
}

/// Check a U-type upper immediate: the 20-bit value placed directly in
/// `imm[31:12]`.
pub fn check_upper_immediate(value: i64) -> Result<u32, AssembleErrorKind> {
    if !(0..=0xf_ffff).contains(&value) {
        return Err(AssembleErrorKind::ImmediateOutOfRange {
            value,
            bits: 20,
            note: "",
        });
    }
    Ok((value as u32) << 12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literals() {
        assert_eq!(parse_immediate("10").unwrap(), 10);
        assert_eq!(parse_immediate("-10").unwrap(), -10);
        assert_eq!(parse_immediate("+10").unwrap(), 10);
    }

    #[test]
    fn hex_and_binary_literals() {
        assert_eq!(parse_immediate("0xff").unwrap(), 255);
        assert_eq!(parse_immediate("0b1010").unwrap(), 10);
        assert_eq!(parse_immediate("-0x10").unwrap(), -16);
    }

    #[test]
    fn invalid_literal_is_rejected() {
        assert!(parse_immediate("abc").is_err());
    }

    #[test]
    fn signed_range_check() {
        assert_eq!(check_signed_range(2047, 12).unwrap(), 2047);
        assert_eq!(check_signed_range(-2048, 12).unwrap(), -2048);
        assert!(check_signed_range(2048, 12).is_err());
        assert!(check_signed_range(-2049, 12).is_err());
    }

    #[test]
    fn branch_offset_must_be_even() {
        assert!(check_branch_offset(3, 13).is_err());
        assert!(check_branch_offset(4, 13).is_ok());
    }
}
