//! Two-pass assembler (spec.md §4.E): pass 1 collects labels and
//! assigns addresses, pass 2 resolves operands (including label
//! references) and encodes each line into a word. No partial program
//! is ever returned — either every line assembles or the first error
//! is reported with its source line number.

mod immediates;
mod pass1;
mod pass2;
mod registers;

use crate::error::AssembleError;

/// Assemble a full program's source text into the words that make up
/// its text segment, one `u32` per instruction in program order.
pub fn assemble(source: &str) -> Result<Vec<u32>, AssembleError> {
    let (symbols, lines) = pass1::run(source)?;
    pass2::run(&lines, &symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssembleErrorKind;

    #[test]
    fn assembles_add_two_constants() {
        let source = "\
            addi x1, x0, 10\n\
            addi x2, x0, 20\n\
            add x3, x1, x2\n\
            ecall\n\
        ";
        let words = assemble(source).unwrap();
        assert_eq!(words.len(), 4);
    }

    #[test]
    fn assembles_backward_branch_loop() {
        let source = "\
            addi x1, x0, 3\n\
            loop:\n\
            addi x1, x1, -1\n\
            bne x1, x0, loop\n\
            ecall\n\
        ";
        let words = assemble(source).unwrap();
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn stops_at_first_error_with_its_line_number() {
        let source = "addi x1, x0, 1\nbogus x2, x3\naddi x4, x0, 2\n";
        let err = assemble(source).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, AssembleErrorKind::UnknownMnemonic(_)));
    }

    #[test]
    fn empty_source_assembles_to_no_words() {
        assert_eq!(assemble("# just a comment\n").unwrap(), Vec::<u32>::new());
    }
}
