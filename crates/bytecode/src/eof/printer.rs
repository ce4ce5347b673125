#![cfg(feature = "std")]
//! Human readable listing of EOF code.

use super::Eof;
use crate::{
    iter::EofCodeIterator,
    utils::{read_i16, read_u16},
};
use core::fmt;
use primitives::hex;

/// Listing of one code section, one line per instruction.
#[derive(Clone, Copy, Debug)]
pub struct CodeListing<'a>(pub &'a [u8]);

impl fmt::Display for CodeListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in EofCodeIterator::new(self.0) {
            let pc = instruction.pc;
            let Some(op) = instruction.op() else {
                writeln!(f, "{pc:04x}: Unknown opcode: 0x{:02X}", instruction.opcode)?;
                continue;
            };
            if instruction.is_truncated() {
                writeln!(f, "{pc:04x}: {op} Malformed code: immediate out of bounds")?;
                break;
            }

            write!(f, "{pc:04x}: {op}")?;
            if !instruction.immediate.is_empty() {
                write!(f, " 0x{}", hex::encode(instruction.immediate))?;
            }
            if op.is_relative_jump() {
                if let Some(offset) = read_i16(instruction.immediate) {
                    let target = instruction.next_pc() as isize + offset as isize;
                    write!(f, " ({offset:+} -> {target:04x})")?;
                }
            } else if op.is_callf() {
                if let Some(section) = read_u16(instruction.immediate) {
                    write!(f, " (section {section})")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Listing of a container: header summary followed by every section.
#[derive(Clone, Copy, Debug)]
pub struct EofListing<'a>(pub &'a Eof);

impl fmt::Display for EofListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eof = self.0;
        let header = &eof.header;
        writeln!(
            f,
            "version: {}, code sections: {}, data size: {}",
            header.version,
            header.code_sizes.len(),
            header.data_size
        )?;
        for idx in 0..eof.body.code_count() {
            let Some(code) = eof.body.code_slice(idx) else {
                break;
            };
            let types = eof.types(idx).copied().unwrap_or_default();
            writeln!(
                f,
                "code section {idx}: inputs {}, outputs {}, size {}",
                types.inputs,
                types.outputs,
                code.len()
            )?;
            fmt::Display::fmt(&CodeListing(code), f)?;
        }
        if !eof.body.data_section.is_empty() {
            writeln!(f, "data: 0x{}", hex::encode(&eof.body.data_section))?;
        }
        Ok(())
    }
}

/// Writes one line per instruction of a code section.
pub fn disassemble(code: &[u8]) -> String {
    CodeListing(code).to_string()
}

/// Writes the header summary followed by every section of the container.
pub fn disassemble_eof(eof: &Eof) -> String {
    EofListing(eof).to_string()
}

/// Prints the listing of a code section to stdout.
pub fn print(code: &[u8]) {
    print!("{}", CodeListing(code));
}

/// Prints the listing of a container to stdout.
pub fn print_eof(eof: &Eof) {
    print!("{}", EofListing(eof));
}
