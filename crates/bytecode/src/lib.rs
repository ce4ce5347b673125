//! Crate that contains EOF container types, opcode constants and the deploy-time validator.
//!
//! Only containers that passed [`validate`] can be wrapped in [`ValidatedEof`],
//! the form consumed by the interpreter.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod eof;
/// Iterator over EOF code sections.
pub mod iter;
pub mod opcode;
pub mod utils;

/// Re-export of bitvec crate, used to store the jump table.
pub use bitvec;
pub use eof::{
    analyze_code, is_container_formatted,
    verification::{
        check_code_references, validate, validate_eof_codes, validate_with_config,
    },
    CodeAnalysis, Eof, EofBody, EofConfig, EofDecodeError, EofError, EofHeader,
    EofValidationError, JumpTable, TypesSection, ValidatedEof, EOF_MAGIC, EOF_MAGIC_BYTES,
};
pub use iter::EofCodeIterator;
pub use opcode::OpCode;
