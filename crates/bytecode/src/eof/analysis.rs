//! Linear scan of a single EOF code section.
use super::EofValidationError;
use crate::{
    iter::EofCodeIterator,
    utils::{read_i16, read_u16},
};
use bitvec::vec::BitVec;
use core::fmt;
use log::debug;
use primitives::hex;
use std::{sync::Arc, vec::Vec};

/// Decoded instruction of a validated code section.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// Offset of the opcode in the code section.
    pub pc: usize,
    /// Opcode byte.
    pub opcode: u8,
    /// Number of immediate bytes after the opcode.
    pub immediate_size: u8,
}

/// `RJUMP` or `RJUMPI` with its resolved destination.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelativeJump {
    /// Offset of the jump opcode.
    pub pc: usize,
    /// Absolute destination inside the code section.
    pub target: usize,
}

/// `CALLF` and the code section it calls.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallReference {
    /// Offset of the `CALLF` opcode.
    pub pc: usize,
    /// Called code section index, not yet checked against the section count.
    pub section: u16,
}

impl CallReference {
    /// Returns `true` if `offset` is one of the two operand bytes of this call.
    #[inline]
    pub fn is_operand(&self, offset: usize) -> bool {
        offset == self.pc + 1 || offset == self.pc + 2
    }
}

/// A table of valid relative jump destinations.
///
/// One bit per byte of the code section, set for opcode bytes and cleared for
/// immediate and call operand bytes. Cheap to clone.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JumpTable {
    table: Arc<BitVec<u8>>,
}

impl fmt::Debug for JumpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JumpTable")
            .field("len", &self.len())
            .field("map", &hex::encode(self.table.as_raw_slice()))
            .finish()
    }
}

impl JumpTable {
    /// Create new JumpTable directly from an existing BitVec.
    #[inline]
    pub fn new(jumps: BitVec<u8>) -> Self {
        Self {
            table: Arc::new(jumps),
        }
    }

    /// Gets the length of the jump map.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the jump map is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Checks if `pc` is a valid jump destination.
    #[inline]
    pub fn is_valid(&self, pc: usize) -> bool {
        self.table.get(pc).is_some_and(|bit| *bit)
    }
}

/// Result of [`analyze_code`] for one code section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeAnalysis {
    /// Instructions tiling the section.
    pub instructions: Vec<Instruction>,
    /// Valid jump destinations.
    pub jump_table: JumpTable,
    /// Relative jumps in code order.
    pub relative_jumps: Vec<RelativeJump>,
    /// Function calls in code order.
    pub calls: Vec<CallReference>,
}

impl CodeAnalysis {
    /// Returns the call whose operand covers `offset`, if any.
    pub fn call_operand_at(&self, offset: usize) -> Option<&CallReference> {
        let idx = self
            .calls
            .partition_point(|call| call.pc + 2 < offset);
        self.calls.get(idx).filter(|call| call.is_operand(offset))
    }

    /// Returns the last instruction of the section.
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.instructions.last()
    }
}

/// Validates one code section in a single pass.
///
/// * Every opcode is defined for EOF code.
/// * Immediates fit inside the section.
/// * Relative jump destinations are inside the section.
/// * The last instruction is terminating.
///
/// Whether a jump lands on an immediate and whether a call references an
/// existing section is checked once all sections are analyzed.
pub fn analyze_code(code: &[u8]) -> Result<CodeAnalysis, EofValidationError> {
    let mut jumps: BitVec<u8> = BitVec::repeat(true, code.len());
    let mut analysis = CodeAnalysis::default();
    let mut is_terminated = false;

    for instruction in EofCodeIterator::new(code) {
        let pc = instruction.pc;
        let Some(op) = instruction.op() else {
            debug!(
                "undefined instruction 0x{:02x} at {pc}",
                instruction.opcode
            );
            return Err(EofValidationError::UndefinedInstruction);
        };

        if instruction.is_truncated() {
            debug!("truncated immediate of {op} at {pc}");
            return Err(EofValidationError::TruncatedImmediate);
        }

        // Mark immediate bytes as non-jumpable.
        let next_pc = instruction.next_pc();
        jumps[pc + 1..next_pc].fill(false);

        if op.is_relative_jump() {
            let Some(offset) = read_i16(instruction.immediate) else {
                return Err(EofValidationError::TruncatedImmediate);
            };
            let target = next_pc as isize + offset as isize;
            if target < 0 {
                debug!("{op} at {pc} jumps to {target}");
                return Err(EofValidationError::JumpUnderflow);
            }
            if target as usize >= code.len() {
                debug!("{op} at {pc} jumps to {target} past the section end");
                return Err(EofValidationError::JumpOverflow);
            }
            analysis.relative_jumps.push(RelativeJump {
                pc,
                target: target as usize,
            });
        } else if op.is_callf() {
            let Some(section) = read_u16(instruction.immediate) else {
                return Err(EofValidationError::TruncatedImmediate);
            };
            analysis.calls.push(CallReference { pc, section });
        }

        is_terminated = op.info().is_terminating();
        analysis.instructions.push(Instruction {
            pc,
            opcode: instruction.opcode,
            immediate_size: instruction.immediate.len() as u8,
        });
    }

    if !is_terminated {
        debug!("code section does not end with a terminating instruction");
        return Err(EofValidationError::MissingTerminatingInstruction);
    }

    analysis.jump_table = JumpTable::new(jumps);
    Ok(analysis)
}
