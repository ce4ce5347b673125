use super::{decode_helpers::consume_u8, EofDecodeError};
use std::vec::Vec;

/// Types section entry that contains the stack signature of the matching code section.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, Copy, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypesSection {
    /// `inputs` - 1 byte
    ///
    /// Number of stack elements the code section consumes.
    pub inputs: u8,
    /// `outputs` - 1 byte
    ///
    /// Number of stack elements the code section returns.
    pub outputs: u8,
}

impl TypesSection {
    /// Size of one encoded entry in bytes.
    pub const SIZE: usize = 2;

    /// Returns new `TypesSection` with the given inputs and outputs.
    pub const fn new(inputs: u8, outputs: u8) -> Self {
        Self { inputs, outputs }
    }

    /// Returns `true` if this is the `(0, 0)` signature required for the entry function.
    #[inline]
    pub const fn is_entry_signature(&self) -> bool {
        self.inputs == 0 && self.outputs == 0
    }

    /// Calculates the difference between the number of input and output stack elements.
    #[inline]
    pub const fn io_diff(&self) -> i32 {
        self.outputs as i32 - self.inputs as i32
    }

    /// Encodes the section into the buffer.
    #[inline]
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.inputs);
        buffer.push(self.outputs);
    }

    /// Decodes the section from the input.
    #[inline]
    pub fn decode(input: &[u8]) -> Result<(Self, &[u8]), EofDecodeError> {
        let (input, inputs) = consume_u8(input).ok_or(EofDecodeError::MissingBody)?;
        let (input, outputs) = consume_u8(input).ok_or(EofDecodeError::MissingBody)?;
        Ok((Self { inputs, outputs }, input))
    }
}
