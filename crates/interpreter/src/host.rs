//! Seam for the instructions the interpreter does not own.
mod dummy;

pub use dummy::DummyHost;

use crate::{ExecutionFault, Stack};
use bytecode::OpCode;

/// Executes every instruction that is not a control transfer.
///
/// The interpreter checks the stack inputs of `opcode` against the stack height
/// of the running function before calling the host, and halts after `RETURN`,
/// `REVERT` and `SELFDESTRUCT` returned.
pub trait Host {
    /// Executes `opcode` with its `immediate` bytes.
    ///
    /// On error the stack should be left as it was.
    fn execute(
        &mut self,
        opcode: OpCode,
        immediate: &[u8],
        stack: &mut Stack,
    ) -> Result<(), ExecutionFault>;
}

impl<H: Host + ?Sized> Host for &mut H {
    #[inline]
    fn execute(
        &mut self,
        opcode: OpCode,
        immediate: &[u8],
        stack: &mut Stack,
    ) -> Result<(), ExecutionFault> {
        (**self).execute(opcode, immediate, stack)
    }
}
