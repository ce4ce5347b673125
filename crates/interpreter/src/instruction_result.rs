use core::fmt;

/// How a finished execution ended.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstructionResult {
    // success codes
    /// `STOP`, or `RETF` out of the entry function.
    Stop = 0x01,
    /// `RETURN`.
    Return,
    /// `SELFDESTRUCT`.
    SelfDestruct,

    // revert codes
    /// `REVERT`.
    Revert = 0x10,
}

impl InstructionResult {
    /// Returns whether the result is a success.
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Stop | Self::Return | Self::SelfDestruct)
    }

    /// Returns whether the result is a revert.
    #[inline]
    pub const fn is_revert(self) -> bool {
        matches!(self, Self::Revert)
    }
}

/// Faults that abort execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionFault {
    /// Instruction reads below the stack height of the current function.
    StackUnderflow,
    /// Data stack is over [`STACK_LIMIT`](crate::STACK_LIMIT).
    StackOverflow,
    /// Return stack is over [`RETURN_STACK_LIMIT`](crate::RETURN_STACK_LIMIT).
    ReturnStackOverflow,
    /// Relative jump destination is not an opcode of the current section.
    InvalidJump,
    /// Program counter or an immediate is past the end of the section.
    PcOutOfBounds,
    /// Opcode is not defined in EOF code.
    OpcodeNotFound,
    /// `INVALID` opcode.
    InvalidFEOpcode,
    /// Code section does not exist.
    UnknownSection,
    /// Host failed to execute an instruction.
    Host,
}

impl fmt::Display for ExecutionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StackUnderflow => "stack underflow",
            Self::StackOverflow => "stack overflow",
            Self::ReturnStackOverflow => "return stack overflow",
            Self::InvalidJump => "invalid jump destination",
            Self::PcOutOfBounds => "program counter out of bounds",
            Self::OpcodeNotFound => "opcode not found",
            Self::InvalidFEOpcode => "invalid opcode 0xFE",
            Self::UnknownSection => "unknown code section",
            Self::Host => "host error",
        };
        f.write_str(s)
    }
}

impl core::error::Error for ExecutionFault {}

/// Result of executing one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// Execution continues at the updated program counter.
    Continue,
    /// Execution ended.
    Halt(InstructionResult),
    /// Execution faulted, the return stack is dropped.
    Abort(ExecutionFault),
}

impl Outcome {
    /// Returns `true` if execution can continue.
    #[inline]
    pub const fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Returns `true` if execution halted successfully.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Halt(result) if result.is_ok())
    }
}

impl From<ExecutionFault> for Outcome {
    fn from(fault: ExecutionFault) -> Self {
        Self::Abort(fault)
    }
}

impl From<InstructionResult> for Outcome {
    fn from(result: InstructionResult) -> Self {
        Self::Halt(result)
    }
}
