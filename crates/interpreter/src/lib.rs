//! # eof-interpreter
//!
//! Execution of validated EOF containers: function calls through a bounded
//! return stack, relative jumps and a [`Host`] for everything else.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod host;
mod instruction_result;
pub mod interpreter;

// Reexport primary types.
pub use bytecode;
pub use host::{DummyHost, Host};
pub use instruction_result::{ExecutionFault, InstructionResult, Outcome};
pub use interpreter::{
    step, ExecutionState, Interpreter, ReturnFrame, ReturnStack, Stack, RETURN_STACK_LIMIT,
    STACK_LIMIT,
};
pub use primitives;
