use crate::{ExecutionFault, Host, Stack};
use bytecode::{opcode, OpCode};
use primitives::U256;
use std::vec::Vec;

/// A dummy [Host] implementation.
///
/// Implements stack manipulation and basic arithmetic. Every other opcode pops
/// its inputs and pushes zeroes for its outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DummyHost {
    /// Opcodes executed by the host, in order.
    pub trace: Vec<OpCode>,
}

impl DummyHost {
    /// Clears the trace of the dummy host.
    #[inline]
    pub fn clear(&mut self) {
        self.trace.clear();
    }
}

impl Host for DummyHost {
    fn execute(
        &mut self,
        op: OpCode,
        immediate: &[u8],
        stack: &mut Stack,
    ) -> Result<(), ExecutionFault> {
        let code = op.get();
        match code {
            opcode::PUSH0..=opcode::PUSH32 => stack.push_slice(immediate)?,
            opcode::POP => {
                stack.pop()?;
            }
            opcode::DUP1..=opcode::DUP16 => stack.dup((code - opcode::DUP1 + 1) as usize)?,
            opcode::SWAP1..=opcode::SWAP16 => stack.swap((code - opcode::SWAP1 + 1) as usize)?,
            opcode::ADD => binary(stack, |a, b| a.wrapping_add(b))?,
            opcode::MUL => binary(stack, |a, b| a.wrapping_mul(b))?,
            opcode::SUB => binary(stack, |a, b| a.wrapping_sub(b))?,
            opcode::LT => binary(stack, |a, b| U256::from(a < b))?,
            opcode::GT => binary(stack, |a, b| U256::from(a > b))?,
            opcode::EQ => binary(stack, |a, b| U256::from(a == b))?,
            opcode::AND => binary(stack, |a, b| a & b)?,
            opcode::OR => binary(stack, |a, b| a | b)?,
            opcode::XOR => binary(stack, |a, b| a ^ b)?,
            opcode::ISZERO => {
                let [a] = stack.popn()?;
                stack.push(U256::from(a.is_zero()))?;
            }
            opcode::NOT => {
                let [a] = stack.popn()?;
                stack.push(!a)?;
            }
            _ => {
                let inputs = op.inputs() as usize;
                let outputs = op.outputs() as usize;
                if stack.len() < inputs {
                    return Err(ExecutionFault::StackUnderflow);
                }
                if !stack.has_space(outputs.saturating_sub(inputs)) {
                    return Err(ExecutionFault::StackOverflow);
                }
                stack.truncate(stack.len() - inputs);
                for _ in 0..outputs {
                    stack.push(U256::ZERO)?;
                }
            }
        }
        self.trace.push(op);
        Ok(())
    }
}

/// Pops `a` then `b` and pushes `f(a, b)`.
#[inline]
fn binary(stack: &mut Stack, f: impl FnOnce(U256, U256) -> U256) -> Result<(), ExecutionFault> {
    let [a, b] = stack.popn()?;
    stack.push(f(a, b))
}
