//! Execution of a validated container.
mod return_stack;
mod stack;

pub use primitives::{RETURN_STACK_LIMIT, STACK_LIMIT};
pub use return_stack::{ReturnFrame, ReturnStack};
pub use stack::Stack;

use crate::{ExecutionFault, Host, InstructionResult, Outcome};
use bytecode::{
    opcode,
    utils::{read_i16, read_u16},
    OpCode, ValidatedEof,
};
use log::{debug, trace};

/// Position of the running function, owned by one call context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionState {
    /// Index of the running code section.
    pub section: usize,
    /// Offset of the next instruction in the running section.
    pub pc: usize,
    /// Frames of the functions waiting for a `RETF`.
    pub return_stack: ReturnStack,
}

impl ExecutionState {
    /// Returns state at the start of the entry function.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Executes one instruction.
///
/// On [`Outcome::Abort`] the data stack is left as it was before the instruction
/// and the return stack is dropped.
pub fn step<H: Host + ?Sized>(
    state: &mut ExecutionState,
    stack: &mut Stack,
    eof: &ValidatedEof,
    host: &mut H,
) -> Outcome {
    match step_inner(state, stack, eof, host) {
        Ok(outcome) => outcome,
        Err(fault) => {
            debug!(
                "execution aborted at {} of section {}: {fault}",
                state.pc, state.section
            );
            state.return_stack.clear();
            Outcome::Abort(fault)
        }
    }
}

#[inline]
fn step_inner<H: Host + ?Sized>(
    state: &mut ExecutionState,
    stack: &mut Stack,
    eof: &ValidatedEof,
    host: &mut H,
) -> Result<Outcome, ExecutionFault> {
    let code = eof
        .code_slice(state.section)
        .ok_or(ExecutionFault::UnknownSection)?;
    let &byte = code.get(state.pc).ok_or(ExecutionFault::PcOutOfBounds)?;
    let op = OpCode::new_eof(byte).ok_or(ExecutionFault::OpcodeNotFound)?;

    let immediate_start = state.pc + 1;
    let next_pc = immediate_start + op.info().immediate_size() as usize;
    let immediate = code
        .get(immediate_start..next_pc)
        .ok_or(ExecutionFault::PcOutOfBounds)?;

    let stack_height = state.return_stack.stack_height();

    match byte {
        opcode::STOP => return Ok(Outcome::Halt(InstructionResult::Stop)),
        opcode::INVALID => return Err(ExecutionFault::InvalidFEOpcode),
        opcode::CALLF => {
            let section = read_u16(immediate).ok_or(ExecutionFault::PcOutOfBounds)? as usize;
            let types = eof.types(section).ok_or(ExecutionFault::UnknownSection)?;
            let inputs = types.inputs as usize;
            if stack.len() < stack_height + inputs {
                return Err(ExecutionFault::StackUnderflow);
            }
            state.return_stack.push(ReturnFrame::new(
                state.section,
                next_pc,
                stack.len() - inputs,
            ))?;
            trace!(
                "CALLF {} -> {section}, depth {}",
                state.section,
                state.return_stack.len()
            );
            state.section = section;
            state.pc = 0;
            return Ok(Outcome::Continue);
        }
        opcode::RETF => {
            let types = eof
                .types(state.section)
                .ok_or(ExecutionFault::UnknownSection)?;
            if stack.len() < stack_height + types.outputs as usize {
                return Err(ExecutionFault::StackUnderflow);
            }
            let frame = state
                .return_stack
                .pop()
                .ok_or(ExecutionFault::StackUnderflow)?;
            if state.return_stack.is_empty() {
                trace!("RETF out of the entry function");
                return Ok(Outcome::Halt(InstructionResult::Stop));
            }
            trace!("RETF {} -> {} at {}", state.section, frame.section, frame.pc);
            state.section = frame.section;
            state.pc = frame.pc;
            return Ok(Outcome::Continue);
        }
        opcode::RJUMP | opcode::RJUMPI => {
            let is_conditional = byte == opcode::RJUMPI;
            let mut is_taken = true;
            if is_conditional {
                if stack.len() < stack_height + 1 {
                    return Err(ExecutionFault::StackUnderflow);
                }
                is_taken = !stack.peek(0)?.is_zero();
            }

            let mut target = next_pc;
            if is_taken {
                let offset = read_i16(immediate).ok_or(ExecutionFault::PcOutOfBounds)?;
                target = usize::try_from(next_pc as isize + offset as isize)
                    .ok()
                    .filter(|target| {
                        eof.jump_table(state.section)
                            .is_some_and(|table| table.is_valid(*target))
                    })
                    .ok_or(ExecutionFault::InvalidJump)?;
                trace!("{op} {} -> {target}", state.pc);
            }

            if is_conditional {
                stack.pop()?;
            }
            state.pc = target;
            return Ok(Outcome::Continue);
        }
        _ => {}
    }

    if stack.len() < stack_height + op.inputs() as usize {
        return Err(ExecutionFault::StackUnderflow);
    }
    host.execute(op, immediate, stack)?;

    let result = match byte {
        opcode::RETURN => InstructionResult::Return,
        opcode::REVERT => InstructionResult::Revert,
        opcode::SELFDESTRUCT => InstructionResult::SelfDestruct,
        _ => {
            state.pc = next_pc;
            return Ok(Outcome::Continue);
        }
    };
    Ok(Outcome::Halt(result))
}

/// Interpreter of one call context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interpreter {
    /// Container being executed.
    pub eof: ValidatedEof,
    /// Position and return frames.
    pub state: ExecutionState,
    /// Data stack.
    pub stack: Stack,
}

impl Interpreter {
    /// Create new interpreter at the start of the entry function.
    pub fn new(eof: ValidatedEof) -> Self {
        Self {
            eof,
            state: ExecutionState::new(),
            stack: Stack::new(),
        }
    }

    /// Executes one instruction.
    #[inline]
    pub fn step<H: Host + ?Sized>(&mut self, host: &mut H) -> Outcome {
        step(&mut self.state, &mut self.stack, &self.eof, host)
    }

    /// Executes until the container halts or aborts.
    pub fn run<H: Host + ?Sized>(&mut self, host: &mut H) -> Outcome {
        loop {
            let outcome = self.step(host);
            if !outcome.is_continue() {
                return outcome;
            }
        }
    }

    /// Executes at most `max_steps` instructions.
    ///
    /// Returns [`Outcome::Continue`] if the limit was reached first.
    pub fn run_limited<H: Host + ?Sized>(&mut self, host: &mut H, max_steps: u64) -> Outcome {
        for _ in 0..max_steps {
            let outcome = self.step(host);
            if !outcome.is_continue() {
                return outcome;
            }
        }
        Outcome::Continue
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::DummyHost;
    use bytecode::{validate, EofBody, TypesSection};
    use primitives::{hex, U256};
    use rstest::rstest;

    fn container(types: &[(u8, u8)], codes: &[&[u8]]) -> ValidatedEof {
        let mut body = EofBody {
            version: 1,
            types_section: types.iter().map(|(i, o)| TypesSection::new(*i, *o)).collect(),
            ..Default::default()
        };
        let mut code = Vec::new();
        for section in codes {
            code.extend_from_slice(section);
            body.code_section.push(code.len());
        }
        body.code = code.into();
        validate(body.into_eof().raw).unwrap()
    }

    #[test]
    fn call_and_return() {
        // main: PUSH1 2, PUSH1 3, CALLF 1, STOP
        // f(2 -> 1): ADD, RETF
        let eof = container(&[(0, 0), (2, 1)], &[&hex!("60026003b0000100"), &hex!("01b1")]);
        let mut interpreter = Interpreter::new(eof);
        let mut host = DummyHost::default();

        for _ in 0..3 {
            assert_eq!(interpreter.step(&mut host), Outcome::Continue);
        }
        assert_eq!(interpreter.state.section, 1);
        assert_eq!(interpreter.state.pc, 0);
        assert_eq!(
            interpreter.state.return_stack.top(),
            Some(&ReturnFrame::new(0, 7, 0))
        );

        assert_eq!(
            interpreter.run(&mut host),
            Outcome::Halt(InstructionResult::Stop)
        );
        assert_eq!(interpreter.stack.data(), &[U256::from(5)]);
        assert_eq!(interpreter.state.section, 0);
        assert_eq!(interpreter.state.return_stack.len(), 1);
    }

    #[test]
    fn callee_with_too_few_arguments_aborts() {
        // main: PUSH1 1, CALLF 1, STOP
        // f(2 -> 0): POP, POP, RETF
        let eof = container(&[(0, 0), (2, 0)], &[&hex!("6001b0000100"), &hex!("5050b1")]);
        let mut interpreter = Interpreter::new(eof);
        let mut host = DummyHost::default();

        assert_eq!(interpreter.step(&mut host), Outcome::Continue);
        let before = interpreter.stack.clone();
        assert_eq!(
            interpreter.step(&mut host),
            Outcome::Abort(ExecutionFault::StackUnderflow)
        );
        assert_eq!(interpreter.stack, before);
        assert!(interpreter.state.return_stack.is_empty());
    }

    #[test]
    fn callee_cannot_read_below_its_frame() {
        // main: PUSH1 1, PUSH1 2, CALLF 1, STOP
        // f(1 -> 0): POP, POP, RETF
        let eof = container(&[(0, 0), (1, 0)], &[&hex!("60016002b0000100"), &hex!("5050b1")]);
        let mut interpreter = Interpreter::new(eof);
        let mut host = DummyHost::default();
        assert_eq!(
            interpreter.run(&mut host),
            Outcome::Abort(ExecutionFault::StackUnderflow)
        );
        assert_eq!(interpreter.state.section, 1);
        assert_eq!(interpreter.state.pc, 1);
        assert_eq!(interpreter.stack.data(), &[U256::from(1)]);
    }

    #[test]
    fn retf_requires_outputs_above_frame() {
        // main: PUSH1 1, CALLF 1, STOP
        // f(0 -> 1): RETF
        let eof = container(&[(0, 0), (0, 1)], &[&hex!("6001b0000100"), &hex!("b1")]);
        let mut interpreter = Interpreter::new(eof);
        assert_eq!(
            interpreter.run(&mut DummyHost::default()),
            Outcome::Abort(ExecutionFault::StackUnderflow)
        );
    }

    #[test]
    fn retf_from_entry_halts() {
        let eof = container(&[(0, 0)], &[&hex!("b1")]);
        let mut interpreter = Interpreter::new(eof);
        assert_eq!(
            interpreter.run(&mut DummyHost::default()),
            Outcome::Halt(InstructionResult::Stop)
        );
        assert!(interpreter.state.return_stack.is_empty());
    }

    #[test]
    fn recursion_hits_return_stack_limit() {
        // main: CALLF 0, STOP
        let eof = container(&[(0, 0)], &[&hex!("b0000000")]);
        let mut interpreter = Interpreter::new(eof);
        assert_eq!(
            interpreter.run(&mut DummyHost::default()),
            Outcome::Abort(ExecutionFault::ReturnStackOverflow)
        );
    }

    #[test]
    fn conditional_loop() {
        // PUSH1 3
        // loop: PUSH1 1, SWAP1, SUB, DUP1, RJUMPI loop
        // STOP
        let eof = container(&[(0, 0)], &[&hex!("600360019003805dfff800")]);
        let mut interpreter = Interpreter::new(eof);
        let mut host = DummyHost::default();
        assert_eq!(
            interpreter.run(&mut host),
            Outcome::Halt(InstructionResult::Stop)
        );
        assert_eq!(interpreter.stack.data(), &[U256::ZERO]);
        assert_eq!(interpreter.state.pc, 10);
    }

    #[rstest]
    #[case::stop(&hex!("00"), Outcome::Halt(InstructionResult::Stop))]
    #[case::ret(&hex!("5f5ff3"), Outcome::Halt(InstructionResult::Return))]
    #[case::revert(&hex!("5f5ffd"), Outcome::Halt(InstructionResult::Revert))]
    #[case::selfdestruct(&hex!("5fff"), Outcome::Halt(InstructionResult::SelfDestruct))]
    #[case::invalid(&hex!("fe"), Outcome::Abort(ExecutionFault::InvalidFEOpcode))]
    #[case::underflow(&hex!("5f0100"), Outcome::Abort(ExecutionFault::StackUnderflow))]
    fn terminating_instructions(#[case] code: &[u8], #[case] expected: Outcome) {
        let eof = container(&[(0, 0)], &[code]);
        let mut interpreter = Interpreter::new(eof);
        assert_eq!(interpreter.run(&mut DummyHost::default()), expected);
    }

    #[test]
    fn run_limited_stops_on_infinite_loop() {
        // RJUMP -3
        let eof = container(&[(0, 0)], &[&hex!("5cfffd")]);
        let mut interpreter = Interpreter::new(eof);
        assert_eq!(
            interpreter.run_limited(&mut DummyHost::default(), 100),
            Outcome::Continue
        );
        assert_eq!(interpreter.state.pc, 0);
    }
}
