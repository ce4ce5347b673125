use super::{parse_hex, Error};
use bytecode::validate;
use clap::Parser;
use interpreter::{DummyHost, Interpreter, Outcome};

/// `run` subcommand.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Container bytes in hex
    #[arg(required = true)]
    input: String,
    /// Stop after this many instructions
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: u64,
}

impl Cmd {
    /// Runs run command.
    pub fn run(&self) -> Result<(), Error> {
        let raw = parse_hex(&self.input)?;
        let (outcome, interpreter) = execute(raw, self.max_steps)?;
        println!("{outcome:?}");
        for (depth, value) in interpreter.stack.data().iter().rev().enumerate() {
            println!("{depth:>4}: {value:#x}");
        }
        match outcome {
            Outcome::Halt(_) => Ok(()),
            Outcome::Abort(fault) => Err(fault.into()),
            Outcome::Continue => Err(Error::StepLimit(self.max_steps)),
        }
    }
}

/// Validates `raw` and executes it against a [`DummyHost`].
pub fn execute(raw: primitives::Bytes, max_steps: u64) -> Result<(Outcome, Interpreter), Error> {
    let eof = validate(raw)?;
    let mut host = DummyHost::default();
    let mut interpreter = Interpreter::new(eof);
    let outcome = interpreter.run_limited(&mut host, max_steps);
    log::debug!("executed {} host instruction(s)", host.trace.len());
    Ok((outcome, interpreter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use interpreter::{ExecutionFault, InstructionResult};
    use primitives::{bytes, U256};

    #[test]
    fn push_add_stop() {
        // PUSH1 2, PUSH1 3, ADD, STOP
        let (outcome, interpreter) =
            execute(bytes!("ef000101000600600260030100"), 100).unwrap();
        assert_eq!(outcome, Outcome::Halt(InstructionResult::Stop));
        assert_eq!(interpreter.stack.data(), &[U256::from(5)]);
    }

    #[test]
    fn invalid_aborts() {
        let (outcome, _) = execute(bytes!("ef000101000100fe"), 100).unwrap();
        assert_eq!(outcome, Outcome::Abort(ExecutionFault::InvalidFEOpcode));
    }

    #[test]
    fn endless_loop_hits_step_limit() {
        // RJUMP -3
        let (outcome, _) = execute(bytes!("ef0001010003005cfffd"), 10).unwrap();
        assert_eq!(outcome, Outcome::Continue);
    }

    #[test]
    fn minimal_container_stops_and_truncated_is_rejected() {
        assert!(matches!(
            execute(bytes!("ef00010100010000"), 10),
            Ok((Outcome::Halt(InstructionResult::Stop), _))
        ));
        assert!(matches!(execute(bytes!("ef00"), 10), Err(Error::Eof(_))));
    }
}
