pub mod print;
pub mod run;
pub mod suite;
pub mod validate;

use bytecode::EofError;
use clap::Parser;
use interpreter::ExecutionFault;
use primitives::Bytes;

/// Validate, print and run EOF containers.
#[derive(Parser, Debug)]
#[command(infer_subcommands = true)]
pub enum MainCmd {
    /// Validate a container given in hex
    Validate(validate::Cmd),
    /// Print the sections and instructions of a container or raw code given in hex
    Print(print::Cmd),
    /// Validate a container and execute it with a stack-only host
    Run(run::Cmd),
    /// Run JSON validation vectors from files or directories
    Suite(suite::Cmd),
}

/// Errors returned by the subcommands.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input is not valid hex.
    #[error("invalid hex input: {0}")]
    Hex(String),
    /// Container failed validation.
    #[error(transparent)]
    Eof(#[from] EofError),
    /// Execution aborted.
    #[error("execution aborted: {0}")]
    Execution(#[from] ExecutionFault),
    /// Execution was still running when the step budget ran out.
    #[error("execution did not halt after {0} steps")]
    StepLimit(u64),
    /// Some suite vectors did not match their expectation.
    #[error("{failed_test}/{total_tests} vectors failed")]
    Suite {
        /// Number of failed vectors.
        failed_test: usize,
        /// Number of vectors run.
        total_tests: usize,
    },
    /// Other error with a fixed message.
    #[error("{0}")]
    Custom(&'static str),
    /// Reading a test file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Test file is not a valid suite.
    #[error("{path}: {source}")]
    Json {
        /// Path of the test file.
        path: String,
        /// Parse error.
        source: serde_json::Error,
    },
}

impl MainCmd {
    /// Runs the selected subcommand.
    pub fn run(&self) -> Result<(), Error> {
        match self {
            Self::Validate(cmd) => cmd.run(),
            Self::Print(cmd) => cmd.run(),
            Self::Run(cmd) => cmd.run(),
            Self::Suite(cmd) => cmd.run(),
        }
    }
}

/// Parses hex input with an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Bytes, Error> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    primitives::hex::decode(trimmed)
        .map(Bytes::from)
        .map_err(|e| Error::Hex(e.to_string()))
}
