mod test_suite;

pub use test_suite::{TestSuite, TestUnit, TestVector};

use crate::{cmd::Error, dir_utils::find_all_json_tests};
use bytecode::{validate, EofError};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// `suite` subcommand.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Json files or directories with validation vectors
    #[arg(required = true, num_args = 1..)]
    path: Vec<PathBuf>,
}

impl Cmd {
    /// Runs suite command.
    pub fn run(&self) -> Result<(), Error> {
        let mut summary = Summary::default();
        for path in &self.path {
            if !path.exists() {
                return Err(Error::Custom("The specified path does not exist"));
            }
            for test_file in find_all_json_tests(path) {
                let s = std::fs::read_to_string(&test_file)?;
                summary.merge(run_suite_str(&s).map_err(|source| Error::Json {
                    path: test_file.display().to_string(),
                    source,
                })?);
            }
        }
        summary.print();
        summary.into_result()
    }
}

/// Pass and failure counts of a suite run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of vectors run.
    pub total: usize,
    /// Number of vectors that matched their expectation.
    pub passed: usize,
    /// Failures grouped by the error name the validator produced.
    pub failures: BTreeMap<String, usize>,
}

impl Summary {
    fn merge(&mut self, other: Summary) {
        self.total += other.total;
        self.passed += other.passed;
        for (kind, count) in other.failures {
            *self.failures.entry(kind).or_default() += count;
        }
    }

    fn print(&self) {
        println!("Passed tests: {}/{}", self.passed, self.total);
        if self.passed != self.total {
            println!("Types of error: {:#?}", self.failures);
        }
    }

    fn into_result(self) -> Result<(), Error> {
        if self.passed == self.total {
            return Ok(());
        }
        Err(Error::Suite {
            failed_test: self.total - self.passed,
            total_tests: self.total,
        })
    }
}

/// Failure key of a vector that was expected to fail but validated.
pub const FALSE_POSITIVE: &str = "FalsePositive";

/// Name of the innermost error variant, e.g. `JumpOverflow`.
pub fn error_name(err: &EofError) -> String {
    match err {
        EofError::Decode(e) => format!("{e:?}"),
        EofError::Validation(e) => format!("{e:?}"),
    }
}

/// Runs every vector of a json suite.
pub fn run_suite_str(json: &str) -> Result<Summary, serde_json::Error> {
    let suite: TestSuite = serde_json::from_str(json)?;
    let mut summary = Summary::default();
    for (name, unit) in suite.0 {
        for (vector_name, vector) in unit.vectors {
            summary.total += 1;
            let res = validate(vector.code.clone());
            let got = res.as_ref().err().map(error_name);
            let passed = res.is_ok() == vector.result
                && match (&vector.exception, &got) {
                    (Some(expected), Some(got)) => expected == got,
                    _ => true,
                };
            if passed {
                summary.passed += 1;
                continue;
            }
            log::debug!("{name}/{vector_name}: expected {vector:?}, got {got:?}");
            println!(
                "\nTest failed: {} - {}\nexpected: {} {:?}\ngot: {:?}\nbytes: {}\n",
                name, vector_name, vector.result, vector.exception, got, vector.code
            );
            *summary
                .failures
                .entry(got.unwrap_or_else(|| FALSE_POSITIVE.to_string()))
                .or_default() += 1;
        }
    }
    Ok(summary)
}
