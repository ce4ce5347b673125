use super::{parse_hex, Error};
use bytecode::{validate_with_config, EofConfig};
use clap::Parser;

/// `validate` subcommand.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Container bytes in hex, with or without `0x`
    #[arg(required = true)]
    input: String,
    /// Reject containers larger than this many bytes
    #[arg(long)]
    max_size: Option<usize>,
    /// Accept only this container version
    #[arg(long)]
    version: Option<u8>,
}

impl Cmd {
    /// Builds the validation limits from the flags.
    pub fn config(&self) -> EofConfig {
        let mut config = EofConfig::default();
        if let Some(limit) = self.max_size {
            config = config.with_limit_container_size(limit);
        }
        if let Some(version) = self.version {
            config = config.with_version(version);
        }
        config
    }

    /// Runs validate command.
    pub fn run(&self) -> Result<(), Error> {
        let raw = parse_hex(&self.input)?;
        let eof = validate_with_config(raw, &self.config())?;
        println!(
            "valid: version {}, {} code section(s), {} byte(s) of data",
            eof.eof().version(),
            eof.code_count(),
            eof.eof().data().len()
        );
        Ok(())
    }
}
