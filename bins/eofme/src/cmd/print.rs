use super::{parse_hex, Error};
use bytecode::{
    eof::printer::{disassemble, disassemble_eof},
    is_container_formatted, Eof, EofError,
};
use clap::Parser;

/// `print` subcommand.
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Container or raw code section in hex
    #[arg(required = true)]
    input: String,
}

impl Cmd {
    /// Runs print command.
    pub fn run(&self) -> Result<(), Error> {
        let bytes = parse_hex(&self.input)?;
        print!("{}", render(bytes)?);
        Ok(())
    }
}

/// Containers are decoded and printed per section, anything else is read as one code section.
fn render(bytes: primitives::Bytes) -> Result<String, Error> {
    if is_container_formatted(&bytes) {
        let eof = Eof::decode(bytes).map_err(EofError::from)?;
        Ok(disassemble_eof(&eof))
    } else {
        Ok(disassemble(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::bytes;

    #[test]
    fn raw_code_is_disassembled() {
        let out = render(bytes!("600100")).unwrap();
        assert!(out.contains("PUSH1"));
        assert!(out.contains("STOP"));
    }

    #[test]
    fn broken_container_is_an_error() {
        assert!(render(bytes!("ef0001")).is_err());
    }
}
