use clap::Parser;
use eofme::cmd::MainCmd;
use eyre::Result;

fn main() -> Result<()> {
    env_logger::init();
    MainCmd::parse().run()?;
    Ok(())
}
