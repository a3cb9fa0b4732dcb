use clap::Parser;
use color_eyre::Result;
use imagegen::{cli::Cli, run};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    run(Cli::parse()).await
}
