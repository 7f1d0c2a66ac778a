use clap::Parser;
use degrid_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    degrid_cli::init_logging(cli.verbose);

    degrid_cli::run(&cli)?;
    Ok(())
}
