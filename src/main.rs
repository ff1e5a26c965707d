use anyhow::Result;
use kalitracker::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
