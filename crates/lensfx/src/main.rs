mod cli;
mod feedback;
mod paths;
mod run;
mod snapshot;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::run(cli)
}
