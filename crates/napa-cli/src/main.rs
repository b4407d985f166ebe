mod add;
mod install;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "napa")]
#[command(about = "A minimal npm-compatible package manager")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install all dependencies declared in package.json
    Install(install::InstallArgs),

    /// Add a dependency to package.json
    Add(add::AddArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let exit_code = match args.command {
        Commands::Install(install_args) => install::execute(install_args).await?,
        Commands::Add(add_args) => add::execute(add_args).await?,
    };

    std::process::exit(exit_code);
}
