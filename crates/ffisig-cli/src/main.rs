use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use ffisig_cif::BuildOptions;
use std::path::PathBuf;

mod commands;
mod error;
mod io;

use commands::check::handle_check;
use commands::show::{handle_show, ShowFormat};
use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "ffisig")]
#[command(about = "Check and inspect foreign function signature descriptions", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// TOML file with build options
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Build a signature and report whether it prepares
    Check {
        /// Signature file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print a prepared signature
    Show {
        /// Signature file to show
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// What to display
        #[arg(value_enum, short, long, default_value_t = ShowFormat::Tree)]
        format: ShowFormat,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let options = match &args.config {
        Some(path) => BuildOptions::load(path).map_err(CliError::from)?,
        None => BuildOptions::default(),
    };

    let output = match args.command {
        Command::Check { file } => handle_check(&file, &options)?,
        Command::Show { file, format } => handle_show(&file, format, &options)?,
    };
    print!("{}", output);
    Ok(())
}
