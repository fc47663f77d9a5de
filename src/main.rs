// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! `posture-inference` command-line interface.

mod cli;

use clap::Parser;

use cli::args::{Cli, Commands};
use cli::logging::set_verbose;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict(args) => {
            // JSON lines own stdout.
            set_verbose(args.verbose && !args.json);
            cli::predict::run_prediction(&args);
        }
        Commands::Evaluate(args) => {
            set_verbose(args.verbose && !args.json);
            cli::evaluate::run_evaluation(&args);
        }
    }
}
