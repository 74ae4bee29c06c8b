//! wf-export - workspace job and pipeline exporter
//!
//! Exports job and pipeline definitions into a bundle: one rewritten resource
//! document per resource, plus the source files and libraries it references.

use clap::Parser;

mod cli;
mod commands;
mod logging;
mod ui;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export(args) => commands::export::run(args),
        Commands::CheckConfig(args) => commands::check_config::run(&args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
