mod cli;
mod commands;

use clap::Parser;
use cli::Paster;
use commands::handle_command;
use std::process;

fn main() {
    let args = Paster::parse();
    let result = handle_command(args.data_dir, args.commands);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
