//! `tl` -- YAML issue templates reflected into Jira.
//!
//! This is the entry point for the trellis CLI. It parses arguments with
//! clap, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // Install signal handlers for graceful shutdown.
    // First Ctrl+C: exit cleanly. Second: force exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            // Second signal: force exit
            std::process::exit(1);
        }
        // First signal: exit cleanly
        std::process::exit(0);
    });

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set up logging based on verbosity
    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tl=debug,trellis_jira=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    // Dispatch to command handler
    let result = match cli.command {
        Some(Commands::Preview(args)) => commands::preview::run(&args),
        Some(Commands::Check(args)) => commands::check::run(&cli.global, &args),
        Some(Commands::Create(args)) => commands::create::run(&cli.global, &args),
        None => {
            // No subcommand -- print help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    // Handle errors: print message and exit with code 1
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
