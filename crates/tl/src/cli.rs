//! Clap CLI definitions for the `tl` command.
//!
//! This module defines the complete CLI structure using clap 4 derive
//! macros: three subcommands sharing a template-set argument and, where
//! the remote instance is involved, a common set of connection flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// tl -- YAML issue templates reflected into Jira.
#[derive(Parser, Debug)]
#[command(
    name = "tl",
    about = "Issue templates reflected into Jira",
    long_about = "Loads YAML issue templates, links them into an epic/story/subtask tree, \
renders the text fields against variables, and mirrors the tree into Jira as a ticket hierarchy.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the issue tree a template set would create.
    Preview(PreviewArgs),

    /// Validate templates, variables, and optionally remote projects.
    Check(CheckArgs),

    /// Create the issue tree in Jira, top-down.
    Create(CreateArgs),
}

/// Field used to label nodes in the tree view.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Name,
    Summary,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Template file or directory to load.
    pub templates: PathBuf,

    /// Variable file rendered into the templates.
    #[arg(long)]
    pub vars: Option<PathBuf>,

    /// Schema the variable file must satisfy.
    #[arg(long, requires = "vars")]
    pub schema: Option<PathBuf>,

    /// Field shown for each node.
    #[arg(long, value_enum, default_value_t = Label::Name)]
    pub label: Label,

    /// Also dump the derived link state.
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Template file or directory to load.
    pub templates: PathBuf,

    /// Variable file checked against the templates.
    #[arg(long)]
    pub vars: Option<PathBuf>,

    /// Schema the variable file must satisfy.
    #[arg(long, requires = "vars")]
    pub schema: Option<PathBuf>,

    /// Also check project keys against the remote instance.
    #[arg(long)]
    pub remote: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Template file or directory to load.
    pub templates: PathBuf,

    /// Variable file rendered into the templates.
    #[arg(long)]
    pub vars: Option<PathBuf>,

    /// Schema the variable file must satisfy.
    #[arg(long, requires = "vars")]
    pub schema: Option<PathBuf>,

    /// Stop after validation and print the creation plan.
    #[arg(long)]
    pub dry_run: bool,

    /// Delete whatever was created if the sequence aborts.
    #[arg(long)]
    pub rollback: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Jira connection settings. Flags override the config file.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Config file (default: trellis.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Jira server, e.g. jira.example.com.
    #[arg(long)]
    pub server: Option<String>,

    /// Jira user for basic auth.
    #[arg(long)]
    pub user: Option<String>,

    /// Jira API token.
    #[arg(long, env = "TRELLIS_JIRA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}
