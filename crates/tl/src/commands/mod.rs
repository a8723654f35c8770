//! Command handlers for the `tl` CLI.
//!
//! Each submodule implements one subcommand. The helpers here cover the
//! setup every command repeats: loading a template set into a linked
//! tree and resolving the Jira connection.

pub mod check;
pub mod create;
pub mod preview;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use trellis_config::config::{JiraConfig, load_config};
use trellis_core::tree::IssueTree;
use trellis_loader::{Schema, VariableFile, load_templates};

use crate::cli::ConnectionArgs;

/// Loads templates and optional variables into a linked tree.
///
/// Links are rebuilt in relaxed mode by the inserts; commands decide
/// when to enforce the single-root rule.
fn load_tree(
    templates: &Path,
    vars: Option<&Path>,
    schema: Option<&Path>,
) -> Result<IssueTree> {
    let issues = load_templates(templates)
        .with_context(|| format!("failed to load templates from {}", templates.display()))?;

    let mut tree = IssueTree::new();
    tree.add_issues(issues);
    tracing::debug!(count = tree.len(), "loaded issue tree");

    if let Some(vars_path) = vars {
        tree.set_var_source(load_variables(vars_path, schema)?);
    }
    Ok(tree)
}

/// Loads a variable file, checked against its schema when one is given.
fn load_variables(vars: &Path, schema: Option<&Path>) -> Result<VariableFile> {
    let schema = match schema {
        Some(path) => Some(
            Schema::load(path)
                .with_context(|| format!("failed to load schema {}", path.display()))?,
        ),
        None => None,
    };
    VariableFile::load(vars, schema.as_ref())
        .with_context(|| format!("failed to load variables {}", vars.display()))
}

/// Default config file consulted when `--config` is not given.
const CONFIG_FILE: &str = "trellis.yaml";

fn config_path(args: &ConnectionArgs) -> PathBuf {
    args.config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Loads the Jira section of the config file with CLI flags applied on
/// top. Does not require credentials; use [`resolve_connection`] for
/// commands that talk to the remote instance.
fn jira_config(args: &ConnectionArgs) -> Result<JiraConfig> {
    let path = config_path(args);
    let mut config = load_config(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?
        .jira;

    if let Some(server) = &args.server {
        config.server = server.clone();
    }
    if let Some(user) = &args.user {
        config.user = user.clone();
    }
    Ok(config)
}

/// Resolves a complete Jira connection: config file plus flag overrides,
/// with the token taken from `--token`, then `TRELLIS_JIRA_TOKEN`, then
/// the config file.
fn resolve_connection(args: &ConnectionArgs) -> Result<(JiraConfig, String)> {
    let path = config_path(args);
    let config = jira_config(args)?;

    // --token and TRELLIS_JIRA_TOKEN both arrive through clap; the
    // config file is the last resort.
    let Some(token) = args.token.clone().or_else(|| config.token.clone()) else {
        bail!(
            "no Jira API token: pass --token, set TRELLIS_JIRA_TOKEN, or add it to {}",
            path.display()
        );
    };
    if config.server.is_empty() {
        bail!(
            "no Jira server configured: pass --server or set jira.server in {}",
            path.display()
        );
    }
    if config.user.is_empty() {
        bail!(
            "no Jira user configured: pass --user or set jira.user in {}",
            path.display()
        );
    }
    tracing::debug!(server = %config.server, user = %config.user, "resolved jira connection");
    Ok((config, token))
}
