//! `tl check` -- validate a template set before creating anything.
//!
//! Runs every local check (structure, per-issue completeness, template
//! syntax, variables against their schema) and, with `--remote`, the
//! project-key check against the live instance. All failures are
//! collected and reported together.

use anyhow::{Result, bail};

use trellis_core::tree::IssueTree;
use trellis_jira::{JiraApi, Reflector};
use trellis_loader::load_templates;
use trellis_ui::styles;

use crate::cli::{CheckArgs, GlobalArgs};

/// Execute the `tl check` command.
pub fn run(global: &GlobalArgs, args: &CheckArgs) -> Result<()> {
    let issues = load_templates(&args.templates)?;
    let mut tree = IssueTree::new();
    tree.add_issues(issues);

    let mut failures: Vec<String> = Vec::new();

    // Structure: exactly one root, every parent resolves.
    if let Err(err) = tree.refresh_links(true) {
        failures.push(err.to_string());
    }
    for parent in tree.missing() {
        failures.push(format!("parent {parent} is named but never defined"));
    }

    // Per-issue completeness and template syntax.
    for issue in tree.issues() {
        if let Err(err) = issue.validate() {
            failures.push(format!("issue {}: {err}", issue.name()));
        }
    }

    // Variables against their schema.
    if let Some(vars_path) = &args.vars {
        let file = super::load_variables(vars_path, args.schema.as_deref())?;
        for violation in file.violations() {
            failures.push(format!("variables: {violation}"));
        }
    }

    // Project keys against the remote instance.
    if args.remote {
        let (config, token) = super::resolve_connection(&args.connection)?;
        let api = JiraApi::new(&config, &token);
        let mut reflector = Reflector::new(api, config);
        if let Err(err) = reflector.validate(&tree) {
            failures.push(err.to_string());
        }
    }

    if failures.is_empty() {
        if !global.quiet {
            println!(
                "{} {} issues, all checks passed",
                styles::render_pass_icon(),
                tree.len()
            );
        }
        return Ok(());
    }

    for failure in &failures {
        eprintln!("{} {failure}", styles::render_fail_icon());
    }
    bail!("{} problem(s) found", failures.len());
}
