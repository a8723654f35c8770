//! `tl create` -- mirror the issue tree into Jira.
//!
//! Renders the tree, then hands it to the reflection driver: root
//! first, children by ascending order, subtasks right after their
//! parent. `--dry-run` stays offline and prints the creation plan;
//! `--rollback` deletes the partial hierarchy if the sequence aborts.

use anyhow::{Context, Result, bail};

use trellis_config::config::JiraConfig;
use trellis_core::tree::IssueTree;
use trellis_jira::{JiraApi, ReflectError, Reflector};
use trellis_ui::styles;

use crate::cli::{CreateArgs, GlobalArgs};

/// Execute the `tl create` command.
pub fn run(global: &GlobalArgs, args: &CreateArgs) -> Result<()> {
    let mut tree = super::load_tree(
        &args.templates,
        args.vars.as_deref(),
        args.schema.as_deref(),
    )?;

    tree.refresh_links(true)
        .context("tree structure is invalid")?;
    tree.render().context("failed to render templates")?;

    if args.dry_run {
        // Offline: the plan needs the config for the subtask label, but
        // no credentials.
        let config = super::jira_config(&args.connection)?;
        print_plan(&tree, &config);
        return Ok(());
    }

    let (config, token) = super::resolve_connection(&args.connection)?;
    let api = JiraApi::new(&config, &token);
    let mut reflector = Reflector::new(api, config);

    match reflector.create(&mut tree) {
        Ok(report) => {
            if !global.quiet {
                for ticket in &report {
                    println!(
                        "{} {} -> {}",
                        styles::render_pass_icon(),
                        ticket.name,
                        styles::render_bold(&ticket.key)
                    );
                }
                println!("created {} tickets", report.len());
            }
            Ok(())
        }
        Err(ReflectError::Aborted { created, source }) => {
            eprintln!(
                "{} creation aborted after {} tickets: {source}",
                styles::render_fail_icon(),
                created.len()
            );
            for ticket in &created {
                eprintln!("  created before abort: {} -> {}", ticket.name, ticket.key);
            }

            if args.rollback {
                let failures = reflector.tear_down(&created);
                if failures.is_empty() {
                    eprintln!("rolled back {} tickets", created.len());
                } else {
                    for (ticket, err) in &failures {
                        eprintln!(
                            "{} could not delete {}: {err}",
                            styles::render_warn_icon(),
                            ticket.key
                        );
                    }
                }
            } else if !created.is_empty() {
                eprintln!(
                    "pass {} to delete the partial hierarchy",
                    styles::render_accent("--rollback")
                );
            }
            bail!("creation aborted: {source}");
        }
        Err(err) => Err(err.into()),
    }
}

/// Prints what `create` would send, one line per ticket in creation
/// order.
fn print_plan(tree: &IssueTree, config: &JiraConfig) {
    let plan = tree.linearize();
    println!("would create {} tickets:", plan.len());
    for issue in plan {
        let depth = match issue.parent() {
            None => 0,
            Some(parent) if Some(parent) == tree.top() => 1,
            Some(_) => 2,
        };
        let label = if depth == 2 {
            config.subtask_type.as_str()
        } else {
            issue.kind().map_or("?", |kind| kind.type_label())
        };
        println!(
            "{}[{}] {} ({})",
            "  ".repeat(depth),
            label,
            issue.summary().unwrap_or(issue.name()),
            issue.jira_project().unwrap_or("?"),
        );
    }
}
