//! `tl preview` -- print the issue tree a template set would create.

use anyhow::{Context, Result};

use trellis_ui::tree_view::{self, LabelField};

use crate::cli::{Label, PreviewArgs};

/// Execute the `tl preview` command.
pub fn run(args: &PreviewArgs) -> Result<()> {
    let mut tree = super::load_tree(
        &args.templates,
        args.vars.as_deref(),
        args.schema.as_deref(),
    )?;

    tree.refresh_links(true)
        .context("tree structure is invalid")?;
    tree.render().context("failed to render templates")?;

    let label = match args.label {
        Label::Name => LabelField::Name,
        Label::Summary => LabelField::Summary,
    };
    print!("{}", tree_view::render_tree(&tree, label)?);

    if args.debug {
        println!();
        print!("{}", tree_view::render_links(&tree));
    }
    Ok(())
}
