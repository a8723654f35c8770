//! Hierarchical tree views for CLI output.
//!
//! Renders an issue tree as a three-level box-drawing outline, in the
//! same order issues would be created remotely. A second view dumps the
//! derived link state for debugging template sets.

use std::io::Write;

use trellis_core::issue::Issue;
use trellis_core::tree::{IssueTree, TreeError};

use crate::styles;

/// Which field labels each node in the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Name,
    Summary,
}

/// Renders the tree view into a string.
pub fn render_tree(tree: &IssueTree, label: LabelField) -> Result<String, TreeError> {
    let mut buf = Vec::new();
    render_tree_to(tree, label, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Renders the tree view to a writer: the root, each child by ascending
/// order, and each child's children indented beneath it.
///
/// Kinds color their labels; issues that already exist remotely show
/// their key after the label.
pub fn render_tree_to<W: Write>(
    tree: &IssueTree,
    label: LabelField,
    w: &mut W,
) -> Result<(), TreeError> {
    let Some(root) = tree.top().and_then(|top| tree.get(top)) else {
        return Err(TreeError::NoRoot);
    };

    let _ = writeln!(w, "{}", issue_line(root, label));

    let children = tree.ordered_children(root.name());
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let branch = if last {
            styles::TREE_LAST
        } else {
            styles::TREE_BRANCH
        };
        let _ = writeln!(w, "{}{}", branch, issue_line(child, label));

        let grandchildren = tree.ordered_children(child.name());
        for (j, grandchild) in grandchildren.iter().enumerate() {
            let carry = if last {
                styles::TREE_GAP
            } else {
                styles::TREE_PIPE
            };
            let twig = if j + 1 == grandchildren.len() {
                styles::TREE_LAST
            } else {
                styles::TREE_BRANCH
            };
            let _ = writeln!(w, "{}{}{}", carry, twig, issue_line(grandchild, label));
        }
    }
    Ok(())
}

fn issue_line(issue: &Issue, label: LabelField) -> String {
    let text = match label {
        LabelField::Name => issue.name(),
        LabelField::Summary => issue.summary().unwrap_or(issue.name()),
    };
    let mut line = styles::render_kind_text(issue.kind(), text);
    if let Some(key) = issue.remote_key() {
        line.push(' ');
        line.push_str(&styles::render_muted(&format!("[{key}]")));
    }
    line
}

/// Renders the derived link state into a string.
pub fn render_links(tree: &IssueTree) -> String {
    let mut buf = Vec::new();
    render_links_to(tree, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Dumps the tree's derived link state: top, uplinks, downlinks, and
/// parents referenced but absent.
pub fn render_links_to<W: Write>(tree: &IssueTree, w: &mut W) {
    let _ = writeln!(
        w,
        "{} {}",
        styles::render_bold("Top:"),
        tree.top().unwrap_or("(none)")
    );

    let _ = writeln!(w, "{}", styles::render_bold("Uplinks:"));
    for (child, parent) in tree.uplinks() {
        let _ = writeln!(w, "  {child} -> {parent}");
    }

    let _ = writeln!(w, "{}", styles::render_bold("Downlinks:"));
    for (parent, children) in tree.downlinks() {
        let kids: Vec<&str> = children.iter().map(String::as_str).collect();
        let _ = writeln!(w, "  {parent} -> {}", kids.join(", "));
    }

    let _ = writeln!(w, "{}", styles::render_bold("Missing:"));
    if tree.missing().is_empty() {
        let _ = writeln!(w, "  (none)");
    } else {
        for name in tree.missing() {
            let _ = writeln!(w, "  {}", styles::render_fail(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_core::issue::IssueBuilder;
    use trellis_core::kind::IssueKind;

    fn sample_tree() -> IssueTree {
        let mut tree = IssueTree::new();
        tree.add_issues([
            IssueBuilder::new("launch")
                .kind(IssueKind::Epic)
                .summary("Launch the product")
                .build(),
            IssueBuilder::new("backend")
                .parent("launch")
                .kind(IssueKind::Story)
                .order(1)
                .summary("Build the backend")
                .build(),
            IssueBuilder::new("frontend")
                .parent("launch")
                .kind(IssueKind::Story)
                .order(2)
                .summary("Build the frontend")
                .build(),
            IssueBuilder::new("schema")
                .parent("backend")
                .kind(IssueKind::Subtask)
                .summary("Design the schema")
                .build(),
        ]);
        tree
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not found in {haystack:?}"))
    }

    #[test]
    fn tree_view_follows_creation_order() {
        let out = render_tree(&sample_tree(), LabelField::Name).unwrap();

        let launch = position(&out, "launch");
        let backend = position(&out, "backend");
        let schema = position(&out, "schema");
        let frontend = position(&out, "frontend");
        assert!(launch < backend);
        assert!(backend < schema);
        assert!(schema < frontend);
    }

    #[test]
    fn tree_view_draws_branches() {
        let out = render_tree(&sample_tree(), LabelField::Name).unwrap();

        assert!(out.contains(styles::TREE_BRANCH));
        assert!(out.contains(styles::TREE_LAST));
        // schema sits under a non-last child, so its line carries a pipe.
        let schema_line = out
            .lines()
            .find(|line| line.contains("schema"))
            .unwrap()
            .to_string();
        assert!(schema_line.starts_with(styles::TREE_PIPE));
    }

    #[test]
    fn summary_labels_fall_back_to_the_name() {
        let mut tree = IssueTree::new();
        tree.add_issue(IssueBuilder::new("bare").build());

        let out = render_tree(&tree, LabelField::Summary).unwrap();
        assert_eq!(out.trim(), "bare");
    }

    #[test]
    fn remote_keys_show_after_the_label() {
        let mut tree = sample_tree();
        tree.set_remote_key("launch", "OPS-1");

        let out = render_tree(&tree, LabelField::Name).unwrap();
        assert!(out.contains("[OPS-1]"));
    }

    #[test]
    fn empty_tree_reports_no_root() {
        let tree = IssueTree::new();
        assert!(matches!(
            render_tree(&tree, LabelField::Name),
            Err(TreeError::NoRoot)
        ));
    }

    #[test]
    fn links_view_dumps_derived_state() {
        let mut tree = sample_tree();
        tree.add_issue(IssueBuilder::new("orphan").parent("ghost").build());

        let out = render_links(&tree);
        assert!(out.contains("launch"));
        assert!(out.contains("backend -> launch"));
        assert!(out.contains("ghost"));
    }
}
