//! Issue tree -- parent/child links, structure checks, linearization.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::issue::{Issue, IssueError};
use crate::vars::{SourceState, VariableSource};

/// Errors raised by tree-level operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// More than one issue has no parent.
    #[error("too many top level issues: {first} and {second} both have no parent")]
    MultipleRoots { first: String, second: String },

    /// No issue qualifies as the root.
    #[error("tree has no top level issue")]
    NoRoot,

    /// A variable source is configured but holds no valid data.
    #[error("variable source holds no valid data")]
    VariablesInvalid,

    /// An issue-level failure, annotated with the issue's name.
    #[error("issue {name}: {source}")]
    Issue {
        name: String,
        #[source]
        source: IssueError,
    },
}

/// A collection of issues linked into a three-level tree by their
/// `parent` fields.
///
/// Link state (`uplinks`, `downlinks`, `missing`, `top`) is derived and
/// fully recomputed after every mutation; trees stay small enough that
/// a full rebuild is cheaper than getting incremental updates right.
pub struct IssueTree {
    issues: BTreeMap<String, Issue>,
    uplinks: BTreeMap<String, String>,
    downlinks: BTreeMap<String, BTreeSet<String>>,
    missing: BTreeSet<String>,
    top: Option<String>,
    var_source: Option<Box<dyn VariableSource>>,
}

impl IssueTree {
    pub fn new() -> Self {
        Self {
            issues: BTreeMap::new(),
            uplinks: BTreeMap::new(),
            downlinks: BTreeMap::new(),
            missing: BTreeSet::new(),
            top: None,
            var_source: None,
        }
    }

    /// Inserts an issue, overwriting any existing issue of the same name,
    /// and recomputes link state.
    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.insert(issue.name().to_owned(), issue);
        self.rebuild();
    }

    /// Inserts a batch of issues, recomputing link state once at the end.
    pub fn add_issues(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.issues.insert(issue.name().to_owned(), issue);
        }
        self.rebuild();
    }

    /// Removes an issue by name. Returns `false` (a successful no-op) if
    /// the name is absent.
    pub fn remove_issue(&mut self, name: &str) -> bool {
        if self.issues.remove(name).is_none() {
            return false;
        }
        if self.top.as_deref() == Some(name) {
            self.top = None;
        }
        self.rebuild();
        true
    }

    /// Recomputes link state from scratch.
    ///
    /// With `validate` set, a second parentless issue is an error naming
    /// both contenders. Without it, the scan tolerates the conflict and
    /// the last parentless issue wins, which keeps partially-built trees
    /// usable.
    pub fn refresh_links(&mut self, validate: bool) -> Result<(), TreeError> {
        match self.rebuild() {
            Some((first, second)) if validate => Err(TreeError::MultipleRoots { first, second }),
            _ => Ok(()),
        }
    }

    /// Full scan over the collection. Returns the first pair of
    /// competing roots encountered, if any.
    fn rebuild(&mut self) -> Option<(String, String)> {
        self.uplinks.clear();
        self.downlinks.clear();
        self.missing.clear();
        self.top = None;

        let mut conflict = None;
        for issue in self.issues.values() {
            match issue.parent() {
                None => {
                    if let Some(top) = &self.top {
                        if conflict.is_none() {
                            conflict = Some((top.clone(), issue.name().to_owned()));
                        }
                    }
                    self.top = Some(issue.name().to_owned());
                }
                Some(parent) => {
                    self.uplinks
                        .insert(issue.name().to_owned(), parent.to_owned());
                    self.downlinks
                        .entry(parent.to_owned())
                        .or_default()
                        .insert(issue.name().to_owned());
                }
            }
        }

        for parent in self.uplinks.values() {
            if !self.issues.contains_key(parent) {
                self.missing.insert(parent.clone());
            }
        }
        conflict
    }

    /// Flattens the tree into creation order: root, then each child by
    /// ascending `order`, depth-first through that child's own children.
    ///
    /// Parents always precede their children. Absent names are skipped,
    /// and an unknown root yields an empty sequence.
    pub fn linearize(&self) -> Vec<&Issue> {
        let mut out = Vec::with_capacity(self.issues.len());
        let Some(top) = &self.top else {
            return out;
        };
        let Some(root) = self.issues.get(top) else {
            return out;
        };
        out.push(root);
        for child in self.ordered_children(top) {
            out.push(child);
            for grandchild in self.ordered_children(child.name()) {
                out.push(grandchild);
            }
        }
        out
    }

    /// Direct children of `name`, sorted by ascending `order`. Issues
    /// without an order sort last; ties break by name.
    pub fn ordered_children(&self, name: &str) -> Vec<&Issue> {
        let Some(children) = self.downlinks.get(name) else {
            return Vec::new();
        };
        let mut kids: Vec<&Issue> = children
            .iter()
            .filter_map(|child| self.issues.get(child))
            .collect();
        kids.sort_by(|a, b| {
            let ka = a.order().unwrap_or(i64::MAX);
            let kb = b.order().unwrap_or(i64::MAX);
            ka.cmp(&kb).then_with(|| a.name().cmp(b.name()))
        });
        kids
    }

    /// Renders every issue against the configured variable source.
    ///
    /// With no source configured this is a successful no-op. A source in
    /// an invalid state is an error; no issue is touched.
    pub fn render(&mut self) -> Result<(), TreeError> {
        let Some(source) = &self.var_source else {
            return Ok(());
        };
        if source.state() != SourceState::Valid {
            return Err(TreeError::VariablesInvalid);
        }
        let vars = source.variables();
        for (name, issue) in self.issues.iter_mut() {
            issue.render_with(&vars).map_err(|err| TreeError::Issue {
                name: name.clone(),
                source: err,
            })?;
        }
        Ok(())
    }

    /// Configures the variable source consulted by [`IssueTree::render`].
    pub fn set_var_source(&mut self, source: impl VariableSource + 'static) {
        self.var_source = Some(Box::new(source));
    }

    /// Stores the remote key assigned to `name`. Returns `false` if the
    /// name is absent.
    pub fn set_remote_key(&mut self, name: &str, key: impl Into<String>) -> bool {
        match self.issues.get_mut(name) {
            Some(issue) => {
                issue.set_remote_key(key);
                true
            }
            None => false,
        }
    }

    // ===== Accessors =====

    pub fn get(&self, name: &str) -> Option<&Issue> {
        self.issues.get(name)
    }

    /// Iterates over every issue in name order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.values()
    }

    pub fn top(&self) -> Option<&str> {
        self.top.as_deref()
    }

    pub fn uplinks(&self) -> &BTreeMap<String, String> {
        &self.uplinks
    }

    pub fn downlinks(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.downlinks
    }

    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl Default for IssueTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IssueTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueTree")
            .field("issues", &self.issues.keys().collect::<Vec<_>>())
            .field("top", &self.top)
            .field("missing", &self.missing)
            .field("var_source", &self.var_source.is_some())
            .finish()
    }
}
