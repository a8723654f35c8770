//! Issue kind -- the small open set of ticket categories.

use std::fmt;

/// Category of an issue: known kinds plus a catch-all for anything a
/// tracker instance defines beyond them.
///
/// Parsing is case-insensitive for the known kinds; unknown strings are
/// preserved verbatim in [`IssueKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueKind {
    Epic,
    Story,
    Subtask,
    Other(String),
}

impl IssueKind {
    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Epic => "epic",
            Self::Story => "story",
            Self::Subtask => "subtask",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Returns the label sent to the tracker as the issue type name.
    pub fn type_label(&self) -> &str {
        match self {
            Self::Epic => "Epic",
            Self::Story => "Story",
            Self::Subtask => "Sub-task",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Returns `true` for kinds allowed to sit at the top of a tree
    /// without a parent.
    pub fn is_top_level(&self) -> bool {
        matches!(self, Self::Epic | Self::Story)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for IssueKind {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "epic" => Self::Epic,
            "story" => Self::Story,
            "subtask" | "sub-task" => Self::Subtask,
            _ => Self::Other(s.to_owned()),
        }
    }
}

impl From<String> for IssueKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
