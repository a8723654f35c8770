//! Loader error types.

use std::path::PathBuf;

use trellis_core::issue::IssueError;

/// Errors that can occur while loading templates, variables, or schemas.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The given template path does not exist.
    #[error("template path not found: {}", .path.display())]
    PathNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file contained invalid YAML.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An issue definition failed construction, annotated with its file.
    #[error("{}: {source}", .path.display())]
    Issue {
        path: PathBuf,
        #[source]
        source: IssueError,
    },

    /// Two issue definitions share a name.
    #[error(
        "duplicate issue name {name} in {} (first defined in {})",
        .path.display(),
        .first.display()
    )]
    DuplicateName {
        name: String,
        path: PathBuf,
        first: PathBuf,
    },

    /// A variable file did not hold a mapping with string keys.
    #[error("variable file {} must be a YAML mapping with string keys", .path.display())]
    NotAMapping { path: PathBuf },

    /// A schema file did not hold a name-to-type mapping.
    #[error("schema file {} must map variable names to type words", .path.display())]
    SchemaShape { path: PathBuf },

    /// A schema entry used an unknown type word.
    #[error("unknown schema type {word:?} for variable {name}")]
    SchemaType { name: String, word: String },
}

/// Convenience alias used throughout the loader crate.
pub type Result<T> = std::result::Result<T, LoadError>;
