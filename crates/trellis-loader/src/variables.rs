//! Variable files backing tree rendering.

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use trellis_core::vars::{SourceState, VarMap, VariableSource};

use crate::error::{LoadError, Result};
use crate::schema::Schema;

/// A loaded variable file, optionally checked against a schema.
///
/// Loading succeeds even when the schema check fails; the file then
/// reports [`SourceState::Invalid`] and keeps the violation list for
/// display, so callers decide how loudly to fail.
#[derive(Debug)]
pub struct VariableFile {
    data: VarMap,
    state: SourceState,
    violations: Vec<String>,
}

impl VariableFile {
    /// Reads a YAML variable mapping from `path`, checking it against
    /// `schema` when one is given.
    pub fn load(path: &Path, schema: Option<&Schema>) -> Result<VariableFile> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_owned(),
            source,
        })?;

        // An empty file is a valid, empty variable set.
        let value: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
                path: path.to_owned(),
                source,
            })?
        };

        let data = match value {
            Value::Null => VarMap::new(),
            Value::Mapping(mapping) => {
                let mut data = VarMap::new();
                for (key, value) in mapping {
                    let Value::String(key) = key else {
                        return Err(LoadError::NotAMapping {
                            path: path.to_owned(),
                        });
                    };
                    data.insert(key, value);
                }
                data
            }
            _ => {
                return Err(LoadError::NotAMapping {
                    path: path.to_owned(),
                });
            }
        };

        let violations = schema.map(|s| s.check(&data)).unwrap_or_default();
        let state = if violations.is_empty() {
            SourceState::Valid
        } else {
            SourceState::Invalid
        };
        Ok(VariableFile {
            data,
            state,
            violations,
        })
    }

    pub fn data(&self) -> &VarMap {
        &self.data
    }

    /// Schema violations found at load time, empty when valid.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn is_valid(&self) -> bool {
        self.state == SourceState::Valid
    }
}

impl VariableSource for VariableFile {
    fn state(&self) -> SourceState {
        self.state
    }

    fn variables(&self) -> VarMap {
        self.data.clone()
    }
}
