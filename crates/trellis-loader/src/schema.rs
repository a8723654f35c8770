//! Variable schemas -- a small dialect mapping variable names to types.
//!
//! A schema file is a YAML mapping from variable name to a type word:
//! `string`, `integer`, `number`, `boolean`, `list`, `map`, or `any`.
//! A trailing `?` marks the variable optional:
//!
//! ```yaml
//! team: string
//! capacity: integer
//! owner: string?
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;
use trellis_core::vars::VarMap;

use crate::error::{LoadError, Result};

/// Expected type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    String,
    Integer,
    Number,
    Boolean,
    List,
    Map,
    Any,
}

impl VarType {
    fn parse(word: &str) -> Option<VarType> {
        match word {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "list" => Some(Self::List),
            "map" => Some(Self::Map),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    fn word(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_bool(),
            Self::List => value.is_sequence(),
            Self::Map => value.is_mapping(),
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone)]
struct FieldSpec {
    ty: VarType,
    optional: bool,
}

/// A parsed variable schema.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    /// Loads a schema from a YAML file.
    pub fn load(path: &Path) -> Result<Schema> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_owned(),
            source,
        })?;
        let value: Value = serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.to_owned(),
            source,
        })?;
        Self::from_value(&value, path)
    }

    fn from_value(value: &Value, path: &Path) -> Result<Schema> {
        let mapping = value.as_mapping().ok_or_else(|| LoadError::SchemaShape {
            path: path.to_owned(),
        })?;

        let mut fields = BTreeMap::new();
        for (key, spec) in mapping {
            let (Some(name), Some(word)) = (key.as_str(), spec.as_str()) else {
                return Err(LoadError::SchemaShape {
                    path: path.to_owned(),
                });
            };
            let (word, optional) = match word.strip_suffix('?') {
                Some(inner) => (inner, true),
                None => (word, false),
            };
            let ty = VarType::parse(word).ok_or_else(|| LoadError::SchemaType {
                name: name.to_owned(),
                word: word.to_owned(),
            })?;
            fields.insert(name.to_owned(), FieldSpec { ty, optional });
        }
        Ok(Schema { fields })
    }

    /// Checks variables against the schema and returns every violation.
    ///
    /// Variables not named by the schema are allowed; missing required
    /// variables and type mismatches are all collected in one pass.
    pub fn check(&self, vars: &VarMap) -> Vec<String> {
        let mut violations = Vec::new();
        for (name, spec) in &self.fields {
            match vars.get(name) {
                None => {
                    if !spec.optional {
                        violations.push(format!("missing required variable {name}"));
                    }
                }
                Some(value) => {
                    if !spec.ty.matches(value) {
                        violations.push(format!(
                            "variable {name}: expected {}, got {}",
                            spec.ty.word(),
                            type_name(value)
                        ));
                    }
                }
            }
        }
        violations
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.as_i64().is_some() || n.as_u64().is_some() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged",
    }
}
