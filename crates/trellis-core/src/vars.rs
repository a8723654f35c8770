//! Variable payloads shared between loaders and the tree engine.

use std::collections::BTreeMap;

/// String-keyed variable mapping substituted into issue templates.
pub type VarMap = BTreeMap<String, serde_yaml::Value>;

/// Whether a variable source currently holds usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Valid,
    Invalid,
}

/// Supplies variables for rendering an issue tree.
///
/// The tree engine only consumes variables while the source reports
/// [`SourceState::Valid`]; an invalid source makes rendering fail rather
/// than render with stale or missing data.
pub trait VariableSource {
    /// Current state of the source.
    fn state(&self) -> SourceState;

    /// Returns a defensive copy of the variable data.
    fn variables(&self) -> VarMap;
}
