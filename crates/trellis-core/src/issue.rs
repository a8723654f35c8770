//! Issue record -- a unit of work modeled before it exists in the tracker.

use minijinja::Environment;
use serde_yaml::Value;

use crate::kind::IssueKind;
use crate::vars::VarMap;

/// Field names accepted in a YAML issue definition.
const FIELD_KEYS: &[&str] = &[
    "name",
    "parent",
    "jira_project",
    "issuetype",
    "summary",
    "epic_name",
    "description",
    "order",
];

/// Metadata keys accepted alongside the fields.
const META_KEYS: &[&str] = &["vars", "jira_id"];

/// Errors raised while constructing, validating, or rendering an issue.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("issue definition must be a YAML mapping")]
    NotAMapping,

    #[error("issue field names must be strings")]
    KeyType,

    #[error("issue requires a non-empty name")]
    NameRequired,

    /// Every unrecognized key is reported at once.
    #[error("unrecognized issue fields: {}", .keys.join(", "))]
    UnknownKeys { keys: Vec<String> },

    #[error("field {field} must be {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    /// Every missing required field is reported at once.
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("{kind} issue {name} must have a parent")]
    NeedsParent { name: String, kind: String },

    #[error("field {field} is not a valid template: {source}")]
    Template {
        field: &'static str,
        #[source]
        source: minijinja::Error,
    },
}

/// A single issue: identity, structure, templated content, and the
/// metadata accumulated on its way into the tracker.
///
/// Fields are private; content setters clear the rendered flag so a
/// mutated issue is never mistaken for an already-rendered one.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    // ===== Identity & Structure =====
    name: String,
    parent: Option<String>,
    kind: Option<IssueKind>,
    order: Option<i64>,

    // ===== Templated Content =====
    jira_project: Option<String>,
    summary: Option<String>,
    epic_name: Option<String>,
    description: Option<String>,

    // ===== Metadata =====
    vars: VarMap,
    remote_key: Option<String>,
    rendered: bool,
}

impl Issue {
    /// Builds an issue from one YAML document.
    ///
    /// Unrecognized keys fail construction, all of them reported in one
    /// error. Wrong-typed values fail with the offending field named.
    pub fn from_yaml(doc: &Value) -> Result<Issue, IssueError> {
        let mapping = doc.as_mapping().ok_or(IssueError::NotAMapping)?;

        let mut unknown = Vec::new();
        for key in mapping.keys() {
            match key.as_str() {
                Some(k) if FIELD_KEYS.contains(&k) || META_KEYS.contains(&k) => {}
                Some(k) => unknown.push(k.to_owned()),
                None => return Err(IssueError::KeyType),
            }
        }
        if !unknown.is_empty() {
            unknown.sort();
            return Err(IssueError::UnknownKeys { keys: unknown });
        }

        let name = match doc.get("name") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            None | Some(Value::Null) | Some(Value::String(_)) => {
                return Err(IssueError::NameRequired);
            }
            Some(_) => {
                return Err(IssueError::FieldType {
                    field: "name",
                    expected: "a string",
                });
            }
        };

        Ok(Issue {
            name,
            parent: opt_string(doc, "parent")?,
            kind: opt_string(doc, "issuetype")?.map(IssueKind::from),
            order: opt_order(doc)?,
            jira_project: opt_string(doc, "jira_project")?,
            summary: opt_string(doc, "summary")?,
            epic_name: opt_string(doc, "epic_name")?,
            description: opt_string(doc, "description")?,
            vars: opt_vars(doc)?,
            remote_key: opt_string(doc, "jira_id")?,
            rendered: false,
        })
    }

    /// Checks the issue is complete enough to render and reflect.
    ///
    /// Missing required fields are reported together. A kind outside
    /// {epic, story} must have a parent. Every non-null content field
    /// must compile as a template.
    pub fn validate(&self) -> Result<(), IssueError> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name".to_owned());
        }
        if self.jira_project.is_none() {
            missing.push("jira_project".to_owned());
        }
        if self.kind.is_none() {
            missing.push("issuetype".to_owned());
        }
        if self.summary.is_none() {
            missing.push("summary".to_owned());
        }
        if !missing.is_empty() {
            return Err(IssueError::MissingFields { fields: missing });
        }

        if let Some(kind) = &self.kind {
            if !kind.is_top_level() && self.parent.is_none() {
                return Err(IssueError::NeedsParent {
                    name: self.name.clone(),
                    kind: kind.to_string(),
                });
            }
        }

        let env = Environment::new();
        for (field, text) in self.content_fields() {
            if let Some(text) = text {
                env.template_from_str(text)
                    .map_err(|source| IssueError::Template { field, source })?;
            }
        }
        Ok(())
    }

    /// Renders every non-null content field against the issue's own
    /// variables. See [`Issue::render_with`].
    pub fn render(&mut self) -> Result<(), IssueError> {
        let vars = self.vars.clone();
        self.render_with(&vars)
    }

    /// Validates, then substitutes `vars` into every non-null content
    /// field in place and marks the issue rendered.
    ///
    /// Unknown placeholders render as empty text. Nothing is written
    /// unless every field renders, so a failure leaves the issue intact.
    pub fn render_with(&mut self, vars: &VarMap) -> Result<(), IssueError> {
        self.validate()?;

        let env = Environment::new();
        let jira_project = rendered_value(&env, "jira_project", self.jira_project.as_deref(), vars)?;
        let summary = rendered_value(&env, "summary", self.summary.as_deref(), vars)?;
        let epic_name = rendered_value(&env, "epic_name", self.epic_name.as_deref(), vars)?;
        let description = rendered_value(&env, "description", self.description.as_deref(), vars)?;

        // Direct writes: the setters would clear the flag being set below.
        self.jira_project = jira_project;
        self.summary = summary;
        self.epic_name = epic_name;
        self.description = description;
        self.rendered = true;
        Ok(())
    }

    // ===== Getters =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn kind(&self) -> Option<&IssueKind> {
        self.kind.as_ref()
    }

    pub fn order(&self) -> Option<i64> {
        self.order
    }

    pub fn jira_project(&self) -> Option<&str> {
        self.jira_project.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn epic_name(&self) -> Option<&str> {
        self.epic_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn vars(&self) -> &VarMap {
        &self.vars
    }

    pub fn remote_key(&self) -> Option<&str> {
        self.remote_key.as_deref()
    }

    /// Whether the content fields currently hold rendered text.
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    // ===== Setters =====
    // Content setters clear the rendered flag; structural setters do not.

    pub fn set_jira_project(&mut self, value: impl Into<String>) {
        self.jira_project = Some(value.into());
        self.rendered = false;
    }

    pub fn set_summary(&mut self, value: impl Into<String>) {
        self.summary = Some(value.into());
        self.rendered = false;
    }

    pub fn set_epic_name(&mut self, value: impl Into<String>) {
        self.epic_name = Some(value.into());
        self.rendered = false;
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = Some(value.into());
        self.rendered = false;
    }

    pub fn set_parent(&mut self, value: impl Into<String>) {
        self.parent = Some(value.into());
    }

    pub fn set_kind(&mut self, kind: IssueKind) {
        self.kind = Some(kind);
    }

    pub fn set_order(&mut self, order: i64) {
        self.order = Some(order);
    }

    pub fn set_vars(&mut self, vars: VarMap) {
        self.vars = vars;
    }

    /// Records the key assigned by the tracker once the issue exists
    /// remotely.
    pub fn set_remote_key(&mut self, key: impl Into<String>) {
        self.remote_key = Some(key.into());
    }

    fn content_fields(&self) -> [(&'static str, Option<&String>); 4] {
        [
            ("jira_project", self.jira_project.as_ref()),
            ("summary", self.summary.as_ref()),
            ("epic_name", self.epic_name.as_ref()),
            ("description", self.description.as_ref()),
        ]
    }
}

fn opt_string(doc: &Value, field: &'static str) -> Result<Option<String>, IssueError> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(IssueError::FieldType {
            field,
            expected: "a string",
        }),
    }
}

fn opt_order(doc: &Value) -> Result<Option<i64>, IssueError> {
    match doc.get("order") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or(IssueError::FieldType {
            field: "order",
            expected: "an integer",
        }),
        Some(_) => Err(IssueError::FieldType {
            field: "order",
            expected: "an integer",
        }),
    }
}

fn opt_vars(doc: &Value) -> Result<VarMap, IssueError> {
    match doc.get("vars") {
        None | Some(Value::Null) => Ok(VarMap::new()),
        Some(Value::Mapping(mapping)) => {
            let mut vars = VarMap::new();
            for (key, value) in mapping {
                let Some(key) = key.as_str() else {
                    return Err(IssueError::FieldType {
                        field: "vars",
                        expected: "a mapping with string keys",
                    });
                };
                vars.insert(key.to_owned(), value.clone());
            }
            Ok(vars)
        }
        Some(_) => Err(IssueError::FieldType {
            field: "vars",
            expected: "a mapping with string keys",
        }),
    }
}

fn rendered_value(
    env: &Environment<'_>,
    field: &'static str,
    text: Option<&str>,
    vars: &VarMap,
) -> Result<Option<String>, IssueError> {
    match text {
        None => Ok(None),
        Some(text) => env
            .render_str(text, vars)
            .map(Some)
            .map_err(|source| IssueError::Template { field, source }),
    }
}

/// Builder for constructing an [`Issue`] without going through YAML.
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    /// Creates a new builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            issue: Issue {
                name: name.into(),
                parent: None,
                kind: None,
                order: None,
                jira_project: None,
                summary: None,
                epic_name: None,
                description: None,
                vars: VarMap::new(),
                remote_key: None,
                rendered: false,
            },
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.issue.parent = Some(parent.into());
        self
    }

    pub fn kind(mut self, kind: IssueKind) -> Self {
        self.issue.kind = Some(kind);
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.issue.order = Some(order);
        self
    }

    pub fn jira_project(mut self, project: impl Into<String>) -> Self {
        self.issue.jira_project = Some(project.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.issue.summary = Some(summary.into());
        self
    }

    pub fn epic_name(mut self, epic_name: impl Into<String>) -> Self {
        self.issue.epic_name = Some(epic_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = Some(description.into());
        self
    }

    pub fn vars(mut self, vars: VarMap) -> Self {
        self.issue.vars = vars;
        self
    }

    /// Consumes the builder and returns the constructed [`Issue`].
    pub fn build(self) -> Issue {
        self.issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn minimal_story() -> IssueBuilder {
        IssueBuilder::new("deploy")
            .kind(IssueKind::Story)
            .jira_project("OPS")
            .summary("Deploy the service")
    }

    #[test]
    fn from_yaml_full_definition() {
        let doc = yaml(
            r#"
            name: deploy
            parent: launch
            issuetype: story
            order: 2
            jira_project: OPS
            summary: Deploy {{ release }}
            description: Ship it
            vars:
              release: "1.2"
            "#,
        );
        let issue = Issue::from_yaml(&doc).unwrap();
        assert_eq!(issue.name(), "deploy");
        assert_eq!(issue.parent(), Some("launch"));
        assert_eq!(issue.kind(), Some(&IssueKind::Story));
        assert_eq!(issue.order(), Some(2));
        assert_eq!(issue.jira_project(), Some("OPS"));
        assert_eq!(issue.summary(), Some("Deploy {{ release }}"));
        assert_eq!(issue.description(), Some("Ship it"));
        assert_eq!(
            issue.vars().get("release"),
            Some(&Value::String("1.2".into()))
        );
        assert!(!issue.is_rendered());
    }

    #[test]
    fn from_yaml_rejects_unknown_keys_batched() {
        let doc = yaml("{name: a, speed: 1, wheels: 4}");
        match Issue::from_yaml(&doc) {
            Err(IssueError::UnknownKeys { keys }) => {
                assert_eq!(keys, vec!["speed".to_owned(), "wheels".to_owned()]);
            }
            other => panic!("expected UnknownKeys, got {:?}", other),
        }
    }

    #[test]
    fn from_yaml_rejects_non_mapping() {
        let doc = yaml("[1, 2, 3]");
        assert!(matches!(
            Issue::from_yaml(&doc),
            Err(IssueError::NotAMapping)
        ));
    }

    #[test]
    fn from_yaml_requires_name() {
        let doc = yaml("{issuetype: epic}");
        assert!(matches!(
            Issue::from_yaml(&doc),
            Err(IssueError::NameRequired)
        ));
        let doc = yaml("{name: ''}");
        assert!(matches!(
            Issue::from_yaml(&doc),
            Err(IssueError::NameRequired)
        ));
    }

    #[test]
    fn from_yaml_rejects_non_integer_order() {
        let doc = yaml("{name: a, order: soon}");
        match Issue::from_yaml(&doc) {
            Err(IssueError::FieldType { field, .. }) => assert_eq!(field, "order"),
            other => panic!("expected FieldType, got {:?}", other),
        }
    }

    #[test]
    fn from_yaml_rejects_non_mapping_vars() {
        let doc = yaml("{name: a, vars: [1, 2]}");
        match Issue::from_yaml(&doc) {
            Err(IssueError::FieldType { field, .. }) => assert_eq!(field, "vars"),
            other => panic!("expected FieldType, got {:?}", other),
        }
    }

    #[test]
    fn from_yaml_accepts_preset_jira_id() {
        let doc = yaml("{name: a, jira_id: OPS-17}");
        let issue = Issue::from_yaml(&doc).unwrap();
        assert_eq!(issue.remote_key(), Some("OPS-17"));
    }

    #[test]
    fn validate_passes_with_required_fields() {
        assert!(minimal_story().build().validate().is_ok());
    }

    #[test]
    fn validate_reports_all_missing_fields() {
        let issue = IssueBuilder::new("a").build();
        match issue.validate() {
            Err(IssueError::MissingFields { fields }) => {
                assert_eq!(fields, vec!["jira_project", "issuetype", "summary"]);
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn validate_reports_single_missing_field() {
        let issue = IssueBuilder::new("a")
            .kind(IssueKind::Story)
            .jira_project("OPS")
            .build();
        match issue.validate() {
            Err(IssueError::MissingFields { fields }) => {
                assert_eq!(fields, vec!["summary"]);
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn subtask_without_parent_fails() {
        let issue = IssueBuilder::new("a")
            .kind(IssueKind::Subtask)
            .jira_project("OPS")
            .summary("s")
            .build();
        assert!(matches!(
            issue.validate(),
            Err(IssueError::NeedsParent { .. })
        ));
    }

    #[test]
    fn subtask_with_parent_passes() {
        let issue = IssueBuilder::new("a")
            .kind(IssueKind::Subtask)
            .parent("b")
            .jira_project("OPS")
            .summary("s")
            .build();
        assert!(issue.validate().is_ok());
    }

    #[test]
    fn epic_without_parent_passes() {
        let issue = IssueBuilder::new("a")
            .kind(IssueKind::Epic)
            .jira_project("OPS")
            .summary("s")
            .build();
        assert!(issue.validate().is_ok());
    }

    #[test]
    fn validate_names_field_with_bad_template() {
        let issue = minimal_story().description("{% broken").build();
        match issue.validate() {
            Err(IssueError::Template { field, .. }) => assert_eq!(field, "description"),
            other => panic!("expected Template, got {:?}", other),
        }
    }

    #[test]
    fn render_substitutes_all_content_fields() {
        let mut issue = minimal_story()
            .summary("Deploy {{ release }}")
            .description("{{ team }} owns this")
            .build();
        let mut vars = VarMap::new();
        vars.insert("release".into(), Value::String("1.2".into()));
        vars.insert("team".into(), Value::String("core".into()));
        issue.render_with(&vars).unwrap();
        assert_eq!(issue.summary(), Some("Deploy 1.2"));
        assert_eq!(issue.description(), Some("core owns this"));
        assert!(issue.is_rendered());
    }

    #[test]
    fn render_uses_own_vars_by_default() {
        let doc = yaml(
            r#"
            name: deploy
            issuetype: story
            jira_project: OPS
            summary: Deploy {{ release }}
            vars:
              release: "2.0"
            "#,
        );
        let mut issue = Issue::from_yaml(&doc).unwrap();
        issue.render().unwrap();
        assert_eq!(issue.summary(), Some("Deploy 2.0"));
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        let mut issue = minimal_story().summary("Hello {{ nobody }}!").build();
        issue.render_with(&VarMap::new()).unwrap();
        assert_eq!(issue.summary(), Some("Hello !"));
    }

    #[test]
    fn render_fails_validation_first() {
        let mut issue = IssueBuilder::new("a").build();
        assert!(matches!(
            issue.render_with(&VarMap::new()),
            Err(IssueError::MissingFields { .. })
        ));
    }

    #[test]
    fn content_setter_clears_rendered_flag() {
        let mut issue = minimal_story().build();
        issue.render_with(&VarMap::new()).unwrap();
        assert!(issue.is_rendered());
        issue.set_summary("new text");
        assert!(!issue.is_rendered());
    }

    #[test]
    fn structural_setter_keeps_rendered_flag() {
        let mut issue = minimal_story().build();
        issue.render_with(&VarMap::new()).unwrap();
        issue.set_order(3);
        assert!(issue.is_rendered());
    }
}
