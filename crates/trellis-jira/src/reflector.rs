//! Reflection driver -- mirrors an issue tree into the tracker, top-down.
//!
//! The driver plans the whole creation before the first request goes
//! out: structure and project checks run locally, then tickets are
//! created root first, children by ascending order, each subtask right
//! after its parent. Remote keys flow back into the tree as they are
//! assigned.

use std::collections::BTreeMap;

use thiserror::Error;
use trellis_config::config::JiraConfig;
use trellis_core::issue::Issue;
use trellis_core::kind::IssueKind;
use trellis_core::tree::{IssueTree, TreeError};

use crate::client::{NewTicket, ServiceError, TicketService};

/// Errors raised while reflecting a tree.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// The tree failed its structure checks.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Issues naming projects the remote instance does not know.
    /// Every offender is reported at once.
    #[error("unknown jira projects: {}", format_offenders(.offenders))]
    UnknownProjects { offenders: Vec<(String, String)> },

    /// An issue was not complete enough to turn into a ticket.
    #[error("issue {name} has no {field}")]
    IncompleteIssue { name: String, field: &'static str },

    /// The remote side failed before anything was created.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The remote side failed partway through creation. The tickets
    /// created up to that point are carried for cleanup.
    #[error("creation aborted after {} tickets: {source}", .created.len())]
    Aborted {
        created: Vec<CreatedTicket>,
        #[source]
        source: ServiceError,
    },
}

fn format_offenders(offenders: &[(String, String)]) -> String {
    offenders
        .iter()
        .map(|(issue, project)| format!("{issue} -> {project}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One ticket successfully created on the remote instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTicket {
    /// Local issue name.
    pub name: String,
    /// Key assigned by the tracker.
    pub key: String,
    /// 0 for the root, 1 for its children, 2 for grandchildren.
    pub depth: usize,
}

/// A creation step with its linkage deferred until the parent's key
/// exists.
struct Planned {
    name: String,
    depth: usize,
    parent: Option<String>,
    ticket: NewTicket,
}

/// Drives ticket creation against a [`TicketService`].
///
/// The remote project list is fetched once per reflector and cached, so
/// validating and then creating costs a single listing.
pub struct Reflector<S> {
    service: S,
    config: JiraConfig,
    project_cache: Option<BTreeMap<String, String>>,
}

impl<S: TicketService> Reflector<S> {
    pub fn new(service: S, config: JiraConfig) -> Self {
        Self {
            service,
            config,
            project_cache: None,
        }
    }

    /// Remote projects as key -> id, served from cache after the first
    /// fetch.
    fn projects(&mut self) -> Result<BTreeMap<String, String>, ReflectError> {
        if let Some(projects) = &self.project_cache {
            return Ok(projects.clone());
        }
        let projects = self.service.list_projects()?;
        tracing::debug!(count = projects.len(), "cached remote project list");
        self.project_cache = Some(projects.clone());
        Ok(projects)
    }

    /// Checks every reachable issue's project key against the remote
    /// project set, reporting all offenders together.
    pub fn validate(&mut self, tree: &IssueTree) -> Result<(), ReflectError> {
        let projects = self.projects()?;
        let mut offenders = Vec::new();
        for issue in tree.linearize() {
            match issue.jira_project() {
                Some(project) if projects.contains_key(project) => {}
                Some(project) => offenders.push((issue.name().to_owned(), project.to_owned())),
                None => offenders.push((issue.name().to_owned(), "(unset)".to_owned())),
            }
        }
        if offenders.is_empty() {
            Ok(())
        } else {
            Err(ReflectError::UnknownProjects { offenders })
        }
    }

    /// Creates every reachable issue remotely and writes the assigned
    /// keys back into the tree.
    ///
    /// All local checks run before the first request: a validated link
    /// refresh, the project check, and ticket planning. A remote failure
    /// mid-sequence aborts with the tickets created so far, so the
    /// caller can hand them to [`Reflector::tear_down`].
    pub fn create(&mut self, tree: &mut IssueTree) -> Result<Vec<CreatedTicket>, ReflectError> {
        tree.refresh_links(true)?;
        if tree.top().is_none() {
            return Err(ReflectError::Tree(TreeError::NoRoot));
        }
        self.validate(tree)?;

        let projects = self.projects()?;
        let plan = build_plan(tree, &projects, &self.config)?;

        let mut created: Vec<CreatedTicket> = Vec::new();
        let mut keys: BTreeMap<String, String> = BTreeMap::new();
        for step in plan {
            let mut ticket = step.ticket;
            if let Some(parent) = &step.parent {
                match step.depth {
                    1 => ticket.epic_link = keys.get(parent).cloned(),
                    _ => ticket.parent_key = keys.get(parent).cloned(),
                }
            }
            match self.service.create_ticket(&ticket) {
                Ok(key) => {
                    tracing::info!(name = %step.name, %key, "created ticket");
                    tree.set_remote_key(&step.name, &key);
                    keys.insert(step.name.clone(), key.clone());
                    created.push(CreatedTicket {
                        name: step.name,
                        key,
                        depth: step.depth,
                    });
                }
                Err(source) => {
                    tracing::warn!(name = %step.name, error = %source, "creation aborted");
                    return Err(ReflectError::Aborted { created, source });
                }
            }
        }
        Ok(created)
    }

    /// Deletes the given tickets in reverse creation order, best-effort.
    /// Failures do not stop the sweep; they are collected and returned.
    pub fn tear_down(
        &mut self,
        created: &[CreatedTicket],
    ) -> Vec<(CreatedTicket, ServiceError)> {
        let mut failures = Vec::new();
        for ticket in created.iter().rev() {
            match self.service.delete_ticket(&ticket.key) {
                Ok(()) => tracing::info!(key = %ticket.key, "deleted ticket"),
                Err(err) => {
                    tracing::warn!(key = %ticket.key, error = %err, "failed to delete ticket");
                    failures.push((ticket.clone(), err));
                }
            }
        }
        failures
    }
}

/// Turns the linearized tree into creation steps, failing on the first
/// issue too incomplete to reflect. No requests are made here.
fn build_plan(
    tree: &IssueTree,
    projects: &BTreeMap<String, String>,
    config: &JiraConfig,
) -> Result<Vec<Planned>, ReflectError> {
    let mut plan = Vec::new();
    for issue in tree.linearize() {
        let depth = match issue.parent() {
            None => 0,
            Some(parent) if Some(parent) == tree.top() => 1,
            Some(_) => 2,
        };
        plan.push(planned_for(issue, depth, projects, config)?);
    }
    Ok(plan)
}

fn planned_for(
    issue: &Issue,
    depth: usize,
    projects: &BTreeMap<String, String>,
    config: &JiraConfig,
) -> Result<Planned, ReflectError> {
    let Some(project) = issue.jira_project() else {
        return Err(ReflectError::IncompleteIssue {
            name: issue.name().to_owned(),
            field: "jira_project",
        });
    };
    let Some(project_id) = projects.get(project) else {
        return Err(ReflectError::UnknownProjects {
            offenders: vec![(issue.name().to_owned(), project.to_owned())],
        });
    };
    let Some(summary) = issue.summary() else {
        return Err(ReflectError::IncompleteIssue {
            name: issue.name().to_owned(),
            field: "summary",
        });
    };
    let Some(kind) = issue.kind() else {
        return Err(ReflectError::IncompleteIssue {
            name: issue.name().to_owned(),
            field: "issuetype",
        });
    };

    // Grandchildren take the instance's subtask label; everything above
    // keeps its own kind's label.
    let type_label = if depth == 2 {
        config.subtask_type.clone()
    } else {
        kind.type_label().to_owned()
    };

    // Only an epic root carries the epic name field, falling back to the
    // summary when no explicit epic name is set.
    let epic_name = if depth == 0 && *kind == IssueKind::Epic {
        Some(issue.epic_name().unwrap_or(summary).to_owned())
    } else {
        None
    };

    Ok(Planned {
        name: issue.name().to_owned(),
        depth,
        parent: issue.parent().map(str::to_owned),
        ticket: NewTicket {
            project_id: project_id.clone(),
            type_label,
            summary: summary.to_owned(),
            description: issue.description().map(str::to_owned),
            epic_name,
            epic_link: None,
            parent_key: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_core::issue::IssueBuilder;

    #[derive(Default)]
    struct FakeState {
        created: Vec<NewTicket>,
        deleted: Vec<String>,
        list_calls: usize,
    }

    /// In-memory stand-in for the remote side. Clones share state, so a
    /// test can keep a handle while the reflector owns the service.
    #[derive(Clone)]
    struct FakeService {
        state: Rc<RefCell<FakeState>>,
        projects: BTreeMap<String, String>,
        fail_at: Option<usize>,
        reject_deletes: bool,
    }

    impl FakeService {
        fn new() -> Self {
            let mut projects = BTreeMap::new();
            projects.insert("OPS".to_owned(), "10400".to_owned());
            Self {
                state: Rc::new(RefCell::new(FakeState::default())),
                projects,
                fail_at: None,
                reject_deletes: false,
            }
        }
    }

    impl TicketService for FakeService {
        fn list_projects(&mut self) -> Result<BTreeMap<String, String>, ServiceError> {
            self.state.borrow_mut().list_calls += 1;
            Ok(self.projects.clone())
        }

        fn create_ticket(&mut self, ticket: &NewTicket) -> Result<String, ServiceError> {
            let mut state = self.state.borrow_mut();
            if self.fail_at == Some(state.created.len()) {
                return Err(ServiceError::Status {
                    code: 500,
                    body: "boom".to_owned(),
                });
            }
            state.created.push(ticket.clone());
            Ok(format!("OPS-{}", state.created.len()))
        }

        fn delete_ticket(&mut self, key: &str) -> Result<(), ServiceError> {
            if self.reject_deletes {
                return Err(ServiceError::Forbidden);
            }
            self.state.borrow_mut().deleted.push(key.to_owned());
            Ok(())
        }
    }

    fn reflector(fake: &FakeService) -> Reflector<FakeService> {
        Reflector::new(fake.clone(), JiraConfig::default())
    }

    fn sample_tree() -> IssueTree {
        let mut tree = IssueTree::new();
        tree.add_issues([
            IssueBuilder::new("launch")
                .kind(IssueKind::Epic)
                .jira_project("OPS")
                .summary("Launch the product")
                .build(),
            IssueBuilder::new("backend")
                .parent("launch")
                .kind(IssueKind::Story)
                .order(1)
                .jira_project("OPS")
                .summary("Build the backend")
                .build(),
            IssueBuilder::new("frontend")
                .parent("launch")
                .kind(IssueKind::Story)
                .order(2)
                .jira_project("OPS")
                .summary("Build the frontend")
                .build(),
            IssueBuilder::new("schema")
                .parent("backend")
                .kind(IssueKind::Subtask)
                .jira_project("OPS")
                .summary("Design the schema")
                .build(),
        ]);
        tree
    }

    #[test]
    fn create_walks_the_tree_top_down() {
        let fake = FakeService::new();
        let mut tree = sample_tree();

        let report = reflector(&fake).create(&mut tree).unwrap();

        let names: Vec<&str> = report.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["launch", "backend", "schema", "frontend"]);
        let keys: Vec<&str> = report.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["OPS-1", "OPS-2", "OPS-3", "OPS-4"]);

        assert_eq!(tree.get("launch").unwrap().remote_key(), Some("OPS-1"));
        assert_eq!(tree.get("schema").unwrap().remote_key(), Some("OPS-3"));
        assert_eq!(tree.get("frontend").unwrap().remote_key(), Some("OPS-4"));
    }

    #[test]
    fn create_links_each_level_to_its_parent() {
        let fake = FakeService::new();
        let mut tree = sample_tree();

        reflector(&fake).create(&mut tree).unwrap();

        let state = fake.state.borrow();
        let root = &state.created[0];
        assert_eq!(root.type_label, "Epic");
        assert_eq!(root.project_id, "10400");
        assert_eq!(root.epic_name.as_deref(), Some("Launch the product"));
        assert_eq!(root.epic_link, None);

        let story = &state.created[1];
        assert_eq!(story.type_label, "Story");
        assert_eq!(story.epic_link.as_deref(), Some("OPS-1"));
        assert_eq!(story.parent_key, None);
        assert_eq!(story.epic_name, None);

        let subtask = &state.created[2];
        assert_eq!(subtask.type_label, "Sub-task");
        assert_eq!(subtask.parent_key.as_deref(), Some("OPS-2"));
        assert_eq!(subtask.epic_link, None);
    }

    #[test]
    fn explicit_epic_name_wins_over_summary() {
        let fake = FakeService::new();
        let mut tree = IssueTree::new();
        tree.add_issue(
            IssueBuilder::new("launch")
                .kind(IssueKind::Epic)
                .jira_project("OPS")
                .summary("Launch the product")
                .epic_name("Big Launch")
                .build(),
        );

        reflector(&fake).create(&mut tree).unwrap();

        let state = fake.state.borrow();
        assert_eq!(state.created[0].epic_name.as_deref(), Some("Big Launch"));
    }

    #[test]
    fn non_epic_root_carries_no_epic_name() {
        let fake = FakeService::new();
        let mut tree = IssueTree::new();
        tree.add_issue(
            IssueBuilder::new("cleanup")
                .kind(IssueKind::Story)
                .jira_project("OPS")
                .summary("Clean up the backlog")
                .build(),
        );

        reflector(&fake).create(&mut tree).unwrap();

        let state = fake.state.borrow();
        assert_eq!(state.created[0].epic_name, None);
    }

    #[test]
    fn validate_reports_every_unknown_project() {
        let fake = FakeService::new();
        let mut tree = sample_tree();
        let mut bad = tree.get("backend").unwrap().clone();
        bad.set_jira_project("WEB");
        tree.add_issue(bad);
        let mut bad = tree.get("frontend").unwrap().clone();
        bad.set_jira_project("APP");
        tree.add_issue(bad);

        match reflector(&fake).validate(&tree) {
            Err(ReflectError::UnknownProjects { offenders }) => {
                assert_eq!(
                    offenders,
                    vec![
                        ("backend".to_owned(), "WEB".to_owned()),
                        ("frontend".to_owned(), "APP".to_owned()),
                    ]
                );
            }
            other => panic!("expected UnknownProjects, got {:?}", other),
        }
    }

    #[test]
    fn create_fails_before_any_request_on_bad_structure() {
        let fake = FakeService::new();
        let mut tree = sample_tree();
        tree.add_issue(
            IssueBuilder::new("rival")
                .kind(IssueKind::Epic)
                .jira_project("OPS")
                .summary("A second root")
                .build(),
        );

        let result = reflector(&fake).create(&mut tree);
        assert!(matches!(
            result,
            Err(ReflectError::Tree(TreeError::MultipleRoots { .. }))
        ));
        assert_eq!(fake.state.borrow().list_calls, 0);
        assert!(fake.state.borrow().created.is_empty());
    }

    #[test]
    fn create_fails_before_any_creation_on_unknown_project() {
        let mut fake = FakeService::new();
        fake.projects.clear();
        let mut tree = sample_tree();

        let result = reflector(&fake).create(&mut tree);
        assert!(matches!(result, Err(ReflectError::UnknownProjects { .. })));
        assert!(fake.state.borrow().created.is_empty());
    }

    #[test]
    fn incomplete_issue_fails_before_any_creation() {
        let fake = FakeService::new();
        let mut tree = sample_tree();
        tree.add_issue(
            IssueBuilder::new("backend")
                .parent("launch")
                .kind(IssueKind::Story)
                .order(1)
                .jira_project("OPS")
                .build(),
        );

        match reflector(&fake).create(&mut tree) {
            Err(ReflectError::IncompleteIssue { name, field }) => {
                assert_eq!(name, "backend");
                assert_eq!(field, "summary");
            }
            other => panic!("expected IncompleteIssue, got {:?}", other),
        }
        assert!(fake.state.borrow().created.is_empty());
    }

    #[test]
    fn create_on_an_empty_tree_reports_no_root() {
        let fake = FakeService::new();
        let mut tree = IssueTree::new();

        let result = reflector(&fake).create(&mut tree);
        assert!(matches!(
            result,
            Err(ReflectError::Tree(TreeError::NoRoot))
        ));
        assert_eq!(fake.state.borrow().list_calls, 0);
    }

    #[test]
    fn project_list_is_fetched_once() {
        let fake = FakeService::new();
        let mut tree = sample_tree();
        let mut reflector = reflector(&fake);

        reflector.validate(&tree).unwrap();
        reflector.create(&mut tree).unwrap();

        assert_eq!(fake.state.borrow().list_calls, 1);
    }

    #[test]
    fn abort_carries_the_tickets_created_so_far() {
        let mut fake = FakeService::new();
        fake.fail_at = Some(2);
        let mut tree = sample_tree();

        match reflector(&fake).create(&mut tree) {
            Err(ReflectError::Aborted { created, source }) => {
                let names: Vec<&str> = created.iter().map(|t| t.name.as_str()).collect();
                assert_eq!(names, vec!["launch", "backend"]);
                assert!(matches!(source, ServiceError::Status { code: 500, .. }));
            }
            other => panic!("expected Aborted, got {:?}", other),
        }

        assert_eq!(tree.get("backend").unwrap().remote_key(), Some("OPS-2"));
        assert_eq!(tree.get("schema").unwrap().remote_key(), None);
        assert_eq!(tree.get("frontend").unwrap().remote_key(), None);
    }

    #[test]
    fn tear_down_deletes_in_reverse_creation_order() {
        let fake = FakeService::new();
        let mut tree = sample_tree();
        let mut reflector = reflector(&fake);

        let report = reflector.create(&mut tree).unwrap();
        let failures = reflector.tear_down(&report);

        assert!(failures.is_empty());
        assert_eq!(
            fake.state.borrow().deleted,
            vec!["OPS-4", "OPS-3", "OPS-2", "OPS-1"]
        );
    }

    #[test]
    fn tear_down_keeps_sweeping_past_failures() {
        let fake = FakeService::new();
        let mut tree = sample_tree();
        let mut reflector = reflector(&fake);
        let report = reflector.create(&mut tree).unwrap();

        let mut rejecting = fake.clone();
        rejecting.reject_deletes = true;
        let mut reflector = Reflector::new(rejecting, JiraConfig::default());
        let failures = reflector.tear_down(&report);

        assert_eq!(failures.len(), report.len());
        assert!(fake.state.borrow().deleted.is_empty());
    }
}
