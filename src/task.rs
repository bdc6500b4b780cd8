//! Task records and the recursive builder that assembles them from the API.
//!
//! A [`TaskRecord`] owns its stories and its subtasks. Building one issues, in
//! order, the task detail request, the stories request and the subtask list
//! request, then recurses depth-first into each subtask. Failures below the
//! project task list never abort the run: the affected node, story list or
//! subtask list is simply left out.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::{deserialize_api_date, fetch_data, person_name, Fetch, IdFields, PersonRef, ResourceId};
use crate::error::ApiResult;
use crate::story::{fetch_stories, StoryGroups};

/// A task or subtask with its stories and nested subtasks.
///
/// Fields are populated once during [`build_task`] and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    id: ResourceId,
    name: String,
    created_at: Option<NaiveDate>,
    due_on: Option<NaiveDate>,
    modified_at: Option<NaiveDate>,
    description: String,
    completed: bool,
    completed_on: Option<NaiveDate>,
    assignee: String,
    assignee_status: String,
    stories: StoryGroups,
    subtasks: Vec<TaskRecord>,
}

impl TaskRecord {
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> Option<NaiveDate> {
        self.created_at
    }

    pub fn due_on(&self) -> Option<NaiveDate> {
        self.due_on
    }

    pub fn modified_at(&self) -> Option<NaiveDate> {
        self.modified_at
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn completed_on(&self) -> Option<NaiveDate> {
        self.completed_on
    }

    /// Assignee name, empty when unassigned.
    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    pub fn assignee_status(&self) -> &str {
        &self.assignee_status
    }

    pub fn stories(&self) -> &StoryGroups {
        &self.stories
    }

    pub fn subtasks(&self) -> &[TaskRecord] {
        &self.subtasks
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.subtasks.iter().map(TaskRecord::node_count).sum::<usize>()
    }
}

/// Task detail payload from `/tasks/{id}`.
#[derive(Deserialize)]
struct TaskPayload {
    #[serde(flatten)]
    ids: IdFields,
    name: String,
    #[serde(default, deserialize_with = "deserialize_api_date")]
    created_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_api_date")]
    due_on: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_api_date")]
    modified_at: Option<NaiveDate>,
    #[serde(default)]
    notes: Option<String>,
    completed: bool,
    #[serde(default, deserialize_with = "deserialize_api_date")]
    completed_at: Option<NaiveDate>,
    #[serde(default)]
    assignee: Option<PersonRef>,
    #[serde(default)]
    assignee_status: Option<String>,
}

/// Entry of a project task list or a subtask list.
#[derive(Debug, Deserialize)]
pub struct TaskSummary {
    #[serde(flatten)]
    ids: IdFields,
    #[serde(default)]
    pub name: Option<String>,
}

impl TaskSummary {
    pub fn into_id(self) -> Option<ResourceId> {
        self.ids.resolve()
    }
}

/// Fetch the top-level task list of a project.
///
/// This is the only fetch whose failure is reported to the caller.
pub fn fetch_project_tasks(fetch: &dyn Fetch, project_id: &str) -> ApiResult<Vec<TaskSummary>> {
    let path = format!("/projects/{}/tasks", project_id);
    Ok(fetch_data::<Vec<TaskSummary>>(fetch, &path)?.unwrap_or_default())
}

/// Build every top-level task of a project, in API order.
pub fn build_project(fetch: &dyn Fetch, project_id: &str) -> ApiResult<Vec<TaskRecord>> {
    let summaries = fetch_project_tasks(fetch, project_id)?;
    tracing::info!(project = project_id, tasks = summaries.len(), "Fetched project task list");
    Ok(build_from_summaries(fetch, summaries, None))
}

fn build_from_summaries(
    fetch: &dyn Fetch,
    summaries: Vec<TaskSummary>,
    parent: Option<&ResourceId>,
) -> Vec<TaskRecord> {
    summaries
        .into_iter()
        .filter_map(|summary| {
            let name = summary.name.clone();
            match summary.into_id() {
                Some(id) => build_task(fetch, &id),
                None => {
                    tracing::warn!(parent = ?parent.map(|p| p.as_str()), name = ?name, "Skipping task entry without id");
                    None
                }
            }
        })
        .collect()
}

/// Build a task and its whole subtree.
///
/// Returns `None` when the task detail cannot be fetched or parsed.
pub fn build_task(fetch: &dyn Fetch, id: &ResourceId) -> Option<TaskRecord> {
    let path = format!("/tasks/{}", id);
    let payload = match fetch_data::<TaskPayload>(fetch, &path) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::warn!(task = %id, "Task detail is empty, skipping");
            return None;
        }
        Err(e) => {
            tracing::warn!(task = %id, error = %e, "Could not fetch task detail, skipping");
            return None;
        }
    };

    let id = payload.ids.resolve().unwrap_or_else(|| id.clone());
    let stories = fetch_stories(fetch, &id);
    let subtasks = fetch_subtasks(fetch, &id);
    tracing::debug!(task = %id, name = %payload.name, subtasks = subtasks.len(), "Built task");

    Some(TaskRecord {
        id,
        name: payload.name,
        created_at: payload.created_at,
        due_on: payload.due_on,
        modified_at: payload.modified_at,
        description: payload.notes.unwrap_or_default(),
        completed: payload.completed,
        completed_on: payload.completed_at,
        assignee: person_name(payload.assignee),
        assignee_status: payload.assignee_status.unwrap_or_default(),
        stories,
        subtasks,
    })
}

fn fetch_subtasks(fetch: &dyn Fetch, id: &ResourceId) -> Vec<TaskRecord> {
    let path = format!("/tasks/{}/subtasks", id);
    match fetch_data::<Vec<TaskSummary>>(fetch, &path) {
        Ok(summaries) => build_from_summaries(fetch, summaries.unwrap_or_default(), Some(id)),
        Err(e) => {
            tracing::warn!(task = %id, error = %e, "Could not fetch subtasks");
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::tests::FakeApi;
    use crate::fields::StoryKind;
    use crate::story::Story;
    use serde_json::{json, Value};

    /// Hand-built records for flattening and ordering tests.
    pub mod fixtures {
        use super::*;

        pub fn task(name: &str) -> TaskRecord {
            TaskRecord {
                id: ResourceId::new(name),
                name: name.to_string(),
                created_at: None,
                due_on: None,
                modified_at: None,
                description: String::new(),
                completed: false,
                completed_on: None,
                assignee: String::new(),
                assignee_status: String::new(),
                stories: StoryGroups::default(),
                subtasks: Vec::new(),
            }
        }

        pub fn created(mut t: TaskRecord, date: Option<NaiveDate>) -> TaskRecord {
            t.created_at = date;
            t
        }

        pub fn due(mut t: TaskRecord, date: Option<NaiveDate>) -> TaskRecord {
            t.due_on = date;
            t
        }

        pub fn closed(mut t: TaskRecord, on: Option<NaiveDate>) -> TaskRecord {
            t.completed = true;
            t.completed_on = on;
            t
        }

        pub fn with_subtasks(mut t: TaskRecord, subtasks: Vec<TaskRecord>) -> TaskRecord {
            t.subtasks = subtasks;
            t
        }

        pub fn with_comments(mut t: TaskRecord, comments: &[(&str, &str)]) -> TaskRecord {
            t.stories = StoryGroups::from_stories(comments.iter().map(|(who, text)| Story {
                id: None,
                kind: StoryKind::Comment,
                text: text.to_string(),
                created_at: NaiveDate::from_ymd_opt(2014, 3, 1),
                created_by: who.to_string(),
            }));
            t
        }
    }

    fn detail(id: u64, name: &str) -> Value {
        json!({"data": {
            "id": id,
            "name": name,
            "created_at": "2014-01-02T10:00:00.000Z",
            "due_on": "2014-02-01",
            "modified_at": "2014-01-05T08:00:00.000Z",
            "notes": "some notes",
            "completed": false,
            "completed_at": null,
            "assignee": {"id": 77, "name": "Dana"},
            "assignee_status": "upcoming"
        }})
    }

    fn list(ids: &[u64]) -> Value {
        json!({"data": ids.iter().map(|id| json!({"id": id, "name": format!("t{id}")})).collect::<Vec<_>>()})
    }

    fn empty() -> Value {
        json!({"data": []})
    }

    #[test]
    fn test_build_task_parses_detail() {
        let api = FakeApi::default()
            .with("/tasks/1", detail(1, "Root"))
            .with("/tasks/1/stories", empty())
            .with("/tasks/1/subtasks", empty());

        let task = build_task(&api, &ResourceId::new("1")).unwrap();
        assert_eq!(task.id().as_str(), "1");
        assert_eq!(task.name(), "Root");
        assert_eq!(task.created_at(), NaiveDate::from_ymd_opt(2014, 1, 2));
        assert_eq!(task.due_on(), NaiveDate::from_ymd_opt(2014, 2, 1));
        assert_eq!(task.modified_at(), NaiveDate::from_ymd_opt(2014, 1, 5));
        assert_eq!(task.description(), "some notes");
        assert!(!task.completed());
        assert_eq!(task.completed_on(), None);
        assert_eq!(task.assignee(), "Dana");
        assert_eq!(task.assignee_status(), "upcoming");
        assert!(task.stories().is_empty());
        assert!(task.subtasks().is_empty());
    }

    #[test]
    fn test_null_assignee_is_empty() {
        let api = FakeApi::default().with(
            "/tasks/2",
            json!({"data": {"gid": "2", "name": "Loose", "completed": true,
                            "completed_at": "2014-04-01T00:00:00Z", "assignee": null, "notes": null}}),
        );
        let task = build_task(&api, &ResourceId::new("2")).unwrap();
        assert_eq!(task.assignee(), "");
        assert_eq!(task.description(), "");
        assert!(task.completed());
        assert_eq!(task.completed_on(), NaiveDate::from_ymd_opt(2014, 4, 1));
    }

    #[test]
    fn test_fetch_order_is_depth_first() {
        let api = FakeApi::default()
            .with("/tasks/1", detail(1, "Root"))
            .with("/tasks/1/stories", empty())
            .with("/tasks/1/subtasks", list(&[2, 3]))
            .with("/tasks/2", detail(2, "A"))
            .with("/tasks/2/stories", empty())
            .with("/tasks/2/subtasks", list(&[4]))
            .with("/tasks/4", detail(4, "A.1"))
            .with("/tasks/4/stories", empty())
            .with("/tasks/4/subtasks", empty())
            .with("/tasks/3", detail(3, "B"))
            .with("/tasks/3/stories", empty())
            .with("/tasks/3/subtasks", empty());

        let task = build_task(&api, &ResourceId::new("1")).unwrap();
        assert_eq!(task.node_count(), 4);
        let names: Vec<&str> = task.subtasks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(task.subtasks()[0].subtasks()[0].name(), "A.1");

        let calls = api.calls.borrow();
        assert_eq!(
            *calls,
            vec![
                "/tasks/1", "/tasks/1/stories", "/tasks/1/subtasks",
                "/tasks/2", "/tasks/2/stories", "/tasks/2/subtasks",
                "/tasks/4", "/tasks/4/stories", "/tasks/4/subtasks",
                "/tasks/3", "/tasks/3/stories", "/tasks/3/subtasks",
            ]
        );
    }

    #[test]
    fn test_failed_subtask_is_skipped() {
        let api = FakeApi::default()
            .with("/tasks/1", detail(1, "Root"))
            .with("/tasks/1/subtasks", list(&[2, 3]))
            .with("/tasks/3", detail(3, "B"))
            .with("/tasks/3/stories", empty())
            .with("/tasks/3/subtasks", empty())
            .with("/tasks/2", json!({"data": null}));

        // Root stories missing and subtask 2 has no detail: neither is fatal.
        let task = build_task(&api, &ResourceId::new("1")).unwrap();
        assert!(task.stories().is_empty());
        assert_eq!(task.subtasks().len(), 1);
        assert_eq!(task.subtasks()[0].name(), "B");
    }

    #[test]
    fn test_malformed_detail_is_skipped() {
        let api = FakeApi::default().with("/tasks/5", json!({"data": {"id": 5}}));
        assert!(build_task(&api, &ResourceId::new("5")).is_none());
        assert!(build_task(&api, &ResourceId::new("6")).is_none());
    }

    #[test]
    fn test_build_project_propagates_list_failure() {
        let api = FakeApi::default();
        assert!(build_project(&api, "42").is_err());

        let api = FakeApi::default().with("/projects/42/tasks", json!({"data": {"not": "a list"}}));
        assert!(build_project(&api, "42").is_err());
    }

    #[test]
    fn test_build_project_skips_unbuildable_tasks() {
        let api = FakeApi::default()
            .with("/projects/42/tasks", list(&[1, 9]))
            .with("/tasks/1", detail(1, "Root"))
            .with("/tasks/1/stories", empty())
            .with("/tasks/1/subtasks", empty());

        let tasks = build_project(&api, "42").unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name(), "Root");
    }
}
