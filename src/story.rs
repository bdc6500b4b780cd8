//! Stories (comments and system events) attached to a task.
//!
//! Stories are grouped by kind in the order the API returns them. Only the
//! comment group ever reaches a report; the rest are kept on the record.

use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{deserialize_api_date, fetch_data, person_name, Fetch, IdFields, PersonRef, ResourceId};
use crate::fields::StoryKind;

/// One comment or system event on a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: Option<ResourceId>,
    pub kind: StoryKind,
    pub text: String,
    pub created_at: Option<NaiveDate>,
    pub created_by: String,
}

#[derive(Deserialize)]
struct StoryPayload {
    #[serde(flatten)]
    ids: IdFields,
    #[serde(rename = "type")]
    kind: StoryKind,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_api_date")]
    created_at: Option<NaiveDate>,
    #[serde(default)]
    created_by: Option<PersonRef>,
}

impl Story {
    /// Parse one raw story record.
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let p: StoryPayload = serde_json::from_value(raw)?;
        Ok(Story {
            id: p.ids.resolve(),
            kind: p.kind,
            text: p.text.unwrap_or_default(),
            created_at: p.created_at,
            created_by: person_name(p.created_by),
        })
    }
}

/// Renders as `[YYYY-MM-DD] author: text`.
impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.created_at.map(|d| d.to_string()).unwrap_or_default();
        write!(f, "[{}] {}: {}", date, self.created_by, self.text)
    }
}

/// Stories of a task partitioned by kind.
///
/// Groups appear in order of first occurrence; stories within a group keep
/// API order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryGroups {
    groups: Vec<(StoryKind, Vec<Story>)>,
}

impl StoryGroups {
    pub fn from_stories(stories: impl IntoIterator<Item = Story>) -> Self {
        let mut groups: Vec<(StoryKind, Vec<Story>)> = Vec::new();
        for story in stories {
            match groups.iter_mut().find(|(kind, _)| *kind == story.kind) {
                Some((_, group)) => group.push(story),
                None => groups.push((story.kind.clone(), vec![story])),
            }
        }
        StoryGroups { groups }
    }

    /// Parse raw story records, skipping any that do not match the expected shape.
    pub fn from_json(raw: Vec<Value>, task_id: &ResourceId) -> Self {
        let stories = raw.into_iter().filter_map(|value| match Story::from_json(value) {
            Ok(story) => Some(story),
            Err(e) => {
                tracing::warn!(task = %task_id, error = %e, "Skipping malformed story");
                None
            }
        });
        StoryGroups::from_stories(stories)
    }

    pub fn get(&self, kind: &StoryKind) -> Option<&[Story]> {
        self.groups
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, stories)| stories.as_slice())
    }

    /// Total number of stories across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, s)| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Comments joined by newlines, or `None` when the task has no comments.
    pub fn comment_text(&self) -> Option<String> {
        let comments = self.get(&StoryKind::Comment)?;
        Some(
            comments
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Fetch and group the stories of a task. Any failure yields no stories.
pub fn fetch_stories(fetch: &dyn Fetch, task_id: &ResourceId) -> StoryGroups {
    let path = format!("/tasks/{}/stories", task_id);
    match fetch_data::<Vec<Value>>(fetch, &path) {
        Ok(raw) => {
            let groups = StoryGroups::from_json(raw.unwrap_or_default(), task_id);
            tracing::debug!(
                task = %task_id,
                stories = groups.len(),
                comments = groups.get(&StoryKind::Comment).map_or(0, |c| c.len()),
                "Fetched stories"
            );
            groups
        }
        Err(e) => {
            tracing::warn!(task = %task_id, error = %e, "Could not fetch stories");
            StoryGroups::default()
        }
    }
}
