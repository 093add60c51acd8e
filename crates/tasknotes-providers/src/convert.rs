//! Conversions between provider wire messages and the unified model.

use tasknotes_core::{
    parse_optional_timestamp, parse_timestamp, Category, ResultKind, SearchRequest, Tag,
    UnifiedSearchResult,
};

use crate::proto::common::{CategorySummary, TagSummary};
use crate::proto::notes::{NoteSearchResult, SearchNotesRequest};
use crate::proto::tasks::{SearchTasksRequest, TaskSearchResult};

impl From<&SearchRequest> for SearchNotesRequest {
    fn from(req: &SearchRequest) -> Self {
        Self {
            query: req.query.clone(),
            user_id: req.user_id,
            category: req.category.clone().unwrap_or_default(),
            tags: req.tags.clone(),
            limit: req.limit,
            skip: req.skip,
        }
    }
}

impl From<&SearchRequest> for SearchTasksRequest {
    fn from(req: &SearchRequest) -> Self {
        Self {
            query: req.query.clone(),
            user_id: req.user_id,
            category: req.category.clone().unwrap_or_default(),
            tags: req.tags.clone(),
            limit: req.limit,
            skip: req.skip,
        }
    }
}

impl From<TagSummary> for Tag {
    fn from(t: TagSummary) -> Self {
        Tag {
            id: t.id,
            name: t.name,
            color: t.color,
        }
    }
}

/// An unset or nameless category is "absent", never an empty object.
fn category(summary: Option<CategorySummary>) -> Option<Category> {
    summary.filter(|c| !c.name.is_empty()).map(|c| Category {
        id: c.id,
        name: c.name,
        color: c.color,
    })
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

impl From<NoteSearchResult> for UnifiedSearchResult {
    fn from(note: NoteSearchResult) -> Self {
        UnifiedSearchResult {
            id: note.id,
            kind: ResultKind::Note,
            title: note.title,
            content: note.content,
            tags: note.tags.into_iter().map(Tag::from).collect(),
            category: category(note.category),
            updated_at: parse_timestamp(&note.updated_at),
            created_at: parse_optional_timestamp(&note.created_at),
            completed: None,
            priority: None,
            due_date: None,
        }
    }
}

impl From<TaskSearchResult> for UnifiedSearchResult {
    fn from(task: TaskSearchResult) -> Self {
        UnifiedSearchResult {
            id: task.id.to_string(),
            kind: ResultKind::Task,
            title: task.title,
            content: task.description,
            tags: task.tags.into_iter().map(Tag::from).collect(),
            category: category(task.category),
            updated_at: parse_timestamp(&task.updated_at),
            created_at: parse_optional_timestamp(&task.created_at),
            completed: Some(task.completed),
            priority: non_empty(task.priority),
            due_date: non_empty(task.due_date),
        }
    }
}
