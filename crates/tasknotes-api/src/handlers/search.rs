//! REST search endpoints.
//!
//! `/` and `/search/notes` serve the merged, cached path and project note
//! results into the note DTO. `/search/tasks` serves the per-kind tasks
//! path. Both accept a JSON body on POST and a query string on GET.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tasknotes_core::{
    defaults, Category, RequestSource, ResultKind, SearchRequest, Tag, UnifiedSearchResult,
};

use crate::error::ApiError;
use crate::router::AppState;

/// POST body.
#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    pub query: Option<String>,
    pub user_id: Option<i64>,
    pub limit: Option<i32>,
    pub skip: Option<i32>,
    /// Overrides `skip` when non-zero.
    pub offset: Option<i32>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl SearchBody {
    pub fn into_request(self) -> Result<SearchRequest, ApiError> {
        let query = self
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("query is required".to_string()))?;
        let user_id = self
            .user_id
            .ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))?;
        let user_id = i32::try_from(user_id)
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::BadRequest("invalid user_id".to_string()))?;

        let skip = match self.offset {
            Some(offset) if offset != 0 => offset,
            _ => self.skip.unwrap_or(0),
        };

        let mut request = SearchRequest::new(user_id, query)
            .with_limit(self.limit.unwrap_or(defaults::PAGE_LIMIT))
            .with_skip(skip)
            .with_tags(self.tags.unwrap_or_default());
        if let Some(category) = self.category {
            request = request.with_category(category);
        }
        Ok(request)
    }
}

/// GET query string. Numbers that fail to parse are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
    pub offset: Option<String>,
    pub category: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
}

impl SearchParams {
    pub fn into_request(self) -> Result<SearchRequest, ApiError> {
        let query = self
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("query parameter is required".to_string()))?;
        let user_id = self
            .user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::BadRequest("user_id parameter is required".to_string()))?;
        let user_id = user_id
            .trim()
            .parse::<i32>()
            .map_err(|_| ApiError::BadRequest("invalid user_id".to_string()))?;

        let mut body = SearchBody {
            query: Some(query),
            user_id: Some(i64::from(user_id)),
            limit: parse_number(self.limit.as_deref()),
            skip: parse_number(self.skip.as_deref()),
            offset: parse_number(self.offset.as_deref()),
            category: self.category,
            tags: None,
        };
        body.tags = self.tags.map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        });
        body.into_request()
    }
}

fn parse_number(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

impl From<&Tag> for TagSummary {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.name.clone(),
            color: tag.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            color: category.color.clone(),
        }
    }
}

/// Note as the frontend expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDto {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagSummary>,
}

impl NoteDto {
    /// Results carry no owner, so the requesting user is stamped on.
    pub fn from_result(result: &UnifiedSearchResult, user_id: i32) -> Self {
        let category = result.category.as_ref().map(CategorySummary::from);
        Self {
            id: result.id.clone(),
            title: result.title.clone(),
            content: result.content.clone(),
            user_id,
            category_id: category.as_ref().map(|c| c.id.clone()),
            created_at: rfc3339(result.created_at.unwrap_or(result.updated_at)),
            updated_at: rfc3339(result.updated_at),
            category,
            tags: result.tags.iter().map(TagSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub user_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagSummary>,
}

impl TaskDto {
    pub fn from_result(result: &UnifiedSearchResult, user_id: i32) -> Self {
        let category = result.category.as_ref().map(CategorySummary::from);
        Self {
            id: result.id.clone(),
            title: result.title.clone(),
            description: result.content.clone(),
            completed: result.completed.unwrap_or(false),
            priority: result.priority.clone(),
            due_date: result.due_date.clone(),
            user_id,
            category_id: category.as_ref().map(|c| c.id.clone()),
            created_at: rfc3339(result.created_at.unwrap_or(result.updated_at)),
            updated_at: rfc3339(result.updated_at),
            category,
            tags: result.tags.iter().map(TagSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesResponse {
    pub notes: Vec<NoteDto>,
    pub total: i64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskDto>,
    pub total: i64,
    pub query: String,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn json_body(body: Result<Json<SearchBody>, JsonRejection>) -> Result<SearchBody, ApiError> {
    body.map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

async fn notes(state: &AppState, request: SearchRequest) -> Result<Json<NotesResponse>, ApiError> {
    let ctx = state.search.context(RequestSource::Rest);
    let query = request.query.clone();
    let user_id = request.user_id;

    let response = state.search.search(request, &ctx).await?;
    let notes: Vec<NoteDto> = response
        .of_kind(ResultKind::Note)
        .map(|r| NoteDto::from_result(r, user_id))
        .collect();

    // Only notes are listed, so only the notes total applies.
    debug!(user_id, result_count = notes.len(), total = response.notes, "Notes search served");
    Ok(Json(NotesResponse {
        notes,
        total: response.notes,
        query,
    }))
}

async fn tasks(state: &AppState, request: SearchRequest) -> Result<Json<TasksResponse>, ApiError> {
    let ctx = state.search.context(RequestSource::Rest);
    let query = request.query.clone();
    let user_id = request.user_id;

    let response = state
        .search
        .search_kind(ResultKind::Task, request, &ctx)
        .await?;
    let tasks: Vec<TaskDto> = response
        .of_kind(ResultKind::Task)
        .map(|r| TaskDto::from_result(r, user_id))
        .collect();

    debug!(user_id, result_count = tasks.len(), total = response.total, "Tasks search served");
    Ok(Json(TasksResponse {
        tasks,
        total: response.total,
        query,
    }))
}

/// POST `/` and `/search/notes`.
pub async fn search_notes(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<NotesResponse>, ApiError> {
    let request = json_body(body)?.into_request()?;
    notes(&state, request).await
}

/// GET `/` and `/search/notes`.
pub async fn search_notes_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<NotesResponse>, ApiError> {
    notes(&state, params.into_request()?).await
}

/// POST `/search/tasks`.
pub async fn search_tasks(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<TasksResponse>, ApiError> {
    let request = json_body(body)?.into_request()?;
    tasks(&state, request).await
}

/// GET `/search/tasks`.
pub async fn search_tasks_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<TasksResponse>, ApiError> {
    tasks(&state, params.into_request()?).await
}
