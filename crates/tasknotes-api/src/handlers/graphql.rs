//! GraphQL search endpoint.
//!
//! One query root with `search` and `searchNotes`, both returning the
//! unified, cached result set. Field and argument names are snake_case to
//! match the REST payloads.

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, Schema, SimpleObject,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, http::HeaderMap};
use chrono::{DateTime, SecondsFormat, Utc};

use tasknotes_core::{
    Category, Error, RequestSource, SearchRequest, Tag, UnifiedSearchResponse,
    UnifiedSearchResult,
};

use crate::router::AppState;
use crate::services::SearchService;

pub type SearchSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// User id taken from a validated bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i32);

pub fn build_schema(search: SearchService) -> SearchSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(search)
        .finish()
}

/// Typed field arguments, converted once into a [`SearchRequest`].
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub query: Option<String>,
    pub user_id: Option<i32>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub limit: i32,
    pub skip: i32,
    pub offset: i32,
}

impl SearchArgs {
    /// A token's user id overrides the argument.
    pub fn into_request(self, token_user: Option<AuthUser>) -> Result<SearchRequest, Error> {
        let user_id = token_user
            .map(|AuthUser(id)| id)
            .or(self.user_id)
            .ok_or_else(|| Error::InvalidInput("user_id is required".to_string()))?;
        let skip = if self.offset != 0 { self.offset } else { self.skip };

        let mut request = SearchRequest::new(user_id, self.query.unwrap_or_default())
            .with_limit(self.limit)
            .with_skip(skip)
            .with_tags(self.tags.unwrap_or_default());
        if let Some(category) = self.category {
            request = request.with_category(category);
        }
        Ok(request)
    }
}

#[derive(SimpleObject)]
#[graphql(name = "CategorySummary")]
pub struct CategoryObject {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl From<&Category> for CategoryObject {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            color: c.color.clone(),
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "TagSummary")]
pub struct TagObject {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl From<&Tag> for TagObject {
    fn from(t: &Tag) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            color: t.color.clone(),
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "UnifiedSearchResult", rename_fields = "snake_case")]
pub struct ResultObject {
    pub id: String,
    #[graphql(name = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
    pub user_id: i32,
    pub category: Option<CategoryObject>,
    pub tags: Vec<TagObject>,
    pub created_at: String,
    pub updated_at: String,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

impl ResultObject {
    fn new(result: &UnifiedSearchResult, user_id: i32) -> Self {
        Self {
            id: result.id.clone(),
            kind: result.kind.as_str().to_string(),
            title: result.title.clone(),
            content: result.content.clone(),
            user_id,
            category: result.category.as_ref().map(CategoryObject::from),
            tags: result.tags.iter().map(TagObject::from).collect(),
            created_at: rfc3339(result.created_at.unwrap_or(result.updated_at)),
            updated_at: rfc3339(result.updated_at),
            completed: result.completed,
            priority: result.priority.clone(),
            due_date: result.due_date.clone(),
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "UnifiedSearchResponse", rename_fields = "snake_case")]
pub struct ResponseObject {
    pub results: Vec<ResultObject>,
    pub total: i64,
    pub notes_count: i64,
    pub tasks_count: i64,
}

impl ResponseObject {
    fn new(response: &UnifiedSearchResponse, user_id: i32) -> Self {
        Self {
            results: response
                .results
                .iter()
                .map(|r| ResultObject::new(r, user_id))
                .collect(),
            total: response.total,
            notes_count: response.notes,
            tasks_count: response.tasks,
        }
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn to_graphql_error(err: Error) -> async_graphql::Error {
    let code = match &err {
        Error::InvalidInput(_) => "BAD_USER_INPUT",
        Error::Unauthorized(_) => "UNAUTHENTICATED",
        Error::Upstream { .. } => "UPSTREAM_ERROR",
        Error::Timeout { .. } => "UPSTREAM_TIMEOUT",
        _ => "INTERNAL_SERVER_ERROR",
    };
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

pub struct QueryRoot;

impl QueryRoot {
    async fn run(&self, ctx: &Context<'_>, args: SearchArgs) -> async_graphql::Result<ResponseObject> {
        let service = ctx.data::<SearchService>()?;
        let token_user = ctx.data_opt::<AuthUser>().copied();

        let request = args.into_request(token_user).map_err(to_graphql_error)?;
        let user_id = request.user_id;
        let search_ctx = service.context(RequestSource::Graphql);

        let response = service
            .search(request, &search_ctx)
            .await
            .map_err(to_graphql_error)?;
        Ok(ResponseObject::new(&response, user_id))
    }
}

#[Object(rename_args = "snake_case")]
impl QueryRoot {
    /// Unified search over the caller's notes (and tasks when merged).
    #[allow(clippy::too_many_arguments)]
    async fn search(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        user_id: Option<i32>,
        category: Option<String>,
        tags: Option<Vec<String>>,
        #[graphql(default = 20)] limit: i32,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> async_graphql::Result<ResponseObject> {
        let args = SearchArgs {
            query,
            user_id,
            category,
            tags,
            limit,
            skip,
            offset,
        };
        self.run(ctx, args).await
    }

    /// Alias of `search`.
    #[graphql(name = "searchNotes")]
    #[allow(clippy::too_many_arguments)]
    async fn search_notes(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        user_id: Option<i32>,
        category: Option<String>,
        tags: Option<Vec<String>>,
        #[graphql(default = 20)] limit: i32,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> async_graphql::Result<ResponseObject> {
        let args = SearchArgs {
            query,
            user_id,
            category,
            tags,
            limit,
            skip,
            offset,
        };
        self.run(ctx, args).await
    }
}

/// GET and POST `/graphql`.
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    if let Some(user_id) = state.auth.user_id_from_headers(&headers) {
        request = request.data(AuthUser(user_id));
    }
    state.schema.execute(request).await.into()
}
