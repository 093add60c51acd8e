//! Protobuf bindings for the provider contracts in `proto/`.
//!
//! These mirror what `tonic-build` generates for the three proto files, kept
//! by hand so the build does not depend on `protoc`.

pub mod common {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TagSummary {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub name: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub color: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CategorySummary {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub name: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub color: ::prost::alloc::string::String,
    }
}

pub mod notes {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;

    use super::common::{CategorySummary, TagSummary};

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SearchNotesRequest {
        #[prost(string, tag = "1")]
        pub query: ::prost::alloc::string::String,
        #[prost(int32, tag = "2")]
        pub user_id: i32,
        #[prost(string, tag = "3")]
        pub category: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "4")]
        pub tags: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
        #[prost(int32, tag = "5")]
        pub limit: i32,
        #[prost(int32, tag = "6")]
        pub skip: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NoteSearchResult {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub title: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub content: ::prost::alloc::string::String,
        #[prost(string, tag = "4")]
        pub category_id: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "5")]
        pub tag_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
        #[prost(int32, tag = "6")]
        pub user_id: i32,
        #[prost(string, tag = "7")]
        pub created_at: ::prost::alloc::string::String,
        #[prost(string, tag = "8")]
        pub updated_at: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "9")]
        pub category: ::core::option::Option<CategorySummary>,
        #[prost(message, repeated, tag = "10")]
        pub tags: ::prost::alloc::vec::Vec<TagSummary>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SearchNotesResponse {
        #[prost(message, repeated, tag = "1")]
        pub notes: ::prost::alloc::vec::Vec<NoteSearchResult>,
        #[prost(int64, tag = "2")]
        pub total: i64,
    }

    /// Client for `notes_search.NotesSearchService`.
    #[derive(Debug, Clone)]
    pub struct NotesSearchServiceClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl NotesSearchServiceClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn search_notes(
            &mut self,
            mut request: tonic::Request<SearchNotesRequest>,
        ) -> std::result::Result<tonic::Response<SearchNotesResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {}", e)))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/notes_search.NotesSearchService/SearchNotes");
            request.extensions_mut().insert(tonic::GrpcMethod::new(
                "notes_search.NotesSearchService",
                "SearchNotes",
            ));
            self.inner.unary(request, path, codec).await
        }
    }
}

pub mod tasks {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;

    use super::common::{CategorySummary, TagSummary};

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SearchTasksRequest {
        #[prost(string, tag = "1")]
        pub query: ::prost::alloc::string::String,
        #[prost(int32, tag = "2")]
        pub user_id: i32,
        #[prost(string, tag = "3")]
        pub category: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "4")]
        pub tags: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
        #[prost(int32, tag = "5")]
        pub limit: i32,
        #[prost(int32, tag = "6")]
        pub skip: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TaskSearchResult {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub title: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub description: ::prost::alloc::string::String,
        #[prost(bool, tag = "4")]
        pub completed: bool,
        #[prost(string, tag = "5")]
        pub priority: ::prost::alloc::string::String,
        #[prost(string, tag = "6")]
        pub due_date: ::prost::alloc::string::String,
        #[prost(int32, tag = "7")]
        pub user_id: i32,
        #[prost(string, tag = "8")]
        pub created_at: ::prost::alloc::string::String,
        #[prost(string, tag = "9")]
        pub updated_at: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "10")]
        pub category: ::core::option::Option<CategorySummary>,
        #[prost(message, repeated, tag = "11")]
        pub tags: ::prost::alloc::vec::Vec<TagSummary>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SearchTasksResponse {
        #[prost(message, repeated, tag = "1")]
        pub tasks: ::prost::alloc::vec::Vec<TaskSearchResult>,
        #[prost(int64, tag = "2")]
        pub total: i64,
    }

    /// Client for `tasks_search.TasksSearchService`.
    #[derive(Debug, Clone)]
    pub struct TasksSearchServiceClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl TasksSearchServiceClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn search_tasks(
            &mut self,
            mut request: tonic::Request<SearchTasksRequest>,
        ) -> std::result::Result<tonic::Response<SearchTasksResponse>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {}", e)))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/tasks_search.TasksSearchService/SearchTasks");
            request.extensions_mut().insert(tonic::GrpcMethod::new(
                "tasks_search.TasksSearchService",
                "SearchTasks",
            ));
            self.inner.unary(request, path, codec).await
        }
    }
}
