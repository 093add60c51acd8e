//! Integration tests for the aggregation engine.
//!
//! These drive `SearchEngine` through the public API with fixed-page
//! providers: ordering, pagination, totals, and failure handling.

mod fixtures;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use fixtures::{note, task, FixedProvider};
use tasknotes_search::{
    Error, RequestSource, ResultKind, SearchContext, SearchEngine, SearchRequest,
};

fn ctx() -> SearchContext {
    SearchContext::new(RequestSource::Rest)
}

fn grocery_notes() -> FixedProvider {
    FixedProvider::notes(
        vec![
            note("a1", "Weekend plans", "hike", 12),
            note("b2", "Grocery list", "eggs, milk", 3),
            note("c3", "Recipes", "soup", 8),
        ],
        3,
    )
}

#[tokio::test]
async fn test_grocery_title_match_ranks_first() {
    let engine = SearchEngine::new(vec![Arc::new(grocery_notes())]);

    let response = engine
        .unified_search(
            SearchRequest::new(7, "grocery").with_limit(10).with_skip(0),
            &ctx(),
        )
        .await
        .unwrap();

    assert_eq!(response.results[0].id, "b2");
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.total, 3);
    assert_eq!(response.notes, 3);
    assert_eq!(response.tasks, 0);
}

#[tokio::test]
async fn test_skip_beyond_results_keeps_total() {
    let engine = SearchEngine::new(vec![Arc::new(grocery_notes())]);

    let response = engine
        .unified_search(SearchRequest::new(7, "grocery").with_skip(50), &ctx())
        .await
        .unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.total, 3);
}

#[tokio::test]
async fn test_repeated_search_is_identical() {
    let notes = FixedProvider::notes(
        vec![
            note("x", "same", "", 1),
            note("y", "same", "", 1),
            note("z", "same", "", 1),
        ],
        3,
    );
    let engine = SearchEngine::new(vec![Arc::new(notes)]);
    let req = SearchRequest::new(7, "same");

    let first = engine.unified_search(req.clone(), &ctx()).await.unwrap();
    let second = engine.unified_search(req, &ctx()).await.unwrap();

    assert_eq!(first, second);
    let ids: Vec<_> = first.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y", "z"]);
}

#[tokio::test]
async fn test_invalid_user_issues_no_provider_call() {
    let notes = grocery_notes();
    let calls = notes.calls.clone();
    let engine = SearchEngine::new(vec![Arc::new(notes)]);

    for user_id in [0, -7] {
        let err = engine
            .unified_search(SearchRequest::new(user_id, "grocery"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_failing_provider_aborts_search() {
    let engine = SearchEngine::new(vec![
        Arc::new(grocery_notes()),
        Arc::new(FixedProvider::broken(ResultKind::Task)),
    ]);

    let err = engine
        .unified_search(SearchRequest::new(7, "grocery"), &ctx())
        .await
        .unwrap_err();

    match err {
        Error::Upstream { provider, .. } => assert_eq!(provider, "task"),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pages_across_merged_providers() {
    let notes = FixedProvider::notes(
        vec![note("n1", "report", "", 5), note("n2", "report", "", 1)],
        2,
    );
    let tasks = FixedProvider::tasks(vec![task(17, "report draft", 3)], 1);
    let engine = SearchEngine::new(vec![Arc::new(notes), Arc::new(tasks)]);

    let page = engine
        .unified_search(
            SearchRequest::new(7, "report").with_limit(2).with_skip(1),
            &ctx(),
        )
        .await
        .unwrap();

    let ids: Vec<_> = page.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["17", "n2"]);
    assert_eq!(page.total, 3);
    assert_eq!(page.of_kind(ResultKind::Task).count(), 1);
}
