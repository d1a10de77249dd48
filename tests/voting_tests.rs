mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::atomic::Ordering;

use common::{closed_dates, error_code, open_dates, spawn_app, upcoming_dates};
use jamhub::services::{Resolution, WinnerResolver};

fn project_ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["projectId"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_submission_rules() {
    let app = spawn_app().await;
    let alice = app.login("Alice", false).await;
    let open = app.seed_jam("Open Jam", open_dates(), false).await;
    let closed = app.seed_jam("Old Jam", closed_dates(), false).await;
    let upcoming = app.seed_jam("Future Jam", upcoming_dates(), false).await;
    app.projects.add(100, "alice");
    app.projects.add(200, "Bob");

    let submit = |slug: &str| format!("/api/jams/{slug}/projects");

    // Rejected on both sides of the submission window.
    for slug in [&closed, &upcoming] {
        let (status, body) = app
            .call(Method::POST, &submit(slug), Some(&alice), Some(json!({ "projectId": 100 })))
            .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(error_code(&body), "jamNotOpen");
    }

    let (status, body) = app
        .call(Method::POST, &submit(&open), Some(&alice), Some(json!({ "projectId": 100 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["submittedBy"], "Alice");
    assert_eq!(body["data"]["selected"], false);

    let (status, body) = app
        .call(Method::POST, &submit(&open), Some(&alice), Some(json!({ "projectId": 100 })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "alreadySubmitted");

    let (status, body) = app
        .call(Method::POST, &submit(&open), Some(&alice), Some(json!({ "projectId": 200 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "notProjectOwner");

    let (status, body) = app
        .call(Method::POST, &submit(&open), Some(&alice), Some(json!({ "projectId": 300 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "externalProjectNotFound");

    app.projects.down.store(true, Ordering::SeqCst);
    let (status, body) = app
        .call(Method::POST, &submit(&open), Some(&alice), Some(json!({ "projectId": 300 })))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "upstreamUnavailable");

    let (status, _) = app
        .call(Method::POST, &submit(&open), None, Some(json!({ "projectId": 100 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(Method::POST, &submit(&open), Some(&alice), Some(json!({ "projectId": -4 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_withdraw_requires_owner_or_manager() {
    let app = spawn_app().await;
    let alice = app.login("Alice", false).await;
    let bob = app.login("Bob", false).await;
    let slug = app.seed_jam("Open Jam", open_dates(), false).await;
    app.seed_project(&slug, 1, "Alice", Utc::now()).await;
    app.seed_project(&slug, 2, "Alice", Utc::now()).await;
    app.store().add_manager(&slug, "Bob").await.unwrap();
    let carol = app.login("Carol", false).await;

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/jams/{slug}/projects/1"), Some(&carol), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/jams/{slug}/projects/1"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/jams/{slug}/projects/2"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/jams/{slug}/projects/2"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "projectNotFound");
}

#[tokio::test]
async fn test_upvote_cap() {
    let app = spawn_app().await;
    let voter = app.login("Voter", false).await;
    let slug = app.seed_jam("Open Jam", open_dates(), false).await;
    for id in 1..=4 {
        app.seed_project(&slug, id, "Maker", Utc::now()).await;
    }

    let upvote = |id: i64| format!("/api/jams/{slug}/projects/{id}/upvotes");

    for id in 1..=3 {
        let (status, body) = app.call(Method::POST, &upvote(id), Some(&voter), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["upvotes"], 1);
        assert_eq!(body["data"]["upvoted"], true);
    }

    let (status, body) = app.call(Method::POST, &upvote(4), Some(&voter), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(error_code(&body), "tooManyUpvotes");

    let (status, body) = app.call(Method::POST, &upvote(1), Some(&voter), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "alreadySubmitted");

    let remaining = format!("/api/jams/{slug}/upvotes/remaining");
    let (_, body) = app.call(Method::GET, &remaining, Some(&voter), None).await;
    assert_eq!(body["data"]["remaining"], 0);
    assert_eq!(body["data"]["cap"], 3);

    let (status, body) = app.call(Method::DELETE, &upvote(2), Some(&voter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["upvotes"], 0);

    let (status, body) = app.call(Method::DELETE, &upvote(2), Some(&voter), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "upvoteNotFound");

    let (status, _) = app.call(Method::POST, &upvote(4), Some(&voter), None).await;
    assert_eq!(status, StatusCode::OK);

    // Anonymous callers see the count without the flag.
    let (status, body) = app.call(Method::GET, &upvote(4), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["upvotes"], 1);
    assert!(body["data"].get("upvoted").is_none());

    let (status, _) = app.call(Method::POST, &upvote(99), Some(&voter), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_earliest_submission_wins_a_tie() {
    let app = spawn_app().await;
    let slug = app.seed_jam("Old Jam", closed_dates(), false).await;
    let base = Utc::now() - Duration::days(5);

    // Listed first but submitted later.
    app.seed_project(&slug, 10, "Late", base + Duration::hours(2)).await;
    app.seed_project(&slug, 20, "Early", base).await;
    app.seed_project(&slug, 30, "Quiet", base + Duration::hours(1)).await;

    // Two upvotes each for 10 and 20, one for 30.
    for (voter, targets) in [("VoterA", [10, 30]), ("VoterB", [10, 20]), ("VoterC", [20, 0])] {
        let token = app.login(voter, false).await;
        for id in targets.into_iter().filter(|id| *id != 0) {
            let (status, _) = app
                .call(
                    Method::POST,
                    &format!("/api/jams/{slug}/projects/{id}/upvotes"),
                    Some(&token),
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    let (status, body) = app
        .call(Method::GET, &format!("/api/jams/{slug}/winners"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project_ids(&body), vec![20]);
    assert_eq!(body["data"][0]["selectedByTheCommunity"], true);
    assert_eq!(body["data"][0]["upvotes"], 2);
}

#[tokio::test]
async fn test_winner_resolution_is_idempotent() {
    let app = spawn_app().await;
    let slug = app.seed_jam("Old Jam", closed_dates(), false).await;
    let base = Utc::now() - Duration::days(5);
    app.seed_project(&slug, 1, "One", base).await;
    app.seed_project(&slug, 2, "Two", base + Duration::hours(1)).await;
    app.store().insert_upvote(&slug, 2, "fan").await.unwrap();

    let resolver = WinnerResolver::new(app.store().clone());
    let first = resolver.resolve(&slug).await.unwrap();
    assert_eq!(first, Resolution::Winner(2));
    let snapshot = app.store().list_projects(&slug).await.unwrap();

    let second = resolver.resolve(&slug).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(app.store().list_projects(&slug).await.unwrap(), snapshot);

    let flagged: Vec<i64> = snapshot
        .iter()
        .filter(|p| p.selected_by_the_community)
        .map(|p| p.project_id)
        .collect();
    assert_eq!(flagged, vec![2]);
}

#[tokio::test]
async fn test_open_jam_has_no_community_winner() {
    let app = spawn_app().await;
    let slug = app.seed_jam("Open Jam", open_dates(), false).await;
    app.seed_project(&slug, 1, "One", Utc::now()).await;
    app.store().insert_upvote(&slug, 1, "fan").await.unwrap();

    let resolver = WinnerResolver::new(app.store().clone());
    assert_eq!(resolver.resolve(&slug).await.unwrap(), Resolution::NotClosed);

    let (status, body) = app
        .call(Method::GET, &format!("/api/jams/{slug}/winners"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(project_ids(&body).is_empty());
}

#[tokio::test]
async fn test_manual_selection_and_project_listing() {
    let app = spawn_app().await;
    let admin = app.login("Root", true).await;
    let manager = app.login("Judge", false).await;
    let viewer = app.login("Viewer", false).await;
    let slug = app.seed_jam("Old Jam", closed_dates(), false).await;
    app.store().add_manager(&slug, "Judge").await.unwrap();

    let base = Utc::now() - Duration::days(5);
    app.seed_project(&slug, 1, "One", base).await;
    app.seed_project(&slug, 2, "Two", base + Duration::hours(1)).await;
    app.call(Method::POST, &format!("/api/jams/{slug}/projects/2/upvotes"), Some(&viewer), None)
        .await;

    let select = format!("/api/jams/{slug}/projects/1/selected");
    let (status, _) = app.call(Method::PUT, &select, Some(&viewer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call(Method::PUT, &select, Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["selected"], true);

    let (_, body) = app
        .call(Method::GET, &format!("/api/jams/{slug}/winners"), None, None)
        .await;
    assert_eq!(project_ids(&body), vec![1, 2]);

    let (status, body) = app
        .call(Method::GET, &format!("/api/jams/{slug}/projects"), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project_ids(&body), vec![1, 2]);
    assert_eq!(body["data"][0]["upvoted"], false);
    assert_eq!(body["data"][1]["upvoted"], true);
    assert_eq!(body["data"][1]["upvotes"], 1);

    let (status, body) = app.call(Method::DELETE, &select, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["selected"], false);

    let (_, body) = app
        .call(Method::GET, &format!("/api/jams/{slug}/winners"), None, None)
        .await;
    assert_eq!(project_ids(&body), vec![2]);
}

#[tokio::test]
async fn test_withdrawing_the_winner_moves_the_title() {
    let app = spawn_app().await;
    let admin = app.login("Root", true).await;
    let slug = app.seed_jam("Old Jam", closed_dates(), false).await;
    let base = Utc::now() - Duration::days(5);
    app.seed_project(&slug, 1, "One", base).await;
    app.seed_project(&slug, 2, "Two", base + Duration::hours(1)).await;
    app.store().insert_upvote(&slug, 1, "fan").await.unwrap();
    app.store().insert_upvote(&slug, 1, "other").await.unwrap();
    app.store().insert_upvote(&slug, 2, "fan").await.unwrap();

    let winners = format!("/api/jams/{slug}/winners");
    let (_, body) = app.call(Method::GET, &winners, None, None).await;
    assert_eq!(project_ids(&body), vec![1]);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/jams/{slug}/projects/1"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call(Method::GET, &winners, None, None).await;
    assert_eq!(project_ids(&body), vec![2]);
}
