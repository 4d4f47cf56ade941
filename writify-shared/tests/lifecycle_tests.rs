//! Database-backed tests for the request lifecycle.
//!
//! Run with a live PostgreSQL:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/writify_test cargo test -p writify-shared -- --ignored
//! ```

mod common;

use chrono::{Duration, Utc};
use writify_shared::lifecycle::{
    accept_request, complete_assignment, create_request, submit_rating, CreateRequestInput,
    LifecycleError, SubmitRating,
};
use writify_shared::models::assignment::{Assignment, AssignmentStatus};
use writify_shared::models::request::RequestStatus;
use writify_shared::models::user::{User, WriterStatus};
use writify_shared::models::rating::Rating;

fn request_input(cost: f64) -> CreateRequestInput {
    CreateRequestInput {
        course_name: "Distributed Systems".to_string(),
        course_code: "CS402".to_string(),
        assignment_type: "Essay".to_string(),
        num_pages: 5,
        deadline: Utc::now() + Duration::days(3),
        estimated_cost: cost,
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_cost_normalization_persisted() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;

    let request = create_request(&pool, client.id, request_input(237.0))
        .await
        .unwrap();
    assert_eq!(request.estimated_cost, 250);
    assert_eq!(request.status, RequestStatus::Open);

    let request = create_request(&pool, client.id, request_input(225.0))
        .await
        .unwrap();
    assert_eq!(request.estimated_cost, 250);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_oversized_fields_truncated_not_rejected() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;

    let mut input = request_input(100.0);
    input.course_name = "x".repeat(400);
    input.course_code = "y".repeat(90);

    let request = create_request(&pool, client.id, input).await.unwrap();
    assert_eq!(request.course_name.chars().count(), 255);
    assert_eq!(request.course_code.chars().count(), 50);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_accept_claims_request_and_surfaces_contact() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", Some("9876543210")).await;
    let writer = common::create_user(&pool, "student", Some("1234509876")).await;

    let request = create_request(&pool, client.id, request_input(237.0))
        .await
        .unwrap();

    let accepted = accept_request(&pool, request.id, writer.id).await.unwrap();
    assert_eq!(accepted.request.status, RequestStatus::Assigned);
    assert_eq!(accepted.client_whatsapp.as_deref(), Some("9876543210"));

    // The writer is forced busy and the assignment is in progress.
    let writer = User::find_by_id(&pool, writer.id).await.unwrap().unwrap();
    assert_eq!(writer.writer_status, WriterStatus::Busy);

    let assignment = Assignment::find_by_request(&pool, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::InProgress);
    assert_eq!(assignment.writer_id, writer.id);
    assert_eq!(assignment.client_id, client.id);
    assert!(assignment.completed_at.is_none());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_single_winner_accept() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;
    let writer_a = common::create_user(&pool, "student", None).await;
    let writer_b = common::create_user(&pool, "student", None).await;

    let request = create_request(&pool, client.id, request_input(200.0))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        accept_request(&pool, request.id, writer_a.id),
        accept_request(&pool, request.id, writer_b.id),
    );

    // Exactly one writer wins; the loser sees a precondition failure.
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(LifecycleError::RequestNotOpen(_))));

    let (assignments,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM assignments WHERE request_id = $1")
            .bind(request.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(assignments, 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_accepting_assigned_request_fails() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;
    let writer = common::create_user(&pool, "student", None).await;
    let latecomer = common::create_user(&pool, "student", None).await;

    let request = create_request(&pool, client.id, request_input(150.0))
        .await
        .unwrap();
    accept_request(&pool, request.id, writer.id).await.unwrap();

    let result = accept_request(&pool, request.id, latecomer.id).await;
    assert!(matches!(result, Err(LifecycleError::RequestNotOpen(_))));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_complete_requires_the_assignment_writer() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;
    let writer = common::create_user(&pool, "student", None).await;
    let stranger = common::create_user(&pool, "student", None).await;

    let request = create_request(&pool, client.id, request_input(100.0))
        .await
        .unwrap();
    accept_request(&pool, request.id, writer.id).await.unwrap();
    let assignment = Assignment::find_by_request(&pool, request.id)
        .await
        .unwrap()
        .unwrap();

    let denied = complete_assignment(&pool, assignment.id, stranger.id).await;
    assert!(matches!(denied, Err(LifecycleError::NotAssignmentWriter)));

    let completed = complete_assignment(&pool, assignment.id, writer.id)
        .await
        .unwrap();
    assert_eq!(completed.status, AssignmentStatus::Completed);
    assert!(completed.completed_at.is_some());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_rating_triggers_completion() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;
    let writer = common::create_user(&pool, "student", None).await;

    let request = create_request(&pool, client.id, request_input(100.0))
        .await
        .unwrap();
    accept_request(&pool, request.id, writer.id).await.unwrap();

    let outcome = submit_rating(
        &pool,
        client.id,
        SubmitRating {
            rated_id: writer.id,
            assignment_request_id: request.id,
            score: 5,
            comment: Some("great work".to_string()),
        },
    )
    .await
    .unwrap();
    assert!(outcome.assignment_completed);

    let assignment = Assignment::find_by_request(&pool, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Completed);
    assert!(assignment.completed_at.is_some());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_idempotent_re_rating() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;
    let writer = common::create_user(&pool, "student", None).await;

    let request = create_request(&pool, client.id, request_input(100.0))
        .await
        .unwrap();
    accept_request(&pool, request.id, writer.id).await.unwrap();

    let rate = |score: i16| SubmitRating {
        rated_id: writer.id,
        assignment_request_id: request.id,
        score,
        comment: None,
    };

    submit_rating(&pool, client.id, rate(5)).await.unwrap();
    let rated = User::find_by_id(&pool, writer.id).await.unwrap().unwrap();
    assert_eq!(rated.rating, 5.0);
    assert_eq!(rated.total_ratings, 1);

    // Resubmission replaces the judgment, it does not double-count.
    submit_rating(&pool, client.id, rate(3)).await.unwrap();
    let rated = User::find_by_id(&pool, writer.id).await.unwrap().unwrap();
    assert_eq!(rated.rating, 3.0);
    assert_eq!(rated.total_ratings, 1);

    assert_eq!(Rating::count_for_rated(&pool, writer.id).await.unwrap(), 1);
    let row = Rating::find_by_rater_and_request(&pool, client.id, request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.score, 3);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_premature_rating_skips_completion() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", None).await;
    let writer = common::create_user(&pool, "student", None).await;

    // Never accepted: no assignment row exists.
    let request = create_request(&pool, client.id, request_input(100.0))
        .await
        .unwrap();

    let outcome = submit_rating(
        &pool,
        client.id,
        SubmitRating {
            rated_id: writer.id,
            assignment_request_id: request.id,
            score: 4,
            comment: None,
        },
    )
    .await
    .unwrap();

    assert!(!outcome.assignment_completed);
    let rated = User::find_by_id(&pool, writer.id).await.unwrap().unwrap();
    assert_eq!(rated.rating, 4.0);
    assert_eq!(rated.total_ratings, 1);
}

/// The end-to-end scenario: post, accept, complete, rate, re-rate.
#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_full_marketplace_scenario() {
    let pool = common::test_pool().await;
    let client = common::create_user(&pool, "student", Some("9870001111")).await;
    let writer = common::create_user(&pool, "student", Some("9870002222")).await;

    let request = create_request(&pool, client.id, request_input(237.0))
        .await
        .unwrap();
    assert_eq!(request.estimated_cost, 250);

    let accepted = accept_request(&pool, request.id, writer.id).await.unwrap();
    assert_eq!(accepted.request.status, RequestStatus::Assigned);
    assert_eq!(accepted.client_whatsapp.as_deref(), Some("9870001111"));

    let assignment = Assignment::find_by_request(&pool, request.id)
        .await
        .unwrap()
        .unwrap();
    let completed = complete_assignment(&pool, assignment.id, writer.id)
        .await
        .unwrap();
    assert_eq!(completed.status, AssignmentStatus::Completed);

    let rate = |score: i16| SubmitRating {
        rated_id: writer.id,
        assignment_request_id: request.id,
        score,
        comment: None,
    };
    submit_rating(&pool, client.id, rate(5)).await.unwrap();
    let rated = User::find_by_id(&pool, writer.id).await.unwrap().unwrap();
    assert_eq!((rated.rating, rated.total_ratings), (5.0, 1));

    submit_rating(&pool, client.id, rate(3)).await.unwrap();
    let rated = User::find_by_id(&pool, writer.id).await.unwrap().unwrap();
    assert_eq!((rated.rating, rated.total_ratings), (3.0, 1));
}
