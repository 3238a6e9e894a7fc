//! Integration tests for LocalRepository.
//!
//! These tests cover filtering, sorting, pagination, the recurring-template
//! listing, occurrence existence checks and concurrent access patterns for
//! the in-memory repository implementation.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use dayflow::db::{LocalRepository, RepositoryError, ScheduleRepository};
use dayflow::models::{Pagination, RepeatType, Schedule, ScheduleFilter, SortBy, SortOrder};

fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn create_test_schedule(title: &str, start: &str) -> Schedule {
    let start = ts(start);
    Schedule::new(
        title,
        format!("description for {}", title),
        start,
        start + Duration::hours(1),
    )
}

fn recurring(title: &str, start: &str, repeat: RepeatType, until: Option<&str>) -> Schedule {
    let mut schedule = create_test_schedule(title, start);
    schedule.repeat_type = repeat;
    schedule.repeat_until = until.map(ts);
    schedule
}

// =========================================================
// CRUD and identity
// =========================================================

#[tokio::test]
async fn test_insert_get_delete_round_trip() {
    let repo = LocalRepository::new();
    let draft = create_test_schedule("Standup", "2025-08-05T09:00:00+07:00");

    repo.insert_batch(std::slice::from_ref(&draft)).await.unwrap();
    let stored = repo.get_by_id(&draft.id).await.unwrap();
    assert_eq!(stored.title, "Standup");
    assert!(stored.created_at.is_some(), "insert stamps created_at");

    repo.delete_by_id(&draft.id).await.unwrap();
    let err = repo.get_by_id(&draft.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_missing_id_is_not_found() {
    let repo = LocalRepository::new();
    let err = repo.delete_by_id("no-such-id").await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_all_empties_the_store() {
    let repo = LocalRepository::new();
    repo.insert_batch(&[
        create_test_schedule("A", "2025-08-05T07:00:00+07:00"),
        create_test_schedule("B", "2025-08-05T09:00:00+07:00"),
    ])
    .await
    .unwrap();

    repo.delete_all().await.unwrap();
    assert_eq!(repo.schedule_count(), 0);

    // Deleting an empty store is still fine
    repo.delete_all().await.unwrap();
}

#[tokio::test]
async fn test_insert_batch_rejects_cross_batch_duplicate() {
    let repo = LocalRepository::new();
    let first = create_test_schedule("Gym", "2025-08-05T18:00:00+07:00");
    repo.insert_batch(std::slice::from_ref(&first)).await.unwrap();

    // Same (title, start) but a different id still counts as a duplicate
    let clone = create_test_schedule("Gym", "2025-08-05T18:00:00+07:00");
    assert!(repo.insert_batch(std::slice::from_ref(&clone)).await.is_err());
    assert_eq!(repo.schedule_count(), 1);
}

#[tokio::test]
async fn test_duplicate_check_compares_instants_not_offsets() {
    let repo = LocalRepository::new();
    let first = create_test_schedule("Gym", "2025-08-05T18:00:00+07:00");
    repo.insert_batch(std::slice::from_ref(&first)).await.unwrap();

    // 11:00 UTC is the same instant as 18:00 +07:00
    let same_instant = create_test_schedule("Gym", "2025-08-05T11:00:00+00:00");
    assert!(repo
        .insert_batch(std::slice::from_ref(&same_instant))
        .await
        .is_err());
}

// =========================================================
// Occurrence existence and idempotent insert
// =========================================================

#[tokio::test]
async fn test_exists_by_title_and_start() {
    let repo = LocalRepository::new();
    let schedule = create_test_schedule("Review", "2025-08-06T10:00:00+07:00");
    repo.insert_batch(std::slice::from_ref(&schedule)).await.unwrap();

    assert!(repo
        .exists_by_title_and_start("Review", ts("2025-08-06T10:00:00+07:00"))
        .await
        .unwrap());
    assert!(repo
        .exists_by_title_and_start("Review", ts("2025-08-06T03:00:00+00:00"))
        .await
        .unwrap());
    assert!(!repo
        .exists_by_title_and_start("Review", ts("2025-08-07T10:00:00+07:00"))
        .await
        .unwrap());
    assert!(!repo
        .exists_by_title_and_start("Retro", ts("2025-08-06T10:00:00+07:00"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_insert_if_absent_is_idempotent() {
    let repo = LocalRepository::new();
    let schedule = create_test_schedule("Review", "2025-08-06T10:00:00+07:00");

    assert!(repo.insert_if_absent(&schedule).await.unwrap());
    assert!(!repo.insert_if_absent(&schedule).await.unwrap());
    assert_eq!(repo.schedule_count(), 1);
}

// =========================================================
// Filtering
// =========================================================

async fn seeded_repo() -> LocalRepository {
    let repo = LocalRepository::new();
    let mut done = create_test_schedule("Morning run", "2025-08-04T07:00:00+07:00");
    done.is_done = true;
    let daily = recurring(
        "Standup",
        "2025-08-05T09:00:00+07:00",
        RepeatType::Daily,
        None,
    );
    let weekly = recurring(
        "Team sync",
        "2025-08-06T14:00:00+07:00",
        RepeatType::Weekly,
        Some("2025-09-01T00:00:00+07:00"),
    );
    let plain = create_test_schedule("Dentist", "2025-08-07T11:00:00+07:00");

    repo.insert_batch(&[done, daily, weekly, plain]).await.unwrap();
    repo
}

#[tokio::test]
async fn test_filter_by_is_done() {
    let repo = seeded_repo().await;
    let filter = ScheduleFilter {
        is_done: Some(true),
        ..Default::default()
    };

    let (items, total) = repo.list(Pagination::default(), &filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].title, "Morning run");
}

#[tokio::test]
async fn test_filter_by_repeat_type() {
    let repo = seeded_repo().await;
    let filter = ScheduleFilter {
        repeat_type: Some(RepeatType::Weekly),
        ..Default::default()
    };

    let (items, total) = repo.list(Pagination::default(), &filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].title, "Team sync");
}

#[tokio::test]
async fn test_filter_by_search_is_case_insensitive() {
    let repo = seeded_repo().await;
    let filter = ScheduleFilter {
        search: Some("STAND".to_string()),
        ..Default::default()
    };

    let (items, total) = repo.list(Pagination::default(), &filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].title, "Standup");
}

#[tokio::test]
async fn test_filter_by_start_window() {
    let repo = seeded_repo().await;
    let filter = ScheduleFilter {
        start_after: Some(ts("2025-08-05T00:00:00+07:00")),
        start_before: Some(ts("2025-08-07T00:00:00+07:00")),
        ..Default::default()
    };

    let (items, total) = repo.list(Pagination::default(), &filter).await.unwrap();
    assert_eq!(total, 2);
    let titles: Vec<&str> = items.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Standup", "Team sync"]);
}

#[tokio::test]
async fn test_filters_combine_with_and_semantics() {
    let repo = seeded_repo().await;
    let filter = ScheduleFilter {
        is_done: Some(false),
        search: Some("team".to_string()),
        repeat_type: Some(RepeatType::Daily),
        ..Default::default()
    };

    let (items, total) = repo.list(Pagination::default(), &filter).await.unwrap();
    assert_eq!(total, 0);
    assert!(items.is_empty());
}

// =========================================================
// Sorting and pagination
// =========================================================

#[tokio::test]
async fn test_sort_by_title_descending() {
    let repo = seeded_repo().await;
    let filter = ScheduleFilter {
        sort_by: SortBy::Title,
        sort_order: SortOrder::Desc,
        ..Default::default()
    };

    let (items, _) = repo.list(Pagination::default(), &filter).await.unwrap();
    let titles: Vec<&str> = items.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Team sync", "Standup", "Morning run", "Dentist"]);
}

#[tokio::test]
async fn test_default_sort_is_start_time_ascending() {
    let repo = seeded_repo().await;
    let (items, _) = repo
        .list(Pagination::default(), &ScheduleFilter::default())
        .await
        .unwrap();

    for pair in items.windows(2) {
        assert!(pair[0].start_time <= pair[1].start_time);
    }
}

#[tokio::test]
async fn test_pagination_slices_after_sorting() {
    let repo = LocalRepository::new();
    let schedules: Vec<Schedule> = (0..25)
        .map(|i| {
            create_test_schedule(
                &format!("task_{:02}", i),
                &format!("2025-08-{:02}T0{}:00:00+07:00", (i / 4) + 1, i % 4 + 6),
            )
        })
        .collect();
    repo.insert_batch(&schedules).await.unwrap();

    let page2 = Pagination { page: 2, limit: 10 };
    let (items, total) = repo.list(page2, &ScheduleFilter::default()).await.unwrap();
    assert_eq!(total, 25);
    assert_eq!(items.len(), 10);

    // Page 2 picks up exactly where page 1 stopped
    let page1 = Pagination { page: 1, limit: 10 };
    let (first, _) = repo.list(page1, &ScheduleFilter::default()).await.unwrap();
    assert!(first[9].start_time <= items[0].start_time);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty_not_an_error() {
    let repo = seeded_repo().await;
    let pagination = Pagination { page: 9, limit: 10 };

    let (items, total) = repo.list(pagination, &ScheduleFilter::default()).await.unwrap();
    assert_eq!(total, 4);
    assert!(items.is_empty());
}

// =========================================================
// Recurring template listing
// =========================================================

#[tokio::test]
async fn test_list_active_recurring_skips_one_shots_and_expired() {
    let repo = LocalRepository::new();
    repo.insert_batch(&[
        create_test_schedule("One shot", "2025-08-05T07:00:00+07:00"),
        recurring("Open ended", "2025-08-05T08:00:00+07:00", RepeatType::Daily, None),
        recurring(
            "Still active",
            "2025-08-05T09:00:00+07:00",
            RepeatType::Weekly,
            Some("2025-12-31T00:00:00+07:00"),
        ),
        recurring(
            "Expired",
            "2025-08-01T09:00:00+07:00",
            RepeatType::Daily,
            Some("2025-08-03T00:00:00+07:00"),
        ),
    ])
    .await
    .unwrap();

    let now = ts("2025-08-05T12:00:00+07:00").with_timezone(&Utc);
    let active = repo.list_active_recurring(now).await.unwrap();

    let titles: Vec<&str> = active.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Open ended", "Still active"]);
}

// =========================================================
// Concurrent access
// =========================================================

#[tokio::test]
async fn test_concurrent_writers_do_not_collide() {
    let repo = Arc::new(LocalRepository::new());

    let mut handles = vec![];
    for i in 0..10 {
        let repo_clone = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            let schedule = create_test_schedule(
                &format!("task_{}", i),
                &format!("2025-08-05T{:02}:00:00+07:00", 7 + i),
            );
            repo_clone.insert_batch(std::slice::from_ref(&schedule)).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(repo.schedule_count(), 10);
}

#[tokio::test]
async fn test_concurrent_insert_if_absent_creates_exactly_one() {
    let repo = Arc::new(LocalRepository::new());
    let schedule = create_test_schedule("Race", "2025-08-05T07:00:00+07:00");

    let mut handles = vec![];
    for _ in 0..8 {
        let repo_clone = Arc::clone(&repo);
        let mut candidate = schedule.clone();
        candidate.id = uuid::Uuid::new_v4().to_string();
        handles.push(tokio::spawn(async move {
            repo_clone.insert_if_absent(&candidate).await.unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(repo.schedule_count(), 1);
}

// =========================================================
// Outage behavior
// =========================================================

#[tokio::test]
async fn test_unhealthy_repo_rejects_every_operation() {
    let repo = LocalRepository::new();
    let schedule = create_test_schedule("Walk", "2025-08-05T07:00:00+07:00");
    repo.insert_batch(std::slice::from_ref(&schedule)).await.unwrap();

    repo.set_healthy(false);

    let err = repo.get_by_id(&schedule.id).await.unwrap_err();
    assert!(err.is_retryable(), "connection failures are retryable");
    assert!(repo.list(Pagination::default(), &ScheduleFilter::default()).await.is_err());
    assert!(repo.insert_if_absent(&schedule).await.is_err());
    assert!(repo.delete_all().await.is_err());

    repo.set_healthy(true);
    assert!(repo.get_by_id(&schedule.id).await.is_ok());
}
