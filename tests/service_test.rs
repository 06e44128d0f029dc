//! Tests for the synchronous team service and the SQLite-backed pipeline.

mod common;

use common::TestFixture;
use std::time::Duration;
use team_saver::events::{EventBus, EventKind, TeamEvent};
use team_saver::service::{ServiceError, TeamService};
use team_saver::{ChunkFlusher, NewTeam, Repo, RepoError, Saver, SaverConfig, SearchType, Team};

fn service(fixture: &TestFixture, batch_size: usize) -> TeamService {
    TeamService::new(fixture.store(), EventBus::new(16), batch_size)
}

#[tokio::test]
async fn test_create_team_emits_event() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 10);
    let mut events = service.events().subscribe();

    let id = service
        .create_team(NewTeam::new("platform", "shared infra"))
        .await
        .expect("create failed");

    assert_eq!(id, 1);
    assert_eq!(
        events.recv().await.unwrap(),
        TeamEvent {
            id,
            kind: EventKind::Created
        }
    );

    let team = service.get_team(id).await.unwrap();
    assert_eq!(team.name, "platform");
    assert_eq!(team.description, "shared infra");
    assert!(team.is_persisted());
}

#[tokio::test]
async fn test_invalid_team_is_rejected_before_storage() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 10);
    let events = service.events().subscribe();

    let result = service.create_team(NewTeam::new("  ", "")).await;

    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    assert!(events.is_empty());
    let (_, total) = service.list_teams(10, 0).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_multi_create_returns_ids_in_order() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 2);

    let new_teams = (1..=5)
        .map(|n| NewTeam::new(format!("team-{n}"), ""))
        .collect();
    let ids = service.multi_create_teams(new_teams).await.unwrap();

    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let (page, total) = service.list_teams(2, 3).await.unwrap();
    assert_eq!(total, 5);
    let names: Vec<&str> = page.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["team-4", "team-5"]);
}

#[tokio::test]
async fn test_multi_create_validates_everything_first() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 1);

    let result = service
        .multi_create_teams(vec![NewTeam::new("ok", ""), NewTeam::new("", "")])
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    let (_, total) = service.list_teams(10, 0).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_multi_create_stops_at_first_failing_batch() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 2);
    fixture.reject_inserts_named("broken");

    let names = ["t1", "t2", "t3", "broken", "t5"];
    let result = service
        .multi_create_teams(names.iter().map(|n| NewTeam::new(*n, "")).collect())
        .await;

    match result {
        Err(ServiceError::PartialCreate { created, source }) => {
            assert_eq!(created, vec![1, 2]);
            assert!(matches!(source, RepoError::Database(_)));
        }
        other => panic!("expected partial create, got {other:?}"),
    }

    // The failing batch is rolled back whole and the last one never runs
    let (page, total) = service.list_teams(10, 0).await.unwrap();
    assert_eq!(total, 2);
    let stored: Vec<&str> = page.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(stored, vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_search_teams() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 10);
    service
        .multi_create_teams(vec![
            NewTeam::new("Data Platform", "batch pipelines"),
            NewTeam::new("Pipelines", "data ingestion"),
            NewTeam::new("Mobile", "apps"),
        ])
        .await
        .unwrap();

    let plain = service
        .search_teams("data pipelines", SearchType::Plain)
        .await
        .unwrap();
    assert_eq!(plain.len(), 2);

    let phrase = service
        .search_teams("data platform", SearchType::Phrase)
        .await
        .unwrap();
    assert_eq!(phrase.len(), 1);
    assert_eq!(phrase[0].name, "Data Platform");

    let result = service.search_teams("  ", SearchType::Plain).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_update_and_remove() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 10);
    let id = service.create_team(NewTeam::new("old", "")).await.unwrap();
    let mut events = service.events().subscribe();

    service
        .update_team(id, NewTeam::new("new", "renamed"))
        .await
        .unwrap();
    assert_eq!(service.get_team(id).await.unwrap().name, "new");

    service.remove_team(id).await.unwrap();
    let err = service.get_team(id).await.unwrap_err();
    assert!(err.is_not_found());

    let err = service.update_team(id, NewTeam::new("again", "")).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(events.recv().await.unwrap().kind, EventKind::Updated);
    assert_eq!(events.recv().await.unwrap().kind, EventKind::Removed);
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_remove_missing_team_fails() {
    let fixture = TestFixture::new();
    let service = service(&fixture, 10);

    let err = service.remove_team(99).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(RepoError::NotFound(99))));
}

#[tokio::test]
async fn test_store_batch_assigns_ids() {
    let fixture = TestFixture::new();
    let store = fixture.store();

    let ids = store
        .add_teams(&[Team::new("a", ""), Team::new("b", "")])
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 2]);

    let (teams, total) = store.list_teams(10, 0).await.unwrap();
    assert_eq!(total, 2);
    assert!(teams.iter().all(|t| t.is_persisted() && !t.is_deleted));
}

#[tokio::test]
async fn test_saver_persists_into_store() {
    let fixture = TestFixture::new();
    let store = fixture.store();
    let saver = Saver::new(
        SaverConfig {
            capacity: 3,
            flush_interval: Duration::from_millis(20),
        },
        ChunkFlusher::new(2, store.clone()),
    )
    .unwrap();

    for n in 1..=7 {
        saver
            .save(Team::new(format!("team-{n}"), ""))
            .await
            .unwrap();
    }
    saver.close().await;

    let (teams, total) = store.list_teams(100, 0).await.unwrap();
    assert_eq!(total, 7);
    let names: Vec<String> = teams.into_iter().map(|t| t.name).collect();
    let expected: Vec<String> = (1..=7).map(|n| format!("team-{n}")).collect();
    assert_eq!(names, expected);
}
