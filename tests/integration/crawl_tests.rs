//! Integration tests for resumable batch runs
//!
//! These tests use wiremock to emulate the MediaWiki API and drive
//! complete invocations end-to-end through the coordinator.

use crate::support::{
    mount_category, mount_missing_page, mount_page, mount_page_status, mount_scenario,
    test_config, Backend, CREATURE_B, HELMETS, ITEM_A,
};
use chrono::Utc;
use eq_catalog::config::Config;
use eq_catalog::crawler::{Coordinator, RunOptions, WikiClient};
use eq_catalog::output::{load_statistics, RunSummary};
use eq_catalog::state::CrawlPhase;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use wiremock::MockServer;

/// One invocation, as `main` would run it
async fn invoke(config: &Config, options: RunOptions) -> RunSummary {
    let client = WikiClient::from_config(config).await.unwrap();
    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.run(&client, options, Utc::now()).await.unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_two_runs_cover_all_titles() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path(), Backend::Json, false);

    let first = invoke(&config, RunOptions::default()).await;
    assert_eq!(
        first.to_string(),
        "Titles: 3 | Processed: 2 | SkippedNonItem: 1 | Added: 1 | Items: 1 | Next index: 2"
    );

    let second = invoke(&config, RunOptions::default()).await;
    assert_eq!(second.processed, 1);
    assert_eq!(second.added, 0);
    assert_eq!(second.items, 1);
    assert_eq!(second.next_index, 3);

    let catalog = read_json(&dir.path().join("eq_items.json"));
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "Item A");
    assert_eq!(entries[0]["slot"], "helmet");
    assert_eq!(entries[0]["res"]["fire"], 5);
    assert_eq!(
        entries[0]["source"],
        format!("{}/wiki/Item_A", server.uri())
    );

    let state = read_json(&dir.path().join("eq_state.json"));
    assert_eq!(state["cursor"], 3);
    assert_eq!(state["totalTitles"], 3);
    assert_eq!(state["totalItems"], 1);
    assert_eq!(state["lastProcessed"], 1);
}

#[tokio::test]
async fn test_completed_crawl_is_idempotent() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path(), Backend::Json, false);

    invoke(&config, RunOptions::default()).await;
    invoke(&config, RunOptions::default()).await;
    let catalog_before = std::fs::read_to_string(dir.path().join("eq_items.json")).unwrap();

    let third = invoke(&config, RunOptions::default()).await;
    assert_eq!(third.processed, 0);
    assert_eq!(third.added, 0);
    assert_eq!(third.next_index, 3);

    let catalog_after = std::fs::read_to_string(dir.path().join("eq_items.json")).unwrap();
    assert_eq!(catalog_before, catalog_after);

    let state = read_json(&dir.path().join("eq_state.json"));
    assert_eq!(state["cursor"], 3);
    assert!(state["lastRun"].is_number());
}

#[tokio::test]
async fn test_failed_fetch_advances_cursor_and_can_be_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path(), Backend::Json, false);

    mount_page(&server, "Helmets", HELMETS).await;
    mount_category(&server, "Armors", &["Item C"], &[]).await;
    mount_page(&server, "Creature_B", CREATURE_B).await;
    mount_page_status(&server, "Item_A", 500).await;
    mount_missing_page(&server, "Item_C").await;

    let first = invoke(&config, RunOptions::default()).await;
    assert_eq!(first.failed, 1);
    assert_eq!(first.added, 0);
    assert_eq!(first.next_index, 2);
    assert!(first.to_string().ends_with(" | Failed: 1"));

    let second = invoke(&config, RunOptions::default()).await;
    assert_eq!(second.failed, 1);
    assert_eq!(second.next_index, 3);

    let state = read_json(&dir.path().join("eq_state.json"));
    assert_eq!(state["failedTitles"], serde_json::json!(["Item_A", "Item_C"]));

    // The wiki recovers for Item_A only
    server.reset().await;
    mount_page(&server, "Item_A", ITEM_A).await;
    mount_missing_page(&server, "Item_C").await;

    let retry = invoke(
        &config,
        RunOptions {
            retry_failed: true,
            ..RunOptions::default()
        },
    )
    .await;
    assert_eq!(retry.added, 1);
    assert_eq!(retry.failed, 1);
    assert_eq!(retry.items, 1);
    assert_eq!(retry.next_index, 3);

    let state = read_json(&dir.path().join("eq_state.json"));
    assert_eq!(state["failedTitles"], serde_json::json!(["Item_C"]));
}

#[tokio::test]
async fn test_sqlite_backend_resumes() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path(), Backend::Sqlite, false);

    invoke(&config, RunOptions::default()).await;
    let second = invoke(&config, RunOptions::default()).await;
    assert_eq!(second.next_index, 3);
    assert_eq!(second.items, 1);

    assert!(dir.path().join("eq_catalog.db").exists());
    assert!(!dir.path().join("eq_state.json").exists());

    let coordinator = Coordinator::new(config).unwrap();
    let stats = load_statistics(coordinator.storage()).unwrap();
    assert_eq!(stats.total_titles, 3);
    assert_eq!(stats.total_items, 1);
    assert_eq!(stats.phase(), CrawlPhase::Complete);
}
