//! Title discovery against a mock MediaWiki API

use crate::support::{mount_category, mount_page, mount_scenario, test_config, Backend, HELMETS};
use chrono::Utc;
use eq_catalog::catalog::SlotHint;
use eq_catalog::crawler::{Coordinator, FetchError, LinkSource, WikiClient};
use eq_catalog::EqError;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_page_links_returns_raw_hrefs() {
    let server = MockServer::start().await;
    mount_page(&server, "Helmets", HELMETS).await;

    let client = WikiClient::new(
        reqwest::Client::new(),
        format!("{}/api.php", server.uri()),
        "TestCrawler",
    );
    let hrefs = client.page_links("Helmets").await.unwrap();

    assert_eq!(hrefs.len(), 6);
    assert_eq!(hrefs[0], "/wiki/Item_A");
}

#[tokio::test]
async fn test_category_members_follow_continuation() {
    let server = MockServer::start().await;
    mount_category(
        &server,
        "Quivers",
        &["Crystal Quiver", "Blue Quiver"],
        &["Quiver of the Soul"],
    )
    .await;

    let client = WikiClient::new(
        reqwest::Client::new(),
        format!("{}/api.php", server.uri()),
        "TestCrawler",
    );
    let members = client.category_members("Quivers").await.unwrap();

    assert_eq!(
        members,
        vec!["Crystal Quiver", "Blue Quiver", "Quiver of the Soul"]
    );
}

#[tokio::test]
async fn test_discovery_merges_page_and_category_seeds() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();

    let config = test_config(&server.uri(), dir.path(), Backend::Json, false);
    let client = WikiClient::from_config(&config).await.unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();

    let titles = coordinator
        .ensure_titles(&client, false, Utc::now())
        .await
        .unwrap();

    let names: Vec<&str> = titles.items.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(names, vec!["Creature_B", "Item_A", "Item_C"]);
    assert_eq!(titles.slot_of("Item_A"), Some(SlotHint::Helmet));
    assert_eq!(titles.slot_of("Item_C"), Some(SlotHint::Armor));
    assert_eq!(titles.count, 3);
    assert_eq!(titles.slots.get("helmet"), Some(&2));

    let written = std::fs::read_to_string(dir.path().join("eq_titles.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["items"][0]["title"], "Creature_B");
    assert_eq!(parsed["items"][2]["slot"], "armor");
}

#[tokio::test]
async fn test_failing_seed_aborts_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let config = test_config(&server.uri(), dir.path(), Backend::Json, false);
    let client = WikiClient::from_config(&config).await.unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();

    let result = coordinator.ensure_titles(&client, false, Utc::now()).await;

    match result {
        Err(EqError::Discovery { seed, source }) => {
            assert_eq!(seed, "helmet:Helmets");
            assert!(matches!(source, FetchError::Http { status: 503, .. }));
        }
        other => panic!("expected discovery failure, got {:?}", other),
    }
    assert!(!dir.path().join("eq_titles.json").exists());
}

#[tokio::test]
async fn test_robots_disallow_blocks_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /api.php\n"),
        )
        .mount(&server)
        .await;
    mount_scenario(&server).await;
    let dir = TempDir::new().unwrap();

    let config = test_config(&server.uri(), dir.path(), Backend::Json, true);
    let client = WikiClient::from_config(&config).await.unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();

    let result = coordinator.ensure_titles(&client, false, Utc::now()).await;

    assert!(matches!(
        result,
        Err(EqError::Discovery {
            source: FetchError::RobotsDenied { .. },
            ..
        })
    ));
}
