//! Shared mock wiki fixtures

use eq_catalog::config::{parse_config, Config};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ITEM_A: &str = r#"<div class="mw-parser-output"><p>You see item A.</p><p>It weighs 10 oz.</p><p>protection fire 5%.</p></div>"#;

pub const CREATURE_B: &str = r#"<div class="mw-parser-output"><p>Creature B.</p><p>Hitpoints 500. Experience Points 200.</p><p>It has protection from holy 10%.</p></div>"#;

pub const ITEM_C: &str = r#"<div class="mw-parser-output"><p>You see item C.</p><p>It weighs 5 oz.</p><p>Imbuements: Empty Slot.</p></div>"#;

pub const HELMETS: &str = r#"<div class="mw-parser-output">
<a href="/wiki/Item_A">Item A</a>
<a href="/wiki/Item_A#Notes">Item A notes</a>
<a href="/wiki/Creature_B">Creature B</a>
<a href="/wiki/Main_Page">Home</a>
<a href="/wiki/Category:Helmets">Helmets</a>
<a href="/index.php?title=Item_A&amp;action=edit">edit</a>
</div>"#;

/// Storage backend used by a test config
#[derive(Clone, Copy)]
pub enum Backend {
    Json,
    Sqlite,
}

/// Builds a config pointing at the mock server with storage in `dir`
pub fn test_config(base_url: &str, dir: &Path, backend: Backend, respect_robots: bool) -> Config {
    let backend = match backend {
        Backend::Json => "json",
        Backend::Sqlite => "sqlite",
    };
    let dir = dir.display();

    let toml = format!(
        r#"
[wiki]
base-url = "{base_url}"

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[crawler]
batch-size = 2
request-delay-ms = 0
seed-delay-ms = 0
timeout-secs = 5
respect-robots = {respect_robots}

[output]
backend = "{backend}"
titles-path = "{dir}/eq_titles.json"
state-path = "{dir}/eq_state.json"
catalog-path = "{dir}/eq_items.json"
database-path = "{dir}/eq_catalog.db"
summary-path = "{dir}/eq_summary.md"

[[seed]]
slot = "helmet"
page = "Helmets"

[[seed]]
slot = "armor"
category = "Armors"
"#
    );

    parse_config(&toml).unwrap()
}

/// Serves `html` as the rendered body of `page`
pub async fn mount_page(server: &MockServer, page: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("page", page))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "parse": {"title": page, "text": {"*": html}}
            })),
        )
        .mount(server)
        .await;
}

/// Answers parse requests for `page` with an HTTP error
pub async fn mount_page_status(server: &MockServer, page: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answers parse requests for `page` with a MediaWiki error payload
pub async fn mount_missing_page(server: &MockServer, page: &str) {
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}
        })))
        .mount(server)
        .await;
}

/// Serves category members in two continuation pages
pub async fn mount_category(server: &MockServer, category: &str, first: &[&str], second: &[&str]) {
    let members = |titles: &[&str]| {
        titles
            .iter()
            .map(|title| json!({"ns": 0, "title": title}))
            .collect::<Vec<_>>()
    };

    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("list", "categorymembers"))
        .and(query_param("cmtitle", format!("Category:{}", category)))
        .and(|request: &Request| {
            !request
                .url
                .query_pairs()
                .any(|(key, _)| key == "cmcontinue")
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "continue": {"cmcontinue": "page|NEXT|1", "continue": "-||"},
            "query": {"categorymembers": members(first)}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("list", "categorymembers"))
        .and(query_param("cmtitle", format!("Category:{}", category)))
        .and(query_param("cmcontinue", "page|NEXT|1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"categorymembers": members(second)}
        })))
        .mount(server)
        .await;
}

/// Mounts the three-title scenario: Helmets page seed plus Armors category
pub async fn mount_scenario(server: &MockServer) {
    mount_page(server, "Helmets", HELMETS).await;
    mount_category(server, "Armors", &["Item C"], &[]).await;
    mount_page(server, "Item_A", ITEM_A).await;
    mount_page(server, "Creature_B", CREATURE_B).await;
    mount_page(server, "Item_C", ITEM_C).await;
}
