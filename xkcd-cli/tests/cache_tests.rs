// ABOUTME: Tests for the comic list cache against a mock xkcd server
// ABOUTME: Covers cache creation, freshness and the on-disk JSON layout

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tempfile::TempDir;
use xkcd_cli::archive::{ComicMeta, XkcdClient};
use xkcd_cli::cache::{ComicCache, load_or_refresh, update_cache};

const ARCHIVE_HTML: &str = r#"<html><body>
<div id="middleContainer" class="box">
<a href="/3000/" title="2024-10-14">Latest</a><br/>
<a href="/327/" title="2007-10-10">Exploits of a Mom</a><br/>
</div>
</body></html>"#;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn test_update_cache_writes_json() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/archive/")
        .with_body(ARCHIVE_HTML)
        .create_async()
        .await;
    let client = XkcdClient::with_base_url(server.url()).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xkcd-cli").join("cache.json");

    update_cache(&path, &client).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(json["last_updated"].is_string());
    assert_eq!(json["comics"][1]["id"], 327);
    assert_eq!(json["comics"][1]["href"], "/327/");
    assert_eq!(json["comics"][1]["title"], "Exploits of a Mom");
}

#[tokio::test]
async fn test_fresh_cache_is_used_as_is() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/archive/")
        .with_body(ARCHIVE_HTML)
        .expect(0)
        .create_async()
        .await;
    let client = XkcdClient::with_base_url(server.url()).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");

    let cached = ComicCache {
        last_updated: Utc::now() - ChronoDuration::hours(1),
        comics: vec![ComicMeta {
            id: 1,
            href: "/1/".to_string(),
            title: "Barrel - Part 1".to_string(),
        }],
    };
    cached.write(&path).unwrap();

    let cache = load_or_refresh(&path, DAY, &client).await.unwrap();

    mock.assert_async().await;
    assert_eq!(cache, cached);
}

#[tokio::test]
async fn test_failed_refresh_keeps_old_cache_file() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/archive/")
        .with_status(500)
        .create_async()
        .await;
    let client = XkcdClient::with_base_url(server.url()).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");

    let stale = ComicCache {
        last_updated: Utc::now() - ChronoDuration::days(7),
        comics: Vec::new(),
    };
    stale.write(&path).unwrap();

    assert!(load_or_refresh(&path, DAY, &client).await.is_err());
    assert_eq!(ComicCache::read(&path).unwrap(), stale);
}
