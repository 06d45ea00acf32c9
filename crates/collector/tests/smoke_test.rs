//! Smoke tests for the civic pipeline
//!
//! Configuration text in, files on disk out: feed parser → bus → filers →
//! write/rotate primitive.

use std::fs;
use std::str::FromStr;

use civic_config::Config;
use civic_pipeline::Bus;
use civic_sinks::Filer;
use civic_sources::Feed;
use tempfile::TempDir;

const SIRI_VM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Siri version="1.3"><ServiceDelivery><VehicleMonitoringDelivery version="1.3">
<VehicleActivity>
  <RecordedAtTime>2020-01-27T09:14:08+00:00</RecordedAtTime>
  <VehicleRef>SCCM-19587</VehicleRef>
  <Latitude>52.2054</Latitude>
  <Longitude>0.1218</Longitude>
</VehicleActivity>
<VehicleActivity>
  <RecordedAtTime>2020-01-27T09:14:10+00:00</RecordedAtTime>
  <VehicleRef>WP-106</VehicleRef>
  <Latitude>52.9</Latitude>
  <Longitude>1.3</Longitude>
</VehicleActivity>
</VehicleMonitoringDelivery></ServiceDelivery></Siri>"#;

const JOURNEY_TIMES: &str = r#"[
  { "id": "CAMBRIDGE_JTMS|9800WLZSM8UU", "time": "2020-01-26 09:28:22", "period": 674, "travelTime": 127, "normalTravelTime": 129.39 },
  { "id": "CAMBRIDGE_JTMS|9800X1K4U6AG", "time": "2020-01-26 09:28:22", "period": 300, "travelTime": 61, "normalTravelTime": 58.2 }
]"#;

fn config(dir: &TempDir) -> Config {
    let root = dir.path().display();
    let text = format!(
        r#"
[global]
queue_size = 16

[feeds.vix]
feed_type = "feed_xml_flat"
address = "feedmaker.vix"
module_name = "feedmaker"
module_id = "vix"
tag_record = "VehicleActivity"
tag_map = [
    {{ original_tag = "RecordedAtTime", new_tag = "acp_ts", format = "datetime_iso_to_int_utc_seconds" }},
    {{ original_tag = "Latitude", new_tag = "acp_lat", format = "float" }},
    {{ original_tag = "Longitude", new_tag = "acp_lng", format = "float" }},
]

[feeds.btjourney]
feed_type = "feed_bt_journey_times"
address = "feedmaker.btjourney"
module_name = "feedmaker"
module_id = "btjourney"

[routes.vix_latest]
source_address = "feedmaker.vix"
store_path = "{root}/{{{{feed_id}}}}"
store_name = "latest.json"

[routes.vix_vehicles]
source_address = "feedmaker.vix"
flatten = "request_data"
store_path = "{root}/{{{{feed_id}}}}/vehicles"
store_name = "{{{{VehicleRef}}}}.json"

[routes.vix_cambridge]
source_address = "feedmaker.vix"
source_filter = {{ test = "in", key = "feed_id", values = ["vix", "cam"] }}
flatten = "request_data"
store_path = "{root}/{{{{feed_id}}}}/cambridge"
store_name = "{{{{VehicleRef}}}}.json"

[routes.vix_broken]
source_address = "feedmaker.vix"
store_path = "{root}/broken"
store_name = "x.json"
source_filter = {{ test = "like", key = "feed_id", value = "vix" }}

[routes.vix_mistyped]
source_address = "feedmaker.vix"
store_path = "{root}/mistyped"
store_name = "x.json"
merge_base = "ts"

[routes.journeys]
source_address = "feedmaker.btjourney"
records_data = "request_data"
merge_base = ["ts", "feed_id"]
store_path = "{root}/{{{{feed_id}}}}"
store_name = "journeys.txt"
store_mode = "append"
"#
    );
    Config::from_str(&text).unwrap()
}

fn filers(config: &Config) -> Vec<Filer> {
    config
        .routes
        .iter()
        .filter_map(|(name, route)| Filer::from_route(name, route).ok())
        .collect()
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_xml_feed_reaches_every_route() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    assert!(config.malformed_routes.contains_key("vix_mistyped"));
    let filers = filers(&config);
    assert_eq!(filers.len(), 4, "the route with an unknown test is disabled");

    let feed = Feed::new("vix", config.feed("vix").unwrap()).unwrap();
    let bus = Bus::start(filers, config.global.queue_size).unwrap();

    let delivered = bus
        .publish_blocking(feed.address(), feed.ingest(SIRI_VM.as_bytes()))
        .await;
    assert_eq!(delivered, 3);

    let snapshots = bus.shutdown().await.unwrap();
    let stored: u64 = snapshots.iter().map(|(_, s)| s.records_stored).sum();
    assert_eq!(stored, 1 + 2 + 2);

    let latest = read_json(&dir.path().join("vix").join("latest.json"));
    assert_eq!(latest["module_id"], "vix");
    assert_eq!(latest["request_data"].as_array().unwrap().len(), 2);

    let vehicle = read_json(&dir.path().join("vix/vehicles/SCCM-19587.json"));
    assert_eq!(vehicle["Latitude"], "52.2054");
    assert_eq!(vehicle["acp_lat"], 52.2054);
    assert_eq!(vehicle["acp_ts"], 1580116448);
    assert_eq!(vehicle["feed_id"], "vix");
    assert!(dir.path().join("vix/vehicles/WP-106.json").exists());
    assert!(!dir.path().join("broken").exists());
    assert!(!dir.path().join("mistyped").exists());
}

#[test]
fn test_second_fetch_rotates_latest() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let feed = Feed::new("vix", config.feed("vix").unwrap()).unwrap();
    let route = config.route("vix_latest").unwrap();
    let filer = Filer::from_route("vix_latest", route).unwrap();

    let first = feed.ingest(SIRI_VM.as_bytes()).with_field("seq", 1_i64);
    let second = feed.ingest(SIRI_VM.as_bytes()).with_field("seq", 2_i64);
    assert_eq!(filer.store_blocking(&first), 1);
    assert_eq!(filer.store_blocking(&second), 1);

    let latest = dir.path().join("vix").join("latest.json");
    let mut prev = latest.clone().into_os_string();
    prev.push(".prev");
    assert_eq!(read_json(&latest)["seq"], 2);
    assert_eq!(read_json(std::path::Path::new(&prev))["seq"], 1);
}

#[tokio::test]
async fn test_journey_times_appended_one_line_per_link() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let feed = Feed::new("btjourney", config.feed("btjourney").unwrap()).unwrap();
    let bus = Bus::start(filers(&config), 4).unwrap();

    for _ in 0..2 {
        bus.publish_blocking(feed.address(), feed.ingest(JOURNEY_TIMES.as_bytes()))
            .await;
    }
    bus.shutdown().await.unwrap();

    let content = fs::read_to_string(dir.path().join("btjourney").join("journeys.txt")).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines.iter().filter(|l| l["period"] == 674).count(), 2);
    assert_eq!(lines[0]["feed_id"], "btjourney");
    assert!(lines[0]["ts"].is_i64());
    assert!(lines[0].get("module_id").is_none());
}

#[tokio::test]
async fn test_unsubscribed_feed_stores_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.routes.remove("journeys");

    let feed = Feed::new("btjourney", config.feed("btjourney").unwrap()).unwrap();
    let bus = Bus::start(filers(&config), 4).unwrap();

    assert_eq!(bus.publish(feed.address(), feed.ingest(JOURNEY_TIMES.as_bytes())), 0);
    assert_eq!(bus.router().metrics().snapshot().envelopes_dropped, 1);
    bus.shutdown().await.unwrap();

    assert!(!dir.path().join("btjourney").exists());
}

#[test]
fn test_shipped_config_is_fully_usable() {
    let config = Config::from_str(include_str!("../../../configs/civic.toml")).unwrap();

    for (name, feed) in &config.feeds {
        Feed::new(name, feed).unwrap();
    }
    for (name, route) in &config.routes {
        Filer::from_route(name, route).unwrap();
    }
    assert!(config.malformed_routes.is_empty());
    assert_eq!(filers(&config).len(), config.routes.len());
}
