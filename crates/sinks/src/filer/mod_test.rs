//! Tests for the route persister

use std::fs;
use std::sync::Arc;

use civic_config::{PointConfig, RouteConfig, SourceFilterConfig, StoreMode};
use civic_protocol::{Envelope, Record};
use civic_transform::{PathExpression, Point, Predicate};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::{Filer, FilerConfig, Reshape};
use crate::error::StoreError;
use crate::store::prev_path;

fn vehicles() -> Envelope {
    Envelope::new("feedmaker", "vix")
        .with_records(vec![
            Record::new()
                .with("VehicleRef", "1")
                .with("acp_lat", 52.2)
                .with("acp_lng", 0.12),
            Record::new()
                .with("VehicleRef", "2")
                .with("acp_lat", 52.9)
                .with("acp_lng", 0.5),
        ])
        .with_field("ts", 1580132048_i64)
        .with_field("feed_id", "vix")
}

fn route(dir: &TempDir, store_name: &str) -> RouteConfig {
    RouteConfig {
        source_address: Some("feeds.vix".into()),
        store_path: Some(format!("{}/{{{{module_id}}}}", dir.path().display())),
        store_name: Some(store_name.into()),
        ..Default::default()
    }
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Route compilation
// ============================================================================

#[test]
fn test_from_route_whole_message_defaults() {
    let dir = TempDir::new().unwrap();
    let config = FilerConfig::from_route("vix_latest", &route(&dir, "latest.json")).unwrap();

    assert_eq!(config.name, "vix_latest");
    assert_eq!(config.source_address.as_str(), "feeds.vix");
    assert!(config.predicate.is_none());
    assert!(matches!(config.reshape, Reshape::Whole));
    assert_eq!(config.store_mode, StoreMode::Overwrite);
}

#[test]
fn test_from_route_compiles_records_path() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "{{site_id}}.json");
    cfg.records_data = Some("request_data[0]>sites".into());
    cfg.merge_base = vec!["ts".into()];

    let config = FilerConfig::from_route("sites", &cfg).unwrap();
    match config.reshape {
        Reshape::Extract { path, merge_base } => {
            assert_eq!(path, PathExpression::compile("request_data[0]>sites").unwrap());
            assert_eq!(merge_base, vec!["ts".to_string()]);
        }
        other => panic!("unexpected reshape {other:?}"),
    }
}

#[test]
fn test_from_route_rejects_unknown_test() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "x.json");
    cfg.source_filter = Some(SourceFilterConfig {
        test: "like".into(),
        key: Some("module_id".into()),
        ..Default::default()
    });

    let err = FilerConfig::from_route("bad", &cfg).unwrap_err();
    assert!(matches!(err, StoreError::Compile { .. }));
}

#[test]
fn test_from_route_rejects_bad_path() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "x.json");
    cfg.records_data = Some("request_data[x]>sites".into());

    let err = FilerConfig::from_route("bad", &cfg).unwrap_err();
    assert!(matches!(err, StoreError::Compile { .. }));
}

#[test]
fn test_from_route_rejects_missing_store_path() {
    let cfg = RouteConfig {
        source_address: Some("feeds.vix".into()),
        store_name: Some("x.json".into()),
        ..Default::default()
    };
    let err = FilerConfig::from_route("bad", &cfg).unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}

#[test]
fn test_from_route_polygon_filter() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "x.json");
    cfg.source_filter = Some(SourceFilterConfig {
        test: "inside".into(),
        points: vec![
            PointConfig { lat: 52.0, lng: 0.0 },
            PointConfig { lat: 52.0, lng: 1.0 },
            PointConfig { lat: 53.0, lng: 1.0 },
            PointConfig { lat: 53.0, lng: 0.0 },
        ],
        ..Default::default()
    });

    let config = FilerConfig::from_route("zone", &cfg).unwrap();
    assert_eq!(config.predicate.map(|p| p.kind()), Some("inside"));
}

// ============================================================================
// Blocking form
// ============================================================================

#[test]
fn test_store_blocking_whole_message() {
    let dir = TempDir::new().unwrap();
    let filer = Filer::from_route("vix_latest", &route(&dir, "latest.json")).unwrap();

    let stored = filer.store_blocking(&vehicles());

    assert_eq!(stored, 1);
    let written = read_json(&dir.path().join("vix").join("latest.json"));
    assert_eq!(written["module_id"], "vix");
    assert_eq!(written["feed_id"], "vix");
    assert_eq!(written["request_data"].as_array().unwrap().len(), 2);
    assert_eq!(filer.metrics().snapshot().records_stored, 1);
}

#[test]
fn test_store_blocking_rotates_previous_version() {
    let dir = TempDir::new().unwrap();
    let filer = Filer::from_route("vix_latest", &route(&dir, "latest.json")).unwrap();

    filer.store_blocking(&vehicles().with_field("seq", 1_i64));
    filer.store_blocking(&vehicles().with_field("seq", 2_i64));

    let path = dir.path().join("vix").join("latest.json");
    assert_eq!(read_json(&path)["seq"], 2);
    assert_eq!(read_json(&prev_path(&path))["seq"], 1);
}

#[test]
fn test_store_blocking_flatten_per_vehicle() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "{{VehicleRef}}.json");
    cfg.flatten = Some("request_data".into());
    let filer = Filer::from_route("vix_vehicles", &cfg).unwrap();

    assert_eq!(filer.store_blocking(&vehicles()), 2);

    let one = read_json(&dir.path().join("vix").join("1.json"));
    assert_eq!(one["VehicleRef"], "1");
    assert_eq!(one["ts"], 1580132048);
    assert!(one.get("request_data").is_none());
    assert!(dir.path().join("vix").join("2.json").exists());
}

#[test]
fn test_store_blocking_append_one_line_per_record() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "positions.txt");
    cfg.flatten = Some("request_data".into());
    cfg.store_mode = Some("append".into());
    let filer = Filer::from_route("vix_log", &cfg).unwrap();

    filer.store_blocking(&vehicles());
    filer.store_blocking(&vehicles());

    let content = fs::read_to_string(dir.path().join("vix").join("positions.txt")).unwrap();
    let refs: Vec<String> = content
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["VehicleRef"].to_string())
        .collect();
    assert_eq!(refs, vec!["\"1\"", "\"2\"", "\"1\"", "\"2\""]);
}

#[test]
fn test_store_document_blocking_records_path() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "{{site_id}}.json");
    cfg.records_data = Some("request_data[0]>sites".into());
    cfg.merge_base = vec!["module_id".into(), "ts".into()];
    let filer = Filer::from_route("sites", &cfg).unwrap();

    let message = json!({
        "module_id": "cam_park",
        "ts": 1580132048,
        "request_data": [{ "sites": [{ "site_id": "a" }, { "site_id": "b" }] }],
    });
    let stored = filer.store_document_blocking(message.as_object().unwrap());

    assert_eq!(stored, 2);
    let a = read_json(&dir.path().join("cam_park").join("a.json"));
    assert_eq!(a["module_id"], "cam_park");
    assert_eq!(a["ts"], 1580132048);
}

#[test]
fn test_predicate_rejection_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = FilerConfig::from_route("other", &route(&dir, "latest.json"))
        .unwrap()
        .with_predicate(Predicate::equals("module_id", "other"));
    let filer = Filer::new(config);

    assert_eq!(filer.store_blocking(&vehicles()), 0);

    let snapshot = filer.metrics().snapshot();
    assert_eq!(snapshot.messages_received, 1);
    assert_eq!(snapshot.messages_filtered, 1);
    assert_eq!(snapshot.records_stored, 0);
    assert!(!dir.path().join("vix").exists());
}

#[test]
fn test_predicate_on_flattened_message_uses_envelope_fields() {
    let dir = TempDir::new().unwrap();
    let config = FilerConfig::from_route("vix", &route(&dir, "{{VehicleRef}}.json"))
        .unwrap()
        .with_predicate(Predicate::member_of("feed_id", ["vix", "cam"]))
        .with_reshape(Reshape::Flatten {
            field: "request_data".into(),
        });
    let filer = Filer::new(config);

    assert_eq!(filer.store_blocking(&vehicles()), 2);
}

#[test]
fn test_polygon_predicate_admits_message_inside() {
    let dir = TempDir::new().unwrap();
    let zone = vec![
        Point::new(52.0, 0.0),
        Point::new(52.0, 1.0),
        Point::new(53.0, 1.0),
        Point::new(53.0, 0.0),
    ];
    let config = FilerConfig::new("zone", "feeds.vix", dir.path().to_string_lossy(), "zone.json")
        .with_predicate(Predicate::inside_polygon(zone));
    let filer = Filer::new(config);

    let inside = json!({ "acp_lat": 52.5, "acp_lng": "0.5" });
    let outside = json!({ "acp_lat": 51.0, "acp_lng": 0.5 });

    assert_eq!(filer.store_document_blocking(inside.as_object().unwrap()), 1);
    assert_eq!(filer.store_document_blocking(outside.as_object().unwrap()), 0);
    assert_eq!(filer.metrics().snapshot().messages_filtered, 1);
}

#[test]
fn test_write_failure_is_counted_not_propagated() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file").unwrap();

    let config = FilerConfig::new("broken", "feeds.vix", blocker.to_string_lossy(), "x.json");
    let filer = Filer::new(config);

    assert_eq!(filer.store_blocking(&vehicles()), 0);
    let snapshot = filer.metrics().snapshot();
    assert_eq!(snapshot.write_errors, 1);
    assert_eq!(snapshot.records_stored, 0);
}

// ============================================================================
// Non-blocking form
// ============================================================================

#[tokio::test]
async fn test_store_returns_handles_per_record() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "{{VehicleRef}}.json");
    cfg.flatten = Some("request_data".into());
    let filer = Filer::from_route("vix_vehicles", &cfg).unwrap();

    let handles = filer.store(&vehicles());
    assert_eq!(handles.len(), 2);
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(dir.path().join("vix").join("1.json").exists());
    assert!(dir.path().join("vix").join("2.json").exists());
    assert_eq!(filer.metrics().snapshot().records_stored, 2);
}

#[tokio::test]
async fn test_run_drains_channel_and_waits_for_writes() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "positions.txt");
    cfg.flatten = Some("request_data".into());
    cfg.store_mode = Some("append".into());
    let filer = Filer::from_route("vix_log", &cfg).unwrap();
    let metrics = filer.metrics_handle();

    let (tx, rx) = mpsc::channel(16);
    let task = tokio::spawn(filer.run(rx));

    tx.send(Arc::new(vehicles())).await.unwrap();
    tx.send(Arc::new(vehicles())).await.unwrap();
    tx.send(Arc::new(vehicles())).await.unwrap();
    drop(tx);

    let snapshot = task.await.unwrap();
    assert_eq!(snapshot.messages_received, 3);
    assert_eq!(snapshot.records_stored, 6);
    assert_eq!(metrics.snapshot(), snapshot);

    let content = fs::read_to_string(dir.path().join("vix").join("positions.txt")).unwrap();
    assert_eq!(content.lines().count(), 6);
}

fn numbered(count: usize) -> Envelope {
    let records = (0..count)
        .map(|i| Record::new().with("seq", i as i64))
        .collect();
    Envelope::new("feedmaker", "vix").with_records(records)
}

fn sequence(path: &std::path::Path) -> Vec<i64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["seq"].as_i64().unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_store_appends_in_call_order() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "positions.txt");
    cfg.flatten = Some("request_data".into());
    cfg.store_mode = Some("append".into());
    let filer = Filer::from_route("vix_log", &cfg).unwrap();

    let handles = filer.store(&numbered(400));
    assert_eq!(handles.len(), 400);
    for handle in handles {
        handle.await.unwrap();
    }

    let seq = sequence(&dir.path().join("vix").join("positions.txt"));
    assert_eq!(seq, (0..400).collect::<Vec<_>>());
    assert_eq!(filer.metrics().snapshot().records_stored, 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_store_appends_across_messages_in_call_order() {
    let dir = TempDir::new().unwrap();
    let mut cfg = route(&dir, "log.txt");
    cfg.store_mode = Some("append".into());
    let filer = Filer::from_route("vix_log", &cfg).unwrap();

    let mut handles = Vec::new();
    for i in 0..100_i64 {
        handles.extend(filer.store(&Envelope::new("feedmaker", "vix").with_field("seq", i)));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let seq = sequence(&dir.path().join("vix").join("log.txt"));
    assert_eq!(seq, (0..100).collect::<Vec<_>>());
}
