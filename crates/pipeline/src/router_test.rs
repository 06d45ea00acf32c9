//! Router and bus tests
//!
//! Fan-out, backpressure, closed channels, metrics, and the bus wired to
//! real filers writing into a temp directory.

use std::sync::Arc;
use std::time::Duration;

use civic_config::RouteConfig;
use civic_protocol::{Address, Envelope, Record};
use civic_routing::{RouteId, RoutingTable, RoutingTableBuilder};
use civic_sinks::Filer;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::{Bus, FilerHandle, Router};

const VIX: &str = "feedmaker.vix";
const PARK: &str = "feedmaker.cam_park";

fn envelope(module_id: &str, records: usize) -> Envelope {
    let records = (0..records)
        .map(|i| Record::new().with("VehicleRef", i.to_string()))
        .collect();
    Envelope::new("feedmaker", module_id).with_records(records)
}

/// vix_latest and vix_log on VIX, park_latest on PARK
fn create_table() -> (RoutingTable, Vec<RouteId>) {
    let mut builder = RoutingTableBuilder::new();
    let ids = vec![
        builder.add_route("vix_latest", VIX).unwrap(),
        builder.add_route("vix_log", VIX).unwrap(),
        builder.add_route("park_latest", PARK).unwrap(),
    ];
    (builder.build(), ids)
}

fn register_all(router: &mut Router, ids: &[RouteId], capacity: usize) -> Vec<mpsc::Receiver<Arc<Envelope>>> {
    ids.iter()
        .map(|&id| {
            let (tx, rx) = mpsc::channel(capacity);
            router.register_filer(FilerHandle::new(id, format!("filer_{}", id.index()), tx));
            rx
        })
        .collect()
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_router_new_has_no_filers() {
    let (table, _) = create_table();
    let router = Router::new(table);
    assert_eq!(router.filer_count(), 0);
}

#[tokio::test]
async fn test_register_filers() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let _rx = register_all(&mut router, &ids, 10);

    assert_eq!(router.filer_count(), 3);
}

#[tokio::test]
async fn test_high_route_id_extends_storage() {
    let (table, _) = create_table();
    let mut router = Router::new(table);

    let (tx, _rx) = mpsc::channel(1);
    router.register_filer(FilerHandle::new(RouteId::new(40), "late", tx));
    assert_eq!(router.filer_count(), 1);
}

// ============================================================================
// Publishing
// ============================================================================

#[tokio::test]
async fn test_publish_fans_out_to_subscribers_only() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let mut rx = register_all(&mut router, &ids, 10);

    let delivered = router.publish(&Address::new(VIX), envelope("vix", 3));
    assert_eq!(delivered, 2);

    let first = timeout(Duration::from_millis(100), rx[0].recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    let second = rx[1].recv().await.unwrap();
    assert_eq!(first.record_count(), 3);
    assert!(Arc::ptr_eq(&first, &second));

    let nothing = timeout(Duration::from_millis(50), rx[2].recv()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_publish_unknown_address_is_dropped() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let _rx = register_all(&mut router, &ids, 10);

    assert_eq!(router.publish(&Address::new("feedmaker.none"), envelope("x", 1)), 0);

    let s = router.metrics().snapshot();
    assert_eq!(s.envelopes_received, 1);
    assert_eq!(s.envelopes_dropped, 1);
    assert_eq!(s.filer_sends_failed, 0);
}

#[tokio::test]
async fn test_publish_to_unregistered_filer() {
    let (table, _) = create_table();
    let router = Router::new(table);

    assert_eq!(router.publish(&Address::new(PARK), envelope("cam_park", 1)), 0);
    let s = router.metrics().snapshot();
    assert_eq!(s.filer_sends_failed, 1);
    assert_eq!(s.envelopes_dropped, 1);
}

#[tokio::test]
async fn test_backpressure_when_channel_full() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let _rx = register_all(&mut router, &ids, 1);

    assert_eq!(router.publish(&Address::new(PARK), envelope("cam_park", 1)), 1);
    assert_eq!(router.publish(&Address::new(PARK), envelope("cam_park", 1)), 0);

    let s = router.metrics().snapshot();
    assert_eq!(s.backpressure_events, 1);
    assert_eq!(s.envelopes_routed, 1);
    assert_eq!(s.envelopes_dropped, 1);
}

#[tokio::test]
async fn test_backpressure_partial_delivery() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let mut rx = register_all(&mut router, &ids, 1);

    router.publish(&Address::new(VIX), envelope("vix", 1));
    // Drain only vix_latest
    rx[0].recv().await.unwrap();

    assert_eq!(router.publish(&Address::new(VIX), envelope("vix", 1)), 1);
    let s = router.metrics().snapshot();
    assert_eq!(s.envelopes_routed, 2);
    assert_eq!(s.backpressure_events, 1);
}

#[tokio::test]
async fn test_publish_blocking_waits_for_capacity() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let mut rx = register_all(&mut router, &ids, 1);
    let router = Arc::new(router);

    router.publish(&Address::new(PARK), envelope("cam_park", 1));

    let publisher = {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            router
                .publish_blocking(&Address::new(PARK), envelope("cam_park", 2))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!publisher.is_finished());

    assert_eq!(rx[2].recv().await.unwrap().record_count(), 1);
    assert_eq!(publisher.await.unwrap(), 1);
    assert_eq!(rx[2].recv().await.unwrap().record_count(), 2);
}

#[tokio::test]
async fn test_publish_to_closed_channel() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let mut rx = register_all(&mut router, &ids, 10);

    rx.remove(1);

    assert_eq!(router.publish(&Address::new(VIX), envelope("vix", 1)), 1);
    let s = router.metrics().snapshot();
    assert_eq!(s.filer_sends_failed, 1);
    assert_eq!(s.backpressure_events, 0);
}

#[tokio::test]
async fn test_metrics_count_records() {
    let (table, ids) = create_table();
    let mut router = Router::new(table);
    let _rx = register_all(&mut router, &ids, 10);

    router.publish(&Address::new(VIX), envelope("vix", 4));
    router.publish(&Address::new(PARK), envelope("cam_park", 2));

    let s = router.metrics().snapshot();
    assert_eq!(s.envelopes_received, 2);
    assert_eq!(s.records_processed, 6);
    assert_eq!(s.filer_sends_success, 3);
}

#[tokio::test]
async fn test_router_debug() {
    let (table, _) = create_table();
    let router = Router::new(table);
    let debug = format!("{router:?}");
    assert!(debug.contains("Router"));
    assert!(debug.contains("route_count"));
}

// ============================================================================
// Bus
// ============================================================================

fn filer(dir: &TempDir, name: &str, address: &str, store_name: &str, mode: &str) -> Filer {
    let route = RouteConfig {
        source_address: Some(address.into()),
        flatten: Some("request_data".into()),
        store_path: Some(dir.path().join("{{module_id}}").to_string_lossy().into_owned()),
        store_name: Some(store_name.into()),
        store_mode: Some(mode.into()),
        ..Default::default()
    };
    Filer::from_route(name, &route).unwrap()
}

#[tokio::test]
async fn test_bus_delivers_to_filers_and_drains_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let filers = vec![
        filer(&dir, "vix_vehicles", VIX, "{{VehicleRef}}.json", "write"),
        filer(&dir, "vix_log", VIX, "log.txt", "append"),
    ];
    let bus = Bus::start(filers, 8).unwrap();

    assert_eq!(bus.publish_blocking(&Address::new(VIX), envelope("vix", 3)).await, 2);
    assert_eq!(bus.publish(&Address::new(PARK), envelope("cam_park", 1)), 0);

    let snapshots = bus.shutdown().await.unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].0, "vix_vehicles");
    assert_eq!(snapshots[0].1.records_stored, 3);
    assert_eq!(snapshots[1].1.records_stored, 3);

    let vix = dir.path().join("vix");
    assert!(vix.join("0.json").exists());
    assert!(vix.join("2.json").exists());
    let log = std::fs::read_to_string(vix.join("log.txt")).unwrap();
    assert_eq!(log.lines().count(), 3);
}

#[tokio::test]
async fn test_bus_rejects_duplicate_route_names() {
    let dir = TempDir::new().unwrap();
    let filers = vec![
        filer(&dir, "same", VIX, "a.json", "write"),
        filer(&dir, "same", PARK, "b.json", "write"),
    ];
    assert!(Bus::start(filers, 8).is_err());
}
