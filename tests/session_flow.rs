use cart_risk::{
    ActivitySignals, ActivityTracker, Cart, CartSnapshot, GateDecision, NewCartItem, NoNoise, RetentionGate,
    RetentionPolicy, RiskConfig, RiskEstimator, RiskMonitor, TickTrigger,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::io::Write;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tempfile::NamedTempFile;

fn stale_cart(age_secs: i64) -> Cart {
    let mut cart = Cart::new();
    cart.add_item(
        NewCartItem::new("Wireless Bluetooth Headphones", 79.99, "Electronics", 4.5),
        Utc::now() - ChronoDuration::seconds(age_secs),
    );
    cart
}

#[test]
fn test_snapshot_file_round_trip_through_estimator() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let json = r#"[
  {"id": "1", "name": "Wireless Bluetooth Headphones", "price": 79.99, "quantity": 1,
   "category": "Electronics", "rating": 4.5, "addedAt": "2026-10-19T10:00:00Z"},
  {"id": "2", "name": "Cozy Winter Sweater", "price": 34.99, "quantity": 2,
   "category": "Clothing", "rating": 4.2, "addedAt": "2026-10-19T10:02:00Z"},
  {"id": "3", "name": "Organic Green Tea", "price": 12.99, "quantity": 1,
   "category": "Food", "rating": 4.8, "addedAt": "2026-10-19T10:03:00Z"}
]"#;
    temp_file.write_all(json.as_bytes()).unwrap();

    let snapshot = CartSnapshot::from_json_file(temp_file.path()).unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.item_count(), 4);
    assert_eq!(snapshot.category_count(), 3);

    let now = "2026-10-19T10:05:00Z".parse().unwrap();
    let assessment = RiskEstimator::default()
        .assess(&snapshot, &Default::default(), now, &mut NoNoise)
        .unwrap();
    assert_eq!(assessment.factors.time_in_cart_secs, 300.0);
    assert_eq!(assessment.factors.category_diversity, 3);

    let rendered = serde_json::to_value(&assessment).unwrap();
    assert!(rendered.get("baseScore").is_some());
    assert!(rendered["recommendation"].get("displayValue").is_some());
}

#[test]
fn test_snapshot_file_with_duplicate_ids_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let json = r#"[
  {"id": "1", "name": "A", "price": 1.0, "quantity": 1, "category": "Food", "addedAt": "2026-10-19T10:00:00Z"},
  {"id": "1", "name": "B", "price": 2.0, "quantity": 1, "category": "Food", "addedAt": "2026-10-19T10:00:00Z"}
]"#;
    temp_file.write_all(json.as_bytes()).unwrap();

    let err = CartSnapshot::from_json_file(temp_file.path()).unwrap_err();
    assert!(err.user_friendly_message().contains("duplicate line id"));
}

#[test]
fn test_tracker_activity_changes_assessment() {
    let start = Utc::now();
    let cart = stale_cart(600);
    let mut tracker = ActivityTracker::new(start);
    let estimator = RiskEstimator::default();

    tracker.refresh_idle(start + ChronoDuration::seconds(300));
    let idle = estimator
        .assess(&cart.snapshot(), &tracker.signals(), start, &mut NoNoise)
        .unwrap();

    for _ in 0..100 {
        tracker.record_pointer_move(start);
    }
    let active = estimator
        .assess(&cart.snapshot(), &tracker.signals(), start, &mut NoNoise)
        .unwrap();

    assert!(active.base_score < idle.base_score);
    assert_eq!(active.factors.idle_time_secs, 0.0);
}

#[tokio::test]
async fn test_monitor_reacts_to_cart_change() {
    let cart = Arc::new(RwLock::new(stale_cart(600)));
    let tracker = Arc::new(RwLock::new(ActivityTracker::new(Utc::now())));

    let mut monitor = RiskMonitor::new(
        RiskEstimator::default(),
        RetentionGate::default(),
        Arc::clone(&cart),
        Arc::clone(&tracker),
        Duration::from_secs(60),
    );
    let cart_changed = monitor.cart_changed_handle();

    let mut ticks = Vec::new();
    let count = monitor
        .run(&mut NoNoise, Some(2), |tick| {
            ticks.push(tick.clone());
            if tick.sequence == 1 {
                if let Ok(mut cart) = cart.write() {
                    cart.clear();
                }
                cart_changed.notify_one();
            }
        })
        .await;

    assert_eq!(count, 2);
    assert_eq!(ticks[0].trigger, TickTrigger::Interval);
    assert!(ticks[0].assessment.is_some());
    assert_eq!(ticks[1].trigger, TickTrigger::CartChanged);
    assert!(ticks[1].assessment.is_none());
    assert_eq!(ticks[1].decision, GateDecision::Idle);
}

#[tokio::test]
async fn test_monitor_shows_prompt_once_after_delay() {
    let cart = stale_cart(1_200);
    let mut tracker = ActivityTracker::new(Utc::now() - ChronoDuration::seconds(300));
    tracker.refresh_idle(Utc::now());

    let mut monitor = RiskMonitor::new(
        RiskEstimator::default(),
        RetentionGate::new(RetentionPolicy {
            prompt_above: 70,
            prompt_delay_ms: 30,
        }),
        cart,
        tracker,
        Duration::from_millis(10),
    );

    let mut shown = 0;
    let mut saw_pending = false;
    monitor
        .run(&mut NoNoise, Some(12), |tick| match tick.decision {
            GateDecision::Show(_) => shown += 1,
            GateDecision::Pending { .. } => saw_pending = true,
            _ => {}
        })
        .await;

    assert!(saw_pending);
    assert_eq!(shown, 1);
    assert!(monitor.gate().has_shown());
}

#[test]
fn test_config_drives_monitor_settings() {
    let config = RiskConfig::from_toml_str(
        r#"
[noise]
amplitude = 0.0

[retention]
prompt_above = 50
prompt_delay_ms = 0

[monitor]
interval_secs = 2
"#,
    )
    .unwrap();

    let now = Utc::now();
    let mut monitor = RiskMonitor::new(
        config.estimator(),
        config.gate(),
        stale_cart(600).snapshot(),
        ActivitySignals::default(),
        config.monitor_interval(),
    );
    assert_eq!(monitor.interval(), Duration::from_secs(2));

    let tick = monitor.evaluate(now, &mut NoNoise, TickTrigger::Interval);
    assert!(matches!(tick.decision, GateDecision::Show(_)));
}

#[test]
fn test_demo_files_load() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");

    let config = RiskConfig::from_file(dir.join("risk.toml")).unwrap();
    assert_eq!(config, RiskConfig::default());

    let snapshot = CartSnapshot::from_json_file(dir.join("cart.json")).unwrap();
    assert_eq!(snapshot.len(), 3);
}
