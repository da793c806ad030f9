//! Integration test for session export.
//!
//! Drives a realistic camera session through the store, exports it as JSON,
//! and verifies every retained frame survives the trip with its ordering,
//! timing, and model metadata intact.

use chrono::{TimeDelta, Utc};
use livevlm_history::{EngineConfig, SessionStore};
use livevlm_types::FrameRecord;

/// Feed a short doorway-camera session into `store` under `id`.
fn record_session(store: &mut SessionStore, id: &str) {
    let engine = store.get_mut(id).expect("session exists");
    let start = Utc::now() - TimeDelta::seconds(30);
    let frames = [
        ("gpt-4o", "An empty hallway with a closed door.", 0.8),
        ("gpt-4o", "A person in a red jacket opens the door.", 1.1),
        ("claude-3-haiku", "The person walks toward the camera.", 0.6),
        ("gpt-4o", "The hallway is empty again.", 0.9),
    ];
    for (i, (model, response, secs)) in frames.into_iter().enumerate() {
        engine.add_frame(
            FrameRecord::new("What is happening?", model, response)
                .with_image("aGVsbG8=")
                .with_processing_time(secs)
                .with_timestamp(start + TimeDelta::seconds(10 * i as i64)),
        );
    }
}

#[test]
fn export_roundtrip_preserves_frames() {
    let mut store = SessionStore::new(EngineConfig::default());
    let id = store.start_session(Some("doorway-cam".into()));
    record_session(&mut store, &id);

    let exported = store.get(&id).unwrap().export();
    let json = serde_json::to_string_pretty(&exported).unwrap();
    let loaded: Vec<FrameRecord> = serde_json::from_str(&json).unwrap();

    assert_eq!(loaded, exported);
    assert_eq!(loaded.len(), 4);
    assert!(loaded[1].response.contains("red jacket"));
    assert_eq!(loaded[2].model, "claude-3-haiku");
    assert_eq!(loaded[3].processing_time, Some(0.9));
    assert!(loaded.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    // Images are not retained outside audit mode.
    assert!(loaded.iter().all(|f| f.image.is_none()));
    assert!(!json.contains("aGVsbG8="));
}

#[test]
fn export_keeps_images_in_audit_mode() {
    let mut store = SessionStore::new(EngineConfig {
        retain_images: true,
        ..EngineConfig::default()
    });
    let id = store.start_session(None);
    record_session(&mut store, &id);

    let exported = store.get(&id).unwrap().export();
    assert!(exported.iter().all(|f| f.image.as_deref() == Some("aGVsbG8=")));
}

#[test]
fn stats_match_exported_frames() {
    let mut store = SessionStore::default();
    let id = store.start_session(None);
    record_session(&mut store, &id);

    let stats = store.stats(&id).unwrap();
    assert_eq!(stats.total_frames, 4);
    assert!((stats.session_duration - 30.0).abs() < 1e-6);
    assert!((stats.frames_per_minute.unwrap() - 8.0).abs() < 1e-6);
    assert_eq!(
        stats.models_used.unwrap(),
        vec!["claude-3-haiku".to_string(), "gpt-4o".to_string()]
    );
    assert!((stats.avg_processing_time.unwrap() - 0.85).abs() < 1e-6);

    assert!(store.clear(&id));
    assert!(store.get(&id).unwrap().export().is_empty());
}
