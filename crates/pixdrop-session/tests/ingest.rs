// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image ingestion against the SQLite store.

use chrono::{TimeZone, Utc};
use pixdrop_core::{ImageEvent, ImageStore, InboundEvent, MediaSource, PixdropError};
use pixdrop_session::IngestOutcome;
use pixdrop_test_utils::{TestHarness, image_event, text_event};

#[tokio::test]
async fn image_is_stored_with_defaults() {
    let harness = TestHarness::new().await.unwrap();
    let event = InboundEvent::Image(ImageEvent {
        message_id: "m1".into(),
        sender: "alice".into(),
        timestamp: None,
        mime_type: None,
        caption: None,
        media: MediaSource::Inline(vec![0xFF, 0xD8, 0xFF]),
    });

    let outcome = harness.ingest(event).await;
    assert!(matches!(outcome, IngestOutcome::Stored { ref message_id } if message_id == "m1"));

    let record = harness.store.get_image("m1").await.unwrap().unwrap();
    assert_eq!(record.content_type, "image/jpeg");
    assert_eq!(record.caption, "");
    assert_eq!(record.sender, "alice");
}

#[tokio::test]
async fn caption_and_timestamp_are_kept() {
    let harness = TestHarness::new().await.unwrap();
    let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let event = InboundEvent::Image(ImageEvent {
        message_id: "m2".into(),
        sender: "bob".into(),
        timestamp: Some(ts),
        mime_type: Some("image/webp".into()),
        caption: Some("holiday".into()),
        media: MediaSource::Inline(vec![1, 2]),
    });

    harness.ingest(event).await;

    let record = harness.store.get_image("m2").await.unwrap().unwrap();
    assert_eq!(record.timestamp, ts);
    assert_eq!(record.caption, "holiday");
    assert_eq!(record.content_type, "image/webp");
}

#[tokio::test]
async fn remote_media_is_downloaded() {
    let harness = TestHarness::new().await.unwrap();
    harness.transport.add_media("file-77", vec![7; 16]);
    let event = InboundEvent::Image(ImageEvent {
        message_id: "m3".into(),
        sender: "carol".into(),
        timestamp: None,
        mime_type: Some("image/png".into()),
        caption: None,
        media: MediaSource::Remote("file-77".into()),
    });

    let outcome = harness.ingest(event).await;
    assert!(matches!(outcome, IngestOutcome::Stored { .. }));
    let record = harness.store.get_image("m3").await.unwrap().unwrap();
    assert_eq!(record.image_data, vec![7; 16]);
}

#[tokio::test]
async fn failed_download_notifies_sender() {
    let harness = TestHarness::new().await.unwrap();
    let event = InboundEvent::Image(ImageEvent {
        message_id: "m4".into(),
        sender: "dave".into(),
        timestamp: None,
        mime_type: None,
        caption: None,
        media: MediaSource::Remote("missing".into()),
    });

    let outcome = harness.ingest(event).await;
    assert!(matches!(outcome, IngestOutcome::Failed { .. }));
    let sent = harness.transport.sent_texts().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "dave");
    assert!(harness.store.get_image("m4").await.unwrap().is_none());
}

#[tokio::test]
async fn text_events_are_ignored() {
    let harness = TestHarness::new().await.unwrap();
    let outcome = harness.ingest(text_event("t1", "alice", "hello")).await;
    assert!(matches!(outcome, IngestOutcome::Ignored));
    assert_eq!(harness.store.count_images().await.unwrap(), 0);
    assert!(harness.transport.sent_texts().await.is_empty());
}

#[tokio::test]
async fn duplicate_keeps_original_and_notifies() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .ingest(image_event("m1", "alice", "image/png", vec![1; 10]))
        .await;

    let outcome = harness
        .ingest(image_event("m1", "alice", "image/gif", vec![2; 3]))
        .await;

    match outcome {
        IngestOutcome::Failed { error, .. } => {
            assert!(matches!(error, PixdropError::DuplicateRecord { .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let record = harness.store.get_image("m1").await.unwrap().unwrap();
    assert_eq!(record.image_data, vec![1; 10]);
    assert_eq!(record.content_type, "image/png");
    assert_eq!(harness.transport.sent_texts().await[0].to, "alice");
}

#[tokio::test]
async fn notify_target_overrides_sender() {
    let harness = TestHarness::builder()
        .with_notify_target("ops-room")
        .build()
        .await
        .unwrap();
    harness
        .ingest(image_event("m1", "alice", "image/png", vec![1]))
        .await;
    harness
        .ingest(image_event("m1", "alice", "image/png", vec![2]))
        .await;

    let sent = harness.transport.sent_texts().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops-room");
}

#[tokio::test]
async fn notification_failure_is_swallowed() {
    let harness = TestHarness::new().await.unwrap();
    harness.transport.set_fail_sends(true);
    harness
        .ingest(image_event("m1", "alice", "image/png", vec![1]))
        .await;

    let outcome = harness
        .ingest(image_event("m1", "alice", "image/png", vec![1]))
        .await;
    assert!(matches!(outcome, IngestOutcome::Failed { .. }));
}

#[tokio::test]
async fn malformed_images_are_dropped_silently() {
    let harness = TestHarness::new().await.unwrap();

    let empty_payload = harness
        .ingest(image_event("m-empty", "alice", "image/png", vec![]))
        .await;
    let missing_id = harness
        .ingest(image_event("", "alice", "image/png", vec![1, 2, 3]))
        .await;

    assert!(matches!(empty_payload, IngestOutcome::Dropped { .. }));
    assert!(matches!(missing_id, IngestOutcome::Dropped { .. }));
    assert!(harness.transport.sent_texts().await.is_empty());
    assert_eq!(harness.store.count_images().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_remote_download_is_dropped_silently() {
    let harness = TestHarness::new().await.unwrap();
    harness.transport.add_media("file-empty", vec![]);
    let event = InboundEvent::Image(ImageEvent {
        message_id: "m5".into(),
        sender: "erin".into(),
        timestamp: None,
        mime_type: None,
        caption: None,
        media: MediaSource::Remote("file-empty".into()),
    });

    let outcome = harness.ingest(event).await;
    assert!(matches!(outcome, IngestOutcome::Dropped { .. }));
    assert!(harness.transport.sent_texts().await.is_empty());
}
