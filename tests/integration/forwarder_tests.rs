//! Per-attachment forwarding and failure isolation.

use logistics_relay::routing::forwarder::{attribution_comment, Forwarder};
use logistics_relay::AppError;

use super::test_helpers::{image, logistics_event, pdf, MockTransfer, LOGISTICS};

#[tokio::test]
async fn images_are_uploaded_with_attribution() {
    let transfer = MockTransfer::new();
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let event = logistics_event("1.0", "to warehouse team", vec![image("F1")]);

    let report = forwarder.forward(&event, "C1").await;

    assert_eq!(report.forwarded, ["F1"]);
    assert!(report.is_complete());
    let uploads = transfer.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].channel_id, "C1");
    assert_eq!(uploads[0].filename, "F1.jpg");
    assert_eq!(
        uploads[0].comment,
        format!("Forwarded from <#{LOGISTICS}>:\nto warehouse team")
    );
    assert_eq!(&uploads[0].bytes[..], b"bytes-of:https://files.example/F1");
}

#[tokio::test]
async fn first_download_failure_does_not_block_second() {
    let transfer = MockTransfer::new();
    transfer.fail_download("https://files.example/F1");
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let event = logistics_event("1.0", "to ops", vec![image("F1"), image("F2")]);

    let report = forwarder.forward(&event, "C1").await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].attachment_id, "F1");
    assert!(matches!(report.failures[0].error, AppError::Download(_)));
    assert_eq!(report.forwarded, ["F2"]);
    assert_eq!(transfer.downloads().len(), 2);
    let uploads = transfer.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].filename, "F2.jpg");
}

#[tokio::test]
async fn upload_failures_are_isolated_per_attachment() {
    let transfer = MockTransfer::new();
    transfer.fail_uploads();
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let event = logistics_event("1.0", "to ops", vec![image("F1"), image("F2")]);

    let report = forwarder.forward(&event, "C1").await;

    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|f| matches!(f.error, AppError::Upload(_))));
    assert_eq!(transfer.downloads().len(), 2);
}

#[tokio::test]
async fn non_images_are_never_forwarded() {
    let transfer = MockTransfer::new();
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let event = logistics_event("1.0", "to ops", vec![pdf("F1"), image("F2")]);

    let report = forwarder.forward(&event, "C1").await;

    assert_eq!(report.skipped, ["F1"]);
    assert_eq!(report.forwarded, ["F2"]);
    assert_eq!(transfer.downloads(), ["https://files.example/F2"]);
}

#[tokio::test]
async fn missing_url_is_a_failure_without_download() {
    let transfer = MockTransfer::new();
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let mut file = image("F1");
    file.download_url = None;
    let event = logistics_event("1.0", "to ops", vec![file]);

    let report = forwarder.forward(&event, "C1").await;

    assert_eq!(report.failures.len(), 1);
    assert!(transfer.downloads().is_empty());
}

#[tokio::test]
async fn default_filename_used_when_unnamed() {
    let transfer = MockTransfer::new();
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let mut file = image("F1");
    file.display_name = None;
    let event = logistics_event("1.0", "", vec![file]);

    forwarder.forward(&event, "C1").await;

    assert_eq!(transfer.uploads()[0].filename, "image.jpg");
}

#[tokio::test]
async fn uploads_follow_attachment_order() {
    let transfer = MockTransfer::new();
    let forwarder = Forwarder::new(transfer.clone(), "image.jpg");
    let event = logistics_event("1.0", "to ops", vec![image("F3"), image("F1"), image("F2")]);

    forwarder.forward(&event, "C1").await;

    let names: Vec<String> = transfer.uploads().into_iter().map(|u| u.filename).collect();
    assert_eq!(names, ["F3.jpg", "F1.jpg", "F2.jpg"]);
}

#[test]
fn attribution_mentions_source_and_caption() {
    assert_eq!(
        attribution_comment("C1", "pallets for dock 4"),
        "Forwarded from <#C1>:\npallets for dock 4"
    );
}
