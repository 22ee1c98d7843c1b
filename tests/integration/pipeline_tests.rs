//! End-to-end relay pipeline behaviour with mocked Slack collaborators.

use logistics_relay::models::InboundEvent;
use logistics_relay::routing::filter::SkipReason;
use logistics_relay::routing::{RelayOutcome, RelayPipeline};

use super::test_helpers::{
    image, logistics_event, pdf, test_config, MockDirectory, MockTransfer, LOGISTICS,
};

#[tokio::test]
async fn forwards_images_to_matched_channel() {
    let directory = MockDirectory::with_channels(&[("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory.clone(), transfer.clone());
    let event = logistics_event("1.0", "please route to warehouse team asap", vec![image("F1")]);

    let outcome = pipeline.handle(&event).await;

    match outcome {
        RelayOutcome::Forwarded {
            destination,
            report,
        } => {
            assert_eq!(destination, "C1");
            assert_eq!(report.forwarded, ["F1"]);
        }
        other => panic!("expected forwarded, got {other:?}"),
    }
    assert_eq!(transfer.uploads()[0].channel_id, "C1");
    assert_eq!(directory.describe_calls(), 1);
}

#[tokio::test]
async fn bot_messages_never_reach_resolver() {
    let directory = MockDirectory::with_channels(&[("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory.clone(), transfer.clone());
    let event = InboundEvent {
        subtype: Some("bot_message".into()),
        ..logistics_event("1.0", "warehouse team <#C1>", vec![image("F1")])
    };

    let outcome = pipeline.handle(&event).await;

    assert!(matches!(
        outcome,
        RelayOutcome::Skipped(SkipReason::BotMessage)
    ));
    assert_eq!(directory.list_calls(), 0);
    assert!(transfer.downloads().is_empty());
}

#[tokio::test]
async fn foreign_channel_is_skipped() {
    let directory = MockDirectory::with_channels(&[("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory, transfer.clone());
    let event = InboundEvent {
        source_channel_id: "CRANDOM".into(),
        ..logistics_event("1.0", "warehouse team", vec![image("F1")])
    };

    assert!(matches!(
        pipeline.handle(&event).await,
        RelayOutcome::Skipped(SkipReason::ForeignChannel)
    ));
    assert!(transfer.uploads().is_empty());
}

#[tokio::test]
async fn unresolved_caption_uploads_nothing() {
    let directory = MockDirectory::with_channels(&[("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory.clone(), transfer.clone());
    let event = logistics_event("1.0", "random text", vec![image("F1"), image("F2")]);

    assert!(matches!(
        pipeline.handle(&event).await,
        RelayOutcome::Unresolved
    ));
    assert!(transfer.downloads().is_empty());
    assert!(transfer.uploads().is_empty());
    assert_eq!(directory.describe_calls(), 0);
}

#[tokio::test]
async fn directory_outage_drops_event_without_upload() {
    let directory = MockDirectory::failing();
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory, transfer.clone());
    let event = logistics_event("1.0", "warehouse team", vec![image("F1")]);

    assert!(matches!(
        pipeline.handle(&event).await,
        RelayOutcome::Unresolved
    ));
    assert!(transfer.uploads().is_empty());
}

#[tokio::test]
async fn redelivered_event_is_processed_once() {
    let directory = MockDirectory::with_channels(&[]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory, transfer.clone());
    let event = logistics_event("1.0", "<#C5|ops>", vec![image("F1")]);

    let first = pipeline.handle(&event).await;
    let second = pipeline.handle(&event).await;

    assert!(matches!(first, RelayOutcome::Forwarded { .. }));
    assert!(matches!(second, RelayOutcome::Duplicate));
    assert_eq!(transfer.uploads().len(), 1);
}

#[tokio::test]
async fn pdf_only_event_resolves_but_forwards_nothing() {
    let directory = MockDirectory::with_channels(&[]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory, transfer.clone());
    let event = logistics_event("1.0", "<#C5|ops>", vec![pdf("F1")]);

    match pipeline.handle(&event).await {
        RelayOutcome::Forwarded { report, .. } => {
            assert!(report.forwarded.is_empty());
            assert_eq!(report.skipped, ["F1"]);
        }
        other => panic!("expected forwarded, got {other:?}"),
    }
    assert!(transfer.downloads().is_empty());
}

#[tokio::test]
async fn partial_failure_reports_one_failure_and_forwards_rest() {
    let directory = MockDirectory::with_channels(&[]);
    let transfer = MockTransfer::new();
    transfer.fail_download("https://files.example/F1");
    let pipeline = RelayPipeline::new(&test_config(0), directory, transfer.clone());
    let event = logistics_event("1.0", "<#C5|ops>", vec![image("F1"), image("F2")]);

    match pipeline.handle(&event).await {
        RelayOutcome::Forwarded { report, .. } => {
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.forwarded, ["F2"]);
        }
        other => panic!("expected forwarded, got {other:?}"),
    }
}

#[tokio::test]
async fn describe_failure_does_not_change_outcome() {
    let directory = MockDirectory::with_channels(&[("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory.clone(), transfer.clone());
    let event = logistics_event("1.0", "<#C1>", vec![image("F1")]);
    directory.set_failing(true);

    assert!(matches!(
        pipeline.handle(&event).await,
        RelayOutcome::Forwarded { .. }
    ));
    assert_eq!(directory.describe_calls(), 1);
    assert_eq!(transfer.uploads().len(), 1);
}

#[tokio::test]
async fn caption_naming_source_channel_is_not_forwarded() {
    let directory =
        MockDirectory::with_channels(&[(LOGISTICS, "logistics"), ("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory, transfer.clone());

    let by_name = logistics_event("1.0", "logistics: send to warehouse team", vec![image("F1")]);
    let by_mention =
        logistics_event("2.0", &format!("back to <#{LOGISTICS}>"), vec![image("F2")]);

    assert!(matches!(
        pipeline.handle(&by_name).await,
        RelayOutcome::Unresolved
    ));
    assert!(matches!(
        pipeline.handle(&by_mention).await,
        RelayOutcome::Unresolved
    ));
    assert!(transfer.downloads().is_empty());
    assert!(transfer.uploads().is_empty());
}

#[tokio::test]
async fn relayed_file_share_is_not_forwarded_again() {
    let directory = MockDirectory::with_channels(&[("C1", "warehouse-team")]);
    let transfer = MockTransfer::new();
    let pipeline = RelayPipeline::new(&test_config(0), directory.clone(), transfer.clone());
    let original = logistics_event("1.0", "to warehouse team", vec![image("F1")]);

    assert!(matches!(
        pipeline.handle(&original).await,
        RelayOutcome::Forwarded { .. }
    ));

    // The relay's own upload comes back as a file share carrying its bot id.
    let comment = transfer.uploads().remove(0).comment;
    let echoed = InboundEvent {
        bot_id: Some("B0RELAY".into()),
        ..logistics_event("2.0", &comment, vec![image("F9")])
    };

    assert!(matches!(
        pipeline.handle(&echoed).await,
        RelayOutcome::Skipped(SkipReason::BotMessage)
    ));
    assert_eq!(transfer.uploads().len(), 1);
    assert_eq!(directory.list_calls(), 1);
}
