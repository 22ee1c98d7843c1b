//! Image re-upload to the resolved destination.
//!
//! Attachments are processed one at a time in posting order. A failure on
//! one attachment is logged and recorded in the [`ForwardReport`]; it never
//! stops the remaining attachments.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, info_span, Instrument};

use crate::models::{Attachment, InboundEvent};
use crate::{AppError, Result};

/// A file ready to be uploaded to a channel.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Destination channel identifier.
    pub channel_id: String,
    /// File contents.
    pub bytes: Bytes,
    /// Filename shown in the destination channel.
    pub filename: String,
    /// Comment posted alongside the file.
    pub comment: String,
}

/// Authenticated file download and upload.
pub trait FileTransfer: Send + Sync {
    /// Fetch the bytes behind an attachment URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Download`] on transport errors, timeouts, or a
    /// non-success HTTP status.
    fn download(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + '_>>;

    /// Upload a file to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Upload`] if any step of the upload fails.
    fn upload(&self, upload: FileUpload) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// An attachment that could not be forwarded.
#[derive(Debug)]
pub struct TransferFailure {
    /// Attachment identifier.
    pub attachment_id: String,
    /// What went wrong.
    pub error: AppError,
}

/// Per-event forwarding summary.
#[derive(Debug, Default)]
pub struct ForwardReport {
    /// Attachments uploaded to the destination, in order.
    pub forwarded: Vec<String>,
    /// Attachments skipped because they are not images.
    pub skipped: Vec<String>,
    /// Attachments whose download or upload failed.
    pub failures: Vec<TransferFailure>,
}

impl ForwardReport {
    /// Whether every image attachment was forwarded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build the comment posted with each forwarded image.
#[must_use]
pub fn attribution_comment(source_channel_id: &str, caption: &str) -> String {
    format!("Forwarded from <#{source_channel_id}>:\n{caption}")
}

/// Downloads image attachments and re-uploads them to a destination.
#[derive(Clone)]
pub struct Forwarder {
    transfer: Arc<dyn FileTransfer>,
    default_filename: String,
}

impl Forwarder {
    /// Create a forwarder using `transfer` for network I/O.
    #[must_use]
    pub fn new(transfer: Arc<dyn FileTransfer>, default_filename: impl Into<String>) -> Self {
        Self {
            transfer,
            default_filename: default_filename.into(),
        }
    }

    /// Forward every image attachment of `event` to `destination`.
    pub async fn forward(&self, event: &InboundEvent, destination: &str) -> ForwardReport {
        let comment = attribution_comment(&event.source_channel_id, &event.caption_text);
        let mut report = ForwardReport::default();

        for attachment in &event.attachments {
            info!(
                attachment_id = %attachment.id,
                name = ?attachment.display_name,
                mime_type = ?attachment.mime_type,
                "file candidate"
            );

            if !attachment.is_image() {
                info!(attachment_id = %attachment.id, "skip file: not an image");
                report.skipped.push(attachment.id.clone());
                continue;
            }

            let span = info_span!(
                "forward_attachment",
                attachment_id = %attachment.id,
                destination
            );
            match self
                .forward_one(attachment, destination, &comment)
                .instrument(span)
                .await
            {
                Ok(()) => report.forwarded.push(attachment.id.clone()),
                Err(err) => {
                    error!(
                        attachment_id = %attachment.id,
                        destination,
                        %err,
                        "failed to forward file"
                    );
                    report.failures.push(TransferFailure {
                        attachment_id: attachment.id.clone(),
                        error: err,
                    });
                }
            }
        }

        report
    }

    async fn forward_one(
        &self,
        attachment: &Attachment,
        destination: &str,
        comment: &str,
    ) -> Result<()> {
        let url = attachment
            .download_url
            .as_deref()
            .ok_or_else(|| AppError::Download("attachment has no download url".into()))?;

        let bytes = self.transfer.download(url).await?;
        info!(bytes = bytes.len(), "downloaded file");

        let filename = attachment.upload_filename(&self.default_filename).to_owned();
        info!(%filename, "uploading file");
        self.transfer
            .upload(FileUpload {
                channel_id: destination.to_owned(),
                bytes,
                filename,
                comment: comment.to_owned(),
            })
            .await?;

        info!("upload ok");
        Ok(())
    }
}
