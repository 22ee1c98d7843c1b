//! Slack Socket Mode listener and Web API adapter.
//!
//! [`SlackService`] implements both [`ChannelDirectory`] and
//! [`FileTransfer`] on top of `slack-morphism` and `reqwest`, so the
//! routing pipeline never depends on the SDK directly.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use slack_morphism::prelude::{
    SlackApiConversationsInfoRequest, SlackApiConversationsListRequest, SlackApiFilesComplete,
    SlackApiFilesCompleteUploadExternalRequest, SlackApiFilesGetUploadUrlExternalRequest,
    SlackApiToken, SlackApiTokenType, SlackApiTokenValue, SlackChannelId, SlackClient,
    SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector, SlackClientSession,
    SlackClientSocketModeConfig, SlackClientSocketModeListener, SlackCursorId,
    SlackSocketModeListenerCallbacks,
};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::GlobalConfig;
use crate::models::{Channel, ChannelDetails};
use crate::routing::directory::ChannelDirectory;
use crate::routing::forwarder::{FileTransfer, FileUpload};
use crate::routing::RelayPipeline;
use crate::slack::events;
use crate::{AppError, Result};

/// Slack client wrapper owning the bot token and an HTTP client for file bytes.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    http: reqwest::Client,
    page_size: u16,
    max_pages: u32,
    request_timeout: Duration,
}

impl SlackService {
    /// Build the Slack client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector or HTTP client
    /// cannot be created, or `AppError::Config` if the bot token is missing.
    pub fn new(config: &GlobalConfig) -> Result<Self> {
        if config.slack.bot_token.is_empty() {
            return Err(AppError::Config("slack bot token is not loaded".into()));
        }

        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Slack(format!("failed to init http client: {err}")))?;

        Ok(Self {
            client: Arc::new(SlackClient::new(connector)),
            bot_token: token(&config.slack.bot_token, SlackApiTokenType::Bot),
            http,
            page_size: config.routing.channel_page_size,
            max_pages: config.routing.max_channel_pages,
            request_timeout: config.request_timeout(),
        })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// Start the Socket Mode listener, dispatching push events to `pipeline`.
    ///
    /// The listener runs until `cancel` fires.
    #[must_use]
    pub fn start_socket_mode(
        &self,
        app_token: &str,
        pipeline: Arc<RelayPipeline>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let app_token = token(app_token, SlackApiTokenType::App);
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(pipeline),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.start().await;
            info!("socket mode listener connected");
            cancel.cancelled().await;
            listener.shutdown().await;
            info!("socket mode listener exited");
        })
    }

    async fn list_page(
        &self,
        cursor: Option<SlackCursorId>,
    ) -> Result<(Vec<Channel>, Option<SlackCursorId>)> {
        let mut request = SlackApiConversationsListRequest::new().with_limit(self.page_size);
        request.cursor = cursor;

        let response = bounded(
            self.request_timeout,
            self.http_session().conversations_list(&request),
        )
        .await
        .map_err(|err| AppError::Directory(format!("conversations.list failed: {err}")))?;

        let channels = response
            .channels
            .into_iter()
            .filter_map(|info| {
                info.name
                    .map(|name| Channel::new(info.id.to_string(), name))
            })
            .collect();
        let next = response
            .response_metadata
            .and_then(|meta| meta.next_cursor)
            .filter(|cursor| !cursor.to_string().is_empty());

        Ok((channels, next))
    }
}

impl ChannelDirectory for SlackService {
    fn list_channels(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Channel>>> + Send + '_>> {
        Box::pin(async move {
            let mut channels = Vec::new();
            let mut cursor = None;

            for page in 0..self.max_pages {
                let (batch, next) = self.list_page(cursor).await?;
                debug!(page, count = batch.len(), "listed channel page");
                channels.extend(batch);

                match next {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }

            Ok(channels)
        })
    }

    fn describe(
        &self,
        channel_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelDetails>> + Send + '_>> {
        let channel_id = channel_id.to_owned();
        Box::pin(async move {
            let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel_id.clone()));
            let response = bounded(
                self.request_timeout,
                self.http_session().conversations_info(&request),
            )
            .await
            .map_err(|err| AppError::Directory(format!("conversations.info failed: {err}")))?;

            Ok(ChannelDetails {
                id: channel_id,
                name: response.channel.name,
                is_private: response.channel.flags.is_private.unwrap_or(false),
            })
        })
    }
}

impl FileTransfer for SlackService {
    fn download(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + '_>> {
        let url = url.to_owned();
        Box::pin(async move {
            info!(%url, "downloading file");
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.bot_token.token_value.0)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Download(format!("unexpected status {status}")));
            }

            // Slack answers unauthenticated file requests with a 200 login page.
            let is_html = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.starts_with("text/html"));
            if is_html {
                return Err(AppError::Download(
                    "received html instead of file content; check files:read scope".into(),
                ));
            }

            let bytes = response.bytes().await?;
            info!(%status, bytes = bytes.len(), "download complete");
            Ok(bytes)
        })
    }

    fn upload(&self, upload: FileUpload) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let session = self.http_session();

            // Step 1: Get upload URL.
            let url_request = SlackApiFilesGetUploadUrlExternalRequest::new(
                upload.filename.clone(),
                upload.bytes.len(),
            );
            let url_response = bounded(
                self.request_timeout,
                session.get_upload_url_external(&url_request),
            )
            .await
            .map_err(|err| AppError::Upload(format!("failed to get upload url: {err}")))?;

            // Step 2: Upload content to the URL.
            self.http
                .post(url_response.upload_url.0.to_string())
                .body(upload.bytes)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|err| AppError::Upload(format!("failed to upload file: {err}")))?;

            // Step 3: Complete the upload and share it in the destination.
            let file_ref = SlackApiFilesComplete {
                id: url_response.file_id,
                title: Some(upload.filename),
            };
            let mut complete_request =
                SlackApiFilesCompleteUploadExternalRequest::new(vec![file_ref]);
            complete_request.channel_id = Some(SlackChannelId(upload.channel_id));
            complete_request.initial_comment = Some(upload.comment);
            bounded(
                self.request_timeout,
                session.files_complete_upload_external(&complete_request),
            )
            .await
            .map_err(|err| AppError::Upload(format!("failed to complete upload: {err}")))?;

            Ok(())
        })
    }
}

fn token(value: &str, token_type: SlackApiTokenType) -> SlackApiToken {
    SlackApiToken {
        token_value: SlackApiTokenValue(value.to_owned()),
        cookie: None,
        team_id: None,
        scope: None,
        token_type: Some(token_type),
    }
}

/// Await a Slack API call with a deadline, flattening both failure modes
/// into a message.
async fn bounded<T, E, F>(limit: Duration, call: F) -> std::result::Result<T, String>
where
    E: Display,
    F: Future<Output = std::result::Result<T, E>>,
{
    match timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
    }
}
