//! Outbound client for the Anakin chatbot messages API.

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::models::anakin::{AnakinMessageRequest, AnakinReply};
use crate::session::StreamSession;
use crate::sse::raw_events;
use futures_util::StreamExt;
use std::sync::Arc;

/// Client for `POST {base}/v1/chatbots/{app_id}/messages`.
///
/// Holds the shared reqwest client plus the endpoint settings from the
/// relay config; the inbound bearer credential is forwarded verbatim per
/// call rather than stored here.
#[derive(Clone)]
pub struct AnakinClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl AnakinClient {
    pub fn new(http: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        }
    }

    fn message_request(
        &self,
        api_key: &str,
        app_id: u64,
        content: &str,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/chatbots/{}/messages", self.base_url, app_id);
        self.http
            .post(url)
            .header("X-Anakin-Api-Version", &self.api_version)
            .header(http::header::CONTENT_TYPE, "application/json")
            .bearer_auth(api_key)
            .json(&AnakinMessageRequest {
                content: content.to_string(),
                stream,
            })
    }

    /// Send one non-streaming message and return the reply content.
    pub async fn send_message(
        &self,
        api_key: &str,
        app_id: u64,
        content: &str,
    ) -> Result<String, RelayError> {
        let resp = self
            .message_request(api_key, app_id, content, false)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus { status, body });
        }

        let reply: AnakinReply = resp.json().await?;
        Ok(reply.content)
    }

    /// Open the streaming reply and feed it into `session`.
    ///
    /// Runs until the session reaches its terminal signal: send failure,
    /// non-success status, mid-stream read error, and clean end all funnel
    /// through the session's fire-once gate. There is no second completion
    /// path for the endpoint to race against.
    pub async fn relay_stream(
        &self,
        api_key: &str,
        app_id: u64,
        content: &str,
        session: Arc<StreamSession>,
    ) {
        let resp = match self
            .message_request(api_key, app_id, content, true)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                session.on_error(&RelayError::Transport(e));
                return;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            session.on_error(&RelayError::UpstreamStatus { status, body });
            return;
        }

        let events = raw_events(resp.bytes_stream());
        futures_util::pin_mut!(events);
        while let Some(item) = events.next().await {
            if session.is_closed() {
                // Client disconnected; dropping the stream cancels the fetch.
                tracing::debug!(session = session.id(), "client gone, abandoning upstream");
                break;
            }
            match item {
                Ok(payload) => session.on_event(&payload),
                Err(e) => {
                    session.on_error(&e);
                    return;
                }
            }
        }
        session.on_complete();
    }
}
