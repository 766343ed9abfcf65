//! HTTP gateway to the chat service

use super::{ReplyBody, StartReply, TransportError, TurnReply, TurnRequest};
use crate::config::ClientConfig;
use crate::runtime::TransportGateway;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use std::time::Duration;

/// `reqwest`-backed gateway for the `/api/start` and `/api/message` endpoints
pub struct HttpGateway {
    client: Client,
    start_url: Url,
    message_url: Url,
}

impl HttpGateway {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built or the endpoints cannot be
    /// joined onto `base_url`.
    pub fn new(base_url: &Url, request_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            start_url: endpoint(base_url, "api/start")?,
            message_url: endpoint(base_url, "api/message")?,
        })
    }

    /// # Errors
    ///
    /// See [`HttpGateway::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.base_url, config.request_timeout)
    }

    #[must_use]
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    #[must_use]
    pub fn message_url(&self) -> &Url {
        &self.message_url
    }

    /// Decode the JSON body whatever the status code. The service reports
    /// application errors (including 503 while it initialises) in the body.
    async fn read_body(response: Response) -> Result<ReplyBody, TransportError> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %response.url(), "Non-success status from chat service");
        }
        response
            .json::<ReplyBody>()
            .await
            .map_err(|e| TransportError::decode(format!("invalid reply body ({status}): {e}")))
    }
}

#[async_trait]
impl TransportGateway for HttpGateway {
    async fn start(&self) -> Result<StartReply, TransportError> {
        let response = self
            .client
            .post(self.start_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        Self::read_body(response).await?.into_start_reply()
    }

    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, TransportError> {
        let response = self
            .client
            .post(self.message_url.clone())
            .json(request)
            .send()
            .await?;

        Self::read_body(response).await?.into_turn_reply()
    }
}

/// Resolve `path` under `base`, keeping any path prefix the base already has
fn endpoint(base: &Url, path: &str) -> Result<Url, TransportError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| TransportError::invalid_url(format!("cannot build {path} endpoint: {e}")))
}
