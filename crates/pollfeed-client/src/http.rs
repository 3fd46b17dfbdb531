//! HTTP transport for the query service.

use async_trait::async_trait;
use pollfeed_core::protocol::Envelope;
use pollfeed_core::{Action, LogStats, Message, MessageBatch, SendAck, SendRequest};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::{ClientError, FeedApi};

/// A client for one pollfeed server.
#[derive(Clone)]
pub struct HttpFeedClient {
    client: Client,
    endpoint: String,
}

impl HttpFeedClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn get(&self, action: Action, params: &[(&str, String)]) -> RequestBuilder {
        self.client
            .get(&self.endpoint)
            .query(&[("action", action.as_str())])
            .query(params)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let value: serde_json::Value = response.json().await.map_err(|e| {
            ClientError::Decode(format!("HTTP {} with non-JSON body: {}", status, e))
        })?;

        Envelope::<T>::from_value(value)
            .map_err(|e| ClientError::Decode(e.to_string()))?
            .into_result()
            .map_err(ClientError::Server)
    }
}

#[async_trait]
impl FeedApi for HttpFeedClient {
    async fn send(&self, author: Option<&str>, body: &str) -> Result<u64, ClientError> {
        let payload = SendRequest {
            author: author.map(str::to_string),
            body: body.to_string(),
        };
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("action", Action::Send.as_str())])
            .json(&payload);
        let ack: SendAck = self.call(request).await?;
        Ok(ack.id)
    }

    async fn fetch_since(&self, cursor: u64, limit: u32) -> Result<Vec<Message>, ClientError> {
        let request = self.get(
            Action::FetchSince,
            &[("cursor", cursor.to_string()), ("limit", limit.to_string())],
        );
        let batch: MessageBatch = self.call(request).await?;
        Ok(batch.messages)
    }

    async fn fetch_recent(&self, count: u32) -> Result<Vec<Message>, ClientError> {
        let request = self.get(Action::FetchRecent, &[("count", count.to_string())]);
        let batch: MessageBatch = self.call(request).await?;
        Ok(batch.messages)
    }

    async fn stats(&self) -> Result<LogStats, ClientError> {
        self.call(self.get(Action::Stats, &[])).await
    }
}
