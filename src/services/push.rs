use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of messages per Expo push request
pub const MAX_BATCH_SIZE: usize = 100;

/// Errors that can occur when sending push notifications
#[derive(Debug, Error)]
pub enum PushError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Push service returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// A single push message addressed to one device token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl PushMessage {
    pub fn new(to: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            data: None,
            sound: Some("default".to_string()),
        }
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushStatus {
    Ok,
    Error,
}

/// Per-message acceptance result from the push provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTicket {
    pub status: PushStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PushTicket {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: PushStatus::Error,
            id: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PushStatus::Ok
    }
}

/// Port for push delivery
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send messages, returning one ticket per message in the same order
    async fn send(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError>;
}

/// Expo push API client
pub struct ExpoPushClient {
    endpoint: String,
    access_token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    #[serde(default)]
    data: Vec<ExpoTicket>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: PushStatus,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

impl From<ExpoTicket> for PushTicket {
    fn from(ticket: ExpoTicket) -> Self {
        let message = match (ticket.message, ticket.details) {
            (Some(message), Some(details)) => Some(format!("{} ({})", message, details)),
            (message, _) => message,
        };

        Self {
            status: ticket.status,
            id: ticket.id,
            message,
        }
    }
}

impl ExpoPushClient {
    pub fn new(endpoint: String, access_token: Option<String>, timeout: Duration) -> Result<Self, PushError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            access_token,
            client,
        })
    }

    async fn send_batch(&self, batch: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(batch);

        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Push request failed: {} - {}", status, body);
            return Err(PushError::ApiError(format!("Push request failed: {}", status)));
        }

        let parsed: ExpoResponse = response
            .json()
            .await
            .map_err(|e| PushError::InvalidResponse(e.to_string()))?;

        if !parsed.errors.is_empty() {
            return Err(PushError::ApiError(format!("{:?}", parsed.errors)));
        }
        if parsed.data.len() != batch.len() {
            return Err(PushError::InvalidResponse(format!(
                "Expected {} tickets, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(PushTicket::from).collect())
    }
}

#[async_trait]
impl PushSender for ExpoPushClient {
    async fn send(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
        let mut tickets = Vec::with_capacity(messages.len());

        for batch in messages.chunks(MAX_BATCH_SIZE) {
            tickets.extend(self.send_batch(batch).await?);
        }

        let failed = tickets.iter().filter(|t| !t.is_ok()).count();
        tracing::debug!("Sent {} push messages ({} rejected)", tickets.len(), failed);

        Ok(tickets)
    }
}

/// Push sender used when delivery is switched off in configuration
#[derive(Debug, Clone, Default)]
pub struct DisabledPushSender;

#[async_trait]
impl PushSender for DisabledPushSender {
    async fn send(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
        Ok(messages
            .iter()
            .map(|_| PushTicket::failed("push delivery disabled"))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(url: String) -> ExpoPushClient {
        ExpoPushClient::new(
            format!("{}/--/api/v2/push/send", url),
            Some("expo-token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_maps_tickets() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/--/api/v2/push/send")
            .match_header("authorization", "Bearer expo-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": [
                        { "status": "ok", "id": "ticket-1" },
                        {
                            "status": "error",
                            "message": "not a registered push token",
                            "details": { "error": "DeviceNotRegistered" }
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let messages = vec![
            PushMessage::new("ExponentPushToken[a]", "Hi", "First"),
            PushMessage::new("ExponentPushToken[b]", "Hi", "Second"),
        ];
        let tickets = client(server.url()).send(&messages).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tickets.len(), 2);
        assert!(tickets[0].is_ok());
        assert_eq!(tickets[0].id.as_deref(), Some("ticket-1"));
        assert!(!tickets[1].is_ok());
        assert!(tickets[1].message.as_deref().unwrap().contains("DeviceNotRegistered"));
    }

    #[tokio::test]
    async fn test_send_chunks_large_batches() {
        let mut server = mockito::Server::new_async().await;
        let ok_tickets: Vec<Value> = (0..MAX_BATCH_SIZE).map(|_| json!({ "status": "ok" })).collect();
        let mock = server
            .mock("POST", "/--/api/v2/push/send")
            .with_status(200)
            .with_body(json!({ "data": ok_tickets }).to_string())
            .expect(2)
            .create_async()
            .await;

        let messages: Vec<PushMessage> = (0..MAX_BATCH_SIZE * 2)
            .map(|i| PushMessage::new(format!("ExponentPushToken[{}]", i), "Hi", "Body"))
            .collect();
        let tickets = client(server.url()).send(&messages).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tickets.len(), MAX_BATCH_SIZE * 2);
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/--/api/v2/push/send")
            .with_status(500)
            .create_async()
            .await;

        let messages = vec![PushMessage::new("ExponentPushToken[a]", "Hi", "Body")];
        let err = client(server.url()).send(&messages).await.unwrap_err();
        assert!(matches!(err, PushError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_disabled_sender_rejects_every_message() {
        let messages = vec![
            PushMessage::new("a", "t", "b"),
            PushMessage::new("b", "t", "b"),
        ];
        let tickets = DisabledPushSender.send(&messages).await.unwrap();

        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| !t.is_ok()));
    }
}
