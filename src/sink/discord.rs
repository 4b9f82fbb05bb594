// src/sink/discord.rs
//
// Minimal Discord REST v10 adapter: edit the status message, post notices,
// and confirm the bot token is usable.

use super::{DisplayHandle, DisplaySink, DisplayTarget, NoticeSink, SendOutcome, SinkError};
use crate::gateway::Notice;
use crate::renderer::DisplayPayload;
use crate::status::EndpointState;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const GREEN: u32 = 0x2ecc71;
const ORANGE: u32 = 0xe67e22;
// Discord rejects embeds with more than 25 fields
const MAX_FIELDS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub username: String,
}

#[derive(Clone)]
pub struct DiscordSink {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for DiscordSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSink")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DiscordSink {
    pub fn new(token: impl Into<String>) -> Result<Self, SinkError> {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("uptime-pinger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Establishes the session by resolving the bot user behind the token.
    pub async fn connect(&self) -> Result<SessionInfo, SinkError> {
        let response = self
            .authorized(self.client.get(self.url("/users/@me")))
            .send()
            .await?;
        let response = expect_success(response).await?;
        response
            .json::<SessionInfo>()
            .await
            .map_err(|e| SinkError::Payload(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn message_url(&self, channel_id: u64, message_id: u64) -> String {
        self.url(&format!("/channels/{}/messages/{}", channel_id, message_id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bot {}", self.token))
    }
}

async fn expect_success(response: Response) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Status {
        code: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DisplaySink for DiscordSink {
    async fn locate(&self, target: &DisplayTarget) -> Result<Option<DisplayHandle>, SinkError> {
        let url = self.message_url(target.channel_id, target.message_id);
        let response = self.authorized(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        expect_success(response).await?;

        Ok(Some(DisplayHandle {
            channel_id: target.channel_id,
            message_id: target.message_id,
        }))
    }

    async fn update(
        &self,
        handle: &DisplayHandle,
        payload: &DisplayPayload,
    ) -> Result<(), SinkError> {
        let url = self.message_url(handle.channel_id, handle.message_id);
        let body = json!({ "embeds": [display_embed(payload)] });

        let response = self.authorized(self.client.patch(url)).json(&body).send().await?;
        expect_success(response).await?;
        debug!(channel = handle.channel_id, message = handle.message_id, "Edited status message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[async_trait]
impl NoticeSink for DiscordSink {
    async fn send(&self, destination: u64, notice: &Notice) -> Result<SendOutcome, SinkError> {
        let url = self.url(&format!("/channels/{}/messages", destination));
        let body = json!({ "embeds": [notice_embed(notice)] });

        let response = self.authorized(self.client.post(url)).json(&body).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(SendOutcome::UnknownDestination);
        }
        expect_success(response).await?;
        Ok(SendOutcome::Sent)
    }
}

pub(crate) fn display_embed(payload: &DisplayPayload) -> Value {
    let zone = payload.zone_label();
    let mut fields = vec![
        json!({ "name": format!("Start Time ({})", zone), "value": payload.started_label(), "inline": true }),
        json!({ "name": "Uptime", "value": payload.uptime.to_string(), "inline": true }),
        json!({ "name": format!("Last Update ({})", zone), "value": payload.updated_label(), "inline": false }),
    ];

    fields.extend(
        payload
            .endpoints
            .iter()
            .take(MAX_FIELDS - fields.len())
            .map(|(name, state)| {
                json!({ "name": name, "value": state_label(*state), "inline": true })
            }),
    );

    let color = if payload.all_online() { GREEN } else { ORANGE };
    json!({
        "title": format!("\u{1F7E2} **{}**", payload.title),
        "color": color,
        "fields": fields,
    })
}

fn notice_embed(notice: &Notice) -> Value {
    json!({
        "title": notice.title,
        "description": notice.description,
        "color": notice.color,
        "footer": { "text": notice.footer },
    })
}

fn state_label(state: EndpointState) -> &'static str {
    match state {
        EndpointState::Unknown => "\u{26AA} unknown",
        EndpointState::Checking => "\u{1F7E1} checking",
        EndpointState::Online => "\u{1F7E2} online",
        EndpointState::Offline => "\u{1F534} offline",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uptime::Uptime;
    use chrono::{FixedOffset, TimeZone};
    use mockito::Matcher;

    fn payload(endpoints: usize) -> DisplayPayload {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        DisplayPayload {
            title: "UPTIME MONITOR".to_string(),
            started_at: Some(ist.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap()),
            uptime: Uptime::from_duration(Duration::from_secs(61)),
            updated_at: ist.with_ymd_and_hms(2024, 5, 1, 6, 1, 1).unwrap(),
            endpoints: (0..endpoints)
                .map(|i| (format!("svc-{}", i), EndpointState::Online))
                .collect(),
        }
    }

    const TARGET: DisplayTarget = DisplayTarget {
        channel_id: 42,
        message_id: 7,
    };

    #[tokio::test]
    async fn test_connect_returns_bot_user() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/users/@me")
            .match_header("authorization", "Bot tok")
            .with_status(200)
            .with_body(r#"{"id":"1","username":"pinger","discriminator":"0"}"#)
            .create_async()
            .await;

        let sink = DiscordSink::with_base_url("tok", server.url()).unwrap();
        let info = sink.connect().await.unwrap();

        m.assert_async().await;
        assert_eq!(info.username, "pinger");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_token() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/users/@me")
            .with_status(401)
            .with_body(r#"{"message":"401: Unauthorized"}"#)
            .create_async()
            .await;

        let sink = DiscordSink::with_base_url("bad", server.url()).unwrap();
        assert!(matches!(
            sink.connect().await,
            Err(SinkError::Status { code: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_locate_missing_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/channels/42/messages/7")
            .with_status(404)
            .with_body(r#"{"message":"Unknown Message","code":10008}"#)
            .create_async()
            .await;

        let sink = DiscordSink::with_base_url("tok", server.url()).unwrap();
        assert_eq!(sink.locate(&TARGET).await, Ok(None));
    }

    #[tokio::test]
    async fn test_locate_and_update() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/channels/42/messages/7")
            .with_status(200)
            .with_body(r#"{"id":"7"}"#)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/channels/42/messages/7")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""name":"Start Time \(UTC\+05:30\)""#.to_string()),
                Matcher::Regex(r#""value":"06:00:00 AM""#.to_string()),
                Matcher::Regex(r#""value":"00:00:01:01""#.to_string()),
            ]))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let sink = DiscordSink::with_base_url("tok", server.url()).unwrap();
        let handle = sink.locate(&TARGET).await.unwrap().unwrap();
        sink.update(&handle, &payload(2)).await.unwrap();

        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_failure_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("PATCH", "/channels/42/messages/7")
            .with_status(400)
            .with_body(r#"{"message":"Invalid Form Body"}"#)
            .create_async()
            .await;

        let sink = DiscordSink::with_base_url("tok", server.url()).unwrap();
        let handle = DisplayHandle {
            channel_id: 42,
            message_id: 7,
        };
        let err = sink.update(&handle, &payload(1)).await.unwrap_err();
        assert!(matches!(err, SinkError::Status { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_send_notice_unknown_channel() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/channels/99/messages")
            .with_status(404)
            .create_async()
            .await;

        let sink = DiscordSink::with_base_url("tok", server.url()).unwrap();
        let outcome = sink.send(99, &Notice::sample()).await.unwrap();
        assert_eq!(outcome, SendOutcome::UnknownDestination);
    }

    #[test]
    fn test_embed_field_limit() {
        let embed = display_embed(&payload(40));
        assert_eq!(embed["fields"].as_array().unwrap().len(), MAX_FIELDS);
        assert_eq!(embed["color"], GREEN);
    }
}
