// ABOUTME: Twitch helix API client: client-credentials exchange and batched liveness query
// ABOUTME: Tokens are replaced wholesale on renewal; the poll path only ever reads them

use crate::traits::StreamingApi;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const STREAMS_URL: &str = "https://api.twitch.tv/helix/streams";

/// Failure categories for helix calls. Call sites decide what is fatal:
/// a failed startup exchange tears the process down, a failed poll is
/// logged and retried by the next tick.
#[derive(Debug, Error)]
pub enum TwitchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API rejected request with status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Bearer credential for the helix API, replaced wholesale on each renewal
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub obtained_at: DateTime<Utc>,
}

/// One currently-live broadcast reported by the streams query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub user_login: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    data: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    user_login: String,
    started_at: String,
}

#[derive(Clone)]
pub struct TwitchClient {
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl TwitchClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StreamingApi for TwitchClient {
    async fn obtain_token(&self) -> Result<AccessToken, TwitchError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::Status(response.status()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TwitchError::Malformed(e.to_string()))?;

        Ok(AccessToken {
            token: body.access_token,
            obtained_at: Utc::now(),
        })
    }

    async fn live_streams(
        &self,
        logins: &[String],
        token: &AccessToken,
    ) -> Result<Vec<LiveSession>, TwitchError> {
        // One batched query per cycle; helix takes repeated user_login params
        let query: Vec<(&str, &str)> = logins
            .iter()
            .map(|login| ("user_login", login.as_str()))
            .collect();

        let response = self
            .http
            .get(STREAMS_URL)
            .header("Client-Id", &self.client_id)
            .bearer_auth(&token.token)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::Status(response.status()));
        }

        let body: StreamsResponse = response
            .json()
            .await
            .map_err(|e| TwitchError::Malformed(e.to_string()))?;

        sessions_from_entries(body.data)
    }
}

fn sessions_from_entries(entries: Vec<StreamEntry>) -> Result<Vec<LiveSession>, TwitchError> {
    entries
        .into_iter()
        .map(|entry| {
            let started_at = DateTime::parse_from_rfc3339(&entry.started_at)
                .map_err(|e| {
                    TwitchError::Malformed(format!(
                        "bad started_at {:?} for {}: {}",
                        entry.started_at, entry.user_login, e
                    ))
                })?
                .with_timezone(&Utc);
            Ok(LiveSession {
                user_login: entry.user_login,
                started_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_parse_utc_timestamps() {
        let entries = vec![StreamEntry {
            user_login: "alice".to_string(),
            started_at: "2024-01-01T00:00:00Z".to_string(),
        }];
        let sessions = sessions_from_entries(entries).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].user_login, "alice");
        assert_eq!(sessions[0].started_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_sessions_normalize_offsets_to_utc() {
        let entries = vec![StreamEntry {
            user_login: "bob".to_string(),
            started_at: "2024-01-01T02:00:00+02:00".to_string(),
        }];
        let sessions = sessions_from_entries(entries).unwrap();
        assert_eq!(sessions[0].started_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_sessions_reject_bad_timestamp() {
        let entries = vec![StreamEntry {
            user_login: "carol".to_string(),
            started_at: "yesterday".to_string(),
        }];
        let err = sessions_from_entries(entries).unwrap_err();
        assert!(matches!(err, TwitchError::Malformed(_)));
        assert!(err.to_string().contains("carol"));
    }

    #[test]
    fn test_empty_response_yields_no_sessions() {
        let sessions = sessions_from_entries(Vec::new()).unwrap();
        assert!(sessions.is_empty());
    }
}
