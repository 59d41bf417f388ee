//! Advisory relay: forwards a free-text question to an OpenAI-compatible
//! chat-completion endpoint and hands back the reply unchanged.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AdvisorConfig;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful financial advisor. Keep answers simple and clear.";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("no advisor credential configured; set OPENAI_API_KEY")]
    MissingCredential,

    #[error("advisor request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("advisor network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("advisor rejected the credential ({status})")]
    Unauthorized { status: StatusCode },

    #[error("advisor quota or rate limit exceeded: {body}")]
    QuotaExceeded { body: String },

    #[error("advisor error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("could not decode advisor response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("advisor returned an empty response")]
    EmptyResponse,
}

/// Question in, answer out.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, AdvisorError>;
}

pub struct OpenAiAdvisor {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAiAdvisor {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(AdvisorError::MissingCredential)?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AdvisorError::Network)?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout: config.timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, e: reqwest::Error) -> AdvisorError {
        if e.is_timeout() {
            AdvisorError::Timeout(self.timeout)
        } else {
            AdvisorError::Network(e)
        }
    }
}

#[async_trait]
impl Advisor for OpenAiAdvisor {
    async fn ask(&self, question: &str) -> Result<String, AdvisorError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: question,
                },
            ],
        };

        debug!(model = %self.model, "sending advisor request");
        let resp = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "advisor request failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AdvisorError::Unauthorized { status }
                }
                StatusCode::TOO_MANY_REQUESTS => AdvisorError::QuotaExceeded { body },
                _ => AdvisorError::Api { status, body },
            });
        }

        let out: Resp = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                AdvisorError::Timeout(self.timeout)
            } else {
                AdvisorError::Decode(e)
            }
        })?;
        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(AdvisorError::EmptyResponse)?;

        debug!(chars = content.len(), "advisor replied");
        Ok(content)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::{Value, json};

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(base_url: &str, timeout: Duration) -> AdvisorConfig {
        AdvisorConfig {
            api_key: Some("sk-test".to_string()),
            model: "test-model".to_string(),
            base_url: base_url.to_string(),
            timeout,
        }
    }

    #[test]
    fn test_missing_credential() {
        let cfg = AdvisorConfig::default();
        assert!(matches!(
            OpenAiAdvisor::new(&cfg),
            Err(AdvisorError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_relays_answer_verbatim() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
                assert_eq!(body["messages"][1]["content"], "How do I budget?");
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": " Spend less than you earn. " } }]
                }))
            }),
        );
        let base = spawn_server(router).await;

        let advisor = OpenAiAdvisor::new(&config(&base, Duration::from_secs(5))).unwrap();
        let answer = advisor.ask("How do I budget?").await.unwrap();
        assert_eq!(answer, "Spend less than you earn.");
    }

    #[tokio::test]
    async fn test_unauthorized_is_distinct() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_server(router).await;

        let advisor = OpenAiAdvisor::new(&config(&base, Duration::from_secs(5))).unwrap();
        let err = advisor.ask("hi").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Unauthorized { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_quota_is_distinct() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "insufficient_quota") }),
        );
        let base = spawn_server(router).await;

        let advisor = OpenAiAdvisor::new(&config(&base, Duration::from_secs(5))).unwrap();
        match advisor.ask("hi").await.unwrap_err() {
            AdvisorError::QuotaExceeded { body } => assert_eq!(body, "insufficient_quota"),
            other => panic!("expected quota error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_server(router).await;

        let advisor = OpenAiAdvisor::new(&config(&base, Duration::from_secs(5))).unwrap();
        match advisor.ask("hi").await.unwrap_err() {
            AdvisorError::Api { status, body } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected api error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "choices": [] }))
            }),
        );
        let base = spawn_server(router).await;

        let advisor = OpenAiAdvisor::new(&config(&base, Duration::from_millis(200))).unwrap();
        let err = advisor.ask("hi").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let base = spawn_server(router).await;

        let advisor = OpenAiAdvisor::new(&config(&base, Duration::from_secs(5))).unwrap();
        let err = advisor.ask("hi").await.unwrap_err();
        assert!(matches!(err, AdvisorError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let advisor =
            OpenAiAdvisor::new(&config(&format!("http://{addr}"), Duration::from_secs(5))).unwrap();
        let err = advisor.ask("hi").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Network(_)), "{err}");
    }
}
