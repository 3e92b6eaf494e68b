//! Firebase Cloud Messaging (HTTP v1) client.
//!
//! The service-account key signs an RS256 JWT that is exchanged for an OAuth2
//! access token; the token is cached until shortly before it expires. Each
//! device token gets its own `messages:send` request; at most
//! `MAX_IN_FLIGHT` of them run at once.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::lock::Mutex;
use futures::{Future, StreamExt, stream};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh the access token this long before Google says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Upper bound on concurrent `messages:send` requests per fan-out.
const MAX_IN_FLIGHT: usize = 32;

/// Runs `futs` with at most `MAX_IN_FLIGHT` pending at a time. Outputs keep
/// the input order so responses line up with tokens.
async fn bounded_all<I, F, T>(futs: I) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = T>,
{
    stream::iter(futs).buffered(MAX_IN_FLIGHT).collect().await
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid service account: {0}")]
    Credentials(String),

    #[error("failed to sign OAuth assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("failed to read service account file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid service account JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

struct Inner {
    http: reqwest::Client,
    client_email: String,
    token_uri: String,
    project_id: String,
    key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

/// A notification to deliver to a set of devices.
#[derive(Debug, Clone, Default)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    /// Android replaces an earlier notification carrying the same tag.
    pub tag: Option<String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: &str, value: impl ToString) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SendResponse {
    pub message_id: Option<String>,
    pub success: bool,
    pub exception: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PushReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResponse>,
}

/// Builds one FCM v1 request body. `notification_id` and `timestamp` are
/// shared by every message of a batch so clients can de-duplicate.
pub fn build_message(token: &str, msg: &PushMessage, notification_id: &str, timestamp: i64) -> Value {
    let mut data = msg.data.clone();
    data.insert("notification_id".into(), notification_id.to_string());
    data.insert("timestamp".into(), timestamp.to_string());
    data.insert("type".into(), "hrms_notification".into());

    let tag = msg
        .tag
        .clone()
        .unwrap_or_else(|| notification_id.chars().take(8).collect());

    json!({
        "message": {
            "token": token,
            "notification": {
                "title": msg.title,
                "body": msg.body,
            },
            "data": data,
            "android": {
                "priority": "HIGH",
                "notification": {
                    "sound": "default",
                    "notification_priority": "PRIORITY_HIGH",
                    "default_vibrate_timings": true,
                    "tag": tag,
                    "notification_count": 1,
                }
            }
        }
    })
}

/// Cloneable handle; disabled when no service account is configured.
#[derive(Clone, Default)]
pub struct FcmClient {
    inner: Option<Arc<Inner>>,
}

impl FcmClient {
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn from_config(config: &Config) -> Result<Self, PushError> {
        let Some(path) = &config.fcm_service_account_path else {
            tracing::warn!("FCM_SERVICE_ACCOUNT_PATH not set, push notifications disabled");
            return Ok(Self::disabled());
        };

        let raw = std::fs::read_to_string(path)?;
        let account: ServiceAccount = serde_json::from_str(&raw)?;
        Self::from_service_account(account, config.fcm_project_id.clone())
    }

    pub fn from_service_account(
        account: ServiceAccount,
        project_id: Option<String>,
    ) -> Result<Self, PushError> {
        let project_id = project_id
            .or(account.project_id.clone())
            .ok_or_else(|| PushError::Credentials("project_id missing".into()))?;
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        tracing::info!(project_id = %project_id, "FCM client configured");

        Ok(Self {
            inner: Some(Arc::new(Inner {
                http,
                client_email: account.client_email,
                token_uri: account.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.into()),
                project_id,
                key,
                token: Mutex::new(None),
            })),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    async fn access_token(inner: &Inner) -> Result<String, PushError> {
        let mut cached = inner.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &inner.client_email,
            scope: FCM_SCOPE,
            aud: &inner.token_uri,
            iat,
            exp: iat + 3600,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &inner.key)?;

        let resp: TokenResponse = inner
            .http
            .post(&inner.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let lifetime = Duration::from_secs(resp.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: resp.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        tracing::debug!(expires_in = resp.expires_in, "FCM access token refreshed");

        Ok(resp.access_token)
    }

    async fn send_one(inner: &Inner, access_token: &str, body: &Value) -> SendResponse {
        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            inner.project_id
        );

        let result = inner
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                let name = resp
                    .json::<Value>()
                    .await
                    .ok()
                    .and_then(|v| v.get("name").and_then(Value::as_str).map(str::to_string));
                SendResponse {
                    message_id: name,
                    success: true,
                    exception: None,
                }
            }
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                SendResponse {
                    message_id: None,
                    success: false,
                    exception: Some(format!("{status}: {detail}")),
                }
            }
            Err(e) => SendResponse {
                message_id: None,
                success: false,
                exception: Some(e.to_string()),
            },
        }
    }

    /// Sends `msg` to every token. Individual delivery failures are reported
    /// in the result; only credential problems are returned as errors.
    pub async fn send_each(&self, tokens: &[String], msg: &PushMessage) -> Result<PushReport, PushError> {
        let tokens: Vec<&str> = tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            tracing::debug!(title = %msg.title, "No device tokens, push skipped");
            return Ok(PushReport::default());
        }

        let Some(inner) = &self.inner else {
            tracing::info!(
                title = %msg.title,
                recipients = tokens.len(),
                "FCM disabled, push not sent"
            );
            return Ok(PushReport::default());
        };

        let access_token = Self::access_token(inner).await?;
        let notification_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp();

        let bodies: Vec<Value> = tokens
            .iter()
            .map(|t| build_message(t, msg, &notification_id, timestamp))
            .collect();
        let sends: Vec<_> = bodies
            .iter()
            .map(|body| Self::send_one(inner, &access_token, body))
            .collect();
        let responses = bounded_all(sends).await;

        let success_count = responses.iter().filter(|r| r.success).count();
        let report = PushReport {
            success_count,
            failure_count: responses.len() - success_count,
            responses,
        };

        if report.failure_count > 0 {
            tracing::warn!(
                title = %msg.title,
                success = report.success_count,
                failed = report.failure_count,
                "Some push notifications failed"
            );
        } else {
            tracing::info!(title = %msg.title, sent = report.success_count, "Push notifications sent");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_data_and_android_config() {
        let msg = PushMessage::new("Leave Approved", "Your leave was approved")
            .with_data("doctype", "Leave Application")
            .with_tag("leave-7");

        let body = build_message("tok-1", &msg, "0b3c9a4e-1111-2222-3333-444455556666", 1_760_000_000);
        let m = &body["message"];

        assert_eq!(m["token"], "tok-1");
        assert_eq!(m["notification"]["title"], "Leave Approved");
        assert_eq!(m["data"]["type"], "hrms_notification");
        assert_eq!(m["data"]["doctype"], "Leave Application");
        assert_eq!(m["data"]["timestamp"], "1760000000");
        assert_eq!(m["android"]["priority"], "HIGH");
        assert_eq!(m["android"]["notification"]["tag"], "leave-7");
    }

    #[test]
    fn tag_defaults_to_notification_id_prefix() {
        let msg = PushMessage::new("t", "b");
        let body = build_message("tok", &msg, "0b3c9a4e-1111", 0);
        assert_eq!(body["message"]["android"]["notification"]["tag"], "0b3c9a4e");
    }

    #[actix_web::test]
    async fn disabled_client_skips_sending() {
        let client = FcmClient::disabled();
        let report = client
            .send_each(&["tok".to_string()], &PushMessage::new("t", "b"))
            .await
            .unwrap();
        assert!(!client.is_enabled());
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failure_count, 0);
    }

    #[actix_web::test]
    async fn fan_out_is_bounded_and_ordered() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::task::Poll;

        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let futs = (0..100).map(|i| {
            let (in_flight, peak) = (&in_flight, &peak);
            let mut started = false;
            futures::future::poll_fn(move |cx| {
                if !started {
                    started = true;
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Poll::Ready(i)
            })
        });

        let out = bounded_all(futs).await;
        assert_eq!(out, (0..100).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= MAX_IN_FLIGHT);
        assert!(peak.load(Ordering::SeqCst) > 1);
    }

    #[actix_web::test]
    async fn empty_tokens_short_circuit() {
        let report = FcmClient::disabled()
            .send_each(&[" ".to_string()], &PushMessage::new("t", "b"))
            .await
            .unwrap();
        assert!(report.responses.is_empty());
    }
}
