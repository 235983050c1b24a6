//! Bounded exponential backoff around HTTP sends
//!
//! Only rate limiting (429) and temporary unavailability (503) are retried;
//! every other non-success status fails the request immediately.

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        )
    }

    /// Delay before retry number `retry` (0-based).
    ///
    /// A `Retry-After` header wins when it parses (delta-seconds or HTTP
    /// date); the result is always capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, retry_after: Option<&str>) -> Duration {
        let delay = retry_after
            .and_then(|value| parse_retry_after(value, Utc::now()))
            .unwrap_or_else(|| {
                let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            });
        delay.min(self.max_delay)
    }
}

/// Parse a `Retry-After` value relative to `now`
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Pull `error.message` (or a top-level `message`) out of a JSON error body
pub fn extract_error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.pointer("/error/message")
        .or_else(|| json.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// Turn a failed response into a typed error, reading its body best-effort
pub async fn error_from_response(response: Response) -> SyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(|r| format!("{} - could not access the file", r))
            .unwrap_or_else(|| "could not access the file".to_string())
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        _ => SyncError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

/// Run `send` until it succeeds, fails fatally, or the attempts run out
pub async fn send_with_retry<F, Fut>(policy: &RetryPolicy, mut send: F) -> SyncResult<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        let response = send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if RetryPolicy::is_retryable(status) && attempt < policy.max_attempts {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let delay = policy.delay_for(attempt - 1, retry_after.as_deref());
            warn!(
                status = status.as_u16(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "transient HTTP failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        }

        return Err(error_from_response(response).await);
    }
}
