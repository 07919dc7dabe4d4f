use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body posted to the publishing webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload {
    pub media_url: String,
    pub headline: String,
    pub sub_headline: String,
    pub category: String,
    pub timestamp: String,
}

impl DeliveryPayload {
    /// `caption` is the long social description; an empty one falls back to `sub_headline`.
    pub fn new(
        media_url: &str,
        headline: &str,
        caption: &str,
        sub_headline: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let sub = if caption.trim().is_empty() {
            sub_headline
        } else {
            caption
        };
        Self {
            media_url: media_url.to_string(),
            headline: headline.to_string(),
            sub_headline: sub.to_string(),
            category: category.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Ok only on a 2xx response.
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<()>;
}

/// Upper bound for `with_retries`.
pub const MAX_RETRIES: u8 = 5;
/// Backoff doubles from 500 ms and stops growing at 500 ms << 6 (32 s).
const MAX_BACKOFF_SHIFT: u32 = 6;

fn retry_backoff(attempt: u8) -> Duration {
    let shift = u32::from(attempt.saturating_sub(1)).min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(500u64 << shift)
}

#[derive(Clone)]
pub struct WebhookDeliverer {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl WebhookDeliverer {
    /// One attempt by default: a retry after an ambiguous failure could publish twice.
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.clamp(1, MAX_RETRIES);
        self
    }
}

#[async_trait]
impl Deliverer for WebhookDeliverer {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<()> {
        if self.webhook.is_empty() {
            return Err(anyhow!("delivery webhook url is not configured"));
        }

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => {
                        tracing::info!(status = rsp.status().as_u16(), "webhook accepted payload");
                        return Ok(());
                    }
                    Err(e) => anyhow!("webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("webhook request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::warn!(attempt, error = %err, "webhook attempt failed, retrying");
            tokio::time::sleep(retry_backoff(attempt)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_shape_and_caption_fallback() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let p = DeliveryPayload::new(
            "https://m/v.mp4",
            "KANE AGAIN",
            "",
            "Short sub",
            "SOCCER",
            now,
        );
        assert_eq!(p.sub_headline, "Short sub");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "mediaUrl": "https://m/v.mp4",
                "headline": "KANE AGAIN",
                "subHeadline": "Short sub",
                "category": "SOCCER",
                "timestamp": "2025-03-01T12:00:00.000Z"
            })
        );

        let p = DeliveryPayload::new("u", "h", "Long caption", "Short sub", "c", now);
        assert_eq!(p.sub_headline, "Long caption");
    }

    #[test]
    fn retries_are_clamped_and_backoff_is_bounded() {
        let d = WebhookDeliverer::new("u".into()).with_retries(200);
        assert_eq!(d.max_retries, MAX_RETRIES);
        assert_eq!(WebhookDeliverer::new("u".into()).with_retries(0).max_retries, 1);

        assert_eq!(retry_backoff(1), Duration::from_millis(500));
        assert_eq!(retry_backoff(3), Duration::from_millis(2000));
        assert_eq!(retry_backoff(u8::MAX), Duration::from_millis(500 << MAX_BACKOFF_SHIFT));
    }

    #[tokio::test]
    async fn empty_webhook_is_an_error() {
        let d = WebhookDeliverer::new(String::new());
        let p = DeliveryPayload::new("u", "h", "", "s", "c", Utc::now());
        assert!(d.deliver(&p).await.is_err());
    }
}
