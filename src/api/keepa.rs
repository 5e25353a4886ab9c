use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::retry::RetryConfig;
use crate::error::{KeepaError, Result};

/// Characters of a response body kept in debug logs
const LOG_EXCERPT_LEN: usize = 2000;

/// Client for the Keepa REST API
pub struct KeepaClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl KeepaClient {
    /// Create a new Keepa client
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    /// GET `<base>/<endpoint>?key=..&<query>` with the bounded retry loop.
    ///
    /// Transport errors and 5xx wait `backoff`, 429 waits for the refill
    /// hint, other statuses fail at once. A successful response that leaves
    /// the token bucket low is held back before being returned.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut url = format!(
            "{}/{}?key={}",
            self.base_url,
            endpoint,
            urlencoding::encode(&self.api_key)
        );
        for (name, value) in query {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, "GET {}/{} {:?}", self.base_url, endpoint, query);

            match self.send_once(&url).await {
                Ok(body) => {
                    let tokens_left = body.get("tokensLeft").and_then(Value::as_i64);
                    if let Some(delay) = self.retry.token_delay(tokens_left) {
                        warn!(
                            "Low Keepa tokens ({}), sleeping {}s",
                            tokens_left.unwrap_or_default(),
                            delay.as_secs()
                        );
                        sleep(delay).await;
                    }
                    return Ok(serde_json::from_value(body)?);
                }
                Err(Attempt::RateLimited { refill_in }) => {
                    let delay = self.retry.rate_limit_delay(refill_in);
                    warn!(
                        "Keepa rate limit hit on {} (attempt {}/{}), sleeping {}ms",
                        endpoint,
                        attempt,
                        max_attempts,
                        delay.as_millis()
                    );
                    last_error = Some(KeepaError::RateLimited { attempts: attempt });
                    if attempt < max_attempts {
                        sleep(delay).await;
                    }
                }
                Err(Attempt::Failed(e)) if e.is_transient() => {
                    warn!(
                        "Keepa {} failed (attempt {}/{}): {}",
                        endpoint, attempt, max_attempts, e
                    );
                    last_error = Some(e);
                    if attempt < max_attempts {
                        sleep(self.retry.backoff).await;
                    }
                }
                Err(Attempt::Failed(e)) => return Err(e),
            }
        }

        match last_error {
            Some(KeepaError::RateLimited { .. }) => Err(KeepaError::RateLimited {
                attempts: max_attempts,
            }),
            other => Err(KeepaError::MaxRetriesExceeded {
                attempts: max_attempts,
                last_error: other
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            }),
        }
    }

    async fn send_once(&self, url: &str) -> std::result::Result<Value, Attempt> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("Accept-Encoding", "identity")
            .send()
            .await
            .map_err(|e| Attempt::Failed(e.into()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Attempt::Failed(e.into()))?;
        debug!(status = status.as_u16(), "Keepa response: {}", excerpt(&text));

        if status == StatusCode::TOO_MANY_REQUESTS {
            let refill_in = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("refillIn").and_then(Value::as_i64));
            return Err(Attempt::RateLimited { refill_in });
        }

        if !status.is_success() {
            return Err(Attempt::Failed(KeepaError::Status {
                status: status.as_u16(),
                body: excerpt(&text).to_string(),
            }));
        }

        serde_json::from_str(&text).map_err(|e| Attempt::Failed(e.into()))
    }
}

/// Outcome of a single failed round trip
enum Attempt {
    RateLimited { refill_in: Option<i64> },
    Failed(KeepaError),
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(LOG_EXCERPT_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(LOG_EXCERPT_LEN + 10);
        assert_eq!(excerpt(&long).chars().count(), LOG_EXCERPT_LEN);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_new_trims_base_url() {
        let client = KeepaClient::new(
            "http://127.0.0.1:1/",
            "key",
            Duration::from_secs(1),
            RetryConfig::default(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:1");
    }
}
