//! Retry and throttling policy for Keepa requests.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per request, 429s included
    pub max_attempts: u32,
    /// Fixed wait after a transport error or 5xx
    pub backoff: Duration,
    /// Wait after a 429 when Keepa sends no `refillIn` hint.
    /// Also the floor of the low-token pause.
    pub rate_limit_backoff: Duration,
    /// Pause after any response reporting fewer tokens than this
    pub min_tokens: i64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            rate_limit_backoff: Duration::from_secs(5),
            min_tokens: 100,
        }
    }
}

impl RetryConfig {
    /// Wait after a 429, preferring the server's refill hint (milliseconds)
    pub fn rate_limit_delay(&self, refill_in_ms: Option<i64>) -> Duration {
        match refill_in_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms as u64),
            _ => self.rate_limit_backoff,
        }
    }

    /// Pause before using a response that left the token bucket low.
    ///
    /// One second per five missing tokens, never less than the rate-limit
    /// backoff.
    pub fn token_delay(&self, tokens_left: Option<i64>) -> Option<Duration> {
        let left = tokens_left?;
        if left >= self.min_tokens {
            return None;
        }
        let secs = ((self.min_tokens - left) / 5).max(0) as u64;
        Some(Duration::from_secs(secs).max(self.rate_limit_backoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff, Duration::from_secs(2));
        assert_eq!(config.rate_limit_backoff, Duration::from_secs(5));
        assert_eq!(config.min_tokens, 100);
    }

    #[test]
    fn test_rate_limit_delay_prefers_hint() {
        let config = RetryConfig::default();
        assert_eq!(config.rate_limit_delay(Some(1500)), Duration::from_millis(1500));
        assert_eq!(config.rate_limit_delay(Some(0)), Duration::from_secs(5));
        assert_eq!(config.rate_limit_delay(None), Duration::from_secs(5));
    }

    #[test]
    fn test_token_delay() {
        let config = RetryConfig::default();
        assert_eq!(config.token_delay(Some(500)), None);
        assert_eq!(config.token_delay(Some(100)), None);
        assert_eq!(config.token_delay(None), None);
        // (100 - 90) / 5 = 2s, floored to 5s
        assert_eq!(config.token_delay(Some(90)), Some(Duration::from_secs(5)));
        // (100 - -50) / 5 = 30s
        assert_eq!(config.token_delay(Some(-50)), Some(Duration::from_secs(30)));
    }
}
