//! Retry with exponential backoff for vendor requests.

use livevlm_types::GatewayError;
use rand::Rng;

/// How transient vendor failures are retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = no retries).
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

/// Rate limits, server errors, transport failures and timeouts are transient.
/// Everything else (bad key, bad request, unknown model) is not.
pub fn is_retryable(error: &GatewayError) -> bool {
    match error {
        GatewayError::Timeout { .. } => true,
        GatewayError::Upstream { status, .. } => {
            matches!(status, None | Some(429) | Some(500..=599))
        }
        GatewayError::UnsupportedModel { .. } | GatewayError::MissingCredential { .. } => false,
    }
}

/// Delay before retry number `attempt` (zero-based).
///
/// A server-provided `retry_after_ms` wins, capped at `max_delay_ms`.
/// Otherwise `initial_delay_ms * backoff_factor^attempt` with ±25% jitter.
pub fn calculate_delay(config: &RetryConfig, attempt: u32, retry_after_ms: Option<u64>) -> u64 {
    if let Some(server_delay) = retry_after_ms {
        return server_delay.min(config.max_delay_ms);
    }

    let base = config.initial_delay_ms as f64 * config.backoff_factor.powi(attempt as i32);
    let jitter = rand::rng().random_range(0.75..=1.25);
    ((base.min(config.max_delay_ms as f64) * jitter) as u64).min(config.max_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status: Option<u16>) -> GatewayError {
        GatewayError::Upstream {
            provider: "openai".into(),
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(is_retryable(&upstream(Some(429))));
        assert!(is_retryable(&upstream(Some(500))));
        assert!(is_retryable(&upstream(Some(503))));
        assert!(is_retryable(&upstream(None)));
        assert!(is_retryable(&GatewayError::Timeout {
            provider: "google".into()
        }));
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!is_retryable(&upstream(Some(400))));
        assert!(!is_retryable(&upstream(Some(401))));
        assert!(!is_retryable(&upstream(Some(404))));
        assert!(!is_retryable(&GatewayError::MissingCredential {
            provider: "anthropic".into()
        }));
        assert!(!is_retryable(&GatewayError::UnsupportedModel {
            model: "gpt-5".into()
        }));
    }

    #[test]
    fn delay_grows_exponentially() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
        };

        let delay0 = calculate_delay(&config, 0, None);
        assert!((750..=1250).contains(&delay0), "delay0={delay0}");

        let delay2 = calculate_delay(&config, 2, None);
        assert!((3000..=5000).contains(&delay2), "delay2={delay2}");
    }

    #[test]
    fn retry_after_wins_but_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(calculate_delay(&config, 0, Some(1500)), 1500);
        assert_eq!(calculate_delay(&config, 0, Some(120_000)), config.max_delay_ms);
    }

    #[test]
    fn delay_never_exceeds_max() {
        let config = RetryConfig {
            max_retries: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            backoff_factor: 10.0,
        };
        let delay = calculate_delay(&config, 5, None);
        assert!(delay <= config.max_delay_ms, "delay={delay}");
    }
}
