use std::time::Duration;
use tokio::time::timeout;

use crate::config::Config;

/// Phrases shown by the bot-check interstitial instead of the catalog.
const CHALLENGE_MARKERS: [&str; 2] = ["Just a moment", "Трохи зачекайте"];

/// HTTP client for catalog pages
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout_duration: Duration,
    user_agent: String,
    max_content_size: usize,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(user_agent: String, timeout_secs: u64) -> Result<Self, FetchError> {
        Self::with_content_limit(user_agent, timeout_secs, Config::MAX_CONTENT_SIZE)
    }

    pub fn with_content_limit(
        user_agent: String,
        timeout_secs: u64,
        max_content_size: usize,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .http1_only()
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .gzip(true)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            timeout_duration: Duration::from_secs(timeout_secs),
            user_agent,
            max_content_size,
            max_retries: Config::MAX_RETRIES,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch a catalog page, retrying transient failures with linear backoff.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff_ms = Config::RETRY_BACKOFF_MS * attempt as u64;
                tracing::debug!(url, attempt, backoff_ms, "retrying fetch");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }

            match self.fetch_once(url).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    tracing::debug!(url, error = %e, "transient fetch error");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::NetworkError("Max retries exceeded".to_string())))
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchResult, FetchError> {
        let response = timeout(
            self.timeout_duration,
            self.client
                .get(url)
                .header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header("Accept-Language", "uk-UA,uk;q=0.9,en-US;q=0.8,en;q=0.7")
                .header("Connection", "keep-alive")
                .header("Upgrade-Insecure-Requests", "1")
                .send(),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(Self::classify_error)?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(status_code));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > self.max_content_size {
                return Err(FetchError::ContentTooLarge(length, self.max_content_size));
            }
        }

        let content = timeout(self.timeout_duration, response.text())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::BodyError(e.to_string()))?;

        if content.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(content.len(), self.max_content_size));
        }

        if is_challenge_page(&content) {
            return Err(FetchError::Challenge);
        }

        Ok(FetchResult {
            content,
            status_code,
            content_type,
        })
    }

    fn classify_error(error: reqwest::Error) -> FetchError {
        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("connection refused") {
            return FetchError::ConnectionRefused;
        }
        if error_msg.contains("dns") || error_msg.contains("name resolution") {
            return FetchError::DnsError;
        }
        if error_msg.contains("ssl") || error_msg.contains("tls") || error_msg.contains("certificate") {
            return FetchError::SslError;
        }
        if error.is_timeout() {
            return FetchError::Timeout;
        }
        FetchError::NetworkError(error.to_string())
    }
}

/// Whether a body is the anti-bot interstitial rather than a catalog page.
pub fn is_challenge_page(content: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| content.contains(marker))
}

/// Result of a successful HTTP fetch
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub content: String,
    pub status_code: u16,
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection refused - server not accepting connections")]
    ConnectionRefused,

    #[error("DNS resolution failed")]
    DnsError,

    #[error("SSL/TLS error - certificate or encryption issue")]
    SslError,

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Failed to read response body: {0}")]
    BodyError(String),

    #[error("Content too large: {0} bytes (max: {1} bytes)")]
    ContentTooLarge(usize, usize),

    #[error("Anti-bot challenge page served instead of the catalog")]
    Challenge,
}

impl FetchError {
    /// Check if this error is retryable (transient) or permanent
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::NetworkError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("broken pipe")
                    || msg_lower.contains("connection reset")
                    || msg_lower.contains("temporary")
            }
            FetchError::HttpStatus(code) => *code == 429 || *code >= 500,
            FetchError::ClientBuild(_) => false,
            FetchError::ConnectionRefused => false,
            FetchError::DnsError => false,
            FetchError::SslError => false,
            FetchError::BodyError(_) => false,
            FetchError::ContentTooLarge(_, _) => false,
            // Retrying right away only gets the same interstitial.
            FetchError::Challenge => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let client = HttpClient::new("TestBot/1.0".to_string(), 5).unwrap();
        let result = client.fetch("not-a-url").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClient::new("TestBot/1.0".to_string(), 30).unwrap();
        assert_eq!(client.user_agent(), "TestBot/1.0");
        assert_eq!(client.max_content_size, Config::MAX_CONTENT_SIZE);
    }

    #[test]
    fn test_challenge_detection() {
        assert!(is_challenge_page("<title>Just a moment...</title>"));
        assert!(is_challenge_page("<h1>Трохи зачекайте</h1>"));
        assert!(!is_challenge_page("<div data-testid=\"productItem\"></div>"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::HttpStatus(503).is_retryable());
        assert!(FetchError::HttpStatus(429).is_retryable());
        assert!(!FetchError::HttpStatus(404).is_retryable());
        assert!(!FetchError::Challenge.is_retryable());
        assert!(FetchError::NetworkError("connection reset by peer".to_string()).is_retryable());
    }
}
