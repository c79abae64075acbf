// src/utils/http.rs

//! HTTP client utilities.
//!
//! Every component that needs the network goes through the [`Fetcher`]
//! trait, so discovery and extraction can be driven by an in-memory fake in
//! tests. [`HttpClient`] is the production implementation: one per job, with
//! that job's timeout, user agent and retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, header};

use crate::error::{AppError, Result};
use crate::models::HttpOptions;

/// Statuses worth another attempt.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after redirects
    pub final_url: String,
    pub body: String,
}

/// Source of page bodies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a URL. Non-success statuses are errors.
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// Retrying HTTP client built on reqwest.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retries: u32,
    backoff_factor: f64,
}

impl HttpClient {
    /// Create a client configured from job options.
    pub fn new(options: &HttpOptions) -> Result<Self> {
        options.validate()?;

        let mut headers = header::HeaderMap::new();
        if let Some(accept) = options.accept.as_deref() {
            let value = header::HeaderValue::from_str(accept)
                .map_err(|e| AppError::config(format!("invalid accept header '{accept}': {e}")))?;
            headers.insert(header::ACCEPT, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(options.user_agent())
            .timeout(Duration::from_secs(options.timeout_secs()))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            retries: options.retries,
            backoff_factor: options.backoff_factor,
        })
    }

    async fn execute(&self, method: Method, url: &str) -> Result<FetchResponse> {
        let max_retries = if is_idempotent(&method) {
            self.retries
        } else {
            0
        };
        let mut attempt = 0;

        loop {
            match self.client.request(method.clone(), url).send().await {
                Ok(response) if response.status().is_success() => {
                    let status = response.status().as_u16();
                    let final_url = response.url().to_string();
                    match response.text().await {
                        Ok(body) => {
                            return Ok(FetchResponse {
                                status,
                                final_url,
                                body,
                            });
                        }
                        Err(e) => {
                            if !is_retryable_body_error(&e) || attempt >= max_retries {
                                return Err(AppError::Http(e));
                            }
                            log::debug!("{url} body read failed: {e}, retrying ({})", attempt + 1);
                        }
                    }
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) || attempt >= max_retries {
                        return Err(AppError::status(url, status.as_u16()));
                    }
                    log::debug!("{url} answered {status}, retrying ({})", attempt + 1);
                }
                Err(e) => {
                    if !is_retryable_error(&e) || attempt >= max_retries {
                        return Err(AppError::Http(e));
                    }
                    log::debug!("{url} failed: {e}, retrying ({})", attempt + 1);
                }
            }

            let delay = retry_delay(self.backoff_factor, attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.execute(Method::GET, url).await
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

/// A body cut off mid-transfer surfaces as a decode error.
fn is_retryable_body_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_body() || error.is_decode()
}

/// Delay before retry number `attempt` (0-based): `backoff * 2^attempt` seconds.
pub fn retry_delay(backoff_factor: f64, attempt: u32) -> Duration {
    let secs = backoff_factor * 2f64.powi(attempt.min(16) as i32);
    Duration::from_secs_f64(secs.max(0.0))
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_options(retries: u32) -> HttpOptions {
        HttpOptions {
            timeout: Some(5),
            retries,
            backoff_factor: 0.0,
            ..HttpOptions::default()
        }
    }

    #[test]
    fn test_retry_delay_doubles() {
        assert_eq!(retry_delay(0.5, 0), Duration::from_millis(500));
        assert_eq!(retry_delay(0.5, 1), Duration::from_secs(1));
        assert_eq!(retry_delay(0.5, 2), Duration::from_secs(2));
        assert!(retry_delay(0.0, 3).is_zero());
    }

    #[test]
    fn test_only_idempotent_methods_retry() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::HEAD));
        assert!(!is_idempotent(&Method::POST));
    }

    #[test]
    fn test_retryable_statuses() {
        for code in [429, 500, 502, 503, 504] {
            assert!(is_retryable_status(StatusCode::from_u16(code).unwrap()));
        }
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_get_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&fast_options(2)).unwrap();
        let response = client
            .get(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_get_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpClient::new(&fast_options(1)).unwrap();
        let err = client
            .get(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_truncated_body_is_retried() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let replies = [
                "HTTP/1.1 200 OK\r\ncontent-length: 100\r\nconnection: close\r\n\r\npartial",
                "HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nfull",
            ];
            for reply in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        let client = HttpClient::new(&fast_options(1)).unwrap();
        let response = client.get(&format!("http://{addr}/article")).await.unwrap();
        assert_eq!(response.body, "full");
    }

    #[tokio::test]
    async fn test_get_does_not_retry_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&fast_options(3)).unwrap();
        let err = client
            .get(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Status { status: 404, .. }));
    }
}
