use std::time::{Duration, Instant};

use async_trait::async_trait;
use crux_http::protocol::{HttpHeader, HttpRequest, HttpResponse, HttpResult};
use crux_http::Error as HttpError;
use shared::capabilities::http::{MAX_RESPONSE_BODY_SIZE, REQUEST_ID_HEADER};
use tracing::{debug, instrument, warn};

/// Executes the core's HTTP requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> HttpResult;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
    max_response_bytes: usize,
}

impl ReqwestTransport {
    /// Every request gets `timeout`, connect and transfer included.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("civictrack-admin/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            timeout,
            max_response_bytes: MAX_RESPONSE_BODY_SIZE,
        })
    }

    #[must_use]
    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_send_error(error: &reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout
        } else if error.is_builder() {
            HttpError::Url(error.to_string())
        } else {
            HttpError::Io(error.to_string())
        }
    }

    fn too_large(&self, size: usize) -> HttpError {
        HttpError::Io(format!(
            "response body too large: {size} bytes exceeds maximum of {} bytes",
            self.max_response_bytes
        ))
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| HttpError::Io(format!("unsupported method '{}': {e}", request.method)))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(self.timeout);
        for header in &request.headers {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| Self::map_send_error(&e))?;

        let status = response.status().as_u16();
        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > self.max_response_bytes {
                return Err(self.too_large(length));
            }
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| HttpHeader {
                    name: name.as_str().to_string(),
                    value: value.to_string(),
                })
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        if body.len() > self.max_response_bytes {
            return Err(self.too_large(body.len()));
        }

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn request_id(request: &HttpRequest) -> &str {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
        .map_or("", |h| h.value.as_str())
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(
        skip(self, request),
        fields(
            method = %request.method,
            url = %request.url,
            request_id = request_id(request),
        )
    )]
    async fn execute(&self, request: &HttpRequest) -> HttpResult {
        let start = Instant::now();

        match self.send(request).await {
            Ok(response) => {
                let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                debug!(
                    status = response.status,
                    duration_ms,
                    size = response.body.len(),
                    "response received"
                );
                HttpResult::Ok(response)
            }
            Err(error) => {
                warn!(%error, "request failed");
                HttpResult::Err(error)
            }
        }
    }
}
