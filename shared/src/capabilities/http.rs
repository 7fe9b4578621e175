use crux_http::http::{mime, Body};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_REQUEST_BODY_SIZE: usize = 50 * 1024 * 1024;
pub const MAX_RESPONSE_BODY_SIZE: usize = 100 * 1024 * 1024;

pub const ACCEPT_HEADER: &str = "Accept";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An absolute `http`/`https` URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedUrl {
    url: Url,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let parsed = Self::validate(&url)?;

        let scheme = parsed.scheme().to_lowercase();
        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl {
                url: Self::truncate_url(&url),
                reason: "missing host".to_string(),
            })?
            .to_lowercase();

        Ok(Self {
            url: parsed,
            scheme,
            host,
        })
    }

    /// Appends `path` to this URL's path, keeping any prefix the base carries.
    ///
    /// `http://host/civic` joined with `/api/complaints` yields
    /// `http://host/civic/api/complaints`.
    pub fn join(&self, path: &str) -> Result<Self, HttpError> {
        let full = self.url.as_str();
        let base = full.split(['?', '#']).next().unwrap_or(full);
        Self::new(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    fn validate(url: &str) -> Result<Url, HttpError> {
        if url.is_empty() {
            return Err(HttpError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(HttpError::InvalidUrl {
                url: url.to_string(),
                reason: "URL cannot be only whitespace".to_string(),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| HttpError::InvalidUrl {
            url: Self::truncate_url(url),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        if parsed.host_str().is_none() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "URL must have a host".to_string(),
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(parsed)
    }

    fn truncate_url(url: &str) -> String {
        if url.chars().count() <= 100 {
            url.to_string()
        } else {
            format!("{}...", url.chars().take(100).collect::<String>())
        }
    }
}

impl std::fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Encodes `value` as a JSON request body, refusing bodies over
/// [`MAX_REQUEST_BODY_SIZE`].
pub fn json_body<T: Serialize>(value: &T) -> Result<Body, HttpError> {
    let bytes = serde_json::to_vec(value).map_err(|e| HttpError::SerializationError {
        message: e.to_string(),
    })?;

    if bytes.len() > MAX_REQUEST_BODY_SIZE {
        return Err(HttpError::BodyTooLarge {
            size: bytes.len(),
            max: MAX_REQUEST_BODY_SIZE,
        });
    }

    let mut body = Body::from_bytes(bytes);
    body.set_mime(mime::JSON);
    Ok(body)
}

/// Fresh correlation id sent as [`REQUEST_ID_HEADER`].
#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Failures while building a request, before anything reaches the shell.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request body too large: {size} bytes exceeds maximum of {max} bytes")]
    BodyTooLarge { size: usize, max: usize },

    #[error("serialization error: {message}")]
    SerializationError { message: String },
}
