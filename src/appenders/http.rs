//! HTTP appender for remote logging
//!
//! POSTs every formatted record as its own JSON request. There is no
//! batching, no retry and no connection reuse; a status other than 200 is
//! reported as a delivery failure.

use crate::core::{Appender, LogRecord, LoggerError, RecordFormatter, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Credentials attached to every request. A bearer token wins over basic auth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpAuth {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer: Option<String>,
}

impl HttpAuth {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            bearer: None,
        }
    }
}

/// Parsed target of the sink, resolved once at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| LoggerError::config("HttpAppender", format!("invalid url '{}': {}", raw, e)))?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(LoggerError::config(
                    "HttpAppender",
                    format!("unsupported scheme '{}' in '{}'", other, raw),
                ))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| LoggerError::config("HttpAppender", format!("missing host in '{}'", raw)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .unwrap_or(if secure { 443 } else { 80 });

        Ok(Self {
            secure,
            host,
            port,
            path: url.path().to_string(),
        })
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}://{}:{}{}", scheme, host, self.port, self.path)
    }
}

/// Builds the header set: content type, configured headers, then credentials
pub fn build_headers(headers: &BTreeMap<String, String>, auth: Option<&HttpAuth>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LoggerError::config("HttpAppender", format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| LoggerError::config("HttpAppender", format!("invalid value for header '{}': {}", name, e)))?;
        map.insert(name, value);
    }

    if let Some(token) = auth.and_then(|a| a.bearer.as_deref()).filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| LoggerError::config("HttpAppender", format!("invalid bearer token: {}", e)))?;
        value.set_sensitive(true);
        map.insert(AUTHORIZATION, value);
    }

    Ok(map)
}

/// Basic credentials, only when no bearer is set and both parts are present
fn basic_credentials(auth: Option<&HttpAuth>) -> Option<(String, String)> {
    let auth = auth?;
    if auth.bearer.as_deref().is_some_and(|t| !t.is_empty()) {
        return None;
    }
    match (auth.username.as_deref(), auth.password.as_deref()) {
        (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
            Some((user.to_string(), pass.to_string()))
        }
        _ => None,
    }
}

/// Settings for [`HttpAppender`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpOptions {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<HttpAuth>,
}

impl HttpOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: HttpAuth) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Structured sink posting each record to an HTTP endpoint.
///
/// # Example
///
/// ```no_run
/// use rust_context_logger::appenders::{HttpAppender, HttpAuth, HttpOptions};
/// use rust_context_logger::core::RecordFormatter;
///
/// let appender = HttpAppender::new(
///     HttpOptions::new("https://logs.example.com/ingest").with_auth(HttpAuth::bearer("token")),
///     RecordFormatter::new(),
/// )
/// .expect("valid http sink options");
/// ```
pub struct HttpAppender {
    client: Client,
    endpoint: Endpoint,
    headers: HeaderMap,
    basic: Option<(String, String)>,
    formatter: RecordFormatter,
}

impl HttpAppender {
    /// # Errors
    ///
    /// Returns a configuration error for unparsable urls, unsupported schemes
    /// and invalid header names or values.
    pub fn new(options: HttpOptions, formatter: RecordFormatter) -> Result<Self> {
        let endpoint = Endpoint::parse(&options.url)?;
        let headers = build_headers(&options.headers, options.auth.as_ref())?;
        let basic = basic_credentials(options.auth.as_ref());

        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LoggerError::config("HttpAppender", format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            headers,
            basic,
            formatter,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// POST one body and return the status once the response is drained.
    ///
    /// Status policy is left to the caller.
    pub async fn deliver(&self, body: String) -> Result<StatusCode> {
        let mut request = self
            .client
            .post(self.endpoint.url())
            .headers(self.headers.clone())
            .body(body.into_bytes());

        if let Some((user, pass)) = &self.basic {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send().await?;
        let status = response.status();
        response.bytes().await?;
        Ok(status)
    }
}

#[async_trait]
impl Appender for HttpAppender {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        let body = self.formatter.format(record)?;
        let status = self.deliver(body).await?;

        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(LoggerError::http_status(status.as_u16()))
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
