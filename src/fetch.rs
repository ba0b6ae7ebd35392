//! HTTP client abstraction for making requests to the Resolution API

use crate::error::Error;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// A successfully received response body
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// HTTP 204, no content
    Empty,
    /// A body served with a JSON content type
    Json(Value),
    /// Any other body, returned verbatim
    Text(String),
}

impl ApiBody {
    /// Whether the response carried no content
    pub fn is_empty(&self) -> bool {
        matches!(self, ApiBody::Empty)
    }

    /// Deserialize a JSON body into `T`
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, Error> {
        match self {
            ApiBody::Json(value) => Ok(serde_json::from_value(value)?),
            ApiBody::Empty => Err(Error::unexpected_body("empty response")),
            ApiBody::Text(text) => Err(Error::unexpected_body(format!(
                "expected JSON, got text: {}",
                text
            ))),
        }
    }
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(mut self, token: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    /// Add bearer token authentication when a token is available
    pub fn maybe_bearer_auth(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.bearer_auth(token),
            None => self,
        }
    }

    /// Add a query parameter to the request
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    /// Bound the request duration
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the request
    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request once and classify the response
    pub async fn execute_body(&self) -> Result<ApiBody, Error> {
        let req = self.build()?;
        log::debug!("{} {}", self.method, self.url);

        let response = req.send().await.map_err(|err| {
            log::warn!("{} {} failed: {}", self.method, self.url, err);
            Error::Http(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            let message = error_message(status, &bytes);
            log::warn!("{} {} returned {}: {}", self.method, self.url, status, message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiBody::Empty);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            let bytes = response.bytes().await?;
            Ok(ApiBody::Json(serde_json::from_slice(&bytes)?))
        } else {
            Ok(ApiBody::Text(response.text().await?))
        }
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.execute_body().await?.into_json()
    }

    /// Execute the request, mapping an empty response to `None`
    pub async fn execute_optional<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        match self.execute_body().await? {
            ApiBody::Empty => Ok(None),
            body => body.into_json().map(Some),
        }
    }
}

/// Pick the message for a failed response: `error`, then `detail`, then the status line
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = || {
        format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
    };

    let parsed: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return fallback(),
    };

    field_message(&parsed, "error")
        .or_else(|| field_message(&parsed, "detail"))
        .unwrap_or_else(fallback)
}

fn field_message(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PUT request
    pub fn put<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PUT)
    }

    /// Create a PATCH request
    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_precedence() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, br#"{"error":"boom","detail":"ignored"}"#),
            "boom"
        );
        assert_eq!(error_message(status, br#"{"detail":"Not found."}"#), "Not found.");
        assert_eq!(error_message(status, br#"{"other":1}"#), "Error 400: Bad Request");
        assert_eq!(error_message(status, b"<html>oops</html>"), "Error 400: Bad Request");
        assert_eq!(error_message(status, br#"{"error":""}"#), "Error 400: Bad Request");
    }

    #[test]
    fn test_into_json_on_empty_is_not_a_parse_error() {
        let err = ApiBody::Empty.into_json::<Value>().unwrap_err();
        assert!(matches!(err, Error::UnexpectedBody(_)));
    }
}
