//! HTTP plumbing shared by every service call

use crate::endpoint::{Endpoints, Service};
use crate::error::OpenStackError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use stratus_cloud::{CloudError, Result};

const AUTH_HEADER: &str = "X-Auth-Token";
const USER_AGENT: &str = concat!("stratus/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenStack REST client authenticated with a pre-issued token
#[derive(Debug)]
pub struct OpenStackClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    region: Option<String>,
}

impl OpenStackClient {
    pub fn new(endpoints: Endpoints, token: &str) -> std::result::Result<Self, OpenStackError> {
        if token.trim().is_empty() {
            return Err(OpenStackError::MissingToken);
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(token.trim())
            .map_err(|_| OpenStackError::MissingToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTH_HEADER, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoints,
            region: None,
        })
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request and decode the JSON response.
    ///
    /// With `key`, the object is taken from the OpenStack envelope
    /// (`{"network": {...}}`).
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        service: Service,
        path: &str,
        body: Option<&Value>,
        key: Option<&str>,
    ) -> Result<T> {
        let response = self.send(method, service, path, body).await?;
        let mut payload: Value = response.json().await.map_err(transport)?;

        let inner = match key {
            Some(key) => payload
                .get_mut(key)
                .map(Value::take)
                .ok_or_else(|| {
                    CloudError::Transport(format!(
                        "{} response has no '{}' object",
                        service, key
                    ))
                })?,
            None => payload,
        };
        Ok(serde_json::from_value(inner)?)
    }

    /// Send a request whose response body is not needed
    pub(crate) async fn call_empty(
        &self,
        method: Method,
        service: Service,
        path: &str,
        body: Option<&Value>,
    ) -> Result<()> {
        self.send(method, service, path, body).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        service: Service,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = self.endpoints.url(service, path)?;
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        tracing::trace!("{} {} -> {}", method, url, status);

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(status_error(status, &text))
    }
}

fn transport(err: reqwest::Error) -> CloudError {
    CloudError::Transport(err.to_string())
}

/// Map a non-2xx response onto the error taxonomy the orchestrators expect
pub(crate) fn status_error(status: StatusCode, body: &str) -> CloudError {
    let message = error_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.canonical_reason().unwrap_or("no details").to_string()
        } else {
            trimmed.chars().take(200).collect()
        }
    });

    match status {
        StatusCode::NOT_FOUND => CloudError::NotFound(message),
        StatusCode::CONFLICT => CloudError::Conflict(message),
        _ => CloudError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull the human readable message out of the various OpenStack error bodies:
/// `{"NeutronError": {"message": ..}}`, `{"itemNotFound": {"message": ..}}`,
/// `{"faultstring": ..}`, `{"errors": [{"detail": ..}]}`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    let direct = |v: &Value| {
        ["message", "faultstring", "detail"]
            .iter()
            .find_map(|field| v.get(field).and_then(Value::as_str))
            .map(str::to_string)
    };

    if let Some(message) = direct(&value) {
        return Some(message);
    }
    if let Some(first) = object
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        return direct(first);
    }
    object.values().find_map(direct)
}
