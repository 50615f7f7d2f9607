// Request executor
//
// One call = one HTTP round trip: authorization check, URL build, verb
// dispatch with cookie + CSRF header, status classification, and `data`
// envelope unwrapping. No retries happen here.

use std::str::FromStr;

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, IntoStaticStr};
use tracing::{debug, trace};

use crate::client::PveClient;
use crate::error::Error;
use crate::transport::classify;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "CSRFPreventionToken";

/// Longest body excerpt kept in errors.
const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP verbs the API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// PUT and POST send their parameters as a form-encoded body.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Put | Self::Post)
    }

    /// Every verb except GET must carry the CSRF-prevention header.
    pub fn needs_csrf(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Put => Self::PUT,
            Method::Post => Self::POST,
            Method::Delete => Self::DELETE,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Get, Self::Put, Self::Post, Self::Delete]
            .into_iter()
            .find(|m| s.eq_ignore_ascii_case(m.as_str()))
            .ok_or_else(|| Error::UnsupportedMethod(s.to_owned()))
    }
}

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// PUT succeeded; the protocol returns nothing meaningful.
    Completed,
    /// The decoded `data` field. `Value::Null` means the server sent `"data": null`.
    Data(Value),
}

impl ActionResult {
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Completed => None,
            Self::Data(value) => Some(value),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Completed => None,
            Self::Data(value) => Some(value),
        }
    }
}

impl PveClient {
    /// Issue a call by verb name, e.g. `request("post", "/nodes/pve1/qemu/100/status/start", ...)`.
    ///
    /// Unknown verbs fail with [`Error::UnsupportedMethod`] before any I/O.
    pub async fn request<P>(
        &self,
        verb: &str,
        path: &str,
        params: Option<&P>,
    ) -> Result<ActionResult, Error>
    where
        P: Serialize + ?Sized + Sync,
    {
        let method: Method = verb.parse()?;
        self.ensure_node_inventory().await?;
        self.execute(method, path, params).await
    }

    /// Execute one authenticated call without the node-inventory check.
    ///
    /// Fails with [`Error::NotAuthenticated`] (and sends nothing) unless a
    /// fresh ticket is held. `params` is ignored for GET and DELETE.
    pub async fn execute<P>(
        &self,
        method: Method,
        path: &str,
        params: Option<&P>,
    ) -> Result<ActionResult, Error>
    where
        P: Serialize + ?Sized + Sync,
    {
        let path = normalize_path(path);

        let Some(auth) = self.session.write().await.auth_headers() else {
            debug!(%method, %path, "no valid ticket, refusing request");
            return Err(Error::NotAuthenticated);
        };

        let url = self.api_url(&path)?;
        debug!("{method} {url}");

        let mut builder = self
            .http()
            .request(method.into(), url)
            .header(COOKIE, auth.cookie);

        if method.needs_csrf() {
            builder = builder.header(CSRF_HEADER, auth.csrf_token);
        }

        if let Some(params) = params.filter(|_| method.has_body()) {
            builder = builder.form(params);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| classify(e, self.config().host()))?;

        self.read_response(method, &path, resp).await
    }

    /// Classify the status and unwrap the `{ "data": ... }` envelope.
    async fn read_response(
        &self,
        method: Method,
        path: &str,
        resp: reqwest::Response,
    ) -> Result<ActionResult, Error> {
        let status = resp.status();

        if status != StatusCode::OK {
            let body = error_body(resp).await;
            debug!(code = status.as_u16(), %path, "request rejected");
            return Err(Error::Http {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
                body,
            });
        }

        if method == Method::Put {
            return Ok(ActionResult::Completed);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| classify(e, self.config().host()))?;
        trace!(body = %String::from_utf8_lossy(&body), "response body");

        decode_data(&body)
            .map(ActionResult::Data)
            .ok_or_else(|| Error::EmptyPayload { path: path.into() })
    }
}

/// Ensure exactly one leading `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Pull `data` out of a JSON object body. `None` if the body is not a JSON
/// object or has no `data` key.
pub(crate) fn decode_data(body: &[u8]) -> Option<Value> {
    let mut envelope: serde_json::Map<String, Value> = serde_json::from_slice(body).ok()?;
    envelope.remove("data")
}

/// Decode a `data` payload into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(&value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

/// Body excerpt of a rejected response. A body that cannot be read is
/// logged and reported as empty; the status alone classifies the failure.
pub(crate) async fn error_body(resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(body) => preview(&body).to_owned(),
        Err(e) => {
            debug!(error = %e, "could not read error response body");
            String::new()
        }
    }
}

/// First `BODY_PREVIEW_CHARS` characters of a body, cut on a char boundary.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
