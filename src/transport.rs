//! Request transport used by the grid to fetch pages.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{Map, Value};

/// How request parameters are encoded
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestFormat {
  /// Parameters go into the query string
  #[default]
  Query,
  /// Parameters go into a JSON body
  Body,
}

/// HTTP verb for page requests
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestVerb {
  #[default]
  #[serde(alias = "get")]
  Get,
  #[serde(alias = "post")]
  Post,
  #[serde(alias = "put")]
  Put,
  #[serde(alias = "patch")]
  Patch,
}

impl RequestVerb {
  fn method(self) -> reqwest::Method {
    match self {
      RequestVerb::Get => reqwest::Method::GET,
      RequestVerb::Post => reqwest::Method::POST,
      RequestVerb::Put => reqwest::Method::PUT,
      RequestVerb::Patch => reqwest::Method::PATCH,
    }
  }
}

/// A single page request, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub url: String,
  pub verb: RequestVerb,
  pub format: RequestFormat,
  pub params: Map<String, Value>,
}

/// Something that can execute an [`ApiRequest`] and hand back the decoded JSON body.
///
/// The grid never looks past this trait, so tests and embedders can swap the
/// HTTP stack for anything that produces `{ count, result }` shaped values.
pub trait Transport: Send + Sync {
  fn call(&self, request: ApiRequest) -> BoxFuture<'_, Result<Value>>;
}

/// Transport backed by reqwest
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
  token: Option<String>,
}

impl HttpTransport {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .gzip(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      token: None,
    })
  }

  /// Send `Authorization: Bearer <token>` with every request
  pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
    self.token = Some(token.into());
    self
  }

  async fn send(&self, request: ApiRequest) -> Result<Value> {
    let url = url::Url::parse(&request.url)
      .map_err(|e| eyre!("Invalid API url {}: {}", request.url, e))?;

    let mut builder = self.client.request(request.verb.method(), url);
    builder = match request.format {
      RequestFormat::Query => builder.query(&query_pairs(&request.params)),
      RequestFormat::Body => builder.json(&request.params),
    };
    if let Some(token) = &self.token {
      builder = builder.bearer_auth(token);
    }

    let response = builder
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| eyre!("Request to {} failed: {}", request.url, e))?;

    response
      .json::<Value>()
      .await
      .map_err(|e| eyre!("Failed to decode response from {}: {}", request.url, e))
  }
}

impl Transport for HttpTransport {
  fn call(&self, request: ApiRequest) -> BoxFuture<'_, Result<Value>> {
    Box::pin(self.send(request))
  }
}

/// Flatten JSON parameters into query-string pairs.
/// Strings are sent bare, null as an empty value, everything else as its JSON text.
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
  params
    .iter()
    .map(|(key, value)| {
      let value = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
      };
      (key.clone(), value)
    })
    .collect()
}
