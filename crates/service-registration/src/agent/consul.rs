//! Consul agent over HTTP

use super::{Agent, AgentResult};
use crate::{
    config::ClientConfig,
    error::{AgentError, Error, Result},
    models::{AgentCheck, CheckRegistration, ServiceRecord},
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use std::collections::HashMap;
use tracing::debug;

/// Header carrying the ACL token
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Agent reached through the Consul HTTP API
///
/// Building one does not contact the agent. Requests go through `reqwest`,
/// so calls must run inside a Tokio 1.x runtime; outside of one they fail
/// with [`AgentError::NoRuntime`].
#[derive(Debug, Clone)]
pub struct ConsulAgent {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    datacenter: Option<String>,
}

impl ConsulAgent {
    /// Agent at `address` with no token and the agent's own datacenter
    pub fn new(address: &str) -> Result<Self> {
        let base_url = base_url(address)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: None,
            datacenter: None,
        })
    }

    /// Agent described by `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut agent = Self::new(&config.address)?;
        agent.token = config.token.clone();
        agent.datacenter = config.datacenter.clone();
        Ok(agent)
    }

    /// Base URL every request is made against
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL with each of `segments` appended, percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments.iter().copied());
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(dc) = &self.datacenter {
            request = request.query(&[("dc", dc)]);
        }
        request
    }

    async fn send(request: RequestBuilder) -> AgentResult<Response> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(AgentError::NoRuntime);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AgentError::UnexpectedStatus {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

/// Normalise an agent address into a base URL
fn base_url(address: &str) -> Result<Url> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::Connection("empty agent address".to_string()));
    }

    let with_scheme = match address.split_once("://") {
        Some(("http", _)) | Some(("https", _)) => address.to_string(),
        Some((scheme, _)) => {
            return Err(Error::Connection(format!(
                "unsupported scheme {scheme:?} in agent address {address:?}"
            )));
        }
        None => format!("http://{address}"),
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| Error::Connection(format!("malformed agent address {address:?}: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::Connection(format!(
            "agent address {address:?} has no host"
        )));
    }

    Ok(url)
}

#[async_trait]
impl Agent for ConsulAgent {
    async fn service_register(&self, record: &ServiceRecord) -> AgentResult<()> {
        let request = self
            .request(Method::PUT, &["v1", "agent", "service", "register"])
            .json(record);
        Self::send(request).await?;
        Ok(())
    }

    async fn service_deregister(&self, instance_id: &str) -> AgentResult<()> {
        let segments = ["v1", "agent", "service", "deregister", instance_id];
        Self::send(self.request(Method::PUT, &segments)).await?;
        Ok(())
    }

    async fn check_register(&self, check: &CheckRegistration) -> AgentResult<()> {
        let request = self
            .request(Method::PUT, &["v1", "agent", "check", "register"])
            .json(check);
        Self::send(request).await?;
        Ok(())
    }

    async fn checks(&self) -> AgentResult<HashMap<String, AgentCheck>> {
        let response = Self::send(self.request(Method::GET, &["v1", "agent", "checks"])).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
