use std::fmt::Debug;
use std::time::Duration;

use toolchat_model::ErrorKind;

use crate::Error;

const DEFAULT_ENDPOINT: &str = "https://ai-proxy.lab.epam.com";
const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Builder for [`DialConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DialConfigBuilder {
    api_key: String,
    endpoint: Option<String>,
    deployment: Option<String>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl DialConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: None,
            deployment: None,
            connect_timeout: None,
            read_timeout: None,
        }
    }

    /// Sets the endpoint, e.g. `https://ai-proxy.lab.epam.com`.
    #[inline]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the deployment (model) name.
    #[inline]
    pub fn with_deployment<S: Into<String>>(mut self, deployment: S) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    /// Sets the timeout for establishing a connection.
    #[inline]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the timeout for each read of the response body. Streaming
    /// responses may take arbitrarily long as a whole, so this is the
    /// longest silence tolerated between two chunks.
    #[inline]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// Fails with [`ErrorKind::Configuration`] if the API key is empty.
    pub fn build(self) -> Result<DialConfig, Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::new(
                "API key is required",
                ErrorKind::Configuration,
            ));
        }
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
        Ok(DialConfig {
            api_key: self.api_key,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            deployment: self
                .deployment
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_owned()),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_TIMEOUT),
            read_timeout: self.read_timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

impl Debug for DialConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

/// Configuration for the DIAL provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DialConfig {
    pub(crate) api_key: String,
    pub(crate) endpoint: String,
    pub(crate) deployment: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
}

impl DialConfig {
    /// Returns the URL of the chat completions API for the deployment.
    #[inline]
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    /// Returns the deployment name.
    #[inline]
    pub fn deployment(&self) -> &str {
        &self.deployment
    }
}

impl Debug for DialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
