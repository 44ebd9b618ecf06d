//! Client configuration and resource creation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{
    decoder::DEFAULT_CHUNK_SIZE,
    error::{Error, Result},
    params::ParamsBuilder,
    resource::Resource,
    transport::{Auth, ReqwestTransport, Transport},
    url::{DEFAULT_BASE_PATH, UrlBuilder, get_base_url, validate_path},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_USER_AGENT: &str = concat!("snow-client/", env!("CARGO_PKG_VERSION"));

pub const ENV_INSTANCE: &str = "SNOW_INSTANCE";
pub const ENV_HOST: &str = "SNOW_HOST";
pub const ENV_USER: &str = "SNOW_USER";
pub const ENV_PASSWORD: &str = "SNOW_PASSWORD";
pub const ENV_TOKEN: &str = "SNOW_TOKEN";

/// Configures a [`Client`].
///
/// Exactly one of `instance` and `host` is required. Credentials are either
/// basic (`user` + `password`), OAuth (`oauth()` plus a token set now or
/// later), or left to a custom [`Transport`].
///
/// ```
/// use snow_client::Client;
///
/// let client = Client::builder()
///     .instance("dev12345")
///     .basic_auth("admin", "secret")
///     .raise_on_empty(false)
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url(), "https://dev12345.service-now.com");
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    instance: Option<String>,
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    oauth: bool,
    token: Option<String>,
    use_ssl: Option<bool>,
    raise_on_empty: Option<bool>,
    timeout: Option<Duration>,
    chunk_size: Option<usize>,
    user_agent: Option<String>,
    parameters: Option<ParamsBuilder>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `SNOW_INSTANCE`, `SNOW_HOST`, `SNOW_USER`, `SNOW_PASSWORD` and
    /// `SNOW_TOKEN`. A token switches the builder to OAuth mode.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let mut builder = ClientBuilder::new();
        builder.instance = var(ENV_INSTANCE);
        builder.host = var(ENV_HOST);
        builder.user = var(ENV_USER);
        builder.password = var(ENV_PASSWORD);
        if let Some(token) = var(ENV_TOKEN) {
            builder.oauth = true;
            builder.token = Some(token);
        }
        builder
    }

    /// The instance name, expanded to `<instance>.service-now.com`.
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// A full host name, as an alternative to `instance`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Bearer-token authentication. Resources can only be created once a token is set.
    pub fn oauth(mut self) -> Self {
        self.oauth = true;
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.oauth = true;
        self.token = Some(token.into());
        self
    }

    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = Some(use_ssl);
        self
    }

    pub fn raise_on_empty(mut self, raise: bool) -> Self {
        self.raise_on_empty = Some(raise);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read size of the streaming decoder, in bytes.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Parameters copied into every resource.
    pub fn parameters(mut self, parameters: ParamsBuilder) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Replaces the default `reqwest` transport. The transport handles credentials.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Client> {
        if self.instance.is_some() && self.host.is_some() {
            return Err(Error::InvalidUsage(
                "arguments 'instance' and 'host' are mutually exclusive, you cannot use both"
                    .to_string(),
            ));
        }

        let use_ssl = self.use_ssl.unwrap_or(true);
        let base_url = get_base_url(use_ssl, self.instance.as_deref(), self.host.as_deref())?;

        let has_credentials = self.user.is_some() || self.password.is_some();
        if self.oauth && has_credentials {
            return Err(Error::InvalidUsage(
                "basic credentials cannot be combined with OAuth".to_string(),
            ));
        }
        if self.transport.is_some() && has_credentials {
            return Err(Error::InvalidUsage(
                "provide either credentials or a transport, not both".to_string(),
            ));
        }

        let settings = TransportSettings {
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        let custom_transport = self.transport.is_some();
        let transport: Option<Arc<dyn Transport>> = match (self.transport, self.oauth) {
            (Some(transport), _) => Some(transport),
            (None, true) => match &self.token {
                Some(token) => Some(settings.bearer(token)?),
                None => None,
            },
            (None, false) => match (self.user, self.password) {
                (Some(user), Some(password)) => {
                    debug!(user = %user, "creating basic-auth session");
                    Some(Arc::new(ReqwestTransport::new(
                        Auth::Basic { user, password },
                        settings.timeout,
                        &settings.user_agent,
                    )?))
                }
                _ => {
                    return Err(Error::InvalidUsage(
                        "you must supply either user and password or a transport".to_string(),
                    ));
                }
            },
        };

        Ok(Client {
            base_url,
            parameters: self.parameters.unwrap_or_default(),
            raise_on_empty: self.raise_on_empty.unwrap_or(true),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            oauth: self.oauth,
            token: self.token,
            custom_transport,
            settings,
            transport,
        })
    }
}

struct TransportSettings {
    timeout: Duration,
    user_agent: String,
}

impl TransportSettings {
    fn bearer(&self, token: &str) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(ReqwestTransport::new(
            Auth::Bearer(token.to_string()),
            self.timeout,
            &self.user_agent,
        )?))
    }
}

/// Entry point: holds connection settings and hands out [`Resource`]s.
pub struct Client {
    base_url: String,
    parameters: ParamsBuilder,
    raise_on_empty: bool,
    chunk_size: usize,
    oauth: bool,
    token: Option<String>,
    custom_transport: bool,
    settings: TransportSettings,
    transport: Option<Arc<dyn Transport>>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn raise_on_empty(&self) -> bool {
        self.raise_on_empty
    }

    /// Default parameters for resources created from now on.
    pub fn parameters(&self) -> &ParamsBuilder {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParamsBuilder {
        &mut self.parameters
    }

    pub fn is_oauth(&self) -> bool {
        self.oauth
    }

    /// Sets or clears the OAuth access token.
    pub fn set_token(&mut self, token: Option<String>) -> Result<()> {
        if !self.oauth {
            return Err(Error::InvalidUsage(
                "tokens can only be set on an OAuth client".to_string(),
            ));
        }

        match token {
            None => {
                self.token = None;
                if !self.custom_transport {
                    self.transport = None;
                }
            }
            Some(token) if token.is_empty() => {
                return Err(Error::InvalidUsage("token must not be empty".to_string()));
            }
            Some(token) => {
                if !self.custom_transport {
                    self.transport = Some(self.settings.bearer(&token)?);
                }
                self.token = Some(token);
            }
        }
        Ok(())
    }

    /// A resource below the default `/api/now` base path.
    pub fn resource(&self, api_path: &str) -> Result<Resource> {
        self.resource_with(api_path, DEFAULT_BASE_PATH, None)
    }

    /// A resource with an explicit base path and decoder chunk size.
    pub fn resource_with(
        &self,
        api_path: &str,
        base_path: &str,
        chunk_size: Option<usize>,
    ) -> Result<Resource> {
        validate_path(api_path)?;
        validate_path(base_path)?;

        if self.oauth && self.token.is_none() {
            return Err(Error::MissingToken(
                "you must set_token() before creating a resource with an OAuth client".to_string(),
            ));
        }
        let transport = self.transport.clone().ok_or_else(|| {
            Error::MissingToken("no session is available for this client".to_string())
        })?;

        Ok(Resource::new(
            transport,
            UrlBuilder::new(&self.base_url, base_path, api_path),
            self.parameters.clone(),
            chunk_size.unwrap_or(self.chunk_size),
            self.raise_on_empty,
        ))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("oauth", &self.oauth)
            .field("raise_on_empty", &self.raise_on_empty)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}
