use std::str::FromStr;
use std::time;

use envconfig::Envconfig;
use thiserror::Error;
use url::Url;

use gitwebhook_common::event::Provider;
use gitwebhook_common::routing::{
    Destinations, InfraRepoMapping, ParseMappingError, RoutingConfig,
};

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "SERVER_PORT", default = "9000")]
    pub port: u16,

    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: String,

    #[envconfig(from = "NAME")]
    pub name: String,

    #[envconfig(from = "VERSION")]
    pub version: String,

    #[envconfig(from = "WEBHOOK_PROVIDER", default = "github")]
    pub provider: Provider,

    #[envconfig(from = "PR_OPENED_URL")]
    pub pr_opened_url: Option<String>,

    #[envconfig(from = "PR_MERGED_URL")]
    pub pr_merged_url: Option<String>,

    #[envconfig(from = "PRERELEASED_URL")]
    pub prereleased_url: Option<String>,

    #[envconfig(from = "RELEASED_URL")]
    pub released_url: Option<String>,

    #[envconfig(from = "URL_DEV")]
    pub url_dev: Option<String>,

    #[envconfig(from = "URL_UAT")]
    pub url_uat: Option<String>,

    #[envconfig(from = "URL_PROD")]
    pub url_prod: Option<String>,

    #[envconfig(from = "WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,

    #[envconfig(from = "REPO_MAPPING")]
    pub repo_mapping: Option<String>,

    #[envconfig(from = "REQUEST_TIMEOUT_MS", default = "5000")]
    pub request_timeout: EnvMsDuration,

    #[envconfig(from = "TLS_INSECURE_SKIP_VERIFY", default = "false")]
    pub tls_insecure_skip_verify: bool,

    #[envconfig(default = "5000000")]
    pub max_body_size: usize,

    #[envconfig(default = "100")]
    pub concurrency_limit: usize,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LOG_LEVEL must not be empty")]
    EmptyLogLevel,
    #[error("no event listener configured: set PR_OPENED_URL, PR_MERGED_URL, PRERELEASED_URL, RELEASED_URL or URL_DEV, URL_UAT, URL_PROD")]
    NoDestinations,
    #[error("lifecycle and environment event listeners are mutually exclusive")]
    AmbiguousDestinations,
    #[error("{0} is required when environment event listeners are configured")]
    MissingEnvironment(&'static str),
    #[error("{key} is not a valid http(s) url: {value}")]
    InvalidUrl { key: &'static str, value: String },
    #[error("invalid REPO_MAPPING: {0}")]
    RepoMapping(#[from] ParseMappingError),
}

impl Config {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the routing part of the configuration and build the immutable view the
    /// request handlers classify events with.
    pub fn routing(&self) -> Result<RoutingConfig, ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }

        let pr_opened = configured("PR_OPENED_URL", &self.pr_opened_url)?;
        let pr_merged = configured("PR_MERGED_URL", &self.pr_merged_url)?;
        let prereleased = configured("PRERELEASED_URL", &self.prereleased_url)?;
        let released = configured("RELEASED_URL", &self.released_url)?;
        let dev = configured("URL_DEV", &self.url_dev)?;
        let uat = configured("URL_UAT", &self.url_uat)?;
        let prod = configured("URL_PROD", &self.url_prod)?;

        let lifecycle_in_use = pr_opened.is_some()
            || pr_merged.is_some()
            || prereleased.is_some()
            || released.is_some();
        let environments_in_use = dev.is_some() || uat.is_some() || prod.is_some();

        let destinations = match (lifecycle_in_use, environments_in_use) {
            (true, true) => return Err(ConfigError::AmbiguousDestinations),
            (false, false) => return Err(ConfigError::NoDestinations),
            (true, false) => Destinations::Lifecycle {
                pr_opened,
                pr_merged,
                prereleased,
                released,
            },
            (false, true) => Destinations::Environments {
                dev: dev.ok_or(ConfigError::MissingEnvironment("URL_DEV"))?,
                uat: uat.ok_or(ConfigError::MissingEnvironment("URL_UAT"))?,
                prod: prod.ok_or(ConfigError::MissingEnvironment("URL_PROD"))?,
            },
        };

        let infra_mapping = match self.repo_mapping.as_deref() {
            Some(mapping) if !mapping.trim().is_empty() => {
                Some(InfraRepoMapping::from_str(mapping)?)
            }
            _ => None,
        };

        Ok(RoutingConfig {
            provider: self.provider,
            destinations,
            webhook_secret: self.webhook_secret.clone().filter(|s| !s.is_empty()),
            infra_mapping,
        })
    }
}

/// An unset or empty variable means "not configured"; anything else must be a usable URL.
fn configured(key: &'static str, value: &Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(value.to_owned())),
        _ => Err(ConfigError::InvalidUrl {
            key,
            value: value.to_owned(),
        }),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}
