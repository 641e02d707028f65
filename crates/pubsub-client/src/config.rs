//! # Client Configuration
//!
//! The configuration value built once at startup and passed by reference
//! into the poller, validator, and publisher. There is no ambient global:
//! anything that needs configuration receives it explicitly.
//!
//! Configuration errors (unsupported region, multiple regions where only
//! one is allowed) fail fast at validate time, not at first poll.

use pubsub_core::ServiceIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Regions the messaging backend is deployed in. Anything outside this
/// set is a configuration error.
pub const SUPPORTED_REGIONS: [&str; 4] =
    ["us-east-1", "us-west-1", "eu-west-1", "ap-southeast-1"];

/// How long a received-but-unacknowledged item stays hidden from other
/// consumers before the backend redelivers it.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(3600);

/// How long to poll a region without a successful receive before
/// rotating to the next one.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Long-poll wait per receive call.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(20);

/// Configuration errors. All of these are unrecoverable in-process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Region is not in [`SUPPORTED_REGIONS`].
    #[error("unsupported region {0:?}, supported: {SUPPORTED_REGIONS:?}")]
    UnsupportedRegion(String),

    /// No candidate regions were configured.
    #[error("at least one region must be configured")]
    NoRegions,

    /// Single-region deployments accept exactly one region.
    #[error("failover mode Single allows exactly one region, got {0}")]
    MultipleRegionsUnsupported(usize),

    /// The service identity was never declared.
    #[error("service identity must be declared before polling")]
    MissingService,
}

/// A validated backend region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Validate and wrap a region name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if SUPPORTED_REGIONS.contains(&name.as_str()) {
            Ok(Self(name))
        } else {
            Err(ConfigError::UnsupportedRegion(name))
        }
    }

    /// The region name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Region {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

/// Backend credentials, passed through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
}

impl Credentials {
    /// Load credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`.
    ///
    /// Returns `None` when either variable is unset, in which case the
    /// backend falls back to its own environment defaults.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        Some(Self {
            access_key,
            secret_key,
        })
    }
}

/// Whether the region list is a sequential failover chain or pinned to a
/// single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailoverMode {
    /// Rotate through the candidate list on sustained failure or idle
    /// timeout. Default.
    #[default]
    Sequential,
    /// Exactly one region; configuring more is rejected at validate time.
    Single,
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Own service identity; also the queue name.
    pub service: ServiceIdentifier,
    /// Ordered candidate regions.
    pub regions: Vec<Region>,
    /// Optional backend credentials.
    pub credentials: Option<Credentials>,
    /// Failover deployment mode.
    pub failover_mode: FailoverMode,
    /// Visibility timeout requested on each receive.
    pub visibility_timeout: Duration,
    /// Idle window before proactive region rotation.
    pub idle_timeout: Duration,
    /// Long-poll wait per receive call.
    pub max_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service: ServiceIdentifier::default(),
            regions: Vec::new(),
            credentials: None,
            failover_mode: FailoverMode::default(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl ClientConfig {
    /// Configuration for a named service with the given regions.
    pub fn new<I, S>(service_name: &str, regions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regions = regions
            .into_iter()
            .map(Region::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            service: ServiceIdentifier::derive(service_name),
            regions,
            ..Self::default()
        })
    }

    /// Validate the configuration before polling starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.is_empty() {
            return Err(ConfigError::MissingService);
        }
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        if self.failover_mode == FailoverMode::Single && self.regions.len() > 1 {
            return Err(ConfigError::MultipleRegionsUnsupported(self.regions.len()));
        }
        Ok(())
    }
}
