//! Configuration providers.
//!
//! A provider is attached to a command and inherited by every descendant that
//! has none of its own (see [`CommandTree::config`](crate::CommandTree::config)).
//! The framework never reads from it; hooks do.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config key {0} not found")]
    NotFound(String),

    #[error("invalid value for config key {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Key/value configuration source.
pub trait ConfigProvider {
    /// Look up `key`, failing with [`ConfigError::NotFound`] when absent.
    fn read(&self, key: &str) -> Result<String, ConfigError>;
}

/// Reads process environment variables, optionally under a prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    prefix: String,
}

impl EnvProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// `with_prefix("APP_")` maps key `PORT` to `APP_PORT`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl ConfigProvider for EnvProvider {
    fn read(&self, key: &str) -> Result<String, ConfigError> {
        let var = format!("{}{}", self.prefix, key);
        std::env::var(&var).map_err(|e| match e {
            std::env::VarError::NotPresent => ConfigError::NotFound(key.to_string()),
            std::env::VarError::NotUnicode(_) => ConfigError::Invalid {
                key: key.to_string(),
                reason: format!("{} is not valid unicode", var),
            },
        })
    }
}

/// In-memory provider.
#[derive(Debug, Clone, Default)]
pub struct MapProvider {
    values: BTreeMap<String, String>,
}

impl MapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapProvider
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigProvider for MapProvider {
    fn read(&self, key: &str) -> Result<String, ConfigError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))
    }
}

/// Tries providers in order; the first answer other than `NotFound` wins.
#[derive(Clone, Default)]
pub struct ChainProvider {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl ChainProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }
}

impl ConfigProvider for ChainProvider {
    fn read(&self, key: &str) -> Result<String, ConfigError> {
        for provider in &self.providers {
            match provider.read(key) {
                Err(ConfigError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(ConfigError::NotFound(key.to_string()))
    }
}

/// Read `key` and parse it with `FromStr`.
pub fn read_parsed<T>(provider: &dyn ConfigProvider, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = provider.read(key)?;
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Like [`read_parsed`], falling back to `default` when the key is absent.
pub fn read_or<T>(provider: &dyn ConfigProvider, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match read_parsed(provider, key) {
        Err(ConfigError::NotFound(_)) => Ok(default),
        other => other,
    }
}
