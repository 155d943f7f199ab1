//! Startup configuration.
//!
//! A YAML file declares the listen address, the database URL, the routing
//! mode, a global set of always-string JSON column names, and the views
//! themselves. `build_registry` turns the declarations into the immutable
//! view registry; every mistake an operator can make is a typed
//! [`ConfigError`] that aborts startup.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::gateway::router::{
    MatchMode, OutputFormat, PathMatcher, View, ViewRegistry, MAX_BOUND_PARAMS,
};
use crate::http::request::Method;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid database url '{url}': {reason}")]
    DatabaseUrl { url: String, reason: String },

    #[error("view '{path}': unknown method '{method}'")]
    InvalidMethod { path: String, method: String },

    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("pattern '{pattern}' has {groups} capture groups but {params} parameter names")]
    CaptureMismatch {
        pattern: String,
        groups: usize,
        params: usize,
    },

    #[error("view '{path}': 'params' requires pattern routing")]
    ParamsInLiteralMode { path: String },

    #[error("view '{path}' does not fit the configured routing mode")]
    MatcherMode { path: String },

    #[error("statement '{sql}' declares {count} bound parameters, more than the maximum of {max}", max = MAX_BOUND_PARAMS)]
    TooManyParameters { sql: String, count: usize },

    #[error("view '{path}': csv format requires a 'columns' projection")]
    MissingColumns { path: String },

    #[error("view '{path}': unknown format '{format}' (expected csv or json)")]
    InvalidFormat { path: String, format: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub routing: RoutingMode,
    /// Column names always emitted as JSON strings, for every JSON view.
    #[serde(default)]
    pub json_strings: Vec<String>,
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Path matching mode, global to the registry. The modes are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    Literal,
    Pattern,
}

/// One declared view.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    pub method: String,
    /// Literal path, or a regex in pattern routing.
    pub path: String,
    /// Pattern routing only: one name per capture group, in group order.
    #[serde(default)]
    pub params: Vec<String>,
    pub sql: String,
    /// Bound parameter names, in placeholder order.
    #[serde(default)]
    pub bind: Vec<String>,
    /// "csv" or "json".
    pub format: String,
    /// CSV: the ordered column projection.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// JSON: per-view additions to the global string-hint set.
    #[serde(default)]
    pub strings: Vec<String>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Config::from_yaml(&text)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(text: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.database.url).map_err(|e| ConfigError::DatabaseUrl {
            url: self.database.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::DatabaseUrl {
                url: self.database.url.clone(),
                reason: "scheme must be postgres:// or postgresql://".to_string(),
            });
        }
        Ok(())
    }

    /// Build the immutable view registry from the declared views.
    pub fn build_registry(&self) -> Result<ViewRegistry, ConfigError> {
        let mode = match self.routing {
            RoutingMode::Literal => MatchMode::Literal,
            RoutingMode::Pattern => MatchMode::Pattern,
        };
        let mut registry = ViewRegistry::new(mode);

        for declared in &self.views {
            let method =
                Method::from_str(&declared.method).ok_or_else(|| ConfigError::InvalidMethod {
                    path: declared.path.clone(),
                    method: declared.method.clone(),
                })?;

            let matcher = match self.routing {
                RoutingMode::Literal => {
                    if !declared.params.is_empty() {
                        return Err(ConfigError::ParamsInLiteralMode {
                            path: declared.path.clone(),
                        });
                    }
                    PathMatcher::literal(&declared.path)
                }
                RoutingMode::Pattern => {
                    PathMatcher::pattern(&declared.path, declared.params.clone())?
                }
            };

            let format = match declared.format.as_str() {
                "csv" => OutputFormat::Csv {
                    columns: declared.columns.clone().ok_or_else(|| {
                        ConfigError::MissingColumns {
                            path: declared.path.clone(),
                        }
                    })?,
                },
                "json" => {
                    let mut strings: HashSet<String> =
                        self.json_strings.iter().cloned().collect();
                    strings.extend(declared.strings.iter().cloned());
                    OutputFormat::Json { strings }
                }
                other => {
                    return Err(ConfigError::InvalidFormat {
                        path: declared.path.clone(),
                        format: other.to_string(),
                    });
                }
            };

            registry.register(View {
                method,
                matcher,
                sql: declared.sql.clone(),
                bind: declared.bind.clone(),
                format,
            })?;
        }

        Ok(registry)
    }
}
