//! This module controls configuration parsing from the end user, providing a
//! convenience mechanism for the rest of the program. Configuration comes
//! from an optional YAML file and the command line, the command line winning
//! where both speak. Every problem is caught here, before polling begins.
use std::{
    fs, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    filter::{self, Filter, LabelFilter},
    reconcile::DeltaPolicy,
};

/// Default poll interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
/// Default scrape timeout
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Errors produced by [`Config`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Error reading config file
    #[error("Failed to read config file {path:?}: {source}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
    /// No endpoint given anywhere
    #[error(
        "Must specify an endpoint to scrape, e.g. --endpoint http://localhost:9090/metrics"
    )]
    MissingEndpoint,
    /// A label filter is not in `name=value` form
    #[error(transparent)]
    LabelFilter(#[from] filter::Error),
    /// Poll interval of zero
    #[error("Poll interval must be greater than zero")]
    ZeroInterval,
    /// Scrape timeout of zero
    #[error("Scrape timeout must be greater than zero")]
    ZeroScrapeTimeout,
    /// Page size of zero
    #[error("Page size must be greater than zero")]
    ZeroPageSize,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "snake_case")]
/// Unvalidated configuration, as read from a file or the command line
pub struct Config {
    /// Metrics endpoint to poll
    pub endpoint: Option<String>,
    /// Poll interval
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    /// Per scrape timeout
    #[serde(default, with = "humantime_serde")]
    pub scrape_timeout: Option<Duration>,
    /// Show metrics whose name contains any of these
    #[serde(default)]
    pub include: Vec<String>,
    /// Hide metrics whose name contains any of these
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Show only metrics carrying all of these `name=value` labels
    #[serde(default)]
    pub labels: Vec<String>,
    /// Graph the selected series
    #[serde(default)]
    pub show_graph: bool,
    /// Rows per page
    pub page_size: Option<usize>,
    /// Zero delta behavior for counters
    pub delta_policy: Option<DeltaPolicy>,
}

impl Config {
    /// Read a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Function will error if the file cannot be read or is not valid
    /// configuration.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse YAML configuration.
    ///
    /// # Errors
    ///
    /// Function will error if `contents` is not valid configuration.
    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Layer `overrides` on top of `self`. Set values and non-empty lists in
    /// `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Config) -> Self {
        fn list(base: Vec<String>, over: Vec<String>) -> Vec<String> {
            if over.is_empty() { base } else { over }
        }
        Self {
            endpoint: overrides.endpoint.or(self.endpoint),
            interval: overrides.interval.or(self.interval),
            scrape_timeout: overrides.scrape_timeout.or(self.scrape_timeout),
            include: list(self.include, overrides.include),
            exclude: list(self.exclude, overrides.exclude),
            labels: list(self.labels, overrides.labels),
            show_graph: self.show_graph || overrides.show_graph,
            page_size: overrides.page_size.or(self.page_size),
            delta_policy: overrides.delta_policy.or(self.delta_policy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated configuration
pub struct Settings {
    /// Metrics endpoint to poll
    pub endpoint: String,
    /// Poll interval
    pub interval: Duration,
    /// Per scrape timeout
    pub scrape_timeout: Duration,
    /// Active filter
    pub filter: Filter,
    /// Graph the selected series
    pub show_graph: bool,
    /// Rows per page
    pub page_size: NonZeroUsize,
    /// Zero delta behavior for counters
    pub delta_policy: DeltaPolicy,
}

impl TryFrom<Config> for Settings {
    type Error = Error;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let endpoint = config
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or(Error::MissingEndpoint)?;

        let interval = config.interval.unwrap_or(DEFAULT_INTERVAL);
        if interval.is_zero() {
            return Err(Error::ZeroInterval);
        }
        let scrape_timeout = config.scrape_timeout.unwrap_or(DEFAULT_SCRAPE_TIMEOUT);
        if scrape_timeout.is_zero() {
            return Err(Error::ZeroScrapeTimeout);
        }
        let page_size = NonZeroUsize::new(config.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
            .ok_or(Error::ZeroPageSize)?;

        let labels = config
            .labels
            .iter()
            .map(|raw| raw.parse::<LabelFilter>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            endpoint,
            interval,
            scrape_timeout,
            filter: Filter::new(config.include, config.exclude, labels),
            show_graph: config.show_graph,
            page_size,
            delta_policy: config.delta_policy.unwrap_or_default(),
        })
    }
}
