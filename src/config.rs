use std::time::Duration;

use url::Url;

pub const DEFAULT_SITE_ORIGIN: &str = "https://101.ru";
pub const DEFAULT_GENRES_URL: &str = "https://101.ru/radio-top";
pub const DEFAULT_API_BASE: &str = "https://101.ru/api/channel/getListServersChannel";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PARALLELISM: usize = 1;

/// HTTP method used when checking whether a stream candidate is alive
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProbeMethod {
    /// Opens the stream and drops it once headers arrive. Works with most Icecast / Shoutcast servers
    #[default]
    Get,
    /// Cheaper, but plenty of streaming servers answer `HEAD` with 4xx
    Head,
}

/// Where the catalog lives
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Origin every relative link on the listing pages is resolved against
    pub site_origin: Url,
    pub genres_url: String,
    /// Channel metadata endpoint, queried as `{api_base}/{station_id}/channel/`
    pub api_base: String,
}

impl Endpoints {
    /// # Errors
    /// Errors when `site_origin` is not an absolute URL
    pub fn new(
        site_origin: &str,
        genres_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            site_origin: Url::parse(site_origin)?,
            genres_url: genres_url.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn channel_api_url(&self, station_id: &str) -> String {
        format!("{}/{station_id}/channel/", self.api_base)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            site_origin: Url::parse(DEFAULT_SITE_ORIGIN).expect("default origin is a valid URL"),
            genres_url: DEFAULT_GENRES_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub endpoints: Endpoints,
    /// Applies to every single network call, not to a whole stage
    pub timeout: Duration,
    /// Stations resolved and validated at once
    pub parallelism: usize,
    pub probe_method: ProbeMethod,
    pub show_progress: bool,
}

impl HarvestConfig {
    #[must_use]
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            ..Self::default()
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            parallelism: DEFAULT_PARALLELISM,
            probe_method: ProbeMethod::default(),
            show_progress: false,
        }
    }
}
