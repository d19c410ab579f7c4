use std::{collections::BTreeSet, sync::LazyLock};

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::{
    error::{ResolveError, Result},
    transport::Transport,
    util::resolve_site_link,
};

static STATION_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.grid li a[href]").unwrap());

/// Lists the stations of a genre page
#[derive(Debug, Clone)]
pub struct StationDirectory {
    transport: Transport,
    site_origin: Url,
}

impl StationDirectory {
    #[must_use]
    pub const fn new(transport: Transport, site_origin: Url) -> Self {
        Self {
            transport,
            site_origin,
        }
    }

    /// Fetches a genre page and returns the absolute URLs of every station it links to
    ///
    /// # Errors
    /// * [`ResolveError::SourceUnavailable`] if the page can't be fetched
    /// * [`ResolveError::ParseEmpty`] if the page holds no station link
    #[instrument(skip(self))]
    pub async fn list_stations(&self, genre_url: &str) -> Result<BTreeSet<String>> {
        let fetched = self.transport.fetch(genre_url, true).await;
        if !fetched.is_success() {
            return Err(ResolveError::SourceUnavailable {
                url: genre_url.to_string(),
                reason: fetched.describe(),
            });
        }

        let html = fetched.into_body().unwrap_or_default();
        let stations = parse_stations(&html, &self.site_origin);
        if stations.is_empty() {
            return Err(ResolveError::ParseEmpty {
                url: genre_url.to_string(),
            });
        }

        debug!("Found {} stations", stations.len());
        Ok(stations)
    }
}

/// Extracts station URLs out of a genre page. Duplicate links collapse into one
#[must_use]
pub fn parse_stations(html: &str, site_origin: &Url) -> BTreeSet<String> {
    let document = Html::parse_document(html);

    document
        .select(&STATION_LINKS)
        .filter_map(|a| resolve_site_link(site_origin, a.value().attr("href")?))
        .collect()
}
