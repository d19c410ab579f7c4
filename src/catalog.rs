use std::sync::LazyLock;

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::{
    error::{ResolveError, Result},
    transport::Transport,
    util::resolve_site_link,
};

static GENRE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.channel-groups li a[href]").unwrap());

/// A genre as listed on the catalog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreEntry {
    pub title: String,
    pub url: String,
}

/// Lists the genres of the catalog, in page order
#[derive(Debug, Clone)]
pub struct GenreCatalog {
    transport: Transport,
    genres_url: String,
    site_origin: Url,
}

impl GenreCatalog {
    #[must_use]
    pub const fn new(transport: Transport, genres_url: String, site_origin: Url) -> Self {
        Self {
            transport,
            genres_url,
            site_origin,
        }
    }

    /// Fetches the genre listing page
    ///
    /// # Errors
    /// * [`ResolveError::SourceUnavailable`] if the page can't be fetched
    /// * [`ResolveError::ParseEmpty`] if the page holds no usable genre link
    #[instrument(skip(self), fields(url = %self.genres_url))]
    pub async fn list(&self) -> Result<Vec<GenreEntry>> {
        let fetched = self.transport.fetch(&self.genres_url, true).await;
        if !fetched.is_success() {
            return Err(ResolveError::SourceUnavailable {
                url: self.genres_url.clone(),
                reason: fetched.describe(),
            });
        }

        let html = fetched.into_body().unwrap_or_default();
        let genres = parse_genres(&html, &self.site_origin);
        if genres.is_empty() {
            return Err(ResolveError::ParseEmpty {
                url: self.genres_url.clone(),
            });
        }

        debug!("Found {} genres", genres.len());
        Ok(genres)
    }
}

/// Extracts genre entries out of the listing markup, keeping page order
#[must_use]
pub fn parse_genres(html: &str, site_origin: &Url) -> Vec<GenreEntry> {
    let document = Html::parse_document(html);

    document
        .select(&GENRE_LINKS)
        .filter_map(|a| {
            let url = resolve_site_link(site_origin, a.value().attr("href")?)?;
            let title = a.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some(GenreEntry { title, url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indoc::indoc;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::config::ProbeMethod;

    const LISTING: &str = indoc! {r##"
        <html><body>
          <ul class="menu"><li><a href="/about">About</a></li></ul>
          <ul class="channel-groups">
            <li><a href="#">Все жанры</a></li>
            <li><a href="/radio-top/group/4"> Поп </a></li>
            <li><a href="">Empty</a></li>
            <li><a href="/radio-top/group/7">Рок</a></li>
            <li><a href="/radio-top/group/9"><span>Jazz</span> &amp; Blues</a></li>
            <li><a href="/radio-top/group/10">   </a></li>
            <li><a>No target</a></li>
          </ul>
        </body></html>
    "##};

    fn origin() -> Url {
        Url::parse("https://101.ru").unwrap()
    }

    #[test]
    fn parses_genres_in_page_order() {
        let genres = parse_genres(LISTING, &origin());

        assert_eq!(
            genres,
            vec![
                GenreEntry {
                    title: "Поп".into(),
                    url: "https://101.ru/radio-top/group/4".into()
                },
                GenreEntry {
                    title: "Рок".into(),
                    url: "https://101.ru/radio-top/group/7".into()
                },
                GenreEntry {
                    title: "Jazz & Blues".into(),
                    url: "https://101.ru/radio-top/group/9".into()
                },
            ]
        );
    }

    #[test]
    fn every_entry_is_absolute_and_titled() {
        for genre in parse_genres(LISTING, &origin()) {
            assert!(genre.url.starts_with("https://101.ru/"));
            assert!(!genre.title.trim().is_empty());
            assert!(!genre.url.ends_with('#'));
        }
    }

    #[test]
    fn other_lists_are_ignored() {
        let html = r#"<ul class="menu"><li><a href="/about">About</a></li></ul>"#;
        assert!(parse_genres(html, &origin()).is_empty());
    }

    fn catalog_for(server: &MockServer) -> GenreCatalog {
        let transport = Transport::new(
            reqwest::Client::new(),
            Duration::from_secs(5),
            ProbeMethod::Get,
        );
        GenreCatalog::new(
            transport,
            format!("{}/radio-top", server.uri()),
            Url::parse(&server.uri()).unwrap(),
        )
    }

    #[tokio::test]
    async fn lists_genres_from_the_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/radio-top"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;

        let genres = catalog_for(&server).list().await.unwrap();

        assert_eq!(genres.len(), 3);
        assert_eq!(genres[0].url, format!("{}/radio-top/group/4", server.uri()));
    }

    #[tokio::test]
    async fn unavailable_listing_is_source_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = catalog_for(&server).list().await.unwrap_err();

        assert!(
            matches!(&err, ResolveError::SourceUnavailable { reason, .. } if reason.contains("503"))
        );
    }

    #[tokio::test]
    async fn changed_layout_is_parse_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let err = catalog_for(&server).list().await.unwrap_err();

        assert!(matches!(err, ResolveError::ParseEmpty { .. }));
    }
}
