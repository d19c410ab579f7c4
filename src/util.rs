use reqwest::{
    Url,
    header::{HeaderMap, HeaderValue},
};
use rlimit::Resource;
use tracing::warn;

/// Resolves a link found on a catalog page against the site origin
///
/// Returns `None` for placeholder links (empty or `#`) and for links pointing off-site
#[must_use]
pub fn resolve_site_link(origin: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href == "#" {
        return None;
    }

    let url = origin.join(href).ok()?;
    (url.origin() == origin.origin()).then(|| url.to_string())
}

/// Warns when the open file limit is too low for the amount of sockets a run may hold at once
pub fn warn_ulimit(parallelism: usize) {
    let Ok((limit, _)) = rlimit::getrlimit(Resource::NOFILE) else {
        return;
    };

    let wanted = u64::try_from(parallelism).unwrap_or(u64::MAX).saturating_mul(4);
    if limit <= wanted {
        warn!(
            "Your file limit ({limit}) is low for a parallelism of {parallelism}, which may make stream probes fail spuriously. Consider raising it via `ulimit -n 10240`"
        );
    }
}

/// # Panics
/// Should never panic, the user agent is built from Cargo metadata
#[must_use]
pub fn init_http_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "User-Agent",
        HeaderValue::from_str(&format!(
            "{}/{} (+{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_REPOSITORY")
        ))
        .unwrap(),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .expect("Unable to build HTTP client")
}
