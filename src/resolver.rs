use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{
    config::Endpoints,
    error::{ResolveError, Result},
    transport::Transport,
};

/// A live channel and the stream URLs it may be reachable at, in the API's order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub title: String,
    pub streams: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelServer {
    title_channel: String,
    url_stream: String,
}

/// Looks up the stream candidates of a station through the channel metadata API
#[derive(Debug, Clone)]
pub struct ChannelResolver {
    transport: Transport,
    endpoints: Endpoints,
}

impl ChannelResolver {
    #[must_use]
    pub const fn new(transport: Transport, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Resolves a station page URL into a channel record
    ///
    /// Returns `None` when the API reports the channel as not live
    ///
    /// # Errors
    /// * [`ResolveError::ApiUnavailable`] if the API can't be reached or answers non-2xx
    /// * [`ResolveError::MalformedResponse`] if the body doesn't match the expected schema
    #[instrument(skip(self))]
    pub async fn resolve(&self, station_url: &str) -> Result<Option<ChannelRecord>> {
        let station = station_id(station_url).to_string();
        let fetched = self
            .transport
            .fetch(&self.endpoints.channel_api_url(&station), true)
            .await;
        if !fetched.is_success() {
            return Err(ResolveError::ApiUnavailable {
                station,
                reason: fetched.describe(),
            });
        }

        let body = fetched.into_body().unwrap_or_default();
        let record = parse_channel(&body).map_err(|reason| ResolveError::MalformedResponse {
            station: station.clone(),
            reason,
        })?;

        if record.is_none() {
            debug!("Station {station} is not live");
        }
        Ok(record)
    }
}

/// Trailing path segment of a station page URL, e.g. `120` for `https://101.ru/radio/channel/120`
#[must_use]
pub fn station_id(station_url: &str) -> &str {
    station_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Drops the `?query` part of a stream URL
#[must_use]
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Maps a channel metadata body into a record. `Ok(None)` means "not live"
fn parse_channel(body: &str) -> std::result::Result<Option<ChannelRecord>, String> {
    // `{status, result}` object. `status` is `1` when the channel is on air and is left untyped
    // since inactive channels send all sorts of things
    let mut servers =
        serde_json::from_str::<Map<String, Value>>(body).map_err(|e| e.to_string())?;
    if servers.get("status").and_then(Value::as_i64) != Some(1) {
        return Ok(None);
    }

    let result = servers.remove("result").unwrap_or_default();
    let items = serde_json::from_value::<Vec<ChannelServer>>(result)
        .map_err(|e| format!("`result`: {e}"))?;
    let Some(first) = items.first() else {
        return Err("`result` holds no stream for a live channel".to_string());
    };

    Ok(Some(ChannelRecord {
        title: first.title_channel.clone(),
        streams: items
            .iter()
            .map(|i| strip_query(&i.url_stream).to_string())
            .collect(),
    }))
}
