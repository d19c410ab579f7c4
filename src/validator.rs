use reqwest::Url;
use tracing::{debug, instrument, warn};

use crate::{error::ResolveError, resolver::ChannelRecord, transport::Transport};

/// A channel together with the stream that answered first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedChannel {
    pub title: String,
    pub active_stream: String,
}

/// Picks a working stream out of a channel's candidates
#[derive(Debug, Clone)]
pub struct StreamValidator {
    transport: Transport,
}

impl StreamValidator {
    #[must_use]
    pub const fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Probes the candidates in order and stops at the first one answering `200 OK`
    ///
    /// Returns `None` (and reports it) when no candidate answered
    #[instrument(skip(self, channel), fields(channel = %channel.title))]
    pub async fn validate(&self, channel: &ChannelRecord) -> Option<ValidatedChannel> {
        for stream in &channel.streams {
            if !is_http_url(stream) {
                debug!("Skipping non-HTTP candidate {stream}");
                continue;
            }

            let fetched = self.transport.probe(stream).await;
            if fetched.is_ok() {
                debug!("{stream} is live");
                return Some(ValidatedChannel {
                    title: channel.title.clone(),
                    active_stream: stream.clone(),
                });
            }
            debug!("{stream} is not answering: {fetched}");
        }

        warn!(
            "{}",
            ResolveError::StreamUnreachable {
                title: channel.title.clone()
            }
        );
        None
    }
}

fn is_http_url(candidate: &str) -> bool {
    Url::parse(candidate).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}
