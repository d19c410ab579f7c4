//! Failure kinds of a harvest run
//!
//! `SourceUnavailable` and `ParseEmpty` abort the run since there is nothing to resolve without a
//! catalog. `ApiUnavailable` and `MalformedResponse` only skip the station they belong to.
//! `StreamUnreachable` is expected in normal operation and is only ever reported.

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A listing page answered with a non-2xx status or could not be reached
    #[error("Source unavailable: {url} ({reason})")]
    SourceUnavailable { url: String, reason: String },

    /// A listing page was fetched but none of the expected links were on it.
    /// Usually means the page layout changed upstream
    #[error("No entries found on {url}, the page structure may have changed")]
    ParseEmpty { url: String },

    /// The channel metadata endpoint answered with a non-2xx status or could not be reached
    #[error("Channel API unavailable for station {station}: {reason}")]
    ApiUnavailable { station: String, reason: String },

    /// The channel metadata body did not match the expected schema
    #[error("Malformed channel metadata for station {station}: {reason}")]
    MalformedResponse { station: String, reason: String },

    /// None of the channel's stream candidates answered
    #[error("No reachable stream for channel {title}")]
    StreamUnreachable { title: String },
}

impl ResolveError {
    /// Whether the whole run has to stop on this error
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. } | Self::ParseEmpty { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_catalog_errors_are_fatal() {
        let url = "https://example.com".to_string();
        assert!(ResolveError::SourceUnavailable { url: url.clone(), reason: String::new() }.is_fatal());
        assert!(ResolveError::ParseEmpty { url }.is_fatal());

        let station = "42".to_string();
        assert!(!ResolveError::ApiUnavailable { station: station.clone(), reason: String::new() }.is_fatal());
        assert!(!ResolveError::MalformedResponse { station, reason: String::new() }.is_fatal());
        assert!(!ResolveError::StreamUnreachable { title: "Jazz".into() }.is_fatal());
    }
}
