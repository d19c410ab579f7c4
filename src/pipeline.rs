use std::fmt;

use futures_util::StreamExt as _;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, instrument, warn};

use crate::{
    catalog::{GenreCatalog, GenreEntry},
    config::HarvestConfig,
    directory::StationDirectory,
    error::{ResolveError, Result},
    playlist::Playlist,
    resolver::ChannelResolver,
    transport::Transport,
    util::init_http_client,
    validator::{StreamValidator, ValidatedChannel},
};

/// What happened to a single station
#[derive(Debug)]
enum StationOutcome {
    Listed(ValidatedChannel),
    /// The API reported the channel as off air
    Inactive,
    /// Live, but none of its streams answered
    Unreachable,
    /// Metadata lookup failed, already logged
    Failed(ResolveError),
}

/// Tally of a harvest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub stations: usize,
    pub listed: usize,
    pub inactive: usize,
    pub unreachable: usize,
    /// Channel API unreachable or answering non-2xx
    pub api_unavailable: usize,
    /// Channel API answered with a body that doesn't match the schema
    pub malformed: usize,
}

impl HarvestReport {
    /// Stations skipped because their metadata lookup failed
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.api_unavailable + self.malformed
    }

    fn record_failure(&mut self, e: &ResolveError) {
        match e {
            ResolveError::MalformedResponse { .. } => self.malformed += 1,
            ResolveError::StreamUnreachable { .. } => self.unreachable += 1,
            ResolveError::ApiUnavailable { .. }
            | ResolveError::SourceUnavailable { .. }
            | ResolveError::ParseEmpty { .. } => self.api_unavailable += 1,
        }
    }
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} stations listed ({} off air, {} without a reachable stream, {} with the channel API unavailable, {} with malformed metadata)",
            self.listed,
            self.stations,
            self.inactive,
            self.unreachable,
            self.api_unavailable,
            self.malformed
        )
    }
}

#[derive(Debug, Clone)]
pub struct Harvest {
    pub playlist: Playlist,
    pub report: HarvestReport,
}

/// Runs the whole genre → stations → channels → streams resolution
#[derive(Debug, Clone)]
pub struct Harvester {
    catalog: GenreCatalog,
    directory: StationDirectory,
    resolver: ChannelResolver,
    validator: StreamValidator,
    parallelism: usize,
    show_progress: bool,
}

impl Harvester {
    #[must_use]
    pub fn new(config: HarvestConfig) -> Self {
        Self::with_client(init_http_client(), config)
    }

    /// Builds every stage on top of an existing HTTP client
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: HarvestConfig) -> Self {
        let transport = Transport::new(client, config.timeout, config.probe_method);
        let endpoints = config.endpoints;

        Self {
            catalog: GenreCatalog::new(
                transport.clone(),
                endpoints.genres_url.clone(),
                endpoints.site_origin.clone(),
            ),
            directory: StationDirectory::new(transport.clone(), endpoints.site_origin.clone()),
            resolver: ChannelResolver::new(transport.clone(), endpoints),
            validator: StreamValidator::new(transport),
            parallelism: config.parallelism.max(1),
            show_progress: config.show_progress,
        }
    }

    /// Lists the genres available in the catalog
    ///
    /// # Errors
    /// See [`GenreCatalog::list`]
    pub async fn genres(&self) -> Result<Vec<GenreEntry>> {
        self.catalog.list().await
    }

    /// Builds the playlist of a genre
    ///
    /// Stations are resolved and validated independently, `parallelism` at a time. Entries are
    /// listed in the order stations finish, which is the station order when run one at a time
    ///
    /// # Errors
    /// Only errors when the genre page itself can't be listed. Per-station failures are logged
    /// and counted in the report
    #[instrument(skip(self))]
    pub async fn harvest(&self, genre_url: &str) -> Result<Harvest> {
        let stations = self.directory.list_stations(genre_url).await?;
        info!(
            "Checking {} stations with {} parallelism",
            stations.len(),
            self.parallelism
        );

        let pb = self.progress_bar(stations.len() as u64);
        let outcomes = futures_util::stream::iter(&stations)
            .map(|station_url| self.process_station(station_url))
            .buffer_unordered(self.parallelism)
            .inspect(|_| pb.inc(1))
            .collect::<Vec<_>>()
            .await;
        pb.finish_and_clear();

        let mut report = HarvestReport {
            stations: stations.len(),
            ..HarvestReport::default()
        };
        let mut validated = Vec::new();
        for outcome in outcomes {
            match outcome {
                StationOutcome::Listed(channel) => {
                    report.listed += 1;
                    validated.push(channel);
                }
                StationOutcome::Inactive => report.inactive += 1,
                StationOutcome::Unreachable => report.unreachable += 1,
                StationOutcome::Failed(e) => report.record_failure(&e),
            }
        }

        info!("{report}");
        Ok(Harvest {
            playlist: Playlist::assemble(validated),
            report,
        })
    }

    async fn process_station(&self, station_url: &str) -> StationOutcome {
        let record = match self.resolver.resolve(station_url).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                debug!("{station_url} is off air, skipping");
                return StationOutcome::Inactive;
            }
            Err(e) => {
                warn!("Skipping {station_url}: {e}");
                return StationOutcome::Failed(e);
            }
        };

        match self.validator.validate(&record).await {
            Some(channel) => StationOutcome::Listed(channel),
            None => StationOutcome::Unreachable,
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} stations")
        {
            pb.set_style(style);
        }
        pb
    }
}
