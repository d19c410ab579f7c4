#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

//! Resolves an online radio catalog (genres, their stations, the stations' stream servers) into
//! an M3U playlist holding only streams that are answering right now

pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod pipeline;
pub mod playlist;
pub mod resolver;
pub mod transport;
pub mod util;
pub mod validator;

pub use catalog::{GenreCatalog, GenreEntry};
pub use config::{Endpoints, HarvestConfig, ProbeMethod};
pub use directory::StationDirectory;
pub use error::ResolveError;
pub use pipeline::{Harvest, HarvestReport, Harvester};
pub use playlist::{Playlist, PlaylistEntry, playlist_file_name};
pub use resolver::{ChannelRecord, ChannelResolver};
pub use transport::{FetchError, Fetched, Transport};
pub use validator::{StreamValidator, ValidatedChannel};
