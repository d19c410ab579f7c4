#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::Parser;
use radio_sieve::{
    Endpoints, GenreEntry, HarvestConfig, Harvester, ProbeMethod,
    config::{
        DEFAULT_API_BASE, DEFAULT_GENRES_URL, DEFAULT_PARALLELISM, DEFAULT_SITE_ORIGIN,
        DEFAULT_TIMEOUT_SECS,
    },
    playlist_file_name,
    util::warn_ulimit,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Builds an M3U playlist of the currently reachable radio streams of a genre
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Index of the genre to build a playlist for. Asked interactively when omitted
    #[arg(short, long)]
    genre: Option<usize>,

    /// Only print the available genres
    #[arg(short, long)]
    list: bool,

    /// Playlist file to write [default: `<genre title>.m3u`]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Timeout of every single request, in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// The amount of stations checked at once
    #[arg(short, long, default_value_t = DEFAULT_PARALLELISM)]
    parallelism: usize,

    /// HTTP method used to check whether a stream is alive
    #[arg(long, value_enum, default_value_t = ProbeMethod::Get)]
    probe_method: ProbeMethod,

    /// Shows a progress bar while stations are checked
    #[arg(long)]
    progress: bool,

    /// Origin relative catalog links are resolved against
    #[arg(long, env = "RADIO_SIEVE_SITE_ORIGIN", default_value = DEFAULT_SITE_ORIGIN)]
    site_origin: String,

    /// Page listing the genres
    #[arg(long, env = "RADIO_SIEVE_GENRES_URL", default_value = DEFAULT_GENRES_URL)]
    genres_url: String,

    /// Channel metadata endpoint
    #[arg(long, env = "RADIO_SIEVE_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    warn_ulimit(args.parallelism);

    let endpoints = Endpoints::new(&args.site_origin, args.genres_url, args.api_base)
        .context("Parsing site origin")?;
    let harvester = Harvester::new(HarvestConfig {
        endpoints,
        timeout: Duration::from_secs(args.timeout),
        parallelism: args.parallelism,
        probe_method: args.probe_method,
        show_progress: args.progress,
    });

    let genres = harvester.genres().await.context("Listing genres")?;
    for (idx, genre) in genres.iter().enumerate() {
        println!("[{idx:>3} ] {}", genre.title);
    }
    if args.list {
        return Ok(());
    }

    let index = match args.genre {
        Some(i) => i,
        None => prompt_genre_index().await?,
    };
    let genre = pick_genre(&genres, index)?;

    info!("Building playlist for genre <{}>", genre.title);
    let harvest = harvester
        .harvest(&genre.url)
        .await
        .with_context(|| format!("Listing stations of <{}>", genre.title))?;
    if harvest.playlist.is_empty() {
        warn!("No station has a reachable stream, writing an empty playlist");
    }

    let out_path = args
        .output
        .unwrap_or_else(|| playlist_file_name(&genre.title));
    harvest
        .playlist
        .write_to(&out_path)
        .await
        .with_context(|| format!("Writing playlist to {}", out_path.display()))?;

    info!(
        "Wrote {} channels to {}",
        harvest.playlist.len(),
        out_path.display()
    );
    info!("All done successfully!");

    Ok(())
}

async fn prompt_genre_index() -> Result<usize> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Pick a genre: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Reading genre index")?;

    line.trim()
        .parse::<usize>()
        .with_context(|| format!("`{}` is not a genre index", line.trim()))
}

fn pick_genre(genres: &[GenreEntry], index: usize) -> Result<&GenreEntry> {
    let Some(genre) = genres.get(index) else {
        bail!(
            "Genre index {index} is out of range, pick one between 0 and {}",
            genres.len().saturating_sub(1)
        );
    };
    Ok(genre)
}
