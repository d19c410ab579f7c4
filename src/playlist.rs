use std::{
    fmt::{self, Write as _},
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::validator::ValidatedChannel;

pub const M3U_HEADER: &str = "#EXTM3U";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// Position in the playlist. Written where M3U expects a duration, players ignore it
    pub index: usize,
    pub title: String,
    pub stream: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    pub entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Numbers validated channels in arrival order, starting at 0
    #[must_use]
    pub fn assemble(validated: impl IntoIterator<Item = ValidatedChannel>) -> Self {
        let entries = validated
            .into_iter()
            .enumerate()
            .map(|(index, channel)| PlaylistEntry {
                index,
                title: channel.title,
                stream: channel.active_stream,
            })
            .collect();

        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the playlist file contents
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Writes the playlist to `path`, replacing any existing file
    ///
    /// # Errors
    /// Errors when the file can't be written
    #[instrument(skip(self))]
    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, self.render()).await
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{M3U_HEADER}")?;
        for entry in &self.entries {
            writeln!(f, "#EXTINF: {}, {}", entry.index, entry.title)?;
            f.write_str(&entry.stream)?;
            f.write_char('\n')?;
        }
        Ok(())
    }
}

/// `<genre title>.m3u`, as is. Titles containing path separators are not escaped
#[must_use]
pub fn playlist_file_name(genre_title: &str) -> PathBuf {
    PathBuf::from(format!("{genre_title}.m3u"))
}
