use std::fs;
use std::path::{Path, PathBuf};

use gpmdp_status_core::{LikeState, PlaybackSnapshot};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed playback data in {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Wire shape of GPMDP's json_store/playback.json. Unlisted fields are ignored.
#[derive(Debug, Deserialize)]
struct PlaybackFile {
    song: SongSection,
    time: TimeSection,
    playing: bool,
    rating: RatingSection,
}

#[derive(Debug, Deserialize)]
struct SongSection {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSection {
    current: u64,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct RatingSection {
    liked: bool,
    disliked: bool,
}

impl PlaybackFile {
    fn into_snapshot(self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            title: self.song.title,
            artist: self.song.artist,
            album: self.song.album,
            like: LikeState::from_flags(self.rating.liked, self.rating.disliked),
            current_us: self.time.current,
            total_us: self.time.total,
            is_playing: self.playing,
        }
    }
}

pub struct StateReader {
    path: PathBuf,
}

impl StateReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One blocking read of the state file. Never yields a partial snapshot:
    /// any I/O or shape problem fails the whole read.
    pub fn read(&self) -> Result<PlaybackSnapshot, ReadError> {
        let bytes = fs::read(&self.path).map_err(|source| ReadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: PlaybackFile =
            serde_json::from_slice(&bytes).map_err(|source| ReadError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(file.into_snapshot())
    }
}
