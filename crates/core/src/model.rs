use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Disliked,
    Neutral,
}

impl LikeState {
    pub fn from_flags(liked: bool, disliked: bool) -> Self {
        if liked {
            LikeState::Liked
        } else if disliked {
            LikeState::Disliked
        } else {
            LikeState::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LikeState::Liked => "liked",
            LikeState::Disliked => "disliked",
            LikeState::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for LikeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub like: LikeState,
    pub current_us: u64,
    pub total_us: u64,
    pub is_playing: bool,
}

impl PlaybackSnapshot {
    /// A missing or empty title means the player holds no active track.
    pub fn has_track(&self) -> bool {
        self.title.as_deref().is_some_and(|title| !title.is_empty())
    }
}
