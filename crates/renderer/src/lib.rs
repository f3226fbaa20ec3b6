use gpmdp_status_core::template::substitute;
use gpmdp_status_core::{ModuleConfig, Palette, PlaybackSnapshot, PlaybackState};
use gpmdp_status_reader::StateReader;
use serde::{Deserialize, Serialize};
use tracing::debug;

const TEXT_PAUSE_DEFAULT: &str = "Player paused";
const TEXT_STOP_DEFAULT: &str = "Player stopped";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBlock {
    pub text: String,
    pub color: String,
}

pub struct StatusRenderer {
    config: ModuleConfig,
    palette: Palette,
    reader: StateReader,
    last_good: Option<PlaybackSnapshot>,
}

impl StatusRenderer {
    pub fn new(config: ModuleConfig, palette: Palette) -> Self {
        let reader = StateReader::new(config.path.clone());
        Self {
            config,
            palette,
            reader,
            last_good: None,
        }
    }

    /// Swap configuration without dropping the cached snapshot.
    pub fn update_config(&mut self, config: ModuleConfig, palette: Palette) {
        self.reader = StateReader::new(config.path.clone());
        self.config = config;
        self.palette = palette;
    }

    pub fn render(&mut self) -> StatusBlock {
        let current = match self.reader.read() {
            Ok(snapshot) => {
                self.last_good = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(err) => {
                debug!(error = %err, "state read failed, reusing cached snapshot");
                self.last_good.clone()
            }
        };

        let state = classify(current.as_ref());
        let block = match (state, current) {
            (PlaybackState::Playing, Some(snapshot)) => self.playing_block(&snapshot),
            (PlaybackState::Paused, Some(snapshot)) => self.paused_block(&snapshot),
            _ => self.stopped_block(),
        };
        debug!(state = ?state, text = %block.text, "rendered status");
        block
    }

    fn playing_block(&self, snapshot: &PlaybackSnapshot) -> StatusBlock {
        let fields = DerivedFields::from_snapshot(snapshot);
        let icon = self.icon_for(PlaybackState::Playing);
        let vars = track_vars(snapshot, &fields, icon);
        StatusBlock {
            text: substitute(&self.config.format_play, &vars),
            color: self
                .config
                .color_play
                .clone()
                .unwrap_or_else(|| self.palette.good.clone()),
        }
    }

    fn paused_block(&self, snapshot: &PlaybackSnapshot) -> StatusBlock {
        let fields = DerivedFields::from_snapshot(snapshot);
        let icon = self.icon_for(PlaybackState::Paused);
        let text = self
            .config
            .text_pause
            .as_deref()
            .unwrap_or(TEXT_PAUSE_DEFAULT);
        let mut vars = track_vars(snapshot, &fields, icon);
        vars.push(("text", text));
        StatusBlock {
            text: substitute(&self.config.format_pause, &vars),
            color: self
                .config
                .color_pause
                .clone()
                .unwrap_or_else(|| self.palette.degraded.clone()),
        }
    }

    fn stopped_block(&self) -> StatusBlock {
        let icon = self.icon_for(PlaybackState::Stopped);
        let text = self
            .config
            .text_stop
            .as_deref()
            .unwrap_or(TEXT_STOP_DEFAULT);
        let vars = [("icon", icon), ("text", text)];
        StatusBlock {
            text: substitute(&self.config.format_stop, &vars),
            color: self
                .config
                .color_stop
                .clone()
                .unwrap_or_else(|| self.palette.bad.clone()),
        }
    }

    fn icon_for(&self, state: PlaybackState) -> &str {
        let specific = match state {
            PlaybackState::Playing => self.config.icon_play.as_deref(),
            PlaybackState::Paused => self.config.icon_pause.as_deref(),
            PlaybackState::Stopped => self.config.icon_stop.as_deref(),
        };
        specific.unwrap_or(&self.config.icon)
    }
}

struct DerivedFields {
    percentage: String,
    current_time: String,
    total_time: String,
}

impl DerivedFields {
    fn from_snapshot(snapshot: &PlaybackSnapshot) -> Self {
        Self {
            percentage: format_percentage(completion_percentage(
                snapshot.current_us as f64,
                snapshot.total_us as f64,
            )),
            current_time: format_duration_us(snapshot.current_us),
            total_time: format_duration_us(snapshot.total_us),
        }
    }
}

fn track_vars<'a>(
    snapshot: &'a PlaybackSnapshot,
    fields: &'a DerivedFields,
    icon: &'a str,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("title", snapshot.title.as_deref().unwrap_or("")),
        ("artist", snapshot.artist.as_deref().unwrap_or("")),
        ("album", snapshot.album.as_deref().unwrap_or("")),
        ("liked", snapshot.like.as_str()),
        ("current_time", fields.current_time.as_str()),
        ("total_time", fields.total_time.as_str()),
        ("percentage", fields.percentage.as_str()),
        ("icon", icon),
    ]
}

pub fn classify(snapshot: Option<&PlaybackSnapshot>) -> PlaybackState {
    match snapshot {
        Some(snap) if snap.has_track() => {
            if snap.is_playing {
                PlaybackState::Playing
            } else {
                PlaybackState::Paused
            }
        }
        _ => PlaybackState::Stopped,
    }
}

/// Zero whenever the ratio is meaningless: either value zero, or not finite.
pub fn completion_percentage(current: f64, total: f64) -> f64 {
    if !current.is_finite() || !total.is_finite() {
        return 0.0;
    }
    if current * total == 0.0 {
        return 0.0;
    }
    (current / total * 100.0).clamp(0.0, 100.0)
}

pub fn format_percentage(value: f64) -> String {
    let mut text = format!("{value:.2}");
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text.push('%');
    text
}

pub fn format_duration_us(us: u64) -> String {
    let total_secs = us / 1_000_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
