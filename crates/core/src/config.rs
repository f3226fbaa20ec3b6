use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub path: PathBuf,
    pub format_play: String,
    pub format_pause: String,
    pub format_stop: String,
    pub text_pause: Option<String>,
    pub text_stop: Option<String>,
    pub icon: String,
    pub icon_play: Option<String>,
    pub icon_pause: Option<String>,
    pub icon_stop: Option<String>,
    pub color_play: Option<String>,
    pub color_pause: Option<String>,
    pub color_stop: Option<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(
                "~/.config/Google Play Music Desktop Player/json_store/playback.json",
            ),
            format_play: "{icon} {title} {album}/{artist} ({percentage})".to_string(),
            format_pause: "{icon} {text}".to_string(),
            format_stop: "{icon} {text}".to_string(),
            text_pause: None,
            text_stop: None,
            icon: "\u{266B}".to_string(),
            icon_play: None,
            icon_pause: None,
            icon_stop: None,
            color_play: None,
            color_pause: None,
            color_stop: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub good: String,
    pub degraded: String,
    pub bad: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            good: "#00FF00".to_string(),
            degraded: "#FFFF00".to_string(),
            bad: "#FF0000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub schema_version: u32,
    pub log_level: String,
    pub interval_secs: u64,
    pub module: ModuleConfig,
    pub palette: Palette,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            log_level: "info".to_string(),
            interval_secs: 10,
            module: ModuleConfig::default(),
            palette: Palette::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn defaults_cover_every_placeholder_source() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.schema_version, 1);
        assert_eq!(cfg.interval_secs, 10);
        assert_eq!(cfg.module.icon, "\u{266B}");
        assert_eq!(
            cfg.module.format_play,
            "{icon} {title} {album}/{artist} ({percentage})"
        );
        assert_eq!(cfg.module.format_pause, "{icon} {text}");
        assert_eq!(cfg.palette.good, "#00FF00");
        assert_eq!(cfg.palette.degraded, "#FFFF00");
        assert_eq!(cfg.palette.bad, "#FF0000");
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let cfg: AppConfig = toml::from_str(
            r##"
interval_secs = 3

[module]
path = "/tmp/playback.json"
color_play = "#AABBCC"
"##,
        )
        .unwrap();
        assert_eq!(cfg.interval_secs, 3);
        assert_eq!(cfg.module.path.to_str(), Some("/tmp/playback.json"));
        assert_eq!(cfg.module.color_play.as_deref(), Some("#AABBCC"));
        assert_eq!(cfg.module.format_pause, "{icon} {text}");
        assert_eq!(cfg.palette.bad, "#FF0000");
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let cfg = AppConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.module.format_play, cfg.module.format_play);
        assert_eq!(back.module.path, cfg.module.path);
        assert_eq!(back.palette.degraded, cfg.palette.degraded);
    }
}
