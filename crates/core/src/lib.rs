pub mod config;
pub mod model;
pub mod template;

pub use config::{AppConfig, ModuleConfig, Palette};
pub use model::{LikeState, PlaybackSnapshot, PlaybackState};
