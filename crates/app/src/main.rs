use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gpmdp_status_core::AppConfig;
use gpmdp_status_i3bar::BarWriter;
use gpmdp_status_reader::StateReader;
use gpmdp_status_renderer::{classify, StatusRenderer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

const SLEEP_SLICE: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(
    name = "gpmdp-status",
    about = "GPMDP playback state -> one-line status for i3bar"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Once {
        #[arg(long)]
        i3blocks: bool,
    },
    Doctor,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor(&cfg, &cfg_path)
        }
        Commands::Once { i3blocks } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            once(cfg, i3blocks)
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg, cfg_path)
        }
    }
}

fn run(cfg: AppConfig, cfg_path: PathBuf) -> Result<()> {
    let mut renderer = StatusRenderer::new(cfg.module.clone(), cfg.palette.clone());
    let mut interval = poll_interval(&cfg);

    let stdout = std::io::stdout();
    let mut bar = BarWriter::new(stdout.lock());
    bar.write_header().context("failed to write i3bar header")?;

    let signals = SignalFlags::register();
    let mut cfg_mtime = file_mtime(&cfg_path);

    info!(
        state_file = %cfg.module.path.display(),
        interval_secs = cfg.interval_secs,
        "gpmdp-status started"
    );

    loop {
        let block = renderer.render();
        bar.write_status(&block)
            .context("failed to write status line")?;

        if sleep_until_next_tick(interval, &signals) {
            info!("received termination signal, shutting down");
            return Ok(());
        }

        let current = file_mtime(&cfg_path);
        if current.is_some() && current != cfg_mtime {
            cfg_mtime = current;
            match load_or_default(&cfg_path) {
                Ok(new_cfg) => {
                    interval = poll_interval(&new_cfg);
                    renderer.update_config(new_cfg.module, new_cfg.palette);
                    info!("configuration reloaded");
                }
                Err(err) => {
                    error!(error = %err, "failed to reload config");
                }
            }
        }
    }
}

fn once(cfg: AppConfig, i3blocks: bool) -> Result<()> {
    let mut renderer = StatusRenderer::new(cfg.module, cfg.palette);
    let block = renderer.render();
    if i3blocks {
        println!("{}", block.text);
        println!("{}", block.text);
        println!("{}", block.color);
    } else {
        println!("{}", block.text);
    }
    Ok(())
}

fn doctor(cfg: &AppConfig, cfg_path: &Path) -> Result<()> {
    println!("== gpmdp-status doctor ==");
    println!(
        "Config file: {} ({})",
        cfg_path.display(),
        if cfg_path.exists() {
            "found"
        } else {
            "missing, using defaults"
        }
    );
    let reader = StateReader::new(cfg.module.path.clone());
    println!("State file: {}", reader.path().display());

    match reader.read() {
        Ok(snapshot) => {
            println!("Read: ok");
            println!("State: {:?}", classify(Some(&snapshot)));
            if let Some(title) = snapshot.title.as_deref() {
                let artist = snapshot.artist.as_deref().unwrap_or("<unknown>");
                println!("Track: {artist} - {title}");
            } else {
                println!("Track: <none>");
            }
        }
        Err(err) => {
            println!("Read: failed");
            println!("Error: {err}");
            if let Some(source) = std::error::Error::source(&err) {
                println!("Caused by: {source}");
            }
        }
    }

    Ok(())
}

struct SignalFlags {
    shutdown: Arc<AtomicBool>,
    refresh: Arc<AtomicBool>,
}

impl SignalFlags {
    fn register() -> Self {
        let flags = Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            refresh: Arc::new(AtomicBool::new(false)),
        };

        #[cfg(unix)]
        {
            use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};
            use tracing::warn;

            for signal in [SIGINT, SIGTERM] {
                if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&flags.shutdown)) {
                    warn!(signal, error = %err, "failed to register shutdown signal");
                }
            }
            if let Err(err) = signal_hook::flag::register(SIGUSR1, Arc::clone(&flags.refresh)) {
                warn!(error = %err, "failed to register refresh signal");
            }
        }

        flags
    }

    fn shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn take_refresh(&self) -> bool {
        self.refresh.swap(false, Ordering::Relaxed)
    }
}

// True means shut down. Returns early on SIGUSR1 so the bar refreshes at once.
fn sleep_until_next_tick(interval: Duration, signals: &SignalFlags) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if signals.shutdown() {
            return true;
        }
        if signals.take_refresh() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("gpmdp-status").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    cfg.module.path = expand_home(&cfg.module.path);
    Ok(cfg)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.to_str(), dirs::home_dir()) {
        (Some("~"), Some(home)) => home,
        (Some(text), Some(home)) => match text.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries the bar protocol; diagnostics go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn file_mtime(path: &Path) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

fn poll_interval(cfg: &AppConfig) -> Duration {
    // Capped so adding the interval to an Instant can never overflow.
    Duration::from_secs(cfg.interval_secs.clamp(1, 86_400))
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("GPMDP_STATUS_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Ok(v) = std::env::var("GPMDP_STATUS_STATE_PATH") {
        if !v.trim().is_empty() {
            cfg.module.path = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_home, load_or_default, poll_interval};
    use gpmdp_status_core::AppConfig;
    use std::path::{Path, PathBuf};

    #[test]
    fn expand_home_rewrites_tilde_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/x/y.json")), home.join("x/y.json"));
            assert_eq!(expand_home(Path::new("~")), home);
        }
        assert_eq!(expand_home(Path::new("/abs/p.json")), PathBuf::from("/abs/p.json"));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.interval_secs, AppConfig::default().interval_secs);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval_secs = 2\n\n[module]\npath = \"/tmp/p.json\"\n").unwrap();
        let cfg = load_or_default(&path).unwrap();
        assert_eq!(cfg.interval_secs, 2);
        assert_eq!(cfg.module.path, PathBuf::from("/tmp/p.json"));
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval_secs = \"soon\"\n").unwrap();
        assert!(load_or_default(&path).is_err());
    }

    #[test]
    fn interval_is_clamped_to_sane_bounds() {
        let cfg = AppConfig {
            interval_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(poll_interval(&cfg), std::time::Duration::from_secs(1));

        let cfg = AppConfig {
            interval_secs: u64::MAX,
            ..AppConfig::default()
        };
        assert_eq!(poll_interval(&cfg), std::time::Duration::from_secs(86_400));
    }
}
