//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "lettore";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DWELL_SECONDS: u64 = 30;
const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;
const DEFAULT_VISIBILITY_DEBOUNCE_MS: u64 = 400;
const DEFAULT_VISIBILITY_SAMPLE_MS: u64 = 250;
const DEFAULT_SESSION_DIR: &str = ".lettore";
const SESSION_FILE_NAME: &str = "session.json";

/// Command-line arguments for the lettore binary.
#[derive(Debug, Parser)]
#[command(name = "lettore", version, about = "Terminal reading client for blog platforms")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LETTORE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Fetch a post, display it, and track the viewing session.
    Read(ReadArgs),
    /// Record the current viewer identity in the session file.
    Login(LoginArgs),
    /// Clear the current viewer's interaction flags and identity.
    Logout(LogoutArgs),
    /// Inspect or prune the session cache.
    Session(SessionArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ReadArgs {
    /// Post to read.
    #[arg(value_name = "POST_ID")]
    pub post_id: u64,

    /// Viewer identity override; defaults to the logged-in user.
    #[arg(long = "user", value_name = "USER_ID")]
    pub user: Option<u64>,

    #[command(flatten)]
    pub overrides: ReadOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct LoginArgs {
    /// User to log in as.
    #[arg(long = "user", value_name = "USER_ID")]
    pub user: u64,

    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct LogoutArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SessionAction {
    /// Print the session identity and cached interaction flags.
    Show(SessionActionArgs),
    /// Remove every `viewed` flag from the session cache.
    #[command(name = "clear-viewed")]
    ClearViewed(SessionActionArgs),
    /// Remove every `liked` flag from the session cache.
    #[command(name = "clear-liked")]
    ClearLiked(SessionActionArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SessionActionArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
    /// Override the blog site base URL.
    #[arg(long = "site", env = "LETTORE_SITE_URL", value_name = "URL")]
    pub site_url: Option<String>,

    /// Override the API key sent with every request.
    #[arg(long = "api-key", env = "LETTORE_API_KEY", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Override the request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS")]
    pub api_timeout_seconds: Option<u64>,

    /// Override the session directory.
    #[arg(long = "session-dir", env = "LETTORE_SESSION_DIR", value_name = "PATH")]
    pub session_dir: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ReadOverrides {
    #[command(flatten)]
    pub common: CommonOverrides,

    /// Override the dwell time before the time-based view trigger fires.
    #[arg(long = "tracking-dwell-seconds", value_name = "SECONDS")]
    pub dwell_seconds: Option<u64>,

    /// Override the visibility ratio that counts as reading.
    #[arg(long = "tracking-visibility-threshold", value_name = "RATIO")]
    pub visibility_threshold: Option<f64>,

    /// Override the debounce window of the visibility trigger.
    #[arg(long = "tracking-visibility-debounce-ms", value_name = "MILLIS")]
    pub visibility_debounce_ms: Option<u64>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub tracking: TrackingSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub site_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct TrackingSettings {
    pub dwell: Duration,
    pub visibility_threshold: f64,
    pub visibility_debounce: Duration,
    pub visibility_sample_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub directory: PathBuf,
}

impl SessionSettings {
    /// Path of the session document inside the session directory.
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(SESSION_FILE_NAME)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse the command line and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("LETTORE")
            .prefix_separator("_")
            .separator("__"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Read(args) => raw.apply_read_overrides(&args.overrides),
        Command::Login(args) => raw.apply_common_overrides(&args.overrides),
        Command::Logout(args) => raw.apply_common_overrides(&args.overrides),
        Command::Session(args) => match &args.action {
            SessionAction::Show(action)
            | SessionAction::ClearViewed(action)
            | SessionAction::ClearLiked(action) => raw.apply_common_overrides(&action.overrides),
        },
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
    tracking: RawTrackingSettings,
    session: RawSessionSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    site_url: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTrackingSettings {
    dwell_seconds: Option<u64>,
    visibility_threshold: Option<f64>,
    visibility_debounce_ms: Option<u64>,
    visibility_sample_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    directory: Option<PathBuf>,
}

impl RawSettings {
    fn apply_common_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(url) = overrides.site_url.as_ref() {
            self.api.site_url = Some(url.clone());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.api.api_key = Some(key.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(directory) = overrides.session_dir.as_ref() {
            self.session.directory = Some(directory.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_read_overrides(&mut self, overrides: &ReadOverrides) {
        self.apply_common_overrides(&overrides.common);

        if let Some(seconds) = overrides.dwell_seconds {
            self.tracking.dwell_seconds = Some(seconds);
        }
        if let Some(threshold) = overrides.visibility_threshold {
            self.tracking.visibility_threshold = Some(threshold);
        }
        if let Some(millis) = overrides.visibility_debounce_ms {
            self.tracking.visibility_debounce_ms = Some(millis);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            logging,
            tracking,
            session,
        } = raw;

        let api = build_api_settings(api)?;
        let logging = build_logging_settings(logging)?;
        let tracking = build_tracking_settings(tracking)?;
        let session = build_session_settings(session);

        Ok(Self {
            api,
            logging,
            tracking,
            session,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let site_url = api.site_url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let timeout_secs = api.timeout_seconds.unwrap_or(DEFAULT_API_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "api.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ApiSettings {
        site_url,
        api_key: api.api_key,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_tracking_settings(tracking: RawTrackingSettings) -> Result<TrackingSettings, LoadError> {
    let threshold = tracking
        .visibility_threshold
        .unwrap_or(DEFAULT_VISIBILITY_THRESHOLD);
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(LoadError::invalid(
            "tracking.visibility_threshold",
            "must be within (0, 1]",
        ));
    }

    let dwell_seconds = tracking.dwell_seconds.unwrap_or(DEFAULT_DWELL_SECONDS);
    let debounce_ms = tracking
        .visibility_debounce_ms
        .unwrap_or(DEFAULT_VISIBILITY_DEBOUNCE_MS);
    let sample_ms = tracking
        .visibility_sample_ms
        .unwrap_or(DEFAULT_VISIBILITY_SAMPLE_MS);
    if sample_ms == 0 {
        return Err(LoadError::invalid(
            "tracking.visibility_sample_ms",
            "must be greater than zero",
        ));
    }

    Ok(TrackingSettings {
        dwell: Duration::from_secs(dwell_seconds),
        visibility_threshold: threshold,
        visibility_debounce: Duration::from_millis(debounce_ms),
        visibility_sample_interval: Duration::from_millis(sample_ms),
    })
}

fn build_session_settings(session: RawSessionSettings) -> SessionSettings {
    SessionSettings {
        directory: session
            .directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR)),
    }
}
