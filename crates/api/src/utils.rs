use clap::Parser;
use climate_api_core::{
    find_config_file, get_xdg_data_dir, is_file, load_config, ConfigSource, DEFAULT_API_PORT,
    DEFAULT_DATABASE_FILE,
};
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::RangeMode;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Climate API - read-only station temperature and precipitation queries"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $CLIMATE_API_CONFIG, ./climate-api.toml,
    /// $XDG_CONFIG_HOME/climate-api/climate-api.toml, /etc/climate-api/climate-api.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "CLIMATE_API_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, env = "CLIMATE_API_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CLIMATE_API_PORT")]
    pub port: Option<String>,

    /// SQLite file holding the station and measurement tables
    #[arg(short, long, env = "CLIMATE_API_DATABASE")]
    pub database: Option<String>,

    /// Bounds used by the start and start/end aggregate routes
    #[arg(short, long, value_enum, env = "CLIMATE_API_RANGE_MODE")]
    pub range_mode: Option<RangeMode>,

    /// Log every SQL statement
    #[arg(
        short,
        long,
        env = "CLIMATE_API_ECHO_SQL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub echo_sql: Option<bool>,
}

impl Cli {
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_API_PORT.to_string())
    }

    /// Falls back to the dataset in the working directory, then the XDG data dir
    pub fn database(&self) -> String {
        self.database.clone().unwrap_or_else(|| {
            if is_file(DEFAULT_DATABASE_FILE) {
                DEFAULT_DATABASE_FILE.to_string()
            } else {
                get_xdg_data_dir()
                    .join(DEFAULT_DATABASE_FILE)
                    .to_string_lossy()
                    .into_owned()
            }
        })
    }

    pub fn range_mode(&self) -> RangeMode {
        self.range_mode.unwrap_or_default()
    }

    pub fn echo_sql(&self) -> bool {
        self.echo_sql.unwrap_or(false)
    }

    /// Values set here win over `fallback`
    pub fn merge(self, fallback: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(fallback.level),
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            database: self.database.or(fallback.database),
            range_mode: self.range_mode.or(fallback.range_mode),
            echo_sql: self.echo_sql.or(fallback.echo_sql),
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> anyhow::Result<Cli> {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("CLIMATE_API_CONFIG", "climate-api.toml")
    };

    let file_config: Cli = load_config(&source)?;

    // CLI args override file config (env vars are handled by clap)
    Ok(cli_args.merge(file_config))
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = OffsetDateTime::now_utc()
                .format(&Iso8601::DEFAULT)
                .unwrap_or_default();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                now,
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
