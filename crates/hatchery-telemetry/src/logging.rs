//! `LogConfig` and the subscriber built from it.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

type FmtLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// How often a rolling log file is closed and a new one started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    /// New file every day.
    #[default]
    Daily,
    /// New file every hour.
    Hourly,
    /// New file every minute.
    Minutely,
    /// One file, appended to forever.
    Never,
}

impl FromStr for FileRotation {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "minutely" => Ok(Self::Minutely),
            "never" => Ok(Self::Never),
            other => Err(TelemetryError::ConfigError(format!(
                "rotation `{other}` is not one of daily, hourly, minutely, never"
            ))),
        }
    }
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Daily => Self::DAILY,
            FileRotation::Hourly => Self::HOURLY,
            FileRotation::Minutely => Self::MINUTELY,
            FileRotation::Never => Self::NEVER,
        }
    }
}

/// Event formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, one field per line.
    #[default]
    Pretty,
    /// One line per event, span context abbreviated.
    Compact,
    /// Newline-delimited JSON objects.
    Json,
    /// The `fmt` default: one line with full span context.
    Full,
}

impl LogFormat {
    const NAMES: [(&'static str, Self); 4] = [
        ("pretty", Self::Pretty),
        ("compact", Self::Compact),
        ("json", Self::Json),
        ("full", Self::Full),
    ];
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, format)| *format)
            .ok_or_else(|| {
                TelemetryError::ConfigError(format!(
                    "log format `{wanted}` is not one of pretty, compact, json, full"
                ))
            })
    }
}

/// Where formatted events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error, leaving stdout to command output.
    #[default]
    Stderr,
    /// Rolling files inside this directory, created on setup.
    File(PathBuf),
}

/// Naming and retention for [`LogTarget::File`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Files are named `<prefix>.<date>.log`, or `<prefix>.log` when never rotated.
    pub prefix: String,
    /// Rotation period.
    pub rotation: FileRotation,
    /// Oldest files beyond this count are deleted. Zero keeps everything.
    pub max_files: usize,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            prefix: "hatchery".to_owned(),
            rotation: FileRotation::Daily,
            max_files: 0,
        }
    }
}

/// Everything needed to build the host's subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base `EnvFilter` directive, usually a bare level such as `info`.
    pub level: String,
    /// Event formatter.
    pub format: LogFormat,
    /// Output destination.
    pub target: LogTarget,
    /// File settings, read only for [`LogTarget::File`].
    pub file: FileLogConfig,
    /// Prefix each event with a timestamp.
    pub timestamps: bool,
    /// Record source file and line.
    pub file_info: bool,
    /// Colorize output. Forced off for file targets.
    pub ansi: bool,
    /// Per-target directives layered over `level`.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
            target: LogTarget::Stderr,
            file: FileLogConfig::default(),
            timestamps: true,
            file_info: false,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Config at `level` with every other setting at its default.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Replace the formatter.
    #[must_use]
    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    /// Replace the output destination.
    #[must_use]
    pub fn with_target(self, target: LogTarget) -> Self {
        Self { target, ..self }
    }

    /// Daily rolling files under `dir`, named after `prefix`.
    #[must_use]
    pub fn with_file_logging(self, dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.with_file_logging_rotation(dir, prefix, FileRotation::Daily)
    }

    /// Rolling files under `dir` with an explicit rotation. Turns colors off.
    #[must_use]
    pub fn with_file_logging_rotation(
        self,
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        rotation: FileRotation,
    ) -> Self {
        Self {
            target: LogTarget::File(dir.into()),
            file: FileLogConfig {
                prefix: prefix.into(),
                rotation,
                ..self.file
            },
            ansi: false,
            ..self
        }
    }

    /// Retention for rolling files.
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.file.max_files = max_files;
        self
    }

    /// Append a directive such as `hatchery_plugins=debug`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Omit timestamps.
    #[must_use]
    pub fn without_timestamps(self) -> Self {
        Self {
            timestamps: false,
            ..self
        }
    }

    /// Record file and line of each event.
    #[must_use]
    pub fn with_file_info(self) -> Self {
        Self {
            file_info: true,
            ..self
        }
    }

    /// Plain output with no color codes.
    #[must_use]
    pub fn without_ansi(self) -> Self {
        Self { ansi: false, ..self }
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let base = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(format!("level `{}`: {e}", self.level)))?;
        self.directives.iter().try_fold(base, |filter, raw| {
            let directive: Directive = raw
                .parse()
                .map_err(|e| TelemetryError::ConfigError(format!("directive `{raw}`: {e}")))?;
            Ok(filter.add_directive(directive))
        })
    }

    fn writer(&self) -> TelemetryResult<BoxMakeWriter> {
        let dir = match &self.target {
            LogTarget::Stdout => return Ok(BoxMakeWriter::new(std::io::stdout)),
            LogTarget::Stderr => return Ok(BoxMakeWriter::new(std::io::stderr)),
            LogTarget::File(dir) => dir,
        };

        std::fs::create_dir_all(dir)?;
        let mut appender = RollingFileAppender::builder()
            .rotation(self.file.rotation.into())
            .filename_prefix(self.file.prefix.as_str())
            .filename_suffix("log");
        if self.file.max_files > 0 {
            appender = appender.max_log_files(self.file.max_files);
        }
        let appender = appender
            .build(dir)
            .map_err(|e| TelemetryError::InitError(format!("{}: {e}", dir.display())))?;
        Ok(BoxMakeWriter::new(appender))
    }

    fn layer(&self, writer: BoxMakeWriter) -> FmtLayer {
        let base = fmt::layer()
            .with_writer(writer)
            .with_ansi(self.ansi)
            .with_file(self.file_info)
            .with_line_number(self.file_info);

        // `without_time` changes the layer type, so each arm boxes on its own.
        if self.timestamps {
            match self.format {
                LogFormat::Pretty => base.pretty().boxed(),
                LogFormat::Compact => base.compact().boxed(),
                LogFormat::Json => base.json().boxed(),
                LogFormat::Full => base.boxed(),
            }
        } else {
            let base = base.without_time();
            match self.format {
                LogFormat::Pretty => base.pretty().boxed(),
                LogFormat::Compact => base.compact().boxed(),
                LogFormat::Json => base.json().boxed(),
                LogFormat::Full => base.boxed(),
            }
        }
    }
}

/// Build the subscriber for `config` without installing it, for use with
/// `tracing::subscriber::with_default`.
///
/// # Errors
///
/// Fails on an invalid level or directive, or when the log directory cannot
/// be created.
pub fn build_subscriber(config: &LogConfig) -> TelemetryResult<impl Subscriber + Send + Sync + 'static> {
    let filter = config.env_filter()?;
    let layer = config.layer(config.writer()?);
    Ok(tracing_subscriber::registry().with(layer).with(filter))
}

/// Build and install the global subscriber.
///
/// # Errors
///
/// Everything [`build_subscriber`] can fail with, plus
/// [`TelemetryError::InitError`] when a global subscriber already exists.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    build_subscriber(config)?
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// [`setup_logging`] with [`LogConfig::default`].
///
/// # Errors
///
/// See [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}
