use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use mpegbound::process::ReadStyle;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nmpegbound ",
    env!("MPEGBOUND_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for inspecting tag boundaries and stream properties of MPEG audio files",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat malformed tag regions as fatal errors instead of warnings.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// How deeply to inspect the audio stream.
    #[arg(long, global = true, value_enum, default_value_t = StyleArg::Average)]
    pub read_style: StyleArg,

    /// YAML file with tag creation switches (create_id3v1, create_id3v2).
    #[arg(long, global = true, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Do not create a missing ID3v1 tag.
    #[arg(long, global = true)]
    pub no_id3v1: bool,

    /// Do not create a missing ID3v2 tag.
    #[arg(long, global = true)]
    pub no_id3v2: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print tag regions, media span and properties of one file.
    Info(InfoArgs),

    /// Open many files and report which ones fail to synchronize.
    Scan(ScanArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MPEG audio file (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Input MPEG audio files.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write per-file reports as YAML to this path.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum StyleArg {
    /// Read tags only.
    None,
    /// Read tags, skip frame synchronization.
    Fast,
    /// Synchronize on the first frame header (default).
    Average,
    /// Same as average.
    Accurate,
}

impl From<StyleArg> for ReadStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::None => ReadStyle::None,
            StyleArg::Fast => ReadStyle::Fast,
            StyleArg::Average => ReadStyle::Average,
            StyleArg::Accurate => ReadStyle::Accurate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ReportFormat {
    /// Aligned human-readable text.
    Text,
    /// YAML document.
    Yaml,
}
