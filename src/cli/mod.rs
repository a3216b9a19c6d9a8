//! Command-line interface module

use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{MirrorError, MirrorResult};
use crate::mirror::{parse_size, MirrorConfig};
use crate::transform::mime::DEFAULT_EXCLUDE_MIME;
use crate::transform::wechat::{DEFAULT_SILK_DECODER, DEFAULT_SOX};

pub mod path_mapping;

/// Main CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "treemirror")]
#[command(about = "Forensic toolbox: mirror directory trees while transforming every file")]
#[command(version)]
#[command(long_about = None)]
pub struct Args {
    /// Append log output to this file instead of the console
    #[arg(short = 'l', long, global = true, value_name = "LOGFILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by every subcommand that mirrors a tree
#[derive(clap::Args, Debug, Clone)]
pub struct TreeArgs {
    /// Directory of files to process
    #[arg(short = 'i', long = "input", value_name = "INPUT_DIR")]
    pub input: PathBuf,

    /// Destination directory for the processed files
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR")]
    pub output: PathBuf,

    /// Force writing into an existing output directory
    #[arg(short, long)]
    pub force: bool,

    /// Largest file to load (e.g., 100MB, default: 100MB)
    #[arg(long, value_name = "SIZE")]
    pub max_file_size: Option<String>,

    /// Follow symbolic links while walking the input directory
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Write a JSON report of the run to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Prepend or append bytes to all files in a directory
    Frob {
        #[command(flatten)]
        tree: TreeArgs,
        /// Bytes to prepend, ie. "ffd8ffe1"
        #[arg(short = 'p', long, value_name = "HEX")]
        prepend: Option<String>,
        /// Bytes to append, ie. "ffaa"
        #[arg(short = 'a', long, value_name = "HEX")]
        append: Option<String>,
    },
    /// Copy only the files whose MIME type is not excluded
    Mime {
        #[command(flatten)]
        tree: TreeArgs,
        /// MIME type to exclude (repeatable)
        #[arg(long = "exclude", value_name = "MIME", default_values_t = DEFAULT_EXCLUDE_MIME.map(String::from))]
        exclude: Vec<String>,
        /// Print a statistics summary of all MIME types
        #[arg(short, long)]
        stats: bool,
        /// Log every file with its MIME type
        #[arg(long)]
        list: bool,
    },
    /// Overwrite every file with the contents of a single clean file
    Redact {
        #[command(flatten)]
        tree: TreeArgs,
        /// Replacement file, ie. clean-picture.jpg
        #[arg(short = 'c', long, value_name = "FILE")]
        content: PathBuf,
    },
    /// Redact user names and file paths from scanner XML output
    ScrubXml {
        #[command(flatten)]
        tree: TreeArgs,
    },
    /// Make WeChat audio files playable
    WechatAudio {
        #[command(flatten)]
        tree: TreeArgs,
        /// SILK decoder executable
        #[arg(long, value_name = "PATH", default_value = DEFAULT_SILK_DECODER)]
        silk_decoder: PathBuf,
        /// sox executable
        #[arg(long, value_name = "PATH", default_value = DEFAULT_SOX)]
        sox: PathBuf,
    },
    /// Test numbers against the Luhn checksum
    Luhn {
        /// Card numbers to check
        #[arg(required = true)]
        numbers: Vec<String>,
    },
    /// Convert PRTime values to local and UTC time (CSV output)
    Prtime {
        /// PRTime values, ie. 1306678742795922
        #[arg(short = 't', num_args = 1.., allow_negative_numbers = true, value_name = "PRTIME")]
        times: Vec<i64>,
        /// Read PRTimes from a file, one per line
        #[arg(short = 'i', long = "input", value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Calculate the delta between two dates ('%m/%d/%Y %H:%M:%S')
    Deltadate {
        first: String,
        second: String,
    },
}

impl Args {
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// CLI configuration
pub struct CliConfig;

impl CliConfig {
    /// Create mirror configuration from tree arguments
    pub fn mirror_config(tree: &TreeArgs) -> MirrorResult<MirrorConfig> {
        let mut config = MirrorConfig::new(&tree.input, &tree.output)
            .with_force(tree.force)
            .with_follow_symlinks(tree.follow_symlinks);

        if let Some(limit) = &tree.max_file_size {
            config = config.with_max_file_size(parse_size(limit)?);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Install the tracing subscriber: to the log file when one is given,
/// otherwise to stderr.
pub fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = args.log_level();
    let result = match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| MirrorError::io(path, e))?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_ansi(CliUtils::should_use_color())
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// CLI utilities and helpers
pub struct CliUtils;

impl CliUtils {
    /// Format a file size in human-readable format
    pub fn format_file_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }

    /// Format a duration in human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_millis = duration.as_millis();

        if total_millis < 1000 {
            format!("{}ms", total_millis)
        } else if total_millis < 60_000 {
            format!("{:.1}s", total_millis as f64 / 1000.0)
        } else {
            let minutes = total_millis / 60_000;
            let seconds = (total_millis % 60_000) / 1000;
            format!("{}m {}s", minutes, seconds)
        }
    }

    /// Create a progress bar for file processing
    pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
        let pb = indicatif::ProgressBar::new(total);
        let style = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }

    /// Show a success message (if not in quiet mode)
    pub fn show_success(message: &str, quiet: bool) {
        if !quiet {
            println!("✓ {}", message);
        }
    }

    /// Show an error message
    pub fn show_error(message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Show a warning message (if not in quiet mode)
    pub fn show_warning(message: &str, quiet: bool) {
        if !quiet {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if log output should be colored
    pub fn should_use_color() -> bool {
        atty::is(atty::Stream::Stderr) && std::env::var("NO_COLOR").is_err()
    }
}

/// Handle setup errors with user-friendly messages
pub fn handle_error(error: &MirrorError) {
    CliUtils::show_error(&error.user_message());

    // Provide helpful suggestions
    match error {
        MirrorError::OutputExists { .. } => {
            eprintln!("\nTip: Use --force to write into an existing output directory");
        }
        MirrorError::NoBytesSupplied => {
            eprintln!("\nTip: Supply bytes with -p (prepend) and/or -a (append)");
        }
        MirrorError::MissingTool { .. } => {
            eprintln!("\nTip: Use --silk-decoder and --sox to point at the installed tools");
        }
        _ => {}
    }

    eprintln!("\nTry 'treemirror --help' for usage information.");
}
