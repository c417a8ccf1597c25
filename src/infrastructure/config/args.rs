use super::app_config::LogLevel;
use crate::infrastructure::image::QueueDiscipline;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pixpick",
    version,
    about = "Decode a folder of images into memory-bounded thumbnails",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to scan for images.
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Number of concurrent decodes.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Order queued images are decoded in.
    #[arg(long, value_enum)]
    pub discipline: Option<QueueDiscipline>,

    /// Decoded image cache capacity in bytes.
    #[arg(long, value_name = "BYTES")]
    pub cache_bytes: Option<usize>,

    /// Thumbnail width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Thumbnail height in pixels.
    #[arg(long)]
    pub height: Option<u32>,
}
