use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pixpick::application::PreviewFolderUseCase;
use pixpick::infrastructure::{
    AppConfig, CliArgs, ConfigStore, Downsampler, FallbackSizeResolver, ImageLoader,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            ConfigStore::with_dir(dir).load_config(Some(path))?
        }
        None => ConfigStore::new()?.load_config(None)?,
    };
    config.merge_with_args(args);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = pixpick::VERSION, "Starting Pixpick");

    let (loader, mut receiver) = ImageLoader::with_parts(
        config.loader.clone(),
        Arc::new(Downsampler::new()),
        Arc::new(FallbackSizeResolver::new(config.display.screen())),
    )?;
    let loader = Arc::new(loader);
    let use_case = PreviewFolderUseCase::new(Arc::clone(&loader), config.display.thumbnail());

    let report = use_case.execute(&args.dir, &mut receiver).await?;
    println!("{report}");

    loader.shutdown();
    Ok(())
}
