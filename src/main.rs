use artifact_uploader::utils::file_finder::{FileFinder, check_files_found};
use artifact_uploader::{CompressionMode, IfNoFilesFound, UploadConfig, upload_files};
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Artifact name, used for the archive and remote file name
    #[arg(short, long)]
    name: String,

    /// Files or directories to upload
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Glob patterns (relative to the artifact root) to leave out
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Behaviour when no files match
    #[arg(long, value_enum, default_value_t = IfNoFilesFound::Warn)]
    if_no_files_found: IfNoFilesFound,

    /// Upload a single file as-is instead of zipping
    #[arg(long)]
    no_compression: bool,

    /// Storage service URL (overrides NEXTCLOUD_URL)
    #[arg(long)]
    url: Option<String>,

    /// Username (overrides NEXTCLOUD_USERNAME)
    #[arg(long)]
    username: Option<String>,

    /// Password or app token (overrides NEXTCLOUD_PASSWORD)
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artifact_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = UploadConfig::from_env();
    if let Some(url) = args.url {
        config.endpoint = url;
    }
    if let Some(username) = args.username {
        config.credentials.username = username;
    }
    if let Some(password) = args.password {
        config.credentials.password = password;
    }
    if args.no_compression {
        config.compression = CompressionMode::None;
    }

    info!(
        "⚙️  Target: {} (compression: {:?})",
        config.endpoint, config.compression
    );

    let finder = FileFinder::new(&args.exclude)?;
    let search = finder.find(&args.paths)?;
    if !check_files_found(&search, args.if_no_files_found)? {
        return Ok(());
    }

    match upload_files(&config, &search.root_directory, &args.name, &search.files).await {
        Ok(url) => {
            println!("{}", url);
            Ok(())
        }
        Err(e) => {
            error!("❌ Upload of '{}' failed: {}", args.name, e);
            Err(e.into())
        }
    }
}
