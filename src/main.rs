use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use platter::config::UploadConfig;
use platter::pipeline::{AssetCategory, UploadPipeline, UploadRequest};
use platter::validation::ImageFormat;

/// Platter - validate and transcode untrusted image uploads
#[derive(Parser, Debug)]
#[command(name = "platter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the upload directory tree
    Init,

    /// Run validation only and report the outcome
    Check {
        file: PathBuf,

        /// Declared MIME type (default: implied by the file extension)
        #[arg(long)]
        mime: Option<String>,

        /// Declared filename (default: the file's own name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Validate, transcode and store an image; prints the public result as JSON
    Process {
        file: PathBuf,

        #[arg(long)]
        category: AssetCategory,

        /// Declared MIME type (default: implied by the file extension)
        #[arg(long)]
        mime: Option<String>,

        /// Declared filename (default: the file's own name)
        #[arg(long)]
        name: Option<String>,

        /// Output name without extension (default: generated)
        #[arg(long)]
        base_name: Option<String>,

        /// Transcode deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Delete a stored asset (and its thumbnail, for recipes)
    Delete {
        /// Public URL returned by `process`, or the stored file name
        target: String,

        #[arg(long)]
        category: AssetCategory,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => UploadConfig::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => UploadConfig::default(),
    };
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    // Initialize logging subsystem
    platter::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = ?args.config,
        storage_root = %config.storage.root().display(),
        base_url = %config.public_url.base_url(),
        max_concurrent_transcodes = config.pipeline.max_concurrent_transcodes,
        "Configuration loaded successfully"
    );

    let pipeline = UploadPipeline::new(config);

    match args.command {
        Command::Init => {
            pipeline.ensure_directories().await?;
            println!(
                "Upload directories ready under {}",
                pipeline.config().storage.root().display()
            );
        }
        Command::Check { file, mime, name } => {
            let request = load_request(&file, AssetCategory::Recipe, mime, name).await?;
            match pipeline.validate_only(&request) {
                Ok(format) => println!("accepted: {}", format),
                Err(rejection) => {
                    println!("rejected ({}): {}", rejection.label(), rejection);
                    std::process::exit(2);
                }
            }
        }
        Command::Process {
            file,
            category,
            mime,
            name,
            base_name,
            timeout_ms,
        } => {
            let mut request = load_request(&file, category, mime, name).await?;
            request.base_name = base_name;
            request.deadline = timeout_ms.map(Duration::from_millis);

            match pipeline.process(request).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    eprintln!(
                        "{} ({}, status {})",
                        e.public_message(),
                        e.kind(),
                        e.to_http_status()
                    );
                    std::process::exit(if e.is_client_error() { 2 } else { 1 });
                }
            }
        }
        Command::Delete { target, category } => {
            let file_name = if target.contains('/') {
                match pipeline.filename_from_url(&target) {
                    Some(name) => name,
                    None => bail!("'{}' is not an asset URL issued by this service", target),
                }
            } else {
                target
            };
            pipeline.delete_asset(category, &file_name).await?;
            println!("deleted {}/{}", category, file_name);
        }
    }

    Ok(())
}

async fn load_request(
    file: &Path,
    category: AssetCategory,
    mime: Option<String>,
    name: Option<String>,
) -> Result<UploadRequest> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("File path has no usable file name; pass --name")?,
    };

    let mime = match mime {
        Some(mime) => mime,
        None => file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
            .map(|format| format.mime_type().to_string())
            .context("Cannot infer MIME type from the file extension; pass --mime")?,
    };

    Ok(UploadRequest::new(data, name, mime, category))
}
