//! CLI for pixprompt - serve the generator pages or generate from the shell.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pixprompt::config::{BIND_ENV, MODEL_ENV, TIMEOUT_ENV};
use pixprompt::image::providers::{API_KEY_ENV, API_URL_ENV};
use pixprompt::image::{GenerationRequest, ImageFormat, ImageProvider};
use pixprompt::web::{self, AppState};
use pixprompt::Settings;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pixprompt")]
#[command(about = "Generate FLUX images from text prompts via a hosted API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, global = true, env = "IMAGE_API_URL")]
    api_url: Option<String>,

    /// API key
    #[arg(long, global = true, env = "IMAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier
    #[arg(long, global = true, env = "IMAGE_MODEL")]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "IMAGE_API_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Listen address for `serve`
    #[arg(long, global = true, env = "PIXPROMPT_BIND")]
    bind: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the generator pages
    Serve,

    /// Generate images from a text prompt
    Image(ImageArgs),

    /// Show the resolved configuration
    Check,
}

#[derive(Args)]
struct ImageArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path; with --count > 1 an index is appended to the stem
    #[arg(short, long)]
    output: PathBuf,

    /// Model iteration count
    #[arg(short, long, default_value_t = 4)]
    steps: u32,

    /// Number of images
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    /// Image width in pixels
    #[arg(long, default_value_t = pixprompt::image::DEFAULT_SIZE)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = pixprompt::image::DEFAULT_SIZE)]
    height: u32,

    /// Seed for deterministic generation
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.settings().context("failed to load configuration")?;

    match cli.command {
        Commands::Serve => serve(settings).await?,
        Commands::Image(args) => generate_image(&settings, args, cli.json).await?,
        Commands::Check => check(&settings, cli.json).await?,
    }

    Ok(())
}

impl Cli {
    /// Settings from the flags, which clap has already merged with the environment.
    fn settings(&self) -> pixprompt::Result<Settings> {
        Settings::from_lookup(|key| match key {
            API_URL_ENV => self.api_url.clone(),
            API_KEY_ENV => self.api_key.clone(),
            MODEL_ENV => self.model.clone(),
            TIMEOUT_ENV => self.timeout.map(|t| t.to_string()),
            BIND_ENV => self.bind.clone(),
            _ => None,
        })
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    settings.log_summary();
    let provider = settings.provider()?;
    provider.health_check().await?;
    web::serve(AppState::new(Arc::new(provider)), settings.bind).await?;
    Ok(())
}

async fn generate_image(settings: &Settings, args: ImageArgs, json_output: bool) -> anyhow::Result<()> {
    settings.log_summary();
    let provider = settings.provider()?;

    let mut request = GenerationRequest::new(&args.prompt)
        .with_steps(args.steps)
        .with_count(args.count)
        .with_size(args.width, args.height);
    if let Some(seed) = args.seed {
        request = request.with_seed(seed);
    }

    let images = if args.count > 1 {
        provider.generate_batch(&request).await?
    } else {
        vec![provider.generate(&request).await?]
    };

    let mut written = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let path = output_path(&args.output, index, images.len());
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension);
        if wanted.is_some_and(|format| format != image.format) {
            tracing::warn!(
                path = %path.display(),
                actual = image.format.extension(),
                "output extension does not match image format"
            );
        }
        image.save(&path)?;
        written.push((path, image));
    }

    if json_output {
        let outputs: Vec<_> = written
            .iter()
            .map(|(path, image)| {
                serde_json::json!({
                    "output": path.display().to_string(),
                    "size_bytes": image.size(),
                    "format": image.format.extension(),
                })
            })
            .collect();
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "images": outputs,
            "provider": provider.name(),
            "model": settings.model.as_str(),
            "steps": args.steps,
            "duration_ms": written.first().and_then(|(_, image)| image.metadata.duration_ms),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for (path, image) in &written {
            println!(
                "Generated image: {} ({} bytes) via {}",
                path.display(),
                image.size(),
                provider.name()
            );
        }
        if let Some(duration) = written.first().and_then(|(_, image)| image.metadata.duration_ms) {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn check(settings: &Settings, json_output: bool) -> anyhow::Result<()> {
    let provider = settings.provider()?;
    let healthy = provider.health_check().await;

    if json_output {
        let result = serde_json::json!({
            "api_url": settings.api_url,
            "api_key": settings.masked_api_key(),
            "model": settings.model.as_str(),
            "bind": settings.bind.to_string(),
            "timeout_secs": settings.timeout.as_secs(),
            "healthy": healthy.is_ok(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("API URL: {}", settings.api_url);
        println!("API Key: {}", settings.masked_api_key());
        println!("Model:   {}", settings.model);
        println!("Bind:    {}", settings.bind);
        println!("Timeout: {}s", settings.timeout.as_secs());
    }

    healthy?;
    Ok(())
}

/// `out.png` stays as-is for a single image; batches become `out-1.png`, `out-2.png`, ...
fn output_path(base: &std::path::Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{}-{}.{}", stem, index + 1, ext.to_string_lossy()),
        None => format!("{}-{}", stem, index + 1),
    };
    base.with_file_name(name)
}
