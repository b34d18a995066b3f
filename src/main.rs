use charforge::{
    logger::{self, LogLevel, LoggerConfig},
    AspectRatio, EncodedImage, GeminiClient, GeminiConfig, GenerationResult, ImageCount,
    ModelName, SessionState,
};
use clap::Parser;
use std::{fs, path::Path, path::PathBuf};

/// Generate images from a prompt and up to eight character reference images.
#[derive(Debug, Parser)]
#[command(name = "charforge", version)]
struct Args {
    /// Scene description.
    prompt: String,

    /// Character reference image; repeat for up to eight characters.
    #[arg(short, long = "character")]
    characters: Vec<PathBuf>,

    /// Background image used as the exact setting of the scene.
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// gemini-2.5-flash-image (uses character images) or imagen-4.0-generate-001 (prompt only).
    #[arg(short, long, default_value = "gemini-2.5-flash-image")]
    model: ModelName,

    /// Number of images: 1, 2 or 4.
    #[arg(short = 'n', long, default_value_t = 4)]
    count: u32,

    /// One of 1:1, 16:9, 9:16, 4:3, 3:4.
    #[arg(short, long, default_value = "1:1")]
    aspect_ratio: AspectRatio,

    /// Directory the results are written to.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Also append log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit log lines as JSON.
    #[arg(long)]
    json_logs: bool,
}

fn load_image(path: &Path) -> Result<EncodedImage, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let mime_type = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    };
    Ok(EncodedImage::from_bytes(mime_type, &bytes))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();
    let args = Args::parse();

    let mut log_config = LoggerConfig::development()
        .with_level(args.log_level)
        .with_json_output(args.json_logs);
    if let Some(path) = &args.log_file {
        log_config = log_config.with_file_output(&path.to_string_lossy());
    }
    logger::init_with_config(log_config)?;
    if env_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    log::info!("🖼️  Available image generation models:");
    for (id, name, note) in ModelName::supported_models() {
        log::info!("  {} - {} ({})", id, name, note);
    }

    let config = GeminiConfig::from_env();
    logger::log_config_info(&config);

    let client = match GeminiClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ {}", e);
            return Err(e.into());
        }
    };

    if args.characters.len() > charforge::models::MAX_CHARACTERS {
        return Err(format!(
            "at most {} character images are supported",
            charforge::models::MAX_CHARACTERS
        )
        .into());
    }

    let mut session = SessionState::new();
    session.prompt = args.prompt;
    session.model = args.model;
    session.number_of_images = ImageCount::try_from(args.count)?;
    session.aspect_ratio = args.aspect_ratio;

    for (slot, path) in (1u32..).zip(&args.characters) {
        session.attach_character_image(slot, load_image(path)?)?;
        log::info!("🧑 Character {} <- {}", slot, path.display());
    }
    if let Some(path) = &args.background {
        session.set_background_image(Some(load_image(path)?));
        session.toggle_background();
        log::info!("🏞️  Background <- {}", path.display());
    }

    match client.generate_session(&mut session).await {
        GenerationResult::Images(images) => {
            fs::create_dir_all(&args.out_dir)?;
            let stamp = chrono::Utc::now().timestamp_millis();
            for (index, image) in images.iter().enumerate() {
                let filename = args.out_dir.join(format!(
                    "charforge-{}-{}.{}",
                    stamp,
                    index + 1,
                    image.extension()
                ));
                fs::write(&filename, image.decode()?)?;
                log::info!("💾 Image saved to: {}", filename.display());
            }
            Ok(())
        }
        GenerationResult::Error(message) => {
            log::error!("❌ {}", message);
            Err(message.clone().into())
        }
    }
}
